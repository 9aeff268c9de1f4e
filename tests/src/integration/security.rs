//! # Acceptance Gate
//!
//! Default-deny, OR-across-requirements, and silent rejection observed end
//! to end. A denied caller gets no reply at all; the only trace is an
//! `InsecureConnection` in the server's error sink. Solicited sends from
//! denied peers therefore hang, and scenarios bound them with timeouts.

#[cfg(test)]
mod tests {
    use crate::integration::harness::{eventually, init_tracing, spawn_server, SinkRecorder};
    use portcullis_client::Client;
    use portcullis_server::Server;
    use portcullis_transport_mem::{
        DenyAllAuthenticator, LabelAuthenticator, MemClientChannel, MemConnector, MemPeer,
        TokenAuthenticator,
    };
    use portcullis_types::{Authenticator, QueryRoute, RpcError, TieredAuthenticator};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    const SECRET: &[u8] = b"portcullis integration secret";

    /// Registers a counting status handler and spawns the server.
    fn spawn_with_status<A>(
        mut server: Server<A>,
    ) -> (Arc<AtomicU32>, SinkRecorder, MemConnector, QueryRoute<String>)
    where
        A: Authenticator<Peer = MemPeer, Requirement = String> + 'static,
    {
        let route = QueryRoute::<String>::new(["daemon", "status"]);
        let served = Arc::new(AtomicU32::new(0));
        let counted = Arc::clone(&served);
        server.register_query(&route, move || {
            counted.fetch_add(1, Ordering::Relaxed);
            Ok("up".to_owned())
        });
        let sink = SinkRecorder::new();
        server.set_error_handler(sink.handler());
        let (_server, connector) = spawn_server(server);
        (served, sink, connector, route)
    }

    async fn expect_silence(
        client: &Client<MemClientChannel>,
        route: &QueryRoute<String>,
        sink: &SinkRecorder,
    ) {
        let outcome = timeout(Duration::from_millis(200), client.query(route)).await;
        assert!(outcome.is_err(), "denied caller must receive no reply");

        assert!(eventually(Duration::from_secs(1), || sink.count() >= 1).await);
        for error in sink.take() {
            assert!(matches!(error, RpcError::InsecureConnection));
        }
    }

    #[tokio::test]
    async fn test_empty_requirement_set_denies_everyone() {
        init_tracing();
        let server = Server::new(LabelAuthenticator, Vec::new());
        let (served, sink, connector, route) = spawn_with_status(server);
        let client = Client::new(connector.connect(MemPeer::labeled("anyone")).await.unwrap());

        expect_silence(&client, &route, &sink).await;
        assert_eq!(served.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_unknown_label_is_rejected_silently() {
        init_tracing();
        let server = Server::new(LabelAuthenticator, vec!["backup-agent".to_owned()]);
        let (served, sink, connector, route) = spawn_with_status(server);
        let client = Client::new(
            connector
                .connect(MemPeer::labeled("intruder"))
                .await
                .unwrap(),
        );

        expect_silence(&client, &route, &sink).await;
        assert_eq!(served.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_any_single_requirement_admits() {
        init_tracing();
        let server = Server::new(
            LabelAuthenticator,
            vec!["admin".to_owned(), "backup-agent".to_owned()],
        );
        let (served, sink, connector, route) = spawn_with_status(server);
        let client = Client::new(
            connector
                .connect(MemPeer::labeled("backup-agent"))
                .await
                .unwrap(),
        );

        assert_eq!(client.query(&route).await.unwrap(), "up");
        assert_eq!(served.load(Ordering::Relaxed), 1);
        assert_eq!(sink.count(), 0);
    }

    #[tokio::test]
    async fn test_token_tier_admits_only_verifiable_stamps() {
        init_tracing();
        let server = Server::new(
            TokenAuthenticator::new(SECRET),
            vec!["backup-agent".to_owned()],
        );
        let (served, sink, connector, route) = spawn_with_status(server);

        let stamped = Client::new(
            connector
                .connect(MemPeer::stamped("backup-agent", SECRET))
                .await
                .unwrap(),
        );
        assert_eq!(stamped.query(&route).await.unwrap(), "up");

        // Same label, wrong secret: silently rejected.
        let forged = Client::new(
            connector
                .connect(MemPeer::stamped("backup-agent", b"guessed secret"))
                .await
                .unwrap(),
        );
        expect_silence(&forged, &route, &sink).await;
        assert_eq!(served.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_fallback_tier_denies_instead_of_crashing() {
        init_tracing();
        // Capability probe came back negative: the legacy tier cannot
        // resolve identities, so every peer is silently denied.
        let tiered = TieredAuthenticator::select(
            false,
            TokenAuthenticator::new(SECRET),
            DenyAllAuthenticator,
        );
        let server = Server::new(tiered, vec!["backup-agent".to_owned()]);
        let (served, sink, connector, route) = spawn_with_status(server);

        let client = Client::new(
            connector
                .connect(MemPeer::stamped("backup-agent", SECRET))
                .await
                .unwrap(),
        );
        expect_silence(&client, &route, &sink).await;
        assert_eq!(served.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_preferred_tier_verifies_stamps() {
        init_tracing();
        let tiered = TieredAuthenticator::select(
            true,
            TokenAuthenticator::new(SECRET),
            DenyAllAuthenticator,
        );
        let server = Server::new(tiered, vec!["backup-agent".to_owned()]);
        let (served, _sink, connector, route) = spawn_with_status(server);

        let client = Client::new(
            connector
                .connect(MemPeer::stamped("backup-agent", SECRET))
                .await
                .unwrap(),
        );
        assert_eq!(client.query(&route).await.unwrap(), "up");
        assert_eq!(served.load(Ordering::Relaxed), 1);
    }
}
