//! # Typed Round Trips
//!
//! Full-path exchanges across all four route shapes: the client encodes a
//! typed value, the in-memory transport carries the container, the server
//! decodes, the handler runs, and the reply comes back typed.
//!
//! The fixture domain is a privileged backup helper: an unprivileged agent
//! asks it to snapshot volumes, report status, and adjust settings.

#[cfg(test)]
mod tests {
    use crate::integration::harness::{eventually, init_tracing, spawn_server, SinkRecorder};
    use portcullis_client::Client;
    use portcullis_server::Server;
    use portcullis_transport_mem::{LabelAuthenticator, MemPeer};
    use portcullis_types::{CallRoute, MessageRoute, QueryRoute, RpcError, SignalRoute};
    use serde::{Deserialize, Serialize};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct SnapshotRequest {
        volume: String,
        verify: bool,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct SnapshotReceipt {
        volume: String,
        blocks: u64,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct DaemonStatus {
        version: String,
        active_jobs: u32,
    }

    fn agent() -> MemPeer {
        MemPeer::labeled("backup-agent")
    }

    /// A server that admits the backup agent by label.
    fn server_for_agent() -> Server<LabelAuthenticator> {
        Server::new(LabelAuthenticator, vec!["backup-agent".to_owned()])
    }

    // =============================================================================
    // ROUND TRIPS PER SHAPE
    // =============================================================================

    #[tokio::test]
    async fn test_call_round_trips_typed_values() {
        init_tracing();
        let route = CallRoute::<SnapshotRequest, SnapshotReceipt>::new(["backup", "run"]);
        let mut server = server_for_agent();
        server.register_call(&route, |request: SnapshotRequest| {
            Ok(SnapshotReceipt {
                volume: request.volume,
                blocks: 42,
            })
        });
        let (_server, connector) = spawn_server(server);
        let client = Client::new(connector.connect(agent()).await.unwrap());

        let receipt = client
            .call(
                &route,
                &SnapshotRequest {
                    volume: "/data".to_owned(),
                    verify: true,
                },
            )
            .await
            .unwrap();

        assert_eq!(
            receipt,
            SnapshotReceipt {
                volume: "/data".to_owned(),
                blocks: 42,
            }
        );
    }

    #[tokio::test]
    async fn test_signal_fires_the_handler_and_stays_silent() {
        init_tracing();
        let route = SignalRoute::new(["cache", "clear"]);
        let mut server = server_for_agent();
        let cleared = Arc::new(AtomicU32::new(0));
        let counted = Arc::clone(&cleared);
        server.register_signal(&route, move || {
            counted.fetch_add(1, Ordering::Relaxed);
            Ok(())
        });
        let sink = SinkRecorder::new();
        server.set_error_handler(sink.handler());
        let (_server, connector) = spawn_server(server);
        let client = Client::new(connector.connect(agent()).await.unwrap());

        client.send_signal(&route).await.unwrap();

        assert!(
            eventually(Duration::from_secs(1), || cleared.load(Ordering::Relaxed) == 1).await
        );
        assert_eq!(sink.count(), 0);
    }

    #[tokio::test]
    async fn test_query_returns_a_struct_reply() {
        init_tracing();
        let route = QueryRoute::<DaemonStatus>::new(["daemon", "status"]);
        let mut server = server_for_agent();
        server.register_query(&route, || {
            Ok(DaemonStatus {
                version: "2.4.1".to_owned(),
                active_jobs: 3,
            })
        });
        let (_server, connector) = spawn_server(server);
        let client = Client::new(connector.connect(agent()).await.unwrap());

        let status = client.query(&route).await.unwrap();
        assert_eq!(status.version, "2.4.1");
        assert_eq!(status.active_jobs, 3);
    }

    #[tokio::test]
    async fn test_message_delivers_a_typed_payload() {
        init_tracing();
        let route = MessageRoute::<String>::new(["config", "log-level"]);
        let mut server = server_for_agent();
        let levels = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let applied = Arc::clone(&levels);
        server.register_message(&route, move |level: String| {
            applied.lock().push(level);
            Ok(())
        });
        let (_server, connector) = spawn_server(server);
        let client = Client::new(connector.connect(agent()).await.unwrap());

        client.send_message(&route, &"debug".to_owned()).await.unwrap();

        assert!(
            eventually(Duration::from_secs(1), || !levels.lock().is_empty()).await
        );
        assert_eq!(levels.lock().as_slice(), ["debug".to_owned()]);
    }

    // =============================================================================
    // HANDLER FAILURES ACROSS THE WIRE
    // =============================================================================

    #[derive(Debug, thiserror::Error)]
    #[error("volume is busy")]
    struct VolumeBusy;

    #[tokio::test]
    async fn test_handler_failure_is_description_only_for_the_client() {
        init_tracing();
        let route = CallRoute::<SnapshotRequest, SnapshotReceipt>::new(["backup", "run"]);
        let mut server = server_for_agent();
        server.register_call(&route, |_request: SnapshotRequest| {
            Err::<SnapshotReceipt, _>(Box::new(VolumeBusy))
        });
        let sink = SinkRecorder::new();
        server.set_error_handler(sink.handler());
        let (_server, connector) = spawn_server(server);
        let client = Client::new(connector.connect(agent()).await.unwrap());

        let error = client
            .call(
                &route,
                &SnapshotRequest {
                    volume: "/data".to_owned(),
                    verify: false,
                },
            )
            .await
            .unwrap_err();

        let RpcError::HandlerFailure {
            description,
            source,
        } = error
        else {
            panic!("expected a handler failure");
        };
        assert!(description.contains("volume is busy"));
        assert!(source.is_none());

        // The sink received the same failure with its original source.
        assert!(eventually(Duration::from_secs(1), || sink.count() == 1).await);
        let recorded = sink.take();
        let RpcError::HandlerFailure {
            source: Some(original),
            ..
        } = &recorded[0]
        else {
            panic!("expected the sinked failure to keep its source");
        };
        assert!(original.downcast_ref::<VolumeBusy>().is_some());
    }
}
