//! # Portcullis Test Suite
//!
//! Unified test crate exercising client, server, and the in-memory
//! transport together.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── harness.rs     # Shared fixtures: sink recorder, server spawner
//!     ├── round_trip.rs  # Typed exchanges across all four route shapes
//!     ├── dispatch.rs    # Shape overloads, route misses, decode failures
//!     ├── security.rs    # Acceptance gate and authenticator tiers
//!     └── lifecycle.rs   # Connection teardown, sink replacement, stats
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p portcullis-tests
//!
//! # By scenario
//! cargo test -p portcullis-tests integration::security::
//! ```

#![allow(unused_variables)]
#![allow(unused_imports)]
#![allow(dead_code)]
