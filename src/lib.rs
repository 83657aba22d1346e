//! Client library for the Monit process-supervision daemon's HTTP
//! status-and-control interface.
//!
//! The client fetches the daemon's XML status document, parses it into typed
//! [`Service`] snapshots, and exposes the daemon's control verbs
//! (start/stop/restart/monitor/unmonitor) as authenticated POSTs. The one
//! subtle part is reconciliation: while an action is in flight the daemon
//! reports transitional state, so the client keeps re-fetching with backoff
//! until it can publish a fully stable snapshot. Every control operation
//! ends in such a reconcile, so callers always read settled state.
//!
//! ```no_run
//! use monit_client::{Config, Monit};
//!
//! # async fn example() -> Result<(), monit_client::ClientError> {
//! let config = Config::new("localhost").with_credentials("admin", "monit");
//! let mut monit = Monit::connect(config).await?;
//!
//! if let Some(nginx) = monit.service("nginx") {
//!     println!("{}", nginx.summary());
//! }
//! monit.restart("nginx").await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod errors;
pub mod logging;
pub mod service;
pub mod status;

pub use client::{Action, HttpTransport, Monit, ServiceHandle, StatusTransport};
pub use config::{Config, ConfigError};
pub use errors::ClientError;
pub use service::{Service, ServiceKind};
