//! Talks to a running WISE Builder over its line protocol.
//!
//! [`protocol::WireClient`] owns one request/response exchange at a time.
//! The calculator helpers and [`job::JobClient`] are thin layers over it.

pub mod calculators;
pub mod config;
pub mod error;
pub mod job;
pub mod protocol;
pub mod status;

pub use config::{BrokerConfig, ServerConfig};
pub use error::{ClientError, Result};
pub use job::{JobClient, JobStart};
pub use protocol::{Completion, FetchState, Request, Response, WireClient};
