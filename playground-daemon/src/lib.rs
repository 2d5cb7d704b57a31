//! Playground daemon: owns the process supervisor and serves the
//! newline-delimited JSON socket protocol.

mod error;
pub mod paths;
pub mod protocol;
mod runtime;

pub use error::DaemonError;
pub use protocol::{
    request, request_status, request_stop, response_into_data, send_request, subscribe,
    DaemonRequest, DaemonResponse, Subscription,
};
pub use runtime::{dispatch, run, serve, start_blocking};
