//! Action creators. Each one talks to the server through the `Model`,
//! records the outcome in the `Store` and hands the raw result back.

mod action;
pub mod errors;
mod helpers;
pub mod offline;
pub mod posts;
pub mod preferences;
pub mod users;

pub use action::{Action, ActionType, SuccessTarget};
pub use helpers::{
    bind_client_func, force_logout_if_necessary, request_data, request_failure, request_success,
    ClientCall,
};
pub use offline::{run_offline, OfflineAction, OfflineHandle, OfflineOutcome};

use crate::environment::error::ClientError;

/// What every action creator resolves to. Failures have already been
/// logged and dispatched by the time the caller sees them.
pub type ActionResult<T> = Result<T, ClientError>;
