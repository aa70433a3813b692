//! Client side action layer for a team chat server: remote calls are
//! turned into actions, applied to a normalized store, with optimistic
//! updates and a uniform reaction to expired sessions.

pub mod actions;
mod app;
pub mod environment;
pub mod reducers;

pub use actions::{Action, ActionResult, ActionType};
pub use app::{connect, init_logging, remember, run, sign_out};
pub use environment::error::ClientError;
pub use environment::types::Config;
pub use environment::{Environment, Model, Repository, Store};
