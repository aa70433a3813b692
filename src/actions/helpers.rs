use std::future::Future;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use serde::Serialize;

use super::action::{Action, ActionType, SuccessTarget};
use super::errors::prepare_log_error;
use super::ActionResult;
use crate::environment::error::ClientError;
use crate::environment::{Environment, Model};

/// Any url containing this is a login attempt; a 401 there is a wrong
/// password, not an expired session.
const LOGIN_PATH: &str = "/login";

type ClientFunc<T> = Arc<dyn Fn(Model) -> BoxFuture<'static, Result<T, ClientError>> + Send + Sync>;

/// Describes one remote call and the actions that frame it. The
/// closure captures the call's arguments; invoking the descriptor again
/// issues a fresh call.
pub struct ClientCall<T> {
    client_func: ClientFunc<T>,
    on_request: Option<ActionType>,
    on_success: Vec<SuccessTarget>,
    on_failure: Option<ActionType>,
}

impl<T> Clone for ClientCall<T> {
    fn clone(&self) -> Self {
        Self {
            client_func: self.client_func.clone(),
            on_request: self.on_request,
            on_success: self.on_success.clone(),
            on_failure: self.on_failure,
        }
    }
}

impl<T> std::fmt::Debug for ClientCall<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCall")
            .field("on_request", &self.on_request)
            .field("on_success", &self.on_success)
            .field("on_failure", &self.on_failure)
            .finish()
    }
}

impl<T: 'static> ClientCall<T> {
    pub fn new<F, Fut>(client_func: F) -> Self
    where
        F: Fn(Model) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        Self {
            client_func: Arc::new(move |model: Model| client_func(model).boxed()),
            on_request: None,
            on_success: Vec::new(),
            on_failure: None,
        }
    }

    pub fn on_request(mut self, kind: ActionType) -> Self {
        self.on_request = Some(kind);
        self
    }

    /// Append a success dispatch; they run in the order they were added
    pub fn on_success(mut self, target: SuccessTarget) -> Self {
        self.on_success.push(target);
        self
    }

    pub fn on_failure(mut self, kind: ActionType) -> Self {
        self.on_failure = Some(kind);
        self
    }
}

pub fn request_data(kind: ActionType) -> Action {
    Action::new(kind)
}

pub fn request_success<T: Serialize>(target: SuccessTarget, data: &T) -> Action {
    if target.carries_data {
        Action::with_data(target.kind, data)
    } else {
        Action::new(target.kind)
    }
}

pub fn request_failure(kind: ActionType, error: ClientError) -> Action {
    Action::with_error(kind, error)
}

/// Run `call` once and translate its outcome into actions:
///
/// - `on_request` (if any) is dispatched before the call starts
/// - on success every `on_success` target is dispatched in order and the
///   raw value is returned
/// - on failure the session check runs, then the error log entry and the
///   `on_failure` action (if any) are dispatched as one batch
///
/// No retries. Every kind of failure is treated the same way.
pub async fn bind_client_func<T: Serialize>(
    env: &Environment,
    call: &ClientCall<T>,
) -> ActionResult<T> {
    if let Some(kind) = call.on_request {
        env.dispatch(request_data(kind));
    }

    match (call.client_func)(env.model.clone()).await {
        Ok(data) => {
            for target in &call.on_success {
                env.dispatch(request_success(*target, &data));
            }
            Ok(data)
        }
        Err(error) => {
            force_logout_if_necessary(env, &error);
            let mut actions = Vec::with_capacity(2);
            actions.extend(prepare_log_error(env, &error, false));
            if let Some(kind) = call.on_failure {
                actions.push(request_failure(kind, error.clone()));
            }
            env.batch(actions);
            Err(error)
        }
    }
}

/// Log the user out locally when `error` says the session is gone.
///
/// Requires a 401, a request url outside the login endpoint and a signed
/// in user. Clears the token before dispatching `LogoutSuccess`. Returns
/// whether the logout happened.
pub fn force_logout_if_necessary(env: &Environment, error: &ClientError) -> bool {
    if !error.is_unauthorized() {
        return false;
    }
    let Some(url) = error.url.as_deref() else {
        return false;
    };
    if url.is_empty() || url.contains(LOGIN_PATH) {
        return false;
    }
    if env.current_user_id().is_empty() {
        return false;
    }

    log::debug!("Session rejected by {url}, logging out");
    env.model.session().set_token("");
    env.dispatch(Action::with_data(
        ActionType::LogoutSuccess,
        &serde_json::json!({}),
    ));
    true
}
