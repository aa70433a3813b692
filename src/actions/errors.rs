use super::action::{Action, ActionType};
use super::ActionResult;
use crate::environment::error::ClientError;
use crate::environment::Environment;

/// The server already knows about these; reporting them again is noise.
const SESSION_EXPIRED: &str = "api.context.session_expired.app_error";
const LOG_LEVEL: &str = "ERROR";

/// Record `error` in the store and, when useful, forward it to the
/// server log.
pub fn log_error(env: &Environment, error: &ClientError, displayable: bool) -> ActionResult<bool> {
    if let Some(action) = prepare_log_error(env, error, displayable) {
        env.dispatch(action);
    }
    Ok(true)
}

pub fn clear_errors(env: &Environment) -> ActionResult<bool> {
    env.dispatch(Action::new(ActionType::ClearErrors));
    Ok(true)
}

pub fn dismiss_error(env: &Environment, index: usize) -> ActionResult<bool> {
    env.dispatch(Action::with_data(ActionType::DismissError, &index));
    Ok(true)
}

/// Build the `LogError` action without dispatching it, so callers can
/// batch it with their own failure action. Starts the server report in
/// the background. `None` for expired sessions, which are not logged.
pub(crate) fn prepare_log_error(
    env: &Environment,
    error: &ClientError,
    displayable: bool,
) -> Option<Action> {
    if error.server_error_id.as_deref() == Some(SESSION_EXPIRED) {
        return None;
    }

    if should_report(error) {
        let model = env.model.clone();
        match serde_json::to_string(error) {
            Ok(message) => env.store.spawn(async move {
                if let Err(e) = model.log_client_error(&message, LOG_LEVEL).await {
                    log::debug!("Could not report error to server: {e}");
                }
            }),
            Err(e) => log::error!("Could not serialize {error:?}: {e:?}"),
        }
    }

    Some(Action::with_error(ActionType::LogError, error.clone()).displayable(displayable))
}

/// Server tagged errors came from the server; transport failures can't
/// reach it anyway.
fn should_report(error: &ClientError) -> bool {
    error.server_error_id.is_none() && !error.is_transport_failure()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::testing::environment;
    use reqwest::Method;
    use serde_json::json;

    #[tokio::test]
    async fn session_expired_is_not_logged() {
        let (env, transport) = environment();
        env.model.session().set_enable_logging(true);
        let error = ClientError::new("expired")
            .with_status(401)
            .with_server_error_id(SESSION_EXPIRED);

        log_error(&env, &error, true).unwrap();
        env.store.settle().await;

        assert!(env.get_state().errors.is_empty());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn server_tagged_errors_are_stored_but_not_reported() {
        let (env, transport) = environment();
        env.model.session().set_enable_logging(true);
        let error = ClientError::new("denied")
            .with_status(403)
            .with_server_error_id("api.context.permissions.app_error");

        log_error(&env, &error, true).unwrap();
        env.store.settle().await;

        let errors = env.get_state().errors;
        assert_eq!(errors.len(), 1);
        assert!(errors[0].displayable);
        assert_eq!(errors[0].error, error);
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn transport_failures_are_not_reported() {
        let (env, transport) = environment();
        env.model.session().set_enable_logging(true);

        log_error(&env, &ClientError::connection("http://chat.local/api/v4/users/me"), false).unwrap();
        env.store.settle().await;

        assert_eq!(env.get_state().errors.len(), 1);
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn untagged_errors_are_reported() {
        let (env, transport) = environment();
        env.model.session().set_enable_logging(true);
        transport.respond(Method::POST, "/api/v4/logs", 200, json!({"message": "ok"}));
        let error = ClientError::new("Received invalid response from the server.")
            .with_url("http://chat.local/api/v4/users/me");

        log_error(&env, &error, false).unwrap();
        env.store.settle().await;

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        let body: serde_json::Value =
            serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body["level"], "ERROR");
        let reported: ClientError =
            serde_json::from_str(body["message"].as_str().unwrap()).unwrap();
        assert_eq!(reported, error);
    }

    #[tokio::test]
    async fn failed_report_is_swallowed() {
        let (env, transport) = environment();
        env.model.session().set_enable_logging(true);
        transport.drop_connection(Method::POST, "/api/v4/logs");

        log_error(&env, &ClientError::new("odd").with_status(500), false).unwrap();
        env.store.settle().await;

        assert_eq!(env.get_state().errors.len(), 1);
    }

    #[test]
    fn recorded_without_a_runtime() {
        let (env, _) = environment();
        env.model.session().set_enable_logging(true);

        log_error(&env, &ClientError::new("odd").with_status(500), false).unwrap();

        assert_eq!(env.get_state().errors.len(), 1);
    }

    #[tokio::test]
    async fn dismiss_and_clear() {
        let (env, _) = environment();
        for message in ["a", "b", "c"] {
            log_error(&env, &ClientError::connection(message), false).unwrap();
        }
        dismiss_error(&env, 1).unwrap();
        let messages: Vec<_> = env
            .get_state()
            .errors
            .iter()
            .map(|e| e.error.url.clone().unwrap_or_default())
            .collect();
        assert_eq!(messages, vec!["a", "c"]);

        clear_errors(&env).unwrap();
        assert!(env.get_state().errors.is_empty());
    }
}
