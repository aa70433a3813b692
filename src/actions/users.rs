use super::action::{Action, ActionType};
use super::errors::prepare_log_error;
use super::helpers::{bind_client_func, ClientCall};
use super::{ActionResult, SuccessTarget};
use crate::environment::entities::UserProfile;
use crate::environment::error::ClientError;
use crate::environment::Environment;

pub async fn check_mfa(env: &Environment, login_id: &str) -> ActionResult<bool> {
    env.dispatch(Action::new(ActionType::CheckMfaRequest));
    match env.model.check_user_mfa(login_id).await {
        Ok(data) => {
            env.dispatch(Action::new(ActionType::CheckMfaSuccess));
            Ok(data.mfa_required)
        }
        Err(error) => Err(fail(env, ActionType::CheckMfaFailure, error)),
    }
}

/// Sign in, then load what a fresh session needs. A 401 here means bad
/// credentials, so no logout is forced.
pub async fn login(
    env: &Environment,
    login_id: &str,
    password: &str,
    mfa_token: &str,
    device_id: &str,
    ldap_only: bool,
) -> ActionResult<UserProfile> {
    env.dispatch(Action::new(ActionType::LoginRequest));

    let user = match env
        .model
        .login(login_id, password, mfa_token, device_id, ldap_only)
        .await
    {
        Ok(user) => user,
        Err(error) => return Err(fail(env, ActionType::LoginFailure, error)),
    };

    env.dispatch(Action::with_data(ActionType::ReceivedMe, &user));

    match env.model.get_my_preferences().await {
        Ok(preferences) => {
            env.batch(vec![
                Action::with_data(ActionType::ReceivedAllPreferences, &preferences),
                Action::new(ActionType::LoginSuccess),
            ]);
            log::debug!("Logged in as {} ({})", user.username, user.role_list().join(","));
            Ok(user)
        }
        Err(error) => Err(fail(env, ActionType::LoginFailure, error)),
    }
}

/// Always ends signed out, whatever the server says.
pub async fn logout(env: &Environment) -> ActionResult<bool> {
    env.dispatch(Action::new(ActionType::LogoutRequest));
    if let Err(e) = env.model.logout().await {
        log::debug!("Server logout failed, signing out locally: {e}");
    }
    env.model.session().clear();
    env.dispatch(Action::new(ActionType::LogoutSuccess));
    Ok(true)
}

pub async fn get_me(env: &Environment) -> ActionResult<UserProfile> {
    let call = ClientCall::new(|model| async move { model.get_me().await })
        .on_success(SuccessTarget::data(ActionType::ReceivedMe));
    bind_client_func(env, &call).await
}

pub async fn get_user(env: &Environment, user_id: &str) -> ActionResult<UserProfile> {
    let user_id = user_id.to_string();
    let call = ClientCall::new(move |model| {
        let user_id = user_id.clone();
        async move { model.get_user(&user_id).await }
    });
    bind_client_func(env, &profile_call(call)).await
}

pub async fn get_user_by_username(env: &Environment, username: &str) -> ActionResult<UserProfile> {
    let username = username.to_string();
    let call = ClientCall::new(move |model| {
        let username = username.clone();
        async move { model.get_user_by_username(&username).await }
    });
    bind_client_func(env, &profile_call(call)).await
}

fn profile_call(call: ClientCall<UserProfile>) -> ClientCall<UserProfile> {
    call.on_request(ActionType::ProfileRequest)
        .on_success(SuccessTarget::data(ActionType::ReceivedProfile))
        .on_success(SuccessTarget::marker(ActionType::ProfileSuccess))
        .on_failure(ActionType::ProfileFailure)
}

/// Record a failure that must not trigger the session check
fn fail(env: &Environment, kind: ActionType, error: ClientError) -> ClientError {
    let mut actions = vec![Action::with_error(kind, error.clone())];
    actions.extend(prepare_log_error(env, &error, false));
    env.batch(actions);
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::storage::RequestStatus;
    use crate::environment::testing::{environment, signed_in};
    use reqwest::Method;
    use serde_json::json;

    fn kinds(receiver: &flume::Receiver<Action>) -> Vec<ActionType> {
        receiver.try_iter().map(|a| a.kind).collect()
    }

    #[tokio::test]
    async fn check_mfa_returns_requirement() {
        let (env, transport) = environment();
        transport.respond(Method::POST, "/api/v4/users/mfa", 200, json!({"mfa_required": true}));

        assert_eq!(check_mfa(&env, "alice").await, Ok(true));
        assert_eq!(env.get_state().requests.check_mfa.status, RequestStatus::Success);
    }

    #[tokio::test]
    async fn login_loads_session() {
        let (env, transport) = environment();
        transport.respond_with_header(
            Method::POST,
            "/api/v4/users/login",
            json!({"id": "u1", "username": "alice", "roles": "system_user"}),
            ("token", "fresh"),
        );
        transport.respond(
            Method::GET,
            "/api/v4/users/me/preferences",
            200,
            json!([{"user_id": "u1", "category": "display_settings", "name": "theme", "value": "dark"}]),
        );
        let receiver = env.store.subscribe();

        let user = login(&env, "alice", "pw", "", "", false).await.unwrap();

        assert_eq!(user.id, "u1");
        assert_eq!(
            kinds(&receiver),
            vec![
                ActionType::LoginRequest,
                ActionType::ReceivedMe,
                ActionType::ReceivedAllPreferences,
                ActionType::LoginSuccess
            ]
        );
        assert_eq!(env.model.session().token(), "fresh");
        assert_eq!(env.model.session().user_id(), "u1");
        let state = env.get_state();
        assert_eq!(state.current_user_id(), "u1");
        assert_eq!(state.requests.login.status, RequestStatus::Success);
        assert!(state.preference("display_settings", "theme").is_some());
    }

    #[tokio::test]
    async fn rejected_login_does_not_log_out() {
        let (env, transport) = signed_in();
        transport.respond(
            Method::POST,
            "/api/v4/users/login",
            401,
            json!({
                "id": "api.user.login.invalid_credentials_email_username",
                "message": "Enter a valid email or username and/or password.",
                "status_code": 401
            }),
        );
        let receiver = env.store.subscribe();

        let error = login(&env, "alice", "wrong", "", "", false).await.unwrap_err();

        assert_eq!(error.status_code, Some(401));
        assert_eq!(
            kinds(&receiver),
            vec![
                ActionType::LoginRequest,
                ActionType::LoginFailure,
                ActionType::LogError
            ]
        );
        assert_eq!(env.model.session().token(), "token");
        let state = env.get_state();
        assert_eq!(state.current_user_id(), "u1");
        assert_eq!(state.requests.login.status, RequestStatus::Failure);
        assert_eq!(state.requests.login.error, Some(error));
    }

    #[tokio::test]
    async fn login_fails_when_preferences_do() {
        let (env, transport) = environment();
        transport.respond(
            Method::POST,
            "/api/v4/users/login",
            200,
            json!({"id": "u1", "username": "alice"}),
        );
        transport.drop_connection(Method::GET, "/api/v4/users/me/preferences");
        let receiver = env.store.subscribe();

        let error = login(&env, "alice", "pw", "", "", false).await.unwrap_err();

        assert!(error.is_transport_failure());
        assert_eq!(
            kinds(&receiver),
            vec![
                ActionType::LoginRequest,
                ActionType::ReceivedMe,
                ActionType::LoginFailure,
                ActionType::LogError
            ]
        );
    }

    #[tokio::test]
    async fn logout_signs_out_even_when_server_fails() {
        let (env, transport) = signed_in();
        transport.drop_connection(Method::POST, "/api/v4/users/logout");
        let receiver = env.store.subscribe();

        assert_eq!(logout(&env).await, Ok(true));

        assert_eq!(
            kinds(&receiver),
            vec![ActionType::LogoutRequest, ActionType::LogoutSuccess]
        );
        assert_eq!(env.model.session().token(), "");
        assert_eq!(env.model.session().user_id(), "");
        assert_eq!(env.current_user_id(), "");
    }

    #[tokio::test]
    async fn get_user_stores_profile() {
        let (env, transport) = signed_in();
        transport.respond(
            Method::GET,
            "/api/v4/users/u2",
            200,
            json!({"id": "u2", "username": "bob"}),
        );

        let user = get_user(&env, "u2").await.unwrap();

        assert_eq!(user.username, "bob");
        let state = env.get_state();
        assert_eq!(state.entities.users.profiles["u2"], user);
        assert_eq!(state.current_user_id(), "u1");
        assert_eq!(state.requests.get_profile.status, RequestStatus::Success);
    }

    #[tokio::test]
    async fn get_user_by_username_failure_is_recorded() {
        let (env, _) = signed_in();

        let error = get_user_by_username(&env, "nobody").await.unwrap_err();

        assert_eq!(error.status_code, Some(404));
        let state = env.get_state();
        assert_eq!(state.requests.get_profile.status, RequestStatus::Failure);
        assert_eq!(state.errors.len(), 1);
        assert_eq!(env.current_user_id(), "u1");
    }

    #[tokio::test]
    async fn expired_session_on_get_me_logs_out() {
        let (env, transport) = signed_in();
        transport.respond(
            Method::GET,
            "/api/v4/users/me",
            401,
            json!({"id": "api.context.session_expired.app_error", "message": "Invalid or expired session", "status_code": 401}),
        );
        let receiver = env.store.subscribe();

        assert!(get_me(&env).await.is_err());

        assert_eq!(kinds(&receiver), vec![ActionType::LogoutSuccess]);
        assert_eq!(env.model.session().token(), "");
        assert!(env.get_state().errors.is_empty());
    }
}
