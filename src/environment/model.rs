pub use super::entities::*;
pub use super::error::ClientError;

use super::entities::ServerErrorBody;
use super::error::INVALID_RESPONSE;
use super::session::Session;
use super::transport::{Request, Response, Transport};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

const API_VERSION: &str = "/api/v4";
const HEADER_AUTH: &str = "authorization";
const HEADER_BEARER: &str = "BEARER";
const HEADER_REQUESTED_WITH: &str = "x-requested-with";
const HEADER_TOKEN: &str = "token";

/// Remote client for the chat server. Every call returns either the
/// decoded entity or a `ClientError`; nothing here touches the store.
#[derive(Clone)]
pub struct Model {
    session: Arc<Session>,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("url", &self.session.url())
            .field("has_token", &self.session.has_token())
            .finish()
    }
}

impl Model {
    pub fn new(session: Arc<Session>, transport: Arc<dyn Transport>) -> Self {
        Self { session, transport }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    // Routes

    fn base_route(&self) -> String {
        format!("{}{API_VERSION}", self.session.url())
    }

    fn users_route(&self) -> String {
        format!("{}/users", self.base_route())
    }

    fn user_route(&self, user_id: &str) -> String {
        format!("{}/{user_id}", self.users_route())
    }

    fn post_route(&self, post_id: &str) -> String {
        format!("{}/posts/{post_id}", self.base_route())
    }

    fn preferences_route(&self, user_id: &str) -> String {
        format!("{}/preferences", self.user_route(user_id))
    }

    // User Routes

    pub async fn check_user_mfa(&self, login_id: &str) -> Result<MfaRequired, ClientError> {
        log::trace!("Check MFA");
        self.fetch(
            Method::POST,
            format!("{}/mfa", self.users_route()),
            Some(json!({ "login_id": login_id })),
        )
        .await
        .api_error("check_user_mfa")
    }

    /// Log in and adopt the session token the server hands back, if any
    pub async fn login(
        &self,
        login_id: &str,
        password: &str,
        mfa_token: &str,
        device_id: &str,
        ldap_only: bool,
    ) -> Result<UserProfile, ClientError> {
        log::trace!("Login");
        let mut body = json!({
            "device_id": device_id,
            "login_id": login_id,
            "password": password,
            "token": mfa_token,
        });
        if ldap_only {
            body["ldap_only"] = json!("true");
        }

        let (user, response) = self
            .fetch_with_response::<UserProfile>(
                Method::POST,
                format!("{}/login", self.users_route()),
                Some(body),
            )
            .await
            .api_error("login")?;

        if let Some(token) = response
            .headers
            .get(HEADER_TOKEN)
            .and_then(|v| v.to_str().ok())
        {
            self.session.set_token(token);
        }
        self.session.set_user_id(user.id.clone());
        Ok(user)
    }

    pub async fn logout(&self) -> Result<StatusOk, ClientError> {
        log::trace!("Logout");
        let (status, response) = self
            .fetch_with_response::<StatusOk>(
                Method::POST,
                format!("{}/logout", self.users_route()),
                None::<()>,
            )
            .await
            .api_error("logout")?;
        if response.is_ok() {
            self.session.set_token("");
        }
        Ok(status)
    }

    pub async fn get_me(&self) -> Result<UserProfile, ClientError> {
        self.fetch(Method::GET, self.user_route("me"), None::<()>)
            .await
            .api_error("get_me")
    }

    pub async fn get_user(&self, user_id: &str) -> Result<UserProfile, ClientError> {
        self.fetch(Method::GET, self.user_route(user_id), None::<()>)
            .await
            .api_error("get_user")
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<UserProfile, ClientError> {
        let url = format!(
            "{}/username/{}",
            self.users_route(),
            urlencoding::encode(username)
        );
        self.fetch(Method::GET, url, None::<()>)
            .await
            .api_error("get_user_by_username")
    }

    // Post Routes

    pub async fn get_post(&self, post_id: &str) -> Result<Post, ClientError> {
        self.fetch(Method::GET, self.post_route(post_id), None::<()>)
            .await
            .api_error("get_post")
    }

    pub async fn patch_post(&self, patch: &PostPatch) -> Result<Post, ClientError> {
        self.fetch(
            Method::PUT,
            format!("{}/patch", self.post_route(&patch.id)),
            Some(patch),
        )
        .await
        .api_error("patch_post")
    }

    pub async fn delete_post(&self, post_id: &str) -> Result<StatusOk, ClientError> {
        self.fetch(Method::DELETE, self.post_route(post_id), None::<()>)
            .await
            .api_error("delete_post")
    }

    pub async fn pin_post(&self, post_id: &str) -> Result<StatusOk, ClientError> {
        self.fetch(
            Method::POST,
            format!("{}/pin", self.post_route(post_id)),
            None::<()>,
        )
        .await
        .api_error("pin_post")
    }

    pub async fn unpin_post(&self, post_id: &str) -> Result<StatusOk, ClientError> {
        self.fetch(
            Method::POST,
            format!("{}/unpin", self.post_route(post_id)),
            None::<()>,
        )
        .await
        .api_error("unpin_post")
    }

    pub async fn add_reaction(
        &self,
        user_id: &str,
        post_id: &str,
        emoji_name: &str,
    ) -> Result<Reaction, ClientError> {
        self.fetch(
            Method::POST,
            format!("{}/reactions", self.base_route()),
            Some(json!({
                "user_id": user_id,
                "post_id": post_id,
                "emoji_name": emoji_name,
            })),
        )
        .await
        .api_error("add_reaction")
    }

    pub async fn remove_reaction(
        &self,
        user_id: &str,
        post_id: &str,
        emoji_name: &str,
    ) -> Result<StatusOk, ClientError> {
        let url = format!(
            "{}/posts/{post_id}/reactions/{}",
            self.user_route(user_id),
            urlencoding::encode(emoji_name)
        );
        self.fetch(Method::DELETE, url, None::<()>)
            .await
            .api_error("remove_reaction")
    }

    // Preference Routes

    pub async fn save_preferences(
        &self,
        user_id: &str,
        preferences: &[Preference],
    ) -> Result<StatusOk, ClientError> {
        self.fetch(
            Method::PUT,
            self.preferences_route(user_id),
            Some(preferences),
        )
        .await
        .api_error("save_preferences")
    }

    pub async fn delete_preferences(
        &self,
        user_id: &str,
        preferences: &[Preference],
    ) -> Result<StatusOk, ClientError> {
        self.fetch(
            Method::POST,
            format!("{}/delete", self.preferences_route(user_id)),
            Some(preferences),
        )
        .await
        .api_error("delete_preferences")
    }

    pub async fn get_my_preferences(&self) -> Result<Vec<Preference>, ClientError> {
        self.fetch(Method::GET, self.preferences_route("me"), None::<()>)
            .await
            .api_error("get_my_preferences")
    }

    // General Routes

    /// Forward a client side error to the server log. Refused locally
    /// unless logging was enabled for this session.
    pub async fn log_client_error(
        &self,
        message: &str,
        level: &str,
    ) -> Result<serde_json::Value, ClientError> {
        let url = format!("{}/logs", self.base_route());
        if !self.session.logging_enabled() {
            return Err(ClientError::new("Logging disabled.").with_url(url));
        }
        self.fetch(
            Method::POST,
            url,
            Some(json!({ "message": message, "level": level })),
        )
        .await
    }

    // Client Helpers

    async fn fetch<T: DeserializeOwned>(
        &self,
        method: Method,
        url: String,
        body: Option<impl Serialize>,
    ) -> Result<T, ClientError> {
        self.fetch_with_response(method, url, body)
            .await
            .map(|(data, _)| data)
    }

    async fn fetch_with_response<T: DeserializeOwned>(
        &self,
        method: Method,
        url: String,
        body: Option<impl Serialize>,
    ) -> Result<(T, Response), ClientError> {
        let body = match body {
            Some(body) => Some(serde_json::to_string(&body).map_err(|e| {
                ClientError::new(format!("Could not encode request: {e}")).with_url(url.clone())
            })?),
            None => None,
        };
        let request = Request {
            method,
            url: url.clone(),
            headers: self.headers(body.is_some()),
            body,
        };

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                log::debug!("Transport failure for {url}: {e}");
                return Err(ClientError::connection(url));
            }
        };

        let Ok(data) = serde_json::from_slice::<serde_json::Value>(&response.body) else {
            return Err(ClientError::new(INVALID_RESPONSE).with_url(url));
        };

        if response.is_ok() {
            let data = serde_json::from_value::<T>(data)
                .map_err(|_| ClientError::new(INVALID_RESPONSE).with_url(url.clone()))?;
            return Ok((data, response));
        }

        let server = serde_json::from_value::<ServerErrorBody>(data).unwrap_or_default();
        Err(ClientError {
            message: server.message.unwrap_or_default(),
            url: Some(url),
            status_code: server.status_code.or(Some(response.status)),
            server_error_id: server.id,
        })
    }

    fn headers(&self, has_body: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(HEADER_REQUESTED_WITH),
            HeaderValue::from_static("XMLHttpRequest"),
        );
        if has_body {
            headers.insert(
                reqwest::header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
        }
        let token = self.session.token();
        if !token.is_empty() {
            if let Ok(value) = HeaderValue::from_str(&format!("{HEADER_BEARER} {token}")) {
                headers.insert(HeaderName::from_static(HEADER_AUTH), value);
            }
        }
        if let Some(agent) = self.session.user_agent() {
            if let Ok(value) = HeaderValue::from_str(&agent) {
                headers.insert(reqwest::header::USER_AGENT, value);
            }
        }
        if let Some(locale) = self.session.accept_language() {
            if let Ok(value) = HeaderValue::from_str(&locale) {
                headers.insert(reqwest::header::ACCEPT_LANGUAGE, value);
            }
        }
        headers
    }
}

trait ResultExt {
    fn api_error(self, call: &'static str) -> Self;
}

impl<T> ResultExt for Result<T, ClientError> {
    fn api_error(self, call: &'static str) -> Self {
        self.map_err(|e| {
            log::error!("API Error: {call} {e:?}");
            e
        })
    }
}
