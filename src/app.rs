use std::sync::Arc;

use anyhow::Context;

use crate::actions::users;
use crate::environment::session::Session;
use crate::environment::transport::{ReqwestTransport, Transport};
use crate::environment::types::{Config, SavedUser};
use crate::environment::{Environment, Model, Repository, Store};

pub fn init_logging(filter: &str) {
    use env_logger::Env;
    use std::io::Write;
    let result = env_logger::Builder::from_env(Env::default().default_filter_or(filter))
        .format(|buf, record| {
            writeln!(
                buf,
                "{}:{} {} [{}] - {}",
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .target(env_logger::Target::Stdout)
        .try_init();
    if let Err(e) = result {
        log::debug!("Logger already initialized: {e}");
    }
}

/// Load the config, set up logging and the repository, then connect.
pub async fn run() -> anyhow::Result<(Environment, Repository)> {
    let config = Config::from_env()?;
    init_logging(&config.log_filter);
    let repository = match &config.data_dir {
        Some(dir) => Repository::new(dir.clone())?,
        None => Repository::default_location()?,
    };
    let transport = Arc::new(ReqwestTransport::default());
    let environment = connect(&config, &repository, transport).await?;
    Ok((environment, repository))
}

/// Build an environment for the configured server. Falls back to the most
/// recently saved user for the url and token. With a token at hand the
/// current user is loaded and remembered.
pub async fn connect(
    config: &Config,
    repository: &Repository,
    transport: Arc<dyn Transport>,
) -> anyhow::Result<Environment> {
    let saved = repository.users().into_iter().find(|user| {
        config
            .server_url
            .as_ref()
            .map_or(true, |url| *url == user.server_url)
    });

    let url = config
        .server_url
        .clone()
        .or_else(|| saved.as_ref().map(|user| user.server_url.clone()))
        .context("No server configured, set HUDDLE_SERVER_URL")?;
    let token = config
        .token
        .clone()
        .or_else(|| saved.as_ref().map(|user| user.token.clone()))
        .unwrap_or_default();

    let session = Session::new(url);
    session.set_token(token);
    session.set_user_agent(config.user_agent.clone());
    session.set_accept_language(config.locale.clone());
    session.set_enable_logging(config.enable_logging);

    let environment = Environment::new(Model::new(Arc::new(session), transport), Store::default());
    if !environment.model.session().has_token() {
        log::info!("No token for {}, login required", environment.model.session().url());
        return Ok(environment);
    }

    match users::get_me(&environment).await {
        Ok(me) => {
            environment.model.session().set_user_id(me.id.clone());
            remember(&environment, repository)?;
        }
        Err(e) => log::warn!("Could not restore session: {e}"),
    }
    Ok(environment)
}

/// Save the signed in user of `environment` for the next start
pub fn remember(environment: &Environment, repository: &Repository) -> anyhow::Result<()> {
    let session = environment.model.session();
    let Some(me) = environment.store.with(|s| s.current_user().cloned()) else {
        anyhow::bail!("Nobody is signed in");
    };
    repository.update_or_insert_user(SavedUser::new(session.url(), &me, session.token()))
}

/// Sign out and forget the saved user
pub async fn sign_out(environment: &Environment, repository: &Repository) -> anyhow::Result<()> {
    let user_id = environment.current_user_id();
    if let Err(e) = users::logout(environment).await {
        log::debug!("Logout failed: {e}");
    }
    if !user_id.is_empty() {
        repository.remove_user(&user_id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::transport::mock::MockTransport;
    use reqwest::Method;
    use serde_json::json;

    fn config() -> Config {
        Config {
            server_url: Some("http://chat.local".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn connect_without_token_needs_login() {
        let dir = tempfile::tempdir().unwrap();
        let repository = Repository::new(dir.path().to_path_buf()).unwrap();
        let transport = Arc::new(MockTransport::default());

        let env = connect(&config(), &repository, transport.clone()).await.unwrap();

        assert!(!env.model.session().has_token());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn connect_restores_and_remembers_user() {
        let dir = tempfile::tempdir().unwrap();
        let repository = Repository::new(dir.path().to_path_buf()).unwrap();
        let transport = Arc::new(MockTransport::default());
        transport.respond(
            Method::GET,
            "/api/v4/users/me",
            200,
            json!({"id": "u1", "username": "alice"}),
        );
        let config = Config {
            token: Some("abc".to_string()),
            user_agent: Some("huddle-test".to_string()),
            ..config()
        };

        let env = connect(&config, &repository, transport.clone()).await.unwrap();

        assert_eq!(env.current_user_id(), "u1");
        assert_eq!(env.model.session().user_id(), "u1");
        let request = &transport.requests()[0];
        assert_eq!(request.headers.get("user-agent").unwrap(), "huddle-test");
        let saved = repository.users();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].token, "abc");
        assert_eq!(saved[0].server_url, "http://chat.local");
    }

    #[tokio::test]
    async fn saved_user_supplies_url_and_token() {
        let dir = tempfile::tempdir().unwrap();
        let repository = Repository::new(dir.path().to_path_buf()).unwrap();
        repository
            .update_or_insert_user(SavedUser {
                id: "u1".to_string(),
                username: "alice".to_string(),
                last_login: chrono::Utc::now(),
                server_url: "http://chat.local".to_string(),
                token: "saved".to_string(),
            })
            .unwrap();
        let transport = Arc::new(MockTransport::default());
        transport.respond(Method::GET, "/api/v4/users/me", 401, json!({"message": "expired"}));

        let env = connect(&Config::default(), &repository, transport.clone())
            .await
            .unwrap();

        let request = &transport.requests()[0];
        assert_eq!(request.url, "http://chat.local/api/v4/users/me");
        assert_eq!(request.headers.get("authorization").unwrap(), "BEARER saved");
        assert_eq!(env.current_user_id(), "");
        env.store.settle().await;
    }

    #[tokio::test]
    async fn connect_needs_a_server() {
        let dir = tempfile::tempdir().unwrap();
        let repository = Repository::new(dir.path().to_path_buf()).unwrap();
        let transport = Arc::new(MockTransport::default());
        assert!(connect(&Config::default(), &repository, transport).await.is_err());
    }

    #[tokio::test]
    async fn sign_out_forgets_user() {
        let dir = tempfile::tempdir().unwrap();
        let repository = Repository::new(dir.path().to_path_buf()).unwrap();
        let transport = Arc::new(MockTransport::default());
        transport.respond(
            Method::GET,
            "/api/v4/users/me",
            200,
            json!({"id": "u1", "username": "alice"}),
        );
        transport.respond(Method::POST, "/api/v4/users/logout", 200, json!({"status": "OK"}));
        let config = Config {
            token: Some("abc".to_string()),
            ..config()
        };
        let env = connect(&config, &repository, transport).await.unwrap();

        sign_out(&env, &repository).await.unwrap();

        assert!(repository.users().is_empty());
        assert!(!env.model.session().has_token());
    }
}
