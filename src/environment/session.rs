use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

/// Connection state shared by every clone of a `Model`.
///
/// Holds the server url and the bearer token explicitly instead of
/// keeping them as process-wide globals. All setters take `&self` so a
/// session can sit behind an `Arc` and be updated from any action.
#[derive(Debug, Default)]
pub struct Session {
    url: RwLock<String>,
    token: RwLock<String>,
    user_id: RwLock<String>,
    user_agent: RwLock<Option<String>>,
    accept_language: RwLock<Option<String>>,
    enable_logging: AtomicBool,
}

impl Session {
    pub fn new(url: impl Into<String>) -> Self {
        let session = Self::default();
        session.set_url(url);
        session
    }

    pub fn url(&self) -> String {
        read(&self.url)
    }

    pub fn set_url(&self, url: impl Into<String>) {
        let url: String = url.into();
        write(&self.url, url.trim_end_matches('/').to_string());
    }

    pub fn token(&self) -> String {
        read(&self.token)
    }

    pub fn set_token(&self, token: impl Into<String>) {
        write(&self.token, token.into());
    }

    pub fn has_token(&self) -> bool {
        !self.token().is_empty()
    }

    pub fn user_id(&self) -> String {
        read(&self.user_id)
    }

    pub fn set_user_id(&self, user_id: impl Into<String>) {
        write(&self.user_id, user_id.into());
    }

    pub fn user_agent(&self) -> Option<String> {
        read(&self.user_agent)
    }

    pub fn set_user_agent(&self, user_agent: Option<String>) {
        write(&self.user_agent, user_agent);
    }

    pub fn accept_language(&self) -> Option<String> {
        read(&self.accept_language)
    }

    pub fn set_accept_language(&self, locale: Option<String>) {
        write(&self.accept_language, locale);
    }

    pub fn logging_enabled(&self) -> bool {
        self.enable_logging.load(Ordering::SeqCst)
    }

    pub fn set_enable_logging(&self, enable: bool) {
        self.enable_logging.store(enable, Ordering::SeqCst);
    }

    /// Forget everything that identifies the signed in user
    pub fn clear(&self) {
        self.set_token("");
        self.set_user_id("");
    }
}

fn read<T: Clone>(lock: &RwLock<T>) -> T {
    lock.read().unwrap_or_else(PoisonError::into_inner).clone()
}

fn write<T>(lock: &RwLock<T>, value: T) {
    *lock.write().unwrap_or_else(PoisonError::into_inner) = value;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_is_stored_without_trailing_slash() {
        let session = Session::new("https://chat.example.com/");
        assert_eq!(session.url(), "https://chat.example.com");
    }

    #[test]
    fn clear_drops_token_and_user() {
        let session = Session::new("https://chat.example.com");
        session.set_token("abc");
        session.set_user_id("u1");
        assert!(session.has_token());

        session.clear();
        assert!(!session.has_token());
        assert_eq!(session.user_id(), "");
    }
}
