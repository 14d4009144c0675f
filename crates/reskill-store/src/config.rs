use std::env;

/// Realtime Database configuration.
///
/// Reads from the `RESKILL_DATABASE_URL` environment variable, falling back
/// to the local database emulator when unset.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Root URL of the database, e.g. `https://<project>-default-rtdb.firebaseio.com`.
    pub database_url: String,
}

impl StoreConfig {
    /// The default URL used when no environment variable is set (emulator port).
    pub const DEFAULT_URL: &str = "http://127.0.0.1:9000";

    /// Build a config from the environment.
    ///
    /// Priority: `RESKILL_DATABASE_URL` env var, then the compile-time default.
    pub fn from_env() -> Self {
        let database_url =
            env::var("RESKILL_DATABASE_URL").unwrap_or_else(|_| Self::DEFAULT_URL.to_owned());
        Self::new(database_url)
    }

    /// Build a config from an explicit URL (useful for tests and CLI flags).
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    /// Database URL without a trailing slash, ready for path joining.
    pub fn base_url(&self) -> &str {
        self.database_url.trim_end_matches('/')
    }

    /// Host portion of the URL (no scheme, port or path).
    ///
    /// Returns `None` if the URL has no recognizable host.
    pub fn host(&self) -> Option<&str> {
        let rest = self
            .database_url
            .split_once("://")
            .map_or(self.database_url.as_str(), |(_, r)| r);
        rest.split(['/', ':', '?'])
            .next()
            .filter(|h| !h.is_empty())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_url() {
        let cfg = StoreConfig::new(StoreConfig::DEFAULT_URL);
        assert_eq!(cfg.base_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn base_url_strips_trailing_slash() {
        let cfg = StoreConfig::new("https://demo-default-rtdb.firebaseio.com/");
        assert_eq!(cfg.base_url(), "https://demo-default-rtdb.firebaseio.com");
    }

    #[test]
    fn host_extraction() {
        let cfg = StoreConfig::new("https://demo-default-rtdb.firebaseio.com/");
        assert_eq!(cfg.host(), Some("demo-default-rtdb.firebaseio.com"));

        let emulator = StoreConfig::new("http://127.0.0.1:9000?ns=demo");
        assert_eq!(emulator.host(), Some("127.0.0.1"));

        assert_eq!(StoreConfig::new("").host(), None);
    }
}
