use crate::error::{Error, Result};
use crate::provider::gemini::GeminiConfig;
use crate::provider::gigachat::GigaChatConfig;
use crate::provider::yandex::YandexConfig;
use crate::provider::{Provider, TransportConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Provider used when none is given on the command line.
    pub provider: Option<String>,
    /// System prompt for `ask` and `chat` unless overridden.
    pub system_prompt: Option<String>,
    pub transport: TransportSettings,
    pub gemini: GeminiConfig,
    pub gigachat: GigaChatConfig,
    pub yandex: YandexConfig,
}

/// `[transport]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportSettings {
    pub verify_tls: bool,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for TransportSettings {
    fn default() -> Self {
        let defaults = TransportConfig::default();
        Self {
            verify_tls: defaults.verify_tls,
            timeout_secs: defaults.timeout.as_secs(),
            connect_timeout_secs: defaults.connect_timeout.as_secs(),
        }
    }
}

impl TransportSettings {
    #[must_use]
    pub fn to_transport(&self) -> TransportConfig {
        TransportConfig {
            verify_tls: self.verify_tls,
            timeout: Duration::from_secs(self.timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            ..TransportConfig::default()
        }
    }
}

impl Config {
    /// Default config file location: `<config_dir>/palaver/config.toml`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("palaver").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(".palaver/config.toml"))
    }

    /// Load configuration and apply environment overrides.
    ///
    /// An explicit `path` must exist; the default location may be absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::load_from(&path)?
                } else {
                    Config::default()
                }
            }
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Parse a TOML file without environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Override credentials from environment variables.
    ///
    /// Empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("GEMINI_API_KEY").or_else(|| get("GOOGLE_API_KEY")) {
            self.gemini.api_key = key;
        }
        if let Some(id) = get("GIGACHAT_CLIENT_ID") {
            self.gigachat.client_id = id;
        }
        if let Some(secret) = get("GIGACHAT_CLIENT_SECRET") {
            self.gigachat.client_secret = secret;
        }
        if let Some(key) = get("GIGACHAT_AUTH_KEY") {
            self.gigachat.authorization_key = Some(key);
        }
        if let Some(scope) = get("GIGACHAT_SCOPE") {
            self.gigachat.scope = scope;
        }
        if let Some(folder) = get("YANDEX_FOLDER_ID") {
            self.yandex.folder_id = folder;
        }
        if let Some(key) = get("YANDEX_API_KEY") {
            self.yandex.api_key = key;
        }
    }

    /// Provider to use: the configured one, else the first with credentials.
    pub fn default_provider(&self) -> Result<Provider> {
        if let Some(id) = self.provider.as_deref() {
            return Provider::from_id(id)
                .ok_or_else(|| Error::Config(format!("Unknown provider {id:?} in config")));
        }

        Provider::ALL
            .iter()
            .copied()
            .find(|p| p.is_configured(self))
            .ok_or_else(|| {
                Error::Config(format!(
                    "No provider configured. Set credentials in {} or the environment",
                    Self::default_path().display()
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.transport.verify_tls);
        assert_eq!(config.transport.timeout_secs, 120);
        assert_eq!(config.gigachat.scope, "GIGACHAT_API_PERS");
        assert_eq!(config.yandex.model, "yandexgpt-lite");
        assert_eq!(config.gemini.model, "gemini-pro");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
provider = "yandex"

[transport]
verify_tls = false
timeout_secs = 30

[yandex]
folder_id = "b1gfolder"
api_key = "AQVN-key"
model = "yandexgpt"

[gigachat]
client_id = "id"
"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.provider.as_deref(), Some("yandex"));
        assert!(!config.transport.verify_tls);
        assert_eq!(config.transport.connect_timeout_secs, 10);
        assert_eq!(config.yandex.model, "yandexgpt");
        assert_eq!(config.gigachat.client_id, "id");
        assert_eq!(config.gigachat.scope, "GIGACHAT_API_PERS");

        let transport = config.transport.to_transport();
        assert!(!transport.verify_tls);
        assert_eq!(transport.timeout, Duration::from_secs(30));
        assert_eq!(config.default_provider().unwrap(), Provider::YandexGpt);
    }

    #[test]
    fn test_explicit_missing_path_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let result = Config::load(Some(missing.as_path()));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_invalid_toml_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[transport\nverify_tls = ").unwrap();
        assert!(matches!(Config::load_from(file.path()), Err(Error::Toml(_))));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.gemini.api_key = "from-file".into();
        config.apply_env(env(&[
            ("GOOGLE_API_KEY", "google"),
            ("GIGACHAT_AUTH_KEY", "base64key"),
            ("GIGACHAT_SCOPE", "GIGACHAT_API_CORP"),
            ("YANDEX_FOLDER_ID", "b1g"),
            ("YANDEX_API_KEY", ""),
        ]));

        assert_eq!(config.gemini.api_key, "google");
        assert_eq!(config.gigachat.authorization_key.as_deref(), Some("base64key"));
        assert_eq!(config.gigachat.scope, "GIGACHAT_API_CORP");
        assert_eq!(config.yandex.folder_id, "b1g");
        assert_eq!(config.yandex.api_key, "");
    }

    #[test]
    fn test_gemini_key_precedence() {
        let mut config = Config::default();
        config.apply_env(env(&[("GEMINI_API_KEY", "gem"), ("GOOGLE_API_KEY", "goo")]));
        assert_eq!(config.gemini.api_key, "gem");
    }

    #[test]
    fn test_default_provider() {
        let mut config = Config::default();
        assert!(matches!(config.default_provider(), Err(Error::Config(_))));

        config.gigachat.client_id = "id".into();
        config.gigachat.client_secret = "secret".into();
        assert_eq!(config.default_provider().unwrap(), Provider::GigaChat);

        config.provider = Some("nope".into());
        assert!(config.default_provider().is_err());
    }
}
