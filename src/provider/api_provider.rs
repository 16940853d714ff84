//! Provider enumeration and credential detection.

use crate::config::Config;
use std::fmt;
use std::str::FromStr;

/// Supported chat vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    /// Google Gemini, stateless API key
    Gemini,
    /// Sber GigaChat, OAuth client credentials
    GigaChat,
    /// Yandex Cloud foundation models, folder-scoped API key
    YandexGpt,
}

impl Provider {
    pub const ALL: &'static [Provider] = &[Provider::Gemini, Provider::GigaChat, Provider::YandexGpt];

    /// Lowercase ID for config storage and the command line.
    pub fn id(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::GigaChat => "gigachat",
            Provider::YandexGpt => "yandex",
        }
    }

    /// Parse provider from ID string.
    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim().to_lowercase().as_str() {
            "gemini" | "google" => Some(Provider::Gemini),
            "gigachat" | "sber" => Some(Provider::GigaChat),
            "yandex" | "yandexgpt" => Some(Provider::YandexGpt),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Gemini => "Gemini",
            Provider::GigaChat => "GigaChat",
            Provider::YandexGpt => "YandexGPT",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Provider::Gemini => "Google Generative Language API",
            Provider::GigaChat => "Sber GigaChat (OAuth)",
            Provider::YandexGpt => "Yandex Cloud Foundation Models",
        }
    }

    /// Environment variables that supply credentials.
    pub fn env_vars(&self) -> &'static [&'static str] {
        match self {
            Provider::Gemini => &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
            Provider::GigaChat => &[
                "GIGACHAT_AUTH_KEY",
                "GIGACHAT_CLIENT_ID",
                "GIGACHAT_CLIENT_SECRET",
                "GIGACHAT_SCOPE",
            ],
            Provider::YandexGpt => &["YANDEX_FOLDER_ID", "YANDEX_API_KEY"],
        }
    }

    /// Whether `config` carries every credential this vendor needs.
    pub fn is_configured(&self, config: &Config) -> bool {
        fn set(value: &str) -> bool {
            !value.trim().is_empty()
        }

        match self {
            Provider::Gemini => set(&config.gemini.api_key),
            Provider::GigaChat => {
                let g = &config.gigachat;
                g.authorization_key.as_deref().is_some_and(set)
                    || (set(&g.client_id) && set(&g.client_secret))
            }
            Provider::YandexGpt => set(&config.yandex.folder_id) && set(&config.yandex.api_key),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s).ok_or_else(|| {
            let known: Vec<&str> = Self::ALL.iter().map(Provider::id).collect();
            format!("unknown provider {s:?} (expected one of: {})", known.join(", "))
        })
    }
}

/// Credential status of one provider.
#[derive(Debug, Clone)]
pub struct ProviderStatus {
    pub provider: Provider,
    pub configured: bool,
}

impl ProviderStatus {
    /// Get status for all providers.
    pub fn detect_all(config: &Config) -> Vec<ProviderStatus> {
        Provider::ALL
            .iter()
            .map(|&provider| ProviderStatus {
                provider,
                configured: provider.is_configured(config),
            })
            .collect()
    }

    /// Sort providers: configured first, then alphabetically within each group.
    pub fn sorted(mut statuses: Vec<ProviderStatus>) -> Vec<ProviderStatus> {
        statuses.sort_by(|a, b| match (a.configured, b.configured) {
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            _ => a.provider.name().cmp(b.provider.name()),
        });
        statuses
    }
}
