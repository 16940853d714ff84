//! YandexGPT provider: static API key scoped to a cloud folder.

mod client;
mod types;

pub use client::{DEFAULT_MODEL, PROVIDER_ID, YANDEX_COMPLETION_URL, YandexClient, YandexConfig};
