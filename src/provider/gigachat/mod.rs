//! Sber GigaChat chat-completions API (OAuth client credentials).

mod client;
mod types;

pub use client::{DEFAULT_MODEL, GIGACHAT_API_BASE, GigaChatClient, GigaChatConfig, PROVIDER_ID};
