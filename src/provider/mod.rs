//! Chat-completion providers.
//!
//! Three vendors sit behind one [`ChatProvider`] trait:
//!
//! - [`gemini`]: stateless, API key in the query string
//! - [`gigachat`]: OAuth client credentials with a cached bearer token
//! - [`yandex`]: static API key scoped to a cloud folder
//!
//! # Example
//!
//! ```ignore
//! use palaver::provider::{ChatProvider, Client, Provider};
//!
//! let client = Client::from_config(Provider::GigaChat, &config)?;
//! let reply = client.complete("Hello", None, &client.default_options()).await?;
//! ```

mod api_provider;
mod client;
mod error;
pub mod gemini;
pub mod gigachat;
pub mod http;
mod types;
pub mod yandex;

pub use api_provider::{Provider, ProviderStatus};
pub use client::{ChatProvider, Client, prompt_turns};
pub use error::{Error, format_api_error};
pub use http::TransportConfig;
pub use types::*;
