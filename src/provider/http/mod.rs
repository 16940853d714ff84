//! Shared HTTP utilities for LLM providers.

mod client;

pub use client::{AuthConfig, HttpClient, TransportConfig, bearer_headers};
