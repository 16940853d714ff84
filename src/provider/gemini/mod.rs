//! Google Gemini `generateContent` API.

mod client;
mod types;

pub use client::{DEFAULT_MODEL, GEMINI_API_BASE, GeminiClient, GeminiConfig, PROVIDER_ID};
