//! Provider registry, request shaping and dispatch for Parley.
//!
//! Provides the `ProviderAdapter` trait with two request shapes
//! (chat-completions and content-array), the `ProviderRegistry` lookup,
//! the `HttpTransport` seam and the `Dispatcher` that ties them together.

mod anthropic;
mod client;
mod openai;
mod provider;
mod registry;
mod transport;
mod types;

pub use anthropic::AnthropicAdapter;
pub use client::*;
pub use openai::ChatCompletionsAdapter;
pub use provider::*;
pub use registry::*;
pub use transport::*;
pub use types::*;
