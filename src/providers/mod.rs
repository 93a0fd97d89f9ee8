//! External capability providers (web search and text completion).
//!
//! The core only depends on the two traits below. Concrete clients:
//!
//! - [`DuckDuckGoSearch`]: DuckDuckGo HTML results over `reqwest`, parsed with `scraper`.
//! - [`GenaiProvider`]: any chat model reachable through `genai` (Gemini, Groq, OpenAI, ...).
//!
//! Scripted fakes live in [`mock`] behind `#[cfg(any(test, feature = "mock"))]`.

pub mod duckduckgo;
pub mod error;
pub mod genai;
#[cfg(any(test, feature = "mock"))]
pub mod mock;


pub use duckduckgo::DuckDuckGoSearch;
pub use error::{ProviderError, ProviderResult};
pub use genai::GenaiProvider;
#[cfg(any(test, feature = "mock"))]
pub use mock::{ScriptedCompletion, StaticSearch};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Raw search result as returned by a [`SearchProvider`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub body: String,
}

impl SearchHit {
    pub fn new(title: impl Into<String>, url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            body: body.into(),
        }
    }
}

#[async_trait]
/// Web search capability.
pub trait SearchProvider: Send + Sync {
    /// Returns up to `max_results` hits for `query`. May return fewer.
    async fn search(&self, query: &str, max_results: usize) -> ProviderResult<Vec<SearchHit>>;
}

#[async_trait]
/// Free-form text completion capability (verifier backends and explanations).
pub trait CompletionProvider: Send + Sync {
    /// Stable identifier reported as `backend_name`.
    fn name(&self) -> &str;

    /// Sends `prompt` and returns the raw model text.
    async fn complete(&self, prompt: &str) -> ProviderResult<String>;
}
