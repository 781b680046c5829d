//! Render pipeline errors.

use ssr_cache::CacheError;

/// Errors that abort a render.
///
/// An unmatched path is not an error; see `RenderOutcome::NotFound`.
#[derive(Debug, thiserror::Error)]
pub enum SsrError {
    /// Cache orchestration failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// An extra-parameter provider failed.
    #[error("extra params provider '{provider}' failed")]
    Params {
        provider: String,
        #[source]
        source: anyhow::Error,
    },

    /// A route preload hook failed.
    #[error("preload for route '{route}' failed")]
    Preload {
        route: String,
        #[source]
        source: anyhow::Error,
    },

    /// The renderer failed.
    #[error("render of '{path}' failed")]
    Render {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    /// Client state could not be serialized.
    #[error("failed to serialize client state: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for render operations.
pub type SsrResult<T> = Result<T, SsrError>;
