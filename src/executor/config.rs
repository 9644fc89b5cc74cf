use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default value of [`ExecutionConfig::max_depth`].
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Deepest selection the [`Executor`](super::Executor) resolves, whatever
/// [`ExecutionConfig::max_depth`] says.
///
/// Each nesting level is resolved by a nested future, so deeper selections
/// would exhaust the stack of the polling thread.
pub const MAX_SUPPORTED_DEPTH: usize = 64;

/// Tunables of the [`Executor`](super::Executor).
///
/// Deserializable, so it can be embedded into a service configuration file:
///
/// ```rust
/// # use juniper_service::ExecutionConfig;
/// let config: ExecutionConfig =
///     serde_json::from_str(r#"{"maxDepth": 8, "timeoutMs": 1500}"#).unwrap();
/// assert_eq!(config.max_depth, Some(8));
/// assert!(config.concurrent_fields);
/// ```
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ExecutionConfig {
    /// Maximum nesting of object selections. Fields nested deeper fail with a
    /// request-level error.
    ///
    /// `None` lifts the configured limit, but never above
    /// [`MAX_SUPPORTED_DEPTH`], and larger values are capped to it as well.
    pub max_depth: Option<usize>,

    /// Whether sibling fields of one object are resolved concurrently.
    ///
    /// When disabled, fields are resolved one after another in selection
    /// order.
    pub concurrent_fields: bool,

    /// Time budget of a whole request, in milliseconds.
    pub timeout_ms: Option<u64>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_depth: Some(DEFAULT_MAX_DEPTH),
            concurrent_fields: true,
            timeout_ms: None,
        }
    }
}

impl ExecutionConfig {
    /// Sets the maximum selection depth.
    #[must_use]
    pub fn max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Returns the depth limit actually enforced, i.e. [`max_depth`] capped to
    /// [`MAX_SUPPORTED_DEPTH`].
    ///
    /// [`max_depth`]: ExecutionConfig::max_depth
    #[must_use]
    pub fn effective_max_depth(&self) -> usize {
        self.max_depth
            .map_or(MAX_SUPPORTED_DEPTH, |d| d.min(MAX_SUPPORTED_DEPTH))
    }

    /// Resolves sibling fields one after another.
    #[must_use]
    pub fn sequential(mut self) -> Self {
        self.concurrent_fields = false;
        self
    }

    /// Sets the time budget of a request.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Returns the time budget of a request, if any.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
