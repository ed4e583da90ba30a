use crate::path::MAX_FILENAME_LEN;

/// What the cache does with a resource whose load reported an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Unload the half-built resource, insert nothing and return the error.
    #[default]
    Strict,
    /// Insert the resource in its zeroed state, mark it failed, log a warning
    /// and hand out a handle anyway.
    KeepInert,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub max_filename_len: usize,
    pub failure_policy: FailurePolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_filename_len: MAX_FILENAME_LEN,
            failure_policy: FailurePolicy::Strict,
        }
    }
}

impl CacheConfig {
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_max_filename_len(mut self, len: usize) -> Self {
        self.max_filename_len = len;
        self
    }
}
