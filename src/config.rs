/// Longest parent chain `retrace` follows before giving up on it.
pub const DEFAULT_RETRACE_LIMIT: usize = 10_000;

/// Tunables of a [`crate::algorithms::astar::PathfindingEngine`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Parent chains longer than this are treated as corrupted.
    ///
    /// Searches never build cycles, so this only trips if the grid's scratch
    /// data was tampered with.
    pub retrace_limit: usize,
}

impl EngineConfig {
    pub fn with_retrace_limit(mut self, retrace_limit: usize) -> Self {
        self.retrace_limit = retrace_limit;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retrace_limit: DEFAULT_RETRACE_LIMIT,
        }
    }
}
