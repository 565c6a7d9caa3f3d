//! Tree configuration.

/// Configuration for a [`BalancedTree`](crate::BalancedTree).
#[derive(Debug, Clone)]
pub struct Config {
    /// Node slots reserved when the tree is created.
    pub initial_capacity: usize,
    /// Compact the node arena automatically after deletions.
    pub auto_compact: bool,
    /// Vacant slots required before automatic compaction runs.
    ///
    /// Compaction additionally requires vacant slots to outnumber live nodes,
    /// so a tree that shrinks by less than half is never rewritten.
    pub compaction_threshold: usize,
}

impl Config {
    pub(crate) fn wants_compaction(&self, live: usize, vacant: usize) -> bool {
        self.auto_compact && vacant >= self.compaction_threshold && vacant > live
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_capacity: 0,
            auto_compact: false,
            compaction_threshold: 4096,
        }
    }
}
