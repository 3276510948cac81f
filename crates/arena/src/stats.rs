//! Point-in-time arena statistics

use std::fmt;

/// Snapshot of an arena's memory usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Chunks currently held (retained across resets)
    pub chunks: usize,
    /// Bytes reserved from the page source
    pub reserved_bytes: usize,
    /// Bytes handed out since the last reset, alignment padding included
    pub used_bytes: usize,
    /// Successful allocations since construction
    pub allocations: u64,
    /// `remove` hints received since construction
    pub removals: u64,
    /// Number of resets
    pub resets: u64,
    /// Current generation (bumped by every reset)
    pub generation: u64,
}

impl ArenaStats {
    /// Reserved but not yet handed out
    pub fn available_bytes(&self) -> usize {
        self.reserved_bytes.saturating_sub(self.used_bytes)
    }

    /// Fraction of reserved memory in use
    pub fn utilization(&self) -> f64 {
        if self.reserved_bytes == 0 {
            0.0
        } else {
            self.used_bytes as f64 / self.reserved_bytes as f64
        }
    }
}

impl fmt::Display for ArenaStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "chunks={} reserved={}B used={}B ({:.1}%) allocs={} resets={} gen={}",
            self.chunks,
            self.reserved_bytes,
            self.used_bytes,
            self.utilization() * 100.0,
            self.allocations,
            self.resets,
            self.generation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utilization() {
        let stats = ArenaStats {
            reserved_bytes: 4096,
            used_bytes: 1024,
            ..Default::default()
        };
        assert_eq!(stats.available_bytes(), 3072);
        assert!((stats.utilization() - 0.25).abs() < f64::EPSILON);
        assert_eq!(ArenaStats::default().utilization(), 0.0);
    }
}
