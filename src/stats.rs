use std::fmt;

use crate::config::AccessCosts;

/// Event counters, bumped by the access path, fault handler and allocator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub reads: u64,
    pub writes: u64,
    pub page_faults: u64,
    pub writebacks: u64,
}

/// Counters plus the derived values, computed on demand
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsReport {
    pub reads: u64,
    pub writes: u64,
    pub accesses: u64,
    pub page_faults: u64,
    pub writebacks: u64,
    /// Average access time; `None` when there were no accesses
    pub aat: Option<f64>,
}

impl Stats {
    pub fn accesses(&self) -> u64 {
        self.reads + self.writes
    }

    pub fn compute(&self, costs: &AccessCosts) -> StatsReport {
        let accesses = self.accesses();
        let aat = (accesses > 0).then(|| {
            let memory = accesses as f64 * costs.memory_read as f64;
            let disk_read = self.page_faults as f64 * costs.disk_read as f64;
            let disk_write = self.writebacks as f64 * costs.disk_write as f64;
            (memory + disk_read + disk_write) / accesses as f64
        });

        StatsReport {
            reads: self.reads,
            writes: self.writes,
            accesses,
            page_faults: self.page_faults,
            writebacks: self.writebacks,
            aat,
        }
    }
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "reads:       {}", self.reads)?;
        writeln!(f, "writes:      {}", self.writes)?;
        writeln!(f, "accesses:    {}", self.accesses)?;
        writeln!(f, "page faults: {}", self.page_faults)?;
        writeln!(f, "writebacks:  {}", self.writebacks)?;
        match self.aat {
            Some(aat) => write!(f, "AAT:         {:.5} ns", aat),
            None => write!(f, "AAT:         n/a (no accesses)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_costs() -> AccessCosts {
        AccessCosts { memory_read: 1, disk_read: 100, disk_write: 100 }
    }

    #[test]
    fn test_compute_reference_values() {
        let stats = Stats { reads: 3, writes: 2, page_faults: 1, writebacks: 0 };
        let report = stats.compute(&unit_costs());

        assert_eq!(report.accesses, 5);
        // (5*1 + 1*100 + 0) / 5
        assert_eq!(report.aat, Some(21.0));
    }

    #[test]
    fn test_compute_counts_writebacks() {
        let stats = Stats { reads: 1, writes: 1, page_faults: 2, writebacks: 1 };
        let costs = AccessCosts { memory_read: 10, disk_read: 1000, disk_write: 500 };
        // (2*10 + 2*1000 + 1*500) / 2
        assert_eq!(stats.compute(&costs).aat, Some(1260.0));
    }

    #[test]
    fn test_compute_with_no_accesses() {
        let stats = Stats { page_faults: 4, ..Default::default() };
        let report = stats.compute(&unit_costs());
        assert_eq!(report.accesses, 0);
        assert_eq!(report.aat, None);
    }

    #[test]
    fn test_compute_is_repeatable() {
        let stats = Stats { reads: 7, writes: 0, page_faults: 3, writebacks: 1 };
        let costs = AccessCosts::default();
        assert_eq!(stats.compute(&costs), stats.compute(&costs));
    }

    #[test]
    fn test_display() {
        let stats = Stats { reads: 3, writes: 2, page_faults: 1, writebacks: 0 };
        let text = stats.compute(&unit_costs()).to_string();
        assert!(text.contains("accesses:    5"));
        assert!(text.contains("AAT:         21.00000 ns"));

        let text = Stats::default().compute(&unit_costs()).to_string();
        assert!(text.contains("n/a"));
    }
}
