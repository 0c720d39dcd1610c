//! Victim selection when no frame is free.

use clap::ValueEnum;
use log::trace;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::memory::PhysicalMemory;
use crate::table::{read_fte, update_fte};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReplacementPolicy {
    /// Second chance: skip and clear referenced frames, take the first clear one
    ClockSweep,
    /// Uniform pick among evictable frames
    Random,
}

impl std::fmt::Display for ReplacementPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplacementPolicy::ClockSweep => write!(f, "clock-sweep"),
            ReplacementPolicy::Random => write!(f, "random"),
        }
    }
}

pub struct Replacer {
    policy: ReplacementPolicy,
    hand: u32,
    rng: StdRng,
}

impl Replacer {
    pub fn new(policy: ReplacementPolicy, seed: u64) -> Self {
        Replacer {
            policy,
            hand: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn policy(&self) -> ReplacementPolicy {
        self.policy
    }

    /// Next frame the clock sweep will inspect
    pub fn hand(&self) -> u32 {
        self.hand
    }

    /// Pick a mapped, unprotected frame to evict. `None` if there is none.
    pub fn select_victim(&mut self, pm: &mut PhysicalMemory) -> Option<u32> {
        match self.policy {
            ReplacementPolicy::ClockSweep => self.clock_sweep(pm),
            ReplacementPolicy::Random => self.random(pm),
        }
    }

    fn clock_sweep(&mut self, pm: &mut PhysicalMemory) -> Option<u32> {
        let num_frames = pm.num_frames() as u32;
        // First sweep may clear every referenced bit; the second must find one.
        for _ in 0..2 * num_frames {
            let pfn = self.hand;
            self.hand = (self.hand + 1) % num_frames;

            let fte = read_fte(pm, pfn);
            if !fte.is_evictable() {
                continue;
            }
            if fte.referenced {
                trace!("clock: second chance for frame {}", pfn);
                update_fte(pm, pfn, |fte| fte.referenced = false);
                continue;
            }
            return Some(pfn);
        }
        None
    }

    fn random(&mut self, pm: &PhysicalMemory) -> Option<u32> {
        let candidates: Vec<u32> = (0..pm.num_frames() as u32)
            .filter(|&pfn| read_fte(pm, pfn).is_evictable())
            .collect();
        if candidates.is_empty() {
            return None;
        }
        Some(candidates[self.rng.gen_range(0..candidates.len())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{write_fte, FrameTableEntry};

    fn memory_with(entries: &[FrameTableEntry]) -> PhysicalMemory {
        let mut pm = PhysicalMemory::new(entries.len(), 64);
        for (pfn, fte) in entries.iter().enumerate() {
            write_fte(&mut pm, pfn as u32, fte);
        }
        pm
    }

    fn protected() -> FrameTableEntry {
        FrameTableEntry { protected: true, ..Default::default() }
    }

    fn mapped(referenced: bool) -> FrameTableEntry {
        FrameTableEntry { mapped: true, referenced, ..Default::default() }
    }

    #[test]
    fn test_clock_skips_protected_frames() {
        let mut pm = memory_with(&[protected(), protected(), mapped(false), mapped(false)]);
        let mut replacer = Replacer::new(ReplacementPolicy::ClockSweep, 0);

        assert_eq!(replacer.select_victim(&mut pm), Some(2));
        assert_eq!(replacer.hand(), 3);
        assert_eq!(replacer.select_victim(&mut pm), Some(3));
        assert_eq!(replacer.hand(), 0);
        // Wraps back around past the protected frames
        assert_eq!(replacer.select_victim(&mut pm), Some(2));
    }

    #[test]
    fn test_clock_gives_referenced_frame_a_second_chance() {
        let mut pm = memory_with(&[protected(), mapped(true), mapped(false)]);
        let mut replacer = Replacer::new(ReplacementPolicy::ClockSweep, 0);

        assert_eq!(replacer.select_victim(&mut pm), Some(2));
        // The skipped frame lost its referenced bit
        assert!(!read_fte(&pm, 1).referenced);
        assert_eq!(replacer.select_victim(&mut pm), Some(1));
    }

    #[test]
    fn test_clock_terminates_when_everything_is_referenced() {
        let mut pm = memory_with(&[protected(), mapped(true), mapped(true), mapped(true)]);
        let mut replacer = Replacer::new(ReplacementPolicy::ClockSweep, 0);

        // Full sweep clears all bits, then the first candidate goes
        assert_eq!(replacer.select_victim(&mut pm), Some(1));
        assert!(!read_fte(&pm, 2).referenced);
        assert!(!read_fte(&pm, 3).referenced);
    }

    #[test]
    fn test_clock_never_picks_unmapped_frames() {
        let mut pm = memory_with(&[protected(), FrameTableEntry::default(), mapped(false)]);
        let mut replacer = Replacer::new(ReplacementPolicy::ClockSweep, 0);
        assert_eq!(replacer.select_victim(&mut pm), Some(2));
        assert_eq!(replacer.select_victim(&mut pm), Some(2));
    }

    #[test]
    fn test_no_victim_when_all_protected() {
        let entries = [protected(), protected(), FrameTableEntry { mapped: true, ..protected() }];
        for policy in [ReplacementPolicy::ClockSweep, ReplacementPolicy::Random] {
            let mut pm = memory_with(&entries);
            let mut replacer = Replacer::new(policy, 0);
            assert_eq!(replacer.select_victim(&mut pm), None);
        }
    }

    #[test]
    fn test_random_only_picks_evictable_frames() {
        let mut pm = memory_with(&[protected(), mapped(true), protected(), mapped(false), protected()]);
        let mut replacer = Replacer::new(ReplacementPolicy::Random, 42);
        for _ in 0..100 {
            let victim = replacer.select_victim(&mut pm).unwrap();
            assert!(victim == 1 || victim == 3, "picked frame {}", victim);
        }
    }

    #[test]
    fn test_random_is_reproducible_for_a_seed() {
        let entries = [protected(), mapped(false), mapped(false), mapped(false), mapped(false)];
        let picks = |seed| {
            let mut pm = memory_with(&entries);
            let mut replacer = Replacer::new(ReplacementPolicy::Random, seed);
            (0..20).map(|_| replacer.select_victim(&mut pm).unwrap()).collect::<Vec<_>>()
        };
        assert_eq!(picks(7), picks(7));
    }

    #[test]
    fn test_policy_display() {
        assert_eq!(ReplacementPolicy::ClockSweep.to_string(), "clock-sweep");
        assert_eq!(ReplacementPolicy::Random.to_string(), "random");
    }
}
