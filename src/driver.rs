//! Replays a [`Trace`] against a [`VirtualMemory`] and checks every read
//! against what the trace itself wrote.

use std::collections::HashMap;

use log::{debug, info, warn};
use thiserror::Error;

use crate::error::VmError;
use crate::io::{Trace, TraceEvent};
use crate::process::Pid;
use crate::stats::StatsReport;
use crate::swap::SwapStore;
use crate::vm::VirtualMemory;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("event {index} ({event:?}): {source}")]
pub struct DriverError {
    /// 0-based position in the trace
    pub index: usize,
    pub event: TraceEvent,
    pub source: VmError,
}

/// Expected contents of every byte each live process has written
#[derive(Debug, Default)]
pub struct ShadowChecker {
    memory: HashMap<Pid, HashMap<u64, u8>>,
}

impl ShadowChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_write(&mut self, pid: Pid, address: u64, value: u8) {
        self.memory.entry(pid).or_default().insert(address, value);
    }

    /// Bytes never written read as zero
    pub fn expected(&self, pid: Pid, address: u64) -> u8 {
        self.memory
            .get(&pid)
            .and_then(|bytes| bytes.get(&address))
            .copied()
            .unwrap_or(0)
    }

    pub fn forget(&mut self, pid: Pid) {
        self.memory.remove(&pid);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub events: usize,
    /// Reads that returned something other than the last value written
    pub mismatches: usize,
    pub report: StatsReport,
}

pub fn run_trace<S: SwapStore>(vm: &mut VirtualMemory<S>, trace: &Trace) -> Result<RunSummary, DriverError> {
    let mut shadow = ShadowChecker::new();
    let mut mismatches = 0;

    for (index, &event) in trace.events.iter().enumerate() {
        let fail = |source: VmError| DriverError { index, event, source };
        match event {
            TraceEvent::Create(pid) => {
                vm.proc_init(pid).map_err(fail)?;
            }
            TraceEvent::Switch(pid) => {
                vm.context_switch(pid).map_err(fail)?;
            }
            TraceEvent::Exit(pid) => {
                vm.proc_cleanup(pid).map_err(fail)?;
                shadow.forget(pid);
            }
            TraceEvent::Read(address) => {
                let pid = vm.current().ok_or(VmError::NoActiveProcess).map_err(fail)?;
                let value = vm.read(address).map_err(fail)?;
                let expected = shadow.expected(pid, address);
                if value != expected {
                    warn!(
                        "pid {} read {:#x}: got {:#04x}, expected {:#04x}",
                        pid, address, value, expected
                    );
                    mismatches += 1;
                }
            }
            TraceEvent::Write(address, value) => {
                let pid = vm.current().ok_or(VmError::NoActiveProcess).map_err(fail)?;
                vm.write(address, value).map_err(fail)?;
                shadow.record_write(pid, address, value);
            }
        }
    }

    let report = vm.compute_stats();
    debug!("{:?}", report);
    info!(
        "replayed {} events: {} faults, {} writebacks, {} mismatches",
        trace.events.len(),
        report.page_faults,
        report.writebacks,
        mismatches
    );
    Ok(RunSummary {
        events: trace.events.len(),
        mismatches,
        report,
    })
}
