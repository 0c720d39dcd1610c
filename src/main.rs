//! paging-sim - replay a memory trace through the demand-paging simulator
//!
//! Usage: paging-sim [OPTIONS] <TRACE>
//!
//! Prints the statistics report to stdout (or to `--output`) and exits
//! non-zero if the trace fails or any read returned unexpected data.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info, LevelFilter};

use paging_sim::constants::*;
use paging_sim::driver::run_trace;
use paging_sim::io::{write_report, Trace};
use paging_sim::{logging, AccessCosts, ReplacementPolicy, SimConfig, VirtualMemory};

#[derive(Parser, Debug)]
#[command(name = "paging-sim")]
#[command(about = "Demand-paged virtual memory simulator")]
#[command(version)]
struct Cli {
    /// Trace file: create/switch/exit/r/w events, one per line
    trace: PathBuf,

    /// Write the statistics report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Page size is 2^offset_bits bytes
    #[arg(long, default_value_t = DEFAULT_OFFSET_BITS)]
    offset_bits: u32,

    /// Physical frames, including the frame table's
    #[arg(long, default_value_t = DEFAULT_NUM_FRAMES)]
    frames: usize,

    /// Virtual pages per process
    #[arg(long, default_value_t = DEFAULT_NUM_PAGES)]
    pages: usize,

    #[arg(short, long, value_enum, default_value_t = ReplacementPolicy::ClockSweep)]
    replacement: ReplacementPolicy,

    /// Seed for the random replacement policy
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Cost of one memory access (ns)
    #[arg(long, default_value_t = MEMORY_READ_TIME)]
    memory_time: u64,

    /// Cost of reading one page from swap (ns)
    #[arg(long, default_value_t = DISK_PAGE_READ_TIME)]
    disk_read_time: u64,

    /// Cost of writing one page to swap (ns)
    #[arg(long, default_value_t = DISK_PAGE_WRITE_TIME)]
    disk_write_time: u64,

    /// More logging (-v debug, -vv trace); overrides LOG
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn sim_config(&self) -> SimConfig {
        SimConfig::default()
            .with_offset_bits(self.offset_bits)
            .with_frames(self.frames)
            .with_pages(self.pages)
            .with_policy(self.replacement)
            .with_seed(self.seed)
            .with_costs(AccessCosts {
                memory_read: self.memory_time,
                disk_read: self.disk_read_time,
                disk_write: self.disk_write_time,
            })
    }

    fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => logging::level_from_env(LevelFilter::Warn),
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.log_level());

    match run(&cli) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(mismatches) => {
            error!("{} reads returned unexpected data", mismatches);
            ExitCode::from(2)
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Main logic separated from main() for cleaner error handling.
/// Returns the number of mismatched reads.
fn run(cli: &Cli) -> Result<usize, Box<dyn std::error::Error>> {
    let config = cli.sim_config();
    let trace = Trace::from_file(&cli.trace)?;
    let mut vm = VirtualMemory::new(config)?;

    info!(
        "{} frames of {} bytes, {} pages per process, {} replacement, {} events",
        vm.config().num_frames,
        vm.config().page_size(),
        vm.config().num_pages,
        vm.config().policy,
        trace.events.len()
    );

    let summary = run_trace(&mut vm, &trace)?;

    match &cli.output {
        Some(path) => {
            write_report(path, &summary.report)?;
            info!("report written to {}", path.display());
        }
        None => println!("{}", summary.report),
    }
    Ok(summary.mismatches)
}
