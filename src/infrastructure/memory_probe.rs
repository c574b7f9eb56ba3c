// Process memory reading for the performance sampler
use crate::application::performance_sampler::MemoryProbe;
use std::path::PathBuf;

const PAGE_SIZE: u64 = 4096;
const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// Resident set size from `/proc/self/statm`. Reads nothing on platforms
/// without procfs.
pub struct ProcMemoryProbe {
    path: PathBuf,
}

impl Default for ProcMemoryProbe {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/proc/self/statm"),
        }
    }
}

impl MemoryProbe for ProcMemoryProbe {
    fn used_megabytes(&self) -> Option<f64> {
        let statm = std::fs::read_to_string(&self.path).ok()?;
        parse_statm(&statm)
    }
}

/// Second field of statm is the resident page count.
fn parse_statm(statm: &str) -> Option<f64> {
    let resident: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;
    Some((resident * PAGE_SIZE) as f64 / BYTES_PER_MEGABYTE)
}
