//! Resident memory probe used by the memory processor.
//!
//! On Linux the resident set size is read from `/proc/self/status`
//! (`VmRSS`, reported in kB). Other platforms report nothing and the
//! record carries `mem: null`.

use std::fs;
use tracing::debug;

const PROC_STATUS_PATH: &str = "/proc/self/status"; // Per-process status, includes VmRSS in kB

/// Source of the current process memory usage, in bytes.
pub trait MemoryReader: Send {
    fn resident_bytes(&self) -> Option<u64>;
}

/// Reads resident memory from procfs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcMemoryReader;

impl MemoryReader for ProcMemoryReader {
    fn resident_bytes(&self) -> Option<u64> {
        if !cfg!(target_os = "linux") {
            return None;
        }

        let status = match fs::read_to_string(PROC_STATUS_PATH) {
            Ok(status) => status,
            Err(e) => {
                debug!("Could not read memory usage from {PROC_STATUS_PATH}: {e}");
                return None;
            }
        };

        let rss = parse_vm_rss(&status);
        if rss.is_none() {
            debug!("No VmRSS entry in {PROC_STATUS_PATH}");
        }
        rss
    }
}

/// Extract `VmRSS` from the contents of a procfs status file, converted
/// to bytes.
fn parse_vm_rss(status: &str) -> Option<u64> {
    let line = status.lines().find(|line| line.starts_with("VmRSS:"))?;
    let mut parts = line["VmRSS:".len()..].split_whitespace();
    let value = parts.next()?.parse::<u64>().ok()?;
    match parts.next() {
        Some("kB") | None => Some(value * 1024),
        Some(_) => None,
    }
}
