use std::io;

use anyhow::{Context, Result};

use crate::proc::ProcSource;

/// Utilities watched when no command list is configured.
pub const DEFAULT_COMMANDS: &[&str] = &[
    "cp", "mv", "dd", "tar", "gzip", "gunzip", "cat", "grep", "fgrep", "egrep", "cut", "sort",
];

/// A running process whose executable matched one of the watched names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessHandle {
    pub name: String,
    pub pid: u32,
}

/// Find every running process whose executable base name is exactly one of
/// `names`.
///
/// Processes we may not inspect, and processes that are gone (or never had
/// an image, like kernel threads) by the time their exe link is read, are
/// skipped. Anything else aborts the scan.
pub fn find_processes<S: ProcSource + ?Sized>(
    source: &S,
    names: &[String],
    debug: bool,
) -> Result<Vec<ProcessHandle>> {
    let pids = source.pids().context("listing running processes")?;

    let mut found = Vec::new();
    for pid in pids {
        let exe = match source.exe(pid) {
            Ok(path) => path,
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => continue,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => {
                return Err(e).with_context(|| format!("resolving executable of pid {pid}"));
            }
        };

        let Some(base) = exe.file_name().map(|b| b.to_string_lossy()) else {
            continue;
        };
        if let Some(name) = names.iter().find(|n| n.as_str() == base) {
            trace!(debug, "found [{name:>10}] pid [{pid:5}]");
            found.push(ProcessHandle {
                name: name.clone(),
                pid,
            });
        }
    }

    Ok(found)
}
