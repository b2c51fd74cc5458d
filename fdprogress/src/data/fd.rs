use std::io;

use anyhow::{Context, Result};

use crate::proc::{FileKind, ProcSource};

/// Open descriptors of `pid` that currently point at a regular file.
///
/// A process that exited since it was located has no descriptors. A
/// descriptor closed between listing and `stat` is skipped.
pub fn regular_fds<S: ProcSource + ?Sized>(
    source: &S,
    pid: u32,
    debug: bool,
) -> Result<Vec<u32>> {
    let fds = match source.fds(pid) {
        Ok(fds) => fds,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            trace!(debug, "[{pid:5}] exited before its descriptors were listed");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e).with_context(|| format!("listing descriptors of pid {pid}")),
    };

    let mut regular = Vec::new();
    for fd in fds {
        // TODO: block devices (dd on /dev/sdX) need the size from the device, not stat
        match source.fd_kind(pid, fd) {
            Ok(FileKind::Regular) => regular.push(fd),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                trace!(debug, "[{pid:5},{fd:5}] closed while scanning");
            }
            Err(e) => {
                return Err(e).with_context(|| format!("classifying descriptor {fd} of pid {pid}"));
            }
        }
    }

    Ok(regular)
}
