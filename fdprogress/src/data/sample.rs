use std::io;
use std::path::PathBuf;
use std::time::SystemTime;

use anyhow::{bail, Context, Result};

use crate::proc::{Clock, ProcSource};

/// Size and position of one open file at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub fd: u32,
    pub size: u64,
    pub offset: u64,
    pub target: PathBuf,
    pub taken_at: SystemTime,
}

impl Sample {
    /// Completion in percent. A zero-size file has nothing to measure and
    /// reports 0.
    pub fn percent(&self) -> f64 {
        if self.size == 0 {
            return 0.0;
        }
        self.offset as f64 / self.size as f64 * 100.0
    }

    /// Throughput in bytes per second between this sample and `later`.
    ///
    /// `None` when the descriptor now points at another file, or when no
    /// time elapsed between the two. The value is not clamped: a shrinking
    /// offset gives a negative rate.
    pub fn rate_to(&self, later: &Sample) -> Option<f64> {
        if self.target != later.target {
            return None;
        }
        let elapsed = later.taken_at.duration_since(self.taken_at).ok()?;
        if elapsed.is_zero() {
            return None;
        }
        let delta = later.offset as f64 - self.offset as f64;
        Some(delta / elapsed.as_secs_f64())
    }
}

/// Sample descriptor `fd` of `pid`.
///
/// Returns `Ok(None)` when the descriptor or its file went away, or the
/// kernel refuses to show us its fdinfo record.
pub fn take_sample<S, C>(
    source: &S,
    clock: &C,
    pid: u32,
    fd: u32,
    debug: bool,
) -> Result<Option<Sample>>
where
    S: ProcSource + ?Sized,
    C: Clock + ?Sized,
{
    let target = match source.fd_target(pid, fd) {
        Ok(path) => path,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            trace!(debug, "[{pid:5},{fd:5}] descriptor closed");
            return Ok(None);
        }
        Err(e) => {
            return Err(e).with_context(|| format!("resolving descriptor {fd} of pid {pid}"));
        }
    };

    let size = match source.file_size(&target) {
        Ok(size) => size,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            trace!(debug, "[{pid:5},{fd:5}] no such file {}", target.display());
            return Ok(None);
        }
        Err(e) => {
            return Err(e).with_context(|| format!("reading size of {}", target.display()));
        }
    };

    let taken_at = clock.now();
    let info = match source.fdinfo(pid, fd) {
        Ok(text) => text,
        Err(e) => match e.kind() {
            io::ErrorKind::PermissionDenied => {
                trace!(debug, "[{pid:5},{fd:5}] permission denied for fdinfo");
                return Ok(None);
            }
            io::ErrorKind::NotFound => {
                trace!(debug, "[{pid:5},{fd:5}] fdinfo vanished");
                return Ok(None);
            }
            _ => {
                return Err(e).with_context(|| format!("reading fdinfo {fd} of pid {pid}"));
            }
        },
    };
    let offset =
        parse_pos(&info).with_context(|| format!("parsing fdinfo {fd} of pid {pid}"))?;

    Ok(Some(Sample {
        fd,
        size,
        offset,
        target,
        taken_at,
    }))
}

/// Extract the `pos:` field from an fdinfo record.
pub fn parse_pos(info: &str) -> Result<u64> {
    for line in info.lines() {
        if let Some(rest) = line.strip_prefix("pos:") {
            let value = rest.trim();
            return value
                .parse::<u64>()
                .with_context(|| format!("invalid pos value {value:?}"));
        }
    }
    bail!("no pos field")
}
