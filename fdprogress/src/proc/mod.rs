pub mod procfs;

#[cfg(test)]
pub mod fake;

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

pub use procfs::ProcFs;

/// What an open descriptor resolves to, as seen by `stat` through the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Regular,
    Directory,
    Fifo,
    Socket,
    CharDevice,
    BlockDevice,
    Other,
}

/// Process and descriptor metadata provider.
///
/// Every method returns the raw `io::Error` so callers can tell a vanished
/// item (`NotFound`) or a permission gap (`PermissionDenied`) apart from a
/// genuinely broken environment.
pub trait ProcSource {
    /// Identifiers of every process currently listed.
    fn pids(&self) -> io::Result<Vec<u32>>;

    /// Path of the executable image backing `pid`.
    fn exe(&self, pid: u32) -> io::Result<PathBuf>;

    /// Open descriptor numbers of `pid`.
    fn fds(&self, pid: u32) -> io::Result<Vec<u32>>;

    /// Type of the file descriptor `fd` of `pid` currently points at.
    fn fd_kind(&self, pid: u32, fd: u32) -> io::Result<FileKind>;

    /// Path descriptor `fd` of `pid` currently resolves to.
    fn fd_target(&self, pid: u32, fd: u32) -> io::Result<PathBuf>;

    /// Current size in bytes of the file at `path`.
    fn file_size(&self, path: &Path) -> io::Result<u64>;

    /// Raw text of the kernel's per-descriptor status record.
    fn fdinfo(&self, pid: u32, fd: u32) -> io::Result<String>;
}

/// Time source for sample timestamps and the pause between passes.
pub trait Clock {
    fn now(&self) -> SystemTime;
    fn sleep(&self, duration: Duration);
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
