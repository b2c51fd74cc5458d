use std::fs;
use std::io;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};

use super::{FileKind, ProcSource};

pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Metadata provider backed by a Linux `/proc` tree.
///
/// The root is configurable so the same code can read a host `/proc`
/// mounted elsewhere (containers) or a fake tree in tests.
pub struct ProcFs {
    root: PathBuf,
}

impl ProcFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn pid_dir(&self, pid: u32) -> PathBuf {
        self.root.join(pid.to_string())
    }

    fn fd_path(&self, pid: u32, fd: u32) -> PathBuf {
        self.pid_dir(pid).join("fd").join(fd.to_string())
    }
}

impl ProcSource for ProcFs {
    fn pids(&self) -> io::Result<Vec<u32>> {
        numeric_entries(&self.root)
    }

    fn exe(&self, pid: u32) -> io::Result<PathBuf> {
        fs::read_link(self.pid_dir(pid).join("exe"))
    }

    fn fds(&self, pid: u32) -> io::Result<Vec<u32>> {
        numeric_entries(&self.pid_dir(pid).join("fd"))
    }

    fn fd_kind(&self, pid: u32, fd: u32) -> io::Result<FileKind> {
        let meta = fs::metadata(self.fd_path(pid, fd))?;
        Ok(classify(meta.file_type()))
    }

    fn fd_target(&self, pid: u32, fd: u32) -> io::Result<PathBuf> {
        fs::read_link(self.fd_path(pid, fd))
    }

    fn file_size(&self, path: &Path) -> io::Result<u64> {
        Ok(fs::metadata(path)?.len())
    }

    fn fdinfo(&self, pid: u32, fd: u32) -> io::Result<String> {
        fs::read_to_string(self.pid_dir(pid).join("fdinfo").join(fd.to_string()))
    }
}

/// Collect the entries of `dir` whose names are plain decimal numbers.
/// Other entries (`self`, `meminfo`, ...) are ignored.
fn numeric_entries(dir: &Path) -> io::Result<Vec<u32>> {
    let mut ids = Vec::new();
    for entry in fs::read_dir(dir)? {
        let name = entry?.file_name();
        if let Ok(id) = name.to_string_lossy().parse::<u32>() {
            ids.push(id);
        }
    }
    Ok(ids)
}

fn classify(ft: fs::FileType) -> FileKind {
    if ft.is_file() {
        FileKind::Regular
    } else if ft.is_dir() {
        FileKind::Directory
    } else if ft.is_fifo() {
        FileKind::Fifo
    } else if ft.is_socket() {
        FileKind::Socket
    } else if ft.is_char_device() {
        FileKind::CharDevice
    } else if ft.is_block_device() {
        FileKind::BlockDevice
    } else {
        FileKind::Other
    }
}
