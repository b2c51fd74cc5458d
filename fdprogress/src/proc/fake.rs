//! In-memory metadata provider and clock for pipeline tests.
//!
//! Per-descriptor values are scripted as sequences: each read consumes the
//! front value until only one is left, which then sticks. That lets a test
//! describe what the first and the second sampling pass observe.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use super::{Clock, FileKind, ProcSource};

type Scripted<T> = Result<T, io::ErrorKind>;

struct Seq<T>(RefCell<VecDeque<Scripted<T>>>);

impl<T: Clone> Seq<T> {
    fn new() -> Self {
        Self(RefCell::new(VecDeque::new()))
    }

    fn push(&self, value: Scripted<T>) {
        self.0.borrow_mut().push_back(value);
    }

    fn next(&self) -> io::Result<T> {
        let mut q = self.0.borrow_mut();
        let value = if q.len() > 1 {
            q.pop_front()
        } else {
            q.front().cloned()
        };
        match value {
            Some(Ok(v)) => Ok(v),
            Some(Err(kind)) => Err(io::Error::from(kind)),
            None => Err(io::Error::from(io::ErrorKind::NotFound)),
        }
    }
}

#[derive(Default)]
struct FakeProcess {
    exe: Option<Scripted<PathBuf>>,
    fds_error: Option<io::ErrorKind>,
    fd_order: Vec<u32>,
    kinds: HashMap<u32, Scripted<FileKind>>,
}

#[derive(Default)]
pub struct FakeProc {
    pids_error: Option<io::ErrorKind>,
    procs: BTreeMap<u32, FakeProcess>,
    targets: HashMap<(u32, u32), Seq<PathBuf>>,
    infos: HashMap<(u32, u32), Seq<String>>,
    sizes: HashMap<PathBuf, Seq<u64>>,
}

impl FakeProc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pids_err(mut self, kind: io::ErrorKind) -> Self {
        self.pids_error = Some(kind);
        self
    }

    pub fn process(mut self, pid: u32, exe: &str) -> Self {
        self.procs.entry(pid).or_default().exe = Some(Ok(PathBuf::from(exe)));
        self
    }

    pub fn process_err(mut self, pid: u32, kind: io::ErrorKind) -> Self {
        self.procs.entry(pid).or_default().exe = Some(Err(kind));
        self
    }

    pub fn fds_err(mut self, pid: u32, kind: io::ErrorKind) -> Self {
        self.procs.entry(pid).or_default().fds_error = Some(kind);
        self
    }

    pub fn fd(mut self, pid: u32, fd: u32, kind: FileKind) -> Self {
        self.add_fd(pid, fd, Ok(kind));
        self
    }

    pub fn fd_err(mut self, pid: u32, fd: u32, kind: io::ErrorKind) -> Self {
        self.add_fd(pid, fd, Err(kind));
        self
    }

    pub fn target(mut self, pid: u32, fd: u32, path: &str) -> Self {
        self.targets
            .entry((pid, fd))
            .or_insert_with(Seq::new)
            .push(Ok(PathBuf::from(path)));
        self
    }

    pub fn target_err(mut self, pid: u32, fd: u32, kind: io::ErrorKind) -> Self {
        self.targets
            .entry((pid, fd))
            .or_insert_with(Seq::new)
            .push(Err(kind));
        self
    }

    pub fn size(mut self, path: &str, bytes: u64) -> Self {
        self.sizes
            .entry(PathBuf::from(path))
            .or_insert_with(Seq::new)
            .push(Ok(bytes));
        self
    }

    pub fn size_err(mut self, path: &str, kind: io::ErrorKind) -> Self {
        self.sizes
            .entry(PathBuf::from(path))
            .or_insert_with(Seq::new)
            .push(Err(kind));
        self
    }

    pub fn pos(self, pid: u32, fd: u32, pos: u64) -> Self {
        self.fdinfo_text(pid, fd, &format!("pos:\t{pos}\nflags:\t0100000\nmnt_id:\t29\n"))
    }

    pub fn fdinfo_text(mut self, pid: u32, fd: u32, text: &str) -> Self {
        self.infos
            .entry((pid, fd))
            .or_insert_with(Seq::new)
            .push(Ok(text.to_string()));
        self
    }

    pub fn fdinfo_err(mut self, pid: u32, fd: u32, kind: io::ErrorKind) -> Self {
        self.infos
            .entry((pid, fd))
            .or_insert_with(Seq::new)
            .push(Err(kind));
        self
    }

    /// Regular file on `fd` with one scripted size and position.
    pub fn file(self, pid: u32, fd: u32, path: &str, size: u64, pos: u64) -> Self {
        self.fd(pid, fd, FileKind::Regular)
            .target(pid, fd, path)
            .size(path, size)
            .pos(pid, fd, pos)
    }

    fn add_fd(&mut self, pid: u32, fd: u32, kind: Scripted<FileKind>) {
        let proc = self.procs.entry(pid).or_default();
        if !proc.fd_order.contains(&fd) {
            proc.fd_order.push(fd);
        }
        proc.kinds.insert(fd, kind);
    }

    fn proc(&self, pid: u32) -> io::Result<&FakeProcess> {
        self.procs
            .get(&pid)
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }
}

impl ProcSource for FakeProc {
    fn pids(&self) -> io::Result<Vec<u32>> {
        if let Some(kind) = self.pids_error {
            return Err(kind.into());
        }
        Ok(self.procs.keys().copied().collect())
    }

    fn exe(&self, pid: u32) -> io::Result<PathBuf> {
        match &self.proc(pid)?.exe {
            Some(Ok(path)) => Ok(path.clone()),
            Some(Err(kind)) => Err((*kind).into()),
            None => Err(io::ErrorKind::NotFound.into()),
        }
    }

    fn fds(&self, pid: u32) -> io::Result<Vec<u32>> {
        let proc = self.proc(pid)?;
        if let Some(kind) = proc.fds_error {
            return Err(kind.into());
        }
        Ok(proc.fd_order.clone())
    }

    fn fd_kind(&self, pid: u32, fd: u32) -> io::Result<FileKind> {
        match self.proc(pid)?.kinds.get(&fd) {
            Some(Ok(kind)) => Ok(*kind),
            Some(Err(kind)) => Err((*kind).into()),
            None => Err(io::ErrorKind::NotFound.into()),
        }
    }

    fn fd_target(&self, pid: u32, fd: u32) -> io::Result<PathBuf> {
        match self.targets.get(&(pid, fd)) {
            Some(seq) => seq.next(),
            None => Err(io::ErrorKind::NotFound.into()),
        }
    }

    fn file_size(&self, path: &Path) -> io::Result<u64> {
        match self.sizes.get(path) {
            Some(seq) => seq.next(),
            None => Err(io::ErrorKind::NotFound.into()),
        }
    }

    fn fdinfo(&self, pid: u32, fd: u32) -> io::Result<String> {
        match self.infos.get(&(pid, fd)) {
            Some(seq) => seq.next(),
            None => Err(io::ErrorKind::NotFound.into()),
        }
    }
}

/// Clock that only moves when slept on.
pub struct ManualClock {
    now: Cell<SystemTime>,
    slept: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Cell::new(SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000)),
            slept: Cell::new(Duration::ZERO),
        }
    }

    pub fn slept(&self) -> Duration {
        self.slept.get()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
        self.slept.set(self.slept.get() + duration);
    }
}
