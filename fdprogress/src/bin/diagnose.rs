//! Diagnostic binary for the /proc sampling pipeline.
//!
//! Checks, one step at a time, that everything fdprogress reads is
//! reachable from the current user, printing PASS/FAIL per step.
//!
//! Run: ./target/release/diagnose [--proc-root /proc]

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::Parser;
use nix::unistd::Uid;

#[derive(Parser)]
#[command(name = "diagnose", about = "Check /proc access needed by fdprogress")]
struct Cli {
    /// Process-information tree to check
    #[arg(long, default_value = "/proc")]
    proc_root: PathBuf,
}

/// Bytes read from our own executable before inspecting its fdinfo.
const PROBE_READ: usize = 16;

fn main() {
    let cli = Cli::parse();
    let root = cli.proc_root.as_path();

    let mut pass = 0u32;
    let mut fail = 0u32;
    let total = 5u32;

    println!("=== fdprogress /proc Diagnostic ===\n");

    print_step(1, &format!("List processes in {}", root.display()));
    let pids = list_pids(root);
    report(
        &pids.as_ref().map(|p| format!("{} processes", p.len())).map_err(|e| e.clone()),
        &mut pass,
        &mut fail,
    );
    let pids = match pids {
        Ok(p) => p,
        Err(_) => {
            summary(pass, fail, total);
            return;
        }
    };

    print_step(2, "Effective user");
    let uid = Uid::effective();
    let who = if uid.is_root() {
        "root: every process is inspectable".to_string()
    } else {
        format!("uid {uid}: processes of other users will be skipped")
    };
    report(&Ok(who), &mut pass, &mut fail);

    print_step(3, "Resolve exe links");
    report(&check_exe_links(root, &pids), &mut pass, &mut fail);

    print_step(4, "List own descriptor table");
    let own_fds = root.join("self").join("fd");
    let step4 = fs::read_dir(&own_fds)
        .map(|entries| format!("{} descriptors", entries.count()))
        .map_err(|e| format!("{}: {e}", own_fds.display()));
    report(&step4, &mut pass, &mut fail);

    print_step(5, "Read own fdinfo pos");
    report(&check_own_fdinfo(root), &mut pass, &mut fail);

    summary(pass, fail, total);
}

fn list_pids(root: &Path) -> Result<Vec<u32>, String> {
    let entries = fs::read_dir(root).map_err(|e| format!("{}: {e}", root.display()))?;
    Ok(entries
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().to_str().and_then(|s| s.parse().ok()))
        .collect())
}

fn check_exe_links(root: &Path, pids: &[u32]) -> Result<String, String> {
    let mut readable = 0;
    let mut denied = 0;
    let mut gone = 0;
    let mut other = Vec::new();
    for pid in pids {
        match fs::read_link(root.join(pid.to_string()).join("exe")) {
            Ok(_) => readable += 1,
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => denied += 1,
            Err(e) if e.kind() == io::ErrorKind::NotFound => gone += 1,
            Err(e) => other.push(format!("pid {pid}: {e}")),
        }
    }
    println!("  readable={readable} denied={denied} gone/kernel={gone} other={}", other.len());
    for line in other.iter().take(5) {
        println!("    {line}");
    }
    if !other.is_empty() {
        return Err(format!("{} unexpected errors (fdprogress would abort)", other.len()));
    }
    if readable == 0 {
        return Err("no exe link readable".into());
    }
    Ok(format!("{readable} of {} inspectable", pids.len()))
}

/// Open our own executable, read a few bytes, then find the descriptor in
/// /proc/self/fd and check its fdinfo reports the position we expect.
fn check_own_fdinfo(root: &Path) -> Result<String, String> {
    let exe = std::env::current_exe().map_err(|e| format!("current_exe: {e}"))?;
    let mut file = File::open(&exe).map_err(|e| format!("{}: {e}", exe.display()))?;
    let mut buf = [0u8; PROBE_READ];
    file.read_exact(&mut buf)
        .map_err(|e| format!("reading {}: {e}", exe.display()))?;

    let self_dir = root.join("self");
    let entries =
        fs::read_dir(self_dir.join("fd")).map_err(|e| format!("listing own fds: {e}"))?;
    for entry in entries.filter_map(|e| e.ok()) {
        if fs::read_link(entry.path()).ok().as_deref() != Some(exe.as_path()) {
            continue;
        }
        let fd = entry.file_name();
        let info_path = self_dir.join("fdinfo").join(&fd);
        let info = fs::read_to_string(&info_path)
            .map_err(|e| format!("{}: {e}", info_path.display()))?;
        let pos = info
            .lines()
            .find_map(|l| l.strip_prefix("pos:"))
            .map(str::trim)
            .ok_or_else(|| format!("{}: no pos field", info_path.display()))?;
        if pos == PROBE_READ.to_string() {
            return Ok(format!("fd {} pos {pos}", fd.to_string_lossy()));
        }
    }
    Err(format!("no descriptor on {} at pos {PROBE_READ}", exe.display()))
}

fn print_step(n: u32, desc: &str) {
    println!("[Step {n:>2}] {desc}");
}

fn report(result: &Result<String, String>, pass: &mut u32, fail: &mut u32) {
    match result {
        Ok(msg) => {
            println!("  ✓ PASS: {msg}\n");
            *pass += 1;
        }
        Err(msg) => {
            println!("  ✗ FAIL: {msg}\n");
            *fail += 1;
        }
    }
}

fn summary(pass: u32, fail: u32, total: u32) {
    println!("=== Summary: {pass}/{total} passed, {fail} failed ===");
    if fail > 0 {
        std::process::exit(1);
    }
}
