mod config;
mod data;
mod logging;
mod proc;
mod report;

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use crate::data::collector::{Collector, Options};
use crate::proc::{ProcFs, SystemClock};

#[derive(Parser)]
#[command(
    name = "fdprogress",
    version,
    about = "Show progress of running cp, mv, dd, tar, gzip... from /proc"
)]
struct Cli {
    /// Output debug information
    #[arg(short = 'd', long)]
    debug: bool,

    /// Estimate I/O throughput (slower display)
    #[arg(short = 'w', long)]
    wait: bool,

    /// Wait SECS seconds for I/O estimation (implies -w)
    #[arg(short = 'W', long, value_name = "SECS")]
    wait_delay: Option<u64>,

    /// Monitor only this command name (ex: firefox); may be repeated
    #[arg(short = 'c', long = "command", value_name = "NAME")]
    commands: Vec<String>,

    /// Print transfers as JSON
    #[arg(long)]
    json: bool,

    /// Read process information from this directory instead of /proc
    #[arg(long, value_name = "PATH")]
    proc_root: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = config::Config::load();
    let mut config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => config::Config::default(),
    };

    // CLI overrides
    if cli.debug {
        config.general.debug = true;
    }
    if cli.wait {
        config.general.wait = true;
    }
    if let Some(secs) = cli.wait_delay {
        config.general.wait = true;
        config.general.wait_delay_secs = secs;
    }
    if !cli.commands.is_empty() {
        config.general.commands = cli.commands;
    }
    if let Some(root) = cli.proc_root {
        config.general.proc_root = root;
    }

    logging::init(config.general.debug);
    if let Err(e) = &loaded {
        log::warn!("ignoring config: {e:#}");
    }
    if !nix::unistd::Uid::effective().is_root() {
        log::debug!("not running as root: processes of other users are skipped");
    }

    let options = Options {
        commands: config.general.commands,
        wait: config
            .general
            .wait
            .then(|| Duration::from_secs(config.general.wait_delay_secs)),
    };

    let source = ProcFs::new(&config.general.proc_root);
    let collector = Collector::new(&source, &SystemClock, config.general.debug);
    let transfers = collector.collect(&options)?;

    let mut out = io::stdout().lock();
    if cli.json {
        writeln!(out, "{}", report::to_json(&transfers)?).context("writing output")?;
    } else {
        for transfer in &transfers {
            writeln!(out, "{}", report::format_line(transfer)).context("writing output")?;
        }
    }
    Ok(())
}
