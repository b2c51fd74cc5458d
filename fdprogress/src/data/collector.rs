use std::time::Duration;

use anyhow::Result;

use super::fd::regular_fds;
use super::process::{find_processes, ProcessHandle};
use super::sample::{take_sample, Sample};
use crate::proc::{Clock, ProcSource};

/// What one run of the collector looks for.
#[derive(Debug, Clone)]
pub struct Options {
    /// Executable base names to watch.
    pub commands: Vec<String>,
    /// Pause between the two passes; `None` skips throughput estimation.
    pub wait: Option<Duration>,
}

/// The file picked as the "main" transfer of one process.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedTransfer {
    pub process: ProcessHandle,
    pub sample: Sample,
}

/// A transfer ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    pub process: ProcessHandle,
    /// The sample the figures come from: the re-sample when it is still the
    /// same file, the first sample otherwise.
    pub sample: Sample,
    pub bytes_per_sec: Option<f64>,
}

impl Transfer {
    pub fn percent(&self) -> f64 {
        self.sample.percent()
    }
}

/// Drives locate, scan and sample for one run.
pub struct Collector<'a, S: ?Sized, C: ?Sized> {
    source: &'a S,
    clock: &'a C,
    /// Passed down to every stage; gates all trace output.
    debug: bool,
}

impl<'a, S, C> Collector<'a, S, C>
where
    S: ProcSource + ?Sized,
    C: Clock + ?Sized,
{
    pub fn new(source: &'a S, clock: &'a C, debug: bool) -> Self {
        Self {
            source,
            clock,
            debug,
        }
    }

    /// Run the whole pipeline: one pass, or two passes with a pause in
    /// between when `options.wait` is set.
    pub fn collect(&self, options: &Options) -> Result<Vec<Transfer>> {
        let selected = self.select(&options.commands)?;
        if selected.is_empty() {
            return Ok(Vec::new());
        }

        match options.wait {
            Some(delay) => {
                self.clock.sleep(delay);
                self.resample(selected)
            }
            None => Ok(selected
                .into_iter()
                .map(|s| Transfer {
                    process: s.process,
                    sample: s.sample,
                    bytes_per_sec: None,
                })
                .collect()),
        }
    }

    /// First pass: pick the largest open regular file of every matching
    /// process.
    pub fn select(&self, commands: &[String]) -> Result<Vec<SelectedTransfer>> {
        let processes = find_processes(self.source, commands, self.debug)?;
        if self.debug {
            let pids: Vec<u32> = processes.iter().map(|p| p.pid).collect();
            log::debug!("relevant pids: {pids:?}");
        }

        let mut selected = Vec::new();
        for process in processes {
            let fds = regular_fds(self.source, process.pid, self.debug)?;
            trace!(self.debug, "fds for [{},{:5}]: {fds:?}", process.name, process.pid);

            let mut samples = Vec::with_capacity(fds.len());
            for fd in fds {
                let sampled = take_sample(self.source, self.clock, process.pid, fd, self.debug)?;
                if let Some(sample) = sampled {
                    trace!(self.debug, "[{:5},{fd:5}] {sample:?}", process.pid);
                    samples.push(sample);
                }
            }

            match largest(samples) {
                Some(sample) => selected.push(SelectedTransfer { process, sample }),
                None => trace!(
                    self.debug,
                    "[{:5}] {} inactive/flushing/streaming/...",
                    process.pid,
                    process.name
                ),
            }
        }

        Ok(selected)
    }

    /// Second pass: sample the same descriptors again and derive a rate.
    ///
    /// A descriptor that went away, or now points at another file, keeps its
    /// first sample and gets no rate.
    pub fn resample(&self, selected: Vec<SelectedTransfer>) -> Result<Vec<Transfer>> {
        let mut transfers = Vec::with_capacity(selected.len());
        for SelectedTransfer { process, sample } in selected {
            let again = take_sample(self.source, self.clock, process.pid, sample.fd, self.debug)?;
            let transfer = match again {
                Some(later) if later.target == sample.target => {
                    let bytes_per_sec = sample.rate_to(&later);
                    Transfer {
                        process,
                        sample: later,
                        bytes_per_sec,
                    }
                }
                Some(later) => {
                    trace!(
                        self.debug,
                        "[{:5},{:5}] {} != {}",
                        process.pid,
                        sample.fd,
                        later.target.display(),
                        sample.target.display()
                    );
                    Transfer {
                        process,
                        sample,
                        bytes_per_sec: None,
                    }
                }
                None => Transfer {
                    process,
                    sample,
                    bytes_per_sec: None,
                },
            };
            transfers.push(transfer);
        }
        Ok(transfers)
    }
}

/// The sample with the largest size, first one winning ties. `None` when
/// there are no samples or every file is empty.
pub fn largest(samples: Vec<Sample>) -> Option<Sample> {
    let mut best: Option<Sample> = None;
    for sample in samples {
        let bigger = match &best {
            Some(b) => sample.size > b.size,
            None => sample.size > 0,
        };
        if bigger {
            best = Some(sample);
        }
    }
    best
}
