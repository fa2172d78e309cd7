use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// CPU and memory usage observed over the lifetime of one run.
///
/// All fields are optional so that an unsupported platform, or a run too short to collect a
/// single sample, degrades to "unavailable" markers instead of failing the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ResourceSample {
    pub peak_cpu_pct: Option<f64>,
    pub mean_cpu_pct: Option<f64>,
    pub peak_mem_mb: Option<f64>,
    pub mean_mem_mb: Option<f64>,
    pub samples: u32,
}

impl ResourceSample {
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub(crate) fn from_samples(cpu_pct: Vec<f64>, mem_mb: Vec<f64>) -> Self {
        if cpu_pct.is_empty() {
            return Self::unavailable();
        }

        let mean = |values: &[f64]| values.iter().sum::<f64>() / values.len() as f64;
        let peak = |values: &[f64]| values.iter().cloned().fold(f64::MIN, f64::max);

        Self {
            peak_cpu_pct: Some(peak(&cpu_pct)),
            mean_cpu_pct: Some(mean(&cpu_pct)),
            peak_mem_mb: Some(peak(&mem_mb)),
            mean_mem_mb: Some(mean(&mem_mb)),
            samples: cpu_pct.len() as u32,
        }
    }
}

/// Samples this process's CPU and memory at a fixed interval while a query is in flight.
///
/// Sampling runs on its own thread so it never blocks or delays the query call it is measuring.
#[derive(Debug, Clone)]
pub struct ResourceSampler {
    interval: Duration,
}

impl Default for ResourceSampler {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

impl ResourceSampler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn start(&self) -> SamplerHandle {
        let stop = Arc::new(AtomicBool::new(false));
        let interval = self.interval.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);

        let thread_stop = stop.clone();
        let thread = std::thread::Builder::new()
            .name("sampler".to_string())
            .spawn(move || {
                let pid = Pid::from_u32(std::process::id());
                let mut sys = System::new();
                let refresh_kind = ProcessRefreshKind::nothing().with_cpu().with_memory();

                // Prime the CPU counters, the first refresh always reports zero usage.
                sys.refresh_processes_specifics(
                    ProcessesToUpdate::Some(&[pid]),
                    true,
                    refresh_kind,
                );

                let mut cpu_pct = Vec::new();
                let mut mem_mb = Vec::new();
                loop {
                    std::thread::sleep(interval);
                    if thread_stop.load(Ordering::Relaxed) {
                        break;
                    }

                    sys.refresh_processes_specifics(
                        ProcessesToUpdate::Some(&[pid]),
                        true,
                        refresh_kind,
                    );
                    if let Some(process) = sys.process(pid) {
                        cpu_pct.push(process.cpu_usage() as f64);
                        mem_mb.push(process.memory() as f64 / (1024.0 * 1024.0));
                    }
                }

                (cpu_pct, mem_mb)
            });

        SamplerHandle { stop, thread }
    }
}

#[derive(Debug)]
pub struct SamplerHandle {
    stop: Arc<AtomicBool>,
    thread: std::io::Result<JoinHandle<(Vec<f64>, Vec<f64>)>>,
}

impl SamplerHandle {
    /// Stop sampling and reduce whatever was collected to peak and mean values.
    pub fn finish(self) -> ResourceSample {
        self.stop.store(true, Ordering::Relaxed);

        let thread = match self.thread {
            Ok(thread) => thread,
            Err(e) => {
                log::warn!("Resource sampler thread could not be started: {e}");
                return ResourceSample::unavailable();
            }
        };

        match thread.join() {
            Ok((cpu_pct, mem_mb)) => ResourceSample::from_samples(cpu_pct, mem_mb),
            Err(_) => {
                log::warn!("Resource sampler thread panicked, recording no samples");
                ResourceSample::unavailable()
            }
        }
    }
}
