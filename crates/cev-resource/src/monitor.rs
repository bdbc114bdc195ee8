use std::time::Duration;

use sysinfo::{Pid, ProcessesToUpdate, System};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Default polling cadence for a child's CPU% and RSS.
pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

/// Aggregated telemetry for one child process.
///
/// Averages are simple means over the samples collected by the time the
/// monitor commits; peaks are tracked live. All fields stay zero when the
/// monitor never managed to observe the process.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResourceStats {
    /// Mean of the non-zero CPU samples, in percent.
    pub cpu_percent: f64,
    pub peak_cpu_percent: f64,
    /// Mean RSS in MiB.
    pub memory_mb: f64,
    pub peak_memory_mb: f64,
}

/// Running sums and peaks for the two sampled series.
///
/// The CPU counter's first reading is always zero (the OS needs two
/// observations to compute a rate), so zero CPU samples are skipped
/// entirely; RSS samples always count.
#[derive(Debug, Default)]
struct StatsAccumulator {
    cpu_sum: f64,
    cpu_count: u32,
    peak_cpu: f64,
    mem_sum: f64,
    mem_count: u32,
    peak_mem: f64,
}

impl StatsAccumulator {
    fn record_cpu(&mut self, percent: f64) {
        if percent <= 0.0 {
            return;
        }
        self.cpu_sum += percent;
        self.cpu_count += 1;
        if percent > self.peak_cpu {
            self.peak_cpu = percent;
        }
    }

    fn record_memory_mb(&mut self, mem_mb: f64) {
        self.mem_sum += mem_mb;
        self.mem_count += 1;
        if mem_mb > self.peak_mem {
            self.peak_mem = mem_mb;
        }
    }

    fn finish(self) -> ResourceStats {
        ResourceStats {
            cpu_percent: if self.cpu_count > 0 {
                self.cpu_sum / f64::from(self.cpu_count)
            } else {
                0.0
            },
            peak_cpu_percent: self.peak_cpu,
            memory_mb: if self.mem_count > 0 {
                self.mem_sum / f64::from(self.mem_count)
            } else {
                0.0
            },
            peak_memory_mb: self.peak_mem,
        }
    }
}

/// Samples a child process's CPU% and RSS in a background tokio task until
/// stopped or the process disappears.
pub struct ResourceMonitor {
    stop: CancellationToken,
    handle: tokio::task::JoinHandle<ResourceStats>,
}

impl ResourceMonitor {
    /// Start monitoring a process by PID at the default cadence.
    pub fn start(pid: u32) -> Self {
        Self::start_with_interval(pid, SAMPLE_INTERVAL)
    }

    /// Start monitoring with an explicit polling interval.
    ///
    /// Returns immediately; the sampling loop runs in a background task.
    /// If the process cannot be observed at all, the task exits with
    /// zeroed stats. If it disappears mid-run, whatever samples were
    /// gathered remain valid.
    pub fn start_with_interval(pid: u32, interval: Duration) -> Self {
        let stop = CancellationToken::new();
        let token = stop.clone();

        let handle = tokio::spawn(async move {
            let mut sys = System::new();
            let sysinfo_pid = Pid::from_u32(pid);
            let mut acc = StatsAccumulator::default();

            // Priming read: establishes the CPU baseline. Its reading is
            // always zero and is not recorded.
            sys.refresh_processes(ProcessesToUpdate::Some(&[sysinfo_pid]), true);
            if sys.process(sysinfo_pid).is_none() {
                debug!(pid, "process not observable; reporting zeroed stats");
                return ResourceStats::default();
            }

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }

                sys.refresh_processes(ProcessesToUpdate::Some(&[sysinfo_pid]), true);
                let Some(process) = sys.process(sysinfo_pid) else {
                    // Process exited; keep the samples collected so far.
                    break;
                };

                acc.record_cpu(f64::from(process.cpu_usage()));
                acc.record_memory_mb(process.memory() as f64 / (1024.0 * 1024.0));
            }

            acc.finish()
        });

        Self { stop, handle }
    }

    /// Signal the sampling loop to stop and wait for it to commit.
    ///
    /// Awaiting the task is the commit point: averages are computed from
    /// the samples collected up to the moment the loop observes the stop.
    pub async fn stop(self) -> ResourceStats {
        self.stop.cancel();
        self.handle.await.unwrap_or_default()
    }
}
