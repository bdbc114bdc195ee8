//! Front-door routing: map `(source, lang, test?)` onto a runner with the
//! right default timeout, and fold refusals into the response envelope.

use cev_core::{BasicResponse, ResourceMetrics, Sample, Verdict};
use cev_resource::ResourceStats;
use cev_runner::{RunOutcome, run_javascript, run_python_code, run_python_test, run_typescript};
use tracing::{debug, info, warn};

pub const PYTHON_CODE_TIMEOUT_SECS: f64 = 3.0;
pub const JAVASCRIPT_TIMEOUT_SECS: f64 = 3.0;
pub const TYPESCRIPT_TIMEOUT_SECS: f64 = 5.0;
pub const TEST_BASE_TIMEOUT_SECS: f64 = 6.0;
pub const TEST_PER_CASE_TIMEOUT_SECS: f64 = 2.0;

/// Default timeout for test-mode evaluation, scaled by case count.
pub fn default_test_timeout(case_count: usize) -> f64 {
    TEST_BASE_TIMEOUT_SECS + TEST_PER_CASE_TIMEOUT_SECS * case_count as f64
}

enum Dispatch {
    Ran { outcome: RunOutcome, timeout: f64 },
    Refused { msg: String },
}

/// Evaluate one sample end to end. Unsupported combinations come back as
/// `status=false` with a precise reason; they are never transport errors.
pub async fn evaluate_sample(sample: &Sample) -> BasicResponse {
    debug!(uuid = %sample.uuid, "code to exec:\n{}", sample.code);

    match route(sample).await {
        Dispatch::Ran { outcome, timeout } => {
            let RunOutcome { verdict, stats } = outcome;
            info!(
                uuid = %sample.uuid,
                source = %sample.source,
                lang = %sample.lang,
                timeout,
                memory_limit = sample.memory_limit,
                kwargs = ?sample.kwargs,
                status = verdict.ok,
                msg = %verdict.msg,
                avg_cpu_percent = stats.cpu_percent,
                peak_cpu_percent = stats.peak_cpu_percent,
                avg_memory_mb = stats.memory_mb,
                peak_memory_mb = stats.peak_memory_mb,
                "evaluated sample"
            );
            BasicResponse {
                status: verdict.ok,
                msg: verdict.msg,
                data: Some(metrics_from(stats)),
            }
        }
        Dispatch::Refused { msg } => {
            warn!(
                uuid = %sample.uuid,
                source = %sample.source,
                lang = %sample.lang,
                %msg,
                "rejected sample"
            );
            BasicResponse::refusal(msg)
        }
    }
}

async fn route(sample: &Sample) -> Dispatch {
    match sample.source.as_str() {
        "human-eval" | "mbpp" => route_code(sample).await,
        "livecodebench" => route_livecodebench(sample).await,
        other => Dispatch::Refused {
            msg: format!("not supported data source: {other}"),
        },
    }
}

/// Code-only benchmarks: the snippet passes if it runs to completion.
async fn route_code(sample: &Sample) -> Dispatch {
    match sample.lang.as_str() {
        "python" => {
            let timeout = sample.timeout.unwrap_or(PYTHON_CODE_TIMEOUT_SECS);
            Dispatch::Ran {
                outcome: run_python_code(&sample.code, timeout, sample.memory_limit).await,
                timeout,
            }
        }
        "javascript" => {
            let timeout = sample.timeout.unwrap_or(JAVASCRIPT_TIMEOUT_SECS);
            Dispatch::Ran {
                outcome: run_javascript(&sample.code, timeout).await,
                timeout,
            }
        }
        "typescript" => {
            let timeout = sample.timeout.unwrap_or(TYPESCRIPT_TIMEOUT_SECS);
            Dispatch::Ran {
                outcome: run_typescript(&sample.code, timeout, sample.memory_limit).await,
                timeout,
            }
        }
        other => Dispatch::Refused {
            msg: format!("not supported language: {other}"),
        },
    }
}

/// Test-driven benchmark: Python only; falls back to code-only execution
/// when no test cases are attached.
async fn route_livecodebench(sample: &Sample) -> Dispatch {
    if sample.lang != "python" {
        return Dispatch::Refused {
            msg: format!("not supported language: {}", sample.lang),
        };
    }

    match &sample.test {
        None => {
            let timeout = sample.timeout.unwrap_or(PYTHON_CODE_TIMEOUT_SECS);
            Dispatch::Ran {
                outcome: run_python_code(&sample.code, timeout, sample.memory_limit).await,
                timeout,
            }
        }
        Some(test) => {
            let timeout = sample
                .timeout
                .unwrap_or_else(|| default_test_timeout(test.inputs.len()));
            if test.inputs.len() != test.outputs.len() {
                // Refused before any spawn or compile; telemetry stays zero.
                return Dispatch::Ran {
                    outcome: RunOutcome::new(
                        Verdict::fail("number of inputs and outputs mismatch"),
                        ResourceStats::default(),
                    ),
                    timeout,
                };
            }
            Dispatch::Ran {
                outcome: run_python_test(&sample.code, test, timeout, sample.memory_limit).await,
                timeout,
            }
        }
    }
}

fn metrics_from(stats: ResourceStats) -> ResourceMetrics {
    ResourceMetrics {
        avg_cpu_percent: stats.cpu_percent,
        peak_cpu_percent: stats.peak_cpu_percent,
        avg_memory_mb: stats.memory_mb,
        peak_memory_mb: stats.peak_memory_mb,
    }
}
