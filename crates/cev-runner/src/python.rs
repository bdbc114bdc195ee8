//! Python runners.
//!
//! The in-child logic (rlimit guard, stdio harness, test comparator) needs
//! in-process monkey-patching and AST surgery, so it stays Python: the
//! embedded driver scripts are staged into an owned temp directory and run
//! under a fresh `python3` each time. Nothing of the parent leaks into the
//! child, and a previous child's patches cannot survive into the next.

use std::process::Stdio;

use serde::Serialize;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tracing::debug;

use cev_core::{EvalError, TestSpec, Verdict};
use cev_process::{shutdown_child, spawn_child};
use cev_resource::{ResourceMonitor, ResourceStats};

use crate::PYTHON_BIN;
use crate::verdict::{RunOutcome, format_secs, timeout_window};

const GUARD_SRC: &str = include_str!("../py/guard.py");
const RUN_CODE_SRC: &str = include_str!("../py/run_code.py");
const RUN_TEST_SRC: &str = include_str!("../py/run_test.py");

const RUN_CODE_DRIVER: &str = "run_code.py";
const RUN_TEST_DRIVER: &str = "run_test.py";
const PAYLOAD_FILE: &str = "payload.json";

/// Marks the single verdict line a driver prints on its real stdout. The
/// drivers redirect user stdout inside the interpreter, so nothing else
/// can appear on this pipe.
const VERDICT_SENTINEL: &str = "__CODE_EVAL_VERDICT__ ";

#[derive(Serialize)]
struct DriverPayload<'a> {
    code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    inputs: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    outputs: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fn_name: Option<&'a str>,
    memory_limit_mb: u64,
}

/// Execute a snippet with no test cases; pass means it ran to completion.
pub async fn run_python_code(code: &str, timeout_secs: f64, memory_limit_mb: u64) -> RunOutcome {
    let payload = DriverPayload {
        code,
        inputs: None,
        outputs: None,
        fn_name: None,
        memory_limit_mb,
    };
    drive(RUN_CODE_DRIVER, RUN_CODE_SRC, &payload, timeout_secs).await
}

/// Execute a snippet against paired test cases via the comparator driver.
pub async fn run_python_test(
    code: &str,
    test: &TestSpec,
    timeout_secs: f64,
    memory_limit_mb: u64,
) -> RunOutcome {
    let payload = DriverPayload {
        code,
        inputs: Some(&test.inputs),
        outputs: Some(&test.outputs),
        fn_name: test.fn_name.as_deref(),
        memory_limit_mb,
    };
    drive(RUN_TEST_DRIVER, RUN_TEST_SRC, &payload, timeout_secs).await
}

/// Shared scaffolding: stage the workspace, spawn, monitor, await the
/// verdict, then tear everything down in order (sampler, child, temp dir).
async fn drive(
    driver_name: &str,
    driver_src: &str,
    payload: &DriverPayload<'_>,
    timeout_secs: f64,
) -> RunOutcome {
    let workspace = match stage_workspace(driver_name, driver_src, payload) {
        Ok(dir) => dir,
        Err(e) => {
            return RunOutcome::new(Verdict::fail_raw(e.to_verdict_msg()), ResourceStats::default());
        }
    };

    let mut cmd = Command::new(PYTHON_BIN);
    cmd.arg("-u")
        .arg(workspace.path().join(driver_name))
        .arg(workspace.path().join(PAYLOAD_FILE))
        .current_dir(workspace.path())
        // The driver's scratch dir lands inside the owned workspace, so
        // even a SIGKILL'd child leaves nothing behind once we drop it.
        .env("TMPDIR", workspace.path())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());

    let mut child = match spawn_child(cmd) {
        Ok(child) => child,
        Err(e) => {
            let err = EvalError::Spawn(e);
            return RunOutcome::new(
                Verdict::fail_raw(err.to_verdict_msg()),
                ResourceStats::default(),
            );
        }
    };

    let monitor = child.id().map(ResourceMonitor::start);

    let verdict = match watch_for_verdict(&mut child) {
        Ok(rx) => await_verdict(&mut child, rx, timeout_secs).await,
        Err(e) => Verdict::fail_raw(e.to_verdict_msg()),
    };

    let stats = match monitor {
        Some(monitor) => monitor.stop().await,
        None => ResourceStats::default(),
    };
    shutdown_child(&mut child).await;
    drop(workspace);

    RunOutcome::new(verdict, stats)
}

/// Write the guard module, the driver, and the payload into a fresh
/// temp directory owned by this runner invocation.
fn stage_workspace(
    driver_name: &str,
    driver_src: &str,
    payload: &DriverPayload<'_>,
) -> Result<TempDir, EvalError> {
    let dir = TempDir::new().map_err(EvalError::Workspace)?;
    let encoded = serde_json::to_vec(payload).map_err(EvalError::Payload)?;
    std::fs::write(dir.path().join("guard.py"), GUARD_SRC).map_err(EvalError::Stage)?;
    std::fs::write(dir.path().join(driver_name), driver_src).map_err(EvalError::Stage)?;
    std::fs::write(dir.path().join(PAYLOAD_FILE), encoded).map_err(EvalError::Stage)?;
    Ok(dir)
}

/// Tail the child's stdout for the sentinel verdict line.
///
/// The receiver resolves with the parsed verdict, or errors when stdout
/// reaches EOF without one (the child died before reporting).
fn watch_for_verdict(child: &mut Child) -> Result<oneshot::Receiver<(bool, String)>, EvalError> {
    let stdout = child.stdout.take().ok_or(EvalError::Pipe("stdout"))?;
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let mut tx = Some(tx);
        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let Some(rest) = line.strip_prefix(VERDICT_SENTINEL) else {
                continue;
            };
            match serde_json::from_str::<(bool, String)>(rest) {
                Ok(verdict) => {
                    if let Some(tx) = tx.take() {
                        let _ = tx.send(verdict);
                    }
                }
                Err(e) => debug!(error = %e, "malformed verdict line from driver"),
            }
        }
    });

    Ok(rx)
}

async fn await_verdict(
    child: &mut Child,
    rx: oneshot::Receiver<(bool, String)>,
    timeout_secs: f64,
) -> Verdict {
    match tokio::time::timeout(timeout_window(timeout_secs), rx).await {
        Ok(Ok((true, msg))) => Verdict::pass_with(msg),
        Ok(Ok((false, msg))) => Verdict::fail_raw(msg),
        // Sender dropped: stdout closed without a verdict line.
        Ok(Err(_)) => Verdict::fail("no result from subprocess"),
        Err(_) => {
            if matches!(child.try_wait(), Ok(None)) {
                Verdict::fail(format!("subprocess timeout: {}s", format_secs(timeout_secs)))
            } else {
                Verdict::fail("no result from subprocess")
            }
        }
    }
}
