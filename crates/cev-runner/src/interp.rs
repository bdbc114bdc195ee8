//! JavaScript and TypeScript runners.
//!
//! These hand the snippet to an external interpreter and judge by exit
//! code: 0 is a pass (stdout becomes the message), anything else is a
//! failure carrying stderr. The V8 old-space cap is exported through
//! `NODE_OPTIONS` for the TypeScript path.

use std::io::Write;
use std::process::{ExitStatus, Stdio};

use tempfile::{Builder, NamedTempFile};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use cev_core::{EvalError, Verdict};
use cev_process::{shutdown_child, spawn_child};
use cev_resource::{ResourceMonitor, ResourceStats};

use crate::verdict::{RunOutcome, timeout_window};
use crate::{NODE_BIN, TS_NODE_BIN};

struct InterpreterSpec<'a> {
    program: &'a str,
    pre_args: &'a [&'a str],
    suffix: &'a str,
    /// When set, exported as `NODE_OPTIONS=--max-old-space-size=<mb>`.
    node_old_space_mb: Option<u64>,
}

/// Run a JavaScript snippet under `node`.
pub async fn run_javascript(code: &str, timeout_secs: f64) -> RunOutcome {
    let spec = InterpreterSpec {
        program: NODE_BIN,
        pre_args: &[],
        suffix: ".js",
        node_old_space_mb: None,
    };
    run_interpreter(spec, code, timeout_secs).await
}

/// Run a TypeScript snippet under `ts-node`, capping the V8 old space at
/// the given memory limit.
pub async fn run_typescript(code: &str, timeout_secs: f64, memory_limit_mb: u64) -> RunOutcome {
    let spec = InterpreterSpec {
        program: TS_NODE_BIN,
        pre_args: &["--compiler-options", r#"{"module": "commonjs"}"#],
        suffix: ".ts",
        node_old_space_mb: Some(memory_limit_mb),
    };
    run_interpreter(spec, code, timeout_secs).await
}

async fn run_interpreter(spec: InterpreterSpec<'_>, code: &str, timeout_secs: f64) -> RunOutcome {
    let script = match stage_script(code, spec.suffix) {
        Ok(file) => file,
        Err(e) => {
            return RunOutcome::new(Verdict::fail_raw(e.to_verdict_msg()), ResourceStats::default());
        }
    };

    let mut cmd = Command::new(spec.program);
    cmd.args(spec.pre_args)
        .arg(script.path())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(mb) = spec.node_old_space_mb {
        cmd.env("NODE_OPTIONS", format!("--max-old-space-size={mb}"));
    }

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
    let verdict = judge_exit(&mut child, timeout_secs).await;

    let stats = match monitor {
        Some(monitor) => monitor.stop().await,
        None => ResourceStats::default(),
    };
    shutdown_child(&mut child).await;
    drop(script);

    RunOutcome::new(verdict, stats)
}

/// Wait for the interpreter within the timeout and turn its exit into a
/// verdict. Output pipes are drained concurrently so a chatty child can
/// never wedge itself against pipe backpressure.
async fn judge_exit(child: &mut Child, timeout_secs: f64) -> Verdict {
    let stdout = drain_pipe(child.stdout.take());
    let stderr = drain_pipe(child.stderr.take());

    match tokio::time::timeout(timeout_window(timeout_secs), child.wait()).await {
        Ok(Ok(status)) => {
            let out = stdout.await.unwrap_or_default();
            let err = stderr.await.unwrap_or_default();
            if status.success() {
                Verdict::pass_with(out.trim().to_string())
            } else {
                Verdict::fail_raw(format!("failed [exit {}]: {}", exit_code(status), err.trim()))
            }
        }
        Ok(Err(e)) => Verdict::fail_raw(EvalError::Output(e).to_verdict_msg()),
        Err(_) => Verdict::fail("timeout"),
    }
}

fn drain_pipe<R>(pipe: Option<R>) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = String::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_string(&mut buf).await;
        }
        buf
    })
}

/// Exit code for the verdict string; signal deaths render as the negated
/// signal number.
fn exit_code(status: ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        status
            .code()
            .or_else(|| status.signal().map(|signal| -signal))
            .unwrap_or(-1)
    }
    #[cfg(not(unix))]
    {
        status.code().unwrap_or(-1)
    }
}

fn stage_script(code: &str, suffix: &str) -> Result<NamedTempFile, EvalError> {
    let mut file = Builder::new()
        .prefix("snippet-")
        .suffix(suffix)
        .tempfile()
        .map_err(EvalError::Workspace)?;
    file.write_all(code.as_bytes()).map_err(EvalError::Stage)?;
    file.flush().map_err(EvalError::Stage)?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn exit_code_maps_normal_exits() {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(exit_code(ExitStatus::from_raw(0)), 0);
        // Wait status 0x0100 means "exited with code 1".
        assert_eq!(exit_code(ExitStatus::from_raw(0x0100)), 1);
    }

    #[cfg(unix)]
    #[test]
    fn exit_code_negates_signals() {
        use std::os::unix::process::ExitStatusExt;
        // Wait status 9 means "killed by SIGKILL".
        assert_eq!(exit_code(ExitStatus::from_raw(9)), -9);
    }

    #[test]
    fn staged_script_keeps_the_suffix() {
        let file = stage_script("console.log(1)", ".js").unwrap();
        let name = file.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with(".js"));
        assert_eq!(std::fs::read_to_string(file.path()).unwrap(), "console.log(1)");
    }

    #[test]
    fn staged_script_is_removed_on_drop() {
        let file = stage_script("x", ".ts").unwrap();
        let path = file.path().to_path_buf();
        drop(file);
        assert!(!path.exists());
    }
}
