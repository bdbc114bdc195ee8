//! Child-process lifecycle for evaluation runners: spawn, terminate, reap.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::process::{Child, Command};
use tracing::debug;

/// Grace window between the soft and hard stages of a kill, and for the
/// final reap.
const KILL_GRACE: Duration = Duration::from_millis(100);

/// Spawn a runner child process.
///
/// The caller configures stdio on `cmd` beforehand; this helper adds the
/// pieces every runner child needs:
/// - its own session/process group (via `setsid`), so signals sent to the
///   negative PID reach the whole tree the child may have forked
/// - `kill_on_drop` as a safety net if the runner unwinds without an
///   explicit kill
pub fn spawn_child(mut cmd: Command) -> std::io::Result<Child> {
    cmd.kill_on_drop(true);

    // SAFETY: setsid() is async-signal-safe and runs between fork and exec.
    #[cfg(unix)]
    unsafe {
        cmd.pre_exec(|| {
            libc::setsid();
            Ok(())
        });
    }

    cmd.spawn()
}

/// Terminate a child cleanly and reap it. Idempotent; never fails.
///
/// Already-exited children return immediately. Otherwise: soft-terminate
/// the process group, give it 100 ms, hard-kill the group, wait another
/// 100 ms for the reap. Signal failures (process gone, permission denied)
/// are swallowed and logged at debug level.
pub async fn shutdown_child(child: &mut Child) {
    match child.try_wait() {
        Ok(Some(_)) => return,
        Ok(None) => {}
        Err(e) => debug!(error = %e, "child status probe failed during shutdown"),
    }

    signal_child_group(child, SoftOrHard::Soft);
    if tokio::time::timeout(KILL_GRACE, child.wait()).await.is_ok() {
        return;
    }

    signal_child_group(child, SoftOrHard::Hard);
    if tokio::time::timeout(KILL_GRACE, child.wait()).await.is_err() {
        // kill_on_drop reaps it eventually; nothing more we can do here.
        debug!(pid = child.id(), "child survived hard-kill grace window");
    }
}

#[derive(Clone, Copy)]
enum SoftOrHard {
    Soft,
    Hard,
}

fn signal_child_group(child: &mut Child, stage: SoftOrHard) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            let signal = match stage {
                SoftOrHard::Soft => libc::SIGTERM,
                SoftOrHard::Hard => libc::SIGKILL,
            };
            // SAFETY: kill() is async-signal-safe; the negative PID targets
            // the process group created by setsid in spawn_child.
            let rc = unsafe { libc::kill(-(pid as i32), signal) };
            if rc != 0 {
                debug!(
                    pid,
                    signal,
                    error = %std::io::Error::last_os_error(),
                    "failed to signal child process group"
                );
            }
            return;
        }
    }

    let _ = stage;
    if let Err(e) = child.start_kill() {
        debug!(error = %e, "failed to kill child");
    }
}

/// Check that an external interpreter is installed and on PATH.
pub async fn check_tool_installed(executable: &str) -> Result<()> {
    let output = Command::new("which")
        .arg(executable)
        .output()
        .await
        .context("failed to execute 'which'")?;

    if !output.status.success() {
        anyhow::bail!("'{executable}' is not installed or not in PATH");
    }

    Ok(())
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
