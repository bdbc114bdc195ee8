//! End-to-end tests for the node / ts-node runners, skipped on hosts
//! without the interpreter.

use cev_runner::{NODE_BIN, TS_NODE_BIN, run_javascript, run_typescript};

async fn tool_missing(bin: &str) -> bool {
    if cev_process::check_tool_installed(bin).await.is_err() {
        eprintln!("skipping: {bin} not installed");
        return true;
    }
    false
}

#[tokio::test]
async fn javascript_pass_returns_trimmed_stdout() {
    if tool_missing(NODE_BIN).await {
        return;
    }
    let outcome = run_javascript("console.log('hi')", 10.0).await;
    assert!(outcome.verdict.ok, "unexpected: {}", outcome.verdict.msg);
    assert_eq!(outcome.verdict.msg, "hi");
}

#[tokio::test]
async fn javascript_failure_carries_exit_code_and_stderr() {
    if tool_missing(NODE_BIN).await {
        return;
    }
    let outcome = run_javascript("throw new Error('broken')", 10.0).await;
    assert!(!outcome.verdict.ok);
    assert!(
        outcome.verdict.msg.starts_with("failed [exit 1]: "),
        "unexpected: {}",
        outcome.verdict.msg
    );
    assert!(outcome.verdict.msg.contains("broken"));
}

#[tokio::test]
async fn javascript_infinite_loop_times_out() {
    if tool_missing(NODE_BIN).await {
        return;
    }
    let outcome = run_javascript("for (;;) {}", 1.0).await;
    assert!(!outcome.verdict.ok);
    assert_eq!(outcome.verdict.msg, "failed: timeout");
}

#[tokio::test]
async fn javascript_collects_telemetry() {
    if tool_missing(NODE_BIN).await {
        return;
    }
    let code = "const end = Date.now() + 500; while (Date.now() < end) {} console.log('ok')";
    let outcome = run_javascript(code, 10.0).await;
    assert!(outcome.verdict.ok, "unexpected: {}", outcome.verdict.msg);
    assert!(outcome.stats.peak_memory_mb > 0.0);
    assert!(outcome.stats.peak_memory_mb >= outcome.stats.memory_mb);
}

#[tokio::test]
async fn typescript_pass_returns_trimmed_stdout() {
    if tool_missing(TS_NODE_BIN).await {
        return;
    }
    let outcome = run_typescript("console.log('hi')", 60.0, 1024).await;
    assert!(outcome.verdict.ok, "unexpected: {}", outcome.verdict.msg);
    assert_eq!(outcome.verdict.msg, "hi");
}

#[tokio::test]
async fn typescript_failure_reports_stderr() {
    if tool_missing(TS_NODE_BIN).await {
        return;
    }
    let outcome = run_typescript("process.exit(3)", 60.0, 1024).await;
    assert!(!outcome.verdict.ok);
    assert!(
        outcome.verdict.msg.starts_with("failed [exit 3]: "),
        "unexpected: {}",
        outcome.verdict.msg
    );
}
