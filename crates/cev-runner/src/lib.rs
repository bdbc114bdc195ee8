//! Per-language sandboxed code runners.
//!
//! Each runner spawns an external interpreter in its own process group,
//! samples CPU and RSS while it runs, enforces a wall-clock timeout, and
//! always reaps the child and removes its temp artifacts before returning.

mod interp;
mod python;
mod verdict;

pub use interp::{run_javascript, run_typescript};
pub use python::{run_python_code, run_python_test};
pub use verdict::RunOutcome;

/// External interpreter binaries, resolved through PATH.
pub const PYTHON_BIN: &str = "python3";
pub const NODE_BIN: &str = "node";
pub const TS_NODE_BIN: &str = "ts-node";
