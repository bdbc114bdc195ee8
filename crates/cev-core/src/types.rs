use serde::{Deserialize, Serialize};

/// One evaluation request: a snippet of model-generated code, the benchmark
/// it came from, and optional test cases plus resource bounds.
#[derive(Debug, Clone, Deserialize)]
pub struct Sample {
    pub uuid: String,
    /// Benchmark family: `human-eval`, `mbpp`, or `livecodebench`.
    pub source: String,
    pub code: String,
    #[serde(default)]
    pub test: Option<TestSpec>,
    #[serde(default = "default_lang")]
    pub lang: String,
    /// Wall-clock bound in seconds; overrides the per-language default.
    #[serde(default)]
    pub timeout: Option<f64>,
    /// Memory cap in MiB applied inside the child.
    #[serde(default = "default_memory_limit")]
    pub memory_limit: u64,
    /// Opaque caller metadata, logged but otherwise ignored.
    #[serde(default)]
    pub kwargs: Option<serde_json::Value>,
}

fn default_lang() -> String {
    "python".to_string()
}

fn default_memory_limit() -> u64 {
    1024
}

/// Paired test inputs and expected outputs.
///
/// With `fn_name` set the comparator calls that function with JSON-decoded
/// arguments; without it, inputs are fed to stdin and stdout is compared
/// line by line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSpec {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    #[serde(default)]
    pub fn_name: Option<String>,
}

/// Pass/fail outcome of one evaluation.
///
/// `msg` is empty on success; failures start with `failed:` (or
/// `failed [exit <code>]:` for interpreter exits) and carry a stable,
/// testable reason string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub ok: bool,
    pub msg: String,
}

impl Verdict {
    pub fn pass() -> Self {
        Self {
            ok: true,
            msg: String::new(),
        }
    }

    pub fn pass_with(msg: impl Into<String>) -> Self {
        Self {
            ok: true,
            msg: msg.into(),
        }
    }

    /// Failure with a reason that does not yet carry the `failed: ` prefix.
    pub fn fail(reason: impl AsRef<str>) -> Self {
        Self {
            ok: false,
            msg: format!("failed: {}", reason.as_ref()),
        }
    }

    /// Failure whose message is already fully formatted.
    pub fn fail_raw(msg: impl Into<String>) -> Self {
        Self {
            ok: false,
            msg: msg.into(),
        }
    }
}

/// Resource telemetry reported back to the caller.
///
/// All fields are zero when sampling never attached to the child.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ResourceMetrics {
    pub avg_cpu_percent: f64,
    pub peak_cpu_percent: f64,
    pub avg_memory_mb: f64,
    pub peak_memory_mb: f64,
}

/// The uniform HTTP response envelope.
///
/// Failure is content, not transport: every evaluation answers 200 with
/// `status`/`msg`, and `data` carries telemetry when a runner collected it.
#[derive(Debug, Clone, Serialize)]
pub struct BasicResponse {
    pub status: bool,
    pub msg: String,
    pub data: Option<ResourceMetrics>,
}

impl BasicResponse {
    pub fn healthy() -> Self {
        Self {
            status: true,
            msg: "healthy".to_string(),
            data: None,
        }
    }

    pub fn refusal(msg: impl Into<String>) -> Self {
        Self {
            status: false,
            msg: msg.into(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_defaults_apply() {
        let sample: Sample = serde_json::from_str(
            r#"{"uuid":"u-1","source":"human-eval","code":"print(1)"}"#,
        )
        .unwrap();
        assert_eq!(sample.lang, "python");
        assert_eq!(sample.memory_limit, 1024);
        assert!(sample.test.is_none());
        assert!(sample.timeout.is_none());
        assert!(sample.kwargs.is_none());
    }

    #[test]
    fn sample_full_body_parses() {
        let sample: Sample = serde_json::from_str(
            r#"{
                "uuid": "u-2",
                "source": "livecodebench",
                "code": "class Solution: pass",
                "lang": "python",
                "timeout": 2.5,
                "memory_limit": 256,
                "test": {"inputs": ["1\n2"], "outputs": ["3"], "fn_name": "add"},
                "kwargs": {"attempt": 1}
            }"#,
        )
        .unwrap();
        assert_eq!(sample.timeout, Some(2.5));
        assert_eq!(sample.memory_limit, 256);
        let test = sample.test.unwrap();
        assert_eq!(test.fn_name.as_deref(), Some("add"));
        assert_eq!(test.inputs.len(), test.outputs.len());
    }

    #[test]
    fn test_spec_fn_name_optional() {
        let spec: TestSpec =
            serde_json::from_str(r#"{"inputs": [""], "outputs": ["1"]}"#).unwrap();
        assert!(spec.fn_name.is_none());
    }

    #[test]
    fn verdict_constructors() {
        assert_eq!(Verdict::pass(), Verdict { ok: true, msg: String::new() });
        assert_eq!(Verdict::fail("timeout").msg, "failed: timeout");
        assert_eq!(
            Verdict::fail_raw("failed [exit 1]: boom").msg,
            "failed [exit 1]: boom"
        );
    }

    #[test]
    fn response_serializes_null_data() {
        let body = serde_json::to_value(BasicResponse::healthy()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"status": true, "msg": "healthy", "data": null})
        );
    }

    #[test]
    fn response_serializes_metrics() {
        let response = BasicResponse {
            status: true,
            msg: String::new(),
            data: Some(ResourceMetrics {
                avg_cpu_percent: 12.5,
                peak_cpu_percent: 50.0,
                avg_memory_mb: 10.0,
                peak_memory_mb: 20.0,
            }),
        };
        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(body["data"]["peak_cpu_percent"], 50.0);
        assert_eq!(body["data"]["avg_memory_mb"], 10.0);
    }
}
