/// Infrastructure failure inside a runner: the scaffolding broke, not the
/// user code. User-code failures are never errors; they travel as `Verdict`
/// messages. These are rendered into the verdict grammar as
/// `failed: [<kind>] <detail>` and never surface as transport errors.
#[derive(thiserror::Error, Debug)]
pub enum EvalError {
    #[error("could not create evaluation workspace: {0}")]
    Workspace(#[source] std::io::Error),

    #[error("could not stage driver files: {0}")]
    Stage(#[source] std::io::Error),

    #[error("could not encode driver payload: {0}")]
    Payload(#[source] serde_json::Error),

    #[error("could not spawn interpreter: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("interpreter pipe unavailable: {0}")]
    Pipe(&'static str),

    #[error("could not collect interpreter output: {0}")]
    Output(#[source] std::io::Error),
}

impl EvalError {
    /// Short kind tag used in the verdict string.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Workspace(_) => "WorkspaceError",
            Self::Stage(_) => "StageError",
            Self::Payload(_) => "PayloadError",
            Self::Spawn(_) => "SpawnError",
            Self::Pipe(_) => "PipeError",
            Self::Output(_) => "OutputError",
        }
    }

    /// Render into the verdict grammar.
    pub fn to_verdict_msg(&self) -> String {
        format!("failed: [{}] {}", self.kind(), self)
    }
}
