use thiserror::Error;

/// Failure taxonomy for the simulation pipeline.
///
/// Typed so callers can distinguish a missing solver binary from a solver
/// that ran and failed; everything above the runner wraps these in `anyhow`.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The solver executable could not be resolved; nothing was started.
    #[error("command not found: {0}")]
    ExecutableNotFound(String),

    /// The solver ran and returned a nonzero status.
    #[error("command failed with exit code {code}: {command}")]
    SolverExit { command: String, code: i32 },

    /// A parameter the configuration phase dereferences is absent.
    #[error("missing required parameter '{0}'")]
    MissingParameter(String),

    /// The command string could not be split into arguments.
    #[error("malformed command string: {0}")]
    InvalidCommand(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
