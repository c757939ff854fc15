use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal conditions raised by cbatch itself
///
/// Failures of the commands cbatch runs (module purge, environment activation, sbatch) are not
/// represented here: they only surface as the child's exit status.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("no cluster specified")]
    NoCluster,
    #[error("--conda and --modules can't be used together")]
    ConflictingEnvironment,
    #[error("can't read job script {}: {source}", path.display())]
    ScriptRead { path: PathBuf, source: io::Error },
    #[error("can't parse directive in {}: {line}", path.display())]
    Directive { path: PathBuf, line: String },
    #[error("invalid directive in {}: {reason}", path.display())]
    DirectiveFlag { path: PathBuf, reason: String },
    #[error("argument can't be passed through a shell: {0:?}")]
    Quote(String),
    #[error("{0}")]
    Spawn(#[source] io::Error),
    #[error("failed waiting for submission: {0}")]
    Wait(#[source] io::Error),
}

impl LaunchError {
    /// Process exit code for this error, using the OS error number where one exists
    pub fn exit_code(&self) -> i32 {
        match self {
            LaunchError::Spawn(err) | LaunchError::ScriptRead { source: err, .. } => {
                err.raw_os_error().filter(|code| *code != 0).unwrap_or(1)
            }
            _ => 1,
        }
    }
}
