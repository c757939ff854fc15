use std::fmt;
use std::path::PathBuf;

use crate::error::LaunchError;

/// How the job environment is prepared after the module purge
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum EnvironmentMode {
    #[default]
    None,
    /// Activate a named conda environment
    Conda(String),
    /// Load every module listed in a file
    Modules(PathBuf),
}

impl EnvironmentMode {
    pub fn from_flags(conda: Option<String>, modules: Option<PathBuf>) -> Result<EnvironmentMode, LaunchError> {
        match (conda, modules) {
            (None, None) => Ok(EnvironmentMode::None),
            (Some(env), None) => Ok(EnvironmentMode::Conda(env)),
            (None, Some(path)) => Ok(EnvironmentMode::Modules(path)),
            (Some(_), Some(_)) => Err(LaunchError::ConflictingEnvironment),
        }
    }
}

impl fmt::Display for EnvironmentMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EnvironmentMode::None => write!(f, "none"),
            EnvironmentMode::Conda(env) => write!(f, "conda environment {env}"),
            EnvironmentMode::Modules(path) => write!(f, "modules from {}", path.display()),
        }
    }
}
