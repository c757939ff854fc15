use std::env;

use log::debug;

/// Marker that starts a directive line inside a job script
pub static DIRECTIVE_MARKER: &str = "#SBATCH";

/// `--export` token meaning "export the whole submitting environment"
pub static EXPORT_ALL: &str = "ALL";

static DEFAULT_PARTITION: &str = "batch";
static SUBMIT_COMMAND: &str = "sbatch";
static ENV_MANAGER: &str = "conda";
static SHELL: &str = "/bin/bash";
static SHELL_RC: &str = "~/.bashrc";

/// Site defaults, overridable through `CBATCH_*` environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub default_partition: String,
    pub submit_command: String,
    pub env_manager: String,
    pub shell: String,
    pub shell_rc: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            default_partition: DEFAULT_PARTITION.to_string(),
            submit_command: SUBMIT_COMMAND.to_string(),
            env_manager: ENV_MANAGER.to_string(),
            shell: SHELL.to_string(),
            shell_rc: SHELL_RC.to_string(),
        }
    }
}

impl Settings {
    /// Read overrides from the process environment
    pub fn from_env() -> Settings {
        Settings::from_lookup(|key| env::var(key).ok())
    }

    /// Empty values are treated as unset
    fn from_lookup<F>(lookup: F) -> Settings
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |key: &str, default: String| -> String {
            match lookup(key).filter(|value| !value.is_empty()) {
                Some(value) => {
                    debug!("{key} overrides default {default:?} with {value:?}");
                    value
                }
                None => default,
            }
        };

        let defaults = Settings::default();
        Settings {
            default_partition: pick("CBATCH_DEFAULT_PARTITION", defaults.default_partition),
            submit_command: pick("CBATCH_SUBMIT_COMMAND", defaults.submit_command),
            env_manager: pick("CBATCH_ENV_MANAGER", defaults.env_manager),
            shell: pick("CBATCH_SHELL", defaults.shell),
            shell_rc: pick("CBATCH_SHELL_RC", defaults.shell_rc),
        }
    }
}
