use std::fmt;

use log::{debug, info};

use crate::error::LaunchError;
use crate::request::env_mode::EnvironmentMode;
use crate::request::resolve::ResolvedRequest;
use crate::settings::Settings;
use crate::slurm::quote::{join, quote};

/// A complete shell command line: clean, then prepare, then submit
///
/// The three segments are chained with `&&` so the first failure stops the submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedCommand {
    clean: String,
    prepare: String,
    submit: String,
}

impl SynthesizedCommand {
    pub fn build(request: &ResolvedRequest, settings: &Settings) -> Result<SynthesizedCommand, LaunchError> {
        info!("Building submission command for cluster {}", request.cluster);
        let command = SynthesizedCommand {
            clean: clean_segment(request.quiet),
            prepare: prepare_segment(request, settings)?,
            submit: submit_segment(request, settings)?,
        };
        debug!("Synthesized command: {command}");
        Ok(command)
    }
}

impl fmt::Display for SynthesizedCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} && {} && {}", self.clean, self.prepare, self.submit)
    }
}

fn announce(quiet: bool, message: &str, command: String) -> String {
    match quiet {
        true => command,
        false => format!("(>&2 echo \"{message}\") && {command}"),
    }
}

/// Unload everything the submitting shell had loaded
fn clean_segment(quiet: bool) -> String {
    announce(quiet, "Cleaning environment...", "module purge > /dev/null 2>&1".to_string())
}

fn prepare_segment(request: &ResolvedRequest, settings: &Settings) -> Result<String, LaunchError> {
    let command = match &request.env_mode {
        EnvironmentMode::Conda(env) => {
            // activation hooks live in the user's rc file
            format!("source {} && {} activate {}", settings.shell_rc, settings.env_manager, quote(env)?)
        }
        EnvironmentMode::Modules(path) => {
            let file = quote(&path.to_string_lossy())?.into_owned();
            let base = quote(&format!("cluster/{}/{}", request.cluster, request.partition))?.into_owned();
            format!(
                "{{ [ -r {file} ] || {{ >&2 echo \"Error: modules file \"{file}\" not found\"; false; }}; }} \
                 && module --quiet load {base} && module load $(cat {file})"
            )
        }
        EnvironmentMode::None => "true".to_string(),
    };
    Ok(announce(request.quiet, "Preparing environment...", command))
}

fn submit_segment(request: &ResolvedRequest, settings: &Settings) -> Result<String, LaunchError> {
    let args = request.submission_args();
    Ok(format!("{} {}", settings.submit_command, join(&args)?))
}
