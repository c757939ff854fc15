use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, info};

use crate::error::LaunchError;
use crate::settings::DIRECTIVE_MARKER;

/// Collect the shell-split tokens of every `#SBATCH` line in a job script, in file order
///
/// SLURM reads these [directives](https://slurm.schedmd.com/sbatch.html#SECTION_DESCRIPTION)
/// itself, cbatch only needs them to find out which cluster and partition the job is meant for.
pub fn extract_tokens(script: &Path) -> Result<Vec<String>, LaunchError> {
    info!("Reading directives from {}", script.display());
    let read_error = |source| LaunchError::ScriptRead { path: script.to_path_buf(), source };

    let file = File::open(script).map_err(read_error)?;
    let mut tokens: Vec<String> = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(read_error)?;
        if let Some(directive) = parse_line(&line) {
            let words = directive.map_err(|_| LaunchError::Directive {
                path: script.to_path_buf(),
                line: line.trim().to_string(),
            })?;
            debug!("Directive tokens: {words:?}");
            tokens.extend(words);
        }
    }

    Ok(tokens)
}

/// `None` for ordinary lines, `Some(Err(()))` when the quoting is unbalanced
fn parse_line(line: &str) -> Option<Result<Vec<String>, ()>> {
    let rest = line.trim().strip_prefix(DIRECTIVE_MARKER)?;
    Some(shlex::split(rest.trim()).ok_or(()))
}
