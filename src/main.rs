use std::env;
use std::process;

use env_logger::Env;
use log::{debug, info};

use crate::error::LaunchError;
use crate::request::cli::{parse_command_line, parse_directives, ParsedCommandLine};
use crate::request::resolve::ResolvedRequest;
use crate::settings::Settings;
use crate::slurm::command::SynthesizedCommand;
use crate::slurm::directive::extract_tokens;

mod error;
mod request;
mod run;
mod settings;
mod slurm;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    info!("cbatch {} starting", env!("CARGO_PKG_VERSION"));

    let parsed = parse_command_line(env::args_os()).unwrap_or_else(|err| err.exit());
    let settings = Settings::from_env();

    let code = match launch(parsed, &settings).await {
        Ok(code) => code,
        Err(err) => {
            debug!("Launch failed: {err:?}");
            eprintln!("Error: {err}");
            err.exit_code()
        }
    };

    process::exit(code);
}

/// Resolve the request, build the command, then print or run it
async fn launch(parsed: ParsedCommandLine, settings: &Settings) -> Result<i32, LaunchError> {
    let script = parsed.cli.jobscript.clone();
    let tokens = extract_tokens(&script)?;
    let directives = parse_directives(tokens).map_err(|err| LaunchError::DirectiveFlag {
        path: script.clone(),
        reason: err.kind().as_str().unwrap_or("unusable flag").to_string(),
    })?;

    let request = ResolvedRequest::resolve(parsed, directives, settings)?;
    let command = SynthesizedCommand::build(&request, settings)?;

    match request.dry_run {
        true => Ok(run::dry_run(&command)),
        false => run::execute(&command, settings).await,
    }
}
