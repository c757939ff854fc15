use std::ffi::OsString;
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{ArgGroup, Args, CommandFactory, Parser};
use log::debug;

use crate::request::tokens::FlagTable;

/// Flags that may also be set by `#SBATCH` directives in the job script
#[derive(Args, Debug, Default, Clone, PartialEq, Eq)]
pub struct DirectiveArgs {
    /// Cluster name to submit the job to
    #[arg(long)]
    pub cluster: Option<String>,
    /// Partition to submit the job to
    #[arg(long)]
    pub partition: Option<String>,
    /// Environment variables to export to the job
    #[arg(long)]
    pub export: Option<String>,
}

impl DirectiveArgs {
    /// Combine with a higher-priority set of values: anything set in `over` wins
    pub fn overlay(self, over: DirectiveArgs) -> DirectiveArgs {
        DirectiveArgs {
            cluster: over.cluster.or(self.cluster),
            partition: over.partition.or(self.partition),
            export: over.export.or(self.export),
        }
    }
}

/// Submit a job in a clean environment.
///
/// Options cbatch doesn't recognise are passed on to sbatch unchanged.
#[derive(Parser, Debug)]
#[command(name = "cbatch", version, about, long_about = None, args_override_self = true)]
#[command(group(ArgGroup::new("environment").args(["conda", "modules"])))]
pub struct Cli {
    #[command(flatten)]
    pub directives: DirectiveArgs,
    /// Conda environment to activate before running the job
    #[arg(long)]
    pub conda: Option<String>,
    /// File that lists the modules to load before running the job
    #[arg(long, value_name = "FILE")]
    pub modules: Option<PathBuf>,
    /// Print the sbatch command without executing it
    #[arg(long)]
    pub dry_run: bool,
    /// Do not provide progress information
    #[arg(long)]
    pub quiet: bool,
    /// Job script to submit to SLURM
    #[arg(value_name = "JOB_SCRIPT")]
    pub jobscript: PathBuf,
    /// Arguments for the job script
    #[arg(value_name = "JOB_SCRIPT_ARGS")]
    pub jobscript_args: Vec<String>,
}

/// Parser for directive tokens, knows nothing but the directive flags
#[derive(Parser, Debug)]
#[command(
    no_binary_name = true,
    disable_help_flag = true,
    disable_version_flag = true,
    args_override_self = true
)]
struct ScriptDirectives {
    #[command(flatten)]
    directives: DirectiveArgs,
}

/// Command line after the permissive pass
#[derive(Debug)]
pub struct ParsedCommandLine {
    pub cli: Cli,
    /// Tokens for sbatch, in command-line order
    pub pass_through: Vec<String>,
}

/// Parse the full command line (binary name first), collecting unknown options instead of failing
///
/// Arguments that aren't valid UTF-8 are a usage error, they are never rewritten.
pub fn parse_command_line<I, T>(args: I) -> Result<ParsedCommandLine, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let args = args
        .into_iter()
        .map(|arg| {
            arg.into().into_string().map_err(|raw| {
                Cli::command().error(
                    ErrorKind::InvalidUtf8,
                    format!("argument is not valid UTF-8: {}", raw.to_string_lossy()),
                )
            })
        })
        .collect::<Result<Vec<String>, clap::Error>>()?;
    let mut args = args.into_iter();
    let bin_name = args.next().unwrap_or_else(|| "cbatch".to_string());

    let split = FlagTable::from_command(Cli::command()).split(args);
    debug!("Command line passes {:?} through to sbatch", split.unknown);
    let cli = Cli::try_parse_from(split.clap_args(&bin_name))?;

    Ok(ParsedCommandLine { cli, pass_through: split.unknown })
}

/// Parse directive tokens, ignoring everything but cluster, partition and export
pub fn parse_directives(tokens: Vec<String>) -> Result<DirectiveArgs, clap::Error> {
    let split = FlagTable::from_command(ScriptDirectives::command()).split(tokens);
    debug!("Directives ignored by cbatch: {:?}", split.unknown);
    let parsed = ScriptDirectives::try_parse_from(split.known)?;
    Ok(parsed.directives)
}
