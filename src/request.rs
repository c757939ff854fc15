//! Work out what to submit from the command line and the job script's directives

/// clap definitions for the command line and for `#SBATCH` directives
pub mod cli;
/// Sort raw tokens into known flags, positionals and sbatch pass-through
pub mod tokens;
/// How the job environment is prepared
pub mod env_mode;
/// Merge, validate and apply defaults
pub mod resolve;
