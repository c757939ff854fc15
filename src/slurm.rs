//! Read SLURM directives from job scripts and build the sbatch command line

/// Tokenise `#SBATCH` lines in a job script
pub mod directive;

/// Shell quoting for words passed to sbatch
pub mod quote;

/// Chain environment cleanup, preparation and submission into one shell command
pub mod command;
