use std::path::PathBuf;

use log::info;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::LaunchError;
use crate::request::cli::{DirectiveArgs, ParsedCommandLine};
use crate::request::env_mode::EnvironmentMode;
use crate::settings::{Settings, EXPORT_ALL};

/// Everything needed to build the submission, after directives and command line are merged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest {
    pub cluster: String,
    pub partition: String,
    pub export: String,
    pub env_mode: EnvironmentMode,
    pub quiet: bool,
    pub dry_run: bool,
    pub job_script: PathBuf,
    pub job_script_args: Vec<String>,
    pub pass_through: Vec<String>,
}

impl ResolvedRequest {
    /// Merge script directives under the command line and apply defaults
    ///
    /// Fails if neither source names a cluster.
    pub fn resolve(
        parsed: ParsedCommandLine,
        script: DirectiveArgs,
        settings: &Settings,
    ) -> Result<ResolvedRequest, LaunchError> {
        let ParsedCommandLine { cli, pass_through } = parsed;
        let merged = script.overlay(cli.directives);

        let cluster = merged
            .cluster
            .filter(|cluster| !cluster.is_empty())
            .ok_or(LaunchError::NoCluster)?;
        let partition = merged
            .partition
            .filter(|partition| !partition.is_empty())
            .unwrap_or_else(|| settings.default_partition.clone());
        let export = normalise_export(merged.export.as_deref());
        let env_mode = EnvironmentMode::from_flags(cli.conda, cli.modules)?;

        info!("Submitting to cluster {cluster}, partition {partition}, export {export}, environment {env_mode}");
        Ok(ResolvedRequest {
            cluster,
            partition,
            export,
            env_mode,
            quiet: cli.quiet,
            dry_run: cli.dry_run,
            job_script: cli.jobscript,
            job_script_args: cli.jobscript_args,
            pass_through,
        })
    }

    /// sbatch arguments in submission order
    ///
    /// `--quiet` is an sbatch option too, so it's forwarded when set.
    pub fn submission_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("--partition={}", self.partition),
            format!("--cluster={}", self.cluster),
        ];
        if self.quiet {
            args.push("--quiet".to_string());
        }
        args.push(format!("--export={}", self.export));
        args.extend(self.pass_through.iter().cloned());
        args.push(self.job_script.to_string_lossy().into_owned());
        args.extend(self.job_script_args.iter().cloned());
        args
    }
}

/// `ALL` as a whole word anywhere in an export spec
static EXPORT_ALL_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"\b{}\b", regex::escape(EXPORT_ALL))).expect("Valid export pattern"));

/// Make sure the export spec includes the whole environment exactly once
fn normalise_export(export: Option<&str>) -> String {
    match export.filter(|spec| !spec.is_empty()) {
        None => EXPORT_ALL.to_string(),
        Some(spec) => match EXPORT_ALL_WORD.is_match(spec) {
            true => spec.to_string(),
            false => format!("{EXPORT_ALL},{spec}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use crate::request::cli::parse_command_line;

    use super::*;

    fn command_line(tokens: &[&str]) -> ParsedCommandLine {
        let args = std::iter::once("cbatch").chain(tokens.iter().copied()).map(String::from);
        parse_command_line(args).expect("valid command line")
    }

    fn resolve(tokens: &[&str], script: DirectiveArgs) -> Result<ResolvedRequest, LaunchError> {
        ResolvedRequest::resolve(command_line(tokens), script, &Settings::default())
    }

    #[test]
    fn export_gains_sentinel() {
        assert_eq!(normalise_export(None), "ALL");
        assert_eq!(normalise_export(Some("")), "ALL");
        assert_eq!(normalise_export(Some("VAR=1")), "ALL,VAR=1");
        assert_eq!(normalise_export(Some("NONE")), "ALL,NONE");
        assert_eq!(normalise_export(Some("ALLOC=1")), "ALL,ALLOC=1");
        assert_eq!(normalise_export(Some("SMALL=2")), "ALL,SMALL=2");
    }

    #[test]
    fn export_with_sentinel_is_unchanged() {
        assert_eq!(normalise_export(Some("ALL")), "ALL");
        assert_eq!(normalise_export(Some("VAR=1,ALL")), "VAR=1,ALL");
        assert_eq!(normalise_export(Some("ALL,VAR=1")), "ALL,VAR=1");
    }

    #[test]
    fn export_pattern_matches_whole_word_only() {
        assert!(EXPORT_ALL_WORD.is_match("A=1,ALL"));
        assert!(EXPORT_ALL_WORD.is_match("ALL"));
        assert!(!EXPORT_ALL_WORD.is_match("ALLOC=1"));
        assert!(!EXPORT_ALL_WORD.is_match("SMALL"));
    }

    #[test]
    fn missing_cluster_fails() {
        let err = resolve(&["job.sh"], DirectiveArgs::default()).unwrap_err();
        assert!(matches!(err, LaunchError::NoCluster));

        let err = resolve(&["--cluster=", "job.sh"], DirectiveArgs::default()).unwrap_err();
        assert!(matches!(err, LaunchError::NoCluster));
    }

    #[test]
    fn command_line_overrides_directives() {
        let script = DirectiveArgs {
            cluster: Some("wice".into()),
            partition: Some("gpu".into()),
            export: Some("A=1".into()),
        };
        let request = resolve(&["--cluster", "genius", "--partition=bigmem", "job.sh"], script).unwrap();
        assert_eq!(request.cluster, "genius");
        assert_eq!(request.partition, "bigmem");
        assert_eq!(request.export, "ALL,A=1");
    }

    #[test]
    fn directives_fill_gaps() {
        let script = DirectiveArgs { cluster: Some("wice".into()), ..DirectiveArgs::default() };
        let request = resolve(&["job.sh"], script).unwrap();
        assert_eq!(request.cluster, "wice");
        assert_eq!(request.partition, "batch");
        assert_eq!(request.export, "ALL");
        assert_eq!(request.env_mode, EnvironmentMode::None);
    }

    #[test]
    fn submission_argument_order() {
        let request = resolve(
            &["--quiet", "--cluster", "genius", "--mem=4G", "job.sh", "x", "-t", "y"],
            DirectiveArgs::default(),
        )
        .unwrap();
        assert_eq!(
            request.submission_args(),
            vec![
                "--partition=batch",
                "--cluster=genius",
                "--quiet",
                "--export=ALL",
                "--mem=4G",
                "-t",
                "job.sh",
                "x",
                "y",
            ]
        );
    }

    #[test]
    fn environment_mode_from_command_line() {
        let request = resolve(&["--cluster=c", "--modules", "mods.txt", "job.sh"], DirectiveArgs::default()).unwrap();
        assert_eq!(request.env_mode, EnvironmentMode::Modules(PathBuf::from("mods.txt")));
    }
}
