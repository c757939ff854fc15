//! Run a synthesized command and forward its output

use std::process::{ExitStatus, Stdio};

use log::{info, warn};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;

use crate::error::LaunchError;
use crate::settings::Settings;
use crate::slurm::command::SynthesizedCommand;

/// Exit status after an interrupt (128 + SIGINT)
///
/// The interrupted child is killed and reaped first, its own status is not reported. cbatch
/// always exits with this code after ctrl-C instead of leaving the exit code to the child.
pub const INTERRUPTED: i32 = 130;

/// Print the command instead of running it
pub fn dry_run(command: &SynthesizedCommand) -> i32 {
    println!("Dry run:\n{command}");
    0
}

/// Run the command with the configured shell and return the exit code cbatch should use
///
/// stdout and stderr of the child are drained concurrently, line by line, into cbatch's own
/// stdout and stderr. Both drains finish before this returns, or are cancelled after an
/// interrupt (see [`INTERRUPTED`]).
pub async fn execute(command: &SynthesizedCommand, settings: &Settings) -> Result<i32, LaunchError> {
    info!("Running submission with {}", settings.shell);
    let mut child = Command::new(&settings.shell)
        .arg("-c")
        .arg(command.to_string())
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(LaunchError::Spawn)?;

    let stdout = child.stdout.take().map(|out| drain(out, tokio::io::stdout()));
    let stderr = child.stderr.take().map(|err| drain(err, tokio::io::stderr()));

    let outcome = tokio::select! {
        status = child.wait() => Some(status.map_err(LaunchError::Wait)?),
        _ = tokio::signal::ctrl_c() => None,
    };

    let code = match outcome {
        Some(status) => exit_code(status),
        None => {
            info!("Interrupted, stopping submission");
            if let Err(err) = child.kill().await {
                warn!("Can't stop submission process: {err}");
            }
            // grandchildren of the shell can keep the pipes open after the kill
            for handle in [&stdout, &stderr].into_iter().flatten() {
                handle.abort();
            }
            INTERRUPTED
        }
    };

    for handle in [stdout, stderr].into_iter().flatten() {
        match handle.await {
            Ok(()) => {}
            Err(err) if err.is_cancelled() => {}
            Err(err) => warn!("Output forwarding task failed: {err}"),
        }
    }

    info!("Submission finished with exit code {code}");
    Ok(code)
}

/// Copy lines from a child stream byte for byte, normalising line terminators to `\n`
///
/// Lines are not decoded, so output in any encoding is forwarded unchanged.
fn drain<R, W>(input: R, mut output: W) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(input).split(b'\n');
        loop {
            match lines.next_segment().await {
                Ok(Some(mut line)) => {
                    if line.last() == Some(&b'\r') {
                        line.pop();
                    }
                    line.push(b'\n');
                    let written = async {
                        output.write_all(&line).await?;
                        output.flush().await
                    };
                    if let Err(err) = written.await {
                        warn!("Can't forward output: {err}");
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    warn!("Can't read output: {err}");
                    break;
                }
            }
        }
    })
}

/// Shell convention: killed by signal N exits with 128 + N
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tokio::io::AsyncReadExt;

    use super::*;
    use crate::request::env_mode::EnvironmentMode;
    use crate::request::resolve::ResolvedRequest;

    fn command(settings: &Settings) -> SynthesizedCommand {
        let request = ResolvedRequest {
            cluster: "genius".to_string(),
            partition: "batch".to_string(),
            export: "ALL".to_string(),
            env_mode: EnvironmentMode::None,
            quiet: true,
            dry_run: false,
            job_script: PathBuf::from("job.sh"),
            job_script_args: Vec::new(),
            pass_through: Vec::new(),
        };
        SynthesizedCommand::build(&request, settings).unwrap()
    }

    #[tokio::test]
    async fn missing_shell_is_a_spawn_error() {
        let settings = Settings { shell: "/nonexistent/bash".to_string(), ..Settings::default() };
        let err = execute(&command(&settings), &settings).await.unwrap_err();
        assert!(matches!(err, LaunchError::Spawn(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn drain_strips_carriage_returns() {
        let (mut writer, reader) = tokio::io::duplex(64);
        let (sink, mut collected) = tokio::io::duplex(64);
        let handle = drain(reader, sink);

        writer.write_all(b"one\r\ntwo\nthree").await.unwrap();
        drop(writer);
        handle.await.unwrap();

        let mut text = String::new();
        collected.read_to_string(&mut text).await.unwrap();
        assert_eq!(text, "one\ntwo\nthree\n");
    }

    #[tokio::test]
    async fn drain_forwards_lines_that_are_not_utf8() {
        let (mut writer, reader) = tokio::io::duplex(64);
        let (sink, mut collected) = tokio::io::duplex(64);
        let handle = drain(reader, sink);

        writer.write_all(b"before\n\xff\xfe latin\r\nafter\n").await.unwrap();
        drop(writer);
        handle.await.unwrap();

        let mut bytes = Vec::new();
        collected.read_to_end(&mut bytes).await.unwrap();
        assert_eq!(bytes, b"before\n\xff\xfe latin\nafter\n");
    }

    #[cfg(unix)]
    #[test]
    fn signal_exit_codes() {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(exit_code(ExitStatus::from_raw(3 << 8)), 3);
        assert_eq!(exit_code(ExitStatus::from_raw(9)), 137);
    }
}
