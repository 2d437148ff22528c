//! Solver command execution with mode-dependent output handling.
//!
//! Passthrough mode hands the terminal to the subprocess and only checks the
//! exit code. Progress mode pipes stdout and stderr, forwards every line to
//! the tracker as it is produced, and extracts photon counts for the live
//! progress bar. The runner never interprets what the command means — any
//! solver whose output matches the photon pattern can be driven this way.

use crate::error::PipelineError;
use crate::model::ParamValue;
use crate::runlog::RunLog;
use crate::tracker::Tracker;
use regex::Regex;
use std::path::Path;
use std::process::Stdio;
use std::sync::OnceLock;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Matches "Photon nr: 12345" and "Photon nr. 12345", case-insensitive.
fn photon_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)photon\s+nr[:.]?\s+(\d+)").expect("valid pattern"))
}

/// Run one solver command through the bound tracker.
///
/// `expected_total` is the anticipated progress ceiling (photon count) for
/// this command; unparsable values degrade to an indeterminate display
/// instead of failing the run.
pub async fn run_solver_command(
    command: &str,
    tracker: &mut Tracker,
    expected_total: Option<&ParamValue>,
    log: &RunLog,
    cwd: &Path,
) -> Result<(), PipelineError> {
    log.command(command, cwd);
    let started = Instant::now();

    let args = shlex::split(command)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| PipelineError::InvalidCommand(command.to_string()))?;

    if !tracker.captures_output() {
        return run_inherited(command, &args, log, cwd, started).await;
    }

    if let Some(value) = expected_total {
        match value.as_count() {
            Some(total) => tracker.set_phase_total(total),
            None => {
                tracker.log(&format!("Warning: could not parse expected total '{value}'"));
                log.info(&format!("unparsable expected total: {value}"));
            }
        }
    }

    let mut child = Command::new(&args[0])
        .args(&args[1..])
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| spawn_error(e, &args[0], log))?;

    // stdout and stderr are drained together, line by line, as the solver
    // produces them; progress updates must not wait for process exit.
    let mut out_lines = BufReader::new(child.stdout.take().expect("stdout piped")).lines();
    let mut err_lines = BufReader::new(child.stderr.take().expect("stderr piped")).lines();
    let mut out_open = true;
    let mut err_open = true;
    while out_open || err_open {
        tokio::select! {
            line = out_lines.next_line(), if out_open => match line? {
                Some(l) => handle_line(&l, tracker),
                None => out_open = false,
            },
            line = err_lines.next_line(), if err_open => match line? {
                Some(l) => handle_line(&l, tracker),
                None => err_open = false,
            },
        }
    }

    let status = child.wait().await?;
    let code = status.code().unwrap_or(-1);
    log.command_result(code, started.elapsed());

    if !status.success() {
        tracker.log(&format!("Process failed with code {code}"));
        log.error(&format!("command failed with return code {code}: {command}"));
        return Err(PipelineError::SolverExit {
            command: command.to_string(),
            code,
        });
    }
    Ok(())
}

async fn run_inherited(
    command: &str,
    args: &[String],
    log: &RunLog,
    cwd: &Path,
    started: Instant,
) -> Result<(), PipelineError> {
    let status = Command::new(&args[0])
        .args(&args[1..])
        .current_dir(cwd)
        .status()
        .await
        .map_err(|e| spawn_error(e, &args[0], log))?;

    let code = status.code().unwrap_or(-1);
    log.command_result(code, started.elapsed());

    if !status.success() {
        log.error(&format!("command failed with return code {code}: {command}"));
        return Err(PipelineError::SolverExit {
            command: command.to_string(),
            code,
        });
    }
    Ok(())
}

fn handle_line(raw: &str, tracker: &mut Tracker) {
    let line = raw.trim();
    if line.is_empty() {
        return;
    }
    tracker.log(line);
    if let Some(caps) = photon_pattern().captures(line) {
        if let Ok(n) = caps[1].parse::<u64>() {
            tracker.update_progress(n);
        }
    }
}

fn spawn_error(err: std::io::Error, executable: &str, log: &RunLog) -> PipelineError {
    if err.kind() == std::io::ErrorKind::NotFound {
        log.error(&format!("command not found: {executable}"));
        PipelineError::ExecutableNotFound(executable.to_string())
    } else {
        PipelineError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::test_support::SharedBuf;
    use crate::tracker::{ProgressTracker, Tracker};

    fn progress_tracker(buf: &SharedBuf) -> Tracker {
        let mut t = Tracker::Progress(ProgressTracker::with_writer(
            vec!["MC Thermal".to_string()],
            Box::new(buf.clone()),
        ));
        t.start();
        t.start_phase("MC Thermal");
        t
    }

    fn position_of(tracker: &Tracker) -> u64 {
        match tracker {
            Tracker::Progress(p) => p.position(),
            Tracker::Passthrough(_) => unreachable!(),
        }
    }

    fn total_of(tracker: &Tracker) -> Option<u64> {
        match tracker {
            Tracker::Progress(p) => p.phase_total(),
            Tracker::Passthrough(_) => unreachable!(),
        }
    }

    fn test_log(dir: &Path) -> RunLog {
        RunLog::create(&dir.join("run.log")).unwrap()
    }

    #[test]
    fn photon_pattern_matches_colon_and_period_forms() {
        let re = photon_pattern();
        assert_eq!(&re.captures("Photon nr: 4821").unwrap()[1], "4821");
        assert_eq!(&re.captures("Photon nr. 99").unwrap()[1], "99");
        assert_eq!(&re.captures("  photon NR  7").unwrap()[1], "7");
        assert!(re.captures("Wavelength grid ready").is_none());
    }

    #[tokio::test]
    async fn progress_mode_tracks_photon_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log = test_log(dir.path());
        let buf = SharedBuf::default();
        let mut tracker = progress_tracker(&buf);

        run_solver_command(
            "sh -c 'printf \"Photon nr: 4821\\nsome other line\\n\"'",
            &mut tracker,
            Some(&ParamValue::Str("1e4".into())),
            &log,
            dir.path(),
        )
        .await
        .unwrap();

        assert_eq!(position_of(&tracker), 4821);
        assert_eq!(total_of(&tracker), Some(10_000));
        assert!(buf.contents().contains("some other line"));
    }

    #[tokio::test]
    async fn period_form_updates_progress_too() {
        let dir = tempfile::tempdir().unwrap();
        let log = test_log(dir.path());
        let buf = SharedBuf::default();
        let mut tracker = progress_tracker(&buf);

        run_solver_command(
            "sh -c 'echo \"Photon nr. 99\"'",
            &mut tracker,
            None,
            &log,
            dir.path(),
        )
        .await
        .unwrap();

        assert_eq!(position_of(&tracker), 99);
    }

    #[tokio::test]
    async fn non_matching_lines_leave_progress_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let log = test_log(dir.path());
        let buf = SharedBuf::default();
        let mut tracker = progress_tracker(&buf);

        run_solver_command(
            "sh -c 'echo \"Starting wavelength grid\"'",
            &mut tracker,
            None,
            &log,
            dir.path(),
        )
        .await
        .unwrap();

        assert_eq!(position_of(&tracker), 0);
    }

    #[tokio::test]
    async fn unparsable_total_degrades_to_indeterminate() {
        let dir = tempfile::tempdir().unwrap();
        let log = test_log(dir.path());
        let buf = SharedBuf::default();
        let mut tracker = progress_tracker(&buf);

        run_solver_command(
            "sh -c 'true'",
            &mut tracker,
            Some(&ParamValue::Str("lots-of-photons".into())),
            &log,
            dir.path(),
        )
        .await
        .unwrap();

        assert_eq!(total_of(&tracker), None);
        assert!(buf.contents().contains("Warning"));
    }

    #[tokio::test]
    async fn nonzero_exit_is_reported_with_code() {
        let dir = tempfile::tempdir().unwrap();
        let log = test_log(dir.path());
        let buf = SharedBuf::default();
        let mut tracker = progress_tracker(&buf);

        let err = run_solver_command("sh -c 'exit 3'", &mut tracker, None, &log, dir.path())
            .await
            .unwrap_err();

        match err {
            PipelineError::SolverExit { code, .. } => assert_eq!(code, 3),
            other => panic!("unexpected error: {other}"),
        }
        assert!(buf.contents().contains("failed with code 3"));
    }

    #[tokio::test]
    async fn missing_executable_fails_before_anything_runs() {
        let dir = tempfile::tempdir().unwrap();
        let log = test_log(dir.path());
        let buf = SharedBuf::default();
        let mut tracker = progress_tracker(&buf);

        let err = run_solver_command(
            "definitely-not-a-solver-binary mctherm",
            &mut tracker,
            None,
            &log,
            dir.path(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PipelineError::ExecutableNotFound(_)));
    }

    #[tokio::test]
    async fn passthrough_mode_checks_exit_code_only() {
        let dir = tempfile::tempdir().unwrap();
        let log = test_log(dir.path());
        let mut tracker = Tracker::passthrough();

        run_solver_command("sh -c 'exit 0'", &mut tracker, None, &log, dir.path())
            .await
            .unwrap();

        let err = run_solver_command("sh -c 'exit 1'", &mut tracker, None, &log, dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::SolverExit { code: 1, .. }));
    }

    #[tokio::test]
    async fn quoted_arguments_survive_splitting() {
        let dir = tempfile::tempdir().unwrap();
        let log = test_log(dir.path());
        let buf = SharedBuf::default();
        let mut tracker = progress_tracker(&buf);

        run_solver_command(
            "echo 'a path with spaces'",
            &mut tracker,
            None,
            &log,
            dir.path(),
        )
        .await
        .unwrap();

        assert!(buf.contents().contains("a path with spaces"));
    }
}
