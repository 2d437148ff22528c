//! Per-run structured log file.
//!
//! One `RunLog` is created per run and threaded explicitly through the
//! pipeline and the command runner; there is no global logger. Entries are
//! plain timestamped lines so the file reads well next to the solver's own
//! artifacts. Write failures are swallowed — the log must never take down a
//! simulation.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use time::macros::format_description;
use time::OffsetDateTime;

const RULE: &str = "======================================================================";
const SUBRULE: &str = "----------------------------------------------------------------------";

pub struct RunLog {
    file: Mutex<File>,
}

impl RunLog {
    pub fn create(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    pub fn info(&self, message: &str) {
        self.line(&format!("{} INFO  {message}", now_stamp()));
    }

    pub fn error(&self, message: &str) {
        self.line(&format!("{} ERROR {message}", now_stamp()));
    }

    /// Open a phase block; returns the start instant for `phase_end`.
    pub fn phase_start(&self, name: &str) -> Instant {
        self.line(RULE);
        self.line(&format!("[PHASE_START] {name}"));
        self.line(&format!("[TIMESTAMP] {}", now_stamp()));
        self.line(RULE);
        Instant::now()
    }

    pub fn phase_end(&self, name: &str, started: Instant) {
        let elapsed = started.elapsed();
        self.line(SUBRULE);
        self.line(&format!("[PHASE_END] {name}"));
        self.line(&format!("[TIMESTAMP] {}", now_stamp()));
        self.line(&format!("[DURATION] {}", format_elapsed(elapsed)));
        self.line(SUBRULE);
        self.line("");
    }

    pub fn command(&self, command: &str, cwd: &Path) {
        self.line(&format!("[CMD] {command}"));
        self.line(&format!("[CWD] {}", cwd.display()));
    }

    pub fn command_result(&self, code: i32, elapsed: Duration) {
        self.line(&format!("[RETURN_CODE] {code}"));
        self.line(&format!("[CMD_DURATION] {}", format_elapsed(elapsed)));
    }

    fn line(&self, text: &str) {
        if let Ok(mut f) = self.file.lock() {
            let _ = writeln!(f, "{text}");
        }
    }
}

fn now_stamp() -> String {
    let fmt = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .format(&fmt)
        .unwrap_or_else(|_| "unknown-time".to_string())
}

/// Whole-second granularity is plenty for phases that run minutes to hours.
pub fn format_elapsed(d: Duration) -> String {
    humantime::format_duration(Duration::from_secs(d.as_secs())).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_blocks_and_commands_are_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        let log = RunLog::create(&path).unwrap();

        let t = log.phase_start("MC Thermal");
        log.command("radmc3d mctherm setthreads 8 sloppy", dir.path());
        log.command_result(0, Duration::from_secs(3));
        log.phase_end("MC Thermal", t);
        log.error("boom");

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("[PHASE_START] MC Thermal"));
        assert!(text.contains("[CMD] radmc3d mctherm setthreads 8 sloppy"));
        assert!(text.contains("[RETURN_CODE] 0"));
        assert!(text.contains("[PHASE_END] MC Thermal"));
        assert!(text.contains("ERROR boom"));
    }

    #[test]
    fn elapsed_formatting_is_seconds_granular() {
        assert_eq!(format_elapsed(Duration::from_millis(2350)), "2s");
        assert_eq!(format_elapsed(Duration::from_secs(125)), "2m 5s");
    }
}
