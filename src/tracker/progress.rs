//! Live progress renderer for advanced mode.
//!
//! Two sticky lines at the bottom of the scroll region: an overall bar
//! (current phase index out of the fixed sequence) and an intra-phase bar
//! that stays on an indeterminate spinner until the expected total is known.
//! Log lines are painted above the block and scroll naturally upward.

use crossterm::cursor::{MoveToColumn, MoveUp};
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use std::io::Write;
use std::time::{Duration, Instant};

const BAR_WIDTH: usize = 24;
const SPINNER: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Minimum interval between repaints driven by `update_progress`; the solver
/// can emit photon lines far faster than a terminal repaints usefully.
const REDRAW_INTERVAL: Duration = Duration::from_millis(50);

pub struct ProgressTracker {
    phases: Vec<String>,
    phase_times: Vec<Option<Duration>>,
    current: Option<usize>,
    completed_phases: usize,
    phase_started: Option<Instant>,
    run_started: Instant,
    sub_total: Option<u64>,
    sub_position: u64,
    sub_finished: bool,
    spinner: usize,
    last_draw: Instant,
    active: bool,
    out: Box<dyn Write + Send>,
}

impl ProgressTracker {
    pub fn new(phases: Vec<String>) -> Self {
        Self::with_writer(phases, Box::new(std::io::stdout()))
    }

    pub fn with_writer(phases: Vec<String>, out: Box<dyn Write + Send>) -> Self {
        let n = phases.len();
        Self {
            phases,
            phase_times: vec![None; n],
            current: None,
            completed_phases: 0,
            phase_started: None,
            run_started: Instant::now(),
            sub_total: None,
            sub_position: 0,
            sub_finished: false,
            spinner: 0,
            last_draw: Instant::now()
                .checked_sub(REDRAW_INTERVAL)
                .unwrap_or_else(Instant::now),
            active: false,
            out,
        }
    }

    pub fn start(&mut self) {
        self.active = true;
        self.run_started = Instant::now();
        let _ = self.draw();
    }

    pub fn stop(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        // Leave the final bar state on screen and park the cursor below it.
        let _ = queue!(self.out, MoveToColumn(0));
        let _ = write!(self.out, "\n\n");
        let _ = self.out.flush();
    }

    pub fn start_phase(&mut self, name: &str) {
        self.current = self.phases.iter().position(|p| p == name);
        self.phase_started = Some(Instant::now());
        // Indeterminate until set_phase_total arrives from the runner.
        self.sub_total = None;
        self.sub_position = 0;
        self.sub_finished = false;
        self.emit_line(&format!("→ Starting: {name}"));
    }

    pub fn complete_phase(&mut self, name: &str) {
        let elapsed = self.phase_started.take().map(|t| t.elapsed());
        if let (Some(idx), Some(dur)) = (self.current, elapsed) {
            self.phase_times[idx] = Some(dur);
            self.completed_phases = idx + 1;
        }
        self.sub_finished = true;
        if let Some(total) = self.sub_total {
            self.sub_position = total;
        }
        let dur_str = elapsed
            .map(|d| format!("{}s", d.as_secs()))
            .unwrap_or_else(|| "?".to_string());
        self.emit_line(&format!("✓ Done: {name} ({dur_str})"));
    }

    /// Paint a line above the bar block. Control characters are stripped so
    /// stray escape sequences in solver output cannot corrupt the display.
    pub fn log(&mut self, message: &str) {
        let clean: String = message.chars().filter(|c| !c.is_control()).collect();
        self.emit_line(&format!("  {clean}"));
    }

    pub fn set_phase_total(&mut self, total: u64) {
        self.sub_total = Some(total);
        self.sub_position = 0;
        self.sub_finished = false;
        let _ = self.draw();
    }

    /// Latest-value-wins: repeated or out-of-order positions are fine, the
    /// bar simply shows whatever the solver last reported.
    pub fn update_progress(&mut self, position: u64) {
        self.sub_position = position;
        self.spinner = (self.spinner + 1) % SPINNER.len();
        let done = self.sub_total.is_some_and(|t| position >= t);
        if done || self.last_draw.elapsed() >= REDRAW_INTERVAL {
            let _ = self.draw();
        }
    }

    /// Summary table of phase durations; call after `stop`. Phases that never
    /// started (the conditional image phase) show as skipped.
    pub fn print_summary(&mut self) {
        let _ = writeln!(self.out, "\nSummary:");
        for (i, phase) in self.phases.iter().enumerate() {
            match self.phase_times[i] {
                Some(d) => {
                    let _ = writeln!(self.out, "  {phase:<18} {:.1}s", d.as_secs_f64());
                }
                None => {
                    let _ = writeln!(self.out, "  {phase:<18} skipped");
                }
            }
        }
        let _ = self.out.flush();
    }

    pub fn position(&self) -> u64 {
        self.sub_position
    }

    pub fn phase_total(&self) -> Option<u64> {
        self.sub_total
    }

    fn emit_line(&mut self, line: &str) {
        if self.active {
            let _ = queue!(self.out, MoveToColumn(0), Clear(ClearType::FromCursorDown));
            let _ = writeln!(self.out, "{line}");
            let _ = self.draw();
        } else {
            let _ = writeln!(self.out, "{line}");
            let _ = self.out.flush();
        }
    }

    fn draw(&mut self) -> std::io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.last_draw = Instant::now();
        let overall = self.overall_line();
        let phase = self.phase_line();
        queue!(self.out, MoveToColumn(0), Clear(ClearType::FromCursorDown))?;
        write!(self.out, "{overall}\r\n{phase}")?;
        // Park at the top of the bar block so the next paint overwrites it.
        queue!(self.out, MoveToColumn(0), MoveUp(1))?;
        self.out.flush()
    }

    fn overall_line(&self) -> String {
        let total = self.phases.len();
        let elapsed = Duration::from_secs(self.run_started.elapsed().as_secs());
        format!(
            "  Total  [{}] {}/{}  {}",
            bar(self.completed_phases as u64, total as u64),
            self.completed_phases,
            total,
            humantime::format_duration(elapsed),
        )
    }

    fn phase_line(&self) -> String {
        let name = match self.current {
            Some(idx) => self.phases[idx].as_str(),
            None => return "  Waiting...".to_string(),
        };
        let spin = if self.sub_finished {
            '✓'
        } else {
            SPINNER[self.spinner]
        };
        match self.sub_total {
            Some(total) if total > 0 => {
                let pos = self.sub_position.min(total);
                let pct = pos * 100 / total;
                format!(
                    "{spin} {name}  [{}] {pct:>3}%  {pos}/{total}",
                    bar(pos, total)
                )
            }
            _ => format!("{spin} {name}  {}", self.sub_position),
        }
    }
}

fn bar(position: u64, total: u64) -> String {
    let filled = if total == 0 {
        0
    } else {
        (position.min(total) as usize * BAR_WIDTH) / total as usize
    };
    let mut s = String::with_capacity(BAR_WIDTH);
    for i in 0..BAR_WIDTH {
        s.push(if i < filled { '█' } else { '░' });
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::test_support::SharedBuf;

    fn tracker_with_buf(phases: &[&str]) -> (ProgressTracker, SharedBuf) {
        let buf = SharedBuf::default();
        let t = ProgressTracker::with_writer(
            phases.iter().map(|s| s.to_string()).collect(),
            Box::new(buf.clone()),
        );
        (t, buf)
    }

    #[test]
    fn phase_lifecycle_renders_markers_and_timing() {
        let (mut t, buf) = tracker_with_buf(&["Setup", "MC Thermal"]);
        t.start();
        t.start_phase("Setup");
        t.complete_phase("Setup");
        t.stop();
        let out = buf.contents();
        assert!(out.contains("→ Starting: Setup"));
        assert!(out.contains("✓ Done: Setup"));
    }

    #[test]
    fn update_progress_takes_latest_value_even_out_of_order() {
        let (mut t, _buf) = tracker_with_buf(&["MC Thermal"]);
        t.start();
        t.start_phase("MC Thermal");
        t.set_phase_total(1000);
        t.update_progress(400);
        t.update_progress(900);
        t.update_progress(250);
        assert_eq!(t.position(), 250);
        assert_eq!(t.phase_total(), Some(1000));
    }

    #[test]
    fn indeterminate_until_total_is_set() {
        let (mut t, _buf) = tracker_with_buf(&["MC Thermal"]);
        t.start();
        t.start_phase("MC Thermal");
        assert_eq!(t.phase_total(), None);
        t.set_phase_total(500);
        assert_eq!(t.phase_total(), Some(500));
        // A new phase resets to indeterminate.
        t.complete_phase("MC Thermal");
        t.start_phase("MC Thermal");
        assert_eq!(t.phase_total(), None);
    }

    #[test]
    fn log_strips_control_characters() {
        let (mut t, buf) = tracker_with_buf(&["Setup"]);
        t.start();
        t.log("bad\u{1b}[2Jline");
        t.stop();
        assert!(buf.contents().contains("bad[2Jline"));
    }

    #[test]
    fn summary_marks_unstarted_phases_skipped() {
        let (mut t, buf) = tracker_with_buf(&["Setup", "Generate Image", "Save Files"]);
        t.start();
        t.start_phase("Setup");
        t.complete_phase("Setup");
        t.start_phase("Save Files");
        t.complete_phase("Save Files");
        t.stop();
        t.print_summary();
        let out = buf.contents();
        let summary = out.split("Summary:").nth(1).unwrap();
        assert!(summary.contains("Generate Image"));
        assert!(summary.contains("skipped"));
        assert!(summary.contains("Setup"));
        assert!(!summary.lines().any(|l| l.contains("Setup") && l.contains("skipped")));
    }

    #[test]
    fn stop_is_idempotent() {
        let (mut t, _buf) = tracker_with_buf(&["Setup"]);
        t.start();
        t.stop();
        t.stop();
    }
}
