//! Dual-mode output tracking.
//!
//! Exactly one tracker is bound per run. The pipeline and command runner talk
//! to the same eight-operation surface regardless of variant; dispatching
//! through an enum keeps variant handling exhaustive at compile time. Tracker
//! operations never fail — rendering errors are swallowed so a broken pipe on
//! the display can never abort a simulation that is hours into a phase.

mod progress;

pub use progress::ProgressTracker;

use std::io::Write;

/// Session object mediating between phase orchestration and the terminal.
pub enum Tracker {
    Passthrough(PassthroughTracker),
    Progress(ProgressTracker),
}

impl Tracker {
    pub fn passthrough() -> Self {
        Tracker::Passthrough(PassthroughTracker::new())
    }

    pub fn progress(phases: Vec<String>) -> Self {
        Tracker::Progress(ProgressTracker::new(phases))
    }

    /// Progress mode captures and parses solver output; passthrough mode
    /// lets the subprocess inherit the terminal.
    pub fn captures_output(&self) -> bool {
        matches!(self, Tracker::Progress(_))
    }

    pub fn start(&mut self) {
        match self {
            Tracker::Passthrough(t) => t.start(),
            Tracker::Progress(t) => t.start(),
        }
    }

    pub fn stop(&mut self) {
        match self {
            Tracker::Passthrough(t) => t.stop(),
            Tracker::Progress(t) => t.stop(),
        }
    }

    pub fn start_phase(&mut self, name: &str) {
        match self {
            Tracker::Passthrough(t) => t.start_phase(name),
            Tracker::Progress(t) => t.start_phase(name),
        }
    }

    pub fn complete_phase(&mut self, name: &str) {
        match self {
            Tracker::Passthrough(t) => t.complete_phase(name),
            Tracker::Progress(t) => t.complete_phase(name),
        }
    }

    pub fn log(&mut self, message: &str) {
        match self {
            Tracker::Passthrough(_) => {}
            Tracker::Progress(t) => t.log(message),
        }
    }

    pub fn set_phase_total(&mut self, total: u64) {
        match self {
            Tracker::Passthrough(_) => {}
            Tracker::Progress(t) => t.set_phase_total(total),
        }
    }

    pub fn update_progress(&mut self, position: u64) {
        match self {
            Tracker::Passthrough(_) => {}
            Tracker::Progress(t) => t.update_progress(position),
        }
    }

    pub fn print_summary(&mut self) {
        match self {
            Tracker::Passthrough(_) => {}
            Tracker::Progress(t) => t.print_summary(),
        }
    }
}

/// Tracker for raw mode: the solver writes to the terminal directly, so this
/// must not intercept or reformat anything. Only the phase boundaries get a
/// marker line to orient the reader in the output stream.
pub struct PassthroughTracker {
    out: Box<dyn Write + Send>,
    stops: u32,
}

impl PassthroughTracker {
    pub fn new() -> Self {
        Self::with_writer(Box::new(std::io::stdout()))
    }

    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self { out, stops: 0 }
    }

    fn start(&mut self) {}

    fn stop(&mut self) {
        self.stops += 1;
    }

    fn start_phase(&mut self, name: &str) {
        let _ = writeln!(self.out, "\n>>> Starting Phase: {name}");
        let _ = self.out.flush();
    }

    fn complete_phase(&mut self, name: &str) {
        let _ = writeln!(self.out, ">>> Completed Phase: {name}\n");
        let _ = self.out.flush();
    }

    pub fn stop_count(&self) -> u32 {
        self.stops
    }
}

impl Default for PassthroughTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    /// Writer that tests can inspect after handing it to a tracker.
    #[derive(Clone, Default)]
    pub struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
