//! Best-effort run logbook.
//!
//! One CSV row per completed run, appended next to the run directories so
//! batch campaigns can be grouped by category later. The caller swallows any
//! error from here: failing to record a run must never mask the simulation's
//! own outcome.

use crate::model::{RunParameters, SimulationJob};
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;

const HEADER: &str = "timestamp,name,category,status,runtime_minutes,nphot,nphot_spec,incl,mdisk,run_dir";

pub fn record_run(
    job: &SimulationJob,
    params: &RunParameters,
    runtime_minutes: f64,
    status: &str,
) -> Result<()> {
    let base = job.run_dir.parent().unwrap_or(&job.run_dir);
    let path = base.join("simulation_logbook.csv");
    let fresh = !path.exists();

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("cannot open logbook {}", path.display()))?;
    if fresh {
        writeln!(file, "{HEADER}")?;
    }
    writeln!(
        file,
        "{},{},{},{},{:.2},{},{},{},{},{}",
        job.timestamp,
        csv_field(&job.name),
        job.category,
        status,
        runtime_minutes,
        scalar_field(params, "nphot"),
        scalar_field(params, "nphot_spec"),
        scalar_field(params, "incl"),
        scalar_field(params, "mdisk"),
        csv_field(&job.run_dir.display().to_string()),
    )?;
    Ok(())
}

fn scalar_field(params: &RunParameters, key: &str) -> String {
    params
        .get_f64(key)
        .map(|v| v.to_string())
        .unwrap_or_default()
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UiMode;

    fn job_in(base: &std::path::Path) -> SimulationJob {
        SimulationJob {
            name: "diskA".into(),
            timestamp: "20260830_120000".into(),
            category: "warp".into(),
            run_dir: base.join("warp_run_20260830_120000_diskA"),
            work_dir: base.to_path_buf(),
            solver: "radmc3d".into(),
            threads: 8,
            wavelength: 2.2,
            make_images: false,
            ui_mode: UiMode::Raw,
        }
    }

    #[test]
    fn header_is_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let params: RunParameters =
            serde_json::from_str(r#"{"nphot": 1000000, "incl": 45.0}"#).unwrap();
        let job = job_in(dir.path());

        record_run(&job, &params, 12.5, "SUCCESS").unwrap();
        record_run(&job, &params, 3.0, "SUCCESS").unwrap();

        let text =
            std::fs::read_to_string(dir.path().join("simulation_logbook.csv")).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], HEADER);
        assert!(lines[1].contains("warp"));
        assert!(lines[1].contains("1000000"));
        assert!(lines[2].contains("3.00"));
    }
}
