//! Phase orchestration for a single simulation run.
//!
//! Phases execute strictly one at a time in a sequence fixed before the
//! first phase starts. Whatever happens inside a phase, the tracker is
//! stopped exactly once and the error reaches the caller unchanged; retry
//! policy belongs to the solver, not here.

mod artifacts;
mod configure;

use crate::error::PipelineError;
use crate::logbook;
use crate::model::{RunArtifacts, RunParameters, SimPhase, SimulationJob, UiMode};
use crate::runlog::RunLog;
use crate::runner;
use crate::suppress::SuppressedOutput;
use crate::tracker::Tracker;
use anyhow::Result;
use std::time::Instant;

/// Run the full phase sequence for one simulation.
pub async fn run_single(
    job: &SimulationJob,
    params: &RunParameters,
    log: &RunLog,
) -> Result<RunArtifacts> {
    let names = SimPhase::sequence(job.make_images)
        .iter()
        .map(|p| p.name().to_string())
        .collect();
    let mut tracker = match job.ui_mode {
        UiMode::Advanced => Tracker::progress(names),
        UiMode::Raw => Tracker::passthrough(),
    };
    run_with_tracker(job, params, log, &mut tracker).await
}

pub(crate) async fn run_with_tracker(
    job: &SimulationJob,
    params: &RunParameters,
    log: &RunLog,
    tracker: &mut Tracker,
) -> Result<RunArtifacts> {
    tracker.start();
    let run_started = Instant::now();

    let result = execute_phases(job, params, log, tracker).await;

    if let Err(e) = &result {
        tracker.log(&format!("Simulation failed: {e:#}"));
    }
    // Stopped exactly once, on success and on failure.
    tracker.stop();

    match result {
        Ok(artifacts) => {
            let runtime_minutes = run_started.elapsed().as_secs_f64() / 60.0;
            if let Err(e) = logbook::record_run(job, params, runtime_minutes, "SUCCESS") {
                log.info(&format!("logbook update failed (ignored): {e:#}"));
            }
            tracker.print_summary();
            Ok(artifacts)
        }
        Err(e) => {
            log.error(&format!("simulation failed: {e:#}"));
            Err(e)
        }
    }
}

async fn execute_phases(
    job: &SimulationJob,
    params: &RunParameters,
    log: &RunLog,
    tracker: &mut Tracker,
) -> Result<RunArtifacts> {
    // In advanced mode, in-process setup routines get their console writes
    // silenced so they cannot interleave with the live progress display.
    // Subprocess output is never suppressed; the runner owns that stream.
    let silence = job.ui_mode == UiMode::Advanced;

    let phase = SimPhase::Setup;
    tracker.start_phase(phase.name());
    let started = log.phase_start(phase.name());
    log.info("starting solver pipeline");
    with_silenced(silence, || configure::write_default_parfile(&job.work_dir))?;
    log.phase_end(phase.name(), started);
    tracker.complete_phase(phase.name());

    let phase = SimPhase::ConfigureModel;
    tracker.start_phase(phase.name());
    let started = log.phase_start(phase.name());
    tracker.log("Writing input files...");
    log.info("writing solver input files and grid setup");
    with_silenced(silence, || configure::write_model_inputs(params, &job.work_dir))?;
    log.phase_end(phase.name(), started);
    tracker.complete_phase(phase.name());

    let phase = SimPhase::ThermalMc;
    tracker.start_phase(phase.name());
    let started = log.phase_start(phase.name());
    let command = format!("{} mctherm setthreads {} sloppy", job.solver, job.threads);
    runner::run_solver_command(&command, tracker, params.get("nphot"), log, &job.work_dir).await?;
    log.phase_end(phase.name(), started);
    tracker.complete_phase(phase.name());

    let phase = SimPhase::SedCalculation;
    tracker.start_phase(phase.name());
    let started = log.phase_start(phase.name());
    let incl = params.require_f64("incl")?;
    let command = format!(
        "{} sed incl {incl} setthreads {} sloppy",
        job.solver, job.threads
    );
    runner::run_solver_command(
        &command,
        tracker,
        params.get("nphot_spec"),
        log,
        &job.work_dir,
    )
    .await?;
    log.phase_end(phase.name(), started);
    tracker.complete_phase(phase.name());

    let mut image = None;
    if job.make_images {
        let phase = SimPhase::GenerateImage;
        tracker.start_phase(phase.name());
        let started = log.phase_start(phase.name());
        tracker.log(&format!("Computing image at {} µm...", job.wavelength));
        log.info(&format!(
            "computing image at wavelength {} µm",
            job.wavelength
        ));

        let npix = params.require("npix")?;
        let sizeau = params.require("sizeau")?;
        let phi = params.require("phi")?;
        let mut command = format!(
            "{} image npix {npix} incl {incl} sizeau {sizeau} lambda {} phi {phi} setthreads {}",
            job.solver, job.wavelength, job.threads
        );
        if params.get_bool("nostar").unwrap_or(false) {
            command.push_str(" nostar");
        }
        runner::run_solver_command(&command, tracker, None, log, &job.work_dir).await?;

        image = Some(artifacts::move_image_output(
            &job.work_dir,
            &job.run_dir,
            &job.name,
            &job.timestamp,
            log,
        )?);
        log.phase_end(phase.name(), started);
        tracker.complete_phase(phase.name());
    }

    let phase = SimPhase::SaveFiles;
    tracker.start_phase(phase.name());
    let started = log.phase_start(phase.name());
    log.info("reading output files and saving to run directory");
    let mut artifacts = artifacts::persist_outputs(&job.work_dir, &job.run_dir, &job.timestamp, log)?;
    artifacts.image = image;
    log.phase_end(phase.name(), started);
    tracker.complete_phase(phase.name());

    Ok(artifacts)
}

fn with_silenced<T>(
    enabled: bool,
    f: impl FnOnce() -> Result<T, PipelineError>,
) -> Result<T, PipelineError> {
    let _guard = if enabled {
        Some(SuppressedOutput::engage()?)
    } else {
        None
    };
    f()
}
