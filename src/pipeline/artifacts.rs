//! Persisting solver outputs into the run directory.

use crate::error::PipelineError;
use crate::model::RunArtifacts;
use crate::runlog::RunLog;
use std::fs;
use std::path::{Path, PathBuf};

/// Copy the solver's outputs from the working directory into the run
/// directory. The spectrum is mandatory — a run that produced none failed
/// upstream — while grid and binary dumps are copied when present.
pub fn persist_outputs(
    work_dir: &Path,
    run_dir: &Path,
    timestamp: &str,
    log: &RunLog,
) -> Result<RunArtifacts, PipelineError> {
    let spectrum = copy_logged(
        &work_dir.join("spectrum.out"),
        &run_dir.join(format!("spectrum_{timestamp}.out")),
        log,
    )?;

    let mut inputs = Vec::new();
    for (src, dst) in [
        ("problem_params.inp", format!("problem_params_{timestamp}.inp")),
        ("radmc3d.inp", format!("radmc3d_{timestamp}.inp")),
    ] {
        if let Some(path) = copy_if_present(&work_dir.join(src), &run_dir.join(dst), log)? {
            inputs.push(path);
        }
    }

    let grid = copy_if_present(
        &work_dir.join("amr_grid.inp"),
        &run_dir.join("amr_grid.inp"),
        log,
    )?;
    let density = copy_if_present(
        &work_dir.join("dust_density.binp"),
        &run_dir.join("dust_density.binp"),
        log,
    )?;
    let temperature = copy_if_present(
        &work_dir.join("dust_temperature.bdat"),
        &run_dir.join("dust_temperature.bdat"),
        log,
    )?;

    Ok(RunArtifacts {
        spectrum,
        grid,
        density,
        temperature,
        image: None,
        inputs,
    })
}

/// Move the image the solver wrote into the run directory under the run's
/// name. Rendering the image into a figure is the plotting collaborator's
/// job.
pub fn move_image_output(
    work_dir: &Path,
    run_dir: &Path,
    name: &str,
    timestamp: &str,
    log: &RunLog,
) -> Result<PathBuf, PipelineError> {
    let src = work_dir.join("image.out");
    let dst = run_dir.join(format!("Img_{name}_{timestamp}.out"));
    let size_mb = fs::metadata(&src)?.len() as f64 / (1024.0 * 1024.0);
    fs::rename(&src, &dst).or_else(|_| {
        // Rename fails across filesystems; fall back to copy + remove.
        fs::copy(&src, &dst).and_then(|_| fs::remove_file(&src))
    })?;
    log.info(&format!(
        "Saved: {} ({size_mb:.2} MB) -> {}",
        src.display(),
        dst.display()
    ));
    Ok(dst)
}

fn copy_logged(src: &Path, dst: &Path, log: &RunLog) -> Result<PathBuf, PipelineError> {
    let size_mb = fs::metadata(src)?.len() as f64 / (1024.0 * 1024.0);
    fs::copy(src, dst)?;
    log.info(&format!(
        "Saved: {} ({size_mb:.2} MB) -> {}",
        src.display(),
        dst.display()
    ));
    Ok(dst.to_path_buf())
}

fn copy_if_present(
    src: &Path,
    dst: &Path,
    log: &RunLog,
) -> Result<Option<PathBuf>, PipelineError> {
    if src.exists() {
        copy_logged(src, dst, log).map(Some)
    } else {
        Ok(None)
    }
}
