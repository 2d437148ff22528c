//! Solver input-file generation.
//!
//! The configure phase dereferences every key listed in `REQUIRED_KEYS`; a
//! missing one is a fatal lookup failure, not something to default. Feature
//! parameters beyond that set are written through verbatim so the solver
//! model sees whatever the config file declared.

use crate::error::PipelineError;
use crate::model::RunParameters;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

pub const MODEL_NAME: &str = "ppdisk_complete";

/// Grid, star, disk, and photon-budget keys the model setup cannot run
/// without.
const REQUIRED_KEYS: &[&str] = &[
    "xbound", "nx", "ybound", "ny", "zbound", "nz", "wbound", "nw", "rstar", "mstar", "tstar",
    "mdisk", "sig0", "rin", "rdisk", "hrdisk", "hrpivot", "plsig1", "plh", "nphot", "nphot_scat",
    "nphot_spec", "scattering_mode_max", "modified_random_walk", "mc_scat_maxtauabs", "incl",
];

/// Write the default parameter template for the disk model. The configure
/// phase replaces it with the run's actual values; keeping this step separate
/// mirrors how the solver tooling bootstraps a fresh working directory.
pub fn write_default_parfile(work_dir: &Path) -> Result<(), PipelineError> {
    let mut f = File::create(work_dir.join("problem_params.inp"))?;
    writeln!(f, "# Default parameter file")?;
    writeln!(f, "# -----------------------------------------------------")?;
    writeln!(f, "model                     = \"{MODEL_NAME}\"")?;
    Ok(())
}

/// Write `problem_params.inp` and `radmc3d.inp` from the run's parameters.
pub fn write_model_inputs(params: &RunParameters, work_dir: &Path) -> Result<(), PipelineError> {
    for key in REQUIRED_KEYS {
        params.require(key)?;
    }

    let mut parfile = File::create(work_dir.join("problem_params.inp"))?;
    writeln!(parfile, "# Model parameters")?;
    writeln!(parfile, "# -----------------------------------------------------")?;
    writeln!(parfile, "model                     = \"{MODEL_NAME}\"")?;
    for (key, value) in params.iter() {
        writeln!(parfile, "{key:<26}= {value}")?;
    }

    let mut control = File::create(work_dir.join("radmc3d.inp"))?;
    for key in [
        "nphot",
        "nphot_scat",
        "nphot_spec",
        "scattering_mode_max",
        "modified_random_walk",
    ] {
        // Presence was checked above.
        if let Some(value) = params.get(key) {
            writeln!(control, "{key:<26}= {value}")?;
        }
    }
    drop(control);

    // The optical-depth limit is appended after the main control block, as a
    // separate write, so it stays last in the file.
    let mut control = OpenOptions::new()
        .append(true)
        .open(work_dir.join("radmc3d.inp"))?;
    let maxtau = params.require("mc_scat_maxtauabs")?;
    writeln!(control, "mc_scat_maxtauabs         = {maxtau}")?;
    Ok(())
}
