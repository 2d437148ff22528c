use crate::model::{SimulationJob, UiMode};
use crate::runlog::RunLog;
use crate::{config, console, naming, pipeline};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use time::macros::format_description;
use time::OffsetDateTime;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "radmc-run",
    version,
    about = "Run a RADMC-3D simulation pipeline with live progress tracking"
)]
pub struct Cli {
    /// Name for this run (used in the run directory and artifact names)
    #[arg(long)]
    pub name: String,

    /// JSON parameter file (baseline, spiral, vortex, ... configurations)
    #[arg(long, default_value = "config.json")]
    pub config: PathBuf,

    /// Solver executable to invoke
    #[arg(long, default_value = "radmc3d")]
    pub solver: String,

    /// Number of OpenMP threads passed to the solver
    #[arg(long, default_value_t = 32)]
    pub threads: u32,

    /// Compute an image after the spectrum
    #[arg(long)]
    pub images: bool,

    /// Wavelength for image computation (µm)
    #[arg(long, default_value_t = 2.2)]
    pub wavelength: f64,

    /// Output handling: advanced (live progress) or raw (native solver output)
    #[arg(long, value_enum, default_value_t = UiMode::Advanced)]
    pub ui: UiMode,

    /// Base directory for run outputs (defaults to ~/Simulations)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Working directory the solver runs in
    #[arg(long, default_value = ".")]
    pub work_dir: PathBuf,

    /// Print the key-parameter table before starting
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub show_params: bool,
}

pub async fn run(args: Cli) -> Result<()> {
    let params = config::load_parameters(&args.config)?;

    let timestamp = run_timestamp();
    let category = naming::determine_category(&params);
    let run_name = naming::generate_run_name(&args.name, &params, &timestamp);

    let base_dir = match args.output_dir.clone() {
        Some(dir) => dir,
        None => dirs::home_dir()
            .context("cannot determine home directory; pass --output-dir")?
            .join("Simulations"),
    };
    let run_dir = naming::run_directory(&base_dir, &run_name);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("cannot create run directory {}", run_dir.display()))?;

    let log = RunLog::create(&run_dir.join(format!("run_{timestamp}.log")))
        .context("cannot create run log")?;
    log.info(&format!("run {run_name} (category {category})"));

    console::print_banner(args.ui, &args.name, &category, &timestamp);
    if args.show_params {
        console::print_parameter_table(&params);
    }
    if args.images {
        for key in ["npix", "sizeau", "phi"] {
            if params.get(key).is_none() {
                console::print_warning(&format!(
                    "--images given but '{key}' is missing from {}; the image phase will fail",
                    args.config.display()
                ));
            }
        }
    }

    let job = SimulationJob {
        name: args.name.clone(),
        timestamp,
        category,
        run_dir: run_dir.clone(),
        work_dir: args.work_dir.clone(),
        solver: args.solver.clone(),
        threads: args.threads,
        wavelength: args.wavelength,
        make_images: args.images,
        ui_mode: args.ui,
    };

    let artifacts = pipeline::run_single(&job, &params, &log).await?;

    console::print_success(&format!("Run complete: {}", run_dir.display()));
    console::print_info(&format!("Spectrum: {}", artifacts.spectrum.display()));
    if let Some(image) = &artifacts.image {
        console::print_info(&format!("Image: {}", image.display()));
    }
    Ok(())
}

fn run_timestamp() -> String {
    let fmt = format_description!("[year][month][day]_[hour][minute][second]");
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .format(&fmt)
        .unwrap_or_else(|_| "00000000_000000".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_is_sortable_and_fixed_width() {
        let ts = run_timestamp();
        assert_eq!(ts.len(), 15);
        assert_eq!(ts.chars().nth(8), Some('_'));
        assert!(ts.chars().filter(|c| *c != '_').all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn defaults_match_the_documented_surface() {
        let args = Cli::parse_from(["radmc-run", "--name", "diskA"]);
        assert_eq!(args.solver, "radmc3d");
        assert_eq!(args.threads, 32);
        assert_eq!(args.ui, UiMode::Advanced);
        assert!(!args.images);
        assert!((args.wavelength - 2.2).abs() < f64::EPSILON);
    }

    #[test]
    fn ui_mode_parses_both_variants() {
        let args = Cli::parse_from(["radmc-run", "--name", "x", "--ui", "raw"]);
        assert_eq!(args.ui, UiMode::Raw);
        let args = Cli::parse_from(["radmc-run", "--name", "x", "--ui", "advanced"]);
        assert_eq!(args.ui, UiMode::Advanced);
    }
}
