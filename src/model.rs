use crate::error::PipelineError;
use clap::ValueEnum;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// One scalar or vector parameter value as produced by the config loader.
///
/// Untagged: a JSON parameter file maps naturally onto these without any
/// wrapper syntax. Integer-valued entries stay `Int` so counts like `nphot`
/// survive exactly.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    List(Vec<f64>),
    Str(String),
}

impl ParamValue {
    /// Interpret the value as a non-negative count, accepting integer,
    /// float, and scientific-notation string forms ("1e6").
    pub fn as_count(&self) -> Option<u64> {
        match self {
            ParamValue::Int(n) if *n >= 0 => Some(*n as u64),
            ParamValue::Float(f) if f.is_finite() && *f >= 0.0 => Some(*f as u64),
            ParamValue::Str(s) => {
                let t = s.trim();
                t.parse::<u64>().ok().or_else(|| match t.parse::<f64>() {
                    Ok(f) if f.is_finite() && f >= 0.0 => Some(f as u64),
                    _ => None,
                })
            }
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Int(n) => write!(f, "{n}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Str(s) => write!(f, "{s}"),
            ParamValue::List(xs) => {
                write!(f, "[")?;
                for (i, x) in xs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{x}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Immutable parameter set for one run.
///
/// Produced by the config collaborator, consumed read-only by the pipeline.
/// Accessors default missing keys to "inactive" values; the `require_*`
/// variants are for keys the configuration phase must have.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct RunParameters(BTreeMap<String, ParamValue>);

impl RunParameters {
    pub fn new(map: BTreeMap<String, ParamValue>) -> Self {
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        match self.0.get(key)? {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        match self.0.get(key)? {
            ParamValue::Int(n) => Some(*n),
            ParamValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.0.get(key)? {
            ParamValue::Bool(b) => Some(*b),
            ParamValue::Int(n) => Some(*n != 0),
            _ => None,
        }
    }

    /// Vector accessor. Scalar values coerce to a one-element vector; this is
    /// the pinned rule for feature amplitudes that the config schema allows
    /// to be either form.
    pub fn get_vec(&self, key: &str) -> Vec<f64> {
        match self.0.get(key) {
            Some(ParamValue::List(xs)) => xs.clone(),
            Some(ParamValue::Float(v)) => vec![*v],
            Some(ParamValue::Int(n)) => vec![*n as f64],
            _ => Vec::new(),
        }
    }

    pub fn require(&self, key: &str) -> Result<&ParamValue, PipelineError> {
        self.0
            .get(key)
            .ok_or_else(|| PipelineError::MissingParameter(key.to_string()))
    }

    pub fn require_f64(&self, key: &str) -> Result<f64, PipelineError> {
        self.require(key)?;
        self.get_f64(key)
            .ok_or_else(|| PipelineError::MissingParameter(key.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }
}

/// Ordered steps of the simulation pipeline. The sequence is fixed when the
/// run starts; imaging is included only when requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimPhase {
    Setup,
    ConfigureModel,
    ThermalMc,
    SedCalculation,
    GenerateImage,
    SaveFiles,
}

impl SimPhase {
    pub fn name(self) -> &'static str {
        match self {
            SimPhase::Setup => "Setup",
            SimPhase::ConfigureModel => "Configure Model",
            SimPhase::ThermalMc => "MC Thermal",
            SimPhase::SedCalculation => "SED Calculation",
            SimPhase::GenerateImage => "Generate Image",
            SimPhase::SaveFiles => "Save Files",
        }
    }

    pub fn sequence(make_images: bool) -> Vec<SimPhase> {
        let mut phases = vec![
            SimPhase::Setup,
            SimPhase::ConfigureModel,
            SimPhase::ThermalMc,
            SimPhase::SedCalculation,
        ];
        if make_images {
            phases.push(SimPhase::GenerateImage);
        }
        phases.push(SimPhase::SaveFiles);
        phases
    }
}

impl fmt::Display for SimPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Output handling mode for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UiMode {
    /// Captured, parsed, live progress display.
    Advanced,
    /// Unfiltered solver output straight to the terminal.
    Raw,
}

/// Everything the orchestrator needs to know about one run besides the
/// physical parameters. Identifiers are used for file naming only.
#[derive(Debug, Clone)]
pub struct SimulationJob {
    pub name: String,
    pub timestamp: String,
    pub category: String,
    pub run_dir: PathBuf,
    pub work_dir: PathBuf,
    pub solver: String,
    pub threads: u32,
    pub wavelength: f64,
    pub make_images: bool,
    pub ui_mode: UiMode,
}

/// Handles to the solver outputs persisted into the run directory; the
/// plotting and logbook collaborators consume these.
#[derive(Debug, Clone)]
pub struct RunArtifacts {
    pub spectrum: PathBuf,
    pub grid: Option<PathBuf>,
    pub density: Option<PathBuf>,
    pub temperature: Option<PathBuf>,
    pub image: Option<PathBuf>,
    pub inputs: Vec<PathBuf>,
}
