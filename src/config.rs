//! Parameter-file loading.
//!
//! The run's physical parameters come from a JSON file maintained alongside
//! the reference configurations (baseline, spiral, vortex, ...). Keys are
//! not validated here — the configure phase owns which keys are required.

use crate::model::RunParameters;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub fn load_parameters(path: &Path) -> Result<RunParameters> {
    let file = File::open(path)
        .with_context(|| format!("cannot open parameter file {}", path.display()))?;
    let params: RunParameters = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("malformed parameter file {}", path.display()))?;
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_mixed_value_types() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            r#"{{"nphot": 1000000, "hrdisk": 0.1, "enable_warp": true,
                "h_fourier_aj": [0.0, 0.1], "dustkappa": "silicate"}}"#
        )
        .unwrap();

        let params = load_parameters(f.path()).unwrap();
        assert_eq!(params.get_i64("nphot"), Some(1_000_000));
        assert_eq!(params.get_vec("h_fourier_aj"), vec![0.0, 0.1]);
    }

    #[test]
    fn malformed_file_reports_its_path() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "not json").unwrap();
        let err = load_parameters(f.path()).unwrap_err();
        assert!(err.to_string().contains("malformed"));
    }

    #[test]
    fn missing_file_reports_its_path() {
        let err = load_parameters(Path::new("/nonexistent/params.json")).unwrap_err();
        assert!(err.to_string().contains("params.json"));
    }
}
