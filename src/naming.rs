//! Run categorization and naming.
//!
//! The category is derived from which optional physical-model features are
//! active in the parameter set. Predicates are evaluated in a fixed order so
//! the same parameters always produce the same label, independent of how the
//! parameter map was built.

use crate::model::RunParameters;
use std::path::{Path, PathBuf};

/// Derive the category label for a parameter set.
///
/// Zero active features yields `baseline`; a single feature yields its token;
/// multiple features yield `combined_` plus the tokens joined in evaluation
/// order. Missing parameters count as inactive, so this never fails.
pub fn determine_category(params: &RunParameters) -> String {
    let mut active: Vec<String> = Vec::new();

    // Spiral structure, optionally annotated with the arm count.
    let spiral = params.get_f64("h_spiral_amp").unwrap_or(0.0) > 0.0
        || params.get_f64("sig_spiral_amp").unwrap_or(0.0) > 0.0;
    if spiral {
        let n_arms = params.get_i64("n_arms").unwrap_or(0);
        if n_arms > 0 {
            active.push(format!("spiral_{n_arms}arms"));
        } else {
            active.push("spiral".to_string());
        }
    }

    // Vortex amplitudes may be scalar or vector valued in the config schema.
    let has_vortex = params.get_vec("h_vortex_amp").iter().any(|v| *v > 0.0)
        || params.get_vec("sig_vortex_amp").iter().any(|v| *v > 0.0);
    if has_vortex {
        active.push("vortex".to_string());
    }

    let has_fourier = ["h_fourier_aj", "h_fourier_bj", "sig_fourier_aj", "sig_fourier_bj"]
        .iter()
        .any(|key| params.get_vec(key).iter().any(|v| *v != 0.0));
    if has_fourier {
        active.push("fourier".to_string());
    }

    if params.get_bool("enable_warp").unwrap_or(false) {
        active.push("warp".to_string());
    }

    if params.get_bool("use_inner_edge_shadow").unwrap_or(false) {
        active.push("inner_edge".to_string());
    }

    if params.get_bool("use_radial_damping").unwrap_or(false) {
        active.push("damping".to_string());
    }

    match active.len() {
        0 => "baseline".to_string(),
        1 => active.remove(0),
        _ => format!("combined_{}", active.join("_")),
    }
}

/// Full run name: `{category}_run_{timestamp}_{base_name}`.
pub fn generate_run_name(base_name: &str, params: &RunParameters, timestamp: &str) -> String {
    let category = determine_category(params);
    format!("{category}_run_{timestamp}_{base_name}")
}

/// Run directory under the simulations base dir.
pub fn run_directory(base_dir: &Path, run_name: &str) -> PathBuf {
    base_dir.join(run_name)
}
