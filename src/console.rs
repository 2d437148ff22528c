//! Styled terminal output for the CLI layer: banner and status markers.

use crate::model::{RunParameters, UiMode};
use crossterm::style::Stylize;

pub fn print_banner(mode: UiMode, name: &str, category: &str, timestamp: &str) {
    let top = "╔══════════════════════════════════════════════════════════╗";
    let mid1 = "║          RADMC-3D Simulation Pipeline                    ║";
    let mid2 = "║          Protoplanetary Disk Modeling                    ║";
    let bottom = "╚══════════════════════════════════════════════════════════╝";
    println!("\n{}", top.cyan().bold());
    println!("{}", mid1.cyan().bold());
    println!("{}", mid2.cyan().bold());
    println!("{}\n", bottom.cyan().bold());

    let mode = match mode {
        UiMode::Advanced => "ADVANCED",
        UiMode::Raw => "RAW",
    };
    println!("  {}  {}", "Mode:".cyan(), mode);
    println!("  {}  {}", "Name:".cyan(), name);
    println!("  {}  {}", "Category:".cyan(), category.bold());
    println!("  {}  {}\n", "Timestamp:".cyan(), timestamp);
}

/// Short table of the parameters people actually scan before a long run.
pub fn print_parameter_table(params: &RunParameters) {
    const KEY_PARAMS: &[&str] = &[
        "mdisk",
        "hrdisk",
        "plh",
        "tstar",
        "incl",
        "h_spiral_amp",
        "sig_spiral_amp",
        "n_arms",
        "nphot",
        "nphot_spec",
    ];
    println!("  {}", "Key Parameters".bold());
    for key in KEY_PARAMS {
        if let Some(value) = params.get(key) {
            println!("    {key:<16} {value}");
        }
    }
    println!();
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message.green());
}

pub fn print_warning(message: &str) {
    println!("{} {message}", "⚠".yellow());
}

pub fn print_error(message: &str) {
    println!("{} {message}", "✗".red());
}

pub fn print_info(message: &str) {
    println!("{} {message}", "→".cyan());
}
