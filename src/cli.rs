//! Command-line surface: `program <config-path> <constants-path>` (spec
//! §6). Exits 0 on a clean run, non-zero with a logged diagnostic on any
//! fatal [`crate::error::CoreError`] or IO/parse failure.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about = "Lagrangian superdroplet microphysics core", long_about = None)]
pub struct Cli {
    /// Path to the run configuration (TOML).
    pub config_path: String,
    /// Path to the physical constants file (TOML).
    pub constants_path: String,
}
