//! Command implementations.

mod info;
mod run;
mod validate;

use std::path::Path;

use anyhow::Result;
use contracts::MuxBlueprint;

use crate::error::CliError;

pub use info::run_info;
pub use run::run_pipeline;
pub use validate::run_validate;

/// Load and validate a blueprint, reporting a missing file distinctly
fn load_blueprint(path: &Path) -> Result<MuxBlueprint> {
    if !path.exists() {
        return Err(CliError::config_not_found(path).into());
    }
    config_loader::ConfigLoader::load_from_path(path)
        .map_err(|e| CliError::config_validation(e.to_string()).into())
}
