use std::fs;
use std::path::Path;

use homedir::my_home;
use rst_common::with_logging::log::debug;

use crate::errors::HeraldError;

pub const HERALD_DEFAULT_DIR: &str = ".herald";
pub const HERALD_CONTEXT_FILE: &str = "context.json";

/// Ensure `~/{dir}` exists, returning its path
pub fn setup_homedir(dir: &str) -> Result<String, HeraldError> {
    let current_homedir = my_home().map_err(|err| HeraldError::HomeDirError(err.to_string()))?;

    match current_homedir {
        Some(current_dir) => {
            let herald_path = Path::new(&current_dir).join(dir);

            if !herald_path.exists() {
                debug!("herald directory still not exists");
                fs::create_dir_all(&herald_path)
                    .map_err(|err| HeraldError::HomeDirError(err.to_string()))?;
            }

            debug!("herald home directory: {}", herald_path.display());
            Ok(herald_path.display().to_string())
        }
        None => Err(HeraldError::HomeDirError(
            "unknown home directory path".to_string(),
        )),
    }
}

pub fn default_context_path() -> Result<String, HeraldError> {
    let dir = setup_homedir(HERALD_DEFAULT_DIR)?;
    Ok(format!("{}/{}", dir, HERALD_CONTEXT_FILE))
}
