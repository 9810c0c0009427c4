use std::fs;
use std::io::{self, Write};
use std::path::Path;

use rst_common::with_logging::log::info;

use prople_herald_core::context::Context;

use crate::errors::HeraldError;

pub fn save_context(context: &Context, path: &str) -> Result<(), HeraldError> {
    let raw = context
        .to_json()
        .map_err(|err| HeraldError::ContextError(err.to_string()))?;

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| HeraldError::ContextError(err.to_string()))?;
        }
    }

    write_private(path, raw.as_bytes())
        .map_err(|err| HeraldError::ContextError(err.to_string()))?;
    info!("context saved to {}", path);
    Ok(())
}

/// The context carries the wallet key, only the owner may read it
fn write_private(path: &str, raw: &[u8]) -> io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(raw)
}

pub fn load_context(path: &str) -> Result<Context, HeraldError> {
    let raw = fs::read_to_string(path)
        .map_err(|err| HeraldError::ContextError(format!("unable to read {}: {}", path, err)))?;

    Context::create_with_config(&raw).map_err(|err| HeraldError::ContextError(err.to_string()))
}
