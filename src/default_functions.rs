use std::path::{Path, PathBuf};

use crate::config::config_dir;
use crate::error::FunctionsError;

pub(crate) fn default_functions_path() -> Option<PathBuf> {
    let mut path = config_dir()?;
    path.push("default.rhai");
    Some(path)
}

pub(crate) fn prepend_default_functions_if_present(
    functions: &mut Vec<PathBuf>,
    no_default_functions: bool,
) {
    if no_default_functions {
        return;
    }
    let Some(path) = default_functions_path() else {
        return;
    };
    if path.is_file() {
        functions.insert(0, path);
    } else {
        log::debug!("no default functions at {}", path.display());
    }
}

/// Concatenate function files in order, skipping repeats.
pub(crate) fn load_functions_script(paths: &[PathBuf]) -> Result<String, FunctionsError> {
    let mut seen: Vec<&Path> = Vec::new();
    let mut script = String::new();
    for path in paths {
        if seen.contains(&path.as_path()) {
            continue;
        }
        seen.push(path.as_path());
        let content = std::fs::read_to_string(path).map_err(|source| FunctionsError::Read {
            path: path.clone(),
            source,
        })?;
        log::debug!("loaded functions from {}", path.display());
        script.push_str(&content);
        script.push('\n');
    }
    Ok(script)
}
