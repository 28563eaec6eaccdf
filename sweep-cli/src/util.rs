use std::env;
use std::path::PathBuf;

use anyhow::Result;

/// Resolves an optional path argument against the current working
/// directory, falling back to `default` when no path was given.
pub(crate) fn resolve_path(arg: Option<&str>, default: &str) -> Result<PathBuf> {
    let cwd = env::current_dir()?;
    let path = match arg {
        Some(p_str) => {
            let p = PathBuf::from(p_str);
            if p.is_relative() {
                cwd.join(p)
            } else {
                p
            }
        }
        None => cwd.join(default),
    };
    Ok(path)
}

/// Points directory arguments at the config file inside them.
pub(crate) fn config_file_at(path: PathBuf, file_name: &str) -> PathBuf {
    if path.is_dir() {
        path.join(file_name)
    } else {
        path
    }
}
