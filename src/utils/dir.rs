use std::{env, path::PathBuf};

use anyhow::{Context, Result};

const APP_DIR_NAME: &str = "timepal-stats";

/// Base directory for application state, before the app name is appended.
fn state_base(xdg_state: Option<String>, home: Option<String>) -> Option<PathBuf> {
    xdg_state
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| home.map(|home| PathBuf::from(home).join(".local/state")))
}

/// Resolves and creates the directory holding records, taxonomies, config and logs.
pub fn create_application_default_path() -> Result<PathBuf> {
    #[cfg(windows)]
    let base = env::var("APPDATA")
        .map(PathBuf::from)
        .context("APPDATA should be present on Windows")?;
    #[cfg(not(windows))]
    let base = state_base(env::var("XDG_STATE_HOME").ok(), env::var("HOME").ok())
        .context("Couldn't find neither XDG_STATE_HOME nor HOME")?;

    let path = base.join(APP_DIR_NAME);
    std::fs::create_dir_all(&path).with_context(|| format!("Failed to create {path:?}"))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::state_base;

    #[test]
    fn prefers_xdg_state() {
        assert_eq!(
            state_base(Some("/state".into()), Some("/home/me".into())),
            Some(PathBuf::from("/state"))
        );
        assert_eq!(
            state_base(Some(String::new()), Some("/home/me".into())),
            Some(PathBuf::from("/home/me/.local/state"))
        );
        assert_eq!(state_base(None, None), None);
    }
}
