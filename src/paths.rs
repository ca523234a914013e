//! Centralized path resolution for regstate
//!
//! # Environment Variables
//!
//! - `REGSTATE_CONFIG_DIR` - Override config directory
//! - `REGSTATE_STATE_DIR` - Override state directory (where the registry snapshot lives)
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `REGSTATE_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/regstate` (if set)
//! 3. Platform default:
//!    - Windows: `%APPDATA%\regstate`
//!    - macOS/Linux: `~/.config/regstate`
//!
//! For state_dir():
//! 1. `REGSTATE_STATE_DIR` environment variable
//! 2. `XDG_STATE_HOME/regstate` (if set)
//! 3. Platform default:
//!    - Windows: `%LOCALAPPDATA%\regstate`
//!    - macOS/Linux: `~/.local/state/regstate`

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "REGSTATE_CONFIG_DIR";

/// Environment variable for state directory override
pub const ENV_STATE_DIR: &str = "REGSTATE_STATE_DIR";

const APP_DIR: &str = "regstate";

/// Name of the config file inside the config directory
pub const CONFIG_FILE: &str = "config.toml";

/// Name of the default registry snapshot inside the state directory
pub const STATE_FILE: &str = "registry.json";

/// Get the regstate config directory path
pub fn config_dir() -> Result<PathBuf> {
    config_dir_with(|key| std::env::var(key).ok())
}

/// Get the regstate state directory path
pub fn state_dir() -> Result<PathBuf> {
    state_dir_with(|key| std::env::var(key).ok())
}

/// Path of the config file
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE))
}

/// Path of the default registry snapshot
pub fn default_state_file() -> Result<PathBuf> {
    Ok(state_dir()?.join(STATE_FILE))
}

fn config_dir_with(env: impl Fn(&str) -> Option<String>) -> Result<PathBuf> {
    // 1. Check environment variable override
    if let Some(dir) = env(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!("Using config dir from {}: {}", ENV_CONFIG_DIR, path.display());
        return Ok(path);
    }

    // 2. Check XDG_CONFIG_HOME
    if let Some(xdg_config) = env("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join(APP_DIR);
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    // 3. Platform default
    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            let path = app_data.join(APP_DIR);
            log::debug!("Using Windows config dir: {}", path.display());
            return Ok(path);
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join(APP_DIR);
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

fn state_dir_with(env: impl Fn(&str) -> Option<String>) -> Result<PathBuf> {
    if let Some(dir) = env(ENV_STATE_DIR) {
        let path = expand(&dir);
        log::debug!("Using state dir from {}: {}", ENV_STATE_DIR, path.display());
        return Ok(path);
    }

    if let Some(xdg_state) = env("XDG_STATE_HOME") {
        let path = PathBuf::from(xdg_state).join(APP_DIR);
        log::debug!("Using XDG_STATE_HOME: {}", path.display());
        return Ok(path);
    }

    #[cfg(windows)]
    {
        if let Some(local_app_data) = dirs::data_local_dir() {
            let path = local_app_data.join(APP_DIR);
            log::debug!("Using Windows state dir: {}", path.display());
            return Ok(path);
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".local").join("state").join(APP_DIR);
    log::debug!("Using default state dir: {}", path.display());
    Ok(path)
}

/// Expand ~ and environment variables in a path string.
///
/// Unknown variables are left as written.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_dir_env_override() {
        let result = config_dir_with(env_of(&[
            (ENV_CONFIG_DIR, "/custom/config/path"),
            ("XDG_CONFIG_HOME", "/ignored"),
        ]))
        .unwrap();
        assert_eq!(result, PathBuf::from("/custom/config/path"));
    }

    #[test]
    fn test_config_dir_env_override_with_tilde() {
        let home = dirs::home_dir().unwrap();
        let result = config_dir_with(env_of(&[(ENV_CONFIG_DIR, "~/dotfiles/regstate")])).unwrap();
        assert_eq!(result, home.join("dotfiles").join("regstate"));
    }

    #[test]
    fn test_xdg_config_home() {
        let result = config_dir_with(env_of(&[("XDG_CONFIG_HOME", "/tmp/xdg-config")])).unwrap();
        assert_eq!(result, PathBuf::from("/tmp/xdg-config/regstate"));
    }

    #[test]
    fn test_state_dir_env_override() {
        let result = state_dir_with(env_of(&[(ENV_STATE_DIR, "/custom/state")])).unwrap();
        assert_eq!(result, PathBuf::from("/custom/state"));
    }

    #[test]
    fn test_xdg_state_home() {
        let result = state_dir_with(env_of(&[("XDG_STATE_HOME", "/tmp/xdg-state")])).unwrap();
        assert_eq!(result, PathBuf::from("/tmp/xdg-state/regstate"));
    }

    #[cfg(unix)]
    #[test]
    fn test_default_dirs_unix() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(
            config_dir_with(env_of(&[])).unwrap(),
            home.join(".config").join("regstate")
        );
        assert_eq!(
            state_dir_with(env_of(&[])).unwrap(),
            home.join(".local").join("state").join("regstate")
        );
    }

    #[test]
    fn test_expand_with_tilde() {
        let result = expand("~/test/path");
        let home = dirs::home_dir().unwrap();
        assert_eq!(result, home.join("test").join("path"));
    }

    #[test]
    fn test_expand_unknown_env_var_unchanged() {
        let result = expand("/path/$NONEXISTENT_VAR_12345/file");
        assert_eq!(result, PathBuf::from("/path/$NONEXISTENT_VAR_12345/file"));
    }
}
