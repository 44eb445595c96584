//! Path Utilities
//!
//! Default registry locations, all under `~/.vitrine/`.

use std::path::PathBuf;

/// Base directory (`~/.vitrine/`)
pub fn vitrine_dir() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or("Could not determine home directory")?;
    Ok(home.join(".vitrine"))
}

/// Default plugins root, one subdirectory per theme
pub fn themes_dir() -> Result<PathBuf, String> {
    Ok(vitrine_dir()?.join("themes"))
}

/// Default document store backing plugin records, settings and tokens
pub fn data_file() -> Result<PathBuf, String> {
    Ok(vitrine_dir()?.join("registry.json"))
}

/// Default `RegistryConfig` file
pub fn config_file() -> Result<PathBuf, String> {
    Ok(vitrine_dir()?.join("config.json"))
}
