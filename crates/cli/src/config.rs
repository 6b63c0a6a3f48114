//! Project directory and configuration
//!
//! A project is any directory holding a `.basmati/` marker directory. Its
//! settings live beside the marker in `basmati.toml`:
//!
//! ```toml
//! hydrosheds_dir = "/data/HydroSHEDS"
//! region = "as"
//! levels = [1, 2, 3, 4, 5, 6]
//! dem_resolution = "30s"
//!
//! [download]
//! regions = ["as"]
//! timeout_secs = 600
//! ```

use anyhow::{bail, Context, Result};
use basmati_core::io::DEFAULT_DEM_RESOLUTION;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const PROJECT_MARKER: &str = ".basmati";
pub const CONFIG_FILE: &str = "basmati.toml";

/// Settings of one project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Directory holding the HydroBASINS shapefiles and HydroSHEDS DEMs
    pub hydrosheds_dir: PathBuf,
    /// Region code, e.g. `as` for Asia
    pub region: String,
    /// Levels loaded for whole-table commands
    pub levels: Vec<u8>,
    /// DEM resolution suffix, e.g. `30s`
    pub dem_resolution: String,
    pub download: DownloadConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            hydrosheds_dir: PathBuf::from("HydroSHEDS"),
            region: "as".to_string(),
            levels: basmati_core::io::ALL_LEVELS.collect(),
            dem_resolution: DEFAULT_DEM_RESOLUTION.to_string(),
            download: DownloadConfig::default(),
        }
    }
}

/// Where and how to fetch data. `{region}` and `{resolution}` in the URL
/// templates are substituted per download.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Regions fetched when `download` is run without `--regions`
    pub regions: Vec<String>,
    pub dem_url: String,
    pub basins_url: String,
    pub timeout_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            regions: vec!["as".to_string()],
            dem_url: "https://data.hydrosheds.org/file/hydrosheds-v1-dem/{region}_dem_{resolution}_bil.zip"
                .to_string(),
            basins_url: "https://data.hydrosheds.org/file/hydrobasins/standard/hybas_{region}_lev01-12_v1c.zip"
                .to_string(),
            timeout_secs: 600,
        }
    }
}

impl ProjectConfig {
    /// Read `basmati.toml` from a project root. A missing file gives the
    /// defaults; relative `hydrosheds_dir` paths resolve against the root.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        let mut config: ProjectConfig = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            toml::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))?
        } else {
            debug!("{} not found, using defaults", path.display());
            ProjectConfig::default()
        };
        if config.hydrosheds_dir.is_relative() {
            config.hydrosheds_dir = root.join(&config.hydrosheds_dir);
        }
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Nearest ancestor of `start` (itself included) holding the project marker
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(PROJECT_MARKER).is_dir())
        .map(Path::to_path_buf)
}

/// Make `dir` a project: create the marker and a default config.
///
/// An existing `basmati.toml` is kept.
pub fn init_project(dir: &Path) -> Result<PathBuf> {
    let marker = dir.join(PROJECT_MARKER);
    if marker.exists() {
        bail!("Project already initialized: {}", dir.display());
    }
    std::fs::create_dir_all(&marker)
        .with_context(|| format!("Failed to create {}", marker.display()))?;

    let config_path = dir.join(CONFIG_FILE);
    if !config_path.exists() {
        std::fs::write(&config_path, ProjectConfig::default().to_toml()?)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
    }
    Ok(config_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_and_find_root() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_project_root(&nested), None);

        init_project(dir.path()).unwrap();
        assert_eq!(find_project_root(&nested), Some(dir.path().to_path_buf()));
        assert!(init_project(dir.path()).is_err());
    }

    #[test]
    fn test_default_config_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        init_project(dir.path()).unwrap();
        let config = ProjectConfig::load(dir.path()).unwrap();
        assert_eq!(config.region, "as");
        assert_eq!(config.levels.len(), 12);
        assert_eq!(config.hydrosheds_dir, dir.path().join("HydroSHEDS"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "hydrosheds_dir = \"/data/hs\"\nlevels = [1, 2]\n\n[download]\ntimeout_secs = 5\n",
        )
        .unwrap();
        let config = ProjectConfig::load(dir.path()).unwrap();
        assert_eq!(config.hydrosheds_dir, PathBuf::from("/data/hs"));
        assert_eq!(config.levels, vec![1, 2]);
        assert_eq!(config.dem_resolution, "30s");
        assert_eq!(config.download.timeout_secs, 5);
        assert_eq!(config.download.regions, vec!["as".to_string()]);
    }

    #[test]
    fn test_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "levels = \"all\"\n").unwrap();
        assert!(ProjectConfig::load(dir.path()).is_err());
    }
}
