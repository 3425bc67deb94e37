use crate::model::DEFAULT_NUM_FLOORS;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

const MAX_NUM_FLOORS: u32 = 1_000_000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) num_floors: u32,
    pub(crate) tick_ms: u64,
    pub(crate) enable_color: bool,
    pub(crate) log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            num_floors: DEFAULT_NUM_FLOORS,
            tick_ms: 30,
            enable_color: true,
            log_filter: "info".to_string(),
        }
    }
}

impl Settings {
    fn sanitized(mut self) -> Self {
        self.num_floors = self.num_floors.clamp(1, MAX_NUM_FLOORS);
        self.tick_ms = self.tick_ms.clamp(1, 1000);
        self
    }
}

pub(crate) struct Paths {
    pub(crate) settings_path: PathBuf,
    pub(crate) log_path: PathBuf,
}

pub(crate) fn project_paths() -> Result<Paths> {
    let proj = ProjectDirs::from("com", "elevator", "Elevator")
        .context("could not resolve project directories")?;
    let data = proj.data_local_dir().to_path_buf();
    fs::create_dir_all(&data).ok();
    Ok(Paths {
        settings_path: proj.config_dir().join("settings.json"),
        log_path: data.join("elevator.log"),
    })
}

/// Missing or unreadable settings fall back to defaults.
pub(crate) fn load_settings(path: &Path) -> Settings {
    if let Ok(s) = fs::read_to_string(path) {
        if let Ok(v) = serde_json::from_str::<Settings>(&s) {
            return v.sanitized();
        }
    }
    Settings::default()
}
