use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) owner_id: String,
    pub(crate) fps_cap: u32,
    pub(crate) enable_color: bool,
    pub(crate) seed: u64,
    pub(crate) care_tick_ms: u64,
    pub(crate) arcade_tick_ms: u64,
    pub(crate) pulse_ms: u64,
    pub(crate) log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            owner_id: "local".to_string(),
            fps_cap: 45,
            enable_color: true,
            seed: 0xC0FFEE_u64,
            care_tick_ms: 5_000,
            arcade_tick_ms: 22,
            pulse_ms: 1_200,
            log_filter: "info".to_string(),
        }
    }
}

impl Settings {
    pub(crate) fn care_period(&self) -> Duration {
        Duration::from_millis(self.care_tick_ms.max(1))
    }

    pub(crate) fn arcade_period(&self) -> Duration {
        Duration::from_millis(self.arcade_tick_ms.max(1))
    }

    pub(crate) fn pulse_delay(&self) -> Duration {
        Duration::from_millis(self.pulse_ms)
    }
}

pub(crate) struct Paths {
    pub(crate) roster_path: PathBuf,
    pub(crate) settings_path: PathBuf,
    pub(crate) log_path: PathBuf,
}

impl Paths {
    pub(crate) fn in_dir(dir: &Path) -> Self {
        Self {
            roster_path: dir.join("roster.json"),
            settings_path: dir.join("settings.json"),
            log_path: dir.join("petplay.log"),
        }
    }
}

/// Resolves the data directory, preferring an explicit override.
pub(crate) fn project_paths(data_dir: Option<&Path>) -> Result<Paths> {
    let dir = match data_dir {
        Some(d) => d.to_path_buf(),
        None => ProjectDirs::from("com", "petplay", "Petplay")
            .context("could not resolve project directories")?
            .data_local_dir()
            .to_path_buf(),
    };
    fs::create_dir_all(&dir)
        .with_context(|| format!("could not create data dir {}", dir.display()))?;
    Ok(Paths::in_dir(&dir))
}

pub(crate) fn load_settings(path: &Path) -> Settings {
    if let Ok(s) = fs::read_to_string(path) {
        if let Ok(v) = serde_json::from_str::<Settings>(&s) {
            return v;
        }
    }
    Settings::default()
}

pub(crate) fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, data)?;
    atomic_rename(&tmp, path)?;
    Ok(())
}

pub(crate) fn atomic_rename(from: &Path, to: &Path) -> io::Result<()> {
    // rename-over-existing is not atomic on Windows
    if to.exists() {
        let _ = fs::remove_file(to);
    }
    fs::rename(from, to)
}
