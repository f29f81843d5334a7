use crate::config::atomic_rename;
use crate::model::Subject;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, info};

pub(crate) const ROSTER_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub(crate) enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("roster file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("roster version {found} is newer than supported {expected}")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("store unavailable")]
    Unavailable,
}

/// The persistence boundary. The games read subjects through it once and
/// otherwise only ever ask it to bump a subject's advantage.
pub(crate) trait SubjectStore {
    fn load_subjects(&self, owner_id: &str) -> Result<Vec<Subject>, StoreError>;

    /// Returns the refreshed subject, or `None` if the id is unknown.
    fn increment_advantage(&mut self, subject_id: u64) -> Result<Option<Subject>, StoreError>;
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct StoredSubject {
    pub(crate) owner_id: String,
    #[serde(flatten)]
    pub(crate) subject: Subject,
    #[serde(default)]
    pub(crate) last_milestone_utc: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct RosterFile {
    pub(crate) version: u32,
    pub(crate) subjects: Vec<StoredSubject>,
}

/// Pets every new owner starts with.
pub(crate) fn starter_subjects() -> Vec<Subject> {
    ["Mochi", "Biscuit", "Pepper"]
        .iter()
        .enumerate()
        .map(|(i, name)| Subject {
            id: i as u64 + 1,
            name: name.to_string(),
            advantage: 0,
        })
        .collect()
}

impl RosterFile {
    fn starter(owner_id: &str) -> Self {
        let subjects = starter_subjects()
            .into_iter()
            .map(|subject| StoredSubject {
                owner_id: owner_id.to_string(),
                subject,
                last_milestone_utc: None,
            })
            .collect();
        Self {
            version: ROSTER_VERSION,
            subjects,
        }
    }
}

/// Roster kept in a single JSON file, rewritten atomically on every change.
pub(crate) struct JsonStore {
    path: PathBuf,
    roster: RosterFile,
}

impl JsonStore {
    /// Opens the roster at `path`, creating a starter roster for `owner_id`
    /// when the file does not exist yet.
    pub(crate) fn open(path: &Path, owner_id: &str) -> Result<Self, StoreError> {
        let roster = match fs::read_to_string(path) {
            Ok(s) => {
                let roster: RosterFile = serde_json::from_str(&s)?;
                if roster.version > ROSTER_VERSION {
                    return Err(StoreError::VersionMismatch {
                        found: roster.version,
                        expected: ROSTER_VERSION,
                    });
                }
                roster
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), owner_id, "seeding starter roster");
                let roster = RosterFile::starter(owner_id);
                save_roster_atomic(path, &roster)?;
                roster
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path: path.to_path_buf(),
            roster,
        })
    }
}

impl SubjectStore for JsonStore {
    fn load_subjects(&self, owner_id: &str) -> Result<Vec<Subject>, StoreError> {
        Ok(self
            .roster
            .subjects
            .iter()
            .filter(|s| s.owner_id == owner_id)
            .map(|s| s.subject.clone())
            .collect())
    }

    fn increment_advantage(&mut self, subject_id: u64) -> Result<Option<Subject>, StoreError> {
        // Only adopt the change once it is on disk.
        let mut next = self.roster.clone();
        let Some(entry) = next
            .subjects
            .iter_mut()
            .find(|s| s.subject.id == subject_id)
        else {
            return Ok(None);
        };
        entry.subject.advantage = entry.subject.advantage.saturating_add(1);
        entry.last_milestone_utc = Some(Utc::now());
        let refreshed = entry.subject.clone();

        save_roster_atomic(&self.path, &next)?;
        self.roster = next;
        debug!(subject_id, advantage = refreshed.advantage, "advantage saved");
        Ok(Some(refreshed))
    }
}

pub(crate) fn save_roster_atomic(path: &Path, roster: &RosterFile) -> Result<(), StoreError> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(roster)?;
    fs::write(&tmp, data)?;
    atomic_rename(&tmp, path)?;
    Ok(())
}

/// In-memory store. Used for tests and as the fallback when the roster
/// file cannot be read; nothing it records outlives the process.
#[derive(Clone, Debug, Default)]
pub(crate) struct MemoryStore {
    pub(crate) subjects: Vec<(String, Subject)>,
    pub(crate) fail: bool,
    pub(crate) increments: u32,
}

impl MemoryStore {
    pub(crate) fn with(owner_id: &str, subjects: Vec<Subject>) -> Self {
        Self {
            subjects: subjects
                .into_iter()
                .map(|s| (owner_id.to_string(), s))
                .collect(),
            fail: false,
            increments: 0,
        }
    }
}

impl SubjectStore for MemoryStore {
    fn load_subjects(&self, owner_id: &str) -> Result<Vec<Subject>, StoreError> {
        Ok(self
            .subjects
            .iter()
            .filter(|(owner, _)| owner == owner_id)
            .map(|(_, s)| s.clone())
            .collect())
    }

    fn increment_advantage(&mut self, subject_id: u64) -> Result<Option<Subject>, StoreError> {
        self.increments += 1;
        if self.fail {
            return Err(StoreError::Unavailable);
        }
        Ok(self
            .subjects
            .iter_mut()
            .find(|(_, s)| s.id == subject_id)
            .map(|(_, s)| {
                s.advantage += 1;
                s.clone()
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_store_seeds_and_persists_increments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.json");

        let mut store = JsonStore::open(&path, "alice").unwrap();
        let pets = store.load_subjects("alice").unwrap();
        assert_eq!(pets.len(), 3);
        assert!(store.load_subjects("bob").unwrap().is_empty());

        let id = pets[1].id;
        let refreshed = store.increment_advantage(id).unwrap().unwrap();
        assert_eq!(refreshed.advantage, 1);

        let reopened = JsonStore::open(&path, "alice").unwrap();
        let pets = reopened.load_subjects("alice").unwrap();
        assert_eq!(pets.iter().find(|p| p.id == id).unwrap().advantage, 1);
        assert!(reopened.roster.subjects[1].last_milestone_utc.is_some());
    }

    #[test]
    fn json_store_unknown_id_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonStore::open(&dir.path().join("roster.json"), "alice").unwrap();
        assert!(store.increment_advantage(999).unwrap().is_none());
    }

    #[test]
    fn json_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            JsonStore::open(&path, "alice"),
            Err(StoreError::Json(_))
        ));
    }

    #[test]
    fn memory_store_failure_counts_the_attempt() {
        let mut store = MemoryStore::with(
            "alice",
            vec![Subject {
                id: 7,
                name: "Rex".into(),
                advantage: 2,
            }],
        );
        store.fail = true;
        assert!(store.increment_advantage(7).is_err());
        assert_eq!(store.increments, 1);
        assert_eq!(store.subjects[0].1.advantage, 2);
    }

    #[test]
    fn failed_save_leaves_the_roster_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.json");
        let mut store = JsonStore::open(&path, "alice").unwrap();

        // A directory where the temp file should go makes the write fail.
        fs::create_dir(path.with_extension("json.tmp")).unwrap();
        assert!(matches!(store.increment_advantage(1), Err(StoreError::Io(_))));
        assert!(store
            .load_subjects("alice")
            .unwrap()
            .iter()
            .all(|p| p.advantage == 0));
    }
}
