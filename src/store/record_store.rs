//! File-backed record store with serialized read-merge-write updates

use crate::store::codec::{parse_roster, write_roster, write_roster_where};
use crate::store::error::{StoreError, StoreResult};
use crate::store::roster::{EntityRecord, Roster};
use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// One writer lock per roster file, shared by every store opened on it
static FILE_LOCKS: Lazy<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn file_lock(path: &Path) -> Arc<Mutex<()>> {
    let key = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let mut locks = FILE_LOCKS.lock().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(locks.entry(key).or_default())
}

/// Per-section counts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionStats {
    pub name: String,
    pub entities: usize,
    pub with_site: usize,
    pub with_domain: usize,
    pub unsure_only: usize,
}

/// Roster file shared between concurrent workers
///
/// The roster is loaded once at open. Every update re-reads the file under
/// an exclusive lock, merges it into the in-memory copy, applies the new
/// addresses and writes the result back, so concurrent updates for
/// different entities never overwrite each other.
///
/// The lock is process-wide: stores opened on the same path in one process
/// share it. Separate processes writing the same file are not serialized.
pub struct RecordStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
    roster: Mutex<Roster>,
}

impl RecordStore {
    /// Loads the roster at `path`
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let roster = read_roster(&path)?;

        tracing::debug!(
            path = %path.display(),
            sections = roster.sections().len(),
            entities = roster.len(),
            "Roster loaded"
        );

        Ok(Self {
            lock: file_lock(&path),
            path,
            roster: Mutex::new(roster),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entities, flattened in roster order
    pub fn list(&self) -> Vec<EntityRecord> {
        self.roster().entities().cloned().collect()
    }

    /// Snapshot of the in-memory roster
    pub fn roster(&self) -> Roster {
        self.roster
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Merges new addresses into every entity named `name` and persists
    ///
    /// Returns whether any entity matched. The file lock is held only for
    /// the duration of this call, and only excludes writers in this process.
    ///
    /// Rows already on disk are written back even when they have no address
    /// yet, so stations not scanned so far stay in the file.
    pub fn update_entity(
        &self,
        name: &str,
        domain_emails: &BTreeSet<String>,
        unsure_emails: &BTreeSet<String>,
    ) -> StoreResult<bool> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut roster = self.roster.lock().unwrap_or_else(PoisonError::into_inner);

        let on_disk = read_roster(&self.path)?;
        roster.merge_from(&on_disk);
        let stored: HashMap<&str, HashSet<&str>> = on_disk
            .sections()
            .iter()
            .map(|section| {
                let names = section.entities.iter().map(|e| e.name.as_str()).collect();
                (section.name.as_str(), names)
            })
            .collect();

        let matched = roster.apply(name, domain_emails, unsure_emails);
        if matched == 0 {
            tracing::warn!(entity = name, "No roster entry to update");
        }

        let text = write_roster_where(&roster, |section, entity| {
            entity.has_mail()
                || stored
                    .get(section)
                    .map_or(false, |names| names.contains(entity.name.as_str()))
        });
        write_atomic(&self.path, &text)?;
        tracing::debug!(
            entity = name,
            domain = domain_emails.len(),
            unsure = unsure_emails.len(),
            "Roster updated"
        );

        Ok(matched > 0)
    }

    /// Writes the in-memory roster to the backing file
    pub fn save(&self) -> StoreResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let roster = self.roster.lock().unwrap_or_else(PoisonError::into_inner);
        write_atomic(&self.path, &write_roster(&roster))?;
        Ok(())
    }

    /// Counts per section of the in-memory roster
    pub fn stats(&self) -> Vec<SectionStats> {
        let roster = self.roster.lock().unwrap_or_else(PoisonError::into_inner);
        roster
            .sections()
            .iter()
            .map(|section| {
                let mut stats = SectionStats {
                    name: section.name.clone(),
                    entities: section.entities.len(),
                    ..SectionStats::default()
                };
                for entity in &section.entities {
                    if !entity.site_url.trim().is_empty() {
                        stats.with_site += 1;
                    }
                    if !entity.domain_emails.is_empty() {
                        stats.with_domain += 1;
                    } else if !entity.unsure_emails.is_empty() {
                        stats.unsure_only += 1;
                    }
                }
                stats
            })
            .collect()
    }
}

fn read_roster(path: &Path) -> StoreResult<Roster> {
    let text = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => StoreError::NotFound(path.to_path_buf()),
        _ => StoreError::Io(e),
    })?;
    parse_roster(&text)
}

/// Writes through a sibling temp file and renames it over the target
fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp_path, path)
}
