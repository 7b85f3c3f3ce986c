//! Dependency cache.
//!
//! Owns every [`DependencyRecord`] for the lifetime of a build session and
//! memoizes two things: the direct includes of each scanned file (keyed by
//! path and scanner) and the transitive closure of each source (keyed by
//! path and search-path fingerprint).
//!
//! Concurrent builds share one cache. Lookups take a read lock on the index;
//! computing an entry locks only that entry's slot, so two workers asking
//! for the same key wait on each other while unrelated keys proceed.

mod record;
mod search;

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::SystemTime;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub use record::{DependencyRecord, Stamp, Unresolved};
pub use search::SearchPath;

use crate::scanner::{IncludeDirective, ScannerKind};
use crate::util::fs::{normalize_lexical, write_string, FileSystem};

/// Default location of the persisted cache, relative to the project root.
pub const DEPS_FILE: &str = ".keel/deps.json";

const FORMAT_VERSION: u32 = 1;

type Slot<V> = Arc<Mutex<Option<V>>>;
type SlotMap<K, V> = RwLock<HashMap<K, Slot<V>>>;

#[derive(Debug, Clone)]
struct ScanEntry {
    modified: Option<SystemTime>,
    includes: Arc<Vec<IncludeDirective>>,
}

#[derive(Serialize, Deserialize)]
struct PersistedDeps {
    version: u32,
    records: Vec<DependencyRecord>,
}

pub struct DependencyCache {
    fs: Arc<dyn FileSystem>,
    scans: SlotMap<(PathBuf, ScannerKind), ScanEntry>,
    records: SlotMap<(PathBuf, String), Arc<DependencyRecord>>,
}

impl std::fmt::Debug for DependencyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let records = self.records.read().map(|r| r.len()).unwrap_or(0);
        f.debug_struct("DependencyCache")
            .field("records", &records)
            .finish()
    }
}

/// Fetch the slot for `key`, creating an empty one if needed.
fn slot<K, V>(map: &SlotMap<K, V>, key: &K) -> Slot<V>
where
    K: Eq + Hash + Clone,
{
    if let Some(slot) = map.read().unwrap_or_else(PoisonError::into_inner).get(key) {
        return Arc::clone(slot);
    }
    let mut index = map.write().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(index.entry(key.clone()).or_default())
}

impl DependencyCache {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        DependencyCache {
            fs,
            scans: RwLock::new(HashMap::new()),
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Load a persisted cache. A missing or unreadable file yields an empty
    /// cache; stale records are rejected later by their stamps.
    pub fn load(fs: Arc<dyn FileSystem>, path: &Path) -> Self {
        let cache = Self::new(fs);
        let text = match cache.fs.read_to_string(path) {
            Ok(text) => text,
            Err(_) => return cache,
        };
        let persisted: PersistedDeps = match serde_json::from_str(&text) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("ignoring corrupt dependency cache {}: {}", path.display(), e);
                return cache;
            }
        };
        if persisted.version != FORMAT_VERSION {
            tracing::debug!("dependency cache format changed, starting fresh");
            return cache;
        }

        {
            let mut index = cache
                .records
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            for record in persisted.records {
                let key = (record.source.clone(), record.search.clone());
                index.insert(key, Arc::new(Mutex::new(Some(Arc::new(record)))));
            }
        }
        cache
    }

    /// Write every computed record to `path` as JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let slots: Vec<Slot<Arc<DependencyRecord>>> = self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();

        let mut records: Vec<DependencyRecord> = slots
            .iter()
            .filter_map(|slot| {
                slot.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .as_deref()
                    .cloned()
            })
            .collect();
        records.sort_by(|a, b| (&a.source, &a.search).cmp(&(&b.source, &b.search)));

        let persisted = PersistedDeps {
            version: FORMAT_VERSION,
            records,
        };
        let json = serde_json::to_string_pretty(&persisted)
            .context("failed to serialize dependency cache")?;
        write_string(path, &json)
    }

    /// Direct includes of `path`, rescanned only when its timestamp changes.
    ///
    /// An unreadable file has no includes.
    pub fn includes(&self, path: &Path, scanner: ScannerKind) -> Arc<Vec<IncludeDirective>> {
        let slot = slot(&self.scans, &(path.to_path_buf(), scanner));
        let mut entry = slot.lock().unwrap_or_else(PoisonError::into_inner);

        let modified = self.fs.modified(path);
        if let Some(cached) = entry.as_ref() {
            if cached.modified == modified {
                return Arc::clone(&cached.includes);
            }
        }

        let includes = match self.fs.read_to_string(path) {
            Ok(text) => scanner.scan(&text),
            Err(e) => {
                tracing::debug!("cannot scan {}: {}", path.display(), e);
                Vec::new()
            }
        };
        let includes = Arc::new(includes);
        *entry = Some(ScanEntry {
            modified,
            includes: Arc::clone(&includes),
        });
        includes
    }

    /// Dependency record for `source` under `search`, recomputed only when
    /// the memoized one is no longer current.
    pub fn record(&self, source: &Path, search: &SearchPath) -> Arc<DependencyRecord> {
        let source = normalize_lexical(source);
        let key = (source.clone(), search.fingerprint().to_string());
        let slot = slot(&self.records, &key);
        let mut entry = slot.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(record) = entry.as_ref() {
            if record.is_current(self.fs.as_ref(), search) {
                return Arc::clone(record);
            }
            tracing::debug!("dependencies of {} changed, rescanning", source.display());
        }

        let record = Arc::new(self.compute(&source, search));
        *entry = Some(Arc::clone(&record));
        record
    }

    /// Ordered transitive closure of `source`: every file it includes
    /// directly or indirectly, in depth-first discovery order.
    pub fn resolve(&self, source: &Path, search: &SearchPath) -> Vec<PathBuf> {
        self.record(source, search).closure.clone()
    }

    fn compute(&self, source: &Path, search: &SearchPath) -> DependencyRecord {
        let fs = self.fs.as_ref();
        let scanner = ScannerKind::for_path(source);

        let mut visited: HashSet<PathBuf> = HashSet::new();
        let mut closure = Vec::new();
        let mut unresolved = Vec::new();
        let mut stack = vec![source.to_path_buf()];
        let mut direct = Vec::new();

        while let Some(current) = stack.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            if current != source {
                closure.push(current.clone());
            }

            let includes = self.includes(&current, scanner);
            if current == source {
                direct = includes.as_ref().clone();
            }

            let mut children = Vec::with_capacity(includes.len());
            for include in includes.iter() {
                match search.resolve(fs, &current, include) {
                    Some(found) => {
                        if !visited.contains(&found) {
                            children.push(found);
                        }
                    }
                    None => {
                        tracing::debug!(
                            "unresolved include {} in {}",
                            include,
                            current.display()
                        );
                        let missing = Unresolved {
                            from: current.clone(),
                            include: include.clone(),
                        };
                        if !unresolved.contains(&missing) {
                            unresolved.push(missing);
                        }
                    }
                }
            }
            stack.extend(children.into_iter().rev());
        }

        let stamps = std::iter::once(source.to_path_buf())
            .chain(closure.iter().cloned())
            .map(|path| Stamp {
                modified: fs.modified(&path),
                path,
            })
            .collect();

        DependencyRecord {
            source: source.to_path_buf(),
            search: search.fingerprint().to_string(),
            direct,
            closure,
            unresolved,
            stamps,
        }
    }
}
