use crate::batch::{CacheBatch, CacheOp};
use crate::error::CacheError;
use crate::persistent::PersistentStore;
use parking_lot::Mutex;
use shaderforge_common::{FastHashMap, ShaderStageIdentity};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

/// Environment variable overriding the persistent cache directory.
pub const CACHE_DIR_ENV: &str = "SHADERFORGE_CACHE_DIR";

/// Options for the source cache.
#[derive(Debug, Clone, Default)]
pub struct CacheOptions {
    /// The directory of the persistent binary store. When `None`, the platform cache directory
    /// is used.
    pub directory: Option<PathBuf>,
    /// Whether compiled binaries are persisted across processes.
    pub persistent: bool,
}

impl CacheOptions {
    /// Options with the persistent store enabled in `directory`.
    pub fn persistent_in(directory: impl Into<PathBuf>) -> Self {
        CacheOptions {
            directory: Some(directory.into()),
            persistent: true,
        }
    }

    /// Read options from the environment.
    ///
    /// Setting `SHADERFORGE_CACHE_DIR` enables the persistent store in that directory.
    pub fn from_env() -> Self {
        match std::env::var_os(CACHE_DIR_ENV) {
            Some(dir) if !dir.is_empty() => Self::persistent_in(dir),
            _ => Self::default(),
        }
    }
}

/// Every artifact cached for one shader stage.
#[derive(Debug, Clone, Default)]
pub struct CacheEntry {
    pub body_path: Option<PathBuf>,
    pub body: Option<Arc<str>>,
    pub full_source: Option<Arc<str>>,
    pub binary: Option<Arc<[u32]>>,
    /// The modification time of the body file when the entry was last generated.
    pub modified: Option<SystemTime>,
    pub disassembly: Option<Arc<str>>,
    /// The resource groups used by the full source, in set order.
    pub resource_groups: Arc<[String]>,
}

impl CacheEntry {
    fn invalidate(&mut self) {
        self.body = None;
        self.full_source = None;
        self.binary = None;
        self.modified = None;
        self.disassembly = None;
        self.resource_groups = Arc::from([]);
    }
}

/// The shared, thread-safe source cache.
///
/// Every map of the cache lives behind one mutex, so no reader can observe a full source that
/// was regenerated while the binary still reflects the previous body.
#[derive(Default)]
pub struct SourceCache {
    state: Mutex<FastHashMap<ShaderStageIdentity, CacheEntry>>,
    store: Option<PersistentStore>,
}

impl SourceCache {
    /// Create an in-memory cache without a persistent store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache with the given options, opening the persistent store if enabled.
    pub fn with_options(options: &CacheOptions) -> Result<Self, CacheError> {
        let store = if options.persistent {
            let directory = match &options.directory {
                Some(directory) => directory.clone(),
                None => crate::persistent::get_cache_dir()?,
            };
            Some(PersistentStore::open(&directory)?)
        } else {
            None
        };

        Ok(SourceCache {
            state: Mutex::new(FastHashMap::default()),
            store,
        })
    }

    /// The persistent binary store, if enabled.
    pub fn store(&self) -> Option<&PersistentStore> {
        self.store.as_ref()
    }

    /// A snapshot of the whole entry for `identity`.
    pub fn entry(&self, identity: &ShaderStageIdentity) -> Option<CacheEntry> {
        self.state.lock().get(identity).cloned()
    }

    pub fn contains(&self, identity: &ShaderStageIdentity) -> bool {
        self.state.lock().contains_key(identity)
    }

    pub fn find_body(&self, identity: &ShaderStageIdentity) -> Option<Arc<str>> {
        self.state.lock().get(identity).and_then(|e| e.body.clone())
    }

    pub fn find_body_path(&self, identity: &ShaderStageIdentity) -> Option<PathBuf> {
        self.state
            .lock()
            .get(identity)
            .and_then(|e| e.body_path.clone())
    }

    /// Register the body path of a stage.
    ///
    /// Registering a different path than the one already known invalidates the entry.
    pub fn add_body_path(&self, identity: ShaderStageIdentity, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut state = self.state.lock();
        let entry = state.entry(identity).or_default();
        if entry.body_path.as_deref() != Some(path) {
            entry.invalidate();
            entry.body_path = Some(path.to_path_buf());
        }
    }

    pub fn find_full_source(&self, identity: &ShaderStageIdentity) -> Option<Arc<str>> {
        self.state
            .lock()
            .get(identity)
            .and_then(|e| e.full_source.clone())
    }

    pub fn find_binary(&self, identity: &ShaderStageIdentity) -> Option<Arc<[u32]>> {
        self.state
            .lock()
            .get(identity)
            .and_then(|e| e.binary.clone())
    }

    pub fn find_last_modification_time(
        &self,
        identity: &ShaderStageIdentity,
    ) -> Option<SystemTime> {
        self.state.lock().get(identity).and_then(|e| e.modified)
    }

    /// The resource groups used by the cached full source, in set order.
    pub fn find_resource_groups(&self, identity: &ShaderStageIdentity) -> Option<Arc<[String]>> {
        self.state
            .lock()
            .get(identity)
            .filter(|e| e.full_source.is_some())
            .map(|e| Arc::clone(&e.resource_groups))
    }

    pub fn find_disassembly(&self, identity: &ShaderStageIdentity) -> Option<Arc<str>> {
        self.state
            .lock()
            .get(identity)
            .and_then(|e| e.disassembly.clone())
    }

    /// Get the disassembly of the cached binary, producing it with `disassemble` on first use.
    ///
    /// The lock is not held while `disassemble` runs. If the binary was replaced in the meantime
    /// the result is returned but not cached.
    pub fn find_or_insert_disassembly<E>(
        &self,
        identity: &ShaderStageIdentity,
        disassemble: impl FnOnce(&[u32]) -> Result<String, E>,
    ) -> Result<Arc<str>, E>
    where
        E: From<CacheError>,
    {
        let binary = {
            let state = self.state.lock();
            let entry = state.get(identity).ok_or(CacheError::EntryMissing {
                identity: *identity,
                what: "binary",
            })?;
            if let Some(text) = &entry.disassembly {
                return Ok(Arc::clone(text));
            }
            entry.binary.clone().ok_or(CacheError::EntryMissing {
                identity: *identity,
                what: "binary",
            })?
        };

        let text: Arc<str> = Arc::from(disassemble(&binary)?);

        let mut state = self.state.lock();
        if let Some(entry) = state.get_mut(identity) {
            if entry
                .binary
                .as_ref()
                .is_some_and(|current| Arc::ptr_eq(current, &binary))
            {
                entry.disassembly = Some(Arc::clone(&text));
            }
        }
        Ok(text)
    }

    /// Whether the cached artifacts of `identity` are older than its body file.
    ///
    /// Entries without a recorded modification time are always stale.
    pub fn is_stale(&self, identity: &ShaderStageIdentity, current: SystemTime) -> bool {
        match self.find_last_modification_time(identity) {
            Some(recorded) => current > recorded,
            None => true,
        }
    }

    /// Apply every operation of `batch`, or none of them.
    ///
    /// Operations are validated in order against the state they would produce. The first
    /// operation that cannot be applied fails the whole batch and leaves the cache unchanged.
    pub fn apply(&self, batch: CacheBatch) -> Result<(), CacheError> {
        let mut state = self.state.lock();
        let mut staged: FastHashMap<ShaderStageIdentity, Option<CacheEntry>> =
            FastHashMap::default();

        for (step, op) in batch.ops.into_iter().enumerate() {
            let identity = op.identity();
            let slot = staged
                .entry(identity)
                .or_insert_with(|| state.get(&identity).cloned());

            let fail = |reason: &'static str| CacheError::BatchFailed {
                step,
                identity,
                reason,
            };

            match op {
                CacheOp::SetBodyPath(_, path) => {
                    let entry = slot.get_or_insert_with(CacheEntry::default);
                    entry.body_path = Some(path);
                }
                CacheOp::SetBody(_, body) => {
                    let entry = slot
                        .as_mut()
                        .filter(|e| e.body_path.is_some())
                        .ok_or_else(|| fail("no body path registered"))?;
                    entry.body = Some(body);
                }
                CacheOp::SetFullSource {
                    source,
                    resource_groups,
                    ..
                } => {
                    let entry = slot
                        .as_mut()
                        .filter(|e| e.body.is_some())
                        .ok_or_else(|| fail("no body cached"))?;
                    entry.full_source = Some(source);
                    entry.resource_groups = resource_groups;
                }
                CacheOp::SetBinary(_, binary) => {
                    let entry = slot
                        .as_mut()
                        .filter(|e| e.full_source.is_some())
                        .ok_or_else(|| fail("no full source cached"))?;
                    entry.binary = Some(binary);
                    entry.disassembly = None;
                }
                CacheOp::SetModified(_, modified) => {
                    let entry = slot.as_mut().ok_or_else(|| fail("no entry"))?;
                    entry.modified = Some(modified);
                }
                CacheOp::SetDisassembly(_, text) => {
                    let entry = slot
                        .as_mut()
                        .filter(|e| e.binary.is_some())
                        .ok_or_else(|| fail("no binary cached"))?;
                    entry.disassembly = Some(text);
                }
                CacheOp::Invalidate(_) => {
                    if let Some(entry) = slot.as_mut() {
                        entry.invalidate();
                    }
                }
                CacheOp::Erase(_) => {
                    *slot = None;
                }
            }
        }

        for (identity, entry) in staged {
            match entry {
                Some(entry) => {
                    state.insert(identity, entry);
                }
                None => {
                    state.remove(&identity);
                }
            }
        }
        Ok(())
    }

    /// Drop every artifact derived from the body of `identity`, keeping its body path.
    pub fn invalidate(&self, identity: &ShaderStageIdentity) {
        if let Some(entry) = self.state.lock().get_mut(identity) {
            log::debug!("invalidating cached artifacts of {identity}");
            entry.invalidate();
        }
    }

    /// Remove the entry of `identity`.
    pub fn erase(&self, identity: &ShaderStageIdentity) {
        self.state.lock().remove(identity);
    }

    pub fn len(&self) -> usize {
        self.state.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().is_empty()
    }
}
