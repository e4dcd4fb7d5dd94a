use crate::error::CacheError;
use parking_lot::Mutex;
use platform_dirs::AppDirs;
use rusqlite::{params, Connection, OptionalExtension};
use shaderforge_common::ShaderStage;
use std::path::{Path, PathBuf};

const DATABASE_NAME: &str = "shaderforge.db";
const BINARY_INDEX: &str = "spirv";

/// The platform cache directory, created if it does not exist.
pub fn get_cache_dir() -> Result<PathBuf, CacheError> {
    let cache_dir =
        if let Some(cache_dir) = AppDirs::new(Some("shaderforge"), false).map(|a| a.cache_dir) {
            cache_dir
        } else {
            let mut current_dir = std::env::current_dir()
                .map_err(|e| CacheError::OpenFailed(PathBuf::from("."), e))?;
            current_dir.push("shaderforge");
            current_dir
        };

    std::fs::create_dir_all(&cache_dir).map_err(|e| CacheError::OpenFailed(cache_dir.clone(), e))?;

    Ok(cache_dir)
}

/// A content-addressed store of compiled binaries that persists across processes.
///
/// Binaries are keyed by a hash of the stage kind and the full source text, so a stale entry can
/// never be returned for changed source.
pub struct PersistentStore {
    conn: Mutex<Connection>,
}

impl PersistentStore {
    /// Open or create the store in `directory`.
    pub fn open(directory: &Path) -> Result<Self, CacheError> {
        std::fs::create_dir_all(directory)
            .map_err(|e| CacheError::OpenFailed(directory.to_path_buf(), e))?;
        let conn = Connection::open(directory.join(DATABASE_NAME))?;
        log::debug!("opened persistent cache in {}", directory.display());
        Self::initialize(conn)
    }

    /// Open a store that lives only as long as the returned value.
    pub fn open_in_memory() -> Result<Self, CacheError> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(mut conn: Connection) -> Result<Self, CacheError> {
        conn.pragma_update_and_check(None, "journal_mode", "wal", |row| {
            row.get::<_, String>(0)
        })?;

        let tx = conn.transaction()?;
        tx.execute(
            r#"create table if not exists cache (
            type text not null,
            id blob not null,
            value blob not null,
            primary key (id, type)
        )"#,
            [],
        )?;
        tx.commit()?;

        Ok(PersistentStore {
            conn: Mutex::new(conn),
        })
    }

    fn key(stage: ShaderStage, source: &str) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(stage.short_name().as_bytes());
        hasher.update(&[0]);
        hasher.update(source.as_bytes());
        hasher.finalize()
    }

    fn get_blob(&self, index: &str, key: &[u8]) -> Result<Option<Vec<u8>>, CacheError> {
        let conn = self.conn.lock();
        let value = conn
            .query_row(
                "select value from cache where (type = (?1) and id = (?2))",
                params![index, key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_blob(&self, index: &str, key: &[u8], value: &[u8]) -> Result<(), CacheError> {
        let conn = self.conn.lock();
        conn.execute(
            "insert or replace into cache (type, id, value) values (?1, ?2, ?3)",
            params![index, key, value],
        )?;
        Ok(())
    }

    /// Look up the binary compiled from `source` for `stage`.
    ///
    /// Blobs whose length is not a whole number of words are treated as missing.
    pub fn get_binary(&self, stage: ShaderStage, source: &str) -> Result<Option<Vec<u32>>, CacheError> {
        let key = Self::key(stage, source);
        let Some(blob) = self.get_blob(BINARY_INDEX, key.as_bytes())? else {
            return Ok(None);
        };

        if blob.len() % 4 != 0 {
            log::warn!("discarding corrupt cached binary for {stage}");
            return Ok(None);
        }

        Ok(Some(
            blob.chunks_exact(4)
                .map(|word| u32::from_le_bytes([word[0], word[1], word[2], word[3]]))
                .collect(),
        ))
    }

    /// Store the binary compiled from `source` for `stage`.
    pub fn set_binary(&self, stage: ShaderStage, source: &str, binary: &[u32]) -> Result<(), CacheError> {
        let key = Self::key(stage, source);
        let blob: Vec<u8> = binary.iter().flat_map(|word| word.to_le_bytes()).collect();
        self.set_blob(BINARY_INDEX, key.as_bytes(), &blob)
    }
}
