//! This crate implements the shaderforge source cache.
//!
//! The [`SourceCache`] is the single source of truth for every artifact derived from a shader
//! stage: the body text, the generated full source, the compiled binary, the last known
//! modification time of the body file, and the lazily produced disassembly. Entries are keyed by
//! [`ShaderStageIdentity`](shaderforge_common::ShaderStageIdentity) and are invalidated as one
//! group.
//!
//! Compiled binaries can additionally be persisted across processes in a content-addressed
//! [`PersistentStore`].
pub mod cache;
pub mod error;
pub mod fs;
pub mod persistent;

mod batch;

pub use batch::{CacheBatch, CacheOp};
pub use cache::{CacheEntry, CacheOptions, SourceCache};
pub use error::CacheError;
pub use persistent::PersistentStore;
