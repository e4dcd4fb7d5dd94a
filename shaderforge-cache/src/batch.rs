use shaderforge_common::ShaderStageIdentity;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

/// One write or erase operation of a [`CacheBatch`].
#[derive(Debug, Clone)]
pub enum CacheOp {
    /// Register the body file path of a stage, creating its entry if needed.
    SetBodyPath(ShaderStageIdentity, PathBuf),
    /// Store the body text. Requires a registered body path.
    SetBody(ShaderStageIdentity, Arc<str>),
    /// Store the generated full source along with the resource groups and the number of
    /// specialization constants it declares. Requires a stored body.
    SetFullSource {
        identity: ShaderStageIdentity,
        source: Arc<str>,
        resource_groups: Arc<[String]>,
    },
    /// Store the compiled binary. Requires a stored full source.
    SetBinary(ShaderStageIdentity, Arc<[u32]>),
    /// Store the last known modification time of the body file.
    SetModified(ShaderStageIdentity, SystemTime),
    /// Store the disassembled text of the binary. Requires a stored binary.
    SetDisassembly(ShaderStageIdentity, Arc<str>),
    /// Drop the body, full source, binary, timestamp and disassembly together, keeping the
    /// registered body path.
    Invalidate(ShaderStageIdentity),
    /// Remove the entry entirely.
    Erase(ShaderStageIdentity),
}

impl CacheOp {
    pub fn identity(&self) -> ShaderStageIdentity {
        match self {
            CacheOp::SetBodyPath(id, _)
            | CacheOp::SetBody(id, _)
            | CacheOp::SetBinary(id, _)
            | CacheOp::SetModified(id, _)
            | CacheOp::SetDisassembly(id, _)
            | CacheOp::Invalidate(id)
            | CacheOp::Erase(id) => *id,
            CacheOp::SetFullSource { identity, .. } => *identity,
        }
    }
}

/// An ordered list of cache operations that is applied atomically.
///
/// Either every operation of the batch is applied, or the batch fails at its first invalid step
/// and the cache is left unchanged.
#[derive(Debug, Clone, Default)]
pub struct CacheBatch {
    pub(crate) ops: Vec<CacheOp>,
}

impl CacheBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: CacheOp) -> &mut Self {
        self.ops.push(op);
        self
    }

    pub fn set_body_path(mut self, identity: ShaderStageIdentity, path: impl Into<PathBuf>) -> Self {
        self.ops.push(CacheOp::SetBodyPath(identity, path.into()));
        self
    }

    pub fn set_body(mut self, identity: ShaderStageIdentity, body: impl Into<Arc<str>>) -> Self {
        self.ops.push(CacheOp::SetBody(identity, body.into()));
        self
    }

    pub fn set_full_source(
        mut self,
        identity: ShaderStageIdentity,
        source: impl Into<Arc<str>>,
        resource_groups: Vec<String>,
    ) -> Self {
        self.ops.push(CacheOp::SetFullSource {
            identity,
            source: source.into(),
            resource_groups: resource_groups.into(),
        });
        self
    }

    pub fn set_binary(mut self, identity: ShaderStageIdentity, binary: impl Into<Arc<[u32]>>) -> Self {
        self.ops.push(CacheOp::SetBinary(identity, binary.into()));
        self
    }

    pub fn set_modified(mut self, identity: ShaderStageIdentity, modified: SystemTime) -> Self {
        self.ops.push(CacheOp::SetModified(identity, modified));
        self
    }

    pub fn set_disassembly(
        mut self,
        identity: ShaderStageIdentity,
        text: impl Into<Arc<str>>,
    ) -> Self {
        self.ops.push(CacheOp::SetDisassembly(identity, text.into()));
        self
    }

    pub fn invalidate(mut self, identity: ShaderStageIdentity) -> Self {
        self.ops.push(CacheOp::Invalidate(identity));
        self
    }

    pub fn erase(mut self, identity: ShaderStageIdentity) -> Self {
        self.ops.push(CacheOp::Erase(identity));
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
