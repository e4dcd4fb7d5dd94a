use crate::error::CompileError;
use shaderforge_common::{ShaderStage, ShaderStageIdentity};

#[cfg(feature = "shaderc")]
pub mod shaderc;

/// A compiler from generated stage source to SPIR-V.
pub trait ShaderCompiler: Send + Sync {
    /// Compile the full source of the stage `identity` into SPIR-V words.
    fn compile(
        &self,
        identity: ShaderStageIdentity,
        stage: ShaderStage,
        source: &str,
    ) -> Result<Vec<u32>, CompileError>;

    /// Translate a compiled binary back into source text, for diagnostics.
    fn recompile_to_text(&self, _stage: ShaderStage, _binary: &[u32]) -> Result<String, CompileError> {
        Err(CompileError::RecompileUnsupported)
    }
}
