use crate::error::CompileError;
use crate::front::ShaderCompiler;
use shaderc::{CompileOptions, EnvVersion, ShaderKind, SourceLanguage, TargetEnv};
use shaderforge_common::{ShaderStage, ShaderStageIdentity};

/// Compiles GLSL to SPIR-V with shaderc (glslang).
#[derive(Debug, Default, Clone)]
pub struct ShadercCompiler {
    /// Emit debug information such as names into the binary.
    pub debug_info: bool,
}

fn get_shaderc_options(debug_info: bool) -> Result<CompileOptions<'static>, CompileError> {
    let mut options = CompileOptions::new().ok_or(CompileError::Init)?;
    options.set_include_callback(|_, _, _, _| {
        Err("includes must already be resolved by the generator".into())
    });
    options.set_source_language(SourceLanguage::GLSL);
    options.set_target_env(TargetEnv::Vulkan, EnvVersion::Vulkan1_2 as u32);
    if debug_info {
        options.set_generate_debug_info();
    }
    Ok(options)
}

fn shader_kind(stage: ShaderStage) -> ShaderKind {
    if stage == ShaderStage::VERTEX {
        ShaderKind::Vertex
    } else if stage == ShaderStage::FRAGMENT {
        ShaderKind::Fragment
    } else if stage == ShaderStage::COMPUTE {
        ShaderKind::Compute
    } else if stage == ShaderStage::GEOMETRY {
        ShaderKind::Geometry
    } else if stage == ShaderStage::TESSELLATION_CONTROL {
        ShaderKind::TessControl
    } else if stage == ShaderStage::TESSELLATION_EVALUATION {
        ShaderKind::TessEvaluation
    } else {
        ShaderKind::InferFromSource
    }
}

impl ShaderCompiler for ShadercCompiler {
    fn compile(
        &self,
        identity: ShaderStageIdentity,
        stage: ShaderStage,
        source: &str,
    ) -> Result<Vec<u32>, CompileError> {
        let compiler = shaderc::Compiler::new().ok_or(CompileError::Init)?;
        let options = get_shaderc_options(self.debug_info)?;
        let name = identity.to_string();

        let artifact = compiler.compile_into_spirv(
            source,
            shader_kind(stage),
            &name,
            "main",
            Some(&options),
        )?;

        if artifact.get_num_warnings() > 0 {
            log::warn!("{name}: {}", artifact.get_warning_messages());
        }
        Ok(artifact.as_binary().to_vec())
    }
}
