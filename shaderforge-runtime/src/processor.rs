use crate::error::StageError;
use crate::pack::PackOptions;
use shaderforge_cache::{CacheBatch, SourceCache};
use shaderforge_catalog::{ResourceCatalog, ShaderGroup, StageSource};
use shaderforge_common::ShaderStageIdentity;
use shaderforge_preprocess::Generator;
use shaderforge_reflect::{CompileError, ShaderCompiler};
use std::sync::Arc;

/// The artifacts of one generated and compiled stage.
#[derive(Debug, Clone)]
pub struct CompiledStage {
    pub identity: ShaderStageIdentity,
    pub source: Arc<str>,
    pub binary: Arc<[u32]>,
    /// The resource groups the source used, indexed by descriptor set.
    pub resource_groups: Arc<[String]>,
}

/// Generates and compiles single stages through the source cache.
#[derive(Clone, Copy)]
pub struct StageProcessor<'a> {
    catalog: &'a ResourceCatalog,
    cache: &'a SourceCache,
    compiler: &'a dyn ShaderCompiler,
    options: &'a PackOptions,
}

impl<'a> StageProcessor<'a> {
    pub fn new(
        catalog: &'a ResourceCatalog,
        cache: &'a SourceCache,
        compiler: &'a dyn ShaderCompiler,
        options: &'a PackOptions,
    ) -> Self {
        StageProcessor {
            catalog,
            cache,
            compiler,
            options,
        }
    }

    /// Generate the full source of `stage` of `shader`.
    pub fn generate(
        &self,
        shader: &ShaderGroup,
        stage: &StageSource,
    ) -> Result<(ShaderStageIdentity, Arc<str>), StageError> {
        let identity = ShaderStageIdentity::new(&shader.name, stage.stage);
        let generator = Generator::new(self.catalog, self.cache, &self.options.generator);
        let source = generator.generate(
            identity,
            shader,
            &stage.body,
            &[],
            &self.options.include_paths,
        )?;
        Ok((identity, source))
    }

    /// Compile the generated `source` of `identity`.
    ///
    /// The cached binary is used if present, then the persistent store, and only then the
    /// compiler. Newly compiled binaries are written back to both.
    pub fn compile(
        &self,
        identity: ShaderStageIdentity,
        source: &str,
    ) -> Result<Arc<[u32]>, StageError> {
        if let Some(binary) = self.cache.find_binary(&identity) {
            log::debug!("using cached binary of {identity}");
            return Ok(binary);
        }

        let stage = identity.stage();
        let stored = match self.cache.store() {
            Some(store) => store.get_binary(stage, source)?,
            None => None,
        };

        let binary: Arc<[u32]> = match stored {
            Some(binary) => {
                log::debug!("loaded binary of {identity} from the persistent store");
                binary.into()
            }
            None => {
                log::info!("compiling {identity}");
                let binary = self.compiler.compile(identity, stage, source)?;
                if let Some(store) = self.cache.store() {
                    if let Err(error) = store.set_binary(stage, source, &binary) {
                        log::warn!("could not persist the binary of {identity}: {error}");
                    }
                }
                binary.into()
            }
        };

        self.cache
            .apply(CacheBatch::new().set_binary(identity, Arc::clone(&binary)))?;
        Ok(binary)
    }

    /// Generate and compile `stage` of `shader`.
    pub fn process(
        &self,
        shader: &ShaderGroup,
        stage: &StageSource,
    ) -> Result<CompiledStage, StageError> {
        let (identity, source) = self.generate(shader, stage)?;
        let binary = self.compile(identity, &source)?;
        let resource_groups = self
            .cache
            .find_resource_groups(&identity)
            .unwrap_or_else(|| Arc::from(Vec::new()));

        Ok(CompiledStage {
            identity,
            source,
            binary,
            resource_groups,
        })
    }

    /// The text form of the cached binary of `identity`.
    ///
    /// The compiler's recompiled text is preferred. Compilers that cannot recompile fall back to
    /// a SPIR-V disassembly.
    pub fn disassemble(&self, identity: ShaderStageIdentity) -> Result<Arc<str>, StageError> {
        self.cache
            .find_or_insert_disassembly(&identity, |binary| {
                match self.compiler.recompile_to_text(identity.stage(), binary) {
                    Ok(text) => Ok(text),
                    Err(CompileError::RecompileUnsupported) => {
                        Ok(shaderforge_reflect::disassemble(binary)?)
                    }
                    Err(error) => Err(error.into()),
                }
            })
    }
}
