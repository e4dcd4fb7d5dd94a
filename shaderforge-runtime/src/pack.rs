use crate::error::StageError;
use crate::processor::{CompiledStage, StageProcessor};
use crate::shader::Shader;
use rayon::prelude::*;
use shaderforge_cache::{CacheOptions, SourceCache};
use shaderforge_catalog::{ResourceCatalog, ShaderGroup, StageSource};
use shaderforge_common::{ErrorKind, ErrorSession, ShaderStage, ShaderStageIdentity};
use shaderforge_preprocess::GeneratorOptions;
use shaderforge_reflect::{ReflectContext, ShaderCompiler};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Options for a [`ShaderPack`].
#[derive(Debug, Clone)]
pub struct PackOptions {
    pub generator: GeneratorOptions,
    pub cache: CacheOptions,
    /// Generate and compile the stages of a shader concurrently.
    pub parallel: bool,
    /// Search paths for `#include "..."` directives.
    pub include_paths: Vec<PathBuf>,
}

impl Default for PackOptions {
    fn default() -> Self {
        PackOptions {
            generator: GeneratorOptions::default(),
            cache: CacheOptions::default(),
            parallel: true,
            include_paths: Vec::new(),
        }
    }
}

impl PackOptions {
    /// Read generator and cache options from the environment.
    pub fn from_env() -> Self {
        PackOptions {
            generator: GeneratorOptions::from_env(),
            cache: CacheOptions::from_env(),
            ..Default::default()
        }
    }
}

/// A processed shader: its collated tables, the artifacts of every stage that succeeded, and the
/// errors reported on the way.
#[derive(Debug)]
pub struct ProcessedShader {
    pub shader: Shader,
    /// The stages that were folded into `shader`, in declaration order.
    pub stages: Vec<CompiledStage>,
    pub errors: ErrorSession,
}

impl ProcessedShader {
    pub fn stage(&self, stage: ShaderStage) -> Option<&CompiledStage> {
        self.stages.iter().find(|s| s.identity.stage() == stage)
    }
}

/// Drives generation, compilation and collation of the shaders of a catalog.
pub struct ShaderPack {
    catalog: ResourceCatalog,
    cache: SourceCache,
    compiler: Box<dyn ShaderCompiler>,
    options: PackOptions,
}

impl ShaderPack {
    /// Create a pack, opening the source cache described by `options.cache`.
    pub fn new(
        catalog: ResourceCatalog,
        compiler: impl ShaderCompiler + 'static,
        options: PackOptions,
    ) -> Result<Self, StageError> {
        let cache = SourceCache::with_options(&options.cache)?;
        Ok(Self::with_cache(catalog, compiler, options, cache))
    }

    /// Create a pack around an existing source cache.
    pub fn with_cache(
        catalog: ResourceCatalog,
        compiler: impl ShaderCompiler + 'static,
        options: PackOptions,
        cache: SourceCache,
    ) -> Self {
        ShaderPack {
            catalog,
            cache,
            compiler: Box::new(compiler),
            options,
        }
    }

    /// Load the catalog document at `path` and create a pack for it.
    pub fn load(
        path: impl AsRef<Path>,
        compiler: impl ShaderCompiler + 'static,
        options: PackOptions,
    ) -> Result<Self, StageError> {
        let catalog = ResourceCatalog::load(path)?;
        Self::new(catalog, compiler, options)
    }

    pub fn catalog(&self) -> &ResourceCatalog {
        &self.catalog
    }

    pub fn cache(&self) -> &SourceCache {
        &self.cache
    }

    pub fn options(&self) -> &PackOptions {
        &self.options
    }

    pub fn processor(&self) -> StageProcessor<'_> {
        StageProcessor::new(
            &self.catalog,
            &self.cache,
            self.compiler.as_ref(),
            &self.options,
        )
    }

    fn run_stages(
        &self,
        group: &ShaderGroup,
    ) -> Vec<(Option<CompiledStage>, ErrorSession)> {
        let processor = self.processor();
        let run = |stage: &StageSource| {
            let mut errors = ErrorSession::new();
            let compiled = errors.check(processor.process(group, stage));
            (compiled, errors)
        };

        if self.options.parallel {
            group.stages.par_iter().map(run).collect()
        } else {
            group.stages.iter().map(run).collect()
        }
    }

    /// Generate, compile and collate every stage of the shader group `name`.
    ///
    /// A stage that fails is reported in the returned session and left out of the tables, while
    /// its siblings are still collated. Errors that must stop the pipeline are returned as
    /// [`StageError::Aborted`].
    pub fn process(&self, name: &str) -> Result<ProcessedShader, StageError> {
        let group = self
            .catalog
            .shader_group(name)
            .ok_or_else(|| StageError::StageNotFound(name.to_string()))?;

        let results = self.run_stages(group);

        let mut shader = Shader::for_group(group);
        let mut errors = ErrorSession::new();
        let mut stages = Vec::new();

        for (source, (compiled, session)) in group.stages.iter().zip(results) {
            errors.merge(session);
            let identity = ShaderStageIdentity::new(&group.name, source.stage);

            let Some(compiled) = compiled else {
                log::warn!("withholding {identity}: generation or compilation failed");
                errors.report_kind(
                    ErrorKind::StageWithheld,
                    format!("{identity} was withheld"),
                );
                continue;
            };

            let context = ReflectContext {
                catalog: &self.catalog,
                shader: &group.name,
                resource_groups: &compiled.resource_groups,
            };
            match shader.parse_binary(identity, &compiled.binary, context) {
                Ok(()) => stages.push(compiled),
                Err(error) => {
                    log::warn!("withholding {identity}: {error}");
                    errors.report(&error);
                    errors.report_kind(
                        ErrorKind::StageWithheld,
                        format!("{identity} was withheld"),
                    );
                }
            }
        }

        if let Some(diagnostic) = errors.first_fatal() {
            return Err(StageError::Aborted {
                shader: group.name.clone(),
                diagnostic: diagnostic.clone(),
            });
        }

        Ok(ProcessedShader {
            shader,
            stages,
            errors,
        })
    }

    /// Process every shader group of the catalog, in catalog order.
    pub fn process_all(&self) -> Result<Vec<ProcessedShader>, StageError> {
        self.catalog
            .shader_groups()
            .iter()
            .map(|group| self.process(&group.name))
            .collect()
    }

    /// The cached full source of `stage` of the shader group `name`.
    pub fn full_source(&self, name: &str, stage: ShaderStage) -> Option<Arc<str>> {
        self.cache
            .find_full_source(&ShaderStageIdentity::new(name, stage))
    }

    /// The cached binary of `stage` of the shader group `name`.
    pub fn binary(&self, name: &str, stage: ShaderStage) -> Option<Arc<[u32]>> {
        self.cache.find_binary(&ShaderStageIdentity::new(name, stage))
    }

    /// The text form of the cached binary of `stage` of the shader group `name`.
    pub fn disassembly(&self, name: &str, stage: ShaderStage) -> Result<Arc<str>, StageError> {
        self.processor()
            .disassemble(ShaderStageIdentity::new(name, stage))
    }
}
