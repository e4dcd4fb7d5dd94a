use crate::fragment::{Fragment, FragmentKind, SourceAssembly};
use crate::include::{IncludeResolver, SourceOutput, GL_GOOGLE_CPP_STYLE_LINE_DIRECTIVE};
use crate::interface::{extract_interface, push_interface};
use crate::options::GeneratorOptions;
use crate::resource_block::{expand_resource_blocks, ResourceBlock};
use crate::spec_const::{extract_spec_constants, SpecConstant};
use crate::PreprocessError;
use shaderforge_cache::{fs, CacheBatch, CacheError, SourceCache};
use shaderforge_catalog::{ResourceCatalog, ShaderGroup};
use shaderforge_common::{ShaderStage, ShaderStageIdentity};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The result of assembling one stage source.
#[derive(Debug, Clone)]
pub struct GeneratedSource {
    pub text: String,
    /// The fragments the text was assembled from, in emission order.
    pub fragments: Vec<Fragment>,
    pub resource_blocks: Vec<ResourceBlock>,
    pub spec_constants: Vec<SpecConstant>,
}

impl GeneratedSource {
    /// The names of the resource groups used, indexed by descriptor set.
    pub fn resource_groups(&self) -> Vec<String> {
        self.resource_blocks
            .iter()
            .map(|block| block.group.clone())
            .collect()
    }
}

/// Generates complete stage sources from body files and the resource catalog.
pub struct Generator<'a> {
    catalog: &'a ResourceCatalog,
    cache: &'a SourceCache,
    options: &'a GeneratorOptions,
}

fn missing_body(path: &Path) -> impl FnOnce(CacheError) -> PreprocessError + '_ {
    move |error| match error {
        CacheError::PathMissing(_) => PreprocessError::MissingBody(path.to_path_buf()),
        error => PreprocessError::Cache(error),
    }
}

/// Split a leading `#version` line off the source, leaving an empty line in its place.
fn take_version(source: &str) -> (Option<String>, String) {
    let mut version = None;
    let mut output = String::with_capacity(source.len());
    let mut seen_code = false;
    for line in source.lines() {
        let trimmed = line.trim();
        if !seen_code && version.is_none() && trimmed.starts_with("#version") {
            version = Some(trimmed.to_string());
            output.push('\n');
            continue;
        }
        if !trimmed.is_empty() && !trimmed.starts_with("//") && !trimmed.starts_with("#line") {
            seen_code = true;
        }
        output.push_line(line);
    }
    (version, output)
}

impl<'a> Generator<'a> {
    pub fn new(
        catalog: &'a ResourceCatalog,
        cache: &'a SourceCache,
        options: &'a GeneratorOptions,
    ) -> Self {
        Generator {
            catalog,
            cache,
            options,
        }
    }

    /// Generate the full source of the stage `identity` of `shader` from the body at `body_path`.
    ///
    /// The source is cached under `identity`. Cached text is returned as long as the body file has
    /// not been modified since it was generated; otherwise every cached artifact of `identity` is
    /// invalidated and the source is regenerated. Nothing is cached when generation fails.
    pub fn generate(
        &self,
        identity: ShaderStageIdentity,
        shader: &ShaderGroup,
        body_path: &Path,
        extensions: &[String],
        include_paths: &[PathBuf],
    ) -> Result<Arc<str>, PreprocessError> {
        let modified = fs::modification_time(body_path).map_err(missing_body(body_path))?;
        self.cache.add_body_path(identity, body_path);

        if !self.cache.is_stale(&identity, modified) {
            if let Some(source) = self.cache.find_full_source(&identity) {
                log::debug!("using cached source of {identity}");
                return Ok(source);
            }
        }

        if self.cache.find_full_source(&identity).is_some() {
            log::debug!("{} changed, regenerating {identity}", body_path.display());
        }
        self.cache.invalidate(&identity);

        let body = fs::read_text(body_path).map_err(missing_body(body_path))?;
        let generated = self.assemble(
            shader,
            identity.stage(),
            body_path,
            &body,
            extensions,
            include_paths,
        )?;

        let source: Arc<str> = Arc::from(generated.text.as_str());
        self.cache.apply(
            CacheBatch::new()
                .set_body_path(identity, body_path)
                .set_body(identity, body)
                .set_full_source(identity, Arc::clone(&source), generated.resource_groups())
                .set_modified(identity, modified),
        )?;

        Ok(source)
    }

    /// Assemble the full source of one stage without consulting the cache.
    pub fn assemble(
        &self,
        shader: &ShaderGroup,
        stage: ShaderStage,
        body_path: &Path,
        body: &str,
        extensions: &[String],
        include_paths: &[PathBuf],
    ) -> Result<GeneratedSource, PreprocessError> {
        let resolver = IncludeResolver {
            search_paths: include_paths,
            library_root: self.options.library_root.as_deref(),
            line_directives: self.options.line_directives,
        };

        let source = resolver.expand(body, body_path)?;
        let (version, source) = take_version(&source);
        let (source, interface) = extract_interface(&source)?;
        // Every generation starts from an invalidated entry, so no ids are allocated yet.
        let (source, spec_constants) = extract_spec_constants(&source, 0)?;
        let (source, resource_blocks) =
            expand_resource_blocks(&source, self.catalog, &shader.name, 0)?;

        let mut assembly = SourceAssembly::default();
        assembly.push(
            FragmentKind::Version,
            version.unwrap_or_else(|| format!("#version {}", self.options.default_version)),
        );

        let mut enabled: Vec<&str> = Vec::new();
        let requested = self
            .options
            .default_extensions
            .iter()
            .chain(&shader.extensions)
            .chain(extensions)
            .map(String::as_str)
            .chain(
                self.options
                    .line_directives
                    .then_some(GL_GOOGLE_CPP_STYLE_LINE_DIRECTIVE),
            );
        for extension in requested {
            if !enabled.contains(&extension) {
                enabled.push(extension);
                assembly.push(
                    FragmentKind::Extension,
                    format!("#extension {extension} : require"),
                );
            }
        }

        push_interface(&mut assembly, shader, stage, &interface);

        for constant in &spec_constants {
            assembly.push(FragmentKind::SpecConstant, constant.declaration());
        }
        for block in &resource_blocks {
            assembly.push(FragmentKind::ResourceBlock, block.text.as_str());
        }

        let body = source.trim_end();
        if self.options.line_directives {
            let name = body_path
                .file_name()
                .and_then(|f| f.to_str())
                .unwrap_or("");
            assembly.push(FragmentKind::Body, format!("#line 1 \"{name}\"\n{body}"));
        } else {
            assembly.push(FragmentKind::Body, body);
        }

        let fragments = {
            let mut fragments = assembly.fragments().to_vec();
            fragments.sort_by_key(|fragment| fragment.kind);
            fragments
        };

        Ok(GeneratedSource {
            text: assembly.assemble(),
            fragments,
            resource_blocks,
            spec_constants,
        })
    }
}
