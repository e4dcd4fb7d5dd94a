use crate::catalog::{
    InterfaceVariable, ResourceCatalog, ResourceGroup, ShaderGroup, ShaderResource, StageSource,
};
use crate::error::CatalogError;
use serde::Deserialize;
use shaderforge_common::{DescriptorKind, Format, ImageDimension, ShaderStage};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogDocument {
    shader_groups: Option<Vec<ShaderGroupDocument>>,
    resource_groups: Option<Vec<ResourceGroupDocument>>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ShaderGroupDocument {
    name: String,
    stages: Vec<StageDocument>,
    #[serde(default)]
    extensions: Vec<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    vertex_inputs: Vec<InterfaceVariable>,
    #[serde(default)]
    varyings: Vec<InterfaceVariable>,
    #[serde(default)]
    fragment_outputs: Vec<InterfaceVariable>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct StageDocument {
    stage: String,
    body: PathBuf,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ResourceGroupDocument {
    name: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    resources: Vec<ResourceDocument>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ResourceDocument {
    name: String,
    kind: String,
    #[serde(default)]
    binding: u32,
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    dimension: Option<String>,
    #[serde(default)]
    array_size: Option<u32>,
    #[serde(default)]
    unbounded: bool,
    #[serde(default)]
    qualifiers: String,
    #[serde(default)]
    shader_qualifiers: BTreeMap<String, String>,
    #[serde(default)]
    layout: String,
    #[serde(default)]
    attachment_index: u32,
    #[serde(default)]
    tags: Vec<String>,
}

fn invalid(owner: &str, field: &'static str, value: &str) -> CatalogError {
    CatalogError::InvalidValue {
        owner: owner.to_string(),
        field,
        value: value.to_string(),
    }
}

impl ResourceDocument {
    fn resolve(self, group: &str) -> Result<ShaderResource, CatalogError> {
        let owner = format!("{group}.{}", self.name);
        let kind =
            DescriptorKind::from_str(&self.kind).map_err(|_| invalid(&owner, "kind", &self.kind))?;
        let format = match &self.format {
            Some(format) => {
                Format::from_str(format).map_err(|_| invalid(&owner, "format", format))?
            }
            None => Format::Unknown,
        };
        let dimension = match &self.dimension {
            Some(dimension) => ImageDimension::from_str(dimension)
                .map_err(|_| invalid(&owner, "dimension", dimension))?,
            None => ImageDimension::default(),
        };

        let (is_array, array_size) = match (self.unbounded, self.array_size) {
            (true, None) => (true, 0),
            (true, Some(size)) => {
                return Err(invalid(&owner, "array_size", &size.to_string()));
            }
            (false, Some(0)) => return Err(invalid(&owner, "array_size", "0")),
            (false, Some(size)) => (true, size),
            (false, None) => (false, 0),
        };

        Ok(ShaderResource {
            name: self.name,
            kind,
            binding: self.binding,
            group: group.to_string(),
            format,
            dimension,
            is_array,
            array_size,
            qualifiers: self.qualifiers,
            shader_qualifiers: self.shader_qualifiers,
            layout: self.layout,
            attachment_index: self.attachment_index,
            tags: self.tags,
        })
    }
}

impl ShaderGroupDocument {
    fn resolve(self, root: &Path) -> Result<ShaderGroup, CatalogError> {
        let stages = self
            .stages
            .into_iter()
            .map(|stage| {
                let kind = ShaderStage::from_str(&stage.stage)
                    .map_err(|_| invalid(&self.name, "stage", &stage.stage))?;
                Ok(StageSource {
                    stage: kind,
                    body: root.join(stage.body),
                })
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;

        Ok(ShaderGroup {
            name: self.name,
            stages,
            extensions: self.extensions,
            tags: self.tags,
            vertex_inputs: self.vertex_inputs,
            varyings: self.varyings,
            fragment_outputs: self.fragment_outputs,
        })
    }
}

impl ResourceCatalog {
    /// Load a catalog document from disk.
    ///
    /// Body paths in shader groups are resolved against the directory containing the document.
    pub fn load(path: impl AsRef<Path>) -> Result<ResourceCatalog, CatalogError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::IOError(path.to_path_buf(), e))?;
        let root = path.parent().unwrap_or_else(|| Path::new("."));
        log::debug!("loading resource catalog from {}", path.display());
        Self::from_json_str(&contents, root)
    }

    /// Parse a catalog document, resolving body paths against `root`.
    pub fn from_json_str(
        document: &str,
        root: impl AsRef<Path>,
    ) -> Result<ResourceCatalog, CatalogError> {
        let document: CatalogDocument = serde_json::from_str(document)?;
        let root = root.as_ref();

        let shader_groups = document
            .shader_groups
            .ok_or(CatalogError::MissingSection("shader_groups"))?;
        let resource_groups = document
            .resource_groups
            .ok_or(CatalogError::MissingSection("resource_groups"))?;

        let shader_groups = shader_groups
            .into_iter()
            .map(|group| group.resolve(root))
            .collect::<Result<Vec<_>, _>>()?;

        let resource_groups = resource_groups
            .into_iter()
            .map(|group| {
                let resources = group
                    .resources
                    .into_iter()
                    .map(|resource| resource.resolve(&group.name))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ResourceGroup {
                    name: group.name,
                    resources,
                    tags: group.tags,
                })
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;

        ResourceCatalog::new(shader_groups, resource_groups)
    }
}
