use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use shaderforge_common::{DescriptorKind, FastHashMap, Format, ImageDimension, ShaderStage};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// A stable key for a resource in the catalog.
///
/// Keys name the resource instead of pointing into catalog storage, so usage records that hold
/// a key stay meaningful after the catalog is reloaded.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceKey {
    pub group: String,
    pub name: String,
}

impl ResourceKey {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        ResourceKey {
            group: group.into(),
            name: name.into(),
        }
    }
}

impl Display for ResourceKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.group, self.name)
    }
}

/// A named resource in a resource group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaderResource {
    /// The name of the resource. Generated declarations use it as the instance name.
    pub name: String,
    /// The descriptor kind.
    pub kind: DescriptorKind,
    /// The binding index within the descriptor set the owning group is placed in.
    pub binding: u32,
    /// The name of the resource group the resource belongs to.
    pub group: String,
    /// The data format of images and texel buffers.
    pub format: Format,
    /// The dimensionality of images.
    pub dimension: ImageDimension,
    /// Whether the resource is declared as an array.
    pub is_array: bool,
    /// The declared array size. An array resource with size 0 is unbounded.
    pub array_size: u32,
    /// GLSL memory qualifiers applied in every consuming shader, e.g. `readonly`.
    pub qualifiers: String,
    /// GLSL memory qualifiers applied only in the named consuming shader group.
    pub shader_qualifiers: BTreeMap<String, String>,
    /// The free-text member layout of buffer blocks.
    pub layout: String,
    /// The input attachment index of subpass inputs.
    pub attachment_index: u32,
    pub tags: Vec<String>,
}

impl ShaderResource {
    /// Create a resource with the given kind and binding and default properties.
    pub fn new(name: impl Into<String>, kind: DescriptorKind, binding: u32) -> Self {
        ShaderResource {
            name: name.into(),
            kind,
            binding,
            group: String::new(),
            format: Format::Unknown,
            dimension: ImageDimension::default(),
            is_array: false,
            array_size: 0,
            qualifiers: String::new(),
            shader_qualifiers: BTreeMap::new(),
            layout: String::new(),
            attachment_index: 0,
            tags: Vec::new(),
        }
    }

    /// The key of this resource.
    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(&self.group, &self.name)
    }

    /// Whether the resource is an unbounded array.
    pub fn is_unbounded(&self) -> bool {
        self.is_array && self.array_size == 0
    }

    /// The number of descriptors the resource occupies. Unbounded arrays report 0.
    pub fn descriptor_count(&self) -> u32 {
        if self.is_array {
            self.array_size
        } else {
            1
        }
    }

    /// The qualifiers that apply when the resource is consumed by `shader`.
    pub fn qualifiers_for(&self, shader: &str) -> String {
        match self.shader_qualifiers.get(shader) {
            Some(extra) if !self.qualifiers.is_empty() => format!("{} {}", self.qualifiers, extra),
            Some(extra) => extra.clone(),
            None => self.qualifiers.clone(),
        }
    }
}

/// A named, ordered group of resources that is expanded as one descriptor set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceGroup {
    pub name: String,
    pub resources: Vec<ShaderResource>,
    pub tags: Vec<String>,
}

impl ResourceGroup {
    pub fn new(name: impl Into<String>, resources: Vec<ShaderResource>) -> Self {
        let name = name.into();
        let resources = resources
            .into_iter()
            .map(|mut resource| {
                resource.group = name.clone();
                resource
            })
            .collect();
        ResourceGroup {
            name,
            resources,
            tags: Vec::new(),
        }
    }

    /// Find a resource of this group by name.
    pub fn resource(&self, name: &str) -> Option<&ShaderResource> {
        self.resources.iter().find(|r| r.name == name)
    }
}

/// A variable of the default stage interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceVariable {
    pub name: String,
    /// The GLSL type of the variable, e.g. `vec3`.
    #[serde(rename = "type")]
    pub ty: String,
}

impl InterfaceVariable {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        InterfaceVariable {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

/// One stage of a shader group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSource {
    pub stage: ShaderStage,
    /// The path of the body file.
    pub body: PathBuf,
}

/// A multi-stage shader: its stages, language extensions and default interface.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShaderGroup {
    pub name: String,
    /// The stages, in declaration order.
    pub stages: Vec<StageSource>,
    /// Language extensions enabled in every stage.
    pub extensions: Vec<String>,
    pub tags: Vec<String>,
    pub vertex_inputs: Vec<InterfaceVariable>,
    pub varyings: Vec<InterfaceVariable>,
    pub fragment_outputs: Vec<InterfaceVariable>,
}

impl ShaderGroup {
    pub fn new(name: impl Into<String>) -> Self {
        ShaderGroup {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a stage built from the given body file.
    pub fn with_stage(mut self, stage: ShaderStage, body: impl Into<PathBuf>) -> Self {
        self.stages.push(StageSource {
            stage,
            body: body.into(),
        });
        self
    }

    /// The default input interface of `stage`.
    pub fn default_inputs(&self, stage: ShaderStage) -> &[InterfaceVariable] {
        if stage == ShaderStage::VERTEX {
            &self.vertex_inputs
        } else if stage == ShaderStage::COMPUTE || stage == ShaderStage::TASK {
            &[]
        } else {
            &self.varyings
        }
    }

    /// The default output interface of `stage`.
    pub fn default_outputs(&self, stage: ShaderStage) -> &[InterfaceVariable] {
        if stage == ShaderStage::FRAGMENT {
            &self.fragment_outputs
        } else if stage == ShaderStage::COMPUTE || stage == ShaderStage::TASK {
            &[]
        } else {
            &self.varyings
        }
    }
}

/// The resource catalog.
///
/// The catalog is read-only once built. Resources are addressed by [`ResourceKey`].
#[derive(Debug, Clone, Default)]
pub struct ResourceCatalog {
    shader_groups: Vec<ShaderGroup>,
    resource_groups: Vec<ResourceGroup>,
    group_index: FastHashMap<String, usize>,
}

impl ResourceCatalog {
    /// Build a catalog from shader and resource groups, validating names and bindings.
    pub fn new(
        shader_groups: Vec<ShaderGroup>,
        resource_groups: Vec<ResourceGroup>,
    ) -> Result<Self, CatalogError> {
        let mut group_index = FastHashMap::default();
        for (index, group) in resource_groups.iter().enumerate() {
            if group_index.insert(group.name.clone(), index).is_some() {
                return Err(CatalogError::DuplicateName {
                    what: "resource group",
                    name: group.name.clone(),
                });
            }
            validate_group(group)?;
        }

        let mut shader_names = FastHashMap::default();
        for group in &shader_groups {
            if shader_names.insert(group.name.as_str(), ()).is_some() {
                return Err(CatalogError::DuplicateName {
                    what: "shader group",
                    name: group.name.clone(),
                });
            }
            let mut stages = ShaderStage::empty();
            for stage in &group.stages {
                if !stage.stage.is_single() || stages.contains(stage.stage) {
                    return Err(CatalogError::InvalidValue {
                        owner: group.name.clone(),
                        field: "stage",
                        value: stage.stage.to_string(),
                    });
                }
                stages |= stage.stage;
            }
        }

        Ok(ResourceCatalog {
            shader_groups,
            resource_groups,
            group_index,
        })
    }

    pub fn shader_groups(&self) -> &[ShaderGroup] {
        &self.shader_groups
    }

    pub fn shader_group(&self, name: &str) -> Option<&ShaderGroup> {
        self.shader_groups.iter().find(|g| g.name == name)
    }

    /// The resource groups, in catalog order.
    pub fn resource_groups(&self) -> &[ResourceGroup] {
        &self.resource_groups
    }

    pub fn resource_group(&self, name: &str) -> Option<&ResourceGroup> {
        self.group_index
            .get(name)
            .and_then(|&index| self.resource_groups.get(index))
    }

    /// Resolve a resource key.
    pub fn resource(&self, key: &ResourceKey) -> Option<&ShaderResource> {
        self.resource_group(&key.group)
            .and_then(|group| group.resource(&key.name))
    }

    /// Find the resource named `name` in the first of `groups` that declares it.
    pub fn find_resource<'a, S: AsRef<str>>(
        &'a self,
        groups: &[S],
        name: &str,
    ) -> Option<&'a ShaderResource> {
        groups
            .iter()
            .filter_map(|group| self.resource_group(group.as_ref()))
            .find_map(|group| group.resource(name))
    }
}

fn validate_group(group: &ResourceGroup) -> Result<(), CatalogError> {
    let mut names: FastHashMap<&str, ()> = FastHashMap::default();
    let mut bindings: FastHashMap<u32, &str> = FastHashMap::default();
    for resource in &group.resources {
        if names.insert(resource.name.as_str(), ()).is_some() {
            return Err(CatalogError::DuplicateName {
                what: "resource",
                name: format!("{}.{}", group.name, resource.name),
            });
        }
        if !resource.kind.is_descriptor() {
            continue;
        }
        if let Some(first) = bindings.insert(resource.binding, resource.name.as_str()) {
            return Err(CatalogError::DuplicateBinding {
                group: group.name.clone(),
                binding: resource.binding,
                first: first.to_string(),
                second: resource.name.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn lighting() -> ResourceGroup {
        ResourceGroup::new(
            "Lighting",
            vec![
                ShaderResource::new("lights", DescriptorKind::UniformBuffer, 2),
                ShaderResource::new("shadow_map", DescriptorKind::CombinedImageSampler, 3),
            ],
        )
    }

    #[test]
    fn resolves_resources_by_key() {
        let catalog = ResourceCatalog::new(vec![], vec![lighting()]).unwrap();
        let key = ResourceKey::new("Lighting", "shadow_map");
        let resource = catalog.resource(&key).unwrap();
        assert_eq!(3, resource.binding);
        assert_eq!(key, resource.key());
        assert!(catalog.resource(&ResourceKey::new("Lighting", "nope")).is_none());
    }

    #[test]
    fn rejects_duplicate_bindings() {
        let group = ResourceGroup::new(
            "Broken",
            vec![
                ShaderResource::new("a", DescriptorKind::UniformBuffer, 0),
                ShaderResource::new("b", DescriptorKind::StorageBuffer, 0),
            ],
        );
        assert!(matches!(
            ResourceCatalog::new(vec![], vec![group]),
            Err(CatalogError::DuplicateBinding { binding: 0, .. })
        ));
    }

    #[test]
    fn shader_qualifiers_extend_plain_qualifiers() {
        let mut resource = ShaderResource::new("particles", DescriptorKind::StorageBuffer, 0);
        resource.qualifiers = "restrict".into();
        resource
            .shader_qualifiers
            .insert("draw".into(), "readonly".into());
        assert_eq!("restrict readonly", resource.qualifiers_for("draw"));
        assert_eq!("restrict", resource.qualifiers_for("simulate"));
    }
}
