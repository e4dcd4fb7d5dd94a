use crate::pragma::parse_resource_block;
use crate::PreprocessError;
use shaderforge_catalog::{ResourceCatalog, ShaderResource};
use shaderforge_common::DescriptorKind;

/// The expansion of one `use_resource_block` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceBlock {
    /// The name of the expanded resource group.
    pub group: String,
    /// The descriptor set the group was placed in.
    pub set: u32,
    /// The generated declarations.
    pub text: String,
}

fn members(layout: &str) -> String {
    let mut text = String::new();
    for line in layout.lines().map(str::trim).filter(|l| !l.is_empty()) {
        text.push_str("    ");
        text.push_str(line);
        text.push('\n');
    }
    text
}

fn array_suffix(resource: &ShaderResource) -> String {
    match (resource.is_array, resource.array_size) {
        (false, _) => String::new(),
        (true, 0) => "[]".to_string(),
        (true, size) => format!("[{size}]"),
    }
}

fn qualifier_prefix(qualifiers: &str) -> String {
    if qualifiers.trim().is_empty() {
        String::new()
    } else {
        format!("{} ", qualifiers.trim())
    }
}

/// The GLSL declaration of `resource` in descriptor set `set`, as consumed by `shader`.
pub fn declare_resource(
    resource: &ShaderResource,
    set: u32,
    shader: &str,
) -> Result<String, PreprocessError> {
    let name = &resource.name;
    let binding = format!("set = {set}, binding = {}", resource.binding);
    let array = array_suffix(resource);
    let prefix = resource.format.sampled_prefix();
    let suffix = resource.dimension.glsl_suffix();
    let image_layout = match resource.format.glsl_qualifier() {
        Some(format) => format!("{binding}, {format}"),
        None => binding.clone(),
    };

    Ok(match resource.kind {
        DescriptorKind::UniformBuffer => format!(
            "layout({binding}, std140) uniform {name}_block {{\n{}}} {name}{array};",
            members(&resource.layout)
        ),
        DescriptorKind::StorageBuffer => {
            let qualifiers = qualifier_prefix(&resource.qualifiers_for(shader));
            if resource.is_unbounded() {
                format!(
                    "struct {name}_element {{\n{}}};\nlayout({binding}, std430) {qualifiers}buffer {name}_block {{\n    {name}_element {name}_data[];\n}} {name};",
                    members(&resource.layout)
                )
            } else {
                format!(
                    "layout({binding}, std430) {qualifiers}buffer {name}_block {{\n{}}} {name}{array};",
                    members(&resource.layout)
                )
            }
        }
        DescriptorKind::Sampler => format!("layout({binding}) uniform sampler {name}{array};"),
        DescriptorKind::CombinedImageSampler => {
            format!("layout({binding}) uniform {prefix}sampler{suffix} {name}{array};")
        }
        DescriptorKind::SampledImage => {
            format!("layout({binding}) uniform {prefix}texture{suffix} {name}{array};")
        }
        DescriptorKind::StorageImage => {
            let qualifiers = qualifier_prefix(&resource.qualifiers_for(shader));
            format!("layout({image_layout}) {qualifiers}uniform {prefix}image{suffix} {name}{array};")
        }
        DescriptorKind::UniformTexelBuffer => {
            format!("layout({binding}) uniform {prefix}textureBuffer {name}{array};")
        }
        DescriptorKind::StorageTexelBuffer => {
            let qualifiers = qualifier_prefix(&resource.qualifiers_for(shader));
            format!("layout({image_layout}) {qualifiers}uniform {prefix}imageBuffer {name}{array};")
        }
        DescriptorKind::InputAttachment => format!(
            "layout(input_attachment_index = {}, {binding}) uniform {prefix}subpassInput {name}{array};",
            resource.attachment_index
        ),
        DescriptorKind::PushConstant => format!(
            "layout(push_constant) uniform {name}_block {{\n{}}} {name};",
            members(&resource.layout)
        ),
        kind => {
            return Err(PreprocessError::InvalidDescriptorKind {
                group: resource.group.clone(),
                resource: name.clone(),
                kind,
            })
        }
    })
}

/// Expand every `use_resource_block` directive of `source`.
///
/// Each distinct group is placed in the next unused descriptor set, starting at `first_set`.
/// Directive lines are left empty in the returned body.
pub(crate) fn expand_resource_blocks(
    source: &str,
    catalog: &ResourceCatalog,
    shader: &str,
    first_set: u32,
) -> Result<(String, Vec<ResourceBlock>), PreprocessError> {
    let mut output = String::with_capacity(source.len());
    let mut blocks: Vec<ResourceBlock> = Vec::new();

    for line in source.lines() {
        let Some(name) = parse_resource_block(line)? else {
            output.push_str(line);
            output.push('\n');
            continue;
        };
        output.push('\n');

        if blocks.iter().any(|block| block.group == name) {
            log::debug!("resource group {name} is already used by {shader}");
            continue;
        }

        let group = catalog
            .resource_group(name)
            .ok_or_else(|| PreprocessError::ResourceGroupNotFound(name.to_string()))?;
        let set = first_set + blocks.len() as u32;

        let declarations = group
            .resources
            .iter()
            .map(|resource| declare_resource(resource, set, shader))
            .collect::<Result<Vec<_>, _>>()?;

        blocks.push(ResourceBlock {
            group: group.name.clone(),
            set,
            text: declarations.join("\n"),
        });
    }

    Ok((output, blocks))
}
