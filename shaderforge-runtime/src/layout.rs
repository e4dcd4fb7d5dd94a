use crate::shader::Shader;
use serde::Serialize;
use shaderforge_common::{DescriptorKind, Format, ScalarKind, ShaderStage};

/// A binding of a descriptor set layout.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct DescriptorSetLayoutBinding {
    pub binding: u32,
    pub kind: DescriptorKind,
    /// The number of descriptors. Unbounded arrays report 0.
    pub count: u32,
    pub stages: ShaderStage,
}

/// A push-constant range of a pipeline layout.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct PushConstantRange {
    pub stages: ShaderStage,
    pub offset: u32,
    pub size: u32,
}

/// A vertex input attribute of a pipeline.
///
/// Every attribute is sourced from vertex buffer binding 0.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct VertexInputAttribute {
    pub location: u32,
    pub binding: u32,
    pub format: Format,
    pub offset: u32,
}

/// A specialization map entry, with the default value of the constant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct SpecializationRecord {
    pub id: u32,
    pub kind: ScalarKind,
    /// The default value as raw bits, zero-extended to 64 bits.
    pub value: u64,
}

impl Shader {
    /// The layout bindings of descriptor set `set`, ordered by binding.
    pub fn descriptor_set_layout_bindings(&self, set: u32) -> Vec<DescriptorSetLayoutBinding> {
        self.shader_resources(set)
            .into_iter()
            .map(|usage| DescriptorSetLayoutBinding {
                binding: usage.binding,
                kind: usage.kind,
                count: usage.count,
                stages: usage.stages,
            })
            .collect()
    }

    /// One push-constant range per stage block.
    pub fn push_constant_ranges(&self) -> Vec<PushConstantRange> {
        self.push_constant_blocks()
            .iter()
            .map(|block| PushConstantRange {
                stages: block.stages,
                offset: block.offset,
                size: block.size(),
            })
            .collect()
    }

    /// The vertex input attributes of the vertex stage.
    pub fn vertex_input_attributes(&self) -> Vec<VertexInputAttribute> {
        self.input_attributes(ShaderStage::VERTEX)
            .iter()
            .map(|attribute| VertexInputAttribute {
                location: attribute.location,
                binding: 0,
                format: attribute.format,
                offset: attribute.offset,
            })
            .collect()
    }

    /// The total size of one vertex, following the packed attribute offsets.
    pub fn vertex_stride(&self) -> u32 {
        self.input_attributes(ShaderStage::VERTEX)
            .iter()
            .map(|attribute| attribute.offset + attribute_size(attribute.format))
            .max()
            .unwrap_or(0)
    }

    pub fn specialization_records(&self) -> Vec<SpecializationRecord> {
        self.specialization_constants()
            .map(|constant| SpecializationRecord {
                id: constant.id,
                kind: constant.kind(),
                value: constant.value.raw(),
            })
            .collect()
    }
}

fn attribute_size(format: Format) -> u32 {
    use Format::*;
    match format {
        R32Uint | R32Sint | R32Sfloat => 4,
        R32G32Uint | R32G32Sint | R32G32Sfloat | R64Uint | R64Sint | R64Sfloat => 8,
        R32G32B32Uint | R32G32B32Sint | R32G32B32Sfloat => 12,
        R32G32B32A32Uint | R32G32B32A32Sint | R32G32B32A32Sfloat | R64G64Uint | R64G64Sint
        | R64G64Sfloat => 16,
        R64G64B64Uint | R64G64B64Sint | R64G64B64Sfloat => 24,
        R64G64B64A64Uint | R64G64B64A64Sint | R64G64B64A64Sfloat => 32,
        _ => 0,
    }
}
