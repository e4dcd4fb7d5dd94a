use serde::{Deserialize, Serialize};
use shaderforge_catalog::ResourceKey;
use shaderforge_common::{AccessModifier, DescriptorKind, Format, ScalarKind, ShaderStage};
use std::cmp::Ordering;

/// One resource used by one or more stages, as recovered from compiled binaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceUsage {
    /// The stages using the resource.
    pub stages: ShaderStage,
    /// The name of the resource variable.
    pub name: String,
    /// The catalog resource backing the usage, if the resource came from a resource group.
    pub resource: Option<ResourceKey>,
    pub access: AccessModifier,
    pub kind: DescriptorKind,
    pub binding: u32,
    pub set: u32,
    /// The number of descriptors. Runtime-sized arrays report 0.
    pub count: u32,
}

impl ResourceUsage {
    /// Whether `other` describes the same resource at the same slot, ignoring stages and access.
    pub fn same_slot(&self, other: &ResourceUsage) -> bool {
        self.set == other.set
            && self.binding == other.binding
            && self.kind == other.kind
            && self.name == other.name
            && self.resource == other.resource
    }
}

impl PartialOrd for ResourceUsage {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ResourceUsage {
    /// Usages order by set, then binding. Remaining fields only break ties.
    fn cmp(&self, other: &Self) -> Ordering {
        (self.set, self.binding)
            .cmp(&(other.set, other.binding))
            .then_with(|| (self.kind as u32).cmp(&(other.kind as u32)))
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.resource.cmp(&other.resource))
            .then_with(|| self.stages.cmp(&other.stages))
            .then_with(|| self.access.bits().cmp(&other.access.bits()))
            .then_with(|| self.count.cmp(&other.count))
    }
}

/// A member of a push-constant block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushConstantMember {
    pub name: String,
    pub size: u32,
    /// The byte offset of the member within its block.
    pub offset: u32,
}

/// A push-constant block of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushConstantInfo {
    pub stages: ShaderStage,
    pub name: String,
    pub members: Vec<PushConstantMember>,
    /// The byte offset of the block when the blocks of every stage are stacked end to end.
    pub offset: u32,
}

impl PushConstantInfo {
    /// The size of the block: the end of its furthest member.
    ///
    /// Members removed by the compiler leave gaps, so this is not the sum of member sizes.
    /// Returns `None` if a member ends past `u32::MAX`.
    pub fn checked_size(&self) -> Option<u32> {
        self.members.iter().try_fold(0u32, |end, member| {
            Some(end.max(member.offset.checked_add(member.size)?))
        })
    }

    /// The size of the block, saturating at `u32::MAX`.
    ///
    /// Blocks produced by reflection always have a representable size.
    pub fn size(&self) -> u32 {
        self.checked_size().unwrap_or(u32::MAX)
    }
}

/// A stage input or output attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexAttributeInfo {
    pub name: String,
    pub location: u32,
    /// The running byte offset of the attribute within its list.
    pub offset: u32,
    pub format: Format,
}

/// The value of a specialization constant.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SpecValue {
    Bool(bool),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
}

impl SpecValue {
    pub fn kind(&self) -> ScalarKind {
        match self {
            SpecValue::Bool(_) => ScalarKind::Bool,
            SpecValue::Int32(_) => ScalarKind::Int32,
            SpecValue::UInt32(_) => ScalarKind::UInt32,
            SpecValue::Int64(_) => ScalarKind::Int64,
            SpecValue::UInt64(_) => ScalarKind::UInt64,
            SpecValue::Float32(_) => ScalarKind::Float32,
            SpecValue::Float64(_) => ScalarKind::Float64,
        }
    }

    /// The value as raw bits, zero-extended to 64 bits.
    pub fn raw(&self) -> u64 {
        match *self {
            SpecValue::Bool(v) => v as u64,
            SpecValue::Int32(v) => v as u32 as u64,
            SpecValue::UInt32(v) => v as u64,
            SpecValue::Int64(v) => v as u64,
            SpecValue::UInt64(v) => v,
            SpecValue::Float32(v) => v.to_bits() as u64,
            SpecValue::Float64(v) => v.to_bits(),
        }
    }
}

/// A specialization constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecializationConstant {
    pub id: u32,
    pub name: String,
    pub value: SpecValue,
}

impl SpecializationConstant {
    pub fn kind(&self) -> ScalarKind {
        self.value.kind()
    }
}

/// Everything reflected from the binary of one stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageReflection {
    pub stage: ShaderStage,
    /// Descriptor usages, ordered by set and binding.
    pub usages: Vec<ResourceUsage>,
    pub push_constant: Option<PushConstantInfo>,
    /// Input attributes, in declaration order.
    pub inputs: Vec<VertexAttributeInfo>,
    /// Output attributes, in declaration order.
    pub outputs: Vec<VertexAttributeInfo>,
    pub spec_constants: Vec<SpecializationConstant>,
}

#[cfg(test)]
mod test {
    use super::*;

    fn usage(set: u32, binding: u32, name: &str) -> ResourceUsage {
        ResourceUsage {
            stages: ShaderStage::VERTEX,
            name: name.to_string(),
            resource: None,
            access: AccessModifier::READ,
            kind: DescriptorKind::UniformBuffer,
            binding,
            set,
            count: 1,
        }
    }

    #[test]
    fn usages_order_by_set_then_binding() {
        let mut usages = vec![usage(1, 0, "a"), usage(0, 3, "b"), usage(0, 1, "c")];
        usages.sort();
        let order: Vec<_> = usages.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(vec!["c", "b", "a"], order);
    }

    #[test]
    fn push_constant_size_spans_gaps() {
        let block = PushConstantInfo {
            stages: ShaderStage::FRAGMENT,
            name: "params".into(),
            members: vec![
                PushConstantMember {
                    name: "tint".into(),
                    size: 16,
                    offset: 0,
                },
                PushConstantMember {
                    name: "exposure".into(),
                    size: 4,
                    offset: 32,
                },
            ],
            offset: 0,
        };
        assert_eq!(36, block.size());
    }

    #[test]
    fn push_constant_size_past_u32_is_unrepresentable() {
        let block = PushConstantInfo {
            stages: ShaderStage::FRAGMENT,
            name: "params".into(),
            members: vec![PushConstantMember {
                name: "data".into(),
                size: 8,
                offset: u32::MAX - 4,
            }],
            offset: 0,
        };
        assert_eq!(None, block.checked_size());
        assert_eq!(u32::MAX, block.size());
    }

    #[test]
    fn same_slot_ignores_stages_and_access() {
        let vertex = usage(0, 2, "lights");
        let fragment = ResourceUsage {
            stages: ShaderStage::FRAGMENT,
            access: AccessModifier::READ_WRITE,
            ..vertex.clone()
        };
        assert!(vertex.same_slot(&fragment));
        assert!(!vertex.same_slot(&usage(0, 2, "shadows")));
        assert!(!vertex.same_slot(&usage(1, 2, "lights")));
    }

    #[test]
    fn raw_spec_values() {
        assert_eq!(1, SpecValue::Bool(true).raw());
        assert_eq!(0xffff_ffff, SpecValue::Int32(-1).raw());
        assert_eq!(1.5f32.to_bits() as u64, SpecValue::Float32(1.5).raw());
    }
}
