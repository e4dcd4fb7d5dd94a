use crate::error::CollateError;
use serde::Serialize;
use shaderforge_catalog::ShaderGroup;
use shaderforge_common::{ShaderStage, ShaderStageIdentity};
use shaderforge_reflect::reflect::semantics::{
    PushConstantInfo, ResourceUsage, SpecializationConstant, StageReflection, VertexAttributeInfo,
};
use shaderforge_reflect::{reflect_stage, ReflectContext};
use std::collections::{BTreeMap, BTreeSet};

/// One descriptor set, with the collated usage of every binding in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DescriptorSetInfo {
    pub set: u32,
    /// Usages by binding index. Each binding holds one usage with the stages of every user merged.
    pub bindings: BTreeMap<u32, ResourceUsage>,
}

impl DescriptorSetInfo {
    fn new(set: u32) -> Self {
        DescriptorSetInfo {
            set,
            bindings: BTreeMap::new(),
        }
    }

    /// The usages of the set, ordered by binding.
    pub fn resources(&self) -> impl Iterator<Item = &ResourceUsage> {
        self.bindings.values()
    }

    /// The names of the resources in the set, ordered by binding.
    pub fn resource_names(&self) -> Vec<&str> {
        self.bindings.values().map(|u| u.name.as_str()).collect()
    }
}

/// Fold `usage` into the usage already recorded at its slot.
fn merge_usage(existing: &mut ResourceUsage, usage: &ResourceUsage) {
    if !existing.same_slot(usage) {
        log::debug!(
            "set {} binding {} is `{}` in one stage and `{}` in another",
            usage.set,
            usage.binding,
            existing.name,
            usage.name
        );
    }
    existing.stages |= usage.stages;
    existing.access |= usage.access;
    existing.count = existing.count.max(usage.count);
    // Keep the smaller name so the result does not depend on the order stages are parsed in.
    if (&usage.resource, &usage.name) < (&existing.resource, &existing.name) {
        existing.name = usage.name.clone();
        existing.resource = usage.resource.clone();
    }
}

/// Lay the push-constant blocks out end to end in stage declaration order.
fn stack_push_constants(
    stages: &[ShaderStage],
    mut blocks: Vec<PushConstantInfo>,
) -> Result<Vec<PushConstantInfo>, CollateError> {
    blocks.sort_by_key(|block| {
        stages
            .iter()
            .position(|stage| block.stages.intersects(*stage))
            .unwrap_or(usize::MAX)
    });

    let mut offset = 0u32;
    for block in &mut blocks {
        block.offset = offset;
        offset = block
            .checked_size()
            .and_then(|size| offset.checked_add(size))
            .ok_or_else(|| CollateError::PushConstantOverflow(block.name.clone()))?;
    }
    Ok(blocks)
}

/// The collated binding tables of one multi-stage shader.
///
/// Stages are folded in one at a time with [`Shader::parse_binary`] or [`Shader::collate`].
/// Collation is single-writer: the tables are only ever mutated through `&mut self`.
#[derive(Debug, Clone)]
pub struct Shader {
    name: String,
    /// The declared stages, in declaration order.
    stages: Vec<ShaderStage>,
    parsed: BTreeSet<ShaderStageIdentity>,
    sets: BTreeMap<u32, DescriptorSetInfo>,
    push_constants: Vec<PushConstantInfo>,
    inputs: BTreeMap<ShaderStage, Vec<VertexAttributeInfo>>,
    outputs: BTreeMap<ShaderStage, Vec<VertexAttributeInfo>>,
    spec_constants: BTreeMap<u32, SpecializationConstant>,
}

impl Shader {
    /// Create an empty shader with the given stages, in declaration order.
    pub fn new(name: impl Into<String>, stages: impl IntoIterator<Item = ShaderStage>) -> Self {
        Shader {
            name: name.into(),
            stages: stages.into_iter().collect(),
            parsed: BTreeSet::new(),
            sets: BTreeMap::new(),
            push_constants: Vec::new(),
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
            spec_constants: BTreeMap::new(),
        }
    }

    /// Create an empty shader for the stages of a shader group.
    pub fn for_group(group: &ShaderGroup) -> Self {
        Self::new(&group.name, group.stages.iter().map(|s| s.stage))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared stages, in declaration order.
    pub fn stages(&self) -> &[ShaderStage] {
        &self.stages
    }

    /// The identity of the stage `stage` of this shader.
    pub fn identity(&self, stage: ShaderStage) -> ShaderStageIdentity {
        ShaderStageIdentity::new(&self.name, stage)
    }

    pub fn is_parsed(&self, identity: &ShaderStageIdentity) -> bool {
        self.parsed.contains(identity)
    }

    /// Reflect the binary of stage `identity` and fold it into the tables.
    ///
    /// On error the tables are left exactly as they were.
    pub fn parse_binary(
        &mut self,
        identity: ShaderStageIdentity,
        binary: &[u32],
        context: ReflectContext<'_>,
    ) -> Result<(), CollateError> {
        self.check_unparsed(identity)?;
        let reflection = reflect_stage(binary, identity.stage(), context)?;
        self.collate(identity, reflection)
    }

    fn check_unparsed(&self, identity: ShaderStageIdentity) -> Result<(), CollateError> {
        if self.parsed.iter().any(|parsed| parsed.stage() == identity.stage()) {
            return Err(CollateError::StageAlreadyParsed(identity));
        }
        Ok(())
    }

    /// Fold the reflection of stage `identity` into the tables.
    ///
    /// Every usage is validated before anything is recorded, so a failed collation leaves the
    /// tables untouched.
    pub fn collate(
        &mut self,
        identity: ShaderStageIdentity,
        reflection: StageReflection,
    ) -> Result<(), CollateError> {
        self.check_unparsed(identity)?;

        for usage in &reflection.usages {
            let existing = self
                .sets
                .get(&usage.set)
                .and_then(|set| set.bindings.get(&usage.binding));
            if let Some(existing) = existing {
                if existing.kind != usage.kind {
                    return Err(CollateError::DescriptorConflict {
                        set: usage.set,
                        binding: usage.binding,
                        first: existing.kind,
                        second: usage.kind,
                    });
                }
            }
        }

        let stage = identity.stage();
        let mut stages = self.stages.clone();
        if !stages.contains(&stage) {
            stages.push(stage);
        }
        let push_constants = match reflection.push_constant {
            Some(block) => {
                let mut blocks = self.push_constants.clone();
                blocks.push(block);
                Some(stack_push_constants(&stages, blocks)?)
            }
            None => None,
        };
        self.stages = stages;

        for usage in reflection.usages {
            let set = self
                .sets
                .entry(usage.set)
                .or_insert_with(|| DescriptorSetInfo::new(usage.set));
            match set.bindings.get_mut(&usage.binding) {
                Some(existing) => merge_usage(existing, &usage),
                None => {
                    set.bindings.insert(usage.binding, usage);
                }
            }
        }

        if let Some(push_constants) = push_constants {
            self.push_constants = push_constants;
        }

        self.inputs.insert(stage, reflection.inputs);
        self.outputs.insert(stage, reflection.outputs);

        for constant in reflection.spec_constants {
            if self.spec_constants.contains_key(&constant.id) {
                log::debug!(
                    "{identity}: specialization constant {} is already defined",
                    constant.id
                );
                continue;
            }
            self.spec_constants.insert(constant.id, constant);
        }

        self.parsed.insert(identity);
        Ok(())
    }

    /// The number of descriptor sets used by any stage.
    pub fn num_sets(&self) -> usize {
        self.sets.len()
    }

    /// The descriptor sets, ordered by set index.
    pub fn descriptor_sets(&self) -> impl Iterator<Item = &DescriptorSetInfo> {
        self.sets.values()
    }

    pub fn descriptor_set(&self, set: u32) -> Option<&DescriptorSetInfo> {
        self.sets.get(&set)
    }

    /// The collated usages of set `set`, ordered by binding.
    pub fn shader_resources(&self, set: u32) -> Vec<&ResourceUsage> {
        self.sets
            .get(&set)
            .map(|set| set.resources().collect())
            .unwrap_or_default()
    }

    /// The names of the resources of set `set`, ordered by binding.
    pub fn set_resource_names(&self, set: u32) -> Vec<&str> {
        self.sets
            .get(&set)
            .map(DescriptorSetInfo::resource_names)
            .unwrap_or_default()
    }

    /// The input attributes of `stage`.
    pub fn input_attributes(&self, stage: ShaderStage) -> &[VertexAttributeInfo] {
        self.inputs.get(&stage).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The output attributes of `stage`.
    pub fn output_attributes(&self, stage: ShaderStage) -> &[VertexAttributeInfo] {
        self.outputs.get(&stage).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The push-constant block of `stage`, if it declares one.
    pub fn stage_push_constant_info(&self, stage: ShaderStage) -> Option<&PushConstantInfo> {
        self.push_constants
            .iter()
            .find(|block| block.stages.intersects(stage))
    }

    /// Every push-constant block, in stage declaration order.
    pub fn push_constant_blocks(&self) -> &[PushConstantInfo] {
        &self.push_constants
    }

    /// The specialization constants of every stage, ordered by id.
    pub fn specialization_constants(&self) -> impl Iterator<Item = &SpecializationConstant> {
        self.spec_constants.values()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use shaderforge_catalog::ResourceKey;
    use shaderforge_common::{AccessModifier, DescriptorKind, ShaderStage};
    use shaderforge_reflect::reflect::semantics::{PushConstantMember, SpecValue};

    fn usage(stage: ShaderStage, set: u32, binding: u32, kind: DescriptorKind) -> ResourceUsage {
        ResourceUsage {
            stages: stage,
            name: "lights".into(),
            resource: Some(ResourceKey::new("Lighting", "lights")),
            access: AccessModifier::READ,
            kind,
            binding,
            set,
            count: 1,
        }
    }

    fn reflection(stage: ShaderStage, usages: Vec<ResourceUsage>) -> StageReflection {
        StageReflection {
            stage,
            usages,
            push_constant: None,
            inputs: vec![],
            outputs: vec![],
            spec_constants: vec![],
        }
    }

    fn push(stage: ShaderStage, size: u32) -> StageReflection {
        let mut reflection = reflection(stage, vec![]);
        reflection.push_constant = Some(PushConstantInfo {
            stages: stage,
            name: format!("{}_params", stage.short_name()),
            members: vec![PushConstantMember {
                name: "value".into(),
                size,
                offset: 0,
            }],
            offset: 0,
        });
        reflection
    }

    fn lit() -> Shader {
        Shader::new("lit", [ShaderStage::VERTEX, ShaderStage::FRAGMENT])
    }

    #[test]
    fn shared_bindings_merge_stage_masks() {
        let mut shader = lit();
        for stage in [ShaderStage::VERTEX, ShaderStage::FRAGMENT] {
            shader
                .collate(
                    shader.identity(stage),
                    reflection(stage, vec![usage(stage, 0, 2, DescriptorKind::UniformBuffer)]),
                )
                .unwrap();
        }

        assert_eq!(1, shader.num_sets());
        let resources = shader.shader_resources(0);
        assert_eq!(1, resources.len());
        assert_eq!(
            ShaderStage::VERTEX | ShaderStage::FRAGMENT,
            resources[0].stages
        );
        assert_eq!(vec!["lights"], shader.set_resource_names(0));
    }

    #[test]
    fn collation_is_commutative() {
        let vertex = |shader: &Shader| {
            let mut access = usage(ShaderStage::VERTEX, 0, 1, DescriptorKind::StorageBuffer);
            access.access = AccessModifier::READ;
            access.name = "particles".into();
            access.resource = None;
            let usages = vec![
                usage(ShaderStage::VERTEX, 0, 2, DescriptorKind::UniformBuffer),
                access,
            ];
            (
                shader.identity(ShaderStage::VERTEX),
                reflection(ShaderStage::VERTEX, usages),
            )
        };
        let fragment = |shader: &Shader| {
            let mut access = usage(ShaderStage::FRAGMENT, 0, 1, DescriptorKind::StorageBuffer);
            access.access = AccessModifier::WRITE;
            access.name = "particles".into();
            access.resource = None;
            let usages = vec![
                access,
                usage(ShaderStage::FRAGMENT, 1, 0, DescriptorKind::CombinedImageSampler),
            ];
            (
                shader.identity(ShaderStage::FRAGMENT),
                reflection(ShaderStage::FRAGMENT, usages),
            )
        };

        let mut forward = lit();
        let (id, r) = vertex(&forward);
        forward.collate(id, r).unwrap();
        let (id, r) = fragment(&forward);
        forward.collate(id, r).unwrap();

        let mut backward = lit();
        let (id, r) = fragment(&backward);
        backward.collate(id, r).unwrap();
        let (id, r) = vertex(&backward);
        backward.collate(id, r).unwrap();

        let forward_sets: Vec<_> = forward.descriptor_sets().collect();
        let backward_sets: Vec<_> = backward.descriptor_sets().collect();
        assert_eq!(forward_sets, backward_sets);
        assert_eq!(
            AccessModifier::READ_WRITE,
            forward.descriptor_set(0).unwrap().bindings[&1].access
        );
    }

    #[test]
    fn conflicting_kinds_leave_tables_untouched() {
        let mut shader = lit();
        shader
            .collate(
                shader.identity(ShaderStage::VERTEX),
                reflection(
                    ShaderStage::VERTEX,
                    vec![usage(ShaderStage::VERTEX, 0, 2, DescriptorKind::UniformBuffer)],
                ),
            )
            .unwrap();

        let before: Vec<_> = shader.descriptor_sets().cloned().collect();
        let mut fragment = reflection(
            ShaderStage::FRAGMENT,
            vec![
                usage(ShaderStage::FRAGMENT, 0, 3, DescriptorKind::UniformBuffer),
                usage(ShaderStage::FRAGMENT, 0, 2, DescriptorKind::StorageBuffer),
            ],
        );
        fragment.push_constant = push(ShaderStage::FRAGMENT, 16).push_constant;

        let identity = shader.identity(ShaderStage::FRAGMENT);
        assert!(matches!(
            shader.collate(identity, fragment),
            Err(CollateError::DescriptorConflict { set: 0, binding: 2, .. })
        ));
        let after: Vec<_> = shader.descriptor_sets().cloned().collect();
        assert_eq!(before, after);
        assert!(shader.push_constant_blocks().is_empty());
        assert!(!shader.is_parsed(&identity));
    }

    #[test]
    fn stages_are_parsed_once() {
        let mut shader = lit();
        let identity = shader.identity(ShaderStage::VERTEX);
        shader
            .collate(identity, reflection(ShaderStage::VERTEX, vec![]))
            .unwrap();
        assert!(matches!(
            shader.collate(identity, reflection(ShaderStage::VERTEX, vec![])),
            Err(CollateError::StageAlreadyParsed(_))
        ));
    }

    #[test]
    fn push_constant_blocks_stack_in_declaration_order() {
        let stages = [
            ShaderStage::VERTEX,
            ShaderStage::GEOMETRY,
            ShaderStage::FRAGMENT,
        ];
        let mut shader = Shader::new("stacked", stages);

        // Parse out of declaration order; offsets still follow it.
        for (stage, size) in [
            (ShaderStage::FRAGMENT, 4),
            (ShaderStage::VERTEX, 16),
            (ShaderStage::GEOMETRY, 8),
        ] {
            shader.collate(shader.identity(stage), push(stage, size)).unwrap();
        }

        let offsets: Vec<_> = stages
            .iter()
            .map(|&stage| shader.stage_push_constant_info(stage).unwrap().offset)
            .collect();
        assert_eq!(vec![0, 16, 24], offsets);
    }

    #[test]
    fn overflowing_push_constant_stack_leaves_tables_untouched() {
        let mut shader = lit();
        shader
            .collate(
                shader.identity(ShaderStage::VERTEX),
                push(ShaderStage::VERTEX, u32::MAX - 8),
            )
            .unwrap();

        let identity = shader.identity(ShaderStage::FRAGMENT);
        let mut fragment = push(ShaderStage::FRAGMENT, 16);
        fragment.usages = vec![usage(ShaderStage::FRAGMENT, 0, 2, DescriptorKind::UniformBuffer)];
        assert!(matches!(
            shader.collate(identity, fragment),
            Err(CollateError::PushConstantOverflow(name)) if name == "frag_params"
        ));
        assert_eq!(0, shader.num_sets());
        assert_eq!(1, shader.push_constant_blocks().len());
        assert!(!shader.is_parsed(&identity));
    }

    #[test]
    fn first_spec_constant_definition_wins() {
        let mut shader = lit();
        for (stage, value) in [(ShaderStage::VERTEX, 1), (ShaderStage::FRAGMENT, 2)] {
            let mut reflection = reflection(stage, vec![]);
            reflection.spec_constants = vec![SpecializationConstant {
                id: 0,
                name: "LIGHTS".into(),
                value: SpecValue::UInt32(value),
            }];
            shader.collate(shader.identity(stage), reflection).unwrap();
        }

        let constants: Vec<_> = shader.specialization_constants().collect();
        assert_eq!(1, constants.len());
        assert_eq!(SpecValue::UInt32(1), constants[0].value);
    }
}
