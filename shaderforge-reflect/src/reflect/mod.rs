use crate::error::ReflectError;
use module::SpirvModule;
use rspirv::dr::Operand;
use shaderforge_catalog::{ResourceCatalog, ResourceKey};
use shaderforge_common::{
    AccessModifier, DescriptorKind, FastHashMap, Format, ScalarKind, ShaderStage,
};
use spirv::{Decoration, Dim, Op, StorageClass, Word};

/// Reflection data types.
pub mod semantics;

mod module;

pub use semantics::*;

/// What a stage binary is validated against.
#[derive(Debug, Clone, Copy)]
pub struct ReflectContext<'a> {
    pub catalog: &'a ResourceCatalog,
    /// The name of the shader group the stage belongs to.
    pub shader: &'a str,
    /// The resource groups the stage source used, indexed by descriptor set.
    pub resource_groups: &'a [String],
}

/// Disassemble a SPIR-V binary into text.
pub fn disassemble(binary: &[u32]) -> Result<String, ReflectError> {
    use rspirv::binary::Disassemble;
    let module = rspirv::dr::load_words(binary)?;
    Ok(module.disassemble())
}

struct StageReflector<'a> {
    module: SpirvModule,
    stage: ShaderStage,
    context: ReflectContext<'a>,
}

impl ReflectContext<'_> {
    /// Resolve the catalog resource `name` and verify the reflected slot matches the generated one.
    fn check_binding(
        &self,
        name: &str,
        set: u32,
        binding: u32,
    ) -> Result<Option<ResourceKey>, ReflectError> {
        let Some(resource) = self.catalog.find_resource(self.resource_groups, name) else {
            return Ok(None);
        };

        let expected_set = self
            .resource_groups
            .iter()
            .position(|group| *group == resource.group)
            .unwrap_or(0) as u32;

        if expected_set != set || resource.binding != binding {
            return Err(ReflectError::BindingMismatch {
                resource: resource.key(),
                expected_set,
                expected_binding: resource.binding,
                set,
                binding,
            });
        }
        Ok(Some(resource.key()))
    }
}

impl StageReflector<'_> {
    fn variable_name(&self, variable: Word, ty: Word) -> String {
        self.module
            .name(variable)
            .or_else(|| self.module.name(ty))
            .map(str::to_string)
            .unwrap_or_else(|| format!("_{variable}"))
    }

    /// The descriptor kind of a resource variable with the given storage class and element type.
    fn descriptor_kind(
        &self,
        name: &str,
        class: StorageClass,
        ty: Word,
    ) -> Result<Option<DescriptorKind>, ReflectError> {
        let invalid = |reason: &'static str| ReflectError::InvalidDescriptorType {
            name: name.to_string(),
            reason,
        };
        let Some(inst) = self.module.def(ty) else {
            return Err(invalid("undefined type"));
        };

        let kind = match class {
            StorageClass::UniformConstant => match (inst.class.opcode, inst.operands.as_slice()) {
                (Op::TypeSampler, _) => DescriptorKind::Sampler,
                (Op::TypeSampledImage, _) => DescriptorKind::CombinedImageSampler,
                (Op::TypeImage, [_, Operand::Dim(dim), _, _, _, Operand::LiteralBit32(sampled), ..]) => {
                    match (dim, sampled) {
                        (Dim::DimSubpassData, _) => DescriptorKind::InputAttachment,
                        (Dim::DimBuffer, 2) => DescriptorKind::StorageTexelBuffer,
                        (Dim::DimBuffer, _) => DescriptorKind::UniformTexelBuffer,
                        (_, 2) => DescriptorKind::StorageImage,
                        _ => DescriptorKind::SampledImage,
                    }
                }
                (Op::TypeImage, _) => return Err(invalid("malformed image type")),
                _ => return Err(invalid("unsupported opaque type")),
            },
            StorageClass::Uniform => {
                if inst.class.opcode != Op::TypeStruct {
                    return Err(invalid("uniform variable is not a block"));
                }
                if self.module.has_decoration(ty, Decoration::BufferBlock) {
                    DescriptorKind::StorageBuffer
                } else {
                    DescriptorKind::UniformBuffer
                }
            }
            StorageClass::StorageBuffer => {
                if inst.class.opcode != Op::TypeStruct {
                    return Err(invalid("storage buffer variable is not a block"));
                }
                DescriptorKind::StorageBuffer
            }
            _ => return Ok(None),
        };
        Ok(Some(kind))
    }

    /// The access of a stage to a resource variable.
    fn access(
        &self,
        variable: Word,
        ty: Word,
        kind: DescriptorKind,
        resource: Option<&ResourceKey>,
    ) -> AccessModifier {
        if kind.is_read_only() {
            return AccessModifier::READ;
        }

        let all_members = |decoration: Decoration| {
            self.module.struct_members(ty).is_some_and(|members| {
                !members.is_empty()
                    && (0..members.len() as u32)
                        .all(|member| self.module.has_member_decoration(ty, member, decoration))
            })
        };

        let non_writable = self.module.has_decoration(variable, Decoration::NonWritable)
            || all_members(Decoration::NonWritable);
        let non_readable = self.module.has_decoration(variable, Decoration::NonReadable)
            || all_members(Decoration::NonReadable);

        if non_writable || non_readable {
            let mut access = AccessModifier::READ_WRITE;
            if non_writable {
                access.remove(AccessModifier::WRITE);
            }
            if non_readable {
                access.remove(AccessModifier::READ);
            }
            return access;
        }

        resource
            .and_then(|key| self.context.catalog.resource(key))
            .and_then(|resource| {
                AccessModifier::from_qualifiers(&resource.qualifiers_for(self.context.shader))
            })
            .unwrap_or(AccessModifier::READ_WRITE)
    }

    fn reflect_usages(&self) -> Result<Vec<ResourceUsage>, ReflectError> {
        let mut usages: Vec<ResourceUsage> = Vec::new();
        let mut slots: FastHashMap<(u32, u32), String> = FastHashMap::default();

        for inst in self.module.globals() {
            if inst.class.opcode != Op::Variable {
                continue;
            }
            let (Some(variable), Some(pointer)) = (inst.result_id, inst.result_type) else {
                continue;
            };
            let Some((class, pointee)) = self.module.pointer(pointer) else {
                continue;
            };
            if !matches!(
                class,
                StorageClass::UniformConstant | StorageClass::Uniform | StorageClass::StorageBuffer
            ) {
                continue;
            }

            let (ty, count) = self.module.strip_arrays(pointee);
            let name = self.variable_name(variable, ty);
            let Some(kind) = self.descriptor_kind(&name, class, ty)? else {
                continue;
            };

            let (Some(set), Some(binding)) = (
                self.module.decoration_u32(variable, Decoration::DescriptorSet),
                self.module.decoration_u32(variable, Decoration::Binding),
            ) else {
                return Err(ReflectError::InvalidBindingIndex(name));
            };

            if let Some(first) = slots.insert((set, binding), name.clone()) {
                return Err(ReflectError::DuplicateDescriptorType {
                    set,
                    binding,
                    first,
                    second: name,
                });
            }

            let resource = self.context.check_binding(&name, set, binding)?;
            if let Some(declared) = resource
                .as_ref()
                .and_then(|key| self.context.catalog.resource(key))
            {
                if declared.kind != kind {
                    log::warn!(
                        "{} is declared as {} but reflected as {kind}",
                        declared.key(),
                        declared.kind
                    );
                }
            }

            let access = self.access(variable, ty, kind, resource.as_ref());
            usages.push(ResourceUsage {
                stages: self.stage,
                name,
                resource,
                access,
                kind,
                binding,
                set,
                count,
            });
        }

        usages.sort();
        Ok(usages)
    }

    fn reflect_push_constant(&self) -> Result<Option<PushConstantInfo>, ReflectError> {
        let mut block: Option<PushConstantInfo> = None;

        for inst in self.module.globals() {
            if inst.class.opcode != Op::Variable {
                continue;
            }
            let (Some(variable), Some(pointer)) = (inst.result_id, inst.result_type) else {
                continue;
            };
            let Some((StorageClass::PushConstant, ty)) = self.module.pointer(pointer) else {
                continue;
            };

            let name = self.variable_name(variable, ty);
            if let Some(first) = &block {
                return Err(ReflectError::MultiplePushConstantBlocks {
                    first: first.name.clone(),
                    second: name,
                });
            }

            let mut members = Vec::new();
            for (index, member) in self
                .module
                .struct_members(ty)
                .unwrap_or_default()
                .into_iter()
                .enumerate()
            {
                let index = index as u32;
                let member_name = self
                    .module
                    .member_name(ty, index)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("_m{index}"));
                let offset = self
                    .module
                    .member_decoration_u32(ty, index, Decoration::Offset)
                    .unwrap_or(0);
                let size = self
                    .module
                    .type_size(member)
                    .filter(|size| offset.checked_add(*size).is_some())
                    .ok_or_else(|| {
                        ReflectError::InvalidBinary(format!(
                            "push-constant member `{name}.{member_name}` does not fit in 32 bits"
                        ))
                    })?;
                members.push(PushConstantMember {
                    name: member_name,
                    size,
                    offset,
                });
            }

            block = Some(PushConstantInfo {
                stages: self.stage,
                name,
                members,
                offset: 0,
            });
        }

        Ok(block)
    }

    fn is_arrayed(&self, class: StorageClass) -> bool {
        match class {
            StorageClass::Input => self.stage.has_arrayed_inputs(),
            StorageClass::Output => self
                .stage
                .intersects(ShaderStage::TESSELLATION_CONTROL | ShaderStage::MESH),
            _ => false,
        }
    }

    fn is_builtin(&self, variable: Word, ty: Word) -> bool {
        if self.module.has_decoration(variable, Decoration::BuiltIn) {
            return true;
        }
        self.module
            .struct_members(ty)
            .is_some_and(|members| {
                (0..members.len() as u32)
                    .any(|member| self.module.has_member_decoration(ty, member, Decoration::BuiltIn))
            })
    }

    fn reflect_attributes(
        &self,
        direction: StorageClass,
    ) -> Result<Vec<VertexAttributeInfo>, ReflectError> {
        let mut attributes = Vec::new();
        let mut offset = 0u32;

        for inst in self.module.globals() {
            if inst.class.opcode != Op::Variable {
                continue;
            }
            let (Some(variable), Some(pointer)) = (inst.result_id, inst.result_type) else {
                continue;
            };
            let Some((class, pointee)) = self.module.pointer(pointer) else {
                continue;
            };
            if class != direction {
                continue;
            }

            let ty = if self.is_arrayed(class) {
                self.module.strip_one_array(pointee)
            } else {
                pointee
            };
            if self.is_builtin(variable, ty) {
                continue;
            }
            let Some(location) = self.module.decoration_u32(variable, Decoration::Location) else {
                log::trace!("skipping {:?} variable %{variable} without location", class);
                continue;
            };

            let name = self.variable_name(variable, ty);
            let (format, size) = match self.module.components(ty) {
                Some((kind, components, matrix)) => {
                    let format = if matrix {
                        Format::Unknown
                    } else {
                        Format::from_components(kind, components)
                    };
                    (format, components.checked_mul(kind.byte_width()))
                }
                None => (Format::Unknown, self.module.type_size(ty)),
            };
            let next = size.and_then(|size| offset.checked_add(size)).ok_or_else(|| {
                ReflectError::InvalidBinary(format!("the attribute `{name}` does not fit in 32 bits"))
            })?;

            attributes.push(VertexAttributeInfo {
                name,
                location,
                offset,
                format,
            });
            offset = next;
        }

        Ok(attributes)
    }

    fn reflect_spec_constants(&self) -> Result<Vec<SpecializationConstant>, ReflectError> {
        let mut constants = Vec::new();

        for inst in self.module.globals() {
            let Some(id) = inst.result_id else {
                continue;
            };
            let opcode = inst.class.opcode;
            // Composites built from spec constants are derived values. Only one carrying its
            // own SpecId is a vector or matrix specialization constant.
            if opcode == Op::SpecConstantComposite
                && self.module.decoration_u32(id, Decoration::SpecId).is_some()
            {
                let name = self
                    .module
                    .name(id)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("_{id}"));
                return Err(ReflectError::UnsupportedSpecConstant(name));
            }
            if !matches!(
                opcode,
                Op::SpecConstantTrue | Op::SpecConstantFalse | Op::SpecConstant
            ) {
                continue;
            }
            let Some(spec_id) = self.module.decoration_u32(id, Decoration::SpecId) else {
                continue;
            };

            let name = self
                .module
                .name(id)
                .map(str::to_string)
                .unwrap_or_else(|| format!("_{id}"));
            let scalar = inst.result_type.and_then(|ty| self.module.scalar_kind(ty));
            let value = match (opcode, scalar, inst.operands.first()) {
                (Op::SpecConstantTrue, _, _) => SpecValue::Bool(true),
                (Op::SpecConstantFalse, _, _) => SpecValue::Bool(false),
                (_, Some(ScalarKind::Int32), Some(&Operand::LiteralBit32(v))) => {
                    SpecValue::Int32(v as i32)
                }
                (_, Some(ScalarKind::UInt32), Some(&Operand::LiteralBit32(v))) => {
                    SpecValue::UInt32(v)
                }
                (_, Some(ScalarKind::Float32), Some(&Operand::LiteralBit32(v))) => {
                    SpecValue::Float32(f32::from_bits(v))
                }
                (_, Some(ScalarKind::Int64), Some(&Operand::LiteralBit64(v))) => {
                    SpecValue::Int64(v as i64)
                }
                (_, Some(ScalarKind::UInt64), Some(&Operand::LiteralBit64(v))) => {
                    SpecValue::UInt64(v)
                }
                (_, Some(ScalarKind::Float64), Some(&Operand::LiteralBit64(v))) => {
                    SpecValue::Float64(f64::from_bits(v))
                }
                _ => return Err(ReflectError::UnsupportedSpecConstant(name)),
            };

            constants.push(SpecializationConstant {
                id: spec_id,
                name,
                value,
            });
        }

        Ok(constants)
    }
}

/// Reflect the SPIR-V binary of one stage, validating catalog resources against `context`.
pub fn reflect_stage(
    binary: &[u32],
    stage: ShaderStage,
    context: ReflectContext<'_>,
) -> Result<StageReflection, ReflectError> {
    let reflector = StageReflector {
        module: SpirvModule::parse(binary)?,
        stage,
        context,
    };

    Ok(StageReflection {
        stage,
        usages: reflector.reflect_usages()?,
        push_constant: reflector.reflect_push_constant()?,
        inputs: reflector.reflect_attributes(StorageClass::Input)?,
        outputs: reflector.reflect_attributes(StorageClass::Output)?,
        spec_constants: reflector.reflect_spec_constants()?,
    })
}
