use crate::error::ReflectError;
use rspirv::dr::{Instruction, Module, Operand};
use shaderforge_common::{FastHashMap, ScalarKind};
use spirv::{Decoration, Op, StorageClass, Word};

type Decorations = Vec<(Decoration, Vec<Operand>)>;

/// A loaded SPIR-V module with lookup tables for names, decorations and definitions.
pub(crate) struct SpirvModule {
    module: Module,
    defs: FastHashMap<Word, usize>,
    names: FastHashMap<Word, String>,
    member_names: FastHashMap<(Word, u32), String>,
    decorations: FastHashMap<Word, Decorations>,
    member_decorations: FastHashMap<(Word, u32), Decorations>,
}

fn literal(operand: Option<&Operand>) -> Option<u32> {
    match operand {
        Some(&Operand::LiteralBit32(value)) => Some(value),
        _ => None,
    }
}

impl SpirvModule {
    pub(crate) fn parse(binary: &[u32]) -> Result<Self, ReflectError> {
        let module = rspirv::dr::load_words(binary)?;
        let mut this = SpirvModule {
            module,
            defs: FastHashMap::default(),
            names: FastHashMap::default(),
            member_names: FastHashMap::default(),
            decorations: FastHashMap::default(),
            member_decorations: FastHashMap::default(),
        };

        for (index, inst) in this.module.types_global_values.iter().enumerate() {
            if let Some(id) = inst.result_id {
                this.defs.insert(id, index);
            }
        }

        for inst in &this.module.debug_names {
            match (inst.class.opcode, inst.operands.as_slice()) {
                (Op::Name, [Operand::IdRef(target), Operand::LiteralString(name)]) => {
                    this.names.insert(*target, name.clone());
                }
                (
                    Op::MemberName,
                    [Operand::IdRef(target), Operand::LiteralBit32(member), Operand::LiteralString(name)],
                ) => {
                    this.member_names.insert((*target, *member), name.clone());
                }
                _ => {}
            }
        }

        for inst in &this.module.annotations {
            match (inst.class.opcode, inst.operands.as_slice()) {
                (Op::Decorate, [Operand::IdRef(target), Operand::Decoration(decoration), rest @ ..]) => {
                    this.decorations
                        .entry(*target)
                        .or_default()
                        .push((*decoration, rest.to_vec()));
                }
                (
                    Op::MemberDecorate,
                    [Operand::IdRef(target), Operand::LiteralBit32(member), Operand::Decoration(decoration), rest @ ..],
                ) => {
                    this.member_decorations
                        .entry((*target, *member))
                        .or_default()
                        .push((*decoration, rest.to_vec()));
                }
                _ => {}
            }
        }

        Ok(this)
    }

    /// Global types, constants and variables in declaration order.
    pub(crate) fn globals(&self) -> &[Instruction] {
        &self.module.types_global_values
    }

    pub(crate) fn def(&self, id: Word) -> Option<&Instruction> {
        self.defs
            .get(&id)
            .and_then(|&index| self.module.types_global_values.get(index))
    }

    pub(crate) fn name(&self, id: Word) -> Option<&str> {
        self.names
            .get(&id)
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }

    pub(crate) fn member_name(&self, id: Word, member: u32) -> Option<&str> {
        self.member_names
            .get(&(id, member))
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }

    fn find(decorations: Option<&Decorations>, decoration: Decoration) -> Option<&[Operand]> {
        decorations?
            .iter()
            .find(|(d, _)| *d == decoration)
            .map(|(_, operands)| operands.as_slice())
    }

    pub(crate) fn has_decoration(&self, id: Word, decoration: Decoration) -> bool {
        Self::find(self.decorations.get(&id), decoration).is_some()
    }

    pub(crate) fn decoration_u32(&self, id: Word, decoration: Decoration) -> Option<u32> {
        literal(Self::find(self.decorations.get(&id), decoration)?.first())
    }

    pub(crate) fn has_member_decoration(&self, id: Word, member: u32, decoration: Decoration) -> bool {
        Self::find(self.member_decorations.get(&(id, member)), decoration).is_some()
    }

    pub(crate) fn member_decoration_u32(
        &self,
        id: Word,
        member: u32,
        decoration: Decoration,
    ) -> Option<u32> {
        literal(Self::find(self.member_decorations.get(&(id, member)), decoration)?.first())
    }

    /// The value of an integer constant.
    pub(crate) fn constant_u32(&self, id: Word) -> Option<u32> {
        let inst = self.def(id)?;
        if inst.class.opcode != Op::Constant {
            return None;
        }
        match inst.operands.first() {
            Some(&Operand::LiteralBit32(value)) => Some(value),
            Some(&Operand::LiteralBit64(value)) => u32::try_from(value).ok(),
            _ => None,
        }
    }

    /// The storage class and pointee type of a pointer type.
    pub(crate) fn pointer(&self, id: Word) -> Option<(StorageClass, Word)> {
        let inst = self.def(id)?;
        match (inst.class.opcode, inst.operands.as_slice()) {
            (Op::TypePointer, [Operand::StorageClass(class), Operand::IdRef(pointee)]) => {
                Some((*class, *pointee))
            }
            _ => None,
        }
    }

    /// The member types of a struct type.
    pub(crate) fn struct_members(&self, id: Word) -> Option<Vec<Word>> {
        let inst = self.def(id)?;
        if inst.class.opcode != Op::TypeStruct {
            return None;
        }
        Some(
            inst.operands
                .iter()
                .filter_map(|operand| match operand {
                    Operand::IdRef(id) => Some(*id),
                    _ => None,
                })
                .collect(),
        )
    }

    /// Strip array types, returning the element type and the total element count.
    ///
    /// Runtime-sized arrays count as 0.
    pub(crate) fn strip_arrays(&self, mut id: Word) -> (Word, u32) {
        let mut count = 1u32;
        while let Some(inst) = self.def(id) {
            match (inst.class.opcode, inst.operands.as_slice()) {
                (Op::TypeArray, [Operand::IdRef(element), Operand::IdRef(length)]) => {
                    count = count.saturating_mul(self.constant_u32(*length).unwrap_or(0));
                    id = *element;
                }
                (Op::TypeRuntimeArray, [Operand::IdRef(element)]) => {
                    count = 0;
                    id = *element;
                }
                _ => break,
            }
        }
        (id, count)
    }

    /// Strip a single array level, if `id` is an array type.
    pub(crate) fn strip_one_array(&self, id: Word) -> Word {
        match self.def(id).map(|inst| (inst.class.opcode, inst.operands.as_slice())) {
            Some((Op::TypeArray | Op::TypeRuntimeArray, [Operand::IdRef(element), ..])) => *element,
            _ => id,
        }
    }

    pub(crate) fn scalar_kind(&self, id: Word) -> Option<ScalarKind> {
        let inst = self.def(id)?;
        let width = literal(inst.operands.first());
        match inst.class.opcode {
            Op::TypeBool => Some(ScalarKind::Bool),
            Op::TypeInt => {
                let signed = literal(inst.operands.get(1)) == Some(1);
                match (width?, signed) {
                    (32, true) => Some(ScalarKind::Int32),
                    (32, false) => Some(ScalarKind::UInt32),
                    (64, true) => Some(ScalarKind::Int64),
                    (64, false) => Some(ScalarKind::UInt64),
                    _ => None,
                }
            }
            Op::TypeFloat => match width? {
                32 => Some(ScalarKind::Float32),
                64 => Some(ScalarKind::Float64),
                _ => None,
            },
            _ => None,
        }
    }

    /// The scalar kind and component count of a scalar, vector or matrix type.
    pub(crate) fn components(&self, id: Word) -> Option<(ScalarKind, u32, bool)> {
        let inst = self.def(id)?;
        match (inst.class.opcode, inst.operands.as_slice()) {
            (Op::TypeVector, [Operand::IdRef(component), Operand::LiteralBit32(count)]) => {
                Some((self.scalar_kind(*component)?, *count, false))
            }
            (Op::TypeMatrix, [Operand::IdRef(column), Operand::LiteralBit32(columns)]) => {
                let (kind, rows, _) = self.components(*column)?;
                Some((kind, rows.checked_mul(*columns)?, true))
            }
            _ => Some((self.scalar_kind(id)?, 1, false)),
        }
    }

    /// The size in bytes of a type, as laid out in a block.
    ///
    /// Returns `None` when the size does not fit in 32 bits.
    pub(crate) fn type_size(&self, id: Word) -> Option<u32> {
        let Some(inst) = self.def(id) else {
            return Some(0);
        };
        match (inst.class.opcode, inst.operands.as_slice()) {
            (Op::TypeBool, _) => Some(4),
            (Op::TypeInt | Op::TypeFloat, [Operand::LiteralBit32(width), ..]) => Some(width / 8),
            (Op::TypeVector | Op::TypeMatrix, [Operand::IdRef(element), Operand::LiteralBit32(count)]) => {
                self.type_size(*element)?.checked_mul(*count)
            }
            (Op::TypeArray, [Operand::IdRef(element), Operand::IdRef(length)]) => {
                let length = self.constant_u32(*length).unwrap_or(0);
                let stride = match self.decoration_u32(id, Decoration::ArrayStride) {
                    Some(stride) => stride,
                    None => self.type_size(*element)?,
                };
                stride.checked_mul(length)
            }
            (Op::TypeStruct, members) => {
                let mut end = 0u32;
                for (index, member) in members.iter().enumerate() {
                    let Operand::IdRef(member) = member else {
                        continue;
                    };
                    let offset = self
                        .member_decoration_u32(id, index as u32, Decoration::Offset)
                        .unwrap_or(end);
                    end = end.max(offset.checked_add(self.type_size(*member)?)?);
                }
                Some(end)
            }
            _ => Some(0),
        }
    }
}
