//! A test compiler that lowers the declarations of generated sources into SPIR-V.
//!
//! Only the declaration lines matter for reflection, so function bodies are ignored. Block
//! members are laid out with std140-like alignment.
#![allow(dead_code)]

use rspirv::binary::Assemble;
use rspirv::dr::{Builder, Operand};
use shaderforge_common::{ShaderStage, ShaderStageIdentity};
use shaderforge_reflect::{CompileError, ShaderCompiler};
use spirv::{
    AddressingModel, BuiltIn, Capability, Decoration, Dim, ImageFormat, MemoryModel, StorageClass,
    Word,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default, Clone)]
pub struct LoweringCompiler {
    /// Added to every binding index, to simulate a compiler that disagrees with the source.
    pub binding_shift: u32,
    compiled: Arc<AtomicUsize>,
}

impl LoweringCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shifted(binding_shift: u32) -> Self {
        LoweringCompiler {
            binding_shift,
            ..Default::default()
        }
    }

    /// The number of times `compile` was invoked, across every clone of this compiler.
    pub fn compiled(&self) -> usize {
        self.compiled.load(Ordering::SeqCst)
    }
}

impl ShaderCompiler for LoweringCompiler {
    fn compile(
        &self,
        identity: ShaderStageIdentity,
        _stage: ShaderStage,
        source: &str,
    ) -> Result<Vec<u32>, CompileError> {
        self.compiled.fetch_add(1, Ordering::SeqCst);
        if source.contains("#error") {
            return Err(CompileError::Failed {
                name: identity.to_string(),
                message: "#error directive".into(),
            });
        }
        Ok(lower(source, self.binding_shift))
    }
}

type Layout<'a> = Vec<(&'a str, Option<u32>)>;

fn layout_args(args: &str) -> Layout<'_> {
    args.split(',')
        .map(|arg| match arg.split_once('=') {
            Some((key, value)) => (key.trim(), value.trim().parse().ok()),
            None => (arg.trim(), None),
        })
        .collect()
}

fn layout_value(layout: &Layout<'_>, key: &str) -> Option<u32> {
    layout.iter().find(|(k, _)| *k == key).and_then(|(_, v)| *v)
}

/// Split `name[4]` into the name and array size. Unsized arrays report 0.
fn split_array(name: &str) -> (&str, Option<u32>) {
    match name.split_once('[') {
        Some((name, size)) => (name, Some(size.trim_end_matches(']').parse().unwrap_or(0))),
        None => (name, None),
    }
}

struct Lowering {
    b: Builder,
    binding_shift: u32,
}

impl Lowering {
    fn scalar(&mut self, prefix: &str) -> Word {
        match prefix {
            "i" => self.b.type_int(32, 1),
            "u" => self.b.type_int(32, 0),
            "b" => self.b.type_bool(),
            _ => self.b.type_float(32),
        }
    }

    /// The type id, size and alignment of a GLSL value type.
    fn value_type(&mut self, ty: &str) -> (Word, u32, u32) {
        match ty {
            "float" => (self.scalar(""), 4, 4),
            "int" => (self.scalar("i"), 4, 4),
            "uint" => (self.scalar("u"), 4, 4),
            "bool" => (self.scalar("b"), 4, 4),
            "mat4" => {
                let column = self.value_type("vec4").0;
                (self.b.type_matrix(column, 4), 64, 16)
            }
            _ => {
                let (prefix, count) = ty.split_at(ty.len() - 1);
                let count: u32 = count.parse().unwrap_or(4);
                let scalar = self.scalar(prefix.trim_end_matches("vec"));
                let align = if count == 2 { 8 } else { 16 };
                (self.b.type_vector(scalar, count), 4 * count, align)
            }
        }
    }

    fn array_of(&mut self, element: Word, size: Option<u32>) -> Word {
        match size {
            None => element,
            Some(0) => self.b.type_runtime_array(element),
            Some(size) => {
                let uint = self.b.type_int(32, 0);
                let length = self.b.constant_bit32(uint, size);
                self.b.type_array(element, length)
            }
        }
    }

    fn descriptor(&mut self, variable: Word, layout: &Layout<'_>) {
        let set = layout_value(layout, "set").unwrap_or(0);
        let binding = layout_value(layout, "binding").unwrap_or(0) + self.binding_shift;
        self.b
            .decorate(variable, Decoration::DescriptorSet, [Operand::LiteralBit32(set)]);
        self.b
            .decorate(variable, Decoration::Binding, [Operand::LiteralBit32(binding)]);
    }

    fn block(&mut self, layout: &Layout<'_>, words: &[&str], members: &[&str], instance: &str) {
        let mut types = Vec::new();
        let mut offset: u32 = 0;
        for member in members {
            let parts: Vec<&str> = member.trim_end_matches(';').split_whitespace().collect();
            let [ty, name] = parts[..] else {
                continue;
            };
            let (ty, size, align) = self.value_type(ty);
            offset = offset.next_multiple_of(align);
            types.push((ty, offset, name));
            offset += size;
        }

        let block = self.b.type_struct(types.iter().map(|(ty, _, _)| *ty));
        if let Some(name) = words.last() {
            self.b.name(block, *name);
        }
        self.b.decorate(block, Decoration::Block, []);
        for (index, (_, offset, name)) in types.iter().enumerate() {
            self.b.member_decorate(
                block,
                index as u32,
                Decoration::Offset,
                [Operand::LiteralBit32(*offset)],
            );
            self.b.member_name(block, index as u32, *name);
        }

        let class = if words.contains(&"buffer") {
            StorageClass::StorageBuffer
        } else if layout.iter().any(|(key, _)| *key == "push_constant") {
            StorageClass::PushConstant
        } else {
            StorageClass::Uniform
        };

        let (name, size) = split_array(instance);
        let ty = self.array_of(block, size);
        let pointer = self.b.type_pointer(None, class, ty);
        let variable = self.b.variable(pointer, None, class, None);
        self.b.name(variable, name);

        if class != StorageClass::PushConstant {
            self.descriptor(variable, layout);
        }
        if words.contains(&"readonly") {
            self.b.decorate(variable, Decoration::NonWritable, []);
        }
        if words.contains(&"writeonly") {
            self.b.decorate(variable, Decoration::NonReadable, []);
        }
    }

    fn opaque(&mut self, layout: &Layout<'_>, words: &[&str]) {
        let Some(position) = words.iter().position(|w| *w == "uniform") else {
            return;
        };
        let (Some(ty), Some(name)) = (words.get(position + 1), words.get(position + 2)) else {
            return;
        };

        const BASES: [&str; 4] = ["sampler", "texture", "image", "subpassInput"];
        let (prefix, base) = match ty.split_at(1) {
            (prefix @ ("u" | "i"), rest) if BASES.iter().any(|b| rest.starts_with(b)) => {
                (prefix, rest)
            }
            _ => ("", *ty),
        };
        let dim = if base.contains("Cube") {
            Dim::DimCube
        } else if base.contains("3D") {
            Dim::Dim3D
        } else if base.contains("1D") {
            Dim::Dim1D
        } else if base.contains("Buffer") {
            Dim::DimBuffer
        } else if base.contains("subpassInput") {
            Dim::DimSubpassData
        } else {
            Dim::Dim2D
        };
        let arrayed = base.contains("Array") as u32;
        let sampled_type = self.scalar(prefix);

        let ty = if *ty == "sampler" {
            self.b.type_sampler()
        } else if base.starts_with("sampler") {
            let image =
                self.b
                    .type_image(sampled_type, dim, 0, arrayed, 0, 1, ImageFormat::Unknown, None);
            self.b.type_sampled_image(image)
        } else if base.starts_with("texture") {
            self.b
                .type_image(sampled_type, dim, 0, arrayed, 0, 1, ImageFormat::Unknown, None)
        } else {
            self.b
                .type_image(sampled_type, dim, 0, arrayed, 0, 2, ImageFormat::Unknown, None)
        };

        let (name, size) = split_array(name.trim_end_matches(';'));
        let ty = self.array_of(ty, size);
        let pointer = self.b.type_pointer(None, StorageClass::UniformConstant, ty);
        let variable = self
            .b
            .variable(pointer, None, StorageClass::UniformConstant, None);
        self.b.name(variable, name);
        self.descriptor(variable, layout);
        if words.contains(&"readonly") {
            self.b.decorate(variable, Decoration::NonWritable, []);
        }
        if words.contains(&"writeonly") {
            self.b.decorate(variable, Decoration::NonReadable, []);
        }
    }

    fn attribute(&mut self, layout: &Layout<'_>, words: &[&str]) {
        let [direction, ty, name] = words[..] else {
            return;
        };
        let class = if direction == "in" {
            StorageClass::Input
        } else {
            StorageClass::Output
        };
        let (name, size) = split_array(name.trim_end_matches(';'));
        let ty = self.value_type(ty).0;
        // Unsized interface arrays are sized by the primitive, as a compiler would.
        let ty = self.array_of(ty, size.map(|size| size.max(3)));
        let pointer = self.b.type_pointer(None, class, ty);
        let variable = self.b.variable(pointer, None, class, None);
        self.b.name(variable, name);
        if let Some(location) = layout_value(layout, "location") {
            self.b
                .decorate(variable, Decoration::Location, [Operand::LiteralBit32(location)]);
        }
    }

    fn spec_constant(&mut self, layout: &Layout<'_>, words: &[&str]) {
        let ["const", ty, name, "=", value] = words[..] else {
            return;
        };
        let value = value.trim_end_matches(';');
        let id = match ty {
            "bool" => {
                let boolean = self.scalar("b");
                if value == "true" {
                    self.b.spec_constant_true(boolean)
                } else {
                    self.b.spec_constant_false(boolean)
                }
            }
            "int" => {
                let int = self.scalar("i");
                self.b
                    .spec_constant_bit32(int, value.parse::<i32>().unwrap_or(0) as u32)
            }
            "uint" => {
                let uint = self.scalar("u");
                self.b
                    .spec_constant_bit32(uint, value.trim_end_matches('u').parse().unwrap_or(0))
            }
            _ => {
                let float = self.scalar("");
                self.b
                    .spec_constant_bit32(float, value.parse::<f32>().unwrap_or(0.0).to_bits())
            }
        };
        self.b.name(id, name);
        if let Some(constant_id) = layout_value(layout, "constant_id") {
            self.b
                .decorate(id, Decoration::SpecId, [Operand::LiteralBit32(constant_id)]);
        }
    }

    fn per_vertex(&mut self) {
        let position = self.value_type("vec4").0;
        let block = self.b.type_struct([position]);
        self.b.name(block, "gl_PerVertex");
        self.b.decorate(block, Decoration::Block, []);
        self.b.member_decorate(
            block,
            0,
            Decoration::BuiltIn,
            [Operand::BuiltIn(BuiltIn::Position)],
        );
        let pointer = self.b.type_pointer(None, StorageClass::Output, block);
        self.b.variable(pointer, None, StorageClass::Output, None);
    }
}

/// Lower the declarations of a generated source into a SPIR-V module.
pub fn lower(source: &str, binding_shift: u32) -> Vec<u32> {
    let mut b = Builder::new();
    b.set_version(1, 0);
    b.capability(Capability::Shader);
    b.memory_model(AddressingModel::Logical, MemoryModel::GLSL450);
    let mut lowering = Lowering { b, binding_shift };

    let mut lines = source.lines().map(str::trim);
    while let Some(line) = lines.next() {
        if line.starts_with("out gl_PerVertex") {
            for member in lines.by_ref() {
                if member.starts_with('}') {
                    break;
                }
            }
            lowering.per_vertex();
            continue;
        }

        let Some((args, declaration)) = line
            .strip_prefix("layout(")
            .and_then(|rest| rest.split_once(')'))
        else {
            continue;
        };
        let layout = layout_args(args);
        let declaration = declaration.trim();

        if let Some(header) = declaration.strip_suffix('{') {
            let words: Vec<&str> = header.split_whitespace().collect();
            let mut members = Vec::new();
            let mut instance = "";
            for member in lines.by_ref() {
                if let Some(close) = member.strip_prefix('}') {
                    instance = close.trim().trim_end_matches(';');
                    break;
                }
                members.push(member);
            }
            lowering.block(&layout, &words, &members, instance);
            continue;
        }

        let words: Vec<&str> = declaration.split_whitespace().collect();
        match words.first() {
            Some(&"in") | Some(&"out") => lowering.attribute(&layout, &words),
            Some(&"const") => lowering.spec_constant(&layout, &words),
            Some(_) if words.contains(&"uniform") => lowering.opaque(&layout, &words),
            _ => {}
        }
    }

    lowering.b.module().assemble()
}
