mod support;

use shaderforge_cache::CacheOptions;
use shaderforge_catalog::{InterfaceVariable, ResourceCatalog, ResourceGroup, ShaderGroup, ShaderResource};
use shaderforge_common::{DescriptorKind, ErrorKind, Format, ShaderStage};
use shaderforge_reflect::ReflectContext;
use shaderforge_runtime::layout::PushConstantRange;
use shaderforge_runtime::{PackOptions, Shader, ShaderPack, StageError};
use std::path::Path;
use support::LoweringCompiler;

const VERTEX: &str = "#version 450
#pragma use_resource_block \"Lighting\"
void main() {
    normal = position;
    gl_Position = lights.color;
}
";

const FRAGMENT: &str = "#version 450
#pragma use_resource_block \"Lighting\"
spec_const float EXPOSURE = 1.5;
void main() {
    color = lights.color * EXPOSURE;
}
";

fn lighting() -> ResourceGroup {
    let mut lights = ShaderResource::new("lights", DescriptorKind::UniformBuffer, 2);
    lights.layout = "vec4 color;".into();
    ResourceGroup::new("Lighting", vec![lights])
}

fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn lit(dir: &Path, vertex: &str, fragment: &str) -> ResourceCatalog {
    let mut shader = ShaderGroup::new("lit")
        .with_stage(ShaderStage::VERTEX, write(dir, "lit.vert", vertex))
        .with_stage(ShaderStage::FRAGMENT, write(dir, "lit.frag", fragment));
    shader.vertex_inputs = vec![
        InterfaceVariable::new("position", "vec3"),
        InterfaceVariable::new("uv", "vec2"),
    ];
    shader.varyings = vec![InterfaceVariable::new("normal", "vec3")];
    shader.fragment_outputs = vec![InterfaceVariable::new("color", "vec4")];
    ResourceCatalog::new(vec![shader], vec![lighting()]).unwrap()
}

fn options(parallel: bool) -> PackOptions {
    PackOptions {
        parallel,
        ..Default::default()
    }
}

#[test]
fn lighting_end_to_end() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let pack = ShaderPack::new(
        lit(dir.path(), VERTEX, FRAGMENT),
        LoweringCompiler::new(),
        options(true),
    )
    .unwrap();

    let processed = pack.process("lit").unwrap();
    assert!(processed.errors.is_empty(), "{}", processed.errors);

    let shader = &processed.shader;
    assert_eq!(1, shader.num_sets());
    let resources = shader.shader_resources(0);
    assert_eq!(1, resources.len());
    assert_eq!(2, resources[0].binding);
    assert_eq!(
        ShaderStage::VERTEX | ShaderStage::FRAGMENT,
        resources[0].stages
    );
    assert_eq!(vec!["lights"], shader.set_resource_names(0));

    let attributes: Vec<_> = shader
        .vertex_input_attributes()
        .into_iter()
        .map(|a| (a.location, a.offset, a.format))
        .collect();
    assert_eq!(
        vec![(0, 0, Format::R32G32B32Sfloat), (1, 12, Format::R32G32Sfloat)],
        attributes
    );
    assert_eq!(1, shader.output_attributes(ShaderStage::FRAGMENT).len());

    let records = shader.specialization_records();
    assert_eq!(1, records.len());
    assert_eq!(1.5f32.to_bits() as u64, records[0].value);

    let bindings = shader.descriptor_set_layout_bindings(0);
    assert_eq!(DescriptorKind::UniformBuffer, bindings[0].kind);
    assert_eq!(2, processed.stages.len());
}

#[test]
fn binding_mismatch_aborts_processing() {
    let dir = tempfile::tempdir().unwrap();
    let pack = ShaderPack::new(
        lit(dir.path(), VERTEX, FRAGMENT),
        LoweringCompiler::shifted(1),
        options(false),
    )
    .unwrap();

    match pack.process("lit") {
        Err(StageError::Aborted { diagnostic, .. }) => {
            assert_eq!(ErrorKind::BindingMismatch, diagnostic.kind)
        }
        other => panic!("expected a binding mismatch, got {other:?}"),
    }
}

#[test]
fn failed_stage_is_withheld() {
    let dir = tempfile::tempdir().unwrap();
    let broken = "#pragma use_resource_block \"Lighting\"\n#error broken\nvoid main() {}";
    let pack = ShaderPack::new(
        lit(dir.path(), VERTEX, broken),
        LoweringCompiler::new(),
        options(true),
    )
    .unwrap();

    let processed = pack.process("lit").unwrap();
    assert!(processed.errors.contains(ErrorKind::CompilationFailed));
    assert!(processed.errors.contains(ErrorKind::StageWithheld));
    assert_eq!(1, processed.stages.len());
    assert!(processed.stage(ShaderStage::FRAGMENT).is_none());

    let resources = processed.shader.shader_resources(0);
    assert_eq!(ShaderStage::VERTEX, resources[0].stages);
}

#[test]
fn missing_group_caches_no_source() {
    let dir = tempfile::tempdir().unwrap();
    let missing = "#pragma use_resource_block \"Shadows\"\nvoid main() {}";
    let pack = ShaderPack::new(
        lit(dir.path(), VERTEX, missing),
        LoweringCompiler::new(),
        options(true),
    )
    .unwrap();

    let processed = pack.process("lit").unwrap();
    assert!(processed.errors.contains(ErrorKind::ResourceGroupNotFound));
    assert!(pack.full_source("lit", ShaderStage::FRAGMENT).is_none());
    assert!(pack.full_source("lit", ShaderStage::VERTEX).is_some());
}

#[test]
fn unknown_shader_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let pack = ShaderPack::new(
        lit(dir.path(), VERTEX, FRAGMENT),
        LoweringCompiler::new(),
        options(true),
    )
    .unwrap();
    assert!(matches!(
        pack.process("unlit"),
        Err(StageError::StageNotFound(name)) if name == "unlit"
    ));
}

#[test]
fn cached_binaries_skip_the_compiler() {
    let dir = tempfile::tempdir().unwrap();
    let compiler = LoweringCompiler::new();
    let pack = ShaderPack::new(
        lit(dir.path(), VERTEX, FRAGMENT),
        compiler.clone(),
        options(true),
    )
    .unwrap();

    pack.process("lit").unwrap();
    assert_eq!(2, compiler.compiled());
    let again = pack.process("lit").unwrap();
    assert_eq!(2, compiler.compiled());
    assert_eq!(1, again.shader.num_sets());
}

#[test]
fn persistent_store_survives_packs() {
    let dir = tempfile::tempdir().unwrap();
    let store = tempfile::tempdir().unwrap();
    let options = PackOptions {
        cache: CacheOptions::persistent_in(store.path()),
        ..Default::default()
    };

    let first = LoweringCompiler::new();
    ShaderPack::new(lit(dir.path(), VERTEX, FRAGMENT), first.clone(), options.clone())
        .unwrap()
        .process("lit")
        .unwrap();
    assert_eq!(2, first.compiled());

    let second = LoweringCompiler::new();
    let processed = ShaderPack::new(lit(dir.path(), VERTEX, FRAGMENT), second.clone(), options)
        .unwrap()
        .process("lit")
        .unwrap();
    assert_eq!(0, second.compiled());
    assert_eq!(1, processed.shader.num_sets());
}

#[test]
fn collation_order_does_not_matter() {
    let dir = tempfile::tempdir().unwrap();
    let pack = ShaderPack::new(
        lit(dir.path(), VERTEX, FRAGMENT),
        LoweringCompiler::new(),
        options(false),
    )
    .unwrap();

    let group = pack.catalog().shader_group("lit").unwrap();
    let processor = pack.processor();
    let compiled: Vec<_> = group
        .stages
        .iter()
        .map(|stage| processor.process(group, stage).unwrap())
        .collect();

    let collate = |order: &[usize]| {
        let mut shader = Shader::for_group(group);
        for &index in order {
            let stage = &compiled[index];
            let context = ReflectContext {
                catalog: pack.catalog(),
                shader: &group.name,
                resource_groups: &stage.resource_groups,
            };
            shader
                .parse_binary(stage.identity, &stage.binary, context)
                .unwrap();
        }
        shader
    };

    let forward = collate(&[0, 1]);
    let backward = collate(&[1, 0]);
    let forward: Vec<_> = forward.descriptor_sets().cloned().collect();
    let backward: Vec<_> = backward.descriptor_sets().cloned().collect();
    assert_eq!(forward, backward);
}

#[test]
fn push_constant_blocks_are_stacked() {
    let dir = tempfile::tempdir().unwrap();
    let vertex = "layout(push_constant) uniform draw_block {\n    vec4 tint;\n} draw;\nvoid main() {}";
    let fragment =
        "layout(push_constant) uniform shade_block {\n    vec2 scale;\n} shade;\nvoid main() {}";
    let pack = ShaderPack::new(
        lit(dir.path(), vertex, fragment),
        LoweringCompiler::new(),
        options(true),
    )
    .unwrap();

    let processed = pack.process("lit").unwrap();
    assert_eq!(
        vec![
            PushConstantRange {
                stages: ShaderStage::VERTEX,
                offset: 0,
                size: 16
            },
            PushConstantRange {
                stages: ShaderStage::FRAGMENT,
                offset: 16,
                size: 8
            },
        ],
        processed.shader.push_constant_ranges()
    );
}

#[test]
fn disassembly_is_cached() {
    let dir = tempfile::tempdir().unwrap();
    let pack = ShaderPack::new(
        lit(dir.path(), VERTEX, FRAGMENT),
        LoweringCompiler::new(),
        options(true),
    )
    .unwrap();
    pack.process("lit").unwrap();

    let first = pack.disassembly("lit", ShaderStage::VERTEX).unwrap();
    assert!(first.contains("OpDecorate"));
    let second = pack.disassembly("lit", ShaderStage::VERTEX).unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
}

#[test]
fn binding_dump_lists_merged_stages() {
    let dir = tempfile::tempdir().unwrap();
    let pack = ShaderPack::new(
        lit(dir.path(), VERTEX, FRAGMENT),
        LoweringCompiler::new(),
        options(true),
    )
    .unwrap();

    let dump = pack.process("lit").unwrap().shader.binding_dump();
    let binding = &dump["sets"][0]["bindings"][0];
    assert_eq!("Lighting.lights", binding["resource"]);
    assert_eq!(serde_json::json!(["vert", "frag"]), binding["stages"]);
}
