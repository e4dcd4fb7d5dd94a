use rspirv::binary::Assemble;
use rspirv::dr::{Builder, Operand};
use shaderforge_capi::ctypes::{
    shaderforge_binding_t, shaderforge_compiler_t, shaderforge_pack_options_t, shaderforge_pack_t,
    shaderforge_shader_t,
};
use shaderforge_capi::error::{
    shaderforge_error_errno, shaderforge_error_free, shaderforge_error_write, SHADERFORGE_ERRNO,
};
use shaderforge_capi::pack::{
    shaderforge_pack_free, shaderforge_pack_full_source, shaderforge_pack_load,
    shaderforge_pack_process,
};
use shaderforge_capi::shader::{
    shaderforge_shader_binding_name, shaderforge_shader_bindings, shaderforge_shader_errors,
    shaderforge_shader_free, shaderforge_shader_sets,
};
use spirv::{AddressingModel, Capability, Decoration, MemoryModel, StorageClass};
use std::ffi::{c_char, c_void, CStr, CString};
use std::mem::MaybeUninit;
use std::path::Path;

const DOCUMENT: &str = r#"{
    "shader_groups": [
        {
            "name": "lit",
            "stages": [
                { "stage": "vert", "body": "lit.vert" },
                { "stage": "frag", "body": "lit.frag" }
            ]
        }
    ],
    "resource_groups": [
        {
            "name": "Lighting",
            "resources": [
                { "name": "lights", "kind": "uniform_buffer", "binding": 2, "layout": "vec4 color;" }
            ]
        }
    ]
}"#;

/// Every stage declares the `lights` block at set 0, binding 2.
fn lights_module() -> Vec<u32> {
    let mut b = Builder::new();
    b.set_version(1, 0);
    b.capability(Capability::Shader);
    b.memory_model(AddressingModel::Logical, MemoryModel::GLSL450);
    let float = b.type_float(32);
    let vec4 = b.type_vector(float, 4);
    let block = b.type_struct([vec4]);
    b.decorate(block, Decoration::Block, []);
    b.member_decorate(block, 0, Decoration::Offset, [Operand::LiteralBit32(0)]);
    let pointer = b.type_pointer(None, StorageClass::Uniform, block);
    let lights = b.variable(pointer, None, StorageClass::Uniform, None);
    b.name(lights, "lights");
    b.decorate(lights, Decoration::DescriptorSet, [Operand::LiteralBit32(0)]);
    b.decorate(lights, Decoration::Binding, [Operand::LiteralBit32(2)]);
    b.module().assemble()
}

unsafe extern "C" fn compile(
    _user_data: *mut c_void,
    _stage: u32,
    source: *const c_char,
    binary: *mut u32,
    len: *mut usize,
) -> bool {
    let source = unsafe { CStr::from_ptr(source) }.to_string_lossy();
    if source.contains("#error") {
        return false;
    }
    let words = lights_module();
    if !binary.is_null() {
        unsafe { std::ptr::copy_nonoverlapping(words.as_ptr(), binary, words.len()) };
    }
    unsafe { len.write(words.len()) };
    true
}

fn write_pack(dir: &Path, fragment: &str) -> CString {
    std::fs::write(
        dir.join("lit.vert"),
        "#pragma use_resource_block \"Lighting\"\nvoid main() {}",
    )
    .unwrap();
    std::fs::write(dir.join("lit.frag"), fragment).unwrap();
    let path = dir.join("catalog.json");
    std::fs::write(&path, DOCUMENT).unwrap();
    CString::new(path.to_str().unwrap()).unwrap()
}

unsafe fn load(path: &CString) -> shaderforge_pack_t {
    let compiler = shaderforge_compiler_t {
        compile: Some(compile),
        user_data: std::ptr::null_mut(),
    };
    let options = shaderforge_pack_options_t {
        parallel: true,
        persistent_cache: false,
    };
    let mut pack = MaybeUninit::uninit();
    let error = unsafe { shaderforge_pack_load(path.as_ptr(), &compiler, &options, &mut pack) };
    assert!(error.is_none());
    unsafe { pack.assume_init() }
}

unsafe fn error_message(error: shaderforge_capi::ctypes::shaderforge_error_t) -> String {
    let mut len = 0;
    assert!(unsafe { shaderforge_error_write(error, std::ptr::null_mut(), &mut len) }.is_none());
    let mut buffer = vec![0 as c_char; len];
    assert!(unsafe { shaderforge_error_write(error, buffer.as_mut_ptr(), &mut len) }.is_none());
    unsafe { CStr::from_ptr(buffer.as_ptr()) }
        .to_string_lossy()
        .into_owned()
}

#[test]
fn queries_collated_bindings() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_pack(
        dir.path(),
        "#pragma use_resource_block \"Lighting\"\nvoid main() {}",
    );
    let name = CString::new("lit").unwrap();

    unsafe {
        let mut pack = load(&path);
        let mut shader: MaybeUninit<shaderforge_shader_t> = MaybeUninit::uninit();
        assert!(shaderforge_pack_process(&pack, name.as_ptr(), &mut shader).is_none());
        let mut shader = shader.assume_init();

        let mut len = 0;
        assert!(shaderforge_shader_sets(&shader, std::ptr::null_mut(), &mut len).is_none());
        assert_eq!(1, len);
        let mut sets = vec![u32::MAX; len];
        assert!(shaderforge_shader_sets(&shader, sets.as_mut_ptr(), &mut len).is_none());
        assert_eq!(vec![0], sets);

        let mut len = 0;
        assert!(shaderforge_shader_bindings(&shader, 0, std::ptr::null_mut(), &mut len).is_none());
        let mut bindings = vec![shaderforge_binding_t::default(); len];
        assert!(shaderforge_shader_bindings(&shader, 0, bindings.as_mut_ptr(), &mut len).is_none());
        assert_eq!(1, bindings.len());
        assert_eq!(2, bindings[0].binding);
        assert_eq!(6, bindings[0].kind);
        assert_eq!(0x01 | 0x10, bindings[0].stages);
        assert_eq!(1, bindings[0].access);

        let mut len = 0;
        assert!(
            shaderforge_shader_binding_name(&shader, 0, 2, std::ptr::null_mut(), &mut len)
                .is_none()
        );
        let mut buffer = vec![0 as c_char; len];
        assert!(
            shaderforge_shader_binding_name(&shader, 0, 2, buffer.as_mut_ptr(), &mut len).is_none()
        );
        assert_eq!("lights", CStr::from_ptr(buffer.as_ptr()).to_str().unwrap());

        let mut len = 0;
        assert!(
            shaderforge_pack_full_source(&pack, name.as_ptr(), 0x10, std::ptr::null_mut(), &mut len)
                .is_none()
        );
        let mut buffer = vec![0 as c_char; len];
        assert!(
            shaderforge_pack_full_source(&pack, name.as_ptr(), 0x10, buffer.as_mut_ptr(), &mut len)
                .is_none()
        );
        let source = CStr::from_ptr(buffer.as_ptr()).to_str().unwrap();
        assert!(source.contains("uniform lights_block"));

        let mut len = usize::MAX;
        assert!(shaderforge_shader_errors(&shader, std::ptr::null_mut(), &mut len).is_none());
        assert_eq!(0, len);

        assert!(shaderforge_shader_free(&mut shader).is_none());
        assert!(shader.is_none());
        assert!(shaderforge_pack_free(&mut pack).is_none());
        assert!(pack.is_none());
    }
}

#[test]
fn short_buffers_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_pack(dir.path(), "void main() {}");
    let name = CString::new("lit").unwrap();

    unsafe {
        let mut pack = load(&path);
        let mut shader = MaybeUninit::uninit();
        assert!(shaderforge_pack_process(&pack, name.as_ptr(), &mut shader).is_none());
        let mut shader = shader.assume_init();

        let mut buffer = [0u32; 1];
        let mut len = 0;
        let error = shaderforge_shader_sets(&shader, buffer.as_mut_ptr(), &mut len);
        assert_eq!(
            SHADERFORGE_ERRNO::BUFFER_TOO_SMALL as i32,
            shaderforge_error_errno(error)
        );
        assert!(error_message(error).contains("1 are required"));

        let mut error = MaybeUninit::new(error);
        assert_eq!(0, shaderforge_error_free(&mut error));
        assert!(error.assume_init().is_none());

        shaderforge_shader_free(&mut shader);
        shaderforge_pack_free(&mut pack);
    }
}

#[test]
fn failed_stages_are_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_pack(dir.path(), "#error broken\nvoid main() {}");
    let name = CString::new("lit").unwrap();

    unsafe {
        let mut pack = load(&path);
        let mut shader = MaybeUninit::uninit();
        assert!(shaderforge_pack_process(&pack, name.as_ptr(), &mut shader).is_none());
        let mut shader = shader.assume_init();

        let mut len = 0;
        assert!(shaderforge_shader_errors(&shader, std::ptr::null_mut(), &mut len).is_none());
        let mut kinds = vec![0u32; len];
        assert!(shaderforge_shader_errors(&shader, kinds.as_mut_ptr(), &mut len).is_none());
        assert_eq!(
            vec![
                shaderforge::ErrorKind::CompilationFailed.code(),
                shaderforge::ErrorKind::StageWithheld.code()
            ],
            kinds
        );

        shaderforge_shader_free(&mut shader);
        shaderforge_pack_free(&mut pack);
    }
}

#[test]
fn unknown_shader_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_pack(dir.path(), "void main() {}");
    let name = CString::new("unlit").unwrap();

    unsafe {
        let mut pack = load(&path);
        let mut shader = MaybeUninit::uninit();
        let error = shaderforge_pack_process(&pack, name.as_ptr(), &mut shader);
        assert_eq!(
            shaderforge::ErrorKind::StageNotFound.code() as i32,
            shaderforge_error_errno(error)
        );
        assert!(error_message(error).contains("unlit"));
        shaderforge_error_free(&mut MaybeUninit::new(error));

        let error = shaderforge_pack_process(&pack, std::ptr::null(), &mut shader);
        assert_eq!(
            SHADERFORGE_ERRNO::INVALID_PARAMETER as i32,
            shaderforge_error_errno(error)
        );
        shaderforge_error_free(&mut MaybeUninit::new(error));

        shaderforge_pack_free(&mut pack);
    }
}
