//! Shader pack C API.
use crate::ctypes::{
    shaderforge_compile_fn, shaderforge_compiler_t, shaderforge_pack_options_t,
    shaderforge_pack_t, shaderforge_shader_t,
};
use crate::error::{assert_non_null, assert_some_ptr, ShaderforgeError};
use crate::ffi::{copy_str, extern_fn};
use shaderforge::reflect::{CompileError, ShaderCompiler};
use shaderforge::runtime::{PackOptions, ShaderPack};
use shaderforge::{ShaderStage, ShaderStageIdentity};
use std::ffi::{c_char, c_void, CStr, CString};
use std::mem::MaybeUninit;
use std::path::Path;
use std::ptr::NonNull;

/// A compiler backed by a callback supplied through the C API.
struct ForeignCompiler {
    compile: shaderforge_compile_fn,
    user_data: *mut c_void,
}

// The caller guarantees that the callback and its user data may be used from any thread.
unsafe impl Send for ForeignCompiler {}
unsafe impl Sync for ForeignCompiler {}

impl ShaderCompiler for ForeignCompiler {
    fn compile(
        &self,
        identity: ShaderStageIdentity,
        stage: ShaderStage,
        source: &str,
    ) -> Result<Vec<u32>, CompileError> {
        let failed = |message: &str| CompileError::Failed {
            name: identity.to_string(),
            message: message.to_string(),
        };

        let source = CString::new(source).map_err(|_| failed("the source contains a NUL byte"))?;
        let mut len = 0usize;
        let queried = unsafe {
            (self.compile)(
                self.user_data,
                stage.bits(),
                source.as_ptr(),
                std::ptr::null_mut(),
                &mut len,
            )
        };
        if !queried {
            return Err(failed("the compile callback reported an error"));
        }

        let mut binary = vec![0u32; len];
        let filled = unsafe {
            (self.compile)(
                self.user_data,
                stage.bits(),
                source.as_ptr(),
                binary.as_mut_ptr(),
                &mut len,
            )
        };
        if !filled {
            return Err(failed("the compile callback reported an error"));
        }
        binary.truncate(len);
        Ok(binary)
    }
}

fn pack_options(options: Option<&shaderforge_pack_options_t>) -> PackOptions {
    let mut pack = PackOptions::from_env();
    if let Some(options) = options {
        pack.parallel = options.parallel;
        pack.cache.persistent = options.persistent_cache;
    }
    pack
}

#[cfg(feature = "shaderc")]
fn load_default(path: &Path, options: PackOptions) -> Result<ShaderPack, ShaderforgeError> {
    Ok(ShaderPack::load(
        path,
        shaderforge::reflect::ShadercCompiler::default(),
        options,
    )?)
}

#[cfg(not(feature = "shaderc"))]
fn load_default(_path: &Path, _options: PackOptions) -> Result<ShaderPack, ShaderforgeError> {
    Err(ShaderforgeError::InvalidParameter("compiler"))
}

unsafe fn c_str<'a>(text: *const c_char) -> Result<&'a str, ShaderforgeError> {
    Ok(unsafe { CStr::from_ptr(text) }.to_str()?)
}

fn single_stage(stage: u32) -> Result<ShaderStage, ShaderforgeError> {
    ShaderStage::from_bits(stage)
        .filter(ShaderStage::is_single)
        .ok_or(ShaderforgeError::InvalidParameter("stage"))
}

extern_fn! {
    /// Load the catalog document at `path` and create a shader pack for it.
    ///
    /// If `compiler` is null, the built-in shaderc compiler is used when the library was built
    /// with it, otherwise an error is returned. If `options` is null, options are read from the
    /// environment.
    ///
    /// ## Safety
    ///   - `path` must be a valid, NUL-terminated UTF-8 string.
    ///   - `compiler` and `options` must be null or valid for reads.
    ///   - `out` must be aligned and valid for writes.
    fn shaderforge_pack_load(
        path: *const c_char,
        compiler: *const shaderforge_compiler_t,
        options: *const shaderforge_pack_options_t,
        out: *mut MaybeUninit<shaderforge_pack_t>
    ) {
        assert_non_null!(noexport path);
        assert_non_null!(noexport out);

        let path = unsafe { c_str(path)? };
        let options = pack_options(unsafe { options.as_ref() });
        let compiler = unsafe { compiler.as_ref() }.and_then(|compiler| {
            compiler.compile.map(|compile| ForeignCompiler {
                compile,
                user_data: compiler.user_data,
            })
        });

        let pack = match compiler {
            Some(compiler) => ShaderPack::load(path, compiler, options)?,
            None => load_default(Path::new(path), options)?,
        };

        log::debug!("loaded shader pack from {path}");
        unsafe {
            out.write(MaybeUninit::new(NonNull::new(Box::into_raw(Box::new(pack)))))
        }
    }
}

extern_fn! {
    /// Free a shader pack and set the handle to null.
    ///
    /// ## Safety
    ///   - `pack` must be a valid, aligned pointer to a pack handle.
    fn shaderforge_pack_free(pack: *mut shaderforge_pack_t) mut |pack| {
        if let Some(handle) = pack.take() {
            drop(unsafe { Box::from_raw(handle.as_ptr()) });
        }
    }
}

extern_fn! {
    /// Generate, compile and collate every stage of the shader group `name`.
    ///
    /// Stages that fail are withheld and recorded on the returned shader. An error is returned
    /// only when the shader group does not exist or processing was aborted.
    ///
    /// ## Safety
    ///   - `pack` must be a valid pointer to an initialized pack handle.
    ///   - `name` must be a valid, NUL-terminated UTF-8 string.
    ///   - `out` must be aligned and valid for writes.
    fn shaderforge_pack_process(
        pack: *const shaderforge_pack_t,
        name: *const c_char,
        out: *mut MaybeUninit<shaderforge_shader_t>
    ) |pack| {
        assert_some_ptr!(pack);
        assert_non_null!(noexport name);
        assert_non_null!(noexport out);

        let name = unsafe { c_str(name)? };
        let processed = pack.process(name)?;
        unsafe {
            out.write(MaybeUninit::new(NonNull::new(Box::into_raw(Box::new(processed)))))
        }
    }
}

extern_fn! {
    /// Copy the generated source of `stage` of the shader group `name`, including its
    /// terminating NUL, into `out`.
    ///
    /// Call with a null `out` to query the required length in `len`. The source is only
    /// available after the shader group was processed.
    ///
    /// ## Safety
    ///   - `pack` must be a valid pointer to an initialized pack handle.
    ///   - `name` must be a valid, NUL-terminated UTF-8 string.
    ///   - `out` must be null or valid for `*len` writes, and `len` must be non-null.
    fn shaderforge_pack_full_source(
        pack: *const shaderforge_pack_t,
        name: *const c_char,
        stage: u32,
        out: *mut c_char,
        len: *mut usize
    ) |pack| {
        assert_some_ptr!(pack);
        assert_non_null!(noexport name);
        assert_non_null!(noexport len);

        let name = unsafe { c_str(name)? };
        let source = pack
            .full_source(name, single_stage(stage)?)
            .ok_or(ShaderforgeError::NotFound)?;
        unsafe { copy_str(&source, out, len)? }
    }
}

extern_fn! {
    /// Copy the disassembly of the compiled binary of `stage` of the shader group `name`,
    /// including its terminating NUL, into `out`.
    ///
    /// Call with a null `out` to query the required length in `len`.
    ///
    /// ## Safety
    ///   - `pack` must be a valid pointer to an initialized pack handle.
    ///   - `name` must be a valid, NUL-terminated UTF-8 string.
    ///   - `out` must be null or valid for `*len` writes, and `len` must be non-null.
    fn shaderforge_pack_disassembly(
        pack: *const shaderforge_pack_t,
        name: *const c_char,
        stage: u32,
        out: *mut c_char,
        len: *mut usize
    ) |pack| {
        assert_some_ptr!(pack);
        assert_non_null!(noexport name);
        assert_non_null!(noexport len);

        let name = unsafe { c_str(name)? };
        let text = pack.disassembly(name, single_stage(stage)?)?;
        unsafe { copy_str(&text, out, len)? }
    }
}
