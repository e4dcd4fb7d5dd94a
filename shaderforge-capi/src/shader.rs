//! Processed shader C API.
use crate::ctypes::{
    shaderforge_attribute_t, shaderforge_binding_t, shaderforge_push_range_t,
    shaderforge_shader_t, shaderforge_spec_constant_t,
};
use crate::error::{assert_non_null, assert_some_ptr, ShaderforgeError};
use crate::ffi::{copy_items, copy_str, extern_fn};
use shaderforge::ShaderStage;
use std::ffi::c_char;

extern_fn! {
    /// Free a processed shader and set the handle to null.
    ///
    /// ## Safety
    ///   - `shader` must be a valid, aligned pointer to a shader handle.
    fn shaderforge_shader_free(shader: *mut shaderforge_shader_t) mut |shader| {
        if let Some(handle) = shader.take() {
            drop(unsafe { Box::from_raw(handle.as_ptr()) });
        }
    }
}

extern_fn! {
    /// Copy the indices of the descriptor sets used by the shader, in ascending order.
    ///
    /// Call with a null `out` to query the number of sets in `len`.
    ///
    /// ## Safety
    ///   - `shader` must be a valid pointer to an initialized shader handle.
    ///   - `out` must be null or valid for `*len` writes, and `len` must be non-null.
    fn shaderforge_shader_sets(
        shader: *const shaderforge_shader_t,
        out: *mut u32,
        len: *mut usize
    ) |shader| {
        assert_some_ptr!(shader);
        assert_non_null!(noexport len);

        let sets: Vec<u32> = shader.shader.descriptor_sets().map(|set| set.set).collect();
        unsafe { copy_items(&sets, out, len)? }
    }
}

extern_fn! {
    /// Copy the layout bindings of descriptor set `set`, ordered by binding.
    ///
    /// Call with a null `out` to query the number of bindings in `len`. A set the shader does
    /// not use has no bindings.
    ///
    /// ## Safety
    ///   - `shader` must be a valid pointer to an initialized shader handle.
    ///   - `out` must be null or valid for `*len` writes, and `len` must be non-null.
    fn shaderforge_shader_bindings(
        shader: *const shaderforge_shader_t,
        set: u32,
        out: *mut shaderforge_binding_t,
        len: *mut usize
    ) |shader| {
        assert_some_ptr!(shader);
        assert_non_null!(noexport len);

        let bindings: Vec<shaderforge_binding_t> = shader
            .shader
            .shader_resources(set)
            .into_iter()
            .map(|usage| shaderforge_binding_t {
                binding: usage.binding,
                kind: usage.kind as u32,
                count: usage.count,
                stages: usage.stages.bits(),
                access: usage.access.bits(),
            })
            .collect();
        unsafe { copy_items(&bindings, out, len)? }
    }
}

extern_fn! {
    /// Copy the name of the resource at `set` and `binding`, including its terminating NUL.
    ///
    /// Call with a null `out` to query the required length in `len`.
    ///
    /// ## Safety
    ///   - `shader` must be a valid pointer to an initialized shader handle.
    ///   - `out` must be null or valid for `*len` writes, and `len` must be non-null.
    fn shaderforge_shader_binding_name(
        shader: *const shaderforge_shader_t,
        set: u32,
        binding: u32,
        out: *mut c_char,
        len: *mut usize
    ) |shader| {
        assert_some_ptr!(shader);
        assert_non_null!(noexport len);

        let usage = shader
            .shader
            .descriptor_set(set)
            .and_then(|info| info.bindings.get(&binding))
            .ok_or(ShaderforgeError::NotFound)?;
        unsafe { copy_str(&usage.name, out, len)? }
    }
}

extern_fn! {
    /// Copy the push-constant ranges of the shader, one per stage with a push-constant block.
    ///
    /// Call with a null `out` to query the number of ranges in `len`.
    ///
    /// ## Safety
    ///   - `shader` must be a valid pointer to an initialized shader handle.
    ///   - `out` must be null or valid for `*len` writes, and `len` must be non-null.
    fn shaderforge_shader_push_ranges(
        shader: *const shaderforge_shader_t,
        out: *mut shaderforge_push_range_t,
        len: *mut usize
    ) |shader| {
        assert_some_ptr!(shader);
        assert_non_null!(noexport len);

        let ranges: Vec<shaderforge_push_range_t> = shader
            .shader
            .push_constant_ranges()
            .into_iter()
            .map(|range| shaderforge_push_range_t {
                stages: range.stages.bits(),
                offset: range.offset,
                size: range.size,
            })
            .collect();
        unsafe { copy_items(&ranges, out, len)? }
    }
}

extern_fn! {
    /// Copy the vertex input attributes of the shader, ordered by location.
    ///
    /// Call with a null `out` to query the number of attributes in `len`. `stride`, if non-null,
    /// receives the vertex stride.
    ///
    /// ## Safety
    ///   - `shader` must be a valid pointer to an initialized shader handle.
    ///   - `out` must be null or valid for `*len` writes, and `len` must be non-null.
    ///   - `stride` must be null or valid for writes.
    fn shaderforge_shader_attributes(
        shader: *const shaderforge_shader_t,
        out: *mut shaderforge_attribute_t,
        len: *mut usize,
        stride: *mut u32
    ) |shader| {
        assert_some_ptr!(shader);
        assert_non_null!(noexport len);

        let attributes: Vec<shaderforge_attribute_t> = shader
            .shader
            .vertex_input_attributes()
            .into_iter()
            .map(|attribute| shaderforge_attribute_t {
                location: attribute.location,
                binding: attribute.binding,
                format: attribute.format as u32,
                offset: attribute.offset,
            })
            .collect();
        unsafe { copy_items(&attributes, out, len)? };
        if !stride.is_null() {
            unsafe { stride.write(shader.shader.vertex_stride()) };
        }
    }
}

extern_fn! {
    /// Copy the specialization constants of the shader, ordered by id.
    ///
    /// Call with a null `out` to query the number of constants in `len`.
    ///
    /// ## Safety
    ///   - `shader` must be a valid pointer to an initialized shader handle.
    ///   - `out` must be null or valid for `*len` writes, and `len` must be non-null.
    fn shaderforge_shader_spec_constants(
        shader: *const shaderforge_shader_t,
        out: *mut shaderforge_spec_constant_t,
        len: *mut usize
    ) |shader| {
        assert_some_ptr!(shader);
        assert_non_null!(noexport len);

        let constants: Vec<shaderforge_spec_constant_t> = shader
            .shader
            .specialization_records()
            .into_iter()
            .map(|record| shaderforge_spec_constant_t {
                id: record.id,
                kind: record.kind as u32,
                value: record.value,
            })
            .collect();
        unsafe { copy_items(&constants, out, len)? }
    }
}

extern_fn! {
    /// Copy the error kinds reported while the shader was processed, in report order.
    ///
    /// Call with a null `out` to query the number of errors in `len`.
    ///
    /// ## Safety
    ///   - `shader` must be a valid pointer to an initialized shader handle.
    ///   - `out` must be null or valid for `*len` writes, and `len` must be non-null.
    fn shaderforge_shader_errors(
        shader: *const shaderforge_shader_t,
        out: *mut u32,
        len: *mut usize
    ) |shader| {
        assert_some_ptr!(shader);
        assert_non_null!(noexport len);

        let kinds: Vec<u32> = shader
            .errors
            .iter()
            .map(|diagnostic| diagnostic.kind.code())
            .collect();
        unsafe { copy_items(&kinds, out, len)? }
    }
}

extern_fn! {
    /// Write whether `stage` of the shader was compiled and collated to `out`.
    ///
    /// ## Safety
    ///   - `shader` must be a valid pointer to an initialized shader handle.
    ///   - `out` must be valid for writes.
    fn shaderforge_shader_has_stage(
        shader: *const shaderforge_shader_t,
        stage: u32,
        out: *mut bool
    ) |shader| {
        assert_some_ptr!(shader);
        assert_non_null!(noexport out);

        let stage = ShaderStage::from_bits(stage)
            .filter(ShaderStage::is_single)
            .ok_or(ShaderforgeError::InvalidParameter("stage"))?;
        unsafe { out.write(shader.stage(stage).is_some()) }
    }
}
