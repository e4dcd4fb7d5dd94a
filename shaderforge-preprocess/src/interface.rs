use crate::fragment::{FragmentKind, SourceAssembly};
use crate::pragma::{parse_interface_directive, InterfaceDirective};
use crate::PreprocessError;
use shaderforge_catalog::{InterfaceVariable, ShaderGroup};
use shaderforge_common::ShaderStage;

/// The interface directives found in a stage body.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct InterfaceDirectives {
    /// The lines of the `interface_override` region, if one was declared.
    pub(crate) override_lines: Option<Vec<String>>,
    pub(crate) no_fragment_output: bool,
}

/// Strip the interface directives and any override region from `source`.
///
/// Stripped lines are left empty so that line numbers of the remaining body are preserved.
pub(crate) fn extract_interface(
    source: &str,
) -> Result<(String, InterfaceDirectives), PreprocessError> {
    let mut output = String::with_capacity(source.len());
    let mut directives = InterfaceDirectives::default();
    let mut region: Option<Vec<String>> = None;

    for line in source.lines() {
        match parse_interface_directive(line)? {
            Some(InterfaceDirective::OverrideBegin) => {
                if region.is_some() {
                    return Err(PreprocessError::UnterminatedInterfaceOverride);
                }
                region = Some(Vec::new());
            }
            Some(InterfaceDirective::OverrideEnd) => {
                let lines = region
                    .take()
                    .ok_or(PreprocessError::UnterminatedInterfaceOverride)?;
                directives
                    .override_lines
                    .get_or_insert_with(Vec::new)
                    .extend(lines);
            }
            Some(InterfaceDirective::NoFragmentOutput) => directives.no_fragment_output = true,
            None => {
                if let Some(region) = region.as_mut() {
                    region.push(line.to_string());
                } else {
                    output.push_str(line);
                }
            }
        }
        output.push('\n');
    }

    if region.is_some() {
        return Err(PreprocessError::UnterminatedInterfaceOverride);
    }
    Ok((output, directives))
}

fn has_arrayed_outputs(stage: ShaderStage) -> bool {
    stage.intersects(ShaderStage::TESSELLATION_CONTROL | ShaderStage::MESH)
}

fn declare(
    direction: &str,
    variables: &[InterfaceVariable],
    prefix: &str,
    arrayed: bool,
) -> String {
    let mut text = String::new();
    for (location, variable) in variables.iter().enumerate() {
        text.push_str(&format!(
            "layout(location = {location}) {direction} {} {prefix}{}{};\n",
            variable.ty,
            variable.name,
            if arrayed { "[]" } else { "" }
        ));
    }
    text
}

/// Push the interface fragments of `stage`.
///
/// Stages that both consume and emit varyings prefix their inputs with `in_`, since an input
/// and an output cannot share a name.
pub(crate) fn push_interface(
    assembly: &mut SourceAssembly,
    shader: &ShaderGroup,
    stage: ShaderStage,
    directives: &InterfaceDirectives,
) {
    if let Some(lines) = &directives.override_lines {
        assembly.push(FragmentKind::InterfaceInput, lines.join("\n"));
        return;
    }

    let inputs = shader.default_inputs(stage);
    let outputs = shader.default_outputs(stage);
    let input_prefix = if stage.has_arrayed_inputs() && !outputs.is_empty() {
        "in_"
    } else {
        ""
    };

    if !inputs.is_empty() {
        assembly.push(
            FragmentKind::InterfaceInput,
            declare("in", inputs, input_prefix, stage.has_arrayed_inputs()),
        );
    }

    let suppress_outputs = directives.no_fragment_output && stage == ShaderStage::FRAGMENT;
    if directives.no_fragment_output && stage != ShaderStage::FRAGMENT {
        log::warn!("ignoring no_fragment_output in {} stage of {}", stage, shader.name);
    }
    if !outputs.is_empty() && !suppress_outputs {
        assembly.push(
            FragmentKind::InterfaceOutput,
            declare("out", outputs, "", has_arrayed_outputs(stage)),
        );
    }

    if stage.has_per_vertex_output() {
        assembly.push(
            FragmentKind::PerVertex,
            "out gl_PerVertex {\n    vec4 gl_Position;\n};",
        );
    }
}
