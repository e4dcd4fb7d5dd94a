use crate::shader::Shader;
use serde_json::{json, Value};
use shaderforge_common::{AccessModifier, ShaderStage};
use shaderforge_reflect::reflect::semantics::ResourceUsage;

fn stage_names(stages: ShaderStage) -> Vec<&'static str> {
    stages.stages().map(|stage| stage.short_name()).collect()
}

fn access_name(access: AccessModifier) -> &'static str {
    if access == AccessModifier::READ_WRITE {
        "read_write"
    } else if access == AccessModifier::READ {
        "read"
    } else if access == AccessModifier::WRITE {
        "write"
    } else {
        "none"
    }
}

fn usage_value(usage: &ResourceUsage) -> Value {
    json!({
        "binding": usage.binding,
        "name": usage.name,
        "resource": usage.resource.as_ref().map(|key| key.to_string()),
        "kind": usage.kind,
        "count": usage.count,
        "access": access_name(usage.access),
        "stages": stage_names(usage.stages),
    })
}

impl Shader {
    /// Dump the collated tables as a JSON document, for inspection and diffing.
    pub fn binding_dump(&self) -> Value {
        let sets: Vec<Value> = self
            .descriptor_sets()
            .map(|set| {
                json!({
                    "set": set.set,
                    "bindings": set.resources().map(usage_value).collect::<Vec<_>>(),
                })
            })
            .collect();

        let push_constants: Vec<Value> = self
            .push_constant_blocks()
            .iter()
            .map(|block| {
                json!({
                    "name": block.name,
                    "stages": stage_names(block.stages),
                    "offset": block.offset,
                    "size": block.size(),
                    "members": block.members,
                })
            })
            .collect();

        let attributes = |stage: ShaderStage| {
            json!({
                "stage": stage.short_name(),
                "inputs": self.input_attributes(stage),
                "outputs": self.output_attributes(stage),
            })
        };

        json!({
            "shader": self.name(),
            "sets": sets,
            "push_constants": push_constants,
            "attributes": self.stages().iter().copied().map(attributes).collect::<Vec<_>>(),
            "specialization_constants": self.specialization_constants().collect::<Vec<_>>(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use shaderforge_catalog::ResourceKey;
    use shaderforge_common::DescriptorKind;
    use shaderforge_reflect::reflect::semantics::StageReflection;

    #[test]
    fn dump_lists_sets_and_merged_stages() {
        let mut shader = Shader::new("lit", [ShaderStage::VERTEX, ShaderStage::FRAGMENT]);
        for stage in [ShaderStage::VERTEX, ShaderStage::FRAGMENT] {
            let usage = ResourceUsage {
                stages: stage,
                name: "lights".into(),
                resource: Some(ResourceKey::new("Lighting", "lights")),
                access: AccessModifier::READ,
                kind: DescriptorKind::UniformBuffer,
                binding: 2,
                set: 0,
                count: 1,
            };
            let reflection = StageReflection {
                stage,
                usages: vec![usage],
                push_constant: None,
                inputs: vec![],
                outputs: vec![],
                spec_constants: vec![],
            };
            shader.collate(shader.identity(stage), reflection).unwrap();
        }

        let dump = shader.binding_dump();
        assert_eq!("lit", dump["shader"]);
        let binding = &dump["sets"][0]["bindings"][0];
        assert_eq!(2, binding["binding"]);
        assert_eq!("Lighting.lights", binding["resource"]);
        assert_eq!("uniform_buffer", binding["kind"]);
        assert_eq!(json!(["vert", "frag"]), binding["stages"]);
        assert_eq!(2, dump["attributes"].as_array().unwrap().len());
    }
}
