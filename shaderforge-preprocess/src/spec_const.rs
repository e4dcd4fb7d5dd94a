use crate::pragma::parse_spec_const;
use crate::PreprocessError;

/// A specialization constant declaration with its assigned constant id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecConstant {
    pub id: u32,
    pub ty: String,
    pub name: String,
    pub value: String,
}

impl SpecConstant {
    /// The GLSL declaration of the constant.
    pub fn declaration(&self) -> String {
        format!(
            "layout(constant_id = {}) const {} {} = {};",
            self.id, self.ty, self.name, self.value
        )
    }
}

/// Strip every specialization constant declaration from `source`, assigning sequential ids
/// starting at `first_id`.
pub(crate) fn extract_spec_constants(
    source: &str,
    first_id: u32,
) -> Result<(String, Vec<SpecConstant>), PreprocessError> {
    let mut output = String::with_capacity(source.len());
    let mut constants = Vec::new();

    for line in source.lines() {
        if let Some(decl) = parse_spec_const(line)? {
            constants.push(SpecConstant {
                id: first_id + constants.len() as u32,
                ty: decl.ty.to_string(),
                name: decl.name.to_string(),
                value: decl.value.to_string(),
            });
        } else {
            output.push_str(line);
        }
        output.push('\n');
    }

    Ok((output, constants))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn assigns_sequential_ids() {
        let source = "spec_const uint LIGHTS = 4u;\nspec_const bool SHADOWS = true;\nvoid main() {}";
        let (body, constants) = extract_spec_constants(source, 0).unwrap();
        assert_eq!("\n\nvoid main() {}\n", body);
        assert_eq!(
            vec![
                "layout(constant_id = 0) const uint LIGHTS = 4u;",
                "layout(constant_id = 1) const bool SHADOWS = true;",
            ],
            constants
                .iter()
                .map(SpecConstant::declaration)
                .collect::<Vec<_>>()
        );

        let (_, offset) = extract_spec_constants(source, 3).unwrap();
        assert_eq!(4, offset[1].id);
    }
}
