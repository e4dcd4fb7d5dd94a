use std::str::FromStr;

/// The scalar component type of a format or value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    Bool,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
}

impl ScalarKind {
    /// The size in bytes of one scalar of this kind.
    pub fn byte_width(&self) -> u32 {
        match self {
            ScalarKind::Bool | ScalarKind::Int32 | ScalarKind::UInt32 | ScalarKind::Float32 => 4,
            ScalarKind::Int64 | ScalarKind::UInt64 | ScalarKind::Float64 => 8,
        }
    }
}

/// Image, texel buffer and vertex attribute formats.
///
/// Discriminants match `VkFormat`.
#[repr(u32)]
#[derive(Default, Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum Format {
    #[default]
    Unknown = 0,

    /* 8-bit */
    R8Unorm = 9,
    R8Uint = 13,
    R8Sint = 14,
    R8G8Unorm = 16,
    R8G8Uint = 20,
    R8G8Sint = 21,
    R8G8B8A8Unorm = 37,
    R8G8B8A8Uint = 41,
    R8G8B8A8Sint = 42,
    R8G8B8A8Srgb = 43,

    /* 10-bit */
    A2B10G10R10UnormPack32 = 64,
    A2B10G10R10UintPack32 = 68,

    /* 16-bit */
    R16Uint = 74,
    R16Sint = 75,
    R16Sfloat = 76,
    R16G16Uint = 81,
    R16G16Sint = 82,
    R16G16Sfloat = 83,
    R16G16B16A16Uint = 95,
    R16G16B16A16Sint = 96,
    R16G16B16A16Sfloat = 97,

    /* 32-bit */
    R32Uint = 98,
    R32Sint = 99,
    R32Sfloat = 100,
    R32G32Uint = 101,
    R32G32Sint = 102,
    R32G32Sfloat = 103,
    R32G32B32Uint = 104,
    R32G32B32Sint = 105,
    R32G32B32Sfloat = 106,
    R32G32B32A32Uint = 107,
    R32G32B32A32Sint = 108,
    R32G32B32A32Sfloat = 109,

    /* 64-bit */
    R64Uint = 110,
    R64Sint = 111,
    R64Sfloat = 112,
    R64G64Uint = 113,
    R64G64Sint = 114,
    R64G64Sfloat = 115,
    R64G64B64Uint = 116,
    R64G64B64Sint = 117,
    R64G64B64Sfloat = 118,
    R64G64B64A64Uint = 119,
    R64G64B64A64Sint = 120,
    R64G64B64A64Sfloat = 121,
}

impl Format {
    /// The format of a vertex attribute with `components` scalars of kind `scalar`.
    pub fn from_components(scalar: ScalarKind, components: u32) -> Format {
        use Format::*;
        let table: [Format; 4] = match scalar {
            ScalarKind::Float32 => [R32Sfloat, R32G32Sfloat, R32G32B32Sfloat, R32G32B32A32Sfloat],
            ScalarKind::Int32 => [R32Sint, R32G32Sint, R32G32B32Sint, R32G32B32A32Sint],
            ScalarKind::UInt32 | ScalarKind::Bool => {
                [R32Uint, R32G32Uint, R32G32B32Uint, R32G32B32A32Uint]
            }
            ScalarKind::Float64 => [R64Sfloat, R64G64Sfloat, R64G64B64Sfloat, R64G64B64A64Sfloat],
            ScalarKind::Int64 => [R64Sint, R64G64Sint, R64G64B64Sint, R64G64B64A64Sint],
            ScalarKind::UInt64 => [R64Uint, R64G64Uint, R64G64B64Uint, R64G64B64A64Uint],
        };
        match components {
            1..=4 => table[components as usize - 1],
            _ => Unknown,
        }
    }

    /// The GLSL image format layout qualifier for storage images and texel buffers.
    pub fn glsl_qualifier(&self) -> Option<&'static str> {
        use Format::*;
        Some(match self {
            R8Unorm => "r8",
            R8Uint => "r8ui",
            R8Sint => "r8i",
            R8G8Unorm => "rg8",
            R8G8Uint => "rg8ui",
            R8G8Sint => "rg8i",
            R8G8B8A8Unorm | R8G8B8A8Srgb => "rgba8",
            R8G8B8A8Uint => "rgba8ui",
            R8G8B8A8Sint => "rgba8i",
            A2B10G10R10UnormPack32 => "rgb10_a2",
            A2B10G10R10UintPack32 => "rgb10_a2ui",
            R16Uint => "r16ui",
            R16Sint => "r16i",
            R16Sfloat => "r16f",
            R16G16Uint => "rg16ui",
            R16G16Sint => "rg16i",
            R16G16Sfloat => "rg16f",
            R16G16B16A16Uint => "rgba16ui",
            R16G16B16A16Sint => "rgba16i",
            R16G16B16A16Sfloat => "rgba16f",
            R32Uint => "r32ui",
            R32Sint => "r32i",
            R32Sfloat => "r32f",
            R32G32Uint => "rg32ui",
            R32G32Sint => "rg32i",
            R32G32Sfloat => "rg32f",
            R32G32B32A32Uint => "rgba32ui",
            R32G32B32A32Sint => "rgba32i",
            R32G32B32A32Sfloat => "rgba32f",
            R64Uint => "r64ui",
            R64Sint => "r64i",
            _ => return None,
        })
    }

    /// The prefix of GLSL opaque types sampling this format: `i`, `u`, or nothing for floats.
    pub fn sampled_prefix(&self) -> &'static str {
        use Format::*;
        match self {
            R8Uint | R8G8Uint | R8G8B8A8Uint | A2B10G10R10UintPack32 | R16Uint | R16G16Uint
            | R16G16B16A16Uint | R32Uint | R32G32Uint | R32G32B32Uint | R32G32B32A32Uint
            | R64Uint | R64G64Uint | R64G64B64Uint | R64G64B64A64Uint => "u",
            R8Sint | R8G8Sint | R8G8B8A8Sint | R16Sint | R16G16Sint | R16G16B16A16Sint
            | R32Sint | R32G32Sint | R32G32B32Sint | R32G32B32A32Sint | R64Sint | R64G64Sint
            | R64G64B64Sint | R64G64B64A64Sint => "i",
            _ => "",
        }
    }
}

impl FromStr for Format {
    type Err = crate::descriptor::ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Format::*;
        Ok(match s {
            "UNKNOWN" => Unknown,

            "R8_UNORM" => R8Unorm,
            "R8_UINT" => R8Uint,
            "R8_SINT" => R8Sint,
            "R8G8_UNORM" => R8G8Unorm,
            "R8G8_UINT" => R8G8Uint,
            "R8G8_SINT" => R8G8Sint,
            "R8G8B8A8_UNORM" => R8G8B8A8Unorm,
            "R8G8B8A8_UINT" => R8G8B8A8Uint,
            "R8G8B8A8_SINT" => R8G8B8A8Sint,
            "R8G8B8A8_SRGB" => R8G8B8A8Srgb,

            "A2B10G10R10_UNORM_PACK32" => A2B10G10R10UnormPack32,
            "A2B10G10R10_UINT_PACK32" => A2B10G10R10UintPack32,

            "R16_UINT" => R16Uint,
            "R16_SINT" => R16Sint,
            "R16_SFLOAT" => R16Sfloat,
            "R16G16_UINT" => R16G16Uint,
            "R16G16_SINT" => R16G16Sint,
            "R16G16_SFLOAT" => R16G16Sfloat,
            "R16G16B16A16_UINT" => R16G16B16A16Uint,
            "R16G16B16A16_SINT" => R16G16B16A16Sint,
            "R16G16B16A16_SFLOAT" => R16G16B16A16Sfloat,

            "R32_UINT" => R32Uint,
            "R32_SINT" => R32Sint,
            "R32_SFLOAT" => R32Sfloat,
            "R32G32_UINT" => R32G32Uint,
            "R32G32_SINT" => R32G32Sint,
            "R32G32_SFLOAT" => R32G32Sfloat,
            "R32G32B32_UINT" => R32G32B32Uint,
            "R32G32B32_SINT" => R32G32B32Sint,
            "R32G32B32_SFLOAT" => R32G32B32Sfloat,
            "R32G32B32A32_UINT" => R32G32B32A32Uint,
            "R32G32B32A32_SINT" => R32G32B32A32Sint,
            "R32G32B32A32_SFLOAT" => R32G32B32A32Sfloat,

            "R64_UINT" => R64Uint,
            "R64_SINT" => R64Sint,
            "R64_SFLOAT" => R64Sfloat,
            _ => {
                return Err(crate::descriptor::ParseKindError {
                    what: "format",
                    value: s.to_string(),
                })
            }
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn vertex_formats_from_components() {
        assert_eq!(
            Format::R32G32B32Sfloat,
            Format::from_components(ScalarKind::Float32, 3)
        );
        assert_eq!(Format::R32Sint, Format::from_components(ScalarKind::Int32, 1));
        assert_eq!(Format::Unknown, Format::from_components(ScalarKind::Float32, 5));
    }

    #[test]
    fn storage_qualifiers() {
        assert_eq!(Some("rgba8"), Format::R8G8B8A8Unorm.glsl_qualifier());
        assert_eq!(Some("r32f"), "R32_SFLOAT".parse::<Format>().unwrap().glsl_qualifier());
        assert_eq!("u", Format::R32Uint.sampled_prefix());
    }
}
