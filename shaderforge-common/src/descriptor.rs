use bitflags::bitflags;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The kind of a descriptor-bound resource.
///
/// Discriminants match `VkDescriptorType` where a Vulkan equivalent exists.
#[repr(u32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorKind {
    Sampler = 0,
    CombinedImageSampler = 1,
    SampledImage = 2,
    StorageImage = 3,
    UniformTexelBuffer = 4,
    StorageTexelBuffer = 5,
    UniformBuffer = 6,
    StorageBuffer = 7,
    InputAttachment = 10,
    AccelerationStructure = 1_000_150_000,
    /// A push-constant block. Not a Vulkan descriptor type; push constants consume no binding.
    PushConstant = 0x7fff_0000,
}

/// Error returned when a descriptor kind or dimension could not be parsed.
#[derive(Debug, thiserror::Error)]
#[error("unknown {what} `{value}`")]
pub struct ParseKindError {
    pub what: &'static str,
    pub value: String,
}

impl DescriptorKind {
    /// Descriptor kinds that are enumerated when reflecting a compiled binary, in order.
    pub const REFLECTED: [DescriptorKind; 9] = [
        DescriptorKind::UniformBuffer,
        DescriptorKind::StorageBuffer,
        DescriptorKind::InputAttachment,
        DescriptorKind::SampledImage,
        DescriptorKind::Sampler,
        DescriptorKind::CombinedImageSampler,
        DescriptorKind::StorageImage,
        DescriptorKind::UniformTexelBuffer,
        DescriptorKind::StorageTexelBuffer,
    ];

    /// Whether the kind is a buffer that shaders can only read.
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            DescriptorKind::UniformBuffer
                | DescriptorKind::UniformTexelBuffer
                | DescriptorKind::Sampler
                | DescriptorKind::CombinedImageSampler
                | DescriptorKind::SampledImage
                | DescriptorKind::InputAttachment
        )
    }

    /// Whether the kind occupies a binding slot in a descriptor set.
    pub fn is_descriptor(&self) -> bool {
        !matches!(self, DescriptorKind::PushConstant)
    }
}

impl FromStr for DescriptorKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "sampler" => Self::Sampler,
            "combined_image_sampler" | "sampler2D" | "texture" => Self::CombinedImageSampler,
            "sampled_image" => Self::SampledImage,
            "storage_image" | "image" => Self::StorageImage,
            "uniform_texel_buffer" => Self::UniformTexelBuffer,
            "storage_texel_buffer" => Self::StorageTexelBuffer,
            "uniform_buffer" | "ubo" => Self::UniformBuffer,
            "storage_buffer" | "ssbo" => Self::StorageBuffer,
            "input_attachment" => Self::InputAttachment,
            "acceleration_structure" => Self::AccelerationStructure,
            "push_constant" => Self::PushConstant,
            _ => {
                return Err(ParseKindError {
                    what: "descriptor kind",
                    value: s.to_string(),
                })
            }
        })
    }
}

impl Display for DescriptorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DescriptorKind::Sampler => "sampler",
            DescriptorKind::CombinedImageSampler => "combined_image_sampler",
            DescriptorKind::SampledImage => "sampled_image",
            DescriptorKind::StorageImage => "storage_image",
            DescriptorKind::UniformTexelBuffer => "uniform_texel_buffer",
            DescriptorKind::StorageTexelBuffer => "storage_texel_buffer",
            DescriptorKind::UniformBuffer => "uniform_buffer",
            DescriptorKind::StorageBuffer => "storage_buffer",
            DescriptorKind::InputAttachment => "input_attachment",
            DescriptorKind::AccelerationStructure => "acceleration_structure",
            DescriptorKind::PushConstant => "push_constant",
        })
    }
}

bitflags! {
    /// How a stage accesses a resource.
    #[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
    #[derive(serde::Serialize, serde::Deserialize)]
    #[serde(transparent)]
    pub struct AccessModifier: u32 {
        const NONE = 0;
        const READ = 0b01;
        const WRITE = 0b10;
        const READ_WRITE = Self::READ.bits() | Self::WRITE.bits();
    }
}

impl AccessModifier {
    /// Interpret a GLSL memory qualifier list such as `readonly` or `writeonly coherent`.
    ///
    /// Returns `None` if the list names neither `readonly` nor `writeonly`.
    pub fn from_qualifiers(qualifiers: &str) -> Option<AccessModifier> {
        let mut readonly = false;
        let mut writeonly = false;
        for qualifier in qualifiers.split_whitespace() {
            match qualifier {
                "readonly" => readonly = true,
                "writeonly" => writeonly = true,
                _ => {}
            }
        }
        match (readonly, writeonly) {
            (true, true) => Some(AccessModifier::NONE),
            (true, false) => Some(AccessModifier::READ),
            (false, true) => Some(AccessModifier::WRITE),
            (false, false) => None,
        }
    }
}

/// The dimensionality of an image resource.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum ImageDimension {
    #[serde(rename = "1D")]
    D1,
    #[default]
    #[serde(rename = "2D")]
    D2,
    #[serde(rename = "3D")]
    D3,
    #[serde(rename = "Cube")]
    Cube,
    #[serde(rename = "1DArray")]
    D1Array,
    #[serde(rename = "2DArray")]
    D2Array,
    #[serde(rename = "CubeArray")]
    CubeArray,
    #[serde(rename = "2DMS")]
    D2Multisample,
    #[serde(rename = "2DMSArray")]
    D2MultisampleArray,
}

impl ImageDimension {
    /// The suffix used by GLSL opaque type names, e.g. `2D` in `sampler2D`.
    pub fn glsl_suffix(&self) -> &'static str {
        match self {
            ImageDimension::D1 => "1D",
            ImageDimension::D2 => "2D",
            ImageDimension::D3 => "3D",
            ImageDimension::Cube => "Cube",
            ImageDimension::D1Array => "1DArray",
            ImageDimension::D2Array => "2DArray",
            ImageDimension::CubeArray => "CubeArray",
            ImageDimension::D2Multisample => "2DMS",
            ImageDimension::D2MultisampleArray => "2DMSArray",
        }
    }
}

impl FromStr for ImageDimension {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "1D" => Self::D1,
            "2D" => Self::D2,
            "3D" => Self::D3,
            "Cube" => Self::Cube,
            "1DArray" => Self::D1Array,
            "2DArray" => Self::D2Array,
            "CubeArray" => Self::CubeArray,
            "2DMS" => Self::D2Multisample,
            "2DMSArray" => Self::D2MultisampleArray,
            _ => {
                return Err(ParseKindError {
                    what: "image dimension",
                    value: s.to_string(),
                })
            }
        })
    }
}
