use bitflags::bitflags;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

bitflags! {
    /// Shader stage bits. The values match `VkShaderStageFlagBits`.
    #[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
    #[derive(serde::Serialize, serde::Deserialize)]
    #[serde(transparent)]
    pub struct ShaderStage: u32 {
        const VERTEX = 0x0000_0001;
        const TESSELLATION_CONTROL = 0x0000_0002;
        const TESSELLATION_EVALUATION = 0x0000_0004;
        const GEOMETRY = 0x0000_0008;
        const FRAGMENT = 0x0000_0010;
        const COMPUTE = 0x0000_0020;
        const TASK = 0x0000_0040;
        const MESH = 0x0000_0080;
    }
}

/// Error returned when a stage name could not be parsed.
#[derive(Debug, thiserror::Error)]
#[error("unknown shader stage `{0}`")]
pub struct UnknownStage(pub String);

impl ShaderStage {
    /// All single-stage bits, in pipeline order.
    pub const ALL_STAGES: [ShaderStage; 8] = [
        ShaderStage::VERTEX,
        ShaderStage::TESSELLATION_CONTROL,
        ShaderStage::TESSELLATION_EVALUATION,
        ShaderStage::GEOMETRY,
        ShaderStage::TASK,
        ShaderStage::MESH,
        ShaderStage::FRAGMENT,
        ShaderStage::COMPUTE,
    ];

    /// Whether exactly one stage bit is set.
    pub fn is_single(&self) -> bool {
        self.bits().count_ones() == 1
    }

    /// The short name of a single stage, as used in file extensions and catalog documents.
    pub fn short_name(&self) -> &'static str {
        const NAMES: [(ShaderStage, &str); 8] = [
            (ShaderStage::VERTEX, "vert"),
            (ShaderStage::TESSELLATION_CONTROL, "tesc"),
            (ShaderStage::TESSELLATION_EVALUATION, "tese"),
            (ShaderStage::GEOMETRY, "geom"),
            (ShaderStage::FRAGMENT, "frag"),
            (ShaderStage::COMPUTE, "comp"),
            (ShaderStage::TASK, "task"),
            (ShaderStage::MESH, "mesh"),
        ];
        NAMES
            .iter()
            .find(|(stage, _)| stage == self)
            .map(|(_, name)| *name)
            .unwrap_or("mixed")
    }

    /// Whether the stage writes `gl_Position` through a `gl_PerVertex` output block.
    pub fn has_per_vertex_output(&self) -> bool {
        self.is_single()
            && self.intersects(
                ShaderStage::VERTEX
                    | ShaderStage::GEOMETRY
                    | ShaderStage::TESSELLATION_EVALUATION,
            )
    }

    /// Whether interface inputs of this stage are per-vertex arrays.
    pub fn has_arrayed_inputs(&self) -> bool {
        self.is_single()
            && self.intersects(
                ShaderStage::GEOMETRY
                    | ShaderStage::TESSELLATION_CONTROL
                    | ShaderStage::TESSELLATION_EVALUATION,
            )
    }

    /// Iterate the single-stage bits contained in this mask, in pipeline order.
    pub fn stages(self) -> impl Iterator<Item = ShaderStage> {
        Self::ALL_STAGES
            .into_iter()
            .filter(move |stage| self.contains(*stage))
    }
}

impl FromStr for ShaderStage {
    type Err = UnknownStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "vert" | "vertex" => ShaderStage::VERTEX,
            "tesc" | "tessellation_control" | "hull" => ShaderStage::TESSELLATION_CONTROL,
            "tese" | "tessellation_evaluation" | "domain" => ShaderStage::TESSELLATION_EVALUATION,
            "geom" | "geometry" => ShaderStage::GEOMETRY,
            "frag" | "fragment" | "pixel" => ShaderStage::FRAGMENT,
            "comp" | "compute" => ShaderStage::COMPUTE,
            "task" => ShaderStage::TASK,
            "mesh" => ShaderStage::MESH,
            _ => return Err(UnknownStage(s.to_string())),
        })
    }
}

impl Display for ShaderStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_single() {
            return f.write_str(self.short_name());
        }
        let mut first = true;
        for stage in self.stages() {
            if !first {
                f.write_str("|")?;
            }
            f.write_str(stage.short_name())?;
            first = false;
        }
        Ok(())
    }
}

/// Identifies one shader stage instance.
///
/// An identity is the stable hash of the stage's declared name together with its stage bit.
/// It is the only key used by the source cache and by every per-stage table, and it is never
/// recomputed once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct ShaderStageIdentity {
    name_hash: u64,
    stage: ShaderStage,
}

impl ShaderStageIdentity {
    /// Create the identity of the stage `stage` of the shader named `name`.
    pub fn new(name: &str, stage: ShaderStage) -> Self {
        ShaderStageIdentity {
            name_hash: stable_name_hash(name),
            stage,
        }
    }

    /// Reassemble an identity from its raw parts.
    pub const fn from_parts(name_hash: u64, stage: ShaderStage) -> Self {
        ShaderStageIdentity { name_hash, stage }
    }

    pub fn name_hash(&self) -> u64 {
        self.name_hash
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }
}

impl Display for ShaderStageIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}:{}", self.name_hash, self.stage)
    }
}

/// Hash a declared name into a value that is stable across processes and platforms.
pub fn stable_name_hash(name: &str) -> u64 {
    let hash = blake3::hash(name.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn identity_distinguishes_stage() {
        let vertex = ShaderStageIdentity::new("lit", ShaderStage::VERTEX);
        let fragment = ShaderStageIdentity::new("lit", ShaderStage::FRAGMENT);
        assert_ne!(vertex, fragment);
        assert_eq!(vertex.name_hash(), fragment.name_hash());
        assert_eq!(vertex, ShaderStageIdentity::new("lit", ShaderStage::VERTEX));
    }

    #[test]
    fn identity_orders_by_hash_then_stage() {
        let a = ShaderStageIdentity::from_parts(1, ShaderStage::FRAGMENT);
        let b = ShaderStageIdentity::from_parts(2, ShaderStage::VERTEX);
        let c = ShaderStageIdentity::from_parts(2, ShaderStage::FRAGMENT);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn parses_stage_names() {
        assert_eq!(ShaderStage::VERTEX, "vertex".parse().unwrap());
        assert_eq!(ShaderStage::FRAGMENT, "frag".parse().unwrap());
        assert!("banana".parse::<ShaderStage>().is_err());
    }

    #[test]
    fn displays_masks() {
        let mask = ShaderStage::VERTEX | ShaderStage::FRAGMENT;
        assert_eq!("vert|frag", mask.to_string());
        assert_eq!(2, mask.stages().count());
    }
}
