//! The three knobs that shape an enhancement request.
//!
//! The upscale factor and creativity level carry their invariants in the
//! type: an [`UpscaleFactor`] can only be one of 2, 4, 8 or 16 and a
//! [`CreativityLevel`] can only hold 0–100. The free-text instruction is
//! never validated; an empty string is a legal request.

use crate::error::EnhanceError;
use crate::prompts::DEFAULT_INSTRUCTION;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How much larger the output should be than the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum UpscaleFactor {
    X2,
    #[default]
    X4,
    X8,
    X16,
}

impl UpscaleFactor {
    /// Every selectable factor, in ascending order.
    pub const ALL: [UpscaleFactor; 4] = [
        UpscaleFactor::X2,
        UpscaleFactor::X4,
        UpscaleFactor::X8,
        UpscaleFactor::X16,
    ];

    pub fn factor(self) -> u32 {
        match self {
            UpscaleFactor::X2 => 2,
            UpscaleFactor::X4 => 4,
            UpscaleFactor::X8 => 8,
            UpscaleFactor::X16 => 16,
        }
    }
}

impl TryFrom<u32> for UpscaleFactor {
    type Error = EnhanceError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(UpscaleFactor::X2),
            4 => Ok(UpscaleFactor::X4),
            8 => Ok(UpscaleFactor::X8),
            16 => Ok(UpscaleFactor::X16),
            other => Err(EnhanceError::InvalidParameter(format!(
                "upscale factor must be one of 2, 4, 8, 16 (got {other})"
            ))),
        }
    }
}

impl From<UpscaleFactor> for u32 {
    fn from(f: UpscaleFactor) -> Self {
        f.factor()
    }
}

impl fmt::Display for UpscaleFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.factor())
    }
}

/// How far the model may stray from the source image. Range: 0–100. Default: 75.
///
/// Higher values let the model invent more detail; lower values keep it
/// closer to the original pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct CreativityLevel(u8);

impl CreativityLevel {
    pub const MAX: u8 = 100;

    pub fn new(level: u8) -> Result<Self, EnhanceError> {
        if level > Self::MAX {
            return Err(EnhanceError::InvalidParameter(format!(
                "creativity level must be 0–100 (got {level})"
            )));
        }
        Ok(Self(level))
    }

    /// Clamp an arbitrary slider value into range.
    pub fn saturating(level: u32) -> Self {
        Self(level.min(Self::MAX as u32) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for CreativityLevel {
    fn default() -> Self {
        Self(75)
    }
}

impl TryFrom<u8> for CreativityLevel {
    type Error = EnhanceError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CreativityLevel> for u8 {
    fn from(c: CreativityLevel) -> Self {
        c.0
    }
}

impl fmt::Display for CreativityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything the user can tune before submitting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformParameters {
    /// Free-text request forwarded verbatim to the model.
    pub instruction: String,
    pub upscale_factor: UpscaleFactor,
    pub creativity_level: CreativityLevel,
}

impl Default for TransformParameters {
    fn default() -> Self {
        Self {
            instruction: DEFAULT_INSTRUCTION.to_string(),
            upscale_factor: UpscaleFactor::default(),
            creativity_level: CreativityLevel::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_control_panel() {
        let p = TransformParameters::default();
        assert_eq!(p.upscale_factor.factor(), 4);
        assert_eq!(p.creativity_level.value(), 75);
        assert_eq!(p.instruction, DEFAULT_INSTRUCTION);
    }

    #[test]
    fn upscale_factor_rejects_values_outside_set() {
        for ok in [2u32, 4, 8, 16] {
            assert_eq!(UpscaleFactor::try_from(ok).unwrap().factor(), ok);
        }
        for bad in [0u32, 1, 3, 6, 32] {
            assert!(UpscaleFactor::try_from(bad).is_err(), "{bad} accepted");
        }
    }

    #[test]
    fn creativity_bounds() {
        assert!(CreativityLevel::new(0).is_ok());
        assert!(CreativityLevel::new(100).is_ok());
        assert!(CreativityLevel::new(101).is_err());
        assert_eq!(CreativityLevel::saturating(250).value(), 100);
    }

    #[test]
    fn parameters_serialise_factor_as_integer() {
        let p = TransformParameters {
            instruction: String::new(),
            upscale_factor: UpscaleFactor::X8,
            creativity_level: CreativityLevel::new(30).unwrap(),
        };
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["upscale_factor"], 8);
        assert_eq!(json["creativity_level"], 30);

        let bad = r#"{"instruction":"","upscale_factor":3,"creativity_level":30}"#;
        assert!(serde_json::from_str::<TransformParameters>(bad).is_err());
    }
}
