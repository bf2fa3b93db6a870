//! Quality tiers and objects paired with a quality.

use crate::id::QualityId;
use serde::{Deserialize, Serialize};

/// Per-level bonus applied by a quality tier.
pub const QUALITY_STEP: f64 = 0.3;

/// A quality tier definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityDef {
    pub name: String,
    pub level: u32,
}

impl QualityDef {
    /// Multiplier applied to beneficial effects: `1 + 0.3 * level`.
    pub fn multiplier(&self) -> f64 {
        1.0 + QUALITY_STEP * self.level as f64
    }
}

/// A catalog object paired with a quality. Two values are equal only when
/// both the target and the quality match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WithQuality<T> {
    pub target: T,
    pub quality: QualityId,
}

impl<T> WithQuality<T> {
    pub fn new(target: T, quality: QualityId) -> Self {
        Self { target, quality }
    }

    /// Pair `target` with the normal quality.
    pub fn normal(target: T) -> Self {
        Self {
            target,
            quality: QualityId::NORMAL,
        }
    }

    /// Same quality, different target.
    pub fn with_target<U>(&self, target: U) -> WithQuality<U> {
        WithQuality {
            target,
            quality: self.quality,
        }
    }
}
