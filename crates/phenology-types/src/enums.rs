//! Enumeration types shared across the phenology workspace.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Phase kinds
// ---------------------------------------------------------------------------

/// The completion rule a phase uses.
///
/// Used for reporting and for the sequencer's stage-setting logic, which
/// treats target-based phases differently from condition-based ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    /// Thermal-time target, optionally scaled by a stress multiplier.
    Generic,
    /// Thermal-time target computed from sowing depth.
    Emerging,
    /// Soil-water condition test, no target.
    Germinating,
    /// Remaining-leaf target driven by the leaf appearance rate.
    LeafAppearance,
    /// Absolute leaf-tip count target.
    NodeNumber,
    /// Dead-leaf threshold tied to final leaf number.
    LeafDeath,
    /// Delegated to an external gene-expression model.
    Vernalisation,
    /// Day-length threshold crossing.
    Photoperiod,
    /// Control transfer to another phase.
    Goto,
    /// Terminal phase that never completes.
    End,
}

impl PhaseKind {
    /// Returns `true` if phases of this kind carry an accumulated target that
    /// stage setting can rewind or fast-forward over.
    pub const fn has_target(self) -> bool {
        matches!(
            self,
            Self::Generic | Self::Emerging | Self::LeafAppearance | Self::NodeNumber
        )
    }
}

impl core::fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            Self::Generic => "generic",
            Self::Emerging => "emerging",
            Self::Germinating => "germinating",
            Self::LeafAppearance => "leaf_appearance",
            Self::NodeNumber => "node_number",
            Self::LeafDeath => "leaf_death",
            Self::Vernalisation => "vernalisation",
            Self::Photoperiod => "photoperiod",
            Self::Goto => "goto",
            Self::End => "end",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// Photoperiod
// ---------------------------------------------------------------------------

/// Which way day length must cross a threshold for a photoperiod phase to
/// complete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoperiodDirection {
    /// Complete once day length rises above the threshold.
    #[default]
    Increasing,
    /// Complete once day length falls below the threshold.
    Decreasing,
}
