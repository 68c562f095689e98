//! Output arrangement engine.
//!
//! Turns the pending relations and modes of a set of outputs into absolute
//! positions and a framebuffer size:
//!
//! 1. **Relative placement**: relations (left-of, right-of, above, below,
//!    same-as) are resolved in dependency order, so a target is always
//!    positioned before the outputs anchored to it.
//! 2. **Normalization**: every position is shifted so the bounding box's
//!    top-left corner is (0, 0).
//! 3. **Bounding size**: the smallest framebuffer containing every enabled
//!    output's mode footprint at its resolved position.
//! 4. **Validation**: the size must fit the hardware-reported maximum; a
//!    size below the minimum is clamped up, never rejected.
//!
//! Resolution is all-or-nothing: any failure aborts the whole call and no
//! partial positions are visible to the caller.

mod engine;
mod geometry;

use std::collections::BTreeMap;

use thiserror::Error;

use crate::model::{ModeId, Rotation};

pub use engine::resolve;
pub use geometry::{effective_height, effective_width};

/// Arrangement error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArrangementError {
    /// An output's relation names an output that does not exist
    #[error("relation target `{target}` of output `{output}` does not exist")]
    UnknownRelationTarget {
        /// Output carrying the relation
        output: String,
        /// The nonexistent target name
        target: String,
    },

    /// The relation graph among enabled outputs is not acyclic
    #[error("relation cycle among outputs {0:?}")]
    RelationCycle(Vec<String>),

    /// An output is positioned relative to itself
    #[error("output `{0}` is positioned relative to itself")]
    SelfRelation(String),

    /// The resolved framebuffer exceeds the hardware maximum
    #[error(
        "layout requires {width}x{height}, larger than the maximum screen size {max_width}x{max_height}"
    )]
    ExceedsScreenBounds {
        /// Required framebuffer width
        width: u32,
        /// Required framebuffer height
        height: u32,
        /// Hardware maximum width
        max_width: u32,
        /// Hardware maximum height
        max_height: u32,
    },

    /// A pending rotation is outside the output's supported rotation set
    #[error("rotation {rotation:?} is not supported by output `{output}`")]
    IncapableRotation {
        /// Output carrying the rotation
        output: String,
        /// The unsupported rotation
        rotation: Rotation,
    },

    /// A pending mode id is missing from the screen's mode catalog
    #[error("output `{output}` references unknown mode {mode:?}")]
    UnknownMode {
        /// Output carrying the mode
        output: String,
        /// The unknown mode id
        mode: ModeId,
    },
}

/// Pixel-size constraints the resolved framebuffer must respect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenBounds {
    /// Current framebuffer width
    pub current_width: u32,
    /// Current framebuffer height
    pub current_height: u32,
    /// Hardware minimum width
    pub min_width: u32,
    /// Hardware minimum height
    pub min_height: u32,
    /// Hardware maximum width
    pub max_width: u32,
    /// Hardware maximum height
    pub max_height: u32,
}

/// A fully resolved layout: normalized positions and framebuffer size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLayout {
    /// Absolute position of every enabled output, keyed by name. Disabled
    /// outputs are absent.
    pub positions: BTreeMap<String, (i32, i32)>,

    /// Framebuffer width
    pub width: u32,
    /// Framebuffer height
    pub height: u32,
}
