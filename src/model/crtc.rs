//! CRTC (hardware pipe) descriptors.
//!
//! A CRTC drives one or more outputs with a given mode, position, and
//! rotation. Descriptors are loaded once per configuration session and are
//! read-mostly; they are only mutated by the commit path in
//! [`crate::screen::Screen::apply_output_layout`].

use enumflags2::BitFlags;

use crate::model::mode::ModeId;
use crate::model::output::{OutputId, Reflection, Rotation};

/// Server-assigned identity of a CRTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CrtcId(pub u64);

/// A hardware pipe and its current configuration.
#[derive(Debug, Clone)]
pub struct CrtcDescriptor {
    /// Server-assigned CRTC identity
    pub id: CrtcId,

    /// Current X position in the framebuffer
    pub x: i32,
    /// Current Y position in the framebuffer
    pub y: i32,
    /// Current width in pixels (post-rotation)
    pub width: u32,
    /// Current height in pixels (post-rotation)
    pub height: u32,

    /// Currently driven mode, if the pipe is active
    pub mode: Option<ModeId>,

    /// Current rotation
    pub rotation: Rotation,
    /// Current reflection flags
    pub reflection: BitFlags<Reflection>,

    /// Outputs currently attached to this pipe
    pub outputs: Vec<OutputId>,

    /// Rotations this pipe can apply
    pub supported_rotations: BitFlags<Rotation>,
    /// Reflections this pipe can apply
    pub supported_reflections: BitFlags<Reflection>,

    /// Outputs this pipe is capable of driving
    pub candidate_outputs: Vec<OutputId>,
}

impl CrtcDescriptor {
    /// Whether the pipe is currently driving a mode.
    pub fn is_active(&self) -> bool {
        self.mode.is_some()
    }

    /// Whether the pipe can apply the given rotation and reflection flags.
    pub fn supports_rotation(&self, rotation: Rotation, reflection: BitFlags<Reflection>) -> bool {
        self.supported_rotations.contains(rotation)
            && self.supported_reflections.contains(reflection)
    }

    /// Whether the pipe is capable of driving the given output.
    pub fn supports_output(&self, output: OutputId) -> bool {
        self.candidate_outputs.contains(&output)
    }
}
