//! Effective mode geometry under rotation.

use crate::model::{Mode, Rotation};

/// Width a mode occupies in the framebuffer under the given rotation.
///
/// 90 and 270 degree rotations swap the axes.
pub fn effective_width(mode: &Mode, rotation: Rotation) -> u32 {
    if rotation.swaps_axes() {
        mode.height
    } else {
        mode.width
    }
}

/// Height a mode occupies in the framebuffer under the given rotation.
pub fn effective_height(mode: &Mode, rotation: Rotation) -> u32 {
    if rotation.swaps_axes() {
        mode.width
    } else {
        mode.height
    }
}
