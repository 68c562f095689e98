//! Data model for screen configuration: modes, CRTCs, and outputs.
//!
//! All entities are arena-style values owned by the screen aggregate and
//! referenced by server-assigned ids ([`ModeId`], [`CrtcId`], [`OutputId`]).
//! Nothing here talks to the display server; descriptors are populated from
//! [`crate::backend::DisplayBackend`] queries and mutated locally.

mod crtc;
mod mode;
mod output;

pub use crtc::{CrtcDescriptor, CrtcId};
pub use mode::{Mode, ModeCatalog, ModeId};
pub use output::{
    ChangeFlag, Connection, OutputDescriptor, OutputId, OutputInfo, PendingState, Reflection,
    Relation, Rotation,
};
