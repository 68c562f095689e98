//! # randrkit
//!
//! High-level multi-output screen arrangement for RandR-style display
//! systems.
//!
//! The crate enumerates outputs (physical connectors), CRTCs (hardware
//! pipes), and display modes from a caller-supplied backend, lets the caller
//! stage per-output desired state, and resolves relative positioning
//! directives (left-of, right-of, above, below, same-as) into a consistent
//! absolute layout before committing it atomically.
//!
//! # Architecture
//!
//! ```text
//! randrkit
//!   ├─> DisplayBackend (trait): enumeration queries + stamped commit calls
//!   ├─> Model: Mode catalog, CRTC descriptors, Output descriptors
//!   ├─> Layout Engine: relation resolution, normalization, bounds checks
//!   ├─> Screen: owns the model, orchestrates resolve → validate → commit
//!   └─> Layout Profiles: declarative TOML arrangement staging
//! ```
//!
//! # Data Flow
//!
//! **Load:** backend queries → mode/CRTC/output descriptors → `Screen`
//!
//! **Stage:** caller (or a [`config::LayoutProfile`]) mutates pending state
//!
//! **Commit:** `Screen::apply_output_layout` → layout engine → backend
//!
//! # Example
//!
//! ```no_run
//! use randrkit::{Relation, Screen};
//!
//! # fn connect() -> Box<dyn randrkit::DisplayBackend> { unimplemented!() }
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut screen = Screen::load(connect())?;
//!
//! let laptop = screen.output_mut("eDP-1").expect("no such output");
//! laptop.set_preferred_mode();
//!
//! let external = screen.output_mut("DP-1").expect("no such output");
//! external.set_preferred_mode();
//! external.set_relation(Relation::RightOf, "eDP-1");
//!
//! let layout = screen.apply_output_layout(None)?;
//! println!("framebuffer is now {}x{}", layout.width, layout.height);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Display server boundary: enumeration queries and stamped commit calls
pub mod backend;

/// Declarative layout profiles
pub mod config;

/// Output arrangement engine
pub mod layout;

/// Data model: modes, CRTCs, outputs
pub mod model;

/// Screen aggregate and commit orchestration
pub mod screen;

pub use backend::{BackendError, DisplayBackend, RandrVersion, ScreenGeometry, Timestamp};
pub use config::{ConfigError, LayoutProfile, OutputProfile};
pub use layout::{
    effective_height, effective_width, ArrangementError, ResolvedLayout, ScreenBounds,
};
pub use model::{
    ChangeFlag, Connection, CrtcDescriptor, CrtcId, Mode, ModeCatalog, ModeId, OutputDescriptor,
    OutputId, OutputInfo, PendingState, Reflection, Relation, Rotation,
};
pub use screen::{Screen, ScreenError};
