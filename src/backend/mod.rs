//! Display server boundary.
//!
//! Everything the screen aggregate needs from the display server goes
//! through [`DisplayBackend`]: enumeration queries populating the data
//! model, and the commands that commit a resolved layout. The crate ships no
//! server implementation of its own; callers supply one (an X RandR
//! connection in practice, a scripted fake in tests).
//!
//! Every hardware-mutating command is stamped with a configuration
//! [`Timestamp`] fetched immediately before the call. The server rejects a
//! commit carrying a stale stamp instead of reordering it; that rejection
//! surfaces as [`BackendError::StaleCommit`] and is never retried here.

use std::fmt;

use enumflags2::BitFlags;
use thiserror::Error;

use crate::model::{CrtcDescriptor, CrtcId, Mode, ModeId, OutputId, OutputInfo, Reflection, Rotation};

/// Extension version reported by the display server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RandrVersion {
    /// Major version
    pub major: u32,
    /// Minor version
    pub minor: u32,
}

impl RandrVersion {
    /// Construct a version.
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for RandrVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Server-issued configuration timestamp guarding commit ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(pub u64);

/// Current pixel size, physical size, and hardware pixel-size bounds of the
/// screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenGeometry {
    /// Current framebuffer width in pixels
    pub width: u32,
    /// Current framebuffer height in pixels
    pub height: u32,

    /// Current physical width in millimeters
    pub mm_width: u32,
    /// Current physical height in millimeters
    pub mm_height: u32,

    /// Minimum framebuffer width the hardware accepts
    pub min_width: u32,
    /// Minimum framebuffer height the hardware accepts
    pub min_height: u32,
    /// Maximum framebuffer width the hardware accepts
    pub max_width: u32,
    /// Maximum framebuffer height the hardware accepts
    pub max_height: u32,
}

/// Backend error types.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The server rejected a commit stamped with a stale configuration
    /// timestamp. The caller should re-enumerate and retry.
    #[error("display server rejected commit: stale configuration timestamp")]
    StaleCommit,

    /// The RandR extension is not available on this server
    #[error("the RandR extension is not available")]
    ExtensionMissing,

    /// The server reported a request failure
    #[error("display server request failed: {0}")]
    Request(String),

    /// Transport-level failure talking to the server
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Interface to the hardware-enumeration and commit collaborator.
pub trait DisplayBackend {
    /// Query the extension version.
    ///
    /// # Errors
    ///
    /// [`BackendError::ExtensionMissing`] when the server lacks the
    /// extension.
    fn query_version(&mut self) -> Result<RandrVersion, BackendError>;

    /// List every mode in the screen's resources.
    fn list_modes(&mut self) -> Result<Vec<Mode>, BackendError>;

    /// List every CRTC with its current configuration and capabilities.
    fn list_crtcs(&mut self) -> Result<Vec<CrtcDescriptor>, BackendError>;

    /// List every output connector with its hardware-reported attributes.
    fn list_outputs(&mut self) -> Result<Vec<OutputInfo>, BackendError>;

    /// Current screen pixel size, physical size, and hardware bounds.
    fn screen_geometry(&mut self) -> Result<ScreenGeometry, BackendError>;

    /// Fetch the current configuration timestamp. Must be called immediately
    /// before each mutating command.
    fn config_timestamp(&mut self) -> Result<Timestamp, BackendError>;

    /// Set the screen pixel size and physical size.
    fn set_screen_size(
        &mut self,
        width: u32,
        height: u32,
        mm_width: u32,
        mm_height: u32,
    ) -> Result<(), BackendError>;

    /// Assign a mode, position, rotation, and output set to a CRTC.
    #[allow(clippy::too_many_arguments)]
    fn set_crtc_config(
        &mut self,
        crtc: CrtcId,
        timestamp: Timestamp,
        x: i32,
        y: i32,
        mode: ModeId,
        rotation: Rotation,
        reflection: BitFlags<Reflection>,
        outputs: &[OutputId],
    ) -> Result<(), BackendError>;

    /// Disable a CRTC (null mode, empty output set).
    fn disable_crtc(&mut self, crtc: CrtcId, timestamp: Timestamp) -> Result<(), BackendError>;
}
