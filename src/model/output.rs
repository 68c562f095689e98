//! Output descriptors and their pending desired state.
//!
//! An output is a physical display connector. Each descriptor carries two
//! kinds of state: the hardware-reported attributes captured at enumeration
//! time ([`OutputInfo`]), and a pending desired state mutated by the caller
//! before layout resolution ([`PendingState`]). A [`ChangeFlag`] set records
//! which pending fields were touched since the last resolution; a full
//! resolution over every enabled output always produces the same result as a
//! by-need one, so the flags are an optimization hint, never a correctness
//! requirement.

use enumflags2::{bitflags, BitFlag, BitFlags};

use crate::model::crtc::CrtcId;
use crate::model::mode::ModeId;

/// Server-assigned identity of an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputId(pub u64);

/// Rotation of an output's content.
#[bitflags]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    /// No rotation
    Normal = 0b0001,
    /// 90 degrees clockwise
    Rotate90 = 0b0010,
    /// 180 degrees
    Rotate180 = 0b0100,
    /// 270 degrees clockwise
    Rotate270 = 0b1000,
}

impl Default for Rotation {
    fn default() -> Self {
        Rotation::Normal
    }
}

impl Rotation {
    /// Whether this rotation swaps the horizontal and vertical axes.
    pub fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Rotate90 | Rotation::Rotate270)
    }
}

/// Reflection of an output's content along an axis.
#[bitflags]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reflection {
    /// Mirror along the X axis
    X = 0b01,
    /// Mirror along the Y axis
    Y = 0b10,
}

/// Directional positioning constraint between two outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Place this output to the left of the target
    LeftOf,
    /// Place this output to the right of the target
    RightOf,
    /// Place this output above the target
    Above,
    /// Place this output below the target
    Below,
    /// Place this output at the same position as the target (clone geometry)
    SameAs,
}

/// Connection state of an output as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connection {
    /// A display device is attached
    Connected,
    /// No display device is attached
    Disconnected,
    /// The server cannot determine the connection state
    Unknown,
}

/// Pending fields touched since the last resolution.
#[bitflags]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFlag {
    /// CRTC assignment changed
    Crtc = 0b00_0001,
    /// Target mode changed
    Mode = 0b00_0010,
    /// Relation changed
    Relation = 0b00_0100,
    /// Resolved position changed
    Position = 0b00_1000,
    /// Rotation changed
    Rotation = 0b01_0000,
    /// Reflection changed
    Reflection = 0b10_0000,
}

/// Hardware-reported attributes of an output, captured at enumeration time.
#[derive(Debug, Clone)]
pub struct OutputInfo {
    /// Server-assigned output identity
    pub id: OutputId,

    /// Connector name, unique per screen (e.g. "DP-1", "HDMI-A-1")
    pub name: String,

    /// Physical width in millimeters as reported by the display device
    pub mm_width: u32,
    /// Physical height in millimeters as reported by the display device
    pub mm_height: u32,

    /// Connection state
    pub connection: Connection,

    /// CRTC the output is currently attached to, or `None` when inactive
    pub crtc: Option<CrtcId>,

    /// CRTCs the output could be attached to
    pub candidate_crtcs: Vec<CrtcId>,

    /// Modes the connected device supports
    pub modes: Vec<ModeId>,

    /// Index into `modes` of the device's preferred mode
    pub preferred_mode: usize,

    /// Outputs this one can share a CRTC with
    pub clones: Vec<OutputId>,
}

/// Desired state staged by the caller, applied on the next commit.
#[derive(Debug, Clone, Default)]
pub struct PendingState {
    /// Target mode; `None` disables the output
    pub mode: Option<ModeId>,

    /// Explicit CRTC assignment, overriding the current attachment
    pub crtc: Option<CrtcId>,

    /// Target rotation
    pub rotation: Rotation,

    /// Target reflection flags
    pub reflection: BitFlags<Reflection>,

    /// Positioning constraint relative to another named output
    pub relation: Option<(Relation, String)>,

    /// Absolute position, filled in by layout resolution
    pub position: Option<(i32, i32)>,
}

/// A named display connector with hardware-reported and pending state.
#[derive(Debug, Clone)]
pub struct OutputDescriptor {
    info: OutputInfo,
    pending: PendingState,
    changes: BitFlags<ChangeFlag>,
    supported_rotations: BitFlags<Rotation>,
}

impl OutputDescriptor {
    /// Wrap enumerated hardware state into a descriptor.
    ///
    /// `supported_rotations` is the intersection of the rotation sets of the
    /// output's candidate CRTCs, computed by the screen aggregate at load
    /// time.
    pub(crate) fn new(info: OutputInfo, supported_rotations: BitFlags<Rotation>) -> Self {
        Self {
            info,
            pending: PendingState::default(),
            changes: ChangeFlag::empty(),
            supported_rotations,
        }
    }

    /// Server-assigned identity.
    pub fn id(&self) -> OutputId {
        self.info.id
    }

    /// Connector name.
    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Physical width in millimeters.
    pub fn physical_width(&self) -> u32 {
        self.info.mm_width
    }

    /// Physical height in millimeters.
    pub fn physical_height(&self) -> u32 {
        self.info.mm_height
    }

    /// Connection state reported by the server.
    pub fn connection(&self) -> Connection {
        self.info.connection
    }

    /// CRTC the output is attached to in the last-queried hardware state.
    pub fn crtc(&self) -> Option<CrtcId> {
        self.info.crtc
    }

    /// CRTCs the output could be attached to.
    pub fn candidate_crtcs(&self) -> &[CrtcId] {
        &self.info.candidate_crtcs
    }

    /// Modes the connected device supports.
    pub fn modes(&self) -> &[ModeId] {
        &self.info.modes
    }

    /// The device's preferred mode, if it reports one.
    pub fn preferred_mode(&self) -> Option<ModeId> {
        self.info.modes.get(self.info.preferred_mode).copied()
    }

    /// Outputs this one can share a CRTC with.
    pub fn clones(&self) -> &[OutputId] {
        &self.info.clones
    }

    /// Rotations every candidate CRTC of this output can apply.
    pub fn supported_rotations(&self) -> BitFlags<Rotation> {
        self.supported_rotations
    }

    /// Whether the output is attached to a hardware pipe. Reports the
    /// hardware state, not the pending one.
    pub fn is_active(&self) -> bool {
        self.info.crtc.is_some()
    }

    /// Whether the pending state enables the output.
    pub fn is_enabled(&self) -> bool {
        self.pending.mode.is_some()
    }

    /// The staged desired state.
    pub fn pending(&self) -> &PendingState {
        &self.pending
    }

    /// Pending fields touched since the last resolution.
    pub fn changes(&self) -> BitFlags<ChangeFlag> {
        self.changes
    }

    /// Stage a target mode; `None` disables the output.
    pub fn set_mode(&mut self, mode: Option<ModeId>) {
        self.pending.mode = mode;
        self.changes |= ChangeFlag::Mode;
    }

    /// Stage the device's preferred mode and return it, or `None` when the
    /// device reports no modes.
    pub fn set_preferred_mode(&mut self) -> Option<ModeId> {
        let mode = self.preferred_mode()?;
        self.set_mode(Some(mode));
        Some(mode)
    }

    /// Stage disabling the output.
    pub fn disable(&mut self) {
        self.set_mode(None);
    }

    /// Stage an explicit CRTC assignment.
    pub fn set_crtc(&mut self, crtc: CrtcId) {
        self.pending.crtc = Some(crtc);
        self.changes |= ChangeFlag::Crtc;
    }

    /// Stage a rotation. Capability against the CRTC rotation set is checked
    /// when resolution begins, not here.
    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.pending.rotation = rotation;
        self.changes |= ChangeFlag::Rotation;
    }

    /// Stage reflection flags.
    pub fn set_reflection(&mut self, reflection: BitFlags<Reflection>) {
        self.pending.reflection = reflection;
        self.changes |= ChangeFlag::Reflection;
    }

    /// Stage a positioning constraint relative to another named output.
    pub fn set_relation(&mut self, relation: Relation, target: impl Into<String>) {
        self.pending.relation = Some((relation, target.into()));
        self.changes |= ChangeFlag::Relation;
    }

    /// Remove any staged positioning constraint.
    pub fn clear_relation(&mut self) {
        if self.pending.relation.take().is_some() {
            self.changes |= ChangeFlag::Relation;
        }
    }

    /// Record the resolved absolute position. Only the commit path writes
    /// this; partial resolution state is never exposed.
    pub(crate) fn set_position(&mut self, x: i32, y: i32) {
        self.pending.position = Some((x, y));
        self.changes |= ChangeFlag::Position;
    }

    /// Seed pending state from the currently attached CRTC so an untouched
    /// output round-trips its hardware configuration through a commit.
    pub(crate) fn seed_pending(
        &mut self,
        mode: Option<ModeId>,
        rotation: Rotation,
        reflection: BitFlags<Reflection>,
    ) {
        self.pending.mode = mode;
        self.pending.rotation = rotation;
        self.pending.reflection = reflection;
    }

    /// Record the hardware CRTC attachment after a successful commit.
    pub(crate) fn set_hardware_crtc(&mut self, crtc: Option<CrtcId>) {
        self.info.crtc = crtc;
    }

    /// Reset change tracking after a successful commit.
    pub(crate) fn clear_changes(&mut self) {
        self.changes = ChangeFlag::empty();
    }
}
