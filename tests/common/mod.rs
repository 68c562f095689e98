//! Shared fake display backend for integration tests.
//!
//! `FakeBackend` serves scripted enumeration data and records every commit
//! command; tests keep a handle to the shared state to inspect what was
//! issued and to inject failures.

// Not every test binary uses every fixture.
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use enumflags2::{BitFlag, BitFlags};
use randrkit::{
    BackendError, Connection, CrtcDescriptor, CrtcId, DisplayBackend, Mode, ModeId, OutputId,
    OutputInfo, RandrVersion, Reflection, Rotation, ScreenGeometry, Timestamp,
};

/// A command the screen issued to the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetScreenSize {
        width: u32,
        height: u32,
        mm_width: u32,
        mm_height: u32,
    },
    SetCrtcConfig {
        crtc: CrtcId,
        timestamp: Timestamp,
        x: i32,
        y: i32,
        mode: ModeId,
        rotation: Rotation,
        reflection: BitFlags<Reflection>,
        outputs: Vec<OutputId>,
    },
    DisableCrtc {
        crtc: CrtcId,
        timestamp: Timestamp,
    },
}

/// Scripted server state shared between a test and its backend.
pub struct FakeState {
    pub version: RandrVersion,
    pub extension_present: bool,
    pub modes: Vec<Mode>,
    pub crtcs: Vec<CrtcDescriptor>,
    pub outputs: Vec<OutputInfo>,
    pub geometry: ScreenGeometry,
    pub commands: Vec<Command>,
    pub reject_commits_as_stale: bool,
    next_timestamp: u64,
}

pub struct FakeBackend {
    state: Rc<RefCell<FakeState>>,
}

impl FakeBackend {
    /// Build a backend over the given state; the returned handle stays
    /// valid after the backend is boxed into a `Screen`.
    pub fn new(state: FakeState) -> (Box<Self>, Rc<RefCell<FakeState>>) {
        let state = Rc::new(RefCell::new(state));
        (
            Box::new(Self {
                state: Rc::clone(&state),
            }),
            state,
        )
    }
}

impl DisplayBackend for FakeBackend {
    fn query_version(&mut self) -> Result<RandrVersion, BackendError> {
        let state = self.state.borrow();
        if !state.extension_present {
            return Err(BackendError::ExtensionMissing);
        }
        Ok(state.version)
    }

    fn list_modes(&mut self) -> Result<Vec<Mode>, BackendError> {
        Ok(self.state.borrow().modes.clone())
    }

    fn list_crtcs(&mut self) -> Result<Vec<CrtcDescriptor>, BackendError> {
        Ok(self.state.borrow().crtcs.clone())
    }

    fn list_outputs(&mut self) -> Result<Vec<OutputInfo>, BackendError> {
        Ok(self.state.borrow().outputs.clone())
    }

    fn screen_geometry(&mut self) -> Result<ScreenGeometry, BackendError> {
        Ok(self.state.borrow().geometry)
    }

    fn config_timestamp(&mut self) -> Result<Timestamp, BackendError> {
        let mut state = self.state.borrow_mut();
        state.next_timestamp += 1;
        Ok(Timestamp(state.next_timestamp))
    }

    fn set_screen_size(
        &mut self,
        width: u32,
        height: u32,
        mm_width: u32,
        mm_height: u32,
    ) -> Result<(), BackendError> {
        self.state.borrow_mut().commands.push(Command::SetScreenSize {
            width,
            height,
            mm_width,
            mm_height,
        });
        Ok(())
    }

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
    ) -> Result<(), BackendError> {
        let mut state = self.state.borrow_mut();
        state.commands.push(Command::SetCrtcConfig {
            crtc,
            timestamp,
            x,
            y,
            mode,
            rotation,
            reflection,
            outputs: outputs.to_vec(),
        });
        if state.reject_commits_as_stale {
            return Err(BackendError::StaleCommit);
        }
        Ok(())
    }

    fn disable_crtc(&mut self, crtc: CrtcId, timestamp: Timestamp) -> Result<(), BackendError> {
        let mut state = self.state.borrow_mut();
        state.commands.push(Command::DisableCrtc { crtc, timestamp });
        if state.reject_commits_as_stale {
            return Err(BackendError::StaleCommit);
        }
        Ok(())
    }
}

pub const MODE_1280X1024: ModeId = ModeId(1);
pub const MODE_1024X768: ModeId = ModeId(2);
pub const MODE_1920X1080_60: ModeId = ModeId(3);
pub const MODE_1920X1080_144: ModeId = ModeId(4);

pub fn mode(id: ModeId, width: u32, height: u32, refresh: f64) -> Mode {
    // Synthesize timings that derive the requested refresh rate.
    let h_total = width + 200;
    let v_total = height + 45;
    Mode {
        id,
        name: format!("{}x{}", width, height),
        width,
        height,
        dot_clock: (refresh * f64::from(h_total) * f64::from(v_total)) as u64,
        h_total,
        v_total,
    }
}

pub fn crtc(id: u64) -> CrtcDescriptor {
    CrtcDescriptor {
        id: CrtcId(id),
        x: 0,
        y: 0,
        width: 0,
        height: 0,
        mode: None,
        rotation: Rotation::Normal,
        reflection: Reflection::empty(),
        outputs: vec![],
        supported_rotations: BitFlags::all(),
        supported_reflections: BitFlags::all(),
        candidate_outputs: vec![OutputId(1), OutputId(2), OutputId(3)],
    }
}

pub fn output(id: u64, name: &str, candidate_crtcs: &[u64]) -> OutputInfo {
    OutputInfo {
        id: OutputId(id),
        name: name.to_owned(),
        mm_width: 520,
        mm_height: 290,
        connection: Connection::Connected,
        crtc: None,
        candidate_crtcs: candidate_crtcs.iter().map(|&c| CrtcId(c)).collect(),
        modes: vec![
            MODE_1280X1024,
            MODE_1024X768,
            MODE_1920X1080_60,
            MODE_1920X1080_144,
        ],
        preferred_mode: 2,
        clones: vec![],
    }
}

pub fn geometry() -> ScreenGeometry {
    ScreenGeometry {
        width: 0,
        height: 0,
        mm_width: 520,
        mm_height: 290,
        min_width: 320,
        min_height: 200,
        max_width: 8192,
        max_height: 8192,
    }
}

/// Two connected outputs "A" and "B", both inactive, two idle CRTCs.
pub fn dual_head() -> FakeState {
    FakeState {
        version: RandrVersion::new(1, 3),
        extension_present: true,
        modes: vec![
            mode(MODE_1280X1024, 1280, 1024, 60.0),
            mode(MODE_1024X768, 1024, 768, 60.0),
            mode(MODE_1920X1080_60, 1920, 1080, 60.0),
            mode(MODE_1920X1080_144, 1920, 1080, 144.0),
        ],
        crtcs: vec![crtc(10), crtc(11)],
        outputs: vec![output(1, "A", &[10, 11]), output(2, "B", &[10, 11])],
        geometry: geometry(),
        commands: vec![],
        reject_commits_as_stale: false,
        next_timestamp: 100,
    }
}
