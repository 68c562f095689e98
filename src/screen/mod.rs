//! Screen aggregate: owns the enumerated data model and orchestrates
//! resolve → validate → commit.
//!
//! A [`Screen`] corresponds to one display server connection. It is loaded
//! once from a [`DisplayBackend`], mutated locally through the output
//! descriptors, and committed with [`Screen::apply_output_layout`]. The
//! extension version is an explicit field captured at load time and checked
//! where a minimum version matters, never ambient global state.

use std::collections::{BTreeMap, BTreeSet};

use enumflags2::BitFlags;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::backend::{BackendError, DisplayBackend, RandrVersion, ScreenGeometry};
use crate::layout::{
    self, effective_height, effective_width, ArrangementError, ResolvedLayout, ScreenBounds,
};
use crate::model::{
    CrtcDescriptor, CrtcId, ModeCatalog, ModeId, OutputDescriptor, OutputId, Reflection, Rotation,
};

/// Screen error types.
#[derive(Error, Debug)]
pub enum ScreenError {
    /// The server's extension version is older than an operation requires
    #[error("RandR {required} required, server reports {actual}")]
    UnsupportedVersion {
        /// Version the operation needs
        required: RandrVersion,
        /// Version the server reported
        actual: RandrVersion,
    },

    /// No output with the given name exists on this screen
    #[error("unknown output `{0}`")]
    UnknownOutput(String),

    /// An enabled output has no CRTC it could be driven by
    #[error("no usable CRTC for output `{0}`")]
    NoCrtcAvailable(String),

    /// Layout resolution failed
    #[error(transparent)]
    Arrangement(#[from] ArrangementError),

    /// The display server backend failed
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// One planned CRTC assignment, derived from a resolved layout.
#[derive(Debug)]
struct CrtcAssignment {
    output_name: String,
    output_id: OutputId,
    crtc: CrtcId,
    x: i32,
    y: i32,
    mode: ModeId,
    rotation: Rotation,
    reflection: BitFlags<Reflection>,
}

/// The multi-output configuration of one display server connection.
pub struct Screen {
    backend: Box<dyn DisplayBackend>,
    version: RandrVersion,
    geometry: ScreenGeometry,
    outputs: BTreeMap<String, OutputDescriptor>,
    crtcs: Vec<CrtcDescriptor>,
    modes: ModeCatalog,
}

impl std::fmt::Debug for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Screen")
            .field("version", &self.version)
            .field("geometry", &self.geometry)
            .field("outputs", &self.outputs)
            .field("crtcs", &self.crtcs)
            .field("modes", &self.modes)
            .finish_non_exhaustive()
    }
}

impl Screen {
    /// Minimum extension version for multi-output configuration.
    pub const REQUIRED_VERSION: RandrVersion = RandrVersion::new(1, 2);

    /// Enumerate the screen's modes, CRTCs, and outputs from the backend.
    ///
    /// Pending state of every attached output is seeded from its current
    /// CRTC, so committing an untouched screen round-trips the hardware
    /// configuration.
    ///
    /// # Errors
    ///
    /// Fails when the extension is missing, reports a version older than
    /// [`Self::REQUIRED_VERSION`], or any enumeration query fails.
    pub fn load(mut backend: Box<dyn DisplayBackend>) -> Result<Self, ScreenError> {
        let version = backend.query_version()?;
        if version < Self::REQUIRED_VERSION {
            return Err(ScreenError::UnsupportedVersion {
                required: Self::REQUIRED_VERSION,
                actual: version,
            });
        }

        let modes = ModeCatalog::new(backend.list_modes()?);
        let crtcs = backend.list_crtcs()?;
        let infos = backend.list_outputs()?;
        let geometry = backend.screen_geometry()?;

        let mut outputs = BTreeMap::new();
        for info in infos {
            let supported = supported_rotations(&info.candidate_crtcs, &crtcs);
            let mut output = OutputDescriptor::new(info, supported);
            if let Some(crtc) = output.crtc().and_then(|id| crtcs.iter().find(|c| c.id == id)) {
                output.seed_pending(crtc.mode, crtc.rotation, crtc.reflection);
            }
            outputs.insert(output.name().to_owned(), output);
        }

        info!(
            version = %version,
            outputs = outputs.len(),
            crtcs = crtcs.len(),
            modes = modes.len(),
            "loaded screen resources"
        );

        Ok(Self {
            backend,
            version,
            geometry,
            outputs,
            crtcs,
            modes,
        })
    }

    /// Extension version reported at load time.
    pub fn version(&self) -> RandrVersion {
        self.version
    }

    /// Current pixel size, physical size, and hardware bounds.
    pub fn geometry(&self) -> &ScreenGeometry {
        &self.geometry
    }

    /// All outputs, keyed by connector name.
    pub fn outputs(&self) -> &BTreeMap<String, OutputDescriptor> {
        &self.outputs
    }

    /// Look up an output by name.
    pub fn output(&self, name: &str) -> Option<&OutputDescriptor> {
        self.outputs.get(name)
    }

    /// Look up an output by name for mutation.
    pub fn output_mut(&mut self, name: &str) -> Option<&mut OutputDescriptor> {
        self.outputs.get_mut(name)
    }

    /// Look up an output by server-assigned id.
    pub fn output_by_id(&self, id: OutputId) -> Option<&OutputDescriptor> {
        self.outputs.values().find(|o| o.id() == id)
    }

    /// All CRTCs in server order.
    pub fn crtcs(&self) -> &[CrtcDescriptor] {
        &self.crtcs
    }

    /// Look up a CRTC by id.
    pub fn crtc(&self, id: CrtcId) -> Option<&CrtcDescriptor> {
        self.crtcs.iter().find(|c| c.id == id)
    }

    /// The screen-wide mode catalog.
    pub fn modes(&self) -> &ModeCatalog {
        &self.modes
    }

    /// Resolve the pending output states into a layout without touching the
    /// hardware.
    ///
    /// # Errors
    ///
    /// See [`layout::resolve`].
    pub fn resolve_layout(&self) -> Result<ResolvedLayout, ArrangementError> {
        layout::resolve(&self.outputs, &self.modes, &self.bounds())
    }

    /// Resolve the pending output states and commit the result to the
    /// hardware.
    ///
    /// The commit sets the screen pixel and physical size, disables CRTCs
    /// whose outputs are being turned off, then assigns mode, position,
    /// rotation, and output set to each remaining CRTC. Every mutating call
    /// is stamped with a configuration timestamp fetched immediately before
    /// it; the server rejects stale stamps and the rejection surfaces as
    /// [`BackendError::StaleCommit`] without retry.
    ///
    /// `physical_size` is the new physical size in millimeters. Deriving it
    /// from the pixel size is out of scope here; pass `None` to carry over
    /// the currently reported value as a best-effort estimate.
    ///
    /// # Errors
    ///
    /// When resolution fails, no backend call is issued and the prior
    /// hardware state is untouched. Backend failures are surfaced as-is;
    /// atomicity of the hardware write itself is the server's contract.
    pub fn apply_output_layout(
        &mut self,
        physical_size: Option<(u32, u32)>,
    ) -> Result<ResolvedLayout, ScreenError> {
        self.require_version(Self::REQUIRED_VERSION)?;

        let layout = self.resolve_layout()?;
        let (disables, assignments) = self.plan_commits(&layout)?;

        let (mm_width, mm_height) =
            physical_size.unwrap_or((self.geometry.mm_width, self.geometry.mm_height));
        if physical_size.is_none() {
            debug!(mm_width, mm_height, "carrying over reported physical size");
        }

        info!(
            width = layout.width,
            height = layout.height,
            enabled = assignments.len(),
            disabled = disables.len(),
            "applying output layout"
        );
        self.backend
            .set_screen_size(layout.width, layout.height, mm_width, mm_height)?;

        for crtc in &disables {
            let timestamp = self.backend.config_timestamp()?;
            debug!(crtc = crtc.0, "disabling CRTC");
            self.backend.disable_crtc(*crtc, timestamp)?;
        }
        for a in &assignments {
            let timestamp = self.backend.config_timestamp()?;
            debug!(
                output = %a.output_name,
                crtc = a.crtc.0,
                x = a.x,
                y = a.y,
                "assigning CRTC"
            );
            self.backend.set_crtc_config(
                a.crtc,
                timestamp,
                a.x,
                a.y,
                a.mode,
                a.rotation,
                a.reflection,
                &[a.output_id],
            )?;
        }

        self.record_commit(&layout, &disables, &assignments);
        Ok(layout)
    }

    fn require_version(&self, required: RandrVersion) -> Result<(), ScreenError> {
        if self.version < required {
            return Err(ScreenError::UnsupportedVersion {
                required,
                actual: self.version,
            });
        }
        Ok(())
    }

    fn bounds(&self) -> ScreenBounds {
        ScreenBounds {
            current_width: self.geometry.width,
            current_height: self.geometry.height,
            min_width: self.geometry.min_width,
            min_height: self.geometry.min_height,
            max_width: self.geometry.max_width,
            max_height: self.geometry.max_height,
        }
    }

    /// Turn a resolved layout into per-CRTC commands.
    ///
    /// CRTC selection keeps an output on its pending or current pipe and
    /// falls back to the first unclaimed candidate; whether a pipe can
    /// legally drive a given output set is the caller's contract, not
    /// negotiated here.
    fn plan_commits(
        &self,
        layout: &ResolvedLayout,
    ) -> Result<(Vec<CrtcId>, Vec<CrtcAssignment>), ScreenError> {
        let mut claimed: BTreeSet<CrtcId> = BTreeSet::new();
        let mut chosen: BTreeMap<&str, CrtcId> = BTreeMap::new();

        // Keep pinned and currently attached pipes first so the fallback
        // picker cannot steal them.
        for (name, output) in &self.outputs {
            if !output.is_enabled() {
                continue;
            }
            if let Some(crtc) = output.pending().crtc.or_else(|| output.crtc()) {
                claimed.insert(crtc);
                chosen.insert(name.as_str(), crtc);
            }
        }
        for (name, output) in &self.outputs {
            if !output.is_enabled() || chosen.contains_key(name.as_str()) {
                continue;
            }
            let crtc = output
                .candidate_crtcs()
                .iter()
                .copied()
                .find(|c| !claimed.contains(c))
                .ok_or_else(|| ScreenError::NoCrtcAvailable(name.clone()))?;
            claimed.insert(crtc);
            chosen.insert(name.as_str(), crtc);
        }

        let mut assignments = Vec::new();
        for (name, crtc) in &chosen {
            let output = &self.outputs[*name];
            let pending = output.pending();
            let Some(mode) = pending.mode else { continue };
            let (x, y) = layout.positions.get(*name).copied().unwrap_or((0, 0));
            assignments.push(CrtcAssignment {
                output_name: (*name).to_owned(),
                output_id: output.id(),
                crtc: *crtc,
                x,
                y,
                mode,
                rotation: pending.rotation,
                reflection: pending.reflection,
            });
        }

        // Pipes left driving an output that is being disabled.
        let mut disables: Vec<CrtcId> = self
            .outputs
            .values()
            .filter(|o| !o.is_enabled())
            .filter_map(|o| o.crtc())
            .filter(|c| !claimed.contains(c))
            .collect();
        disables.sort_unstable();
        disables.dedup();

        Ok((disables, assignments))
    }

    /// Fold a successful commit back into the local descriptors. The caller
    /// should still re-enumerate for authoritative server state.
    fn record_commit(
        &mut self,
        layout: &ResolvedLayout,
        disables: &[CrtcId],
        assignments: &[CrtcAssignment],
    ) {
        self.geometry.width = layout.width;
        self.geometry.height = layout.height;

        for crtc_id in disables {
            if let Some(crtc) = self.crtcs.iter_mut().find(|c| c.id == *crtc_id) {
                crtc.mode = None;
                crtc.outputs.clear();
                crtc.width = 0;
                crtc.height = 0;
            }
        }
        for a in assignments {
            if let Some(crtc) = self.crtcs.iter_mut().find(|c| c.id == a.crtc) {
                crtc.x = a.x;
                crtc.y = a.y;
                crtc.mode = Some(a.mode);
                crtc.rotation = a.rotation;
                crtc.reflection = a.reflection;
                crtc.outputs = vec![a.output_id];
                if let Some(mode) = self.modes.get(a.mode) {
                    crtc.width = effective_width(mode, a.rotation);
                    crtc.height = effective_height(mode, a.rotation);
                }
            }
            if let Some(output) = self.outputs.get_mut(&a.output_name) {
                output.set_position(a.x, a.y);
                output.set_hardware_crtc(Some(a.crtc));
            }
        }
        for output in self.outputs.values_mut() {
            if !output.is_enabled() {
                output.set_hardware_crtc(None);
            }
            output.clear_changes();
        }
    }
}

/// Rotations every candidate CRTC of an output supports. Falls back to
/// normal-only when the output has no candidate pipes.
fn supported_rotations(
    candidates: &[CrtcId],
    crtcs: &[CrtcDescriptor],
) -> BitFlags<Rotation> {
    let mut iter = crtcs
        .iter()
        .filter(|c| candidates.contains(&c.id))
        .map(|c| c.supported_rotations);
    match iter.next() {
        None => {
            warn!("output has no candidate CRTCs, assuming normal rotation only");
            Rotation::Normal.into()
        }
        Some(first) => iter.fold(first, |acc, set| acc & set),
    }
}
