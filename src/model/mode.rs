//! Display modes and the screen-wide mode catalog.
//!
//! Modes are loaded once per configuration session from the display backend
//! and are immutable afterwards. Outputs and CRTCs reference them by
//! [`ModeId`]; the catalog is the only owner.

use std::collections::HashMap;

/// Server-assigned identity of a display mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModeId(pub u64);

/// A resolution and timing combination an output can be driven at.
#[derive(Debug, Clone, PartialEq)]
pub struct Mode {
    /// Server-assigned mode identity
    pub id: ModeId,

    /// Mode name as reported by the server (e.g. "1920x1080")
    pub name: String,

    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,

    /// Dot clock in Hz
    pub dot_clock: u64,

    /// Total horizontal timing length
    pub h_total: u32,
    /// Total vertical timing length
    pub v_total: u32,
}

impl Mode {
    /// Refresh rate in Hz, derived from the timing parameters.
    ///
    /// Returns 0.0 when either timing total is zero (seen on virtual or
    /// driver-synthesized modes).
    pub fn refresh_rate(&self) -> f64 {
        let total = u64::from(self.h_total) * u64::from(self.v_total);
        if total == 0 {
            return 0.0;
        }
        self.dot_clock as f64 / total as f64
    }
}

/// Screen-wide catalog of modes, indexed by [`ModeId`].
#[derive(Debug, Default)]
pub struct ModeCatalog {
    modes: Vec<Mode>,
    by_id: HashMap<ModeId, usize>,
}

impl ModeCatalog {
    /// Build a catalog from the backend's mode list.
    pub fn new(modes: Vec<Mode>) -> Self {
        let by_id = modes
            .iter()
            .enumerate()
            .map(|(idx, mode)| (mode.id, idx))
            .collect();
        Self { modes, by_id }
    }

    /// Look up a mode by id.
    pub fn get(&self, id: ModeId) -> Option<&Mode> {
        self.by_id.get(&id).map(|&idx| &self.modes[idx])
    }

    /// Iterate over all modes in server order.
    pub fn iter(&self) -> impl Iterator<Item = &Mode> {
        self.modes.iter()
    }

    /// Number of modes in the catalog.
    pub fn len(&self) -> usize {
        self.modes.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode_1080p() -> Mode {
        Mode {
            id: ModeId(71),
            name: "1920x1080".into(),
            width: 1920,
            height: 1080,
            dot_clock: 148_500_000,
            h_total: 2200,
            v_total: 1125,
        }
    }

    #[test]
    fn test_refresh_rate_from_timings() {
        let mode = mode_1080p();
        // 148.5 MHz / (2200 * 1125) = 60 Hz
        assert!((mode.refresh_rate() - 60.0).abs() < 0.01);
    }

    #[test]
    fn test_refresh_rate_zero_totals() {
        let mut mode = mode_1080p();
        mode.h_total = 0;
        assert_eq!(mode.refresh_rate(), 0.0);
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = ModeCatalog::new(vec![mode_1080p()]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(ModeId(71)).unwrap().width, 1920);
        assert!(catalog.get(ModeId(9999)).is_none());
    }
}
