//! Declarative layout profiles.
//!
//! A profile is a TOML document describing the desired state of each output
//! by name: mode, rotation, reflection, and at most one relation to another
//! output. Profiles are parsed with serde, validated, and staged onto a
//! [`Screen`]'s pending state; committing is still an explicit
//! [`Screen::apply_output_layout`] call.
//!
//! ```toml
//! [outputs.DP-1]
//! mode = "1920x1080@60"
//!
//! [outputs.HDMI-1]
//! mode = "1280x1024"
//! rotation = "left"
//! right-of = "DP-1"
//!
//! [outputs.VGA-1]
//! enabled = false
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use enumflags2::{BitFlag, BitFlags};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::model::{ModeId, Reflection, Relation, Rotation};
use crate::screen::Screen;

/// Configuration error types.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading the profile file failed
    #[error("failed to read profile: {0}")]
    Io(#[from] std::io::Error),

    /// The profile is not valid TOML or has unknown keys
    #[error("failed to parse profile: {0}")]
    Parse(#[from] toml::de::Error),

    /// A mode selector is not of the form `WIDTHxHEIGHT[@RATE]`
    #[error("output `{output}`: invalid mode selector `{value}`")]
    InvalidMode {
        /// Output the selector belongs to
        output: String,
        /// The rejected selector
        value: String,
    },

    /// A rotation name is not recognized
    #[error("output `{output}`: invalid rotation `{value}`")]
    InvalidRotation {
        /// Output the rotation belongs to
        output: String,
        /// The rejected rotation
        value: String,
    },

    /// A reflection name is not recognized
    #[error("output `{output}`: invalid reflection `{value}`")]
    InvalidReflection {
        /// Output the reflection belongs to
        output: String,
        /// The rejected reflection
        value: String,
    },

    /// An output declares more than one relation
    #[error("output `{output}` declares more than one relation")]
    ConflictingRelations {
        /// The offending output
        output: String,
    },

    /// The screen's output does not support any matching mode
    #[error("output `{output}` supports no mode matching `{value}`")]
    NoMatchingMode {
        /// Output the selector belongs to
        output: String,
        /// The unmatched selector
        value: String,
    },

    /// The profile names an output the screen does not have
    #[error("unknown output `{0}`")]
    UnknownOutput(String),
}

/// Desired state for one output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputProfile {
    /// Mode selector, `WIDTHxHEIGHT` or `WIDTHxHEIGHT@RATE`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    /// Rotation: `normal`, `right`, `inverted`, `left`, or degrees
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<String>,

    /// Reflection: `normal`, `x`, `y`, or `xy`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reflect: Option<String>,

    /// Place this output left of the named one
    #[serde(rename = "left-of", skip_serializing_if = "Option::is_none")]
    pub left_of: Option<String>,

    /// Place this output right of the named one
    #[serde(rename = "right-of", skip_serializing_if = "Option::is_none")]
    pub right_of: Option<String>,

    /// Place this output above the named one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub above: Option<String>,

    /// Place this output below the named one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub below: Option<String>,

    /// Place this output at the same position as the named one
    #[serde(rename = "same-as", skip_serializing_if = "Option::is_none")]
    pub same_as: Option<String>,

    /// Set to `false` to disable the output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl OutputProfile {
    /// The single declared relation, if any.
    fn relation(&self, output: &str) -> Result<Option<(Relation, &str)>, ConfigError> {
        let declared: Vec<(Relation, &str)> = [
            (Relation::LeftOf, &self.left_of),
            (Relation::RightOf, &self.right_of),
            (Relation::Above, &self.above),
            (Relation::Below, &self.below),
            (Relation::SameAs, &self.same_as),
        ]
        .into_iter()
        .filter_map(|(kind, target)| target.as_deref().map(|t| (kind, t)))
        .collect();

        match declared.as_slice() {
            [] => Ok(None),
            [single] => Ok(Some(*single)),
            _ => Err(ConfigError::ConflictingRelations {
                output: output.to_owned(),
            }),
        }
    }
}

/// A named arrangement of outputs, loaded from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutProfile {
    /// Desired state per output name
    #[serde(default)]
    pub outputs: BTreeMap<String, OutputProfile>,
}

impl LayoutProfile {
    /// Load and validate a profile from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate a profile from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let profile: LayoutProfile = toml::from_str(content)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Validate selectors and relation uniqueness without a screen.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, entry) in &self.outputs {
            if let Some(mode) = &entry.mode {
                parse_mode_selector(mode).ok_or_else(|| ConfigError::InvalidMode {
                    output: name.clone(),
                    value: mode.clone(),
                })?;
            }
            if let Some(rotation) = &entry.rotation {
                parse_rotation(rotation).ok_or_else(|| ConfigError::InvalidRotation {
                    output: name.clone(),
                    value: rotation.clone(),
                })?;
            }
            if let Some(reflect) = &entry.reflect {
                parse_reflection(reflect).ok_or_else(|| ConfigError::InvalidReflection {
                    output: name.clone(),
                    value: reflect.clone(),
                })?;
            }
            entry.relation(name)?;
        }
        Ok(())
    }

    /// Stage the profile onto a screen's pending state.
    ///
    /// Mode selectors are matched against each output's supported modes:
    /// with a rate the closest refresh wins, without one the highest. The
    /// hardware is not touched; call [`Screen::apply_output_layout`] to
    /// commit.
    ///
    /// # Errors
    ///
    /// Fails on the first entry naming an unknown output or a mode the
    /// output does not support. Entries staged before the failure remain
    /// staged.
    pub fn stage(&self, screen: &mut Screen) -> Result<(), ConfigError> {
        for (name, entry) in &self.outputs {
            let staged = stage_one(screen, name, entry)?;
            debug!(output = %name, ?staged, "staged profile entry");
        }
        Ok(())
    }
}

/// Resolved per-output staging decisions, kept for the debug log.
#[derive(Debug, Default)]
struct StagedEntry {
    disable: bool,
    mode: Option<ModeId>,
    rotation: Option<Rotation>,
    reflection: Option<BitFlags<Reflection>>,
    relation: Option<(Relation, String)>,
}

fn stage_one(
    screen: &mut Screen,
    name: &str,
    entry: &OutputProfile,
) -> Result<StagedEntry, ConfigError> {
    let output = screen
        .output(name)
        .ok_or_else(|| ConfigError::UnknownOutput(name.to_owned()))?;

    let mut staged = StagedEntry::default();

    if entry.enabled == Some(false) {
        staged.disable = true;
    } else if let Some(selector) = &entry.mode {
        let (width, height, rate) =
            parse_mode_selector(selector).ok_or_else(|| ConfigError::InvalidMode {
                output: name.to_owned(),
                value: selector.clone(),
            })?;
        let mode = select_mode(screen, output.modes(), width, height, rate).ok_or_else(|| {
            ConfigError::NoMatchingMode {
                output: name.to_owned(),
                value: selector.clone(),
            }
        })?;
        staged.mode = Some(mode);
    }

    if let Some(rotation) = &entry.rotation {
        staged.rotation = Some(parse_rotation(rotation).ok_or_else(|| {
            ConfigError::InvalidRotation {
                output: name.to_owned(),
                value: rotation.clone(),
            }
        })?);
    }
    if let Some(reflect) = &entry.reflect {
        staged.reflection = Some(parse_reflection(reflect).ok_or_else(|| {
            ConfigError::InvalidReflection {
                output: name.to_owned(),
                value: reflect.clone(),
            }
        })?);
    }
    staged.relation = entry
        .relation(name)?
        .map(|(kind, target)| (kind, target.to_owned()));

    let output = screen
        .output_mut(name)
        .ok_or_else(|| ConfigError::UnknownOutput(name.to_owned()))?;
    if staged.disable {
        output.disable();
    } else if let Some(mode) = staged.mode {
        output.set_mode(Some(mode));
    }
    if let Some(rotation) = staged.rotation {
        output.set_rotation(rotation);
    }
    if let Some(reflection) = staged.reflection {
        output.set_reflection(reflection);
    }
    if let Some((kind, target)) = &staged.relation {
        output.set_relation(*kind, target.clone());
    }
    Ok(staged)
}

/// Parse `WIDTHxHEIGHT` or `WIDTHxHEIGHT@RATE`.
fn parse_mode_selector(selector: &str) -> Option<(u32, u32, Option<f64>)> {
    let (size, rate) = match selector.split_once('@') {
        Some((size, rate)) => (size, Some(rate.trim().parse::<f64>().ok()?)),
        None => (selector, None),
    };
    let (width, height) = size.trim().split_once('x')?;
    Some((width.parse().ok()?, height.parse().ok()?, rate))
}

fn parse_rotation(value: &str) -> Option<Rotation> {
    match value.trim().to_ascii_lowercase().as_str() {
        "normal" | "0" => Some(Rotation::Normal),
        "right" | "90" => Some(Rotation::Rotate90),
        "inverted" | "180" => Some(Rotation::Rotate180),
        "left" | "270" => Some(Rotation::Rotate270),
        _ => None,
    }
}

fn parse_reflection(value: &str) -> Option<BitFlags<Reflection>> {
    match value.trim().to_ascii_lowercase().as_str() {
        "normal" | "none" => Some(Reflection::empty()),
        "x" => Some(Reflection::X.into()),
        "y" => Some(Reflection::Y.into()),
        "xy" => Some(Reflection::X | Reflection::Y),
        _ => None,
    }
}

/// Pick the supported mode matching the selector: exact size, then closest
/// refresh to the requested rate, or the highest refresh without one.
fn select_mode(
    screen: &Screen,
    supported: &[ModeId],
    width: u32,
    height: u32,
    rate: Option<f64>,
) -> Option<ModeId> {
    let candidates = supported
        .iter()
        .filter_map(|id| screen.modes().get(*id))
        .filter(|mode| mode.width == width && mode.height == height);
    match rate {
        Some(rate) => candidates
            .min_by(|a, b| {
                let da = (a.refresh_rate() - rate).abs();
                let db = (b.refresh_rate() - rate).abs();
                da.total_cmp(&db)
            })
            .map(|mode| mode.id),
        None => candidates
            .max_by(|a, b| a.refresh_rate().total_cmp(&b.refresh_rate()))
            .map(|mode| mode.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Selector parsing
    // =========================================================================

    #[test]
    fn test_parse_mode_selector() {
        assert_eq!(parse_mode_selector("1920x1080"), Some((1920, 1080, None)));
        assert_eq!(
            parse_mode_selector("1280x1024@75"),
            Some((1280, 1024, Some(75.0)))
        );
        assert_eq!(parse_mode_selector("1920"), None);
        assert_eq!(parse_mode_selector("wxh"), None);
        assert_eq!(parse_mode_selector("1920x1080@fast"), None);
    }

    #[test]
    fn test_parse_rotation_names_and_degrees() {
        assert_eq!(parse_rotation("normal"), Some(Rotation::Normal));
        assert_eq!(parse_rotation("right"), Some(Rotation::Rotate90));
        assert_eq!(parse_rotation("inverted"), Some(Rotation::Rotate180));
        assert_eq!(parse_rotation("LEFT"), Some(Rotation::Rotate270));
        assert_eq!(parse_rotation("270"), Some(Rotation::Rotate270));
        assert_eq!(parse_rotation("45"), None);
    }

    #[test]
    fn test_parse_reflection() {
        assert_eq!(parse_reflection("normal"), Some(Reflection::empty()));
        assert_eq!(parse_reflection("xy"), Some(Reflection::X | Reflection::Y));
        assert_eq!(parse_reflection("z"), None);
    }

    // =========================================================================
    // Profile parsing and validation
    // =========================================================================

    const PROFILE: &str = r#"
        [outputs.DP-1]
        mode = "1920x1080@60"

        [outputs.HDMI-1]
        mode = "1280x1024"
        rotation = "left"
        right-of = "DP-1"

        [outputs.VGA-1]
        enabled = false
    "#;

    #[test]
    fn test_parse_profile() {
        let profile = LayoutProfile::parse(PROFILE).unwrap();
        assert_eq!(profile.outputs.len(), 3);
        assert_eq!(profile.outputs["HDMI-1"].right_of.as_deref(), Some("DP-1"));
        assert_eq!(profile.outputs["VGA-1"].enabled, Some(false));
    }

    #[test]
    fn test_conflicting_relations_rejected() {
        let err = LayoutProfile::parse(
            r#"
            [outputs.DP-1]
            right-of = "HDMI-1"
            above = "HDMI-1"
            "#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ConflictingRelations { output } if output == "DP-1"
        ));
    }

    #[test]
    fn test_invalid_rotation_rejected() {
        let err = LayoutProfile::parse(
            r#"
            [outputs.DP-1]
            rotation = "sideways"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRotation { .. }));
    }

    #[test]
    fn test_invalid_mode_selector_rejected() {
        let err = LayoutProfile::parse(
            r#"
            [outputs.DP-1]
            mode = "big"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMode { .. }));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(matches!(
            LayoutProfile::parse(
                r#"
                [outputs.DP-1]
                resolution = "1920x1080"
                "#,
            ),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_profile_round_trips_through_toml() {
        let profile = LayoutProfile::parse(PROFILE).unwrap();
        let serialized = toml::to_string(&profile).unwrap();
        let reparsed = LayoutProfile::parse(&serialized).unwrap();
        assert_eq!(reparsed.outputs.len(), profile.outputs.len());
    }
}
