//! Relation resolution, normalization, and bounds validation.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::layout::geometry::{effective_height, effective_width};
use crate::layout::{ArrangementError, ResolvedLayout, ScreenBounds};
use crate::model::{ModeCatalog, OutputDescriptor, Relation};

/// Resolve pending output states into absolute positions and a framebuffer
/// size.
///
/// Only outputs with a pending mode participate; an output with a relation
/// but no pending mode is skipped entirely and never anchors geometry. The
/// result is deterministic for a given set of pending states: outputs are
/// processed in name order within the dependency order.
///
/// # Errors
///
/// Fails without assigning any position when a relation names a missing
/// output or the output itself, when the relation graph has a cycle, when a
/// pending rotation is outside an output's supported set, or when the
/// resolved framebuffer exceeds the hardware maximum.
pub fn resolve(
    outputs: &BTreeMap<String, OutputDescriptor>,
    catalog: &ModeCatalog,
    bounds: &ScreenBounds,
) -> Result<ResolvedLayout, ArrangementError> {
    // Capability gate and effective footprint, before any placement happens.
    let mut footprints: BTreeMap<&str, (u32, u32)> = BTreeMap::new();
    for (name, output) in outputs {
        let Some(mode_id) = output.pending().mode else {
            continue;
        };
        let rotation = output.pending().rotation;
        if !output.supported_rotations().contains(rotation) {
            return Err(ArrangementError::IncapableRotation {
                output: name.clone(),
                rotation,
            });
        }
        let mode = catalog
            .get(mode_id)
            .ok_or_else(|| ArrangementError::UnknownMode {
                output: name.clone(),
                mode: mode_id,
            })?;
        footprints.insert(
            name.as_str(),
            (
                effective_width(mode, rotation),
                effective_height(mode, rotation),
            ),
        );
    }

    // Validate relations and record, per enabled output, the enabled target
    // it is anchored to. A relation to a disabled output anchors nothing.
    let mut anchors: BTreeMap<&str, Option<(Relation, &str)>> = BTreeMap::new();
    for name in footprints.keys().copied() {
        let output = &outputs[name];
        let anchor = match &output.pending().relation {
            None => None,
            Some((kind, target)) => {
                if target == name {
                    return Err(ArrangementError::SelfRelation(name.to_owned()));
                }
                match outputs.get(target) {
                    None => {
                        return Err(ArrangementError::UnknownRelationTarget {
                            output: name.to_owned(),
                            target: target.clone(),
                        });
                    }
                    Some(t) if t.is_enabled() => Some((*kind, target.as_str())),
                    Some(_) => None,
                }
            }
        };
        anchors.insert(name, anchor);
    }

    // Dependency-ordered placement (Kahn). `ready` is a set so ties resolve
    // in name order, keeping the pass deterministic.
    let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    let mut ready: BTreeSet<&str> = BTreeSet::new();
    for (name, anchor) in &anchors {
        match anchor {
            Some((_, target)) => dependents.entry(target).or_default().push(name),
            None => {
                ready.insert(name);
            }
        }
    }

    let mut positions: BTreeMap<String, (i32, i32)> = BTreeMap::new();
    while let Some(name) = ready.pop_first() {
        let (width, height) = footprints[name];
        let (x, y) = match anchors[name] {
            None => (0, 0),
            Some((relation, target)) => {
                let (tx, ty) = positions[target];
                let (t_width, t_height) = footprints[target];
                match relation {
                    Relation::LeftOf => (tx - width as i32, ty),
                    Relation::RightOf => (tx + t_width as i32, ty),
                    Relation::Above => (tx, ty - height as i32),
                    Relation::Below => (tx, ty + t_height as i32),
                    Relation::SameAs => (tx, ty),
                }
            }
        };
        debug!(output = name, x, y, width, height, "placed output");
        positions.insert(name.to_owned(), (x, y));
        for dependent in dependents.remove(name).unwrap_or_default() {
            ready.insert(dependent);
        }
    }

    if positions.len() != footprints.len() {
        let cycle: Vec<String> = footprints
            .keys()
            .filter(|name| !positions.contains_key(**name))
            .map(|name| (*name).to_owned())
            .collect();
        return Err(ArrangementError::RelationCycle(cycle));
    }

    // Shift so the bounding box's top-left corner is the origin.
    let min_x = positions.values().map(|&(x, _)| x).min().unwrap_or(0);
    let min_y = positions.values().map(|&(_, y)| y).min().unwrap_or(0);
    for (x, y) in positions.values_mut() {
        *x -= min_x;
        *y -= min_y;
    }

    // Minimal enclosing framebuffer, never smaller than the current one.
    let mut width = bounds.current_width;
    let mut height = bounds.current_height;
    for (name, &(x, y)) in &positions {
        let (w, h) = footprints[name.as_str()];
        width = width.max((x + w as i32) as u32);
        height = height.max((y + h as i32) as u32);
    }

    if width > bounds.max_width || height > bounds.max_height {
        return Err(ArrangementError::ExceedsScreenBounds {
            width,
            height,
            max_width: bounds.max_width,
            max_height: bounds.max_height,
        });
    }
    width = width.max(bounds.min_width);
    height = height.max(bounds.min_height);

    debug!(
        outputs = positions.len(),
        width, height, "resolved output layout"
    );

    Ok(ResolvedLayout {
        positions,
        width,
        height,
    })
}
