//! Unit selection and hover highlighting.
//!
//! At most one unit is selected at a time. A selected unit's soldiers show
//! an emphasized selector; hovering a unit shows a plain one, except on the
//! selected unit where hover has no effect.

use glam::DVec3;
use hecs::{Entity, World};
use tracing::debug;

use phalanx_core::components::Selector;

use crate::components::UnitController;
use crate::unit::entity_id;

/// Hover feedback. Ignored for the selected unit and for dead units.
pub fn toggle_selector(world: &mut World, unit: Entity, hovered: bool, selected: Option<Entity>) {
    if selected == Some(unit) {
        return;
    }
    let Ok(mut controller) = world.get::<&mut UnitController>(unit) else {
        return;
    };
    controller.hovered = hovered;
    drop(controller);
    set_selectors(
        world,
        unit,
        Selector {
            visible: hovered,
            emphasized: false,
        },
    );
}

/// Select `unit`, deselecting the previous selection. Returns false if the
/// unit does not exist; the previous selection is then kept.
pub fn on_select(world: &mut World, selected: &mut Option<Entity>, unit: Entity) -> bool {
    if world.get::<&UnitController>(unit).is_err() {
        return false;
    }
    if let Some(previous) = selected.take() {
        if previous != unit {
            deselect(world, previous);
        }
    }

    if let Ok(mut controller) = world.get::<&mut UnitController>(unit) {
        controller.selected = true;
    }
    set_selectors(
        world,
        unit,
        Selector {
            visible: true,
            emphasized: true,
        },
    );
    *selected = Some(unit);
    debug!(unit = entity_id(unit), "unit selected");
    true
}

/// Drop the current selection, if any.
pub fn clear(world: &mut World, selected: &mut Option<Entity>) {
    if let Some(previous) = selected.take() {
        deselect(world, previous);
    }
}

/// Hit-test unit bounds on the ground plane. Lowest id wins on overlap.
pub fn pick_unit(world: &World, point: DVec3) -> Option<Entity> {
    world
        .query::<&UnitController>()
        .iter()
        .filter(|(_, c)| c.bounds.is_some_and(|b| b.contains_ground(point)))
        .map(|(entity, _)| entity)
        .min_by_key(|entity| entity_id(*entity))
}

fn deselect(world: &mut World, unit: Entity) {
    let hovered = match world.get::<&mut UnitController>(unit) {
        Ok(mut controller) => {
            controller.selected = false;
            controller.hovered
        }
        Err(_) => return,
    };
    set_selectors(
        world,
        unit,
        Selector {
            visible: hovered,
            emphasized: false,
        },
    );
}

fn set_selectors(world: &mut World, unit: Entity, selector: Selector) {
    let roster = match world.get::<&UnitController>(unit) {
        Ok(c) => c.roster.clone(),
        Err(_) => return,
    };
    for soldier in roster {
        if let Ok(mut current) = world.get::<&mut Selector>(soldier) {
            *current = selector;
        }
    }
}
