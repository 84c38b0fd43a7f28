//! Systems - logic that operates on components
//!
//! Every body lives in two places: its `Body` component (canonical) and the
//! spatial index (a copy of the position). The helpers here are the only
//! code that moves bodies in and out of the world, so the two never drift.

mod collisions;
mod forces;
mod hub;
mod robot;
mod stations;
mod walls;

pub use collisions::*;
pub use forces::*;
pub use hub::*;
pub use robot::*;
pub use stations::*;
pub use walls::*;

use fieldsim_logic::space::SpatialIndex;
use fieldsim_logic::{SimError, SimResult};
use hecs::{Entity, World};
use tracing::warn;

use crate::components::{Body, BodyId, BodyKind, BodyRecord, Hopper};

/// Copy out the identity, kind and state of a live body.
pub fn read_body(world: &World, entity: Entity) -> SimResult<(BodyId, BodyKind, Body)> {
    let id = *world
        .get::<&BodyId>(entity)
        .map_err(|_| SimError::UnknownEntity)?;
    let kind = *world
        .get::<&BodyKind>(entity)
        .map_err(|_| SimError::UnknownEntity)?;
    let body = *world
        .get::<&Body>(entity)
        .map_err(|_| SimError::UnknownEntity)?;
    Ok((id, kind, body))
}

/// Store new state for a live body and sync the index.
///
/// Floor-pinned bodies are re-pinned and the position is confined to the
/// field before the index sees it. On a toroidal field the index wraps the
/// position and the wrapped value is what gets stored.
pub fn write_back(
    world: &mut World,
    index: &mut SpatialIndex<Entity>,
    field: &Field,
    entity: Entity,
    kind: BodyKind,
    mut body: Body,
) -> SimResult<Body> {
    if kind.pins_to_floor() {
        pin_to_floor(&mut body);
    }
    let confined = field.confine(body.position, body.radius);
    if confined != body.position {
        warn!(
            kind = kind.label(),
            x = body.position.x,
            y = body.position.y,
            z = body.position.z,
            "position clamped to field"
        );
        body.position = confined;
    }
    body.position = index.move_to(entity, body.position)?;
    *world
        .get::<&mut Body>(entity)
        .map_err(|_| SimError::UnknownEntity)? = body;
    Ok(body)
}

/// Put a record back into the world and the index.
pub fn spawn_record(
    world: &mut World,
    index: &mut SpatialIndex<Entity>,
    record: BodyRecord,
) -> SimResult<Entity> {
    let BodyRecord {
        id,
        kind,
        body,
        hopper,
    } = record;
    let entity = world.spawn((id, kind, body));
    if let Some(hopper) = hopper {
        world
            .insert_one(entity, hopper)
            .map_err(|_| SimError::UnknownEntity)?;
    }
    match index.place(entity, body.position) {
        Ok(stored) => {
            if stored != body.position {
                if let Ok(mut b) = world.get::<&mut Body>(entity) {
                    b.position = stored;
                }
            }
            Ok(entity)
        }
        Err(e) => {
            if world.despawn(entity).is_err() {
                warn!(id = id.0, kind = kind.label(), "failed to roll back spawn");
            }
            Err(e)
        }
    }
}

/// Take a body out of the world and the index, keeping everything needed to
/// bring it back later.
pub fn despawn_record(
    world: &mut World,
    index: &mut SpatialIndex<Entity>,
    entity: Entity,
) -> SimResult<BodyRecord> {
    let (id, kind, body) = read_body(world, entity)?;
    index.remove(entity)?;
    let hopper = world.remove_one::<Hopper>(entity).ok();
    world
        .despawn(entity)
        .map_err(|_| SimError::UnknownEntity)?;
    Ok(BodyRecord {
        id,
        kind,
        body,
        hopper,
    })
}
