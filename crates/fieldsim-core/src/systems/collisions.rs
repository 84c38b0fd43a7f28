//! Pairwise collision pass for one body against its neighborhood.

use fieldsim_logic::collision::{
    overlaps, resolve_position, resolve_position_cylindrical, resolve_velocity,
    resolve_velocity_cylindrical, ElasticityRule,
};
use fieldsim_logic::constants::field::COLLISION_CEILING_M;
use fieldsim_logic::space::SpatialIndex;
use fieldsim_logic::SimResult;
use hecs::{Entity, World};

use super::{read_body, write_back, Field};
use crate::components::{Body, BodyKind};

/// Whether two bodies can touch at all, before any distance test.
///
/// Obstacles never collide with each other, nothing above robot height
/// collides, and a body clear of an obstacle's top passes over it.
pub fn can_collide(a: &Body, a_kind: BodyKind, b: &Body, b_kind: BodyKind) -> bool {
    if a_kind.is_obstacle() && b_kind.is_obstacle() {
        return false;
    }
    if a.position.z > COLLISION_CEILING_M || b.position.z > COLLISION_CEILING_M {
        return false;
    }
    let clears = |obstacle: BodyKind, other: &Body| match obstacle {
        BodyKind::Obstacle { height_m } => other.position.z - other.radius > height_m,
        _ => false,
    };
    !(clears(a_kind, b) || clears(b_kind, a))
}

/// Overlap test. Tall bodies (robots, obstacles) are vertical cylinders, so
/// any pair involving one compares horizontal distance only.
pub fn bodies_overlap(a: &Body, a_kind: BodyKind, b: &Body, b_kind: BodyKind) -> bool {
    if a_kind.is_tall() || b_kind.is_tall() {
        overlaps(
            a.position.horizontal(),
            b.position.horizontal(),
            a.radius,
            b.radius,
        )
    } else {
        overlaps(a.position, b.position, a.radius, b.radius)
    }
}

/// Collide `entity` with every overlapping neighbor that has a larger id.
///
/// Each pair is handled once, from the side of its smaller id. Both bodies
/// are written back and the index is kept in sync. Returns whether any
/// collision happened.
pub fn collide_with_neighbors(
    world: &mut World,
    index: &mut SpatialIndex<Entity>,
    field: &Field,
    entity: Entity,
) -> SimResult<bool> {
    let (id, kind, mut me) = read_body(world, entity)?;
    let partners = index.neighbors(me.position, kind.neighborhood_m(), true);

    let mut collided = false;
    for other in partners {
        if other == entity {
            continue;
        }
        let (other_id, other_kind, mut them) = read_body(world, other)?;
        // Partner as seen from `me`; across a toroidal seam this is the
        // nearest image, not the stored position.
        let partner = Body {
            position: me.position + index.heading(me.position, them.position),
            ..them
        };
        if other_id <= id
            || !can_collide(&me, kind, &partner, other_kind)
            || !bodies_overlap(&me, kind, &partner, other_kind)
        {
            continue;
        }

        let (a, b) = (me.contact(), partner.contact());
        let cylindrical = kind.is_tall() || other_kind.is_tall();
        let ((va, vb), (pa, pb)) = if cylindrical {
            (
                resolve_velocity_cylindrical(&a, &b, ElasticityRule::Max),
                resolve_position_cylindrical(&a, &b),
            )
        } else {
            (
                resolve_velocity(&a, &b, ElasticityRule::Max),
                resolve_position(&a, &b),
            )
        };

        if !me.mass.is_infinite() {
            me.velocity = va;
            me.position = pa;
            me = write_back(world, index, field, entity, kind, me)?;
        }
        if !them.mass.is_infinite() {
            them.velocity = vb;
            them.position = pb;
            write_back(world, index, field, other, other_kind, them)?;
        }
        collided = true;
    }
    Ok(collided)
}
