//! Robot behavior: scooping cargo off the floor, shooting it at a target,
//! and the random drift that stands in for a driver.

use fieldsim_logic::constants::robot::{
    JITTER_M_S, PICKUP_MAX_HEIGHT_M, PICKUP_RADIUS_M, SHOT_CLEARANCE_M, SHOT_SPEED_M_S,
    SHOT_VERTICAL_SPEED_M_S,
};
use fieldsim_logic::space::SpatialIndex;
use fieldsim_logic::{SimError, SimResult, Vec3};
use hecs::{Entity, World};
use rand::Rng;
use tracing::debug;

use super::{despawn_record, read_body, spawn_record, Field};
use crate::components::{Body, BodyId, Hopper};

/// Pick up at most one floor-level cargo within reach.
///
/// Neighbors are considered in index order; the first eligible ball is
/// taken if a slot is free. Returns the id of the ball picked up.
pub fn pick_up(
    world: &mut World,
    index: &mut SpatialIndex<Entity>,
    robot: Entity,
) -> SimResult<Option<BodyId>> {
    let has_room = world
        .get::<&Hopper>(robot)
        .map(|h| h.has_room())
        .map_err(|_| SimError::UnknownEntity)?;
    if !has_room {
        return Ok(None);
    }

    let (robot_id, _, robot_body) = read_body(world, robot)?;
    let view: &World = world;
    let target = index
        .neighbors(robot_body.position, PICKUP_RADIUS_M, true)
        .into_iter()
        .filter(|&e| e != robot)
        .find(|&e| {
            matches!(read_body(view, e), Ok((_, kind, body))
                if kind.is_cargo() && body.position.z <= PICKUP_MAX_HEIGHT_M)
        });
    let Some(target) = target else {
        return Ok(None);
    };

    let record = despawn_record(world, index, target)?;
    let id = record.id;
    let mut hopper = world
        .get::<&mut Hopper>(robot)
        .map_err(|_| SimError::UnknownEntity)?;
    if let Err(record) = hopper.load(record) {
        drop(hopper);
        spawn_record(world, index, record)?;
        return Ok(None);
    }
    debug!(robot = robot_id.0, cargo = id.0, held = hopper.len(), "picked up cargo");
    Ok(Some(id))
}

/// Launch the first-loaded cargo toward `target`.
///
/// The ball leaves from just outside the robot's radius, at the robot's
/// center height, with a fixed horizontal and vertical speed.
pub fn shoot(
    world: &mut World,
    index: &mut SpatialIndex<Entity>,
    field: &Field,
    robot: Entity,
    target: Vec3,
) -> SimResult<Option<Entity>> {
    let record = world
        .get::<&mut Hopper>(robot)
        .map_err(|_| SimError::UnknownEntity)?
        .unload();
    let Some(mut record) = record else {
        return Ok(None);
    };

    let (robot_id, _, robot_body) = read_body(world, robot)?;
    let (position, velocity) = launch(&robot_body, target);
    record.body.position = field.confine(position, record.body.radius);
    record.body.velocity = velocity;

    let cargo_id = record.id;
    let entity = spawn_record(world, index, record)?;
    debug!(robot = robot_id.0, cargo = cargo_id.0, "shot cargo");
    Ok(Some(entity))
}

/// Launch point and velocity for a shot from `robot` toward `target`.
pub fn launch(robot: &Body, target: Vec3) -> (Vec3, Vec3) {
    let heading = (target - robot.position)
        .horizontal()
        .try_normalize()
        .unwrap_or(Vec3::X);
    let position = robot.position + heading * (robot.radius + SHOT_CLEARANCE_M);
    let velocity = heading * SHOT_SPEED_M_S + Vec3::Z * SHOT_VERTICAL_SPEED_M_S;
    (position, velocity)
}

/// Nudge the horizontal velocity by a uniform random amount.
pub fn jitter<R: Rng + ?Sized>(body: &mut Body, rng: &mut R) {
    body.velocity.x += rng.gen_range(-JITTER_M_S..=JITTER_M_S);
    body.velocity.y += rng.gen_range(-JITTER_M_S..=JITTER_M_S);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Alliance, BodyKind};
    use fieldsim_logic::constants::robot::SLOTS;
    use fieldsim_logic::space::Bounds;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const SIZE: Vec3 = Vec3::new(16.46, 8.23, 20.0);

    fn setup() -> (World, SpatialIndex<Entity>, Entity) {
        let mut world = World::new();
        let mut index = SpatialIndex::new(Bounds::from_size(SIZE), false);
        let body = Body::robot(Vec3::new(4.0, 4.0, 0.0));
        let robot = world.spawn((
            BodyId(1),
            BodyKind::Robot {
                alliance: Alliance::Red,
            },
            body,
            Hopper::new(SLOTS),
        ));
        index.place(robot, body.position).unwrap();
        (world, index, robot)
    }

    fn add_cargo(world: &mut World, index: &mut SpatialIndex<Entity>, id: u64, p: Vec3) -> Entity {
        let body = Body::cargo(p);
        let e = world.spawn((
            BodyId(id),
            BodyKind::Cargo {
                alliance: Alliance::Blue,
            },
            body,
        ));
        index.place(e, p).unwrap();
        e
    }

    #[test]
    fn test_pick_up_floor_cargo() {
        let (mut world, mut index, robot) = setup();
        let ball = add_cargo(&mut world, &mut index, 2, Vec3::new(4.5, 4.0, 0.0));

        assert_eq!(pick_up(&mut world, &mut index, robot).unwrap(), Some(BodyId(2)));
        assert!(!world.contains(ball));
        assert!(!index.contains(ball));
        assert_eq!(world.get::<&Hopper>(robot).unwrap().len(), 1);
    }

    #[test]
    fn test_skip_high_or_far_cargo() {
        let (mut world, mut index, robot) = setup();
        add_cargo(&mut world, &mut index, 2, Vec3::new(4.5, 4.0, 0.5));
        add_cargo(&mut world, &mut index, 3, Vec3::new(4.9, 4.0, 0.0));
        assert_eq!(pick_up(&mut world, &mut index, robot).unwrap(), None);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_full_hopper_leaves_cargo() {
        let (mut world, mut index, robot) = setup();
        for id in 2..5 {
            add_cargo(&mut world, &mut index, id, Vec3::new(4.0 + 0.1 * id as f64, 4.0, 0.0));
        }
        assert!(pick_up(&mut world, &mut index, robot).unwrap().is_some());
        assert!(pick_up(&mut world, &mut index, robot).unwrap().is_some());
        assert_eq!(pick_up(&mut world, &mut index, robot).unwrap(), None);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_shoot_toward_target() {
        let (mut world, mut index, robot) = setup();
        add_cargo(&mut world, &mut index, 2, Vec3::new(4.5, 4.0, 0.0));
        pick_up(&mut world, &mut index, robot).unwrap();

        let field = Field::new(SIZE, false);
        let target = Vec3::new(8.23, 4.0, 0.0);
        let shot = shoot(&mut world, &mut index, &field, robot, target)
            .unwrap()
            .expect("a ball was held");

        let body = *world.get::<&Body>(shot).unwrap();
        assert_eq!(*world.get::<&BodyId>(shot).unwrap(), BodyId(2));
        assert!((body.position.x - (4.0 + 0.5 + SHOT_CLEARANCE_M)).abs() < 1e-9);
        assert!((body.velocity.x - SHOT_SPEED_M_S).abs() < 1e-9);
        assert_eq!(body.velocity.z, SHOT_VERTICAL_SPEED_M_S);
        assert_eq!(index.position(shot), Some(body.position));
        assert!(world.get::<&Hopper>(robot).unwrap().is_empty());

        // Nothing left to shoot.
        assert!(shoot(&mut world, &mut index, &field, robot, target).unwrap().is_none());
    }

    #[test]
    fn test_launch_from_center_defaults_to_x() {
        let robot = Body::robot(Vec3::new(8.0, 4.0, 0.0));
        let (_, v) = launch(&robot, Vec3::new(8.0, 4.0, 0.0));
        assert!((v.x - SHOT_SPEED_M_S).abs() < 1e-9);
    }

    #[test]
    fn test_jitter_is_bounded_and_horizontal() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut body = Body::robot(Vec3::ZERO);
        for _ in 0..100 {
            let before = body.velocity;
            jitter(&mut body, &mut rng);
            let d = body.velocity - before;
            assert!(d.x.abs() <= JITTER_M_S && d.y.abs() <= JITTER_M_S);
            assert_eq!(d.z, 0.0);
        }
    }
}
