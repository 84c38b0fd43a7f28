//! Arena engine - main entry point for running the simulation

use std::collections::VecDeque;
use std::f64::consts::TAU;

use fieldsim_logic::config::ArenaConfig;
use fieldsim_logic::constants::cargo;
use fieldsim_logic::constants::robot::SLOTS;
use fieldsim_logic::space::{Bounds, SpatialIndex};
use fieldsim_logic::{SimError, SimResult, Vec3};
use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::components::*;
use crate::stats::{self, Summary};
use crate::systems::*;

/// A field full of bodies, stepped one tick at a time.
pub struct Arena {
    /// ECS world containing all bodies currently on the field
    pub world: World,
    config: ArenaConfig,
    field: Field,
    index: SpatialIndex<Entity>,
    out_of_bounds: Station,
    hub: Option<Hub>,
    rng: StdRng,
    /// Simulation time in seconds since start
    time: f64,
    tick: u64,
    next_id: u64,
    scored: usize,
    history: VecDeque<Summary>,
}

impl Arena {
    /// Build an arena and place the bodies the config asks for.
    pub fn new(config: ArenaConfig) -> SimResult<Self> {
        config.validate()?;
        let hub = config.hub.as_ref().map(Hub::from_config).transpose()?;
        let mut arena = Self {
            world: World::new(),
            field: Field::from_config(&config),
            index: SpatialIndex::new(Bounds::from_size(config.size()), config.toroidal),
            out_of_bounds: Station::new("out_of_bounds", &config.out_of_bounds),
            hub,
            rng: StdRng::seed_from_u64(config.seed),
            time: 0.0,
            tick: 0,
            next_id: 1,
            scored: 0,
            history: VecDeque::with_capacity(config.history_capacity.min(4096)),
            config,
        };
        arena.populate()?;
        info!(
            robots = arena.robot_count(),
            cargo = arena.cargo_count(),
            obstacles = arena.obstacle_count(),
            seed = arena.config.seed,
            "arena ready"
        );
        Ok(arena)
    }

    /// Starting layout: obstacles, robots lined up near their end walls,
    /// cargo on a ring around the field center.
    fn populate(&mut self) -> SimResult<()> {
        let obstacles = self.config.obstacles.clone();
        for o in &obstacles {
            self.spawn_obstacle(Vec3::new(o.x_m, o.y_m, 0.0), o.radius_m, o.height_m)?;
        }

        let (length, width) = (self.config.length_m, self.config.width_m);
        let per_alliance = self.config.robots_per_alliance;
        for (alliance, x) in [(Alliance::Blue, 0.15 * length), (Alliance::Red, 0.85 * length)] {
            for i in 0..per_alliance {
                let y = width * (i + 1) as f64 / (per_alliance + 1) as f64;
                self.spawn_robot(Vec3::new(x, y, 0.0), alliance)?;
            }
        }

        let n = 2 * self.config.cargo_per_alliance;
        let center = self.config.center();
        let ring = self.config.cargo_ring_radius_m;
        for i in 0..n {
            let angle = TAU * (i as f64 + 0.5) / n as f64;
            let p = center + Vec3::new(angle.cos(), angle.sin(), 0.0) * ring;
            let alliance = if i % 2 == 0 {
                Alliance::Red
            } else {
                Alliance::Blue
            };
            let p = self.field.confine(p, cargo::RADIUS_M);
            self.spawn_cargo(p, alliance)?;
        }
        Ok(())
    }

    // ── Spawning ──────────────────────────────────────────────────────────

    /// Add a body with a fresh id.
    pub fn spawn_body(&mut self, kind: BodyKind, mut body: Body) -> SimResult<Entity> {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        if kind.pins_to_floor() {
            pin_to_floor(&mut body);
        }
        let hopper = kind.is_robot().then(|| Hopper::new(SLOTS));
        spawn_record(
            &mut self.world,
            &mut self.index,
            BodyRecord {
                id,
                kind,
                body,
                hopper,
            },
        )
    }

    pub fn spawn_cargo(&mut self, position: Vec3, alliance: Alliance) -> SimResult<Entity> {
        self.spawn_body(BodyKind::Cargo { alliance }, Body::cargo(position))
    }

    pub fn spawn_robot(&mut self, position: Vec3, alliance: Alliance) -> SimResult<Entity> {
        self.spawn_body(BodyKind::Robot { alliance }, Body::robot(position))
    }

    pub fn spawn_obstacle(&mut self, position: Vec3, radius: f64, height: f64) -> SimResult<Entity> {
        self.spawn_body(
            BodyKind::Obstacle { height_m: height },
            Body::obstacle(position, radius),
        )
    }

    // ── Stepping ──────────────────────────────────────────────────────────

    /// One full tick: stations, then every body in id order, then the clock.
    pub fn step(&mut self) -> SimResult<Summary> {
        self.step_stations()?;
        for entity in self.step_order() {
            // Bodies picked up or sent away earlier in the tick are gone.
            if self.world.contains(entity) {
                self.step_body(entity)?;
            }
        }
        self.time += self.config.seconds_per_step;
        self.tick += 1;

        let summary = self.summary();
        if self.config.history_capacity > 0 {
            if self.history.len() >= self.config.history_capacity {
                self.history.pop_front();
            }
            self.history.push_back(summary);
        }
        Ok(summary)
    }

    /// Step `ticks` times, returning the last summary.
    pub fn run(&mut self, ticks: u64) -> SimResult<Summary> {
        let mut summary = self.summary();
        for _ in 0..ticks {
            summary = self.step()?;
        }
        Ok(summary)
    }

    fn step_order(&self) -> Vec<Entity> {
        let mut order: Vec<(BodyId, Entity)> = self
            .world
            .query::<&BodyId>()
            .iter()
            .map(|(entity, id)| (*id, entity))
            .collect();
        order.sort_unstable_by_key(|(id, _)| *id);
        order.into_iter().map(|(_, entity)| entity).collect()
    }

    /// Release whatever the stations have ready back onto the field.
    pub fn step_stations(&mut self) -> SimResult<()> {
        let mut released = self.out_of_bounds.release(self.time)?;
        if let Some(hub) = self.hub.as_mut() {
            released.extend(hub.station.release(self.time)?);
        }
        for record in released {
            debug!(id = record.id.0, kind = record.kind.label(), "released from station");
            spawn_record(&mut self.world, &mut self.index, record)?;
        }
        Ok(())
    }

    /// Advance one body by one tick.
    pub fn step_body(&mut self, entity: Entity) -> SimResult<()> {
        let (_, kind, _) = read_body(&self.world, entity)?;
        match kind {
            BodyKind::Obstacle { .. } => {
                collide_with_neighbors(&mut self.world, &mut self.index, &self.field, entity)?;
                Ok(())
            }
            BodyKind::Robot { .. } => self.step_robot(entity),
            BodyKind::Cargo { .. } => self.step_cargo(entity),
        }
    }

    fn step_cargo(&mut self, entity: Entity) -> SimResult<()> {
        let dt = self.config.seconds_per_step;
        let collided =
            collide_with_neighbors(&mut self.world, &mut self.index, &self.field, entity)?;

        let (id, kind, mut body) = read_body(&self.world, entity)?;
        if !collided {
            apply_rolling_friction(&mut body, dt);
            apply_gravity(&mut body, dt);
        }
        integrate(&mut body, dt);
        if self.field.check_walls(&mut body) == WallContact::Escaped {
            return self.send_out_of_bounds(entity, body);
        }
        bounce_off_floor(&mut body, dt);

        if let Some(hub) = &self.hub {
            match hub.check(&mut body, &mut self.rng) {
                HubOutcome::Captured => return self.capture(entity, body),
                HubOutcome::Rejected => debug!(id = id.0, "bounced out of hub"),
                HubOutcome::Missed => {}
            }
        }

        write_back(&mut self.world, &mut self.index, &self.field, entity, kind, body)?;
        Ok(())
    }

    fn step_robot(&mut self, entity: Entity) -> SimResult<()> {
        let dt = self.config.seconds_per_step;
        pick_up(&mut self.world, &mut self.index, entity)?;
        let target = self.config.center();
        shoot(&mut self.world, &mut self.index, &self.field, entity, target)?;

        let collided =
            collide_with_neighbors(&mut self.world, &mut self.index, &self.field, entity)?;
        let (_, kind, mut body) = read_body(&self.world, entity)?;
        if !collided {
            jitter(&mut body, &mut self.rng);
        }
        integrate(&mut body, dt);
        if self.field.check_walls(&mut body) == WallContact::Escaped {
            return self.send_out_of_bounds(entity, body);
        }
        write_back(&mut self.world, &mut self.index, &self.field, entity, kind, body)?;
        Ok(())
    }

    fn send_out_of_bounds(&mut self, entity: Entity, body: Body) -> SimResult<()> {
        let mut record = despawn_record(&mut self.world, &mut self.index, entity)?;
        record.body = body;
        info!(
            id = record.id.0,
            kind = record.kind.label(),
            x = body.position.x,
            y = body.position.y,
            z = body.position.z,
            "body out of bounds"
        );
        self.out_of_bounds.admit(record, self.time)
    }

    fn capture(&mut self, entity: Entity, body: Body) -> SimResult<()> {
        let mut record = despawn_record(&mut self.world, &mut self.index, entity)?;
        record.body = body;
        let id = record.id;
        if let Some(hub) = self.hub.as_mut() {
            hub.station.admit(record, self.time)?;
            self.scored += 1;
            debug!(id = id.0, scored = self.scored, "captured by hub");
        }
        Ok(())
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn body(&self, entity: Entity) -> SimResult<Body> {
        read_body(&self.world, entity).map(|(_, _, body)| body)
    }

    pub fn kind(&self, entity: Entity) -> SimResult<BodyKind> {
        read_body(&self.world, entity).map(|(_, kind, _)| kind)
    }

    pub fn id(&self, entity: Entity) -> SimResult<BodyId> {
        read_body(&self.world, entity).map(|(id, _, _)| id)
    }

    pub fn position(&self, entity: Entity) -> SimResult<Vec3> {
        self.body(entity).map(|b| b.position)
    }

    pub fn velocity(&self, entity: Entity) -> SimResult<Vec3> {
        self.body(entity).map(|b| b.velocity)
    }

    pub fn speed(&self, entity: Entity) -> SimResult<f64> {
        self.body(entity).map(|b| b.speed())
    }

    /// Overwrite a body's velocity, e.g. to drive a robot.
    pub fn set_velocity(&mut self, entity: Entity, velocity: Vec3) -> SimResult<()> {
        let mut body = self
            .world
            .get::<&mut Body>(entity)
            .map_err(|_| SimError::UnknownEntity)?;
        body.velocity = velocity;
        Ok(())
    }

    /// Cargo held by a robot.
    pub fn held(&self, entity: Entity) -> SimResult<usize> {
        self.world
            .get::<&Hopper>(entity)
            .map(|h| h.len())
            .map_err(|_| SimError::UnknownEntity)
    }

    /// Every body on the field, in id order.
    pub fn bodies(&self) -> Vec<(Entity, BodyId, BodyKind, Body)> {
        let mut all: Vec<_> = self
            .world
            .query::<(&BodyId, &BodyKind, &Body)>()
            .iter()
            .map(|(entity, (id, kind, body))| (entity, *id, *kind, *body))
            .collect();
        all.sort_unstable_by_key(|(_, id, _, _)| *id);
        all
    }

    /// Current entity for a body id, if the body is on the field.
    pub fn entity(&self, id: BodyId) -> Option<Entity> {
        self.world
            .query::<&BodyId>()
            .iter()
            .find(|(_, body_id)| **body_id == id)
            .map(|(entity, _)| entity)
    }

    pub fn summary(&self) -> Summary {
        let mean_speed = stats::mean(
            self.world
                .query::<(&Body, &BodyKind)>()
                .iter()
                .filter(|(_, (_, kind))| !kind.is_obstacle())
                .map(|(_, (body, _))| body.speed()),
        );
        Summary {
            tick: self.tick,
            elapsed_s: self.time,
            mean_speed,
            live_bodies: self.world.len() as usize,
            out_of_bounds_len: self.out_of_bounds.len(),
            hub_len: self.hub.as_ref().map_or(0, |h| h.station.len()),
            scored: self.scored,
        }
    }

    /// Per-tick summaries, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &Summary> {
        self.history.iter()
    }

    /// Check that the index holds exactly the live bodies, at their positions.
    pub fn verify_index(&self) -> SimResult<()> {
        let mut count = 0;
        for (entity, body) in self.world.query::<&Body>().iter() {
            count += 1;
            match self.index.position(entity) {
                Some(p) if p == body.position => {}
                Some(p) => {
                    return Err(SimError::IndexDesync {
                        reason: format!("{entity:?} indexed at {p:?}, body at {:?}", body.position),
                    })
                }
                None => return Err(SimError::NotPlaced),
            }
        }
        if count != self.index.len() {
            return Err(SimError::IndexDesync {
                reason: format!("{} rows for {} bodies", self.index.len(), count),
            });
        }
        Ok(())
    }

    pub fn index(&self) -> &SpatialIndex<Entity> {
        &self.index
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn hub(&self) -> Option<&Hub> {
        self.hub.as_ref()
    }

    pub fn out_of_bounds(&self) -> &Station {
        &self.out_of_bounds
    }

    /// Simulation time in seconds
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn scored(&self) -> usize {
        self.scored
    }

    fn count(&self, pred: impl Fn(&BodyKind) -> bool) -> usize {
        self.world
            .query::<&BodyKind>()
            .iter()
            .filter(|(_, kind)| pred(*kind))
            .count()
    }

    pub fn cargo_count(&self) -> usize {
        self.count(BodyKind::is_cargo)
    }

    pub fn robot_count(&self) -> usize {
        self.count(BodyKind::is_robot)
    }

    pub fn obstacle_count(&self) -> usize {
        self.count(BodyKind::is_obstacle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare() -> Arena {
        Arena::new(ArenaConfig::bare()).unwrap()
    }

    #[test]
    fn test_arena_creation() {
        let arena = Arena::new(ArenaConfig::default()).unwrap();
        assert_eq!(arena.robot_count(), 4);
        assert_eq!(arena.cargo_count(), 22);
        assert_eq!(arena.obstacle_count(), 1);
        assert_eq!(arena.summary().live_bodies, 27);
        assert_eq!(arena.time(), 0.0);
        arena.verify_index().unwrap();
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ArenaConfig {
            seconds_per_step: -1.0,
            ..ArenaConfig::bare()
        };
        assert!(matches!(
            Arena::new(config),
            Err(SimError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_step_advances_time_and_history() {
        let mut arena = bare();
        for _ in 0..10 {
            arena.step().unwrap();
        }
        assert_eq!(arena.tick(), 10);
        assert!((arena.time() - 0.2).abs() < 1e-9);
        assert_eq!(arena.history().count(), 10);
        assert_eq!(arena.history().last().map(|s| s.tick), Some(10));
    }

    #[test]
    fn test_history_capacity() {
        let mut arena = Arena::new(ArenaConfig {
            history_capacity: 5,
            ..ArenaConfig::bare()
        })
        .unwrap();
        arena.run(12).unwrap();
        let ticks: Vec<u64> = arena.history().map(|s| s.tick).collect();
        assert_eq!(ticks, vec![8, 9, 10, 11, 12]);
    }

    #[test]
    fn test_rolling_ball_slows() {
        let mut arena = bare();
        let ball = arena.spawn_cargo(Vec3::new(5.0, 4.0, 0.0), Alliance::Red).unwrap();
        arena.set_velocity(ball, Vec3::new(1.0, 0.0, 0.0)).unwrap();
        arena.run(50).unwrap();
        let body = arena.body(ball).unwrap();
        assert!(body.velocity.x < 1.0 && body.velocity.x > 0.8);
        assert!(body.position.x > 5.5);
        assert_eq!(body.position.z, 0.0);
    }

    #[test]
    fn test_dropped_ball_bounces_lower() {
        let mut arena = bare();
        let ball = arena.spawn_cargo(Vec3::new(5.0, 4.0, 1.0), Alliance::Blue).unwrap();
        let mut peak_after_bounce: f64 = 0.0;
        let mut bounced = false;
        for _ in 0..150 {
            arena.step().unwrap();
            let b = arena.body(ball).unwrap();
            if b.position.z == 0.0 {
                bounced = true;
            }
            if bounced {
                peak_after_bounce = peak_after_bounce.max(b.position.z);
            }
        }
        assert!(bounced);
        assert!(peak_after_bounce > 0.4 && peak_after_bounce < 1.0);
    }

    #[test]
    fn test_escape_and_return() {
        let mut arena = bare();
        let ball = arena.spawn_cargo(Vec3::new(8.0, 0.3, 1.0), Alliance::Red).unwrap();
        let id = arena.id(ball).unwrap();
        arena.set_velocity(ball, Vec3::new(0.0, -10.0, 0.0)).unwrap();

        let summary = arena.step().unwrap();
        assert_eq!(summary.out_of_bounds_len, 1);
        assert!(!arena.world.contains(ball));
        assert!(matches!(arena.body(ball), Err(SimError::UnknownEntity)));

        arena.run(110).unwrap();
        assert_eq!(arena.out_of_bounds().len(), 0);
        let back = arena.entity(id).expect("cargo returned to the field");
        let p = arena.position(back).unwrap();
        let home = arena.config().out_of_bounds.return_point;
        assert!(p.horizontal().distance(&home.horizontal()) < 1e-9);
        arena.verify_index().unwrap();
    }

    #[test]
    fn test_robot_picks_up_and_shoots() {
        let mut arena = bare();
        let robot = arena.spawn_robot(Vec3::new(4.0, 4.0, 0.0), Alliance::Blue).unwrap();
        let ball = arena.spawn_cargo(Vec3::new(4.5, 4.0, 0.0), Alliance::Blue).unwrap();
        let id = arena.id(ball).unwrap();

        arena.step().unwrap();
        assert_eq!(arena.held(robot).unwrap(), 0);
        let shot = arena.entity(id).expect("ball is back on the field");
        let body = arena.body(shot).unwrap();
        assert!(body.velocity.x > 10.0);
        assert!(body.position.z > 0.4);
        assert!(arena.body(robot).unwrap().position.x < body.position.x);
    }

    #[test]
    fn test_hub_captures_and_returns() {
        let mut arena = Arena::new(ArenaConfig {
            hub: Some(Default::default()),
            ..ArenaConfig::bare()
        })
        .unwrap();
        let origin = arena.hub().map(|h| h.origin).unwrap();
        let ball = arena
            .spawn_cargo(origin + Vec3::new(0.05, 0.0, 0.55), Alliance::Red)
            .unwrap();
        let id = arena.id(ball).unwrap();
        arena.set_velocity(ball, Vec3::new(0.0, 0.0, -0.5)).unwrap();

        let summary = arena.step().unwrap();
        assert_eq!(summary.scored, 1);
        assert_eq!(summary.hub_len, 1);
        assert!(arena.entity(id).is_none());

        arena.run(60).unwrap();
        assert_eq!(arena.summary().hub_len, 0);
        let back = arena.entity(id).expect("hub released the ball");
        assert!(arena.velocity(back).unwrap().x > 0.0);
        assert_eq!(arena.scored(), 1);
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = || {
            let mut arena = Arena::new(ArenaConfig {
                seed: 11,
                ..ArenaConfig::default()
            })
            .unwrap();
            arena.run(200).unwrap();
            let history: Vec<Summary> = arena.history().copied().collect();
            let bodies: Vec<(BodyId, Body)> = arena.bodies().into_iter().map(|(_, id, _, b)| (id, b)).collect();
            (history, bodies)
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_long_run_keeps_index_consistent() {
        let mut arena = Arena::new(ArenaConfig::default()).unwrap();
        for _ in 0..500 {
            arena.step().unwrap();
        }
        arena.verify_index().unwrap();
        let size = arena.config().size();
        for (_, _, _, body) in arena.bodies() {
            let p = body.position;
            assert!(p.is_finite() && body.velocity.is_finite());
            assert!(p.x >= 0.0 && p.x < size.x);
            assert!(p.y >= 0.0 && p.y < size.y);
            assert!(p.z >= 0.0 && p.z < size.z);
        }
        let s = arena.summary();
        assert_eq!(s.live_bodies + s.out_of_bounds_len + s.hub_len + held(&arena), 27);
    }

    fn held(arena: &Arena) -> usize {
        arena
            .bodies()
            .into_iter()
            .filter_map(|(e, _, kind, _)| kind.is_robot().then(|| arena.held(e).unwrap_or(0)))
            .sum()
    }

    #[test]
    fn test_unknown_entity() {
        let mut arena = bare();
        let ball = arena.spawn_cargo(Vec3::new(1.0, 1.0, 0.0), Alliance::Red).unwrap();
        arena.world.despawn(ball).unwrap();
        assert_eq!(arena.step_body(ball), Err(SimError::UnknownEntity));
        assert_eq!(arena.speed(ball), Err(SimError::UnknownEntity));
    }

    #[test]
    fn test_toroidal_arena_wraps() {
        let mut arena = Arena::new(ArenaConfig {
            toroidal: true,
            ..ArenaConfig::bare()
        })
        .unwrap();
        let ball = arena.spawn_cargo(Vec3::new(16.3, 4.0, 0.0), Alliance::Red).unwrap();
        arena.set_velocity(ball, Vec3::new(10.0, 0.0, 0.0)).unwrap();
        arena.step().unwrap();
        let p = arena.position(ball).unwrap();
        assert!(p.x < 1.0, "wrapped to {:?}", p);
        assert_eq!(arena.summary().out_of_bounds_len, 0);
    }
}
