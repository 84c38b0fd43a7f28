//! Physical state of a body and what kind of thing it is.

use fieldsim_logic::collision::{Contact, Mass};
use fieldsim_logic::constants::{cargo, obstacle, robot};
use fieldsim_logic::Vec3;
use serde::{Deserialize, Serialize};

use super::common::{Alliance, BodyId};

/// Point-mass sphere. Canonical position and velocity live here; the
/// spatial index holds a synchronised copy of the position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub position: Vec3,
    pub velocity: Vec3,
    pub mass: Mass,
    pub radius: f64,
    /// Coefficient of restitution in [0, 1].
    pub elasticity: f64,
}

impl Body {
    pub fn cargo(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            mass: Mass::Finite(cargo::MASS_KG),
            radius: cargo::RADIUS_M,
            elasticity: cargo::ELASTICITY,
        }
    }

    /// Robot body. Robots drive on the floor, so the center sits one radius up.
    pub fn robot(position: Vec3) -> Self {
        Self {
            position: position.with_z(robot::RADIUS_M),
            velocity: Vec3::ZERO,
            mass: Mass::Finite(robot::MASS_KG),
            radius: robot::RADIUS_M,
            elasticity: robot::ELASTICITY,
        }
    }

    pub fn obstacle(position: Vec3, radius: f64) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            mass: Mass::Infinite,
            radius,
            elasticity: 1.0,
        }
    }

    pub fn with_velocity(self, velocity: Vec3) -> Self {
        Self { velocity, ..self }
    }

    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }

    pub fn contact(&self) -> Contact {
        Contact {
            position: self.position,
            velocity: self.velocity,
            mass: self.mass,
            radius: self.radius,
            elasticity: self.elasticity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BodyKind {
    Cargo { alliance: Alliance },
    Robot { alliance: Alliance },
    /// Fixed post or structure. Bodies above `height_m` pass over it.
    Obstacle { height_m: f64 },
}

impl BodyKind {
    /// Robots are held at `z = radius` with no vertical velocity.
    pub fn pins_to_floor(&self) -> bool {
        matches!(self, BodyKind::Robot { .. })
    }

    pub fn is_obstacle(&self) -> bool {
        matches!(self, BodyKind::Obstacle { .. })
    }

    pub fn is_robot(&self) -> bool {
        matches!(self, BodyKind::Robot { .. })
    }

    pub fn is_cargo(&self) -> bool {
        matches!(self, BodyKind::Cargo { .. })
    }

    /// Tall bodies collide as vertical cylinders rather than spheres.
    pub fn is_tall(&self) -> bool {
        !self.is_cargo()
    }

    /// Radius searched for collision partners.
    pub fn neighborhood_m(&self) -> f64 {
        match self {
            BodyKind::Cargo { .. } => cargo::NEIGHBORHOOD_M,
            BodyKind::Robot { .. } => robot::NEIGHBORHOOD_M,
            BodyKind::Obstacle { .. } => obstacle::NEIGHBORHOOD_M,
        }
    }

    pub fn alliance(&self) -> Option<Alliance> {
        match self {
            BodyKind::Cargo { alliance } | BodyKind::Robot { alliance } => Some(*alliance),
            BodyKind::Obstacle { .. } => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BodyKind::Cargo { .. } => "cargo",
            BodyKind::Robot { .. } => "robot",
            BodyKind::Obstacle { .. } => "obstacle",
        }
    }
}

/// A body that has left the world: waiting in a station or riding in a robot.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyRecord {
    pub id: BodyId,
    pub kind: BodyKind,
    pub body: Body,
    pub hopper: Option<Hopper>,
}

/// Cargo slots carried by a robot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Hopper {
    held: Vec<BodyRecord>,
    capacity: usize,
}

impl Hopper {
    pub fn new(capacity: usize) -> Self {
        Self {
            held: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn has_room(&self) -> bool {
        self.held.len() < self.capacity
    }

    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    /// Store a record. Hands it back when every slot is taken.
    pub fn load(&mut self, record: BodyRecord) -> Result<(), BodyRecord> {
        if self.has_room() {
            self.held.push(record);
            Ok(())
        } else {
            Err(record)
        }
    }

    /// Take the first-loaded record.
    pub fn unload(&mut self) -> Option<BodyRecord> {
        if self.held.is_empty() {
            None
        } else {
            Some(self.held.remove(0))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &BodyRecord> {
        self.held.iter()
    }
}
