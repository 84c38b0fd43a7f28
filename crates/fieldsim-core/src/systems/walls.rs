//! Field boundary: wall bounces, escapes over low walls, and confinement.

use fieldsim_logic::config::ArenaConfig;
use fieldsim_logic::constants::field::{END_WALL_HEIGHT_M, SIDE_WALL_HEIGHT_M};
use fieldsim_logic::constants::physics::SEPARATION_EPSILON_M;
use fieldsim_logic::Vec3;

use crate::components::Body;

/// Result of testing a body against the walls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallContact {
    Clear,
    Bounced,
    /// Crossed a wall above its height. The body leaves the field.
    Escaped,
}

/// Field extents. The min corner is the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Field {
    pub size: Vec3,
    /// Wraparound field: no walls, bodies reappear on the far side.
    pub toroidal: bool,
}

impl Field {
    pub fn new(size: Vec3, toroidal: bool) -> Self {
        Self { size, toroidal }
    }

    pub fn from_config(config: &ArenaConfig) -> Self {
        Self::new(config.size(), config.toroidal)
    }

    fn top(&self) -> f64 {
        self.size.z - SEPARATION_EPSILON_M
    }

    /// Clamp the body inside the walls (inset by its radius) and reflect the
    /// velocity off any wall it touched, scaled by its elasticity.
    ///
    /// End walls (x) and side walls (y) have different heights; a body above
    /// the wall it touches escapes instead.
    pub fn check_walls(&self, body: &mut Body) -> WallContact {
        let mut contact = WallContact::Clear;
        let r = body.radius;
        let e = body.elasticity;
        let z = body.position.z;

        if !self.toroidal {
            let mut escaped = false;
            let mut hit = |pos: &mut f64, vel: &mut f64, lo: f64, hi: f64, wall: f64| {
                if *pos <= lo {
                    escaped |= z > wall;
                    *pos = lo;
                    if *vel < 0.0 {
                        *vel = -*vel * e;
                    }
                    true
                } else if *pos >= hi {
                    escaped |= z > wall;
                    *pos = hi;
                    if *vel > 0.0 {
                        *vel = -*vel * e;
                    }
                    true
                } else {
                    false
                }
            };
            let hit_x = hit(
                &mut body.position.x,
                &mut body.velocity.x,
                r,
                self.size.x - r,
                END_WALL_HEIGHT_M,
            );
            let hit_y = hit(
                &mut body.position.y,
                &mut body.velocity.y,
                r,
                self.size.y - r,
                SIDE_WALL_HEIGHT_M,
            );
            if escaped {
                return WallContact::Escaped;
            }
            if hit_x || hit_y {
                contact = WallContact::Bounced;
            }
        }

        if body.position.z > self.top() {
            body.position.z = self.top();
            if body.velocity.z > 0.0 {
                body.velocity.z = -body.velocity.z * e;
            }
            contact = WallContact::Bounced;
        }
        contact
    }

    /// Nearest point to `p` that a body of radius `r` may occupy.
    ///
    /// Horizontal clamping only applies to a walled field; height is always
    /// kept between the floor and the ceiling.
    pub fn confine(&self, p: Vec3, r: f64) -> Vec3 {
        let mut q = p;
        if !self.toroidal {
            q.x = q.x.max(r).min(self.size.x - r);
            q.y = q.y.max(r).min(self.size.y - r);
        }
        q.z = q.z.max(0.0).min(self.top());
        q
    }
}
