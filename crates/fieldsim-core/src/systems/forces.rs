//! Environmental forces and integration for a single body.

use fieldsim_logic::constants::physics::{
    GRAVITY_M_S2, GROUND_CONTACT_M, ROLLING_FRICTION_COEFFICIENT, VERTICAL_ELASTICITY,
};

use crate::components::Body;

/// Rolling resistance for bodies on the floor. Never reverses the velocity.
pub fn apply_rolling_friction(body: &mut Body, dt: f64) {
    if body.position.z > GROUND_CONTACT_M {
        return;
    }
    let dv = GRAVITY_M_S2 * ROLLING_FRICTION_COEFFICIENT * dt;
    let speed = body.speed();
    if dv >= speed {
        body.velocity = fieldsim_logic::Vec3::ZERO;
    } else {
        body.velocity = body.velocity * (1.0 - dv / speed);
    }
}

pub fn apply_gravity(body: &mut Body, dt: f64) {
    body.velocity.z -= GRAVITY_M_S2 * dt;
}

pub fn integrate(body: &mut Body, dt: f64) {
    body.position += body.velocity * dt;
}

/// Bounce off the floor, losing some vertical speed.
///
/// A bounce too weak to survive one tick of gravity settles instead, so
/// resting bodies stay at rest.
pub fn bounce_off_floor(body: &mut Body, dt: f64) {
    if body.position.z >= 0.0 {
        return;
    }
    body.position.z = 0.0;
    let rebound = -body.velocity.z * VERTICAL_ELASTICITY;
    body.velocity.z = if rebound < GRAVITY_M_S2 * dt {
        0.0
    } else {
        rebound
    };
}

/// Hold a floor-driving body at its radius.
pub fn pin_to_floor(body: &mut Body) {
    body.position.z = body.radius;
    body.velocity.z = 0.0;
}
