//! Collision math for pairs of spherical bodies.
//!
//! Algorithm: "exchange then separate"
//! 1. Detect overlap (`overlaps`)
//! 2. Split each velocity into a normal part (along the center line) and a
//!    tangential remainder; the tangential part is untouched (no friction)
//! 3. Exchange normal velocities with the 1-D restitution equations
//! 4. Push the centers apart along the normal (`resolve_position`)
//!
//! Step 4 is not optional. An inelastic exchange can leave the pair still
//! overlapping, and the next overlap test would then collide them again with
//! velocities that no longer make sense.
//!
//! The cylindrical variants drop the vertical component of the center line,
//! so a tall robot and a ball at a different height still collide as discs.

use serde::{Deserialize, Serialize};

use crate::constants::physics::SEPARATION_EPSILON_M;
use crate::vector::Vec3;

/// Body mass. Obstacles and walls are `Infinite` and never yield.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Mass {
    Finite(f64),
    Infinite,
}

impl Mass {
    pub fn is_infinite(&self) -> bool {
        matches!(self, Mass::Infinite)
    }

    /// Kilograms, or `f64::INFINITY`.
    pub fn kg(&self) -> f64 {
        match self {
            Mass::Finite(m) => *m,
            Mass::Infinite => f64::INFINITY,
        }
    }
}

/// How two elasticities combine into one coefficient of restitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ElasticityRule {
    /// The bouncier partner wins: a soft robot does not kill a lively ball.
    #[default]
    Max,
    /// The softer partner wins. Used where wall scuffing dominates.
    Min,
}

impl ElasticityRule {
    pub fn combine(&self, e1: f64, e2: f64) -> f64 {
        match self {
            ElasticityRule::Max => e1.max(e2),
            ElasticityRule::Min => e1.min(e2),
        }
    }
}

/// Everything the collision math needs to know about one body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub position: Vec3,
    pub velocity: Vec3,
    pub mass: Mass,
    pub radius: f64,
    pub elasticity: f64,
}

/// True iff the centers are strictly closer than the sum of the radii.
///
/// Spheres that exactly touch do not overlap; see [`touches`].
pub fn overlaps(p1: Vec3, p2: Vec3, r1: f64, r2: f64) -> bool {
    p1.distance(&p2) < r1 + r2
}

/// Inclusive companion of [`overlaps`]: exact contact counts.
pub fn touches(p1: Vec3, p2: Vec3, r1: f64, r2: f64) -> bool {
    p1.distance(&p2) <= r1 + r2
}

/// Unit vector from `a` to `b` along `d`, or `+X` when the centers coincide.
fn contact_normal(d: Vec3) -> Vec3 {
    d.try_normalize().unwrap_or(Vec3::X)
}

/// Post-collision velocities for a spherical contact.
pub fn resolve_velocity(a: &Contact, b: &Contact, rule: ElasticityRule) -> (Vec3, Vec3) {
    let normal = contact_normal(b.position - a.position);
    exchange(a, b, normal, rule)
}

/// Post-collision velocities ignoring the vertical separation of the centers.
pub fn resolve_velocity_cylindrical(
    a: &Contact,
    b: &Contact,
    rule: ElasticityRule,
) -> (Vec3, Vec3) {
    let normal = contact_normal((b.position - a.position).horizontal());
    exchange(a, b, normal, rule)
}

fn exchange(a: &Contact, b: &Contact, normal: Vec3, rule: ElasticityRule) -> (Vec3, Vec3) {
    let e = rule.combine(a.elasticity, b.elasticity);

    let u1 = a.velocity.dot(&normal);
    let u2 = b.velocity.dot(&normal);
    let tangent1 = a.velocity - normal * u1;
    let tangent2 = b.velocity - normal * u2;

    let (w1, w2) = match (a.mass, b.mass) {
        (Mass::Infinite, Mass::Infinite) => return (a.velocity, b.velocity),
        (Mass::Infinite, Mass::Finite(_)) => (u1, -u2 * e + (e + 1.0) * u1),
        (Mass::Finite(_), Mass::Infinite) => (-u1 * e + (e + 1.0) * u2, u2),
        (Mass::Finite(m1), Mass::Finite(m2)) => (
            (u1 * (m1 - e * m2) + (e + 1.0) * m2 * u2) / (m1 + m2),
            (u2 * (m2 - e * m1) + (e + 1.0) * m1 * u1) / (m1 + m2),
        ),
    };

    (tangent1 + normal * w1, tangent2 + normal * w2)
}

/// Push two overlapping spheres apart until they are `r1 + r2` (plus a small
/// epsilon) apart, splitting the correction in inverse proportion to mass.
///
/// Only meaningful for an overlapping pair: a separated pair is pulled back
/// to contact distance.
pub fn resolve_position(a: &Contact, b: &Contact) -> (Vec3, Vec3) {
    separate(a, b, b.position - a.position)
}

/// [`resolve_position`] in the horizontal plane; vertical offsets are kept.
pub fn resolve_position_cylindrical(a: &Contact, b: &Contact) -> (Vec3, Vec3) {
    separate(a, b, (b.position - a.position).horizontal())
}

fn separate(a: &Contact, b: &Contact, d: Vec3) -> (Vec3, Vec3) {
    let normal = contact_normal(d);
    let min_distance = a.radius + b.radius + SEPARATION_EPSILON_M;
    let squish = normal * min_distance - d;

    match (a.mass, b.mass) {
        (Mass::Infinite, Mass::Infinite) => (a.position, b.position),
        (Mass::Infinite, Mass::Finite(_)) => (a.position, b.position + squish),
        (Mass::Finite(_), Mass::Infinite) => (a.position - squish, b.position),
        (Mass::Finite(m1), Mass::Finite(m2)) => {
            let total = m1 + m2;
            (
                a.position - squish * (m2 / total),
                b.position + squish * (m1 / total),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;
    // Positional correction overshoots by half the epsilon per body.
    const POS_EPS: f64 = 1e-3;

    fn unit(position: Vec3, velocity: Vec3) -> Contact {
        Contact {
            position,
            velocity,
            mass: Mass::Finite(1.0),
            radius: 1.0,
            elasticity: 1.0,
        }
    }

    fn assert_close(expected: Vec3, actual: Vec3, tol: f64) {
        assert!(
            expected.distance(&actual) < tol,
            "expected {:?}, got {:?}",
            expected,
            actual
        );
    }

    #[test]
    fn test_overlap_is_strict() {
        let p1 = Vec3::ZERO;
        let p2 = Vec3::new(2.0, 0.0, 0.0);
        assert!(!overlaps(p1, p2, 1.0, 1.0));
        assert!(touches(p1, p2, 1.0, 1.0));
        assert!(overlaps(p1, Vec3::new(1.999, 0.0, 0.0), 1.0, 1.0));
        assert!(!touches(p1, Vec3::new(2.001, 0.0, 0.0), 1.0, 1.0));
    }

    #[test]
    fn test_collide_1d() {
        let a = unit(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        let b = unit(Vec3::new(1.0, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0));

        let (v1, v2) = resolve_velocity(&a, &b, ElasticityRule::Max);
        assert_close(Vec3::new(-1.0, 0.0, 0.0), v1, EPS);
        assert_close(Vec3::new(1.0, 0.0, 0.0), v2, EPS);

        let (p1, p2) = resolve_position(&a, &b);
        assert_close(Vec3::new(-0.5, 0.0, 0.0), p1, POS_EPS);
        assert_close(Vec3::new(1.5, 0.0, 0.0), p2, POS_EPS);
        assert!(p1.distance(&p2) > 2.0);
    }

    #[test]
    fn test_collide_2d() {
        let a = unit(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        let b = unit(Vec3::new(1.0, 1.0, 0.0), Vec3::new(-1.0, 0.0, 0.0));

        let (v1, v2) = resolve_velocity(&a, &b, ElasticityRule::Max);
        assert_close(Vec3::new(0.0, -1.0, 0.0), v1, EPS);
        assert_close(Vec3::new(0.0, 1.0, 0.0), v2, EPS);

        let h = 0.5_f64.sqrt();
        let (p1, p2) = resolve_position(&a, &b);
        assert_close(Vec3::new(0.5 - h, 0.5 - h, 0.0), p1, POS_EPS);
        assert_close(Vec3::new(0.5 + h, 0.5 + h, 0.0), p2, POS_EPS);
    }

    #[test]
    fn test_collide_spherical() {
        let a = unit(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        let b = unit(Vec3::new(1.0, 0.0, 1.0), Vec3::new(-1.0, 0.0, 0.0));

        let (v1, v2) = resolve_velocity(&a, &b, ElasticityRule::Max);
        assert_close(Vec3::new(0.0, 0.0, -1.0), v1, EPS);
        assert_close(Vec3::new(0.0, 0.0, 1.0), v2, EPS);

        let h = 0.5_f64.sqrt();
        let (p1, p2) = resolve_position(&a, &b);
        assert_close(Vec3::new(0.5 - h, 0.0, 0.5 - h), p1, POS_EPS);
        assert_close(Vec3::new(0.5 + h, 0.0, 0.5 + h), p2, POS_EPS);
    }

    // ignores z, should be like 1d
    #[test]
    fn test_collide_cylindrical_x() {
        let a = unit(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        let b = unit(Vec3::new(1.0, 0.0, 1.0), Vec3::new(-1.0, 0.0, 0.0));

        let (v1, v2) = resolve_velocity_cylindrical(&a, &b, ElasticityRule::Max);
        assert_close(Vec3::new(-1.0, 0.0, 0.0), v1, EPS);
        assert_close(Vec3::new(1.0, 0.0, 0.0), v2, EPS);

        let (p1, p2) = resolve_position_cylindrical(&a, &b);
        assert_close(Vec3::new(-0.5, 0.0, 0.0), p1, POS_EPS);
        assert_close(Vec3::new(1.5, 0.0, 1.0), p2, POS_EPS);
        assert_eq!(p2.z - p1.z, 1.0);
    }

    #[test]
    fn test_collide_cylindrical_xy() {
        let a = unit(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        let b = unit(Vec3::new(1.0, 1.0, 1.0), Vec3::new(-1.0, 0.0, 0.0));

        let (v1, v2) = resolve_velocity_cylindrical(&a, &b, ElasticityRule::Max);
        assert_close(Vec3::new(0.0, -1.0, 0.0), v1, EPS);
        assert_close(Vec3::new(0.0, 1.0, 0.0), v2, EPS);

        let h = 0.5_f64.sqrt();
        let (p1, p2) = resolve_position_cylindrical(&a, &b);
        assert_close(Vec3::new(0.5 - h, 0.5 - h, 0.0), p1, POS_EPS);
        assert_close(Vec3::new(0.5 + h, 0.5 + h, 1.0), p2, POS_EPS);
    }

    #[test]
    fn test_momentum_conserved_inelastic() {
        let a = Contact {
            position: Vec3::ZERO,
            velocity: Vec3::new(3.0, 1.0, 0.0),
            mass: Mass::Finite(2.0),
            radius: 0.5,
            elasticity: 0.3,
        };
        let b = Contact {
            position: Vec3::new(0.8, 0.2, 0.0),
            velocity: Vec3::new(-1.0, 0.5, 0.0),
            mass: Mass::Finite(5.0),
            radius: 0.5,
            elasticity: 0.1,
        };
        let before = a.velocity * 2.0 + b.velocity * 5.0;
        let (v1, v2) = resolve_velocity(&a, &b, ElasticityRule::Max);
        let after = v1 * 2.0 + v2 * 5.0;
        assert_close(before, after, 1e-9);

        // Relative normal speed is scaled by the combined elasticity (0.3).
        let n = (b.position - a.position).try_normalize().unwrap();
        let rel_before = (b.velocity - a.velocity).dot(&n);
        let rel_after = (v2 - v1).dot(&n);
        assert!((rel_after + 0.3 * rel_before).abs() < 1e-9);
    }

    #[test]
    fn test_infinite_mass_does_not_yield() {
        let wall = Contact {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            mass: Mass::Infinite,
            radius: 1.0,
            elasticity: 0.5,
        };
        let ball = Contact {
            position: Vec3::new(1.5, 0.0, 0.0),
            velocity: Vec3::new(-2.0, 1.0, 0.0),
            mass: Mass::Finite(0.27),
            radius: 0.12,
            elasticity: 0.5,
        };

        let (vw, vb) = resolve_velocity(&wall, &ball, ElasticityRule::Max);
        assert_eq!(vw, Vec3::ZERO);
        assert_close(Vec3::new(1.0, 1.0, 0.0), vb, EPS);

        let (pw, pb) = resolve_position(&wall, &ball);
        assert_eq!(pw, Vec3::ZERO);
        assert!((pb.x - (1.12 + SEPARATION_EPSILON_M)).abs() < EPS);

        // Same answer with the roles swapped.
        let (vb2, vw2) = resolve_velocity(&ball, &wall, ElasticityRule::Max);
        assert_eq!(vw2, Vec3::ZERO);
        assert_close(vb, vb2, EPS);
    }

    #[test]
    fn test_mass_weighted_separation() {
        let light = Contact {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            mass: Mass::Finite(1.0),
            radius: 0.5,
            elasticity: 0.0,
        };
        let heavy = Contact {
            position: Vec3::new(0.5, 0.0, 0.0),
            mass: Mass::Finite(3.0),
            ..light
        };
        let (p1, p2) = resolve_position(&light, &heavy);
        // The light body takes three quarters of the correction.
        assert!((-p1.x - 3.0 * (p2.x - 0.5)).abs() < EPS);
    }

    #[test]
    fn test_coincident_centers_use_fallback_normal() {
        let a = unit(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        let b = unit(Vec3::ZERO, Vec3::new(-1.0, 0.0, 0.0));

        let (v1, v2) = resolve_velocity(&a, &b, ElasticityRule::Max);
        assert!(v1.is_finite() && v2.is_finite());
        assert_close(Vec3::new(-1.0, 0.0, 0.0), v1, EPS);

        let (p1, p2) = resolve_position(&a, &b);
        assert!(p1.x < 0.0 && p2.x > 0.0);
        assert!((p2.x - p1.x - (2.0 + SEPARATION_EPSILON_M)).abs() < EPS);
    }

    #[test]
    fn test_elasticity_rules() {
        assert_eq!(ElasticityRule::Max.combine(0.1, 0.5), 0.5);
        assert_eq!(ElasticityRule::Min.combine(0.1, 0.5), 0.1);
        assert_eq!(ElasticityRule::default(), ElasticityRule::Max);
    }
}
