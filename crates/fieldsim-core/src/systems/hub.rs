//! The hub: an elevated bucket that either keeps a falling ball or spits it
//! back out over the rim.

use fieldsim_logic::bucket::Bucket;
use fieldsim_logic::capture::{kinetic_energy, CaptureModel};
use fieldsim_logic::config::HubConfig;
use fieldsim_logic::constants::physics::SEPARATION_EPSILON_M;
use fieldsim_logic::{SimResult, Vec3};
use rand::Rng;

use super::Station;
use crate::components::Body;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubOutcome {
    /// Not falling into the bucket this tick.
    Missed,
    Captured,
    /// Bounced out; the body has been placed on the rim heading outward.
    Rejected,
}

#[derive(Debug, Clone)]
pub struct Hub {
    pub bucket: Bucket,
    /// World position of the bucket base center.
    pub origin: Vec3,
    pub station: Station,
}

impl Hub {
    pub fn from_config(config: &HubConfig) -> SimResult<Self> {
        Ok(Self {
            bucket: config.bucket()?,
            origin: config.origin(),
            station: Station::new("hub", &config.station),
        })
    }

    pub fn to_local(&self, p: Vec3) -> Vec3 {
        p - self.origin
    }

    pub fn contains(&self, p: Vec3) -> bool {
        self.bucket.is_inside(self.to_local(p))
    }

    /// Decide what happens to `body` if it is falling inside the bucket.
    pub fn check<R: Rng + ?Sized>(&self, body: &mut Body, rng: &mut R) -> HubOutcome {
        if body.velocity.z >= 0.0 || !self.contains(body.position) {
            return HubOutcome::Missed;
        }
        let mass = body.mass.kg();
        let model = CaptureModel::for_body(mass, body.elasticity);
        if model.is_captured(kinetic_energy(mass, body.speed()), rng) {
            HubOutcome::Captured
        } else {
            self.eject(body, &model);
            HubOutcome::Rejected
        }
    }

    /// Put `body` just outside the rim, moving radially outward with the
    /// speed left after one bounce.
    fn eject(&self, body: &mut Body, model: &CaptureModel) {
        let radial = self
            .to_local(body.position)
            .horizontal()
            .try_normalize()
            .unwrap_or(Vec3::X);
        let rim = self.bucket.top_radius() + body.radius + SEPARATION_EPSILON_M;
        body.position = self.origin + radial * rim + Vec3::Z * self.bucket.height;
        body.velocity = radial * (body.speed() * model.elasticity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn hub() -> Hub {
        Hub::from_config(&HubConfig::default()).unwrap()
    }

    #[test]
    fn test_contains_uses_world_coordinates() {
        let hub = hub();
        assert!(hub.contains(hub.origin + Vec3::new(0.0, 0.0, 0.1)));
        assert!(!hub.contains(Vec3::new(hub.origin.x, hub.origin.y, 0.1)));
        assert!(!hub.contains(hub.origin + Vec3::new(1.0, 0.0, 0.3)));
    }

    #[test]
    fn test_rising_ball_is_ignored() {
        let hub = hub();
        let mut rng = StdRng::seed_from_u64(0);
        let mut ball = Body::cargo(hub.origin + Vec3::new(0.1, 0.0, 0.3)).with_velocity(Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(hub.check(&mut ball, &mut rng), HubOutcome::Missed);
    }

    #[test]
    fn test_slow_ball_is_captured() {
        let hub = hub();
        let mut rng = StdRng::seed_from_u64(0);
        let mut ball = Body::cargo(hub.origin + Vec3::new(0.1, 0.0, 0.3)).with_velocity(Vec3::new(0.5, 0.0, -1.0));
        assert_eq!(hub.check(&mut ball, &mut rng), HubOutcome::Captured);
    }

    #[test]
    fn test_fast_ball_bounces_over_rim() {
        let hub = hub();
        let mut rng = StdRng::seed_from_u64(0);
        let mut rejected = 0;
        for _ in 0..20 {
            let mut ball = Body::cargo(hub.origin + Vec3::new(0.1, 0.1, 0.3)).with_velocity(Vec3::new(20.0, 0.0, -20.0));
            if hub.check(&mut ball, &mut rng) == HubOutcome::Rejected {
                rejected += 1;
                let local = hub.to_local(ball.position);
                assert!(local.horizontal_length() > hub.bucket.top_radius());
                assert!((local.z - hub.bucket.height).abs() < 1e-9);
                // Moving away from the axis, not up or down.
                assert!(ball.velocity.dot(&local.horizontal()) > 0.0);
                assert_eq!(ball.velocity.z, 0.0);
            }
        }
        assert!(rejected > 0);
    }
}
