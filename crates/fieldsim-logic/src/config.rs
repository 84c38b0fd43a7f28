//! Arena configuration.
//!
//! Plain serde structs with `#[serde(default)]` so a JSON file only needs the
//! fields it changes. `ArenaConfig::default()` is a regulation field with two
//! robots per alliance, a ring of cargo, and a hub in the middle.

use serde::{Deserialize, Serialize};

use crate::bucket::Bucket;
use crate::constants::{field, hub, obstacle};
use crate::error::{SimError, SimResult};
use crate::vector::Vec3;

// ── Stations ──────────────────────────────────────────────────────────────

/// A delay station: where bodies wait and where they come back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    pub latency_s: f64,
    /// Releases per second. `None` releases as fast as latency allows.
    pub throughput: Option<f64>,
    /// Released bodies reappear here.
    pub return_point: Vec3,
    pub return_velocity: Vec3,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            latency_s: 2.0,
            throughput: Some(1.0),
            return_point: Vec3::new(1.0, field::WIDTH_M / 2.0, 0.0),
            return_velocity: Vec3::ZERO,
        }
    }
}

impl StationConfig {
    fn validate(&self, name: &str, size: Vec3) -> SimResult<()> {
        if !(self.latency_s >= 0.0 && self.latency_s.is_finite()) {
            return Err(SimError::invalid_config(format!(
                "{name}: latency must be finite and non-negative"
            )));
        }
        if let Some(t) = self.throughput {
            if !(t > 0.0 && t.is_finite()) {
                return Err(SimError::invalid_config(format!(
                    "{name}: throughput must be positive"
                )));
            }
        }
        let p = self.return_point;
        if !(p.is_finite()
            && p.x >= 0.0
            && p.x < size.x
            && p.y >= 0.0
            && p.y < size.y
            && p.z >= 0.0
            && p.z < size.z)
        {
            return Err(SimError::invalid_config(format!(
                "{name}: return point {p:?} is off the field"
            )));
        }
        if !self.return_velocity.is_finite() {
            return Err(SimError::invalid_config(format!(
                "{name}: return velocity must be finite"
            )));
        }
        Ok(())
    }
}

// ── Hub ───────────────────────────────────────────────────────────────────

/// Elevated bucket that captures cargo and feeds it back onto the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Field coordinates of the bucket axis.
    pub center_x_m: f64,
    pub center_y_m: f64,
    /// Height of the bucket base above the floor.
    pub elevation_m: f64,
    pub base_radius_m: f64,
    pub top_radius_m: f64,
    pub height_m: f64,
    pub station: StationConfig,
}

impl Default for HubConfig {
    fn default() -> Self {
        let cx = field::LENGTH_M / 2.0;
        let cy = field::WIDTH_M / 2.0;
        Self {
            center_x_m: cx,
            center_y_m: cy,
            elevation_m: hub::ELEVATION_M,
            base_radius_m: hub::BASE_RADIUS_M,
            top_radius_m: hub::TOP_RADIUS_M,
            height_m: hub::HEIGHT_M,
            station: StationConfig {
                latency_s: 1.0,
                throughput: Some(4.0),
                return_point: Vec3::new(cx + 1.1, cy, 0.3),
                return_velocity: Vec3::new(2.0, 0.0, 0.0),
            },
        }
    }
}

impl HubConfig {
    pub fn bucket(&self) -> SimResult<Bucket> {
        Bucket::from_dimensions(self.base_radius_m, self.top_radius_m, self.height_m)
    }

    /// World position of the bucket base center.
    pub fn origin(&self) -> Vec3 {
        Vec3::new(self.center_x_m, self.center_y_m, self.elevation_m)
    }
}

// ── Obstacles ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleConfig {
    pub x_m: f64,
    pub y_m: f64,
    pub radius_m: f64,
    pub height_m: f64,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            x_m: 0.0,
            y_m: 0.0,
            radius_m: obstacle::POST_RADIUS_M,
            height_m: field::COLLISION_CEILING_M,
        }
    }
}

// ── Arena ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub length_m: f64,
    pub width_m: f64,
    pub ceiling_m: f64,
    pub toroidal: bool,
    pub seconds_per_step: f64,
    pub seed: u64,
    pub robots_per_alliance: usize,
    pub cargo_per_alliance: usize,
    /// Radius of the ring the starting cargo sits on, around field center.
    pub cargo_ring_radius_m: f64,
    pub obstacles: Vec<ObstacleConfig>,
    pub out_of_bounds: StationConfig,
    pub hub: Option<HubConfig>,
    /// Tick summaries kept; older ones are dropped first.
    pub history_capacity: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        let hub = HubConfig::default();
        Self {
            length_m: field::LENGTH_M,
            width_m: field::WIDTH_M,
            ceiling_m: field::CEILING_M,
            toroidal: false,
            seconds_per_step: 0.02,
            seed: 0,
            robots_per_alliance: 2,
            cargo_per_alliance: 11,
            cargo_ring_radius_m: 3.88,
            // Lower hub structure under the bucket.
            obstacles: vec![ObstacleConfig {
                x_m: hub.center_x_m,
                y_m: hub.center_y_m,
                radius_m: 0.76,
                height_m: hub.elevation_m,
            }],
            out_of_bounds: StationConfig::default(),
            hub: Some(hub),
            history_capacity: 10_000,
        }
    }
}

impl ArenaConfig {
    /// Regulation field with nothing on it.
    pub fn bare() -> Self {
        Self {
            robots_per_alliance: 0,
            cargo_per_alliance: 0,
            obstacles: Vec::new(),
            hub: None,
            ..Self::default()
        }
    }

    /// Max corner of the simulated volume; the min corner is the origin.
    pub fn size(&self) -> Vec3 {
        Vec3::new(self.length_m, self.width_m, self.ceiling_m)
    }

    pub fn center(&self) -> Vec3 {
        Vec3::new(self.length_m / 2.0, self.width_m / 2.0, 0.0)
    }

    pub fn validate(&self) -> SimResult<()> {
        if !(self.length_m > 0.0 && self.width_m > 0.0) {
            return Err(SimError::invalid_config("field length and width must be positive"));
        }
        if !(self.ceiling_m > 0.0 && self.ceiling_m.is_finite()) {
            return Err(SimError::invalid_config("ceiling must be finite and positive"));
        }
        if !(self.seconds_per_step > 0.0 && self.seconds_per_step.is_finite()) {
            return Err(SimError::invalid_config("seconds_per_step must be positive"));
        }
        if self.cargo_ring_radius_m < 0.0 {
            return Err(SimError::invalid_config("cargo ring radius must be non-negative"));
        }

        let size = self.size();
        for (i, o) in self.obstacles.iter().enumerate() {
            if !(o.radius_m > 0.0) {
                return Err(SimError::invalid_config(format!(
                    "obstacle {i}: radius must be positive"
                )));
            }
            if !(o.x_m >= 0.0 && o.x_m < size.x && o.y_m >= 0.0 && o.y_m < size.y) {
                return Err(SimError::invalid_config(format!(
                    "obstacle {i}: position is off the field"
                )));
            }
        }

        self.out_of_bounds.validate("out_of_bounds", size)?;

        if let Some(hub) = &self.hub {
            hub.bucket()
                .map_err(|e| SimError::invalid_config(format!("hub: {e}")))?;
            if !(hub.center_x_m >= 0.0
                && hub.center_x_m < size.x
                && hub.center_y_m >= 0.0
                && hub.center_y_m < size.y)
            {
                return Err(SimError::invalid_config("hub center is off the field"));
            }
            if hub.elevation_m < 0.0 || hub.elevation_m + hub.height_m > self.ceiling_m {
                return Err(SimError::invalid_config("hub must fit between floor and ceiling"));
            }
            hub.station.validate("hub.station", size)?;
        }
        Ok(())
    }
}
