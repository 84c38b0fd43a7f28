//! Physical constants: field geometry and body presets.
//!
//! Plain `f64` constants in SI units (meters, kilograms, seconds). The arena
//! engine and the headless harness both read from here.

pub mod field {
    /// Field length along X.
    pub const LENGTH_M: f64 = 16.46;
    /// Field width along Y.
    pub const WIDTH_M: f64 = 8.23;
    /// Vertical extent of the simulated volume. Shots never get this high.
    pub const CEILING_M: f64 = 20.0;
    /// End walls (X = 0 and X = max) are 197 cm high.
    pub const END_WALL_HEIGHT_M: f64 = 1.97;
    /// Side walls (Y = 0 and Y = max) are 51 cm high.
    pub const SIDE_WALL_HEIGHT_M: f64 = 0.51;
    /// Bodies above robot height pass over each other.
    pub const COLLISION_CEILING_M: f64 = 1.32;
}

pub mod physics {
    pub const GRAVITY_M_S2: f64 = 9.8;
    /// Rolling resistance for a foam ball on carpet, measured from video.
    pub const ROLLING_FRICTION_COEFFICIENT: f64 = 0.0135;
    /// Velocity kept through a floor bounce (about 0.75 of the height).
    pub const VERTICAL_ELASTICITY: f64 = 0.85;
    /// Bodies at or below this height count as rolling.
    pub const GROUND_CONTACT_M: f64 = 0.01;
    /// Extra gap left by positional correction so the pair reads as apart.
    pub const SEPARATION_EPSILON_M: f64 = 0.001;
}

pub mod cargo {
    pub const RADIUS_M: f64 = 0.12;
    pub const MASS_KG: f64 = 0.27;
    /// Rolling ball-on-ball collisions, measured from video.
    pub const ELASTICITY: f64 = 0.5;
    pub const NEIGHBORHOOD_M: f64 = 2.0;
}

pub mod robot {
    pub const RADIUS_M: f64 = 0.50;
    /// Maximum allowed robot mass.
    pub const MASS_KG: f64 = 56.0;
    /// Robot contacts are very inelastic.
    pub const ELASTICITY: f64 = 0.1;
    pub const NEIGHBORHOOD_M: f64 = 4.0;
    /// Cargo within this radius of the robot center can be picked up.
    pub const PICKUP_RADIUS_M: f64 = 0.75;
    /// Only cargo this close to the floor can be picked up.
    pub const PICKUP_MAX_HEIGHT_M: f64 = 0.4;
    pub const SLOTS: usize = 2;
    pub const SHOT_SPEED_M_S: f64 = 12.0;
    pub const SHOT_VERTICAL_SPEED_M_S: f64 = 7.0;
    /// Launch point clearance beyond the robot radius.
    pub const SHOT_CLEARANCE_M: f64 = 0.14;
    /// Half-width of the uniform per-tick velocity jitter.
    pub const JITTER_M_S: f64 = 0.05;
}

pub mod obstacle {
    /// Terminal posts are about 4.5 cm wide.
    pub const POST_RADIUS_M: f64 = 0.045;
    pub const NEIGHBORHOOD_M: f64 = 4.0;
}

pub mod hub {
    /// Height of the bucket wall a ball must climb to escape.
    pub const WALL_HEIGHT_M: f64 = 0.8;
    /// Energy kept per bounce inside the bucket. The foam is soft.
    pub const CAPTURE_ELASTICITY: f64 = 0.5;
    pub const BASE_RADIUS_M: f64 = 0.4;
    pub const TOP_RADIUS_M: f64 = 0.68;
    pub const HEIGHT_M: f64 = 0.6;
    pub const ELEVATION_M: f64 = 2.0;
}
