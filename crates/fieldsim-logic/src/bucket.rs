//! Conical-frustum capture zone.
//!
//! A bucket opens upward with its base centered at the origin. It is the part
//! of an infinite cone (apex on the Z axis at `apex`, half-angle
//! `half_angle`) between `z = 0` and `z = height`. Callers translate world
//! points into bucket-local coordinates before asking.
//!
//! All lateral-surface math happens in the radial plane of the point: the
//! half-plane spanned by +Z and the horizontal direction from the axis to
//! the point. There the surface is a straight line through the apex.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::vector::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    /// Z coordinate of the cone apex. Below the base for an upward frustum.
    pub apex: f64,
    /// Angle between the axis and the lateral surface, radians.
    pub half_angle: f64,
    pub height: f64,
}

impl Default for Bucket {
    fn default() -> Self {
        Self::new(-2.0, std::f64::consts::FRAC_PI_4, 2.0)
    }
}

impl Bucket {
    pub fn new(apex: f64, half_angle: f64, height: f64) -> Self {
        Self {
            apex,
            half_angle,
            height,
        }
    }

    /// Bucket from base radius, top radius and height.
    pub fn from_dimensions(r_base: f64, r_top: f64, height: f64) -> SimResult<Self> {
        if r_base <= 0.0 || r_top <= 0.0 || height <= 0.0 {
            return Err(SimError::invalid_bucket(
                "radii and height must be positive",
            ));
        }
        let dr = r_top - r_base;
        if dr <= 0.0 {
            return Err(SimError::invalid_bucket(
                "top radius must be larger than base radius",
            ));
        }
        let half_angle = dr.atan2(height);
        Ok(Self {
            apex: -r_base / half_angle.tan(),
            half_angle,
            height,
        })
    }

    fn apex_point(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, self.apex)
    }

    /// Angle between `p - apex` and +Z, in `[0, π]`.
    pub fn angle(&self, p: Vec3) -> f64 {
        let d = p - self.apex_point();
        d.horizontal_length().atan2(d.z)
    }

    pub fn is_inside_cone(&self, p: Vec3) -> bool {
        self.angle(p) <= self.half_angle
    }

    pub fn is_below_top(&self, p: Vec3) -> bool {
        p.z <= self.height
    }

    pub fn is_above_base(&self, p: Vec3) -> bool {
        p.z >= 0.0
    }

    pub fn is_inside(&self, p: Vec3) -> bool {
        self.is_inside_cone(p) && self.is_below_top(p) && self.is_above_base(p)
    }

    /// Lateral radius at height `z`.
    pub fn radius_at(&self, z: f64) -> f64 {
        (z - self.apex) * self.half_angle.tan()
    }

    pub fn base_radius(&self) -> f64 {
        self.radius_at(0.0)
    }

    pub fn top_radius(&self) -> f64 {
        self.radius_at(self.height)
    }

    /// Horizontal unit vector from the axis toward `p`.
    fn radial(&self, p: Vec3) -> SimResult<Vec3> {
        p.horizontal().try_normalize().ok_or(SimError::OnAxis(p))
    }

    /// Outward unit normal of the lateral surface in the radial plane of `p`.
    pub fn unit_normal(&self, p: Vec3) -> SimResult<Vec3> {
        let (sin, cos) = self.half_angle.sin_cos();
        Ok(self.radial(p)? * cos - Vec3::Z * sin)
    }

    /// Distance from `p` to the lateral surface, positive outside the cone.
    pub fn signed_distance(&self, p: Vec3) -> f64 {
        let (sin, cos) = self.half_angle.sin_cos();
        p.horizontal_length() * cos - (p.z - self.apex) * sin
    }

    /// Orthogonal projection of `p` onto the lateral surface.
    ///
    /// Undefined for points on the axis, where every direction is radial.
    pub fn closest_point(&self, p: Vec3) -> SimResult<Vec3> {
        let radial = self.radial(p)?;
        let (sin, cos) = self.half_angle.sin_cos();
        let along = radial * sin + Vec3::Z * cos;
        let reach = p.horizontal_length() * sin + (p.z - self.apex) * cos;
        Ok(self.apex_point() + along * reach)
    }
}
