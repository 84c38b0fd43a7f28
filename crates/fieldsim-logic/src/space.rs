//! Dense-row spatial index.
//!
//! Positions live in one contiguous `Vec<Vec3>` so neighbor queries are a
//! linear scan over cache-friendly rows. Keys map to rows through a `HashMap`
//! and rows map back to keys through a parallel `Vec<K>`. Removing a row
//! shifts every later row down by one, so rows stay dense and ordered by
//! insertion.
//!
//! Three geometries are supported:
//! - bounded: out-of-bounds placement is an error
//! - toroidal: out-of-bounds placement wraps around the extents
//! - unbounded: anything goes, nothing wraps

use std::collections::HashMap;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::vector::Vec3;

/// Axis-aligned box given by its min and max corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box with the min corner at the origin.
    pub fn from_size(size: Vec3) -> Self {
        Self::new(Vec3::ZERO, size)
    }

    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Half-open on axes with positive extent: `max` itself is outside.
    /// A zero-extent axis only admits `min`.
    pub fn contains(&self, p: Vec3) -> bool {
        let axis = |v: f64, lo: f64, hi: f64| {
            if hi > lo {
                v >= lo && v < hi
            } else {
                v == lo
            }
        };
        axis(p.x, self.min.x, self.max.x)
            && axis(p.y, self.min.y, self.max.y)
            && axis(p.z, self.min.z, self.max.z)
    }

    /// Wrap each axis modulo its extent relative to the min corner.
    pub fn wrap(&self, p: Vec3) -> Vec3 {
        let axis = |v: f64, lo: f64, hi: f64| {
            let extent = hi - lo;
            if extent > 0.0 {
                // rem_euclid can round up to `extent` for tiny negative offsets.
                let w = lo + (v - lo).rem_euclid(extent);
                if w >= hi {
                    lo
                } else {
                    w
                }
            } else {
                lo
            }
        };
        Vec3::new(
            axis(p.x, self.min.x, self.max.x),
            axis(p.y, self.min.y, self.max.y),
            axis(p.z, self.min.z, self.max.z),
        )
    }
}

/// Spatial index keyed by `K`, usually an ECS entity handle.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialIndex<K: Copy + Eq + Hash> {
    bounds: Option<Bounds>,
    toroidal: bool,
    positions: Vec<Vec3>,
    keys: Vec<K>,
    rows: HashMap<K, usize>,
}

impl<K: Copy + Eq + Hash> SpatialIndex<K> {
    pub fn new(bounds: Bounds, toroidal: bool) -> Self {
        Self {
            bounds: Some(bounds),
            toroidal,
            positions: Vec::new(),
            keys: Vec::new(),
            rows: HashMap::new(),
        }
    }

    /// Index without bounds: placement never fails and never wraps.
    pub fn unbounded() -> Self {
        Self {
            bounds: None,
            toroidal: false,
            positions: Vec::new(),
            keys: Vec::new(),
            rows: HashMap::new(),
        }
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    pub fn is_toroidal(&self) -> bool {
        self.toroidal
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: K) -> bool {
        self.rows.contains_key(&key)
    }

    pub fn position(&self, key: K) -> Option<Vec3> {
        self.rows.get(&key).map(|&row| self.positions[row])
    }

    /// Row currently holding `key`.
    pub fn row(&self, key: K) -> Option<usize> {
        self.rows.get(&key).copied()
    }

    /// Key stored at `row`.
    pub fn key_at(&self, row: usize) -> Option<K> {
        self.keys.get(row).copied()
    }

    /// Entries in row order.
    pub fn iter(&self) -> impl Iterator<Item = (K, Vec3)> + '_ {
        self.keys.iter().copied().zip(self.positions.iter().copied())
    }

    /// True if `p` lies outside the bounds. Always false when unbounded.
    pub fn out_of_bounds(&self, p: Vec3) -> bool {
        match self.bounds {
            Some(bounds) => !bounds.contains(p),
            None => false,
        }
    }

    /// Wrap `p` into the bounds. Identity when unbounded.
    pub fn wrap(&self, p: Vec3) -> Vec3 {
        match self.bounds {
            Some(bounds) => bounds.wrap(p),
            None => p,
        }
    }

    /// Wrap if toroidal, reject if bounded, accept otherwise.
    fn admit(&self, p: Vec3) -> SimResult<Vec3> {
        if !self.out_of_bounds(p) {
            return Ok(p);
        }
        if self.toroidal {
            Ok(self.wrap(p))
        } else {
            Err(SimError::OutOfBounds(p))
        }
    }

    /// Insert `key` at `p`. Returns the stored (possibly wrapped) position.
    pub fn place(&mut self, key: K, p: Vec3) -> SimResult<Vec3> {
        if self.rows.contains_key(&key) {
            return Err(SimError::AlreadyPlaced);
        }
        let p = self.admit(p)?;
        self.rows.insert(key, self.keys.len());
        self.keys.push(key);
        self.positions.push(p);
        Ok(p)
    }

    /// Move an existing `key` to `p`. Returns the stored position.
    pub fn move_to(&mut self, key: K, p: Vec3) -> SimResult<Vec3> {
        let row = *self.rows.get(&key).ok_or(SimError::NotPlaced)?;
        let p = self.admit(p)?;
        self.positions[row] = p;
        Ok(p)
    }

    /// Remove `key`, returning its last position.
    pub fn remove(&mut self, key: K) -> SimResult<Vec3> {
        let row = self.rows.remove(&key).ok_or(SimError::NotPlaced)?;
        self.keys.remove(row);
        let p = self.positions.remove(row);
        for (shifted, k) in self.keys.iter().enumerate().skip(row) {
            self.rows.insert(*k, shifted);
        }
        Ok(p)
    }

    /// Per-axis absolute delta, wrapped to the short way round when toroidal.
    fn axis_delta(&self, a: f64, b: f64, extent: f64) -> f64 {
        let d = (a - b).abs();
        if self.toroidal {
            d.min(extent - d)
        } else {
            d
        }
    }

    fn deltas(&self, a: Vec3, b: Vec3) -> Vec3 {
        let extent = self.bounds.map(|b| b.extent()).unwrap_or(Vec3::ZERO);
        Vec3::new(
            self.axis_delta(a.x, b.x, extent.x),
            self.axis_delta(a.y, b.y, extent.y),
            self.axis_delta(a.z, b.z, extent.z),
        )
    }

    /// Keys within `radius` of `p` in the horizontal plane, in row order.
    ///
    /// With `include_center = false`, rows exactly at `p` are left out.
    pub fn neighbors(&self, p: Vec3, radius: f64, include_center: bool) -> Vec<K> {
        self.scan(p, radius, include_center, |d| d.x * d.x + d.y * d.y)
    }

    /// As [`neighbors`](Self::neighbors) but with vertical distance counted.
    pub fn neighbors_3d(&self, p: Vec3, radius: f64, include_center: bool) -> Vec<K> {
        self.scan(p, radius, include_center, |d| d.length_squared())
    }

    fn scan(
        &self,
        p: Vec3,
        radius: f64,
        include_center: bool,
        metric: impl Fn(Vec3) -> f64,
    ) -> Vec<K> {
        let r2 = radius * radius;
        self.positions
            .iter()
            .zip(&self.keys)
            .filter_map(|(q, k)| {
                let d2 = metric(self.deltas(p, *q));
                let hit = d2 <= r2 && (include_center || d2 > 0.0);
                hit.then_some(*k)
            })
            .collect()
    }

    /// Shortest displacement from `a` to `b`, across the seam when toroidal.
    pub fn heading(&self, a: Vec3, b: Vec3) -> Vec3 {
        let mut h = b - a;
        if let (true, Some(bounds)) = (self.toroidal, self.bounds) {
            let e = bounds.extent();
            let fold = |d: f64, extent: f64| {
                if extent > 0.0 && d.abs() > extent / 2.0 {
                    d - extent * d.signum()
                } else {
                    d
                }
            };
            h = Vec3::new(fold(h.x, e.x), fold(h.y, e.y), fold(h.z, e.z));
        }
        h
    }

    /// Euclidean distance, torus-aware.
    pub fn distance(&self, a: Vec3, b: Vec3) -> f64 {
        self.deltas(a, b).length()
    }
}
