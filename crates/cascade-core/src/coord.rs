use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// A 3-D coordinate or velocity vector
///
/// Units are centimeters (or cm/s for velocities); +z points up and, in a
/// juggler's local frame, +x points to the juggler's right and +y forward.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coord {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Coord {
    pub const ZERO: Coord = Coord {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Create a new coordinate
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Coord { x, y, z }
    }

    /// Euclidean length of the vector
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Distance to another coordinate
    pub fn distance(self, other: Coord) -> f64 {
        (self - other).length()
    }

    /// Component-wise minimum
    pub fn min(self, other: Coord) -> Coord {
        Coord::new(
            self.x.min(other.x),
            self.y.min(other.y),
            self.z.min(other.z),
        )
    }

    /// Component-wise maximum
    pub fn max(self, other: Coord) -> Coord {
        Coord::new(
            self.x.max(other.x),
            self.y.max(other.y),
            self.z.max(other.z),
        )
    }

    /// Mirror across the y-z plane (left/right hand flip)
    pub fn flip_x(&self) -> Coord {
        Coord::new(-self.x, self.y, self.z)
    }

    /// Rotate about the z axis by `degrees` (counterclockwise seen from +z)
    pub fn rotate_z(&self, degrees: f64) -> Coord {
        let r = degrees.to_radians();
        let (s, c) = r.sin_cos();
        Coord::new(self.x * c - self.y * s, self.x * s + self.y * c, self.z)
    }

    /// Approximate equality within `tol` on every component
    pub fn approx_eq(self, other: Coord, tol: f64) -> bool {
        (self.x - other.x).abs() <= tol
            && (self.y - other.y).abs() <= tol
            && (self.z - other.z).abs() <= tol
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

impl Add for Coord {
    type Output = Coord;

    fn add(self, other: Coord) -> Coord {
        Coord::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl AddAssign for Coord {
    fn add_assign(&mut self, other: Coord) {
        self.x += other.x;
        self.y += other.y;
        self.z += other.z;
    }
}

impl Sub for Coord {
    type Output = Coord;

    fn sub(self, other: Coord) -> Coord {
        Coord::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f64> for Coord {
    type Output = Coord;

    fn mul(self, s: f64) -> Coord {
        Coord::new(self.x * s, self.y * s, self.z * s)
    }
}

impl Neg for Coord {
    type Output = Coord;

    fn neg(self) -> Coord {
        Coord::new(-self.x, -self.y, -self.z)
    }
}

impl From<(f64, f64, f64)> for Coord {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Coord::new(x, y, z)
    }
}
