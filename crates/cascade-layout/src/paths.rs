//! Ballistic flight paths between a throw and its catch
//!
//! A toss is a plain gravity parabola fixed by its endpoints and duration.
//! Bounce flights live in [`crate::bounce`]. Both expose the same query
//! surface through [`FlightPath`].

use cascade_core::{Coord, LayoutError, Result};

use crate::bounce::{BounceOptions, BouncePath};

/// Gravitational acceleration, cm/s²
pub const GRAVITY: f64 = 980.0;

/// A prop in the air between two events
#[derive(Debug, Clone)]
pub enum FlightPath {
    Toss(TossPath),
    Bounce(BouncePath),
}

impl FlightPath {
    /// Build the flight for a throw transition
    pub fn solve(
        throw_type: &str,
        modifier: Option<&str>,
        path: usize,
        start: Coord,
        t0: f64,
        end: Coord,
        t1: f64,
        elasticity: f64,
    ) -> Result<FlightPath> {
        match throw_type {
            "toss" => Ok(FlightPath::Toss(TossPath::new(start, t0, end, t1)?)),
            "bounce" => {
                let opts = BounceOptions::from_modifier(modifier, elasticity)?;
                Ok(FlightPath::Bounce(BouncePath::solve(
                    start, t0, end, t1, &opts,
                )?))
            }
            other => Err(LayoutError::BadThrowType {
                throw_type: other.to_string(),
                path,
                time: t0,
            }),
        }
    }

    pub fn start_time(&self) -> f64 {
        match self {
            FlightPath::Toss(p) => p.t0,
            FlightPath::Bounce(p) => p.start_time(),
        }
    }

    pub fn end_time(&self) -> f64 {
        match self {
            FlightPath::Toss(p) => p.t1,
            FlightPath::Bounce(p) => p.end_time(),
        }
    }

    pub fn coord(&self, t: f64) -> Coord {
        match self {
            FlightPath::Toss(p) => p.coord(t),
            FlightPath::Bounce(p) => p.coord(t),
        }
    }

    /// Prop velocity leaving the thrower's hand
    pub fn start_velocity(&self) -> Coord {
        match self {
            FlightPath::Toss(p) => p.velocity(p.t0),
            FlightPath::Bounce(p) => p.start_velocity(),
        }
    }

    /// Prop velocity arriving at the catcher's hand
    pub fn end_velocity(&self) -> Coord {
        match self {
            FlightPath::Toss(p) => p.velocity(p.t1),
            FlightPath::Bounce(p) => p.end_velocity(),
        }
    }

    /// Times within the flight when the prop strikes the bounce plane
    pub fn impact_times(&self) -> &[f64] {
        match self {
            FlightPath::Toss(_) => &[],
            FlightPath::Bounce(p) => p.impact_times(),
        }
    }

    /// Axis-aligned bounding corners over `[from, to]` clipped to the
    /// flight interval
    pub fn extrema_on(&self, from: f64, to: f64) -> (Coord, Coord) {
        match self {
            FlightPath::Toss(p) => p.extrema_on(from, to),
            FlightPath::Bounce(p) => p.extrema_on(from, to),
        }
    }
}

/// A single gravity parabola
#[derive(Debug, Clone)]
pub struct TossPath {
    start: Coord,
    end: Coord,
    t0: f64,
    t1: f64,
    /// vertical launch velocity, cm/s
    vz0: f64,
}

impl TossPath {
    pub fn new(start: Coord, t0: f64, end: Coord, t1: f64) -> Result<TossPath> {
        let dur = t1 - t0;
        if dur <= 0.0 {
            return Err(LayoutError::internal(format!(
                "toss with nonpositive duration {:.4}",
                dur
            )));
        }
        let vz0 = (end.z - start.z) / dur + GRAVITY * dur / 2.0;
        Ok(TossPath {
            start,
            end,
            t0,
            t1,
            vz0,
        })
    }

    pub fn coord(&self, t: f64) -> Coord {
        let s = (t - self.t0).clamp(0.0, self.t1 - self.t0);
        let frac = s / (self.t1 - self.t0);
        Coord::new(
            self.start.x + (self.end.x - self.start.x) * frac,
            self.start.y + (self.end.y - self.start.y) * frac,
            self.start.z + self.vz0 * s - GRAVITY * s * s / 2.0,
        )
    }

    pub fn velocity(&self, t: f64) -> Coord {
        let s = (t - self.t0).clamp(0.0, self.t1 - self.t0);
        let dur = self.t1 - self.t0;
        Coord::new(
            (self.end.x - self.start.x) / dur,
            (self.end.y - self.start.y) / dur,
            self.vz0 - GRAVITY * s,
        )
    }

    pub fn extrema_on(&self, from: f64, to: f64) -> (Coord, Coord) {
        let a = from.clamp(self.t0, self.t1);
        let b = to.clamp(self.t0, self.t1);
        let pa = self.coord(a);
        let pb = self.coord(b);
        let mut lo = pa.min(pb);
        let mut hi = pa.max(pb);
        // apex of the z parabola
        let apex = self.t0 + self.vz0 / GRAVITY;
        if apex > a && apex < b {
            let p = self.coord(apex);
            lo = lo.min(p);
            hi = hi.max(p);
        }
        (lo, hi)
    }
}
