//! Three-axis spatial curves and juggler facing-angle curves, built on
//! [`Spline1`]

use cascade_core::{Coord, Result};

use crate::spline::Spline1;

/// A spatial curve fitted independently per axis
#[derive(Debug, Clone)]
pub struct SplineCurve {
    x: Spline1,
    y: Spline1,
    z: Spline1,
}

impl SplineCurve {
    /// Clamped fit: knot positions with imposed endpoint velocities
    pub fn fit_clamped(
        times: &[f64],
        points: &[Coord],
        v_start: Coord,
        v_end: Coord,
    ) -> Result<SplineCurve> {
        let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
        let ys: Vec<f64> = points.iter().map(|p| p.y).collect();
        let zs: Vec<f64> = points.iter().map(|p| p.z).collect();
        Ok(SplineCurve {
            x: Spline1::fit_clamped(times, &xs, v_start.x, v_end.x)?,
            y: Spline1::fit_clamped(times, &ys, v_start.y, v_end.y)?,
            z: Spline1::fit_clamped(times, &zs, v_start.z, v_end.z)?,
        })
    }

    /// Periodic fit: the last knot must repeat the first, evaluation wraps
    pub fn fit_periodic(times: &[f64], points: &[Coord]) -> Result<SplineCurve> {
        let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
        let ys: Vec<f64> = points.iter().map(|p| p.y).collect();
        let zs: Vec<f64> = points.iter().map(|p| p.z).collect();
        Ok(SplineCurve {
            x: Spline1::fit_periodic(times, &xs)?,
            y: Spline1::fit_periodic(times, &ys)?,
            z: Spline1::fit_periodic(times, &zs)?,
        })
    }

    pub fn start_time(&self) -> f64 {
        self.x.start_time()
    }

    pub fn end_time(&self) -> f64 {
        self.x.end_time()
    }

    pub fn position(&self, t: f64) -> Coord {
        Coord::new(self.x.eval(t), self.y.eval(t), self.z.eval(t))
    }

    pub fn velocity(&self, t: f64) -> Coord {
        Coord::new(self.x.velocity(t), self.y.velocity(t), self.z.velocity(t))
    }

    /// Axis-aligned bounding corners over `[from, to]`
    pub fn extrema_on(&self, from: f64, to: f64) -> (Coord, Coord) {
        let (x0, x1) = self.x.extrema_on(from, to);
        let (y0, y1) = self.y.extrema_on(from, to);
        let (z0, z1) = self.z.extrema_on(from, to);
        (Coord::new(x0, y0, z0), Coord::new(x1, y1, z1))
    }
}

/// A juggler's body position over one loop
#[derive(Debug, Clone)]
pub enum PositionCurve {
    Constant(Coord),
    Periodic(SplineCurve),
}

impl PositionCurve {
    pub fn position(&self, t: f64) -> Coord {
        match self {
            PositionCurve::Constant(c) => *c,
            PositionCurve::Periodic(curve) => curve.position(t),
        }
    }

    pub fn extrema(&self) -> (Coord, Coord) {
        match self {
            PositionCurve::Constant(c) => (*c, *c),
            PositionCurve::Periodic(curve) => {
                curve.extrema_on(curve.start_time(), curve.end_time())
            }
        }
    }
}

/// A juggler's facing angle in degrees over one loop
///
/// With net winding (the juggler ends a loop rotated by a nonzero multiple
/// of 360°) the underlying spline is clamped and the winding is added per
/// elapsed loop.
#[derive(Debug, Clone)]
pub enum AngleCurve {
    Constant(f64),
    Spline {
        spline: Spline1,
        start: f64,
        period: f64,
        winding: f64,
    },
}

impl AngleCurve {
    pub fn angle(&self, t: f64) -> f64 {
        match self {
            AngleCurve::Constant(a) => *a,
            AngleCurve::Spline {
                spline,
                start,
                period,
                winding,
            } => {
                let loops = ((t - start) / period).floor();
                spline.eval(start + (t - start).rem_euclid(*period)) + loops * winding
            }
        }
    }
}

/// Adjust each successive angle by multiples of 360° so consecutive values
/// differ by at most 180°
pub fn unwrap_angles(angles: &mut [f64]) {
    for i in 1..angles.len() {
        let mut a = angles[i];
        while a - angles[i - 1] > 180.0 {
            a -= 360.0;
        }
        while a - angles[i - 1] < -180.0 {
            a += 360.0;
        }
        angles[i] = a;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwrap_angles() {
        let mut a = [0.0, 350.0, 10.0, 170.0];
        unwrap_angles(&mut a);
        assert_eq!(a, [0.0, -10.0, 10.0, 170.0]);

        let mut b = [90.0, -269.0];
        unwrap_angles(&mut b);
        assert_eq!(b, [90.0, 91.0]);
    }

    #[test]
    fn test_curve_position_and_velocity() {
        let times = [0.0, 1.0];
        let points = [Coord::new(0.0, 0.0, 100.0), Coord::new(40.0, 0.0, 100.0)];
        let curve = SplineCurve::fit_clamped(
            &times,
            &points,
            Coord::new(40.0, 0.0, 0.0),
            Coord::new(40.0, 0.0, 0.0),
        )
        .unwrap();
        // uniform velocity fits a straight line
        let mid = curve.position(0.5);
        assert!((mid.x - 20.0).abs() < 1e-9);
        assert!((mid.z - 100.0).abs() < 1e-9);
        assert!((curve.velocity(0.25).x - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_angle_curve_winding() {
        let spline = Spline1::fit_clamped(&[0.0, 2.0], &[0.0, 360.0], 180.0, 180.0).unwrap();
        let angle = AngleCurve::Spline {
            spline,
            start: 0.0,
            period: 2.0,
            winding: 360.0,
        };
        assert!((angle.angle(0.0) - 0.0).abs() < 1e-9);
        assert!((angle.angle(2.0) - 360.0).abs() < 1e-9);
        assert!((angle.angle(5.0) - 900.0).abs() < 1e-9);
    }
}
