//! Juggler body placement over the loop
//!
//! Each juggler gets a position curve and a facing-angle curve derived
//! from the pattern's position waypoints. Patterns with no waypoints get
//! the default standing arrangement.

use cascade_core::{Coord, LayoutError, Pattern, Result};

use crate::curve::{unwrap_angles, AngleCurve, PositionCurve, SplineCurve};
use crate::spline::Spline1;

/// Radius of the default circle for two or more jugglers, cm
const CIRCLE_RADIUS: f64 = 100.0;

/// A juggler's body motion: where they stand and which way they face
#[derive(Debug, Clone)]
pub struct BodyCurves {
    pub position: PositionCurve,
    pub angle: AngleCurve,
}

impl BodyCurves {
    /// Local hand-frame coordinates to global coordinates at time `t`
    pub fn globalize(&self, local: Coord, t: f64) -> Coord {
        self.position.position(t) + local.rotate_z(self.angle.angle(t))
    }
}

/// Default standing spot for juggler `j` (1-based) out of `count`
///
/// A single juggler stands at the origin facing +y. Several jugglers stand
/// evenly on a circle facing its center.
pub fn default_station(j: usize, count: usize) -> (Coord, f64) {
    if count <= 1 {
        return (Coord::ZERO, 0.0);
    }
    let phi = 360.0 * (j - 1) as f64 / count as f64;
    let rad = phi.to_radians();
    let pos = Coord::new(CIRCLE_RADIUS * rad.sin(), -CIRCLE_RADIUS * rad.cos(), 0.0);
    let mut angle = phi;
    if angle > 180.0 {
        angle -= 360.0;
    }
    (pos, angle)
}

/// Build body curves for every juggler from the pattern's waypoints
pub fn layout_bodies(pattern: &Pattern) -> Result<Vec<BodyCurves>> {
    let delay = pattern.delay();
    let mut bodies = Vec::with_capacity(pattern.jugglers);
    for j in 1..=pattern.jugglers {
        let mut points: Vec<_> = pattern
            .positions
            .iter()
            .filter(|p| p.juggler == j)
            .collect();
        points.sort_by(|a, b| a.time.total_cmp(&b.time));

        let body = match points.len() {
            0 => {
                let (pos, angle) = default_station(j, pattern.jugglers);
                BodyCurves {
                    position: PositionCurve::Constant(pos),
                    angle: AngleCurve::Constant(angle),
                }
            }
            1 => BodyCurves {
                position: PositionCurve::Constant(points[0].coord),
                angle: AngleCurve::Constant(points[0].angle),
            },
            _ => {
                let t0 = points[0].time;
                let t_last = points[points.len() - 1].time;
                if t_last - t0 >= delay {
                    return Err(LayoutError::bad_pattern(format!(
                        "juggler {} has position waypoints spanning a full loop",
                        j
                    )));
                }
                let mut times: Vec<f64> = points.iter().map(|p| p.time).collect();
                times.push(t0 + delay);
                let mut coords: Vec<Coord> = points.iter().map(|p| p.coord).collect();
                coords.push(coords[0]);
                let position = PositionCurve::Periodic(SplineCurve::fit_periodic(&times, &coords)?);

                let mut angles: Vec<f64> = points.iter().map(|p| p.angle).collect();
                angles.push(angles[0]);
                unwrap_angles(&mut angles);
                let winding = angles[angles.len() - 1] - angles[0];
                let spline = if winding.abs() < 1e-9 {
                    Spline1::fit_periodic(&times, &angles)?
                } else {
                    // net winding per loop: steady end slopes keep the
                    // spin continuous across the seam
                    let slope = winding / delay;
                    Spline1::fit_clamped(&times, &angles, slope, slope)?
                };
                BodyCurves {
                    position,
                    angle: AngleCurve::Spline {
                        spline,
                        start: t0,
                        period: delay,
                        winding,
                    },
                }
            }
        };
        bodies.push(body);
    }
    Ok(bodies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cascade_core::Pattern;

    use crate::test_patterns;

    #[test]
    fn test_single_juggler_defaults_to_origin() {
        let (pos, angle) = default_station(1, 1);
        assert!(pos.approx_eq(Coord::ZERO, 1e-9));
        assert_eq!(angle, 0.0);
    }

    #[test]
    fn test_two_jugglers_face_each_other() {
        let (p1, a1) = default_station(1, 2);
        let (p2, a2) = default_station(2, 2);
        assert!((p1.distance(p2) - 200.0).abs() < 1e-9);
        assert_eq!(a1, 0.0);
        assert_eq!(a2, 180.0);
    }

    #[test]
    fn test_globalize_rotates_and_translates() {
        let body = BodyCurves {
            position: PositionCurve::Constant(Coord::new(0.0, -100.0, 0.0)),
            angle: AngleCurve::Constant(180.0),
        };
        let g = body.globalize(Coord::new(30.0, 5.0, 100.0), 0.0);
        assert!((g.x + 30.0).abs() < 1e-9);
        assert!((g.y + 105.0).abs() < 1e-9);
        assert!((g.z - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_waypoint_bodies_wrap() {
        let mut def = test_patterns::cascade_def();
        def.positions = vec![
            cascade_core::PositionDef {
                time: 0.0,
                juggler: 1,
                x: 0.0,
                y: 0.0,
                z: 0.0,
                angle: 0.0,
            },
            cascade_core::PositionDef {
                time: 0.45,
                juggler: 1,
                x: 50.0,
                y: 0.0,
                z: 0.0,
                angle: 90.0,
            },
        ];
        let pattern = Pattern::from_def(def).unwrap();
        let bodies = layout_bodies(&pattern).unwrap();
        let b = &bodies[0];
        assert!(b
            .position
            .position(0.0)
            .approx_eq(b.position.position(0.9), 1e-6));
        assert!((b.angle.angle(0.0) - b.angle.angle(0.9)).abs() < 1e-6);
        assert!((b.position.position(0.45).x - 50.0).abs() < 1e-6);
    }
}
