//! One-dimensional piecewise-cubic spline fitting
//!
//! Hand and body curves are built from Hermite segments whose knot
//! velocities are either imposed (clamped fit, boundary velocities known
//! from throw/soft-catch physics) or solved for C² continuity (interior
//! knots, and every knot of a periodic closed-loop fit).

use cascade_core::{LayoutError, Result};

/// A fitted 1-D cubic spline over strictly increasing knot times
#[derive(Debug, Clone)]
pub struct Spline1 {
    times: Vec<f64>,
    /// per segment: value = a + b s + c s² + d s³ with s local to the segment
    coefs: Vec<[f64; 4]>,
    periodic: bool,
}

fn check_times(times: &[f64]) -> Result<()> {
    if times.len() < 2 {
        return Err(LayoutError::internal("spline fit needs at least two knots"));
    }
    for pair in times.windows(2) {
        if !(pair[1] > pair[0]) {
            return Err(LayoutError::internal(format!(
                "spline knot times must increase: {} then {}",
                pair[0], pair[1]
            )));
        }
    }
    Ok(())
}

/// Hermite segment coefficients from endpoint values and slopes
fn hermite(h: f64, y0: f64, y1: f64, m0: f64, m1: f64) -> [f64; 4] {
    let d = (y1 - y0) / h;
    [
        y0,
        m0,
        (3.0 * d - 2.0 * m0 - m1) / h,
        (m0 + m1 - 2.0 * d) / (h * h),
    ]
}

/// Solve a tridiagonal system in place (Thomas algorithm)
fn solve_tridiagonal(sub: &mut [f64], diag: &mut [f64], sup: &mut [f64], rhs: &mut [f64]) {
    let n = diag.len();
    for i in 1..n {
        let w = sub[i] / diag[i - 1];
        diag[i] -= w * sup[i - 1];
        rhs[i] -= w * rhs[i - 1];
    }
    rhs[n - 1] /= diag[n - 1];
    for i in (0..n - 1).rev() {
        rhs[i] = (rhs[i] - sup[i] * rhs[i + 1]) / diag[i];
    }
}

/// Solve a small dense system by Gaussian elimination with partial pivoting
fn solve_dense(a: &mut [Vec<f64>], b: &mut [f64]) -> Result<()> {
    let n = b.len();
    for col in 0..n {
        let mut pivot = col;
        for row in col + 1..n {
            if a[row][col].abs() > a[pivot][col].abs() {
                pivot = row;
            }
        }
        if a[pivot][col].abs() < 1e-12 {
            return Err(LayoutError::internal("singular spline system"));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..n {
            let w = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= w * a[col][k];
            }
            b[row] -= w * b[col];
        }
    }
    for row in (0..n).rev() {
        for k in row + 1..n {
            b[row] -= a[row][k] * b[k];
        }
        b[row] /= a[row][row];
    }
    Ok(())
}

impl Spline1 {
    /// Fit with both endpoint velocities imposed; interior knot velocities
    /// are solved for C² continuity
    pub fn fit_clamped(times: &[f64], values: &[f64], v_start: f64, v_end: f64) -> Result<Spline1> {
        check_times(times)?;
        if values.len() != times.len() {
            return Err(LayoutError::internal("spline knot count mismatch"));
        }
        let n = times.len() - 1;
        let h: Vec<f64> = times.windows(2).map(|w| w[1] - w[0]).collect();
        let d: Vec<f64> = (0..n).map(|i| (values[i + 1] - values[i]) / h[i]).collect();

        let mut m = vec![0.0; n + 1];
        m[0] = v_start;
        m[n] = v_end;

        if n > 1 {
            // C² at interior knots: tridiagonal in the unknown slopes
            let k = n - 1;
            let mut sub = vec![0.0; k];
            let mut diag = vec![0.0; k];
            let mut sup = vec![0.0; k];
            let mut rhs = vec![0.0; k];
            for i in 1..n {
                let row = i - 1;
                sub[row] = 1.0 / h[i - 1];
                diag[row] = 2.0 * (1.0 / h[i - 1] + 1.0 / h[i]);
                sup[row] = 1.0 / h[i];
                rhs[row] = 3.0 * (d[i - 1] / (h[i - 1]) + d[i] / (h[i]));
            }
            rhs[0] -= m[0] / h[0];
            rhs[k - 1] -= m[n] / h[n - 1];
            solve_tridiagonal(&mut sub, &mut diag, &mut sup, &mut rhs);
            m[1..n].copy_from_slice(&rhs);
        }

        let coefs = (0..n)
            .map(|i| hermite(h[i], values[i], values[i + 1], m[i], m[i + 1]))
            .collect();
        Ok(Spline1 {
            times: times.to_vec(),
            coefs,
            periodic: false,
        })
    }

    /// Fit a closed loop: the last knot value must equal the first, every
    /// knot velocity is solved internally, and evaluation wraps
    pub fn fit_periodic(times: &[f64], values: &[f64]) -> Result<Spline1> {
        check_times(times)?;
        if values.len() != times.len() {
            return Err(LayoutError::internal("spline knot count mismatch"));
        }
        let n = times.len() - 1;
        let h: Vec<f64> = times.windows(2).map(|w| w[1] - w[0]).collect();
        let d: Vec<f64> = (0..n).map(|i| (values[i + 1] - values[i]) / h[i]).collect();

        // cyclic C² system in the n unknown slopes (slope n == slope 0)
        let mut a = vec![vec![0.0; n]; n];
        let mut rhs = vec![0.0; n];
        for i in 0..n {
            let prev = (i + n - 1) % n;
            let next = (i + 1) % n;
            a[i][prev] += 1.0 / h[prev];
            a[i][i] += 2.0 * (1.0 / h[prev] + 1.0 / h[i]);
            a[i][next] += 1.0 / h[i];
            rhs[i] = 3.0 * (d[prev] / h[prev] + d[i] / h[i]);
        }
        solve_dense(&mut a, &mut rhs)?;

        let m = |i: usize| rhs[i % n];
        let coefs = (0..n)
            .map(|i| hermite(h[i], values[i], values[i + 1], m(i), m(i + 1)))
            .collect();
        Ok(Spline1 {
            times: times.to_vec(),
            coefs,
            periodic: true,
        })
    }

    pub fn start_time(&self) -> f64 {
        self.times[0]
    }

    pub fn end_time(&self) -> f64 {
        self.times[self.times.len() - 1]
    }

    pub fn duration(&self) -> f64 {
        self.end_time() - self.start_time()
    }

    /// Map a query time into the knot range: wrap when periodic, clamp
    /// otherwise
    fn domain_time(&self, t: f64) -> f64 {
        if self.periodic {
            self.start_time() + (t - self.start_time()).rem_euclid(self.duration())
        } else {
            t.clamp(self.start_time(), self.end_time())
        }
    }

    fn segment(&self, t: f64) -> (usize, f64) {
        let i = self
            .times
            .partition_point(|&kt| kt <= t)
            .saturating_sub(1)
            .min(self.coefs.len() - 1);
        (i, t - self.times[i])
    }

    pub fn eval(&self, t: f64) -> f64 {
        let (i, s) = self.segment(self.domain_time(t));
        let [a, b, c, d] = self.coefs[i];
        a + s * (b + s * (c + s * d))
    }

    pub fn velocity(&self, t: f64) -> f64 {
        let (i, s) = self.segment(self.domain_time(t));
        let [_, b, c, d] = self.coefs[i];
        b + s * (2.0 * c + s * 3.0 * d)
    }

    /// Min and max value over `[from, to]`, by checking segment endpoints
    /// and interior stationary points
    pub fn extrema_on(&self, from: f64, to: f64) -> (f64, f64) {
        let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
        let mut consider = |v: f64| {
            lo = lo.min(v);
            hi = hi.max(v);
        };

        // when periodic and the window spans a full loop, scan everything
        let (from, to) = if self.periodic && to - from >= self.duration() {
            (self.start_time(), self.end_time())
        } else {
            (self.domain_time(from), self.domain_time(from) + (to - from).max(0.0))
        };

        consider(self.eval(from));
        consider(self.eval(to));
        for (i, &[_, b, c, d]) in self.coefs.iter().enumerate() {
            let t0 = self.times[i];
            let t1 = self.times[i + 1];
            let in_window = |t: f64| {
                (t >= from && t <= to)
                    || (self.periodic && t + self.duration() >= from && t + self.duration() <= to)
            };
            if in_window(t1) || in_window(t0) || (t0 <= from && t1 >= to) {
                consider(self.eval(t0));
                consider(self.eval(t1));
                // stationary points of b + 2c s + 3d s²
                if d.abs() > 1e-12 {
                    let disc = c * c - 3.0 * d * b;
                    if disc >= 0.0 {
                        for sign in [-1.0, 1.0] {
                            let s = (-c + sign * disc.sqrt()) / (3.0 * d);
                            if s > 0.0 && s < t1 - t0 {
                                let t = t0 + s;
                                if in_window(t) || (t0 <= from && t1 >= to) {
                                    consider(self.eval(t));
                                }
                            }
                        }
                    }
                } else if c.abs() > 1e-12 {
                    let s = -b / (2.0 * c);
                    if s > 0.0 && s < t1 - t0 {
                        let t = t0 + s;
                        if in_window(t) || (t0 <= from && t1 >= to) {
                            consider(self.eval(t));
                        }
                    }
                }
            }
        }
        (lo, hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_clamped_interpolates_knots() {
        let times = [0.0, 1.0, 2.5, 4.0];
        let values = [0.0, 2.0, -1.0, 0.5];
        let s = Spline1::fit_clamped(&times, &values, 1.0, -0.5).unwrap();
        for (t, v) in times.iter().zip(values.iter()) {
            assert!((s.eval(*t) - v).abs() < 1e-9, "knot at t={}", t);
        }
        assert!((s.velocity(0.0) - 1.0).abs() < 1e-9);
        assert!((s.velocity(4.0) + 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_clamped_is_c2() {
        let times = [0.0, 1.0, 2.0, 3.0];
        let values = [0.0, 1.0, -1.0, 2.0];
        let s = Spline1::fit_clamped(&times, &values, 0.0, 0.0).unwrap();
        // acceleration continuous at interior knots
        for &t in &[1.0, 2.0] {
            let eps = 1e-6;
            let a_left = (s.velocity(t) - s.velocity(t - eps)) / eps;
            let a_right = (s.velocity(t + eps) - s.velocity(t)) / eps;
            assert!((a_left - a_right).abs() < 1e-3, "kink at t={}", t);
        }
    }

    #[test]
    fn test_periodic_closes_the_loop() {
        let times = [0.0, 0.4, 1.1, 2.0];
        let values = [1.0, 3.0, -2.0, 1.0];
        let s = Spline1::fit_periodic(&times, &values).unwrap();
        assert!((s.eval(0.0) - s.eval(2.0)).abs() < 1e-9);
        assert!((s.velocity(0.0) - s.velocity(2.0)).abs() < 1e-9);
        // wraps outside the domain
        assert!((s.eval(2.4) - s.eval(0.4)).abs() < 1e-9);
        assert!((s.eval(-0.9) - s.eval(1.1)).abs() < 1e-9);
    }

    #[test]
    fn test_single_segment_periodic_is_constant() {
        let s = Spline1::fit_periodic(&[0.0, 1.0], &[5.0, 5.0]).unwrap();
        for t in [0.0, 0.3, 0.99, 7.2] {
            assert!((s.eval(t) - 5.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_extrema() {
        // clamped single segment rising then falling: peak inside
        let s = Spline1::fit_clamped(&[0.0, 1.0], &[0.0, 0.0], 1.0, -1.0).unwrap();
        let (lo, hi) = s.extrema_on(0.0, 1.0);
        assert!((lo - 0.0).abs() < 1e-9);
        assert!(hi > 0.0);
    }

    proptest! {
        #[test]
        fn prop_clamped_hits_every_knot(
            values in proptest::collection::vec(-50.0f64..50.0, 3..7),
            v0 in -10.0f64..10.0,
            v1 in -10.0f64..10.0,
        ) {
            let times: Vec<f64> = (0..values.len()).map(|i| i as f64 * 0.7).collect();
            let s = Spline1::fit_clamped(&times, &values, v0, v1).unwrap();
            for (t, v) in times.iter().zip(values.iter()) {
                prop_assert!((s.eval(*t) - v).abs() < 1e-6);
            }
        }

        #[test]
        fn prop_periodic_hits_every_knot(
            mut values in proptest::collection::vec(-50.0f64..50.0, 3..7),
        ) {
            let last = values.len() - 1;
            values[last] = values[0];
            let times: Vec<f64> = (0..values.len()).map(|i| i as f64 * 0.5).collect();
            let s = Spline1::fit_periodic(&times, &values).unwrap();
            for (t, v) in times.iter().zip(values.iter()) {
                prop_assert!((s.eval(*t) - v).abs() < 1e-6);
            }
        }
    }
}
