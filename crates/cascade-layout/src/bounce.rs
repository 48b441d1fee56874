//! Closed-form bounce flight solver
//!
//! A bounce throw is a chain of gravity parabolas joined at floor impacts,
//! where each impact keeps a fixed fraction of the prop's kinetic energy.
//! Given the throw and catch positions and the flight duration, the launch
//! velocity comes from the real roots of a quartic (cubic for one bounce),
//! classified by whether the prop is thrown downward (`forced`) and caught
//! on the rise (`hyper`).

use cascade_core::{Coord, LayoutError, Result};

use crate::paths::GRAVITY;

/// How a bounce throw is performed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BounceOptions {
    /// Number of floor impacts
    pub bounces: usize,
    /// Prefer throwing downward
    pub forced: bool,
    /// Prefer catching while the prop is still rising
    pub hyper: bool,
    /// z of the bounce plane, cm
    pub plane: f64,
    /// Fraction of kinetic energy kept per impact
    pub retention: f64,
}

impl Default for BounceOptions {
    fn default() -> Self {
        BounceOptions {
            bounces: 1,
            forced: false,
            hyper: false,
            plane: 0.0,
            retention: 0.9,
        }
    }
}

impl BounceOptions {
    /// Parse a throw modifier string of `key=value` pairs separated by
    /// semicolons; bare keys mean `true`. Unknown keys are ignored.
    pub fn from_modifier(modifier: Option<&str>, elasticity: f64) -> Result<BounceOptions> {
        let mut opts = BounceOptions {
            retention: elasticity,
            ..BounceOptions::default()
        };
        let Some(text) = modifier else {
            return opts.validated();
        };
        for part in text.split(';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (key, value) = match part.split_once('=') {
                Some((k, v)) => (k.trim(), Some(v.trim())),
                None => (part, None),
            };
            match key {
                "bounces" => {
                    let v = value.unwrap_or("1");
                    opts.bounces = v.parse().map_err(|_| {
                        LayoutError::bad_pattern(format!("bad bounce count '{}'", v))
                    })?;
                }
                "forced" => opts.forced = parse_flag(value)?,
                "hyper" => opts.hyper = parse_flag(value)?,
                _ => {}
            }
        }
        opts.validated()
    }

    fn validated(self) -> Result<BounceOptions> {
        if self.bounces == 0 {
            return Err(LayoutError::bad_pattern("bounce throw with zero bounces"));
        }
        if !(self.retention > 0.0 && self.retention <= 1.0) {
            return Err(LayoutError::bad_pattern(format!(
                "bounce energy retention {} outside (0, 1]",
                self.retention
            )));
        }
        Ok(self)
    }
}

fn parse_flag(value: Option<&str>) -> Result<bool> {
    match value {
        None | Some("true") => Ok(true),
        Some("false") => Ok(false),
        Some(other) => Err(LayoutError::bad_pattern(format!(
            "bad bounce flag value '{}'",
            other
        ))),
    }
}

/// One parabolic arc of a bounce flight
#[derive(Debug, Clone, Copy)]
struct Arc {
    /// absolute start time
    start: f64,
    dur: f64,
    /// absolute z at the arc start
    z0: f64,
    /// upward velocity at the arc start, cm/s
    vz0: f64,
}

/// A solved bounce flight
#[derive(Debug, Clone)]
pub struct BouncePath {
    start: Coord,
    end: Coord,
    t0: f64,
    t1: f64,
    arcs: Vec<Arc>,
    impacts: Vec<f64>,
    hyper: bool,
    forced: bool,
}

struct Candidate {
    bounces: usize,
    v0: f64,
    catch_sign: f64,
    forced: bool,
    hyper: bool,
}

impl BouncePath {
    pub fn solve(
        start: Coord,
        t0: f64,
        end: Coord,
        t1: f64,
        opts: &BounceOptions,
    ) -> Result<BouncePath> {
        let dur = t1 - t0;
        if dur <= 0.0 {
            return Err(LayoutError::internal(format!(
                "bounce with nonpositive duration {:.4}",
                dur
            )));
        }
        let h1 = start.z - opts.plane;
        let h2 = end.z - opts.plane;
        if h1 < 0.0 || h2 < 0.0 {
            return Err(LayoutError::bad_pattern(format!(
                "bounce thrown or caught below the bounce plane z={}",
                opts.plane
            )));
        }

        let g = GRAVITY;
        let big_g = g * dur;
        let k = opts.retention.sqrt();

        let mut candidates: Vec<Candidate> = Vec::new();
        for n in (1..=opts.bounces).rev() {
            let k2n = k.powi(2 * n as i32);
            let kn = k.powi(n as i32);
            // total speed multiplier across the flight: up leg, n-1 full
            // rebounds, final rebound
            let a: f64 = 1.0 + 2.0 * (1..n).map(|i| k.powi(i as i32)).sum::<f64>() + kn;

            // L(v) = k^2n (v² + 2gh1) − 2gh2 − (G − v)² − A²(v² + 2gh1)
            let l2 = k2n - 1.0 - a * a;
            let l1 = 2.0 * big_g;
            let l0 = 2.0 * g * h1 * (k2n - a * a) - 2.0 * g * h2 - big_g * big_g;
            // R(v) = 4A² (G − v)² (v² + 2gh1)
            let r4 = 4.0 * a * a;
            let r3 = -8.0 * a * a * big_g;
            let r2 = 4.0 * a * a * (big_g * big_g + 2.0 * g * h1);
            let r1 = -16.0 * a * a * big_g * g * h1;
            let r0 = 8.0 * a * a * big_g * big_g * g * h1;
            // Q = L² − R; squaring folds both catch branches into one poly
            let mut q = vec![
                l0 * l0 - r0,
                2.0 * l1 * l0 - r1,
                2.0 * l2 * l0 + l1 * l1 - r2,
                2.0 * l2 * l1 - r3,
                l2 * l2 - r4,
            ];
            if n == 1 {
                // one bounce: l2 = −2A, so the quartic term cancels
                // algebraically; drop the roundoff residue
                q.truncate(4);
            }
            let roots = real_roots(&q);

            // validate each root against the unsquared timing equation,
            // preferred catch branch first
            let pref_sign = if opts.hyper { -1.0 } else { 1.0 };
            for catch_sign in [pref_sign, -pref_sign] {
                for &v0 in &roots {
                    let u = (v0 * v0 + 2.0 * g * h1).sqrt();
                    if u <= 0.0 {
                        continue;
                    }
                    let disc = k2n * u * u - 2.0 * g * h2;
                    let tol_d = 1e-6 * (k2n * u * u + 2.0 * g * h2).max(1.0);
                    if disc < -tol_d {
                        continue;
                    }
                    let root_d = disc.max(0.0).sqrt();
                    let lhs = v0 + a * u + catch_sign * root_d;
                    if (lhs - big_g).abs() > 1e-5 * big_g.max(1.0) {
                        continue;
                    }
                    let t_final = (kn * u + catch_sign * root_d) / g;
                    if t_final < -1e-9 || (v0 + u) / g < -1e-9 {
                        continue;
                    }
                    if candidates.iter().any(|c| {
                        c.bounces == n
                            && c.catch_sign == catch_sign
                            && (c.v0 - v0).abs() < 1e-7 * (1.0 + v0.abs())
                    }) {
                        continue;
                    }
                    candidates.push(Candidate {
                        bounces: n,
                        v0,
                        catch_sign,
                        forced: v0 < 0.0,
                        hyper: catch_sign < 0.0,
                    });
                }
            }
        }

        // exact fallback order: both preferences, then forced-only, then
        // hyper-only
        let chosen = candidates
            .iter()
            .find(|c| c.forced == opts.forced && c.hyper == opts.hyper)
            .or_else(|| candidates.iter().find(|c| c.forced == opts.forced))
            .or_else(|| candidates.iter().find(|c| c.hyper == opts.hyper))
            .ok_or_else(|| {
                LayoutError::internal(format!(
                    "no {}-bounce solution for a {:.3}s flight",
                    opts.bounces, dur
                ))
            })?;

        Self::build(start, t0, end, t1, opts, k, chosen)
    }

    fn build(
        start: Coord,
        t0: f64,
        end: Coord,
        t1: f64,
        opts: &BounceOptions,
        k: f64,
        c: &Candidate,
    ) -> Result<BouncePath> {
        let g = GRAVITY;
        let h1 = start.z - opts.plane;
        let u = (c.v0 * c.v0 + 2.0 * g * h1).sqrt();
        let kn = k.powi(c.bounces as i32);
        let disc = (kn * kn * u * u - 2.0 * g * (end.z - opts.plane)).max(0.0);
        let t_final = (kn * u + c.catch_sign * disc.sqrt()) / g;

        let mut arcs = Vec::with_capacity(c.bounces + 1);
        let mut impacts = Vec::with_capacity(c.bounces);
        let mut t = t0;
        let first = Arc {
            start: t,
            dur: (c.v0 + u) / g,
            z0: start.z,
            vz0: c.v0,
        };
        t += first.dur;
        arcs.push(first);
        for i in 1..=c.bounces {
            impacts.push(t);
            let rebound = k.powi(i as i32) * u;
            let seg_dur = if i < c.bounces {
                2.0 * rebound / g
            } else {
                t_final
            };
            arcs.push(Arc {
                start: t,
                dur: seg_dur,
                z0: opts.plane,
                vz0: rebound,
            });
            t += seg_dur;
        }
        if (t - t1).abs() > 1e-4 * (t1 - t0).max(1.0) {
            return Err(LayoutError::internal(format!(
                "bounce arcs sum to {:.6}, expected {:.6}",
                t - t0,
                t1 - t0
            )));
        }

        Ok(BouncePath {
            start,
            end,
            t0,
            t1,
            arcs,
            impacts,
            hyper: c.hyper,
            forced: c.forced,
        })
    }

    /// Smallest flight duration admitting a solution for these endpoints
    ///
    /// A single forced hyper bounce can be arbitrarily fast, so its minimum
    /// is zero.
    pub fn min_duration(start: Coord, end: Coord, opts: &BounceOptions) -> Result<f64> {
        if opts.bounces == 1 && opts.forced && opts.hyper {
            return Ok(0.0);
        }
        let feasible = |t: f64| BouncePath::solve(start, 0.0, end, t, opts).is_ok();
        let mut hi = 0.1;
        let mut doublings = 0;
        while !feasible(hi) {
            hi *= 2.0;
            doublings += 1;
            if doublings > 40 {
                return Err(LayoutError::internal(
                    "no feasible bounce duration found".to_string(),
                ));
            }
        }
        let mut lo = 0.0;
        for _ in 0..80 {
            let mid = 0.5 * (lo + hi);
            if feasible(mid) {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        Ok(hi)
    }

    pub fn start_time(&self) -> f64 {
        self.t0
    }

    pub fn end_time(&self) -> f64 {
        self.t1
    }

    pub fn is_hyper(&self) -> bool {
        self.hyper
    }

    pub fn is_forced(&self) -> bool {
        self.forced
    }

    pub fn impact_times(&self) -> &[f64] {
        &self.impacts
    }

    fn arc_at(&self, t: f64) -> &Arc {
        let i = self
            .arcs
            .partition_point(|a| a.start <= t)
            .saturating_sub(1)
            .min(self.arcs.len() - 1);
        &self.arcs[i]
    }

    pub fn coord(&self, t: f64) -> Coord {
        let t = t.clamp(self.t0, self.t1);
        let frac = (t - self.t0) / (self.t1 - self.t0);
        let arc = self.arc_at(t);
        let s = t - arc.start;
        Coord::new(
            self.start.x + (self.end.x - self.start.x) * frac,
            self.start.y + (self.end.y - self.start.y) * frac,
            arc.z0 + arc.vz0 * s - GRAVITY * s * s / 2.0,
        )
    }

    fn horizontal_velocity(&self) -> (f64, f64) {
        let dur = self.t1 - self.t0;
        (
            (self.end.x - self.start.x) / dur,
            (self.end.y - self.start.y) / dur,
        )
    }

    pub fn start_velocity(&self) -> Coord {
        let (vx, vy) = self.horizontal_velocity();
        Coord::new(vx, vy, self.arcs[0].vz0)
    }

    pub fn end_velocity(&self) -> Coord {
        let (vx, vy) = self.horizontal_velocity();
        let last = &self.arcs[self.arcs.len() - 1];
        Coord::new(vx, vy, last.vz0 - GRAVITY * last.dur)
    }

    pub fn extrema_on(&self, from: f64, to: f64) -> (Coord, Coord) {
        let a = from.clamp(self.t0, self.t1);
        let b = to.clamp(self.t0, self.t1);
        let pa = self.coord(a);
        let pb = self.coord(b);
        let mut lo = pa.min(pb);
        let mut hi = pa.max(pb);
        let mut consider = |t: f64| {
            if t > a && t < b {
                let p = self.coord(t);
                lo = lo.min(p);
                hi = hi.max(p);
            }
        };
        for arc in &self.arcs {
            consider(arc.start);
            consider(arc.start + arc.dur);
            // apex of this arc
            let apex = arc.start + arc.vz0 / GRAVITY;
            if apex < arc.start + arc.dur {
                consider(apex);
            }
        }
        (lo, hi)
    }
}

/// All real roots of a polynomial with ascending coefficients, by
/// recursive derivative bracketing and bisection
fn real_roots(coeffs: &[f64]) -> Vec<f64> {
    let maxmag = coeffs.iter().fold(0.0f64, |m, c| m.max(c.abs()));
    if maxmag == 0.0 {
        return Vec::new();
    }
    // coefficient magnitudes span many orders here; only exactly-zero
    // leading terms may be trimmed
    let mut deg = coeffs.len() - 1;
    while deg > 0 && coeffs[deg] == 0.0 {
        deg -= 1;
    }
    let c = &coeffs[..=deg];
    if deg == 0 {
        return Vec::new();
    }
    if deg == 1 {
        return vec![-c[0] / c[1]];
    }

    let eval = |x: f64| c.iter().rev().fold(0.0, |acc, &k| acc * x + k);
    // sum of term magnitudes, for a relative zero test
    let eval_mag = |x: f64| {
        c.iter()
            .rev()
            .fold(0.0f64, |acc, &k| acc * x.abs() + k.abs())
    };

    let deriv: Vec<f64> = (1..=deg).map(|i| c[i] * i as f64).collect();
    let crit = real_roots(&deriv);

    // Cauchy bound on root magnitude
    let bound = 1.0
        + c[..deg]
            .iter()
            .map(|k| (k / c[deg]).abs())
            .fold(0.0, f64::max);

    let mut pts = vec![-bound];
    pts.extend(crit.iter().copied().filter(|r| r.abs() < bound));
    pts.push(bound);
    pts.sort_by(f64::total_cmp);

    let mut roots = Vec::new();
    for w in pts.windows(2) {
        let (mut a, mut b) = (w[0], w[1]);
        let (fa, fb) = (eval(a), eval(b));
        if fa * fb < 0.0 {
            for _ in 0..200 {
                let mid = 0.5 * (a + b);
                if mid <= a || mid >= b {
                    break;
                }
                if eval(a) * eval(mid) <= 0.0 {
                    b = mid;
                } else {
                    a = mid;
                }
            }
            roots.push(0.5 * (a + b));
        }
    }
    // tangency roots sit at critical points
    for &r in &crit {
        if eval(r).abs() <= 1e-8 * eval_mag(r).max(f64::MIN_POSITIVE) {
            roots.push(r);
        }
    }
    roots.sort_by(f64::total_cmp);
    roots.dedup_by(|a, b| (*a - *b).abs() <= 1e-9 * (1.0 + a.abs()));
    roots
}
