//! The layout pass: from a validated pattern to a fully queryable scene
//!
//! Runs in order: expand the symmetry group into event images, extend the
//! primaries into a full event list, place the jugglers, globalize event
//! positions, solve every flight, then fit the hand curves. The resulting
//! [`Layout`] answers position queries for any time, wrapping queries
//! outside one loop through the delay symmetry's path permutation.

use std::sync::Arc;

use cascade_core::{Coord, Hand, LayoutError, Pattern, Permutation, Result};

use crate::body::{layout_bodies, BodyCurves};
use crate::curve::SplineCurve;
use crate::extend::build_event_list;
use crate::images::ImageSet;
use crate::links::{
    build_hand_links, build_path_links, velocity_at, HandLink, LaidEvent, PathLink, PathLinkKind,
    VelocityRef,
};

/// A laid-out pattern, ready for queries at any time
#[derive(Debug)]
pub struct Layout {
    jugglers: usize,
    paths: usize,
    delay: f64,
    path_perm: Permutation,
    pub events: Vec<LaidEvent>,
    pub path_links: Vec<Vec<PathLink>>,
    pub hand_links: Vec<Vec<HandLink>>,
    pub bodies: Vec<BodyCurves>,
    /// catch and floor-impact times within one loop, sorted
    sound_times: Vec<f64>,
}

/// Lay out a pattern
pub fn layout(pattern: &Pattern) -> Result<Layout> {
    let images = ImageSet::new(pattern)?;
    let bodies = layout_bodies(pattern)?;

    let events: Vec<LaidEvent> = build_event_list(pattern, &images)?
        .into_iter()
        .map(|event| {
            let global = bodies[event.juggler - 1].globalize(event.position, event.time);
            LaidEvent { event, global }
        })
        .collect();

    let path_links = build_path_links(pattern, &events)?;
    let mut hand_links = build_hand_links(pattern, &events);
    fit_hand_curves(pattern, &events, &path_links, &mut hand_links)?;

    let delay = pattern.delay();
    let mut sound_times = Vec::new();
    for links in &path_links {
        for link in links {
            if let PathLinkKind::Flight(flight) = &link.kind {
                for &t in flight.impact_times() {
                    if (0.0..delay).contains(&t) {
                        sound_times.push(t);
                    }
                }
                let catch_time = events[link.end_event].event.time;
                if (0.0..delay).contains(&catch_time) {
                    sound_times.push(catch_time);
                }
            }
        }
    }
    sound_times.sort_by(f64::total_cmp);

    Ok(Layout {
        jugglers: pattern.jugglers,
        paths: pattern.paths,
        delay,
        path_perm: pattern.path_perm().clone(),
        events,
        path_links,
        hand_links,
        bodies,
        sound_times,
    })
}

fn hand_slot(juggler: usize, hand: Hand) -> usize {
    (juggler - 1) * 2 + hand.index()
}

/// Fit the spline curve of every hand and share it across its links
///
/// Hands with throws or soft catches are fitted in runs between those
/// velocity-pinned events. Hands that only hold get one closed periodic
/// loop, found by following the chain from the link that straddles loop
/// start for one full delay.
fn fit_hand_curves(
    pattern: &Pattern,
    events: &[LaidEvent],
    path_links: &[Vec<PathLink>],
    hand_links: &mut [Vec<HandLink>],
) -> Result<()> {
    let delay = pattern.delay();
    for j in 1..=pattern.jugglers {
        for hand in [Hand::Right, Hand::Left] {
            let chain = &mut hand_links[hand_slot(j, hand)];
            if chain.is_empty() {
                return Err(LayoutError::internal(format!(
                    "juggler {} {} hand has no links after extension",
                    j, hand
                )));
            }
            // knot event indices: chain start, then every link end
            let mut knots = vec![chain[0].start_event];
            knots.extend(chain.iter().map(|l| l.end_event));

            let pinned: Vec<usize> = (0..knots.len())
                .filter(|&k| {
                    events[knots[k]]
                        .event
                        .velocity_transition()
                        .is_some()
                })
                .collect();

            if pinned.is_empty() {
                let curve = Arc::new(fit_hold_loop(events, &knots, delay)?);
                for link in chain.iter_mut() {
                    link.curve = Some(Arc::clone(&curve));
                }
            } else {
                for pair in pinned.windows(2) {
                    let (ka, kb) = (pair[0], pair[1]);
                    // queries wrap into [0, delay); runs wholly outside it
                    // are never evaluated
                    let ta = events[knots[ka]].event.time;
                    let tb = events[knots[kb]].event.time;
                    if tb <= 0.0 || ta >= delay {
                        continue;
                    }
                    let times: Vec<f64> = knots[ka..=kb]
                        .iter()
                        .map(|&e| events[e].event.time)
                        .collect();
                    let points: Vec<Coord> =
                        knots[ka..=kb].iter().map(|&e| events[e].global).collect();
                    let v_start = pinned_velocity(events, path_links, knots[ka])?;
                    let v_end = pinned_velocity(events, path_links, knots[kb])?;
                    let curve =
                        Arc::new(SplineCurve::fit_clamped(&times, &points, v_start, v_end)?);
                    for link in chain[ka..kb].iter_mut() {
                        link.curve = Some(Arc::clone(&curve));
                    }
                }
            }
        }
    }
    Ok(())
}

/// The hand velocity at a velocity-pinned event: launch velocity of the
/// departing flight at a throw, arrival velocity at a soft catch
fn pinned_velocity(
    events: &[LaidEvent],
    path_links: &[Vec<PathLink>],
    event_index: usize,
) -> Result<Coord> {
    let t = events[event_index]
        .event
        .velocity_transition()
        .ok_or_else(|| LayoutError::internal("pinned knot lost its velocity transition"))?;
    let vref = if t.is_throw() {
        VelocityRef::Throw { path: t.path() }
    } else {
        VelocityRef::Catch { path: t.path() }
    };
    velocity_at(path_links, event_index, vref)
}

/// Closed-loop fit for a hand that never throws: knots from the event at
/// or before loop start through its delayed image one loop later
fn fit_hold_loop(events: &[LaidEvent], knots: &[usize], delay: f64) -> Result<SplineCurve> {
    let start = knots
        .iter()
        .rposition(|&e| events[e].event.time <= 0.0)
        .ok_or_else(|| LayoutError::internal("hold loop has no knot at or before loop start"))?;
    let t0 = events[knots[start]].event.time;
    let target = t0 + delay;

    let mut times = Vec::new();
    let mut points = Vec::new();
    for &e in &knots[start..] {
        let t = events[e].event.time;
        if t > target + 1e-9 {
            break;
        }
        times.push(t);
        points.push(events[e].global);
    }
    let closes = times
        .last()
        .is_some_and(|&t| (t - target).abs() < 1e-9);
    if !closes || times.len() < 2 {
        return Err(LayoutError::internal(
            "hold loop knots do not span one delay period",
        ));
    }
    // the last knot is the delayed image of the first; make the seam exact
    let first = points[0];
    if let Some(last) = points.last_mut() {
        *last = first;
    }
    SplineCurve::fit_periodic(&times, &points)
}

impl Layout {
    pub fn jugglers(&self) -> usize {
        self.jugglers
    }

    pub fn paths(&self) -> usize {
        self.paths
    }

    /// One loop period in seconds
    pub fn loop_duration(&self) -> f64 {
        self.delay
    }

    /// Wrap a time into `[0, delay)` and count elapsed loops
    fn reduce(&self, t: f64) -> (f64, i64) {
        let loops = (t / self.delay).floor();
        (t - loops * self.delay, loops as i64)
    }

    fn check_juggler(&self, juggler: usize) -> Result<()> {
        if juggler == 0 || juggler > self.jugglers {
            return Err(LayoutError::internal(format!(
                "juggler {} out of range 1..={}",
                juggler, self.jugglers
            )));
        }
        Ok(())
    }

    fn check_path(&self, path: usize) -> Result<()> {
        if path == 0 || path > self.paths {
            return Err(LayoutError::internal(format!(
                "path {} out of range 1..={}",
                path, self.paths
            )));
        }
        Ok(())
    }

    /// The link a path is in at a reduced time
    fn path_link_at(&self, path: usize, t0: f64) -> Result<&PathLink> {
        self.path_links[path - 1]
            .iter()
            .find(|l| {
                self.events[l.start_event].event.time <= t0
                    && t0 < self.events[l.end_event].event.time
            })
            .ok_or_else(|| {
                LayoutError::internal(format!("no link for path {} at t={:.4}", path, t0))
            })
    }

    /// Global position of a path at any time
    pub fn path_coord(&self, path: usize, t: f64) -> Result<Coord> {
        self.check_path(path)?;
        let (t0, loops) = self.reduce(t);
        // earlier loops route this prop along a permuted path
        let p = self.path_perm.pow(-loops).apply(path as i32) as usize;
        let link = self.path_link_at(p, t0)?;
        match &link.kind {
            PathLinkKind::Flight(f) => Ok(f.coord(t0)),
            PathLinkKind::Hold { juggler, hand } => self.hand_coord(*juggler, *hand, t0),
        }
    }

    /// Global position of a hand at any time
    pub fn hand_coord(&self, juggler: usize, hand: Hand, t: f64) -> Result<Coord> {
        self.check_juggler(juggler)?;
        let (t0, _) = self.reduce(t);
        let chain = &self.hand_links[hand_slot(juggler, hand)];
        let link = chain
            .iter()
            .find(|l| {
                self.events[l.start_event].event.time <= t0
                    && t0 < self.events[l.end_event].event.time
            })
            .ok_or_else(|| {
                LayoutError::internal(format!(
                    "no link for juggler {} {} hand at t={:.4}",
                    juggler, hand, t0
                ))
            })?;
        let curve = link
            .curve
            .as_ref()
            .ok_or_else(|| LayoutError::internal("hand link was never fitted"))?;
        Ok(curve.position(t0))
    }

    pub fn juggler_position(&self, juggler: usize, t: f64) -> Result<Coord> {
        self.check_juggler(juggler)?;
        Ok(self.bodies[juggler - 1].position.position(t))
    }

    /// Facing angle in degrees
    pub fn juggler_angle(&self, juggler: usize, t: f64) -> Result<f64> {
        self.check_juggler(juggler)?;
        Ok(self.bodies[juggler - 1].angle.angle(t))
    }

    /// Whether the hand holds the given path at time `t`
    pub fn holds_path(&self, juggler: usize, hand: Hand, path: usize, t: f64) -> Result<bool> {
        self.check_juggler(juggler)?;
        self.check_path(path)?;
        let (t0, loops) = self.reduce(t);
        let p = self.path_perm.pow(-loops).apply(path as i32) as usize;
        let link = self.path_link_at(p, t0)?;
        Ok(matches!(
            link.kind,
            PathLinkKind::Hold { juggler: j, hand: h } if j == juggler && h == hand
        ))
    }

    /// The path held by the hand at time `t`, if any
    pub fn holding(&self, juggler: usize, hand: Hand, t: f64) -> Result<Option<usize>> {
        for path in 1..=self.paths {
            if self.holds_path(juggler, hand, path, t)? {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }

    /// Whether any catch or floor impact happens in `[from, to]`
    pub fn catch_or_bounce_in(&self, from: f64, to: f64) -> bool {
        if self.sound_times.is_empty() || to < from {
            return false;
        }
        if to - from >= self.delay {
            return true;
        }
        let l0 = (from / self.delay).floor() as i64;
        let l1 = (to / self.delay).floor() as i64;
        for l in l0..=l1 {
            let a = (from - l as f64 * self.delay).max(0.0);
            let b = (to - l as f64 * self.delay).min(self.delay);
            let i = self.sound_times.partition_point(|&s| s < a);
            if i < self.sound_times.len() && self.sound_times[i] <= b {
                return true;
            }
        }
        false
    }

    fn merge_extent(acc: &mut Option<(Coord, Coord)>, lo: Coord, hi: Coord) {
        *acc = Some(match acc {
            None => (lo, hi),
            Some((a, b)) => (a.min(lo), b.max(hi)),
        });
    }

    fn hand_extrema(&self, juggler: usize, hand: Hand, from: f64, to: f64) -> Result<(Coord, Coord)> {
        let chain = &self.hand_links[hand_slot(juggler, hand)];
        let mut acc = None;
        for link in chain {
            let a = self.events[link.start_event].event.time.max(from);
            let b = self.events[link.end_event].event.time.min(to);
            if a >= b {
                continue;
            }
            let curve = link
                .curve
                .as_ref()
                .ok_or_else(|| LayoutError::internal("hand link was never fitted"))?;
            let (lo, hi) = curve.extrema_on(a, b);
            Self::merge_extent(&mut acc, lo, hi);
        }
        acc.ok_or_else(|| LayoutError::internal("hand has no links in the query window"))
    }

    /// Bounding box corners of a path over one loop
    pub fn path_extent(&self, path: usize) -> Result<(Coord, Coord)> {
        self.check_path(path)?;
        let mut acc = None;
        for link in &self.path_links[path - 1] {
            let a = self.events[link.start_event].event.time.max(0.0);
            let b = self.events[link.end_event].event.time.min(self.delay);
            if a >= b {
                continue;
            }
            let (lo, hi) = match &link.kind {
                PathLinkKind::Flight(f) => f.extrema_on(a, b),
                PathLinkKind::Hold { juggler, hand } => self.hand_extrema(*juggler, *hand, a, b)?,
            };
            Self::merge_extent(&mut acc, lo, hi);
        }
        acc.ok_or_else(|| LayoutError::internal("path has no links in the loop window"))
    }

    /// Bounding box corners of a hand over one loop
    pub fn hand_extent(&self, juggler: usize, hand: Hand) -> Result<(Coord, Coord)> {
        self.check_juggler(juggler)?;
        self.hand_extrema(juggler, hand, 0.0, self.delay)
    }

    /// Bounding box corners of a juggler's body over one loop
    pub fn juggler_extent(&self, juggler: usize) -> Result<(Coord, Coord)> {
        self.check_juggler(juggler)?;
        Ok(self.bodies[juggler - 1].position.extrema())
    }
}
