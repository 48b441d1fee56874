//! Link chains: what happens to each path and each hand between events
//!
//! Consecutive transitions on a path form path links, each either a solved
//! flight or a hold in some hand. Consecutive events of a hand form hand
//! links, later fitted with spline curves pinned to prop velocities at
//! throws and soft catches.

use std::sync::Arc;

use cascade_core::{Coord, Event, Hand, LayoutError, Pattern, Result, Transition};

use crate::curve::SplineCurve;
use crate::paths::FlightPath;

/// An event with its global-frame hand position
#[derive(Debug, Clone)]
pub struct LaidEvent {
    pub event: Event,
    pub global: Coord,
}

/// What one path is doing between two of its events
#[derive(Debug)]
pub struct PathLink {
    pub path: usize,
    pub start_event: usize,
    pub end_event: usize,
    pub kind: PathLinkKind,
}

#[derive(Debug)]
pub enum PathLinkKind {
    Flight(FlightPath),
    Hold { juggler: usize, hand: Hand },
}

/// Which flight pins a hand's velocity at an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VelocityRef {
    /// velocity of the flight leaving on this path
    Throw { path: usize },
    /// velocity of the flight arriving on this path
    Catch { path: usize },
}

/// A hand's motion between two consecutive events of that hand
#[derive(Debug)]
pub struct HandLink {
    pub juggler: usize,
    pub hand: Hand,
    pub start_event: usize,
    pub end_event: usize,
    pub start_ref: Option<VelocityRef>,
    pub end_ref: Option<VelocityRef>,
    /// filled once hand curves are fitted; shared across the links of a run
    pub curve: Option<Arc<SplineCurve>>,
}

fn hand_slot(juggler: usize, hand: Hand) -> usize {
    (juggler - 1) * 2 + hand.index()
}

/// Indices of the events a path participates in, in time order
fn path_event_indices(events: &[LaidEvent], path: usize) -> Vec<usize> {
    (0..events.len())
        .filter(|&i| events[i].event.transition_for_path(path).is_some())
        .collect()
}

/// Build the link chain for every path
///
/// Rejects malformed transition sequences: a throw must be answered by a
/// catch, a held prop must not be caught again, and a hold must stay in
/// one hand until thrown.
pub fn build_path_links(pattern: &Pattern, events: &[LaidEvent]) -> Result<Vec<Vec<PathLink>>> {
    let mut chains = Vec::with_capacity(pattern.paths);
    for path in 1..=pattern.paths {
        let indices = path_event_indices(events, path);
        let mut links = Vec::new();
        for pair in indices.windows(2) {
            let (ia, ib) = (pair[0], pair[1]);
            let a = &events[ia];
            let b = &events[ib];
            let ta = a
                .event
                .transition_for_path(path)
                .ok_or_else(|| LayoutError::internal("path link start lost its transition"))?;
            let tb = b
                .event
                .transition_for_path(path)
                .ok_or_else(|| LayoutError::internal("path link end lost its transition"))?;

            let kind = match ta {
                Transition::Throw {
                    throw_type,
                    modifier,
                    ..
                } => {
                    if !tb.is_catch() {
                        return Err(LayoutError::BadTransitionOrder {
                            path,
                            time: b.event.time,
                            detail: if tb.is_throw() {
                                "thrown again while in flight".to_string()
                            } else {
                                "held while in flight".to_string()
                            },
                        });
                    }
                    let prop = pattern.prop_for_path(path);
                    PathLinkKind::Flight(FlightPath::solve(
                        throw_type,
                        modifier.as_deref(),
                        path,
                        a.global,
                        a.event.time,
                        b.global,
                        b.event.time,
                        prop.elasticity,
                    )?)
                }
                Transition::Catch { .. }
                | Transition::SoftCatch { .. }
                | Transition::GrabCatch { .. }
                | Transition::Holding { .. } => {
                    if tb.is_catch() {
                        return Err(LayoutError::BadTransitionOrder {
                            path,
                            time: b.event.time,
                            detail: "caught while already in a hand".to_string(),
                        });
                    }
                    // holds stay in one hand until the next throw
                    if a.event.juggler != b.event.juggler || a.event.hand != b.event.hand {
                        return Err(LayoutError::HoldBrokenAcrossHands {
                            path,
                            time: b.event.time,
                            from_juggler: a.event.juggler,
                            from_hand: a.event.hand,
                            to_juggler: b.event.juggler,
                            to_hand: b.event.hand,
                        });
                    }
                    PathLinkKind::Hold {
                        juggler: a.event.juggler,
                        hand: a.event.hand,
                    }
                }
            };
            links.push(PathLink {
                path,
                start_event: ia,
                end_event: ib,
                kind,
            });
        }
        chains.push(links);
    }
    Ok(chains)
}

/// The velocity reference pinning a hand at one event, if any
fn velocity_ref(event: &Event) -> Option<VelocityRef> {
    if let Some(t) = event.velocity_transition() {
        return Some(match t {
            Transition::Throw { path, .. } => VelocityRef::Throw { path: *path },
            _ => VelocityRef::Catch { path: t.path() },
        });
    }
    event
        .transitions
        .iter()
        .find(|t| t.is_catch())
        .map(|t| VelocityRef::Catch { path: t.path() })
}

/// Build the link chain for every hand, indexed `(juggler-1)*2 + hand`
pub fn build_hand_links(pattern: &Pattern, events: &[LaidEvent]) -> Vec<Vec<HandLink>> {
    let mut chains: Vec<Vec<HandLink>> = (0..pattern.jugglers * 2).map(|_| Vec::new()).collect();
    for j in 1..=pattern.jugglers {
        for hand in [Hand::Right, Hand::Left] {
            let indices: Vec<usize> = (0..events.len())
                .filter(|&i| events[i].event.juggler == j && events[i].event.hand == hand)
                .collect();
            let links = &mut chains[hand_slot(j, hand)];
            for pair in indices.windows(2) {
                links.push(HandLink {
                    juggler: j,
                    hand,
                    start_event: pair[0],
                    end_event: pair[1],
                    start_ref: velocity_ref(&events[pair[0]].event),
                    end_ref: velocity_ref(&events[pair[1]].event),
                    curve: None,
                });
            }
        }
    }
    chains
}

/// The hand velocity imposed at `event_index` by `vref`, read off the
/// already-solved flight in the path chains
pub fn velocity_at(
    path_links: &[Vec<PathLink>],
    event_index: usize,
    vref: VelocityRef,
) -> Result<Coord> {
    match vref {
        VelocityRef::Throw { path } => path_links[path - 1]
            .iter()
            .find(|l| l.start_event == event_index)
            .and_then(|l| match &l.kind {
                PathLinkKind::Flight(f) => Some(f.start_velocity()),
                PathLinkKind::Hold { .. } => None,
            })
            .ok_or_else(|| LayoutError::internal("throw velocity reference has no flight")),
        VelocityRef::Catch { path } => path_links[path - 1]
            .iter()
            .find(|l| l.end_event == event_index)
            .and_then(|l| match &l.kind {
                PathLinkKind::Flight(f) => Some(f.end_velocity()),
                PathLinkKind::Hold { .. } => None,
            })
            .ok_or_else(|| LayoutError::internal("catch velocity reference has no flight")),
    }
}
