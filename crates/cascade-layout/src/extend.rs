//! Needs-driven extension of the primary events into a full event list
//!
//! One loop's worth of images is never enough to lay out curves: the spline
//! fit at the loop boundaries needs the previous and next velocity-defining
//! events, and a prop in flight across the boundary needs its throw. The
//! builder scans backward from loop start and forward from loop end,
//! clearing per-hand and per-path "still needed" flags per transition kind,
//! until every flag clears.

use crate::images::ImageSet;
use crate::merge::EventSequence;
use cascade_core::{Event, Hand, LayoutError, Pattern, Result, Transition};

/// Hard cap per scan direction; hit only on contradictory input.
const MAX_EXTENSION_EVENTS: usize = 10_000;

/// Owned needs matrices, threaded explicitly through the extension loop
#[derive(Debug, Clone)]
struct Needs {
    /// indexed (juggler-1)*2 + hand.index()
    hands: Vec<bool>,
    /// indexed path-1
    paths: Vec<bool>,
}

impl Needs {
    fn new(pattern: &Pattern) -> Needs {
        Needs {
            hands: vec![true; pattern.jugglers * 2],
            paths: vec![true; pattern.paths],
        }
    }

    fn any(&self) -> bool {
        self.hands.iter().chain(self.paths.iter()).any(|&b| b)
    }

    fn hand(&mut self, juggler: usize, hand: Hand) -> &mut bool {
        &mut self.hands[(juggler - 1) * 2 + hand.index()]
    }

    /// Apply one event's transitions; returns the updated needs
    ///
    /// A hand with velocity-defining images needs a throw or soft catch to
    /// pin its spline endpoints; a hand without any is laid out as a closed
    /// hold loop, and any event of it will do.
    fn absorb(mut self, event: &Event, path_has_throw: &[bool], hand_has_velocity: &[bool]) -> Needs {
        let slot = (event.juggler - 1) * 2 + event.hand.index();
        if !hand_has_velocity[slot] {
            self.hands[slot] = false;
        }
        for t in &event.transitions {
            match t {
                Transition::Throw { path, .. } => {
                    *self.hand(event.juggler, event.hand) = false;
                    self.paths[path - 1] = false;
                }
                Transition::Catch { .. } | Transition::GrabCatch { .. } => {}
                Transition::SoftCatch { path } => {
                    // the hand's velocity here comes from the paired throw,
                    // so finding it keeps the path on the needed list
                    let hand = self.hand(event.juggler, event.hand);
                    if *hand {
                        *hand = false;
                        self.paths[path - 1] = true;
                    }
                }
                Transition::Holding { path } => {
                    if !path_has_throw[path - 1] {
                        self.paths[path - 1] = false;
                    }
                }
            }
        }
        self
    }
}

/// Check every hand and path is reachable, then build the extended,
/// time-ordered event list around one loop `[0, delay)`
pub fn build_event_list(pattern: &Pattern, images: &ImageSet) -> Result<Vec<Event>> {
    for juggler in 1..=pattern.jugglers {
        for hand in [Hand::Right, Hand::Left] {
            if !images.touches_hand(juggler, hand) {
                return Err(LayoutError::HandNeverUsed { juggler, hand });
            }
        }
    }
    for path in 1..=pattern.paths {
        if !images.has_transition_for_path(path) {
            return Err(LayoutError::PathNeverUsed { path });
        }
    }

    let path_has_throw: Vec<bool> = (1..=pattern.paths)
        .map(|p| images.has_velocity_for_path(p))
        .collect();
    let hand_has_velocity: Vec<bool> = (1..=pattern.jugglers)
        .flat_map(|j| [Hand::Right, Hand::Left].map(|h| images.has_velocity_for_hand(j, h)))
        .collect();
    let delay = pattern.delay();

    let mut backward = Vec::new();
    let mut needs = Needs::new(pattern);
    let mut seq = EventSequence::from_images(images, 0.0, true);
    while needs.any() {
        if backward.len() >= MAX_EXTENSION_EVENTS {
            return Err(LayoutError::internal(
                "backward event extension did not converge",
            ));
        }
        let image = seq.advance();
        needs = needs.absorb(&image.event, &path_has_throw, &hand_has_velocity);
        backward.push(image.event);
    }

    let mut events: Vec<Event> = backward.into_iter().rev().collect();

    let mut seq = EventSequence::from_images(images, 0.0, false);
    loop {
        let image = seq.advance();
        if image.event.time >= delay {
            break;
        }
        events.push(image.event);
    }

    // run past the loop end until the needs clear, and keep going through
    // any event at the loop-end instant itself so every boundary event has
    // its delayed partner in the list
    let mut needs = Needs::new(pattern);
    let mut seq = EventSequence::from_images(images, delay, false);
    let mut count = 0;
    loop {
        if count >= MAX_EXTENSION_EVENTS {
            return Err(LayoutError::internal(
                "forward event extension did not converge",
            ));
        }
        count += 1;
        let image = seq.advance();
        needs = needs.absorb(&image.event, &path_has_throw, &hand_has_velocity);
        let done = !needs.any() && image.event.time > delay;
        events.push(image.event);
        if done {
            break;
        }
    }

    // every flight solved later needs both of its ends: keep scanning until
    // each path whose last transition is a throw sees its next transition
    let mut open = vec![false; pattern.paths];
    for path in 1..=pattern.paths {
        if let Some(t) = events
            .iter()
            .rev()
            .find_map(|e| e.transition_for_path(path))
        {
            open[path - 1] = t.is_throw();
        }
    }
    while open.iter().any(|&b| b) {
        if count >= MAX_EXTENSION_EVENTS {
            return Err(LayoutError::internal(
                "forward event extension did not converge",
            ));
        }
        count += 1;
        let image = seq.advance();
        for t in &image.event.transitions {
            open[t.path() - 1] = false;
        }
        events.push(image.event);
    }

    Ok(events)
}
