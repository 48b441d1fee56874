//! Globally ordered event enumeration
//!
//! [`EventSequence`] merges every primary's image generator into one
//! time-ordered stream, forward or backward from any boundary time. The
//! boundary is inclusive going forward and exclusive going backward, so a
//! forward and a reverse scan from the same time partition the pattern's
//! events exactly once between them.

use crate::images::{EventImage, EventImages, ImageSet};
use cascade_core::{Pattern, Result};
use std::cmp::Ordering;

/// A lazy, unbounded, restartable event stream
#[derive(Debug, Clone)]
pub struct EventSequence {
    generators: Vec<EventImages>,
    reverse: bool,
}

impl EventSequence {
    /// Build from a pattern, expanding the symmetry group internally
    pub fn new(pattern: &Pattern, start: f64, reverse: bool) -> Result<EventSequence> {
        Ok(Self::from_images(&ImageSet::new(pattern)?, start, reverse))
    }

    /// Build from an already-expanded image set
    pub fn from_images(images: &ImageSet, start: f64, reverse: bool) -> EventSequence {
        let mut generators = images.generators.clone();
        for g in &mut generators {
            g.reset(start, !reverse);
        }
        EventSequence { generators, reverse }
    }

    fn key(g: &EventImages) -> (f64, usize, u8) {
        let (juggler, hand) = g.current_order_key();
        (g.current_time(), juggler, hand)
    }

    fn candidate(&self) -> usize {
        let better = |a: &EventImages, b: &EventImages| -> bool {
            let ka = Self::key(a);
            let kb = Self::key(b);
            let ord = ka
                .0
                .partial_cmp(&kb.0)
                .unwrap_or(Ordering::Equal)
                .then(ka.1.cmp(&kb.1))
                .then(ka.2.cmp(&kb.2));
            if self.reverse {
                ord == Ordering::Greater
            } else {
                ord == Ordering::Less
            }
        };

        let mut best = 0;
        for i in 1..self.generators.len() {
            if better(&self.generators[i], &self.generators[best]) {
                best = i;
            }
        }
        best
    }

    /// Yield the next image; the stream never runs dry
    pub fn advance(&mut self) -> EventImage {
        let i = self.candidate();
        let image = self.generators[i].make_event();
        if self.reverse {
            self.generators[i].previous();
        } else {
            self.generators[i].next();
        }
        image
    }
}

impl Iterator for EventSequence {
    type Item = EventImage;

    fn next(&mut self) -> Option<EventImage> {
        Some(self.advance())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_patterns::cascade_def;
    use cascade_core::Pattern;

    #[test]
    fn test_forward_order() {
        let pattern = Pattern::from_def(cascade_def()).unwrap();
        let seq = EventSequence::new(&pattern, 0.0, false).unwrap();
        let events: Vec<_> = seq.take(12).collect();
        assert!(events[0].event.time >= 0.0);
        for pair in events.windows(2) {
            assert_ne!(
                pair[0].event.cmp_order(&pair[1].event),
                Ordering::Greater,
                "events out of order: {:?} then {:?}",
                pair[0].event,
                pair[1].event
            );
        }
    }

    #[test]
    fn test_reverse_is_strictly_before_boundary() {
        let pattern = Pattern::from_def(cascade_def()).unwrap();
        let seq = EventSequence::new(&pattern, 0.0, true).unwrap();
        for image in seq.take(12) {
            assert!(image.event.time < 0.0);
        }
    }

    #[test]
    fn test_partition_at_boundary() {
        // scans from T in both directions split the events exactly: the
        // reverse scan's first event and the forward scan's first event
        // must be adjacent in the global order, with nothing shared
        let pattern = Pattern::from_def(cascade_def()).unwrap();
        for boundary in [0.0, 0.585, 0.3, -1.0] {
            let fwd: Vec<_> = EventSequence::new(&pattern, boundary, false)
                .unwrap()
                .take(16)
                .collect();
            let rev: Vec<_> = EventSequence::new(&pattern, boundary, true)
                .unwrap()
                .take(16)
                .collect();
            assert!(fwd.iter().all(|i| i.event.time >= boundary));
            assert!(rev.iter().all(|i| i.event.time < boundary));

            // stitched back together they are one gapless ordered run
            let mut all: Vec<_> = rev.into_iter().rev().chain(fwd).collect();
            let times: Vec<f64> = all.iter().map(|i| i.event.time).collect();
            all.sort_by(|a, b| a.event.cmp_order(&b.event));
            let sorted: Vec<f64> = all.iter().map(|i| i.event.time).collect();
            assert_eq!(times, sorted, "boundary {}", boundary);
            for pair in all.windows(2) {
                assert_ne!(pair[0], pair[1], "event yielded twice at boundary {}", boundary);
            }
        }
    }
}
