//! Symmetry expansion of primary events
//!
//! Each primary event owns an [`EventImages`]: a finite grid of
//! permutations spanning (entry slot × juggler × hand), computed once by a
//! fixed-point closure over the pattern's non-delay symmetries, plus an
//! explicit cursor that walks the grid and the unbounded loop offsets in
//! either direction. Together the generators enumerate every event the
//! pattern implies without ever storing more than one loop's worth of
//! state.

use cascade_core::{Event, Hand, LayoutError, Pattern, Permutation, Result, SymmetryKind};

/// Closure passes are bounded; a well-formed symmetry group converges in
/// far fewer sweeps than this.
const MAX_CLOSURE_PASSES: usize = 1024;

/// A materialized image of a primary event
///
/// Derived on demand by a generator cursor; never stored in the pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct EventImage {
    pub event: Event,
    /// Index of the primary event this image derives from
    pub primary: usize,
    /// How many whole loops the image is displaced from its primary
    pub loop_offset: i64,
}

/// The image grid and cursor for one primary event
#[derive(Debug, Clone)]
pub struct EventImages {
    primary: Event,
    primary_index: usize,
    jugglers: usize,
    entries: usize,
    delay: f64,
    delay_pperm: Permutation,
    /// entry-major, then juggler, then hand (right first); None = no image
    grid: Vec<Option<Permutation>>,
    loop_offset: i64,
    slot: usize,
}

fn lcm(a: u64, b: u64) -> u64 {
    fn gcd(a: u64, b: u64) -> u64 {
        if b == 0 {
            a
        } else {
            gcd(b, a % b)
        }
    }
    a / gcd(a, b) * b
}

/// Number of entry slots per loop for this pattern's symmetry group
pub fn entry_slots(pattern: &Pattern) -> usize {
    pattern
        .switch_symmetries()
        .map(|s| s.jperm.order())
        .fold(1, lcm) as usize
}

impl EventImages {
    pub fn new(pattern: &Pattern, primary_index: usize) -> Result<EventImages> {
        let primary = pattern.events[primary_index].clone();
        let jugglers = pattern.jugglers;
        let entries = entry_slots(pattern);
        let delay = pattern.delay();
        let delay_pperm = pattern.path_perm().clone();
        let delay_pperm_inv = delay_pperm.inverse();

        let mut grid: Vec<Option<Permutation>> = vec![None; entries * jugglers * 2];
        let idx = |entry: usize, juggler: usize, hand: usize| (entry * jugglers + juggler) * 2 + hand;

        let seed_j = primary.juggler - 1;
        let seed_h = primary.hand.index();
        grid[idx(0, seed_j, seed_h)] = Some(Permutation::identity(pattern.paths));

        // Fixed-point closure: apply every non-delay symmetry to every
        // filled cell until nothing changes. A refill must agree exactly
        // with what is already there.
        let mut passes = 0;
        loop {
            let mut changed = false;
            passes += 1;
            if passes > MAX_CLOSURE_PASSES {
                return Err(LayoutError::internal(format!(
                    "symmetry closure did not converge after {} passes",
                    MAX_CLOSURE_PASSES
                )));
            }

            for entry in 0..entries {
                for juggler in 0..jugglers {
                    for hand in 0..2 {
                        let Some(perm) = grid[idx(entry, juggler, hand)].clone() else {
                            continue;
                        };
                        for sym in pattern.switch_symmetries() {
                            let target = sym.jperm.apply(juggler as i32 + 1);
                            let to_j = target.unsigned_abs() as usize - 1;
                            let to_h = if target < 0 { 1 - hand } else { hand };

                            let shift = match sym.kind {
                                SymmetryKind::Switch => 0,
                                SymmetryKind::SwitchDelay => entries / sym.jperm.order() as usize,
                                SymmetryKind::Delay { .. } => unreachable!(),
                            };
                            let mut to_entry = entry + shift;
                            let mut q = sym.pperm.compose(&perm);
                            if to_entry >= entries {
                                to_entry -= entries;
                                q = delay_pperm_inv.compose(&q);
                            }

                            let cell = &mut grid[idx(to_entry, to_j, to_h)];
                            match cell {
                                None => {
                                    *cell = Some(q);
                                    changed = true;
                                }
                                Some(existing) => {
                                    if *existing != q {
                                        return Err(LayoutError::InconsistentSymmetries {
                                            juggler: to_j + 1,
                                            hand: Hand::from_index(to_h),
                                            entry: to_entry,
                                        });
                                    }
                                }
                            }
                        }
                    }
                }
            }

            if !changed {
                break;
            }
        }

        let mut images = EventImages {
            primary,
            primary_index,
            jugglers,
            entries,
            delay,
            delay_pperm,
            grid,
            loop_offset: 0,
            slot: 0,
        };
        images.slot = images.first_filled_slot();
        Ok(images)
    }

    fn slot_count(&self) -> usize {
        self.entries * self.jugglers * 2
    }

    fn decode(&self, slot: usize) -> (usize, usize, usize) {
        let hand = slot % 2;
        let juggler = (slot / 2) % self.jugglers;
        let entry = slot / (2 * self.jugglers);
        (entry, juggler, hand)
    }

    fn first_filled_slot(&self) -> usize {
        self.grid
            .iter()
            .position(|c| c.is_some())
            .expect("grid always holds its seed cell")
    }

    fn last_filled_slot(&self) -> usize {
        self.grid
            .iter()
            .rposition(|c| c.is_some())
            .expect("grid always holds its seed cell")
    }

    /// Time of the image the cursor points at
    pub fn current_time(&self) -> f64 {
        let (entry, _, _) = self.decode(self.slot);
        self.primary.time
            + entry as f64 * (self.delay / self.entries as f64)
            + self.loop_offset as f64 * self.delay
    }

    /// (juggler, hand) of the image the cursor points at; used for the
    /// merger's tie-break
    pub fn current_order_key(&self) -> (usize, u8) {
        let (_, juggler, hand) = self.decode(self.slot);
        (juggler + 1, Hand::from_index(hand).order_key())
    }

    /// Advance the cursor to the next image in time
    pub fn next(&mut self) {
        let mut s = self.slot + 1;
        while s < self.slot_count() {
            if self.grid[s].is_some() {
                self.slot = s;
                return;
            }
            s += 1;
        }
        self.loop_offset += 1;
        self.slot = self.first_filled_slot();
    }

    /// Move the cursor to the previous image in time
    pub fn previous(&mut self) {
        let mut s = self.slot;
        while s > 0 {
            s -= 1;
            if self.grid[s].is_some() {
                self.slot = s;
                return;
            }
        }
        self.loop_offset -= 1;
        self.slot = self.last_filled_slot();
    }

    /// Reposition the cursor at a boundary time: forward cursors land on
    /// the earliest image at or after `time`, reverse cursors on the
    /// latest image strictly before it
    pub fn reset(&mut self, time: f64, forward: bool) {
        let base = ((time - self.primary.time) / self.delay).floor() as i64;
        if forward {
            self.loop_offset = base - 2;
            self.slot = self.first_filled_slot();
            while self.current_time() < time {
                self.next();
            }
        } else {
            self.loop_offset = base + 2;
            self.slot = self.first_filled_slot();
            while self.current_time() >= time {
                self.previous();
            }
        }
    }

    /// Materialize the image the cursor points at
    pub fn make_event(&self) -> EventImage {
        let (entry, juggler, hand) = self.decode(self.slot);
        let cell = self.grid[self.slot]
            .as_ref()
            .expect("cursor only rests on filled cells");
        let full = self.delay_pperm.pow(self.loop_offset).compose(cell);

        let hand = Hand::from_index(hand);
        let position = if hand == self.primary.hand {
            self.primary.position
        } else {
            self.primary.position.flip_x()
        };
        let transitions = self
            .primary
            .transitions
            .iter()
            .map(|t| t.with_path(full.apply(t.path() as i32) as usize))
            .collect();

        EventImage {
            event: Event {
                time: self.current_time(),
                juggler: juggler + 1,
                hand,
                position,
                transitions,
            },
            primary: self.primary_index,
            loop_offset: self.loop_offset,
        }
    }

    /// Does any image of this primary land on the given hand?
    pub fn touches_hand(&self, juggler: usize, hand: Hand) -> bool {
        (0..self.entries)
            .any(|e| self.grid[(e * self.jugglers + juggler - 1) * 2 + hand.index()].is_some())
    }

    /// Any image with at least one transition on the given hand
    pub fn has_transition_for_hand(&self, juggler: usize, hand: Hand) -> bool {
        !self.primary.transitions.is_empty() && self.touches_hand(juggler, hand)
    }

    /// Any image with a throw or soft catch on the given hand
    pub fn has_velocity_for_hand(&self, juggler: usize, hand: Hand) -> bool {
        self.primary.velocity_transition().is_some() && self.touches_hand(juggler, hand)
    }

    fn path_touched(&self, path: usize, velocity_only: bool) -> bool {
        let order = self.delay_pperm.order() as i64;
        for cell in self.grid.iter().flatten() {
            for t in &self.primary.transitions {
                if velocity_only && !t.is_velocity_defining() {
                    continue;
                }
                let mut image = cell.apply(t.path() as i32);
                for _ in 0..order {
                    if image as usize == path {
                        return true;
                    }
                    image = self.delay_pperm.apply(image);
                }
            }
        }
        false
    }

    /// Any image with a transition on the given path, at any loop offset
    pub fn has_transition_for_path(&self, path: usize) -> bool {
        self.path_touched(path, false)
    }

    /// Any image with a throw or soft catch on the given path
    pub fn has_velocity_for_path(&self, path: usize) -> bool {
        self.path_touched(path, true)
    }
}

/// The generators for every primary event of one pattern
#[derive(Debug, Clone)]
pub struct ImageSet {
    pub generators: Vec<EventImages>,
}

impl ImageSet {
    pub fn new(pattern: &Pattern) -> Result<ImageSet> {
        let generators = (0..pattern.events.len())
            .map(|i| EventImages::new(pattern, i))
            .collect::<Result<Vec<_>>>()?;
        Ok(ImageSet { generators })
    }

    pub fn touches_hand(&self, juggler: usize, hand: Hand) -> bool {
        self.generators.iter().any(|g| g.touches_hand(juggler, hand))
    }

    pub fn has_velocity_for_hand(&self, juggler: usize, hand: Hand) -> bool {
        self.generators
            .iter()
            .any(|g| g.has_velocity_for_hand(juggler, hand))
    }

    pub fn has_transition_for_path(&self, path: usize) -> bool {
        self.generators.iter().any(|g| g.has_transition_for_path(path))
    }

    pub fn has_velocity_for_path(&self, path: usize) -> bool {
        self.generators.iter().any(|g| g.has_velocity_for_path(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_patterns::{cascade_def, passing_def};
    use cascade_core::Pattern;

    #[test]
    fn test_cascade_grid_covers_both_hands() {
        let pattern = Pattern::from_def(cascade_def()).unwrap();
        let images = EventImages::new(&pattern, 0).unwrap();
        assert!(images.touches_hand(1, Hand::Right));
        assert!(images.touches_hand(1, Hand::Left));
        assert!(images.has_velocity_for_hand(1, Hand::Left));
        for path in 1..=3 {
            assert!(images.has_transition_for_path(path), "path {}", path);
            assert!(images.has_velocity_for_path(path), "path {}", path);
        }
    }

    #[test]
    fn test_cursor_times_are_monotonic() {
        let pattern = Pattern::from_def(cascade_def()).unwrap();
        let mut images = EventImages::new(&pattern, 0).unwrap();
        images.reset(0.0, true);
        let mut last = images.current_time();
        assert!(last >= 0.0);
        for _ in 0..20 {
            images.next();
            let t = images.current_time();
            assert!(t > last);
            last = t;
        }
        for _ in 0..40 {
            images.previous();
            let t = images.current_time();
            assert!(t < last);
            last = t;
        }
    }

    #[test]
    fn test_left_images_are_mirrored() {
        let pattern = Pattern::from_def(cascade_def()).unwrap();
        let mut images = EventImages::new(&pattern, 0).unwrap();
        images.reset(0.0, true);
        let mut seen_left = false;
        for _ in 0..8 {
            let img = images.make_event();
            if img.event.hand == Hand::Left {
                seen_left = true;
                assert_eq!(img.event.position.x, -pattern.events[0].position.x);
            }
            images.next();
        }
        assert!(seen_left);
    }

    #[test]
    fn test_closure_consistency_of_passing_pattern() {
        // two application orders reach the same cells; closure must agree
        let pattern = Pattern::from_def(passing_def()).unwrap();
        for i in 0..pattern.events.len() {
            EventImages::new(&pattern, i).unwrap();
        }
    }

    #[test]
    fn test_inconsistent_symmetries_rejected() {
        // a switch whose path permutation fights the delay routing
        let def = serde_json::json!({
            "jugglers": 1,
            "paths": 2,
            "symmetries": [
                {"kind": "delay", "pperm": "(1,2)", "delay": 1.0},
                {"kind": "switchdelay", "jperm": "(1*)", "pperm": "()"}
            ],
            "events": [
                {"time": 0.0, "juggler": 1, "hand": "right",
                 "transitions": [{"kind": "throw", "path": 1}]}
            ]
        });
        let pattern = Pattern::from_def(serde_json::from_value(def).unwrap()).unwrap();
        let err = EventImages::new(&pattern, 0).unwrap_err();
        assert!(matches!(err, LayoutError::InconsistentSymmetries { .. }));
        assert!(err.is_user_error());
    }
}
