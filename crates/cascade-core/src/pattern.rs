use crate::error::LayoutError;
use crate::{Coord, Event, Permutation};
use serde::{Deserialize, Serialize};

/// A prop carried by one or more paths
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prop {
    #[serde(default = "default_prop_kind")]
    pub kind: String,
    /// Diameter in cm
    #[serde(default = "default_diameter")]
    pub diameter: f64,
    /// Fraction of kinetic energy retained per bounce
    #[serde(default = "default_elasticity")]
    pub elasticity: f64,
}

fn default_prop_kind() -> String {
    "ball".to_string()
}

fn default_diameter() -> f64 {
    10.0
}

fn default_elasticity() -> f64 {
    0.9
}

impl Default for Prop {
    fn default() -> Self {
        Prop {
            kind: default_prop_kind(),
            diameter: default_diameter(),
            elasticity: default_elasticity(),
        }
    }
}

/// One juggler body waypoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionDef {
    pub time: f64,
    pub juggler: usize,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    /// Facing angle in degrees; 0 faces +y
    #[serde(default)]
    pub angle: f64,
}

/// Validated body waypoint
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub time: f64,
    pub juggler: usize,
    pub coord: Coord,
    pub angle: f64,
}

/// Symmetry kind as authored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymmetryKindDef {
    Delay,
    Switch,
    #[serde(rename = "switchdelay")]
    SwitchDelay,
}

/// Symmetry as authored: permutations in cycle notation, missing = identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymmetryDef {
    pub kind: SymmetryKindDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jperm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pperm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<f64>,
}

/// Compiled symmetry kind; only the delay symmetry carries a duration
#[derive(Debug, Clone, PartialEq)]
pub enum SymmetryKind {
    Delay { delay: f64 },
    Switch,
    SwitchDelay,
}

/// A compiled symmetry: a juggler permutation (signed, `*` flips hands)
/// and a path permutation (unsigned)
#[derive(Debug, Clone, PartialEq)]
pub struct Symmetry {
    pub kind: SymmetryKind,
    pub jperm: Permutation,
    pub pperm: Permutation,
}

impl Symmetry {
    pub fn is_delay(&self) -> bool {
        matches!(self.kind, SymmetryKind::Delay { .. })
    }
}

/// The raw pattern record supplied by an external parser or notation
/// converter; the direct serde image of the engine's input interface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternDef {
    pub jugglers: usize,
    pub paths: usize,
    #[serde(default)]
    pub props: Vec<Prop>,
    /// 1-based prop index per path; defaults to prop 1 everywhere
    #[serde(default)]
    pub prop_assignment: Vec<usize>,
    pub symmetries: Vec<SymmetryDef>,
    #[serde(default)]
    pub positions: Vec<PositionDef>,
    pub events: Vec<Event>,
}

/// A validated pattern, immutable for one layout pass
///
/// Built with [`Pattern::from_def`], which parses the permutations, checks
/// every index range, requires exactly one delay symmetry and sorts the
/// primary events into the canonical event order.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub jugglers: usize,
    pub paths: usize,
    pub props: Vec<Prop>,
    pub prop_assignment: Vec<usize>,
    pub symmetries: Vec<Symmetry>,
    pub positions: Vec<Position>,
    pub events: Vec<Event>,
    delay_index: usize,
}

impl Pattern {
    /// Validate and compile a raw pattern record
    pub fn from_def(def: PatternDef) -> Result<Pattern, LayoutError> {
        if def.jugglers == 0 {
            return Err(LayoutError::bad_pattern("juggler count must be at least 1"));
        }
        if def.paths == 0 {
            return Err(LayoutError::bad_pattern("path count must be at least 1"));
        }
        if def.events.is_empty() {
            return Err(LayoutError::bad_pattern("pattern has no primary events"));
        }

        let props = if def.props.is_empty() {
            vec![Prop::default()]
        } else {
            def.props
        };

        let prop_assignment = if def.prop_assignment.is_empty() {
            vec![1; def.paths]
        } else {
            def.prop_assignment
        };
        if prop_assignment.len() != def.paths {
            return Err(LayoutError::bad_pattern(format!(
                "prop assignment lists {} paths but the pattern has {}",
                prop_assignment.len(),
                def.paths
            )));
        }
        for (i, &p) in prop_assignment.iter().enumerate() {
            if p == 0 || p > props.len() {
                return Err(LayoutError::bad_pattern(format!(
                    "path {} is assigned prop {} but only {} props are defined",
                    i + 1,
                    p,
                    props.len()
                )));
            }
        }

        let mut symmetries = Vec::with_capacity(def.symmetries.len());
        let mut delay_index = None;
        for s in &def.symmetries {
            let jperm = match &s.jperm {
                Some(text) => Permutation::from_cycles(text, def.jugglers, true)?,
                None => Permutation::identity(def.jugglers),
            };
            let pperm = match &s.pperm {
                Some(text) => Permutation::from_cycles(text, def.paths, false)?,
                None => Permutation::identity(def.paths),
            };
            let kind = match s.kind {
                SymmetryKindDef::Delay => {
                    let delay = s.delay.ok_or_else(|| {
                        LayoutError::bad_pattern("delay symmetry needs a delay value")
                    })?;
                    if !(delay > 0.0) {
                        return Err(LayoutError::bad_pattern(format!(
                            "delay must be positive, got {}",
                            delay
                        )));
                    }
                    if !jperm.is_identity() {
                        return Err(LayoutError::bad_pattern(
                            "the delay symmetry cannot permute jugglers",
                        ));
                    }
                    if delay_index.is_some() {
                        return Err(LayoutError::bad_pattern(
                            "pattern has more than one delay symmetry",
                        ));
                    }
                    delay_index = Some(symmetries.len());
                    SymmetryKind::Delay { delay }
                }
                SymmetryKindDef::Switch | SymmetryKindDef::SwitchDelay => {
                    if s.delay.is_some() {
                        return Err(LayoutError::bad_pattern(
                            "only the delay symmetry carries a delay value",
                        ));
                    }
                    if s.kind == SymmetryKindDef::Switch {
                        SymmetryKind::Switch
                    } else {
                        SymmetryKind::SwitchDelay
                    }
                }
            };
            symmetries.push(Symmetry { kind, jperm, pperm });
        }
        let delay_index = delay_index
            .ok_or_else(|| LayoutError::bad_pattern("pattern has no delay symmetry"))?;

        let mut events = def.events;
        for e in &events {
            if e.juggler == 0 || e.juggler > def.jugglers {
                return Err(LayoutError::bad_pattern(format!(
                    "event at t={:.3} names juggler {} of {}",
                    e.time, e.juggler, def.jugglers
                )));
            }
            for t in &e.transitions {
                if t.path() == 0 || t.path() > def.paths {
                    return Err(LayoutError::bad_pattern(format!(
                        "event at t={:.3} names path {} of {}",
                        e.time,
                        t.path(),
                        def.paths
                    )));
                }
            }
        }
        events.sort_by(|a, b| a.cmp_order(b));

        let mut positions = Vec::with_capacity(def.positions.len());
        for p in &def.positions {
            if p.juggler == 0 || p.juggler > def.jugglers {
                return Err(LayoutError::bad_pattern(format!(
                    "position waypoint at t={:.3} names juggler {} of {}",
                    p.time, p.juggler, def.jugglers
                )));
            }
            positions.push(Position {
                time: p.time,
                juggler: p.juggler,
                coord: Coord::new(p.x, p.y, p.z),
                angle: p.angle,
            });
        }
        positions.sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap_or(std::cmp::Ordering::Equal));

        Ok(Pattern {
            jugglers: def.jugglers,
            paths: def.paths,
            props,
            prop_assignment,
            symmetries,
            positions,
            events,
            delay_index,
        })
    }

    /// The delay symmetry
    pub fn delay_symmetry(&self) -> &Symmetry {
        &self.symmetries[self.delay_index]
    }

    /// One full loop period in seconds
    pub fn delay(&self) -> f64 {
        match self.delay_symmetry().kind {
            SymmetryKind::Delay { delay } => delay,
            _ => unreachable!("delay_index points at the delay symmetry"),
        }
    }

    /// The path permutation governing prop routing across one loop
    pub fn path_perm(&self) -> &Permutation {
        &self.delay_symmetry().pperm
    }

    /// The symmetries other than the delay, in authored order
    pub fn switch_symmetries(&self) -> impl Iterator<Item = &Symmetry> {
        self.symmetries.iter().filter(|s| !s.is_delay())
    }

    /// The prop carried by a path (1-based path index)
    pub fn prop_for_path(&self, path: usize) -> &Prop {
        &self.props[self.prop_assignment[path - 1] - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Hand;
    use crate::Transition;

    fn minimal_def() -> PatternDef {
        PatternDef {
            jugglers: 1,
            paths: 1,
            props: Vec::new(),
            prop_assignment: Vec::new(),
            symmetries: vec![SymmetryDef {
                kind: SymmetryKindDef::Delay,
                jperm: None,
                pperm: None,
                delay: Some(1.0),
            }],
            positions: Vec::new(),
            events: vec![Event {
                time: 0.0,
                juggler: 1,
                hand: Hand::Right,
                position: Coord::ZERO,
                transitions: vec![Transition::Holding { path: 1 }],
            }],
        }
    }

    #[test]
    fn test_minimal_pattern_compiles() {
        let p = Pattern::from_def(minimal_def()).unwrap();
        assert_eq!(p.delay(), 1.0);
        assert!(p.path_perm().is_identity());
        assert_eq!(p.props.len(), 1);
        assert_eq!(p.prop_for_path(1).kind, "ball");
    }

    #[test]
    fn test_requires_delay_symmetry() {
        let mut def = minimal_def();
        def.symmetries.clear();
        assert!(matches!(
            Pattern::from_def(def),
            Err(LayoutError::BadPattern(_))
        ));
    }

    #[test]
    fn test_rejects_two_delay_symmetries() {
        let mut def = minimal_def();
        def.symmetries.push(def.symmetries[0].clone());
        assert!(Pattern::from_def(def).is_err());
    }

    #[test]
    fn test_rejects_delay_on_switch() {
        let mut def = minimal_def();
        def.symmetries.push(SymmetryDef {
            kind: SymmetryKindDef::Switch,
            jperm: None,
            pperm: None,
            delay: Some(0.5),
        });
        assert!(Pattern::from_def(def).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_path() {
        let mut def = minimal_def();
        def.events[0].transitions = vec![Transition::Holding { path: 2 }];
        assert!(Pattern::from_def(def).is_err());
    }

    #[test]
    fn test_events_sorted() {
        let mut def = minimal_def();
        let mut later = def.events[0].clone();
        later.time = 0.5;
        def.events.insert(0, later);
        let p = Pattern::from_def(def).unwrap();
        assert!(p.events[0].time < p.events[1].time);
    }

    #[test]
    fn test_def_json_roundtrip() {
        let json = serde_json::json!({
            "jugglers": 2,
            "paths": 2,
            "symmetries": [
                {"kind": "delay", "delay": 2.0},
                {"kind": "switchdelay", "jperm": "(1,2)", "pperm": "(1,2)"}
            ],
            "events": [
                {"time": 0.0, "juggler": 1, "hand": "right",
                 "transitions": [{"kind": "throw", "path": 1}]}
            ]
        });
        let def: PatternDef = serde_json::from_value(json).unwrap();
        let p = Pattern::from_def(def).unwrap();
        assert_eq!(p.switch_symmetries().count(), 1);
        assert_eq!(p.delay(), 2.0);
    }
}
