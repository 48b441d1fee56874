use crate::Coord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Which of a juggler's hands an event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    /// The other hand
    pub fn other(self) -> Hand {
        match self {
            Hand::Left => Hand::Right,
            Hand::Right => Hand::Left,
        }
    }

    /// Sort key; events on the right hand order before the left at the
    /// same time and juggler
    pub fn order_key(self) -> u8 {
        match self {
            Hand::Right => 0,
            Hand::Left => 1,
        }
    }

    /// Index used for per-hand storage (right = 0, left = 1)
    pub fn index(self) -> usize {
        self.order_key() as usize
    }

    pub fn from_index(i: usize) -> Hand {
        if i == 0 {
            Hand::Right
        } else {
            Hand::Left
        }
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hand::Left => write!(f, "left"),
            Hand::Right => write!(f, "right"),
        }
    }
}

fn default_throw_type() -> String {
    "toss".to_string()
}

/// What an event does to one prop path
///
/// Throws and soft catches are the velocity-defining transitions: they are
/// the only kinds that fix the hand's instantaneous velocity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Transition {
    Throw {
        path: usize,
        #[serde(default = "default_throw_type")]
        throw_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        modifier: Option<String>,
    },
    Catch {
        path: usize,
    },
    SoftCatch {
        path: usize,
    },
    GrabCatch {
        path: usize,
    },
    Holding {
        path: usize,
    },
}

impl Transition {
    /// The 1-based path this transition acts on
    pub fn path(&self) -> usize {
        match *self {
            Transition::Throw { path, .. }
            | Transition::Catch { path }
            | Transition::SoftCatch { path }
            | Transition::GrabCatch { path }
            | Transition::Holding { path } => path,
        }
    }

    pub fn is_throw(&self) -> bool {
        matches!(self, Transition::Throw { .. })
    }

    /// Catch of any kind (catch, soft catch, grab catch)
    pub fn is_catch(&self) -> bool {
        matches!(
            self,
            Transition::Catch { .. } | Transition::SoftCatch { .. } | Transition::GrabCatch { .. }
        )
    }

    /// Throw or soft catch
    pub fn is_velocity_defining(&self) -> bool {
        matches!(self, Transition::Throw { .. } | Transition::SoftCatch { .. })
    }

    /// Same transition with the path renumbered
    pub fn with_path(&self, path: usize) -> Transition {
        let mut t = self.clone();
        match &mut t {
            Transition::Throw { path: p, .. }
            | Transition::Catch { path: p }
            | Transition::SoftCatch { path: p }
            | Transition::GrabCatch { path: p }
            | Transition::Holding { path: p } => *p = path,
        }
        t
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Throw {
                path, throw_type, ..
            } => write!(f, "throw path {} ({})", path, throw_type),
            Transition::Catch { path } => write!(f, "catch path {}", path),
            Transition::SoftCatch { path } => write!(f, "soft-catch path {}", path),
            Transition::GrabCatch { path } => write!(f, "grab-catch path {}", path),
            Transition::Holding { path } => write!(f, "holding path {}", path),
        }
    }
}

/// A timed event on one juggler's hand
///
/// The coordinate is local to the juggler's body frame; the layout engine
/// converts it to global coordinates through the juggler's body curve. An
/// event may carry no transitions at all, in which case it is a pure
/// position knot for the hand's motion curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Time in seconds
    pub time: f64,
    /// 1-based juggler index
    pub juggler: usize,
    pub hand: Hand,
    /// Hand position in the juggler's local frame (cm)
    #[serde(default)]
    pub position: Coord,
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

impl Event {
    /// The event ordering used everywhere: time, then juggler, then hand
    /// with right before left
    pub fn cmp_order(&self, other: &Event) -> Ordering {
        self.time
            .partial_cmp(&other.time)
            .unwrap_or(Ordering::Equal)
            .then(self.juggler.cmp(&other.juggler))
            .then(self.hand.order_key().cmp(&other.hand.order_key()))
    }

    /// Any transition touching the given path
    pub fn transition_for_path(&self, path: usize) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.path() == path)
    }

    /// First velocity-defining transition, if any
    pub fn velocity_transition(&self) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.is_velocity_defining())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(time: f64, juggler: usize, hand: Hand) -> Event {
        Event {
            time,
            juggler,
            hand,
            position: Coord::ZERO,
            transitions: Vec::new(),
        }
    }

    #[test]
    fn test_ordering() {
        let a = ev(0.0, 1, Hand::Right);
        let b = ev(0.0, 1, Hand::Left);
        let c = ev(0.0, 2, Hand::Right);
        let d = ev(0.5, 1, Hand::Right);
        assert_eq!(a.cmp_order(&b), Ordering::Less);
        assert_eq!(b.cmp_order(&c), Ordering::Less);
        assert_eq!(c.cmp_order(&d), Ordering::Less);
        assert_eq!(a.cmp_order(&a), Ordering::Equal);
    }

    #[test]
    fn test_transition_queries() {
        let t = Transition::Throw {
            path: 2,
            throw_type: "toss".into(),
            modifier: None,
        };
        assert_eq!(t.path(), 2);
        assert!(t.is_velocity_defining());
        assert!(!t.is_catch());
        assert_eq!(t.with_path(5).path(), 5);

        let c = Transition::SoftCatch { path: 1 };
        assert!(c.is_catch());
        assert!(c.is_velocity_defining());
        assert!(!Transition::Catch { path: 1 }.is_velocity_defining());
    }

    #[test]
    fn test_serde_kebab_case() {
        let json = r#"{
            "time": 0.0, "juggler": 1, "hand": "right",
            "position": {"x": 10.0, "y": 0.0, "z": 0.0},
            "transitions": [
                {"kind": "throw", "path": 1},
                {"kind": "soft-catch", "path": 2}
            ]
        }"#;
        let e: Event = serde_json::from_str(json).unwrap();
        assert_eq!(e.hand, Hand::Right);
        assert_eq!(e.transitions.len(), 2);
        assert!(e.transitions[0].is_throw());
        assert!(matches!(e.transitions[1], Transition::SoftCatch { path: 2 }));
        // default throw type fills in
        match &e.transitions[0] {
            Transition::Throw { throw_type, .. } => assert_eq!(throw_type, "toss"),
            _ => unreachable!(),
        }
    }
}
