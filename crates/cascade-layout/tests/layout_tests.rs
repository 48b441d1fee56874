//! End-to-end layout runs over JSON-authored patterns

use cascade_core::{Hand, LayoutError, Pattern, PatternDef};
use cascade_layout::{layout, FlightPath, PathLinkKind};

fn pattern(value: serde_json::Value) -> Pattern {
    let def: PatternDef = serde_json::from_value(value).expect("pattern JSON parses");
    Pattern::from_def(def).expect("pattern validates")
}

/// One ball bounced between the two hands of one juggler.
fn bounce_def() -> serde_json::Value {
    serde_json::json!({
        "jugglers": 1,
        "paths": 1,
        "props": [{"kind": "ball", "elasticity": 0.9}],
        "symmetries": [
            {"kind": "delay", "delay": 2.0}
        ],
        "events": [
            {"time": 0.0, "juggler": 1, "hand": "right",
             "position": {"x": 30.0, "z": 100.0},
             "transitions": [{"kind": "throw", "path": 1, "throw_type": "bounce"}]},
            {"time": 1.7, "juggler": 1, "hand": "right",
             "position": {"x": 30.0, "z": 100.0},
             "transitions": [{"kind": "catch", "path": 1}]},
            {"time": 1.0, "juggler": 1, "hand": "left",
             "position": {"x": -30.0, "z": 100.0},
             "transitions": []}
        ]
    })
}

/// Two jugglers passing three balls across the circle.
fn passing_def() -> serde_json::Value {
    serde_json::json!({
        "jugglers": 2,
        "paths": 3,
        "symmetries": [
            {"kind": "delay", "pperm": "(1,3,2)", "delay": 2.0},
            {"kind": "switchdelay", "jperm": "(1,2)", "pperm": "(1,2,3)"}
        ],
        "events": [
            {"time": 0.0, "juggler": 1, "hand": "right",
             "position": {"x": 20.0, "y": 10.0},
             "transitions": [{"kind": "throw", "path": 1}]},
            {"time": 1.2, "juggler": 1, "hand": "right",
             "position": {"x": 30.0, "y": 10.0},
             "transitions": [{"kind": "catch", "path": 3}]},
            {"time": 0.5, "juggler": 1, "hand": "left",
             "position": {"x": -25.0},
             "transitions": []}
        ]
    })
}

#[test]
fn bounce_pattern_lays_out() {
    let l = layout(&pattern(bounce_def())).unwrap();

    // the chain also carries pre-loop image flights; assert on the one
    // thrown inside the base loop
    let flight = l.path_links[0]
        .iter()
        .filter(|link| l.events[link.start_event].event.time >= 0.0)
        .find_map(|link| match &link.kind {
            PathLinkKind::Flight(f) => Some(f),
            PathLinkKind::Hold { .. } => None,
        })
        .expect("the ball flies within the loop");
    let FlightPath::Bounce(_) = flight else {
        panic!("bounce throw solved as a toss");
    };
    assert_eq!(flight.impact_times().len(), 1);

    // at the impact instant the ball sits on the floor
    let impact = flight.impact_times()[0];
    assert!(impact > 0.0 && impact < 1.7);
    let c = l.path_coord(1, impact).unwrap();
    assert!(c.z.abs() < 1e-3, "ball at z={} on impact", c.z);

    // the impact and the catch are both audible
    assert!(l.catch_or_bounce_in(impact - 0.05, impact + 0.05));
    assert!(l.catch_or_bounce_in(1.65, 1.75));
}

#[test]
fn passing_pattern_crosses_the_circle() {
    let l = layout(&pattern(passing_def())).unwrap();

    // default arrangement: 200 cm face to face
    let p1 = l.juggler_position(1, 0.0).unwrap();
    let p2 = l.juggler_position(2, 0.0).unwrap();
    assert!((p1.distance(p2) - 200.0).abs() < 1e-6);

    // path 1 leaves juggler 1's side and crosses the midline in flight
    let at_throw = l.path_coord(1, 0.0).unwrap();
    assert!(at_throw.y < -50.0);
    let (lo, hi) = l.path_extent(1).unwrap();
    assert!(lo.y < -50.0 && hi.y > 50.0, "extent {} .. {}", lo, hi);

    // every queried instant has every path somewhere finite
    let d = l.loop_duration();
    for i in 0..40 {
        let t = -d + 2.0 * d * i as f64 / 39.0;
        for path in 1..=3 {
            let c = l.path_coord(path, t).unwrap();
            assert!(c.x.is_finite() && c.y.is_finite() && c.z.is_finite());
        }
        for j in 1..=2 {
            for hand in [Hand::Right, Hand::Left] {
                l.hand_coord(j, hand, t).unwrap();
            }
        }
    }
}

#[test]
fn passing_throws_sit_on_opposite_loop_halves() {
    // the half-loop switchdelay puts juggler 2's throws exactly half a
    // loop after juggler 1's
    let l = layout(&pattern(passing_def())).unwrap();
    let d = l.loop_duration();

    let mut seen = [false; 2];
    for laid in &l.events {
        let e = &laid.event;
        if e.time < 0.0 || e.time >= d || e.velocity_transition().is_none() {
            continue;
        }
        seen[e.juggler - 1] = true;
        if e.juggler == 1 {
            assert!(e.time < d / 2.0, "juggler 1 throw at t={}", e.time);
        } else {
            assert!(e.time >= d / 2.0, "juggler 2 throw at t={}", e.time);
        }
    }
    assert!(seen[0] && seen[1]);
}

#[test]
fn throw_answered_by_throw_is_rejected() {
    let def = serde_json::json!({
        "jugglers": 1,
        "paths": 1,
        "symmetries": [{"kind": "delay", "delay": 1.0}],
        "events": [
            {"time": 0.0, "juggler": 1, "hand": "right",
             "transitions": [{"kind": "throw", "path": 1}]},
            {"time": 0.5, "juggler": 1, "hand": "left",
             "transitions": [{"kind": "throw", "path": 1}]}
        ]
    });
    let err = layout(&pattern(def)).unwrap_err();
    assert!(
        matches!(err, LayoutError::BadTransitionOrder { path: 1, .. }),
        "got {err}"
    );
    assert!(err.is_user_error());
}

#[test]
fn unknown_throw_type_is_rejected() {
    let def = serde_json::json!({
        "jugglers": 1,
        "paths": 1,
        "symmetries": [{"kind": "delay", "delay": 1.0}],
        "events": [
            {"time": 0.0, "juggler": 1, "hand": "right", "position": {"z": 100.0},
             "transitions": [{"kind": "throw", "path": 1, "throw_type": "orbit"}]},
            {"time": 0.6, "juggler": 1, "hand": "right", "position": {"z": 100.0},
             "transitions": [{"kind": "catch", "path": 1}]},
            {"time": 0.3, "juggler": 1, "hand": "left",
             "transitions": []}
        ]
    });
    let err = layout(&pattern(def)).unwrap_err();
    assert!(matches!(err, LayoutError::BadThrowType { .. }), "got {err}");
}

#[test]
fn shower_with_flipped_hands_lays_out() {
    // a one-juggler loop where the switchdelay flips hands: left is the
    // mirror of right half a loop later
    let def = serde_json::json!({
        "jugglers": 1,
        "paths": 3,
        "symmetries": [
            {"kind": "delay", "pperm": "(1,3,2)", "delay": 0.9},
            {"kind": "switchdelay", "jperm": "(1*)", "pperm": "(1,2,3)"}
        ],
        "events": [
            {"time": 0.0, "juggler": 1, "hand": "right",
             "position": {"x": 10.0, "z": 100.0},
             "transitions": [{"kind": "throw", "path": 1}]},
            {"time": 0.585, "juggler": 1, "hand": "right",
             "position": {"x": 32.0, "z": 100.0},
             "transitions": [{"kind": "catch", "path": 3}]}
        ]
    });
    let l = layout(&pattern(def)).unwrap();

    // the left hand mirrors the right half an entry later: local x flips
    let r = l.hand_coord(1, Hand::Right, 0.0).unwrap();
    let left = l.hand_coord(1, Hand::Left, 0.45).unwrap();
    assert!((r.x + left.x).abs() < 1e-6, "{} vs {}", r.x, left.x);
    assert!((r.z - left.z).abs() < 1e-6);

    // between its catch at 0.135 and throw at 0.45 the left hand holds
    // the ball routed as path 2; the right hand is empty until 0.585
    assert_eq!(l.holding(1, Hand::Left, 0.2).unwrap(), Some(2));
    assert_eq!(l.holding(1, Hand::Right, 0.2).unwrap(), None);
}
