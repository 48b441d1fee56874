//! Shared pattern fixtures for unit tests

use cascade_core::PatternDef;

/// One juggler, three balls, the plain cascade: a single throw/catch pair
/// of primaries expanded by a hand-switching symmetry.
///
/// Loop is 0.9s (two throws); the right hand throws path 1 at t=0 from
/// near the midline and catches path 3 at t=0.585 out wide.
pub fn cascade_def() -> PatternDef {
    serde_json::from_value(serde_json::json!({
        "jugglers": 1,
        "paths": 3,
        "symmetries": [
            {"kind": "delay", "pperm": "(1,3,2)", "delay": 0.9},
            {"kind": "switchdelay", "jperm": "(1*)", "pperm": "(1,2,3)"}
        ],
        "events": [
            {"time": 0.0, "juggler": 1, "hand": "right",
             "position": {"x": 10.0, "y": 0.0, "z": 0.0},
             "transitions": [{"kind": "throw", "path": 1}]},
            {"time": 0.585, "juggler": 1, "hand": "right",
             "position": {"x": 32.0, "y": 0.0, "z": 0.0},
             "transitions": [{"kind": "catch", "path": 3}]}
        ]
    }))
    .expect("cascade fixture is well formed")
}

/// Two jugglers passing three balls with a half-loop switchdelay; the left
/// hands never touch a prop and carry only bare position knots.
pub fn passing_def() -> PatternDef {
    serde_json::from_value(serde_json::json!({
        "jugglers": 2,
        "paths": 3,
        "symmetries": [
            {"kind": "delay", "pperm": "(1,3,2)", "delay": 2.0},
            {"kind": "switchdelay", "jperm": "(1,2)", "pperm": "(1,2,3)"}
        ],
        "events": [
            {"time": 0.0, "juggler": 1, "hand": "right",
             "position": {"x": 20.0, "y": 10.0, "z": 0.0},
             "transitions": [{"kind": "throw", "path": 1}]},
            {"time": 1.2, "juggler": 1, "hand": "right",
             "position": {"x": 30.0, "y": 10.0, "z": 0.0},
             "transitions": [{"kind": "catch", "path": 3}]},
            {"time": 0.5, "juggler": 1, "hand": "left",
             "position": {"x": 25.0, "y": 0.0, "z": 5.0},
             "transitions": []}
        ]
    }))
    .expect("passing fixture is well formed")
}

/// One juggler holding a single ball: no throws anywhere, both hands laid
/// out as closed loops.
pub fn holding_def() -> PatternDef {
    serde_json::from_value(serde_json::json!({
        "jugglers": 1,
        "paths": 1,
        "symmetries": [
            {"kind": "delay", "delay": 1.0}
        ],
        "events": [
            {"time": 0.0, "juggler": 1, "hand": "right",
             "position": {"x": 20.0, "y": 0.0, "z": 0.0},
             "transitions": [{"kind": "holding", "path": 1}]},
            {"time": 0.5, "juggler": 1, "hand": "right",
             "position": {"x": 25.0, "y": 5.0, "z": 10.0},
             "transitions": [{"kind": "holding", "path": 1}]},
            {"time": 0.25, "juggler": 1, "hand": "left",
             "position": {"x": 20.0, "y": 0.0, "z": 0.0},
             "transitions": []}
        ]
    }))
    .expect("holding fixture is well formed")
}
