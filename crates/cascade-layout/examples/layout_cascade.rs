//! Example: lay out a three-ball cascade and sample its trajectories

use cascade_core::{Hand, Pattern, PatternDef};
use cascade_layout::layout;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Cascade Layout Example");
    println!("======================\n");

    // A three-ball cascade authored as one throw and one catch; the
    // switchdelay symmetry fills in the left hand and the other beats.
    let def: PatternDef = serde_json::from_str(
        r#"{
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
        }"#,
    )?;

    let pattern = Pattern::from_def(def)?;
    let scene = layout(&pattern)?;
    let d = scene.loop_duration();

    println!("Loop duration: {:.3} s", d);
    println!("Paths: {}\n", scene.paths());

    println!("  t       ball 1               right hand           left hand");
    for i in 0..=12 {
        let t = d * i as f64 / 12.0;
        let ball = scene.path_coord(1, t)?;
        let right = scene.hand_coord(1, Hand::Right, t)?;
        let left = scene.hand_coord(1, Hand::Left, t)?;
        println!("  {:.3}   {:<20} {:<20} {}", t, ball.to_string(), right.to_string(), left);
    }

    let (lo, hi) = scene.path_extent(1)?;
    println!("\nBall 1 stays within {} .. {}", lo, hi);

    for hand in [Hand::Right, Hand::Left] {
        match scene.holding(1, hand, 0.2)? {
            Some(path) => println!("At t=0.200 the {} hand holds ball {}", hand, path),
            None => println!("At t=0.200 the {} hand is empty", hand),
        }
    }

    Ok(())
}
