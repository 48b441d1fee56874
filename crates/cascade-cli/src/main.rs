use anyhow::Result;
use clap::{Parser, Subcommand};

use cascade_core::{Hand, LayoutError, Pattern, PatternDef};
use cascade_layout::{layout, EventSequence, Layout};

#[derive(Parser)]
#[command(name = "cascade")]
#[command(about = "Validator and layout inspector for juggling patterns", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a pattern file and lay it out
    Validate {
        /// Path to a pattern JSON file
        file: String,
    },
    /// List the pattern's events over a time window
    Events {
        /// Path to a pattern JSON file
        file: String,

        /// Window start in seconds (default: 0)
        #[arg(short, long, default_value = "0")]
        from: f64,

        /// Window length in seconds (default: one loop)
        #[arg(short, long)]
        duration: Option<f64>,

        /// Output format (json or debug)
        #[arg(long, default_value = "debug")]
        format: String,
    },
    /// Sample every trajectory over one loop
    Layout {
        /// Path to a pattern JSON file
        file: String,

        /// Samples per loop (default: 16)
        #[arg(short, long, default_value = "16")]
        samples: usize,

        /// Output format (json or debug)
        #[arg(long, default_value = "debug")]
        format: String,
    },
    /// Query positions at one instant
    Coord {
        /// Path to a pattern JSON file
        file: String,

        /// Query time in seconds
        #[arg(short, long, default_value = "0")]
        time: f64,
    },
}

fn read_pattern(file: &str) -> Result<Pattern> {
    let source = std::fs::read_to_string(file)
        .map_err(|e| anyhow::anyhow!("Failed to read file '{}': {}", file, e))?;
    let def: PatternDef = serde_json::from_str(&source)
        .map_err(|e| anyhow::anyhow!("Failed to parse '{}': {}", file, e))?;
    match Pattern::from_def(def) {
        Ok(pattern) => Ok(pattern),
        Err(e) => {
            eprintln!("✗ Invalid pattern: {}", e);
            std::process::exit(1);
        }
    }
}

/// Lay the pattern out, exiting with a message when the pattern itself is
/// at fault
fn lay_out(pattern: &Pattern) -> Result<Layout> {
    match layout(pattern) {
        Ok(l) => Ok(l),
        Err(e) if e.is_user_error() => {
            eprintln!("✗ Layout error: {}", e);
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { file } => {
            let pattern = read_pattern(&file)?;
            let scene = lay_out(&pattern)?;
            println!("✓ Pattern is valid");
            println!(
                "  {} juggler(s), {} path(s), loop {:.3} s",
                scene.jugglers(),
                scene.paths(),
                scene.loop_duration()
            );
            Ok(())
        }
        Commands::Events {
            file,
            from,
            duration,
            format,
        } => {
            let pattern = read_pattern(&file)?;
            let duration = duration.unwrap_or_else(|| pattern.delay());
            let seq = match EventSequence::new(&pattern, from, false) {
                Ok(seq) => seq,
                Err(e) => {
                    eprintln!("✗ Invalid pattern: {}", e);
                    std::process::exit(1);
                }
            };
            let events: Vec<_> = seq
                .map(|image| image.event)
                .take_while(|e| e.time < from + duration)
                .collect();

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&events)?),
                _ => {
                    println!("Events: {}", events.len());
                    for e in &events {
                        let kinds: Vec<String> =
                            e.transitions.iter().map(|t| t.to_string()).collect();
                        println!(
                            "  t={:+.3}  juggler {} {:>5} hand  {} [{}]",
                            e.time,
                            e.juggler,
                            e.hand.to_string(),
                            e.position,
                            kinds.join(", ")
                        );
                    }
                }
            }
            Ok(())
        }
        Commands::Layout {
            file,
            samples,
            format,
        } => {
            let pattern = read_pattern(&file)?;
            let scene = lay_out(&pattern)?;
            let d = scene.loop_duration();

            let mut rows = Vec::new();
            for i in 0..samples {
                let t = d * i as f64 / samples as f64;
                let mut paths = Vec::new();
                for p in 1..=scene.paths() {
                    paths.push(scene.path_coord(p, t)?);
                }
                let mut hands = Vec::new();
                for j in 1..=scene.jugglers() {
                    for hand in [Hand::Right, Hand::Left] {
                        hands.push(scene.hand_coord(j, hand, t)?);
                    }
                }
                rows.push((t, paths, hands));
            }

            match format.as_str() {
                "json" => {
                    let value: Vec<serde_json::Value> = rows
                        .iter()
                        .map(|(t, paths, hands)| {
                            serde_json::json!({
                                "time": t,
                                "paths": paths,
                                "hands": hands,
                            })
                        })
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&value)?);
                }
                _ => {
                    for (t, paths, hands) in &rows {
                        print!("t={:.3} ", t);
                        for (p, c) in paths.iter().enumerate() {
                            print!(" path{}={}", p + 1, c);
                        }
                        for c in hands {
                            print!(" hand={}", c);
                        }
                        println!();
                    }
                }
            }
            Ok(())
        }
        Commands::Coord { file, time } => {
            let pattern = read_pattern(&file)?;
            let scene = lay_out(&pattern)?;

            println!("At t={:.3}:", time);
            for p in 1..=scene.paths() {
                println!("  path {} at {}", p, coord_or_exit(scene.path_coord(p, time))?);
            }
            for j in 1..=scene.jugglers() {
                println!(
                    "  juggler {} at {} facing {:.1}°",
                    j,
                    scene.juggler_position(j, time)?,
                    scene.juggler_angle(j, time)?
                );
                for hand in [Hand::Right, Hand::Left] {
                    let held = match scene.holding(j, hand, time)? {
                        Some(path) => format!("holding path {}", path),
                        None => "empty".to_string(),
                    };
                    println!(
                        "    {} hand at {} ({})",
                        hand,
                        scene.hand_coord(j, hand, time)?,
                        held
                    );
                }
            }
            Ok(())
        }
    }
}

fn coord_or_exit(
    result: std::result::Result<cascade_core::Coord, LayoutError>,
) -> Result<cascade_core::Coord> {
    match result {
        Ok(c) => Ok(c),
        Err(e) if e.is_user_error() => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}
