//! Layout engine for juggling patterns
//!
//! A pattern authors one loop's worth of primary events plus a group of
//! symmetries. This crate expands that group into the full event stream,
//! extends it as far as the curve fits require, solves every prop flight
//! in closed form (toss parabolas and multi-bounce chains), and fits C²
//! spline curves for hands and bodies. The resulting [`Layout`] answers
//! position, holding and bounding-box queries for any point in time.
//!
//! ```no_run
//! use cascade_core::{Pattern, PatternDef};
//! use cascade_layout::layout;
//!
//! # fn run(def: PatternDef) -> cascade_core::Result<()> {
//! let pattern = Pattern::from_def(def)?;
//! let scene = layout(&pattern)?;
//! let c = scene.path_coord(1, 0.25)?;
//! println!("path 1 is at {}", c);
//! # Ok(())
//! # }
//! ```

pub mod body;
pub mod bounce;
pub mod curve;
pub mod extend;
pub mod images;
pub mod layout;
pub mod links;
pub mod merge;
pub mod paths;
pub mod spline;

#[cfg(test)]
pub(crate) mod test_patterns;

pub use body::{layout_bodies, BodyCurves};
pub use bounce::{BounceOptions, BouncePath};
pub use curve::{AngleCurve, PositionCurve, SplineCurve};
pub use extend::build_event_list;
pub use images::{EventImage, EventImages, ImageSet};
pub use layout::{layout, Layout};
pub use links::{HandLink, LaidEvent, PathLink, PathLinkKind, VelocityRef};
pub use merge::EventSequence;
pub use paths::{FlightPath, TossPath, GRAVITY};
pub use spline::Spline1;
