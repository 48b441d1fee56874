//! Core types for the cascade juggling pattern layout engine
//!
//! This crate provides the data model shared by the layout engine and its
//! front ends: 3-D coordinates, permutations with hand-flip signs, timed
//! events and their transitions, symmetries, and the validated `Pattern`.
//!
//! A pattern is authored as a small set of "primary" events plus a list of
//! algebraic symmetries; the layout engine in `cascade-layout` expands that
//! description into the full event stream and continuous trajectories.
//!
//! # Main Components
//!
//! - **Coord**: 3-D position/velocity vector (centimeters, +z up)
//! - **Permutation**: bijection on 1..n with optional hand-flip signs
//! - **Event / Transition**: a timed hand event and what it does to props
//! - **Pattern**: the validated pattern record consumed by `layout()`
//! - **LayoutError**: the shared error type, split user/internal

pub mod coord;
pub mod error;
pub mod event;
pub mod pattern;
pub mod permutation;

pub use coord::Coord;
pub use error::LayoutError;
pub use event::{Event, Hand, Transition};
pub use pattern::{
    Pattern, PatternDef, Position, PositionDef, Prop, Symmetry, SymmetryDef, SymmetryKind,
    SymmetryKindDef,
};
pub use permutation::Permutation;

/// Convenience alias used throughout the engine.
pub type Result<T> = std::result::Result<T, LayoutError>;
