pub mod model;
pub mod view;

pub use model::{Marker, Point, PointerAction, PointerState, TrailError, TrailState};
pub use view::draw;

/// Per-frame opacity step for both fade-in and fade-out.
pub const OPACITY_STEP: f64 = 0.05;

/// Movement events closer together than this (milliseconds) are treated as
/// simultaneous and produce no speed sample.
pub const MIN_MOVE_INTERVAL_MS: f64 = 1.0e-3;
