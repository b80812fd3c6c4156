//! Comet renders a fading, tapering chain of markers that chases the pointer
//! across a transparent layer-shell overlay.

pub mod config;
pub mod events;
pub mod gui;
pub mod sys;
