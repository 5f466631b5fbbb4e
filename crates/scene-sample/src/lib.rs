//! # Scene Sample
//!
//! A small host for the scene orchestrator: a simulated engine loader plus
//! the lifecycle code that wires it to a runtime. Exposed as a library for
//! integration testing.

pub mod lifecycle;
pub mod simulated;
