//! Error surface for fallible construction and configuration.

use thiserror::Error;

/// Failures reported by fallible constructors and setters.
///
/// Only invariant violations surface here. Numerical degeneracies
/// (zero-length normals, coincident centers, parallel sweep rays) are
/// absorbed by epsilon guards inside the detectors and solver.
#[derive(Debug, Error)]
pub enum PhysicsError {
    /// Body mass must be positive and finite. Static bodies are made
    /// with `set_static`, never by passing an infinite mass.
    #[error("body mass must be positive and finite, got {0}")]
    InvalidMass(f64),

    /// World configuration failed validation.
    #[error("invalid world configuration: {0}")]
    InvalidConfig(&'static str),
}
