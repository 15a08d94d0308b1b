//! Rasterizer error type

use thiserror::Error;

/// Errors raised by the pipeline
///
/// `DegenerateGeometry` is recovered locally (the triangle is dropped);
/// `Domain` and `Config` are setup-time failures raised before any frame.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RasterError {
    /// Camera or projection parameters outside their domain
    #[error("domain error: {0}")]
    Domain(String),

    /// Zero-area triangle in screen space
    #[error("degenerate triangle (zero screen-space area)")]
    DegenerateGeometry,

    /// An index points past the end of the sequence it indexes
    #[error("index {index} out of range for {len} {what}")]
    IndexOutOfRange {
        index: usize,
        len: usize,
        what: &'static str,
    },

    /// Mesh arrays disagree in length or shape
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    /// Renderer configuration rejected at setup
    #[error("invalid render config: {0}")]
    Config(String),
}
