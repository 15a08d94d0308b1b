//! Alpha blending for transparent geometry

use serde::{Serialize, Deserialize};

use super::types::Color;

/// Source/destination weight selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlendMode {
    Zero,
    One,
    SrcAlpha,
    DstAlpha,
    OneMinusSrcAlpha,
    OneMinusDstAlpha,
}

impl BlendMode {
    /// Resolve to a scalar weight for the given source and destination alpha
    pub fn weight(self, src_alpha: f32, dst_alpha: f32) -> f32 {
        match self {
            BlendMode::Zero => 0.0,
            BlendMode::One => 1.0,
            BlendMode::SrcAlpha => src_alpha,
            BlendMode::DstAlpha => dst_alpha,
            BlendMode::OneMinusSrcAlpha => 1.0 - src_alpha,
            BlendMode::OneMinusDstAlpha => 1.0 - dst_alpha,
        }
    }
}

/// Blend function applied to transparent fragments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlendState {
    pub src: BlendMode,
    pub dst: BlendMode,
}

impl Default for BlendState {
    fn default() -> Self {
        Self::ALPHA
    }
}

impl BlendState {
    /// Plain overwrite
    pub const OPAQUE: BlendState = BlendState { src: BlendMode::One, dst: BlendMode::Zero };
    /// Standard "over" compositing
    pub const ALPHA: BlendState = BlendState {
        src: BlendMode::SrcAlpha,
        dst: BlendMode::OneMinusSrcAlpha,
    };

    /// Composite `src` over the frame-buffer color `dst`
    ///
    /// RGB is `src_weight * src + dst_weight * dst`. Alpha accumulates as
    /// `src.a + dst_weight * dst.a` (capped at 1), so an opaque background
    /// stays opaque under "over" and `One/Zero` reproduces `src` exactly.
    pub fn blend(&self, src: Color, dst: Color) -> Color {
        let sw = self.src.weight(src.a, dst.a);
        let dw = self.dst.weight(src.a, dst.a);
        Color::with_alpha(
            sw * src.r + dw * dst.r,
            sw * src.g + dw * dst.g,
            sw * src.b + dw * dst.b,
            (src.a + dw * dst.a).min(1.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_one_zero_is_overwrite() {
        let src = Color::with_alpha(0.2, 0.4, 0.6, 0.3);
        let dst = Color::with_alpha(0.9, 0.9, 0.1, 1.0);
        assert_eq!(BlendState::OPAQUE.blend(src, dst), src);
    }

    #[test]
    fn test_alpha_over() {
        let src = Color::with_alpha(1.0, 0.0, 0.0, 0.5);
        let dst = Color::with_alpha(0.0, 0.0, 1.0, 1.0);
        let out = BlendState::ALPHA.blend(src, dst);
        assert_abs_diff_eq!(out.r, 0.5);
        assert_abs_diff_eq!(out.g, 0.0);
        assert_abs_diff_eq!(out.b, 0.5);
        assert_abs_diff_eq!(out.a, 1.0);
    }

    #[test]
    fn test_dst_alpha_weights() {
        let src = Color::with_alpha(1.0, 1.0, 1.0, 1.0);
        let dst = Color::with_alpha(0.0, 0.0, 0.0, 0.25);
        let state = BlendState { src: BlendMode::DstAlpha, dst: BlendMode::OneMinusDstAlpha };
        let out = state.blend(src, dst);
        assert_abs_diff_eq!(out.r, 0.25);
    }

    #[test]
    fn test_weights() {
        assert_eq!(BlendMode::Zero.weight(0.3, 0.6), 0.0);
        assert_eq!(BlendMode::One.weight(0.3, 0.6), 1.0);
        assert_eq!(BlendMode::SrcAlpha.weight(0.3, 0.6), 0.3);
        assert_eq!(BlendMode::DstAlpha.weight(0.3, 0.6), 0.6);
        assert_abs_diff_eq!(BlendMode::OneMinusSrcAlpha.weight(0.3, 0.6), 0.7);
        assert_abs_diff_eq!(BlendMode::OneMinusDstAlpha.weight(0.3, 0.6), 0.4);
    }
}
