//! Canvas signature drawing script
//!
//! The script is data rather than code so that every provider replays exactly
//! the same instruction sequence. Pixel output still differs between hosts
//! because font rasterization, GPU driver and anti-aliasing differ; that
//! difference is the signal.

use fid_error::Result;

use crate::constants::canvas::{FONT, GRADIENT_TEXT, HEIGHT, PRIMARY_TEXT, WIDTH};

/// Text baseline alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextBaseline {
    Top,
    Middle,
    Alphabetic,
    Bottom,
}

/// Fill style for subsequent fill operations
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Paint {
    /// CSS colour string, e.g. "#069" or "rgba(255, 0, 255, 0.7)"
    Color(&'static str),
    /// Horizontal or diagonal linear gradient with (offset, colour) stops
    LinearGradient {
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        stops: &'static [(f64, &'static str)],
    },
}

/// One drawing instruction
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawOp {
    SetFill(Paint),
    FillRect { x: f64, y: f64, width: f64, height: f64 },
    SetFont(&'static str),
    SetTextBaseline(TextBaseline),
    FillText { text: &'static str, x: f64, y: f64 },
    BeginPath,
    Arc {
        x: f64,
        y: f64,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        anticlockwise: bool,
    },
    ClosePath,
    Fill,
}

/// Offscreen 2D bitmap provided by the host
pub trait DrawingSurface: Send {
    fn draw(&mut self, op: &DrawOp) -> Result<()>;

    /// Lossless serialization of the current bitmap (e.g. a PNG data URL)
    fn encode(&self) -> Result<String>;
}

const GRADIENT_STOPS: &[(f64, &str)] = &[(0.0, "magenta"), (0.5, "blue"), (1.0, "red")];

/// Fixed signature script, drawn on a [`WIDTH`]x[`HEIGHT`] surface
pub const CANVAS_SCRIPT: &[DrawOp] = &[
    DrawOp::SetFill(Paint::Color("#f0f0f0")),
    DrawOp::FillRect { x: 0.0, y: 0.0, width: WIDTH as f64, height: HEIGHT as f64 },
    DrawOp::SetTextBaseline(TextBaseline::Alphabetic),
    DrawOp::SetFont(FONT),
    DrawOp::SetFill(Paint::Color("#069")),
    DrawOp::FillText { text: PRIMARY_TEXT, x: 5.0, y: 25.0 },
    DrawOp::SetFill(Paint::Color("rgba(255, 0, 255, 0.7)")),
    DrawOp::FillRect { x: 10.0, y: 30.0, width: 75.0, height: 15.0 },
    DrawOp::SetFill(Paint::Color("rgba(0, 255, 0, 0.6)")),
    DrawOp::BeginPath,
    DrawOp::Arc {
        x: 150.0,
        y: 30.0,
        radius: 15.0,
        start_angle: 0.0,
        end_angle: std::f64::consts::TAU,
        anticlockwise: true,
    },
    DrawOp::ClosePath,
    DrawOp::Fill,
    DrawOp::SetFill(Paint::LinearGradient {
        x0: 0.0,
        y0: 0.0,
        x1: WIDTH as f64,
        y1: 0.0,
        stops: GRADIENT_STOPS,
    }),
    DrawOp::FillText { text: GRADIENT_TEXT, x: 5.0, y: 50.0 },
];

/// Replays [`CANVAS_SCRIPT`] on `surface` and returns its encoding
pub fn render_signature_source(surface: &mut dyn DrawingSurface) -> Result<String> {
    for op in CANVAS_SCRIPT {
        surface.draw(op)?;
    }
    surface.encode()
}
