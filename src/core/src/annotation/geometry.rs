//! Primitive planning for each annotation tool.
//!
//! Planning is pure: given the current [`AnnotationState`] and the new pointer
//! position it returns the [`DrawCommand`] to paint. Pen and arrow join the
//! last cursor position to the new one; rectangle and highlight span the
//! press position and the new one and replace their previous preview.

use std::f64::consts::PI;

use super::types::{AnnotationState, Color, DrawingSurface, Point, Rect, Segment, StrokeStyle, Tool};

/// Drawing constants of the overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotationStyle {
    pub line_width: f64,
    pub arrow_head_length: f64,
    /// Angle between the shaft and each head segment, in radians.
    pub arrow_head_angle: f64,
    pub highlight_alpha: f32,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            line_width: 1.0,
            arrow_head_length: 10.0,
            arrow_head_angle: PI / 6.0,
            highlight_alpha: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Line {
        segment: Segment,
        stroke: StrokeStyle,
    },
    Arrow {
        shaft: Segment,
        head: [Segment; 2],
        stroke: StrokeStyle,
    },
    Rectangle {
        rect: Rect,
        stroke: StrokeStyle,
    },
    Highlight {
        rect: Rect,
        color: Color,
        alpha: f32,
    },
}

impl DrawCommand {
    pub fn tool(&self) -> Tool {
        match self {
            DrawCommand::Line { .. } => Tool::Pen,
            DrawCommand::Arrow { .. } => Tool::Arrow,
            DrawCommand::Rectangle { .. } => Tool::Rectangle,
            DrawCommand::Highlight { .. } => Tool::Highlight,
        }
    }

    /// Paints the command. Anchored shapes first restore the pixels saved
    /// when the stroke started.
    pub fn apply(&self, surface: &mut dyn DrawingSurface) {
        match self {
            DrawCommand::Line { segment, stroke } => {
                surface.stroke_segments(std::slice::from_ref(segment), stroke)
            }
            DrawCommand::Arrow {
                shaft,
                head,
                stroke,
            } => {
                let path = [*shaft, head[0], head[1]];
                surface.stroke_segments(&path, stroke)
            }
            DrawCommand::Rectangle { rect, stroke } => {
                surface.rollback();
                surface.stroke_rect(*rect, stroke)
            }
            DrawCommand::Highlight { rect, color, alpha } => {
                surface.rollback();
                surface.fill_rect(*rect, *color, *alpha)
            }
        }
    }
}

/// Plans the primitive for a move to `to`. Returns `None` outside a stroke.
pub fn plan(state: &AnnotationState, to: Point, style: &AnnotationStyle) -> Option<DrawCommand> {
    if !state.is_drawing {
        return None;
    }
    let stroke = StrokeStyle {
        color: state.color,
        width: style.line_width,
    };
    let command = match state.tool {
        Tool::Pen => DrawCommand::Line {
            segment: Segment {
                from: state.cursor,
                to,
            },
            stroke,
        },
        Tool::Arrow => DrawCommand::Arrow {
            shaft: Segment {
                from: state.cursor,
                to,
            },
            head: arrow_head(state.cursor, to, style),
            stroke,
        },
        Tool::Rectangle => DrawCommand::Rectangle {
            rect: Rect::from_corners(state.anchor, to),
            stroke,
        },
        Tool::Highlight => DrawCommand::Highlight {
            rect: Rect::from_corners(state.anchor, to),
            color: state.color,
            alpha: style.highlight_alpha,
        },
    };
    Some(command)
}

/// The two head segments of an arrow pointing from `from` to `to`.
pub fn arrow_head(from: Point, to: Point, style: &AnnotationStyle) -> [Segment; 2] {
    let angle = (to.y - from.y).atan2(to.x - from.x);
    let wing = |offset: f64| Segment {
        from: to,
        to: Point::new(
            to.x - style.arrow_head_length * (angle + offset).cos(),
            to.y - style.arrow_head_length * (angle + offset).sin(),
        ),
    };
    [wing(-style.arrow_head_angle), wing(style.arrow_head_angle)]
}
