//! Value types shared by the annotation subsystem.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Drawing tool selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Pen,
    Arrow,
    Rectangle,
    Highlight,
}

impl Tool {
    pub const ALL: [Tool; 4] = [Tool::Pen, Tool::Arrow, Tool::Rectangle, Tool::Highlight];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::Pen => "pen",
            Tool::Arrow => "arrow",
            Tool::Rectangle => "rectangle",
            Tool::Highlight => "highlight",
        }
    }

    /// Shapes redrawn from the press position on every move instead of
    /// accumulating segments.
    pub fn is_anchored(&self) -> bool {
        matches!(self, Tool::Rectangle | Tool::Highlight)
    }
}

impl Default for Tool {
    fn default() -> Self {
        Tool::Pen
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pen" => Ok(Tool::Pen),
            "arrow" => Ok(Tool::Arrow),
            "rectangle" => Ok(Tool::Rectangle),
            "highlight" => Ok(Tool::Highlight),
            other => Err(format!("unknown annotation tool '{}'", other)),
        }
    }
}

/// RGBA colour, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const TRANSPARENT: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b, a: 255 }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

impl FromStr for Color {
    type Err = String;

    /// Accepts `#rgb`, `#rrggbb`, `#rrggbbaa` and a handful of CSS names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "black" => return Ok(Color::BLACK),
            "white" => return Ok(Color::WHITE),
            "red" => return Ok(Color::RED),
            "green" => return Ok(Color::rgb(0, 128, 0)),
            "blue" => return Ok(Color::rgb(0, 0, 255)),
            "yellow" => return Ok(Color::rgb(255, 255, 0)),
            "orange" => return Ok(Color::rgb(255, 165, 0)),
            "transparent" => return Ok(Color::TRANSPARENT),
            _ => {}
        }

        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| format!("unsupported colour '{}'", s))?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("invalid hex colour '{}'", s));
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| e.to_string());
        let short = |i: usize| {
            u8::from_str_radix(&hex[i..i + 1], 16)
                .map(|v| v * 17)
                .map_err(|e| e.to_string())
        };
        match hex.len() {
            3 => Ok(Color::rgb(short(0)?, short(1)?, short(2)?)),
            6 => Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Ok(Color {
                r: channel(0)?,
                g: channel(2)?,
                b: channel(4)?,
                a: channel(6)?,
            }),
            _ => Err(format!("invalid hex colour length '{}'", s)),
        }
    }
}

/// Position in surface pixels (the event's offset within the element).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
}

/// Axis-aligned rectangle; width and height may be negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn from_corners(a: Point, b: Point) -> Self {
        Rect {
            x: a.x,
            y: a.y,
            width: b.x - a.x,
            height: b.y - a.y,
        }
    }

    /// Same rectangle with non-negative extent.
    pub fn normalized(&self) -> Rect {
        Rect {
            x: self.x.min(self.x + self.width),
            y: self.y.min(self.y + self.height),
            width: self.width.abs(),
            height: self.height.abs(),
        }
    }

    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.x, self.y),
            Point::new(self.x + self.width, self.y),
            Point::new(self.x + self.width, self.y + self.height),
            Point::new(self.x, self.y + self.height),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Color,
    pub width: f64,
}

/// Tool, colour and pointer tracking of the overlay.
///
/// Every transition returns a new value; the surface swaps its state only
/// from its pointer and tool operations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotationState {
    pub tool: Tool,
    pub color: Color,
    /// Last known pointer position.
    pub cursor: Point,
    /// Where the current stroke started.
    pub anchor: Point,
    pub is_drawing: bool,
}

impl AnnotationState {
    pub fn new(tool: Tool, color: Color) -> Self {
        Self {
            tool,
            color,
            cursor: Point::default(),
            anchor: Point::default(),
            is_drawing: false,
        }
    }

    /// Switching tools ends any stroke in progress.
    pub fn with_tool(self, tool: Tool) -> Self {
        Self {
            tool,
            is_drawing: false,
            ..self
        }
    }

    pub fn with_color(self, color: Color) -> Self {
        Self { color, ..self }
    }

    pub fn pressed(self, at: Point) -> Self {
        Self {
            cursor: at,
            anchor: at,
            is_drawing: true,
            ..self
        }
    }

    pub fn moved(self, to: Point) -> Self {
        Self { cursor: to, ..self }
    }

    pub fn released(self) -> Self {
        Self {
            is_drawing: false,
            ..self
        }
    }
}

impl Default for AnnotationState {
    fn default() -> Self {
        AnnotationState::new(Tool::default(), Color::default())
    }
}

/// A 2-D raster the overlay draws on.
pub trait DrawingSurface {
    /// Resizes the backing raster. Resizing discards the current pixels.
    fn resize(&mut self, width: u32, height: u32);

    fn dimensions(&self) -> (u32, u32);

    fn set_visible(&mut self, visible: bool);

    fn is_visible(&self) -> bool;

    fn stroke_segments(&mut self, segments: &[Segment], stroke: &StrokeStyle);

    fn stroke_rect(&mut self, rect: Rect, stroke: &StrokeStyle);

    fn fill_rect(&mut self, rect: Rect, color: Color, alpha: f32);

    fn clear(&mut self);

    /// Remembers the current pixels so a later [`DrawingSurface::rollback`]
    /// can restore them.
    fn checkpoint(&mut self);

    /// Restores the pixels of the last checkpoint, keeping the checkpoint.
    fn rollback(&mut self);

    fn discard_checkpoint(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colours_parse_from_hex_and_names() {
        assert_eq!("#f00".parse::<Color>().unwrap(), Color::RED);
        assert_eq!("#00ff00".parse::<Color>().unwrap(), Color::rgb(0, 255, 0));
        assert_eq!(
            "#0000ff80".parse::<Color>().unwrap(),
            Color {
                r: 0,
                g: 0,
                b: 255,
                a: 128
            }
        );
        assert_eq!("Black".parse::<Color>().unwrap(), Color::BLACK);
        assert!("#12345".parse::<Color>().is_err());
        assert!("#gg0000".parse::<Color>().is_err());
        assert!("chartreuse-ish".parse::<Color>().is_err());
    }

    #[test]
    fn colour_display_round_trips_through_parse() {
        let c = Color {
            r: 18,
            g: 52,
            b: 86,
            a: 120,
        };
        assert_eq!(c.to_string(), "#12345678");
        assert_eq!(Color::RED.to_string(), "#ff0000");
    }

    #[test]
    fn tools_parse_their_selector_names() {
        for tool in Tool::ALL {
            assert_eq!(tool.as_str().parse::<Tool>().unwrap(), tool);
        }
        assert!("eraser".parse::<Tool>().is_err());
    }

    #[test]
    fn tool_change_ends_the_stroke() {
        let state = AnnotationState::default().pressed(Point::new(4.0, 4.0));
        assert!(state.is_drawing);
        let switched = state.with_tool(Tool::Rectangle);
        assert!(!switched.is_drawing);
        assert_eq!(switched.tool, Tool::Rectangle);
        assert_eq!(switched.cursor, Point::new(4.0, 4.0));
    }

    #[test]
    fn negative_rectangles_normalize() {
        let r = Rect::from_corners(Point::new(10.0, 10.0), Point::new(2.0, 4.0)).normalized();
        assert_eq!(
            r,
            Rect {
                x: 2.0,
                y: 4.0,
                width: 8.0,
                height: 6.0
            }
        );
    }
}
