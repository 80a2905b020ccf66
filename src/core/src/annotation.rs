//! Freehand annotation overlay drawn above the captured content.
//!
//! - [`AnnotationSurface`]: tool state, pointer handling and listener
//!   bookkeeping for one drawing element.
//! - [`geometry`]: pure planning of the primitives each tool draws.
//! - [`RasterCanvas`]: an in-memory RGBA [`DrawingSurface`].

/// Submodule for planning the primitives each tool draws.
pub mod geometry;
/// Submodule for the in-memory RGBA drawing surface.
pub mod raster_canvas;
/// Submodule for the annotation surface and its pointer handlers.
pub mod surface;
/// Submodule for annotation state, colours and shapes.
pub mod types;

pub use geometry::{AnnotationStyle, DrawCommand};
pub use raster_canvas::RasterCanvas;
pub use surface::{AnnotationSurface, PointerPhase};
pub use types::{AnnotationState, Color, DrawingSurface, Point, Rect, Segment, StrokeStyle, Tool};
