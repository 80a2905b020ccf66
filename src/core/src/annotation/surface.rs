use log::{debug, info, warn};

use crate::error_handling::types::ListenerError;
use crate::listener_registry::{BindingKey, ElementHost, ElementId, EventKind, ListenerRegistry, ScopeToken};

use super::geometry::{self, AnnotationStyle, DrawCommand};
use super::types::{AnnotationState, Color, DrawingSurface, Point, Tool};

/// The three pointer events the overlay listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

impl PointerPhase {
    pub const ALL: [PointerPhase; 3] = [PointerPhase::Down, PointerPhase::Move, PointerPhase::Up];

    pub fn event(&self) -> EventKind {
        match self {
            PointerPhase::Down => EventKind::PointerDown,
            PointerPhase::Move => EventKind::PointerMove,
            PointerPhase::Up => EventKind::PointerUp,
        }
    }
}

/// Drawing overlay bound to one page element.
///
/// While attached, pointer input drives [`AnnotationState`] and paints on the
/// underlying [`DrawingSurface`]. Detaching removes the listeners it added,
/// clears every pixel and hides the element. The selected tool and colour
/// persist across attachments.
pub struct AnnotationSurface {
    canvas: Box<dyn DrawingSurface>,
    element: ElementId,
    style: AnnotationStyle,
    state: AnnotationState,
    bindings: Vec<BindingKey>,
    attached: bool,
}

impl AnnotationSurface {
    pub fn new(
        canvas: Box<dyn DrawingSurface>,
        element: ElementId,
        style: AnnotationStyle,
        tool: Tool,
        color: Color,
    ) -> Self {
        Self {
            canvas,
            element,
            style,
            state: AnnotationState::new(tool, color),
            bindings: Vec::new(),
            attached: false,
        }
    }

    /// Sizes the surface to the viewport, shows it and registers the pointer
    /// handlers under `scope`.
    ///
    /// Returns `Ok(false)` when the page has no drawing element; the session
    /// then runs without annotations. A failed registration removes the
    /// handlers added so far before returning the error.
    pub fn attach<H: Clone>(
        &mut self,
        registry: &mut ListenerRegistry<H>,
        host: &mut dyn ElementHost,
        scope: ScopeToken,
        handler_for: impl Fn(PointerPhase) -> H,
    ) -> Result<bool, ListenerError> {
        if self.attached {
            debug!("Annotation surface '{}' already attached", self.element);
            return Ok(true);
        }
        if !host.has_element(&self.element) {
            warn!("Drawing element '{}' not found, annotations disabled", self.element);
            return Ok(false);
        }

        for phase in PointerPhase::ALL {
            match registry.attach(host, scope, &self.element, phase.event(), handler_for(phase)) {
                Ok(key) => self.bindings.push(key),
                Err(e) => {
                    for key in self.bindings.drain(..) {
                        registry.detach(host, key);
                    }
                    return Err(e);
                }
            }
        }

        let viewport = host.viewport();
        self.canvas.resize(viewport.width, viewport.height);
        self.canvas.set_visible(true);
        self.state = self.state.released();
        self.attached = true;
        info!(
            "Annotation surface '{}' attached at {}x{} with tool {}",
            self.element, viewport.width, viewport.height, self.state.tool
        );
        Ok(true)
    }

    /// Removes the handlers added by [`AnnotationSurface::attach`], clears the
    /// pixels and hides the surface. Returns the number of handlers removed.
    pub fn detach<H: Clone>(
        &mut self,
        registry: &mut ListenerRegistry<H>,
        host: &mut dyn ElementHost,
    ) -> usize {
        let removed = self
            .bindings
            .drain(..)
            .filter(|key| registry.detach(host, *key))
            .count();

        self.state = self.state.released();
        self.canvas.discard_checkpoint();
        self.canvas.clear();
        self.canvas.set_visible(false);
        if self.attached {
            info!(
                "Annotation surface '{}' detached ({} listener(s) removed)",
                self.element, removed
            );
        }
        self.attached = false;
        removed
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn element(&self) -> &ElementId {
        &self.element
    }

    pub fn listener_count(&self) -> usize {
        self.bindings.len()
    }

    pub fn state(&self) -> AnnotationState {
        self.state
    }

    pub fn canvas(&self) -> &dyn DrawingSurface {
        self.canvas.as_ref()
    }

    pub fn pointer_down(&mut self, at: Point) {
        if !self.attached {
            return;
        }
        self.state = self.state.pressed(at);
        if self.state.tool.is_anchored() {
            self.canvas.checkpoint();
        }
    }

    /// Paints the primitive of the current tool and returns it.
    pub fn pointer_move(&mut self, to: Point) -> Option<DrawCommand> {
        if !self.attached {
            return None;
        }
        let command = geometry::plan(&self.state, to, &self.style)?;
        command.apply(self.canvas.as_mut());
        self.state = self.state.moved(to);
        Some(command)
    }

    pub fn pointer_up(&mut self) {
        self.state = self.state.released();
        self.canvas.discard_checkpoint();
    }

    /// Selects `tool`. A stroke in progress ends here.
    pub fn set_tool(&mut self, tool: Tool) {
        if self.state.is_drawing {
            debug!("Tool switched to {} mid-stroke, ending stroke", tool);
        }
        self.state = self.state.with_tool(tool);
        self.canvas.discard_checkpoint();
    }

    pub fn set_color(&mut self, color: Color) {
        self.state = self.state.with_color(color);
    }

    /// Erases every annotation. An anchored preview in progress continues
    /// from the cleared surface.
    pub fn clear(&mut self) {
        self.canvas.clear();
        if self.state.is_drawing && self.state.tool.is_anchored() {
            self.canvas.checkpoint();
        }
    }
}
