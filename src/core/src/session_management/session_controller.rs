use std::cell::{Cell, RefCell};

use log::{debug, error, info, trace, warn};

use crate::annotation::{AnnotationState, AnnotationSurface, Color, DrawCommand, DrawingSurface, Point, Tool};
use crate::capture::{CaptureConstraints, CaptureResource, CaptureService, CursorVisibility};
use crate::configuration::Config;
use crate::error_handling::types::{RecordingError, SessionError};
use crate::listener_registry::{ElementHost, ElementId, EventKind, ListenerRegistry, ScopeToken};
use crate::recording::{DownloadTarget, RecorderService, RecordingOutcome, RecordingSettings, RecordingSink};
use crate::session_management::active_session::ActiveSession;
use crate::session_management::controls::{self, Action};
use crate::session_management::session::Session;
use crate::session_management::SessionStatus;

/// Host backends driven by a [`SessionController`].
pub struct HostServices {
    pub capture: Box<dyn CaptureService>,
    pub recorders: Box<dyn RecorderService>,
    pub document: Box<dyn ElementHost>,
    pub canvas: Box<dyn DrawingSurface>,
    pub downloads: Box<dyn DownloadTarget>,
}

#[derive(Default)]
struct SessionCallbacks {
    on_start: Option<Box<dyn FnMut()>>,
    on_stop: Option<Box<dyn FnMut()>>,
    on_recording_change: Option<Box<dyn FnMut(bool)>>,
}

/// Settled state and the resources it owns.
enum Phase {
    Idle,
    Sharing(ActiveSession),
    // `sink` is declared first so it drops, and stops its recorder, before
    // the capture it reads from is released.
    Recording {
        sink: RecordingSink,
        active: ActiveSession,
    },
}

/// Holds the reentrancy flag for the duration of one transition.
struct TransitionGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> TransitionGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            None
        } else {
            Some(Self { flag })
        }
    }
}

impl Drop for TransitionGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

/// The capture-and-annotate session state machine.
///
/// The controller owns at most one live session and every resource it holds:
/// the capture stream, the drawing overlay's listeners and the recorder.
/// `start`, `stop` and `toggle_recording` run to completion one at a time;
/// a request arriving while another is in flight is dropped. None of them
/// reports errors: failures are logged and the controller settles on a
/// consistent state the user can retry from.
///
/// All methods take `&self` and the futures are `!Send`. Run them on a
/// current-thread runtime or a `LocalSet`.
pub struct SessionController {
    capture: Box<dyn CaptureService>,
    recorders: Box<dyn RecorderService>,
    document: RefCell<Box<dyn ElementHost>>,
    downloads: RefCell<Box<dyn DownloadTarget>>,
    surface: RefCell<AnnotationSurface>,
    registry: RefCell<ListenerRegistry<Action>>,
    phase: RefCell<Phase>,
    transitioning: Cell<bool>,
    callbacks: RefCell<SessionCallbacks>,
    control_scope: Cell<Option<ScopeToken>>,
    constraints: CaptureConstraints,
    recording_settings: RecordingSettings,
    last_session: RefCell<Option<Session>>,
    last_recording: RefCell<Option<RecordingOutcome>>,
}

impl SessionController {
    /// Builds an idle controller and binds the page controls that exist.
    pub fn new(config: &Config, services: HostServices) -> Result<Self, SessionError> {
        let HostServices {
            capture,
            recorders,
            mut document,
            canvas,
            downloads,
        } = services;

        let color = config.stroke_color().unwrap_or_else(|e| {
            warn!("{}, falling back to the default stroke colour", e);
            Color::default()
        });
        let mut constraints = config.capture_constraints();
        if constraints.cursor != CursorVisibility::Always {
            warn!(
                "Cursor visibility {:?} is not supported, capturing with the cursor shown",
                constraints.cursor
            );
            constraints.cursor = CursorVisibility::Always;
        }
        let surface = AnnotationSurface::new(
            canvas,
            ElementId::new(config.elements.canvas.as_str()),
            config.annotation_style(),
            config.annotation.default_tool,
            color,
        );

        let mut registry = ListenerRegistry::new();
        let control_scope = registry.open_scope();
        if let Err(e) = controls::bind_controls(&mut registry, &mut *document, control_scope, &config.elements) {
            registry.release_scope(&mut *document, control_scope);
            return Err(e.into());
        }
        info!("Session controller ready ({} control listener(s))", registry.len());

        Ok(Self {
            capture,
            recorders,
            document: RefCell::new(document),
            downloads: RefCell::new(downloads),
            surface: RefCell::new(surface),
            registry: RefCell::new(registry),
            phase: RefCell::new(Phase::Idle),
            transitioning: Cell::new(false),
            callbacks: RefCell::new(SessionCallbacks::default()),
            control_scope: Cell::new(Some(control_scope)),
            constraints,
            recording_settings: config.recording_settings(),
            last_session: RefCell::new(None),
            last_recording: RefCell::new(None),
        })
    }

    pub fn status(&self) -> SessionStatus {
        if self.transitioning.get() {
            return SessionStatus::Transitioning;
        }
        match &*self.phase.borrow() {
            Phase::Idle => SessionStatus::Idle,
            Phase::Sharing(_) => SessionStatus::Sharing,
            Phase::Recording { .. } => SessionStatus::Recording,
        }
    }

    pub fn is_transitioning(&self) -> bool {
        self.transitioning.get()
    }

    /// Called after a session starts sharing.
    pub fn on_start(&self, callback: impl FnMut() + 'static) {
        self.callbacks.borrow_mut().on_start = Some(Box::new(callback));
    }

    /// Called after a session has been fully torn down.
    pub fn on_stop(&self, callback: impl FnMut() + 'static) {
        self.callbacks.borrow_mut().on_stop = Some(Box::new(callback));
    }

    /// Called with the new recording flag after each recording edge.
    pub fn on_recording_change(&self, callback: impl FnMut(bool) + 'static) {
        self.callbacks.borrow_mut().on_recording_change = Some(Box::new(callback));
    }

    /// Acquires a capture stream and attaches the drawing overlay.
    ///
    /// Ignored while a transition is in flight or a session is already live.
    /// A refused or failed acquisition leaves the controller idle.
    pub async fn start(&self) {
        let Some(_guard) = TransitionGuard::enter(&self.transitioning) else {
            debug!("Start ignored, a transition is in progress");
            return;
        };
        if !matches!(*self.phase.borrow(), Phase::Idle) {
            debug!("Start ignored, a session is already live");
            return;
        }

        info!("Starting screen share");
        match self.open_session().await {
            Ok(active) => {
                info!("Screen share started (session {})", active.session.id);
                *self.phase.borrow_mut() = Phase::Sharing(active);
                self.notify_start();
            }
            Err(e) => error!("Unable to start screen share: {}", e),
        }
    }

    /// Tears the live session down: recording first, then the overlay, the
    /// capture tracks and finally any listener left in the session scope.
    ///
    /// A no-op when idle or while another transition is in flight.
    pub async fn stop(&self) {
        let Some(_guard) = TransitionGuard::enter(&self.transitioning) else {
            debug!("Stop ignored, a transition is in progress");
            return;
        };

        let phase = std::mem::replace(&mut *self.phase.borrow_mut(), Phase::Idle);
        let active = match phase {
            Phase::Idle => {
                debug!("Stop ignored, no session is live");
                return;
            }
            Phase::Sharing(active) => active,
            Phase::Recording { sink, active } => {
                let active = self.finish_recording(sink, active).await;
                self.notify_recording_change(false);
                active
            }
        };

        self.close_session(active);
        self.notify_stop();
    }

    /// Starts recording the live capture, or stops the current recording and
    /// delivers its artifact.
    ///
    /// Ignored when idle or while another transition is in flight.
    pub async fn toggle_recording(&self) {
        let Some(_guard) = TransitionGuard::enter(&self.transitioning) else {
            debug!("Recording toggle ignored, a transition is in progress");
            return;
        };

        let phase = std::mem::replace(&mut *self.phase.borrow_mut(), Phase::Idle);
        match phase {
            Phase::Idle => debug!("Recording toggle ignored, no session is live"),
            Phase::Sharing(active) => {
                let started = match active.capture.stream() {
                    Some(stream) => {
                        RecordingSink::start(self.recorders.as_ref(), stream, self.recording_settings.clone())
                    }
                    None => Err(RecordingError::RecorderUnavailable(
                        "capture stream already released".to_string(),
                    )),
                };
                match started {
                    Ok(sink) => {
                        *self.phase.borrow_mut() = Phase::Recording { sink, active };
                        self.notify_recording_change(true);
                    }
                    Err(e) => {
                        error!("Unable to start recording: {}", e);
                        *self.phase.borrow_mut() = Phase::Sharing(active);
                    }
                }
            }
            Phase::Recording { sink, active } => {
                let active = self.finish_recording(sink, active).await;
                *self.phase.borrow_mut() = Phase::Sharing(active);
                self.notify_recording_change(false);
            }
        }
    }

    /// The host ended the capture (permission revoked, shared window
    /// closed). Tears the session down like [`SessionController::stop`].
    pub async fn capture_ended(&self) {
        if self.transitioning.get() {
            warn!("Capture ended during a transition, teardown left to the caller");
            return;
        }
        if self.status().is_live() {
            info!("Capture ended by the host, stopping session");
        }
        self.stop().await;
    }

    /// Routes an input event to the action bound on `target`.
    ///
    /// Returns `false` when nothing is bound for `(target, event)`.
    pub async fn dispatch(&self, target: &ElementId, event: EventKind, pointer: Option<Point>) -> bool {
        let action = match self.registry.borrow().lookup(target, event) {
            Some(binding) => binding.handler,
            None => {
                trace!("No listener for '{}' on '{}'", event, target);
                return false;
            }
        };

        match action {
            Action::StartSharing => self.start().await,
            Action::StopSharing => self.stop().await,
            Action::ToggleRecording => self.toggle_recording().await,
            Action::SelectTool(tool) => self.set_tool(tool),
            Action::PointerDown => {
                if let Some(at) = pointer {
                    self.pointer_down(at);
                }
            }
            Action::PointerMove => {
                if let Some(to) = pointer {
                    self.pointer_move(to);
                }
            }
            Action::PointerUp => self.pointer_up(),
        }
        true
    }

    pub fn pointer_down(&self, at: Point) {
        self.surface.borrow_mut().pointer_down(at);
    }

    /// Draws with the current tool and returns what was drawn.
    pub fn pointer_move(&self, to: Point) -> Option<DrawCommand> {
        self.surface.borrow_mut().pointer_move(to)
    }

    pub fn pointer_up(&self) {
        self.surface.borrow_mut().pointer_up();
    }

    pub fn set_tool(&self, tool: Tool) {
        debug!("Tool set to {}", tool);
        self.surface.borrow_mut().set_tool(tool);
    }

    pub fn set_color(&self, color: Color) {
        self.surface.borrow_mut().set_color(color);
    }

    pub fn clear_annotations(&self) {
        self.surface.borrow_mut().clear();
    }

    pub fn annotation_state(&self) -> AnnotationState {
        self.surface.borrow().state()
    }

    pub fn is_annotating(&self) -> bool {
        self.surface.borrow().is_attached()
    }

    /// Runs `f` against the drawing surface.
    pub fn with_canvas<R>(&self, f: impl FnOnce(&dyn DrawingSurface) -> R) -> R {
        f(self.surface.borrow().canvas())
    }

    /// Fragments buffered by the active recording, zero when not recording.
    pub fn recorded_chunk_count(&self) -> usize {
        match &mut *self.phase.borrow_mut() {
            Phase::Recording { sink, .. } => sink.chunk_count(),
            _ => 0,
        }
    }

    /// Live bindings across all scopes, page controls included.
    pub fn listener_count(&self) -> usize {
        self.registry.borrow().len()
    }

    /// Pointer listeners held by the drawing overlay.
    pub fn surface_listener_count(&self) -> usize {
        self.surface.borrow().listener_count()
    }

    /// Metadata of the live session.
    pub fn session(&self) -> Option<Session> {
        match &*self.phase.borrow() {
            Phase::Idle => None,
            Phase::Sharing(active) | Phase::Recording { active, .. } => Some(active.session.clone()),
        }
    }

    /// Metadata of the most recently closed session.
    pub fn last_session(&self) -> Option<Session> {
        self.last_session.borrow().clone()
    }

    pub fn last_recording(&self) -> Option<RecordingOutcome> {
        self.last_recording.borrow().clone()
    }

    /// Stops any live session and removes the page-control listeners.
    ///
    /// The controller ignores control clicks afterwards.
    pub async fn shutdown(&self) {
        self.stop().await;
        if self.status() != SessionStatus::Idle {
            warn!("Shutting down with a session in state {}", self.status());
        }
        if let Some(scope) = self.control_scope.take() {
            let removed = self
                .registry
                .borrow_mut()
                .release_scope(&mut **self.document.borrow_mut(), scope);
            info!("Controller shut down, {} control listener(s) removed", removed);
        }
    }

    async fn open_session(&self) -> Result<ActiveSession, SessionError> {
        let capture = CaptureResource::acquire(self.capture.as_ref(), self.constraints).await?;

        let mut registry = self.registry.borrow_mut();
        let mut document = self.document.borrow_mut();
        let scope = registry.open_scope();
        let attached = self
            .surface
            .borrow_mut()
            .attach(&mut *registry, &mut **document, scope, Action::from);

        match attached {
            Ok(annotations) => Ok(ActiveSession {
                session: Session::new(scope, annotations),
                capture,
            }),
            Err(e) => {
                registry.release_scope(&mut **document, scope);
                Err(e.into())
            }
        }
    }

    async fn finish_recording(&self, mut sink: RecordingSink, mut active: ActiveSession) -> ActiveSession {
        match sink.stop(&self.downloads).await {
            Ok(outcome) => {
                active.session.recordings += 1;
                match &outcome.download {
                    Some(receipt) => info!(
                        "Recording delivered as {} ({} bytes, {} fragment(s))",
                        receipt.file_name, receipt.bytes, receipt.chunk_count
                    ),
                    None => info!("Recording stopped without data, nothing to download"),
                }
                *self.last_recording.borrow_mut() = Some(outcome);
            }
            Err(e) => error!("Unable to deliver recording: {}", e),
        }
        active
    }

    fn close_session(&self, mut active: ActiveSession) {
        let (removed, leftover) = {
            let mut registry = self.registry.borrow_mut();
            let mut document = self.document.borrow_mut();
            let removed = self.surface.borrow_mut().detach(&mut *registry, &mut **document);
            let stopped = active.capture.release();
            debug!("Stopped {} capture track(s)", stopped);
            let leftover = registry.release_scope(&mut **document, active.session.scope);
            (removed, leftover)
        };
        if leftover > 0 {
            warn!(
                "Removed {} stray listener(s) left by session {}",
                leftover, active.session.id
            );
        }
        info!(
            "Screen share stopped (session {}, {} listener(s) removed)",
            active.session.id,
            removed + leftover
        );
        *self.last_session.borrow_mut() = Some(active.session.clone());
    }

    fn notify_start(&self) {
        let callback = self.callbacks.borrow_mut().on_start.take();
        if let Some(mut callback) = callback {
            callback();
            let mut callbacks = self.callbacks.borrow_mut();
            if callbacks.on_start.is_none() {
                callbacks.on_start = Some(callback);
            }
        }
    }

    fn notify_stop(&self) {
        let callback = self.callbacks.borrow_mut().on_stop.take();
        if let Some(mut callback) = callback {
            callback();
            let mut callbacks = self.callbacks.borrow_mut();
            if callbacks.on_stop.is_none() {
                callbacks.on_stop = Some(callback);
            }
        }
    }

    fn notify_recording_change(&self, recording: bool) {
        let callback = self.callbacks.borrow_mut().on_recording_change.take();
        if let Some(mut callback) = callback {
            callback(recording);
            let mut callbacks = self.callbacks.borrow_mut();
            if callbacks.on_recording_change.is_none() {
                callbacks.on_recording_change = Some(callback);
            }
        }
    }
}
