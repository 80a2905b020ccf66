use log::{debug, warn};

use crate::annotation::{PointerPhase, Tool};
use crate::configuration::ElementConfig;
use crate::error_handling::types::ListenerError;
use crate::listener_registry::{ElementHost, ElementId, EventKind, ListenerRegistry, ScopeToken};

/// Handler payload stored in the listener registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    StartSharing,
    StopSharing,
    ToggleRecording,
    SelectTool(Tool),
    PointerDown,
    PointerMove,
    PointerUp,
}

impl From<PointerPhase> for Action {
    fn from(phase: PointerPhase) -> Self {
        match phase {
            PointerPhase::Down => Action::PointerDown,
            PointerPhase::Move => Action::PointerMove,
            PointerPhase::Up => Action::PointerUp,
        }
    }
}

/// Click targets of the page controls, in binding order.
pub fn control_targets(elements: &ElementConfig) -> Vec<(ElementId, Action)> {
    let mut targets = vec![
        (ElementId::new(elements.start_button.as_str()), Action::StartSharing),
        (ElementId::new(elements.stop_button.as_str()), Action::StopSharing),
        (ElementId::new(elements.record_button.as_str()), Action::ToggleRecording),
    ];
    targets.extend(
        Tool::ALL
            .iter()
            .map(|tool| (elements.tool_selector(*tool), Action::SelectTool(*tool))),
    );
    targets
}

/// Binds a click handler on every control present in the page.
///
/// Missing controls are skipped. On error the bindings made so far stay in
/// `scope`; the caller releases it.
pub fn bind_controls(
    registry: &mut ListenerRegistry<Action>,
    host: &mut dyn ElementHost,
    scope: ScopeToken,
    elements: &ElementConfig,
) -> Result<usize, ListenerError> {
    let mut bound = 0;
    for (target, action) in control_targets(elements) {
        if !host.has_element(&target) {
            match action {
                Action::SelectTool(tool) => debug!("No selector for tool {}", tool),
                _ => warn!("Control '{}' not found, {:?} unavailable", target, action),
            }
            continue;
        }
        registry.attach(host, scope, &target, EventKind::Click, action)?;
        bound += 1;
    }
    debug!("Bound {} page control(s)", bound);
    Ok(bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HeadlessDocument;

    #[test]
    fn selector_ids_use_the_configured_prefix() {
        let targets = control_targets(&ElementConfig::default());
        assert_eq!(targets.len(), 7);
        assert_eq!(targets[3], (ElementId::from("tool-pen"), Action::SelectTool(Tool::Pen)));
        assert_eq!(
            targets[6],
            (ElementId::from("tool-highlight"), Action::SelectTool(Tool::Highlight))
        );
    }

    #[test]
    fn missing_controls_are_skipped() {
        let mut doc = HeadlessDocument::new(800, 600)
            .with_element("startScreenShare")
            .with_element("stopScreenShare")
            .with_element("tool-arrow");
        let mut registry = ListenerRegistry::new();
        let scope = registry.open_scope();

        let bound = bind_controls(&mut registry, &mut doc, scope, &ElementConfig::default()).unwrap();

        assert_eq!(bound, 3);
        assert_eq!(doc.total_listeners(), 3);
        let binding = registry
            .lookup(&ElementId::from("tool-arrow"), EventKind::Click)
            .unwrap();
        assert_eq!(binding.handler, Action::SelectTool(Tool::Arrow));
    }

    #[test]
    fn duplicate_control_ids_are_rejected() {
        let mut doc = HeadlessDocument::new(800, 600).with_element("go");
        let elements = ElementConfig {
            start_button: "go".to_string(),
            stop_button: "go".to_string(),
            ..ElementConfig::default()
        };
        let mut registry = ListenerRegistry::new();
        let scope = registry.open_scope();

        let err = bind_controls(&mut registry, &mut doc, scope, &elements).unwrap_err();
        assert!(matches!(err, ListenerError::AlreadyBound { .. }));
        assert_eq!(registry.release_scope(&mut doc, scope), 1);
        assert_eq!(doc.total_listeners(), 0);
    }
}
