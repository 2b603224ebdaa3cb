//! Where the caller goes after a renewal is confirmed.

use std::collections::BTreeMap;

use serde::Serialize;

/// Entity type of agreement records in navigation directives.
pub const AGREEMENT_ENTITY: &str = "agreement";

/// A UI action the host knows how to open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionDescriptor {
    pub name: String,
    /// Action kind, e.g. `"window"`.
    pub kind: String,
    pub entity_type: String,
}

impl ActionDescriptor {
    /// A plain form window on agreements, used when the configured action
    /// cannot be resolved.
    pub fn fallback(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: "window".to_string(),
            entity_type: AGREEMENT_ENTITY.to_string(),
        }
    }
}

/// Looks up UI actions by name.
pub trait ActionResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Option<ActionDescriptor>;
}

/// A resolver that knows no actions. Every lookup falls back.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoActions;

impl ActionResolver for NoActions {
    fn resolve(&self, _name: &str) -> Option<ActionDescriptor> {
        None
    }
}

/// Actions registered by name.
#[derive(Debug, Clone, Default)]
pub struct ActionRegistry {
    actions: BTreeMap<String, ActionDescriptor>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, action: ActionDescriptor) {
        self.actions.insert(action.name.clone(), action);
    }
}

impl ActionResolver for ActionRegistry {
    fn resolve(&self, name: &str) -> Option<ActionDescriptor> {
        self.actions.get(name).cloned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationContext {
    /// Prefills the predecessor link on forms opened from this directive.
    pub default_previous_agreement_id: u64,
}

/// Instruction to open the freshly created renewal in a form view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationDirective {
    pub action: ActionDescriptor,
    pub target_entity_type: String,
    pub target_record_id: u64,
    pub view_mode: String,
    pub context: NavigationContext,
}

impl NavigationDirective {
    pub fn open_renewal(
        resolver: &dyn ActionResolver,
        action_name: &str,
        renewal_id: u64,
        source_id: u64,
    ) -> Self {
        let action = resolver
            .resolve(action_name)
            .unwrap_or_else(|| ActionDescriptor::fallback(action_name));
        Self {
            action,
            target_entity_type: AGREEMENT_ENTITY.to_string(),
            target_record_id: renewal_id,
            view_mode: "form".to_string(),
            context: NavigationContext {
                default_previous_agreement_id: source_id,
            },
        }
    }
}
