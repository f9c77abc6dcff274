use tracing::debug;

use super::model::EntityKind;
use super::runtime::{Runtime, Traits};

/// Rule order used when an entity satisfies several kind signals at once
pub const DEFAULT_PRIORITY: [EntityKind; 9] = [
    EntityKind::Package,
    EntityKind::Module,
    EntityKind::Class,
    EntityKind::AsyncFunction,
    EntityKind::Method,
    EntityKind::Function,
    EntityKind::Property,
    EntityKind::Descriptor,
    EntityKind::Constant,
];

/// Assigns exactly one [`EntityKind`] per entity from its structural signals
#[derive(Debug, Clone)]
pub struct EntityClassifier {
    priority: Vec<EntityKind>,
}

impl Default for EntityClassifier {
    fn default() -> Self {
        Self {
            priority: DEFAULT_PRIORITY.to_vec(),
        }
    }
}

impl EntityClassifier {
    /// Build a classifier with a custom rule order. Kinds left out are never
    /// matched; `Unknown` in the list is ignored since it is always the fallback.
    pub fn with_priority(priority: &[EntityKind]) -> Self {
        let mut ordered: Vec<EntityKind> = Vec::with_capacity(priority.len());
        for kind in priority {
            if *kind != EntityKind::Unknown && !ordered.contains(kind) {
                ordered.push(*kind);
            }
        }
        Self { priority: ordered }
    }

    pub fn priority(&self) -> &[EntityKind] {
        &self.priority
    }

    /// Classify a live entity. Never fails: unreadable signals give `Unknown`.
    pub fn classify<R: Runtime>(&self, runtime: &R, target: &R::Ref) -> EntityKind {
        match runtime.traits(target) {
            Ok(traits) => self.classify_traits(&traits),
            Err(e) => {
                debug!("Classification fell back to unknown: {}", e);
                EntityKind::Unknown
            }
        }
    }

    pub fn classify_traits(&self, traits: &Traits) -> EntityKind {
        self.priority
            .iter()
            .copied()
            .find(|kind| Self::matches(*kind, traits))
            .unwrap_or(EntityKind::Unknown)
    }

    fn matches(kind: EntityKind, t: &Traits) -> bool {
        match kind {
            EntityKind::Package => t.is_module && t.is_package,
            EntityKind::Module => t.is_module,
            EntityKind::Class => t.is_class,
            EntityKind::AsyncFunction => t.is_async && t.is_routine,
            EntityKind::Method => t.is_routine && t.is_class_attached,
            EntityKind::Function => t.is_routine,
            EntityKind::Property => t.is_property,
            EntityKind::Descriptor => {
                (t.has_get || t.has_set) && !t.is_callable && !t.is_module && !t.is_class
            }
            EntityKind::Constant => !t.is_callable && !t.is_module && !t.is_class,
            EntityKind::Unknown => false,
        }
    }
}
