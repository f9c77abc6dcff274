use std::path::PathBuf;
use tracing::debug;

use super::model::{EntityKind, KindExtras, LineRange, MetadataRecord, SourceInfo};
use super::runtime::{Probe, Runtime};

/// Copies per-entity facts out of the live runtime.
///
/// Every field is probed on its own. A failing probe degrades only that field
/// to absent; extraction as a whole never fails.
#[derive(Debug, Clone)]
pub struct MetadataExtractor {
    /// Longest value representation kept before eliding with `...`
    value_repr_chars: usize,
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new(80)
    }
}

impl MetadataExtractor {
    pub fn new(value_repr_chars: usize) -> Self {
        Self {
            value_repr_chars: value_repr_chars.max(4),
        }
    }

    pub fn extract<R: Runtime>(
        &self,
        runtime: &R,
        target: &R::Ref,
        kind: EntityKind,
        qualified_name: &str,
        container_location: &str,
    ) -> MetadataRecord {
        MetadataRecord {
            qualified_name: qualified_name.to_string(),
            signature: self.signature(runtime, target, kind, qualified_name),
            docstring: self.docstring(runtime, target, kind, qualified_name),
            source: self.source(runtime, target, kind, qualified_name),
            defining_location: self.defining_location(runtime, target, kind, container_location),
            extras: self.extras(runtime, target, kind, qualified_name),
        }
    }

    /// Dotted path of the namespace that declares `target`.
    ///
    /// Units are declared by their parent package, routines bound to an
    /// instance by their unit, everything else by the unit plus the owning part
    /// of its qualified name. Entities that report no origin are treated as
    /// declared by the container that asked.
    pub fn defining_location<R: Runtime>(
        &self,
        runtime: &R,
        target: &R::Ref,
        kind: EntityKind,
        container_location: &str,
    ) -> String {
        let origin = match runtime.origin(target) {
            Ok(Some(origin)) => origin,
            Ok(None) => return container_location.to_string(),
            Err(e) => {
                debug!("Origin unavailable, using container location: {}", e);
                return container_location.to_string();
            }
        };

        if matches!(kind, EntityKind::Package | EntityKind::Module) {
            return origin
                .module
                .rsplit_once('.')
                .map(|(parent, _)| parent.to_string())
                .unwrap_or_default();
        }

        if origin.instance_bound {
            return origin.module;
        }

        match origin.qualname.as_deref().and_then(|q| q.rsplit_once('.')) {
            Some((owner, _)) => format!("{}.{}", origin.module, owner),
            None => origin.module,
        }
    }

    /// Location members of this container must share to count as its own
    pub fn own_location<R: Runtime>(
        &self,
        runtime: &R,
        target: &R::Ref,
        kind: EntityKind,
        reached_as: &str,
    ) -> String {
        let origin = match runtime.origin(target) {
            Ok(Some(origin)) => origin,
            _ => return reached_as.to_string(),
        };

        match kind {
            EntityKind::Package | EntityKind::Module => origin.module,
            EntityKind::Class => match origin.qualname {
                Some(qualname) => format!("{}.{}", origin.module, qualname),
                None => reached_as.to_string(),
            },
            _ => reached_as.to_string(),
        }
    }

    fn signature<R: Runtime>(
        &self,
        runtime: &R,
        target: &R::Ref,
        kind: EntityKind,
        qualified_name: &str,
    ) -> Option<super::model::Signature> {
        if !(kind.is_invocable() || kind == EntityKind::Unknown) {
            return None;
        }
        contained(qualified_name, "signature", runtime.signature(target)).flatten()
    }

    fn docstring<R: Runtime>(
        &self,
        runtime: &R,
        target: &R::Ref,
        kind: EntityKind,
        qualified_name: &str,
    ) -> Option<String> {
        // A plain value's docstring is its type's
        if kind == EntityKind::Constant {
            return None;
        }
        contained(qualified_name, "docstring", runtime.docstring(target))
            .flatten()
            .map(|doc| doc.trim().to_string())
            .filter(|doc| !doc.is_empty())
    }

    fn source<R: Runtime>(
        &self,
        runtime: &R,
        target: &R::Ref,
        kind: EntityKind,
        qualified_name: &str,
    ) -> SourceInfo {
        if matches!(
            kind,
            EntityKind::Constant | EntityKind::Descriptor | EntityKind::Unknown
        ) {
            return SourceInfo::default();
        }

        let file = contained(qualified_name, "source file", runtime.source_file(target))
            .flatten()
            .map(PathBuf::from);
        let (text, lines) =
            match contained(qualified_name, "source lines", runtime.source_lines(target)).flatten() {
                Some((text, range)) => (Some(text), Some(normalize_range(range))),
                None => (None, None),
            };

        SourceInfo { file, lines, text }
    }

    fn extras<R: Runtime>(
        &self,
        runtime: &R,
        target: &R::Ref,
        kind: EntityKind,
        qualified_name: &str,
    ) -> KindExtras {
        match kind {
            EntityKind::Class => {
                match contained(qualified_name, "class facts", runtime.class_facts(target)) {
                    Some(facts) => KindExtras::Class {
                        bases: facts.bases,
                        mro: facts.mro,
                        is_abstract: facts.is_abstract,
                    },
                    None => KindExtras::None,
                }
            }
            EntityKind::Constant => KindExtras::Value {
                type_name: contained(qualified_name, "type name", runtime.type_name(target)),
                repr: contained(qualified_name, "value repr", runtime.value_repr(target))
                    .map(|repr| self.elide(repr)),
            },
            _ => KindExtras::None,
        }
    }

    fn elide(&self, repr: String) -> String {
        if repr.chars().count() <= self.value_repr_chars {
            return repr;
        }
        let kept: String = repr.chars().take(self.value_repr_chars - 3).collect();
        format!("{}...", kept)
    }
}

/// Log and drop a failed probe
fn contained<T>(qualified_name: &str, field: &str, probe: Probe<T>) -> Option<T> {
    match probe {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Degraded {} of {}: {}", field, qualified_name, e);
            None
        }
    }
}

fn normalize_range(range: LineRange) -> LineRange {
    LineRange {
        start: range.start,
        end: range.end.max(range.start),
    }
}
