use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use super::classifier::EntityClassifier;
use super::extractor::MetadataExtractor;
use super::model::EntityKind;
use super::runtime::{AccessFailure, Runtime};

/// Which members of a container are exposed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterPolicy {
    /// Keep names that start with the private prefix
    pub include_private: bool,

    /// Keep members declared somewhere other than the container
    pub include_imported: bool,

    /// Load sub-units of packages that are not loaded yet
    pub discover_submodules: bool,
}

/// A member that passed the filter, with the facts the filter needed
#[derive(Debug, Clone)]
pub struct Member<Ref> {
    pub name: String,
    pub reference: Ref,
    pub kind: EntityKind,
    pub defining_location: String,
    declared_at: usize,
}

/// Lists the children of packages, modules and classes
pub struct MembershipEnumerator<'a> {
    classifier: &'a EntityClassifier,
    extractor: &'a MetadataExtractor,
}

impl<'a> MembershipEnumerator<'a> {
    pub fn new(classifier: &'a EntityClassifier, extractor: &'a MetadataExtractor) -> Self {
        Self {
            classifier,
            extractor,
        }
    }

    /// Ordered, filtered members of `target`.
    ///
    /// `location` is the container's own location. Reading a member may load
    /// further units in the host. A member whose access raises is dropped
    /// without affecting its siblings.
    pub fn members<R: Runtime>(
        &self,
        runtime: &R,
        target: &R::Ref,
        kind: EntityKind,
        location: &str,
        policy: &FilterPolicy,
    ) -> Vec<Member<R::Ref>> {
        if !kind.is_container() {
            return Vec::new();
        }

        let mut names = match runtime.member_names(target) {
            Ok(names) => names,
            Err(e) => {
                debug!("Cannot list members of {}: {}", location, e);
                return Vec::new();
            }
        };

        let mut seen: HashSet<String> = HashSet::with_capacity(names.len());
        names.retain(|name| seen.insert(name.clone()));

        let mut undiscovered: HashSet<String> = HashSet::new();
        if kind == EntityKind::Package && policy.discover_submodules {
            match runtime.submodule_names(target) {
                Ok(submodules) => {
                    for name in submodules {
                        if seen.insert(name.clone()) {
                            undiscovered.insert(name.clone());
                            names.push(name);
                        }
                    }
                }
                Err(e) => debug!("Cannot discover sub-units of {}: {}", location, e),
            }
        }

        let prefix = runtime.private_prefix();
        let mut members = Vec::with_capacity(names.len());

        for (declared_at, name) in names.into_iter().enumerate() {
            if !policy.include_private && name.starts_with(prefix) {
                continue;
            }

            let reference = match runtime.attribute(target, &name) {
                Ok(reference) => reference,
                Err(AccessFailure::Missing) if undiscovered.contains(&name) => {
                    let dotted = format!("{}.{}", location, name);
                    match runtime.import(&dotted) {
                        Ok(reference) => reference,
                        Err(e) => {
                            debug!("Skipping sub-unit {}: {}", dotted, e);
                            continue;
                        }
                    }
                }
                Err(e) => {
                    debug!("Skipping unreadable member {}.{}: {}", location, name, e);
                    continue;
                }
            };

            let member_kind = self.classifier.classify(runtime, &reference);
            let defining_location =
                self.extractor
                    .defining_location(runtime, &reference, member_kind, location);

            if !policy.include_imported && defining_location != location {
                continue;
            }

            members.push(Member {
                name,
                reference,
                kind: member_kind,
                defining_location,
                declared_at,
            });
        }

        members.sort_by(|a, b| {
            sort_group(kind, a.kind)
                .cmp(&sort_group(kind, b.kind))
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
                .then_with(|| a.declared_at.cmp(&b.declared_at))
                .then_with(|| a.name.cmp(&b.name))
        });

        members
    }
}

/// Within a class, plain data sorts after behaviour
fn sort_group(container: EntityKind, member: EntityKind) -> u8 {
    if container == EntityKind::Class && member == EntityKind::Constant {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::runtime::memory::{json_like, MemoryRuntime};

    fn names<Ref>(members: &[Member<Ref>]) -> Vec<&str> {
        members.iter().map(|m| m.name.as_str()).collect()
    }

    fn enumerate<R: Runtime>(
        rt: &R,
        target: &R::Ref,
        kind: EntityKind,
        location: &str,
        policy: FilterPolicy,
    ) -> Vec<Member<R::Ref>> {
        let classifier = EntityClassifier::default();
        let extractor = MetadataExtractor::default();
        MembershipEnumerator::new(&classifier, &extractor).members(rt, target, kind, location, &policy)
    }

    #[test]
    fn test_default_policy_drops_private_and_imported() {
        let (rt, json) = json_like();
        let members = enumerate(&rt, &json, EntityKind::Package, "json", FilterPolicy::default());

        assert_eq!(names(&members), vec!["decoder", "dumps", "encoder", "loads"]);
        assert!(members.iter().all(|m| m.defining_location == "json"));
    }

    #[test]
    fn test_include_imported_and_private() {
        let (rt, json) = json_like();
        let policy = FilterPolicy {
            include_private: true,
            include_imported: true,
            ..FilterPolicy::default()
        };
        let members = enumerate(&rt, &json, EntityKind::Package, "json", policy);

        assert_eq!(
            names(&members),
            vec![
                "_default_encoder",
                "codecs",
                "decoder",
                "dumps",
                "encoder",
                "JSONDecodeError",
                "JSONEncoder",
                "loads",
            ]
        );
    }

    #[test]
    fn test_class_data_sorts_after_behaviour() {
        let (rt, json) = json_like();
        let encoder = rt.attribute(&json, "JSONEncoder").unwrap();
        let policy = FilterPolicy {
            include_private: true,
            ..FilterPolicy::default()
        };
        let members = enumerate(&rt, &encoder, EntityKind::Class, "json.encoder.JSONEncoder", policy);

        // `__repr__` is inherited from object and filtered as imported
        assert_eq!(names(&members), vec!["__init__", "default", "encode", "item_separator"]);
        assert_eq!(members[1].kind, EntityKind::Method);
        assert_eq!(members[3].kind, EntityKind::Constant);
    }

    #[test]
    fn test_raising_member_is_dropped() {
        let mut rt = MemoryRuntime::new();
        let module = rt.module("lazy");
        let a = rt.function("lazy", "alpha");
        let c = rt.function("lazy", "gamma");
        rt.bind(module, "alpha", a);
        rt.bind_raising(module, "beta", "ImportError: optional dependency missing");
        rt.bind(module, "gamma", c);

        let members = enumerate(&rt, &module, EntityKind::Module, "lazy", FilterPolicy::default());
        assert_eq!(names(&members), vec!["alpha", "gamma"]);
    }

    #[test]
    fn test_ties_keep_declaration_order() {
        let mut rt = MemoryRuntime::new();
        let module = rt.module("m");
        let upper = rt.function("m", "Run");
        let lower = rt.function("m", "run");
        let other = rt.function("m", "apply");
        rt.bind(module, "run", lower);
        rt.bind(module, "Run", upper);
        rt.bind(module, "apply", other);

        let members = enumerate(&rt, &module, EntityKind::Module, "m", FilterPolicy::default());
        assert_eq!(names(&members), vec!["apply", "run", "Run"]);
    }

    #[test]
    fn test_submodule_discovery_is_opt_in() {
        let (rt, json) = json_like();
        let members = enumerate(&rt, &json, EntityKind::Package, "json", FilterPolicy::default());
        assert!(!names(&members).contains(&"tool"));
        assert!(rt.loads().is_empty());

        let policy = FilterPolicy {
            discover_submodules: true,
            ..FilterPolicy::default()
        };
        let members = enumerate(&rt, &json, EntityKind::Package, "json", policy);
        let tool = members.iter().find(|m| m.name == "tool").expect("tool discovered");
        assert_eq!(tool.kind, EntityKind::Module);
        assert_eq!(rt.loads(), vec!["json.tool".to_string()]);
    }

    #[test]
    fn test_leaf_kinds_have_no_members() {
        let (rt, json) = json_like();
        let dumps = rt.attribute(&json, "dumps").unwrap();
        let members = enumerate(&rt, &dumps, EntityKind::Function, "json", FilterPolicy::default());
        assert!(members.is_empty());
    }
}
