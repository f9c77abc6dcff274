use std::collections::HashSet;
use tracing::debug;

use super::classifier::EntityClassifier;
use super::extractor::MetadataExtractor;
use super::members::{FilterPolicy, MembershipEnumerator};
use super::model::{EntityKind, TreeNode};
use super::runtime::Runtime;

/// Builds the depth-bounded, cycle-safe exploration tree
pub struct TreeBuilder<'a, R: Runtime> {
    runtime: &'a R,
    extractor: &'a MetadataExtractor,
    enumerator: MembershipEnumerator<'a>,
    policy: FilterPolicy,
    max_depth: usize,
}

/// Where a node sits: the name it is shown under, the path it was reached
/// through, and the location of the container that asked for it.
struct Placement<'p> {
    name: &'p str,
    qualified_name: &'p str,
    container_location: &'p str,
}

impl<'a, R: Runtime> TreeBuilder<'a, R> {
    pub fn new(
        runtime: &'a R,
        classifier: &'a EntityClassifier,
        extractor: &'a MetadataExtractor,
        policy: FilterPolicy,
        max_depth: usize,
    ) -> Self {
        Self {
            runtime,
            extractor,
            enumerator: MembershipEnumerator::new(classifier, extractor),
            policy,
            max_depth,
        }
    }

    /// Build the tree rooted at `root`.
    ///
    /// `parent_location` is used as the root's defining location when the
    /// entity reports no origin of its own.
    pub fn build(
        &self,
        root: &R::Ref,
        root_kind: EntityKind,
        name: &str,
        qualified_name: &str,
        parent_location: &str,
    ) -> TreeNode {
        let mut path = HashSet::new();
        let placement = Placement {
            name,
            qualified_name,
            container_location: parent_location,
        };
        self.node(root, root_kind, &placement, self.max_depth, &mut path)
    }

    fn node(
        &self,
        target: &R::Ref,
        kind: EntityKind,
        placement: &Placement<'_>,
        remaining: usize,
        path: &mut HashSet<usize>,
    ) -> TreeNode {
        let metadata = self.extractor.extract(
            self.runtime,
            target,
            kind,
            placement.qualified_name,
            placement.container_location,
        );
        let mut node = TreeNode::leaf(placement.name, kind, metadata);

        if !kind.is_container() {
            return node;
        }

        let identity = self.runtime.identity(target);
        if path.contains(&identity) {
            debug!("Cycle at {}, not descending", placement.qualified_name);
            node.truncated = true;
            return node;
        }

        let location = self
            .extractor
            .own_location(self.runtime, target, kind, placement.qualified_name);
        let members = self
            .enumerator
            .members(self.runtime, target, kind, &location, &self.policy);

        if remaining == 0 {
            node.truncated = !members.is_empty();
            return node;
        }

        path.insert(identity);
        node.children = members
            .iter()
            .map(|member| {
                let qualified_name = format!("{}.{}", placement.qualified_name, member.name);
                let child = Placement {
                    name: &member.name,
                    qualified_name: &qualified_name,
                    container_location: &location,
                };
                self.node(&member.reference, member.kind, &child, remaining - 1, path)
            })
            .collect();
        path.remove(&identity);

        node
    }
}
