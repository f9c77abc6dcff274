// src/core/engine.rs
use tracing::{debug, info};

use crate::config::Config;
use crate::error::ResolutionError;
use super::{
    EntityClassifier, EntryResolver, FilterPolicy, MetadataExtractor, Runtime, TreeBuilder,
    TreeNode,
};

/// Per-call options of [`Inspector::inspect`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InspectOptions {
    pub max_depth: usize,
    pub policy: FilterPolicy,
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self {
            max_depth: 2,
            policy: FilterPolicy::default(),
        }
    }
}

impl InspectOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_depth: config.inspect.max_depth,
            policy: FilterPolicy {
                include_private: config.inspect.include_private,
                include_imported: config.inspect.include_imported,
                discover_submodules: config.inspect.discover_submodules,
            },
        }
    }
}

/// Main orchestration engine: resolve an identifier, then build its tree
pub struct Inspector<R: Runtime> {
    runtime: R,
    classifier: EntityClassifier,
    extractor: MetadataExtractor,
}

impl<R: Runtime> Inspector<R> {
    pub fn new(runtime: R) -> Self {
        Self {
            runtime,
            classifier: EntityClassifier::default(),
            extractor: MetadataExtractor::default(),
        }
    }

    /// Create an inspector with classifier and extractor settings from configuration
    pub fn from_config(runtime: R, config: &Config) -> Self {
        let classifier = EntityClassifier::with_priority(&config.classifier.priority);
        debug!("Classifier priority: {:?}", classifier.priority());
        Self {
            runtime,
            classifier,
            extractor: MetadataExtractor::new(config.display.value_repr_chars),
        }
    }

    /// Inspect the entity named by a dotted identifier.
    ///
    /// Only resolution failures surface; everything below the entry point
    /// degrades in place.
    pub fn inspect(&self, identifier: &str, options: &InspectOptions) -> Result<TreeNode, ResolutionError> {
        let resolved = EntryResolver::new(&self.runtime).resolve(identifier)?;
        let kind = self.classifier.classify(&self.runtime, &resolved.reference);

        info!(
            "Inspecting {} ({}) via unit {}, depth {}",
            resolved.qualified_name, kind, resolved.unit, options.max_depth
        );

        let builder = TreeBuilder::new(
            &self.runtime,
            &self.classifier,
            &self.extractor,
            options.policy,
            options.max_depth,
        );
        let tree = builder.build(
            &resolved.reference,
            kind,
            &resolved.name,
            &resolved.qualified_name,
            &resolved.parent_location,
        );

        debug!("Built {} nodes for {}", tree.node_count(), resolved.qualified_name);
        Ok(tree)
    }
}
