//! Introspection engine
//!
//! Resolution, classification, metadata extraction, membership enumeration and
//! tree construction over a host [`Runtime`].

mod classifier;
mod engine;
mod extractor;
mod members;
mod model;
mod resolver;
pub mod runtime;
mod tree;

pub use classifier::{EntityClassifier, DEFAULT_PRIORITY};
pub use engine::{InspectOptions, Inspector};
pub use extractor::MetadataExtractor;
pub use members::FilterPolicy;
pub use model::{EntityKind, KindExtras, TreeNode};
pub use resolver::EntryResolver;
pub use runtime::Runtime;
pub use tree::TreeBuilder;
