//! Host runtime seam
//!
//! The engine never touches live entities directly. Everything it needs to know
//! about the loaded graph of the inspected library goes through [`Runtime`], so
//! the interpreter-backed implementation and the in-memory test double are
//! interchangeable.
//!
//! Loading is a side effect: [`Runtime::import`] and [`Runtime::attribute`]
//! may cause the host to load further units on first touch. Callers accept
//! this; the host's loaded-unit cache is treated as read-only and idempotent.

#[cfg(feature = "python")]
mod python;

#[cfg(test)]
pub mod memory;

#[cfg(feature = "python")]
pub use python::PythonRuntime;

use thiserror::Error;

use super::model::{LineRange, Signature};

/// Why a unit could not be loaded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportFailure {
    /// The named unit (possibly a parent of the requested one) does not exist
    #[error("no unit named '{missing}'")]
    NotFound { missing: String },

    /// The unit exists but raised while loading
    #[error("{detail}")]
    Failed { detail: String },
}

/// Why an attribute could not be read
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessFailure {
    #[error("no such attribute")]
    Missing,

    #[error("{detail}")]
    Raised { detail: String },
}

/// A probe into the host failed. Always contained by the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("runtime probe failed: {0}")]
pub struct RuntimeFault(pub String);

pub type Probe<T> = std::result::Result<T, RuntimeFault>;

/// Structural signals the classifier decides on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Traits {
    /// A loadable unit
    pub is_module: bool,

    /// A loadable unit with nested loadable sub-units
    pub is_package: bool,

    /// Invocable with its own namespace and bases
    pub is_class: bool,

    /// Coroutine or asynchronous generator function
    pub is_async: bool,

    /// Function, builtin, bound method or method descriptor
    pub is_routine: bool,

    /// Bound to, or declared inside, a class
    pub is_class_attached: bool,

    /// Computed on attribute access
    pub is_property: bool,

    pub has_get: bool,
    pub has_set: bool,
    pub is_callable: bool,
}

/// Self-reported origin of an entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    /// Dotted name of the declaring unit
    pub module: String,

    /// Dotted path within the unit (`Outer.method`), absent for modules and
    /// plain values
    pub qualname: Option<String>,

    /// Bound to an instance. The routine belongs to wherever the instance is
    /// exposed (`random.randint` is `Random.randint` bound to a module-level
    /// instance), so the owner part of `qualname` does not count.
    pub instance_bound: bool,
}

impl Origin {
    pub fn new(module: impl Into<String>, qualname: Option<&str>) -> Self {
        Self {
            module: module.into(),
            qualname: qualname.map(str::to_string),
            instance_bound: false,
        }
    }

    pub fn on_instance(mut self) -> Self {
        self.instance_bound = true;
        self
    }
}

/// Class-specific facts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassFacts {
    pub bases: Vec<String>,
    pub mro: Vec<String>,
    pub is_abstract: bool,
}

/// Interface to the host runtime that owns the inspected entities
pub trait Runtime {
    /// Opaque handle to a live entity. Cloning must not copy the entity.
    type Ref: Clone;

    /// Load the unit named by a dotted path
    fn import(&self, dotted: &str) -> std::result::Result<Self::Ref, ImportFailure>;

    fn attribute(&self, target: &Self::Ref, name: &str) -> std::result::Result<Self::Ref, AccessFailure>;

    /// Identity of the entity behind a handle (not its value)
    fn identity(&self, target: &Self::Ref) -> usize;

    fn traits(&self, target: &Self::Ref) -> Probe<Traits>;

    /// Declaring unit and qualified name, `None` when the entity reports neither
    fn origin(&self, target: &Self::Ref) -> Probe<Option<Origin>>;

    /// Member names, own namespace first in declaration order
    fn member_names(&self, target: &Self::Ref) -> Probe<Vec<String>>;

    /// Names of sub-units that exist on disk, loaded or not
    fn submodule_names(&self, _target: &Self::Ref) -> Probe<Vec<String>> {
        Ok(Vec::new())
    }

    /// `None` when the entity has no introspectable signature
    fn signature(&self, target: &Self::Ref) -> Probe<Option<Signature>>;

    fn docstring(&self, target: &Self::Ref) -> Probe<Option<String>>;

    fn source_file(&self, target: &Self::Ref) -> Probe<Option<String>>;

    /// Source text and its line range, `None` when no text origin exists
    fn source_lines(&self, target: &Self::Ref) -> Probe<Option<(String, LineRange)>>;

    fn value_repr(&self, target: &Self::Ref) -> Probe<String>;

    fn type_name(&self, target: &Self::Ref) -> Probe<String>;

    fn class_facts(&self, target: &Self::Ref) -> Probe<ClassFacts>;

    /// Naming convention that marks a member private
    fn private_prefix(&self) -> &str {
        "_"
    }
}
