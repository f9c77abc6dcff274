use regex::Regex;
use tracing::debug;

use super::runtime::{AccessFailure, ImportFailure, Runtime};
use crate::error::ResolutionError;

/// Entry point located by the resolver
#[derive(Debug, Clone)]
pub struct Resolved<Ref> {
    pub reference: Ref,

    /// Final component of the identifier
    pub name: String,

    /// The identifier as given, normalized
    pub qualified_name: String,

    /// Everything before the final component, empty for top-level units
    pub parent_location: String,

    /// Longest prefix that loaded as a unit
    pub unit: String,
}

/// Turns dotted identifiers into loaded entities.
///
/// Resolution loads units in the host as a side effect.
pub struct EntryResolver<'a, R: Runtime> {
    runtime: &'a R,
    identifier_regex: Regex,
}

impl<'a, R: Runtime> EntryResolver<'a, R> {
    pub fn new(runtime: &'a R) -> Self {
        Self {
            runtime,
            identifier_regex: Regex::new(r"^[\p{L}_][\p{L}\p{N}_]*(?:\.[\p{L}_][\p{L}\p{N}_]*)*$")
                .expect("Invalid identifier regex"),
        }
    }

    pub fn resolve(&self, identifier: &str) -> Result<Resolved<R::Ref>, ResolutionError> {
        let identifier = identifier.trim();
        if !self.identifier_regex.is_match(identifier) {
            return Err(ResolutionError::InvalidIdentifier(identifier.to_string()));
        }

        let parts: Vec<&str> = identifier.split('.').collect();

        // Longest loadable prefix wins; the rest is attribute access
        for split in (1..=parts.len()).rev() {
            let unit = parts[..split].join(".");

            match self.runtime.import(&unit) {
                Ok(reference) => {
                    debug!("Loaded unit {} for {}", unit, identifier);
                    let reference = self.walk_attributes(reference, &unit, &parts[split..])?;
                    return Ok(Resolved {
                        reference,
                        name: parts[parts.len() - 1].to_string(),
                        qualified_name: identifier.to_string(),
                        parent_location: parts[..parts.len() - 1].join("."),
                        unit,
                    });
                }
                Err(ImportFailure::NotFound { missing }) => {
                    if missing == unit || unit.starts_with(&format!("{}.", missing)) {
                        continue;
                    }
                    // The unit exists but one of its own dependencies does not
                    return Err(ResolutionError::LoadFailed {
                        path: unit,
                        detail: format!("No module named '{}'", missing),
                    });
                }
                Err(ImportFailure::Failed { detail }) => {
                    return Err(ResolutionError::LoadFailed { path: unit, detail });
                }
            }
        }

        Err(ResolutionError::PackageNotFound(parts[0].to_string()))
    }

    fn walk_attributes(
        &self,
        mut current: R::Ref,
        unit: &str,
        attributes: &[&str],
    ) -> Result<R::Ref, ResolutionError> {
        let mut path = unit.to_string();

        for attribute in attributes {
            current = match self.runtime.attribute(&current, attribute) {
                Ok(next) => next,
                Err(AccessFailure::Missing) => {
                    return Err(ResolutionError::AttributeNotFound {
                        path,
                        attribute: attribute.to_string(),
                    });
                }
                Err(AccessFailure::Raised { detail }) => {
                    return Err(ResolutionError::LoadFailed {
                        path: format!("{}.{}", path, attribute),
                        detail,
                    });
                }
            };
            path.push('.');
            path.push_str(attribute);
        }

        Ok(current)
    }
}
