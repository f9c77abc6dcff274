use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Closed classification of an inspected entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Package,
    Module,
    Class,
    Function,
    Method,
    AsyncFunction,
    Property,
    Descriptor,
    /// Plain values: constants, data attributes, instances
    #[serde(alias = "data_attribute")]
    Constant,
    Unknown,
}

impl EntityKind {
    /// Kinds whose members are enumerated and expanded into child nodes
    pub fn is_container(self) -> bool {
        matches!(self, Self::Package | Self::Module | Self::Class)
    }

    pub fn is_invocable(self) -> bool {
        matches!(
            self,
            Self::Class | Self::Function | Self::Method | Self::AsyncFunction
        )
    }

    /// Short tag used by the text renderer
    pub fn tag(self) -> &'static str {
        match self {
            Self::Package => "pkg",
            Self::Module => "mod",
            Self::Class => "cls",
            Self::Function => "def",
            Self::Method => "meth",
            Self::AsyncFunction => "async",
            Self::Property => "prop",
            Self::Descriptor => "desc",
            Self::Constant => "const",
            Self::Unknown => "?",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Package => "package",
            Self::Module => "module",
            Self::Class => "class",
            Self::Function => "function",
            Self::Method => "method",
            Self::AsyncFunction => "async function",
            Self::Property => "property",
            Self::Descriptor => "descriptor",
            Self::Constant => "data",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Parameter passing convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    PositionalOnly,
    PositionalOrKeyword,
    VarPositional,
    KeywordOnly,
    VarKeyword,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub kind: ParameterKind,
    pub has_default: bool,

    /// Rendered default value, only present when `has_default`
    pub default: Option<String>,

    pub annotation: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            has_default: false,
            default: None,
            annotation: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.has_default = true;
        self.default = Some(default.into());
        self
    }

    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ParameterKind::VarPositional => f.write_str("*")?,
            ParameterKind::VarKeyword => f.write_str("**")?,
            _ => {}
        }
        f.write_str(&self.name)?;
        if let Some(annotation) = &self.annotation {
            write!(f, ": {}", annotation)?;
        }
        if let Some(default) = &self.default {
            if self.annotation.is_some() {
                write!(f, " = {}", default)?;
            } else {
                write!(f, "={}", default)?;
            }
        }
        Ok(())
    }
}

/// Invocable signature of a callable entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub parameters: Vec<Parameter>,
    pub return_annotation: Option<String>,
}

impl Signature {
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

impl fmt::Display for Signature {
    /// Renders `(a, /, b=1, *args, c, **kw) -> R`, inserting the `/` and `*`
    /// markers where the parameter kinds change.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::with_capacity(self.parameters.len() + 2);
        let mut seen_star = false;

        for (i, param) in self.parameters.iter().enumerate() {
            match param.kind {
                ParameterKind::VarPositional => seen_star = true,
                ParameterKind::KeywordOnly if !seen_star => {
                    parts.push("*".to_string());
                    seen_star = true;
                }
                _ => {}
            }

            parts.push(param.to_string());

            let next_is_positional_only = self
                .parameters
                .get(i + 1)
                .map(|p| p.kind == ParameterKind::PositionalOnly)
                .unwrap_or(false);
            if param.kind == ParameterKind::PositionalOnly && !next_is_positional_only {
                parts.push("/".to_string());
            }
        }

        write!(f, "({})", parts.join(", "))?;
        if let Some(ret) = &self.return_annotation {
            write!(f, " -> {}", ret)?;
        }
        Ok(())
    }
}

/// Inclusive 1-based line range within a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

/// Where an entity's text lives. Every field degrades independently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub file: Option<PathBuf>,
    pub lines: Option<LineRange>,
    pub text: Option<String>,
}

impl SourceInfo {
    /// True when nothing about the origin text could be recovered
    pub fn is_native(&self) -> bool {
        self.file.is_none() && self.lines.is_none() && self.text.is_none()
    }
}

/// Facts that only make sense for some kinds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KindExtras {
    #[default]
    None,
    Class {
        bases: Vec<String>,
        mro: Vec<String>,
        is_abstract: bool,
    },
    Value {
        type_name: Option<String>,
        repr: Option<String>,
    },
}

/// Everything copied out of a live entity. No field failing ever fails the record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Path the entity was reached through
    pub qualified_name: String,
    pub signature: Option<Signature>,
    pub docstring: Option<String>,
    pub source: SourceInfo,

    /// Dotted path of the namespace that actually declares the entity
    pub defining_location: String,

    pub extras: KindExtras,
}

/// One node of the exploration tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub name: String,
    pub kind: EntityKind,
    pub metadata: MetadataRecord,
    pub children: Vec<TreeNode>,

    /// Members exist but were not expanded (depth limit or cycle)
    pub truncated: bool,
}

impl TreeNode {
    pub fn leaf(name: impl Into<String>, kind: EntityKind, metadata: MetadataRecord) -> Self {
        Self {
            name: name.into(),
            kind,
            metadata,
            children: Vec::new(),
            truncated: false,
        }
    }

    pub fn child(&self, name: &str) -> Option<&TreeNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Depth-first walk yielding every node with its depth (root is 0)
    pub fn walk(&self) -> Vec<(usize, &TreeNode)> {
        let mut out = Vec::new();
        let mut stack = vec![(0usize, self)];
        while let Some((depth, node)) = stack.pop() {
            out.push((depth, node));
            for child in node.children.iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        out
    }

    /// Total number of nodes in this subtree
    pub fn node_count(&self) -> usize {
        self.walk().len()
    }
}
