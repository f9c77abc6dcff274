//! Output adapters over the engine's [`TreeNode`]

mod text;

use crate::config::DisplayConfig;
use crate::core::TreeNode;
use crate::error::Result;

/// What to show of an inspected entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// Header, docstring preview and member tree
    Tree,
    Source,
    Doc,
    Signature,
    /// Lossless structured output
    Json,
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub color: bool,
    pub doc_preview_chars: usize,
}

impl RenderOptions {
    pub fn from_display(display: &DisplayConfig) -> Self {
        Self {
            color: display.color,
            doc_preview_chars: display.doc_preview_chars,
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from_display(&DisplayConfig::default())
    }
}

pub fn render(node: &TreeNode, mode: DisplayMode, options: &RenderOptions) -> Result<String> {
    let painter = text::Painter::new(options.color);
    let output = match mode {
        DisplayMode::Tree => text::overview(node, &painter, options.doc_preview_chars)?,
        DisplayMode::Source => text::source(node, &painter)?,
        DisplayMode::Doc => text::docstring(node, &painter),
        DisplayMode::Signature => text::signature(node, &painter),
        DisplayMode::Json => {
            let mut json = serde_json::to_string_pretty(node)?;
            json.push('\n');
            json
        }
    };
    Ok(output)
}
