use colored::{ColoredString, Colorize};
use std::fmt::{self, Write};

use crate::core::{EntityKind, KindExtras, TreeNode};

/// Applies ANSI styling only when color output is enabled
pub struct Painter {
    color: bool,
}

impl Painter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, text: &str, style: fn(ColoredString) -> ColoredString) -> String {
        if self.color {
            style(text.normal()).to_string()
        } else {
            text.to_string()
        }
    }

    fn kind(&self, kind: EntityKind, text: &str) -> String {
        match kind {
            EntityKind::Package => self.paint(text, |s| s.blue().bold()),
            EntityKind::Module => self.paint(text, |s| s.blue()),
            EntityKind::Class => self.paint(text, |s| s.yellow()),
            EntityKind::Function | EntityKind::Method => self.paint(text, |s| s.green()),
            EntityKind::AsyncFunction => self.paint(text, |s| s.green().italic()),
            EntityKind::Property => self.paint(text, |s| s.magenta()),
            EntityKind::Descriptor => self.paint(text, |s| s.magenta().dimmed()),
            EntityKind::Constant => self.paint(text, |s| s.cyan()),
            EntityKind::Unknown => self.paint(text, |s| s.dimmed()),
        }
    }

    fn dim(&self, text: &str) -> String {
        self.paint(text, |s| s.dimmed())
    }

    fn bold(&self, text: &str) -> String {
        self.paint(text, |s| s.bold())
    }

    fn warn(&self, text: &str) -> String {
        self.paint(text, |s| s.yellow())
    }
}

/// Full view: a detail page for leaves, a header plus member tree for containers
pub fn overview(node: &TreeNode, painter: &Painter, doc_preview_chars: usize) -> Result<String, fmt::Error> {
    let mut out = String::new();
    if node.kind.is_container() {
        container_overview(&mut out, node, painter, doc_preview_chars)?;
    } else {
        member_overview(&mut out, node, painter)?;
    }
    Ok(out)
}

fn container_overview(
    out: &mut String,
    node: &TreeNode,
    painter: &Painter,
    doc_preview_chars: usize,
) -> fmt::Result {
    let meta = &node.metadata;

    writeln!(
        out,
        "{} {}",
        painter.bold(&meta.qualified_name),
        painter.dim(&format!("({})", node.kind))
    )?;

    match &meta.docstring {
        Some(doc) => writeln!(out, "{}", preview(doc, doc_preview_chars))?,
        None => writeln!(out, "{}", painter.dim("No documentation available"))?,
    }

    let origin = meta
        .source
        .file
        .as_ref()
        .map(|file| file.display().to_string())
        .unwrap_or_else(|| "built-in".to_string());
    writeln!(out, "{}", painter.dim(&origin))?;

    if let KindExtras::Class { bases, mro, is_abstract } = &meta.extras {
        if *is_abstract {
            writeln!(out, "{}", painter.paint("abstract", |s| s.magenta().italic()))?;
        }
        if !bases.is_empty() {
            writeln!(out, "Bases: {}", bases.join(", "))?;
        }
        if !mro.is_empty() {
            writeln!(out, "{}", painter.dim(&format!("MRO: {}", mro.join(" -> "))))?;
        }
    }

    out.push('\n');
    writeln!(out, "{}", node_line(node, painter))?;
    write_children(out, node, "", painter)?;

    if node.truncated && node.children.is_empty() {
        writeln!(out, "{}", painter.dim("(members hidden, increase --depth)"))?;
    }
    Ok(())
}

fn write_children(out: &mut String, node: &TreeNode, prefix: &str, painter: &Painter) -> fmt::Result {
    let count = node.children.len();
    for (i, child) in node.children.iter().enumerate() {
        let last = i + 1 == count;
        let branch = if last { "└── " } else { "├── " };
        writeln!(out, "{}{}{}", prefix, painter.dim(branch), node_line(child, painter))?;

        let next = format!("{}{}", prefix, if last { "    " } else { "│   " });
        write_children(out, child, &next, painter)?;
    }
    Ok(())
}

/// `tag name detail`, with `...` for nodes whose members were not expanded
fn node_line(node: &TreeNode, painter: &Painter) -> String {
    let mut line = format!(
        "{} {}",
        painter.dim(node.kind.tag()),
        painter.kind(node.kind, &node.name)
    );

    match (&node.metadata.extras, &node.metadata.signature) {
        (KindExtras::Class { bases, .. }, _) if !bases.is_empty() => {
            line.push_str(&painter.dim(&format!("({})", bases.join(", "))));
        }
        (KindExtras::Value { repr: Some(repr), .. }, _) => {
            line.push_str(&painter.dim(&format!(" = {}", repr)));
        }
        (_, Some(signature)) if node.kind != EntityKind::Class => {
            line.push_str(&painter.dim(&signature.to_string()));
        }
        _ => {}
    }

    if node.truncated {
        line.push_str(&painter.dim(" ..."));
    }
    line
}

fn member_overview(out: &mut String, node: &TreeNode, painter: &Painter) -> fmt::Result {
    let meta = &node.metadata;

    let title = signature_line(node, painter)
        .unwrap_or_else(|| format!("{} {}", node.kind, painter.kind(node.kind, &node.name)));
    writeln!(out, "{}", title)?;

    if let KindExtras::Value { type_name, repr } = &meta.extras {
        if let Some(type_name) = type_name {
            writeln!(out, "{}", painter.dim(&format!("type: {}", type_name)))?;
        }
        if let Some(repr) = repr {
            writeln!(out, "= {}", repr)?;
        }
    }

    if let Some(doc) = &meta.docstring {
        writeln!(out, "\n{}", doc)?;
    }

    match (&meta.source.file, meta.source.lines) {
        (Some(file), Some(lines)) => {
            let location = format!("Defined in: {}:{}", file.display(), lines.start);
            writeln!(out, "\n{}", painter.dim(&location))?;
        }
        (Some(file), None) => {
            writeln!(out, "\n{}", painter.dim(&format!("Defined in: {}", file.display())))?;
        }
        (None, _) if meta.source.is_native() && node.kind.is_invocable() => {
            writeln!(out, "\n{}", painter.dim("Built-in (no source available)"))?;
        }
        _ => {}
    }
    Ok(())
}

pub fn source(node: &TreeNode, painter: &Painter) -> Result<String, fmt::Error> {
    let mut out = String::new();
    let src = &node.metadata.source;

    match &src.text {
        Some(text) => {
            let start = src.lines.map(|l| l.start).unwrap_or(1);
            let last = start + text.lines().count().saturating_sub(1);
            let width = last.to_string().len();
            for (offset, line) in text.lines().enumerate() {
                let number = format!("{:>width$}", start + offset, width = width);
                writeln!(out, "{} {}", painter.dim(&format!("{} │", number)), line)?;
            }
        }
        None => writeln!(
            out,
            "{}",
            painter.warn("Source code not available (built-in or C extension)")
        )?,
    }

    if let Some(file) = &src.file {
        writeln!(out, "\n{}", painter.dim(&format!("File: {}", file.display())))?;
    }
    Ok(out)
}

pub fn docstring(node: &TreeNode, painter: &Painter) -> String {
    match &node.metadata.docstring {
        Some(doc) => format!(
            "{}\n\n{}\n",
            painter.bold(&format!("Documentation: {}", node.metadata.qualified_name)),
            doc
        ),
        None => format!("{}\n", painter.dim("No docstring available")),
    }
}

pub fn signature(node: &TreeNode, painter: &Painter) -> String {
    match signature_line(node, painter) {
        Some(line) => format!("{}\n", line),
        None => format!("{}\n", painter.dim("No signature available")),
    }
}

fn signature_line(node: &TreeNode, painter: &Painter) -> Option<String> {
    let signature = node.metadata.signature.as_ref()?;
    let keyword = match node.kind {
        EntityKind::Class => "class",
        EntityKind::AsyncFunction => "async def",
        _ => "def",
    };
    Some(format!(
        "{} {}{}",
        painter.dim(keyword),
        painter.kind(node.kind, &node.name),
        signature
    ))
}

fn preview(doc: &str, limit: usize) -> String {
    if doc.chars().count() <= limit {
        return doc.to_string();
    }
    let kept: String = doc.chars().take(limit).collect();
    format!("{}...", kept.trim_end())
}
