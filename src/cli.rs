use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;
use crate::core::{InspectOptions, Inspector, Runtime};
use crate::error::Result;
use crate::render::{render, DisplayMode, RenderOptions};

const EXAMPLES: &str = "\
Examples:
  pydocs json                           Overview of json package
  pydocs json.dumps                     Details of dumps function
  pydocs json.JSONEncoder               Details of JSONEncoder class
  pydocs urllib.parse.urlparse --source Show source code
  pydocs os.path --depth 3              Deeper tree view
  pydocs mypackage --private            Include private members";

#[derive(Parser, Debug)]
#[command(name = "pydocs")]
#[command(about = "Interactive Python package documentation explorer")]
#[command(version)]
#[command(after_help = EXAMPLES)]
pub struct Cli {
    /// Python package, module, class, or function path (e.g. json.dumps)
    pub target: String,

    /// Show source code only
    #[arg(short, long, conflicts_with_all = ["doc", "signature", "json"])]
    pub source: bool,

    /// Show docstring only
    #[arg(short, long, conflicts_with_all = ["signature", "json"])]
    pub doc: bool,

    /// Show signature only
    #[arg(short = 'g', long, conflicts_with = "json")]
    pub signature: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Include private members (starting with _)
    #[arg(short, long)]
    pub private: bool,

    /// Include members imported from other modules
    #[arg(short, long)]
    pub imported: bool,

    /// Maximum depth for tree display (default: 2)
    #[arg(short = 'n', long, value_name = "N")]
    pub depth: Option<usize>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Import sub-modules of packages that are not loaded yet
    #[arg(long)]
    pub discover: bool,

    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn display_mode(&self) -> DisplayMode {
        if self.source {
            DisplayMode::Source
        } else if self.doc {
            DisplayMode::Doc
        } else if self.signature {
            DisplayMode::Signature
        } else if self.json {
            DisplayMode::Json
        } else {
            DisplayMode::Tree
        }
    }

    /// Command-line flags take precedence over the configuration file
    pub fn apply(&self, config: &mut Config) {
        if let Some(depth) = self.depth {
            config.inspect.max_depth = depth;
        }
        config.inspect.include_private |= self.private;
        config.inspect.include_imported |= self.imported;
        config.inspect.discover_submodules |= self.discover;
        if self.no_color || self.json {
            config.display.color = false;
        }
    }

    /// Inspect the target and render it in the selected mode
    pub fn execute<R: Runtime>(&self, inspector: &Inspector<R>, config: &Config) -> Result<String> {
        let options = InspectOptions::from_config(config);
        let tree = inspector.inspect(&self.target, &options)?;
        render(
            &tree,
            self.display_mode(),
            &RenderOptions::from_display(&config.display),
        )
    }
}
