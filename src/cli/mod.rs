pub mod commands;

use clap::{Args, Parser, Subcommand};

/// Token usage and API-equivalent cost of Claude Code sessions, per day and
/// per model.
#[derive(Debug, Parser)]
#[command(name = "cc-usage", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub report: ReportArgs,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fetch WeChat public-account articles and print their metadata
    Article {
        /// Article URLs (mp.weixin.qq.com/s/...)
        #[arg(required = true, num_args = 1..)]
        urls: Vec<String>,

        /// Print JSON
        #[arg(long, conflicts_with = "markdown")]
        json: bool,

        /// Print a Markdown note (single article only)
        #[arg(long)]
        markdown: bool,
    },
}

/// Options of the default usage report
#[derive(Debug, Clone, Default, Args)]
pub struct ReportArgs {
    /// Claude Code projects directory [default: ~/.claude/projects]
    #[arg(long, env = "CC_USAGE_DIR", value_name = "DIR")]
    pub dir: Option<String>,

    /// Only include the most recent N days (0 disables the filter)
    #[arg(long, value_name = "N")]
    pub days: Option<u32>,

    /// Only include projects whose directory name contains this text
    #[arg(long, value_name = "TEXT")]
    pub project: Option<String>,

    /// Print CSV instead of the table
    #[arg(long, conflicts_with = "summary")]
    pub csv: bool,

    /// Print only the per-model summary
    #[arg(long)]
    pub summary: bool,
}

/// Which report view to print
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportMode {
    /// Dated table followed by the model summary
    Table,
    Csv,
    Summary,
}

impl ReportArgs {
    pub fn mode(&self) -> ReportMode {
        if self.csv {
            ReportMode::Csv
        } else if self.summary {
            ReportMode::Summary
        } else {
            ReportMode::Table
        }
    }
}

/// Output format of the article command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleFormat {
    Summary,
    Json,
    Markdown,
}

impl ArticleFormat {
    pub fn from_flags(json: bool, markdown: bool) -> Self {
        if json {
            ArticleFormat::Json
        } else if markdown {
            ArticleFormat::Markdown
        } else {
            ArticleFormat::Summary
        }
    }
}
