//! caltally CLI - where your calendar time goes, by title category.

mod chart;
mod commands;
mod output;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "caltally")]
#[command(author, version, about = "Calendar time analysis by title category")]
#[command(propagate_version = true)]
struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "human")]
    format: output::OutputFormat,

    /// Workspace path (defaults to current directory)
    #[arg(long, short = 'C', global = true)]
    path: Option<PathBuf>,

    /// ICS file to read instead of the workspace calendar
    #[arg(long, global = true, env = "CALTALLY_ICS")]
    ics: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Time range selection shared by the query commands.
#[derive(Args, Debug, Clone, Default)]
pub struct RangeArgs {
    /// Range start: date, local date-time, or RFC 3339
    #[arg(long, requires = "to")]
    from: Option<String>,

    /// Range end (inclusive): date, local date-time, or RFC 3339
    #[arg(long, requires = "from")]
    to: Option<String>,

    /// Week relative to the current one (0 = this week, -1 = last week)
    #[arg(long, allow_negative_numbers = true, conflicts_with_all = ["from", "to"])]
    week: Option<i64>,
}

/// Category grouping shared by `hours` and `chart`.
#[derive(Args, Debug, Clone, Default)]
pub struct GroupArgs {
    /// Category depth to group by (0 = top level)
    #[arg(long, short = 'd')]
    depth: Option<usize>,

    /// Categories to hide (can be specified multiple times)
    #[arg(long, short = 'i')]
    ignore: Vec<String>,

    /// Count events lasting 24 hours or more
    #[arg(long)]
    include_all_day: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new workspace
    Init,

    /// Report how the calendar parsed, including skipped events
    Check,

    /// List events inside a range
    #[command(alias = "ls")]
    Events {
        #[command(flatten)]
        range: RangeArgs,
    },

    /// Total hours per category inside a range
    Hours {
        #[command(flatten)]
        range: RangeArgs,

        #[command(flatten)]
        group: GroupArgs,
    },

    /// Hours per day in selected top-level categories
    Daily {
        #[command(flatten)]
        range: RangeArgs,

        /// Top-level categories to count (can be specified multiple times)
        #[arg(long, short = 'c')]
        category: Vec<String>,
    },

    /// Write a static HTML page with a category pie chart and a daily trend chart
    Chart {
        #[command(flatten)]
        range: RangeArgs,

        #[command(flatten)]
        group: GroupArgs,

        /// Top-level categories for the daily chart
        #[arg(long, short = 'c')]
        category: Vec<String>,

        /// Output file
        #[arg(long, short = 'o', default_value = "caltally-chart.html")]
        out: PathBuf,
    },

    /// Start the read-only query server
    Serve {
        /// Port to listen on
        #[arg(long, short = 'p', default_value = "17373")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let workspace_path = match cli.path {
        Some(path) => path,
        None => std::env::current_dir()?,
    };
    let ics = cli.ics.as_deref();

    match cli.command {
        Commands::Init => commands::init(&workspace_path, cli.format),
        Commands::Check => commands::check(&workspace_path, ics, cli.format),
        Commands::Events { range } => commands::events(&workspace_path, ics, &range, cli.format),
        Commands::Hours { range, group } => {
            commands::hours(&workspace_path, ics, &range, &group, cli.format)
        }
        Commands::Daily { range, category } => {
            commands::daily(&workspace_path, ics, &range, &category, cli.format)
        }
        Commands::Chart {
            range,
            group,
            category,
            out,
        } => commands::chart(
            &workspace_path,
            ics,
            &range,
            &group,
            &category,
            &out,
            cli.format,
        ),
        Commands::Serve { port, host } => commands::serve(&workspace_path, ics, &host, port),
    }
}
