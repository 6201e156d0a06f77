use clap::{Parser, Subcommand, ValueEnum};
use gather_core::federated::{Category, DateRange};

#[derive(Parser)]
#[command(name = "gather")]
#[command(about = "Gather - federated search across news and content sources")]
#[command(version)]
#[command(after_help = "\x1b[1;36mQuick Start:\x1b[0m
  gather search \"climate policy\"           Search every enabled source
  gather search \"rate cut\" -c business      Restrict to one category
  gather search \"transfer window\" -p mega   Cross-domain aggregation
  gather sources                          List sources and their status
  gather disable gossip-column            Turn a source off

\x1b[1;36mMore Info:\x1b[0m
  gather <command> --help                 Get help for any command")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    pub output: OutputFormat,

    /// Verbose output (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search all enabled sources at once
    ///
    /// Results are deduplicated, diversified across sources, ranked by
    /// relevance and cached for a few minutes.
    #[command(after_help = "\x1b[1;33mExamples:\x1b[0m
  gather search \"solar tariffs\"
  gather search \"vaccine trial\" --category health --limit 5
  gather search \"election\" --since week --profile focused
  gather search \"world cup\" --output json

\x1b[1;33mBuilt-in Profiles:\x1b[0m
  standard    - balanced results, at most 2 per source (20 max)
  mega        - at most 2 per category (25 max)
  focused     - at most 2 per source (15 max)")]
    Search {
        /// The search query
        query: String,
        /// Aggregation profile (standard, mega, focused, or a user profile)
        #[arg(short, long)]
        profile: Option<String>,
        /// Only search sources in this category
        #[arg(short, long, value_parser = parse_category)]
        category: Option<Category>,
        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,
        /// Only include recent content (day, week, month, year)
        #[arg(long, value_parser = parse_date_range)]
        since: Option<DateRange>,
    },

    /// List all sources with their category and status
    #[command(alias = "ls")]
    Sources {
        /// Only list sources in this category
        #[arg(short, long, value_parser = parse_category)]
        category: Option<Category>,
    },

    /// Enable a source
    Enable {
        /// Source id (see `gather sources`)
        id: String,
    },

    /// Disable a source
    Disable {
        /// Source id (see `gather sources`)
        id: String,
    },

    /// List built-in and user-defined aggregation profiles
    Profiles,

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Print the configuration file path
    Path,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Pretty,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
}

fn parse_category(s: &str) -> Result<Category, String> {
    s.parse()
}

fn parse_date_range(s: &str) -> Result<DateRange, String> {
    s.parse()
}
