use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// "0.1.0" for releases, "0.1.0@abc1234 2026-01-15 14:30" for dev builds.
const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), env!("DM_BUILD_INFO"));

/// Multi-letter short options kept for compatibility, mapped to their long form.
const LEGACY_SHORTS: &[(&str, &str)] = &[("-qf", "--queryformat"), ("-do", "--default-output")];

/// Rewrites `-qf` and `-do` into long options clap understands.
///
/// Arguments after `--` are left alone.
pub fn normalize_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen_separator = false;
    args.into_iter()
        .map(|arg| {
            if seen_separator {
                return arg;
            }
            if arg == "--" {
                seen_separator = true;
                return arg;
            }
            for (short, long) in LEGACY_SHORTS {
                if arg == *short {
                    return long.to_string();
                }
                if let Some(value) = arg.strip_prefix(&format!("{}=", short)) {
                    return format!("{}={}", long, value);
                }
            }
            arg
        })
        .collect()
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Table,
}

#[derive(Parser, Debug)]
#[command(name = "docmanager", bin_name = "docmanager", version = VERSION)]
#[command(about = "Manage properties stored inside DocBook5 documents", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output (repeat for more)
    #[arg(short, long, global = true, action = ArgAction::Count, help_heading = "Options")]
    pub verbose: u8,

    /// Config file to use instead of the one in the user config directory
    #[arg(long, global = true, value_name = "FILE", help_heading = "Options")]
    pub config: Option<PathBuf>,

    /// Number of files loaded in parallel
    #[arg(short, long, global = true, value_name = "N", help_heading = "Options")]
    pub jobs: Option<usize>,

    /// Stop at the first file that cannot be loaded
    #[arg(long, global = true, help_heading = "Options")]
    pub stop_on_error: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text, help_heading = "Options")]
    pub format: OutputFormat,
}

/// Shortcut options for the predefined properties.
#[derive(Args, Debug, Default, Clone)]
pub struct PropertyShortcuts {
    #[arg(long, value_name = "NAME")]
    pub maintainer: Option<String>,

    /// editing, edited, proofing, proofed, comment or ready
    #[arg(long)]
    pub status: Option<String>,

    /// YYYY-MM-DD
    #[arg(long, value_name = "DATE")]
    pub deadline: Option<String>,

    /// 1 to 10
    #[arg(long)]
    pub priority: Option<String>,

    /// yes or no
    #[arg(long, value_name = "YES|NO")]
    pub translation: Option<String>,

    /// Comma separated language codes, e.g. de_DE,fr
    #[arg(long, value_name = "CODES")]
    pub languages: Option<String>,

    #[arg(long)]
    pub release: Option<String>,

    #[arg(long, value_name = "URL")]
    pub repository: Option<String>,

    #[arg(long, value_name = "URL", help_heading = "Bugtracker")]
    pub bugtracker_url: Option<String>,

    #[arg(long, value_name = "NAME", help_heading = "Bugtracker")]
    pub bugtracker_component: Option<String>,

    #[arg(long, value_name = "NAME", help_heading = "Bugtracker")]
    pub bugtracker_product: Option<String>,

    #[arg(long, value_name = "NAME", help_heading = "Bugtracker")]
    pub bugtracker_assignee: Option<String>,

    #[arg(long, value_name = "VERSION", help_heading = "Bugtracker")]
    pub bugtracker_version: Option<String>,
}

impl PropertyShortcuts {
    /// The shortcuts that were given, as `(property, value)`.
    pub fn items(&self) -> Vec<(&'static str, &str)> {
        [
            ("maintainer", &self.maintainer),
            ("status", &self.status),
            ("deadline", &self.deadline),
            ("priority", &self.priority),
            ("translation", &self.translation),
            ("languages", &self.languages),
            ("release", &self.release),
            ("repository", &self.repository),
            ("bugtracker/url", &self.bugtracker_url),
            ("bugtracker/component", &self.bugtracker_component),
            ("bugtracker/product", &self.bugtracker_product),
            ("bugtracker/assignee", &self.bugtracker_assignee),
            ("bugtracker/version", &self.bugtracker_version),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
        .collect()
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print property values
    #[command(alias = "g", display_order = 1)]
    Get {
        /// Properties to print, all when omitted (a,b;c or repeated)
        #[arg(short = 'p', long = "properties", value_name = "PROP")]
        properties: Vec<String>,

        #[arg(required = true, num_args = 1.., value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Set property values
    #[command(alias = "s", display_order = 2)]
    Set {
        /// PROP=VALUE pairs (separate several with ;)
        #[arg(short = 'p', long = "properties", value_name = "PROP=VALUE")]
        properties: Vec<String>,

        #[command(flatten)]
        shortcuts: PropertyShortcuts,

        /// Place the -p properties under bugtracker/
        #[arg(long)]
        bugtracker: bool,

        #[arg(required = true, num_args = 1.., value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Delete properties, optionally only when they hold a given value
    #[command(alias = "d", display_order = 3)]
    Del {
        /// PROP or PROP=VALUE
        #[arg(short = 'p', long = "properties", value_name = "PROP[=VALUE]", required = true)]
        properties: Vec<String>,

        #[arg(required = true, num_args = 1.., value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Set attributes on a property
    #[command(name = "set-attr", alias = "sa", display_order = 4)]
    SetAttr {
        #[arg(short = 'p', long = "property", value_name = "PROP")]
        property: String,

        /// NAME=VALUE pairs
        #[arg(short = 'a', long = "attributes", value_name = "NAME=VALUE", required = true)]
        attributes: Vec<String>,

        #[arg(required = true, num_args = 1.., value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Delete attributes from a property
    #[command(name = "del-attr", alias = "da", display_order = 5)]
    DelAttr {
        #[arg(short = 'p', long = "property", value_name = "PROP")]
        property: String,

        #[arg(short = 'a', long = "attributes", value_name = "NAME", required = true)]
        attributes: Vec<String>,

        #[arg(required = true, num_args = 1.., value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Print attributes of properties
    #[command(name = "get-attr", alias = "ga", display_order = 6)]
    GetAttr {
        /// Properties to look at, all when omitted
        #[arg(short = 'p', long = "properties", value_name = "PROP")]
        properties: Vec<String>,

        /// Attributes to print, all when omitted
        #[arg(short = 'a', long = "attributes", value_name = "NAME")]
        attributes: Vec<String>,

        #[arg(required = true, num_args = 1.., value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Create the default properties
    #[command(alias = "i", display_order = 7)]
    Init {
        /// Reset properties that already have a value
        #[arg(long)]
        force: bool,

        /// Also create the bugtracker properties
        #[arg(long)]
        with_bugtracker: bool,

        #[command(flatten)]
        shortcuts: PropertyShortcuts,

        #[arg(required = true, num_args = 1.., value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Print one line per document from a query format
    #[command(alias = "a", display_order = 8)]
    Analyze {
        /// Template with {property} placeholders (also -qf)
        #[arg(long = "queryformat", value_name = "TEMPLATE")]
        queryformat: Option<String>,

        /// [+|-]PROP=VALUE, keep or drop documents
        #[arg(short = 'f', long = "filter", value_name = "FILTER", allow_hyphen_values = true)]
        filters: Vec<String>,

        /// Property to sort by, or "filename"
        #[arg(short = 's', long = "sort", value_name = "PROP")]
        sort: Option<String>,

        /// Text for missing properties (also -do)
        #[arg(long = "default-output", value_name = "TEXT")]
        default_output: Option<String>,

        /// Leave out the summary
        #[arg(short, long)]
        quiet: bool,

        #[arg(required = true, num_args = 1.., value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Get or set configuration
    #[command(display_order = 9)]
    Config {
        /// Configuration key (e.g. jobs)
        key: Option<String>,

        /// Value to set (if omitted, prints current value)
        value: Option<String>,
    },
}
