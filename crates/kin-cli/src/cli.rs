use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(
    name = "kin",
    about = "Ancestry queries over parent-referencing JSON records",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// JSON file holding an array of records ("-" reads stdin)
    #[arg(short, long, global = true, default_value = "-")]
    pub nodes: String,

    /// TOML file with a [fields] table
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Record field holding the node id
    #[arg(long, global = true)]
    pub id_field: Option<String>,

    /// Record field holding the parent id
    #[arg(long, global = true)]
    pub parent_field: Option<String>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// List all common ancestors of two ids
    Common(PairArgs),
    /// Closest common ancestor of two ids
    ClosestCommon(PairArgs),
    /// Furthest common ancestor of two ids
    FurthestCommon(PairArgs),
    /// Closest matching ancestor
    ClosestAncestor(QueryArgs),
    /// All matching ancestors
    Ancestors(QueryArgs),
    /// Closest matching descendant
    ClosestDescendant(QueryArgs),
    /// All matching descendants
    Descendants(QueryArgs),
    /// Closest matching descendant of any ancestor
    ClosestSibling(QueryArgs),
    /// All matching descendants of any ancestor
    Siblings(QueryArgs),
    /// Print the record stored under an id
    Get(GetArgs),
    /// Dump the node table and ancestry
    Summary,
}

#[derive(Args)]
pub struct PairArgs {
    pub id1: String,
    pub id2: String,
    /// Only accept ids whose record matches FIELD=VALUE or FIELD^=PREFIX
    #[arg(long = "where")]
    pub filter: Option<Filter>,
}

#[derive(Args)]
pub struct QueryArgs {
    pub id: String,
    /// Only accept ids whose record matches FIELD=VALUE or FIELD^=PREFIX
    #[arg(long = "where")]
    pub filter: Option<Filter>,
}

#[derive(Args)]
pub struct GetArgs {
    pub id: String,
}

/// A node-field predicate from `--where`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Filter {
    Equals { field: String, value: String },
    Prefix { field: String, prefix: String },
}

impl Filter {
    /// Returns `true` if `node` has the field and it matches.
    ///
    /// Placeholder ancestors have no record and never match.
    pub fn matches(&self, node: Option<&Value>) -> bool {
        let Some(node) = node else {
            return false;
        };
        let (field, expected, prefix) = match self {
            Self::Equals { field, value } => (field, value, false),
            Self::Prefix { field, prefix } => (field, prefix, true),
        };
        let actual = match node.get(field) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => return false,
            Some(other) => other.to_string(),
        };
        if prefix {
            actual.starts_with(expected.as_str())
        } else {
            actual == *expected
        }
    }
}

impl FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((field, prefix)) = s.split_once("^=") {
            if !field.is_empty() {
                return Ok(Self::Prefix {
                    field: field.into(),
                    prefix: prefix.into(),
                });
            }
        } else if let Some((field, value)) = s.split_once('=') {
            if !field.is_empty() {
                return Ok(Self::Equals {
                    field: field.into(),
                    value: value.into(),
                });
            }
        }
        Err(format!("expected FIELD=VALUE or FIELD^=PREFIX, got `{s}`"))
    }
}
