use std::fs;
use std::io;

use anyhow::Context;
use colored::Colorize;
use kin_index::{CommonAncestor, JsonIndex, NodeKey};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::cli::*;
use crate::config::KinConfig;

/// The outcome of one command, before rendering.
#[derive(Debug, PartialEq)]
pub enum Report {
    Id(Option<NodeKey>),
    Ids(Vec<NodeKey>),
    Common(Vec<(NodeKey, CommonAncestor)>),
    Node(NodeKey, Option<Value>),
    Summary(Value),
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => KinConfig::load(path)?,
        None => KinConfig::default(),
    }
    .with_overrides(cli.id_field.clone(), cli.parent_field.clone());
    debug!(id = %config.fields.id, parent_id = %config.fields.parent_id, "field selectors");

    let input = read_nodes(&cli.nodes)?;
    let index = JsonIndex::from_json_str(&input, &config.fields)
        .with_context(|| format!("building index from {}", cli.nodes))?;
    info!(nodes = index.len(), "index ready");

    let report = execute(&index, cli.command)?;
    match cli.format {
        OutputFormat::Text => print_text(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&to_json(&report))?),
    }
    Ok(())
}

fn read_nodes(source: &str) -> anyhow::Result<String> {
    if source == "-" {
        io::read_to_string(io::stdin()).context("reading records from stdin")
    } else {
        fs::read_to_string(source).with_context(|| format!("reading records from {source}"))
    }
}

/// Run a query command against a built index.
pub fn execute(index: &JsonIndex, command: Command) -> anyhow::Result<Report> {
    let report = match command {
        Command::Common(args) => {
            let accept = accept_fn(index, args.filter.as_ref());
            let (id1, id2) = (key(index, &args.id1), key(index, &args.id2));
            let common = index.common_ancestors(&id1, &id2)?;
            Report::Common(common.into_iter().filter(|(id, _)| accept(id)).collect())
        }
        Command::ClosestCommon(args) => {
            let accept = accept_fn(index, args.filter.as_ref());
            let predicate = args
                .filter
                .as_ref()
                .map(|_| &accept as &dyn Fn(&NodeKey) -> bool);
            let (id1, id2) = (key(index, &args.id1), key(index, &args.id2));
            Report::Id(index.closest_common_ancestor(&id1, &id2, predicate)?)
        }
        Command::FurthestCommon(args) => {
            let accept = accept_fn(index, args.filter.as_ref());
            let predicate = args
                .filter
                .as_ref()
                .map(|_| &accept as &dyn Fn(&NodeKey) -> bool);
            let (id1, id2) = (key(index, &args.id1), key(index, &args.id2));
            Report::Id(index.furthest_common_ancestor(&id1, &id2, predicate)?)
        }
        Command::ClosestAncestor(args) => {
            let id = key(index, &args.id);
            Report::Id(index.closest_ancestor(&id, accept_fn(index, args.filter.as_ref()))?)
        }
        Command::Ancestors(args) => {
            let id = key(index, &args.id);
            Report::Ids(index.all_ancestors(&id, accept_fn(index, args.filter.as_ref()))?)
        }
        Command::ClosestDescendant(args) => {
            let id = key(index, &args.id);
            Report::Id(index.closest_descendant(&id, accept_fn(index, args.filter.as_ref()))?)
        }
        Command::Descendants(args) => {
            let id = key(index, &args.id);
            Report::Ids(index.all_descendants(&id, accept_fn(index, args.filter.as_ref()))?)
        }
        Command::ClosestSibling(args) => {
            let accept = accept_fn(index, args.filter.as_ref());
            let id = key(index, &args.id);
            Report::Id(index.closest_sibling(&id, |c| accept(c.descendant))?)
        }
        Command::Siblings(args) => {
            let accept = accept_fn(index, args.filter.as_ref());
            let id = key(index, &args.id);
            Report::Ids(index.all_siblings(&id, |c| accept(c.descendant))?)
        }
        Command::Get(args) => {
            let id = key(index, &args.id);
            let node = index.get(&id).cloned();
            Report::Node(id, node)
        }
        Command::Summary => Report::Summary(serde_json::to_value(index.summary())?),
    };
    Ok(report)
}

fn key(index: &JsonIndex, raw: &str) -> NodeKey {
    index.resolve_key(raw)
}

/// Without a filter every id is accepted.
fn accept_fn<'a>(
    index: &'a JsonIndex,
    filter: Option<&'a Filter>,
) -> impl Fn(&NodeKey) -> bool + 'a {
    move |id: &NodeKey| filter.map_or(true, |f| f.matches(index.get(id)))
}

fn to_json(report: &Report) -> Value {
    match report {
        Report::Id(id) => json!(id),
        Report::Ids(ids) => json!(ids),
        Report::Common(common) => Value::Array(
            common
                .iter()
                .map(|(id, c)| {
                    json!({
                        "id": id,
                        "distance1": c.distance1,
                        "distance2": c.distance2,
                        "totalDistance": c.total_distance,
                    })
                })
                .collect(),
        ),
        Report::Node(_, node) => node.clone().unwrap_or(Value::Null),
        Report::Summary(summary) => summary.clone(),
    }
}

fn print_text(report: &Report) {
    match report {
        Report::Id(Some(id)) => println!("{}", id.to_string().yellow()),
        Report::Id(None) => println!("{}", "(none)".dimmed()),
        Report::Ids(ids) if ids.is_empty() => println!("{}", "(none)".dimmed()),
        Report::Ids(ids) => {
            for id in ids {
                println!("{}", id.to_string().yellow());
            }
        }
        Report::Common(common) if common.is_empty() => println!("{}", "(none)".dimmed()),
        Report::Common(common) => {
            println!("{:<16} {:>6} {:>6} {:>6}", "ancestor".bold(), "d1", "d2", "total");
            for (id, c) in common {
                println!(
                    "{:<16} {:>6} {:>6} {:>6}",
                    id.to_string().yellow(),
                    c.distance1,
                    c.distance2,
                    c.total_distance.to_string().bold()
                );
            }
        }
        Report::Node(id, Some(node)) => {
            println!("{} {}", "record".green(), id.to_string().yellow().bold());
            println!("{}", serde_json::to_string_pretty(node).unwrap_or_default());
        }
        Report::Node(id, None) => println!("No record for {}", id.to_string().yellow()),
        Report::Summary(summary) => print_summary(summary),
    }
}

fn print_summary(summary: &Value) {
    let empty = Vec::new();
    let nodes = summary["nodes"].as_array().unwrap_or(&empty);
    let rows = summary["ancestry"].as_array().unwrap_or(&empty);
    let placeholders = rows.iter().filter(|r| r["origin"] == "placeholder").count();

    println!(
        "{} records, {} ancestry entries ({} placeholders)",
        nodes.len().to_string().bold(),
        rows.len().to_string().bold(),
        placeholders
    );
    for row in rows {
        let origin = match row["origin"].as_str() {
            Some("real") => "real".green(),
            _ => "placeholder".cyan(),
        };
        println!(
            "  {} [{}] parent={} ancestors={} descendants={}",
            render_key(&row["id"]).yellow(),
            origin,
            render_key(&row["parent"]),
            render_chain(&row["ancestors"]),
            render_chain(&row["descendants"]),
        );
    }
}

fn render_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".into(),
        other => other.to_string(),
    }
}

/// `[[15,1],[13,2]]` -> `15:1 13:2`
fn render_chain(value: &Value) -> String {
    let pairs: Vec<String> = value
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .map(|pair| format!("{}:{}", render_key(&pair[0]), pair[1]))
                .collect()
        })
        .unwrap_or_default();
    if pairs.is_empty() {
        "-".into()
    } else {
        pairs.join(" ")
    }
}
