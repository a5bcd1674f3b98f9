use super::types::Command;
use crate::document::filter::{Filter, Patch};
use crate::document::types::Document;
use crate::error::{ClusterError, Result};
use crate::partition::types::{CollectionKind, Granularity};

use regex::Regex;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::LazyLock;

static COMMAND_HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([A-Za-z_]+)\s*(.*?)\s*$").unwrap(/* known good */));

/// A bare word: collection name, key, granularity, or path.
static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^\s{\[]+)\s*(.*)$").unwrap(/* known good */));

/// Parses one command line. Literals are JSON, read with a stream
/// deserializer; nothing is ever evaluated.
pub fn parse_command(line: &str) -> Result<Command> {
    let Some(caps) = COMMAND_HEAD.captures(line) else {
        return Err(ClusterError::malformed(format!("cannot parse command '{line}'")));
    };
    let verb = caps[1].to_ascii_lowercase();
    let rest = caps.get(2).map_or("", |m| m.as_str());

    match verb.as_str() {
        "status" => no_arguments(rest, Command::Status),
        "audit" => no_arguments(rest, Command::Audit),
        "help" => no_arguments(rest, Command::Help),
        "exit" | "quit" => no_arguments(rest, Command::Exit),
        "find" => {
            let (collection, rest) = collection(rest)?;
            let [filter] = optional_literals::<1>(rest)?;
            Ok(Command::Find {
                collection,
                filter: Filter::from_value(filter)?,
            })
        }
        "insert" => {
            let (collection, rest) = collection(rest)?;
            let [document] = literals::<1>(rest)?;
            Ok(Command::Insert {
                collection,
                document: to_document(document)?,
            })
        }
        "insert_multiple" => {
            let (collection, rest) = collection(rest)?;
            let [documents] = literals::<1>(rest)?;
            let Value::Array(items) = documents else {
                return Err(ClusterError::malformed("insert_multiple expects a JSON array"));
            };
            Ok(Command::InsertMultiple {
                collection,
                documents: items.into_iter().map(to_document).collect::<Result<_>>()?,
            })
        }
        "update" => {
            let (collection, rest) = collection(rest)?;
            let [filter, patch] = literals::<2>(rest)?;
            Ok(Command::Update {
                collection,
                filter: Filter::from_value(filter)?,
                patch: Patch::from_value(patch)?,
            })
        }
        "delete" => {
            let (collection, rest) = collection(rest)?;
            let [filter] = literals::<1>(rest)?;
            Ok(Command::Delete {
                collection,
                filter: Filter::from_value(filter)?,
            })
        }
        "join" => {
            let (left, rest) = collection(rest)?;
            let (right, rest) = collection(rest)?;
            let (match_key, rest) = word(rest, "match key")?;
            let [left_filter, right_filter] = optional_literals::<2>(rest)?;
            Ok(Command::Join {
                left,
                right,
                match_key: match_key.to_string(),
                left_filter: Filter::from_value(left_filter)?,
                right_filter: Filter::from_value(right_filter)?,
            })
        }
        "find_articles_read" => {
            let [user_filter] = optional_literals::<1>(rest)?;
            Ok(Command::FindArticlesRead {
                user_filter: Filter::from_value(user_filter)?,
            })
        }
        "find_top_articles" => {
            let (name, rest) = word(rest, "granularity")?;
            let granularity: Granularity = name.parse()?;
            no_arguments(rest, Command::FindTopArticles { granularity })
        }
        "load" => {
            if rest.is_empty() {
                return Err(ClusterError::malformed("load expects a directory"));
            }
            Ok(Command::Load {
                dir: PathBuf::from(rest),
            })
        }
        "aggregate" => {
            let (pass, rest) = word(rest, "pass name")?;
            match pass.to_ascii_lowercase().as_str() {
                "be_read" | "be-read" | "beread" => Ok(Command::AggregateBeRead {
                    log_dir: (!rest.is_empty()).then(|| PathBuf::from(rest)),
                }),
                "popular_rank" | "popular-rank" | "popularrank" => {
                    no_arguments(rest, Command::AggregatePopularRank)
                }
                other => Err(ClusterError::malformed(format!(
                    "unknown aggregation pass '{other}'"
                ))),
            }
        }
        other => Err(ClusterError::malformed(format!(
            "unknown command '{other}', type 'help' for a list"
        ))),
    }
}

fn no_arguments(rest: &str, command: Command) -> Result<Command> {
    if rest.trim().is_empty() {
        Ok(command)
    } else {
        Err(ClusterError::malformed(format!("unexpected arguments '{rest}'")))
    }
}

fn word<'a>(text: &'a str, what: &str) -> Result<(&'a str, &'a str)> {
    let Some(caps) = WORD.captures(text.trim_start()) else {
        return Err(ClusterError::malformed(format!("missing {what}")));
    };
    let (Some(word), Some(rest)) = (caps.get(1), caps.get(2)) else {
        return Err(ClusterError::malformed(format!("missing {what}")));
    };
    Ok((word.as_str(), rest.as_str()))
}

fn collection(text: &str) -> Result<(CollectionKind, &str)> {
    let (name, rest) = word(text, "collection name")?;
    Ok((name.parse()?, rest))
}

/// Every JSON value in `text`, in order. Trailing garbage is an error.
fn stream(text: &str) -> Result<Vec<Value>> {
    serde_json::Deserializer::from_str(text)
        .into_iter::<Value>()
        .map(|item| item.map_err(|err| ClusterError::malformed(format!("invalid literal: {err}"))))
        .collect()
}

/// Exactly `N` literals.
fn literals<const N: usize>(text: &str) -> Result<[Value; N]> {
    let values = stream(text)?;
    let found = values.len();
    values
        .try_into()
        .map_err(|_| ClusterError::malformed(format!("expected {N} JSON literal(s), found {found}")))
}

/// Up to `N` literals; missing trailing ones are `{}`.
fn optional_literals<const N: usize>(text: &str) -> Result<[Value; N]> {
    let mut values = stream(text)?;
    if values.len() > N {
        return Err(ClusterError::malformed(format!(
            "expected at most {N} JSON literal(s), found {}",
            values.len()
        )));
    }
    values.resize(N, Value::Object(Default::default()));
    values
        .try_into()
        .map_err(|_| ClusterError::malformed("literal count mismatch"))
}

fn to_document(value: Value) -> Result<Document> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ClusterError::malformed(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}
