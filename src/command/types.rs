use crate::document::filter::{Filter, Patch};
use crate::document::types::Document;
use crate::partition::types::{CollectionKind, Granularity};

use std::path::PathBuf;

/// One parsed command line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Status,
    Find {
        collection: CollectionKind,
        filter: Filter,
    },
    Insert {
        collection: CollectionKind,
        document: Document,
    },
    InsertMultiple {
        collection: CollectionKind,
        documents: Vec<Document>,
    },
    Update {
        collection: CollectionKind,
        filter: Filter,
        patch: Patch,
    },
    Delete {
        collection: CollectionKind,
        filter: Filter,
    },
    Join {
        left: CollectionKind,
        right: CollectionKind,
        match_key: String,
        left_filter: Filter,
        right_filter: Filter,
    },
    FindArticlesRead {
        user_filter: Filter,
    },
    FindTopArticles {
        granularity: Granularity,
    },
    Load {
        dir: PathBuf,
    },
    /// Pass A; reads `read.dat`/`article.dat` from `log_dir`, or the shards.
    AggregateBeRead {
        log_dir: Option<PathBuf>,
    },
    AggregatePopularRank,
    Audit,
    Help,
    Exit,
}

/// What the shell hands back for one command.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Lines(Vec<String>),
    Exit,
}

pub const USAGE: &str = "\
Commands:
  status
  find <collection> [filter]
  insert <collection> <document>
  insert_multiple <collection> [<document>, ...]
  update <collection> <filter> <patch>
  delete <collection> <filter>
  join <collection1> <collection2> <match_key> [filter1] [filter2]
  find_articles_read [user-filter]
  find_top_articles <daily|weekly|monthly|alltime>
  load <dir>
  aggregate be_read [log-dir]
  aggregate popular_rank
  audit
  help
  exit
Collections: User, Article, Read, Be-Read, Popular-Rank
Filters, patches and documents are JSON objects, e.g. {\"region\": \"Beijing\"}";
