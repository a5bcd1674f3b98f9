use crate::document::types::Document;

use serde::Serialize;

/// One media file referenced by an article.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MediaBlob {
    pub filename: String,
    /// `None` when the media store has no file by that name.
    #[serde(skip)]
    pub bytes: Option<Vec<u8>>,
}

impl MediaBlob {
    pub fn size(&self) -> Option<usize> {
        self.bytes.as_ref().map(Vec::len)
    }
}

/// An article at its position in a Popular-Rank snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct RankedArticle {
    /// 1-based position in the snapshot.
    pub rank: usize,
    pub article: Document,
    pub media: Vec<MediaBlob>,
}
