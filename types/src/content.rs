//! Reference to a piece of content on the ledger.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a post on the ledger by its author and permalink.
///
/// The pair is unique across all votes, open or resolved.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentRef {
    pub author: String,
    pub permalink: String,
}

impl ContentRef {
    pub fn new(author: impl Into<String>, permalink: impl Into<String>) -> Result<Self, TypesError> {
        let author = author.into();
        let permalink = permalink.into();
        if author.is_empty() || permalink.is_empty() {
            return Err(TypesError::EmptyContentRef);
        }
        Ok(Self { author, permalink })
    }

    /// Link to the post on the public frontend, used in venue announcements.
    pub fn link(&self, frontend: &str) -> String {
        format!(
            "{}/@{}/{}",
            frontend.trim_end_matches('/'),
            self.author,
            self.permalink
        )
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.author, self.permalink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_parts_are_rejected() {
        assert_eq!(ContentRef::new("", "post"), Err(TypesError::EmptyContentRef));
        assert_eq!(ContentRef::new("alice", ""), Err(TypesError::EmptyContentRef));
    }

    #[test]
    fn link_joins_frontend_author_and_permalink() {
        let content = ContentRef::new("alice", "post1").unwrap();
        assert_eq!(content.link("https://golos.io/"), "https://golos.io/@alice/post1");
        assert_eq!(content.to_string(), "alice/post1");
    }
}
