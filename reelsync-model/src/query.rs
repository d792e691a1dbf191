use std::fmt::{self, Display};

use crate::error::{ModelError, Result};
use crate::ids::ItemId;

const PARAM_SEPARATOR: char = ':';

/// A catalog list the client knows how to fetch and cache.
///
/// Every variant maps to exactly one cache key of the form
/// `<kind>[:<param>...]`. Parameters are percent-encoded before they are
/// joined, so the separator can never appear inside a parameter and two
/// queries share a key only when they are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MediaItemQuery {
    /// Top-level libraries visible to the current user
    AllUserViews,
    /// Direct children of a library or folder
    ChildrenOf { parent_id: ItemId },
    /// Recently added items below a library
    Latest { parent_id: ItemId },
    /// Partially watched items
    Resume,
    /// Next episode to watch, optionally restricted to a single series
    NextUp { series_id: Option<ItemId> },
    Favorites,
    Search { term: String },
    Seasons { series_id: ItemId },
    Episodes { series_id: ItemId, season_id: ItemId },
}

impl MediaItemQuery {
    /// Name of the variant; the first segment of the cache key.
    pub fn kind(&self) -> &'static str {
        match self {
            MediaItemQuery::AllUserViews => "AllUserViews",
            MediaItemQuery::ChildrenOf { .. } => "ChildrenOf",
            MediaItemQuery::Latest { .. } => "Latest",
            MediaItemQuery::Resume => "Resume",
            MediaItemQuery::NextUp { .. } => "NextUp",
            MediaItemQuery::Favorites => "Favorites",
            MediaItemQuery::Search { .. } => "Search",
            MediaItemQuery::Seasons { .. } => "Seasons",
            MediaItemQuery::Episodes { .. } => "Episodes",
        }
    }

    fn params(&self) -> Vec<&str> {
        match self {
            MediaItemQuery::AllUserViews
            | MediaItemQuery::Resume
            | MediaItemQuery::Favorites => Vec::new(),
            MediaItemQuery::ChildrenOf { parent_id }
            | MediaItemQuery::Latest { parent_id } => vec![parent_id.as_str()],
            MediaItemQuery::NextUp { series_id } => {
                series_id.iter().map(|id| id.as_str()).collect()
            }
            MediaItemQuery::Search { term } => vec![term.as_str()],
            MediaItemQuery::Seasons { series_id } => vec![series_id.as_str()],
            MediaItemQuery::Episodes {
                series_id,
                season_id,
            } => vec![series_id.as_str(), season_id.as_str()],
        }
    }

    /// Deterministic key addressing this query's list in the local store.
    pub fn cache_key(&self) -> String {
        let mut key = String::from(self.kind());
        for param in self.params() {
            key.push(PARAM_SEPARATOR);
            key.push_str(&urlencoding::encode(param));
        }
        key
    }

    /// Inverse of [`MediaItemQuery::cache_key`].
    pub fn from_cache_key(key: &str) -> Result<Self> {
        let invalid = || ModelError::InvalidCacheKey(key.to_string());

        let mut segments = key.split(PARAM_SEPARATOR);
        let kind = segments.next().ok_or_else(invalid)?;
        let params = segments
            .map(|raw| {
                urlencoding::decode(raw)
                    .map(|decoded| decoded.into_owned())
                    .map_err(|_| invalid())
            })
            .collect::<Result<Vec<String>>>()?;

        let query = match (kind, params.as_slice()) {
            ("AllUserViews", []) => MediaItemQuery::AllUserViews,
            ("ChildrenOf", [parent]) => MediaItemQuery::ChildrenOf {
                parent_id: ItemId::from(parent.as_str()),
            },
            ("Latest", [parent]) => MediaItemQuery::Latest {
                parent_id: ItemId::from(parent.as_str()),
            },
            ("Resume", []) => MediaItemQuery::Resume,
            ("NextUp", []) => MediaItemQuery::NextUp { series_id: None },
            ("NextUp", [series]) => MediaItemQuery::NextUp {
                series_id: Some(ItemId::from(series.as_str())),
            },
            ("Favorites", []) => MediaItemQuery::Favorites,
            ("Search", [term]) => MediaItemQuery::Search { term: term.clone() },
            ("Seasons", [series]) => MediaItemQuery::Seasons {
                series_id: ItemId::from(series.as_str()),
            },
            ("Episodes", [series, season]) => MediaItemQuery::Episodes {
                series_id: ItemId::from(series.as_str()),
                season_id: ItemId::from(season.as_str()),
            },
            _ => return Err(invalid()),
        };
        Ok(query)
    }
}

impl Display for MediaItemQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cache_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn sample_queries() -> Vec<MediaItemQuery> {
        vec![
            MediaItemQuery::AllUserViews,
            MediaItemQuery::ChildrenOf {
                parent_id: "lib1".into(),
            },
            MediaItemQuery::ChildrenOf {
                parent_id: "lib2".into(),
            },
            MediaItemQuery::Latest {
                parent_id: "lib1".into(),
            },
            MediaItemQuery::Resume,
            MediaItemQuery::NextUp { series_id: None },
            MediaItemQuery::NextUp {
                series_id: Some("s1".into()),
            },
            MediaItemQuery::Favorites,
            MediaItemQuery::Search { term: "a:b".into() },
            MediaItemQuery::Search { term: "a".into() },
            MediaItemQuery::Search { term: "".into() },
            MediaItemQuery::Seasons {
                series_id: "s1".into(),
            },
            MediaItemQuery::Episodes {
                series_id: "s1".into(),
                season_id: "x".into(),
            },
            MediaItemQuery::Episodes {
                series_id: "s1:x".into(),
                season_id: "".into(),
            },
        ]
    }

    #[test]
    fn parameterless_queries_use_bare_kind() {
        assert_eq!(MediaItemQuery::AllUserViews.cache_key(), "AllUserViews");
        assert_eq!(MediaItemQuery::Resume.cache_key(), "Resume");
        assert_eq!(
            MediaItemQuery::NextUp { series_id: None }.cache_key(),
            "NextUp"
        );
    }

    #[test]
    fn equal_queries_share_a_key() {
        let a = MediaItemQuery::ChildrenOf {
            parent_id: ItemId::from("abc"),
        };
        let b = MediaItemQuery::ChildrenOf {
            parent_id: ItemId::new(String::from("abc")),
        };
        assert_eq!(a.cache_key(), b.cache_key());
        assert_eq!(a.cache_key(), "ChildrenOf:abc");
    }

    #[test]
    fn distinct_queries_never_collide() {
        let queries = sample_queries();
        let keys: HashSet<String> =
            queries.iter().map(MediaItemQuery::cache_key).collect();
        assert_eq!(keys.len(), queries.len());
    }

    #[test]
    fn separator_inside_params_is_escaped() {
        let query = MediaItemQuery::Search {
            term: "star wars: a new hope".into(),
        };
        assert_eq!(query.cache_key(), "Search:star%20wars%3A%20a%20new%20hope");
    }

    #[test]
    fn cache_keys_parse_back_into_queries() {
        for query in sample_queries() {
            let parsed = MediaItemQuery::from_cache_key(&query.cache_key())
                .expect("cache key should parse");
            assert_eq!(parsed, query);
        }
    }

    #[test]
    fn unknown_or_malformed_keys_are_rejected() {
        for key in
            ["Bogus", "Resume:extra", "Episodes:only-one", "ChildrenOf"]
        {

            assert_eq!(
                MediaItemQuery::from_cache_key(key),
                Err(ModelError::InvalidCacheKey(key.to_string()))
            );
        }
    }
}
