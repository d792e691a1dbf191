//! Query to endpoint mapping.

use reelsync_model::{ItemId, MediaItemQuery, UserId};

/// Fields requested for every listing so rows are complete enough to render
pub const ITEM_FIELDS: &str =
    "Overview,Taglines,PrimaryImageAspectRatio,ParentId";

/// How the endpoint wraps its item list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// `{ "Items": [...], "TotalRecordCount": n }`
    QueryResult,
    /// Bare JSON array
    Array,
}

/// A resolved endpoint: path segments plus query parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub segments: Vec<String>,
    pub params: Vec<(&'static str, String)>,
    pub shape: ResponseShape,
}

impl Route {
    fn new(segments: &[&str]) -> Self {
        Self {
            segments: segments.iter().map(|s| s.to_string()).collect(),
            params: Vec::new(),
            shape: ResponseShape::QueryResult,
        }
    }

    fn param(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.params.push((key, value.into()));
        self
    }

    fn array(mut self) -> Self {
        self.shape = ResponseShape::Array;
        self
    }

    /// Listing route for `query` on behalf of `user`.
    pub fn for_query(query: &MediaItemQuery, user: &UserId) -> Self {
        let uid = user.as_str();
        match query {
            MediaItemQuery::AllUserViews => {
                Route::new(&["Users", uid, "Views"])
            }
            MediaItemQuery::ChildrenOf { parent_id } => {
                Route::new(&["Users", uid, "Items"])
                    .param("ParentId", parent_id.as_str())
                    .param("SortBy", "SortName")
                    .param("Fields", ITEM_FIELDS)
            }
            MediaItemQuery::Latest { parent_id } => {
                Route::new(&["Users", uid, "Items", "Latest"])
                    .param("ParentId", parent_id.as_str())
                    .param("Fields", ITEM_FIELDS)
                    .array()
            }
            MediaItemQuery::Resume => {
                Route::new(&["Users", uid, "Items", "Resume"])
                    .param("MediaTypes", "Video")
                    .param("Fields", ITEM_FIELDS)
            }
            MediaItemQuery::NextUp { series_id } => {
                let route = Route::new(&["Shows", "NextUp"])
                    .param("UserId", uid)
                    .param("Fields", ITEM_FIELDS);
                match series_id {
                    Some(series) => route.param("SeriesId", series.as_str()),
                    None => route,
                }
            }
            MediaItemQuery::Favorites => Route::new(&["Users", uid, "Items"])
                .param("Filters", "IsFavorite")
                .param("Recursive", "true")
                .param("Fields", ITEM_FIELDS),
            MediaItemQuery::Search { term } => {
                Route::new(&["Users", uid, "Items"])
                    .param("SearchTerm", term.as_str())
                    .param("Recursive", "true")
                    .param("Fields", ITEM_FIELDS)
            }
            MediaItemQuery::Seasons { series_id } => {
                Route::new(&["Shows", series_id.as_str(), "Seasons"])
                    .param("UserId", uid)
                    .param("Fields", ITEM_FIELDS)
            }
            MediaItemQuery::Episodes {
                series_id,
                season_id,
            } => Route::new(&["Shows", series_id.as_str(), "Episodes"])
                .param("UserId", uid)
                .param("SeasonId", season_id.as_str())
                .param("Fields", ITEM_FIELDS),
        }
    }

    /// Full details of a single item, media sources included.
    pub fn item_details(item: &ItemId, user: &UserId) -> Self {
        Route::new(&["Users", user.as_str(), "Items", item.as_str()])
    }

    pub fn authenticate_by_name() -> Self {
        Route::new(&["Users", "AuthenticateByName"])
    }
}
