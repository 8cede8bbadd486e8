use crate::errors::ApiError;
use axum::extract::{FromRequestParts, Query};
use http::request::Parts;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// A validated, 1-based page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub index: u32,
    pub size: u32,
}

impl PageRequest {
    pub fn new(index: u32, size: u32) -> Result<Self, String> {
        if index < 1 {
            return Err(format!("pageIndex must be at least 1, got {index}"));
        }
        if size < 1 || size > MAX_PAGE_SIZE {
            return Err(format!(
                "pageSize must be between 1 and {MAX_PAGE_SIZE}, got {size}"
            ));
        }
        Ok(Self { index, size })
    }

    /// Number of items to skip before this page starts
    pub fn offset(&self) -> usize {
        (self.index as usize - 1).saturating_mul(self.size as usize)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            index: 1,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Query string accepted by every list endpoint
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Substring filter, matched against the entity's searchable fields
    pub filter: Option<String>,
    /// 1-based page index (default: 1)
    pub page_index: Option<u32>,
    /// Page size (default: 10, max: 100)
    pub page_size: Option<u32>,
}

impl ListQuery {
    pub fn page(&self) -> Result<PageRequest, String> {
        PageRequest::new(
            self.page_index.unwrap_or(1),
            self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
    }

    /// The filter, ignoring blank values
    pub fn filter(&self) -> Option<&str> {
        self.filter
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
    }
}

impl<S> FromRequestParts<S> for ListQuery
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<Self>::from_request_parts(parts, state).await?;
        Ok(query)
    }
}

/// One page of a list query
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_records: usize,
}

impl<T> Page<T> {
    /// Cuts the requested window out of an already filtered sequence
    pub fn slice<I>(items: I, request: PageRequest) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let all: Vec<T> = items.into_iter().collect();
        let total_records = all.len();
        let items = all
            .into_iter()
            .skip(request.offset())
            .take(request.size as usize)
            .collect();
        Self {
            items,
            total_records,
        }
    }

    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_records: self.total_records,
        }
    }
}

/// Case-sensitive substring match used by list filters
pub(crate) fn matches_filter<'a>(
    filter: Option<&str>,
    fields: impl IntoIterator<Item = Option<&'a str>>,
) -> bool {
    match filter {
        None => true,
        Some(needle) => fields
            .into_iter()
            .flatten()
            .any(|field| field.contains(needle)),
    }
}
