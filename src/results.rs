//! Paginated search results.
//!
//! The service returns search matches a page at a time, most relevant first.
//! A [`SearchResult`] holds the pages loaded so far and grows on request;
//! most callers never need more than the first page.

use std::fmt;
use std::ops::Deref;

use serde_json::Value;

use crate::client::Client;
use crate::error::{Error, Result};
use crate::model::{Row, rows_of};

/// Fetches one page (1-based) of a search response document.
pub type PageLoader = Box<dyn FnMut(u32) -> Result<Value>>;

/// Converts one match row into an item.
pub type Converter<T> = Box<dyn Fn(&Row) -> Result<T>>;

/// A growable, ordered sequence of search matches.
pub struct SearchResult<T> {
    items: Vec<T>,
    total: usize,
    last_page: u32,
    field: &'static str,
    loader: PageLoader,
    converter: Converter<T>,
}

impl<T> SearchResult<T> {
    /// Load the first page and wrap it.
    ///
    /// `field` names the match kind: matches are read from
    /// `results.<field>matches.<field>`.
    pub fn new(mut loader: PageLoader, field: &'static str, converter: Converter<T>) -> Result<Self> {
        tracing::debug!(field, page = 1, "Loading search page");
        let document = loader(1)?;
        let (total, rows) = read_page(&document, field)?;
        let mut items = convert_rows(&rows, &converter)?;
        items.truncate(total);

        Ok(Self {
            items,
            total,
            last_page: 1,
            field,
            loader,
            converter,
        })
    }

    /// The total number of matches, as last reported by the service.
    pub fn total_length(&self) -> usize {
        self.total
    }

    /// The last page loaded (1-based).
    pub fn last_page(&self) -> u32 {
        self.last_page
    }

    /// Whether every match has been loaded.
    pub fn is_exhausted(&self) -> bool {
        self.items.len() >= self.total
    }

    /// Load the next page and return the number of items appended.
    ///
    /// Returns 0 without a request once everything is loaded. On failure the
    /// held items and the page counter are unchanged.
    pub fn load_next_page(&mut self) -> Result<usize> {
        if self.is_exhausted() {
            return Ok(0);
        }

        let page = self.last_page + 1;
        tracing::debug!(field = self.field, page, "Loading search page");
        let document = (self.loader)(page)?;
        let (total, rows) = read_page(&document, self.field)?;
        let fresh = convert_rows(&rows, &self.converter)?;

        // Loaded items are never dropped, so a shrunken total bottoms out at
        // what is already held.
        self.total = total.max(self.items.len());
        let room = self.total - self.items.len();
        let appended = fresh.len().min(room);
        self.items.extend(fresh.into_iter().take(appended));
        self.last_page = page;
        Ok(appended)
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T> Deref for SearchResult<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<'a, T> IntoIterator for &'a SearchResult<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T> IntoIterator for SearchResult<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<T: fmt::Debug> fmt::Debug for SearchResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchResult")
            .field("field", &self.field)
            .field("total", &self.total)
            .field("last_page", &self.last_page)
            .field("items", &self.items)
            .finish_non_exhaustive()
    }
}

/// A loader for `method` (e.g. `"artist.search"`) that caches every page
/// under `"<namespace>:<query>:<page>"`.
pub(crate) fn cached_page_loader(
    client: &Client,
    namespace: &'static str,
    method: &'static str,
    param: &'static str,
    query: &str,
) -> PageLoader {
    let client = client.clone();
    let query = query.to_string();
    Box::new(move |page| {
        let id = format!("{query}:{page}");
        let page = page.to_string();
        client.cached_fetch(
            namespace,
            &[Some(id.as_str())],
            || client.call(method, &[(param, query.as_str()), ("page", page.as_str())]),
            |_| vec![id.clone()],
        )
    })
}

fn convert_rows<T>(rows: &[Row], converter: &Converter<T>) -> Result<Vec<T>> {
    rows.iter().map(|row| converter(row)).collect()
}

/// Split a search response into (total match count, rows on this page).
fn read_page(document: &Value, field: &str) -> Result<(usize, Vec<Row>)> {
    let results = document
        .get("results")
        .ok_or_else(|| Error::parse("search response has no \"results\""))?;

    let total = match results.get("opensearch:totalResults") {
        Some(Value::Number(n)) => n.as_u64().map(|n| n as usize),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| Error::parse("search response has no usable total result count"))?;

    let rows = rows_of(
        results
            .get(format!("{field}matches"))
            .and_then(|matches| matches.get(field)),
    );
    Ok((total, rows))
}
