//! Catalog view math: filter, sort and paginate over an in-memory list.
//!
//! Everything here is pure. The stateful owner of a [`ViewState`] lives in
//! `pkgcat-engine`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::package::PackageSummary;

/// Page sizes offered by the interactive views
pub const PAGE_SIZE_OPTIONS: [usize; 4] = [5, 10, 25, 50];

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    /// Numeric identifier, ascending
    Id,
    /// Package name, ascending
    #[default]
    Name,
    /// Most recently updated first
    LastUpdated,
}

impl SortKey {
    pub const ALL: [SortKey; 3] = [SortKey::Id, SortKey::Name, SortKey::LastUpdated];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Id => "ID",
            Self::Name => "Name",
            Self::LastUpdated => "Last Updated",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Id => Self::Name,
            Self::Name => Self::LastUpdated,
            Self::LastUpdated => Self::Id,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::LastUpdated => "lastUpdated",
        };
        f.write_str(key)
    }
}

impl FromStr for SortKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" => Ok(Self::Id),
            "name" => Ok(Self::Name),
            "lastupdated" | "last_updated" | "last-updated" | "updated" => Ok(Self::LastUpdated),
            _ => Err(ValidationError::UnknownSortKey(s.to_string())),
        }
    }
}

/// Local search/sort/page projection of the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub search_term: String,
    pub sort_key: SortKey,
    /// 1-based
    pub page: usize,
    pub page_size: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            sort_key: SortKey::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ViewState {
    pub fn new(sort_key: SortKey, page_size: usize) -> Result<Self, ValidationError> {
        if page_size == 0 {
            return Err(ValidationError::InvalidPageSize);
        }
        Ok(Self {
            sort_key,
            page_size,
            ..Self::default()
        })
    }
}

/// Case-insensitive substring match on name or identifier.
///
/// `term` must already be lowercased.
fn matches_lowered(pkg: &PackageSummary, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let name_hit = pkg
        .name
        .as_deref()
        .is_some_and(|name| name.to_lowercase().contains(term));
    name_hit || (!pkg.identifier.is_empty() && pkg.identifier.to_lowercase().contains(term))
}

/// Positions in `list` of the packages matching `term`, in list order
pub fn filter_indices(list: &[PackageSummary], term: &str) -> Vec<usize> {
    let term = term.to_lowercase();
    list.iter()
        .enumerate()
        .filter(|(_, pkg)| matches_lowered(pkg, &term))
        .map(|(i, _)| i)
        .collect()
}

/// Stable sort of positions into `list`
pub fn sort_indices(list: &[PackageSummary], indices: &mut [usize], key: SortKey) {
    indices.sort_by(|&a, &b| compare(&list[a], &list[b], key));
}

pub fn apply_filter<'a>(list: &'a [PackageSummary], term: &str) -> Vec<&'a PackageSummary> {
    filter_indices(list, term)
        .into_iter()
        .map(|i| &list[i])
        .collect()
}

/// Stable sort of an already filtered list
pub fn apply_sort<'a>(
    mut list: Vec<&'a PackageSummary>,
    key: SortKey,
) -> Vec<&'a PackageSummary> {
    list.sort_by(|a, b| compare(a, b, key));
    list
}

pub fn compare(a: &PackageSummary, b: &PackageSummary, key: SortKey) -> Ordering {
    match key {
        SortKey::Id => compare_identifiers(&a.identifier, &b.identifier),
        SortKey::Name => compare_names(
            a.name.as_deref().unwrap_or(""),
            b.name.as_deref().unwrap_or(""),
        ),
        SortKey::LastUpdated => match (a.last_updated, b.last_updated) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}

/// Identifiers that do not start with an integer sort after all numeric
/// ones, ordered among themselves as plain strings.
pub fn compare_identifiers(a: &str, b: &str) -> Ordering {
    match (parse_identifier(a), parse_identifier(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Integer prefix of an identifier: optional leading whitespace and sign,
/// then decimal digits. Trailing text is ignored.
pub fn parse_identifier(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return None;
    }
    let value: i64 = rest[..digits_end].parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Case-folded comparison first, exact comparison as the tie-break
pub fn compare_names(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| a.cmp(b))
}

pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1)).max(1)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub total_pages: usize,
}

/// Slice `list` to the 1-based `page`. Out-of-range pages come back empty.
pub fn paginate<T>(list: &[T], page: usize, page_size: usize) -> Page<'_, T> {
    let page_size = page_size.max(1);
    let start = page.saturating_sub(1).saturating_mul(page_size);
    let items = if page == 0 || start >= list.len() {
        &list[..0]
    } else {
        let end = start.saturating_add(page_size).min(list.len());
        &list[start..end]
    };
    Page {
        items,
        total_pages: total_pages(list.len(), page_size),
    }
}
