//! Taxonomy records: categories, industries and tools.
//!
//! All three kinds share one shape and one lifecycle, so they are stored as
//! [`TaxonomyItem`] tagged with a [`TaxonomyKind`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record_id;

record_id!(i64, TaxonomyId);

/// Icon assigned when a create payload does not name one.
pub const DEFAULT_ICON: &str = "Package";

/// Which taxonomy collection an item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxonomyKind {
    Category,
    Industry,
    Tool,
}

impl TaxonomyKind {
    pub const ALL: [TaxonomyKind; 3] = [
        TaxonomyKind::Category,
        TaxonomyKind::Industry,
        TaxonomyKind::Tool,
    ];

    /// Human-readable singular name, used in messages ("Category not found").
    pub fn display_name(&self) -> &'static str {
        match self {
            TaxonomyKind::Category => "Category",
            TaxonomyKind::Industry => "Industry",
            TaxonomyKind::Tool => "Tool",
        }
    }

    /// URL collection segment under `/v1`.
    pub fn collection(&self) -> &'static str {
        match self {
            TaxonomyKind::Category => "categories",
            TaxonomyKind::Industry => "industries",
            TaxonomyKind::Tool => "tools",
        }
    }
}

impl std::fmt::Display for TaxonomyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A category, industry or tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyItem {
    pub id: TaxonomyId,
    pub kind: TaxonomyKind,
    pub name: String,
    pub icon: String,
    pub is_active: bool,
    /// Number of published products referencing this item.
    pub product_count: u32,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaxonomyItem {
    /// Visible to reads: not soft-deleted.
    pub fn is_visible(&self) -> bool {
        !self.is_deleted
    }

    /// Case-insensitive name comparison used for uniqueness.
    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }
}

/// Create payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTaxonomyItem {
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl NewTaxonomyItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// Partial update payload. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl TaxonomyUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.icon.is_none() && self.is_active.is_none()
    }
}

/// Sortable fields for taxonomy listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortField {
    #[default]
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "createdAt")]
    CreatedAt,
    #[serde(rename = "productCount")]
    ProductCount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Query string for list endpoints, as received.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub sort: Option<SortField>,
    #[serde(default)]
    pub order: Option<SortOrder>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// A [`ListQuery`] with defaults applied and bounds clamped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub page: u32,
    pub limit: u32,
    pub sort: SortField,
    pub order: SortOrder,
    pub search: Option<String>,
    pub is_active: Option<bool>,
}

impl Default for ListParams {
    fn default() -> Self {
        ListQuery::default().normalized()
    }
}

impl ListQuery {
    pub fn normalized(&self) -> ListParams {
        ListParams {
            page: self.page.unwrap_or(1).max(1),
            limit: self
                .limit
                .unwrap_or(DEFAULT_PAGE_LIMIT)
                .clamp(1, MAX_PAGE_LIMIT),
            sort: self.sort.unwrap_or_default(),
            order: self.order.unwrap_or_default(),
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_lowercase),
            is_active: self.is_active,
        }
    }
}

impl ListParams {
    /// Number of records skipped before this page.
    pub fn offset(&self) -> usize {
        ((self.page - 1) as usize) * self.limit as usize
    }

    /// Whether an item passes the search and activity filters.
    pub fn matches(&self, item: &TaxonomyItem) -> bool {
        if let Some(active) = self.is_active {
            if item.is_active != active {
                return false;
            }
        }
        match &self.search {
            Some(needle) => item.name.to_lowercase().contains(needle.as_str()),
            None => true,
        }
    }

    /// Ordering between two items under the selected sort field and order.
    pub fn compare(&self, a: &TaxonomyItem, b: &TaxonomyItem) -> std::cmp::Ordering {
        let ordering = match self.sort {
            SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::ProductCount => a.product_count.cmp(&b.product_count),
        }
        .then_with(|| a.id.cmp(&b.id));

        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// Pagination block returned alongside list results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: usize,
    pub total_pages: usize,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: usize) -> Self {
        let limit_usize = limit.max(1) as usize;
        Self {
            page,
            limit,
            total,
            total_pages: total.div_ceil(limit_usize),
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    /// Slice an already filtered and sorted result set into a page.
    pub fn from_sorted(all: Vec<T>, params: &ListParams) -> Self {
        let total = all.len();
        let items = all
            .into_iter()
            .skip(params.offset())
            .take(params.limit as usize)
            .collect();
        Self {
            items,
            pagination: Pagination::new(params.page, params.limit, total),
        }
    }
}
