//! Marketplace products and their taxonomy references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::taxonomy::{TaxonomyId, TaxonomyKind, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use crate::record_id;

record_id!(i64, ProductId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    #[default]
    Draft,
    Published,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Draft => "draft",
            ProductStatus::Published => "published",
        }
    }
}

/// A product listing. Prices are in minor currency units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub category_id: TaxonomyId,
    pub industry_id: TaxonomyId,
    pub tool_ids: Vec<TaxonomyId>,
    pub status: ProductStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn is_published(&self) -> bool {
        self.status == ProductStatus::Published
    }

    /// Every taxonomy item whose product count tracks this product.
    ///
    /// Tools listed more than once are counted once.
    pub fn taxonomy_refs(&self) -> Vec<(TaxonomyKind, TaxonomyId)> {
        taxonomy_refs(self.category_id, self.industry_id, &self.tool_ids)
    }
}

pub(crate) fn taxonomy_refs(
    category_id: TaxonomyId,
    industry_id: TaxonomyId,
    tool_ids: &[TaxonomyId],
) -> Vec<(TaxonomyKind, TaxonomyId)> {
    let mut refs = vec![
        (TaxonomyKind::Category, category_id),
        (TaxonomyKind::Industry, industry_id),
    ];
    let mut tools: Vec<TaxonomyId> = tool_ids.to_vec();
    tools.sort();
    tools.dedup();
    refs.extend(tools.into_iter().map(|id| (TaxonomyKind::Tool, id)));
    refs
}

/// Create payload. New products always start as drafts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: i64,
    pub category_id: TaxonomyId,
    pub industry_id: TaxonomyId,
    #[serde(default)]
    pub tool_ids: Vec<TaxonomyId>,
}

impl NewProduct {
    pub fn taxonomy_refs(&self) -> Vec<(TaxonomyKind, TaxonomyId)> {
        taxonomy_refs(self.category_id, self.industry_id, &self.tool_ids)
    }
}

/// Query string for the product listing. Results are newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub status: Option<ProductStatus>,
    #[serde(default)]
    pub category_id: Option<TaxonomyId>,
    #[serde(default)]
    pub search: Option<String>,
}

impl ProductQuery {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT)
    }

    pub fn matches(&self, product: &Product) -> bool {
        if self.status.is_some_and(|s| s != product.status) {
            return false;
        }
        if self.category_id.is_some_and(|c| c != product.category_id) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => product
                .title
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            _ => true,
        }
    }
}
