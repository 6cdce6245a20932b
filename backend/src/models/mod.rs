//! Domain records for the marketplace.
//!
//! - [`taxonomy`]: categories, industries and tools plus list/paging parameters
//! - [`product`]: product listings that reference taxonomy items
//! - [`promocode`]: discount codes and their use-time checks
//! - [`analytics`]: tracked events, shared by client and server

pub mod macros;

pub mod analytics;
pub mod product;
pub mod promocode;
pub mod taxonomy;

pub use analytics::{AnalyticsEvent, EventBatch, EventStats, EventType, Properties, StoredEvent};
pub use product::{NewProduct, Product, ProductId, ProductQuery, ProductStatus};
pub use promocode::{
    DiscountType, NewPromocode, Promocode, PromocodeApplication, PromocodeId, PromocodeQuote,
    PromocodeRejection,
};
pub use taxonomy::{
    ListParams, ListQuery, NewTaxonomyItem, Page, Pagination, SortField, SortOrder, TaxonomyId,
    TaxonomyItem, TaxonomyKind, TaxonomyUpdate, DEFAULT_ICON,
};
