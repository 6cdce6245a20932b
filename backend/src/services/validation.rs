//! Payload validation.
//!
//! Each `validate_*` function collects every failing field before returning,
//! so a client sees all problems with a request at once.

use serde::Serialize;

use super::{ServiceError, ServiceResult};
use crate::models::{
    DiscountType, EventBatch, NewProduct, NewPromocode, NewTaxonomyItem, PromocodeApplication,
    TaxonomyKind, TaxonomyUpdate,
};

pub const NAME_MIN_LEN: usize = 2;
pub const NAME_MAX_LEN: usize = 50;
pub const ICON_MAX_LEN: usize = 50;
pub const TITLE_MIN_LEN: usize = 3;
pub const TITLE_MAX_LEN: usize = 120;
pub const DESCRIPTION_MAX_LEN: usize = 5000;
pub const CODE_MIN_LEN: usize = 3;
pub const CODE_MAX_LEN: usize = 32;
pub const EVENT_NAME_MAX_LEN: usize = 100;

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Accumulates field errors.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, field: &str, message: impl Into<String>) -> &mut Self {
        if !ok {
            self.errors.push(FieldError::new(field, message));
        }
        self
    }

    /// Length check on the trimmed value, counted in characters.
    pub fn length(
        &mut self,
        field: &str,
        label: &str,
        value: &str,
        min: usize,
        max: usize,
    ) -> &mut Self {
        let len = value.trim().chars().count();
        if len < min {
            self.errors.push(FieldError::new(
                field,
                format!("{} must be at least {} characters", label, min),
            ));
        } else if len > max {
            self.errors.push(FieldError::new(
                field,
                format!("{} cannot exceed {} characters", label, max),
            ));
        }
        self
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn finish(&mut self) -> ServiceResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}

fn icon(v: &mut Validator, icon: &str) {
    v.check(!icon.trim().is_empty(), "icon", "Icon is required");
    v.check(
        icon.trim().chars().count() <= ICON_MAX_LEN,
        "icon",
        format!("Icon cannot exceed {} characters", ICON_MAX_LEN),
    );
}

pub fn validate_new_taxonomy(kind: TaxonomyKind, item: &NewTaxonomyItem) -> ServiceResult<()> {
    let mut v = Validator::new();
    let label = format!("{} name", kind.display_name());
    v.length("name", &label, &item.name, NAME_MIN_LEN, NAME_MAX_LEN);
    if let Some(value) = &item.icon {
        icon(&mut v, value);
    }
    v.finish()
}

pub fn validate_taxonomy_update(kind: TaxonomyKind, update: &TaxonomyUpdate) -> ServiceResult<()> {
    let mut v = Validator::new();
    v.check(
        !update.is_empty(),
        "body",
        "At least one field must be provided",
    );
    if let Some(name) = &update.name {
        let label = format!("{} name", kind.display_name());
        v.length("name", &label, name, NAME_MIN_LEN, NAME_MAX_LEN);
    }
    if let Some(value) = &update.icon {
        icon(&mut v, value);
    }
    v.finish()
}

pub fn validate_new_product(product: &NewProduct) -> ServiceResult<()> {
    let mut v = Validator::new();
    v.length("title", "Title", &product.title, TITLE_MIN_LEN, TITLE_MAX_LEN);
    if let Some(description) = &product.description {
        v.check(
            description.chars().count() <= DESCRIPTION_MAX_LEN,
            "description",
            format!("Description cannot exceed {} characters", DESCRIPTION_MAX_LEN),
        );
    }
    v.check(product.price >= 0, "price", "Price cannot be negative");
    v.finish()
}

pub fn validate_new_promocode(promo: &NewPromocode) -> ServiceResult<()> {
    let mut v = Validator::new();
    v.length("code", "Code", &promo.code, CODE_MIN_LEN, CODE_MAX_LEN);
    v.check(
        promo
            .code
            .trim()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
        "code",
        "Code may only contain letters, digits, '-' and '_'",
    );
    match promo.discount_type {
        DiscountType::Percentage => v.check(
            (1..=100).contains(&promo.discount_value),
            "discountValue",
            "Percentage discount must be between 1 and 100",
        ),
        DiscountType::Fixed => v.check(
            promo.discount_value > 0,
            "discountValue",
            "Fixed discount must be greater than 0",
        ),
    };
    if let Some(max_uses) = promo.max_uses {
        v.check(max_uses > 0, "maxUses", "Max uses must be at least 1");
    }
    if let Some(min) = promo.min_purchase_amount {
        v.check(min >= 0, "minPurchaseAmount", "Minimum purchase cannot be negative");
    }
    if let (Some(from), Some(until)) = (promo.valid_from, promo.valid_until) {
        v.check(
            until > from,
            "validUntil",
            "Valid until must be after valid from",
        );
    }
    v.finish()
}

pub fn validate_application(application: &PromocodeApplication) -> ServiceResult<()> {
    let mut v = Validator::new();
    v.check(!application.code.trim().is_empty(), "code", "Code is required");
    v.check(application.amount >= 0, "amount", "Amount cannot be negative");
    v.finish()
}

/// Batches must hold between 1 and `max_events` events, each with a name.
pub fn validate_event_batch(batch: &EventBatch, max_events: usize) -> ServiceResult<()> {
    let mut v = Validator::new();
    v.check(!batch.events.is_empty(), "events", "At least one event is required");
    v.check(
        batch.events.len() <= max_events,
        "events",
        format!("A batch cannot exceed {} events", max_events),
    );
    for (i, event) in batch.events.iter().enumerate() {
        let name = event.name.trim();
        v.check(
            !name.is_empty(),
            &format!("events[{}].name", i),
            "Event name is required",
        );
        v.check(
            name.chars().count() <= EVENT_NAME_MAX_LEN,
            &format!("events[{}].name", i),
            format!("Event name cannot exceed {} characters", EVENT_NAME_MAX_LEN),
        );
        v.check(
            !event.session_id.trim().is_empty(),
            &format!("events[{}].sessionId", i),
            "Session id is required",
        );
    }
    v.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalyticsEvent, EventType, Properties, TaxonomyId};

    fn field_errors(result: ServiceResult<()>) -> Vec<FieldError> {
        match result {
            Err(ServiceError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_taxonomy_name_bounds() {
        let errors = field_errors(validate_new_taxonomy(
            TaxonomyKind::Category,
            &NewTaxonomyItem::new(" A "),
        ));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "name");
        assert_eq!(
            errors[0].message,
            "Category name must be at least 2 characters"
        );

        let long = "x".repeat(NAME_MAX_LEN + 1);
        let errors = field_errors(validate_new_taxonomy(
            TaxonomyKind::Tool,
            &NewTaxonomyItem::new(long),
        ));
        assert_eq!(errors[0].message, "Tool name cannot exceed 50 characters");

        assert!(validate_new_taxonomy(TaxonomyKind::Industry, &NewTaxonomyItem::new("AI")).is_ok());
    }

    #[test]
    fn test_blank_icon_rejected() {
        let item = NewTaxonomyItem::new("Marketing").with_icon("  ");
        let errors = field_errors(validate_new_taxonomy(TaxonomyKind::Category, &item));
        assert_eq!(errors[0].field, "icon");
    }

    #[test]
    fn test_empty_update_rejected() {
        let errors = field_errors(validate_taxonomy_update(
            TaxonomyKind::Category,
            &TaxonomyUpdate::default(),
        ));
        assert_eq!(errors[0].field, "body");
    }

    #[test]
    fn test_product_collects_all_errors() {
        let product = NewProduct {
            title: "ab".to_string(),
            description: None,
            price: -1,
            category_id: TaxonomyId::new(1),
            industry_id: TaxonomyId::new(2),
            tool_ids: vec![],
        };
        let errors = field_errors(validate_new_product(&product));
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["title", "price"]);
    }

    #[test]
    fn test_promocode_percentage_range() {
        let promo = NewPromocode {
            code: "SPRING".to_string(),
            discount_type: DiscountType::Percentage,
            discount_value: 150,
            max_uses: None,
            min_purchase_amount: None,
            valid_from: None,
            valid_until: None,
            is_active: None,
        };
        let errors = field_errors(validate_new_promocode(&promo));
        assert_eq!(errors[0].field, "discountValue");

        let promo = NewPromocode {
            discount_value: 15,
            ..promo
        };
        assert!(validate_new_promocode(&promo).is_ok());
    }

    #[test]
    fn test_event_batch_limits() {
        assert!(validate_event_batch(&EventBatch { events: vec![] }, 100).is_err());

        let event = AnalyticsEvent::new(EventType::Click, "cta", Properties::new(), "s1", None);
        let batch = EventBatch {
            events: vec![event.clone(); 3],
        };
        assert!(validate_event_batch(&batch, 3).is_ok());
        let errors = field_errors(validate_event_batch(&batch, 2));
        assert_eq!(errors[0].message, "A batch cannot exceed 2 events");

        let mut unnamed = event;
        unnamed.name = "   ".to_string();
        let errors = field_errors(validate_event_batch(
            &EventBatch {
                events: vec![unnamed],
            },
            100,
        ));
        assert_eq!(errors[0].field, "events[0].name");
    }
}
