//! Promocode creation, quoting and redemption.

use chrono::{DateTime, Utc};
use log::info;

use super::validation::{validate_application, validate_new_promocode};
use super::{ServiceError, ServiceResult};
use crate::db::FullRepository;
use crate::models::{NewPromocode, Promocode, PromocodeApplication, PromocodeQuote};

pub async fn create<R: FullRepository + ?Sized>(
    repo: &R,
    promo: &NewPromocode,
) -> ServiceResult<Promocode> {
    validate_new_promocode(promo)?;
    let created = repo.insert_promocode(promo).await?;
    info!(
        "Created promocode {} ({:?} {})",
        created.code, created.discount_type, created.discount_value
    );
    Ok(created)
}

pub async fn list<R: FullRepository + ?Sized>(repo: &R) -> ServiceResult<Vec<Promocode>> {
    Ok(repo.list_promocodes().await?)
}

/// Price an order with a code without consuming a use.
pub async fn validate<R: FullRepository + ?Sized>(
    repo: &R,
    application: &PromocodeApplication,
    now: DateTime<Utc>,
) -> ServiceResult<PromocodeQuote> {
    validate_application(application)?;
    let promo = repo.get_promocode(&application.code).await?;
    promo
        .check(application.amount, now)
        .map_err(|rejection| ServiceError::field("code", rejection.to_string()))?;
    Ok(promo.quote(application.amount))
}

/// Consume one use of a code and return the resulting quote.
pub async fn redeem<R: FullRepository + ?Sized>(
    repo: &R,
    application: &PromocodeApplication,
    now: DateTime<Utc>,
) -> ServiceResult<PromocodeQuote> {
    validate_application(application)?;
    let promo = repo
        .redeem_promocode(&application.code, application.amount, now)
        .await?;
    info!(
        "Redeemed promocode {} ({} of {:?} uses)",
        promo.code, promo.used_count, promo.max_uses
    );
    Ok(promo.quote(application.amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{LocalRepository, RepositoryError};
    use crate::models::DiscountType;
    use chrono::Duration;

    fn promo(code: &str, discount_type: DiscountType, value: i64) -> NewPromocode {
        NewPromocode {
            code: code.to_string(),
            discount_type,
            discount_value: value,
            max_uses: None,
            min_purchase_amount: None,
            valid_from: None,
            valid_until: None,
            is_active: None,
        }
    }

    fn apply(code: &str, amount: i64) -> PromocodeApplication {
        PromocodeApplication {
            code: code.to_string(),
            amount,
        }
    }

    #[tokio::test]
    async fn test_validate_quotes_without_consuming() {
        let repo = LocalRepository::new();
        create(&repo, &promo("save15", DiscountType::Percentage, 15))
            .await
            .unwrap();

        let quote = validate(&repo, &apply("SAVE15", 1999), Utc::now())
            .await
            .unwrap();
        assert_eq!(quote.discount, 299);
        assert_eq!(quote.final_amount, 1700);

        let codes = list(&repo).await.unwrap();
        assert_eq!(codes[0].used_count, 0);
    }

    #[tokio::test]
    async fn test_expired_code_rejected() {
        let repo = LocalRepository::new();
        let now = Utc::now();
        let mut expired = promo("OLD", DiscountType::Fixed, 500);
        expired.valid_from = Some(now - Duration::days(10));
        expired.valid_until = Some(now - Duration::days(1));
        create(&repo, &expired).await.unwrap();

        match validate(&repo, &apply("old", 1000), now).await.unwrap_err() {
            ServiceError::Validation(errors) => {
                assert_eq!(errors[0].message, "Promocode has expired")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_redeem_until_exhausted() {
        let repo = LocalRepository::new();
        let mut limited = promo("TWICE", DiscountType::Fixed, 300);
        limited.max_uses = Some(2);
        create(&repo, &limited).await.unwrap();

        for _ in 0..2 {
            let quote = redeem(&repo, &apply("twice", 200), Utc::now())
                .await
                .unwrap();
            assert_eq!(quote.final_amount, 0);
        }
        let err = redeem(&repo, &apply("twice", 200), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Repository(RepositoryError::ValidationError { .. })
        ));
    }

    #[tokio::test]
    async fn test_duplicate_code_conflicts() {
        let repo = LocalRepository::new();
        create(&repo, &promo("WELCOME", DiscountType::Fixed, 100))
            .await
            .unwrap();
        let err = create(&repo, &promo("welcome", DiscountType::Fixed, 100))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Repository(RepositoryError::Conflict { .. })
        ));
    }
}
