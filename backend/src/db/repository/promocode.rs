//! Repository trait for promocodes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::RepositoryResult;
use crate::models::{NewPromocode, Promocode};

#[async_trait]
pub trait PromocodeRepository: Send + Sync {
    /// Store a validated promocode. The code must already be normalised.
    ///
    /// # Returns
    /// * `Err(RepositoryError::Conflict)` - If the code is taken
    async fn insert_promocode(&self, promocode: &NewPromocode) -> RepositoryResult<Promocode>;

    async fn get_promocode(&self, code: &str) -> RepositoryResult<Promocode>;

    /// All codes, newest first.
    async fn list_promocodes(&self) -> RepositoryResult<Vec<Promocode>>;

    /// Check the code against `amount` at `now` and count one use.
    ///
    /// The check and the increment happen as one step.
    ///
    /// # Returns
    /// * `Err(RepositoryError::ValidationError)` - If the code cannot be used
    async fn redeem_promocode(
        &self,
        code: &str,
        amount: i64,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Promocode>;
}
