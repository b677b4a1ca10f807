use chrono::{DateTime, Utc};
use rand::Rng;

use crate::db_types::OrderNumber;

pub const ORDER_NUMBER_PREFIX: &str = "KD";

/// Generates a customer-facing order number of the form `KD<yyyymmdd>-<nnnn>`, e.g. `KD20260823-4821`.
///
/// The suffix is four random digits, so numbers are not guessable in sequence. Uniqueness is enforced by
/// the database; callers should be prepared to regenerate on a (rare) same-day collision.
pub fn new_order_number<R: Rng>(now: DateTime<Utc>, rng: &mut R) -> OrderNumber {
    let date = now.format("%Y%m%d");
    let suffix: u16 = rng.gen_range(1000..10000);
    OrderNumber::new(format!("{ORDER_NUMBER_PREFIX}{date}-{suffix}"))
}
