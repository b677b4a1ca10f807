use kpg_common::Rupees;

use crate::EsewaApiError;

/// eSewa renders amounts inconsistently across its surfaces: the status endpoint returns JSON numbers
/// (`540.0`), while redirect payloads use formatted strings with thousands separators (`"1,000.0"`).
/// This parser accepts all of those, as long as the value is a whole number of rupees.
pub fn parse_esewa_amount(amount: &str) -> Result<Rupees, EsewaApiError> {
    let cleaned = amount.trim().replace(',', "");
    if cleaned.is_empty() {
        return Err(EsewaApiError::InvalidCurrencyAmount(amount.to_string()));
    }
    let mut parts = cleaned.split('.');
    let whole = parts
        .next()
        .ok_or_else(|| EsewaApiError::InvalidCurrencyAmount(amount.to_string()))?
        .parse::<i64>()
        .map_err(|e| EsewaApiError::InvalidCurrencyAmount(format!("{amount}: {e}")))?;
    if let Some(frac) = parts.next() {
        if frac.chars().any(|c| c != '0') {
            return Err(EsewaApiError::InvalidCurrencyAmount(format!("{amount}: fractional rupees are not supported")));
        }
    }
    if parts.next().is_some() {
        return Err(EsewaApiError::InvalidCurrencyAmount(amount.to_string()));
    }
    Ok(Rupees::from(whole))
}

/// The wire form of an amount for form fields, canonical messages and status queries.
pub fn esewa_amount(amount: Rupees) -> String {
    amount.amount_string()
}
