//! Phone number normalization.

/// Rewrites a phone number into the international format Daraja expects.
///
/// Every `+` and whitespace character is removed, and a leading national
/// trunk `0` is replaced by `country_code`.
#[must_use]
pub fn normalize_msisdn(phone: &str, country_code: &str) -> String {
    let digits: String = phone
        .chars()
        .filter(|c| *c != '+' && !c.is_whitespace())
        .collect();
    match digits.strip_prefix('0') {
        Some(rest) => format!("{country_code}{rest}"),
        None => digits,
    }
}
