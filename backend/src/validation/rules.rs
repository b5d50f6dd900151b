//! Common validation rules shared across request payloads.

use validator::ValidationError;

/// Validates a Brazilian CPF as exactly 11 ASCII digits.
///
/// Check digits are not verified.
pub fn validate_cpf(cpf: &str) -> Result<(), ValidationError> {
    if cpf.len() != 11 || !cpf.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::new("cpf_must_have_11_digits"));
    }
    Ok(())
}

/// Validates a phone number as 10 or 11 ASCII digits (area code included).
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if !(10..=11).contains(&phone.len()) || !phone.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::new("phone_must_have_10_or_11_digits"));
    }
    Ok(())
}

/// Rejects names that are blank once surrounding whitespace is removed.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}
