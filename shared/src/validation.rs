//! Validation utilities for the Meridian ERP Platform

use rust_decimal::Decimal;

// ============================================================================
// Inventory & Costing Validations
// ============================================================================

/// Validate that a quantity is strictly positive
pub fn validate_positive_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate that a monetary amount is not negative
pub fn validate_non_negative_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount < Decimal::ZERO {
        return Err("Amount cannot be negative");
    }
    Ok(())
}

/// Validate an exchange rate (strictly positive)
pub fn validate_exchange_rate(rate: Decimal) -> Result<(), &'static str> {
    if rate <= Decimal::ZERO {
        return Err("Exchange rate must be positive");
    }
    Ok(())
}

/// Validate an ISO 4217 style currency code (3 uppercase letters)
pub fn validate_currency_code(code: &str) -> Result<(), &'static str> {
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
        return Err("Currency code must be 3 uppercase letters");
    }
    Ok(())
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate SKU format (3-32 chars, uppercase alphanumeric and dashes)
pub fn validate_sku(sku: &str) -> Result<(), &'static str> {
    if sku.len() < 3 {
        return Err("SKU must be at least 3 characters");
    }
    if sku.len() > 32 {
        return Err("SKU must be at most 32 characters");
    }
    if !sku
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("SKU must be uppercase alphanumeric (dashes allowed)");
    }
    Ok(())
}

/// Validate a document number prefix (2-6 uppercase letters)
pub fn validate_document_prefix(prefix: &str) -> Result<(), &'static str> {
    if prefix.len() < 2 || prefix.len() > 6 {
        return Err("Document prefix must be 2-6 characters");
    }
    if !prefix.chars().all(|c| c.is_ascii_uppercase()) {
        return Err("Document prefix must be uppercase letters only");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn positive_quantity() {
        assert!(validate_positive_quantity(dec("0.01")).is_ok());
        assert!(validate_positive_quantity(Decimal::ZERO).is_err());
        assert!(validate_positive_quantity(dec("-5")).is_err());
    }

    #[test]
    fn non_negative_amount() {
        assert!(validate_non_negative_amount(Decimal::ZERO).is_ok());
        assert!(validate_non_negative_amount(dec("-0.01")).is_err());
    }

    #[test]
    fn exchange_rate_bounds() {
        assert!(validate_exchange_rate(Decimal::ONE).is_ok());
        assert!(validate_exchange_rate(dec("0.8734")).is_ok());
        assert!(validate_exchange_rate(Decimal::ZERO).is_err());
    }

    #[test]
    fn currency_codes() {
        assert!(validate_currency_code("USD").is_ok());
        assert!(validate_currency_code("EUR").is_ok());
        assert!(validate_currency_code("usd").is_err());
        assert!(validate_currency_code("US").is_err());
        assert!(validate_currency_code("USDX").is_err());
    }

    #[test]
    fn sku_format() {
        assert!(validate_sku("WID-001").is_ok());
        assert!(validate_sku("AB").is_err());
        assert!(validate_sku("lower-case").is_err());
    }

    #[test]
    fn document_prefix_format() {
        assert!(validate_document_prefix("BAT").is_ok());
        assert!(validate_document_prefix("SO").is_ok());
        assert!(validate_document_prefix("B").is_err());
        assert!(validate_document_prefix("bat").is_err());
    }
}
