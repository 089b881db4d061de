use crate::{CoreError, CoreResult};

// ============================================================================
// IATA location codes
// ============================================================================

/// Normalizes an airport or city code: trims, uppercases and checks that it
/// is exactly three ASCII letters.
pub fn normalize_code(field: &str, raw: &str) -> CoreResult<String> {
    let code = raw.trim().to_ascii_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(CoreError::validation(format!(
            "{} must be a 3-letter IATA code, got '{}'",
            field, raw
        )));
    }
    Ok(code)
}

pub fn normalize_optional_code(field: &str, raw: Option<&str>) -> CoreResult<Option<String>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(code) => normalize_code(field, code).map(Some),
    }
}

/// Amadeus hotel ids are eight alphanumeric characters (chain code + property).
pub fn normalize_hotel_id(raw: &str) -> CoreResult<String> {
    let id = raw.trim().to_ascii_uppercase();
    if id.len() != 8 || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(CoreError::validation(format!("invalid hotel id '{}'", raw)));
    }
    Ok(id)
}

/// Currency codes follow ISO 4217: three letters.
pub fn normalize_currency(raw: &str) -> CoreResult<String> {
    let code = raw.trim().to_ascii_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(CoreError::validation(format!("invalid currency code '{}'", raw)));
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_uppercased() {
        assert_eq!(normalize_code("origin", " jfk ").unwrap(), "JFK");
    }

    #[test]
    fn test_bad_codes_rejected() {
        assert!(normalize_code("origin", "JF").is_err());
        assert!(normalize_code("origin", "J4K").is_err());
        assert!(normalize_code("origin", "LOND").is_err());
    }

    #[test]
    fn test_optional_code_blank_is_none() {
        assert_eq!(normalize_optional_code("destination", Some("  ")).unwrap(), None);
        assert_eq!(
            normalize_optional_code("destination", Some("par")).unwrap(),
            Some("PAR".to_string())
        );
    }

    #[test]
    fn test_hotel_id() {
        assert_eq!(normalize_hotel_id("mcparpar").unwrap(), "MCPARPAR");
        assert!(normalize_hotel_id("MC-PAR").is_err());
    }
}
