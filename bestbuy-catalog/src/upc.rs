use serde::{Deserialize, Serialize};

/// GTIN lengths accepted in strict mode: EAN-8, UPC-A, EAN-13, GTIN-14.
pub const GTIN_LENGTHS: [usize; 4] = [8, 12, 13, 14];

/// How strictly a scanned code is checked before lookup
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UpcValidation {
    /// Digits only, a GTIN length, and a valid check digit
    Strict,
    /// Anything that is not blank
    #[default]
    Lenient,
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum UpcError {
    #[error("UPC must not be empty")]
    Empty,

    #[error("UPC must contain only digits: {0}")]
    NonNumeric(String),

    #[error("UPC {upc} has unsupported length {len}")]
    InvalidLength { upc: String, len: usize },

    #[error("UPC {upc} has a bad check digit (expected {expected})")]
    CheckDigit { upc: String, expected: u32 },
}

/// Validate a UPC under the given mode.
pub fn validate(upc: &str, mode: UpcValidation) -> Result<(), UpcError> {
    if upc.trim().is_empty() {
        return Err(UpcError::Empty);
    }

    if mode == UpcValidation::Lenient {
        return Ok(());
    }

    if !upc.chars().all(|c| c.is_ascii_digit()) {
        return Err(UpcError::NonNumeric(upc.to_string()));
    }

    if !GTIN_LENGTHS.contains(&upc.len()) {
        return Err(UpcError::InvalidLength {
            upc: upc.to_string(),
            len: upc.len(),
        });
    }

    let (body, check) = upc.split_at(upc.len() - 1);
    let expected = check_digit(body);
    let actual = check.chars().next().and_then(|c| c.to_digit(10));

    if actual != Some(expected) {
        return Err(UpcError::CheckDigit {
            upc: upc.to_string(),
            expected,
        });
    }

    Ok(())
}

/// The code plus its UPC-A / EAN-13 twin, if it has one.
///
/// A 12-digit UPC-A is the same item as the EAN-13 formed by a leading zero.
pub fn format_variants(upc: &str) -> Vec<String> {
    let mut variants = vec![upc.to_string()];
    if !upc.chars().all(|c| c.is_ascii_digit()) {
        return variants;
    }

    match upc.len() {
        12 => variants.push(format!("0{}", upc)),
        13 => {
            if let Some(upc_a) = upc.strip_prefix('0') {
                variants.push(upc_a.to_string());
            }
        }
        _ => {}
    }
    variants
}

/// GS1 mod-10 check digit for the digits preceding it.
///
/// Weights alternate 3, 1, 3, ... starting from the rightmost digit of `body`.
/// Non-digit characters are ignored.
pub fn check_digit(body: &str) -> u32 {
    let sum: u32 = body
        .chars()
        .rev()
        .filter_map(|c| c.to_digit(10))
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { d * 3 } else { d })
        .sum();

    (10 - sum % 10) % 10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_accepts_short_codes() {
        assert!(validate("012345", UpcValidation::Lenient).is_ok());
        assert!(validate("X", UpcValidation::Lenient).is_ok());
    }

    #[test]
    fn test_blank_is_rejected_in_both_modes() {
        assert_eq!(validate("", UpcValidation::Lenient), Err(UpcError::Empty));
        assert_eq!(validate("   ", UpcValidation::Strict), Err(UpcError::Empty));
    }

    #[test]
    fn test_strict_accepts_valid_gtins() {
        // UPC-A, EAN-13, EAN-8
        assert!(validate("036000291452", UpcValidation::Strict).is_ok());
        assert!(validate("4006381333931", UpcValidation::Strict).is_ok());
        assert!(validate("96385074", UpcValidation::Strict).is_ok());
    }

    #[test]
    fn test_strict_rejects_bad_codes() {
        assert_eq!(
            validate("036000291453", UpcValidation::Strict),
            Err(UpcError::CheckDigit {
                upc: "036000291453".to_string(),
                expected: 2
            })
        );
        assert!(matches!(
            validate("03600029145A", UpcValidation::Strict),
            Err(UpcError::NonNumeric(_))
        ));
        assert!(matches!(
            validate("012345", UpcValidation::Strict),
            Err(UpcError::InvalidLength { len: 6, .. })
        ));
    }

    #[test]
    fn test_check_digit() {
        assert_eq!(check_digit("03600029145"), 2);
        assert_eq!(check_digit("400638133393"), 1);
    }

    #[test]
    fn test_format_variants() {
        assert_eq!(format_variants("036000291452"), vec!["036000291452", "0036000291452"]);
        assert_eq!(format_variants("0036000291452"), vec!["0036000291452", "036000291452"]);
        assert_eq!(format_variants("4006381333931"), vec!["4006381333931"]);
        assert_eq!(format_variants("96385074"), vec!["96385074"]);
        assert_eq!(format_variants("ABCDEFGHIJKL"), vec!["ABCDEFGHIJKL"]);
    }
}
