//! Per-field validators and normalizers.
//!
//! Every function here is pure and idempotent: normalizing an already
//! normalized value is a no-op. A failed check flags the field
//! (`is_valid == Some(false)`) but never drops it, so confidence
//! fusion can penalize instead of hide.

use std::collections::BTreeMap;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

use super::{FieldKind, FieldValue};

lazy_static! {
    /// Grouped-digit amount, e.g. "2.500.000.000" or "1,000,000.00".
    static ref GROUPED_NUMBER: Regex =
        Regex::new(r"\d{1,3}(?:[.,]\d{3})*(?:[.,]\d{2})?").unwrap();
}

/// Build a [`FieldValue`] for a raw single-valued match.
pub fn field_value(kind: FieldKind, raw: &str) -> FieldValue {
    let raw = raw.trim().to_string();
    match kind {
        FieldKind::IdentityNumber => identity_number(raw),
        FieldKind::Date => FieldValue {
            normalized: normalize_date(&raw),
            raw,
            is_valid: None,
            sub_parts: None,
            items: None,
        },
        FieldKind::Gender => FieldValue {
            normalized: normalize_gender(&raw),
            raw,
            is_valid: None,
            sub_parts: None,
            items: None,
        },
        FieldKind::Currency => currency(raw),
        FieldKind::CompanyType => FieldValue {
            normalized: normalize_company_type(&raw),
            raw,
            is_valid: None,
            sub_parts: None,
            items: None,
        },
        FieldKind::FreeText => FieldValue {
            normalized: collapse_whitespace(&raw),
            raw,
            is_valid: None,
            sub_parts: None,
            items: None,
        },
    }
}

fn identity_number(raw: String) -> FieldValue {
    let valid = validate_nik(&raw);
    FieldValue {
        normalized: collapse_whitespace(&raw),
        sub_parts: nik_sub_parts(&raw),
        is_valid: Some(valid),
        raw,
        items: None,
    }
}

fn currency(raw: String) -> FieldValue {
    let numeric = first_numeric(&raw);
    let sub_parts = numeric.map(|digits| {
        let mut parts = BTreeMap::new();
        parts.insert("numeric".to_string(), digits);
        parts
    });
    FieldValue {
        normalized: collapse_whitespace(&raw),
        raw,
        is_valid: None,
        sub_parts,
        items: None,
    }
}

/// NIK format check: exactly 16 digits with a province code in 1-99.
pub fn validate_nik(nik: &str) -> bool {
    if nik.len() != 16 || !nik.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    match nik[..2].parse::<u32>() {
        Ok(province) => (1..=99).contains(&province),
        Err(_) => false,
    }
}

/// Decompose a NIK into its leading administrative region codes.
pub fn nik_sub_parts(nik: &str) -> Option<BTreeMap<String, String>> {
    if nik.len() < 6 || !nik.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let mut parts = BTreeMap::new();
    parts.insert("province".to_string(), nik[..2].to_string());
    parts.insert("district".to_string(), nik[2..4].to_string());
    parts.insert("subdistrict".to_string(), nik[4..6].to_string());
    Some(parts)
}

/// Rewrite `/` separators to `-`. No calendar validation.
pub fn normalize_date(date: &str) -> String {
    collapse_whitespace(date).replace('/', "-")
}

/// Canonicalize gender surface forms to LAKI-LAKI / PEREMPUAN.
pub fn normalize_gender(gender: &str) -> String {
    let upper = collapse_whitespace(gender).to_uppercase();
    match upper.as_str() {
        "LAKI-LAKI" | "LAKI LAKI" | "MALE" | "PRIA" | "L" | "M" => "LAKI-LAKI".to_string(),
        "PEREMPUAN" | "FEMALE" | "WANITA" | "P" | "F" => "PEREMPUAN".to_string(),
        _ => upper,
    }
}

/// Canonicalize the legal entity form to PT / CV / FIRMA.
pub fn normalize_company_type(company_type: &str) -> String {
    let upper = collapse_whitespace(company_type).to_uppercase();
    if upper.contains("PT") || upper.contains("PERSEROAN") {
        "PT".to_string()
    } else if upper.contains("CV") || upper.contains("COMMANDITAIRE") {
        "CV".to_string()
    } else if upper.contains("FIRMA") {
        "FIRMA".to_string()
    } else {
        upper
    }
}

/// First well-formed grouped-digit substring, with separators
/// stripped, checked parseable as a decimal.
pub fn first_numeric(text: &str) -> Option<String> {
    let matched = GROUPED_NUMBER.find(text)?;
    let digits: String = matched
        .as_str()
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    Decimal::from_str(&digits).ok()?;
    Some(digits)
}

/// Collapse runs of whitespace to single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_validate_nik_valid() {
        assert!(validate_nik("3171234567890123")); // Jakarta (31)
        assert!(validate_nik("0171234567890123")); // province 01
        assert!(validate_nik("9971234567890123")); // province 99
    }

    #[test]
    fn test_validate_nik_invalid() {
        assert!(!validate_nik("0071234567890123")); // province 00
        assert!(!validate_nik("317123456789012")); // 15 digits
        assert!(!validate_nik("31712345678901234")); // 17 digits
        assert!(!validate_nik("3171X34567890123")); // non-digit
        assert!(!validate_nik(""));
    }

    #[test]
    fn test_nik_property_over_prefixes() {
        // The check holds iff all digits and the first two form 1-99.
        for province in 0..=99u32 {
            let nik = format!("{:02}71234567890123", province);
            assert_eq!(validate_nik(&nik), province >= 1, "province {}", province);
        }
    }

    #[test]
    fn test_nik_sub_parts() {
        let parts = nik_sub_parts("3171234567890123").unwrap();
        assert_eq!(parts["province"], "31");
        assert_eq!(parts["district"], "71");
        assert_eq!(parts["subdistrict"], "23");

        assert!(nik_sub_parts("12345").is_none());
        assert!(nik_sub_parts("12345X").is_none());
    }

    #[test]
    fn test_normalize_date_separators_only() {
        assert_eq!(normalize_date("17/08/1990"), "17-08-1990");
        assert_eq!(normalize_date("17-08-1990"), "17-08-1990");
        // No calendar validation: impossible dates pass through.
        assert_eq!(normalize_date("99/99/9999"), "99-99-9999");
    }

    #[test]
    fn test_normalize_date_idempotent() {
        let once = normalize_date("17/08/1990");
        assert_eq!(normalize_date(&once), once);
    }

    #[test]
    fn test_normalize_gender() {
        for form in ["L", "M", "laki-laki", "MALE", "PRIA"] {
            assert_eq!(normalize_gender(form), "LAKI-LAKI", "{}", form);
        }
        for form in ["P", "F", "perempuan", "FEMALE", "WANITA"] {
            assert_eq!(normalize_gender(form), "PEREMPUAN", "{}", form);
        }
        assert_eq!(normalize_gender("UNKNOWN"), "UNKNOWN");
    }

    #[test]
    fn test_normalize_gender_idempotent() {
        let once = normalize_gender("L");
        assert_eq!(normalize_gender(&once), once);
    }

    #[test]
    fn test_normalize_company_type() {
        assert_eq!(normalize_company_type("PERSEROAN TERBATAS"), "PT");
        assert_eq!(normalize_company_type("COMMANDITAIRE VENNOOTSCHAP"), "CV");
        assert_eq!(normalize_company_type("FIRMA"), "FIRMA");
    }

    #[test]
    fn test_first_numeric() {
        assert_eq!(
            first_numeric("RP. 2.500.000.000 (DUA SETENGAH MILYAR)"),
            Some("2500000000".to_string())
        );
        assert_eq!(first_numeric("1,000,000.00"), Some("100000000".to_string()));
        assert_eq!(first_numeric("no digits"), None);
    }

    #[test]
    fn test_currency_field_keeps_raw() {
        let value = field_value(FieldKind::Currency, "RP. 2.500.000.000");
        assert_eq!(value.raw, "RP. 2.500.000.000");
        assert_eq!(value.sub_parts.unwrap()["numeric"], "2500000000");
    }

    #[test]
    fn test_identity_number_field() {
        let value = field_value(FieldKind::IdentityNumber, "3171234567890123");
        assert_eq!(value.is_valid, Some(true));
        assert_eq!(value.sub_parts.unwrap()["province"], "31");

        let bad = field_value(FieldKind::IdentityNumber, "0071234567890123");
        assert_eq!(bad.is_valid, Some(false));
    }

    #[test]
    fn test_free_text_collapses_whitespace() {
        let value = field_value(FieldKind::FreeText, "  BUDI \t SANTOSO \n");
        assert_eq!(value.normalized, "BUDI SANTOSO");
        assert_eq!(value.is_valid, None);
    }

    #[test]
    fn test_normalization_is_idempotent_per_kind() {
        for (kind, raw) in [
            (FieldKind::Date, "17/08/1990"),
            (FieldKind::Gender, "laki-laki"),
            (FieldKind::CompanyType, "perseroan terbatas"),
            (FieldKind::FreeText, "JAKARTA  SELATAN"),
        ] {
            let once = field_value(kind, raw);
            let twice = field_value(kind, &once.normalized);
            assert_eq!(twice.normalized, once.normalized, "{:?}", kind);
        }
    }
}
