//! Regex-driven field extraction.
//!
//! Runs a document type's extraction table over the uppercased OCR
//! text. Missing fields are simply absent from the result; extraction
//! never errors on missing data.

use tracing::debug;

use super::doctype::{DocumentTypeSpec, MultiFieldRule};
use super::validate::field_value;
use super::{FieldSet, FieldValue};

/// Noise tokens that regex captures over run-on deed text tend to
/// produce for person-name lists.
const MULTI_VALUE_BLACKLIST: &[&str] = &[
    "NOMOR",
    "TERSEBUT",
    "MENERANGKAN",
    "PENGHADAP",
    "BERTINDAK",
    "DENGAN",
    "DEPARTEMEN",
    "KEPUTUSAN",
];

/// Extract every field the table describes from `text`.
///
/// Single-valued fields take the first capture of the first matching
/// pattern. Multi-valued fields collect captures across all patterns,
/// deduplicated in first-seen order.
pub fn extract_fields(table: &DocumentTypeSpec, text: &str) -> FieldSet {
    let upper = text.to_uppercase();
    let mut fields = FieldSet::new();

    for rule in &table.singles {
        let capture = rule.patterns.iter().find_map(|pattern| {
            pattern
                .captures(&upper)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim().to_string())
        });
        if let Some(raw) = capture {
            if raw.is_empty() {
                continue;
            }
            fields.insert(rule.name.to_string(), field_value(rule.kind, &raw));
        }
    }

    for rule in &table.multis {
        let items = collect_multi(rule, &upper);
        if !items.is_empty() {
            fields.insert(
                rule.name.to_string(),
                FieldValue {
                    raw: items.join("; "),
                    normalized: items.join("; "),
                    is_valid: None,
                    sub_parts: None,
                    items: Some(items),
                },
            );
        }
    }

    debug!(
        doc_type = ?table.doc_type,
        fields = fields.len(),
        "field extraction complete"
    );
    fields
}

fn collect_multi(rule: &MultiFieldRule, upper: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for pattern in &rule.patterns {
        for captures in pattern.captures_iter(upper) {
            let Some(m) = captures.get(1) else { continue };
            let candidate = m.as_str().trim().trim_end_matches('.').trim().to_string();
            if plausible_name(&candidate) && !items.contains(&candidate) {
                items.push(candidate);
            }
        }
    }
    items
}

/// Length 5-50, at least one internal space, not a known noise token.
fn plausible_name(candidate: &str) -> bool {
    if candidate.len() < 5 || candidate.len() > 50 {
        return false;
    }
    if !candidate.trim().contains(' ') {
        return false;
    }
    !MULTI_VALUE_BLACKLIST
        .iter()
        .any(|noise| candidate.contains(noise))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::doctype::spec_for;
    use crate::models::DocumentType;
    use pretty_assertions::assert_eq;

    const KTP_TEXT: &str = "PROVINSI DKI JAKARTA\n\
        NIK: 3171234567890123\n\
        Nama: BUDI SANTOSO\n\
        Tempat/Tgl Lahir: JAKARTA, 17-08-1990\n\
        Jenis Kelamin: LAKI-LAKI\n\
        Alamat: JL. MERDEKA NO. 45\n\
        Agama: ISLAM\n\
        Pekerjaan: KARYAWAN SWASTA\n\
        Kewarganegaraan: WNI\n\
        Berlaku Hingga: SEUMUR HIDUP";

    const AKTA_TEXT: &str = "AKTA PENDIRIAN PERSEROAN TERBATAS\n\
        NOMOR: 12\n\
        Pada hari ini, tanggal 15 JANUARI 2020, dihadapan HARTONO WIJAYA, S.H.,\n\
        didirikan perseroan bernama PT MAJU BERSAMA SEJAHTERA (selanjutnya Perseroan)\n\
        berkedudukan di JAKARTA SELATAN,\n\
        MODAL DASAR Perseroan berjumlah Rp. 2.500.000.000\n\
        Direktur Utama: AHMAD FAUZI RAHMAN\n\
        Komisaris Utama: SITI NURHALIZA DEWI\n";

    #[test]
    fn test_identity_card_extraction() {
        let table = spec_for(DocumentType::IdentityCard);
        let fields = extract_fields(table, KTP_TEXT);

        assert_eq!(fields["nik"].raw, "3171234567890123");
        assert_eq!(fields["nik"].is_valid, Some(true));
        assert_eq!(fields["nama"].normalized, "BUDI SANTOSO");
        assert_eq!(fields["tempat_lahir"].normalized, "JAKARTA");
        assert_eq!(fields["tanggal_lahir"].normalized, "17-08-1990");
        assert_eq!(fields["jenis_kelamin"].normalized, "LAKI-LAKI");
        assert_eq!(fields["agama"].normalized, "ISLAM");
    }

    #[test]
    fn test_extraction_is_case_insensitive() {
        let table = spec_for(DocumentType::IdentityCard);
        let fields = extract_fields(table, &KTP_TEXT.to_lowercase());
        assert_eq!(fields["nama"].normalized, "BUDI SANTOSO");
    }

    #[test]
    fn test_corporate_deed_extraction() {
        let table = spec_for(DocumentType::CorporateDeed);
        let fields = extract_fields(table, AKTA_TEXT);

        assert_eq!(fields["nomor_akta"].raw, "12");
        assert_eq!(fields["tanggal_akta"].normalized, "15 JANUARI 2020");
        assert_eq!(fields["nama_notaris"].normalized, "HARTONO WIJAYA");
        assert_eq!(fields["nama_perusahaan"].normalized, "MAJU BERSAMA SEJAHTERA");
        assert_eq!(fields["jenis_badan"].normalized, "PT");
        assert_eq!(
            fields["modal_dasar"].sub_parts.as_ref().unwrap()["numeric"],
            "2500000000"
        );
    }

    #[test]
    fn test_multi_value_collection() {
        let table = spec_for(DocumentType::CorporateDeed);
        let fields = extract_fields(table, AKTA_TEXT);

        let directors = fields["direktur"].items.as_ref().unwrap();
        assert_eq!(directors, &vec!["AHMAD FAUZI RAHMAN".to_string()]);
        let commissioners = fields["komisaris"].items.as_ref().unwrap();
        assert_eq!(commissioners, &vec!["SITI NURHALIZA DEWI".to_string()]);
    }

    #[test]
    fn test_multi_value_filters_noise() {
        let table = spec_for(DocumentType::CorporateDeed);
        let noisy = "Direktur Utama: AHMAD FAUZI RAHMAN\n\
            Direktur: MENERANGKAN BAHWA\n\
            Direktur: AB\n\
            Direktur Utama: AHMAD FAUZI RAHMAN\n";
        let fields = extract_fields(table, noisy);
        let directors = fields["direktur"].items.as_ref().unwrap();
        assert_eq!(directors, &vec!["AHMAD FAUZI RAHMAN".to_string()]);
    }

    #[test]
    fn test_missing_fields_are_absent() {
        let table = spec_for(DocumentType::IdentityCard);
        let fields = extract_fields(table, "nothing useful here");
        assert!(fields.is_empty());
    }

    #[test]
    fn test_first_pattern_wins() {
        // A labeled NIK beats a bare 16-digit run elsewhere in the text.
        let table = spec_for(DocumentType::IdentityCard);
        let text = "1234567890123456\nNIK: 3171234567890123";
        let fields = extract_fields(table, text);
        assert_eq!(fields["nik"].raw, "3171234567890123");
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let table = spec_for(DocumentType::IdentityCard);
        let first = extract_fields(table, KTP_TEXT);
        let second = extract_fields(table, KTP_TEXT);
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }
}
