//! Per-document-type extraction tables.
//!
//! All patterns run against an uppercased copy of the extracted text,
//! so they are written in uppercase Indonesian label forms.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::DocumentType;

/// Semantic kind of a field, selecting its validator/normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// 16-digit NIK-style identity number with embedded region codes.
    IdentityNumber,
    /// Date; separator normalization only.
    Date,
    /// Gender with multiple surface forms.
    Gender,
    /// Monetary amount with grouped digits.
    Currency,
    /// Legal entity form (PT / CV / FIRMA).
    CompanyType,
    /// Anything else; whitespace cleanup only.
    FreeText,
}

/// A single-valued field: first matching pattern wins.
pub struct FieldRule {
    pub name: &'static str,
    pub kind: FieldKind,
    pub patterns: Vec<Regex>,
}

/// A multi-valued field: every match across all patterns is collected.
pub struct MultiFieldRule {
    pub name: &'static str,
    pub patterns: Vec<Regex>,
}

/// Everything the pipeline needs to know about one document type.
pub struct DocumentTypeSpec {
    pub doc_type: DocumentType,
    /// Fields feeding the completeness score.
    pub required: &'static [&'static str],
    /// Vocabulary for the candidate keyword bonus.
    pub keywords: &'static [&'static str],
    pub singles: Vec<FieldRule>,
    pub multis: Vec<MultiFieldRule>,
}

impl DocumentTypeSpec {
    pub fn kind_of(&self, field: &str) -> Option<FieldKind> {
        self.singles
            .iter()
            .find(|r| r.name == field)
            .map(|r| r.kind)
    }
}

fn rule(name: &'static str, kind: FieldKind, patterns: &[&str]) -> FieldRule {
    FieldRule {
        name,
        kind,
        patterns: patterns.iter().map(|p| Regex::new(p).unwrap()).collect(),
    }
}

fn multi(name: &'static str, patterns: &[&str]) -> MultiFieldRule {
    MultiFieldRule {
        name,
        patterns: patterns.iter().map(|p| Regex::new(p).unwrap()).collect(),
    }
}

const DATE_NUMERIC: &str = r"(\d{1,2}[-/]\d{1,2}[-/]\d{4})";
const DATE_LONG: &str = r"(\d{1,2}\s+(?:JANUARI|FEBRUARI|MARET|APRIL|MEI|JUNI|JULI|AGUSTUS|SEPTEMBER|OKTOBER|NOVEMBER|DESEMBER)\s+\d{4})";
const NPWP_PATTERN: &str = r"NPWP\s*[:.]?\s*(\d{2}\.\d{3}\.\d{3}\.\d-\d{3}\.\d{3})";

fn identity_card() -> DocumentTypeSpec {
    DocumentTypeSpec {
        doc_type: DocumentType::IdentityCard,
        required: &["nik", "nama", "tempat_lahir", "tanggal_lahir"],
        keywords: &[
            "NIK", "NAMA", "TEMPAT", "LAHIR", "TANGGAL", "JENIS", "KELAMIN", "GOLONGAN",
            "DARAH", "ALAMAT", "AGAMA", "STATUS", "PEKERJAAN", "KEWARGANEGARAAN", "BERLAKU",
            "HINGGA", "REPUBLIK", "INDONESIA", "PROVINSI", "KABUPATEN", "KOTA", "KELURAHAN",
            "RT", "RW",
        ],
        singles: vec![
            rule(
                "nik",
                FieldKind::IdentityNumber,
                &[
                    r"NIK\s*:?\s*(\d{16})",
                    r"NO\.?\s*KTP\s*:?\s*(\d{16})",
                    r"\b(\d{16})\b",
                ],
            ),
            rule(
                "nama",
                FieldKind::FreeText,
                &[r"NAMA\s*:?\s*([A-Z][A-Z ]+)", r"NAME\s*:?\s*([A-Z][A-Z ]+)"],
            ),
            rule(
                "tempat_lahir",
                FieldKind::FreeText,
                &[
                    r"TEMPAT[/\s]*TGL\.?\s*LAHIR\s*:?\s*([A-Z ]+),",
                    r"TTL\s*:?\s*([A-Z ]+),",
                    r"TEMPAT\s*LAHIR\s*:?\s*([A-Z ]+)",
                ],
            ),
            rule(
                "tanggal_lahir",
                FieldKind::Date,
                &[DATE_NUMERIC, DATE_LONG],
            ),
            rule(
                "jenis_kelamin",
                FieldKind::Gender,
                &[
                    r"JENIS\s*KELAMIN\s*:?\s*(LAKI-LAKI|PEREMPUAN)",
                    r"SEX\s*:?\s*(MALE|FEMALE)",
                    r"GENDER\s*:?\s*(L|P|M|F)\b",
                ],
            ),
            rule(
                "alamat",
                FieldKind::FreeText,
                &[r"ALAMAT\s*:?\s*([^\n]+)", r"ADDRESS\s*:?\s*([^\n]+)"],
            ),
            rule("agama", FieldKind::FreeText, &[r"AGAMA\s*:?\s*([A-Z ]+)"]),
            rule(
                "pekerjaan",
                FieldKind::FreeText,
                &[r"PEKERJAAN\s*:?\s*([A-Z ]+)", r"OCCUPATION\s*:?\s*([A-Z ]+)"],
            ),
            rule(
                "kewarganegaraan",
                FieldKind::FreeText,
                &[r"KEWARGANEGARAAN\s*:?\s*([A-Z ]+)"],
            ),
            rule(
                "berlaku_hingga",
                FieldKind::Date,
                &[
                    r"BERLAKU\s*HINGGA\s*:?\s*(\d{1,2}[-/]\d{1,2}[-/]\d{4}|SEUMUR\s*HIDUP)",
                ],
            ),
        ],
        multis: Vec::new(),
    }
}

fn corporate_deed() -> DocumentTypeSpec {
    DocumentTypeSpec {
        doc_type: DocumentType::CorporateDeed,
        required: &["nomor_akta", "nama_perusahaan", "nama_notaris"],
        keywords: &[
            "AKTA", "NOTARIS", "PERSEROAN", "TERBATAS", "MODAL", "DASAR", "ANGGARAN",
            "DIREKTUR", "KOMISARIS", "BERKEDUDUKAN", "PENDIRIAN", "SAHAM",
        ],
        singles: vec![
            rule(
                "nomor_akta",
                FieldKind::FreeText,
                &[
                    r"AKTA\s+(?:NO|NOMOR)\.?\s*:?\s*(\d+)",
                    r"NOMOR\s*:\s*(\d+)",
                    r"NO\.\s*(\d+)",
                ],
            ),
            rule("tanggal_akta", FieldKind::Date, &[DATE_LONG, DATE_NUMERIC]),
            rule(
                "nama_notaris",
                FieldKind::FreeText,
                &[
                    r"SAYA[,\s]+([A-Z .]+?)[,\s]+(?:SARJANA\s+HUKUM|S\.?H\.?)",
                    r"NOTARIS\s+([A-Z .]{5,50}?)(?:\s+BERKEDUDUKAN|\s+DI\s+[A-Z]|,\s*S\.?H\.?)",
                    r"DIHADAPAN\s+([A-Z .,-]+?),?\s+S\.?H\.?",
                ],
            ),
            rule(
                "nama_perusahaan",
                FieldKind::FreeText,
                &[
                    r"BERNAMA\s+PT\.?\s*([A-Z &.\-_]+?)(?:\s*\(|\s*BERKEDUDUKAN|\n)",
                    r"PT\.?\s+([A-Z &.\-_]+?)(?:\s+TBK|,|\n)",
                    r"CV\.?\s+([A-Z &]+?)(?:,|\n)",
                    r"PERSEROAN\s+TERBATAS\s+([A-Z &]+?)(?:,|\n)",
                ],
            ),
            rule(
                "jenis_badan",
                FieldKind::CompanyType,
                &[
                    r"\b(PERSEROAN\s+TERBATAS|COMMANDITAIRE\s+VENNOOTSCHAP)\b",
                    r"\b(PT|CV|FIRMA)\b",
                ],
            ),
            rule(
                "modal_dasar",
                FieldKind::Currency,
                &[
                    r"MODAL\s+DASAR[^\n]*?RP\.?\s*([\d.,]+)",
                    r"MODAL\s+DASAR\s+PERSEROAN\s+BERJUMLAH\s+RP\.?\s*([\d.,]+)",
                    r"BERJUMLAH\s+RP\.?\s*([\d.,]+)",
                ],
            ),
            rule(
                "alamat_perusahaan",
                FieldKind::FreeText,
                &[
                    r"BERKEDUDUKAN\s+DI\s+([A-Z ,]+?)(?:\n|,|\s+SESUAI)",
                    r"DOMISILI\s+DI\s+([A-Z ,]+?)(?:\n|,)",
                    r"ALAMAT\s*:\s*([^\n]+)",
                ],
            ),
            rule(
                "bidang_usaha",
                FieldKind::FreeText,
                &[
                    r"MAKSUD\s+DAN\s+TUJUAN[^\n]*?(?:ADALAH|IALAH)\s*([^.]{20,200})",
                    r"BIDANG\s+USAHA[^\n]*?(?:ADALAH|IALAH|MELIPUTI)\s*([^.]{10,150})",
                    r"BERGERAK\s+(?:DALAM\s+)?BIDANG\s+([^.]{10,150})",
                ],
            ),
            rule("npwp", FieldKind::FreeText, &[NPWP_PATTERN]),
        ],
        multis: vec![
            multi(
                "direktur",
                &[
                    r"DIREKTUR\s+UTAMA\s*:?\s*([A-Z .]+?)(?:\n|,|\s+BERKEDUDUKAN)",
                    r"DIREKTUR\s*:?\s*([A-Z .]+?)(?:\n|,|\s+YANG)",
                    r"MENJADI\s+DIREKTUR\s+([A-Z .]+?)(?:\n|,|\s+DENGAN)",
                ],
            ),
            multi(
                "komisaris",
                &[
                    r"KOMISARIS\s+UTAMA\s*:?\s*([A-Z .]+?)(?:\n|,|\s+BERKEDUDUKAN)",
                    r"KOMISARIS\s*:?\s*([A-Z .]+?)(?:\n|,|\s+YANG)",
                    r"MENJADI\s+KOMISARIS\s+([A-Z .]+?)(?:\n|,|\s+DENGAN)",
                ],
            ),
        ],
    }
}

fn driver_license() -> DocumentTypeSpec {
    DocumentTypeSpec {
        doc_type: DocumentType::DriverLicense,
        required: &["nama", "tanggal_lahir", "alamat"],
        keywords: &["SIM", "SURAT", "IZIN", "MENGEMUDI", "NAMA", "ALAMAT", "BERLAKU"],
        singles: vec![
            rule(
                "nomor_sim",
                FieldKind::FreeText,
                &[r"NO\.?\s*SIM\s*:?\s*([A-Z0-9-]+)", r"SIM\s*:?\s*(\d{4,})"],
            ),
            rule("nama", FieldKind::FreeText, &[r"NAMA\s*:?\s*([A-Z][A-Z ]+)"]),
            rule("tanggal_lahir", FieldKind::Date, &[DATE_NUMERIC]),
            rule("alamat", FieldKind::FreeText, &[r"ALAMAT\s*:?\s*([^\n]+)"]),
        ],
        multis: Vec::new(),
    }
}

fn passport() -> DocumentTypeSpec {
    DocumentTypeSpec {
        doc_type: DocumentType::Passport,
        required: &["nama", "tanggal_lahir"],
        keywords: &["PASPOR", "PASSPORT", "REPUBLIK", "INDONESIA", "NAMA"],
        singles: vec![
            rule(
                "nomor_paspor",
                FieldKind::FreeText,
                &[
                    r"(?:PASPOR|PASSPORT)\s*(?:NO\.?)?\s*:?\s*([A-Z]\d{7})",
                    r"\b([A-Z]\d{7})\b",
                ],
            ),
            rule("nama", FieldKind::FreeText, &[r"NAMA\s*:?\s*([A-Z][A-Z ]+)", r"NAME\s*:?\s*([A-Z][A-Z ]+)"]),
            rule("tanggal_lahir", FieldKind::Date, &[DATE_NUMERIC, DATE_LONG]),
        ],
        multis: Vec::new(),
    }
}

fn tax_id() -> DocumentTypeSpec {
    DocumentTypeSpec {
        doc_type: DocumentType::TaxId,
        required: &["nama", "npwp"],
        keywords: &["NPWP", "PAJAK", "NAMA", "DIREKTORAT", "JENDERAL"],
        singles: vec![
            rule(
                "npwp",
                FieldKind::FreeText,
                &[NPWP_PATTERN, r"\b(\d{2}\.\d{3}\.\d{3}\.\d-\d{3}\.\d{3})\b"],
            ),
            rule("nama", FieldKind::FreeText, &[r"NAMA\s*:?\s*([A-Z][A-Z ]+)"]),
            rule("nik", FieldKind::IdentityNumber, &[r"NIK\s*:?\s*(\d{16})", r"\b(\d{16})\b"]),
        ],
        multis: Vec::new(),
    }
}

fn family_card() -> DocumentTypeSpec {
    DocumentTypeSpec {
        doc_type: DocumentType::FamilyCard,
        required: &["alamat", "nama"],
        keywords: &["KARTU", "KELUARGA", "NAMA", "ALAMAT", "RT", "RW", "KEPALA"],
        singles: vec![
            rule(
                "nomor_kk",
                FieldKind::IdentityNumber,
                &[r"NO\.?\s*KK\s*:?\s*(\d{16})", r"\b(\d{16})\b"],
            ),
            rule("nama", FieldKind::FreeText, &[r"NAMA\s*:?\s*([A-Z][A-Z ]+)"]),
            rule("alamat", FieldKind::FreeText, &[r"ALAMAT\s*:?\s*([^\n]+)"]),
        ],
        multis: Vec::new(),
    }
}

fn other() -> DocumentTypeSpec {
    DocumentTypeSpec {
        doc_type: DocumentType::Other,
        required: &[],
        keywords: &[],
        singles: vec![rule(
            "nama",
            FieldKind::FreeText,
            &[r"NAMA\s*:?\s*([A-Z][A-Z ]+)"],
        )],
        multis: Vec::new(),
    }
}

lazy_static! {
    static ref SPECS: HashMap<DocumentType, DocumentTypeSpec> = {
        let mut map = HashMap::new();
        for table in [
            identity_card(),
            corporate_deed(),
            driver_license(),
            passport(),
            tax_id(),
            family_card(),
            other(),
        ] {
            map.insert(table.doc_type, table);
        }
        map
    };
}

/// Look up the extraction table for a document type.
pub fn spec_for(doc_type: DocumentType) -> &'static DocumentTypeSpec {
    // Every enum variant is present in the table.
    SPECS.get(&doc_type).expect("document type table")
}
