//! Binary Layout Tests
//!
//! Byte-level checks of the dBase III layout:
//! - Header, descriptors, terminator, records and EOF marker are byte exact
//! - Inconsistent or truncated files are rejected with DBF_MALFORMED_FILE
//! - Deletion flags survive decode and re-encode
//! - Tables stream to and from files

use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};

use chrono::NaiveDate;
use dbftable::format::{self, EOF_MARKER, HEADER_TERMINATOR};
use dbftable::{CodePage, DbfErrorCode, FieldType, Table, TableConfig};
use tempfile::tempfile;

// =============================================================================
// Helper Functions
// =============================================================================

/// CITY C(8), POP N(7,0), OK L; two records
fn sample_table() -> Table {
    let mut table = Table::new("windows-1252").unwrap();
    table.add_text_field("CITY", 8).unwrap();
    table.add_number_field("POP", 7, 0).unwrap();
    table.add_boolean_field("OK").unwrap();
    table.set_last_updated(NaiveDate::from_ymd_opt(2024, 3, 15));

    let first = table.add_record();
    table.set_field_value_by_name(first, "CITY", "Genève").unwrap();
    table.set_field_value_by_name(first, "POP", "203856").unwrap();
    table.set_field_value_by_name(first, "OK", "T").unwrap();

    let second = table.add_record();
    table.set_field_value_by_name(second, "CITY", "Basel").unwrap();
    table
}

const HEADER_LENGTH: usize = 32 + 3 * 32 + 1;
const RECORD_LENGTH: usize = 1 + 8 + 7 + 1;

fn malformed(bytes: &[u8]) -> String {
    let err = Table::from_bytes(bytes).unwrap_err();
    assert_eq!(err.code(), DbfErrorCode::MalformedFile, "{}", err);
    err.to_string()
}

// =============================================================================
// Encode Layout Tests
// =============================================================================

#[test]
fn test_file_header_bytes() {
    let bytes = sample_table().to_bytes().unwrap();

    assert_eq!(bytes[0], 0x03);
    assert_eq!(&bytes[1..4], &[124, 3, 15]);
    assert_eq!(&bytes[4..8], &2u32.to_le_bytes());
    assert_eq!(&bytes[8..10], &(HEADER_LENGTH as u16).to_le_bytes());
    assert_eq!(&bytes[10..12], &(RECORD_LENGTH as u16).to_le_bytes());
    assert!(bytes[12..29].iter().all(|&b| b == 0));
    assert_eq!(bytes[29], 0x03, "windows-1252 language driver");
    assert_eq!(&bytes[30..32], &[0, 0]);
}

#[test]
fn test_field_descriptor_bytes() {
    let bytes = sample_table().to_bytes().unwrap();

    let city = &bytes[32..64];
    assert_eq!(&city[..11], b"CITY\0\0\0\0\0\0\0");
    assert_eq!(city[11], b'C');
    assert_eq!(&city[12..16], &1u32.to_le_bytes());
    assert_eq!(city[16], 8);
    assert_eq!(city[17], 0);
    assert!(city[18..].iter().all(|&b| b == 0));

    let pop = &bytes[64..96];
    assert_eq!(&pop[..4], b"POP\0");
    assert_eq!(pop[11], b'N');
    assert_eq!(&pop[12..16], &9u32.to_le_bytes());
    assert_eq!(pop[16], 7);

    let ok = &bytes[96..128];
    assert_eq!(ok[11], b'L');
    assert_eq!(&ok[12..16], &16u32.to_le_bytes());
    assert_eq!(ok[16], 1);

    assert_eq!(bytes[128], HEADER_TERMINATOR);
}

#[test]
fn test_record_bytes() {
    let bytes = sample_table().to_bytes().unwrap();
    assert_eq!(bytes.len(), HEADER_LENGTH + 2 * RECORD_LENGTH + 1);

    let first = &bytes[HEADER_LENGTH..HEADER_LENGTH + RECORD_LENGTH];
    assert_eq!(first, b" Gen\xE8ve   203856T");

    let second = &bytes[HEADER_LENGTH + RECORD_LENGTH..HEADER_LENGTH + 2 * RECORD_LENGTH];
    assert_eq!(second, b" Basel           ");

    assert_eq!(bytes[bytes.len() - 1], EOF_MARKER);
}

#[test]
fn test_utf8_table_has_no_language_driver() {
    let mut table = Table::new("UTF-8").unwrap();
    table.add_text_field("t", 4).unwrap();
    let bytes = table.to_bytes().unwrap();
    assert_eq!(bytes[29], 0x00);
    assert_eq!(bytes.len(), 32 + 32 + 1 + 1);
}

#[test]
fn test_empty_table_encodes() {
    let table = Table::new("UTF-8").unwrap();
    let bytes = table.to_bytes().unwrap();
    assert_eq!(bytes.len(), 32 + 1 + 1);
    assert_eq!(&bytes[8..10], &33u16.to_le_bytes());
    assert_eq!(&bytes[10..12], &1u16.to_le_bytes());
    assert_eq!(bytes[32], HEADER_TERMINATOR);

    let decoded = Table::from_bytes(&bytes).unwrap();
    assert!(decoded.fields().is_empty());
}

// =============================================================================
// Decode Tests
// =============================================================================

#[test]
fn test_decode_restores_header_metadata() {
    let decoded = Table::from_bytes(&sample_table().to_bytes().unwrap()).unwrap();
    assert_eq!(decoded.encoding(), "windows-1252");
    assert_eq!(decoded.last_updated(), NaiveDate::from_ymd_opt(2024, 3, 15));
    assert_eq!(decoded.field_value_by_name(0, "CITY").unwrap(), "Genève");
    assert_eq!(decoded.int64_field_value_by_name(0, "POP").unwrap(), 203856);
    assert_eq!(decoded.field_value_by_name(1, "OK").unwrap(), "");
}

#[test]
fn test_decoded_fields_match() {
    let decoded = Table::from_bytes(&sample_table().to_bytes().unwrap()).unwrap();
    let types: Vec<FieldType> = decoded.fields().iter().map(|f| f.field_type()).collect();
    assert_eq!(
        types,
        vec![FieldType::Character, FieldType::Number, FieldType::Logical]
    );
    assert_eq!(decoded.decimal_places_in_field("POP").unwrap(), 0);
}

#[test]
fn test_deletion_flag_survives_round_trip() {
    let mut bytes = sample_table().to_bytes().unwrap();
    bytes[HEADER_LENGTH + RECORD_LENGTH] = b'*';

    let decoded = Table::from_bytes(&bytes).unwrap();
    assert!(!decoded.is_deleted(0).unwrap());
    assert!(decoded.is_deleted(1).unwrap());
    assert_eq!(decoded.field_value_by_name(1, "CITY").unwrap(), "Basel");

    let reencoded = decoded.to_bytes().unwrap();
    assert_eq!(reencoded, bytes);
}

#[test]
fn test_foxpro_backlink_area_is_skipped() {
    let original = sample_table().to_bytes().unwrap();
    let backlink = 263;

    let mut bytes = original[..HEADER_LENGTH].to_vec();
    bytes[0] = 0x30;
    bytes[8..10].copy_from_slice(&((HEADER_LENGTH + backlink) as u16).to_le_bytes());
    bytes.extend(std::iter::repeat(0u8).take(backlink));
    bytes.extend_from_slice(&original[HEADER_LENGTH..]);

    let decoded = Table::from_bytes(&bytes).unwrap();
    assert_eq!(decoded.number_of_records(), 2);
    assert_eq!(decoded.field_value_by_name(0, "CITY").unwrap(), "Genève");
}

#[test]
fn test_unknown_language_driver_uses_config() {
    let mut bytes = sample_table().to_bytes().unwrap();
    bytes[29] = 0xEE;

    let config = TableConfig::new("windows-1252");
    let decoded = Table::from_bytes_with_config(&bytes, &config).unwrap();
    assert_eq!(decoded.encoding(), "windows-1252");
    assert_eq!(decoded.field_value_by_name(0, "CITY").unwrap(), "Genève");
}

/// Non-ASCII text each supported code page can store
fn native_sample(code_page: &CodePage) -> &'static str {
    match code_page.name() {
        "UTF-8" => "Łódź €",
        "windows-1252" => "Genève",
        "IBM866" | "windows-1251" => "Привет",
        "windows-874" => "สวัสดี",
        "windows-1255" => "שלום",
        "windows-1256" => "مرحبا",
        "windows-1250" => "Łódź",
        "windows-1254" => "Ağaç",
        "windows-1253" => "Αθήνα",
        "windows-1257" => "Kaunas ąž",
        "Shift_JIS" => "東京",
        "GBK" | "Big5" => "中文",
        "EUC-KR" => "서울",
        other => panic!("no sample text for {}", other),
    }
}

#[test]
fn test_every_code_page_survives_round_trip() {
    for code_page in CodePage::supported() {
        let mut table = Table::new(code_page.name()).unwrap();
        table.add_text_field("name", 20).unwrap();
        let row = table.add_record();
        let sample = native_sample(&code_page);
        table.set_field_value_by_name(row, "name", sample).unwrap();

        let decoded = Table::from_bytes(&table.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded.encoding(), code_page.name());
        assert_eq!(
            decoded.field_value_by_name(0, "name").unwrap(),
            sample,
            "{}",
            code_page
        );
    }
}

#[test]
fn test_code_page_without_driver_byte_is_refused() {
    for label in ["KOI8-R", "ISO-8859-2"] {
        let err = Table::new(label).unwrap_err();
        assert_eq!(err.code(), DbfErrorCode::UnknownEncoding, "{}", label);
    }
}

#[test]
fn test_invalid_text_for_code_page() {
    let mut bytes = sample_table().to_bytes().unwrap();
    bytes[29] = 0x00;
    // 0xE8 alone is not UTF-8
    malformed(&bytes);
}

// =============================================================================
// Malformed Input Tests
// =============================================================================

#[test]
fn test_short_file() {
    malformed(&[]);
    malformed(&[0x03; 31]);
}

#[test]
fn test_unknown_version() {
    let mut bytes = sample_table().to_bytes().unwrap();
    bytes[0] = 0x99;
    malformed(&bytes);
}

#[test]
fn test_dbase7_version_is_unsupported() {
    let mut bytes = sample_table().to_bytes().unwrap();
    bytes[0] = 0x04;
    assert!(malformed(&bytes).contains("unsupported version signature 0x04"));
}

#[test]
fn test_record_count_beyond_data() {
    let mut bytes = sample_table().to_bytes().unwrap();
    bytes[4..8].copy_from_slice(&3u32.to_le_bytes());
    let message = malformed(&bytes);
    assert!(message.contains("3 records"));
}

#[test]
fn test_truncated_record_data() {
    let bytes = sample_table().to_bytes().unwrap();
    malformed(&bytes[..HEADER_LENGTH + RECORD_LENGTH + 5]);
}

#[test]
fn test_missing_header_terminator() {
    let mut bytes = sample_table().to_bytes().unwrap();
    bytes[128] = b'X';
    malformed(&bytes);
}

#[test]
fn test_header_length_beyond_file() {
    let mut bytes = sample_table().to_bytes().unwrap();
    bytes[8..10].copy_from_slice(&u16::MAX.to_le_bytes());
    malformed(&bytes);
}

#[test]
fn test_record_length_mismatch() {
    let mut bytes = sample_table().to_bytes().unwrap();
    bytes[10..12].copy_from_slice(&((RECORD_LENGTH + 1) as u16).to_le_bytes());
    malformed(&bytes);
}

#[test]
fn test_bad_deletion_flag() {
    let mut bytes = sample_table().to_bytes().unwrap();
    bytes[HEADER_LENGTH] = b'#';
    malformed(&bytes);
}

#[test]
fn test_unsupported_field_type() {
    let mut bytes = sample_table().to_bytes().unwrap();
    bytes[32 + 11] = b'M';
    let message = malformed(&bytes);
    assert!(message.contains("CITY"));
}

#[test]
fn test_invalid_descriptor_definition() {
    let mut bytes = sample_table().to_bytes().unwrap();
    // logical field claiming two bytes
    bytes[96 + 16] = 2;
    malformed(&bytes);
}

#[test]
fn test_duplicate_descriptor_names() {
    let mut bytes = sample_table().to_bytes().unwrap();
    bytes[64..75].copy_from_slice(b"CITY\0\0\0\0\0\0\0");
    malformed(&bytes);
}

// =============================================================================
// Sink / Source Tests
// =============================================================================

#[test]
fn test_file_round_trip() {
    let table = sample_table();
    let mut file = tempfile().unwrap();
    table.write_to(BufWriter::new(&mut file)).unwrap();
    file.flush().unwrap();
    file.seek(SeekFrom::Start(0)).unwrap();

    let decoded = Table::read_from(BufReader::new(&mut file), &TableConfig::default()).unwrap();
    assert_eq!(decoded.fields(), table.fields());
    assert_eq!(decoded.get_row_as_slice(0).unwrap(), table.get_row_as_slice(0).unwrap());
    assert_eq!(decoded.to_bytes().unwrap(), table.to_bytes().unwrap());
}

#[test]
fn test_encode_to_matches_encode() {
    let table = sample_table();
    let mut sink = Vec::new();
    format::encode_to(&table, &mut sink).unwrap();
    assert_eq!(sink, format::encode(&table).unwrap());
}

struct FailingReader;

impl Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
        Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "source closed"))
    }
}

#[test]
fn test_read_from_reports_io_errors() {
    let err = Table::read_from(FailingReader, &TableConfig::default()).unwrap_err();
    assert_eq!(err.code(), DbfErrorCode::IoError);
}
