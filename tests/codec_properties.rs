//! Codec Property Tests
//!
//! For arbitrary schemas and records:
//! - decode(encode(t)) has the same fields, record count and values
//! - re-encoding a decoded table reproduces the original bytes
//! - numeric values read back as the number that was stored

use dbftable::Table;
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

const NUMERIC_WIDTH: u8 = 12;

#[derive(Debug, Clone, Copy)]
enum Column {
    Logical,
    Date,
    Text(u8),
    Number(u8),
    Float(u8),
}

fn arb_column() -> impl Strategy<Value = Column> {
    prop_oneof![
        Just(Column::Logical),
        Just(Column::Date),
        (1u8..=20).prop_map(Column::Text),
        (0u8..=3).prop_map(Column::Number),
        (0u8..=3).prop_map(Column::Float),
    ]
}

/// `units` scaled down by `10^decimal_places`, as decimal text
fn fixed_point(units: i64, decimal_places: u8) -> String {
    if decimal_places == 0 {
        return units.to_string();
    }
    let scale = 10i64.pow(u32::from(decimal_places));
    let sign = if units < 0 { "-" } else { "" };
    let abs = units.abs();
    format!(
        "{}{}.{:0width$}",
        sign,
        abs / scale,
        abs % scale,
        width = usize::from(decimal_places)
    )
}

fn arb_value(column: Column) -> BoxedStrategy<String> {
    match column {
        Column::Logical => prop_oneof![Just("T"), Just("F"), Just("?"), Just("")]
            .prop_map(String::from)
            .boxed(),
        Column::Date => prop_oneof![
            Just(String::new()),
            (1900i32..=2100, 1u32..=12, 1u32..=28)
                .prop_map(|(y, m, d)| format!("{:04}{:02}{:02}", y, m, d)),
        ]
        .boxed(),
        Column::Text(length) => {
            proptest::string::string_regex(&format!("[a-zA-Z0-9 äöüé€]{{0,{}}}", length))
                .expect("valid regex")
                .boxed()
        }
        Column::Number(places) | Column::Float(places) => (-999_999i64..=999_999)
            .prop_map(move |units| fixed_point(units, places))
            .boxed(),
    }
}

fn arb_table() -> impl Strategy<Value = (Vec<Column>, Vec<Vec<String>>)> {
    prop::collection::vec(arb_column(), 1..6).prop_flat_map(|columns| {
        let row: Vec<BoxedStrategy<String>> = columns.iter().copied().map(arb_value).collect();
        (Just(columns), prop::collection::vec(row, 0..5))
    })
}

fn build_table(encoding: &str, columns: &[Column], rows: &[Vec<String>]) -> Table {
    let mut table = Table::new(encoding).unwrap();
    for (index, column) in columns.iter().enumerate() {
        let name = format!("F{}", index);
        match *column {
            Column::Logical => table.add_boolean_field(&name),
            Column::Date => table.add_date_field(&name),
            Column::Text(length) => table.add_text_field(&name, length),
            Column::Number(places) => table.add_number_field(&name, NUMERIC_WIDTH, places),
            Column::Float(places) => table.add_float_field(&name, NUMERIC_WIDTH, places),
        }
        .unwrap();
    }
    for row in rows {
        let record = table.add_record();
        for (field, value) in row.iter().enumerate() {
            table.set_field_value(record, field, value).unwrap();
        }
    }
    table
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_decode_inverts_encode((columns, rows) in arb_table()) {
        let table = build_table("UTF-8", &columns, &rows);
        let decoded = Table::from_bytes(&table.to_bytes().unwrap()).unwrap();

        prop_assert_eq!(decoded.fields(), table.fields());
        prop_assert_eq!(decoded.number_of_records(), table.number_of_records());
        for index in 0..table.number_of_records() {
            prop_assert_eq!(
                decoded.get_row_as_slice(index).unwrap(),
                table.get_row_as_slice(index).unwrap()
            );
        }
    }

    #[test]
    fn prop_reencode_is_byte_identical((columns, rows) in arb_table()) {
        let bytes = build_table("windows-1252", &columns, &rows).to_bytes().unwrap();
        let reencoded = Table::from_bytes(&bytes).unwrap().to_bytes().unwrap();
        prop_assert_eq!(reencoded, bytes);
    }

    #[test]
    fn prop_numbers_read_back(units in -999_999i64..=999_999, places in 0u8..=3) {
        let text = fixed_point(units, places);
        let table = build_table("UTF-8", &[Column::Number(places)], &[vec![text]]);
        let decoded = Table::from_bytes(&table.to_bytes().unwrap()).unwrap();

        let expected = units as f64 / 10f64.powi(i32::from(places));
        let actual = decoded.float64_field_value_by_name(0, "F0").unwrap();
        prop_assert!((actual - expected).abs() < 1e-9);
        if places == 0 {
            prop_assert_eq!(decoded.int64_field_value_by_name(0, "F0").unwrap(), units);
        }
    }

    #[test]
    fn prop_text_never_exceeds_width(text in "\\PC{0,40}", width in 1u8..=30) {
        let mut table = Table::new("UTF-8").unwrap();
        table.add_text_field("T", width).unwrap();
        table.add_record();
        table.set_field_value_by_name(0, "T", &text).unwrap();

        let stored = table.field_value_by_name(0, "T").unwrap();
        prop_assert!(stored.len() <= usize::from(width));
        prop_assert!(text.starts_with(stored.as_str()));
    }
}
