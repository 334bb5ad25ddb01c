use std::io::Write;

use ampere_core::{BillField, FieldRecord};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CsvError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Write the consolidated table: a header of the ten wire labels followed
/// by one row per record, columns in canonical field order.
pub fn write_csv<W: Write>(records: &[FieldRecord], writer: W) -> Result<(), CsvError> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(BillField::ALL.iter().map(|field| field.label()))?;
    for record in records {
        out.write_record(
            BillField::ALL
                .iter()
                .map(|field| record.get(*field).to_string()),
        )?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ampere_core::FieldValue;

    fn sample_record() -> FieldRecord {
        let mut record = FieldRecord::empty();
        record.set(BillField::CustomerName, FieldValue::text("A. Sharma"));
        record.set(BillField::AmountPayable, FieldValue::Number(845.2));
        record.set(BillField::BillingDate, FieldValue::text("2024-01-15"));
        record.set_bill_number(1);
        record
    }

    fn render(records: &[FieldRecord]) -> String {
        let mut buf = Vec::new();
        write_csv(records, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn header_lists_all_fields_in_order() {
        let output = render(&[]);
        let header = output.lines().next().unwrap();
        assert!(header.starts_with("Customer Name,"));
        assert!(header.ends_with(",Bill Number"));
        // The account label contains commas-free text but spaces and a slash.
        assert!(header.contains("Customer Account Number / Consumer ID"));
    }

    #[test]
    fn one_row_per_record() {
        let output = render(&[sample_record(), FieldRecord::empty()]);
        assert_eq!(output.lines().count(), 3);
    }

    #[test]
    fn numbers_render_without_quoting() {
        let output = render(&[sample_record()]);
        let row = output.lines().nth(1).unwrap();
        assert!(row.contains("845.2"));
        assert!(row.contains("2024-01-15"));
        assert!(row.contains("Bill_1"));
    }

    #[test]
    fn empty_fields_are_empty_cells() {
        let output = render(&[FieldRecord::empty()]);
        let row = output.lines().nth(1).unwrap();
        assert_eq!(row, ",,,,,,,,,");
    }
}
