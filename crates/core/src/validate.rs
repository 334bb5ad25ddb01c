use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::fields::{BillField, FieldRecord, FieldValue};
use crate::provider::ProviderAliases;

/// Accepted calendar-date spellings, tried in order. The first one that
/// parses wins and is rewritten as `%Y-%m-%d`.
const DATE_FORMATS: [&str; 6] = [
    "%d-%m-%Y",
    "%d-%b-%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%Y-%m-%d",
    "%m/%d/%Y",
];

/// Type-check and canonicalize a raw extraction mapping into a fully-keyed
/// [`FieldRecord`].
///
/// Anomalies become diagnostics, never errors: a value that fails its
/// numeric or date contract is kept verbatim next to the diagnostic so no
/// extracted data is silently dropped.
pub fn validate_fields(
    raw: &Map<String, Value>,
    aliases: &ProviderAliases,
) -> (FieldRecord, Vec<String>) {
    let mut record = FieldRecord::empty();
    let mut diagnostics = Vec::new();

    for field in BillField::ALL {
        if let Some(value) = raw.get(field.label()) {
            record.set(field, raw_field_value(value));
        }
    }

    for field in [BillField::UnitsConsumed, BillField::AmountPayable] {
        let raw_str = record.get(field).to_string().trim().to_string();
        if raw_str.is_empty() {
            continue;
        }
        let cleaned = raw_str.replace(',', "");
        let parsed = Decimal::from_str(&cleaned)
            .or_else(|_| Decimal::from_scientific(&cleaned))
            .ok()
            .and_then(|d| d.to_f64());
        match parsed {
            Some(number) => {
                if number < 0.0 {
                    diagnostics.push(format!(
                        "'{}': Negative value found '{raw_str}'.",
                        field.label()
                    ));
                }
                record.set(field, FieldValue::Number(number));
            }
            None => {
                // Keep the unparseable original alongside the diagnostic.
                diagnostics.push(format!(
                    "'{}': Invalid number format '{raw_str}'.",
                    field.label()
                ));
            }
        }
    }

    for field in [BillField::BillingDate, BillField::DueDate] {
        let trimmed = record.get(field).to_string().trim().to_string();
        if trimmed.is_empty() {
            record.set(field, FieldValue::empty());
            continue;
        }
        match normalize_date(&trimmed) {
            Some(canonical) => record.set(field, FieldValue::text(canonical)),
            None => {
                diagnostics.push(format!(
                    "'{}': Could not parse '{trimmed}'.",
                    field.label()
                ));
                record.set(field, FieldValue::text(trimmed));
            }
        }
    }

    let provider = record.get(BillField::ProviderName).to_string();
    record.set(
        BillField::ProviderName,
        FieldValue::text(aliases.normalize(&provider)),
    );

    (record, diagnostics)
}

/// Parse a date against the accepted formats and return it in canonical
/// year-month-day form.
pub fn normalize_date(s: &str) -> Option<String> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .map(|date| date.format("%Y-%m-%d").to_string())
}

fn raw_field_value(value: &Value) -> FieldValue {
    match value {
        Value::Null => FieldValue::empty(),
        Value::String(s) => FieldValue::text(s.clone()),
        Value::Number(n) => match n.as_f64() {
            Some(f) => FieldValue::Number(f),
            None => FieldValue::text(n.to_string()),
        },
        Value::Bool(b) => FieldValue::text(b.to_string()),
        other => FieldValue::text(other.to_string()),
    }
}
