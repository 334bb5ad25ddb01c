use std::collections::BTreeMap;
use std::fmt;

use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// The fixed set of fields extracted from every bill.
///
/// `ALL` is the canonical order — export columns and serialized records
/// always follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BillField {
    CustomerName,
    AccountNumber,
    BillingDate,
    BillingPeriod,
    UnitsConsumed,
    AmountPayable,
    DueDate,
    TariffCategory,
    ProviderName,
    BillNumber,
}

impl BillField {
    pub const ALL: [BillField; 10] = [
        BillField::CustomerName,
        BillField::AccountNumber,
        BillField::BillingDate,
        BillField::BillingPeriod,
        BillField::UnitsConsumed,
        BillField::AmountPayable,
        BillField::DueDate,
        BillField::TariffCategory,
        BillField::ProviderName,
        BillField::BillNumber,
    ];

    /// The wire label: the key the extraction model is asked to emit and
    /// the column header used in exports.
    pub fn label(self) -> &'static str {
        match self {
            BillField::CustomerName => "Customer Name",
            BillField::AccountNumber => "Customer Account Number / Consumer ID",
            BillField::BillingDate => "Billing Date",
            BillField::BillingPeriod => "Billing Period",
            BillField::UnitsConsumed => "Units Consumed (kWh)",
            BillField::AmountPayable => "Amount Payable",
            BillField::DueDate => "Due Date",
            BillField::TariffCategory => "Tariff Category",
            BillField::ProviderName => "Electricity Provider Name",
            BillField::BillNumber => "Bill Number",
        }
    }
}

impl fmt::Display for BillField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for BillField {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BillField::ALL
            .into_iter()
            .find(|field| field.label() == s)
            .ok_or_else(|| format!("Unknown bill field: '{s}'"))
    }
}

/// A single extracted value: free text or a normalized number.
/// The empty string stands for "unknown / not extractable".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn empty() -> Self {
        FieldValue::Text(String::new())
    }

    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Text(s.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Text(s) if s.is_empty())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// The validated, fully-keyed result for one bill: every field in
/// [`BillField::ALL`] is always present.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRecord {
    values: BTreeMap<BillField, FieldValue>,
}

impl FieldRecord {
    /// A record with every field set to the empty-string sentinel.
    pub fn empty() -> Self {
        let values = BillField::ALL
            .into_iter()
            .map(|field| (field, FieldValue::empty()))
            .collect();
        FieldRecord { values }
    }

    pub fn get(&self, field: BillField) -> &FieldValue {
        // `empty()` seeds every key and `set` never removes one.
        &self.values[&field]
    }

    pub fn set(&mut self, field: BillField, value: FieldValue) {
        self.values.insert(field, value);
    }

    /// Fields in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (BillField, &FieldValue)> + '_ {
        BillField::ALL.into_iter().map(|field| (field, self.get(field)))
    }

    /// Overwrite the bill number with the deterministic per-batch
    /// identifier, regardless of what extraction produced.
    pub fn set_bill_number(&mut self, sequence: usize) {
        self.set(BillField::BillNumber, FieldValue::text(bill_label(sequence)));
    }
}

impl Default for FieldRecord {
    fn default() -> Self {
        FieldRecord::empty()
    }
}

/// The identifier assigned to the `sequence`-th document of a batch
/// (1-based).
pub fn bill_label(sequence: usize) -> String {
    format!("Bill_{sequence}")
}

impl Serialize for FieldRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(BillField::ALL.len()))?;
        for (field, value) in self.iter() {
            map.serialize_entry(field.label(), value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FieldRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, FieldValue>::deserialize(deserializer)?;
        let mut record = FieldRecord::empty();
        for (label, value) in raw {
            if let Ok(field) = label.parse::<BillField>() {
                record.set(field, value);
            }
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_record_has_all_ten_fields() {
        let record = FieldRecord::empty();
        assert_eq!(record.iter().count(), 10);
        for (_, value) in record.iter() {
            assert!(value.is_empty());
        }
    }

    #[test]
    fn label_roundtrip() {
        for field in BillField::ALL {
            assert_eq!(field.label().parse::<BillField>().unwrap(), field);
        }
        assert!("Not A Field".parse::<BillField>().is_err());
    }

    #[test]
    fn bill_label_is_one_based() {
        assert_eq!(bill_label(1), "Bill_1");
        assert_eq!(bill_label(42), "Bill_42");
    }

    #[test]
    fn set_bill_number_overwrites_extracted_value() {
        let mut record = FieldRecord::empty();
        record.set(BillField::BillNumber, FieldValue::text("INV-99887"));
        record.set_bill_number(3);
        assert_eq!(record.get(BillField::BillNumber), &FieldValue::text("Bill_3"));
    }

    #[test]
    fn serializes_with_wire_labels_in_canonical_order() {
        let mut record = FieldRecord::empty();
        record.set(BillField::CustomerName, FieldValue::text("A. Sharma"));
        record.set(BillField::AmountPayable, FieldValue::Number(1234.5));

        let json = serde_json::to_string(&record).unwrap();
        let first_key = json.find("Customer Name").unwrap();
        let amount_key = json.find("Amount Payable").unwrap();
        assert!(first_key < amount_key);
        assert!(json.contains(r#""Amount Payable":1234.5"#));
    }

    #[test]
    fn serde_roundtrip_is_lossless() {
        let mut record = FieldRecord::empty();
        record.set(BillField::CustomerName, FieldValue::text("A. Sharma"));
        record.set(BillField::UnitsConsumed, FieldValue::Number(245.0));
        record.set(BillField::AmountPayable, FieldValue::Number(-5.0));
        record.set(BillField::BillingDate, FieldValue::text("2024-01-15"));
        record.set_bill_number(7);

        let json = serde_json::to_string(&record).unwrap();
        let back: FieldRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn deserialize_fills_missing_fields_with_empty() {
        let back: FieldRecord =
            serde_json::from_str(r#"{"Customer Name": "B. Rao"}"#).unwrap();
        assert_eq!(back.get(BillField::CustomerName), &FieldValue::text("B. Rao"));
        assert!(back.get(BillField::DueDate).is_empty());
        assert_eq!(back.iter().count(), 10);
    }

    #[test]
    fn field_value_untagged_number_vs_text() {
        let n: FieldValue = serde_json::from_str("42.5").unwrap();
        assert_eq!(n, FieldValue::Number(42.5));
        let t: FieldValue = serde_json::from_str(r#""42.5 kWh""#).unwrap();
        assert_eq!(t, FieldValue::text("42.5 kWh"));
    }
}
