use serde_json::{Map, Value};

use crate::fields::BillField;

/// Repair one known extraction anomaly: the model sometimes emits the
/// account-number *label* as a value under some other key (usually with the
/// real account number as that key). When the account field is missing or
/// blank, the first entry whose value equals the label string gets its key
/// promoted into the account slot. The echoed entry is left in place.
///
/// Populated account field ⇒ no-op. Running this twice is the same as
/// running it once.
pub fn reconcile_account_number(mapping: &mut Map<String, Value>) {
    let label = BillField::AccountNumber.label();
    if mapping.get(label).is_some_and(|v| !value_is_blank(v)) {
        return;
    }

    let promoted = mapping.iter().find_map(|(key, value)| match value {
        Value::String(s) if s.trim() == label => Some(key.clone()),
        _ => None,
    });

    if let Some(key) = promoted {
        mapping.insert(label.to_string(), Value::String(key));
    }
}

fn value_is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}
