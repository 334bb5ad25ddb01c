pub mod fields;
pub mod provider;
pub mod reconcile;
pub mod validate;

pub use fields::{bill_label, BillField, FieldRecord, FieldValue};
pub use provider::{AliasError, ProviderAliases};
pub use reconcile::reconcile_account_number;
pub use validate::validate_fields;
