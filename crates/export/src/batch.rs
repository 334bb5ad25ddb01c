use ampere_core::{BillField, FieldRecord};

/// Everything a batch run accumulates: one record per document, in batch
/// order, plus every diagnostic raised along the way.
///
/// The orchestrator owns this value and threads it through the run
/// explicitly; the per-document pipeline itself holds no batch state.
#[derive(Debug, Default)]
pub struct BatchResult {
    pub records: Vec<FieldRecord>,
    pub diagnostics: Vec<String>,
}

impl BatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_document(&mut self, record: FieldRecord, diagnostics: Vec<String>) {
        self.records.push(record);
        self.diagnostics.extend(diagnostics);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// How much of the batch was actually extracted.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageSummary {
    pub total_fields: usize,
    pub extracted_fields: usize,
    /// Percentage of non-empty fields, rounded to two decimals.
    pub coverage_pct: f64,
}

/// Pure reduction over validated records: count the fields that carry a
/// value. The empty-string sentinel is the only thing that counts as
/// "not extracted"; preserved-but-invalid values still hold data.
pub fn coverage(records: &[FieldRecord]) -> CoverageSummary {
    let total_fields = records.len() * BillField::ALL.len();
    let extracted_fields = records
        .iter()
        .flat_map(|record| record.iter())
        .filter(|(_, value)| !value.is_empty())
        .count();
    let coverage_pct = if total_fields == 0 {
        0.0
    } else {
        (extracted_fields as f64 / total_fields as f64 * 100.0 * 100.0).round() / 100.0
    };
    CoverageSummary {
        total_fields,
        extracted_fields,
        coverage_pct,
    }
}
