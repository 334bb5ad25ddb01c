use std::time::Duration;

use ampere_core::{
    bill_label, reconcile_account_number, validate_fields, FieldRecord, ProviderAliases,
};
use ampere_ocr::{encode_png, normalize, render_first_page, OcrBackend};
use tracing::debug;

use crate::extractor::StructuredExtractor;
use crate::llm::TextGenerator;

/// Orchestrates one document: render → normalize → recognize → extract →
/// reconcile → validate → assign identifier.
pub struct BillPipeline<R: OcrBackend, G: TextGenerator> {
    recognizer: R,
    extractor: StructuredExtractor<G>,
    aliases: ProviderAliases,
}

impl<R: OcrBackend, G: TextGenerator> BillPipeline<R, G> {
    pub fn new(recognizer: R, generator: G) -> Self {
        Self {
            recognizer,
            extractor: StructuredExtractor::new(generator),
            aliases: ProviderAliases::default(),
        }
    }

    pub fn with_aliases(mut self, aliases: ProviderAliases) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.extractor = self.extractor.with_retry_delay(delay);
        self
    }

    /// Process one source document. `sequence` is the 1-based position in
    /// the batch and determines the record's identifier.
    ///
    /// This never fails: every upstream problem is converted into
    /// diagnostics next to a best-effort (possibly all-empty) record, so a
    /// batch always moves on to the next document.
    pub async fn process_document(
        &self,
        bytes: &[u8],
        sequence: usize,
    ) -> (FieldRecord, Vec<String>) {
        let label = bill_label(sequence);
        let mut diagnostics = Vec::new();

        let Some(page) = render_first_page(bytes) else {
            diagnostics.push(format!(
                "{label}: could not render the first page of the source document"
            ));
            let mut record = FieldRecord::empty();
            record.set_bill_number(sequence);
            return (record, diagnostics);
        };

        let normalized = normalize(&page);
        let ocr_text = match encode_png(&normalized) {
            Ok(png) => match self.recognizer.recognize(&png) {
                Ok(text) => text,
                Err(e) => {
                    diagnostics.push(format!("{label}: text recognition failed: {e}"));
                    String::new()
                }
            },
            Err(e) => {
                diagnostics.push(format!("{label}: could not encode page for OCR: {e}"));
                String::new()
            }
        };
        debug!("{label}: recognized {} characters", ocr_text.len());

        let (mut mapping, extraction_diagnostics) =
            self.extractor.extract(&label, &ocr_text).await;
        diagnostics.extend(extraction_diagnostics);

        reconcile_account_number(&mut mapping);

        let (mut record, validation_diagnostics) = validate_fields(&mapping, &self.aliases);
        diagnostics.extend(
            validation_diagnostics
                .into_iter()
                .map(|message| format!("{label}: validation: {message}")),
        );

        record.set_bill_number(sequence);
        (record, diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{GenerateError, MockGenerator};
    use ampere_core::{BillField, FieldValue};
    use ampere_ocr::{MockRecognizer, OcrError};
    use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
    use std::io::Cursor;
    use std::sync::atomic::Ordering;

    fn tiny_png() -> Vec<u8> {
        let img: GrayImage = ImageBuffer::from_fn(4, 4, |_, _| Luma([200u8]));
        let mut buf = Vec::new();
        DynamicImage::ImageLuma8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    fn pipeline(
        ocr_text: &str,
        replies: Vec<Result<String, GenerateError>>,
    ) -> BillPipeline<MockRecognizer, MockGenerator> {
        BillPipeline::new(MockRecognizer::new(ocr_text), MockGenerator::new(replies))
            .with_retry_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn full_run_produces_validated_record() {
        let reply = r#"{
            "Customer Name": "A. Sharma",
            "Customer Account Number / Consumer ID": "111222333",
            "Billing Date": "15-01-2024",
            "Units Consumed (kWh)": "1,245",
            "Amount Payable": 845.20,
            "Due Date": "30-01-2024",
            "Electricity Provider Name": "ADANI Power",
            "Bill Number": "INV-0042"
        }"#;
        let p = pipeline("ADANI ELECTRICITY ...", vec![Ok(reply.to_string())]);
        let (record, diagnostics) = p.process_document(&tiny_png(), 1).await;

        assert_eq!(record.get(BillField::CustomerName), &FieldValue::text("A. Sharma"));
        assert_eq!(record.get(BillField::BillingDate), &FieldValue::text("2024-01-15"));
        assert_eq!(record.get(BillField::UnitsConsumed), &FieldValue::Number(1245.0));
        assert_eq!(record.get(BillField::AmountPayable), &FieldValue::Number(845.20));
        assert_eq!(
            record.get(BillField::ProviderName),
            &FieldValue::text("Adani Electricity")
        );
        // The extracted bill number is always replaced by the assigned one.
        assert_eq!(record.get(BillField::BillNumber), &FieldValue::text("Bill_1"));
        assert!(diagnostics.is_empty());
    }

    #[tokio::test]
    async fn render_failure_yields_empty_identified_record() {
        let p = pipeline("unused", vec![]);
        let (record, diagnostics) = p.process_document(b"not a document", 2).await;

        assert_eq!(record.iter().count(), 10);
        assert_eq!(record.get(BillField::BillNumber), &FieldValue::text("Bill_2"));
        assert!(record.get(BillField::CustomerName).is_empty());
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].starts_with("Bill_2:"));
    }

    #[tokio::test]
    async fn recognition_failure_degrades_to_empty_text() {
        struct FailingRecognizer;
        impl OcrBackend for FailingRecognizer {
            fn recognize(&self, _image_bytes: &[u8]) -> Result<String, OcrError> {
                Err(OcrError::Engine("engine exploded".to_string()))
            }
        }

        let p = BillPipeline::new(
            FailingRecognizer,
            MockGenerator::new(vec![Ok("{}".to_string())]),
        )
        .with_retry_delay(Duration::ZERO);
        let (record, diagnostics) = p.process_document(&tiny_png(), 1).await;

        // Extraction still ran (over empty text) and the record is whole.
        assert_eq!(record.iter().count(), 10);
        assert!(diagnostics.iter().any(|d| d.contains("text recognition failed")));
    }

    #[tokio::test]
    async fn exhausted_retries_still_return_a_whole_record() {
        let gen = MockGenerator::always_failing();
        let counter = gen.call_counter();
        let p = BillPipeline::new(MockRecognizer::new("text"), gen)
            .with_retry_delay(Duration::ZERO);
        let (record, diagnostics) = p.process_document(&tiny_png(), 5).await;

        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(record.iter().count(), 10);
        assert_eq!(record.get(BillField::BillNumber), &FieldValue::text("Bill_5"));
        assert!(diagnostics.iter().any(|d| d.contains("failed after 3 attempts")));
    }

    #[tokio::test]
    async fn misplaced_account_number_is_reconciled() {
        let reply = r#"{"XYZ123": "Customer Account Number / Consumer ID"}"#;
        let p = pipeline("text", vec![Ok(reply.to_string())]);
        let (record, _) = p.process_document(&tiny_png(), 1).await;
        assert_eq!(
            record.get(BillField::AccountNumber),
            &FieldValue::text("XYZ123")
        );
    }

    #[tokio::test]
    async fn validation_diagnostics_are_tagged_with_the_document() {
        let reply = r#"{"Amount Payable": "abc", "Billing Date": "someday"}"#;
        let p = pipeline("text", vec![Ok(reply.to_string())]);
        let (_, diagnostics) = p.process_document(&tiny_png(), 9).await;
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.iter().all(|d| d.starts_with("Bill_9: validation:")));
    }
}
