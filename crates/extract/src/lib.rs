pub mod extractor;
pub mod json;
pub mod llm;
pub mod pipeline;
pub mod prompt;

pub use extractor::{StructuredExtractor, MAX_ATTEMPTS};
pub use json::{first_json_object, JsonScanError};
pub use llm::{GeminiGenerator, GenerateError, MockGenerator, TextGenerator};
pub use pipeline::BillPipeline;
pub use prompt::build_prompt;
