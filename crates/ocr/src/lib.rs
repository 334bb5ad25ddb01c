pub mod preprocess;
pub mod recognizer;
pub mod render;

pub use preprocess::{encode_png, normalize, PreprocessError};
pub use recognizer::{CommandRecognizer, MockRecognizer, OcrBackend, OcrError};
pub use render::render_first_page;
