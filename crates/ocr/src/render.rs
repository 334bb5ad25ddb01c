use image::DynamicImage;
use std::fs;
use std::process::Command;
use tracing::debug;

/// Rasterization DPI for PDF pages. 300 is what OCR engines are tuned for.
const RENDER_DPI: &str = "300";

/// Turn one source document into the raster of its first page.
///
/// Raster formats (PNG/JPEG/WEBP/…) decode directly; anything else is
/// treated as a PDF and rasterized through `pdftoppm`. Every failure mode
/// (undecodable bytes, missing poppler install, rasterizer crash) is
/// `None`: the caller decides what a missing page means.
pub fn render_first_page(bytes: &[u8]) -> Option<DynamicImage> {
    if let Ok(img) = image::load_from_memory(bytes) {
        return Some(img);
    }
    render_pdf_first_page(bytes)
}

/// Rasterize page 1 of a PDF via the `pdftoppm` CLI. The scratch directory
/// lives exactly as long as this call, so no per-document artifacts survive.
fn render_pdf_first_page(bytes: &[u8]) -> Option<DynamicImage> {
    let scratch = tempfile::TempDir::with_prefix("ampere-render").ok()?;
    let pdf_path = scratch.path().join("input.pdf");
    fs::write(&pdf_path, bytes).ok()?;

    let output = Command::new("pdftoppm")
        .args(["-png", "-r", RENDER_DPI, "-f", "1", "-l", "1"])
        .arg(&pdf_path)
        .arg(scratch.path().join("page"))
        .output();
    let output = match output {
        Ok(out) => out,
        Err(e) => {
            debug!("pdftoppm could not be run: {e}");
            return None;
        }
    };
    if !output.status.success() {
        debug!(
            "pdftoppm failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return None;
    }

    // pdftoppm names its output page-1.png (zero-padded for longer
    // documents); take the first PNG it produced.
    let page_path = fs::read_dir(scratch.path())
        .ok()?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "png"))
        .min()?;
    image::open(&page_path).ok()
}
