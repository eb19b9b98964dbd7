//! Export transforms: print sanitization, standalone HTML, JSON
//! snapshots, and the PDF export job.
//!
//! Export always works from a frozen markup snapshot, never from the
//! live tree. The rasterizer and image probe are external collaborators
//! behind traits so the pipeline stays testable.

use std::sync::OnceLock;
use std::time::Duration;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Stylesheet prepended to print markup. Page-break divs become real
/// print breaks and placeholder spans keep their editor tint.
const PRINT_STYLESHEET: &str = "\
@page { size: a4 portrait; margin: 15mm; }\n\
body { font-family: 'Helvetica Neue', Arial, sans-serif; line-height: 1.5; color: #111827; }\n\
.page-break { page-break-after: always; height: 0; visibility: hidden; }\n\
span[data-placeholder-key] { background-color: #ede9fe; border-radius: 3px; padding: 0 2px; }\n\
table { border-collapse: collapse; width: 100%; }\n\
td, th { border: 1px solid #d1d5db; padding: 6px 8px; vertical-align: top; }\n\
th { background-color: #f3f4f6; text-align: left; }\n\
img { max-width: 100%; }\n";

/// Presentational stylesheet inlined into standalone HTML exports
const EXPORT_STYLESHEET: &str = "\
body { max-width: 800px; margin: 40px auto; font-family: 'Helvetica Neue', Arial, sans-serif; \
line-height: 1.6; color: #111827; }\n\
h1, h2, h3 { line-height: 1.25; }\n\
blockquote { border-left: 3px solid #d1d5db; margin-left: 0; padding-left: 16px; color: #4b5563; }\n\
pre { background-color: #f3f4f6; padding: 12px; border-radius: 6px; overflow-x: auto; }\n\
a { color: #2563eb; }\n\
table { border-collapse: collapse; width: 100%; }\n\
td, th { border: 1px solid #d1d5db; padding: 6px 8px; vertical-align: top; }\n\
th { background-color: #f3f4f6; text-align: left; }\n\
img { max-width: 100%; }\n\
span[data-placeholder-key] { background-color: #ede9fe; border-radius: 3px; padding: 0 2px; }\n\
.page-break { border-top: 1px dashed #9ca3af; margin: 24px 0; }\n";

fn script_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script>").unwrap())
}

fn style_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<style\b[^>]*>(.*?)</style>").unwrap())
}

fn img_src_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)(<img\b[^>]*\bsrc=")([^"]*)(")"#).unwrap())
}

/// CSS features the print rasterizer cannot handle
fn style_block_is_print_safe(css: &str) -> bool {
    let lower = css.to_ascii_lowercase();
    !(lower.contains("oklch(")
        || lower.contains("oklab(")
        || lower.contains("color-mix(")
        || lower.contains("backdrop-filter"))
}

fn image_src_is_print_safe(src: &str) -> bool {
    let lower = src.trim().to_ascii_lowercase();
    if lower.starts_with("data:")
        || lower.starts_with("http://")
        || lower.starts_with("https://")
    {
        return true;
    }
    // Scheme-less sources are relative paths and pass through.
    !lower.contains(':')
}

/// Prepare a markup snapshot for the print rasterizer
///
/// Strips `<script>` subtrees and any `<style>` block using CSS the
/// rasterizer chokes on, empties image sources with unsafe schemes, and
/// prepends the print stylesheet.
pub fn sanitize_for_print(markup: &str) -> String {
    let without_scripts = script_re().replace_all(markup, "");
    let mut out = String::new();
    let mut last = 0;
    for captures in style_re().captures_iter(&without_scripts) {
        let (whole, css) = match (captures.get(0), captures.get(1)) {
            (Some(whole), Some(css)) => (whole, css.as_str()),
            _ => continue,
        };
        out.push_str(&without_scripts[last..whole.start()]);
        if style_block_is_print_safe(css) {
            out.push_str(whole.as_str());
        } else {
            tracing::warn!("dropping style block with print-unsafe CSS");
        }
        last = whole.end();
    }
    out.push_str(&without_scripts[last..]);

    let body = img_src_re().replace_all(&out, |caps: &regex_lite::Captures<'_>| {
        let src = &caps[2];
        if image_src_is_print_safe(src) {
            format!("{}{}{}", &caps[1], src, &caps[3])
        } else {
            tracing::warn!(src, "dropping image source with unsafe scheme");
            format!("{}{}", &caps[1], &caps[3])
        }
    });

    format!("<style>{PRINT_STYLESHEET}</style>{body}")
}

/// Encode raw image bytes as a `data:` URI suitable for `img src`
///
/// Exports inline images this way so the standalone HTML and the print
/// markup have no file dependencies.
pub fn image_data_uri(mime: &str, bytes: &[u8]) -> String {
    use base64::Engine;
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{mime};base64,{encoded}")
}

/// Render a markup snapshot as a minimal standalone HTML document
pub fn export_html(markup: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\"/>\n\
         <style>\n{EXPORT_STYLESHEET}</style>\n</head>\n<body>\n{markup}\n</body>\n</html>\n"
    )
}

/// A timestamped JSON snapshot of the document markup
pub fn snapshot_json(markup: &str) -> Result<String> {
    let snapshot = serde_json::json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "content": markup,
    });
    Ok(serde_json::to_string(&snapshot)?)
}

/// Page margin in millimeters, uniform or per side
/// (top, right, bottom, left)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Margin {
    Uniform(f64),
    Each([f64; 4]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfOptions {
    pub margin: Margin,
    pub page_format: String,
    pub orientation: Orientation,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            margin: Margin::Uniform(15.0),
            page_format: "a4".to_string(),
            orientation: Orientation::Portrait,
        }
    }
}

/// Turns print markup into PDF bytes
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, html: &str, options: &PdfOptions) -> anyhow::Result<Vec<u8>>;
}

/// Reports whether an image source has finished loading
pub trait ImageProbe: Send + Sync {
    fn is_ready(&self, src: &str) -> bool;
}

const IMAGE_WAIT: Duration = Duration::from_secs(5);
const IMAGE_POLL: Duration = Duration::from_millis(100);

/// A single PDF export over a frozen snapshot
///
/// The job sanitizes the markup once at construction; the live document
/// is never touched. Images get a bounded wait each, and a probe that
/// never reports ready only delays the export, it does not fail it.
pub struct ExportJob {
    html: String,
    options: PdfOptions,
}

impl ExportJob {
    pub fn new(markup: &str, options: PdfOptions) -> Self {
        Self {
            html: sanitize_for_print(markup),
            options,
        }
    }

    /// The sanitized print markup this job will rasterize
    pub fn print_markup(&self) -> &str {
        &self.html
    }

    pub async fn run(
        &self,
        probe: &dyn ImageProbe,
        rasterizer: &dyn Rasterizer,
    ) -> Result<Vec<u8>> {
        for src in self.image_sources() {
            self.wait_for_image(probe, &src).await;
        }
        rasterizer
            .rasterize(&self.html, &self.options)
            .map_err(|err| StoreError::ExportFailed(err.to_string()))
    }

    fn image_sources(&self) -> Vec<String> {
        img_src_re()
            .captures_iter(&self.html)
            .map(|caps| caps[2].to_string())
            .filter(|src| !src.is_empty())
            .collect()
    }

    async fn wait_for_image(&self, probe: &dyn ImageProbe, src: &str) {
        let deadline = tokio::time::Instant::now() + IMAGE_WAIT;
        while !probe.is_ready(src) {
            if tokio::time::Instant::now() >= deadline {
                tracing::warn!(src, "image not ready before deadline, exporting anyway");
                return;
            }
            tokio::time::sleep(IMAGE_POLL).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ReadyProbe;
    impl ImageProbe for ReadyProbe {
        fn is_ready(&self, _src: &str) -> bool {
            true
        }
    }

    struct NeverReadyProbe;
    impl ImageProbe for NeverReadyProbe {
        fn is_ready(&self, _src: &str) -> bool {
            false
        }
    }

    struct EchoRasterizer;
    impl Rasterizer for EchoRasterizer {
        fn rasterize(&self, html: &str, _options: &PdfOptions) -> anyhow::Result<Vec<u8>> {
            Ok(html.as_bytes().to_vec())
        }
    }

    struct FailingRasterizer;
    impl Rasterizer for FailingRasterizer {
        fn rasterize(&self, _html: &str, _options: &PdfOptions) -> anyhow::Result<Vec<u8>> {
            anyhow::bail!("renderer crashed")
        }
    }

    #[test]
    fn test_sanitize_strips_scripts() {
        let out = sanitize_for_print("<p>ok</p><script>alert(1)</script><p>more</p>");
        assert!(!out.contains("alert"));
        assert!(out.contains("<p>ok</p>"));
        assert!(out.contains("<p>more</p>"));
    }

    #[test]
    fn test_sanitize_strips_oklch_style_blocks() {
        let markup = "<style>p { color: oklch(0.6 0.2 30); }</style>\
                      <style>p { color: #333; }</style><p>x</p>";
        let out = sanitize_for_print(markup);
        assert!(!out.contains("oklch"));
        assert!(out.contains("color: #333"));
    }

    #[test]
    fn test_sanitize_empties_javascript_image_src() {
        let out = sanitize_for_print("<img src=\"javascript:alert(1)\"/>");
        assert!(out.contains("<img src=\"\"/>"));
        assert!(!out.contains("javascript:"));
    }

    #[test]
    fn test_sanitize_keeps_safe_image_sources() {
        let markup = "<img src=\"https://cdn.example.com/logo.png\"/>\
                      <img src=\"data:image/png;base64,AAAA\"/>\
                      <img src=\"assets/chart.png\"/>";
        let out = sanitize_for_print(markup);
        assert!(out.contains("https://cdn.example.com/logo.png"));
        assert!(out.contains("data:image/png;base64,AAAA"));
        assert!(out.contains("assets/chart.png"));
    }

    #[test]
    fn test_print_stylesheet_renders_page_breaks() {
        let out = sanitize_for_print("<div data-type=\"page-break\" class=\"page-break\"></div>");
        assert!(out.contains("page-break-after: always"));
        assert!(out.contains("class=\"page-break\""));
    }

    #[test]
    fn test_image_data_uri() {
        let uri = image_data_uri("image/png", b"abc");
        assert_eq!(uri, "data:image/png;base64,YWJj");
    }

    #[test]
    fn test_export_html_is_standalone() {
        let out = export_html("<p>hello</p>");
        assert!(out.starts_with("<!DOCTYPE html>"));
        assert!(out.contains("<meta charset=\"utf-8\"/>"));
        assert!(out.contains("<p>hello</p>"));
    }

    #[test]
    fn test_snapshot_json_shape() {
        let out = snapshot_json("<p>x</p>").unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["content"], "<p>x</p>");
        assert!(value["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_pdf_options_serde() {
        let options = PdfOptions::default();
        let json = serde_json::to_string(&options).unwrap();
        assert!(json.contains("\"margin\":15.0"));
        assert!(json.contains("\"pageFormat\":\"a4\""));
        let back: PdfOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, options);
        let each: PdfOptions =
            serde_json::from_str("{\"margin\":[10.0,15.0,10.0,15.0],\"pageFormat\":\"letter\",\"orientation\":\"landscape\"}")
                .unwrap();
        assert_eq!(each.margin, Margin::Each([10.0, 15.0, 10.0, 15.0]));
    }

    #[tokio::test]
    async fn test_export_job_rasterizes_sanitized_markup() {
        let job = ExportJob::new("<p>doc</p><script>x()</script>", PdfOptions::default());
        let bytes = job.run(&ReadyProbe, &EchoRasterizer).await.unwrap();
        let html = String::from_utf8(bytes).unwrap();
        assert!(html.contains("<p>doc</p>"));
        assert!(!html.contains("x()"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_export_proceeds_when_image_never_ready() {
        let job = ExportJob::new(
            "<img src=\"https://slow.example.com/a.png\"/>",
            PdfOptions::default(),
        );
        let bytes = job.run(&NeverReadyProbe, &EchoRasterizer).await.unwrap();
        assert!(!bytes.is_empty());
    }

    #[tokio::test]
    async fn test_rasterizer_failure_is_export_failed() {
        let job = ExportJob::new("<p>x</p>", PdfOptions::default());
        let err = job.run(&ReadyProbe, &FailingRasterizer).await.unwrap_err();
        assert!(matches!(err, StoreError::ExportFailed(_)));
        assert!(err.to_string().contains("renderer crashed"));
    }
}
