//! End-to-end store scenarios: template to saved proposal to export

use placeholders::{apply_values, seed_values, PlaceholderValues};
use store::{
    builtin_template, deserialize, export_html, sanitize_for_print, serialize, ExportJob,
    ImageProbe, PdfOptions, ProposalStore, Rasterizer, StoreError,
};

struct ReadyProbe;
impl ImageProbe for ReadyProbe {
    fn is_ready(&self, _src: &str) -> bool {
        true
    }
}

struct CountingRasterizer;
impl Rasterizer for CountingRasterizer {
    fn rasterize(&self, html: &str, _options: &PdfOptions) -> anyhow::Result<Vec<u8>> {
        Ok(html.as_bytes().to_vec())
    }
}

#[tokio::test]
async fn template_to_saved_proposal_and_back() {
    let dir = tempfile::tempdir().unwrap();
    let store = ProposalStore::open(dir.path()).await.unwrap();

    let template = builtin_template("seo").unwrap();
    let doc = template.document().unwrap();
    let markup = serialize(&doc);

    let saved = store
        .save_current("Acme SEO Proposal", &markup)
        .await
        .unwrap()
        .unwrap();

    let loaded = store.load(&saved.id).await.unwrap();
    let restored = deserialize(&loaded.content).unwrap();
    assert_eq!(restored, doc);
}

#[tokio::test]
async fn placeholder_values_flow_through_export() {
    let template = builtin_template("seo").unwrap();
    let doc = template.document().unwrap();

    let mut values = PlaceholderValues::new();
    values.set("client_name", "Acme Corp");
    values.set("company_name", "Northwind Studio");
    values.set("onpage_price", "$2,500");
    values.set("content_price", "$1,800");

    let markup = apply_values(&serialize(&doc), &values);
    assert!(markup.contains("Acme Corp"));
    assert!(!markup.contains("{{client_name}}"));

    let print = sanitize_for_print(&markup);
    assert!(print.contains("page-break-after: always"));
    assert!(print.contains("$2,500"));

    let page = export_html(&markup);
    assert!(page.starts_with("<!DOCTYPE html>"));
    assert!(page.contains("Northwind Studio"));
}

#[tokio::test]
async fn seeded_values_keep_unknown_tokens_literal() {
    let template = builtin_template("seo").unwrap();
    let doc = template.document().unwrap();
    let markup = serialize(&doc);

    let mut saved = PlaceholderValues::new();
    saved.set("client_name", "Acme Corp");
    let values = seed_values(&markup, &saved);
    assert_eq!(values.get("onpage_price"), Some(""));

    let filled = apply_values(&markup, &values);
    assert!(filled.contains("Acme Corp"));
    // Seeded-but-unset keys resolve to empty strings, not literals.
    assert!(!filled.contains("{{onpage_price}}"));
}

#[tokio::test]
async fn export_job_runs_over_saved_markup() {
    let dir = tempfile::tempdir().unwrap();
    let store = ProposalStore::open(dir.path()).await.unwrap();

    let saved = store
        .save_current("Export Me", "<h1>Title</h1><p>Body</p>")
        .await
        .unwrap()
        .unwrap();
    let loaded = store.load(&saved.id).await.unwrap();

    let job = ExportJob::new(&loaded.content, PdfOptions::default());
    let bytes = job.run(&ReadyProbe, &CountingRasterizer).await.unwrap();
    let html = String::from_utf8(bytes).unwrap();
    assert!(html.contains("<h1>Title</h1>"));
    assert!(html.contains("page-break-after: always"));
}

#[tokio::test]
async fn corrupt_markup_is_rejected_on_load_path() {
    let err = deserialize("<p>broken").unwrap_err();
    assert!(matches!(err, StoreError::InvalidMarkup(_)));
}
