//! HTML page rendering
//!
//! Turns one word's extracted graph data into a self-contained HTML page.
//! The page template and the client-side force-layout script are embedded
//! in the binary; rendering is plain placeholder substitution, so the core
//! hands over a typed payload and never builds markup itself.

use rust_embed::RustEmbed;
use thiserror::Error;

use crate::graph::Edge;

/// Embedded page template and client renderer
#[derive(RustEmbed)]
#[folder = "assets/"]
struct Assets;

const PAGE_TEMPLATE: &str = "genviz.html";
const RENDERER_SCRIPT: &str = "genviz.js";

/// Errors that can occur while rendering a page
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Embedded asset missing: {0}")]
    MissingAsset(String),

    #[error("Failed to encode graph payload: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Everything one page needs, as data.
///
/// `threshold` is expected to be already normalized to the [0, 1) cosine
/// range. The d3 asset location is passed to [`render_page`] separately
/// because it is shared by every page of a run.
#[derive(Debug)]
pub struct PagePayload<'a> {
    /// The word this page visualizes.
    pub word: &'a str,
    /// The word's graph datum: self-loop, neighbor edges, pair edges.
    pub edges: &'a [Edge],
    /// Words that have sibling pages, for cross-linking nodes.
    pub interlinks: &'a [String],
    /// Number of neighbors requested per word.
    pub topn: usize,
    /// Minimum similarity for an edge to be drawn.
    pub threshold: f32,
    /// Stroke width for rendered edges.
    pub edge_width: u32,
    /// Whether the renderer shows only the part before an underscore.
    pub split_separator: bool,
}

/// JSON-encode a value for embedding in a single-quoted HTML attribute.
///
/// Apostrophes become `'` so a vocabulary word like `o'clock` cannot
/// terminate the attribute early.
fn attr_json<T: serde::Serialize>(value: &T) -> Result<String, RenderError> {
    Ok(serde_json::to_string(value)?.replace('\'', "\\u0027"))
}

fn asset_string(name: &str) -> Result<String, RenderError> {
    let file = Assets::get(name).ok_or_else(|| RenderError::MissingAsset(name.to_string()))?;
    Ok(String::from_utf8_lossy(&file.data).into_owned())
}

/// Render one page from its payload and the d3 asset location.
pub fn render_page(payload: &PagePayload, d3_path: &str) -> Result<String, RenderError> {
    let template = asset_string(PAGE_TEMPLATE)?;

    Ok(template
        .replace("{{d3path}}", d3_path)
        .replace("{{word}}", payload.word)
        .replace("{{data}}", &attr_json(&payload.edges)?)
        .replace("{{pages}}", &attr_json(&payload.interlinks)?)
        .replace("{{topn}}", &payload.topn.to_string())
        .replace("{{threshold}}", &payload.threshold.to_string())
        .replace("{{edge_width}}", &payload.edge_width.to_string())
        .replace("{{split_separator}}", &payload.split_separator.to_string()))
}

/// The client-side renderer script, copied next to the generated pages.
pub fn renderer_script() -> Result<String, RenderError> {
    asset_string(RENDERER_SCRIPT)
}

/// Name of the renderer script file in the output directory.
pub fn renderer_script_name() -> &'static str {
    RENDERER_SCRIPT
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload<'a>(edges: &'a [Edge], interlinks: &'a [String]) -> PagePayload<'a> {
        PagePayload {
            word: "cat",
            edges,
            interlinks,
            topn: 5,
            threshold: 0.3,
            edge_width: 2,
            split_separator: false,
        }
    }

    #[test]
    fn test_render_substitutes_all_placeholders() {
        let edges = vec![Edge::new("cat", "cat", 1.0)];
        let links = vec!["cat".to_string(), "dog".to_string()];
        let html = render_page(&payload(&edges, &links), "https://d3js.org/d3.v3.min.js").unwrap();

        assert!(!html.contains("{{"));
        assert!(html.contains("<title>cat</title>"));
        assert!(html.contains("https://d3js.org/d3.v3.min.js"));
        assert!(html.contains("0.3"));
    }

    #[test]
    fn test_render_embeds_edge_json() {
        let edges = vec![Edge::new("cat", "dog", 0.8)];
        let links = vec!["cat".to_string()];
        let html = render_page(&payload(&edges, &links), "d3.v3.min.js").unwrap();

        assert!(html.contains(r#""source":"cat""#));
        assert!(html.contains(r#""target":"dog""#));
    }

    #[test]
    fn test_apostrophes_escaped_in_attributes() {
        let edges = vec![Edge::new("o'clock", "o'clock", 1.0)];
        let links = vec!["o'clock".to_string()];
        let html = render_page(&payload(&edges, &links), "d3.v3.min.js").unwrap();

        // The JSON blobs must not carry a raw apostrophe inside the attribute.
        let data_line = html
            .lines()
            .find(|l| l.contains("name=\"data\""))
            .expect("data meta tag present");
        assert!(data_line.contains("\\u0027"));
        assert!(!data_line.contains("o'clock"));
    }

    #[test]
    fn test_renderer_script_embedded() {
        let script = renderer_script().unwrap();
        assert!(script.contains("d3"));
    }
}
