//! Page emission
//!
//! Orchestrates a visualization run: expands every query word through the
//! graph extractor, merges the results into one ordered page set, ensures
//! the rendering assets are in place, and writes one HTML page per
//! expanded word. Pages written before a later failure stay on disk; there
//! is no rollback.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::{AssetSource, VizOptions};
use crate::graph::{self, ExpansionMap, GraphError};
use crate::model::VectorModel;
use crate::render::{self, PagePayload, RenderError};

/// Hosted copy of the rendering library.
pub const D3_WEB_URL: &str = "https://d3js.org/d3.v3.min.js";

/// File name of the local copy in `AssetSource::Local` mode.
pub const D3_LOCAL_FILE: &str = "d3.v3.min.js";

/// Errors that can occur while emitting pages
#[derive(Error, Debug)]
pub enum VizError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Threshold out of range (expected [0, 1) or [1, 100]): {0}")]
    InvalidThreshold(f32),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Failed to write output: {0}")]
    IoError(#[from] std::io::Error),
}

/// The two supported query shapes: one word or a list of words.
#[derive(Debug, Clone)]
pub enum Query {
    Word(String),
    Words(Vec<String>),
}

impl Query {
    fn words(&self) -> &[String] {
        match self {
            Query::Word(word) => std::slice::from_ref(word),
            Query::Words(words) => words,
        }
    }
}

impl From<&str> for Query {
    fn from(word: &str) -> Self {
        Query::Word(word.to_string())
    }
}

impl From<String> for Query {
    fn from(word: String) -> Self {
        Query::Word(word)
    }
}

impl From<Vec<String>> for Query {
    fn from(words: Vec<String>) -> Self {
        Query::Words(words)
    }
}

/// Normalize a raw threshold to the [0, 1) cosine range.
///
/// Values in `[0, 1)` pass through; values in `[1, 100]` are percentages
/// and are divided by 100, so `1` means 1%. Anything else is rejected.
pub fn normalize_threshold(threshold: f32) -> Result<f32, VizError> {
    if !threshold.is_finite() || threshold < 0.0 || threshold > 100.0 {
        return Err(VizError::InvalidThreshold(threshold));
    }
    if threshold < 1.0 {
        Ok(threshold)
    } else {
        Ok(threshold / 100.0)
    }
}

/// Map a word to a filesystem-safe page file stem.
///
/// Path separators and NUL would otherwise let a vocabulary token escape
/// the output directory or break the write.
pub fn sanitize_page_stem(word: &str) -> String {
    word.replace(['/', '\\', '\0'], "_")
}

/// Make sure `d3.v3.min.js` exists next to the pages, downloading it once
/// if missing. Failure is logged and generation continues with the pages
/// referencing the (absent) local file.
fn ensure_local_d3(output_dir: &Path) {
    let target = output_dir.join(D3_LOCAL_FILE);
    if target.is_file() {
        return;
    }

    let fetched = reqwest::blocking::get(D3_WEB_URL)
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.text());
    match fetched {
        Ok(body) => {
            if let Err(e) = fs::write(&target, body) {
                eprintln!("Warning: could not write {}: {}", target.display(), e);
            }
        }
        Err(e) => {
            eprintln!("Warning: could not download {}: {}", D3_WEB_URL, e);
        }
    }
}

/// Expand every query word and write one HTML page per expanded word.
///
/// Returns the paths of the written pages in page order. Query words
/// absent from the model are diagnosed and skipped; an empty word or an
/// empty word list fails with [`VizError::InvalidInput`]. Expansion cost
/// is governed by `options.depth` and `options.topn` (see
/// [`crate::graph::get_data`]).
pub fn visualize(
    output_dir: &Path,
    model: &dyn VectorModel,
    query: &Query,
    options: &VizOptions,
) -> Result<Vec<PathBuf>, VizError> {
    let words = query.words();
    if words.is_empty() {
        return Err(VizError::InvalidInput("no query words given".to_string()));
    }

    let threshold = normalize_threshold(options.threshold)?;

    let mut data = ExpansionMap::new();
    for word in words {
        data.merge(graph::get_data(model, word, options.depth, options.topn)?);
    }

    fs::create_dir_all(output_dir)?;

    let d3_path = match options.asset_source {
        AssetSource::Web => D3_WEB_URL,
        AssetSource::Local => {
            ensure_local_d3(output_dir);
            D3_LOCAL_FILE
        }
    };

    fs::write(
        output_dir.join(render::renderer_script_name()),
        render::renderer_script()?,
    )?;

    let pages: Vec<String> = data.words().to_vec();
    let mut written = Vec::with_capacity(pages.len());
    for (word, edges) in data.iter() {
        let payload = PagePayload {
            word,
            edges,
            interlinks: &pages,
            topn: options.topn,
            threshold,
            edge_width: options.edge_width,
            split_separator: options.split_separator,
        };
        let html = render::render_page(&payload, d3_path)?;

        let path = output_dir.join(format!("{}.html", sanitize_page_stem(word)));
        fs::write(&path, html)?;
        written.push(path);
    }

    Ok(written)
}
