//! # vec2graph - Embedding Neighborhood Visualization
//!
//! A tool for turning a word-embedding model's nearest-neighbor structure
//! into static, browser-viewable force-graph pages.
//!
//! ## Overview
//!
//! For each query word, vec2graph:
//!
//! 1. **Extracts** the word's top-N nearest neighbors from the model
//! 2. **Connects** every unordered neighbor pair with its pairwise
//!    similarity, plus a self-loop and one edge per neighbor
//! 3. **Emits** one self-contained HTML page per expanded word, with the
//!    edge list embedded as JSON and rendered client-side by a D3 force
//!    layout
//!
//! With `depth > 0` the neighbors themselves are expanded recursively, and
//! the generated pages cross-link each other.
//!
//! ## Usage
//!
//! ```bash
//! # One page for "cat" with its 10 nearest neighbors
//! vec2graph -m vectors.bin cat
//!
//! # Expand neighbors one hop, keep only edges above 40% similarity
//! vec2graph -m vectors.bin -d 1 -t 40 -o ./viz cat dog
//! ```
//!
//! ## Cost model
//!
//! Expansion is a depth-bounded recursion with no visited-set: the worst
//! case is O(topn^depth) oracle queries, plus O(topn²) pairwise similarity
//! lookups per expanded word. `depth` and `topn` are the caller-controlled
//! resource knobs.

pub mod config;
pub mod graph;
pub mod model;
pub mod render;
pub mod viz;

pub use config::{AssetSource, ConfigError, FileConfig, VizOptions, load_config};
pub use graph::{Edge, ExpansionMap, GraphDatum, GraphError, get_data, get_most_similar};
pub use model::{
    KeyedVectors, ModelError, VectorModel, find_model_file, load_model, load_word2vec_binary,
    load_word2vec_text,
};
pub use render::{PagePayload, RenderError, render_page};
pub use viz::{D3_WEB_URL, Query, VizError, normalize_threshold, visualize};
