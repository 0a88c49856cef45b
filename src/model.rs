//! Similarity oracle over a word-embedding model
//!
//! Defines the `VectorModel` capability trait consumed by the graph
//! extractor, an in-memory `KeyedVectors` implementation, and loaders for
//! the word2vec text and binary formats. Format selection happens at the
//! caller via file extension; the graph code only ever sees the trait.

use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

/// Errors that can occur when loading or querying a vector model
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to read model file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Malformed model file at line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("Unrecognized model format: {0}")]
    UnknownFormat(String),

    #[error("No model file found under {0}")]
    NoModelFound(String),

    #[error("Word not found in model: {0}")]
    WordNotFound(String),
}

/// Capability interface for a similarity oracle.
///
/// The graph extractor only needs three operations: vocabulary membership,
/// ranked nearest neighbors, and pairwise similarity. Implementations decide
/// ranking and tie-breaking; callers never re-sort `top_similar` output.
pub trait VectorModel {
    /// Whether `word` is in the model vocabulary.
    fn contains(&self, word: &str) -> bool;

    /// The `n` most similar words to `word`, ordered by descending
    /// similarity, excluding `word` itself. May return fewer than `n` when
    /// the vocabulary is small. Fails with [`ModelError::WordNotFound`] if
    /// `word` is not in the vocabulary.
    fn top_similar(&self, word: &str, n: usize) -> Result<Vec<(String, f32)>, ModelError>;

    /// Cosine similarity between two vocabulary words.
    fn similarity(&self, a: &str, b: &str) -> Result<f32, ModelError>;
}

/// In-memory embedding store with unit-normalized vectors.
///
/// Vectors are L2-normalized once at construction, so cosine similarity
/// reduces to a dot product on the hot path.
#[derive(Debug)]
pub struct KeyedVectors {
    words: Vec<String>,
    index: HashMap<String, usize>,
    dim: usize,
    /// Row-major, `words.len() * dim` entries.
    vectors: Vec<f32>,
}

impl KeyedVectors {
    /// Build a model from raw (word, vector) pairs.
    ///
    /// Duplicate words keep their first occurrence. Vectors are normalized
    /// in place; an all-zero vector stays zero rather than becoming NaN.
    pub fn from_vectors(entries: Vec<(String, Vec<f32>)>) -> Self {
        let dim = entries.first().map(|(_, v)| v.len()).unwrap_or(0);
        let mut model = Self {
            words: Vec::with_capacity(entries.len()),
            index: HashMap::with_capacity(entries.len()),
            dim,
            vectors: Vec::with_capacity(entries.len() * dim),
        };
        for (word, vector) in entries {
            model.push(word, vector);
        }
        model
    }

    /// Number of vocabulary entries.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Vector dimensionality.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Vocabulary in insertion order.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    fn push(&mut self, word: String, mut vector: Vec<f32>) {
        if vector.len() != self.dim || self.index.contains_key(&word) {
            return;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        self.index.insert(word.clone(), self.words.len());
        self.words.push(word);
        self.vectors.extend_from_slice(&vector);
    }

    fn row(&self, idx: usize) -> &[f32] {
        &self.vectors[idx * self.dim..(idx + 1) * self.dim]
    }

    fn lookup(&self, word: &str) -> Result<usize, ModelError> {
        self.index
            .get(word)
            .copied()
            .ok_or_else(|| ModelError::WordNotFound(word.to_string()))
    }
}

/// Dot product of two equal-length slices (= cosine for unit vectors).
fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

impl VectorModel for KeyedVectors {
    fn contains(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }

    fn top_similar(&self, word: &str, n: usize) -> Result<Vec<(String, f32)>, ModelError> {
        let query = self.lookup(word)?;
        let query_row = self.row(query);

        let mut scored: Vec<(usize, f32)> = (0..self.words.len())
            .filter(|&idx| idx != query)
            .map(|idx| (idx, dot(query_row, self.row(idx))))
            .collect();
        scored.sort_unstable_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(n);

        Ok(scored
            .into_iter()
            .map(|(idx, sim)| (self.words[idx].clone(), sim))
            .collect())
    }

    fn similarity(&self, a: &str, b: &str) -> Result<f32, ModelError> {
        let ia = self.lookup(a)?;
        let ib = self.lookup(b)?;
        Ok(dot(self.row(ia), self.row(ib)))
    }
}

/// Parse the word2vec header line: vocabulary size and dimensionality.
fn parse_header(line: &str) -> Result<(usize, usize), ModelError> {
    let mut parts = line.split_whitespace();
    let count = parts.next().and_then(|p| p.parse().ok());
    let dim = parts.next().and_then(|p| p.parse().ok());
    match (count, dim) {
        (Some(c), Some(d)) if parts.next().is_none() => Ok((c, d)),
        _ => Err(ModelError::ParseError {
            line: 1,
            message: format!("expected '<count> <dim>' header, got '{}'", line.trim_end()),
        }),
    }
}

/// Load a model in word2vec text format (`.txt` / `.vec`).
///
/// First line is `<count> <dim>`; each following line is a word and `dim`
/// whitespace-separated floats.
pub fn load_word2vec_text(path: &Path) -> Result<KeyedVectors, ModelError> {
    let reader = BufReader::new(fs::File::open(path)?);
    let mut lines = reader.lines();

    let header = lines.next().transpose()?.unwrap_or_default();
    let (count, dim) = parse_header(&header)?;

    let mut entries: Vec<(String, Vec<f32>)> = Vec::with_capacity(count);
    for (offset, line) in lines.enumerate() {
        let line = line?;
        let line_no = offset + 2;
        if line.trim().is_empty() {
            continue;
        }
        let mut parts = line.split_whitespace();
        let word = parts
            .next()
            .ok_or_else(|| ModelError::ParseError {
                line: line_no,
                message: "missing word".to_string(),
            })?
            .to_string();
        let vector: Vec<f32> = parts
            .map(|p| {
                p.parse::<f32>().map_err(|e| ModelError::ParseError {
                    line: line_no,
                    message: format!("bad float '{}': {}", p, e),
                })
            })
            .collect::<Result<_, _>>()?;
        if vector.len() != dim {
            return Err(ModelError::ParseError {
                line: line_no,
                message: format!("expected {} components, got {}", dim, vector.len()),
            });
        }
        entries.push((word, vector));
    }

    Ok(KeyedVectors::from_vectors(entries))
}

/// Load a model in word2vec binary format (`.bin`).
///
/// ASCII `<count> <dim>\n` header, then per entry a space-terminated word
/// followed by `dim` little-endian f32s, optionally separated by newlines.
pub fn load_word2vec_binary(path: &Path) -> Result<KeyedVectors, ModelError> {
    let bytes = fs::read(path)?;

    let header_end = bytes
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| ModelError::ParseError {
            line: 1,
            message: "missing header line".to_string(),
        })?;
    let header = String::from_utf8_lossy(&bytes[..header_end]).into_owned();
    let (count, dim) = parse_header(&header)?;

    let mut pos = header_end + 1;
    let mut entries: Vec<(String, Vec<f32>)> = Vec::with_capacity(count);
    for entry in 0..count {
        // Some exporters pad entries with newlines.
        while pos < bytes.len() && (bytes[pos] == b'\n' || bytes[pos] == b' ') {
            pos += 1;
        }
        let word_start = pos;
        while pos < bytes.len() && bytes[pos] != b' ' {
            pos += 1;
        }
        if pos >= bytes.len() || bytes.len() - pos - 1 < dim * 4 {
            return Err(ModelError::ParseError {
                line: entry + 2,
                message: "truncated binary entry".to_string(),
            });
        }
        let word = String::from_utf8_lossy(&bytes[word_start..pos]).into_owned();
        pos += 1; // the space terminator

        let mut vector = Vec::with_capacity(dim);
        for _ in 0..dim {
            let raw: [u8; 4] = bytes[pos..pos + 4].try_into().unwrap_or([0; 4]);
            vector.push(f32::from_le_bytes(raw));
            pos += 4;
        }
        entries.push((word, vector));
    }

    Ok(KeyedVectors::from_vectors(entries))
}

const MODEL_EXTENSIONS: [&str; 3] = ["bin", "vec", "txt"];

/// Load a model, picking the format adapter from the file extension.
///
/// `.txt` and `.vec` are read as word2vec text, `.bin` as word2vec binary.
pub fn load_model(path: &Path) -> Result<KeyedVectors, ModelError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("bin") => load_word2vec_binary(path),
        Some("vec") | Some("txt") => load_word2vec_text(path),
        _ => Err(ModelError::UnknownFormat(path.display().to_string())),
    }
}

/// Find the first model file under `dir` (used when no model path is given).
///
/// Scans the directory non-recursively, in file-name order, for a `.bin`,
/// `.vec` or `.txt` file.
pub fn find_model_file(dir: &Path) -> Result<PathBuf, ModelError> {
    let mut candidates: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| MODEL_EXTENSIONS.contains(&ext))
        })
        .collect();
    candidates.sort();

    candidates
        .into_iter()
        .next()
        .ok_or_else(|| ModelError::NoModelFound(dir.display().to_string()))
}
