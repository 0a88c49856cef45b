//! Neighbor expansion and graph construction
//!
//! Turns a seed word into a bounded-depth neighborhood graph over a
//! similarity oracle: one self-loop, one edge per ranked neighbor, and one
//! edge per unordered neighbor pair. The recursion is bounded by `depth`
//! alone, with no visited-set, so the worst-case oracle cost is
//! O(topn^depth) queries for densely connected neighborhoods; callers
//! control the blast radius through `depth` and `topn`.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::model::{ModelError, VectorModel};

/// Errors that can occur during graph extraction
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// A weighted edge of the similarity graph.
///
/// Serialized field names (`source`, `target`, `value`) are the wire
/// contract consumed by the client-side renderer.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub value: f32,
}

impl Edge {
    pub fn new(source: &str, target: &str, value: f32) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            value,
        }
    }
}

/// One word's local edge list.
///
/// Order matters to the renderer: the self-loop comes first, then the
/// neighbor edges in oracle rank order, then the pairwise neighbor edges.
pub type GraphDatum = Vec<Edge>;

/// Insertion-ordered map from word to its [`GraphDatum`].
///
/// Inserts are first-write-wins: once a word is a key its datum is never
/// recomputed or overwritten, no matter how many expansion paths reach it
/// again. Page order downstream is the insertion order recorded here.
#[derive(Debug, Default)]
pub struct ExpansionMap {
    order: Vec<String>,
    data: HashMap<String, GraphDatum>,
}

impl ExpansionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a datum unless the word is already present. Returns whether
    /// the entry was added.
    pub fn insert(&mut self, word: String, datum: GraphDatum) -> bool {
        if self.data.contains_key(&word) {
            return false;
        }
        self.order.push(word.clone());
        self.data.insert(word, datum);
        true
    }

    pub fn contains(&self, word: &str) -> bool {
        self.data.contains_key(word)
    }

    pub fn get(&self, word: &str) -> Option<&GraphDatum> {
        self.data.get(word)
    }

    /// Words in insertion order.
    pub fn words(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Absorb `other`, keeping existing entries on key collision.
    pub fn merge(&mut self, other: ExpansionMap) {
        let ExpansionMap { order, mut data } = other;
        for word in order {
            if let Some(datum) = data.remove(&word) {
                self.insert(word, datum);
            }
        }
    }

    /// (word, datum) pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &GraphDatum)> {
        self.order
            .iter()
            .map(|word| (word.as_str(), &self.data[word]))
    }
}

/// Build one word's edge list and return it with the plain neighbor list.
///
/// Issues one ranked-neighbors query plus K(K-1)/2 pairwise similarity
/// queries for K returned neighbors; K may be below `topn` when the
/// vocabulary is small. The edge count is exactly `1 + K + K*(K-1)/2`.
pub fn get_most_similar(
    model: &dyn VectorModel,
    word: &str,
    topn: usize,
) -> Result<(GraphDatum, Vec<String>), GraphError> {
    let ranked = model.top_similar(word, topn)?;

    let mut edges: GraphDatum = Vec::with_capacity(1 + ranked.len() * (ranked.len() + 1) / 2);
    edges.push(Edge::new(word, word, 1.0));

    let mut neighbors: Vec<String> = Vec::with_capacity(ranked.len());
    for (neighbor, score) in ranked {
        edges.push(Edge::new(word, &neighbor, score));
        neighbors.push(neighbor);
    }

    for i in 0..neighbors.len() {
        for j in (i + 1)..neighbors.len() {
            match model.similarity(&neighbors[i], &neighbors[j]) {
                Ok(score) => edges.push(Edge::new(&neighbors[i], &neighbors[j], score)),
                // A ranked neighbor that the oracle then refuses to score is
                // oracle inconsistency; drop the pair, keep the graph.
                Err(ModelError::WordNotFound(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    Ok((edges, neighbors))
}

/// Expand a seed word into a bounded-depth neighborhood map.
///
/// An empty word fails with [`GraphError::InvalidInput`]. A word absent
/// from the vocabulary is diagnosed on stderr and yields an empty map so
/// callers can skip it and continue. Cost grows as O(topn^depth) oracle
/// queries in the worst case; `depth` and `topn` are the only bounds.
pub fn get_data(
    model: &dyn VectorModel,
    word: &str,
    depth: usize,
    topn: usize,
) -> Result<ExpansionMap, GraphError> {
    if word.is_empty() {
        return Err(GraphError::InvalidInput("empty query word".to_string()));
    }

    let mut map = ExpansionMap::new();
    if !model.contains(word) {
        eprintln!("{} is not in the model", word);
        return Ok(map);
    }

    let (datum, neighbors) = get_most_similar(model, word, topn)?;
    map.insert(word.to_string(), datum);
    get_neighbors(model, &neighbors, depth, topn, &mut map)?;
    Ok(map)
}

/// Recursively expand a neighbor list into `map`.
///
/// Depth 0 is terminal. Otherwise the depth is decremented once and every
/// word in the list gets its own datum before its neighbors are expanded
/// at the decremented depth. Words already present in `map` are skipped
/// (first-write-wins), and a word that dropped out of the vocabulary is
/// treated as having zero neighbors rather than aborting the traversal.
pub fn get_neighbors(
    model: &dyn VectorModel,
    words: &[String],
    depth: usize,
    topn: usize,
    map: &mut ExpansionMap,
) -> Result<(), GraphError> {
    if depth == 0 {
        return Ok(());
    }
    let depth = depth - 1;

    for word in words {
        if map.contains(word) {
            continue;
        }
        let (datum, neighbors) = match get_most_similar(model, word, topn) {
            Ok(res) => res,
            Err(GraphError::Model(ModelError::WordNotFound(missing))) => {
                eprintln!("{} is not in the model, skipping", missing);
                continue;
            }
            Err(e) => return Err(e),
        };
        map.insert(word.clone(), datum);
        get_neighbors(model, &neighbors, depth, topn, map)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scripted oracle for exercising the extractor without real vectors.
    struct FakeModel {
        vocab: Vec<String>,
        ranked: HashMap<String, Vec<(String, f32)>>,
        pairwise: HashMap<(String, String), f32>,
    }

    impl FakeModel {
        fn new() -> Self {
            Self {
                vocab: Vec::new(),
                ranked: HashMap::new(),
                pairwise: HashMap::new(),
            }
        }

        fn with_word(mut self, word: &str, neighbors: &[(&str, f32)]) -> Self {
            self.vocab.push(word.to_string());
            self.ranked.insert(
                word.to_string(),
                neighbors
                    .iter()
                    .map(|(w, s)| (w.to_string(), *s))
                    .collect(),
            );
            self
        }

        fn with_pair(mut self, a: &str, b: &str, score: f32) -> Self {
            self.pairwise.insert((a.to_string(), b.to_string()), score);
            self.pairwise.insert((b.to_string(), a.to_string()), score);
            self
        }
    }

    impl VectorModel for FakeModel {
        fn contains(&self, word: &str) -> bool {
            self.vocab.iter().any(|w| w == word)
        }

        fn top_similar(&self, word: &str, n: usize) -> Result<Vec<(String, f32)>, ModelError> {
            let mut ranked = self
                .ranked
                .get(word)
                .cloned()
                .ok_or_else(|| ModelError::WordNotFound(word.to_string()))?;
            ranked.truncate(n);
            Ok(ranked)
        }

        fn similarity(&self, a: &str, b: &str) -> Result<f32, ModelError> {
            self.pairwise
                .get(&(a.to_string(), b.to_string()))
                .copied()
                .ok_or_else(|| ModelError::WordNotFound(format!("{}/{}", a, b)))
        }
    }

    fn cat_model() -> FakeModel {
        FakeModel::new()
            .with_word("cat", &[("dog", 0.8), ("pet", 0.6)])
            .with_word("dog", &[("cat", 0.8)])
            .with_word("pet", &[("cat", 0.6)])
            .with_word("fish", &[])
            .with_pair("dog", "pet", 0.5)
    }

    #[test]
    fn test_get_most_similar_cat_scenario() {
        let model = cat_model();
        let (edges, neighbors) = get_most_similar(&model, "cat", 2).unwrap();

        assert_eq!(
            edges,
            vec![
                Edge::new("cat", "cat", 1.0),
                Edge::new("cat", "dog", 0.8),
                Edge::new("cat", "pet", 0.6),
                Edge::new("dog", "pet", 0.5),
            ]
        );
        assert_eq!(neighbors, vec!["dog".to_string(), "pet".to_string()]);
    }

    #[test]
    fn test_edge_count_invariant() {
        // 3 neighbors -> 1 + 3 + 3 edges.
        let model = FakeModel::new()
            .with_word("hub", &[("a", 0.9), ("b", 0.8), ("c", 0.7)])
            .with_pair("a", "b", 0.1)
            .with_pair("a", "c", 0.2)
            .with_pair("b", "c", 0.3);

        let (edges, _) = get_most_similar(&model, "hub", 3).unwrap();
        assert_eq!(edges.len(), 1 + 3 + 3);
        assert_eq!(edges[0].value, 1.0);
        assert_eq!(edges[0].source, edges[0].target);
    }

    #[test]
    fn test_fewer_neighbors_than_requested() {
        let model = cat_model();
        // "dog" has a single neighbor: 1 + 1 + 0 edges.
        let (edges, neighbors) = get_most_similar(&model, "dog", 10).unwrap();
        assert_eq!(edges.len(), 2);
        assert_eq!(neighbors, vec!["cat".to_string()]);
    }

    #[test]
    fn test_get_data_empty_word_is_invalid() {
        let model = cat_model();
        assert!(matches!(
            get_data(&model, "", 0, 2),
            Err(GraphError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_get_data_absent_word_yields_empty_map() {
        let model = cat_model();
        let map = get_data(&model, "unicorn", 1, 2).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn test_get_data_depth_zero_single_key() {
        let model = cat_model();
        let map = get_data(&model, "cat", 0, 2).unwrap();

        assert_eq!(map.words(), ["cat".to_string()]);
        let (direct, _) = get_most_similar(&model, "cat", 2).unwrap();
        assert_eq!(map.get("cat").unwrap(), &direct);
    }

    #[test]
    fn test_get_data_depth_one_expands_neighbors() {
        let model = cat_model();
        let map = get_data(&model, "cat", 1, 2).unwrap();

        assert_eq!(
            map.words(),
            ["cat".to_string(), "dog".to_string(), "pet".to_string()]
        );
        for (_, datum) in map.iter() {
            let n = datum
                .iter()
                .skip(1)
                .take_while(|e| e.source == datum[0].source)
                .count();
            assert_eq!(datum.len(), 1 + n + n * n.saturating_sub(1) / 2);
        }
    }

    #[test]
    fn test_two_node_cycle_terminates() {
        let model = FakeModel::new()
            .with_word("a", &[("b", 0.9)])
            .with_word("b", &[("a", 0.9)]);

        let map = get_data(&model, "a", 2, 1).unwrap();
        assert!(map.contains("a"));
        assert!(map.contains("b"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_missing_neighbor_in_recursion_is_skipped() {
        // "ghost" is ranked as a neighbor but absent from the vocabulary.
        let model = FakeModel::new()
            .with_word("seed", &[("ghost", 0.9), ("real", 0.8)])
            .with_word("real", &[("seed", 0.8)])
            .with_pair("ghost", "real", 0.1);

        let map = get_data(&model, "seed", 1, 2).unwrap();
        assert!(map.contains("seed"));
        assert!(map.contains("real"));
        assert!(!map.contains("ghost"));
    }

    #[test]
    fn test_expansion_map_first_write_wins() {
        let mut map = ExpansionMap::new();
        assert!(map.insert("w".to_string(), vec![Edge::new("w", "w", 1.0)]));
        assert!(!map.insert("w".to_string(), vec![Edge::new("w", "x", 0.5)]));
        assert_eq!(map.get("w").unwrap().len(), 1);
    }

    #[test]
    fn test_expansion_map_merge_keeps_existing() {
        let mut left = ExpansionMap::new();
        left.insert("a".to_string(), vec![Edge::new("a", "a", 1.0)]);

        let mut right = ExpansionMap::new();
        right.insert("a".to_string(), vec![]);
        right.insert("b".to_string(), vec![Edge::new("b", "b", 1.0)]);

        left.merge(right);
        assert_eq!(left.words(), ["a".to_string(), "b".to_string()]);
        assert_eq!(left.get("a").unwrap().len(), 1);
    }

    #[test]
    fn test_edge_serializes_wire_fields() {
        let edge = Edge::new("cat", "dog", 0.8);
        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["source"], "cat");
        assert_eq!(json["target"], "dog");
        assert!((json["value"].as_f64().unwrap() - 0.8).abs() < 1e-6);
    }
}
