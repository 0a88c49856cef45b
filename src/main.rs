//! vec2graph CLI - Embedding Neighborhood Visualization
//!
//! Loads a word-embedding model, expands the query words into similarity
//! graphs, and writes one force-graph HTML page per expanded word.
//!
//! Usage:
//!   vec2graph [OPTIONS] [WORDS]...

use std::env;
use std::path::PathBuf;
use std::process;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use clap::Parser;

use vec2graph::{
    AssetSource, Query, VizOptions, find_model_file, load_config, load_model, visualize,
};

/// vec2graph - Visualize word-embedding neighborhoods in the browser
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Words to visualize (one page per expanded word)
    #[arg(required = true)]
    words: Vec<String>,

    /// Path to the vector model file (.bin, .vec or .txt word2vec format).
    /// When omitted, the first model file in the working directory is used
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Output directory for the generated pages.
    /// When omitted, a timestamped directory is created
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of neighbors to extract per word
    #[arg(short = 'n', long)]
    topn: Option<usize>,

    /// Recursion depth for neighbor-of-neighbor expansion.
    /// Cost grows as O(topn^depth); raise with care
    #[arg(short, long)]
    depth: Option<usize>,

    /// Similarity threshold below which edges are not drawn.
    /// [0, 1) is a cosine value, [1, 100] a percentage
    #[arg(short, long)]
    threshold: Option<f32>,

    /// Width of an edge (link) between nodes
    #[arg(short, long)]
    edge_width: Option<u32>,

    /// Split tokens on underscore and show only the first part
    /// (useful when PoS tags are attached to words)
    #[arg(short, long, overrides_with = "no_split_separator")]
    split_separator: bool,

    /// Do not split tokens on underscore, even if the config file says so
    #[arg(long, overrides_with = "split_separator")]
    no_split_separator: bool,

    /// Where pages load the D3 library from
    #[arg(short = 'j', long, value_enum)]
    library: Option<AssetSource>,

    /// Config file or directory to search from (default: working directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Open the first generated page in the browser
    #[arg(long)]
    open: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let total_start = Instant::now();

    // Load configuration file; CLI args override config, which overrides defaults.
    let config_start = args
        .config
        .clone()
        .unwrap_or_else(|| env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    let file_config = load_config(&config_start)?;
    let base = file_config.apply(VizOptions::default());

    let options = resolve_options(&args, base);

    if args.verbose {
        eprintln!(
            "Options: topn={}, depth={}, threshold={}, edge_width={}",
            options.topn, options.depth, options.threshold, options.edge_width
        );
    }

    // Pick the model file: explicit path, or first model in the working directory.
    let model_path = match args.model {
        Some(path) => path,
        None => {
            let cwd = env::current_dir()?;
            let found = find_model_file(&cwd)?;
            eprintln!("No model given, using '{}'", found.display());
            found
        }
    };

    eprintln!("Loading model from '{}'...", model_path.display());
    let load_start = Instant::now();
    let model = load_model(&model_path)?;
    if args.verbose {
        eprintln!(
            "Model loaded: {} words, {} dimensions (took {:.2?})",
            model.len(),
            model.dim(),
            load_start.elapsed()
        );
    } else {
        eprintln!("Model loaded: {} words", model.len());
    }

    let output_dir = args.output.unwrap_or_else(timestamped_dir);

    let query = Query::from(args.words);
    let written = visualize(&output_dir, &model, &query, &options)?;

    eprintln!(
        "{} page(s) written to '{}'",
        written.len(),
        output_dir.display()
    );

    if args.verbose {
        eprintln!("Total time: {:.2?}", total_start.elapsed());
    }

    if args.open {
        match written.first() {
            Some(page) => {
                if let Err(e) = open::that(page) {
                    eprintln!("Warning: could not open browser: {}", e);
                    eprintln!("Please open {} manually", page.display());
                }
            }
            None => eprintln!("Nothing to open: no pages were generated"),
        }
    }

    Ok(())
}

/// Fold CLI flags over file/default options. CLI wins where a flag was
/// actually given; `--split-separator` and `--no-split-separator` make the
/// boolean three-state so an absent flag falls through to the file value.
fn resolve_options(args: &Args, base: VizOptions) -> VizOptions {
    VizOptions {
        depth: args.depth.unwrap_or(base.depth),
        topn: args.topn.unwrap_or(base.topn),
        threshold: args.threshold.unwrap_or(base.threshold),
        edge_width: args.edge_width.unwrap_or(base.edge_width),
        split_separator: if args.split_separator {
            true
        } else if args.no_split_separator {
            false
        } else {
            base.split_separator
        },
        asset_source: args.library.unwrap_or(base.asset_source),
    }
}

/// Default output directory name, derived from the current time.
fn timestamped_dir() -> PathBuf {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    PathBuf::from(format!("vec2graph_{}", secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    fn split_config_base() -> VizOptions {
        VizOptions {
            split_separator: true,
            ..VizOptions::default()
        }
    }

    #[test]
    fn test_cli_flags_override_base_options() {
        let args = parse(&["vec2graph", "-n", "3", "-d", "2", "cat"]);
        let options = resolve_options(&args, VizOptions::default());

        assert_eq!(options.topn, 3);
        assert_eq!(options.depth, 2);
        assert_eq!(options.edge_width, 1);
    }

    #[test]
    fn test_split_separator_absent_falls_through_to_config() {
        let args = parse(&["vec2graph", "cat"]);
        let options = resolve_options(&args, split_config_base());
        assert!(options.split_separator);
    }

    #[test]
    fn test_no_split_separator_overrides_config() {
        let args = parse(&["vec2graph", "--no-split-separator", "cat"]);
        let options = resolve_options(&args, split_config_base());
        assert!(!options.split_separator);
    }

    #[test]
    fn test_split_separator_flag_wins_when_last() {
        let args = parse(&["vec2graph", "--no-split-separator", "-s", "cat"]);
        let options = resolve_options(&args, VizOptions::default());
        assert!(options.split_separator);
    }
}
