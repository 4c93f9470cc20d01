//! # Rule Compressor
//!
//! Shrinks the leaf rules of a fitted classification tree into a smaller
//! rule set that classifies every input the same way.
//!
//! ## Pipeline
//!
//! - **Canonicalize**: `<=`/`>` splits on 0/1 features become `==` tests
//! - **Build**: rules sharing leading conditions are merged into a trie
//! - **Simplify**: splits whose outcomes all carry one label are dropped
//! - **Flatten**: the trie is turned back into a rule list
//! - **Deduplicate**: rules differing only in a trailing bound keep the widest one
//!
//! ## Example
//!
//! ```rust
//! use rule_compressor::{compress_paths, BinaryFeatureSet};
//!
//! let paths = vec![
//!     (vec!["smoking <= 0.5", "age <= 60.0"], 0),
//!     (vec!["smoking <= 0.5", "age > 60.0"], 0),
//!     (vec!["smoking > 0.5"], 1),
//! ];
//! let binary: BinaryFeatureSet = ["smoking"].into_iter().collect();
//!
//! let compressed = compress_paths(&paths, &binary).unwrap();
//! assert_eq!(
//!     compressed,
//!     vec![
//!         (vec!["smoking == 0".to_string()], 0),
//!         (vec!["smoking == 1".to_string()], 1),
//!     ]
//! );
//! ```

// Module declarations
pub mod canonicalize;
pub mod compressor;
pub mod conf;
pub mod dedup;
pub mod error;
pub mod extract;
pub mod node;
pub mod rules;
pub mod serde;
pub mod tree;

pub use compressor::{compress, compress_paths, CompressionReport, RuleCompressor};
pub use conf::{CompressConfig, ShapeKeyPolicy};
pub use error::{CompressError, Result};
pub use extract::{FittedTree, RuleExtractor};
pub use rules::{BinaryFeatureSet, Condition, Label, Operator, Rule, RuleSet};
