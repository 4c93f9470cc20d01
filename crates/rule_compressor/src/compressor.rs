use rayon::prelude::*;
use tracing::{debug, info};

use crate::canonicalize::canonicalize;
use crate::conf::CompressConfig;
use crate::dedup::deduplicate;
use crate::error::Result;
use crate::rules::{BinaryFeatureSet, Label, RuleSet};
use crate::tree::RuleTrie;

/// Rule counts observed while compressing one rule set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompressionReport {
    pub input_rules: usize,
    /// Rules left after the trie was first simplified and flattened.
    pub flattened_rules: usize,
    /// Collapsed trie nodes, summed over all passes.
    pub collapsed_nodes: usize,
    pub output_rules: usize,
    /// Simplify/deduplicate rounds run before reaching a fixed point.
    pub passes: usize,
}

/// Runs canonicalize -> build -> simplify -> flatten -> deduplicate, repeating
/// the last four stages until the result is a fixed point.
#[derive(Debug, Clone, Default)]
pub struct RuleCompressor {
    config: CompressConfig,
}

impl RuleCompressor {
    pub fn new(binary_features: BinaryFeatureSet) -> Self {
        Self::from_config(CompressConfig {
            binary_features,
            ..CompressConfig::default()
        })
    }

    pub fn from_config(config: CompressConfig) -> Self {
        RuleCompressor { config }
    }

    pub fn config(&self) -> &CompressConfig {
        &self.config
    }

    pub fn compress(&self, rules: &RuleSet) -> Result<RuleSet> {
        self.compress_with_report(rules).map(|(compressed, _)| compressed)
    }

    pub fn compress_with_report(&self, rules: &RuleSet) -> Result<(RuleSet, CompressionReport)> {
        let canonical = canonicalize(rules, &self.config.binary_features);
        debug!(
            rules = canonical.len(),
            binary_features = self.config.binary_features.len(),
            "canonicalized rules"
        );

        // Dropping a rule during deduplication can leave a node whose
        // remaining leaves agree, so repeat until deduplication drops nothing.
        let mut current = canonical;
        let mut passes = 0;
        let mut collapsed_nodes = 0;
        let mut flattened_rules = None;
        let compressed = loop {
            passes += 1;
            let mut trie = RuleTrie::build(&current)?;
            let collapsed = trie.simplify();
            collapsed_nodes += collapsed;
            let flattened = trie.flatten();
            let flat_len = flattened.len();
            flattened_rules.get_or_insert(flat_len);
            debug!(pass = passes, collapsed, rules = flat_len, "simplified rule trie");

            let deduplicated = deduplicate(flattened, self.config.shape_key)?;
            if deduplicated.len() == flat_len {
                break deduplicated;
            }
            debug!(
                pass = passes,
                dropped = flat_len - deduplicated.len(),
                "deduplication dropped rules, simplifying again"
            );
            current = deduplicated;
        };

        let report = CompressionReport {
            input_rules: rules.len(),
            flattened_rules: flattened_rules.unwrap_or(0),
            collapsed_nodes,
            output_rules: compressed.len(),
            passes,
        };
        info!(
            input = report.input_rules,
            output = report.output_rules,
            "compressed rule set"
        );
        Ok((compressed, report))
    }

    /// Compress independent rule sets in parallel. Results keep input order.
    pub fn compress_batch(&self, rule_sets: &[RuleSet]) -> Vec<Result<RuleSet>> {
        rule_sets
            .par_iter()
            .map(|rules| self.compress(rules))
            .collect()
    }
}

/// Compress `rules` treating `binary_features` as 0/1 variables.
pub fn compress(rules: &RuleSet, binary_features: &BinaryFeatureSet) -> Result<RuleSet> {
    RuleCompressor::new(binary_features.clone()).compress(rules)
}

/// [`compress`] over `(condition strings, label)` decision paths.
pub fn compress_paths<S: AsRef<str>>(
    paths: &[(Vec<S>, Label)],
    binary_features: &BinaryFeatureSet,
) -> Result<Vec<(Vec<String>, Label)>> {
    let rules = RuleSet::from_paths(paths)?;
    Ok(compress(&rules, binary_features)?.to_paths())
}
