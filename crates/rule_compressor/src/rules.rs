use core::fmt;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::conf::THRESHOLD_EPSILON;
use crate::error::{CompressError, Result};

/// Class id predicted by a leaf.
pub type Label = u32;

// -------------------
// Operator
// -------------------

/// Comparison operator of a condition atom.
///
/// Declaration order is the sibling order used by the trie: `<=` before `>`
/// before `==`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operator {
    LessEq,
    Greater,
    Eq,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::LessEq => "<=",
            Operator::Greater => ">",
            Operator::Eq => "==",
        }
    }
}

impl FromStr for Operator {
    type Err = CompressError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "<=" => Ok(Operator::LessEq),
            ">" => Ok(Operator::Greater),
            "==" => Ok(Operator::Eq),
            other => Err(CompressError::format(
                s,
                format!("unknown operator '{}', expected one of <=, >, ==", other),
            )),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// -------------------
// Condition
// -------------------

/// A single `<variable> <op> <threshold>` atom.
///
/// Equality and ordering treat thresholds closer than [`THRESHOLD_EPSILON`]
/// as the same value, so `x <= 0.5` and `x <= 0.5000001` share a trie edge.
#[derive(Clone, Debug)]
pub struct Condition {
    pub variable: String,
    pub operator: Operator,
    pub threshold: f64,
}

impl Condition {
    pub fn new(variable: impl Into<String>, operator: Operator, threshold: f64) -> Self {
        Self {
            variable: variable.into(),
            operator,
            threshold,
        }
    }

    /// Evaluate the atom for a single feature value.
    pub fn holds(&self, value: f64) -> bool {
        match self.operator {
            Operator::LessEq => value <= self.threshold,
            Operator::Greater => value > self.threshold,
            Operator::Eq => (value - self.threshold).abs() < THRESHOLD_EPSILON,
        }
    }

    /// `(variable, operator)` skeleton of the atom.
    pub fn shape(&self) -> (&str, Operator) {
        (self.variable.as_str(), self.operator)
    }

    /// Strict total order on the raw thresholds, with no tolerance.
    pub(crate) fn cmp_exact(&self, other: &Self) -> Ordering {
        self.variable
            .cmp(&other.variable)
            .then(self.operator.cmp(&other.operator))
            .then(self.threshold.total_cmp(&other.threshold))
    }

    fn cmp_threshold(&self, other: &Self) -> Ordering {
        if (self.threshold - other.threshold).abs() < THRESHOLD_EPSILON {
            Ordering::Equal
        } else {
            self.threshold.total_cmp(&other.threshold)
        }
    }
}

impl PartialEq for Condition {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Condition {}

impl PartialOrd for Condition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Condition {
    fn cmp(&self, other: &Self) -> Ordering {
        self.variable
            .cmp(&other.variable)
            .then(self.operator.cmp(&other.operator))
            .then_with(|| self.cmp_threshold(other))
    }
}

impl FromStr for Condition {
    type Err = CompressError;

    fn from_str(s: &str) -> Result<Self> {
        let tokens: Vec<&str> = s.split_whitespace().collect();
        let [variable, operator, threshold] = tokens.as_slice() else {
            return Err(CompressError::format(
                s,
                format!("expected 3 tokens, found {}", tokens.len()),
            ));
        };
        let operator = operator
            .parse::<Operator>()
            .map_err(|_| CompressError::format(s, format!("unknown operator '{}'", operator)))?;
        let threshold: f64 = threshold
            .parse()
            .map_err(|_| CompressError::format(s, format!("invalid threshold '{}'", threshold)))?;
        if !threshold.is_finite() {
            return Err(CompressError::format(s, "threshold must be finite"));
        }
        Ok(Condition::new(*variable, operator, threshold))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.variable, self.operator, self.threshold)
    }
}

// -------------------
// Rule
// -------------------

/// A root-to-leaf conjunction of conditions and the class it predicts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(with = "crate::serde::conditions")]
    pub conditions: Vec<Condition>,
    pub label: Label,
}

impl Rule {
    pub fn new(conditions: Vec<Condition>, label: Label) -> Self {
        Self { conditions, label }
    }

    /// Parse a decision path given as condition strings.
    pub fn from_strings<S: AsRef<str>>(conditions: &[S], label: Label) -> Result<Self> {
        let conditions = conditions
            .iter()
            .map(|c| c.as_ref().parse::<Condition>())
            .collect::<Result<Vec<_>>>()?;
        Ok(Rule::new(conditions, label))
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.conditions.iter().map(|c| c.to_string()).collect()
    }

    pub fn last_condition(&self) -> Option<&Condition> {
        self.conditions.last()
    }

    /// True when every condition holds for the sample. A variable missing
    /// from the sample fails its condition.
    pub fn matches(&self, sample: &HashMap<String, f64>) -> bool {
        self.conditions.iter().all(|c| {
            sample
                .get(&c.variable)
                .map(|value| c.holds(*value))
                .unwrap_or(false)
        })
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] -> {}", self.conditions.iter().join(", "), self.label)
    }
}

// -------------------
// RuleSet
// -------------------

fn cmp_conditions_exact(a: &[Condition], b: &[Condition]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| x.cmp_exact(y))
        .find(|ord| ord.is_ne())
        .unwrap_or_else(|| a.len().cmp(&b.len()))
}

/// Ordered rules with pairwise distinct condition sequences.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Rule>", into = "Vec<Rule>")]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Build a rule set, dropping exact duplicates.
    ///
    /// Two rules with the same conditions but different labels make the set
    /// ambiguous and are rejected.
    pub fn new(rules: Vec<Rule>) -> Result<Self> {
        // Tolerant equality is not transitive, so sort on exact thresholds and
        // compare each rule with the first kept rule of its run.
        let mut order: Vec<usize> = (0..rules.len()).collect();
        order.sort_by(|&a, &b| {
            cmp_conditions_exact(&rules[a].conditions, &rules[b].conditions).then(a.cmp(&b))
        });

        let mut keep = vec![true; rules.len()];
        let mut anchor: Option<usize> = None;
        for &idx in &order {
            let rule = &rules[idx];
            match anchor.map(|a| &rules[a]) {
                Some(kept) if kept.conditions == rule.conditions => {
                    if kept.label != rule.label {
                        return Err(CompressError::InconsistentRules(format!(
                            "path [{}] predicts both {} and {}",
                            kept.conditions.iter().join(", "),
                            kept.label,
                            rule.label
                        )));
                    }
                    keep[idx] = false;
                }
                _ => anchor = Some(idx),
            }
        }

        let rules = rules
            .into_iter()
            .zip(keep)
            .filter_map(|(rule, keep)| keep.then_some(rule))
            .collect();
        Ok(Self { rules })
    }

    /// Parse `(condition strings, label)` decision paths.
    pub fn from_paths<S: AsRef<str>>(paths: &[(Vec<S>, Label)]) -> Result<Self> {
        let rules = paths
            .iter()
            .map(|(conditions, label)| Rule::from_strings(conditions, *label))
            .collect::<Result<Vec<_>>>()?;
        Self::new(rules)
    }

    /// Wrap rules whose uniqueness is established by the caller.
    pub(crate) fn from_unchecked(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn to_paths(&self) -> Vec<(Vec<String>, Label)> {
        self.rules
            .iter()
            .map(|rule| (rule.to_strings(), rule.label))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn into_rules(self) -> Vec<Rule> {
        self.rules
    }

    /// Label of the first rule matching the sample.
    pub fn classify(&self, sample: &HashMap<String, f64>) -> Option<Label> {
        self.rules
            .iter()
            .find(|rule| rule.matches(sample))
            .map(|rule| rule.label)
    }
}

impl TryFrom<Vec<Rule>> for RuleSet {
    type Error = CompressError;

    fn try_from(rules: Vec<Rule>) -> Result<Self> {
        RuleSet::new(rules)
    }
}

impl From<RuleSet> for Vec<Rule> {
    fn from(set: RuleSet) -> Self {
        set.rules
    }
}

impl IntoIterator for RuleSet {
    type Item = Rule;
    type IntoIter = std::vec::IntoIter<Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.into_iter()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in &self.rules {
            writeln!(f, "{}", rule)?;
        }
        Ok(())
    }
}

// ---------------------------
// BinaryFeatureSet
// ---------------------------

/// Variables known to take only the values 0 and 1.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BinaryFeatureSet(BTreeSet<String>);

impl BinaryFeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, variable: &str) -> bool {
        self.0.contains(variable)
    }

    pub fn insert(&mut self, variable: impl Into<String>) -> bool {
        self.0.insert(variable.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for BinaryFeatureSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
