use std::collections::BTreeMap;

use itertools::Itertools;
use tracing::{debug, warn};

use crate::conf::ShapeKeyPolicy;
use crate::error::{CompressError, Result};
use crate::rules::{Condition, Label, Operator, Rule, RuleSet};

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum KeyAtom<'a> {
    Shape(&'a str, Operator),
    Exact(&'a Condition),
}

/// Rule skeleton used to find rules that differ only in their last bound.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct ShapeKey<'a> {
    prefix: Vec<KeyAtom<'a>>,
    last: Option<(&'a str, Operator)>,
    label: Label,
}

impl<'a> ShapeKey<'a> {
    fn of(rule: &'a Rule, policy: ShapeKeyPolicy) -> Self {
        let (last, prefix) = match rule.conditions.split_last() {
            Some((last, prefix)) => (Some(last.shape()), prefix),
            None => (None, &rule.conditions[..]),
        };
        let prefix = prefix
            .iter()
            .map(|c| match policy {
                ShapeKeyPolicy::VariableOperator => KeyAtom::Shape(c.variable.as_str(), c.operator),
                ShapeKeyPolicy::ExactPrefix => KeyAtom::Exact(c),
            })
            .collect();
        ShapeKey {
            prefix,
            last,
            label: rule.label,
        }
    }
}

/// Keep one rule per shape group, the one carrying the widest trailing bound.
///
/// For a trailing `>` the smallest threshold wins, for `<=` the largest, and
/// `==` groups must already agree on the value. Dropped rules are assumed to
/// be subsumed by the survivor: nothing between the narrow and the wide bound
/// may lead to a different label. Surviving rules keep their input order.
pub fn deduplicate(rules: RuleSet, policy: ShapeKeyPolicy) -> Result<RuleSet> {
    let mut keep = vec![true; rules.len()];
    {
        let mut groups: BTreeMap<ShapeKey<'_>, Vec<usize>> = BTreeMap::new();
        for (idx, rule) in rules.iter().enumerate() {
            groups.entry(ShapeKey::of(rule, policy)).or_default().push(idx);
        }

        for members in groups.values().filter(|members| members.len() > 1) {
            let Some(survivor) = pick_survivor(rules.rules(), members)? else {
                continue;
            };
            for &idx in members.iter().filter(|&&idx| idx != survivor) {
                keep[idx] = false;
            }
        }
    }

    let before = rules.len();
    let kept: Vec<Rule> = rules
        .into_iter()
        .zip(keep)
        .filter_map(|(rule, keep)| keep.then_some(rule))
        .collect();
    debug!(before, after = kept.len(), ?policy, "deduplicated rules");
    Ok(RuleSet::from_unchecked(kept))
}

/// Index of the rule to keep for a group, or `None` to leave it untouched.
fn pick_survivor(rules: &[Rule], members: &[usize]) -> Result<Option<usize>> {
    let label = rules[members[0]].label;
    if let Some(&other) = members.iter().find(|&&idx| rules[idx].label != label) {
        return Err(CompressError::InconsistentRules(format!(
            "rules {} and {} share a shape but not a label",
            rules[members[0]], rules[other]
        )));
    }

    let Some(first) = rules[members[0]].last_condition() else {
        return Ok(Some(members[0]));
    };
    let thresholds: Vec<f64> = members
        .iter()
        .filter_map(|&idx| rules[idx].last_condition())
        .map(|c| c.threshold)
        .collect();

    let threshold = match first.operator {
        Operator::Greater => thresholds.iter().copied().fold(f64::INFINITY, f64::min),
        Operator::LessEq => thresholds.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        Operator::Eq => {
            let probe = Condition::new(first.variable.clone(), Operator::Eq, first.threshold);
            if members
                .iter()
                .any(|&idx| rules[idx].last_condition() != Some(&probe))
            {
                warn!(
                    rules = %members.iter().map(|&idx| &rules[idx]).join("; "),
                    "equality group disagrees on its trailing value, leaving it as is"
                );
                return Ok(None);
            }
            first.threshold
        }
    };

    let nice = Condition::new(first.variable.clone(), first.operator, threshold);
    let survivor = members
        .iter()
        .copied()
        .find(|&idx| rules[idx].last_condition() == Some(&nice));
    if let Some(idx) = survivor {
        debug!(
            group = members.len(),
            condition = %nice,
            kept = %rules[idx],
            "merged rules differing in their trailing bound"
        );
    }
    Ok(survivor)
}
