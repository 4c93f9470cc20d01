use crate::rules::{BinaryFeatureSet, Condition, Operator, Rule, RuleSet};

/// Rewrite inequality tests on 0/1 features as equality tests.
///
/// `x <= t` becomes `x == floor(t)` and `x > t` becomes `x == ceil(t)`, so
/// splits learned at different fractional thresholds on the same boolean
/// feature end up as the same condition. Other conditions are copied as is.
pub fn canonicalize(rules: &RuleSet, binary_features: &BinaryFeatureSet) -> RuleSet {
    if binary_features.is_empty() {
        return rules.clone();
    }

    let rewritten = rules
        .iter()
        .map(|rule| {
            let conditions = rule
                .conditions
                .iter()
                .map(|c| canonicalize_condition(c, binary_features))
                .collect();
            Rule::new(conditions, rule.label)
        })
        .collect();

    // Distinct inputs may now share a path; the trie builder resolves those.
    RuleSet::from_unchecked(rewritten)
}

pub fn canonicalize_condition(condition: &Condition, binary_features: &BinaryFeatureSet) -> Condition {
    if !binary_features.contains(&condition.variable) {
        return condition.clone();
    }
    let threshold = match condition.operator {
        Operator::LessEq => condition.threshold.floor(),
        Operator::Greater => condition.threshold.ceil(),
        Operator::Eq => return condition.clone(),
    };
    // `+ 0.0` folds -0.0 (e.g. ceil(-0.3)) into 0.0 so it renders as "0".
    Condition::new(condition.variable.clone(), Operator::Eq, threshold + 0.0)
}
