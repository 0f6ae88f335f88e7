//! Simplification of ML feature contributions.
//!
//! The prediction backend explains each prediction with a ranked list of
//! feature contributions. Before relaying it, one-hot sub-features are folded
//! back into their categorical feature and interaction terms are dropped.

use crate::simulator::round_to;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Marker separating the members of an interaction term (`"pm10 & co2"`).
pub const INTERACTION_MARKER: char = '&';

/// One-hot families: names with the prefix fold into the canonical feature.
///
/// Only the color family is folded. Other one-hot families pass through
/// unchanged.
pub const ONE_HOT_FAMILIES: &[(&str, &str)] = &[("Color_", "color")];

/// A named feature's influence on a prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureContribution {
    pub feature: String,
    pub contribution: f64,
    pub percent: f64,
}

/// Whether a feature name denotes an interaction term.
pub fn is_interaction(feature: &str) -> bool {
    feature.contains(INTERACTION_MARKER)
}

/// Group key for a feature name.
pub fn collapse_key(feature: &str) -> &str {
    ONE_HOT_FAMILIES
        .iter()
        .find(|(prefix, _)| feature.starts_with(prefix))
        .map(|(_, canonical)| *canonical)
        .unwrap_or(feature)
}

/// Fold one-hot features, drop interactions, sort by percent descending.
///
/// Groups sum `contribution` and `percent`; the summed percent is rounded to
/// two decimals. Ties keep the order in which groups were first seen.
pub fn simplify(contributions: &[FeatureContribution]) -> Vec<FeatureContribution> {
    let mut groups: Vec<FeatureContribution> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for item in contributions {
        if is_interaction(&item.feature) {
            continue;
        }
        let key = collapse_key(&item.feature);
        match index.get(key) {
            Some(&i) => {
                groups[i].contribution += item.contribution;
                groups[i].percent += item.percent;
            }
            None => {
                index.insert(key, groups.len());
                groups.push(FeatureContribution {
                    feature: key.to_string(),
                    contribution: item.contribution,
                    percent: item.percent,
                });
            }
        }
    }

    for group in &mut groups {
        group.percent = round_to(group.percent, 2);
    }
    groups.sort_by(|a, b| b.percent.partial_cmp(&a.percent).unwrap_or(Ordering::Equal));
    groups
}

/// [`simplify`] for a list the backend may have left out.
pub fn simplify_optional(contributions: Option<&[FeatureContribution]>) -> Vec<FeatureContribution> {
    contributions.map(simplify).unwrap_or_default()
}
