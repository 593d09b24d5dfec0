// ⚖️ Bias Classifier - Editorial leaning of article sources
// Raw labels ("Centre", "lean_left", "Right-Leaning") → one of five fixed categories
//
// Unrecognized labels return None and are never guessed.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::models::{Article, SourceRecord};
use crate::normalize::{normalize_key, normalize_opt};
use crate::sources::group_key;

// ============================================================================
// BIAS CATEGORY
// ============================================================================

/// Declaration order is the display order (left → right)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BiasCategory {
    Left,
    LeansLeft,
    Center,
    LeansRight,
    Right,
}

impl BiasCategory {
    /// All categories in display order
    pub const ALL: [BiasCategory; 5] = [
        BiasCategory::Left,
        BiasCategory::LeansLeft,
        BiasCategory::Center,
        BiasCategory::LeansRight,
        BiasCategory::Right,
    ];

    /// Canonical token
    pub fn as_str(&self) -> &'static str {
        match self {
            BiasCategory::Left => "left",
            BiasCategory::LeansLeft => "leans-left",
            BiasCategory::Center => "center",
            BiasCategory::LeansRight => "leans-right",
            BiasCategory::Right => "right",
        }
    }

    /// Legend label
    pub fn label(&self) -> &'static str {
        match self {
            BiasCategory::Left => "Left",
            BiasCategory::LeansLeft => "Leans left",
            BiasCategory::Center => "Center",
            BiasCategory::LeansRight => "Leans right",
            BiasCategory::Right => "Right",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }

    fn from_token(token: &str) -> Option<Self> {
        BiasCategory::ALL.into_iter().find(|c| c.as_str() == token)
    }
}

impl fmt::Display for BiasCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// Classify a raw bias label
pub fn classify_bias(raw: &str) -> Option<BiasCategory> {
    let normalized = normalize_key(raw).replace('_', "-");
    if normalized.is_empty() {
        return None;
    }

    let token = match normalized.as_str() {
        "centre" => "center",
        "lean-left" | "left-lean" | "left-leaning" => "leans-left",
        "lean-right" | "right-lean" | "right-leaning" => "leans-right",
        other => other,
    };

    BiasCategory::from_token(token)
}

/// Classify an optional label (absent → None)
pub fn classify_bias_opt(raw: Option<&str>) -> Option<BiasCategory> {
    raw.and_then(classify_bias)
}

// ============================================================================
// SOURCE → BIAS LOOKUP
// ============================================================================

/// Joins article source strings to the bias rating of their outlet
///
/// Exact normalized `source`/`name` keys take precedence; the source-group key
/// catches variants like "The Example News" vs "Example".
#[derive(Debug, Clone, Default)]
pub struct SourceBiasLookup {
    exact: HashMap<String, BiasCategory>,
    groups: HashMap<String, BiasCategory>,
}

impl SourceBiasLookup {
    pub fn from_sources(sources: &[SourceRecord]) -> Self {
        let mut lookup = SourceBiasLookup::default();

        for source in sources {
            let Some(bias) = classify_bias_opt(source.bias.as_deref()) else {
                continue;
            };

            for key in [
                normalize_opt(source.source.as_deref()),
                normalize_opt(source.name.as_deref()),
            ] {
                if !key.is_empty() {
                    lookup.exact.insert(key, bias);
                }
            }

            let group = group_key(source.outlet());
            if !group.is_empty() {
                lookup.groups.entry(group).or_insert(bias);
            }
        }

        lookup
    }

    /// Bias for a raw article source string
    pub fn lookup(&self, raw_source: &str) -> Option<BiasCategory> {
        let key = normalize_key(raw_source);
        if key.is_empty() {
            return None;
        }

        if let Some(bias) = self.exact.get(&key) {
            return Some(*bias);
        }

        let group = group_key(raw_source);
        if group.is_empty() {
            return None;
        }
        self.groups.get(&group).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.groups.is_empty()
    }
}

// ============================================================================
// COVERAGE DISTRIBUTION
// ============================================================================

/// Per-category article counts for the coverage stacked bar
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BiasDistribution {
    counts: [usize; 5],
}

/// One stacked-bar segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BiasSegment {
    pub category: BiasCategory,
    pub label: &'static str,
    pub count: usize,
}

impl BiasDistribution {
    /// Count articles by the bias of their source; unmatched articles are skipped
    pub fn from_articles(articles: &[Article], lookup: &SourceBiasLookup) -> Self {
        let mut distribution = BiasDistribution::default();

        for article in articles {
            let Some(source) = article.source.as_deref() else {
                continue;
            };
            if let Some(bias) = lookup.lookup(source) {
                distribution.add(bias);
            }
        }

        distribution
    }

    pub fn add(&mut self, category: BiasCategory) {
        self.counts[category.index()] += 1;
    }

    pub fn get(&self, category: BiasCategory) -> usize {
        self.counts[category.index()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Non-empty segments in display order
    pub fn segments(&self) -> Vec<BiasSegment> {
        BiasCategory::ALL
            .into_iter()
            .filter(|c| self.get(*c) > 0)
            .map(|category| BiasSegment {
                category,
                label: category.label(),
                count: self.get(category),
            })
            .collect()
    }

    /// Every category with its count, in display order (legend rows)
    pub fn legend(&self) -> Vec<BiasSegment> {
        BiasCategory::ALL
            .into_iter()
            .map(|category| BiasSegment {
                category,
                label: category.label(),
                count: self.get(category),
            })
            .collect()
    }
}

impl Serialize for BiasDistribution {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(6))?;
        for category in BiasCategory::ALL {
            map.serialize_entry(category.as_str(), &self.get(category))?;
        }
        map.serialize_entry("total", &self.total())?;
        map.end()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source(source: &str, name: &str, bias: &str) -> SourceRecord {
        SourceRecord {
            source: Some(source.to_string()),
            name: Some(name.to_string()),
            bias: Some(bias.to_string()),
        }
    }

    fn article(source: &str) -> Article {
        serde_json::from_value(json!({ "source": source })).unwrap()
    }

    #[test]
    fn test_classify_canonical() {
        assert_eq!(classify_bias("left"), Some(BiasCategory::Left));
        assert_eq!(classify_bias("Leans-Left"), Some(BiasCategory::LeansLeft));
        assert_eq!(classify_bias(" CENTER "), Some(BiasCategory::Center));
        assert_eq!(classify_bias("leans_right"), Some(BiasCategory::LeansRight));
        assert_eq!(classify_bias("Right"), Some(BiasCategory::Right));
    }

    #[test]
    fn test_classify_synonyms() {
        assert_eq!(classify_bias("Centre"), Some(BiasCategory::Center));
        assert_eq!(classify_bias("lean-left"), Some(BiasCategory::LeansLeft));
        assert_eq!(classify_bias("left_lean"), Some(BiasCategory::LeansLeft));
        assert_eq!(classify_bias("Left-Leaning"), Some(BiasCategory::LeansLeft));
        assert_eq!(classify_bias("lean_right"), Some(BiasCategory::LeansRight));
        assert_eq!(classify_bias("right-lean"), Some(BiasCategory::LeansRight));
        assert_eq!(classify_bias("right-leaning"), Some(BiasCategory::LeansRight));
    }

    #[test]
    fn test_classify_unrecognized() {
        assert_eq!(classify_bias(""), None);
        assert_eq!(classify_bias("   "), None);
        assert_eq!(classify_bias("mixed"), None);
        assert_eq!(classify_bias("far-left"), None);
        assert_eq!(classify_bias("leaning left"), None);
        assert_eq!(classify_bias_opt(None), None);
    }

    #[test]
    fn test_category_order() {
        let mut shuffled = vec![
            BiasCategory::Right,
            BiasCategory::Center,
            BiasCategory::Left,
            BiasCategory::LeansRight,
            BiasCategory::LeansLeft,
        ];
        shuffled.sort();
        assert_eq!(shuffled, BiasCategory::ALL.to_vec());
    }

    #[test]
    fn test_category_serde_token() {
        assert_eq!(serde_json::to_value(BiasCategory::LeansLeft).unwrap(), json!("leans-left"));
        let parsed: BiasCategory = serde_json::from_value(json!("leans-right")).unwrap();
        assert_eq!(parsed, BiasCategory::LeansRight);
    }

    #[test]
    fn test_lookup_exact_and_group() {
        let lookup = SourceBiasLookup::from_sources(&[
            source("example.com", "The Example News", "lean-left"),
            source("daily.com", "Daily Post", "right"),
        ]);

        assert_eq!(lookup.lookup("Example.com"), Some(BiasCategory::LeansLeft));
        assert_eq!(lookup.lookup("the example news"), Some(BiasCategory::LeansLeft));
        // group key of "example.com" is "examplecom"; "Daily" groups with "Daily Post"
        assert_eq!(lookup.lookup("Daily"), None);
        assert_eq!(lookup.lookup("daily.com"), Some(BiasCategory::Right));
        assert_eq!(lookup.lookup(""), None);
        assert_eq!(lookup.lookup("Unknown Outlet"), None);
    }

    #[test]
    fn test_lookup_group_fallback() {
        let lookup = SourceBiasLookup::from_sources(&[SourceRecord {
            source: None,
            name: Some("The Example News".to_string()),
            bias: Some("center".to_string()),
        }]);

        assert_eq!(lookup.lookup("Example"), Some(BiasCategory::Center));
        assert_eq!(lookup.lookup("EXAMPLE Weekly"), Some(BiasCategory::Center));
    }

    #[test]
    fn test_lookup_skips_unrecognized_bias() {
        let lookup = SourceBiasLookup::from_sources(&[source("x.com", "X", "mixed")]);
        assert!(lookup.is_empty());
        assert_eq!(lookup.lookup("x.com"), None);
    }

    #[test]
    fn test_distribution_counts() {
        let lookup = SourceBiasLookup::from_sources(&[
            source("left.com", "Left Daily", "left"),
            source("center.com", "Center Wire", "centre"),
        ]);
        let articles = vec![
            article("left.com"),
            article("left.com"),
            article("center.com"),
            article("nowhere.com"),
            serde_json::from_value::<Article>(json!({ "headline": "no source" })).unwrap(),
        ];

        let distribution = BiasDistribution::from_articles(&articles, &lookup);

        assert_eq!(distribution.total(), 3);
        assert_eq!(distribution.get(BiasCategory::Left), 2);
        assert_eq!(distribution.get(BiasCategory::Center), 1);
        assert_eq!(distribution.get(BiasCategory::Right), 0);

        let segments = distribution.segments();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].category, BiasCategory::Left);
        assert_eq!(segments[1].label, "Center");
        assert_eq!(distribution.legend().len(), 5);
    }

    #[test]
    fn test_distribution_serialize() {
        let mut distribution = BiasDistribution::default();
        distribution.add(BiasCategory::Right);

        let value = serde_json::to_value(&distribution).unwrap();
        assert_eq!(value["right"], json!(1));
        assert_eq!(value["left"], json!(0));
        assert_eq!(value["total"], json!(1));
    }

    #[test]
    fn test_empty_distribution() {
        let distribution = BiasDistribution::from_articles(&[], &SourceBiasLookup::default());
        assert!(distribution.is_empty());
        assert!(distribution.segments().is_empty());
    }
}
