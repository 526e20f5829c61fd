//! Tier vocabulary for recommendation consensus.
//!
//! Providers answer in free form ("claude-3-5-sonnet", "Sonnet 4",
//! "I'd go with opus"). Before votes can be compared they are normalized to a
//! coarse capability tier from a fixed, ordered vocabulary.

use serde::{Deserialize, Serialize};

/// Tier name for recommendations that match no vocabulary entry
pub const UNKNOWN_TIER: &str = "unknown";

/// A normalized recommendation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tier {
    pub name: String,
    /// Position in the vocabulary (0 = lowest); `None` for unknown
    pub rank: Option<usize>,
}

impl Tier {
    pub fn unknown() -> Self {
        Self {
            name: UNKNOWN_TIER.to_string(),
            rank: None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.rank.is_none()
    }
}

/// Ordered tier keywords, lowest capability first
///
/// # Example
///
/// ```
/// use verdict_domain::TierVocabulary;
///
/// let vocab = TierVocabulary::default();
/// assert_eq!(vocab.normalize("claude-3-5-Sonnet-latest").name, "sonnet");
/// assert!(vocab.normalize("gpt-4o").is_unknown());
/// assert!(vocab.rank("opus") > vocab.rank("haiku"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierVocabulary {
    tiers: Vec<String>,
}

impl Default for TierVocabulary {
    fn default() -> Self {
        Self::new(["haiku", "sonnet", "opus"])
    }
}

impl TierVocabulary {
    /// Build a vocabulary; keywords are lowercased, blanks and repeats dropped
    pub fn new<I, S>(tiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for tier in tiers {
            let tier = tier.as_ref().trim().to_lowercase();
            if !tier.is_empty() && !normalized.contains(&tier) {
                normalized.push(tier);
            }
        }
        Self { tiers: normalized }
    }

    pub fn tiers(&self) -> &[String] {
        &self.tiers
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Normalize a recommended entity to a tier
    ///
    /// The first vocabulary keyword (in vocabulary order) contained in the
    /// lowercased entity wins.
    pub fn normalize(&self, entity: &str) -> Tier {
        let lower = entity.to_lowercase();
        self.tiers
            .iter()
            .enumerate()
            .find(|(_, tier)| lower.contains(tier.as_str()))
            .map(|(rank, tier)| Tier {
                name: tier.clone(),
                rank: Some(rank),
            })
            .unwrap_or_else(Tier::unknown)
    }

    /// Rank of an entity after normalization
    pub fn rank(&self, entity: &str) -> Option<usize> {
        self.normalize(entity).rank
    }
}
