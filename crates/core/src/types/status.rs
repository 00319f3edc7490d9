//! Status enums for various entities.

use serde::{Deserialize, Serialize};

/// Customer tier used to pick which reward applies to an order.
///
/// Shopify has no native notion of tiers; a customer is elite when one of
/// their tags is `elite` (any case).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "rewards.customer_type", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum CustomerTier {
    /// Tagged `elite` in Shopify.
    Elite,
    /// Everyone else.
    #[default]
    Regular,
}

impl CustomerTier {
    /// Tag that marks a customer as elite.
    pub const ELITE_TAG: &'static str = "elite";

    /// Determine the tier from a customer's tags.
    #[must_use]
    pub fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if tags
            .into_iter()
            .any(|tag| tag.as_ref().trim().eq_ignore_ascii_case(Self::ELITE_TAG))
        {
            Self::Elite
        } else {
            Self::Regular
        }
    }

    /// Lowercase label used in the database and the admin UI.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Elite => "elite",
            Self::Regular => "regular",
        }
    }
}

impl std::fmt::Display for CustomerTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elite_tag_any_case() {
        assert_eq!(CustomerTier::from_tags(["VIP", "Elite"]), CustomerTier::Elite);
        assert_eq!(CustomerTier::from_tags([" ELITE "]), CustomerTier::Elite);
    }

    #[test]
    fn test_no_elite_tag_is_regular() {
        assert_eq!(CustomerTier::from_tags(["vip", "elites"]), CustomerTier::Regular);
        assert_eq!(
            CustomerTier::from_tags(Vec::<String>::new()),
            CustomerTier::Regular
        );
    }

    #[test]
    fn test_display_matches_serde() {
        assert_eq!(CustomerTier::Elite.to_string(), "elite");
        assert_eq!(
            serde_json::to_string(&CustomerTier::Regular).unwrap_or_default(),
            "\"regular\""
        );
    }
}
