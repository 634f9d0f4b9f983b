//! Product types

use serde::{Deserialize, Serialize};

use crate::{ParseError, ProductId};

/// Kind of product sold on the site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    /// Downloadable PDF, no calendar slot
    Pdf,
    /// One-to-one coaching session
    CoachingIndividual,
    /// Team coaching session
    CoachingTeam,
}

impl ProductType {
    /// Whether buying this product books a calendar slot
    pub const fn requires_slot(&self) -> bool {
        matches!(self, Self::CoachingIndividual | Self::CoachingTeam)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::CoachingIndividual => "coaching_individual",
            Self::CoachingTeam => "coaching_team",
        }
    }
}

impl std::fmt::Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProductType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "coaching_individual" | "coaching" => Ok(Self::CoachingIndividual),
            "coaching_team" => Ok(Self::CoachingTeam),
            _ => Err(ParseError::ProductType(s.to_string())),
        }
    }
}

/// Product offered for sale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Product ID
    pub id: ProductId,
    /// Display name (used as the checkout line item name)
    pub name: String,
    /// Price in the smallest currency unit
    pub price_cents: i64,
    /// Product type
    pub product_type: ProductType,
    /// Default session length for coaching products
    pub duration_minutes: Option<u32>,
    /// Whether the product can currently be bought
    pub active: bool,
}
