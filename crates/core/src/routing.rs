//! Specialist categories — the fixed set a routing decision can resolve to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One specialist handling category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    #[default]
    Order,
    Inventory,
    Returns,
    Fraud,
    CrmSync,
    Escalation,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Order,
        Category::Inventory,
        Category::Returns,
        Category::Fraud,
        Category::CrmSync,
        Category::Escalation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Order => "ORDER",
            Self::Inventory => "INVENTORY",
            Self::Returns => "RETURNS",
            Self::Fraud => "FRAUD",
            Self::CrmSync => "CRM_SYNC",
            Self::Escalation => "ESCALATION",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    /// Case-insensitive. Accepts the CRM aliases `SALESFORCE` and `CRM`
    /// and the singular `RETURN`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "ORDER" => Ok(Self::Order),
            "INVENTORY" => Ok(Self::Inventory),
            "RETURNS" | "RETURN" => Ok(Self::Returns),
            "FRAUD" => Ok(Self::Fraud),
            "CRM_SYNC" | "SALESFORCE" | "CRM" => Ok(Self::CrmSync),
            "ESCALATION" => Ok(Self::Escalation),
            _ => Err(format!("unknown category: {s}")),
        }
    }
}
