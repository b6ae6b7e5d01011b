use serde::{Deserialize, Serialize};
use std::fmt;

/// The three entity collections the sync core mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Clients,
    Services,
    Expenses,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [
        EntityKind::Clients,
        EntityKind::Services,
        EntityKind::Expenses,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Clients => "clients",
            EntityKind::Services => "services",
            EntityKind::Expenses => "expenses",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "clients" => Ok(EntityKind::Clients),
            "services" => Ok(EntityKind::Services),
            "expenses" => Ok(EntityKind::Expenses),
            other => Err(format!("Unknown entity kind: {other}")),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
