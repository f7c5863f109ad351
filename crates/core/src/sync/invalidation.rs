//! Which cached result sets a table change makes stale.
//!
//! The mapping is declared per screen and never inferred.

use serde::{Deserialize, Serialize};

use crate::cache::QueryName;

use super::resource::{EventFilter, Resource};

/// A live view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    /// Aggregate statistics.
    Dashboard,
    /// Farmer list.
    Farmers,
    /// Transaction list.
    Transactions,
    /// Inventory list.
    Inventory,
    /// Bill list.
    Bills,
}

/// One watched table and what its changes invalidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watch {
    /// Watched table.
    pub resource: Resource,
    /// Accepted change kinds.
    pub filter: EventFilter,
    /// Result sets made stale by a change.
    pub invalidates: &'static [QueryName],
}

const DASHBOARD: &[Watch] = &[
    Watch {
        resource: Resource::Farmers,
        filter: EventFilter::All,
        invalidates: &[QueryName::DashboardStats],
    },
    Watch {
        resource: Resource::Transactions,
        filter: EventFilter::All,
        invalidates: &[QueryName::DashboardStats],
    },
    Watch {
        resource: Resource::Inventory,
        filter: EventFilter::All,
        invalidates: &[QueryName::DashboardStats],
    },
];

const FARMERS: &[Watch] = &[Watch {
    resource: Resource::Farmers,
    filter: EventFilter::All,
    invalidates: &[QueryName::Farmers, QueryName::DashboardStats],
}];

// Balances derive from transactions, so the farmer list goes stale too.
const TRANSACTIONS: &[Watch] = &[Watch {
    resource: Resource::Transactions,
    filter: EventFilter::All,
    invalidates: &[
        QueryName::Transactions,
        QueryName::Farmers,
        QueryName::DashboardStats,
    ],
}];

const INVENTORY: &[Watch] = &[Watch {
    resource: Resource::Inventory,
    filter: EventFilter::All,
    invalidates: &[QueryName::Inventory, QueryName::DashboardStats],
}];

const BILLS: &[Watch] = &[Watch {
    resource: Resource::Bills,
    filter: EventFilter::All,
    invalidates: &[QueryName::Bills, QueryName::SheetBills],
}];

impl Screen {
    /// Every screen.
    pub const ALL: [Self; 5] = [
        Self::Dashboard,
        Self::Farmers,
        Self::Transactions,
        Self::Inventory,
        Self::Bills,
    ];

    /// Path segment and channel prefix.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Farmers => "farmers",
            Self::Transactions => "transactions",
            Self::Inventory => "inventory",
            Self::Bills => "bills",
        }
    }

    /// Tables this screen watches.
    #[must_use]
    pub const fn watches(self) -> &'static [Watch] {
        match self {
            Self::Dashboard => DASHBOARD,
            Self::Farmers => FARMERS,
            Self::Transactions => TRANSACTIONS,
            Self::Inventory => INVENTORY,
            Self::Bills => BILLS,
        }
    }

    /// The result set the screen renders.
    #[must_use]
    pub const fn displays(self) -> QueryName {
        match self {
            Self::Dashboard => QueryName::DashboardStats,
            Self::Farmers => QueryName::Farmers,
            Self::Transactions => QueryName::Transactions,
            Self::Inventory => QueryName::Inventory,
            Self::Bills => QueryName::Bills,
        }
    }

    /// Result sets this screen invalidates when `resource` changes.
    #[must_use]
    pub fn invalidated_by(self, resource: Resource) -> &'static [QueryName] {
        self.watches()
            .iter()
            .find(|w| w.resource == resource)
            .map_or(&[], |w| w.invalidates)
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Screen {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|screen| screen.as_str() == s)
            .ok_or_else(|| format!("unknown screen '{s}'"))
    }
}

/// Result sets a write to `resource` makes stale for every screen.
#[must_use]
pub fn written_by(resource: Resource) -> Vec<QueryName> {
    let mut names = Vec::new();
    for screen in Screen::ALL {
        for &name in screen.invalidated_by(resource) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    if resource == Resource::Organizations {
        names.push(QueryName::OrgSettings);
    }
    names
}
