//! Watched resources, event filters, and change notifications.

use serde::{Deserialize, Serialize};

use super::transport::RealtimeError;

/// A table whose changes can be watched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    /// `farmers`
    Farmers,
    /// `transactions`
    Transactions,
    /// `inventory`
    Inventory,
    /// `bills`
    Bills,
    /// `organizations`
    Organizations,
    /// `profiles`
    Profiles,
}

impl Resource {
    /// Every watchable table.
    pub const ALL: [Self; 6] = [
        Self::Farmers,
        Self::Transactions,
        Self::Inventory,
        Self::Bills,
        Self::Organizations,
        Self::Profiles,
    ];

    /// Table name.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Farmers => "farmers",
            Self::Transactions => "transactions",
            Self::Inventory => "inventory",
            Self::Bills => "bills",
            Self::Organizations => "organizations",
            Self::Profiles => "profiles",
        }
    }

    /// Looks a resource up by table name.
    #[must_use]
    pub fn from_table(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.table() == name)
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}

/// Kind of row change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    /// Row inserted.
    Insert,
    /// Row updated.
    Update,
    /// Row deleted.
    Delete,
}

impl ChangeKind {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

/// Which change kinds a channel asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EventFilter {
    /// `INSERT` only.
    #[serde(rename = "INSERT")]
    Insert,
    /// `UPDATE` only.
    #[serde(rename = "UPDATE")]
    Update,
    /// `DELETE` only.
    #[serde(rename = "DELETE")]
    Delete,
    /// Everything.
    #[default]
    #[serde(rename = "*")]
    All,
}

impl EventFilter {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::All => "*",
        }
    }

    /// Whether a change of `kind` passes the filter.
    #[must_use]
    pub const fn admits(self, kind: ChangeKind) -> bool {
        matches!(
            (self, kind),
            (Self::All, _)
                | (Self::Insert, ChangeKind::Insert)
                | (Self::Update, ChangeKind::Update)
                | (Self::Delete, ChangeKind::Delete)
        )
    }
}

/// A pushed row change. The row payload is carried but not interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeNotification {
    /// Changed table.
    pub resource: Resource,
    /// Kind of change.
    pub kind: ChangeKind,
    /// New row, for inserts and updates.
    pub record: Option<serde_json::Value>,
    /// Previous row, for updates and deletes.
    pub old_record: Option<serde_json::Value>,
}

/// Wire shape of a change payload.
#[derive(Debug, Deserialize)]
struct ChangePayload {
    #[serde(rename = "type")]
    kind: ChangeKind,
    table: String,
    #[serde(default)]
    record: Option<serde_json::Value>,
    #[serde(default)]
    old_record: Option<serde_json::Value>,
}

impl ChangeNotification {
    /// Creates a notification without row payloads.
    #[must_use]
    pub const fn new(resource: Resource, kind: ChangeKind) -> Self {
        Self {
            resource,
            kind,
            record: None,
            old_record: None,
        }
    }

    /// Parses a JSON payload `{type, table, schema, record, old_record}`.
    ///
    /// # Errors
    ///
    /// Returns `RealtimeError::Payload` for malformed JSON or unknown tables.
    pub fn from_payload(raw: &str) -> Result<Self, RealtimeError> {
        let payload: ChangePayload =
            serde_json::from_str(raw).map_err(|e| RealtimeError::Payload(e.to_string()))?;
        let resource = Resource::from_table(&payload.table)
            .ok_or_else(|| RealtimeError::Payload(format!("unknown table '{}'", payload.table)))?;

        Ok(Self {
            resource,
            kind: payload.kind,
            record: payload.record,
            old_record: payload.old_record,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_table_names_round_trip() {
        for resource in Resource::ALL {
            assert_eq!(Resource::from_table(resource.table()), Some(resource));
        }
        assert_eq!(Resource::from_table("whatsapp_logs"), None);
    }

    #[rstest]
    #[case(EventFilter::All, ChangeKind::Insert, true)]
    #[case(EventFilter::All, ChangeKind::Delete, true)]
    #[case(EventFilter::Insert, ChangeKind::Insert, true)]
    #[case(EventFilter::Insert, ChangeKind::Update, false)]
    #[case(EventFilter::Update, ChangeKind::Update, true)]
    #[case(EventFilter::Delete, ChangeKind::Insert, false)]
    fn test_filter_admits(
        #[case] filter: EventFilter,
        #[case] kind: ChangeKind,
        #[case] expected: bool,
    ) {
        assert_eq!(filter.admits(kind), expected);
    }

    #[test]
    fn test_filter_wire_names() {
        assert_eq!(serde_json::to_string(&EventFilter::All).unwrap(), "\"*\"");
        let parsed: EventFilter = serde_json::from_str("\"DELETE\"").unwrap();
        assert_eq!(parsed, EventFilter::Delete);
    }

    #[test]
    fn test_parse_payload() {
        let raw = r#"{"type":"INSERT","table":"farmers","schema":"public","record":{"id":"x","name":"Dinesh"},"old_record":null}"#;
        let n = ChangeNotification::from_payload(raw).unwrap();
        assert_eq!(n.resource, Resource::Farmers);
        assert_eq!(n.kind, ChangeKind::Insert);
        assert_eq!(n.record.unwrap()["name"], "Dinesh");
        assert!(n.old_record.is_none());
    }

    #[test]
    fn test_parse_payload_rejects_unknown_table_and_type() {
        assert!(matches!(
            ChangeNotification::from_payload(r#"{"type":"INSERT","table":"secrets"}"#),
            Err(RealtimeError::Payload(_))
        ));
        assert!(matches!(
            ChangeNotification::from_payload(r#"{"type":"TRUNCATE","table":"farmers"}"#),
            Err(RealtimeError::Payload(_))
        ));
        assert!(ChangeNotification::from_payload("not json").is_err());
    }
}
