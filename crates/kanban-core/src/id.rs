use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identity of an entity, assigned at creation and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// The aggregate types that own an event stream in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Board,
    WorkItem,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Board => "Board",
            EntityKind::WorkItem => "WorkItem",
        }
    }

    /// Topic of the event that brings an entity of this kind into existence.
    pub fn created_topic(&self) -> String {
        format!("{}.Created", self.as_str())
    }

    /// Topic of the event that ends an entity of this kind.
    pub fn discarded_topic(&self) -> String {
        format!("{}.Discarded", self.as_str())
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_ids_are_unique() {
        assert_ne!(EntityId::new(), EntityId::new());
    }

    #[test]
    fn test_entity_id_display_is_simple_hex() {
        let id = EntityId::new();
        let shown = id.to_string();
        assert_eq!(shown.len(), 32);
        assert!(shown.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_kind_topics() {
        assert_eq!(EntityKind::Board.created_topic(), "Board.Created");
        assert_eq!(EntityKind::WorkItem.discarded_topic(), "WorkItem.Discarded");
    }
}
