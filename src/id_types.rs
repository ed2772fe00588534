use std::fmt;
use std::sync::Arc;

/// Opaque identifier of one `PeerSession`.
/// Wraps an `Arc<String>` for cheap cloning into callbacks and registry keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(pub Arc<String>);

/// Routing key naming the publisher whose stream a viewer wants.
/// Opaque to the client: never validated, empty is allowed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PublisherKey(pub Arc<String>);

impl SessionId {
    /// Generates a fresh random id.
    pub fn generate() -> Self {
        SessionId(Arc::new(uuid::Uuid::new_v4().to_string()))
    }
}

impl PublisherKey {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Implement Display for easy logging
impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for PublisherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        SessionId(Arc::new(s))
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        SessionId(Arc::new(s.to_string()))
    }
}

impl From<String> for PublisherKey {
    fn from(s: String) -> Self {
        PublisherKey(Arc::new(s))
    }
}

impl From<&str> for PublisherKey {
    fn from(s: &str) -> Self {
        PublisherKey(Arc::new(s.to_string()))
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PublisherKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
