//! Entity trait: identity that survives a full replace.

/// A record addressed by a string primary key.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug + AsRef<str>;

    /// Attribute name that carries the identifier in stored and wire form.
    const KEY_ATTRIBUTE: &'static str;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// The identifier as the raw primary-key string.
    fn key(&self) -> &str {
        self.id().as_ref()
    }
}
