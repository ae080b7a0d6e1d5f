// Capability token definitions
//
// Design Decision: Capabilities are string-based tokens to allow hosts to add
// new capabilities without code changes to enums. The registry treats them as
// opaque; only set containment matters for access checks.

use serde::{Deserialize, Serialize};

/// Capability token - an opaque string identifier for extensibility
///
/// Tokens name what a caller is allowed to do (`edit_content`,
/// `manage_files`, ...). An agent declares the tokens it requires; the
/// registry compares that set against the caller's grants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capability(String);

impl Capability {
    /// Create a new capability token from a string
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Get the token as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    // Built-in capability token constants for convenience
    pub const EDIT_CONTENT: &'static str = "edit_content";
    pub const MODERATE_COMMENTS: &'static str = "moderate_comments";
    pub const MANAGE_THEMES: &'static str = "manage_themes";
    pub const MANAGE_USERS: &'static str = "manage_users";
    pub const MANAGE_CATALOG: &'static str = "manage_catalog";
    pub const MANAGE_FILES: &'static str = "manage_files";

    /// Create the edit_content capability token
    pub fn edit_content() -> Self {
        Self::new(Self::EDIT_CONTENT)
    }

    /// Create the moderate_comments capability token
    pub fn moderate_comments() -> Self {
        Self::new(Self::MODERATE_COMMENTS)
    }

    /// Create the manage_themes capability token
    pub fn manage_themes() -> Self {
        Self::new(Self::MANAGE_THEMES)
    }

    /// Create the manage_users capability token
    pub fn manage_users() -> Self {
        Self::new(Self::MANAGE_USERS)
    }

    /// Create the manage_catalog capability token
    pub fn manage_catalog() -> Self {
        Self::new(Self::MANAGE_CATALOG)
    }

    /// Create the manage_files capability token
    pub fn manage_files() -> Self {
        Self::new(Self::MANAGE_FILES)
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Capability {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Capability {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Capability {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for Capability {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An ordered, duplicate-free set of capability tokens.
///
/// Used both for an agent's requirements (all-of semantics) and for a
/// caller's grants. Order is preserved for stable presentation; containment
/// checks ignore it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilitySet(Vec<Capability>);

impl CapabilitySet {
    /// Create an empty capability set
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Create a set from anything iterable over capability-like values
    pub fn of<I, C>(caps: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Capability>,
    {
        let mut set = Self::new();
        for cap in caps {
            set.grant(cap);
        }
        set
    }

    /// Add a capability to the set (no-op if already present)
    pub fn grant(&mut self, cap: impl Into<Capability>) {
        let cap = cap.into();
        if !self.0.contains(&cap) {
            self.0.push(cap);
        }
    }

    /// Fluent variant of [`grant`](Self::grant)
    pub fn with(mut self, cap: impl Into<Capability>) -> Self {
        self.grant(cap);
        self
    }

    /// Check whether a single capability is present
    pub fn contains(&self, cap: &Capability) -> bool {
        self.0.contains(cap)
    }

    /// Check whether every capability in `required` is present.
    ///
    /// An empty `required` set is satisfied by any caller.
    pub fn contains_all(&self, required: &CapabilitySet) -> bool {
        required.0.iter().all(|cap| self.0.contains(cap))
    }

    /// Number of capabilities in the set
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the set holds no capabilities
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the capabilities in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Capability> {
        self.0.iter()
    }
}

impl From<Vec<Capability>> for CapabilitySet {
    fn from(caps: Vec<Capability>) -> Self {
        Self::of(caps)
    }
}

impl<C: Into<Capability>> FromIterator<C> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = C>>(iter: I) -> Self {
        Self::of(iter)
    }
}

impl std::fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for cap in &self.0 {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}", cap)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_display() {
        assert_eq!(Capability::edit_content().to_string(), "edit_content");
        assert_eq!(
            Capability::moderate_comments().to_string(),
            "moderate_comments"
        );
        assert_eq!(Capability::manage_themes().to_string(), "manage_themes");
        assert_eq!(Capability::manage_users().to_string(), "manage_users");
        assert_eq!(Capability::manage_catalog().to_string(), "manage_catalog");
        assert_eq!(Capability::manage_files().to_string(), "manage_files");
    }

    #[test]
    fn test_capability_from_str() {
        assert_eq!(
            "edit_content".parse::<Capability>().unwrap(),
            Capability::edit_content()
        );
        let custom = Capability::new("manage_newsletters");
        assert_eq!(custom.as_str(), "manage_newsletters");
    }

    #[test]
    fn test_capability_serialization_is_transparent() {
        let cap = Capability::manage_files();
        let json = serde_json::to_string(&cap).unwrap();
        assert_eq!(json, "\"manage_files\"");

        let parsed: Capability = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, cap);
    }

    #[test]
    fn test_set_grant_dedupes() {
        let mut set = CapabilitySet::new();
        set.grant("edit_content");
        set.grant(Capability::edit_content());
        set.grant("manage_files");

        assert_eq!(set.len(), 2);
        assert!(set.contains(&Capability::edit_content()));
        assert!(set.contains(&Capability::manage_files()));
    }

    #[test]
    fn test_contains_all_is_all_of() {
        let caller = CapabilitySet::of(["edit_content", "manage_files"]);
        let needs_one = CapabilitySet::of(["edit_content"]);
        let needs_both = CapabilitySet::of(["edit_content", "manage_files"]);
        let needs_other = CapabilitySet::of(["edit_content", "manage_users"]);

        assert!(caller.contains_all(&needs_one));
        assert!(caller.contains_all(&needs_both));
        assert!(!caller.contains_all(&needs_other));
    }

    #[test]
    fn test_empty_requirement_is_satisfied_by_anyone() {
        let empty = CapabilitySet::new();
        let nobody = CapabilitySet::new();
        let somebody = CapabilitySet::of(["edit_content"]);

        assert!(nobody.contains_all(&empty));
        assert!(somebody.contains_all(&empty));
    }

    #[test]
    fn test_set_serialization_round_trip() {
        let set = CapabilitySet::of(["edit_content", "manage_users"]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, "[\"edit_content\",\"manage_users\"]");

        let parsed: CapabilitySet = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, set);
    }

    #[test]
    fn test_set_preserves_insertion_order() {
        let set = CapabilitySet::of(["manage_users", "edit_content"]);
        let tokens: Vec<&str> = set.iter().map(|c| c.as_str()).collect();
        assert_eq!(tokens, vec!["manage_users", "edit_content"]);
    }
}
