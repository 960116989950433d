//! FlowName - Cheap-to-clone flow identifier
//!
//! Every `FlowItem` carries the name of the flow that produced it, so the
//! name is cloned once per item. Uses Arc<str> internally for O(1) clones.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

/// Configured flow name with cheap cloning.
///
/// # Examples
/// ```
/// use contracts::FlowName;
///
/// let name: FlowName = "bulk".into();
/// let copy = name.clone();
/// assert_eq!(name, copy);
/// assert_eq!(name.as_str(), "bulk");
/// ```
#[derive(Clone, Default)]
pub struct FlowName(Arc<str>);

impl FlowName {
    /// Create a new FlowName from a string slice.
    #[inline]
    pub fn new(s: &str) -> Self {
        Self(Arc::from(s))
    }

    /// Get the underlying string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Deref to &str for easy string operations
impl Deref for FlowName {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for FlowName {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for FlowName {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Conversions
impl From<&str> for FlowName {
    #[inline]
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for FlowName {
    #[inline]
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl From<Arc<str>> for FlowName {
    #[inline]
    fn from(s: Arc<str>) -> Self {
        Self(s)
    }
}

// Display and Debug
impl fmt::Display for FlowName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for FlowName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FlowName({:?})", self.0)
    }
}

// Equality - can compare with &str, String, etc.
impl PartialEq for FlowName {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        // Fast path: same Arc pointer
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for FlowName {}

impl PartialEq<str> for FlowName {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for FlowName {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl PartialEq<String> for FlowName {
    #[inline]
    fn eq(&self, other: &String) -> bool {
        self.0.as_ref() == other
    }
}

// Hash - same as str hash for HashMap compatibility
impl Hash for FlowName {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

// Serde support
impl Serialize for FlowName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for FlowName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_clone_shares_storage() {
        let a: FlowName = "interactive".into();
        let b = a.clone();
        assert_eq!(a.as_str().as_ptr(), b.as_str().as_ptr());
    }

    #[test]
    fn test_compare_with_strings() {
        let name: FlowName = "bulk".into();
        assert_eq!(name, "bulk");
        assert_eq!(name, String::from("bulk"));
        assert_ne!(name, FlowName::from("batch"));
    }

    #[test]
    fn test_lookup_by_str() {
        let mut shares: HashMap<FlowName, u64> = HashMap::new();
        shares.insert("hi".into(), 3);
        shares.insert("lo".into(), 1);
        assert_eq!(shares.get("hi"), Some(&3));
        assert_eq!(shares.get("missing"), None);
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let name: FlowName = "logs".into();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"logs\"");
        let parsed: FlowName = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, name);
    }
}
