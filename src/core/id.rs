//! Component identity.
//!
//! Every interactive component carries a process-unique name. The name is
//! the addressing key for focus, pages and event subscriptions.

use std::borrow::Cow;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(Cow<'static, str>);

impl ComponentId {
    /// Identity for a component known at compile time.
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for ComponentId {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl From<String> for ComponentId {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl PartialEq<str> for ComponentId {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

// Well-known components of the application.
pub const ROOT: ComponentId = ComponentId::from_static("Root");
pub const HEADER: ComponentId = ComponentId::from_static("Header");
pub const DATABASES: ComponentId = ComponentId::from_static("Databases");
pub const CONTENT: ComponentId = ComponentId::from_static("Content");
pub const QUERY_BAR: ComponentId = ComponentId::from_static("QueryBar");
pub const FILTER_BAR: ComponentId = ComponentId::from_static("FilterBar");
pub const HISTORY: ComponentId = ComponentId::from_static("History");
pub const DOC_PEEKER: ComponentId = ComponentId::from_static("DocPeeker");
pub const HELP: ComponentId = ComponentId::from_static("Help");
pub const STYLE_PICKER: ComponentId = ComponentId::from_static("StylePicker");
pub const KEY_HINTS: ComponentId = ComponentId::from_static("KeyHints");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_and_owned_ids_compare_equal() {
        let owned = ComponentId::from("QueryBar".to_string());
        assert_eq!(owned, QUERY_BAR);
        assert!(QUERY_BAR == *"QueryBar");
        assert_eq!(QUERY_BAR.to_string(), "QueryBar");
    }
}
