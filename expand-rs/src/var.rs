//! String-valued variable table.
//!
//! [`VarStore`] is what [`config::load_str`](crate::config::load_str) fills
//! from a variable file, and it can be handed straight to
//! [`Parser::expand_with`](crate::Parser::expand_with) as a lookup.

use std::borrow::Cow;
use std::collections::HashMap;
use std::convert::Infallible;

use crate::lookup::Lookup;

/// Key/value variable store.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct VarStore {
    vars: HashMap<String, String>,
}

impl VarStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or overwrite) a variable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Get the value of a variable.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Remove a variable.  Returns `true` if it existed.
    pub fn unset(&mut self, name: &str) -> bool {
        self.vars.remove(name).is_some()
    }

    /// Returns `true` if the variable is set, even to an empty value.
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Iterate over all variables in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VarStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut store = VarStore::new();
        for (k, v) in iter {
            store.set(k, v);
        }
        store
    }
}

impl Lookup for VarStore {
    type Error = Infallible;

    fn get(&mut self, name: &str) -> Result<Option<Cow<'_, str>>, Infallible> {
        Ok(VarStore::get(self, name).map(Cow::Borrowed))
    }

    fn is_defined(&mut self, name: &str) -> Result<bool, Infallible> {
        Ok(self.contains(name))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Parser;

    #[test]
    fn set_and_get() {
        let mut vars = VarStore::new();
        vars.set("HOME", "/home/ada");
        assert_eq!(vars.get("HOME"), Some("/home/ada"));
    }

    #[test]
    fn overwrite() {
        let mut vars = VarStore::new();
        vars.set("x", "old");
        vars.set("x", "new");
        assert_eq!(vars.get("x"), Some("new"));
        assert_eq!(vars.len(), 1);
    }

    #[test]
    fn unset() {
        let mut vars = VarStore::new();
        vars.set("gone", "bye");
        assert!(vars.unset("gone"));
        assert_eq!(vars.get("gone"), None);
        assert!(!vars.unset("gone")); // already gone
    }

    #[test]
    fn empty_value_is_contained() {
        let vars: VarStore = [("blank", "")].into_iter().collect();
        assert!(vars.contains("blank"));
        assert!(!vars.contains("absent"));
        assert!(!vars.is_empty());
    }

    #[test]
    fn expands_as_lookup() {
        let mut vars: VarStore = [("NAME", "Example"), ("EMPTY", "")].into_iter().collect();
        let out = Parser::new()
            .expand_with("${NAME:-World} ${EMPTY:+set} ${MISSING:/unset}", &mut vars)
            .unwrap();
        assert_eq!(out, "Example set unset");
    }
}
