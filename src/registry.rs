//! Resource registry – a closed mapping from file name to embedded bytes.
//!
//! The table is generated at build time by the encoder (see [`crate::embed`])
//! and linked into the binary. [`Registry::embedded`] builds the map once on
//! first use; it is immutable afterwards. Looking up a name that was not
//! embedded is an [`Error::UnknownResource`], never an empty slice.
//!
//! The generated `embedded_resource!` macro stays private to the module that
//! includes it. The resource set of a build may be empty, so the crate reaches
//! its own resources through [`Registry::lookup`] only; the compile-time macro
//! serves crates that include `forge-embed` output with a known set.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::error::{Error, Result};

mod embedded {
    include!(concat!(env!("OUT_DIR"), "/resources/embed_resources_data.rs"));
    include!(concat!(env!("OUT_DIR"), "/resources/embed_resources.rs"));
}

/// A read-only view of one embedded resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resource {
    name: &'static str,
    data: &'static [u8],
}

impl Resource {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn data(&self) -> &'static [u8] {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: BTreeMap<&'static str, &'static [u8]>,
}

impl Registry {
    /// Builds a registry from `(name, bytes)` pairs. A repeated name keeps its
    /// first occurrence.
    pub fn from_entries(entries: &[(&'static str, &'static [u8])]) -> Self {
        let mut map = BTreeMap::new();
        for &(name, data) in entries {
            if map.contains_key(name) {
                log::warn!("duplicate resource `{name}` ignored");
                continue;
            }
            map.insert(name, data);
        }
        Self { entries: map }
    }

    /// The resources compiled into this binary.
    pub fn embedded() -> &'static Registry {
        static EMBEDDED: OnceLock<Registry> = OnceLock::new();
        EMBEDDED.get_or_init(|| Registry::from_entries(embedded::ENTRIES))
    }

    pub fn lookup(&self, name: &str) -> Result<Resource> {
        self.entries
            .get_key_value(name)
            .map(|(&name, &data)| Resource { name, data })
            .ok_or_else(|| Error::UnknownResource(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Resource names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = Resource> + '_ {
        self.entries
            .iter()
            .map(|(&name, &data)| Resource { name, data })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all resource sizes in bytes.
    pub fn total_size(&self) -> usize {
        self.entries.values().map(|data| data.len()).sum()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_registry() -> Registry {
        Registry::from_entries(fixtures::ENTRIES)
    }

    #[test]
    fn lookup_returns_exact_bytes() {
        let registry = fixture_registry();

        let a = registry.lookup("a.bin").unwrap();
        assert_eq!(a.name(), "a.bin");
        assert_eq!(a.len(), 3);
        assert_eq!(a.data(), &[0x00, 0xFF, 0x7F]);

        let b = registry.lookup("b.bin").unwrap();
        assert_eq!(b.len(), 0);
        assert!(b.is_empty());

        let err = registry.lookup("c.bin").unwrap_err();
        assert!(matches!(err, Error::UnknownResource(ref name) if name == "c.bin"));
    }

    #[test]
    fn lookup_is_exact_match_only() {
        let registry = fixture_registry();
        assert!(registry.lookup("A.bin").is_err());
        assert!(registry.lookup("a.bin ").is_err());
        assert!(registry.lookup("shadow/a.bin").is_err());
        assert!(registry.lookup("").is_err());
        assert!(registry.contains("a.bin"));
        assert!(!registry.contains("a"));
    }

    #[test]
    fn duplicate_file_name_keeps_first_input() {
        let registry = fixture_registry();
        // tests/fixtures/embed/shadow/a.bin ("shadowed") sorts after the top-level a.bin
        assert_eq!(registry.lookup("a.bin").unwrap().data(), &[0x00, 0xFF, 0x7F]);
        assert_eq!(registry.names().filter(|n| *n == "a.bin").count(), 1);
    }

    #[test]
    fn confusable_names_stay_distinct() {
        let registry = fixture_registry();
        assert_eq!(registry.lookup("a.txt").unwrap().data(), b"dotted");
        assert_eq!(registry.lookup("a_txt").unwrap().data(), b"underscored");
        assert_eq!(registry.lookup("1st.dat").unwrap().data(), b"leading digit");
    }

    #[test]
    fn multi_chunk_resource_round_trips() {
        let registry = fixture_registry();
        let expected: Vec<u8> = (0..1000u32).map(|i| ((i * 7 + 3) % 256) as u8).collect();
        let resource = registry.lookup("multi_chunk.bin").unwrap();
        assert_eq!(resource.len(), expected.len());
        assert_eq!(resource.data(), expected.as_slice());
    }

    #[test]
    fn compile_time_lookup_matches_registry() {
        let registry = fixture_registry();
        let a: &'static [u8] = embedded_resource!("a.bin");
        let b: &'static [u8] = embedded_resource!("b.bin");
        let digit: &'static [u8] = embedded_resource!("1st.dat");
        assert_eq!(a, registry.lookup("a.bin").unwrap().data());
        assert!(b.is_empty());
        assert_eq!(digit, b"leading digit");
    }

    #[test]
    fn names_are_sorted_and_complete() {
        let registry = fixture_registry();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(
            names,
            ["1st.dat", "a.bin", "a.txt", "a_txt", "b.bin", "multi_chunk.bin"]
        );
        assert_eq!(registry.len(), 6);
        assert_eq!(registry.total_size(), 3 + 6 + 11 + 13 + 1000);
    }

    #[test]
    fn from_entries_keeps_first_duplicate() {
        static FIRST: [u8; 1] = [1];
        static SECOND: [u8; 1] = [2];
        let entries: [(&'static str, &'static [u8]); 2] = [("x", &FIRST), ("x", &SECOND)];
        let registry = Registry::from_entries(&entries);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("x").unwrap().data(), &[1]);
    }

    #[test]
    fn embedded_registry_serves_generated_table() {
        let registry = Registry::embedded();
        assert_eq!(registry.len(), embedded::ENTRIES.len());
        for &(name, data) in embedded::ENTRIES {
            assert_eq!(registry.lookup(name).unwrap().data(), data);
        }
    }

    #[test]
    fn embedded_registry_is_built_once() {
        assert!(std::ptr::eq(Registry::embedded(), Registry::embedded()));
    }
}
