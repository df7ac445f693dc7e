//! Interning of attribute values to dense integer codes.

use indexmap::IndexSet;

/// Maps each distinct string to a `u32` code in first-seen order.
///
/// Equivalence-class keys are built from these codes, so grouping never
/// hashes strings during the search.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    values: IndexSet<String>,
}

impl Dictionary {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Code for `value`, assigning the next code if it is new.
    pub fn intern(&mut self, value: &str) -> u32 {
        match self.values.get_index_of(value) {
            Some(index) => index as u32,
            None => self.values.insert_full(value.to_string()).0 as u32,
        }
    }

    /// Code for `value` if it has been interned.
    pub fn code(&self, value: &str) -> Option<u32> {
        self.values.get_index_of(value).map(|i| i as u32)
    }

    /// Value for a code produced by this dictionary.
    pub fn value(&self, code: u32) -> &str {
        &self.values[code as usize]
    }

    /// Number of distinct values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values in code order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(String::as_str)
    }
}
