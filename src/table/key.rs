//! Four-field composite key and its comparator.
//!
//! The same comparator orders rows for sorting and compares a query against
//! a row during search. Which row offsets form the key is an explicit
//! [`KeyLayout`] instead of positions baked into the comparison.

use std::cmp::Ordering;

/// Row offsets of the four key fields, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyLayout(pub [usize; 4]);

impl KeyLayout {
    /// Directory rows: `(name, class, session, term)` at offsets `(3, 4, 0, 1)`.
    pub const DIRECTORY: Self = Self([3, 4, 0, 1]);
}

/// An uppercased 4-tuple drawn from a row or built from user input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeKey([String; 4]);

impl CompositeKey {
    /// Build a query key. Fields are trimmed and uppercased.
    pub fn new(
        first: impl AsRef<str>,
        second: impl AsRef<str>,
        third: impl AsRef<str>,
        fourth: impl AsRef<str>,
    ) -> Self {
        Self([
            normalize(first.as_ref()),
            normalize(second.as_ref()),
            normalize(third.as_ref()),
            normalize(fourth.as_ref()),
        ])
    }

    /// Read the key out of `row`. Offsets past the end of a short row read as `""`.
    pub fn from_row(row: &[String], layout: KeyLayout) -> Self {
        Self(layout.0.map(|i| {
            row.get(i)
                .map(String::as_str)
                .map(normalize)
                .unwrap_or_default()
        }))
    }

    pub fn fields(&self) -> &[String; 4] {
        &self.0
    }
}

impl Ord for CompositeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(self, other)
    }
}

impl PartialOrd for CompositeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Lexicographic comparison: field 1, then 2, then 3, then 4.
pub fn compare(a: &CompositeKey, b: &CompositeKey) -> Ordering {
    a.0.iter()
        .zip(b.0.iter())
        .map(|(x, y)| x.cmp(y))
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Compare the keys of two rows under `layout`.
pub fn compare_rows(a: &[String], b: &[String], layout: KeyLayout) -> Ordering {
    compare(
        &CompositeKey::from_row(a, layout),
        &CompositeKey::from_row(b, layout),
    )
}

/// Trim and uppercase one key field.
pub fn normalize(field: &str) -> String {
    field.trim().to_uppercase()
}
