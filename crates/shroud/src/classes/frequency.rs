//! Sensitive-value frequency tables.

/// Counts of sensitive value codes within one equivalence class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    /// `(value code, count)` sorted by code, counts non-zero.
    entries: Vec<(u32, usize)>,
    total: usize,
}

impl FrequencyTable {
    /// Build a table from `(code, count)` pairs sorted by code.
    pub fn new(entries: Vec<(u32, usize)>) -> Self {
        debug_assert!(entries.windows(2).all(|w| w[0].0 < w[1].0));
        let total = entries.iter().map(|&(_, count)| count).sum();
        Self { entries, total }
    }

    /// Build a table by counting codes.
    pub fn from_codes(codes: impl IntoIterator<Item = u32>) -> Self {
        let mut codes: Vec<u32> = codes.into_iter().collect();
        codes.sort_unstable();
        let entries = codes
            .chunk_by(|a, b| a == b)
            .map(|run| (run[0], run.len()))
            .collect();
        Self::new(entries)
    }

    /// Number of records counted.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of distinct values.
    pub fn distinct(&self) -> usize {
        self.entries.len()
    }

    /// `(code, count)` pairs in code order.
    pub fn entries(&self) -> &[(u32, usize)] {
        &self.entries
    }

    /// Count of one value code.
    pub fn count(&self, code: u32) -> usize {
        self.entries
            .binary_search_by_key(&code, |&(c, _)| c)
            .map(|i| self.entries[i].1)
            .unwrap_or(0)
    }

    /// Shannon entropy in nats; zero for classes with at most one value.
    pub fn entropy(&self) -> f64 {
        if self.entries.len() <= 1 {
            return 0.0;
        }
        let total = self.total as f64;
        // H = ln(N) - (1/N) Σ c·ln(c), which avoids summing tiny ratios.
        let weighted: f64 = self
            .entries
            .iter()
            .map(|&(_, count)| {
                let c = count as f64;
                c * c.ln()
            })
            .sum();
        (total.ln() - weighted / total).max(0.0)
    }

    /// Counts sorted from most to least frequent.
    pub fn counts_descending(&self) -> Vec<usize> {
        let mut counts: Vec<usize> = self.entries.iter().map(|&(_, count)| count).collect();
        counts.sort_unstable_by(|a, b| b.cmp(a));
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_codes_counts() {
        let table = FrequencyTable::from_codes([3, 1, 3, 3, 0]);
        assert_eq!(table.entries(), &[(0, 1), (1, 1), (3, 3)]);
        assert_eq!(table.total(), 5);
        assert_eq!(table.distinct(), 3);
        assert_eq!(table.count(3), 3);
        assert_eq!(table.count(2), 0);
        assert_eq!(table.counts_descending(), vec![3, 1, 1]);
    }

    #[test]
    fn test_entropy_limits() {
        assert_eq!(FrequencyTable::from_codes([7, 7, 7]).entropy(), 0.0);
        assert_eq!(FrequencyTable::from_codes([]).entropy(), 0.0);

        let uniform = FrequencyTable::from_codes([0, 1, 2, 3]);
        assert!((uniform.entropy() - 4f64.ln()).abs() < 1e-12);

        let skewed = FrequencyTable::from_codes([0, 0, 0, 1]);
        let expected = -(0.75f64 * 0.75f64.ln() + 0.25 * 0.25f64.ln());
        assert!((skewed.entropy() - expected).abs() < 1e-12);
    }
}
