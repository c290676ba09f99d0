use crate::error::{Error, Result};
use crate::{AlleleIndex, VariantRecord};

/// A stateful cursor over variant storage. Taken by `&mut`, so concurrent
/// computations each need their own reader.
pub trait VariantReader {
    /// Records overlapping the 0-based half-open interval `[start, end)` on
    /// `contig`.
    fn fetch(&mut self, contig: &str, start: u64, end: u64) -> Result<Vec<VariantRecord>>;

    /// The record carrying the allele identified by `variant_id`, along with
    /// that allele's number in genotype calls.
    ///
    /// Fails with `Error::VariantNotFound` when no record carries it.
    fn resolve(&mut self, variant_id: &str) -> Result<(VariantRecord, AlleleIndex)>;
}

/// A reader over records held in memory, sorted by contig and position.
#[derive(Debug, Clone, Default)]
pub struct MemoryVariantReader {
    records: Vec<VariantRecord>,
}

impl MemoryVariantReader {
    pub fn new(mut records: Vec<VariantRecord>) -> Self {
        records.sort_by(|a, b| (&a.contig, a.position).cmp(&(&b.contig, b.position)));
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl VariantReader for MemoryVariantReader {
    fn fetch(&mut self, contig: &str, start: u64, end: u64) -> Result<Vec<VariantRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.contig == contig)
            // 1-based position p sits at 0-based p - 1
            .filter(|r| r.position > start && r.position <= end)
            .cloned()
            .collect())
    }

    fn resolve(&mut self, variant_id: &str) -> Result<(VariantRecord, AlleleIndex)> {
        self.records
            .iter()
            .find_map(|r| r.allele_index(variant_id).map(|i| (r.clone(), i)))
            .ok_or_else(|| Error::VariantNotFound(variant_id.to_owned()))
    }
}

impl std::iter::FromIterator<VariantRecord> for MemoryVariantReader {
    fn from_iter<I: IntoIterator<Item = VariantRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
