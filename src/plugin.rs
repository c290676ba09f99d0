use crate::error::Result;
use crate::phenotype_index::{Collection, PhenotypeIndex};
use crate::phenotype_table::PhenotypeTableBuilder;
use crate::registry::PluginRegistry;
use crate::{AlleleCount, AlleleIndex, VariantRecord};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub trait CohortPlugin: Send + Sync {
    /// The index this plugin was constructed with, empty if none was given.
    fn phenotype_index(&self) -> &PhenotypeIndex;

    /// Whether `sample_id` takes part in the allele counts for `record`,
    /// optionally restricted to samples with `phenotype`.
    fn include_sample(
        &self,
        sample_id: &str,
        record: &VariantRecord,
        phenotype: Option<&str>,
    ) -> bool;

    /// Focus and locus allele counts contributed by one sample.
    fn count_sample_alleles(
        &self,
        sample_id: &str,
        record: &VariantRecord,
        alt_index: AlleleIndex,
    ) -> (AlleleCount, AlleleCount);
}

/// A `CohortPlugin` that can be registered by name.
///
/// Implementing this trait is what marks a type as a plugin for
/// [`PluginRegistry`].
pub trait Plugin: CohortPlugin + Sized + 'static {
    const NAME: &'static str;

    fn from_options(options: &PluginOptions) -> Result<Self>;
}

/// Where a plugin gets its phenotype index from.
///
/// Sources are tried in order: a shared `phenotype_index`, a persisted
/// `index_path`, a `phenotype_table` to build from. With none of them the
/// plugin runs with an empty index.
#[derive(Clone, Default)]
pub struct PluginOptions {
    phenotype_index: Option<Arc<PhenotypeIndex>>,
    index_path: Option<PathBuf>,
    phenotype_table: Option<PathBuf>,
    table: PhenotypeTableBuilder,
    collection: Collection,
}

impl PluginOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phenotype_index(&mut self, index: Arc<PhenotypeIndex>) -> &mut Self {
        self.phenotype_index = Some(index);
        self
    }

    pub fn index_path<P: AsRef<Path>>(&mut self, path: P) -> &mut Self {
        self.index_path = Some(path.as_ref().to_owned());
        self
    }

    pub fn phenotype_table<P: AsRef<Path>>(&mut self, path: P) -> &mut Self {
        self.phenotype_table = Some(path.as_ref().to_owned());
        self
    }

    /// Settings used to read `phenotype_table`.
    pub fn table(&mut self, table: PhenotypeTableBuilder) -> &mut Self {
        self.table = table;
        self
    }

    pub fn collection(&mut self, collection: Collection) -> &mut Self {
        self.collection = collection;
        self
    }

    pub fn resolve_index(&self) -> Result<Arc<PhenotypeIndex>> {
        if let Some(index) = &self.phenotype_index {
            return Ok(Arc::clone(index));
        }
        if let Some(path) = &self.index_path {
            return PhenotypeIndex::load(path).map(Arc::new);
        }
        if let Some(path) = &self.phenotype_table {
            let rows = self.table.from_path(path)?;
            return PhenotypeIndex::build(rows, self.collection).map(Arc::new);
        }
        Ok(Arc::new(PhenotypeIndex::new()))
    }
}

/// Counts alleles as recorded and filters on phenotype membership.
#[derive(Debug, Clone, Default)]
pub struct SimplePlugin {
    index: Arc<PhenotypeIndex>,
}

impl SimplePlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_index(index: Arc<PhenotypeIndex>) -> Self {
        Self { index }
    }
}

impl CohortPlugin for SimplePlugin {
    fn phenotype_index(&self) -> &PhenotypeIndex {
        &self.index
    }

    /// Without a phenotype every sample is included. With one, only samples
    /// the index lists with that phenotype are.
    fn include_sample(
        &self,
        sample_id: &str,
        _record: &VariantRecord,
        phenotype: Option<&str>,
    ) -> bool {
        match phenotype {
            None => true,
            Some(p) => self.index.has_phenotype(sample_id, p),
        }
    }

    /// Every called slot counts toward the locus, slots called as
    /// `alt_index` toward the focus. No-calls count toward neither.
    fn count_sample_alleles(
        &self,
        sample_id: &str,
        record: &VariantRecord,
        alt_index: AlleleIndex,
    ) -> (AlleleCount, AlleleCount) {
        match record.genotype(sample_id) {
            Some(genotype) => (genotype.n_matching(alt_index), genotype.n_called()),
            None => (0, 0),
        }
    }
}

impl Plugin for SimplePlugin {
    const NAME: &'static str = "SimplePlugin";

    fn from_options(options: &PluginOptions) -> Result<Self> {
        Ok(Self::with_index(options.resolve_index()?))
    }
}

pub fn register(registry: &mut PluginRegistry) {
    registry.register::<SimplePlugin>();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Genotype;
    use std::error::Error;
    use std::result::Result;

    fn record() -> VariantRecord {
        VariantRecord::new("chr1", 100, "A", &["C", "G"])
            .with_genotype("s1", Genotype::called(&[1, 2]))
            .with_genotype("s2", Genotype::called(&[2, 2, 2]))
            .with_genotype("s3", Genotype::new(vec![Some(2), None]))
            .with_genotype("s4", Genotype::called(&[]))
    }

    fn index() -> Arc<PhenotypeIndex> {
        Arc::new(PhenotypeIndex::from_entries(vec![
            ("s1", vec!["HP:01", "HP:02"]),
            ("s2", vec!["HP:03"]),
        ]))
    }

    #[test]
    fn test_phenotype_index_defaults_to_empty() {
        assert!(SimplePlugin::new().phenotype_index().is_empty());
        assert_eq!(SimplePlugin::with_index(index()).phenotype_index().len(), 2);
    }

    #[test]
    fn test_no_filter_includes_everyone() {
        let plugin = SimplePlugin::with_index(index());
        for sample in &["s1", "s2", "unindexed"] {
            assert!(plugin.include_sample(sample, &record(), None));
        }
    }

    #[test]
    fn test_filter_requires_phenotype_membership() {
        let plugin = SimplePlugin::with_index(index());
        let record = record();
        assert!(plugin.include_sample("s1", &record, Some("HP:01")));
        assert!(!plugin.include_sample("s2", &record, Some("HP:01")));
        assert!(!plugin.include_sample("unindexed", &record, Some("HP:01")));
        let empty = SimplePlugin::new();
        assert!(!empty.include_sample("s1", &record, Some("HP:01")));
    }

    #[test]
    fn test_counts_follow_recorded_ploidy() {
        let plugin = SimplePlugin::new();
        let record = record();
        assert_eq!(plugin.count_sample_alleles("s1", &record, 2), (1, 2));
        assert_eq!(plugin.count_sample_alleles("s1", &record, 1), (1, 2));
        assert_eq!(plugin.count_sample_alleles("s2", &record, 2), (3, 3));
        assert_eq!(plugin.count_sample_alleles("s3", &record, 2), (1, 1));
        assert_eq!(plugin.count_sample_alleles("s4", &record, 2), (0, 0));
        assert_eq!(plugin.count_sample_alleles("missing", &record, 2), (0, 0));
    }

    #[test]
    fn test_options_prefer_shared_index_then_path() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("index.json");
        PhenotypeIndex::from_entries(vec![("p", vec!["HP:9"])]).save(&path)?;

        let shared = index();
        let from_shared = PluginOptions::new()
            .phenotype_index(Arc::clone(&shared))
            .index_path(&path)
            .resolve_index()?;
        assert!(Arc::ptr_eq(&shared, &from_shared));

        let from_path = PluginOptions::new().index_path(&path).resolve_index()?;
        assert!(from_path.has_phenotype("p", "HP:9"));

        assert!(PluginOptions::new().resolve_index()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_options_build_from_table() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("phenotypes.csv");
        std::fs::write(&path, "participant_id,term_id\ns1,HP:02\ns1,HP:01\n")?;

        let index = PluginOptions::new()
            .phenotype_table(&path)
            .collection(Collection::Set)
            .resolve_index()?;
        assert_eq!(index.phenotypes("s1"), ["HP:01", "HP:02"]);
        Ok(())
    }
}
