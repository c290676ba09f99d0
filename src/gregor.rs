use crate::error::Result;
use crate::phenotype_index::PhenotypeIndex;
use crate::plugin::{CohortPlugin, Plugin, PluginOptions, SimplePlugin};
use crate::registry::PluginRegistry;
use crate::{AlleleCount, AlleleIndex, Region, VariantRecord};
use std::sync::Arc;

/// Plugin for GREGoR consortium releases.
///
/// Inclusion follows [`SimplePlugin`]; counting corrects the recorded ploidy
/// by region.
#[derive(Debug, Clone, Default)]
pub struct GregorPlugin {
    simple: SimplePlugin,
}

impl GregorPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_index(index: Arc<PhenotypeIndex>) -> Self {
        Self {
            simple: SimplePlugin::with_index(index),
        }
    }
}

impl CohortPlugin for GregorPlugin {
    fn phenotype_index(&self) -> &PhenotypeIndex {
        self.simple.phenotype_index()
    }

    fn include_sample(
        &self,
        sample_id: &str,
        record: &VariantRecord,
        phenotype: Option<&str>,
    ) -> bool {
        self.simple.include_sample(sample_id, record, phenotype)
    }

    fn count_sample_alleles(
        &self,
        sample_id: &str,
        record: &VariantRecord,
        alt_index: AlleleIndex,
    ) -> (AlleleCount, AlleleCount) {
        let (focus, called) = self.simple.count_sample_alleles(sample_id, record, alt_index);
        if called == 0 {
            return (0, 0);
        }

        match record.region() {
            Region::Hemizygous => (focus.min(1), 1),
            // TODO: count male participants as haploid once participant sex
            // is available alongside the phenotype index.
            Region::X => (focus.min(2), 2),
            Region::Autosomal => (focus, called),
        }
    }
}

impl Plugin for GregorPlugin {
    const NAME: &'static str = "GregorPlugin";

    fn from_options(options: &PluginOptions) -> Result<Self> {
        Ok(Self::with_index(options.resolve_index()?))
    }
}

pub fn register(registry: &mut PluginRegistry) {
    registry.register::<GregorPlugin>();
}
