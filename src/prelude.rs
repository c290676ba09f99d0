pub use crate::allele_frequency::{
    compute, tally, AlleleMatrix, AncillaryResults, CohortAlleleFrequency,
};
pub use crate::error::{Error, Result};
pub use crate::gregor::GregorPlugin;
pub use crate::phenotype_index::{Collection, PhenotypeIndex};
pub use crate::phenotype_table::{PhenotypeRow, PhenotypeTableBuilder};
pub use crate::plugin::{CohortPlugin, Plugin, PluginOptions, SimplePlugin};
pub use crate::reader::{MemoryVariantReader, VariantReader};
pub use crate::registry::{PluginRegistry, PluginType};
pub use crate::{AlleleCount, AlleleIndex, Genotype, Region, VariantRecord};
