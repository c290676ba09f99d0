use crate::error::{Error, Result};
use crate::plugin::CohortPlugin;
use crate::reader::VariantReader;
use crate::{AlleleCount, AlleleIndex, VariantRecord};
use ndarray;
use serde::{Deserialize, Serialize};

/// Value of the `type` field of every result.
pub const COHORT_ALLELE_FREQUENCY: &str = "CohortAlleleFrequency";

const FOCUS: usize = 0;
const LOCUS: usize = 1;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AncillaryResults {
    /// Phenotype codes the computation was restricted to.
    pub phenotypes: Vec<String>,
}

/// The frequency of one allele across a cohort.
///
/// Serializes as `{"type", "focusAllele", "focusAlleleCount",
/// "locusAlleleCount", "alleleFrequency", "ancillaryResults": {"phenotypes"}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortAlleleFrequency {
    #[serde(rename = "type")]
    pub kind: String,
    pub focus_allele: String,
    pub focus_allele_count: AlleleCount,
    pub locus_allele_count: AlleleCount,
    pub allele_frequency: f64,
    pub ancillary_results: AncillaryResults,
}

impl CohortAlleleFrequency {
    /// Fails with `Error::UndefinedFrequency` when `locus_allele_count` is 0.
    pub fn new(
        focus_allele: &str,
        focus_allele_count: AlleleCount,
        locus_allele_count: AlleleCount,
        phenotypes: Vec<String>,
    ) -> Result<Self> {
        if locus_allele_count == 0 {
            return Err(Error::UndefinedFrequency(focus_allele.to_owned()));
        }
        Ok(Self {
            kind: COHORT_ALLELE_FREQUENCY.to_owned(),
            focus_allele: focus_allele.to_owned(),
            focus_allele_count,
            locus_allele_count,
            allele_frequency: focus_allele_count as f64 / locus_allele_count as f64,
            ancillary_results: AncillaryResults { phenotypes },
        })
    }
}

/// Focus and locus allele counts of each included sample.
///
/// One row per sample; column 0 holds the focus count, column 1 the locus
/// count.
pub struct AlleleMatrix {
    samples: Vec<String>,
    data: ndarray::Array2<AlleleCount>,
}

impl AlleleMatrix {
    pub fn from_counts(counts: Vec<(String, AlleleCount, AlleleCount)>) -> Self {
        let mut data = ndarray::Array2::<AlleleCount>::zeros((counts.len(), 2));
        let mut samples = Vec::with_capacity(counts.len());
        for (mut row, (sample, focus, locus)) in data.outer_iter_mut().zip(counts) {
            row[FOCUS] = focus;
            row[LOCUS] = locus;
            samples.push(sample);
        }
        Self { samples, data }
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn sample_counts(&self, sample: &str) -> Option<(AlleleCount, AlleleCount)> {
        self.samples
            .iter()
            .position(|s| s == sample)
            .map(|i| (self.data[[i, FOCUS]], self.data[[i, LOCUS]]))
    }

    /// Summed focus and locus counts over all samples.
    pub fn totals(&self) -> (AlleleCount, AlleleCount) {
        let sums = self.data.sum_axis(ndarray::Axis(0));
        (sums[FOCUS], sums[LOCUS])
    }

    /// Per-sample focus allele fraction, `NaN` for samples without a
    /// called allele.
    pub fn frequency(&self) -> ndarray::Array1<f64> {
        self.data
            .outer_iter()
            .map(|row| row[FOCUS] as f64 / row[LOCUS] as f64)
            .collect()
    }
}

/// Asks `plugin` which samples of `record` to include and what each
/// contributes.
pub fn tally<P>(
    record: &VariantRecord,
    alt_index: AlleleIndex,
    plugin: &P,
    phenotype: Option<&str>,
) -> AlleleMatrix
where
    P: CohortPlugin + ?Sized,
{
    let counts = record
        .genotypes
        .keys()
        .filter(|sample| {
            let included = plugin.include_sample(sample, record, phenotype);
            if !included {
                log::debug!("{}: excluding sample {}", record.locus_name(), sample);
            }
            included
        })
        .map(|sample| {
            let (focus, locus) = plugin.count_sample_alleles(sample, record, alt_index);
            debug_assert!(
                focus <= locus,
                "sample {} counted {} focus alleles out of {}",
                sample,
                focus,
                locus
            );
            (sample.clone(), focus, locus)
        })
        .collect();
    AlleleMatrix::from_counts(counts)
}

/// Computes the cohort allele frequency of `focus_allele`.
///
/// The allele is resolved through `reader`, then every sample of its record
/// is offered to `plugin` for inclusion and counting. With a `phenotype`,
/// the plugin restricts the cohort to that phenotype and the result lists it
/// in its ancillary results.
pub fn compute<R, P>(
    focus_allele: &str,
    reader: &mut R,
    plugin: &P,
    phenotype: Option<&str>,
) -> Result<CohortAlleleFrequency>
where
    R: VariantReader + ?Sized,
    P: CohortPlugin + ?Sized,
{
    let (record, alt_index) = reader.resolve(focus_allele)?;
    let matrix = tally(&record, alt_index, plugin, phenotype);
    let (focus, locus) = matrix.totals();
    debug_assert!(focus <= locus);

    log::info!(
        "{} ({}): {}/{} alleles over {} of {} samples",
        focus_allele,
        record.locus_name(),
        focus,
        locus,
        matrix.n_samples(),
        record.genotypes.len()
    );

    let phenotypes = phenotype.map(|p| vec![p.to_owned()]).unwrap_or_default();
    CohortAlleleFrequency::new(focus_allele, focus, locus, phenotypes)
}
