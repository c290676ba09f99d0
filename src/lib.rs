#![crate_name = "caf"]
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub mod prelude;

pub mod allele_frequency;
pub mod error;
pub mod gregor;
pub mod phenotype_index;
pub mod phenotype_table;
pub mod plugin;
pub mod reader;
pub mod registry;

pub use error::{Error, Result};

pub type AlleleCount = u32;

/// Allele number as it appears in a genotype call: 0 is the reference,
/// `k` the `k`-th alternate.
pub type AlleleIndex = u32;

pub type Genotypes = BTreeMap<String, Genotype>;

/// One sample's genotype call at one site.
///
/// Each slot is an allele number, or `None` for a no-call (`.` in a VCF `GT`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Genotype(Vec<Option<AlleleIndex>>);

impl Genotype {
    pub fn new(slots: Vec<Option<AlleleIndex>>) -> Self {
        Self(slots)
    }

    /// A fully called genotype.
    pub fn called(alleles: &[AlleleIndex]) -> Self {
        Self(alleles.iter().map(|a| Some(*a)).collect())
    }

    pub fn ploidy(&self) -> usize {
        self.0.len()
    }

    pub fn slots(&self) -> &[Option<AlleleIndex>] {
        &self.0
    }

    /// Number of slots carrying an allele call.
    pub fn n_called(&self) -> AlleleCount {
        self.0.iter().filter(|slot| slot.is_some()).count() as AlleleCount
    }

    /// Number of slots called as `allele`.
    pub fn n_matching(&self, allele: AlleleIndex) -> AlleleCount {
        self.0.iter().filter(|slot| **slot == Some(allele)).count() as AlleleCount
    }
}

impl FromStr for Genotype {
    type Err = Error;

    /// Parses a VCF style `GT` value such as `0/1`, `1|2`, `./.` or `1`.
    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(Self::default());
        }
        s.split(|c| c == '/' || c == '|')
            .map(|slot| match slot {
                "." => Ok(None),
                x => x
                    .parse::<AlleleIndex>()
                    .map(Some)
                    .map_err(|_| Error::MalformedInput(format!("invalid genotype call `{}`", s))),
            })
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }
}

impl fmt::Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots: Vec<String> = self
            .0
            .iter()
            .map(|slot| match slot {
                Some(a) => a.to_string(),
                None => ".".to_owned(),
            })
            .collect();
        write!(f, "{}", slots.join("/"))
    }
}

/// Copy number class of a contig.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// Mitochondrial or Y: one allele copy is the norm.
    Hemizygous,
    X,
    Autosomal,
}

impl Region {
    /// Classifies a contig name, with or without a `chr` prefix.
    pub fn of(contig: &str) -> Self {
        let name = contig.strip_prefix("chr").unwrap_or(contig);
        match name {
            "M" | "MT" | "Y" => Self::Hemizygous,
            "X" => Self::X,
            _ => Self::Autosomal,
        }
    }
}

/// A site read from a variant file.
///
/// Owned by whichever [`reader::VariantReader`] produced it, the core only
/// reads it.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantRecord {
    pub contig: String,
    /// 1-based.
    pub position: u64,
    pub reference: String,
    pub alternates: Vec<String>,
    /// Per-allele identifiers indexed by allele number, reference first.
    /// Alleles without an identifier hold `None`.
    pub allele_ids: Vec<Option<String>>,
    pub genotypes: Genotypes,
}

impl VariantRecord {
    pub fn new(contig: &str, position: u64, reference: &str, alternates: &[&str]) -> Self {
        Self {
            contig: contig.into(),
            position,
            reference: reference.into(),
            alternates: alternates.iter().map(|a| a.to_string()).collect(),
            allele_ids: vec![],
            genotypes: Genotypes::new(),
        }
    }

    pub fn with_allele_ids(mut self, ids: &[Option<&str>]) -> Self {
        self.allele_ids = ids.iter().map(|id| id.map(String::from)).collect();
        self
    }

    pub fn with_genotype(mut self, sample: &str, genotype: Genotype) -> Self {
        self.genotypes.insert(sample.into(), genotype);
        self
    }

    pub fn region(&self) -> Region {
        Region::of(&self.contig)
    }

    pub fn genotype(&self, sample: &str) -> Option<&Genotype> {
        self.genotypes.get(sample)
    }

    /// Allele number of the allele carrying `id`, if any.
    pub fn allele_index(&self, id: &str) -> Option<AlleleIndex> {
        self.allele_ids
            .iter()
            .position(|x| x.as_deref() == Some(id))
            .map(|i| i as AlleleIndex)
    }

    /// Names the site as `contig-position-ref-alts`.
    pub fn locus_name(&self) -> String {
        format!(
            "{}-{}-{}-{}",
            self.contig,
            self.position,
            self.reference,
            self.alternates.join(",")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::result::Result;

    #[test]
    fn test_genotype_parses_phased_unphased_and_missing() -> Result<(), Box<dyn Error>> {
        assert_eq!("0/1".parse::<Genotype>()?, Genotype::called(&[0, 1]));
        assert_eq!("1|2".parse::<Genotype>()?, Genotype::called(&[1, 2]));
        assert_eq!("./.".parse::<Genotype>()?, Genotype::new(vec![None, None]));
        assert_eq!("1".parse::<Genotype>()?, Genotype::called(&[1]));
        assert_eq!("".parse::<Genotype>()?.ploidy(), 0);
        Ok(())
    }

    #[test]
    fn test_genotype_rejects_garbage() {
        assert!(matches!(
            "0/x".parse::<Genotype>(),
            Err(crate::Error::MalformedInput(_))
        ));
    }

    #[test]
    fn test_genotype_counts_ignore_no_calls() -> Result<(), Box<dyn Error>> {
        let gt: Genotype = "1/.".parse()?;
        assert_eq!(gt.n_called(), 1);
        assert_eq!(gt.n_matching(1), 1);
        assert_eq!(gt.n_matching(0), 0);
        assert_eq!(gt.to_string(), "1/.");
        Ok(())
    }

    #[test]
    fn test_region_classification() {
        assert_eq!(Region::of("chrM"), Region::Hemizygous);
        assert_eq!(Region::of("MT"), Region::Hemizygous);
        assert_eq!(Region::of("chrY"), Region::Hemizygous);
        assert_eq!(Region::of("X"), Region::X);
        assert_eq!(Region::of("chrX"), Region::X);
        assert_eq!(Region::of("chr3"), Region::Autosomal);
        assert_eq!(Region::of("chrXY_random"), Region::Autosomal);
    }

    #[test]
    fn test_record_allele_index_counts_reference_first() {
        let record = VariantRecord::new("chr1", 20094, "TAA", &["T", "TA"])
            .with_allele_ids(&[Some("ref"), Some("alt1"), None]);
        assert_eq!(record.allele_index("ref"), Some(0));
        assert_eq!(record.allele_index("alt1"), Some(1));
        assert_eq!(record.allele_index("alt2"), None);
        assert_eq!(record.locus_name(), "chr1-20094-TAA-T,TA");
    }
}
