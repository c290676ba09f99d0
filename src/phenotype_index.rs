use crate::error::{Error, Result};
use crate::phenotype_table::PhenotypeRow;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// How a participant's phenotype codes are collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Collection {
    /// Deduplicated, in the order first observed.
    #[default]
    List,
    /// Deduplicated and sorted.
    Set,
}

/// Sample id to phenotype codes, never mutated once built.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhenotypeIndex {
    samples: BTreeMap<String, Vec<String>>,
}

impl PhenotypeIndex {
    /// An index without any samples.
    pub fn new() -> Self {
        Self::default()
    }

    /// Groups `rows` by participant and collects each participant's distinct
    /// terms. Any row error is returned as is.
    pub fn build<I>(rows: I, collection: Collection) -> Result<Self>
    where
        I: IntoIterator<Item = Result<PhenotypeRow>>,
    {
        let mut samples: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut n_rows = 0;
        for row in rows {
            let row = row?;
            n_rows += 1;
            if row.participant_id.is_empty() || row.term_id.is_empty() {
                log::debug!("skipping phenotype row {} with an empty value", n_rows);
                continue;
            }
            let terms = samples.entry(row.participant_id).or_default();
            if !terms.contains(&row.term_id) {
                terms.push(row.term_id);
            }
        }

        if collection == Collection::Set {
            samples.values_mut().for_each(|terms| terms.sort());
        }

        log::info!(
            "built phenotype index of {} participants from {} rows",
            samples.len(),
            n_rows
        );
        Ok(Self { samples })
    }

    /// Builds an index from literal entries, deduplicating codes.
    pub fn from_entries<'a, I, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, T)>,
        T: IntoIterator<Item = &'a str>,
    {
        let mut samples: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (sample, terms) in entries {
            let codes = samples.entry(sample.to_owned()).or_default();
            for term in terms {
                if !codes.iter().any(|c| c == term) {
                    codes.push(term.to_owned());
                }
            }
        }
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn contains_sample(&self, sample: &str) -> bool {
        self.samples.contains_key(sample)
    }

    /// Phenotype codes of `sample`; empty when the sample is unknown.
    pub fn phenotypes(&self, sample: &str) -> &[String] {
        self.samples.get(sample).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_phenotype(&self, sample: &str, phenotype: &str) -> bool {
        self.phenotypes(sample).iter().any(|p| p == phenotype)
    }

    pub fn samples(&self) -> impl Iterator<Item = &str> {
        self.samples.keys().map(String::as_str)
    }

    /// Every distinct phenotype code in the index, sorted.
    pub fn all_phenotypes(&self) -> BTreeSet<&str> {
        self.samples
            .values()
            .flat_map(|terms| terms.iter().map(String::as_str))
            .collect()
    }

    /// Writes the index to `path` as JSON.
    ///
    /// Never overwrites: fails with `Error::Conflict` when `path` already
    /// exists.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        write_new(path, |writer| {
            serde_json::to_writer_pretty(writer, self).map_err(io::Error::from)
        })?;
        log::info!(
            "saved phenotype index of {} participants to {}",
            self.len(),
            path.display()
        );
        Ok(())
    }

    /// Reads an index previously written by `save`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::IndexNotFound {
            path: path.to_owned(),
            source: e,
        })?;
        let index: Self = serde_json::from_str(&content).map_err(|e| {
            Error::MalformedInput(format!("phenotype index `{}`: {}", path.display(), e))
        })?;
        log::debug!(
            "loaded phenotype index of {} participants from {}",
            index.len(),
            path.display()
        );
        Ok(index)
    }
}

/// Creates `path`, failing with `Error::Conflict` if it exists, and fills it
/// with `write`. A failed write removes the file again.
fn write_new<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => Error::Conflict(path.to_owned()),
            _ => Error::Io {
                path: path.to_owned(),
                source: e,
            },
        })?;

    let mut writer = BufWriter::new(file);
    let written = write(&mut writer).and_then(|_| writer.flush());
    if let Err(e) = written {
        drop(writer);
        if let Err(cleanup) = fs::remove_file(path) {
            log::warn!(
                "could not remove partial file {}: {}",
                path.display(),
                cleanup
            );
        }
        return Err(Error::Io {
            path: path.to_owned(),
            source: e,
        });
    }
    Ok(())
}

/// Equality ignores the order of each sample's phenotype codes.
impl PartialEq for PhenotypeIndex {
    fn eq(&self, other: &Self) -> bool {
        self.samples.len() == other.samples.len()
            && self.samples.iter().all(|(sample, terms)| {
                other.samples.get(sample).map_or(false, |o| {
                    terms.iter().collect::<HashSet<_>>() == o.iter().collect::<HashSet<_>>()
                })
            })
    }
}

impl Eq for PhenotypeIndex {}
