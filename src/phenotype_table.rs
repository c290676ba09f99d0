use crate::error::{Error, Result};
use csv;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// One observation of a phenotype term for a participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhenotypeRow {
    pub participant_id: String,
    pub term_id: String,
}

impl PhenotypeRow {
    pub fn new(participant_id: &str, term_id: &str) -> Self {
        Self {
            participant_id: participant_id.into(),
            term_id: term_id.into(),
        }
    }
}

/// Column positions resolved from the header.
#[derive(Clone, Copy)]
struct Columns {
    participant: usize,
    term: usize,
    presence: Option<usize>,
}

/// Produces `PhenotypeRow`s from delimited data
///
/// `PhenotypeRows` implements Iterator so it can be passed
/// directly to `PhenotypeIndex::build()`
pub struct PhenotypeRows {
    records: std::iter::Enumerate<csv::StringRecordsIntoIter<Box<dyn Read>>>,
    columns: Columns,
    presence_identifier: String,
}

impl Iterator for PhenotypeRows {
    type Item = Result<PhenotypeRow>;

    fn next(&mut self) -> Option<Result<PhenotypeRow>> {
        loop {
            let (idx, record) = self.records.next()?;
            let row = match record {
                Ok(row) => row,
                Err(e) => {
                    return Some(Err(Error::MalformedInput(format!(
                        "phenotype table row {}: {}",
                        idx + 1,
                        e
                    ))))
                }
            };

            if let Some(presence) = self.columns.presence {
                let mark = row.get(presence).map(str::trim);
                if mark != Some(self.presence_identifier.as_str()) {
                    log::debug!("phenotype row {}: term not marked present", idx + 1);
                    continue;
                }
            }

            let field = |i: usize, name: &str| {
                row.get(i).map(str::trim).ok_or_else(|| {
                    let msg = format!("phenotype table row {} has no {}", idx + 1, name);
                    Error::MalformedInput(msg)
                })
            };
            let participant_id = match field(self.columns.participant, "participant id") {
                Ok(x) => x,
                Err(e) => return Some(Err(e)),
            };
            let term_id = match field(self.columns.term, "term id") {
                Ok(x) => x,
                Err(e) => return Some(Err(e)),
            };

            return Some(Ok(PhenotypeRow::new(participant_id, term_id)));
        }
    }
}

#[derive(Clone)]
pub struct PhenotypeTableBuilder {
    delimiter: u8,
    participant_field: String,
    term_field: String,
    presence_field: Option<String>,
    presence_identifier: String,
}

impl Default for PhenotypeTableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PhenotypeTableBuilder {
    /// Construct a new phenotype table builder
    ///
    /// Defaults to comma separated data with the GREGoR column
    /// names `participant_id` and `term_id`.
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            participant_field: "participant_id".to_owned(),
            term_field: "term_id".to_owned(),
            presence_field: None,
            presence_identifier: "Present".to_owned(),
        }
    }

    pub fn delimiter(&mut self, delimiter: u8) -> &mut Self {
        self.delimiter = delimiter;
        self
    }

    pub fn participant_field(&mut self, participant_field: &str) -> &mut Self {
        self.participant_field = participant_field.to_owned();
        self
    }

    pub fn term_field(&mut self, term_field: &str) -> &mut Self {
        self.term_field = term_field.to_owned();
        self
    }

    /// Only keep rows whose `presence_field` equals `presence_identifier`.
    pub fn presence_field(&mut self, presence_field: &str, presence_identifier: &str) -> &mut Self {
        self.presence_field = Some(presence_field.to_owned());
        self.presence_identifier = presence_identifier.to_owned();
        self
    }

    pub fn from_reader(&self, reader: Box<dyn Read>) -> Result<PhenotypeRows> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| Error::MalformedInput(format!("phenotype table header: {}", e)))?
            .clone();
        let position = |name: &str| {
            headers.iter().position(|h| h.trim() == name).ok_or_else(|| {
                Error::MalformedInput(format!("phenotype table has no `{}` column", name))
            })
        };

        let columns = Columns {
            participant: position(&self.participant_field)?,
            term: position(&self.term_field)?,
            presence: match &self.presence_field {
                Some(name) => Some(position(name)?),
                None => None,
            },
        };

        Ok(PhenotypeRows {
            records: rdr.into_records().enumerate(),
            columns,
            presence_identifier: self.presence_identifier.clone(),
        })
    }

    /// Opens a table on disk. Files ending in `.tsv` are read tab separated
    /// regardless of the configured delimiter.
    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Result<PhenotypeRows> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            let msg = format!("cannot read phenotype table `{}`: {}", path.display(), e);
            Error::MalformedInput(msg)
        })?;

        if path.extension().map_or(false, |ext| ext == "tsv") {
            let mut builder = self.clone();
            builder.delimiter(b'\t');
            return builder.from_reader(Box::new(file));
        }
        self.from_reader(Box::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::io::Write;
    use std::result::Result;

    fn rows(
        builder: &PhenotypeTableBuilder,
        data: &'static str,
    ) -> crate::Result<Vec<PhenotypeRow>> {
        builder.from_reader(Box::new(data.as_bytes()))?.collect()
    }

    #[test]
    fn test_table_yields_rows_in_order() -> Result<(), Box<dyn Error>> {
        let table = rows(
            &PhenotypeTableBuilder::new(),
            "participant_id,term_id\ns1,HP:01\ns1,HP:02\ns2,HP:03\n",
        )?;
        assert_eq!(
            table,
            vec![
                PhenotypeRow::new("s1", "HP:01"),
                PhenotypeRow::new("s1", "HP:02"),
                PhenotypeRow::new("s2", "HP:03"),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_table_finds_columns_anywhere_in_header() -> Result<(), Box<dyn Error>> {
        let table = rows(
            PhenotypeTableBuilder::new().delimiter(b'\t'),
            "phenotype_id\tterm_id\tpresence\tparticipant_id\nph1\tHP:9\tPresent\tp7\n",
        )?;
        assert_eq!(table, vec![PhenotypeRow::new("p7", "HP:9")]);
        Ok(())
    }

    #[test]
    fn test_table_missing_column_is_malformed() {
        let result = PhenotypeTableBuilder::new()
            .from_reader(Box::new("participant_id,ontology\ns1,HP:01\n".as_bytes()));
        match result {
            Err(crate::Error::MalformedInput(msg)) => assert!(msg.contains("term_id")),
            _ => panic!("expected malformed input"),
        }
    }

    #[test]
    fn test_table_presence_filter_drops_absent_terms() -> Result<(), Box<dyn Error>> {
        let table = rows(
            PhenotypeTableBuilder::new().presence_field("presence", "Present"),
            "participant_id,term_id,presence\n\
             s1,HP:01,Present\n\
             s1,HP:02,Absent\n\
             s2,HP:03,Present\n",
        )?;
        assert_eq!(
            table,
            vec![
                PhenotypeRow::new("s1", "HP:01"),
                PhenotypeRow::new("s2", "HP:03"),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_table_presence_ignores_padding() -> Result<(), Box<dyn Error>> {
        let table = rows(
            PhenotypeTableBuilder::new()
                .delimiter(b'\t')
                .presence_field("presence", "Present"),
            "participant_id\tterm_id\tpresence\n\
             s1\tHP:01\t Present\n\
             s1\tHP:02\tPresent \n\
             s2\tHP:03\t Absent\n",
        )?;
        assert_eq!(
            table,
            vec![
                PhenotypeRow::new("s1", "HP:01"),
                PhenotypeRow::new("s1", "HP:02"),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_table_custom_column_names() -> Result<(), Box<dyn Error>> {
        let table = rows(
            PhenotypeTableBuilder::new()
                .participant_field("sample")
                .term_field("hpo"),
            "sample,hpo\na,HP:1\n",
        )?;
        assert_eq!(table, vec![PhenotypeRow::new("a", "HP:1")]);
        Ok(())
    }

    #[test]
    fn test_table_from_tsv_path() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("phenotypes.tsv");
        let mut file = std::fs::File::create(&path)?;
        writeln!(file, "participant_id\tterm_id")?;
        writeln!(file, "s1\tHP:01")?;
        drop(file);

        let table: Vec<PhenotypeRow> = PhenotypeTableBuilder::new()
            .from_path(&path)?
            .collect::<crate::Result<_>>()?;
        assert_eq!(table, vec![PhenotypeRow::new("s1", "HP:01")]);
        Ok(())
    }

    #[test]
    fn test_table_missing_path_is_malformed() {
        let result = PhenotypeTableBuilder::new().from_path("/nonexistent/phenotypes.csv");
        assert!(matches!(result, Err(crate::Error::MalformedInput(_))));
    }
}
