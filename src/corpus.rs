use std::{io, path::Path, time::Instant};

use crate::semantic::record_text;

/// Column holding the crime category
pub const CRIME_COLUMN: &str = "CrimeHead_Name";
/// Column holding the place of offence
pub const PLACE_COLUMN: &str = "Place of Offence";
/// Column holding the FIR year
pub const YEAR_COLUMN: &str = "FIR_YEAR";
/// Column holding the number of accused
pub const ACCUSED_COLUMN: &str = "Accused Count";

/// Default number of rows read from the corpus file
pub const DEFAULT_MAX_ROWS: usize = 1000;

const COLUMNS: [&str; 4] = [CRIME_COLUMN, PLACE_COLUMN, YEAR_COLUMN, ACCUSED_COLUMN];

#[derive(thiserror::Error, Debug)]
pub enum CorpusError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    IO(#[from] io::Error),

    #[error("corpus is missing column {0:?}")]
    MissingColumn(&'static str),
}

/// One historical case. Missing values are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub crime_type: String,
    pub place: String,
    pub year: String,
    pub accused_count: String,
    /// What gets embedded
    pub processed_text: String,
}

impl Record {
    pub fn new(
        crime_type: impl Into<String>,
        place: impl Into<String>,
        year: impl Into<String>,
        accused_count: impl Into<String>,
    ) -> Self {
        let crime_type = crime_type.into();
        let place = place.into();
        let processed_text = record_text(&crime_type, &place);

        Self {
            crime_type,
            place,
            year: year.into(),
            accused_count: accused_count.into(),
            processed_text,
        }
    }
}

/// Ordered, immutable set of records.
///
/// Position `i` here is row `i` in the vector index; nothing may reorder or
/// mutate records once the index is built.
#[derive(Debug, Clone, Default)]
pub struct CorpusStore {
    records: Vec<Record>,
}

impl CorpusStore {
    pub fn from_records(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Read up to `max_rows` records from a CSV file with a header row.
    pub fn load(path: impl AsRef<Path>, max_rows: usize) -> Result<Self, CorpusError> {
        let path = path.as_ref();
        let now = Instant::now();

        let file = std::fs::File::open(path)?;
        let corpus = Self::from_reader(file, max_rows)?;

        log::info!(
            "loaded {} records from {} in {}ms",
            corpus.len(),
            path.display(),
            now.elapsed().as_micros() as f64 / 1000.0
        );

        Ok(corpus)
    }

    /// Read up to `max_rows` records from CSV data.
    ///
    /// Columns are located by header name, so order and extra columns don't
    /// matter. Short rows fill the missing cells with `""`.
    pub fn from_reader<R: io::Read>(reader: R, max_rows: usize) -> Result<Self, CorpusError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let mut positions = [0usize; 4];
        for (slot, column) in positions.iter_mut().zip(COLUMNS) {
            *slot = headers
                .iter()
                .position(|h| h.trim() == column)
                .ok_or(CorpusError::MissingColumn(column))?;
        }
        let [crime, place, year, accused] = positions;

        let mut records = Vec::new();
        for row in csv_reader.records().take(max_rows) {
            let row = row?;
            let cell = |idx: usize| row.get(idx).unwrap_or_default().to_string();

            records.push(Record::new(
                cell(crime),
                cell(place),
                cell(year),
                cell(accused),
            ));
        }

        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Record> {
        self.records.get(position)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }
}
