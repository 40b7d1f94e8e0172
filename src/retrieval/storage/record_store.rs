//! Corpus records loaded from CSV files, aligned with the precomputed embeddings.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ndarray::Array2;
use serde::Deserialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::retrieval::core::errors::{StartupError, StartupResult};
use crate::retrieval::core::record::Record;

/// Cell values the corpus tooling reads as missing rather than as text.
const MISSING_MARKERS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Debug, Deserialize)]
struct CorpusRow {
    #[serde(rename = "Chapter_Number", default)]
    chapter_number: Option<String>,
    #[serde(rename = "Hadith_number", default)]
    hadith_number: Option<String>,
    #[serde(rename = "English_Hadith")]
    english_hadith: Option<String>,
    #[serde(rename = "Arabic_Hadith")]
    arabic_hadith: Option<String>,
    #[serde(rename = "English_Isnad", default)]
    english_isnad: Option<String>,
    #[serde(rename = "English_Matn", default)]
    english_matn: Option<String>,
    #[serde(rename = "English_Grade", default)]
    english_grade: Option<String>,
}

fn present(cell: Option<&str>) -> Option<&str> {
    cell.filter(|value| !MISSING_MARKERS.contains(value))
}

fn text_cell(cell: Option<String>) -> String {
    match cell {
        Some(value) if present(Some(value.as_str())).is_some() => value,
        _ => String::new(),
    }
}

fn has_text(cell: Option<&String>) -> bool {
    present(cell.map(String::as_str)).is_some_and(|value| !value.trim().is_empty())
}

/// Blank cells yield `None`; the row stays so positions keep matching the embeddings.
fn parse_sequence_number(
    raw: Option<&str>,
    file: &Path,
    line: usize,
) -> StartupResult<Option<i64>> {
    let Some(value) = present(raw.map(str::trim)) else {
        warn!(file = %file.display(), line, "row has no Hadith_number");
        return Ok(None);
    };

    if let Ok(number) = value.parse::<i64>() {
        return Ok(Some(number));
    }
    // Spreadsheet exports write integer columns as `12.0`.
    match value.parse::<f64>() {
        #[allow(clippy::cast_possible_truncation)]
        Ok(number) if number.fract() == 0.0 && number.abs() < 9.0e15 => Ok(Some(number as i64)),
        _ => Err(StartupError::Corpus(format!(
            "{}:{line}: Hadith_number {value:?} is not an integer",
            file.display()
        ))),
    }
}

/// List corpus CSV files under `data_dir`, recursively, in lexicographic path order.
///
/// The embedding artifact must have been generated over the files in this order.
///
/// # Errors
/// Returns an error if the directory cannot be walked or holds no CSV files.
pub fn discover_corpus_files(data_dir: &Path) -> StartupResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(data_dir).sort_by_file_name() {
        let entry = entry?;
        let is_csv = entry.path().extension().is_some_and(|ext| ext == "csv");
        if entry.file_type().is_file() && is_csv {
            files.push(entry.into_path());
        }
    }

    if files.is_empty() {
        return Err(StartupError::Corpus(format!(
            "no CSV files found under {}",
            data_dir.display()
        )));
    }
    Ok(files)
}

/// Read and filter corpus rows from `files`, concatenated in the given order.
///
/// Rows without English or Arabic text are dropped and logged. The returned
/// records carry no embedding yet.
///
/// # Errors
/// Returns an error if a file cannot be parsed or a kept row has no valid
/// hadith number.
pub fn read_corpus(files: &[PathBuf]) -> StartupResult<Vec<Record>> {
    let mut records = Vec::new();

    for file in files {
        let mut reader = csv::Reader::from_path(file)?;
        let mut kept = 0_usize;
        let mut dropped = 0_usize;

        for (row_index, row) in reader.deserialize::<CorpusRow>().enumerate() {
            let row = row?;
            // Header is line 1.
            let line = row_index + 2;

            if !has_text(row.english_hadith.as_ref()) || !has_text(row.arabic_hadith.as_ref()) {
                debug!(file = %file.display(), line, "dropping row without hadith text");
                dropped += 1;
                continue;
            }

            let sequence_number = parse_sequence_number(row.hadith_number.as_deref(), file, line)?;
            records.push(Record {
                chapter_number: text_cell(row.chapter_number).trim().to_string(),
                sequence_number,
                primary_text: text_cell(row.english_hadith),
                source_text: text_cell(row.arabic_hadith),
                attribution: text_cell(row.english_isnad),
                body: text_cell(row.english_matn),
                reliability_grade: text_cell(row.english_grade),
                embedding: Vec::new(),
            });
            kept += 1;
        }

        if dropped > 0 {
            warn!(file = %file.display(), kept, dropped, "dropped corpus rows without text");
        } else {
            debug!(file = %file.display(), kept, "corpus file read");
        }
    }

    Ok(records)
}

/// Load the precomputed `[rows, dimension]` embedding matrix.
///
/// # Errors
/// Returns an error if the file is missing or is not a 2-D `f32` array.
pub fn load_embeddings(path: &Path) -> StartupResult<Array2<f32>> {
    ndarray_npy::read_npy::<_, Array2<f32>>(path).map_err(|e| StartupError::Embeddings {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Ordered corpus records; position `i` matches index key `i`.
#[derive(Debug)]
pub struct RecordStore {
    records: Vec<Arc<Record>>,
    dimension: usize,
}

impl RecordStore {
    /// Load the corpus from `data_dir` and attach the embeddings at `embeddings_path`.
    ///
    /// # Errors
    /// Returns an error if any artifact cannot be read or the row counts differ.
    pub fn load(data_dir: &Path, embeddings_path: &Path) -> StartupResult<Self> {
        let files = discover_corpus_files(data_dir)?;
        let records = read_corpus(&files)?;
        let embeddings = load_embeddings(embeddings_path)?;
        let store = Self::attach(records, &embeddings)?;

        info!(
            files = files.len(),
            records = store.len(),
            dimension = store.dimension,
            "corpus loaded"
        );
        Ok(store)
    }

    /// Attach embedding row `i` to record `i`.
    ///
    /// # Errors
    /// Returns `StartupError::Misaligned` if the row counts differ.
    pub fn attach(records: Vec<Record>, embeddings: &Array2<f32>) -> StartupResult<Self> {
        let (rows, dimension) = embeddings.dim();
        if rows != records.len() {
            return Err(StartupError::Misaligned(format!(
                "corpus has {} records after filtering but the embedding artifact has {rows} rows",
                records.len()
            )));
        }

        let records = records
            .into_iter()
            .zip(embeddings.rows())
            .map(|(mut record, row)| {
                record.embedding = row.to_vec();
                Arc::new(record)
            })
            .collect();

        Ok(Self { records, dimension })
    }

    /// Build a store from records that already carry their embeddings.
    ///
    /// # Errors
    /// Returns `StartupError::Misaligned` if an embedding is not `dimension` wide.
    pub fn from_records(records: Vec<Record>, dimension: usize) -> StartupResult<Self> {
        if let Some((position, record)) = records
            .iter()
            .enumerate()
            .find(|(_, record)| record.embedding.len() != dimension)
        {
            return Err(StartupError::Misaligned(format!(
                "record {position} has a {}-wide embedding, expected {dimension}",
                record.embedding.len()
            )));
        }

        Ok(Self {
            records: records.into_iter().map(Arc::new).collect(),
            dimension,
        })
    }

    /// Record at `position`, if any.
    #[must_use]
    pub fn record_at(&self, position: usize) -> Option<&Arc<Record>> {
        self.records.get(position)
    }

    /// Iterate over records in corpus order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Record>> {
        self.records.iter()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Embedding width of every record.
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }
}
