//! Loads the initial wine table from a CSV file.
//!
//! The file has a header row followed by rows of 14 columns in the order of
//! [`Wine`]'s fields. The first column is an index written by whatever
//! produced the file; it is ignored and replaced by the row's position so the
//! table always starts out with ids `0..len`.

use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{info, warn};

use crate::record::Wine;

const EXPECTED_COLUMNS: usize = 14;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse csv: {0}")]
    Parse(#[from] csv::Error),
    #[error("expected 14 columns but the header has {found}")]
    ColumnCount { found: usize },
}

/// The outcome of startup loading.
#[derive(Debug, Default)]
pub struct LoadedTable {
    pub wines: Vec<Wine>,
    pub loaded: bool,
}

/// Loads the table at `path`, never failing.
///
/// Any error is logged and produces an empty table with `loaded == false`;
/// the service still starts and reports the failure through `/status`.
pub fn load_table(path: &Path) -> LoadedTable {
    match read_file(path) {
        Ok(wines) => {
            info!(path = %path.display(), count = wines.len(), "loaded wine table");
            LoadedTable {
                wines,
                loaded: true,
            }
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to load wine table");
            LoadedTable::default()
        }
    }
}

pub fn read_file(path: &Path) -> Result<Vec<Wine>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_wines(file)
}

/// Parses every row of `reader`, failing on the first malformed one.
pub fn read_wines<R: Read>(reader: R) -> Result<Vec<Wine>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let found = reader.headers()?.len();
    if found != EXPECTED_COLUMNS {
        return Err(LoadError::ColumnCount { found });
    }

    let mut wines = Vec::new();
    let mut renumbered = 0usize;
    for (position, row) in reader.records().enumerate() {
        // Positional deserialization: the header's first column is unnamed.
        let mut wine: Wine = row?.deserialize(None)?;
        let id = position.to_string();
        if wine.id != id {
            renumbered += 1;
            wine.id = id;
        }
        wines.push(wine);
    }

    if renumbered > 0 {
        warn!(renumbered, "csv index column did not match row positions");
    }
    Ok(wines)
}
