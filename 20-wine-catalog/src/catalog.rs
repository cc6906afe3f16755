//! The in-memory table and the query/mutation rules applied to it.
//!
//! [`Catalog`] is plain synchronous state. It is owned by the manager task
//! (see [`crate::manager`]) and never shared, which is what lets every method
//! here take `&self`/`&mut self` without any locking.

use chrono::{DateTime, SecondsFormat, TimeZone};

use crate::{
    error::CatalogError,
    record::{NewWine, StatusReport, Wine, WineSummary},
};

const LOAD_FAILED_MESSAGE: &str = "failed to load csv";

#[derive(Debug, Default)]
pub struct Catalog {
    wines: Vec<Wine>,
    loaded: bool,
}

impl Catalog {
    /// Wraps an initial table. `loaded` is fixed for the lifetime of the catalog.
    pub fn new(wines: Vec<Wine>, loaded: bool) -> Self {
        Self { wines, loaded }
    }

    pub fn len(&self) -> usize {
        self.wines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wines.is_empty()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Returns a pagination window of the table.
    ///
    /// If either bound is missing or empty the whole table is returned.
    /// Otherwise both must parse as integers and describe a window that lies
    /// entirely inside the table; a window is never truncated.
    pub fn page(
        &self,
        start: Option<&str>,
        count: Option<&str>,
    ) -> Result<Vec<WineSummary>, CatalogError> {
        let (start, count) = match (non_empty(start), non_empty(count)) {
            (Some(start), Some(count)) => (start, count),
            _ => return Ok(self.wines.iter().map(Wine::summary).collect()),
        };

        let start: i64 = start.parse().map_err(|_| CatalogError::InvalidWindow)?;
        let count: i64 = count.parse().map_err(|_| CatalogError::InvalidWindow)?;
        let len = self.len() as i64;

        if start < 0 || start > len {
            return Err(CatalogError::StartOutOfRange);
        }
        let end = match start.checked_add(count) {
            Some(end) if end >= start && end <= len => end,
            _ => return Err(CatalogError::WindowOutOfRange),
        };

        Ok(self.wines[start as usize..end as usize]
            .iter()
            .map(Wine::summary)
            .collect())
    }

    pub fn get(&self, id: i64) -> Result<WineSummary, CatalogError> {
        usize::try_from(id)
            .ok()
            .and_then(|index| self.wines.get(index))
            .map(Wine::summary)
            .ok_or(CatalogError::IdNotAvailable)
    }

    /// Appends a wine at the end of the table, assigning the next position as its id.
    pub fn append(&mut self, wine: NewWine) -> &Wine {
        let id = self.wines.len();
        self.wines.push(Wine::from_new(id, wine));
        &self.wines[id]
    }

    pub fn status<Tz>(&self, now: DateTime<Tz>) -> StatusReport
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let ts = now.to_rfc3339_opts(SecondsFormat::Secs, true);
        if self.loaded {
            StatusReport {
                status: "ok".to_string(),
                ts,
                msg: String::new(),
            }
        } else {
            StatusReport {
                status: "error".to_string(),
                ts,
                msg: LOAD_FAILED_MESSAGE.to_string(),
            }
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}
