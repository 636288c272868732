use crate::domain::bank::Bank;
use crate::error::{RemitError, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Reads a bank rate table from CSV.
///
/// Expects the header `id,name,short_name,logo,rate,bonus,color`, where `bonus`
/// uses the display labels (`10 ETB`, `2%`). Whitespace around fields is trimmed.
pub struct BankReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> BankReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes one bank per row.
    pub fn banks(self) -> impl Iterator<Item = Result<Bank>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(RemitError::from))
    }

    /// Collects every valid row, skipping and logging malformed ones.
    ///
    /// Fails only when no row survives.
    pub fn into_table(self) -> Result<Arc<[Bank]>> {
        let mut banks = Vec::new();
        for (row, result) in self.banks().enumerate() {
            match result {
                Ok(bank) => banks.push(bank),
                Err(e) => warn!(row = row + 1, error = %e, "Skipping malformed bank row"),
            }
        }
        if banks.is_empty() {
            return Err(RemitError::EmptyRateTable);
        }
        Ok(Arc::from(banks))
    }
}

impl BankReader<File> {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(File::open(path)?))
    }
}
