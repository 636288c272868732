//! CSV import and export of bank rate tables.

pub mod bank_reader;
pub mod bank_writer;
