#![forbid(unsafe_code)]

pub mod bank_file;
pub mod repository;
pub mod sqlite;

pub use bank_file::{BankFile, BankFileError};
pub use repository::{AttemptRepository, AttemptRow, InMemoryRepository, Storage, StorageError};
