//! Remote spreadsheet access
//!
//! The publisher only talks to a [`RemoteSheet`]. [`SheetsClient`] binds that
//! seam to the Google Sheets and Drive REST APIs using a service-account key.

pub mod auth;
pub mod client;
#[cfg(test)]
pub mod memory;
pub mod sheet;

pub use client::{GoogleSheet, SheetsClient};
#[cfg(test)]
pub use memory::MemorySheet;
pub use sheet::RemoteSheet;
