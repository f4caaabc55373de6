//! Configuration-driven spreadsheet ETL pipeline.
//!
//! A run reads a YAML configuration, selects source spreadsheet files from a
//! remote folder by metadata, normalizes heterogeneous sheet shapes into
//! uniform tables ([`window`], [`columns`]), loads them into a SQLite staging
//! store ([`store`], [`extract`]), applies declarative SQL transforms in
//! order ([`transform`]), and exports staging tables as xlsx files uploaded
//! to a destination folder ([`export`]). The remote transport sits behind the
//! traits in [`remote`]; [`remote::local::LocalDrive`] backs them with a
//! plain directory tree. [`run::EtlRunner`] sequences one full run.

pub mod columns;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod io;
pub mod model;
pub mod remote;
pub mod run;
pub mod select;
pub mod store;
pub mod transform;
pub mod window;

pub use error::{EtlError, Result};
pub use run::EtlRunner;
