//! A small blocking Rust client for the NHTSA vehicle recalls API.
//!
//! The client issues a query (by campaign number or by make/model/year),
//! keeps the most recent result set in memory, and derives deduplicated
//! field projections from it.
//!
//! ## Quick start
//! - The base URL defaults to `https://api.nhtsa.gov`. Override it with
//!   `NHTSA_API_URL` or a `.nhtsarc` file (current directory or home directory).
//! - Call [`Client::fetch_by_vehicle`] or [`Client::fetch_by_campaign`], then read
//!   the accessors.
//!
//! ```no_run
//! use anyhow::Result;
//! use nhtsa_recalls::{Client, VehicleQuery};
//!
//! fn main() -> Result<()> {
//!     let mut client = Client::from_env()?;
//!     client.fetch_by_vehicle(&VehicleQuery::new().make("Honda").model("Civic").model_year(2018))?;
//!     for make in client.makes() {
//!         println!("{make}");
//!     }
//!     println!("{client}");
//!     Ok(())
//! }
//! ```
//!
//! Failed requests are logged through `tracing` and yield empty results.
//! Use the `try_` variants (for example [`Client::try_fetch_by_vehicle`]) to
//! receive the [`RecallError`] instead.

#![forbid(unsafe_code)]

mod client;
mod config;
mod error;
mod query;
mod record;
mod util;

pub use client::{Client, ClientConfig, FetchOutcome, NO_DATA};
pub use error::RecallError;
pub use query::VehicleQuery;
pub use record::{RecallRecord, fields};
