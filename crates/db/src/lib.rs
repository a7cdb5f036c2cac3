//! Client for the hosted REST data API.
//!
//! Reads are described with [`Select`] and executed by [`RestClient`], which
//! speaks the PostgREST query dialect (`select=`, `order=`, `col=eq.v`,
//! `offset`/`limit`).

mod client;
mod error;
mod select;

pub use client::RestClient;
pub use error::StoreError;
pub use select::{Filter, Order, Select};
