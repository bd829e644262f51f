#![warn(clippy::all, missing_docs)]

//! Core state for Weekendizer.
//!
//! This crate hosts the trip and listing models, input parsing, the
//! price ranking, configuration handling and the persistence layer used
//! by any frontend that lets people shortlist places to stay.

pub mod config;
pub mod error;
pub mod ids;
pub mod input;
pub mod manager;
pub mod models;
pub mod shared;
pub mod store;
pub mod view;

pub use config::AppConfig;
pub use error::{Result, StaysError};
pub use input::ParsedInput;
pub use manager::{rank_listings, TripManager, TripPolicy};
pub use models::{AppState, Listing, ListingId, Platform, Trip, TripId};
pub use shared::SharedTripManager;
pub use store::{FileStore, KeyValueStore, MemoryStore, TripStore};
pub use view::{RankedListing, TripSummary};
