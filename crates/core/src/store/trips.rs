//! Whole-state load and persist on top of a key-value backend.

use std::collections::HashSet;

use tracing::warn;

use super::KeyValueStore;
use crate::{
    error::Result,
    ids::MAX_ID,
    models::{AppState, Trip, TripId},
};

/// Key holding the serialized trip array.
pub const TRIPS_KEY: &str = "trips";
/// Key holding the active trip id; absent when nothing is selected.
pub const CURRENT_TRIP_KEY: &str = "currentTripId";

/// Reads and writes the whole [`AppState`] through a key-value backend.
#[derive(Debug)]
pub struct TripStore<S> {
    backend: S,
}

impl<S: KeyValueStore> TripStore<S> {
    /// Wrap a backend.
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    /// Borrow the underlying backend.
    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Mutably borrow the underlying backend.
    pub fn backend_mut(&mut self) -> &mut S {
        &mut self.backend
    }

    /// Consume the store and return the backend.
    pub fn into_inner(self) -> S {
        self.backend
    }

    /// Load the stored state. Missing or malformed data yields an empty
    /// collection; a stale active id yields no selection.
    pub fn load(&self) -> Result<AppState> {
        let trips = match self.backend.get(TRIPS_KEY)? {
            Some(raw) => match serde_json::from_str::<Vec<Trip>>(&raw) {
                Ok(trips) => sanitize(trips),
                Err(err) => {
                    warn!("Discarding malformed trip data: {err}");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let current_trip_id = match self.backend.get(CURRENT_TRIP_KEY)? {
            Some(raw) => match serde_json::from_str::<Option<TripId>>(&raw) {
                Ok(Some(id)) if trips.iter().any(|trip| trip.id == id) => Some(id),
                Ok(Some(id)) => {
                    warn!("Stored active trip {id} no longer exists");
                    None
                }
                Ok(None) => None,
                Err(err) => {
                    warn!("Discarding malformed active trip id: {err}");
                    None
                }
            },
            None => None,
        };

        Ok(AppState {
            trips,
            current_trip_id,
        })
    }

    /// Write the full state. Both entries are encoded before anything is
    /// written, so an encoding failure leaves storage untouched.
    pub fn persist(&mut self, state: &AppState) -> Result<()> {
        let trips = serde_json::to_string(&state.trips)?;
        let current = state
            .current_trip_id
            .map(|id| serde_json::to_string(&id))
            .transpose()?;

        let previous = self.backend.get(TRIPS_KEY)?;
        self.backend.set(TRIPS_KEY, &trips)?;

        let written = match &current {
            Some(value) => self.backend.set(CURRENT_TRIP_KEY, value),
            None => self.backend.remove(CURRENT_TRIP_KEY),
        };
        if let Err(err) = written {
            let restored = match previous {
                Some(value) => self.backend.set(TRIPS_KEY, &value),
                None => self.backend.remove(TRIPS_KEY),
            };
            if let Err(restore_err) = restored {
                warn!("Failed to restore trips after partial write: {restore_err}");
            }
            return Err(err);
        }
        Ok(())
    }
}

fn sanitize(trips: Vec<Trip>) -> Vec<Trip> {
    let mut seen = HashSet::new();
    let mut result = Vec::with_capacity(trips.len());
    for mut trip in trips {
        if trip.id.0 > MAX_ID {
            warn!("Dropping trip {} with out-of-range id", trip.id);
            continue;
        }
        if !seen.insert(trip.id) {
            warn!("Dropping trip {} with duplicate id", trip.id);
            continue;
        }
        let mut listing_ids = HashSet::new();
        trip.stays.retain(|listing| {
            if listing.id.0 > MAX_ID {
                warn!("Dropping listing {} with out-of-range id", listing.id);
                return false;
            }
            listing_ids.insert(listing.id)
        });
        for listing in &mut trip.stays {
            if let Some(price) = listing.price {
                if !(price.is_finite() && price > 0.0) {
                    warn!("Clearing invalid price {price} on listing {}", listing.id);
                    listing.price = None;
                }
            }
        }
        result.push(trip);
    }
    result
}
