//! Thread-safe handle around a [`TripManager`].

use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    error::Result,
    manager::TripManager,
    models::{AppState, Listing, ListingId, Trip, TripId},
    store::KeyValueStore,
    view::{RankedListing, TripSummary},
};

/// Cloneable handle that serializes every operation behind one lock, so
/// validate, mutate and persist never interleave between callers.
pub struct SharedTripManager<S> {
    inner: Arc<Mutex<TripManager<S>>>,
}

impl<S> Clone for SharedTripManager<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: KeyValueStore> SharedTripManager<S> {
    /// Wrap an opened manager.
    pub fn new(manager: TripManager<S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(manager)),
        }
    }

    /// Run `f` with exclusive access to the manager.
    pub fn with<R>(&self, f: impl FnOnce(&mut TripManager<S>) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> AppState {
        self.inner.lock().state().clone()
    }

    /// See [`TripManager::create_trip`].
    pub fn create_trip(&self, name: &str) -> Result<Trip> {
        self.inner.lock().create_trip(name)
    }

    /// See [`TripManager::delete_trip`].
    pub fn delete_trip(&self, id: TripId) -> Result<()> {
        self.inner.lock().delete_trip(id)
    }

    /// See [`TripManager::select_trip`].
    pub fn select_trip(&self, id: TripId) -> Result<Trip> {
        self.inner.lock().select_trip(id)
    }

    /// See [`TripManager::add_listing`].
    pub fn add_listing(
        &self,
        trip_id: TripId,
        raw_input: &str,
        raw_price: &str,
    ) -> Result<Listing> {
        self.inner.lock().add_listing(trip_id, raw_input, raw_price)
    }

    /// See [`TripManager::add_listing_to_current`].
    pub fn add_listing_to_current(&self, raw_input: &str, raw_price: &str) -> Result<Listing> {
        self.inner.lock().add_listing_to_current(raw_input, raw_price)
    }

    /// See [`TripManager::remove_listing`].
    pub fn remove_listing(&self, trip_id: TripId, listing_id: ListingId) -> Result<()> {
        self.inner.lock().remove_listing(trip_id, listing_id)
    }

    /// See [`TripManager::ranked_listings`].
    pub fn ranked_listings(&self, trip_id: TripId) -> Result<Vec<Listing>> {
        self.inner.lock().ranked_listings(trip_id)
    }

    /// See [`TripManager::ranked_current`].
    pub fn ranked_current(&self) -> Result<Vec<RankedListing>> {
        self.inner.lock().ranked_current()
    }

    /// See [`TripManager::trip_summaries`].
    pub fn trip_summaries(&self) -> Vec<TripSummary> {
        self.inner.lock().trip_summaries()
    }
}
