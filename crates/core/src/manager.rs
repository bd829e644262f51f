//! Trip and listing operations over the persisted [`AppState`].
//!
//! Every mutating call validates its input, applies the change to a working
//! copy of the state, persists that copy, and only then makes it the live
//! state. A failure at any step leaves the manager exactly as it was.

use tracing::{debug, info};

use crate::{
    error::{Result, StaysError},
    ids::IdGenerator,
    input::{parse_input, parse_price},
    models::{AppState, Listing, ListingId, Trip, TripId},
    store::{KeyValueStore, TripStore},
    view::{RankedListing, TripSummary},
};

/// Trip name used for the seeded trip when no protected name is configured.
pub const FALLBACK_TRIP_NAME: &str = "default";

/// Rules that differ between deployments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripPolicy {
    /// Refuse `create_trip` when the name is already used.
    pub reject_duplicate_names: bool,
    /// Trips with this exact name cannot be deleted.
    ///
    /// Protection follows the name, not a single trip: when duplicate names
    /// are allowed, every trip carrying this name is protected.
    pub protected_trip_name: Option<String>,
    /// Create a starter trip when storage holds none.
    pub seed_default_trip: bool,
}

impl Default for TripPolicy {
    fn default() -> Self {
        Self {
            reject_duplicate_names: true,
            protected_trip_name: Some(FALLBACK_TRIP_NAME.to_string()),
            seed_default_trip: true,
        }
    }
}

impl TripPolicy {
    /// No duplicate check, no protected trip, no seeding.
    pub fn permissive() -> Self {
        Self {
            reject_duplicate_names: false,
            protected_trip_name: None,
            seed_default_trip: false,
        }
    }

    fn is_protected(&self, trip: &Trip) -> bool {
        self.protected_trip_name.as_deref() == Some(trip.name.as_str())
    }
}

/// Owns the application state and routes every change through storage.
#[derive(Debug)]
pub struct TripManager<S> {
    state: AppState,
    store: TripStore<S>,
    policy: TripPolicy,
    ids: IdGenerator,
}

impl<S: KeyValueStore> TripManager<S> {
    /// Load state from `backend` and apply startup defaults: the first trip
    /// becomes active when nothing valid was selected, and a starter trip is
    /// created (and persisted) if the policy asks for one.
    pub fn open(backend: S, policy: TripPolicy) -> Result<Self> {
        let store = TripStore::new(backend);
        let mut state = store.load()?;
        if state.current_trip_id.is_none() {
            state.current_trip_id = state.trips.first().map(|trip| trip.id);
        }

        let ids = IdGenerator::new(state.max_id());
        let mut manager = Self {
            state,
            store,
            policy,
            ids,
        };

        if manager.state.trips.is_empty() && manager.policy.seed_default_trip {
            let name = manager
                .policy
                .protected_trip_name
                .clone()
                .unwrap_or_else(|| FALLBACK_TRIP_NAME.to_string());
            manager.create_trip(&name)?;
        }

        info!("Loaded {} trip(s)", manager.state.trips.len());
        Ok(manager)
    }

    /// Replace the id generator, e.g. with one driven by a fixed clock.
    pub fn with_id_generator(mut self, ids: IdGenerator) -> Self {
        let floor = ids.last().max(self.state.max_id());
        self.ids = IdGenerator::with_clock(floor, ids.clock());
        self
    }

    /// Current in-memory state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// All trips in creation order.
    pub fn trips(&self) -> &[Trip] {
        &self.state.trips
    }

    /// The active trip, if any.
    pub fn current_trip(&self) -> Option<&Trip> {
        self.state.current_trip()
    }

    /// Rules in effect.
    pub fn policy(&self) -> &TripPolicy {
        &self.policy
    }

    /// Underlying store.
    pub fn store(&self) -> &TripStore<S> {
        &self.store
    }

    /// Mutable access to the underlying store.
    pub fn store_mut(&mut self) -> &mut TripStore<S> {
        &mut self.store
    }

    fn commit(&mut self, next: AppState) -> Result<()> {
        self.store.persist(&next)?;
        self.state = next;
        Ok(())
    }

    /// Create a trip and make it active.
    pub fn create_trip(&mut self, name: &str) -> Result<Trip> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StaysError::validation("empty name"));
        }
        if self.policy.reject_duplicate_names && self.state.has_trip_named(name) {
            return Err(StaysError::DuplicateTrip(name.to_string()));
        }

        let state = &self.state;
        let id = self
            .ids
            .next(|candidate| state.trip(TripId(candidate)).is_some())
            .map(TripId)
            .ok_or(StaysError::IdsExhausted)?;
        let trip = Trip::new(id, name);

        let mut next = self.state.clone();
        next.trips.push(trip.clone());
        next.current_trip_id = Some(id);
        self.commit(next)?;

        info!("Created trip {id} ({name})");
        Ok(trip)
    }

    /// Delete a trip and its listings. Unknown ids are ignored.
    pub fn delete_trip(&mut self, id: TripId) -> Result<()> {
        let Some(trip) = self.state.trip(id) else {
            debug!("Ignoring delete of unknown trip {id}");
            return Ok(());
        };
        if self.policy.is_protected(trip) {
            return Err(StaysError::ProtectedTrip(id));
        }

        let mut next = self.state.clone();
        next.trips.retain(|trip| trip.id != id);
        if next.current_trip_id == Some(id) {
            next.current_trip_id = next.trips.first().map(|trip| trip.id);
        }
        self.commit(next)?;

        info!("Deleted trip {id}");
        Ok(())
    }

    /// Make a trip the active one.
    pub fn select_trip(&mut self, id: TripId) -> Result<Trip> {
        let trip = self.state.trip(id).cloned().ok_or(StaysError::NotFound(id))?;
        if self.state.current_trip_id == Some(id) {
            return Ok(trip);
        }

        let mut next = self.state.clone();
        next.current_trip_id = Some(id);
        self.commit(next)?;

        info!("Selected trip {id} ({})", trip.name);
        Ok(trip)
    }

    /// Parse user input into a listing and append it to the trip's stays.
    ///
    /// A blank `raw_input` is rejected; an unusable `raw_price` simply
    /// produces a listing without a price.
    pub fn add_listing(
        &mut self,
        trip_id: TripId,
        raw_input: &str,
        raw_price: &str,
    ) -> Result<Listing> {
        let trip = self.state.trip(trip_id).ok_or(StaysError::NoActiveTrip)?;
        let parsed = parse_input(raw_input)?;

        let id = self
            .ids
            .next(|candidate| trip.listing(ListingId(candidate)).is_some())
            .map(ListingId)
            .ok_or(StaysError::IdsExhausted)?;
        let listing = Listing {
            id,
            name: parsed.name(),
            platform: parsed.platform(),
            url: parsed.url().to_string(),
            price: parse_price(raw_price),
        };

        let mut next = self.state.clone();
        next.trip_mut(trip_id)
            .ok_or(StaysError::NoActiveTrip)?
            .stays
            .push(listing.clone());
        self.commit(next)?;

        debug!(
            "Added listing {id} to trip {trip_id} ({}, {:?})",
            listing.platform, listing.price
        );
        Ok(listing)
    }

    /// [`TripManager::add_listing`] against the active trip.
    pub fn add_listing_to_current(&mut self, raw_input: &str, raw_price: &str) -> Result<Listing> {
        let trip_id = self.state.current_trip_id.ok_or(StaysError::NoActiveTrip)?;
        self.add_listing(trip_id, raw_input, raw_price)
    }

    /// Remove a listing from a trip. Unknown listing ids are ignored.
    pub fn remove_listing(&mut self, trip_id: TripId, listing_id: ListingId) -> Result<()> {
        let trip = self.state.trip(trip_id).ok_or(StaysError::NotFound(trip_id))?;
        if trip.listing(listing_id).is_none() {
            debug!("Ignoring removal of unknown listing {listing_id} from trip {trip_id}");
            return Ok(());
        }

        let mut next = self.state.clone();
        if let Some(trip) = next.trip_mut(trip_id) {
            trip.stays.retain(|listing| listing.id != listing_id);
        }
        self.commit(next)?;

        debug!("Removed listing {listing_id} from trip {trip_id}");
        Ok(())
    }

    /// [`TripManager::remove_listing`] against the active trip.
    pub fn remove_listing_from_current(&mut self, listing_id: ListingId) -> Result<()> {
        let trip_id = self.state.current_trip_id.ok_or(StaysError::NoActiveTrip)?;
        self.remove_listing(trip_id, listing_id)
    }

    /// The trip's listings, cheapest first, unpriced last.
    pub fn ranked_listings(&self, trip_id: TripId) -> Result<Vec<Listing>> {
        let trip = self.state.trip(trip_id).ok_or(StaysError::NotFound(trip_id))?;
        Ok(rank_listings(&trip.stays))
    }

    /// Ranked rows for the active trip.
    pub fn ranked_current(&self) -> Result<Vec<RankedListing>> {
        let trip = self.state.current_trip().ok_or(StaysError::NoActiveTrip)?;
        Ok(RankedListing::from_ranked(rank_listings(&trip.stays)))
    }

    /// Selector rows for every trip.
    pub fn trip_summaries(&self) -> Vec<TripSummary> {
        TripSummary::collect(&self.state)
    }
}

/// Stable sort by ascending price with unpriced listings after all priced
/// ones. Equal prices keep insertion order.
pub fn rank_listings(stays: &[Listing]) -> Vec<Listing> {
    let mut ranked = stays.to_vec();
    ranked.sort_by(|a, b| {
        let a = a.price.unwrap_or(f64::INFINITY);
        let b = b.price.unwrap_or(f64::INFINITY);
        a.total_cmp(&b)
    });
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ids::MAX_ID, models::Platform, store::MemoryStore};
    use anyhow::Result;

    fn manager() -> Result<TripManager<MemoryStore>> {
        let policy = TripPolicy {
            seed_default_trip: false,
            ..TripPolicy::default()
        };
        Ok(TripManager::open(MemoryStore::new(), policy)?)
    }

    fn listing(id: u64, price: Option<f64>) -> Listing {
        Listing {
            id: ListingId(id),
            name: format!("stay {id}"),
            platform: Platform::Unknown,
            url: String::new(),
            price,
        }
    }

    #[test]
    fn create_trip_selects_and_persists() -> Result<()> {
        let mut manager = manager()?;
        let trip = manager.create_trip("  Lisbon ")?;
        assert_eq!(trip.name, "Lisbon");
        assert_eq!(manager.current_trip().map(|t| t.id), Some(trip.id));
        assert_eq!(manager.store().load()?, *manager.state());
        Ok(())
    }

    #[test]
    fn create_trip_rejects_blank_and_duplicate_names() -> Result<()> {
        let mut manager = manager()?;
        manager.create_trip("Lisbon")?;
        let before = manager.state().clone();

        let err = manager.create_trip("   ").unwrap_err();
        assert!(matches!(err, StaysError::Validation(ref reason) if reason == "empty name"));

        let err = manager.create_trip("Lisbon").unwrap_err();
        assert!(matches!(err, StaysError::DuplicateTrip(ref name) if name == "Lisbon"));
        assert_eq!(*manager.state(), before);

        // Case-sensitive comparison.
        manager.create_trip("lisbon")?;
        assert_eq!(manager.trips().len(), 2);
        Ok(())
    }

    #[test]
    fn permissive_policy_allows_duplicates_and_deleting_default() -> Result<()> {
        let mut manager = TripManager::open(MemoryStore::new(), TripPolicy::permissive())?;
        let first = manager.create_trip("default")?;
        manager.create_trip("default")?;
        assert_eq!(manager.trips().len(), 2);
        manager.delete_trip(first.id)?;
        assert_eq!(manager.trips().len(), 1);
        Ok(())
    }

    #[test]
    fn seeded_default_trip_is_protected() -> Result<()> {
        let mut manager = TripManager::open(MemoryStore::new(), TripPolicy::default())?;
        let default = manager.current_trip().cloned().expect("seeded trip");
        assert_eq!(default.name, "default");
        assert_eq!(manager.store().load()?.trips.len(), 1);

        let err = manager.delete_trip(default.id).unwrap_err();
        assert!(matches!(err, StaysError::ProtectedTrip(id) if id == default.id));
        assert_eq!(manager.trips().len(), 1);
        Ok(())
    }

    #[test]
    fn deleting_current_trip_moves_selection_to_first() -> Result<()> {
        let mut manager = manager()?;
        let a = manager.create_trip("A")?;
        let b = manager.create_trip("B")?;
        let c = manager.create_trip("C")?;
        assert_eq!(manager.state().current_trip_id, Some(c.id));

        manager.delete_trip(c.id)?;
        assert_eq!(manager.state().current_trip_id, Some(a.id));

        manager.select_trip(b.id)?;
        manager.delete_trip(a.id)?;
        assert_eq!(manager.state().current_trip_id, Some(b.id));

        manager.delete_trip(b.id)?;
        assert_eq!(manager.state().current_trip_id, None);
        assert_eq!(manager.store().load()?.current_trip_id, None);
        Ok(())
    }

    #[test]
    fn delete_unknown_trip_is_noop() -> Result<()> {
        let mut manager = manager()?;
        manager.create_trip("A")?;
        let before = manager.state().clone();
        manager.delete_trip(TripId(12345))?;
        assert_eq!(*manager.state(), before);
        Ok(())
    }

    #[test]
    fn select_trip_requires_existing_id() -> Result<()> {
        let mut manager = manager()?;
        let a = manager.create_trip("A")?;
        manager.create_trip("B")?;

        let selected = manager.select_trip(a.id)?;
        assert_eq!(selected.id, a.id);
        assert_eq!(manager.store().load()?.current_trip_id, Some(a.id));
        assert_eq!(manager.select_trip(a.id)?.id, a.id);

        let err = manager.select_trip(TripId(1)).unwrap_err();
        assert!(matches!(err, StaysError::NotFound(TripId(1))));
        Ok(())
    }

    #[test]
    fn add_listing_parses_link_and_price() -> Result<()> {
        let mut manager = manager()?;
        let trip = manager.create_trip("Lisbon")?;

        let link = manager.add_listing(trip.id, "https://www.airbnb.com/rooms/123", "150")?;
        assert_eq!(link.platform, Platform::Airbnb);
        assert_eq!(link.url, "https://www.airbnb.com/rooms/123");
        assert_eq!(link.price, Some(150.0));

        let text = manager.add_listing(trip.id, "My Friend's House", "not-a-number")?;
        assert_eq!(text.platform, Platform::Unknown);
        assert_eq!(text.url, "");
        assert_eq!(text.name, "My Friend's House");
        assert_eq!(text.price, None);

        let stored = manager.store().load()?;
        assert_eq!(stored.trip(trip.id).map(|t| t.stays.len()), Some(2));
        assert_ne!(link.id, text.id);
        Ok(())
    }

    #[test]
    fn add_listing_requires_trip_and_input() -> Result<()> {
        let mut manager = manager()?;
        let err = manager.add_listing_to_current("Cabin", "10").unwrap_err();
        assert!(matches!(err, StaysError::NoActiveTrip));
        let err = manager.add_listing(TripId(9), "Cabin", "10").unwrap_err();
        assert!(matches!(err, StaysError::NoActiveTrip));

        manager.create_trip("A")?;
        let before = manager.state().clone();
        let err = manager.add_listing_to_current("  ", "10").unwrap_err();
        assert!(matches!(err, StaysError::Validation(ref reason) if reason == "empty input"));
        assert_eq!(*manager.state(), before);
        Ok(())
    }

    #[test]
    fn remove_listing_is_idempotent() -> Result<()> {
        let mut manager = manager()?;
        let trip = manager.create_trip("A")?;
        let kept = manager.add_listing(trip.id, "Cabin", "80")?;
        let gone = manager.add_listing(trip.id, "Loft", "90")?;

        manager.remove_listing(trip.id, gone.id)?;
        let before = manager.state().clone();
        manager.remove_listing(trip.id, gone.id)?;
        manager.remove_listing_from_current(ListingId(1))?;
        assert_eq!(*manager.state(), before);
        assert_eq!(manager.trips()[0].stays, vec![kept]);

        let err = manager.remove_listing(TripId(1), gone.id).unwrap_err();
        assert!(matches!(err, StaysError::NotFound(_)));
        Ok(())
    }

    #[test]
    fn rank_listings_is_stable_with_unpriced_last() {
        let stays = vec![
            listing(1, None),
            listing(2, Some(120.0)),
            listing(3, Some(80.0)),
            listing(4, None),
            listing(5, Some(120.0)),
            listing(6, Some(80.0)),
        ];
        let order: Vec<u64> = rank_listings(&stays).iter().map(|l| l.id.0).collect();
        assert_eq!(order, vec![3, 6, 2, 5, 1, 4]);
    }

    #[test]
    fn ranked_current_numbers_rows() -> Result<()> {
        let mut manager = manager()?;
        manager.create_trip("A")?;
        manager.add_listing_to_current("Loft", "200")?;
        manager.add_listing_to_current("Cabin", "$75")?;

        let rows = manager.ranked_current()?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[0].listing.name, "Cabin");
        assert_eq!(rows[0].price_label(), "$75/night");
        Ok(())
    }

    #[test]
    fn failed_persist_rolls_back() -> Result<()> {
        let mut manager = manager()?;
        let trip = manager.create_trip("A")?;
        manager.add_listing(trip.id, "Cabin", "80")?;
        let before = manager.state().clone();

        manager.store_mut().backend_mut().set_fail_writes(true);
        assert!(manager.create_trip("B").is_err());
        assert!(manager.add_listing(trip.id, "Loft", "90").is_err());
        let err = manager.delete_trip(trip.id).unwrap_err();
        assert!(!err.is_recoverable());
        assert_eq!(*manager.state(), before);

        manager.store_mut().backend_mut().set_fail_writes(false);
        assert_eq!(manager.store().load()?, before);
        Ok(())
    }

    #[test]
    fn oversized_stored_ids_do_not_stall_allocation() -> Result<()> {
        let mut backend = MemoryStore::new();
        backend.set(
            crate::store::TRIPS_KEY,
            &serde_json::json!([
                { "id": u64::MAX, "name": "A", "stays": [] },
                { "id": 5, "name": "C", "stays": [] },
            ])
            .to_string(),
        )?;
        let mut manager = TripManager::open(backend, TripPolicy::permissive())?;
        assert_eq!(manager.trips().len(), 1);

        let b = manager.create_trip("B")?;
        let x = manager.add_listing(TripId(5), "x", "")?;
        let y = manager.add_listing(TripId(5), "y", "")?;
        assert!(b.id.0 <= MAX_ID && x.id.0 <= MAX_ID && y.id.0 <= MAX_ID);
        assert_ne!(x.id, y.id);
        Ok(())
    }

    #[test]
    fn exhausted_ids_fail_without_changes() -> Result<()> {
        let mut manager = manager()?.with_id_generator(IdGenerator::with_clock(MAX_ID, || 0));
        let before = manager.state().clone();
        let err = manager.create_trip("A").unwrap_err();
        assert!(matches!(err, StaysError::IdsExhausted));
        assert_eq!(*manager.state(), before);
        Ok(())
    }

    #[test]
    fn protection_applies_to_every_trip_with_the_name() -> Result<()> {
        let policy = TripPolicy {
            reject_duplicate_names: false,
            ..TripPolicy::default()
        };
        let mut manager = TripManager::open(MemoryStore::new(), policy)?;
        let seeded = manager.current_trip().cloned().expect("seeded trip");
        let second = manager.create_trip("default")?;

        for id in [seeded.id, second.id] {
            let err = manager.delete_trip(id).unwrap_err();
            assert!(matches!(err, StaysError::ProtectedTrip(_)));
        }
        assert_eq!(manager.trips().len(), 2);
        Ok(())
    }

    #[test]
    fn same_millisecond_creation_gets_unique_ids() -> Result<()> {
        let mut manager = manager()?.with_id_generator(IdGenerator::with_clock(0, || 1_000));
        let a = manager.create_trip("A")?;
        let b = manager.create_trip("B")?;
        assert_ne!(a.id, b.id);
        let x = manager.add_listing(b.id, "x", "")?;
        let y = manager.add_listing(b.id, "y", "")?;
        assert_ne!(x.id, y.id);
        Ok(())
    }
}
