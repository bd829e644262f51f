//! Shared domain models.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a trip, unique across the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TripId(pub u64);

/// Identifier of a listing, unique within its owning trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(pub u64);

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hosting platform a listing link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Platform {
    /// airbnb.com
    Airbnb,
    /// booking.com
    BookingCom,
    /// vrbo.com
    Vrbo,
    /// expedia.com
    Expedia,
    /// hotels.com
    HotelsCom,
    /// agoda.com
    Agoda,
    /// hostelworld.com
    Hostelworld,
    /// Free-text entries and unrecognised links.
    Unknown,
}

impl Platform {
    /// Known platforms paired with the URL keyword that identifies them, in
    /// match priority order.
    pub const KEYWORDS: [(&'static str, Platform); 7] = [
        ("airbnb", Platform::Airbnb),
        ("booking.com", Platform::BookingCom),
        ("vrbo", Platform::Vrbo),
        ("expedia", Platform::Expedia),
        ("hotels.com", Platform::HotelsCom),
        ("agoda", Platform::Agoda),
        ("hostelworld", Platform::Hostelworld),
    ];

    /// Display label, also used as the persisted value.
    pub fn label(&self) -> &'static str {
        match self {
            Platform::Airbnb => "Airbnb",
            Platform::BookingCom => "Booking.com",
            Platform::Vrbo => "Vrbo",
            Platform::Expedia => "Expedia",
            Platform::HotelsCom => "Hotels.com",
            Platform::Agoda => "Agoda",
            Platform::Hostelworld => "Hostelworld",
            Platform::Unknown => "Unknown",
        }
    }

    /// Returns true for every platform except [`Platform::Unknown`].
    pub fn is_known(&self) -> bool {
        !matches!(self, Platform::Unknown)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for Platform {
    fn from(value: String) -> Self {
        Platform::KEYWORDS
            .iter()
            .map(|(_, platform)| *platform)
            .find(|platform| platform.label() == value)
            .unwrap_or(Platform::Unknown)
    }
}

impl From<Platform> for String {
    fn from(value: Platform) -> Self {
        value.label().to_string()
    }
}

/// A candidate lodging option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    /// Stable identifier used for removal.
    pub id: ListingId,
    /// Display label.
    pub name: String,
    /// Platform inferred from the link.
    pub platform: Platform,
    /// External link, empty for free-text entries.
    #[serde(default)]
    pub url: String,
    /// Nightly price; always positive and finite when present.
    #[serde(default)]
    pub price: Option<f64>,
}

impl Listing {
    /// Returns the link, if this listing was created from one.
    pub fn link(&self) -> Option<&str> {
        if self.url.is_empty() {
            None
        } else {
            Some(&self.url)
        }
    }
}

/// A named collection of listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    /// Stable identifier.
    pub id: TripId,
    /// Non-empty display label.
    pub name: String,
    /// Listings in insertion order.
    #[serde(default)]
    pub stays: Vec<Listing>,
}

impl Trip {
    /// Create an empty trip.
    pub fn new(id: TripId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            stays: Vec::new(),
        }
    }

    /// Find a listing by id.
    pub fn listing(&self, id: ListingId) -> Option<&Listing> {
        self.stays.iter().find(|listing| listing.id == id)
    }

    /// Lowest known nightly price among this trip's listings.
    pub fn cheapest(&self) -> Option<f64> {
        self.stays
            .iter()
            .filter_map(|listing| listing.price)
            .min_by(|a, b| a.total_cmp(b))
    }
}

/// Root object holding every trip and the active selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    /// Trips in creation order, ids unique.
    pub trips: Vec<Trip>,
    /// Lookup key of the active trip.
    pub current_trip_id: Option<TripId>,
}

impl AppState {
    /// Find a trip by id.
    pub fn trip(&self, id: TripId) -> Option<&Trip> {
        self.trips.iter().find(|trip| trip.id == id)
    }

    pub(crate) fn trip_mut(&mut self, id: TripId) -> Option<&mut Trip> {
        self.trips.iter_mut().find(|trip| trip.id == id)
    }

    /// The active trip, if any.
    pub fn current_trip(&self) -> Option<&Trip> {
        self.current_trip_id.and_then(|id| self.trip(id))
    }

    /// Whether any trip already uses exactly this name.
    pub fn has_trip_named(&self, name: &str) -> bool {
        self.trips.iter().any(|trip| trip.name == name)
    }

    /// Largest trip or listing id in use, used to seed id generation.
    pub fn max_id(&self) -> u64 {
        self.trips
            .iter()
            .flat_map(|trip| {
                std::iter::once(trip.id.0).chain(trip.stays.iter().map(|listing| listing.id.0))
            })
            .max()
            .unwrap_or(0)
    }
}
