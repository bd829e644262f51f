//! Read-only rows handed to whatever renders trips and listings.

use serde::Serialize;

use crate::models::{AppState, Listing, TripId};

/// One row of the price-ranked listing display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedListing {
    /// 1-based position, cheapest first.
    pub rank: usize,
    /// The listing itself.
    pub listing: Listing,
}

impl RankedListing {
    /// Number already-ranked listings from 1.
    pub fn from_ranked(ranked: Vec<Listing>) -> Vec<Self> {
        ranked
            .into_iter()
            .enumerate()
            .map(|(index, listing)| Self {
                rank: index + 1,
                listing,
            })
            .collect()
    }

    /// `"$150/night"`, or `"no price"` for unpriced listings.
    pub fn price_label(&self) -> String {
        match self.listing.price {
            Some(price) => format!("${}/night", format_price(price)),
            None => "no price".to_string(),
        }
    }
}

/// One entry of the trip selector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripSummary {
    /// Trip id.
    pub id: TripId,
    /// Trip name.
    pub name: String,
    /// How many listings the trip holds.
    pub listing_count: usize,
    /// Lowest nightly price in the trip.
    pub cheapest: Option<f64>,
    /// Whether this is the active trip.
    pub is_current: bool,
}

impl TripSummary {
    /// Summaries for every trip, in creation order.
    pub fn collect(state: &AppState) -> Vec<Self> {
        state
            .trips
            .iter()
            .map(|trip| Self {
                id: trip.id,
                name: trip.name.clone(),
                listing_count: trip.stays.len(),
                cheapest: trip.cheapest(),
                is_current: state.current_trip_id == Some(trip.id),
            })
            .collect()
    }
}

fn format_price(price: f64) -> String {
    if price.fract() == 0.0 {
        format!("{price:.0}")
    } else {
        format!("{price:.2}")
    }
}
