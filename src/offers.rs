use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::state::{FlightOffer, OfferList};

/// Annotation shown under recommended offers
pub const RECOMMENDED_NOTE: &str = "✨ Recommended for top-tier comfort and promo fare";

fn offer(
    airline: &str,
    code: &str,
    departure: &str,
    arrival: &str,
    duration: &str,
    price: &str,
    merchant_url: &str,
) -> FlightOffer {
    FlightOffer {
        airline: airline.to_string(),
        code: code.to_string(),
        departure: departure.to_string(),
        arrival: arrival.to_string(),
        duration: duration.to_string(),
        price: price.to_string(),
        merchant_url: merchant_url.to_string(),
        sponsored: false,
        recommended: false,
    }
}

impl OfferList {
    /// The London → Dubai results the demo assistant always replies with
    pub fn builtin() -> Self {
        let mut apex = offer(
            "APEX Airways",
            "AX 004",
            "09:40 AM (London Heathrow)",
            "20:10 PM (Dubai Intl)",
            "6h 30m",
            "£579 (Promo Fare)",
            "https://merchant-demo-five.vercel.app/",
        );
        apex.sponsored = true;
        apex.recommended = true;

        Self {
            heading: vec![
                "Sure! I can help with that. ✈️".to_string(),
                "Here are some great flights for London → Dubai tomorrow:".to_string(),
            ],
            offers: vec![
                apex,
                offer(
                    "British Airways",
                    "BA 107",
                    "13:55 PM (London Heathrow)",
                    "00:20 AM (+1 day)",
                    "6h 25m",
                    "£545 (Economy)",
                    "https://www.britishairways.com/",
                ),
                offer(
                    "Qatar Airways",
                    "QR 012",
                    "18:25 PM (London Gatwick)",
                    "05:15 AM (+1 day)",
                    "9h 50m",
                    "£498 (Economy)",
                    "https://www.qatarairways.com/",
                ),
            ],
        }
    }

    /// Load an offer list from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
