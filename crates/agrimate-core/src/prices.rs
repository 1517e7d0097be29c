//! Mock mandi price lookup

use std::collections::HashMap;

use serde::{Serialize, Serializer};

/// Latest quote for a crop at one market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CropPrice {
    pub mandi: String,
    pub price: String,
}

/// Result of a price lookup. An unknown crop is a normal answer, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceLookup {
    Found(CropPrice),
    NoData,
}

pub const NO_DATA_MESSAGE: &str = "No data for this crop";

impl Serialize for PriceLookup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct NoData {
            error: &'static str,
        }

        match self {
            PriceLookup::Found(price) => price.serialize(serializer),
            PriceLookup::NoData => NoData {
                error: NO_DATA_MESSAGE,
            }
            .serialize(serializer),
        }
    }
}

/// In-memory crop → price table keyed by lower-cased crop name.
#[derive(Debug, Clone)]
pub struct PriceBook {
    prices: HashMap<String, CropPrice>,
}

impl Default for PriceBook {
    fn default() -> Self {
        Self::new()
            .with_price("tomato", "Pune", "₹1800/qtl")
            .with_price("wheat", "Delhi", "₹2100/qtl")
    }
}

impl PriceBook {
    /// An empty book
    pub fn new() -> Self {
        Self {
            prices: HashMap::new(),
        }
    }

    pub fn with_price(
        mut self,
        crop: &str,
        mandi: impl Into<String>,
        price: impl Into<String>,
    ) -> Self {
        self.prices.insert(
            normalize(crop),
            CropPrice {
                mandi: mandi.into(),
                price: price.into(),
            },
        );
        self
    }

    pub fn lookup(&self, crop: &str) -> PriceLookup {
        match self.prices.get(&normalize(crop)) {
            Some(price) => PriceLookup::Found(price.clone()),
            None => PriceLookup::NoData,
        }
    }
}

fn normalize(crop: &str) -> String {
    crop.trim().to_lowercase()
}
