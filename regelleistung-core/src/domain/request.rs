use super::market::{parse_wire, Market, ProductType, QueryType, UnknownValue};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed product/market/report triple a fetcher is bound to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct FetcherConfig {
    pub product_type: ProductType,
    pub market: Market,
    pub query_type: QueryType,
}

impl FetcherConfig {
    pub fn new(product_type: ProductType, market: Market, query_type: QueryType) -> Self {
        Self {
            product_type,
            market,
            query_type,
        }
    }

    /// Request for one delivery day under this config.
    pub fn request_for(&self, date: NaiveDate) -> FetchRequest {
        FetchRequest {
            product_type: self.product_type,
            market: self.market,
            query_type: self.query_type,
            date,
        }
    }
}

impl fmt::Display for FetcherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.product_type, self.market, self.query_type)
    }
}

/// Everything needed to issue one download. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchRequest {
    pub product_type: ProductType,
    pub market: Market,
    pub query_type: QueryType,
    pub date: NaiveDate,
}

impl FetchRequest {
    pub fn new(
        product_type: ProductType,
        market: Market,
        query_type: QueryType,
        date: NaiveDate,
    ) -> Self {
        Self {
            product_type,
            market,
            query_type,
            date,
        }
    }

    /// Delivery date as `YYYY-MM-DD`.
    pub fn date_param(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// Full download URL below `base_url`, with or without a trailing `/`.
    pub fn url(&self, base_url: &str) -> String {
        format!(
            "{base}/{segment}?&productTypes={product}&market={market}&exportFormat=xlsx&date={date}",
            base = base_url.trim_end_matches('/'),
            segment = self.query_type.path_segment(),
            product = self.product_type.as_str(),
            market = self.market.as_str(),
            date = self.date_param(),
        )
    }
}

/// The four published tender reports this crate knows about.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    FcrResults,
    FcrAnonymousBids,
    AfrrCapacityResults,
    AfrrCapacityAnonymousBids,
}

impl Variant {
    pub const ALL: [Variant; 4] = [
        Variant::FcrResults,
        Variant::FcrAnonymousBids,
        Variant::AfrrCapacityResults,
        Variant::AfrrCapacityAnonymousBids,
    ];

    pub fn config(&self) -> FetcherConfig {
        match self {
            Variant::FcrResults => FetcherConfig::new(
                ProductType::Fcr,
                Market::Capacity,
                QueryType::AuctionResults,
            ),
            Variant::FcrAnonymousBids => FetcherConfig::new(
                ProductType::Fcr,
                Market::Capacity,
                QueryType::ListAnonymousBids,
            ),
            Variant::AfrrCapacityResults => FetcherConfig::new(
                ProductType::Afrr,
                Market::Capacity,
                QueryType::AuctionResults,
            ),
            Variant::AfrrCapacityAnonymousBids => FetcherConfig::new(
                ProductType::Afrr,
                Market::Capacity,
                QueryType::ListAnonymousBids,
            ),
        }
    }

    /// Short name used on the command line.
    pub fn slug(&self) -> &'static str {
        match self {
            Variant::FcrResults => "fcr-results",
            Variant::FcrAnonymousBids => "fcr-bids",
            Variant::AfrrCapacityResults => "afrr-results",
            Variant::AfrrCapacityAnonymousBids => "afrr-bids",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Variant::FcrResults => "FCR capacity auction results",
            Variant::FcrAnonymousBids => "FCR capacity anonymized bids",
            Variant::AfrrCapacityResults => "aFRR capacity auction results",
            Variant::AfrrCapacityAnonymousBids => "aFRR capacity anonymized bids",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Variant {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_wire("variant", s, &Self::ALL, Self::slug)
    }
}
