use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Balancing product traded in the tender.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ProductType {
    /// Frequency Containment Reserve
    #[serde(rename = "FCR")]
    Fcr,
    /// automatic Frequency Restoration Reserve
    #[serde(rename = "aFRR")]
    Afrr,
}

impl ProductType {
    pub const ALL: [ProductType; 2] = [ProductType::Fcr, ProductType::Afrr];

    /// Value of the `productTypes` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Fcr => "FCR",
            ProductType::Afrr => "aFRR",
        }
    }
}

/// Which side of the balancing market a tender belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Market {
    Capacity,
    Energy,
}

impl Market {
    pub const ALL: [Market; 2] = [Market::Capacity, Market::Energy];

    /// Value of the `market` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Capacity => "CAPACITY",
            Market::Energy => "ENERGY",
        }
    }
}

/// Report requested from the tender API.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum QueryType {
    /// Aggregated auction results overview
    #[serde(rename = "resultsoverview")]
    AuctionResults,
    /// Individual de-identified bids
    #[serde(rename = "anonymousresults")]
    ListAnonymousBids,
}

impl QueryType {
    pub const ALL: [QueryType; 2] = [QueryType::AuctionResults, QueryType::ListAnonymousBids];

    /// Path segment appended to the tender download endpoint.
    pub fn path_segment(&self) -> &'static str {
        match self {
            QueryType::AuctionResults => "resultsoverview",
            QueryType::ListAnonymousBids => "anonymousresults",
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownValue {
    pub kind: &'static str,
    pub value: String,
}

pub(super) fn parse_wire<T: Copy>(
    kind: &'static str,
    value: &str,
    all: &[T],
    wire: impl Fn(&T) -> &'static str,
) -> Result<T, UnknownValue> {
    all.iter()
        .find(|candidate| wire(candidate).eq_ignore_ascii_case(value.trim()))
        .copied()
        .ok_or_else(|| UnknownValue {
            kind,
            value: value.to_string(),
        })
}

impl FromStr for ProductType {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_wire("product type", s, &Self::ALL, Self::as_str)
    }
}

impl FromStr for Market {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_wire("market", s, &Self::ALL, Self::as_str)
    }
}

impl FromStr for QueryType {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_wire("query type", s, &Self::ALL, Self::path_segment)
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_values_match_api() {
        assert_eq!(ProductType::Fcr.as_str(), "FCR");
        assert_eq!(ProductType::Afrr.as_str(), "aFRR");
        assert_eq!(Market::Capacity.as_str(), "CAPACITY");
        assert_eq!(Market::Energy.as_str(), "ENERGY");
        assert_eq!(QueryType::AuctionResults.path_segment(), "resultsoverview");
        assert_eq!(QueryType::ListAnonymousBids.path_segment(), "anonymousresults");
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("afrr".parse::<ProductType>().unwrap(), ProductType::Afrr);
        assert_eq!("capacity".parse::<Market>().unwrap(), Market::Capacity);
        assert_eq!(
            "AnonymousResults".parse::<QueryType>().unwrap(),
            QueryType::ListAnonymousBids
        );
    }

    #[test]
    fn parse_rejects_unknown() {
        let err = "mFRR".parse::<ProductType>().unwrap_err();
        assert_eq!(err.kind, "product type");
        assert_eq!(err.value, "mFRR");
        assert!("INTRADAY".parse::<Market>().is_err());
    }

    #[test]
    fn display_roundtrips_through_from_str() {
        for p in ProductType::ALL {
            assert_eq!(p.to_string().parse::<ProductType>().unwrap(), p);
        }
        for m in Market::ALL {
            assert_eq!(m.to_string().parse::<Market>().unwrap(), m);
        }
        for q in QueryType::ALL {
            assert_eq!(q.to_string().parse::<QueryType>().unwrap(), q);
        }
    }
}
