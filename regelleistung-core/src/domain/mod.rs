//! Domain types: the three request axes, the four tender variants, and requests.

pub mod market;
pub mod request;

pub use market::{Market, ProductType, QueryType, UnknownValue};
pub use request::{FetchRequest, FetcherConfig, Variant};
