//! Property tests for request rendering and hour extraction.
//!
//! Uses proptest to verify:
//! 1. Hour extraction returns the second `_` segment of any product name
//! 2. Postprocessing indexes every row at its Berlin delivery hour
//! 3. Request URLs always carry the fixed export parameters and the date

use chrono::{Duration, NaiveDate, TimeZone};
use chrono_tz::Europe::Berlin;
use polars::prelude::*;
use proptest::prelude::*;
use regelleistung_core::data::extract_hour;
use regelleistung_core::{
    AmbiguousTimePolicy, ClientConfig, FetchRequest, Market, ProductType, QueryType, Variant,
};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_segment() -> impl Strategy<Value = String> {
    "[A-Z0-9]{1,8}"
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (0i64..3650).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2015, 1, 1).unwrap() + Duration::days(offset)
    })
}

/// FCR blocks start on 4-hour boundaries, never inside a DST transition.
fn arb_block_start() -> impl Strategy<Value = u32> {
    (0u32..6).prop_map(|block| block * 4)
}

fn arb_request() -> impl Strategy<Value = FetchRequest> {
    (
        prop::sample::select(ProductType::ALL.to_vec()),
        prop::sample::select(Market::ALL.to_vec()),
        prop::sample::select(QueryType::ALL.to_vec()),
        arb_date(),
    )
        .prop_map(|(p, m, q, date)| FetchRequest::new(p, m, q, date))
}

// ── 1. Hour extraction ───────────────────────────────────────────────

proptest! {
    #[test]
    fn hour_is_second_segment(
        prefix in arb_segment(),
        hour in 0u32..24,
        suffix in arb_segment(),
    ) {
        let name = format!("{prefix}_{hour:02}_{suffix}");
        let expected = format!("{hour:02}");
        prop_assert_eq!(extract_hour(&name), Some(expected.as_str()));
    }

    #[test]
    fn names_without_separator_have_no_hour(name in "[A-Z0-9]{1,16}") {
        prop_assert_eq!(extract_hour(&name), None);
    }
}

// ── 2. Berlin index ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn index_matches_berlin_wall_clock(
        rows in prop::collection::vec((arb_date(), arb_block_start()), 1..20),
    ) {
        let dates: Vec<String> = rows
            .iter()
            .map(|(d, _)| d.format("%Y-%m-%d").to_string())
            .collect();
        let names: Vec<String> = rows
            .iter()
            .map(|(_, h)| format!("NEGPOS_{h:02}_{:02}", h + 4))
            .collect();
        let raw = df!("DATE_FROM" => dates, "PRODUCTNAME" => names).unwrap();

        let config = Variant::FcrResults.config();
        let table = regelleistung_core::data::Postprocess::for_config(&config)
            .apply(raw, &config, AmbiguousTimePolicy::Reject)
            .unwrap();

        let millis: Vec<i64> = table
            .index()
            .cast(&DataType::Int64)
            .unwrap()
            .i64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        prop_assert_eq!(millis.len(), rows.len());
        for ((date, hour), got) in rows.iter().zip(millis) {
            let local = date.and_hms_opt(*hour, 0, 0).unwrap();
            let expected = Berlin.from_local_datetime(&local).single().unwrap();
            prop_assert_eq!(got, expected.timestamp_millis());
        }
    }
}

// ── 3. URL rendering ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn url_carries_all_parameters(request in arb_request()) {
        let url = request.url(&ClientConfig::default().base_url);
        let expected_prefix = format!(
            "https://www.regelleistung.net/apps/cpp-publisher/api/v1/download/tenders/{}?",
            request.query_type.path_segment()
        );
        let expected_product = format!("productTypes={}", request.product_type);
        let expected_market = format!("market={}", request.market);
        prop_assert!(url.starts_with(&expected_prefix));
        prop_assert!(url.contains(&expected_product));
        prop_assert!(url.contains(&expected_market));
        prop_assert!(url.contains("exportFormat=xlsx"));
        let expected_suffix = format!("date={}", request.date.format("%Y-%m-%d"));
        prop_assert!(url.ends_with(&expected_suffix));
    }
}
