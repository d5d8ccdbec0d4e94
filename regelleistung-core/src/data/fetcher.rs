//! Tender fetcher: one GET per delivery day, concatenated, optionally normalized.
//!
//! Days are fetched strictly in the order given and the first failing day
//! aborts the whole range; there are no partial results.

use super::http::ReqwestTransport;
use super::postprocess::Postprocess;
use super::provider::{DataError, HttpTransport};
use super::table::{concat_tables, NormalizedTable, RawTable, Table};
use super::workbook::parse_xlsx;
use crate::config::ClientConfig;
use crate::domain::{FetchRequest, FetcherConfig, Variant};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Fetch and parse the report for one delivery day.
///
/// Fails with `FutureDate` before any network call when the day starts after
/// the current local time, and with `ContentNotFound` on any status but 200.
pub fn fetch_single_day(
    transport: &dyn HttpTransport,
    client: &ClientConfig,
    request: &FetchRequest,
) -> Result<RawTable, DataError> {
    fetch_single_day_as_of(transport, client, request, Local::now().naive_local())
}

/// Same as [`fetch_single_day`] against a fixed "now".
pub fn fetch_single_day_as_of(
    transport: &dyn HttpTransport,
    client: &ClientConfig,
    request: &FetchRequest,
    now: NaiveDateTime,
) -> Result<RawTable, DataError> {
    if request.date.and_time(NaiveTime::MIN) > now {
        return Err(DataError::FutureDate {
            date: request.date_param(),
        });
    }

    let url = request.url(&client.base_url);
    debug!(%url, "fetching tender report");
    let response = transport.get(&url)?;

    if response.status != 200 {
        return Err(DataError::ContentNotFound {
            date: request.date_param(),
            status: response.status,
        });
    }

    let frame = parse_xlsx(&response.body)?;
    if frame.height() == 0 {
        warn!(date = %request.date, "tender report has no rows");
    }
    debug!(date = %request.date, rows = frame.height(), "parsed tender report");
    Ok(frame)
}

/// Every calendar day from `start` to `end`, both inclusive.
pub fn dates_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|day| *day <= end).collect()
}

/// Fetcher bound to one tender report.
pub struct MarketDataFetcher {
    config: FetcherConfig,
    strategy: Postprocess,
    client: ClientConfig,
    transport: Arc<dyn HttpTransport>,
}

impl MarketDataFetcher {
    /// Fetcher for `variant` with the default client.
    pub fn new(variant: Variant) -> Result<Self, DataError> {
        Self::with_client_config(variant, ClientConfig::default())
    }

    pub fn with_client_config(variant: Variant, client: ClientConfig) -> Result<Self, DataError> {
        let transport = Arc::new(ReqwestTransport::new(&client)?);
        Ok(Self::with_transport(variant.config(), client, transport))
    }

    /// Fetcher for an arbitrary product/market/report triple over a custom transport.
    pub fn with_transport(
        config: FetcherConfig,
        client: ClientConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            strategy: Postprocess::for_config(&config),
            config,
            client,
            transport,
        }
    }

    pub fn fcr_results() -> Result<Self, DataError> {
        Self::new(Variant::FcrResults)
    }

    pub fn fcr_anonymous_bids() -> Result<Self, DataError> {
        Self::new(Variant::FcrAnonymousBids)
    }

    pub fn afrr_capacity_results() -> Result<Self, DataError> {
        Self::new(Variant::AfrrCapacityResults)
    }

    pub fn afrr_capacity_anonymous_bids() -> Result<Self, DataError> {
        Self::new(Variant::AfrrCapacityAnonymousBids)
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    pub fn client_config(&self) -> &ClientConfig {
        &self.client
    }

    pub fn postprocess_strategy(&self) -> Postprocess {
        self.strategy
    }

    /// Fetch every day in `dates` (in order) and stack the tables.
    ///
    /// With `postprocess`, the stacked table is run through this report's
    /// transform and returned as [`Table::Normalized`].
    pub fn fetch_range(&self, dates: &[NaiveDate], postprocess: bool) -> Result<Table, DataError> {
        self.fetch_range_as_of(dates, postprocess, Local::now().naive_local())
    }

    /// Same as [`fetch_range`](Self::fetch_range) against a fixed "now".
    pub fn fetch_range_as_of(
        &self,
        dates: &[NaiveDate],
        postprocess: bool,
        now: NaiveDateTime,
    ) -> Result<Table, DataError> {
        if dates.is_empty() {
            return Err(DataError::EmptyDateRange);
        }

        let mut days = Vec::with_capacity(dates.len());
        for date in dates {
            let request = self.config.request_for(*date);
            days.push(fetch_single_day_as_of(
                self.transport.as_ref(),
                &self.client,
                &request,
                now,
            )?);
        }

        let combined = concat_tables(days)?;
        info!(
            report = %self.config,
            days = dates.len(),
            rows = combined.height(),
            "fetched tender range"
        );

        if postprocess {
            Ok(Table::Normalized(self.postprocess(combined)?))
        } else {
            Ok(Table::Raw(combined))
        }
    }

    /// Apply this report's transform to an already fetched table.
    pub fn postprocess(&self, raw: RawTable) -> Result<NormalizedTable, DataError> {
        self.strategy
            .apply(raw, &self.config, self.client.ambiguous_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AmbiguousTimePolicy;
    use crate::data::provider::HttpResponse;
    use chrono::{FixedOffset, TimeZone};
    use polars::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTransport {
        status: u16,
        calls: AtomicUsize,
    }

    impl HttpTransport for CountingTransport {
        fn get(&self, _url: &str) -> Result<HttpResponse, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(HttpResponse::status(self.status))
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn noon(date: NaiveDate) -> NaiveDateTime {
        date.and_hms_opt(12, 0, 0).unwrap()
    }

    #[test]
    fn dates_between_is_inclusive() {
        let days = dates_between(d(2024, 2, 28), d(2024, 3, 1));
        assert_eq!(days, vec![d(2024, 2, 28), d(2024, 2, 29), d(2024, 3, 1)]);
        assert_eq!(dates_between(d(2024, 3, 1), d(2024, 3, 1)).len(), 1);
        assert!(dates_between(d(2024, 3, 2), d(2024, 3, 1)).is_empty());
    }

    #[test]
    fn today_is_not_in_the_future() {
        let transport = CountingTransport {
            status: 404,
            calls: AtomicUsize::new(0),
        };
        let request = Variant::FcrResults.config().request_for(d(2024, 5, 1));
        let err = fetch_single_day_as_of(
            &transport,
            &ClientConfig::default(),
            &request,
            noon(d(2024, 5, 1)),
        )
        .unwrap_err();
        assert!(matches!(err, DataError::ContentNotFound { status: 404, .. }));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn tomorrow_is_rejected_without_network() {
        let transport = CountingTransport {
            status: 200,
            calls: AtomicUsize::new(0),
        };
        let request = Variant::FcrResults.config().request_for(d(2024, 5, 2));
        let err = fetch_single_day_as_of(
            &transport,
            &ClientConfig::default(),
            &request,
            noon(d(2024, 5, 1)),
        )
        .unwrap_err();
        match err {
            DataError::FutureDate { date } => assert_eq!(date, "2024-05-02"),
            other => panic!("expected FutureDate, got {other:?}"),
        }
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn empty_range_is_rejected() {
        let fetcher = MarketDataFetcher::with_transport(
            Variant::FcrResults.config(),
            ClientConfig::default(),
            Arc::new(CountingTransport {
                status: 200,
                calls: AtomicUsize::new(0),
            }),
        );
        assert!(matches!(
            fetcher.fetch_range(&[], true),
            Err(DataError::EmptyDateRange)
        ));
    }

    #[test]
    fn fetcher_picks_strategy_at_construction() {
        let transport: Arc<dyn HttpTransport> = Arc::new(CountingTransport {
            status: 200,
            calls: AtomicUsize::new(0),
        });
        let fcr = MarketDataFetcher::with_transport(
            Variant::FcrAnonymousBids.config(),
            ClientConfig::default(),
            transport.clone(),
        );
        assert!(fcr.postprocess_strategy().is_implemented());

        let afrr = MarketDataFetcher::with_transport(
            Variant::AfrrCapacityAnonymousBids.config(),
            ClientConfig::default(),
            transport,
        );
        assert_eq!(afrr.postprocess_strategy(), Postprocess::Unimplemented);
    }

    #[test]
    fn client_dst_policy_reaches_postprocess() {
        let fall_back = || {
            df!(
                "DATE_FROM" => &["2024-10-27"],
                "PRODUCTNAME" => &["X_02_Y"],
            )
            .unwrap()
        };
        let fetcher_with = |policy| {
            MarketDataFetcher::with_transport(
                Variant::FcrResults.config(),
                ClientConfig {
                    ambiguous_time: policy,
                    ..ClientConfig::default()
                },
                Arc::new(CountingTransport {
                    status: 200,
                    calls: AtomicUsize::new(0),
                }),
            )
        };

        let table = fetcher_with(AmbiguousTimePolicy::Latest)
            .postprocess(fall_back())
            .unwrap();
        let millis = table.index().cast(&DataType::Int64).unwrap();
        let expected = FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2024, 10, 27, 2, 0, 0)
            .unwrap()
            .timestamp_millis();
        assert_eq!(millis.i64().unwrap().get(0), Some(expected));

        let err = fetcher_with(AmbiguousTimePolicy::Reject)
            .postprocess(fall_back())
            .unwrap_err();
        assert!(matches!(err, DataError::Parse(_)));
    }
}
