//! Behavior-driven tests for the valuation engine
//!
//! Covers PEG, discounted cash flow, dividend discount, valuation history
//! and industry percentile ranking from the caller's point of view.

use ferroquant_core::valuation::{peg_ratio, IndustryLevel, PegBand};
use ferroquant_core::{
    compare_industry, compute_dcf, compute_ddm, compute_peg, valuation_history, AnalyticsError,
    DcfOptions, DdmOptions, FundamentalHistory, FundamentalSnapshot, IndustryOptions, Quarter,
    Symbol, TradingDate, ValuationRatio, ValuationSnapshot,
};
use ferroquant_tests::{annual_fundamentals, peer};

fn quarterly_profits(symbol: &str, rows: &[(i32, Quarter, f64, f64)]) -> FundamentalHistory {
    let symbol = Symbol::parse(symbol).expect("valid symbol");
    let snapshots = rows
        .iter()
        .map(|&(year, quarter, net_profit, pe)| {
            let mut snapshot = FundamentalSnapshot::new(symbol.clone(), year, quarter);
            snapshot.net_profit = Some(net_profit);
            snapshot.pe_ttm = Some(pe);
            snapshot
        })
        .collect();
    FundamentalHistory::new(symbol, snapshots).expect("valid history")
}

// =============================================================================
// Valuation Journey: PEG
// =============================================================================

#[test]
fn when_profit_grows_twenty_five_percent_then_peg_divides_pe_by_growth() {
    // Given: Q3 net profit rising from 80 to 100 year over year with PE 20
    let history = quarterly_profits(
        "sh.600519",
        &[(2022, Quarter::Q3, 80.0, 18.0), (2023, Quarter::Q3, 100.0, 20.0)],
    );

    // When: PEG is computed for 2023 Q3 using the reported PE
    let result = compute_peg(&history, 2023, Quarter::Q3, None).expect("peg");

    // Then: Growth is 25 % and PEG is 20 / 25
    assert!((result.growth_rate - 0.25).abs() < 1e-12);
    assert!((result.peg - 0.8).abs() < 1e-12);
    assert_eq!(result.band, PegBand::Undervalued);
    assert_eq!(result.pe, 20.0);
}

#[test]
fn when_profit_shrinks_then_peg_is_rejected_as_invalid() {
    // Given: Profit falling from 100 to 90
    let history = quarterly_profits(
        "sh.600519",
        &[(2022, Quarter::Q4, 100.0, 15.0), (2023, Quarter::Q4, 90.0, 15.0)],
    );

    // When: PEG is computed
    let err = compute_peg(&history, 2023, Quarter::Q4, Some(15.0)).expect_err("negative growth");

    // Then: The caller is told the parameter is out of domain
    assert!(matches!(err, AnalyticsError::InvalidParameter { .. }));
    assert!(peg_ratio(15.0, -0.1).is_err());
}

#[test]
fn when_prior_year_quarter_is_missing_then_peg_reports_insufficient_data() {
    let history = quarterly_profits("sh.600519", &[(2023, Quarter::Q1, 100.0, 20.0)]);

    let err = compute_peg(&history, 2023, Quarter::Q1, None).expect_err("no prior year");

    assert_eq!(err.code(), "analytics.insufficient_data");
}

// =============================================================================
// Valuation Journey: DCF and DDM
// =============================================================================

#[test]
fn when_free_cash_flow_compounds_at_ten_percent_then_dcf_projects_at_that_rate() {
    // Given: Five fiscal years of FCF growing exactly 10 % a year
    let history = annual_fundamentals(
        "sh.600519",
        &[
            (2019, 100.0, 1.0),
            (2020, 110.0, 1.0),
            (2021, 121.0, 1.0),
            (2022, 133.1, 1.0),
            (2023, 146.41, 1.0),
        ],
    );

    // When: DCF is computed with a 10 % discount and 2.5 % terminal growth
    let valuation = compute_dcf(&history, &DcfOptions::default(), None).expect("dcf");
    let projection = &valuation.projection;

    // Then: The historical CAGR is recovered
    assert!((projection.historical_growth - 0.10).abs() < 1e-9);
    assert_eq!(projection.projected.len(), 5);
    assert!((projection.projected[0] - 146.41 * 1.1).abs() < 1e-6);

    // And: Enterprise value is the discounted flows plus discounted terminal value
    let discounted_sum: f64 = projection.discounted.iter().sum();
    let expected = discounted_sum + projection.discounted_terminal_value;
    assert!(projection.enterprise_value.is_finite());
    assert!((projection.enterprise_value - expected).abs() < 1e-6);

    // And: Without liabilities and share count no per-share value is invented
    assert!(valuation.per_share.is_none());
}

#[test]
fn when_a_year_of_cash_flow_is_unreported_then_growth_still_spans_calendar_years() {
    // Given: FCF compounding at 10 % from 2019 to 2023 with 2021 unreported
    let symbol = Symbol::parse("sh.600519").expect("symbol");
    let snapshots: Vec<FundamentalSnapshot> = [
        (2019, Some(100.0)),
        (2020, Some(110.0)),
        (2021, None),
        (2022, Some(133.1)),
        (2023, Some(146.41)),
    ]
    .into_iter()
    .map(|(year, fcf)| {
        let mut snapshot = FundamentalSnapshot::new(symbol.clone(), year, Quarter::Q4);
        snapshot.free_cash_flow = fcf;
        snapshot
    })
    .collect();
    let history = FundamentalHistory::new(symbol, snapshots).expect("history");

    // When: DCF is computed
    let valuation = compute_dcf(&history, &DcfOptions::default(), None).expect("dcf");

    // Then: The missing year is not invented
    let years: Vec<i32> = valuation.years.iter().map(|point| point.year).collect();
    assert_eq!(years, [2019, 2020, 2022, 2023]);

    // And: The CAGR is taken over four years, not three data intervals
    assert!((valuation.projection.historical_growth - 0.10).abs() < 1e-9);
}

#[test]
fn when_a_dividend_year_is_skipped_then_ddm_growth_is_annualized_over_the_gap() {
    // Given: Dividends growing 5 % a year with no payment recorded for 2022
    let history = annual_fundamentals(
        "sh.601398",
        &[(2020, 10.0, 0.20), (2021, 10.0, 0.21), (2022, 10.0, 0.0), (2023, 10.0, 0.231525)],
    );

    // When: DDM is computed
    let valuation = compute_ddm(&history, &DdmOptions::default(), None).expect("ddm");

    // Then: The two-year jump counts as two years of 5 % growth
    assert_eq!(valuation.dividends.len(), 3);
    assert!((valuation.historical_growth - 0.05).abs() < 1e-9);
}

#[test]
fn when_discount_rate_equals_terminal_growth_then_dcf_is_rejected() {
    let history = annual_fundamentals("sh.600519", &[(2022, 100.0, 1.0), (2023, 110.0, 1.0)]);
    let options = DcfOptions {
        discount_rate: 0.05,
        terminal_growth_rate: 0.05,
        ..DcfOptions::default()
    };

    let err = compute_dcf(&history, &options, None).expect_err("gordon denominator is zero");

    assert!(matches!(
        err,
        AnalyticsError::InvalidParameter {
            name: "discount_rate",
            ..
        }
    ));
}

#[test]
fn when_share_count_is_known_then_dcf_reports_value_per_share() {
    // Given: Growing FCF and a latest snapshot with liabilities and shares
    let symbol = Symbol::parse("sz.000858").expect("symbol");
    let snapshots: Vec<FundamentalSnapshot> = [(2021, 50.0), (2022, 55.0), (2023, 60.5)]
        .into_iter()
        .map(|(year, fcf)| {
            let mut snapshot = FundamentalSnapshot::new(symbol.clone(), year, Quarter::Q4);
            snapshot.free_cash_flow = Some(fcf);
            snapshot.total_liabilities = Some(100.0);
            snapshot.total_shares = Some(10.0);
            snapshot
        })
        .collect();
    let history = FundamentalHistory::new(symbol, snapshots).expect("history");

    // When: DCF is computed against a share price
    let valuation = compute_dcf(&history, &DcfOptions::default(), Some(50.0)).expect("dcf");

    // Then: Equity value is enterprise value less liabilities, split per share
    let per_share = valuation.per_share.expect("per-share value");
    let expected = (valuation.projection.enterprise_value - 100.0) / 10.0;
    assert!((per_share.value_per_share - expected).abs() < 1e-9);
    assert!(per_share.premium_pct.is_some());
}

#[test]
fn when_dividends_grow_steadily_then_ddm_values_the_stream() {
    // Given: Dividends growing 5 % a year
    let history = annual_fundamentals(
        "sh.601398",
        &[(2021, 10.0, 0.20), (2022, 10.0, 0.21), (2023, 10.0, 0.2205)],
    );

    // When: DDM is computed
    let valuation = compute_ddm(&history, &DdmOptions::default(), Some(5.0)).expect("ddm");

    // Then: Growth is recovered and the value is positive and finite
    assert!((valuation.growth_rate - 0.05).abs() < 1e-9);
    assert!(valuation.intrinsic_value.is_finite() && valuation.intrinsic_value > 0.0);
    assert_eq!(valuation.dividends.len(), 3);
}

#[test]
fn when_only_one_dividend_was_ever_paid_then_ddm_needs_more_history() {
    let history = annual_fundamentals("sh.601398", &[(2022, 10.0, 0.0), (2023, 10.0, 0.3)]);

    let err = compute_ddm(&history, &DdmOptions::default(), None).expect_err("one payment");

    assert_eq!(err.code(), "analytics.insufficient_data");
}

// =============================================================================
// Valuation Journey: History and Industry
// =============================================================================

#[test]
fn when_ratio_history_is_summarized_then_missing_ratios_fail_individually() {
    // Given: Three days of PE and PB but no PS or PCF
    let days = [("2024-01-02", 20.0), ("2024-01-03", 30.0), ("2024-01-04", 25.0)];
    let snapshots: Vec<ValuationSnapshot> = days
        .into_iter()
        .map(|(date, pe)| ValuationSnapshot {
            date: TradingDate::parse(date).expect("date"),
            close: 10.0,
            pe_ttm: Some(pe),
            pb_mrq: Some(pe / 10.0),
            ps_ttm: None,
            pcf_ttm: None,
        })
        .collect();
    let symbol = Symbol::parse("sh.600519").expect("symbol");

    // When: The history is summarized
    let report = valuation_history(&symbol, &snapshots).expect("history");

    // Then: PE statistics describe the three observations
    let pe = report
        .ratios
        .iter()
        .find(|history| history.ratio == ValuationRatio::Pe)
        .expect("pe history");
    assert_eq!(pe.observations, 3);
    assert_eq!(pe.current, 25.0);
    assert_eq!((pe.min, pe.max), (20.0, 30.0));
    assert!((pe.percentile - 200.0 / 3.0).abs() < 1e-9);

    // And: PS and PCF are listed as failures
    let failed: Vec<&str> = report.failures.iter().map(|f| f.metric.as_str()).collect();
    assert_eq!(failed, ["ps", "pcf"]);
}

#[test]
fn when_a_company_has_enough_peers_then_its_percentile_is_reported() {
    // Given: A bank among three peers plus an unrelated company
    let target = peer("sh.600036", "banking", 6.0, 0.9, 2.0);
    let universe = vec![
        target.clone(),
        peer("sh.601398", "banking", 5.0, 0.6, 1.8),
        peer("sh.601288", "banking", 4.0, 0.5, 1.5),
        peer("sh.601988", "banking", 9.0, 0.7, 2.4),
        peer("sh.600519", "liquor", 30.0, 9.0, 14.0),
    ];

    // When: The industry comparison is computed
    let report = compare_industry(&target, &universe, &IndustryOptions::default())
        .expect("comparison");

    // Then: Only same-industry peers count
    assert_eq!(report.peer_count, 3);
    assert_eq!(report.industry, "banking");

    // And: The PE percentile includes the target itself
    let pe = report
        .comparisons
        .iter()
        .find(|comparison| comparison.ratio == ValuationRatio::Pe)
        .expect("pe comparison");
    assert_eq!(pe.statistics.count, 4);
    assert_eq!(pe.percentile, 75.0);
    assert_eq!(pe.level, Some(IndustryLevel::Fair));
}

#[test]
fn when_the_industry_has_a_single_peer_then_comparison_is_refused() {
    let target = peer("sh.600519", "liquor", 30.0, 9.0, 14.0);
    let universe = vec![target.clone(), peer("sz.000858", "liquor", 20.0, 5.0, 7.0)];

    let err = compare_industry(&target, &universe, &IndustryOptions::default())
        .expect_err("one peer is not an industry");

    assert!(matches!(
        err,
        AnalyticsError::InsufficientPeers {
            peers: 1,
            required: 2,
            ..
        }
    ));
}
