//! Integration tests for the EV insights dashboard.
//!
//! These tests load the CSV fixtures from disk and verify end-to-end
//! behavior: loading, cascading filters, aggregation, recommendations and
//! the CSV export.

use ev_insights::{
    Dashboard, DashboardConfig, Datasets, InsightsError, RegionFilter, Selection,
    available_cities, filter_records,
};
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::sync::Arc;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture_config() -> DashboardConfig {
    DashboardConfig::builder()
        .geo_path(fixtures_path().join("ev_geo_data.csv"))
        .concerns_path(fixtures_path().join("ev_concerns_sample.csv"))
        .build()
        .expect("Fixture config should be valid")
}

fn load_dashboard() -> Dashboard {
    let datasets = Datasets::load(&fixture_config()).expect("Fixtures should load");
    Dashboard::new(Arc::new(datasets))
}

fn fired(snapshot: &ev_insights::DashboardSnapshot) -> Vec<&str> {
    snapshot
        .recommendations
        .iter()
        .map(|r| r.rule.as_str())
        .collect()
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_fixtures_load() {
    let dashboard = load_dashboard();
    assert_eq!(dashboard.datasets().geo().height(), 9);
    assert_eq!(dashboard.datasets().concerns().height(), 10);
}

#[test]
fn test_missing_file_fails_load() {
    let config = DashboardConfig::builder()
        .geo_path(fixtures_path().join("missing.csv"))
        .concerns_path(fixtures_path().join("ev_concerns_sample.csv"))
        .build()
        .unwrap();

    let err = Datasets::load(&config).unwrap_err();
    assert!(matches!(err, InsightsError::DataLoad { .. }));
    assert!(err.is_data_load_error());
}

#[test]
fn test_malformed_numeric_cell_fails_load() {
    let config = DashboardConfig::builder()
        .geo_path(fixtures_path().join("malformed_geo.csv"))
        .concerns_path(fixtures_path().join("ev_concerns_sample.csv"))
        .build()
        .unwrap();

    let err = Datasets::load(&config).unwrap_err();
    assert_eq!(err.error_code(), "MALFORMED_COLUMN");
    assert!(err.to_string().contains("median_income"));
}

#[test]
fn test_nan_cells_are_skipped() {
    let config = fixture_config()
        .to_builder()
        .geo_path(fixtures_path().join("nan_geo.csv"))
        .build()
        .unwrap();
    let dashboard = Dashboard::new(Arc::new(Datasets::load(&config).unwrap()));
    let snapshot = dashboard
        .snapshot(&Selection::new("TX", "Austin"), 3)
        .unwrap();

    assert_eq!(snapshot.metrics.zip_count, 2);
    assert_eq!(snapshot.metrics.total_predicted_sales_whole(), 120);
    assert_eq!(snapshot.metrics.avg_ev_share, Some(0.08));

    let order: Vec<&str> = snapshot.top_zips.iter().map(|z| z.zip.as_str()).collect();
    assert_eq!(order, vec!["78701", "78702"]);
    assert_eq!(snapshot.top_zips[1].population, None);

    // Income averages 77,500 so no partnership; share 0.08 is low
    assert_eq!(
        fired(&snapshot),
        vec![
            "prioritize_top_zip",
            "address_top_concern",
            "buyer_education"
        ]
    );
    assert!(snapshot.recommendations[0].message.contains("ZIP 78701"));
}

#[test]
fn test_leading_zero_zip_survives_load() {
    let snapshot = load_dashboard()
        .snapshot(&Selection::new("MA", "Boston"), 3)
        .unwrap();

    assert_eq!(snapshot.top_zips[0].zip, "02108");
    assert_eq!(snapshot.concerns[0].concern, "Cold weather performance");
}

// ============================================================================
// Selection & Filtering
// ============================================================================

#[test]
fn test_default_selection_is_tx_austin() {
    let dashboard = load_dashboard();
    let selection = dashboard.default_selection(&fixture_config()).unwrap();
    assert_eq!(selection, Selection::new("TX", "Austin"));
}

#[test]
fn test_options_cascade_on_state() {
    let dashboard = load_dashboard();

    let tx = dashboard.options(&"TX".into()).unwrap();
    assert_eq!(tx.states, vec!["CA", "MA", "TX", "WA"]);
    assert_eq!(tx.cities, vec!["Austin", "Dallas", "Houston"]);

    let all = dashboard.options(&RegionFilter::All).unwrap();
    assert_eq!(all.cities.len(), 7);
    assert!(all.cities.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_filtered_cities_belong_to_state() {
    let dashboard = load_dashboard();
    let geo = dashboard.datasets().geo();

    for city in available_cities(geo, &"CA".into()).unwrap() {
        let rows = filter_records(geo, &"CA".into(), &RegionFilter::Only(city)).unwrap();
        assert!(rows.height() > 0);
    }
}

// ============================================================================
// End-to-End Snapshots
// ============================================================================

#[test]
fn test_snapshot_tx_austin() {
    let snapshot = load_dashboard()
        .snapshot(&Selection::new("TX", "Austin"), 5)
        .unwrap();

    assert_eq!(snapshot.metrics.zip_count, 3);
    assert_eq!(snapshot.metrics.total_predicted_sales_whole(), 320);
    assert_eq!(snapshot.metrics.avg_median_income_whole(), Some(81000));
    assert_eq!(snapshot.metrics.avg_charging_stations_whole(), Some(70));

    let order: Vec<&str> = snapshot.top_zips.iter().map(|z| z.zip.as_str()).collect();
    assert_eq!(order, vec!["78701", "78704", "78702"]);

    assert_eq!(snapshot.concerns[0].concern, "Charging availability");
    assert_eq!(snapshot.concerns[0].mention_count, 150);

    // Thin charging and high income, but EV share (0.13) is healthy
    assert_eq!(
        fired(&snapshot),
        vec![
            "prioritize_top_zip",
            "address_top_concern",
            "charging_partnership"
        ]
    );
    assert_eq!(snapshot.map.points.len(), 3);
    assert_eq!(snapshot.map.view.zoom, 8.0);
}

#[test]
fn test_snapshot_whole_state() {
    let snapshot = load_dashboard()
        .snapshot(&Selection::new("TX", "ALL"), 3)
        .unwrap();

    assert_eq!(snapshot.metrics.zip_count, 5);
    assert_eq!(snapshot.metrics.total_predicted_sales_whole(), 475);
    assert_eq!(snapshot.top_zips.len(), 3);
    assert_eq!(snapshot.top_zips[0].zip, "78701");

    // Income averages 79,200 so no partnership; share averages 0.108
    assert_eq!(
        fired(&snapshot),
        vec![
            "prioritize_top_zip",
            "address_top_concern",
            "buyer_education"
        ]
    );
}

#[test]
fn test_snapshot_everything() {
    let snapshot = load_dashboard().snapshot(&Selection::all(), 10).unwrap();

    assert_eq!(snapshot.top_zips.len(), 9);
    assert_eq!(snapshot.top_zips[0].zip, "94103");
    assert_eq!(snapshot.concerns[0].concern, "Purchase price");

    let mentions: i64 = snapshot.concerns.iter().map(|c| c.mention_count).sum();
    assert_eq!(mentions, 870);
    assert_eq!(snapshot.map.view.zoom, 3.5);
}

#[test]
fn test_snapshot_empty_region() {
    let snapshot = load_dashboard()
        .snapshot(&Selection::new("NV", "ALL"), 5)
        .unwrap();

    assert_eq!(snapshot.metrics.zip_count, 0);
    assert_eq!(snapshot.metrics.total_predicted_sales_whole(), 0);
    assert_eq!(snapshot.metrics.avg_ev_share, None);
    assert!(snapshot.options.cities.is_empty());
    assert_eq!(snapshot.map.view.latitude, 39.5);
    assert_eq!(fired(&snapshot), vec!["maintain_strategy"]);
}

// ============================================================================
// Export
// ============================================================================

#[test]
fn test_export_top_zips_csv() {
    let bytes = load_dashboard()
        .top_zips_csv(&Selection::new("TX", "Austin"), 3)
        .unwrap();
    let csv = String::from_utf8(bytes).unwrap();
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(
        lines,
        vec![
            "ZIP,City,State,Population,Median income,Charging stations,Predicted sales (12m)",
            "78701,Austin,TX,12000,95000,50,120",
            "78704,Austin,TX,45000,88000,70,120",
            "78702,Austin,TX,22000,60000,90,80",
        ]
    );
}

#[test]
fn test_config_file_round_trip() {
    let config = fixture_config();
    let json = serde_json::to_string(&config).unwrap();
    let back: DashboardConfig = serde_json::from_str(&json).unwrap();

    assert_eq!(back.geo_path, config.geo_path);
    assert_eq!(back.top_k, 5);
    assert!(Datasets::load(&back).is_ok());
}
