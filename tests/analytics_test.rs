mod common;

use axum::http::StatusCode;
use chrono::Utc;
use common::{decimal, id_of, TestApp};
use rust_decimal_macros::dec;
use serde_json::{json, Value};

/// W1 (veshti, machine 1, beam WB001) and W2 (saree, machine 1, beam SB001),
/// both for customer C1, each with one delivery dated today.
async fn two_workshop_floor(app: &TestApp) -> (String, String) {
    let fixture = app.loom_fixture().await;
    let veshti_beam = id_of(&app.start_fixture_beam(&fixture, "WB001").await);

    let saree_shop = id_of(&app.create_workshop("W2", "saree").await);
    let saree_machine = id_of(&app.create_machine(&saree_shop, 1, "saree").await);
    let (status, saree_beam) = app
        .start_beam(json!({
            "beam_number": "SB001",
            "machine_id": saree_machine,
            "customer_id": fixture.customer_id,
            "total_beam_meters": "600",
            "meters_per_piece": "6",
            "start_date": "2024-01-01",
        }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{saree_beam}");
    let saree_beam = id_of(&saree_beam);

    let today = Utc::now().date_naive().to_string();
    for (beam_id, good, damaged, price) in [
        (&veshti_beam, 20, 5, "60"),
        (&saree_beam, 10, 0, "250"),
    ] {
        let (status, body) = app
            .record_delivery(json!({
                "beam_id": beam_id,
                "delivery_date": today,
                "design_name": "Temple Border",
                "price_per_piece": price,
                "good_pieces": good,
                "damaged_pieces": damaged,
            }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }
    (veshti_beam, saree_beam)
}

fn names(entries: &Value, key: &str) -> Vec<String> {
    entries
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e[key].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn overview_sums_the_current_month() {
    let app = TestApp::new().await;
    two_workshop_floor(&app).await;

    let (status, body) = app.get("/api/dashboard/overview").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["active_beams"], 2);
    assert_eq!(body["total_pieces_this_month"], 30);
    assert_eq!(body["total_damaged_this_month"], 5);
    assert_eq!(decimal(&body["pending_amount_this_month"]), dec!(3700));
    assert_eq!(names(&body["workshop_production"], "workshop_name"), vec!["W1", "W2"]);
    assert_eq!(body["customer_summary"][0]["customer_name"], "C1");
    assert_eq!(body["customer_summary"][0]["total_pieces"], 30);

    let (_, veshti) = app.get("/api/dashboard/overview?fabric_type=veshti").await;
    assert_eq!(veshti["active_beams"], 1);
    assert_eq!(veshti["total_pieces_this_month"], 20);
    assert_eq!(decimal(&veshti["pending_amount_this_month"]), dec!(1200));
}

#[tokio::test]
async fn overview_rejects_inverted_windows() {
    let app = TestApp::new().await;
    let (status, body) = app
        .get("/api/dashboard/overview?start_date=2024-02-01&end_date=2024-01-01")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn production_trend_is_chart_ready() {
    let app = TestApp::new().await;
    two_workshop_floor(&app).await;

    let (status, body) = app.get("/api/analytics/production-trend?days=7").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["workshops"], json!(["W1", "W2"]));
    let point = &body["data"][0];
    assert_eq!(point["date"], Utc::now().date_naive().to_string().as_str());
    assert_eq!(point["W1"], 20);
    assert_eq!(point["W2"], 10);

    let (_, saree) = app
        .get("/api/analytics/production-trend?days=7&fabric_type=saree")
        .await;
    assert_eq!(saree["workshops"], json!(["W2"]));
}

#[tokio::test]
async fn production_trend_bounds_days() {
    let app = TestApp::new().await;
    for days in ["0", "366"] {
        let (status, body) = app
            .get(&format!("/api/analytics/production-trend?days={days}"))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn fabric_distribution_counts_good_pieces_per_fabric() {
    let app = TestApp::new().await;
    two_workshop_floor(&app).await;

    let (status, body) = app.get("/api/analytics/fabric-distribution").await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data[0]["name"], "veshti");
    assert_eq!(data[0]["value"], 20);
    assert_eq!(data[0]["beams"], 1);
    assert_eq!(data[1]["name"], "saree");
    assert_eq!(data[1]["value"], 10);
}

#[tokio::test]
async fn machine_quality_reports_damage_rates() {
    let app = TestApp::new().await;
    two_workshop_floor(&app).await;

    let (status, body) = app.get("/api/analytics/machine-quality").await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data[0]["machine_name"], "W1 M1");
    assert_eq!(data[0]["total_pieces"], 25);
    assert_eq!(decimal(&data[0]["damage_rate_by_pieces"]), dec!(20));
    assert_eq!(data[1]["machine_name"], "W2 M1");
    assert_eq!(decimal(&data[1]["damage_rate_by_pieces"]), dec!(0));
}

#[tokio::test]
async fn workshop_machine_production_follows_active_beams() {
    let app = TestApp::new().await;
    let (veshti_beam, _) = two_workshop_floor(&app).await;

    let (status, body) = app.get("/api/analytics/workshop-machine-production").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body["data"], "workshop_name"), vec!["W1", "W2"]);
    assert_eq!(body["data"][0]["machines"][0]["production"], 25);

    let (status, _) = app
        .post(&format!("/api/beams/{veshti_beam}/end"), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get("/api/analytics/workshop-machine-production").await;
    assert_eq!(names(&body["data"], "workshop_name"), vec!["W2"]);
}

#[tokio::test]
async fn beam_report_lists_overlapping_beams_with_totals() {
    let app = TestApp::new().await;
    two_workshop_floor(&app).await;

    let (status, body) = app
        .get("/api/reports/beam-details?start_date=2024-01-01&end_date=2024-01-31")
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let rows = body["beams"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    let veshti = rows.iter().find(|r| r["beam_number"] == "WB001").unwrap();
    assert_eq!(veshti["workshop"], "W1");
    assert_eq!(veshti["customer"], "C1");
    assert_eq!(veshti["total_pieces"], 25);
    assert_eq!(decimal(&veshti["remaining_meters"]), dec!(900));

    let (status, _) = app
        .get("/api/reports/beam-details?start_date=2024-02-01&end_date=2024-01-01")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.get("/api/reports/beam-details").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn delivery_report_filters_by_workshop() {
    let app = TestApp::new().await;
    two_workshop_floor(&app).await;
    let today = Utc::now().date_naive();

    let (status, body) = app
        .get(&format!(
            "/api/reports/delivery-details?start_date={today}&end_date={today}"
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["deliveries"].as_array().unwrap().len(), 2);

    let (_, workshops) = app.get("/api/workshops").await;
    let w2 = workshops["workshops"]
        .as_array()
        .unwrap()
        .iter()
        .find(|w| w["name"] == "W2")
        .map(id_of)
        .unwrap();
    let (_, body) = app
        .get(&format!(
            "/api/reports/delivery-details?start_date={today}&end_date={today}&workshop_id={w2}"
        ))
        .await;
    let rows = body["deliveries"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["beam_number"], "SB001");
    assert_eq!(decimal(&rows[0]["total_amount"]), dec!(2500));
}
