mod common;

use axum::http::StatusCode;
use common::{decimal, id_of, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

fn delivery(beam_id: &str, good: i32, damaged: i32, price: &str, date: &str) -> serde_json::Value {
    json!({
        "beam_id": beam_id,
        "delivery_date": date,
        "design_name": "Zari Border",
        "price_per_piece": price,
        "good_pieces": good,
        "damaged_pieces": damaged,
    })
}

#[tokio::test]
async fn ledger_end_to_end_scenario() {
    let app = TestApp::new().await;
    let fixture = app.loom_fixture().await;
    let beam = app.start_fixture_beam(&fixture, "WB001").await;
    let beam_id = id_of(&beam);
    assert_eq!(beam["status"], "active");
    assert_eq!(beam["workshop_name"], "W1");
    assert_eq!(beam["customer_name"], "C1");
    assert_eq!(beam["machine_number"], 1);
    assert_eq!(beam["fabric_type"], "veshti");

    let (status, first) = app
        .record_delivery(delivery(&beam_id, 90, 10, "60", "2024-01-05"))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{first}");
    assert_eq!(decimal(&first["meters_used"]), dec!(400));
    assert_eq!(decimal(&first["total_amount"]), dec!(5400));

    let (_, detail) = app.get(&format!("/api/beams/{beam_id}")).await;
    assert_eq!(decimal(&detail["totals"]["remaining_meters"]), dec!(600));
    assert_eq!(decimal(&detail["totals"]["total_amount"]), dec!(5400));
    assert_eq!(decimal(&detail["beam"]["remaining_meters"]), dec!(600));

    let (status, _) = app
        .record_delivery(delivery(&beam_id, 50, 0, "60", "2024-01-06"))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, detail) = app.get(&format!("/api/beams/{beam_id}")).await;
    let totals = &detail["totals"];
    assert_eq!(decimal(&totals["remaining_meters"]), dec!(400));
    assert_eq!(totals["total_good"], 140);
    assert_eq!(totals["total_damaged"], 10);
    assert_eq!(totals["estimated_pieces_remaining"], 100);
    assert_eq!(decimal(&totals["meter_usage_percentage"]), dec!(60));
    assert_eq!(detail["deliveries"].as_array().unwrap().len(), 2);
    // Newest first.
    assert_eq!(detail["deliveries"][0]["delivery_date"], "2024-01-06");

    let (status, ended) = app.post(&format!("/api/beams/{beam_id}/end"), json!({})).await;
    assert_eq!(status, StatusCode::OK, "{ended}");
    assert_eq!(ended["status"], "completed");
    let today = chrono::Utc::now().date_naive().to_string();
    assert_eq!(ended["end_date"], today.as_str());

    let (_, active) = app.get("/api/beams?status=active").await;
    assert!(active["beams"].as_array().unwrap().is_empty());

    let (_, completed) = app.get("/api/beams?status=completed").await;
    assert_eq!(completed["beams"][0]["beam_number"], "WB001");
}

#[tokio::test]
async fn over_capacity_delivery_is_rejected_and_exact_fill_accepted() {
    let app = TestApp::new().await;
    let fixture = app.loom_fixture().await;
    let beam_id = id_of(&app.start_fixture_beam(&fixture, "WB002").await);

    let (status, _) = app
        .record_delivery(delivery(&beam_id, 200, 0, "50", "2024-01-02"))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // 51 pieces * 4 m = 204 m against 200 m remaining.
    let (status, body) = app
        .record_delivery(delivery(&beam_id, 50, 1, "50", "2024-01-03"))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "CAPACITY_EXCEEDED");
    assert_eq!(decimal(&body["details"]["remaining_meters"]), dec!(200));
    assert_eq!(decimal(&body["details"]["requested_meters"]), dec!(204));

    let (status, _) = app
        .record_delivery(delivery(&beam_id, 45, 5, "50", "2024-01-03"))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, detail) = app.get(&format!("/api/beams/{beam_id}")).await;
    assert_eq!(decimal(&detail["totals"]["remaining_meters"]), dec!(0));
    assert_eq!(detail["beam"]["status"], "active");
}

#[tokio::test]
async fn client_supplied_derived_fields_are_ignored() {
    let app = TestApp::new().await;
    let fixture = app.loom_fixture().await;
    let beam_id = id_of(&app.start_fixture_beam(&fixture, "WB003").await);

    let mut body = delivery(&beam_id, 90, 10, "60", "2024-01-05");
    body["meters_used"] = json!("1");
    body["total_amount"] = json!("999999");
    let (status, created) = app.record_delivery(body).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(decimal(&created["meters_used"]), dec!(400));
    assert_eq!(decimal(&created["total_amount"]), dec!(5400));
}

#[tokio::test]
async fn duplicate_beam_number_conflicts_and_leaves_first_untouched() {
    let app = TestApp::new().await;
    let fixture = app.loom_fixture().await;
    let first = app.start_fixture_beam(&fixture, "WB010").await;

    let other_machine = app.create_machine(&fixture.workshop_id, 2, "veshti").await;
    let (status, body) = app
        .start_beam(json!({
            "beam_number": "WB010",
            "machine_id": id_of(&other_machine),
            "customer_id": fixture.customer_id,
            "total_beam_meters": "500",
            "meters_per_piece": "2",
        }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "DUPLICATE_BEAM_NUMBER");

    let (_, detail) = app.get(&format!("/api/beams/{}", id_of(&first))).await;
    assert_eq!(decimal(&detail["beam"]["total_beam_meters"]), dec!(1000));
    assert_eq!(detail["beam"]["machine_id"], first["machine_id"]);
}

#[tokio::test]
async fn occupied_machine_frees_up_after_end_beam() {
    let app = TestApp::new().await;
    let fixture = app.loom_fixture().await;
    let first = app.start_fixture_beam(&fixture, "WB020").await;

    let (status, body) = app
        .start_beam(json!({
            "beam_number": "WB021",
            "machine_id": fixture.machine_id,
            "customer_id": fixture.customer_id,
            "total_beam_meters": "800",
            "meters_per_piece": "4",
        }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "MACHINE_OCCUPIED");
    assert_eq!(body["details"]["active_beam_number"], "WB020");

    let (status, _) = app
        .post(&format!("/api/beams/{}/end", id_of(&first)), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);

    app.start_fixture_beam(&fixture, "WB021").await;
}

#[tokio::test]
async fn completed_beams_are_terminal() {
    let app = TestApp::new().await;
    let fixture = app.loom_fixture().await;
    let beam_id = id_of(&app.start_fixture_beam(&fixture, "WB030").await);

    let (status, _) = app.post(&format!("/api/beams/{beam_id}/end"), json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .record_delivery(delivery(&beam_id, 1, 0, "60", "2024-01-05"))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "BEAM_NOT_ACTIVE");

    let (status, body) = app.post(&format!("/api/beams/{beam_id}/end"), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ALREADY_COMPLETED");
}

#[tokio::test]
async fn delete_beam_cascades_to_deliveries() {
    let app = TestApp::new().await;
    let fixture = app.loom_fixture().await;
    let beam_id = id_of(&app.start_fixture_beam(&fixture, "WB040").await);
    for day in ["2024-01-02", "2024-01-03"] {
        let (status, _) = app.record_delivery(delivery(&beam_id, 10, 0, "60", day)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    assert_eq!(
        app.delete(&format!("/api/beams/{beam_id}")).await,
        StatusCode::NO_CONTENT
    );

    let (status, body) = app.get(&format!("/api/beams/{beam_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "BEAM_NOT_FOUND");

    let (_, listed) = app.get(&format!("/api/deliveries?beam_id={beam_id}")).await;
    assert!(listed["deliveries"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn deleting_a_delivery_restores_remaining_meters() {
    let app = TestApp::new().await;
    let fixture = app.loom_fixture().await;
    let beam_id = id_of(&app.start_fixture_beam(&fixture, "WB050").await);
    let (_, created) = app
        .record_delivery(delivery(&beam_id, 90, 10, "60", "2024-01-05"))
        .await;

    assert_eq!(
        app.delete(&format!("/api/deliveries/{}", id_of(&created))).await,
        StatusCode::NO_CONTENT
    );
    let (_, detail) = app.get(&format!("/api/beams/{beam_id}")).await;
    assert_eq!(decimal(&detail["totals"]["remaining_meters"]), dec!(1000));
}

#[tokio::test]
async fn invalid_quantities_are_rejected() {
    let app = TestApp::new().await;
    let fixture = app.loom_fixture().await;

    let (status, body) = app
        .start_beam(json!({
            "beam_number": "WB060",
            "machine_id": fixture.machine_id,
            "customer_id": fixture.customer_id,
            "total_beam_meters": "0",
            "meters_per_piece": "4",
        }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_QUANTITY");

    let beam_id = id_of(&app.start_fixture_beam(&fixture, "WB061").await);
    let (status, body) = app
        .record_delivery(delivery(&beam_id, -1, 0, "60", "2024-01-05"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_QUANTITY");

    let (status, body) = app
        .record_delivery(delivery(&beam_id, 1, 0, "-5", "2024-01-05"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_QUANTITY");
}

#[tokio::test]
async fn quantities_must_fit_their_columns() {
    let app = TestApp::new().await;
    let fixture = app.loom_fixture().await;

    let (status, body) = app
        .start_beam(json!({
            "beam_number": "WB080",
            "machine_id": fixture.machine_id,
            "customer_id": fixture.customer_id,
            "total_beam_meters": "7e28",
            "meters_per_piece": "3e28",
        }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["code"], "INVALID_QUANTITY");

    let (status, body) = app
        .start_beam(json!({
            "beam_number": "WB080",
            "machine_id": fixture.machine_id,
            "customer_id": fixture.customer_id,
            "total_beam_meters": "1000",
            "meters_per_piece": "4.0005",
        }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_QUANTITY");

    let beam_id = id_of(&app.start_fixture_beam(&fixture, "WB081").await);

    // Sub-paisa prices would be rounded by the column and break the stored amount.
    let (status, body) = app
        .record_delivery(delivery(&beam_id, 90, 0, "10.555", "2024-01-05"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_QUANTITY");

    let (status, body) = app
        .record_delivery(delivery(&beam_id, 200, 0, "9999999999.99", "2024-01-05"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_QUANTITY");

    let (_, detail) = app.get(&format!("/api/beams/{beam_id}")).await;
    assert_eq!(decimal(&detail["totals"]["remaining_meters"]), dec!(1000));

    let (status, body) = app
        .record_delivery(delivery(&beam_id, 90, 0, "10.550", "2024-01-05"))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(decimal(&body["total_amount"]), dec!(949.5));
}

#[tokio::test]
async fn beam_must_match_machine_workshop_and_fabric() {
    let app = TestApp::new().await;
    let fixture = app.loom_fixture().await;

    let (status, body) = app
        .start_beam(json!({
            "beam_number": "WB070",
            "machine_id": fixture.machine_id,
            "customer_id": fixture.customer_id,
            "fabric_type": "saree",
            "total_beam_meters": "1000",
            "meters_per_piece": "4",
        }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = app
        .start_beam(json!({
            "beam_number": "WB071",
            "machine_id": fixture.machine_id,
            "customer_id": uuid::Uuid::new_v4(),
            "total_beam_meters": "1000",
            "meters_per_piece": "4",
        }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn unknown_beam_and_unknown_fields() {
    let app = TestApp::new().await;

    let (status, body) = app
        .record_delivery(delivery(
            &uuid::Uuid::new_v4().to_string(),
            1,
            0,
            "60",
            "2024-01-05",
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "BEAM_NOT_FOUND");

    let (status, body) = app
        .start_beam(json!({ "beam_number": "X", "colour": "red" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn legacy_add_route_records_deliveries() {
    let app = TestApp::new().await;
    let fixture = app.loom_fixture().await;
    let beam_id = id_of(&app.start_fixture_beam(&fixture, "WB080").await);

    let (status, created) = app
        .post(
            "/api/deliveries/add",
            delivery(&beam_id, 10, 0, "60", "2024-01-05"),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(decimal(&created["meters_used"]), dec!(40));
}

#[tokio::test]
async fn auto_complete_closes_a_fully_used_beam() {
    let app = TestApp::with_config(|cfg| cfg.beam_auto_complete = true).await;
    let fixture = app.loom_fixture().await;
    let beam_id = id_of(&app.start_fixture_beam(&fixture, "WB090").await);

    let (status, _) = app
        .record_delivery(delivery(&beam_id, 240, 10, "60", "2024-01-05"))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, detail) = app.get(&format!("/api/beams/{beam_id}")).await;
    assert_eq!(detail["beam"]["status"], "completed");
}
