// src/tests/router_tests/stats_tests.rs
use http::Method;
use serde_json::json;

use crate::db::readings::insert_reading;
use crate::domain::resource::Resource;
use crate::tests::utils::{body_json, login_as, now_unix, send, test_state};

#[test]
fn weekly_averages_reflect_recent_readings() {
    let state = test_state();
    let token = login_as(&state, "user@example.com", "user");
    let now = now_unix();

    state
        .db
        .with_conn(|conn| {
            insert_reading(conn, "Fatih", Resource::Electricity, 10.0, "kWh", now - 3600, false)?;
            insert_reading(conn, "Fatih", Resource::Electricity, 20.0, "kWh", now - 7200, false)?;
            // eight days old, outside the weekly window
            insert_reading(conn, "Fatih", Resource::Electricity, 500.0, "kWh", now - 8 * 86_400, false)?;
            Ok(())
        })
        .unwrap();

    let resp = send(
        &state,
        Method::GET,
        "/api/readings/weekly-averages",
        Some(&token),
        None,
    );
    assert_eq!(resp.status(), 200);

    let body = body_json(resp);
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["neighborhood"], "Fatih");
    assert_eq!(rows[0]["resource"], "electricity");
    assert_eq!(rows[0]["average"], 15.0);
}

#[test]
fn search_requires_its_parameter() {
    let state = test_state();
    let token = login_as(&state, "user@example.com", "user");
    let now = now_unix();

    state
        .db
        .with_conn(|conn| {
            insert_reading(conn, "Sanayi", Resource::Gas, 1.0, "m3", now, false)
        })
        .unwrap();

    let missing = send(&state, Method::GET, "/api/readings/search", Some(&token), None);
    assert_eq!(missing.status(), 400);

    let found = body_json(send(
        &state,
        Method::GET,
        "/api/readings/search?query=sana",
        Some(&token),
        None,
    ));
    assert_eq!(found["data"], json!(["Sanayi"]));
}

#[test]
fn dashboard_marks_baseline_fallbacks() {
    let state = test_state();
    let token = login_as(&state, "user@example.com", "user");
    let now = now_unix();

    state
        .db
        .with_conn(|conn| {
            insert_reading(conn, "Fatih", Resource::Water, 42.0, "m3", now - 100, false)
        })
        .unwrap();

    let body = body_json(send(&state, Method::GET, "/api/stats/dashboard", Some(&token), None));
    let rows = body["data"].as_array().unwrap();
    // all five seeded neighborhoods are present
    assert_eq!(rows.len(), 5);

    let fatih = rows.iter().find(|r| r["neighborhood"] == "Fatih").unwrap();
    assert_eq!(fatih["water"]["average"], 42.0);
    assert_eq!(fatih["water"]["baseline"], false);
    assert_eq!(fatih["electricity"]["baseline"], true);
    assert_eq!(fatih["electricity"]["average"], 400.0);
}

#[test]
fn timeseries_validates_parameters() {
    let state = test_state();
    let token = login_as(&state, "user@example.com", "user");
    let now = now_unix();

    state
        .db
        .with_conn(|conn| {
            insert_reading(conn, "Fatih", Resource::Water, 10.0, "m3", now - 86_400, false)?;
            insert_reading(conn, "Fatih", Resource::Water, 30.0, "m3", now - 86_400, false)?;
            Ok(())
        })
        .unwrap();

    let missing = send(&state, Method::GET, "/api/stats/timeseries", Some(&token), None);
    assert_eq!(missing.status(), 400);

    let bad_resource = send(
        &state,
        Method::GET,
        "/api/stats/timeseries?neighborhood=Fatih&resource=steam",
        Some(&token),
        None,
    );
    assert_eq!(bad_resource.status(), 400);

    let ok = body_json(send(
        &state,
        Method::GET,
        "/api/stats/timeseries?neighborhood=Fatih&resource=water",
        Some(&token),
        None,
    ));
    let points = ok["data"].as_array().unwrap();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0]["average"], 20.0);
}

#[test]
fn admin_ingest_flags_outliers() {
    let state = test_state();
    let admin_token = login_as(&state, "admin@example.com", "admin");
    let now = now_unix();

    state
        .db
        .with_conn(|conn| {
            for i in 0..30 {
                insert_reading(
                    conn,
                    "Fatih",
                    Resource::Electricity,
                    100.0 + (i % 7) as f64,
                    "kWh",
                    now - 86_400 * (i + 1),
                    false,
                )?;
            }
            Ok(())
        })
        .unwrap();

    let normal = send(
        &state,
        Method::POST,
        "/api/readings",
        Some(&admin_token),
        Some(json!({ "neighborhood": "Fatih", "resource": "electricity", "amount": 102.0 })),
    );
    assert_eq!(normal.status(), 201);
    assert_eq!(body_json(normal)["data"]["anomaly"], false);

    let outlier = send(
        &state,
        Method::POST,
        "/api/readings",
        Some(&admin_token),
        Some(json!({ "neighborhood": "Fatih", "resource": "electricity", "amount": 900.0 })),
    );
    assert_eq!(outlier.status(), 201);
    assert_eq!(body_json(outlier)["data"]["anomaly"], true);

    let unknown = send(
        &state,
        Method::POST,
        "/api/readings",
        Some(&admin_token),
        Some(json!({ "neighborhood": "Atlantis", "resource": "electricity", "amount": 1.0 })),
    );
    assert_eq!(unknown.status(), 400);

    let user_token = login_as(&state, "user@example.com", "user");
    let denied = send(
        &state,
        Method::POST,
        "/api/readings",
        Some(&user_token),
        Some(json!({ "neighborhood": "Fatih", "resource": "electricity", "amount": 1.0 })),
    );
    assert_eq!(denied.status(), 403);
}
