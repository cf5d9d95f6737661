// src/tests/router_tests/incidents_tests.rs
use http::Method;
use serde_json::json;

use crate::tests::utils::{body_json, login_as, send, test_state};

#[test]
fn incident_mutation_is_admin_gated() {
    let state = test_state();
    let user_token = login_as(&state, "user@example.com", "user");

    let payload = json!({
        "neighborhood": "Fatih",
        "resource": "water",
        "description": "burst main on the high street",
    });

    let denied = send(
        &state,
        Method::POST,
        "/api/incidents/instant",
        Some(&user_token),
        Some(payload.clone()),
    );
    assert_eq!(denied.status(), 403);

    let admin_token = login_as(&state, "admin@example.com", "admin");
    let created = send(
        &state,
        Method::POST,
        "/api/incidents/instant",
        Some(&admin_token),
        Some(payload),
    );
    assert_eq!(created.status(), 201);

    let body = body_json(created);
    assert_eq!(body["data"]["status"], "ongoing");
    assert_eq!(body["data"]["kind"], "instant");
    assert_eq!(body["data"]["neighborhood"], "Fatih");
}

#[test]
fn resolve_works_once_and_is_admin_only() {
    let state = test_state();
    let admin_token = login_as(&state, "admin@example.com", "admin");
    let user_token = login_as(&state, "user@example.com", "user");

    let created = send(
        &state,
        Method::POST,
        "/api/incidents/instant",
        Some(&admin_token),
        Some(json!({ "neighborhood": "Sanayi", "resource": "electricity" })),
    );
    let id = body_json(created)["data"]["id"].as_i64().unwrap();

    let denied = send(
        &state,
        Method::PUT,
        &format!("/api/incidents/{id}/resolve"),
        Some(&user_token),
        None,
    );
    assert_eq!(denied.status(), 403);

    let ok = send(
        &state,
        Method::PUT,
        &format!("/api/incidents/{id}/resolve"),
        Some(&admin_token),
        None,
    );
    assert_eq!(ok.status(), 200);

    let again = send(
        &state,
        Method::PUT,
        &format!("/api/incidents/{id}/resolve"),
        Some(&admin_token),
        None,
    );
    assert_eq!(again.status(), 400);

    let missing = send(
        &state,
        Method::PUT,
        "/api/incidents/9999/resolve",
        Some(&admin_token),
        None,
    );
    assert_eq!(missing.status(), 404);
}

#[test]
fn planned_outages_validate_their_window() {
    let state = test_state();
    let admin_token = login_as(&state, "admin@example.com", "admin");

    let backwards = send(
        &state,
        Method::POST,
        "/api/incidents/planned",
        Some(&admin_token),
        Some(json!({
            "neighborhood": "Fatih",
            "resource": "gas",
            "started_at": 2000,
            "ended_at": 1000,
        })),
    );
    assert_eq!(backwards.status(), 400);

    let created = send(
        &state,
        Method::POST,
        "/api/incidents/planned",
        Some(&admin_token),
        Some(json!({
            "neighborhood": "Fatih",
            "resource": "gas",
            "description": "pipeline maintenance",
            "started_at": 1000,
            "ended_at": 1000 + 5 * 3600,
        })),
    );
    assert_eq!(created.status(), 201);
    let body = body_json(created);
    assert_eq!(body["data"]["kind"], "planned");
    // derived from the window length
    assert_eq!(body["data"]["estimated_hours"], 5);
}

#[test]
fn list_supports_kind_and_status_filters() {
    let state = test_state();
    let admin_token = login_as(&state, "admin@example.com", "admin");

    send(
        &state,
        Method::POST,
        "/api/incidents/instant",
        Some(&admin_token),
        Some(json!({ "neighborhood": "Fatih", "resource": "water" })),
    );
    send(
        &state,
        Method::POST,
        "/api/incidents/planned",
        Some(&admin_token),
        Some(json!({
            "neighborhood": "Sanayi",
            "resource": "electricity",
            "started_at": 1000,
            "ended_at": 5000,
        })),
    );

    let all = body_json(send(&state, Method::GET, "/api/incidents", Some(&admin_token), None));
    assert_eq!(all["data"].as_array().unwrap().len(), 2);

    let planned = body_json(send(
        &state,
        Method::GET,
        "/api/incidents?kind=planned&status=ongoing",
        Some(&admin_token),
        None,
    ));
    let rows = planned["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["neighborhood"], "Sanayi");

    let bad_filter = send(
        &state,
        Method::GET,
        "/api/incidents?status=unknown",
        Some(&admin_token),
        None,
    );
    assert_eq!(bad_filter.status(), 400);
}

#[test]
fn live_dashboard_groups_ongoing_by_neighborhood() {
    let state = test_state();
    let admin_token = login_as(&state, "admin@example.com", "admin");

    for resource in ["water", "gas"] {
        send(
            &state,
            Method::POST,
            "/api/incidents/instant",
            Some(&admin_token),
            Some(json!({ "neighborhood": "Fatih", "resource": resource })),
        );
    }
    let resolved = send(
        &state,
        Method::POST,
        "/api/incidents/instant",
        Some(&admin_token),
        Some(json!({ "neighborhood": "Sanayi", "resource": "water" })),
    );
    let resolved_id = body_json(resolved)["data"]["id"].as_i64().unwrap();
    send(
        &state,
        Method::PUT,
        &format!("/api/incidents/{resolved_id}/resolve"),
        Some(&admin_token),
        None,
    );

    let dashboard = body_json(send(
        &state,
        Method::GET,
        "/api/incidents/live-dashboard",
        Some(&admin_token),
        None,
    ));
    let groups = dashboard["data"].as_array().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["neighborhood"], "Fatih");
    assert_eq!(groups[0]["incidents"].as_array().unwrap().len(), 2);
}

#[test]
fn simulate_creates_an_ongoing_incident() {
    let state = test_state();
    let admin_token = login_as(&state, "admin@example.com", "admin");

    let resp = send(
        &state,
        Method::POST,
        "/api/incidents/simulate",
        Some(&admin_token),
        None,
    );
    assert_eq!(resp.status(), 201);

    let body = body_json(resp);
    assert_eq!(body["data"]["status"], "ongoing");
    assert!(body["data"]["description"]
        .as_str()
        .unwrap()
        .contains("outage"));
}
