// src/tests/router_tests/analytics_tests.rs
use http::Method;
use serde_json::json;

use crate::db::readings::insert_reading;
use crate::db::stats::month_bounds;
use crate::domain::resource::Resource;
use crate::tests::utils::{body_json, login_as, send, test_state};

#[test]
fn analytics_is_admin_only() {
    let state = test_state();
    let user_token = login_as(&state, "user@example.com", "user");

    for path in [
        "/api/analytics/statistical-summary?month=3&year=2025",
        "/api/analytics/time-series?year=2025",
        "/api/analytics/documents",
    ] {
        let resp = send(&state, Method::GET, path, Some(&user_token), None);
        assert_eq!(resp.status(), 403, "expected 403 for {path}");
    }
}

#[test]
fn statistical_summary_returns_month_aggregates() {
    let state = test_state();
    let admin_token = login_as(&state, "admin@example.com", "admin");

    let (feb, _) = month_bounds(2025, 2).unwrap();
    let (mar, _) = month_bounds(2025, 3).unwrap();
    state
        .db
        .with_conn(|conn| {
            insert_reading(conn, "Fatih", Resource::Gas, 100.0, "m3", feb + 100, false)?;
            insert_reading(conn, "Fatih", Resource::Gas, 120.0, "m3", mar + 100, false)?;
            insert_reading(conn, "Fatih", Resource::Gas, 180.0, "m3", mar + 200, false)?;
            Ok(())
        })
        .unwrap();

    let missing_params = send(
        &state,
        Method::GET,
        "/api/analytics/statistical-summary?month=3",
        Some(&admin_token),
        None,
    );
    assert_eq!(missing_params.status(), 400);

    let body = body_json(send(
        &state,
        Method::GET,
        "/api/analytics/statistical-summary?month=3&year=2025",
        Some(&admin_token),
        None,
    ));
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["average"], 150.0);
    assert_eq!(rows[0]["peak"], 180.0);
    assert_eq!(rows[0]["samples"], 2);
    // 100 -> 150 vs february
    assert_eq!(rows[0]["change_pct"], 50.0);
}

#[test]
fn time_series_breaks_the_year_into_seasons() {
    let state = test_state();
    let admin_token = login_as(&state, "admin@example.com", "admin");

    let (jan, _) = month_bounds(2025, 1).unwrap();
    let (jul, _) = month_bounds(2025, 7).unwrap();
    state
        .db
        .with_conn(|conn| {
            insert_reading(conn, "Fatih", Resource::Gas, 300.0, "m3", jan + 100, false)?;
            insert_reading(conn, "Fatih", Resource::Gas, 30.0, "m3", jul + 100, false)?;
            Ok(())
        })
        .unwrap();

    let body = body_json(send(
        &state,
        Method::GET,
        "/api/analytics/time-series?year=2025",
        Some(&admin_token),
        None,
    ));
    assert_eq!(body["data"]["year"], 2025);
    assert_eq!(body["data"]["months"].as_array().unwrap().len(), 2);

    let seasons = body["data"]["seasons"].as_array().unwrap();
    let winter = seasons.iter().find(|s| s["season"] == "winter").unwrap();
    assert_eq!(winter["average"], 300.0);
}

#[test]
fn report_lifecycle_generate_list_download_delete() {
    let state = test_state();
    let admin_token = login_as(&state, "admin@example.com", "admin");

    let (may, _) = month_bounds(2025, 5).unwrap();
    state
        .db
        .with_conn(|conn| {
            for i in 0..12 {
                insert_reading(
                    conn,
                    "Fatih",
                    Resource::Water,
                    10.0 + i as f64,
                    "m3",
                    may + i * 3600,
                    false,
                )?;
            }
            Ok(())
        })
        .unwrap();

    // unknown neighborhood is rejected up front
    let unknown = send(
        &state,
        Method::POST,
        "/api/analytics/generate-report",
        Some(&admin_token),
        Some(json!({ "month": 5, "year": 2025, "neighborhood": "Atlantis", "resource": "all" })),
    );
    assert_eq!(unknown.status(), 400);

    let created = send(
        &state,
        Method::POST,
        "/api/analytics/generate-report",
        Some(&admin_token),
        Some(json!({ "month": 5, "year": 2025, "neighborhood": "Fatih", "resource": "water" })),
    );
    assert_eq!(created.status(), 201);
    let created_body = body_json(created);
    assert_eq!(created_body["data"]["rows"], 12);
    let filename = created_body["data"]["filename"].as_str().unwrap().to_string();
    let download_url = created_body["data"]["downloadUrl"].as_str().unwrap().to_string();
    assert!(download_url.ends_with(&filename));

    // artifact landed on disk
    let artifact = std::path::Path::new(&state.config.reports_dir).join(&filename);
    assert!(artifact.exists());

    // listed with a download link
    let docs = body_json(send(
        &state,
        Method::GET,
        "/api/analytics/documents",
        Some(&admin_token),
        None,
    ));
    let rows = docs["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    let doc_id = rows[0]["id"].as_i64().unwrap();
    assert_eq!(rows[0]["filename"], filename.as_str());

    // downloadable with attachment headers
    let download = send(&state, Method::GET, &download_url, Some(&admin_token), None);
    assert_eq!(download.status(), 200);
    let disposition = download
        .headers()
        .get("Content-Disposition")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    assert!(disposition.contains(&filename));

    // unregistered filenames (and traversal attempts) are 404
    let sneaky = send(
        &state,
        Method::GET,
        "/api/analytics/reports/nope.xlsx",
        Some(&admin_token),
        None,
    );
    assert_eq!(sneaky.status(), 404);

    // delete removes the row and the artifact
    let deleted = send(
        &state,
        Method::DELETE,
        &format!("/api/analytics/documents/{doc_id}"),
        Some(&admin_token),
        None,
    );
    assert_eq!(deleted.status(), 200);
    assert!(!artifact.exists());

    let gone = send(
        &state,
        Method::DELETE,
        &format!("/api/analytics/documents/{doc_id}"),
        Some(&admin_token),
        None,
    );
    assert_eq!(gone.status(), 404);
}

#[test]
fn notifications_count_verified_recipients() {
    let state = test_state();
    let admin_token = login_as(&state, "admin@example.com", "admin");

    // two verified accounts in Fatih (admin + one user), one elsewhere
    login_as(&state, "neighbor@example.com", "user");
    state
        .db
        .with_conn(|conn| {
            let user = crate::db::users::NewUser {
                name: "Far".into(),
                surname: "Away".into(),
                neighborhood: "Sanayi".into(),
                email: "far@example.com".into(),
                password_hash: "s$h".into(),
                role: "user".into(),
            };
            crate::db::users::create_user(conn, &user, 0)?;
            Ok(())
        })
        .unwrap();

    let resp = send(
        &state,
        Method::POST,
        "/api/notifications/notify-neighborhood",
        Some(&admin_token),
        Some(json!({
            "neighborhood": "Fatih",
            "resource": "electricity",
            "message": "Crews are on site.",
        })),
    );
    assert_eq!(resp.status(), 200);
    // console mailer accepts everything; both Fatih accounts are counted
    assert_eq!(body_json(resp)["data"]["notifiedCount"], 2);

    let support = send(
        &state,
        Method::POST,
        "/api/support/report",
        Some(&admin_token),
        Some(json!({
            "neighborhood": "Fatih",
            "resource": "water",
            "message": "Consumption is far above normal.",
        })),
    );
    assert_eq!(support.status(), 200);
}
