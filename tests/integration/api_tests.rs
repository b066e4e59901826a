//! API integration tests
//!
//! Drive a running server backed by Postgres and Redis.

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";
const ACTOR: &str = "1";

/// Suffix that keeps equipment numbers and contact numbers unique per run
fn run_suffix() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("Clock before epoch")
        .as_nanos();
    format!("{:09}", nanos % 1_000_000_000)
}

/// Helper to register a fresh equipment unit
async fn create_equipment(client: &Client, number: &str) -> i64 {
    let response = client
        .post(format!("{}/equipment", BASE_URL))
        .header("X-Actor-Id", ACTOR)
        .json(&json!({
            "name": "Digital multimeter",
            "number": number,
            "equipment_type": "Meter"
        }))
        .send()
        .await
        .expect("Failed to create equipment");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse equipment");
    assert_eq!(body["availability_status"], "Available");
    body["id"].as_i64().expect("No equipment id")
}

async fn post_transaction(client: &Client, equipment_id: i64, body: Value) -> reqwest::Response {
    client
        .post(format!("{}/equipment/{}/transactions", BASE_URL, equipment_id))
        .header("X-Actor-Id", ACTOR)
        .json(&body)
        .send()
        .await
        .expect("Failed to send transaction")
}

fn check_out(first: &str, middle: Option<&str>, last: &str, contact: &str) -> Value {
    json!({
        "event": "Check Out",
        "reason": "Classroom Use",
        "client": {
            "first_name": first,
            "middle_name": middle,
            "last_name": last,
            "contact_number": contact
        }
    })
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_check_out_then_return_shares_tracking_code() {
    let client = Client::new();
    let suffix = run_suffix();
    let equipment_id = create_equipment(&client, &format!("EQ-100-{}", suffix)).await;
    let contact = format!("0917{}", &suffix[..7]);
    let last_name = format!("Cruz-{}", suffix);

    // Check out
    let response =
        post_transaction(&client, equipment_id, check_out("Ana", None, &last_name, &contact)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let checkout: Value = response.json().await.expect("Failed to parse transaction");
    let code = checkout["tracking_code"].as_str().expect("No tracking code").to_string();
    assert!(code.starts_with("TRK-"));
    assert_eq!(checkout["status"], "Checked Out");

    // A second check-out is refused and leaves nothing behind
    let response =
        post_transaction(&client, equipment_id, check_out("Ana", None, &last_name, &contact)).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let error: Value = response.json().await.expect("Failed to parse error");
    assert_eq!(error["error"], "InvalidTransition");

    // Return closes the same cycle
    let response = post_transaction(&client, equipment_id, json!({ "event": "Return" })).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let returned: Value = response.json().await.expect("Failed to parse transaction");
    assert_eq!(returned["tracking_code"], code.as_str());
    assert_eq!(returned["status"], "Available");

    // Timeline lists both, oldest first
    let response = client
        .get(format!("{}/tracking/{}", BASE_URL, code))
        .send()
        .await
        .expect("Failed to fetch timeline");
    assert_eq!(response.status(), StatusCode::OK);
    let timeline: Value = response.json().await.expect("Failed to parse timeline");
    let transactions = timeline["transactions"].as_array().expect("No transactions");
    assert_eq!(transactions.len(), 2);
    assert_eq!(transactions[0]["transaction_type"], "Check Out");
    assert_eq!(transactions[1]["transaction_type"], "Return");
    assert_eq!(timeline["summary"]["closed"], true);
    assert_eq!(timeline["summary"]["current_status"], "Available");

    // Last transaction is the return
    let response = client
        .get(format!("{}/equipment/{}/last-transaction", BASE_URL, equipment_id))
        .send()
        .await
        .expect("Failed to fetch last transaction");
    let last: Value = response.json().await.expect("Failed to parse transaction");
    assert_eq!(last["id"], returned["id"]);

    // Equipment is available again and accepts a new check-out
    let response = client
        .get(format!("{}/equipment/{}", BASE_URL, equipment_id))
        .send()
        .await
        .expect("Failed to fetch equipment");
    let details: Value = response.json().await.expect("Failed to parse equipment");
    assert_eq!(details["availability_status"], "Available");
    assert!(details["allowed_events"]
        .as_array()
        .expect("No allowed events")
        .contains(&json!("Check Out")));
}

#[tokio::test]
#[ignore]
async fn test_maintenance_cycle() {
    let client = Client::new();
    let suffix = run_suffix();
    let equipment_id = create_equipment(&client, &format!("EQ-MTN-{}", suffix)).await;

    let response = post_transaction(
        &client,
        equipment_id,
        json!({
            "event": "Maintenance Release",
            "reason": "Display flickers",
            "operational_status": "Defective",
            "technician": {
                "first_name": "Rey",
                "last_name": format!("Santos-{}", suffix),
                "contact_number": format!("0918{}", &suffix[..7]),
                "shop_name": "FixIt"
            }
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let released: Value = response.json().await.expect("Failed to parse transaction");
    let code = released["tracking_code"].as_str().expect("No tracking code").to_string();
    assert!(code.starts_with("MTN-"));
    assert_eq!(released["status"], "Maintenance");

    for (event, status) in [
        ("Maintenance Accepted", "Being Maintained"),
        ("Repair Finished", "Available"),
    ] {
        let response = post_transaction(&client, equipment_id, json!({ "event": event })).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let tx: Value = response.json().await.expect("Failed to parse transaction");
        assert_eq!(tx["tracking_code"], code.as_str());
        assert_eq!(tx["status"], status);
    }

    let response = client
        .get(format!("{}/equipment/{}/history", BASE_URL, equipment_id))
        .send()
        .await
        .expect("Failed to fetch history");
    let cycles: Value = response.json().await.expect("Failed to parse history");
    let cycles = cycles.as_array().expect("History is not a list");
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0]["summary"]["transaction_count"], 3);
}

#[tokio::test]
#[ignore]
async fn test_ambiguous_client_is_confirmed_before_recording() {
    let client = Client::new();
    let suffix = run_suffix();
    let contact = format!("0919{}", &suffix[..7]);
    let last_name = format!("Reyes-Cruz-{}", suffix);
    let first_unit = create_equipment(&client, &format!("EQ-A-{}", suffix)).await;
    let second_unit = create_equipment(&client, &format!("EQ-B-{}", suffix)).await;

    let response = post_transaction(
        &client,
        first_unit,
        check_out("Ana", Some("Reyes"), &last_name, &contact),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let first: Value = response.json().await.expect("Failed to parse transaction");
    let existing_client = first["client_id"].as_i64().expect("No client id");

    // Same contact number, middle name missing: needs confirmation
    let response =
        post_transaction(&client, second_unit, check_out("Ana", None, &last_name, &contact)).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let pending: Value = response.json().await.expect("Failed to parse pending match");
    assert_eq!(pending["person_kind"], "client");
    assert_eq!(pending["suggested"]["id"].as_i64(), Some(existing_client));
    assert!(pending["matched_on"]
        .as_array()
        .expect("No matched fields")
        .contains(&json!("contact_number")));

    // Nothing was recorded yet
    let response = client
        .get(format!("{}/equipment/{}/last-transaction", BASE_URL, second_unit))
        .send()
        .await
        .expect("Failed to fetch last transaction");
    let last: Value = response.json().await.expect("Failed to parse response");
    assert!(last.is_null());

    let response = client
        .post(format!(
            "{}/equipment/{}/transactions/resolve-person",
            BASE_URL, second_unit
        ))
        .header("X-Actor-Id", ACTOR)
        .json(&json!({
            "decision": "use-existing",
            "pending_id": pending["pending_id"]
        }))
        .send()
        .await
        .expect("Failed to resolve person");
    assert_eq!(response.status(), StatusCode::CREATED);
    let recorded: Value = response.json().await.expect("Failed to parse transaction");
    assert_eq!(recorded["client_id"].as_i64(), Some(existing_client));
    assert_eq!(recorded["status"], "Checked Out");

    // The suspension is consumed
    let response = client
        .post(format!(
            "{}/equipment/{}/transactions/resolve-person",
            BASE_URL, second_unit
        ))
        .header("X-Actor-Id", ACTOR)
        .json(&json!({ "decision": "create-new" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_write_requires_actor() {
    let client = Client::new();

    let response = client
        .post(format!("{}/equipment/1/transactions", BASE_URL))
        .json(&json!({ "event": "Return" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_unknown_tracking_code_is_empty() {
    let client = Client::new();

    let response = client
        .get(format!("{}/tracking/TRK-1", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["summary"].is_null());
    assert_eq!(body["transactions"], json!([]));

    let response = client
        .get(format!("{}/tracking/not-a-code", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

async fn resolve_person(client: &Client, equipment_id: i64, body: Value) -> reqwest::Response {
    client
        .post(format!(
            "{}/equipment/{}/transactions/resolve-person",
            BASE_URL, equipment_id
        ))
        .header("X-Actor-Id", ACTOR)
        .json(&body)
        .send()
        .await
        .expect("Failed to resolve person")
}

#[tokio::test]
#[ignore]
async fn test_concurrent_check_outs_record_once() {
    let client = Client::new();
    let suffix = run_suffix();
    let equipment_id = create_equipment(&client, &format!("EQ-RACE-{}", suffix)).await;
    let contact = format!("0920{}", &suffix[..7]);
    let last_name = format!("Lim-{}", suffix);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let client = client.clone();
            let body = check_out("Jo", None, &last_name, &contact);
            tokio::spawn(async move { post_transaction(&client, equipment_id, body).await.status() })
        })
        .collect();

    let mut statuses = Vec::new();
    for handle in handles {
        statuses.push(handle.await.expect("Request task panicked"));
    }

    let created = statuses.iter().filter(|s| **s == StatusCode::CREATED).count();
    let refused = statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count();
    assert_eq!(created, 1, "statuses: {:?}", statuses);
    assert_eq!(refused, 7, "statuses: {:?}", statuses);

    let response = client
        .get(format!("{}/equipment/{}/history", BASE_URL, equipment_id))
        .send()
        .await
        .expect("Failed to fetch history");
    let cycles: Value = response.json().await.expect("Failed to parse history");
    let cycles = cycles.as_array().expect("History is not a list");
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0]["transactions"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
#[ignore]
async fn test_concurrent_check_outs_share_new_client() {
    let client = Client::new();
    let suffix = run_suffix();
    let contact = format!("0921{}", &suffix[..7]);
    let last_name = format!("Tan-{}", suffix);

    let mut units = Vec::new();
    for n in 0..4 {
        units.push(create_equipment(&client, &format!("EQ-SAME-{}-{}", n, suffix)).await);
    }

    let handles: Vec<_> = units
        .into_iter()
        .map(|equipment_id| {
            let client = client.clone();
            let body = check_out("Lea", Some("Mae"), &last_name, &contact);
            tokio::spawn(async move {
                let response = post_transaction(&client, equipment_id, body).await;
                let status = response.status();
                let body: Value = response.json().await.expect("Failed to parse transaction");
                (status, body["client_id"].as_i64())
            })
        })
        .collect();

    let mut client_ids = Vec::new();
    for handle in handles {
        let (status, client_id) = handle.await.expect("Request task panicked");
        assert_eq!(status, StatusCode::CREATED);
        client_ids.push(client_id.expect("No client id"));
    }

    client_ids.sort_unstable();
    client_ids.dedup();
    assert_eq!(client_ids.len(), 1, "one client expected, got {:?}", client_ids);
}

#[tokio::test]
#[ignore]
async fn test_resolve_person_create_new_adds_client() {
    let client = Client::new();
    let suffix = run_suffix();
    let contact = format!("0922{}", &suffix[..7]);
    let last_name = format!("Go-{}", suffix);
    let first_unit = create_equipment(&client, &format!("EQ-NEW-A-{}", suffix)).await;
    let second_unit = create_equipment(&client, &format!("EQ-NEW-B-{}", suffix)).await;

    let response = post_transaction(
        &client,
        first_unit,
        check_out("Ben", Some("Uy"), &last_name, &contact),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let first: Value = response.json().await.expect("Failed to parse transaction");
    let existing_client = first["client_id"].as_i64().expect("No client id");

    let response =
        post_transaction(&client, second_unit, check_out("Ben", None, &last_name, &contact)).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let pending: Value = response.json().await.expect("Failed to parse pending match");

    let response = resolve_person(
        &client,
        second_unit,
        json!({ "decision": "create-new", "pending_id": pending["pending_id"] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let recorded: Value = response.json().await.expect("Failed to parse transaction");
    let new_client = recorded["client_id"].as_i64().expect("No client id");
    assert_ne!(new_client, existing_client);

    let response = client
        .get(format!("{}/clients/{}", BASE_URL, new_client))
        .send()
        .await
        .expect("Failed to fetch client");
    assert_eq!(response.status(), StatusCode::OK);
    let created: Value = response.json().await.expect("Failed to parse client");
    assert_eq!(created["first_name"], "Ben");
    assert!(created["middle_name"].is_null());
}

#[tokio::test]
#[ignore]
async fn test_resume_after_status_change_is_rejected() {
    let client = Client::new();
    let suffix = run_suffix();
    let contact = format!("0923{}", &suffix[..7]);
    let last_name = format!("Sy-{}", suffix);
    let first_unit = create_equipment(&client, &format!("EQ-STALE-A-{}", suffix)).await;
    let second_unit = create_equipment(&client, &format!("EQ-STALE-B-{}", suffix)).await;

    let response = post_transaction(
        &client,
        first_unit,
        check_out("Cy", Some("Lo"), &last_name, &contact),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response =
        post_transaction(&client, second_unit, check_out("Cy", None, &last_name, &contact)).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let pending: Value = response.json().await.expect("Failed to parse pending match");

    // Someone else checks the unit out while the decision is pending
    let response = post_transaction(
        &client,
        second_unit,
        check_out(
            "Dee",
            None,
            &format!("Ong-{}", suffix),
            &format!("0924{}", &suffix[..7]),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = resolve_person(
        &client,
        second_unit,
        json!({ "decision": "use-existing", "pending_id": pending["pending_id"] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let error: Value = response.json().await.expect("Failed to parse error");
    assert_eq!(error["error"], "InvalidTransition");

    // The stale suspension is gone
    let response = resolve_person(&client, second_unit, json!({ "decision": "create-new" })).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
