mod support;

#[tokio::test]
async fn test_session_creation() {
    let base_url = support::ensure_server();
    let client = reqwest::Client::new();
    let session_id = format!("test-{}", uuid::Uuid::new_v4());
    let payload = serde_json::json!({
        "session_id": session_id,
        "spawn_points": [{ "x": 1, "y": 1 }]
    });

    let res = client
        .post(format!("{base_url}/sessions"))
        .json(&payload)
        .send()
        .await
        .expect("request should succeed");
    assert_eq!(res.status(), reqwest::StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.expect("json body");
    assert_eq!(body["session_id"], session_id.as_str());

    let duplicate = client
        .post(format!("{base_url}/sessions"))
        .json(&payload)
        .send()
        .await
        .expect("request should succeed");
    assert_eq!(duplicate.status(), reqwest::StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_session_creation_rejects_bad_requests() {
    let base_url = support::ensure_server();
    let client = reqwest::Client::new();

    let cases = [
        serde_json::json!({ "session_id": "  ", "spawn_points": [{ "x": 1, "y": 1 }] }),
        serde_json::json!({ "session_id": format!("test-{}", uuid::Uuid::new_v4()) }),
        serde_json::json!({
            "session_id": format!("test-{}", uuid::Uuid::new_v4()),
            "spawn_points": [{ "x": 1, "y": 1 }],
            "map": { "width": 3, "height": 3, "tiles": [0, 0, 0] }
        }),
        serde_json::json!({
            "session_id": format!("test-{}", uuid::Uuid::new_v4()),
            "spawn_points": [{ "x": 1, "y": 1 }, { "x": 1, "y": 1 }]
        }),
    ];

    for payload in cases {
        let res = client
            .post(format!("{base_url}/sessions"))
            .json(&payload)
            .send()
            .await
            .expect("request should succeed");
        assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST, "{payload}");
    }
}

#[tokio::test]
async fn test_session_removal() {
    let base_url = support::ensure_server();
    let client = reqwest::Client::new();
    let session_id = format!("test-{}", uuid::Uuid::new_v4());
    support::create_session(base_url, &session_id, &[(1, 1)], 4, 4).await;

    let removed = client
        .delete(format!("{base_url}/sessions/{session_id}"))
        .send()
        .await
        .expect("request should succeed");
    assert_eq!(removed.status(), reqwest::StatusCode::NO_CONTENT);

    let again = client
        .delete(format!("{base_url}/sessions/{session_id}"))
        .send()
        .await
        .expect("request should succeed");
    assert_eq!(again.status(), reqwest::StatusCode::NOT_FOUND);

    let pinned = client
        .delete(format!("{base_url}/sessions/default"))
        .send()
        .await
        .expect("request should succeed");
    assert_eq!(pinned.status(), reqwest::StatusCode::CONFLICT);
}
