mod common;

use axum::http::{Method, StatusCode};
use common::{ids, TestApp};
use serde_json::json;

#[tokio::test]
async fn board_list_holds_exactly_owned_and_member_boards() {
    let app = TestApp::new();
    let alice = app.register("Alice Owner", "alice@example.com").await;
    let bob = app.register("Bob Member", "bob@example.com").await;
    let carol = app.register("Carol Outsider", "carol@example.com").await;

    let shared = app.create_board(&alice, "Shared", &[&bob]).await;
    let private = app.create_board(&alice, "Private", &[]).await;
    let bobs = app.create_board(&bob, "Bob's own", &[&bob]).await;

    let (_, list) = app.get("/api/boards/", &alice).await;
    let mut expected = vec![shared.clone(), private.clone()];
    expected.sort();
    assert_eq!(ids(&list, "id"), expected);

    // Owner and member at once still lists the board once.
    let (_, list) = app.get("/api/boards/", &bob).await;
    let mut expected = vec![shared.clone(), bobs.clone()];
    expected.sort();
    assert_eq!(ids(&list, "id"), expected);

    let (status, list) = app.get("/api/boards/", &carol).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn board_list_carries_fresh_counts() {
    let app = TestApp::new();
    let alice = app.register("Alice Owner", "alice@example.com").await;
    let bob = app.register("Bob Member", "bob@example.com").await;
    let board = app.create_board(&alice, "Counts", &[&bob]).await;

    app.create_task(&alice, &board, json!({ "status": "todo", "priority": "high" })).await;
    app.create_task(&alice, &board, json!({ "status": "todo" })).await;
    app.create_task(&bob, &board, json!({ "priority": "high", "status": "done" })).await;

    let (status, list) = app.get("/api/boards/", &alice).await;
    assert_eq!(status, StatusCode::OK);
    let entry = &list[0];
    assert_eq!(entry["title"], "Counts");
    assert_eq!(entry["owner_id"], alice.id.as_str());
    assert_eq!(entry["member_count"], 1);
    assert_eq!(entry["ticket_count"], 3);
    assert_eq!(entry["tasks_to_do_count"], 2);
    assert_eq!(entry["tasks_high_prio_count"], 2);
}

#[tokio::test]
async fn create_board_validates_title_and_members() {
    let app = TestApp::new();
    let alice = app.register("Alice Owner", "alice@example.com").await;
    let ghost = "6f1c1a1e-0000-4000-8000-000000000000";

    let (status, body) = app
        .post("/api/boards/", &alice, json!({ "title": "  ", "members": [ghost] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["title"].is_array());
    assert_eq!(
        body["members"],
        json!([format!("Invalid pk \"{ghost}\" - object does not exist.")])
    );

    let (status, body) = app
        .post("/api/boards/", &alice, json!({ "title": "x".repeat(101) }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["title"].is_array());

    let (_, list) = app.get("/api/boards/", &alice).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn owner_cannot_be_injected() {
    let app = TestApp::new();
    let alice = app.register("Alice Owner", "alice@example.com").await;
    let bob = app.register("Bob Member", "bob@example.com").await;

    let (status, body) = app
        .post("/api/boards/", &alice, json!({ "title": "Mine", "owner_id": bob.id }))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["owner_id"], alice.id.as_str());
    assert_eq!(body["member_count"], 0);
}

#[tokio::test]
async fn board_detail_nests_members_and_tasks() {
    let app = TestApp::new();
    let alice = app.register("Alice Owner", "alice@example.com").await;
    let bob = app.register("Bob Member", "bob@example.com").await;
    let board = app.create_board(&alice, "Detail", &[&bob]).await;
    let task = app
        .create_task(&alice, &board, json!({ "assignee_id": bob.id, "reviewer_id": alice.id }))
        .await;
    app.post(&format!("/api/tasks/{task}/comments/"), &bob, json!({ "content": "On it" }))
        .await;

    let (status, body) = app.get(&format!("/api/boards/{board}/"), &bob).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], board.as_str());
    assert_eq!(body["ticket_count"], 1);
    assert_eq!(
        body["members"],
        json!([{ "id": bob.id, "email": "bob@example.com", "fullname": "Bob Member" }])
    );

    let nested = &body["tasks"][0];
    assert_eq!(nested["id"], task.as_str());
    assert!(nested.get("board").is_none());
    assert_eq!(nested["comments_count"], 1);
    assert_eq!(nested["assignee"]["email"], "bob@example.com");
    assert_eq!(nested["reviewer"]["fullname"], "Alice Owner");
}

#[tokio::test]
async fn hidden_and_missing_boards_look_the_same() {
    let app = TestApp::new();
    let alice = app.register("Alice Owner", "alice@example.com").await;
    let carol = app.register("Carol Outsider", "carol@example.com").await;
    let board = app.create_board(&alice, "Secret", &[]).await;

    let hidden = app.get(&format!("/api/boards/{board}/"), &carol).await;
    let missing = app
        .get("/api/boards/00000000-0000-4000-8000-000000000000/", &carol)
        .await;
    assert_eq!(hidden, missing);
    assert_eq!(hidden.0, StatusCode::NOT_FOUND);

    let (status, _) = app
        .patch(&format!("/api/boards/{board}/"), &carol, json!({ "title": "Mine now" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.delete(&format!("/api/boards/{board}/"), &carol).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/api/boards/not-a-uuid/", &alice).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn member_patch_returns_nested_people() {
    let app = TestApp::new();
    let alice = app.register("Alice Owner", "alice@example.com").await;
    let bob = app.register("Bob Member", "bob@example.com").await;
    let carol = app.register("Carol Newcomer", "carol@example.com").await;
    let board = app.create_board(&alice, "Before", &[&bob]).await;

    let (status, body) = app
        .patch(
            &format!("/api/boards/{board}/"),
            &bob,
            json!({ "title": "After", "members": [bob.id, carol.id, bob.id] }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "After");
    assert_eq!(
        body["owner_data"],
        json!({ "id": alice.id, "email": "alice@example.com", "fullname": "Alice Owner" })
    );
    assert_eq!(ids(&body["members_data"], "email"), ["bob@example.com", "carol@example.com"]);

    let (status, _) = app.get(&format!("/api/boards/{board}/"), &carol).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn removed_member_loses_access() {
    let app = TestApp::new();
    let alice = app.register("Alice Owner", "alice@example.com").await;
    let bob = app.register("Bob Member", "bob@example.com").await;
    let board = app.create_board(&alice, "Shrinking", &[&bob]).await;

    let (status, _) = app
        .patch(&format!("/api/boards/{board}/"), &alice, json!({ "members": [] }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get(&format!("/api/boards/{board}/"), &bob).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn only_the_owner_deletes_and_the_cascade_is_complete() {
    let app = TestApp::new();
    let alice = app.register("Alice Owner", "alice@example.com").await;
    let bob = app.register("Bob Member", "bob@example.com").await;
    let board = app.create_board(&alice, "Doomed", &[&bob]).await;
    let task = app.create_task(&bob, &board, json!({})).await;
    app.post(&format!("/api/tasks/{task}/comments/"), &bob, json!({ "content": "bye" }))
        .await;

    let (status, body) = app.delete(&format!("/api/boards/{board}/"), &bob).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].is_string());

    let (status, body) = app.delete(&format!("/api/boards/{board}/"), &alice).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, json!(null));

    let (status, _) = app.get(&format!("/api/tasks/{task}/"), &bob).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.get(&format!("/api/tasks/{task}/comments/"), &bob).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, tasks) = app.get("/api/tasks/", &bob).await;
    assert_eq!(tasks, json!([]));
}

#[tokio::test]
async fn unsupported_verbs_are_405() {
    let app = TestApp::new();
    let alice = app.register("Alice Owner", "alice@example.com").await;
    let board = app.create_board(&alice, "Verbs", &[]).await;

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/boards/{board}/"),
            Some(&alice.token),
            Some(json!({ "title": "Replaced" })),
        )
        .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, _) = app.delete("/api/boards/", &alice).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn member_type_errors_stay_under_members() {
    let app = TestApp::new();
    let alice = app.register("Alice Owner", "alice@example.com").await;

    let (status, body) = app
        .post("/api/boards/", &alice, json!({ "title": "Typed", "members": ["nope"] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["members"],
        json!(["Invalid pk \"nope\" - object does not exist."])
    );
    assert!(body.get("non_field_errors").is_none());

    let board = app.create_board(&alice, "Sprint1", &[]).await;
    let (status, body) = app
        .patch(
            &format!("/api/boards/{board}/"),
            &alice,
            json!({ "title": null, "members": "nope" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["title"], json!(["This field may not be null."]));
    assert_eq!(
        body["members"],
        json!(["Expected a list of items but got type \"string\"."])
    );
}
