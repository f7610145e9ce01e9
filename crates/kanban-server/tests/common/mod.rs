#![allow(dead_code)]

//! Test harness: the real router over an in-memory store, driven with
//! `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use kanban_server::create_router;
use kanban_server::store::MemoryStore;
use serde_json::{json, Value};
use tower::ServiceExt;

pub const PASSWORD: &str = "correct horse battery";

#[derive(Clone)]
pub struct TestApp {
    router: Router,
}

/// A registered user and the token to act as them.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub token: String,
}

impl TestApp {
    pub fn new() -> Self {
        Self {
            router: create_router(Arc::new(MemoryStore::new())),
        }
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Token {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, account: &Account) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(&account.token), None).await
    }

    pub async fn post(&self, uri: &str, account: &Account, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(&account.token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, account: &Account, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(&account.token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, account: &Account, body: Value) -> (StatusCode, Value) {
        self.send(Method::PATCH, uri, Some(&account.token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, account: &Account) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(&account.token), None).await
    }

    pub async fn register(&self, fullname: &str, email: &str) -> Account {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/registration/",
                None,
                Some(json!({
                    "fullname": fullname,
                    "email": email,
                    "password": PASSWORD,
                    "repeated_password": PASSWORD,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "registration failed: {body}");

        Account {
            id: body["user_id"].as_str().unwrap().to_string(),
            email: email.to_string(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Creates a board owned by `owner` and returns its id.
    pub async fn create_board(&self, owner: &Account, title: &str, members: &[&Account]) -> String {
        let members: Vec<&str> = members.iter().map(|m| m.id.as_str()).collect();
        let (status, body) = self
            .post("/api/boards/", owner, json!({ "title": title, "members": members }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "board creation failed: {body}");
        body["id"].as_str().unwrap().to_string()
    }

    /// Creates a task on `board` as `creator` and returns its id.
    pub async fn create_task(&self, creator: &Account, board: &str, extra: Value) -> String {
        let mut payload = json!({ "board": board, "title": "Write the release notes" });
        if let (Some(payload), Some(extra)) = (payload.as_object_mut(), extra.as_object()) {
            payload.extend(extra.clone());
        }
        let (status, body) = self.post("/api/tasks/", creator, payload).await;
        assert_eq!(status, StatusCode::CREATED, "task creation failed: {body}");
        body["id"].as_str().unwrap().to_string()
    }
}

/// Sorted string values of `key` across a JSON array.
pub fn ids(list: &Value, key: &str) -> Vec<String> {
    let mut ids: Vec<String> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item[key].as_str().unwrap().to_string())
        .collect();
    ids.sort();
    ids
}
