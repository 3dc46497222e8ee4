#![allow(dead_code)]

use std::sync::Arc;

use mesto_api::{AppConfig, AppState, InMemoryRepository, RepositoryState, create_router};
use serde_json::{Value, json};
use tokio::net::TcpListener;

pub struct TestApp {
    pub address: String,
    pub repo: Arc<InMemoryRepository>,
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// POST /signup and return the raw response.
    pub async fn signup(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/signup"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("signup request failed")
    }

    /// POST /signin and return the raw response.
    pub async fn signin(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/signin"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("signin request failed")
    }

    /// Registers a user and signs in; returns `(user_json, token)`.
    pub async fn register_and_login(&self, email: &str, password: &str) -> (Value, String) {
        let user: Value = self.signup(email, password).await.json().await.unwrap();
        let body: Value = self.signin(email, password).await.json().await.unwrap();
        let token = body["token"].as_str().expect("token in signin body").to_string();
        (user, token)
    }

    /// Creates a card as the holder of `token`.
    pub async fn create_card(&self, token: &str, name: &str, link: &str) -> reqwest::Response {
        self.client
            .post(self.url("/cards"))
            .bearer_auth(token)
            .json(&json!({ "name": name, "link": link }))
            .send()
            .await
            .expect("create card request failed")
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(AppConfig::default()).await
}

pub async fn spawn_app_with(config: AppConfig) -> TestApp {
    let repo = Arc::new(InMemoryRepository::new());
    let state = AppState::new(repo.clone() as RepositoryState, config);
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp {
        address,
        repo,
        client: reqwest::Client::new(),
    }
}
