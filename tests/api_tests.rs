mod common;

use common::spawn_app;
use mesto_api::repository::Repository;
use serde_json::{Value, json};

const LINK: &str = "https://pictures.example.com/elbrus.jpg";

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let response = app.client.get(app.url("/health")).send().await.expect("req fail");
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_signup_signin_me_scenario() {
    let app = spawn_app().await;

    let response = app.signup("a@b.com", "secret1").await;
    assert_eq!(response.status(), 200);
    let user: Value = response.json().await.unwrap();
    assert!(user["_id"].is_string());
    assert!(user.get("password").is_none());
    assert_eq!(user["email"], "a@b.com");

    let response = app.signin("a@b.com", "secret1").await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let token = body["token"].as_str().unwrap();
    assert!(!token.is_empty());

    let me: Value = app
        .client
        .get(app.url("/users/me"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["_id"], user["_id"]);
    assert_eq!(me["email"], "a@b.com");
}

#[tokio::test]
async fn test_signup_applies_profile_defaults() {
    let app = spawn_app().await;
    let user: Value = app.signup("cousteau@sea.org", "calypso").await.json().await.unwrap();

    assert_eq!(user["name"], mesto_api::models::DEFAULT_NAME);
    assert_eq!(user["about"], mesto_api::models::DEFAULT_ABOUT);
    assert_eq!(user["avatar"], mesto_api::models::DEFAULT_AVATAR);
}

#[tokio::test]
async fn test_signup_stores_hash_not_plaintext() {
    let app = spawn_app().await;
    app.signup("hash@check.io", "plaintext-pass").await;

    let stored = app
        .repo
        .find_credentials_by_email("hash@check.io")
        .await
        .unwrap()
        .expect("user stored");
    assert_ne!(stored.password_hash, "plaintext-pass");
    assert!(bcrypt::verify("plaintext-pass", &stored.password_hash).unwrap());
}

#[tokio::test]
async fn test_duplicate_signup_is_conflict() {
    let app = spawn_app().await;
    assert_eq!(app.signup("dup@x.io", "secret1").await.status(), 200);

    let response = app.signup("dup@x.io", "another").await;
    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "A user with this email already exists");
}

#[tokio::test]
async fn test_signup_rejects_bad_email_and_unknown_fields() {
    let app = spawn_app().await;

    let response = app.signup("not-an-email", "secret1").await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("email"));

    let response = app
        .client
        .post(app.url("/signup"))
        .json(&json!({ "email": "ok@x.io", "password": "secret1", "role": "admin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert!(app.repo.list_users().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_signin_failures_do_not_reveal_which_field_was_wrong() {
    let app = spawn_app().await;
    app.signup("real@user.io", "right-pass").await;

    let wrong_password = app.signin("real@user.io", "wrong-pass").await;
    assert_eq!(wrong_password.status(), 401);
    let wrong_password: Value = wrong_password.json().await.unwrap();

    let unknown_email = app.signin("ghost@user.io", "right-pass").await;
    assert_eq!(unknown_email.status(), 401);
    let unknown_email: Value = unknown_email.json().await.unwrap();

    assert_eq!(wrong_password["message"], unknown_email["message"]);
    assert_eq!(wrong_password["message"], "Incorrect email or password");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = spawn_app().await;
    let (_, token) = app.register_and_login("owner@x.io", "secret1").await;
    let card: Value = app.create_card(&token, "Elbrus", LINK).await.json().await.unwrap();
    let card_id = card["_id"].as_str().unwrap();

    let requests = vec![
        app.client.get(app.url("/users")),
        app.client.get(app.url("/users/me")),
        app.client.get(app.url(&format!("/users/{}", card_id))),
        app.client.patch(app.url("/users/me")).json(&json!({ "name": "Mallory" })),
        app.client.patch(app.url("/users/me/avatar")).json(&json!({ "avatar": LINK })),
        app.client.get(app.url("/cards")),
        app.client.post(app.url("/cards")).json(&json!({ "name": "Sneaky", "link": LINK })),
        app.client.delete(app.url(&format!("/cards/{}", card_id))),
        app.client.put(app.url(&format!("/cards/{}/likes", card_id))),
        app.client.delete(app.url(&format!("/cards/{}/likes", card_id))),
        app.client.post(app.url("/signout")),
    ];

    for request in requests {
        let response = request.send().await.unwrap();
        assert_eq!(response.status(), 401);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["message"], "Authorization required");
    }

    // Nothing above reached the store.
    let cards = app.repo.list_cards().await.unwrap();
    assert_eq!(cards.len(), 1);
    assert!(cards[0].likes.is_empty());
    let users = app.repo.list_users().await.unwrap();
    assert_ne!(users[0].name, "Mallory");
}

#[tokio::test]
async fn test_garbage_token_is_unauthorized() {
    let app = spawn_app().await;
    let response = app
        .client
        .get(app.url("/users/me"))
        .bearer_auth("not.a.jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_delete_card_as_non_owner_is_forbidden() {
    let app = spawn_app().await;
    let (_, owner_token) = app.register_and_login("owner@x.io", "secret1").await;
    let (_, other_token) = app.register_and_login("other@x.io", "secret2").await;

    let card: Value = app.create_card(&owner_token, "Baikal", LINK).await.json().await.unwrap();
    let card_id = card["_id"].as_str().unwrap();

    let response = app
        .client
        .delete(app.url(&format!("/cards/{}", card_id)))
        .bearer_auth(&other_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
    assert_eq!(app.repo.list_cards().await.unwrap().len(), 1);

    let response = app
        .client
        .delete(app.url(&format!("/cards/{}", card_id)))
        .bearer_auth(&owner_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let deleted: Value = response.json().await.unwrap();
    assert_eq!(deleted["_id"], card["_id"]);
    assert!(app.repo.list_cards().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_missing_card_is_not_found() {
    let app = spawn_app().await;
    let (_, token) = app.register_and_login("someone@x.io", "secret1").await;

    let response = app
        .client
        .delete(app.url("/cards/5d8b8592978f8bd833ca8133"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Card not found");
}

#[tokio::test]
async fn test_create_card_with_bad_link_is_rejected() {
    let app = spawn_app().await;
    let (_, token) = app.register_and_login("artist@x.io", "secret1").await;

    let response = app.create_card(&token, "Broken", "not a url").await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("link"));
    assert!(app.repo.list_cards().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_card_sets_owner_from_token() {
    let app = spawn_app().await;
    let (user, token) = app.register_and_login("artist@x.io", "secret1").await;

    let response = app.create_card(&token, "Kamchatka", LINK).await;
    assert_eq!(response.status(), 200);
    let card: Value = response.json().await.unwrap();
    assert_eq!(card["owner"], user["_id"]);
    assert_eq!(card["likes"], json!([]));
    assert!(card["createdAt"].is_string());

    let cards: Vec<Value> = app
        .client
        .get(app.url("/cards"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0]["name"], "Kamchatka");
}

#[tokio::test]
async fn test_avatar_update_round_trip() {
    let app = spawn_app().await;
    let (user, token) = app.register_and_login("painter@x.io", "secret1").await;
    let new_avatar = "https://www.example.org/me.png";

    let response = app
        .client
        .patch(app.url("/users/me/avatar"))
        .bearer_auth(&token)
        .json(&json!({ "avatar": new_avatar }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let fetched: Value = app
        .client
        .get(app.url(&format!("/users/{}", user["_id"].as_str().unwrap())))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["avatar"], new_avatar);
    assert_eq!(fetched["name"], user["name"]);
    assert_eq!(fetched["about"], user["about"]);
}

#[tokio::test]
async fn test_update_profile_is_partial() {
    let app = spawn_app().await;
    let (user, token) = app.register_and_login("writer@x.io", "secret1").await;

    let updated: Value = app
        .client
        .patch(app.url("/users/me"))
        .bearer_auth(&token)
        .json(&json!({ "about": "Novelist" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated["about"], "Novelist");
    assert_eq!(updated["name"], user["name"]);

    let response = app
        .client
        .patch(app.url("/users/me"))
        .bearer_auth(&token)
        .json(&json!({ "name": "X" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_like_is_idempotent_and_dislike_removes() {
    let app = spawn_app().await;
    let (user, token) = app.register_and_login("fan@x.io", "secret1").await;
    let card: Value = app.create_card(&token, "Altai", LINK).await.json().await.unwrap();
    let likes_url = app.url(&format!("/cards/{}/likes", card["_id"].as_str().unwrap()));

    for _ in 0..2 {
        let liked: Value = app
            .client
            .put(&likes_url)
            .bearer_auth(&token)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(liked["likes"], Value::Array(vec![user["_id"].clone()]));
    }

    let unliked: Value = app
        .client
        .delete(&likes_url)
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(unliked["likes"], json!([]));
}

#[tokio::test]
async fn test_malformed_ids_are_bad_requests() {
    let app = spawn_app().await;
    let (_, token) = app.register_and_login("curious@x.io", "secret1").await;

    for path in ["/users/123", "/cards/zzzzzzzzzzzzzzzzzzzzzzzz/likes"] {
        let request = if path.starts_with("/users") {
            app.client.get(app.url(path))
        } else {
            app.client.put(app.url(path))
        };
        let response = request.bearer_auth(&token).send().await.unwrap();
        assert_eq!(response.status(), 400, "{path}");
    }

    let response = app
        .client
        .get(app.url("/users/5d8b8592978f8bd833ca8133"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = spawn_app().await;
    let response = app
        .client
        .post(app.url("/signup"))
        .header("content-type", "application/json")
        .body("{\"email\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let app = spawn_app().await;
    let response = app.client.get(app.url("/nowhere")).send().await.unwrap();
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Requested resource not found");
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let app = spawn_app().await;
    let response = app.client.get(app.url("/health")).send().await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_password_limit_counts_bytes_not_characters() {
    let app = spawn_app().await;

    // 36 two-byte characters fill bcrypt's 72-byte window; anything after it would be ignored.
    let prefix = "é".repeat(36);
    let too_long = format!("{prefix}REGISTERED-SUFFIX");
    let response = app.signup("long@pass.io", &too_long).await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().starts_with("password:"));
    assert!(app.repo.list_users().await.unwrap().is_empty());

    // Exactly 72 bytes is accepted, and a longer variant sharing it does not sign in.
    assert_eq!(app.signup("edge@pass.io", &prefix).await.status(), 200);
    assert_eq!(app.signin("edge@pass.io", &prefix).await.status(), 200);
    let extended = app.signin("edge@pass.io", &format!("{prefix}totally-different")).await;
    assert_eq!(extended.status(), 401);
}

#[tokio::test]
async fn test_wrong_method_on_known_path_is_json_error() {
    let app = spawn_app().await;
    let (_, token) = app.register_and_login("method@x.io", "secret1").await;

    let response = app
        .client
        .post(app.url("/users/me"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Nobody" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Requested resource not found");

    let response = app.client.delete(app.url("/signup")).send().await.unwrap();
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Requested resource not found");
}
