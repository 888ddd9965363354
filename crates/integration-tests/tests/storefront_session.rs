//! Session lifecycle across client restarts: guest cart, sign-in merge,
//! token expiry and sign-out.

#![allow(clippy::unwrap_used)]

use chrono::{Duration, Utc};
use fastbite_core::Product;
use fastbite_integration_tests::{
    envelope, jwt, open_storefront, product_json, reopen_storefront, user_json,
};
use fastbite_storefront::StorefrontError;
use fastbite_storefront::services::AuthError;
use fastbite_storefront::storage::{Storage, StorageExt, keys};
use httpmock::prelude::*;
use serde_json::json;

fn burger() -> Product {
    serde_json::from_value(product_json("p1", "Burger bò", 59_000, 10)).unwrap()
}

fn mock_login(server: &MockServer, token: &str) {
    server.mock(|when, then| {
        when.method(POST).path("/auth/login");
        then.status(200).json_body(envelope(json!({
            "token": token,
            "user": user_json("u1", "An", "an@fastbite.vn")
        })));
    });
}

#[tokio::test]
async fn test_guest_cart_survives_restart_and_merges_on_login() {
    let server = MockServer::start_async().await;
    let fixture = open_storefront(&server);

    let update = fixture.storefront.cart().add(&burger(), 2).await.unwrap();
    assert_eq!(update.quantity, 2);

    let storefront = reopen_storefront(&server, fixture.dir.path());
    let cart = storefront.cart().load().await.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.item_count(), 2);

    let token = jwt("u1", Utc::now() + Duration::hours(2));
    mock_login(&server, &token);
    let push = server.mock(|when, then| {
        when.method(POST)
            .path("/cart")
            .header("authorization", format!("Bearer {token}"))
            .json_body(json!({"productId": "p1", "quantity": 2}));
        then.status(200).json_body(envelope(json!({"items": []})));
    });
    server.mock(|when, then| {
        when.method(GET).path("/cart");
        then.status(200).json_body(envelope(json!({
            "items": [{"product": product_json("p1", "Burger bò", 59_000, 10), "quantity": 2}]
        })));
    });

    let signed_in = storefront
        .auth()
        .login("an@fastbite.vn", "secret1")
        .await
        .unwrap();

    push.assert();
    assert_eq!(signed_in.user.id.as_str(), "u1");
    assert_eq!(signed_in.cart_merge.pushed, 1);
    assert!(signed_in.cart_merge.failed.is_empty());

    let storage = storefront.session().storage();
    assert_eq!(storage.get(keys::GUEST_CART).unwrap(), None);
    let mirror: fastbite_core::Cart = storage.get_json("cart_u1").unwrap().unwrap();
    assert_eq!(mirror.item_count(), 2);
}

#[tokio::test]
async fn test_refused_lines_are_reported_not_fatal() {
    let server = MockServer::start_async().await;
    let fixture = open_storefront(&server);
    let storefront = &fixture.storefront;

    let fries: Product =
        serde_json::from_value(product_json("p2", "Khoai tây chiên", 25_000, 5)).unwrap();
    storefront.cart().add(&burger(), 1).await.unwrap();
    storefront.cart().add(&fries, 1).await.unwrap();

    mock_login(&server, &jwt("u1", Utc::now() + Duration::hours(2)));
    server.mock(|when, then| {
        when.method(POST)
            .path("/cart")
            .json_body(json!({"productId": "p1", "quantity": 1}));
        then.status(200).json_body(envelope(json!({"items": []})));
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/cart")
            .json_body(json!({"productId": "p2", "quantity": 1}));
        then.status(400)
            .json_body(json!({"success": false, "message": "Sản phẩm đã hết hàng"}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/cart");
        then.status(200).json_body(envelope(json!({"items": []})));
    });

    let signed_in = storefront
        .auth()
        .login("an@fastbite.vn", "secret1")
        .await
        .unwrap();

    assert_eq!(signed_in.cart_merge.pushed, 1);
    assert_eq!(signed_in.cart_merge.failed.len(), 1);
    assert_eq!(signed_in.cart_merge.failed[0].0.as_str(), "p2");
    assert!(signed_in.cart_merge.failed[0].1.contains("hết hàng"));
    assert_eq!(
        storefront.session().storage().get(keys::GUEST_CART).unwrap(),
        None
    );
}

#[tokio::test]
async fn test_session_restored_after_restart() {
    let server = MockServer::start_async().await;
    let fixture = open_storefront(&server);

    mock_login(&server, &jwt("u1", Utc::now() + Duration::hours(2)));
    server.mock(|when, then| {
        when.method(GET).path("/cart");
        then.status(200).json_body(envelope(json!({"items": []})));
    });
    fixture
        .storefront
        .auth()
        .login("an@fastbite.vn", "secret1")
        .await
        .unwrap();

    let me = server.mock(|when, then| {
        when.method(GET).path("/auth/me");
        then.status(500);
    });

    let storefront = reopen_storefront(&server, fixture.dir.path());
    let user = storefront.auth().ensure_session().await.unwrap().unwrap();
    assert_eq!(user.id.as_str(), "u1");
    assert!(storefront.api().has_token().await);
    assert_eq!(me.calls(), 0);
}

#[tokio::test]
async fn test_expired_token_is_dropped_on_restart() {
    let server = MockServer::start_async().await;
    let fixture = open_storefront(&server);

    let expired = jwt("u1", Utc::now() - Duration::minutes(1));
    let user = serde_json::from_value(user_json("u1", "An", "an@fastbite.vn")).unwrap();
    fixture.storefront.session().persist(&expired, &user).await.unwrap();
    fixture
        .storefront
        .session()
        .storage()
        .set("cart_u1", json!({"items": []}).to_string())
        .unwrap();

    let storefront = reopen_storefront(&server, fixture.dir.path());
    assert!(storefront.auth().ensure_session().await.unwrap().is_none());

    let storage = storefront.session().storage();
    assert_eq!(storage.get(keys::TOKEN).unwrap(), None);
    assert_eq!(storage.get(keys::USER).unwrap(), None);
    assert_eq!(storage.get("cart_u1").unwrap(), None);
    assert!(!storefront.api().has_token().await);
}

#[tokio::test]
async fn test_rejected_token_signs_out_mid_session() {
    let server = MockServer::start_async().await;
    let fixture = open_storefront(&server);
    let storefront = &fixture.storefront;

    let token = jwt("u1", Utc::now() + Duration::hours(2));
    let user = serde_json::from_value(user_json("u1", "An", "an@fastbite.vn")).unwrap();
    storefront.session().persist(&token, &user).await.unwrap();

    server.mock(|when, then| {
        when.method(GET).path("/cart");
        then.status(401)
            .json_body(json!({"success": false, "message": "Token không hợp lệ"}));
    });

    let err = storefront.cart().load().await.unwrap_err();
    assert!(matches!(
        err,
        StorefrontError::Auth(AuthError::SessionExpired)
    ));
    assert_eq!(storefront.session().token().unwrap(), None);
    assert!(storefront.auth().current_user().unwrap().is_none());

    // Back to an empty guest cart.
    let cart = storefront.cart().load().await.unwrap();
    assert!(cart.is_empty());
}

#[tokio::test]
async fn test_logout_keeps_guest_cart_only() {
    let server = MockServer::start_async().await;
    let fixture = open_storefront(&server);
    let storefront = &fixture.storefront;

    mock_login(&server, &jwt("u1", Utc::now() + Duration::hours(2)));
    server.mock(|when, then| {
        when.method(GET).path("/cart");
        then.status(200).json_body(envelope(json!({
            "items": [{"product": product_json("p1", "Burger bò", 59_000, 10), "quantity": 1}]
        })));
    });
    storefront
        .auth()
        .login("an@fastbite.vn", "secret1")
        .await
        .unwrap();
    assert!(storefront.session().storage().get("cart_u1").unwrap().is_some());

    storefront.auth().logout().await.unwrap();

    let storage = storefront.session().storage();
    assert_eq!(storage.get(keys::TOKEN).unwrap(), None);
    assert_eq!(storage.get(keys::USER).unwrap(), None);
    assert_eq!(storage.get("cart_u1").unwrap(), None);

    let after_restart = reopen_storefront(&server, fixture.dir.path());
    assert!(after_restart.auth().ensure_session().await.unwrap().is_none());
    assert!(after_restart.cart().load().await.unwrap().is_empty());
}
