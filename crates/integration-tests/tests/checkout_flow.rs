//! Signed-in checkout: quote, place order, payment redirect, cancel.

#![allow(clippy::unwrap_used)]

use chrono::{Duration, Utc};
use fastbite_core::{OrderId, OrderStatus, PaymentMethod, Product, ShippingAddress};
use fastbite_integration_tests::{
    StorefrontFixture, envelope, jwt, open_storefront, product_json, user_json,
};
use fastbite_storefront::StorefrontError;
use fastbite_storefront::services::{CheckoutError, CheckoutForm};
use fastbite_storefront::storage::{Storage, StorageExt};
use httpmock::prelude::*;
use rust_decimal::Decimal;
use serde_json::json;

fn address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Nguyễn Văn An".to_string(),
        phone: "0901234567".to_string(),
        address: "12 Lê Lợi".to_string(),
        ward: None,
        district: Some("Quận 1".to_string()),
        city: Some("TP. Hồ Chí Minh".to_string()),
    }
}

fn form(method: PaymentMethod, coupon: Option<&str>) -> CheckoutForm {
    CheckoutForm {
        shipping_address: address(),
        payment_method: method,
        coupon_code: coupon.map(String::from),
        note: None,
    }
}

/// Signed-in storefront whose server cart holds two burgers.
async fn signed_in_with_cart(server: &MockServer) -> StorefrontFixture {
    let fixture = open_storefront(server);
    let token = jwt("u1", Utc::now() + Duration::hours(2));
    let user = serde_json::from_value(user_json("u1", "An", "an@fastbite.vn")).unwrap();
    fixture.storefront.session().persist(&token, &user).await.unwrap();

    server.mock(|when, then| {
        when.method(GET).path("/cart");
        then.status(200).json_body(envelope(json!({
            "items": [{"product": product_json("p1", "Burger bò", 59_000, 10), "quantity": 2}]
        })));
    });
    fixture
}

fn order_json(method: &str, status: &str) -> serde_json::Value {
    json!({
        "_id": "o1",
        "orderNumber": "FB1001",
        "status": status,
        "paymentStatus": "pending",
        "paymentMethod": method,
        "items": [{"product": "p1", "name": "Burger bò", "price": 59000, "quantity": 2}],
        "subtotal": 118000,
        "discount": 0,
        "shippingFee": 0,
        "totalAmount": 118000
    })
}

#[tokio::test]
async fn test_quote_applies_backend_coupon() {
    let server = MockServer::start_async().await;
    let fixture = signed_in_with_cart(&server).await;
    let storefront = &fixture.storefront;

    let apply = server.mock(|when, then| {
        when.method(POST)
            .path("/promotions/apply-coupon")
            .json_body(json!({"code": "GIAM20K", "orderTotal": 118000.0}));
        then.status(200)
            .json_body(envelope(json!({"code": "GIAM20K", "discountAmount": 20000})));
    });

    let cart = storefront.cart().load().await.unwrap();
    let quote = storefront
        .checkout()
        .quote(&cart, Some(" GIAM20K "))
        .await
        .unwrap();

    apply.assert();
    assert_eq!(quote.totals.subtotal, Decimal::from(118_000));
    assert_eq!(quote.totals.discount, Decimal::from(20_000));
    assert_eq!(quote.totals.total, Decimal::from(98_000));
    assert_eq!(quote.coupon.unwrap().code, "GIAM20K");
}

#[tokio::test]
async fn test_rejected_coupon_carries_backend_reason() {
    let server = MockServer::start_async().await;
    let fixture = signed_in_with_cart(&server).await;
    let storefront = &fixture.storefront;

    server.mock(|when, then| {
        when.method(POST).path("/promotions/apply-coupon");
        then.status(400)
            .json_body(json!({"success": false, "message": "Mã giảm giá đã hết hạn"}));
    });

    let cart = storefront.cart().load().await.unwrap();
    let err = storefront
        .checkout()
        .quote(&cart, Some("HETHAN"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, StorefrontError::Checkout(CheckoutError::CouponRejected(ref reason)) if reason.contains("hết hạn")),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn test_momo_checkout_places_order_and_clears_cart() {
    let server = MockServer::start_async().await;
    let fixture = signed_in_with_cart(&server).await;
    let storefront = &fixture.storefront;

    let create = server.mock(|when, then| {
        when.method(POST)
            .path("/orders")
            .header_exists("authorization")
            .body_includes(r#""items":[{"product":"p1","quantity":2}]"#)
            .body_includes(r#""paymentMethod":"momo""#);
        then.status(201).json_body(envelope(order_json("momo", "pending")));
    });
    let pay = server.mock(|when, then| {
        when.method(POST)
            .path("/payments/momo/create")
            .json_body(json!({"orderId": "o1"}));
        then.status(200)
            .json_body(envelope(json!({"payUrl": "https://test-payment.momo.vn/pay/o1"})));
    });
    let clear = server.mock(|when, then| {
        when.method(DELETE).path("/cart");
        then.status(200).json_body(json!({"success": true}));
    });

    let placed = storefront
        .checkout()
        .checkout(&form(PaymentMethod::Momo, None))
        .await
        .unwrap();

    create.assert();
    pay.assert();
    clear.assert();
    assert_eq!(placed.order.reference(), "FB1001");
    assert_eq!(placed.order.total_amount, Decimal::from(118_000));
    let redirect = placed.redirect.unwrap();
    assert_eq!(redirect.method, PaymentMethod::Momo);
    assert_eq!(redirect.url, "https://test-payment.momo.vn/pay/o1");

    let mirror: fastbite_core::Cart = storefront
        .session()
        .storage()
        .get_json("cart_u1")
        .unwrap()
        .unwrap();
    assert!(mirror.is_empty());
}

#[tokio::test]
async fn test_cash_on_delivery_needs_no_redirect() {
    let server = MockServer::start_async().await;
    let fixture = signed_in_with_cart(&server).await;

    server.mock(|when, then| {
        when.method(POST).path("/orders");
        then.status(201).json_body(envelope(order_json("cod", "pending")));
    });
    server.mock(|when, then| {
        when.method(DELETE).path("/cart");
        then.status(200).json_body(json!({"success": true}));
    });
    let any_payment = server.mock(|when, then| {
        when.method(POST).path_includes("/payments/");
        then.status(500);
    });

    let placed = fixture
        .storefront
        .checkout()
        .checkout(&form(PaymentMethod::Cod, None))
        .await
        .unwrap();

    assert!(placed.redirect.is_none());
    assert_eq!(any_payment.calls(), 0);
}

#[tokio::test]
async fn test_guest_cannot_place_order() {
    let server = MockServer::start_async().await;
    let fixture = open_storefront(&server);
    let burger: Product =
        serde_json::from_value(product_json("p1", "Burger bò", 59_000, 10)).unwrap();
    fixture.storefront.cart().add(&burger, 1).await.unwrap();

    let err = fixture
        .storefront
        .checkout()
        .place_order(&form(PaymentMethod::Cod, None))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StorefrontError::Checkout(CheckoutError::NotSignedIn)
    ));
    // The guest cart is untouched.
    assert!(
        fixture
            .storefront
            .session()
            .storage()
            .get("cart_guest")
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_incomplete_address_is_rejected_before_any_order() {
    let server = MockServer::start_async().await;
    let fixture = signed_in_with_cart(&server).await;
    let create = server.mock(|when, then| {
        when.method(POST).path("/orders");
        then.status(201).json_body(envelope(order_json("cod", "pending")));
    });

    let mut checkout = form(PaymentMethod::Cod, None);
    checkout.shipping_address.phone = "12".to_string();
    checkout.shipping_address.address = "  ".to_string();

    let err = fixture
        .storefront
        .checkout()
        .place_order(&checkout)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StorefrontError::Checkout(CheckoutError::InvalidAddress(ref fields))
            if fields == &vec!["phone", "address"]
    ));
    assert_eq!(create.calls(), 0);
}

#[tokio::test]
async fn test_cancel_only_while_pending_or_processing() {
    let server = MockServer::start_async().await;
    let fixture = signed_in_with_cart(&server).await;

    server.mock(|when, then| {
        when.method(GET).path("/orders/o1");
        then.status(200).json_body(envelope(order_json("cod", "shipping")));
    });
    let cancel = server.mock(|when, then| {
        when.method(PUT).path("/orders/o1/cancel");
        then.status(200).json_body(envelope(order_json("cod", "cancelled")));
    });

    let err = fixture
        .storefront
        .checkout()
        .cancel_order(&OrderId::new("o1"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StorefrontError::Checkout(CheckoutError::NotCancellable {
            status: OrderStatus::Shipping,
            ..
        })
    ));
    assert_eq!(cancel.calls(), 0);
}
