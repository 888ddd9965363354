//! Checkout, payment redirects and order tracking.

use fastbite_core::{
    Cart, Order, OrderId, OrderStatus, OrderTotals, Page, PaymentMethod, ShippingAddress,
};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::api::{
    ApiError, AppliedCoupon, CreateOrderItem, CreateOrderRequest, PaymentRedirect,
    PaymentStatusResponse,
};
use crate::error::{StorefrontError, add_breadcrumb};
use crate::services::cart::CartService;
use crate::services::session::Session;

/// Errors specific to checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,
    #[error("sign in to place an order")]
    NotSignedIn,
    #[error("shipping address is incomplete: {}", .0.join(", "))]
    InvalidAddress(Vec<&'static str>),
    #[error("coupon rejected: {0}")]
    CouponRejected(String),
    #[error("order {reference} can no longer be cancelled ({status})")]
    NotCancellable {
        reference: String,
        status: OrderStatus,
    },
}

/// Price breakdown shown before placing an order.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub totals: OrderTotals,
    pub coupon: Option<AppliedCoupon>,
}

/// What the customer entered at checkout.
#[derive(Debug, Clone)]
pub struct CheckoutForm {
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub coupon_code: Option<String>,
    pub note: Option<String>,
}

/// A placed order plus where to pay for it.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: Order,
    /// `None` for cash on delivery.
    pub redirect: Option<PaymentRedirect>,
}

/// Checkout flow for the signed-in user.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    session: Session,
    cart: CartService,
    shipping_fee: Decimal,
}

impl CheckoutService {
    #[must_use]
    pub fn new(session: Session, shipping_fee: Decimal) -> Self {
        Self {
            cart: CartService::new(session.clone()),
            session,
            shipping_fee,
        }
    }

    /// Totals for `cart`, with the coupon validated by the backend.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::CouponRejected`] with the backend's reason if
    /// the coupon cannot be used.
    #[instrument(skip(self, cart), fields(items = cart.items.len()))]
    pub async fn quote(
        &self,
        cart: &Cart,
        coupon_code: Option<&str>,
    ) -> Result<Quote, StorefrontError> {
        let subtotal = cart.subtotal();
        let coupon = match coupon_code.map(str::trim).filter(|c| !c.is_empty()) {
            Some(code) => Some(self.apply_coupon(code, subtotal).await?),
            None => None,
        };

        let discount = coupon.as_ref().map_or(Decimal::ZERO, |c| c.discount);
        Ok(Quote {
            totals: OrderTotals::compute(subtotal, discount, self.shipping_fee),
            coupon,
        })
    }

    /// Place an order from the current cart and clear the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError`] if not signed in, the cart is empty, or
    /// the address is incomplete.
    #[instrument(skip(self, form), fields(method = %form.payment_method))]
    pub async fn place_order(&self, form: &CheckoutForm) -> Result<Order, StorefrontError> {
        if self.session.user()?.is_none() {
            return Err(CheckoutError::NotSignedIn.into());
        }

        let cart = self.cart.load().await?;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart.into());
        }

        let missing = form.shipping_address.missing_fields();
        if !missing.is_empty() {
            return Err(CheckoutError::InvalidAddress(missing).into());
        }

        let request = CreateOrderRequest {
            items: cart
                .items
                .iter()
                .map(|item| CreateOrderItem {
                    product_id: item.product_id.clone(),
                    quantity: item.quantity,
                })
                .collect(),
            shipping_address: form.shipping_address.clone(),
            payment_method: form.payment_method,
            coupon_code: form
                .coupon_code
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_uppercase),
            note: form.note.clone().filter(|n| !n.trim().is_empty()),
        };

        add_breadcrumb("checkout", "Placing order", None);
        let order = self.session.api().create_order(&request).await?;

        info!(order_id = %order.id, total = %order.total_amount, "Order placed");

        if let Err(e) = self.cart.clear().await {
            warn!(error = %e, "Order placed but cart could not be cleared");
        }
        Ok(order)
    }

    /// Start payment for an order. Cash on delivery needs no redirect.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot create the provider session.
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn start_payment(
        &self,
        order: &Order,
        method: PaymentMethod,
    ) -> Result<Option<PaymentRedirect>, StorefrontError> {
        if !method.requires_redirect() {
            return Ok(None);
        }
        add_breadcrumb(
            "checkout",
            "Starting payment",
            Some(&[("method", method.to_string().as_str())]),
        );
        Ok(self.session.api().create_payment(&order.id, method).await?)
    }

    /// Place the order and start payment in one go.
    ///
    /// # Errors
    ///
    /// See [`Self::place_order`] and [`Self::start_payment`]. If payment
    /// cannot be started the order still exists; pay later from order
    /// history.
    pub async fn checkout(&self, form: &CheckoutForm) -> Result<PlacedOrder, StorefrontError> {
        let order = self.place_order(form).await?;
        let redirect = self.start_payment(&order, form.payment_method).await?;
        Ok(PlacedOrder { order, redirect })
    }

    /// Payment state of an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn payment_status(
        &self,
        order_id: &OrderId,
    ) -> Result<PaymentStatusResponse, StorefrontError> {
        Ok(self.session.api().get_payment_status(order_id).await?)
    }

    /// Order history, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::NotSignedIn`] for guests.
    pub async fn my_orders(&self, page: u32, limit: u32) -> Result<Page<Order>, StorefrontError> {
        if self.session.user()?.is_none() {
            return Err(CheckoutError::NotSignedIn.into());
        }
        Ok(self.session.api().get_my_orders(page, limit).await?)
    }

    /// One order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn order(&self, id: &OrderId) -> Result<Order, StorefrontError> {
        Ok(self.session.api().get_order(id).await?)
    }

    /// Cancel an order that has not left the kitchen.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::NotCancellable`] without calling the
    /// backend when the order is past `processing`.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn cancel_order(&self, id: &OrderId) -> Result<Order, StorefrontError> {
        let order = self.session.api().get_order(id).await?;
        if !order.can_cancel() {
            return Err(CheckoutError::NotCancellable {
                reference: order.reference().to_string(),
                status: order.status,
            }
            .into());
        }
        add_breadcrumb("checkout", "Cancelling order", Some(&[("order_id", id.as_str())]));
        Ok(self.session.api().cancel_order(id).await?)
    }

    async fn apply_coupon(
        &self,
        code: &str,
        subtotal: Decimal,
    ) -> Result<AppliedCoupon, StorefrontError> {
        match self.session.api().apply_coupon(code, subtotal).await {
            Ok(mut applied) => {
                // With the rule at hand, validity and amount are computed
                // locally; the backend figure only stands in when it is absent.
                if let Some(promotion) = &applied.promotion {
                    promotion
                        .check_applicable(subtotal, chrono::Utc::now())
                        .map_err(|rejection| CheckoutError::CouponRejected(rejection.to_string()))?;
                    let discount = promotion.discount_for(subtotal);
                    if discount != applied.discount {
                        debug!(
                            backend = %applied.discount,
                            computed = %discount,
                            "Coupon discount recomputed from promotion rule"
                        );
                    }
                    applied.discount = discount;
                }
                Ok(applied)
            }
            Err(ApiError::Api { status, message }) if (400..500).contains(&status) => {
                Err(CheckoutError::CouponRejected(message).into())
            }
            Err(ApiError::NotFound(message)) => Err(CheckoutError::CouponRejected(message).into()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use fastbite_core::{CartItem, CategoryId, ProductId, ProductSnapshot};
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::services::session::{test_session, test_user};

    fn cart(lines: &[(&str, i64, u32)]) -> Cart {
        Cart::new(
            lines
                .iter()
                .map(|(id, price, qty)| CartItem {
                    product_id: ProductId::new(*id),
                    quantity: *qty,
                    product: ProductSnapshot {
                        name: (*id).to_string(),
                        price: Decimal::from(*price),
                        stock: 50,
                        image_url: None,
                        category_id: CategoryId::new("c1"),
                        is_vegetarian: false,
                    },
                })
                .collect(),
        )
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Trần Thị B".to_string(),
            phone: "0987654321".to_string(),
            address: "45 Nguyễn Huệ".to_string(),
            ward: None,
            district: Some("Quận 1".to_string()),
            city: Some("TP.HCM".to_string()),
        }
    }

    #[tokio::test]
    async fn test_quote_with_coupon() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/promotions/apply-coupon");
            then.status(200)
                .json_body(json!({"success": true, "data": {"code": "GIAM10", "discount": 15000}}));
        });
        let (session, _storage) = test_session(&server);
        let checkout = CheckoutService::new(session, Decimal::from(20_000));

        let quote = checkout
            .quote(&cart(&[("p1", 50_000, 2), ("p2", 25_000, 2)]), Some(" GIAM10 "))
            .await
            .unwrap();
        assert_eq!(quote.totals.subtotal, Decimal::from(150_000));
        assert_eq!(quote.totals.discount, Decimal::from(15_000));
        assert_eq!(quote.totals.total, Decimal::from(155_000));
    }

    #[tokio::test]
    async fn test_quote_recomputes_discount_from_promotion_rule() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/promotions/apply-coupon");
            then.status(200).json_body(json!({
                "success": true,
                "data": {
                    "code": "GIAM10",
                    "discount": 50000,
                    "promotion": {
                        "_id": "pr1",
                        "code": "GIAM10",
                        "discountType": "percentage",
                        "value": 10,
                        "maxDiscountAmount": 12000,
                        "isActive": true
                    }
                }
            }));
        });
        let (session, _storage) = test_session(&server);
        let checkout = CheckoutService::new(session, Decimal::ZERO);

        let quote = checkout
            .quote(&cart(&[("p1", 50_000, 2), ("p2", 25_000, 2)]), Some("GIAM10"))
            .await
            .unwrap();
        // 10% of 150000 is 15000, capped at 12000.
        assert_eq!(quote.totals.discount, Decimal::from(12_000));
        assert_eq!(quote.totals.total, Decimal::from(138_000));
        assert_eq!(quote.coupon.unwrap().discount, Decimal::from(12_000));
    }

    #[tokio::test]
    async fn test_quote_coupon_rejected() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/promotions/apply-coupon");
            then.status(400).json_body(
                json!({"success": false, "message": "Đơn hàng tối thiểu 200.000đ"}),
            );
        });
        let (session, _storage) = test_session(&server);
        let checkout = CheckoutService::new(session, Decimal::ZERO);

        let err = checkout
            .quote(&cart(&[("p1", 50_000, 1)]), Some("BIG"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorefrontError::Checkout(CheckoutError::CouponRejected(_))
        ));
    }

    #[tokio::test]
    async fn test_place_order_requires_sign_in() {
        let server = MockServer::start_async().await;
        let (session, _storage) = test_session(&server);
        let checkout = CheckoutService::new(session, Decimal::ZERO);

        let err = checkout
            .place_order(&CheckoutForm {
                shipping_address: address(),
                payment_method: PaymentMethod::Cod,
                coupon_code: None,
                note: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorefrontError::Checkout(CheckoutError::NotSignedIn)
        ));
    }

    #[tokio::test]
    async fn test_checkout_places_order_clears_cart_and_redirects() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/cart");
            then.status(200).json_body(json!({
                "success": true,
                "data": {"items": [{"product": {"_id": "p1", "name": "Burger", "price": 59000, "stock": 9, "category": "c1"}, "quantity": 2}]}
            }));
        });
        let create = server.mock(|when, then| {
            when.method(POST)
                .path("/orders")
                .body_includes(r#""couponCode":"GIAM10""#);
            then.status(201).json_body(json!({
                "success": true,
                "data": {"_id": "o1", "orderNumber": "FB-1", "paymentMethod": "vnpay", "totalAmount": 118000}
            }));
        });
        let clear = server.mock(|when, then| {
            when.method(DELETE).path("/cart");
            then.status(200).json_body(json!({"success": true}));
        });
        server.mock(|when, then| {
            when.method(POST).path("/payments/vnpay/create");
            then.status(200).json_body(json!({
                "success": true,
                "data": {"paymentUrl": "https://sandbox.vnpayment.vn/pay"}
            }));
        });

        let (session, _storage) = test_session(&server);
        session.persist("jwt", &test_user("u1")).await.unwrap();
        let checkout = CheckoutService::new(session, Decimal::ZERO);

        let placed = checkout
            .checkout(&CheckoutForm {
                shipping_address: address(),
                payment_method: PaymentMethod::Vnpay,
                coupon_code: Some("giam10".to_string()),
                note: None,
            })
            .await
            .unwrap();

        create.assert();
        clear.assert();
        assert_eq!(placed.order.reference(), "FB-1");
        assert_eq!(
            placed.redirect.unwrap().url,
            "https://sandbox.vnpayment.vn/pay"
        );
    }

    #[tokio::test]
    async fn test_cancel_refused_locally_after_processing() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/orders/o1");
            then.status(200).json_body(json!({
                "success": true,
                "data": {"_id": "o1", "status": "shipping", "totalAmount": 50000}
            }));
        });
        let cancel = server.mock(|when, then| {
            when.method(PUT).path("/orders/o1/cancel");
            then.status(200);
        });

        let (session, _storage) = test_session(&server);
        let checkout = CheckoutService::new(session, Decimal::ZERO);
        let err = checkout.cancel_order(&OrderId::new("o1")).await.unwrap_err();

        assert!(matches!(
            err,
            StorefrontError::Checkout(CheckoutError::NotCancellable { .. })
        ));
        assert_eq!(cancel.calls(), 0);
    }
}
