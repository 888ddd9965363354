//! Cart service: local guest cart plus server cart mirroring.
//!
//! # Storage layout
//!
//! - Guest: the cart lives only under `cart_guest`.
//! - Signed in: the backend `/cart` resource is authoritative and every
//!   response is mirrored into `cart_<userId>` so the cart still renders
//!   when the backend is unreachable.
//!
//! Stock rules are applied locally first (via [`Cart`]), so a clamped
//! request never reaches the backend with a quantity above stock.

use fastbite_core::{Cart, CartError, CartUpdate, Product, ProductId, ProductSnapshot, User};
use tracing::{info, instrument, warn};

use crate::api::ApiError;
use crate::error::{StorefrontError, add_breadcrumb};
use crate::services::auth::AuthError;
use crate::services::session::Session;
use crate::storage::{StorageError, StorageExt, keys};

/// Result of pushing the guest cart to the server after sign-in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Lines accepted by the backend.
    pub pushed: usize,
    /// Lines the backend refused, with the reason.
    pub failed: Vec<(ProductId, String)>,
    /// Lines that could not be sent because the backend was unreachable.
    /// They stay in the guest cart and are retried on the next load.
    pub pending: Vec<ProductId>,
}

/// Cart operations for the current visitor.
#[derive(Debug, Clone)]
pub struct CartService {
    session: Session,
}

impl CartService {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    /// Current cart. For signed-in users the server cart is fetched and
    /// mirrored; if the backend is unreachable the mirror is returned.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SessionExpired`] if the backend rejected the
    /// token, or a storage error.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Cart, StorefrontError> {
        let Some(user) = self.session.user()? else {
            return Ok(self.read(keys::GUEST_CART)?);
        };
        let mirror_key = keys::user_cart(&user.id);

        if !self.read(keys::GUEST_CART)?.is_empty() {
            self.merge_guest_cart(&user).await?;
        }

        match self.session.api().get_cart().await {
            Ok(cart) => {
                self.write(&mirror_key, &cart)?;
                Ok(cart)
            }
            Err(e) if e.is_network() => {
                warn!(error = %e, "Backend unreachable, showing mirrored cart");
                Ok(self.read(&mirror_key)?)
            }
            Err(e) => Err(self.api_failure(e).await),
        }
    }

    /// Add units of a product.
    ///
    /// The resulting line quantity is clamped to stock; the returned
    /// [`CartUpdate`] carries a warning when that happened.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] if the product is inactive, out of stock, or
    /// `quantity` is zero; [`AuthError::SessionExpired`] if the backend
    /// rejected the token.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add(&self, product: &Product, quantity: u32) -> Result<CartUpdate, StorefrontError> {
        if !product.is_active {
            return Err(CartError::Unavailable(product.name.clone()).into());
        }

        let user = self.session.user()?;
        let key = Self::key_for(user.as_ref());
        let mut cart = self.read(&key)?;

        let before = cart.get(&product.id).map_or(0, |item| item.quantity);
        let update = cart.add(&product.id, ProductSnapshot::from(product), quantity)?;
        let added = update.quantity.saturating_sub(before);

        add_breadcrumb(
            "cart",
            "Added to cart",
            Some(&[("product_id", product.id.as_str())]),
        );

        match user {
            Some(user) if added > 0 => {
                let result = self.session.api().add_cart_item(&product.id, added).await;
                self.reconcile(&user, cart, result).await?;
            }
            _ => self.write(&key, &cart)?,
        }

        if let Some(warning) = update.warning {
            warn!(
                requested = warning.requested,
                available = warning.available,
                "Cart quantity clamped to stock"
            );
        }
        Ok(update)
    }

    /// Set a line's quantity. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInCart`] if there is no such line.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn set_quantity(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<CartUpdate, StorefrontError> {
        let user = self.session.user()?;
        let key = Self::key_for(user.as_ref());
        let mut cart = match &user {
            Some(user) => self.server_cart(user).await?,
            None => self.read(&key)?,
        };
        let update = cart.set_quantity(product_id, quantity)?;

        match user {
            Some(user) => {
                let api = self.session.api();
                let result = if update.quantity == 0 {
                    api.remove_cart_item(product_id).await
                } else {
                    api.update_cart_item(product_id, update.quantity).await
                };
                self.reconcile(&user, cart, result).await?;
            }
            None => self.write(&key, &cart)?,
        }
        Ok(update)
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInCart`] if there is no such line.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove(&self, product_id: &ProductId) -> Result<(), StorefrontError> {
        self.set_quantity(product_id, 0).await.map(|_| ())
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend or the store fails.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<(), StorefrontError> {
        let user = self.session.user()?;
        let key = Self::key_for(user.as_ref());

        if let Some(user) = user {
            let result = self
                .session
                .api()
                .clear_server_cart()
                .await
                .map(|()| Cart::default());
            self.reconcile(&user, Cart::default(), result).await?;
        } else {
            self.write(&key, &Cart::default())?;
        }
        Ok(())
    }

    /// Push the guest cart to the server, one line at a time.
    ///
    /// Lines the backend accepts or refuses leave the guest cart; refusals
    /// are reported rather than aborting the merge. Lines that could not be
    /// sent because the backend is unreachable stay in the guest cart and are
    /// shown in the user's mirror until a later merge delivers them.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SessionExpired`] if the backend rejects the new
    /// token, or a storage error.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn merge_guest_cart(&self, user: &User) -> Result<MergeReport, StorefrontError> {
        let guest = self.read(keys::GUEST_CART)?;
        let mut report = MergeReport::default();
        let mut leftover = Cart::default();
        let api = self.session.api();

        for item in &guest.items {
            match api.add_cart_item(&item.product_id, item.quantity).await {
                Ok(_) => report.pushed += 1,
                Err(e) if e.is_auth() => return Err(self.api_failure(e).await),
                Err(e) if e.is_network() => {
                    warn!(product_id = %item.product_id, error = %e, "Backend unreachable, keeping guest line");
                    report.pending.push(item.product_id.clone());
                    leftover.items.push(item.clone());
                }
                Err(e) => {
                    warn!(product_id = %item.product_id, error = %e, "Guest cart line not merged");
                    report.failed.push((item.product_id.clone(), e.to_string()));
                }
            }
        }

        if leftover.is_empty() {
            self.session.storage().remove(keys::GUEST_CART)?;
        } else {
            self.write(keys::GUEST_CART, &leftover)?;
        }

        let mirror_key = keys::user_cart(&user.id);
        match api.get_cart().await {
            Ok(cart) => self.write(&mirror_key, &cart)?,
            Err(e) if e.is_auth() => return Err(self.api_failure(e).await),
            Err(e) => {
                warn!(error = %e, "Could not refresh cart after merge");
                if !leftover.is_empty() {
                    let mut mirror = self.read(&mirror_key)?;
                    // Lines already mirrored by an earlier attempt are left alone.
                    for item in leftover.items {
                        if mirror.get(&item.product_id).is_some() {
                            continue;
                        }
                        if let Err(e) = mirror.add(&item.product_id, item.product, item.quantity) {
                            warn!(product_id = %item.product_id, error = %e, "Guest line not mirrored");
                        }
                    }
                    self.write(&mirror_key, &mirror)?;
                }
            }
        }

        if !guest.is_empty() {
            info!(
                pushed = report.pushed,
                failed = report.failed.len(),
                pending = report.pending.len(),
                "Merged guest cart"
            );
        }
        Ok(report)
    }

    /// The server cart as the base for an edit, or the mirror when the
    /// backend is unreachable.
    async fn server_cart(&self, user: &User) -> Result<Cart, StorefrontError> {
        let mirror_key = keys::user_cart(&user.id);
        match self.session.api().get_cart().await {
            Ok(cart) => {
                self.write(&mirror_key, &cart)?;
                Ok(cart)
            }
            Err(e) if e.is_network() => Ok(self.read(&mirror_key)?),
            Err(e) => Err(self.api_failure(e).await),
        }
    }

    fn key_for(user: Option<&User>) -> String {
        user.map_or_else(|| keys::GUEST_CART.to_string(), |u| keys::user_cart(&u.id))
    }

    fn read(&self, key: &str) -> Result<Cart, StorageError> {
        Ok(self.session.storage().get_json(key)?.unwrap_or_default())
    }

    fn write(&self, key: &str, cart: &Cart) -> Result<(), StorageError> {
        self.session.storage().set_json(key, cart)
    }

    /// Mirror the server's answer, or the local cart if the backend is
    /// unreachable.
    async fn reconcile(
        &self,
        user: &User,
        local: Cart,
        result: Result<Cart, ApiError>,
    ) -> Result<Cart, StorefrontError> {
        let key = keys::user_cart(&user.id);
        match result {
            Ok(server) => {
                self.write(&key, &server)?;
                Ok(server)
            }
            Err(e) if e.is_network() => {
                warn!(error = %e, "Cart sync failed, keeping local change");
                self.write(&key, &local)?;
                Ok(local)
            }
            Err(e) => Err(self.api_failure(e).await),
        }
    }

    /// Rejected tokens end the session; other failures pass through.
    async fn api_failure(&self, error: ApiError) -> StorefrontError {
        if !error.is_auth() {
            return error.into();
        }
        warn!(error = %error, "Backend rejected token, signing out");
        if let Err(e) = self.session.clear().await {
            return e.into();
        }
        AuthError::SessionExpired.into()
    }
}
