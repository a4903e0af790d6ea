//! Checkout flow: cart plus selections in, order out.
//!
//! A step-sequenced state machine over `ReviewOrder -> DeliveryAddress ->
//! PaymentMethod -> Confirmation`. Transitions are forward/backward only
//! with no skipping; `Confirmation` is reached solely by a successful
//! [`CheckoutFlow::place_order`]. Back-navigation never discards the
//! customer's address or payment selection.

pub mod order;

use thiserror::Error;
use tracing::{info, instrument, warn};

use greenbasket_core::{CustomerId, UserRole};

use crate::cart::Cart;
use crate::config::StorefrontConfig;
use crate::profile::{Address, CustomerProfile, PaymentMethod};

pub use order::{GatewayError, Order, OrderDraft, OrderGateway, OrderItem, PaymentSummary};

/// Position in the checkout sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStep {
    ReviewOrder,
    DeliveryAddress,
    PaymentMethod,
    Confirmation,
}

impl std::fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReviewOrder => write!(f, "review order"),
            Self::DeliveryAddress => write!(f, "delivery address"),
            Self::PaymentMethod => write!(f, "payment method"),
            Self::Confirmation => write!(f, "confirmation"),
        }
    }
}

/// Errors from the checkout flow.
///
/// The validation variants abort with no side effects; `Gateway` and
/// `GatewayTimeout` are retryable - the cart, step, and selections are
/// left exactly as they were.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("checkout requires the customer role, signed in as {0}")]
    NotACustomer(UserRole),

    #[error("no delivery address selected")]
    NoAddressSelected,

    #[error("no payment method selected")]
    NoPaymentSelected,

    #[error("cannot advance past {0}")]
    CannotAdvance(CheckoutStep),

    #[error("cannot go back from {0}")]
    CannotGoBack(CheckoutStep),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("order service did not respond in time")]
    GatewayTimeout,
}

/// The checkout orchestrator for one customer session.
///
/// Owns the cart for the duration of checkout. On success the cart is
/// cleared; on any failure it is preserved for retry.
#[derive(Debug)]
pub struct CheckoutFlow {
    customer_id: CustomerId,
    cart: Cart,
    step: CheckoutStep,
    selected_address: Option<Address>,
    selected_payment: Option<PaymentMethod>,
    config: StorefrontConfig,
}

impl CheckoutFlow {
    /// Enter checkout at `ReviewOrder`.
    ///
    /// Seeds the address and payment selections from the profile's
    /// defaults, falling back to the first entry in each list if no
    /// default is flagged.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] for an empty cart or
    /// [`CheckoutError::NotACustomer`] for a non-customer role; these
    /// model the entry guards that navigate away from checkout entirely.
    #[instrument(skip(cart, profile, config), fields(customer_id = %profile.customer_id))]
    pub fn begin(
        cart: Cart,
        profile: &CustomerProfile,
        role: UserRole,
        config: &StorefrontConfig,
    ) -> Result<Self, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        if role != UserRole::Customer {
            return Err(CheckoutError::NotACustomer(role));
        }

        let selected_address = profile
            .default_address()
            .or_else(|| profile.addresses().first())
            .cloned();
        let selected_payment = profile
            .default_payment_method()
            .or_else(|| profile.payment_methods().first())
            .cloned();

        Ok(Self {
            customer_id: profile.customer_id,
            cart,
            step: CheckoutStep::ReviewOrder,
            selected_address,
            selected_payment,
            config: config.clone(),
        })
    }

    /// Move one step forward.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::CannotAdvance`] at `PaymentMethod` (only a
    /// placed order reaches `Confirmation`) and at `Confirmation`.
    pub fn advance(&mut self) -> Result<CheckoutStep, CheckoutError> {
        self.step = match self.step {
            CheckoutStep::ReviewOrder => CheckoutStep::DeliveryAddress,
            CheckoutStep::DeliveryAddress => CheckoutStep::PaymentMethod,
            CheckoutStep::PaymentMethod | CheckoutStep::Confirmation => {
                return Err(CheckoutError::CannotAdvance(self.step));
            }
        };
        Ok(self.step)
    }

    /// Move one step back. Selections are intentionally kept; the
    /// customer's prior choice should not be lost.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::CannotGoBack`] at `ReviewOrder` and at
    /// `Confirmation` (the order is already placed).
    pub fn back(&mut self) -> Result<CheckoutStep, CheckoutError> {
        self.step = match self.step {
            CheckoutStep::DeliveryAddress => CheckoutStep::ReviewOrder,
            CheckoutStep::PaymentMethod => CheckoutStep::DeliveryAddress,
            CheckoutStep::ReviewOrder | CheckoutStep::Confirmation => {
                return Err(CheckoutError::CannotGoBack(self.step));
            }
        };
        Ok(self.step)
    }

    /// Replace the selected delivery address.
    pub fn select_address(&mut self, address: Address) {
        self.selected_address = Some(address);
    }

    /// Replace the selected payment method.
    pub fn select_payment(&mut self, method: PaymentMethod) {
        self.selected_payment = Some(method);
    }

    /// Place the order.
    ///
    /// Re-checks the preconditions (non-empty cart, address and payment
    /// selected), snapshots the cart into an [`OrderDraft`] with
    /// `total = subtotal + delivery fee`, and awaits the gateway under the
    /// configured timeout. On success the cart is cleared and the flow
    /// lands on `Confirmation`.
    ///
    /// Callable from any step before `Confirmation`: one-tap reorder flows
    /// place straight from `ReviewOrder` with the seeded defaults, so the
    /// preconditions above are the gate, not the step position.
    ///
    /// # Errors
    ///
    /// Validation errors ([`CheckoutError::EmptyCart`],
    /// [`CheckoutError::NoAddressSelected`],
    /// [`CheckoutError::NoPaymentSelected`]) abort before the gateway is
    /// invoked. [`CheckoutError::Gateway`] and
    /// [`CheckoutError::GatewayTimeout`] leave the cart and step unchanged
    /// so the customer can retry.
    #[instrument(skip(self, gateway), fields(customer_id = %self.customer_id))]
    pub async fn place_order<G: OrderGateway>(
        &mut self,
        gateway: &G,
    ) -> Result<Order, CheckoutError> {
        let store_id = self.cart.store_id().ok_or(CheckoutError::EmptyCart)?;
        if self.cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let address = self
            .selected_address
            .clone()
            .ok_or(CheckoutError::NoAddressSelected)?;
        let payment = self
            .selected_payment
            .as_ref()
            .ok_or(CheckoutError::NoPaymentSelected)?;

        let subtotal = self.cart.subtotal();
        let total = subtotal + self.config.delivery_fee;
        let draft = OrderDraft {
            customer_id: self.customer_id,
            store_id,
            items: self.cart.lines().iter().map(OrderItem::from).collect(),
            address,
            payment: PaymentSummary::from(payment),
            subtotal,
            delivery_fee: self.config.delivery_fee,
            total,
        };

        let order = match tokio::time::timeout(
            self.config.order_timeout,
            gateway.create_order(draft),
        )
        .await
        {
            Ok(Ok(order)) => order,
            Ok(Err(e)) => {
                warn!(error = %e, "order creation failed, cart preserved");
                return Err(CheckoutError::Gateway(e));
            }
            Err(_) => {
                warn!("order creation timed out, cart preserved");
                return Err(CheckoutError::GatewayTimeout);
            }
        };

        self.cart.clear();
        self.step = CheckoutStep::Confirmation;
        info!(order_id = %order.id, total = %order.total, "order placed");
        Ok(order)
    }

    /// Current step.
    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.step
    }

    /// The cart as the flow currently holds it.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// The currently selected delivery address.
    #[must_use]
    pub const fn selected_address(&self) -> Option<&Address> {
        self.selected_address.as_ref()
    }

    /// The currently selected payment method.
    #[must_use]
    pub const fn selected_payment(&self) -> Option<&PaymentMethod> {
        self.selected_payment.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use chrono::Utc;
    use rust_decimal_macros::dec;

    use greenbasket_core::{
        AddressId, CurrencyCode, CustomerId, Money, OrderId, PaymentMethodId, ProductId,
        ProductStatus, StoreId,
    };

    use crate::catalog::Product;
    use crate::profile::PaymentDetails;

    /// Gateway that accepts every order and counts invocations.
    #[derive(Default)]
    struct AcceptingGateway {
        calls: Arc<AtomicUsize>,
    }

    impl OrderGateway for AcceptingGateway {
        async fn create_order(&self, draft: OrderDraft) -> Result<Order, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Order::from_draft(OrderId::new_random(), draft, Utc::now()))
        }
    }

    /// Gateway that always rejects.
    struct RejectingGateway;

    impl OrderGateway for RejectingGateway {
        async fn create_order(&self, _draft: OrderDraft) -> Result<Order, GatewayError> {
            Err(GatewayError("payment declined".to_string()))
        }
    }

    /// Gateway that never answers within any reasonable test timeout.
    struct StalledGateway;

    impl OrderGateway for StalledGateway {
        async fn create_order(&self, draft: OrderDraft) -> Result<Order, GatewayError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Order::from_draft(OrderId::new_random(), draft, Utc::now()))
        }
    }

    fn product(id: i32, price: rust_decimal::Decimal) -> Product {
        Product {
            id: ProductId::new(id),
            store_id: StoreId::new(1),
            name: format!("Product {id}"),
            category: "Fruits".to_string(),
            price: Money::new(price, CurrencyCode::GHS),
            discount_price: None,
            stock: 10,
            sku: format!("SKU-{id:04}"),
            status: ProductStatus::Active,
            featured: false,
            sales: 0,
            revenue: Money::zero(CurrencyCode::GHS),
            image: String::new(),
            description: None,
            unit_label: None,
            rating: None,
        }
    }

    fn profile_with_defaults() -> CustomerProfile {
        let mut profile = CustomerProfile::new(CustomerId::new(1));
        profile.save_address(Address {
            id: AddressId::new(1),
            name: "Home".to_string(),
            address: "12 Oxford Street, Osu".to_string(),
            details: None,
            latitude: 5.556,
            longitude: -0.1969,
            is_default: true,
        });
        profile.save_payment_method(PaymentMethod {
            id: PaymentMethodId::new(1),
            name: "Personal MoMo".to_string(),
            details: PaymentDetails::Momo {
                number: "0244000000".to_string(),
                provider: "MTN".to_string(),
                account_name: "Ama Mensah".to_string(),
            },
            is_default: true,
        });
        profile
    }

    fn cart_for_total_test() -> Cart {
        let mut cart = Cart::new();
        cart.add_item(product(1, dec!(10.00)), 2).expect("add");
        let mut discounted = product(2, dec!(5.00));
        discounted.discount_price = Some(Money::new(dec!(3.00), CurrencyCode::GHS));
        cart.add_item(discounted, 1).expect("add discounted");
        cart
    }

    #[test]
    fn test_begin_guards_empty_cart_and_role() {
        let profile = profile_with_defaults();
        let config = StorefrontConfig::default();

        assert_eq!(
            CheckoutFlow::begin(Cart::new(), &profile, UserRole::Customer, &config)
                .err()
                .expect("empty cart"),
            CheckoutError::EmptyCart
        );
        assert_eq!(
            CheckoutFlow::begin(cart_for_total_test(), &profile, UserRole::StoreOwner, &config)
                .err()
                .expect("wrong role"),
            CheckoutError::NotACustomer(UserRole::StoreOwner)
        );
    }

    #[test]
    fn test_begin_seeds_selections_from_defaults() {
        let mut profile = profile_with_defaults();
        // Second, non-default address; the default should still be seeded.
        profile.save_address(Address {
            id: AddressId::new(2),
            name: "Office".to_string(),
            address: "Airport City".to_string(),
            details: None,
            latitude: 5.605,
            longitude: -0.167,
            is_default: false,
        });
        let config = StorefrontConfig::default();
        let flow = CheckoutFlow::begin(cart_for_total_test(), &profile, UserRole::Customer, &config)
            .expect("begin");

        assert_eq!(
            flow.selected_address().map(|a| a.id),
            Some(AddressId::new(1))
        );
        assert_eq!(
            flow.selected_payment().map(|m| m.id),
            Some(PaymentMethodId::new(1))
        );
        assert_eq!(flow.step(), CheckoutStep::ReviewOrder);
    }

    #[test]
    fn test_steps_are_forward_backward_only() {
        let profile = profile_with_defaults();
        let config = StorefrontConfig::default();
        let mut flow =
            CheckoutFlow::begin(cart_for_total_test(), &profile, UserRole::Customer, &config)
                .expect("begin");

        assert_eq!(
            flow.back(),
            Err(CheckoutError::CannotGoBack(CheckoutStep::ReviewOrder))
        );
        assert_eq!(flow.advance(), Ok(CheckoutStep::DeliveryAddress));
        assert_eq!(flow.advance(), Ok(CheckoutStep::PaymentMethod));
        assert_eq!(
            flow.advance(),
            Err(CheckoutError::CannotAdvance(CheckoutStep::PaymentMethod))
        );
        assert_eq!(flow.back(), Ok(CheckoutStep::DeliveryAddress));
    }

    #[test]
    fn test_selections_survive_back_navigation() {
        let profile = profile_with_defaults();
        let config = StorefrontConfig::default();
        let mut flow =
            CheckoutFlow::begin(cart_for_total_test(), &profile, UserRole::Customer, &config)
                .expect("begin");

        flow.advance().expect("to address");
        flow.select_address(Address {
            id: AddressId::new(7),
            name: "Weekend place".to_string(),
            address: "Kokrobite".to_string(),
            details: None,
            latitude: 5.49,
            longitude: -0.36,
            is_default: false,
        });
        flow.back().expect("back to review");

        assert_eq!(
            flow.selected_address().map(|a| a.id),
            Some(AddressId::new(7))
        );
    }

    #[tokio::test]
    async fn test_place_order_totals_and_clears_cart() {
        let profile = profile_with_defaults();
        let config = StorefrontConfig::default();
        let mut flow =
            CheckoutFlow::begin(cart_for_total_test(), &profile, UserRole::Customer, &config)
                .expect("begin");

        let gateway = AcceptingGateway::default();
        let order = flow.place_order(&gateway).await.expect("place order");

        // (10 x 2 + 3 x 1) + 10 delivery = 33
        assert_eq!(order.subtotal.amount, dec!(23.00));
        assert_eq!(order.total.amount, dec!(33.00));
        assert_eq!(order.store_id, StoreId::new(1));
        assert_eq!(order.items.len(), 2);
        assert!(flow.cart().is_empty());
        assert_eq!(flow.step(), CheckoutStep::Confirmation);
        // Confirmation is terminal.
        assert_eq!(
            flow.back(),
            Err(CheckoutError::CannotGoBack(CheckoutStep::Confirmation))
        );
    }

    #[tokio::test]
    async fn test_missing_selection_never_reaches_gateway() {
        let profile = CustomerProfile::new(CustomerId::new(1)); // nothing saved
        let config = StorefrontConfig::default();
        let mut flow =
            CheckoutFlow::begin(cart_for_total_test(), &profile, UserRole::Customer, &config)
                .expect("begin");

        let gateway = AcceptingGateway::default();
        let err = flow.place_order(&gateway).await.expect_err("no address");
        assert_eq!(err, CheckoutError::NoAddressSelected);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
        assert!(!flow.cart().is_empty());
    }

    #[tokio::test]
    async fn test_gateway_failure_preserves_cart_and_step() {
        let profile = profile_with_defaults();
        let config = StorefrontConfig::default();
        let mut flow =
            CheckoutFlow::begin(cart_for_total_test(), &profile, UserRole::Customer, &config)
                .expect("begin");
        let step_before = flow.step();

        let err = flow
            .place_order(&RejectingGateway)
            .await
            .expect_err("rejected");
        assert_eq!(
            err,
            CheckoutError::Gateway(GatewayError("payment declined".to_string()))
        );
        assert_eq!(flow.cart().total_count(), 3);
        assert_eq!(flow.step(), step_before);
    }

    #[tokio::test]
    async fn test_gateway_timeout_is_surfaced() {
        let profile = profile_with_defaults();
        let config = StorefrontConfig {
            order_timeout: Duration::from_millis(10),
            ..StorefrontConfig::default()
        };
        let mut flow =
            CheckoutFlow::begin(cart_for_total_test(), &profile, UserRole::Customer, &config)
                .expect("begin");

        let err = flow
            .place_order(&StalledGateway)
            .await
            .expect_err("timeout");
        assert_eq!(err, CheckoutError::GatewayTimeout);
        assert!(!flow.cart().is_empty());
    }
}
