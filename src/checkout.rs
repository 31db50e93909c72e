//! Checkout
//!
//! ```text
//! Idle -> Reviewing -> Confirming -> Processing -> Idle        (order written, cart cleared)
//!                                               \-> Confirming (write failed, cart untouched)
//! ```

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cart::{Cart, CartItem},
    uuids::TypedUuid,
};

/// Order identifier.
pub type OrderId = TypedUuid<Order>;

/// Errors raised by checkout transitions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    /// The requested step is not allowed from the current state.
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        /// State the flow was in
        state: CheckoutState,
        /// Attempted step
        action: &'static str,
    },

    /// Confirming requires at least one cart item.
    #[error("cart is empty")]
    EmptyCart,
}

/// Checkout states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutState {
    /// Cart is closed
    #[default]
    Idle,

    /// Cart is open for review
    Reviewing,

    /// Waiting for the purchaser to confirm
    Confirming,

    /// Order write is in flight
    Processing,
}

impl std::fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Reviewing => "reviewing",
            Self::Confirming => "confirming",
            Self::Processing => "processing",
        };

        f.write_str(label)
    }
}

/// Who placed an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Purchaser {
    /// No signed-in identity
    Anonymous,

    /// A signed-in identity
    User {
        /// Identity provider user id
        uid: String,
        /// Account email, when known
        email: Option<String>,
    },
}

/// Order status. Orders are only ever created as pending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Awaiting fulfilment
    #[default]
    Pending,
}

/// Immutable order record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Order identifier
    pub id: OrderId,

    /// Copied cart items
    pub items: Vec<CartItem>,

    /// Sum of line subtotals at confirmation time
    pub total: u64,

    /// Purchaser
    pub purchaser: Purchaser,

    /// Creation time
    pub created_at: Timestamp,

    /// Status
    pub status: OrderStatus,
}

impl Order {
    /// Snapshot `cart` into a pending order.
    pub fn from_cart(cart: &Cart, purchaser: Purchaser, created_at: Timestamp) -> Self {
        Self {
            id: OrderId::new(),
            items: cart.items().to_vec(),
            total: cart.total(),
            purchaser,
            created_at,
            status: OrderStatus::Pending,
        }
    }
}

/// Checkout state machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutFlow {
    state: CheckoutState,
}

impl CheckoutFlow {
    /// Create an idle flow.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> CheckoutState {
        self.state
    }

    /// `Idle -> Reviewing`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] from any other state.
    pub fn open_cart(&mut self) -> Result<(), CheckoutError> {
        self.transition(CheckoutState::Idle, CheckoutState::Reviewing, "open the cart")
    }

    /// `Reviewing -> Confirming`, only with a non-empty cart.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] or
    /// [`CheckoutError::InvalidTransition`].
    pub fn proceed(&mut self, cart: &Cart) -> Result<(), CheckoutError> {
        self.expect_state(CheckoutState::Reviewing, "proceed to checkout")?;

        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        self.state = CheckoutState::Confirming;

        Ok(())
    }

    /// `Reviewing | Confirming -> Idle`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] from `Idle` or
    /// `Processing`.
    pub fn cancel(&mut self) -> Result<(), CheckoutError> {
        match self.state {
            CheckoutState::Reviewing | CheckoutState::Confirming => {
                self.state = CheckoutState::Idle;

                Ok(())
            }
            state => Err(CheckoutError::InvalidTransition {
                state,
                action: "cancel",
            }),
        }
    }

    /// `Confirming -> Processing`, producing the order to write.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] from any state other than
    /// `Confirming`, and [`CheckoutError::EmptyCart`] if the cart was emptied
    /// in the meantime.
    pub fn confirm(
        &mut self,
        cart: &Cart,
        purchaser: Purchaser,
        now: Timestamp,
    ) -> Result<Order, CheckoutError> {
        self.expect_state(CheckoutState::Confirming, "confirm")?;

        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        self.state = CheckoutState::Processing;

        Ok(Order::from_cart(cart, purchaser, now))
    }

    /// `Processing -> Idle` after the order was written. Clears the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] outside `Processing`.
    pub fn succeed(&mut self, cart: &mut Cart) -> Result<(), CheckoutError> {
        self.transition(CheckoutState::Processing, CheckoutState::Idle, "complete")?;

        cart.clear();

        Ok(())
    }

    /// `Processing -> Confirming` after the order write failed.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] outside `Processing`.
    pub fn fail(&mut self) -> Result<(), CheckoutError> {
        self.transition(CheckoutState::Processing, CheckoutState::Confirming, "fail")
    }

    fn transition(
        &mut self,
        from: CheckoutState,
        to: CheckoutState,
        action: &'static str,
    ) -> Result<(), CheckoutError> {
        self.expect_state(from, action)?;
        self.state = to;

        Ok(())
    }

    fn expect_state(&self, expected: CheckoutState, action: &'static str) -> Result<(), CheckoutError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(CheckoutError::InvalidTransition {
                state: self.state,
                action,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;
    use crate::parts::{Part, PartData, PartId};

    fn cart() -> Cart {
        let mut cart = Cart::new();

        cart.add(&Part::from_data(
            PartId::new(),
            PartData {
                name: "Stick".to_string(),
                category: "PS5".to_string(),
                subcategory: "Analog".to_string(),
                price: 450,
                in_stock: true,
                ..PartData::default()
            },
        ));

        cart
    }

    #[test]
    fn happy_path_clears_cart() -> TestResult {
        let mut flow = CheckoutFlow::new();
        let mut cart = cart();

        flow.open_cart()?;
        flow.proceed(&cart)?;
        let order = flow.confirm(&cart, Purchaser::Anonymous, Timestamp::UNIX_EPOCH)?;

        assert_eq!(flow.state(), CheckoutState::Processing);
        assert_eq!(order.total, 450);
        assert_eq!(order.items, cart.items());
        assert_eq!(order.status, OrderStatus::Pending);

        flow.succeed(&mut cart)?;

        assert_eq!(flow.state(), CheckoutState::Idle);
        assert!(cart.is_empty());

        Ok(())
    }

    #[test]
    fn failure_returns_to_confirming_and_keeps_cart() -> TestResult {
        let mut flow = CheckoutFlow::new();
        let cart = cart();
        let before = cart.clone();

        flow.open_cart()?;
        flow.proceed(&cart)?;
        flow.confirm(&cart, Purchaser::Anonymous, Timestamp::UNIX_EPOCH)?;
        flow.fail()?;

        assert_eq!(flow.state(), CheckoutState::Confirming);
        assert_eq!(cart, before);

        Ok(())
    }

    #[test]
    fn empty_cart_cannot_proceed() -> TestResult {
        let mut flow = CheckoutFlow::new();

        flow.open_cart()?;

        assert_eq!(flow.proceed(&Cart::new()), Err(CheckoutError::EmptyCart));
        assert_eq!(flow.state(), CheckoutState::Reviewing);

        Ok(())
    }

    #[test]
    fn cancel_is_only_allowed_while_reviewing_or_confirming() -> TestResult {
        let mut flow = CheckoutFlow::new();

        assert!(matches!(
            flow.cancel(),
            Err(CheckoutError::InvalidTransition {
                state: CheckoutState::Idle,
                ..
            })
        ));

        flow.open_cart()?;
        flow.cancel()?;
        assert_eq!(flow.state(), CheckoutState::Idle);

        let cart = cart();
        flow.open_cart()?;
        flow.proceed(&cart)?;
        flow.confirm(&cart, Purchaser::Anonymous, Timestamp::UNIX_EPOCH)?;

        assert!(flow.cancel().is_err());

        Ok(())
    }

    #[test]
    fn out_of_order_steps_are_rejected() {
        let mut flow = CheckoutFlow::new();
        let mut cart = cart();

        assert!(flow.proceed(&cart).is_err());
        assert!(flow
            .confirm(&cart, Purchaser::Anonymous, Timestamp::UNIX_EPOCH)
            .is_err());
        assert!(flow.succeed(&mut cart).is_err());
        assert!(flow.fail().is_err());
        assert_eq!(flow.state(), CheckoutState::Idle);
        assert!(!cart.is_empty());
    }

    #[test]
    fn order_serializes_purchaser_and_status() -> TestResult {
        let order = Order::from_cart(
            &cart(),
            Purchaser::User {
                uid: "u-1".to_string(),
                email: Some("buyer@example.com".to_string()),
            },
            Timestamp::UNIX_EPOCH,
        );

        let json = serde_json::to_value(&order)?;

        assert_eq!(json["status"], "pending");
        assert_eq!(json["purchaser"]["kind"], "user");
        assert_eq!(json["total"], 450);
        assert_eq!(json["createdAt"], "1970-01-01T00:00:00Z");

        Ok(())
    }
}
