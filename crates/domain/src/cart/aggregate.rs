//! Cart aggregate implementation.

use std::collections::HashMap;

use common::{AggregateId, Money};
use event_store::SequenceNumber;
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, SnapshotCapable};
use crate::ids::{CartItemId, ProductId, UserId};

use super::{CartError, CartEvent, events::ItemAddedToCartData};

/// A line in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// The generated line identifier.
    pub cart_item_id: CartItemId,

    /// The product.
    pub product_id: ProductId,

    /// Human-readable product name.
    pub product_name: String,

    /// Quantity in the cart.
    pub quantity: u32,

    /// Price per unit.
    pub unit_price: Money,

    /// quantity × unit price, as recorded in the add event.
    pub subtotal: Money,
}

/// Cart aggregate root.
///
/// A user's shopping cart: items are added and removed freely until the
/// cart is turned into an order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    /// Unique cart identifier.
    id: Option<AggregateId>,

    /// Current log position for optimistic concurrency.
    #[serde(default)]
    sequence: SequenceNumber,

    /// The user who owns the cart.
    user_id: Option<UserId>,

    /// Lines in the cart, keyed by cart item ID.
    items: HashMap<CartItemId, CartItem>,
}

impl Aggregate for Cart {
    type Event = CartEvent;
    type Error = CartError;

    fn aggregate_type() -> &'static str {
        "Cart"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn sequence(&self) -> SequenceNumber {
        self.sequence
    }

    fn set_sequence(&mut self, sequence: SequenceNumber) {
        self.sequence = sequence;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            CartEvent::CartCreated(data) => {
                self.id = Some(data.cart_id);
                self.user_id = Some(data.user_id);
                self.items = HashMap::new();
            }
            CartEvent::ItemAddedToCart(data) => self.apply_item_added(data),
            CartEvent::ItemRemovedFromCart(data) => {
                self.items.remove(&data.cart_item_id);
            }
        }
    }
}

impl SnapshotCapable for Cart {
    fn snapshot_interval() -> usize {
        50
    }
}

// Query methods
impl Cart {
    /// Returns the owning user ID.
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Returns all lines in the cart.
    pub fn items(&self) -> impl Iterator<Item = &CartItem> {
        self.items.values()
    }

    /// Returns a line by cart item ID.
    pub fn get_item(&self, cart_item_id: &CartItemId) -> Option<&CartItem> {
        self.items.get(cart_item_id)
    }

    /// Returns the number of lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the sum of line subtotals.
    pub fn total_amount(&self) -> Money {
        self.items.values().map(|item| item.subtotal).sum()
    }

    /// Returns true if the cart has items.
    pub fn has_items(&self) -> bool {
        !self.items.is_empty()
    }
}

// Command methods (return events)
impl Cart {
    /// Creates a new cart for a user.
    pub fn create(
        &self,
        cart_id: AggregateId,
        user_id: UserId,
    ) -> Result<Vec<CartEvent>, CartError> {
        if self.id.is_some() {
            return Err(CartError::AlreadyCreated);
        }

        Ok(vec![CartEvent::cart_created(cart_id, user_id)])
    }

    /// Adds an item to the cart.
    ///
    /// Generates the cart item id and derives the subtotal; both are
    /// recorded in the event.
    pub fn add_item(
        &self,
        product_id: ProductId,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Result<Vec<CartEvent>, CartError> {
        let cart_id = self.id.ok_or(CartError::NotCreated)?;

        if quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity });
        }

        if !unit_price.is_positive() {
            return Err(CartError::InvalidPrice {
                price: unit_price.cents(),
            });
        }

        Ok(vec![CartEvent::item_added(
            cart_id,
            CartItemId::new(),
            product_id,
            product_name,
            quantity,
            unit_price,
        )])
    }

    /// Removes an item from the cart.
    pub fn remove_item(&self, cart_item_id: CartItemId) -> Result<Vec<CartEvent>, CartError> {
        let cart_id = self.id.ok_or(CartError::NotCreated)?;

        let item = self
            .items
            .get(&cart_item_id)
            .ok_or(CartError::ItemNotFound { cart_item_id })?;

        Ok(vec![CartEvent::item_removed(
            cart_id,
            cart_item_id,
            item.product_id.clone(),
        )])
    }
}

// Apply event helpers
impl Cart {
    fn apply_item_added(&mut self, data: ItemAddedToCartData) {
        let item = CartItem {
            cart_item_id: data.cart_item_id,
            product_id: data.product_id,
            product_name: data.product_name,
            quantity: data.quantity,
            unit_price: data.unit_price,
            subtotal: data.subtotal,
        };
        self.items.insert(data.cart_item_id, item);
    }
}
