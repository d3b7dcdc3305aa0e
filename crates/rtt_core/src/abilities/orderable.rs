//! Orders and the per-unit order queue.
//!
//! Only the head of the queue executes. Its execution callback reports
//! whether the order is still [`OrderStatus::Active`] or has been
//! satisfied and should be dequeued.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::components::EntityId;
use crate::math::Vec2Fixed;
use crate::unit_kind::UnitKind;

/// Payload of a construct order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstructOrder {
    /// Kind of unit to build.
    pub kind: UnitKind,
    /// Where to build it. Factories build at their own position.
    pub position: Vec2Fixed,
    /// Power source a power generator is built on.
    pub site: Option<EntityId>,
}

impl ConstructOrder {
    /// Construct a unit of `kind` at `position`.
    #[must_use]
    pub const fn new(kind: UnitKind, position: Vec2Fixed) -> Self {
        Self {
            kind,
            position,
            site: None,
        }
    }

    /// Construct a power generator on the power source `site`.
    #[must_use]
    pub const fn power_generator(site: EntityId, position: Vec2Fixed) -> Self {
        Self {
            kind: UnitKind::PowerGenerator,
            position,
            site: Some(site),
        }
    }
}

/// An order that can be given to an orderable unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Order {
    /// Build or join the construction of a unit.
    Construct(ConstructOrder),
    /// Seek out and fire at a target.
    Attack {
        /// The unit to destroy.
        target: EntityId,
    },
    /// Move to a destination.
    Manoeuvre {
        /// Where to go.
        destination: Vec2Fixed,
    },
}

impl Order {
    /// Tag of this order, used to pick the execution callback.
    #[must_use]
    pub const fn tag(&self) -> OrderTag {
        match self {
            Self::Construct(_) => OrderTag::Construct,
            Self::Attack { .. } => OrderTag::Attack,
            Self::Manoeuvre { .. } => OrderTag::Manoeuvre,
        }
    }
}

/// Discriminant of [`Order`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderTag {
    /// [`Order::Construct`].
    Construct,
    /// [`Order::Attack`].
    Attack,
    /// [`Order::Manoeuvre`].
    Manoeuvre,
}

/// Result of executing the head order for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    /// Keep the order at the head of the queue.
    Active,
    /// The order is satisfied; dequeue it.
    Complete,
}

/// Queue of orders for a unit.
///
/// The front order is the active one. Orders behind it are kept but
/// nothing consumes them yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct OrderQueue {
    orders: VecDeque<Order>,
}

impl OrderQueue {
    /// Create an empty order queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            orders: VecDeque::new(),
        }
    }

    /// Replace the active order, keeping anything queued behind it.
    pub fn set_current(&mut self, order: Order) {
        match self.orders.front_mut() {
            Some(head) => *head = order,
            None => self.orders.push_back(order),
        }
    }

    /// Add an order to the back of the queue.
    pub fn push(&mut self, order: Order) {
        self.orders.push_back(order);
    }

    /// Get the active order.
    #[must_use]
    pub fn current(&self) -> Option<&Order> {
        self.orders.front()
    }

    /// Remove and return the active order.
    pub fn pop(&mut self) -> Option<Order> {
        self.orders.pop_front()
    }

    /// Clear all orders.
    pub fn clear(&mut self) {
        self.orders.clear();
    }

    /// Check if the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Get the number of queued orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Iterate over the queue, head first.
    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }
}
