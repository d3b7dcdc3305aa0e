//! Ability fragments.
//!
//! Each module owns one narrow slice of unit state and the operations on
//! it. A [`crate::unit::Unit`] carries exactly the fragments its kind's
//! metadata declares; these modules never touch roster membership.

pub mod collidable;
pub mod constructable;
pub mod killable;
pub mod movable;
pub mod orderable;
pub mod ownable;
pub mod steerable;

pub use collidable::is_colliding;
pub use constructable::{build, build_cost_per_health, fabricate, BuildState};
pub use killable::Vitals;
pub use movable::Motion;
pub use orderable::{ConstructOrder, Order, OrderQueue, OrderStatus, OrderTag};
pub use ownable::Ownership;
pub use steerable::Steering;
