// grocery-client/src/order/mod.rs
// 订单模块

pub mod client;
pub mod state;

pub use client::GroceryClient;
pub use state::{OrderOutcome, OrderStatus, PendingOrder, ReservedItems};
