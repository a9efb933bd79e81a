pub mod dispatch;
pub mod event;
pub mod fulfillment;
pub mod order;
pub mod rider;
