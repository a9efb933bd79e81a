pub mod coordinator;
pub mod fulfillment;
pub mod matcher;
pub mod pricing;
pub mod sweeper;
