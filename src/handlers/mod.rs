pub mod catalog;
pub mod compare;
pub mod health;
pub mod listing;
pub mod metrics_handler;
pub mod pricing;
pub mod search;
pub mod stats;
