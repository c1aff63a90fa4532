pub mod health;
pub mod metrics;
pub mod permissions;
pub mod tasks;
