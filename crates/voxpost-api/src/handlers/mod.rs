pub mod admin;
pub mod exports;
pub mod health;
pub mod recordings;
pub mod subscriptions;
pub mod transcriptions;
pub mod webhooks;
