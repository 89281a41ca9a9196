//! Solar Lead Intake API Library
//!
//! Backend for the Be Solar chat widget: relays chat messages to a hosted completion
//! API and records submitted leads in a spreadsheet plus a notification email.
//!
//! # Modules
//!
//! - `chat_relay`: Completion API client.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers and router.
//! - `models`: Lead record and API payloads.
//! - `notifier`: SMTP lead notifications.
//! - `spreadsheet`: Leads workbook storage.

pub mod chat_relay;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod notifier;
pub mod spreadsheet;
