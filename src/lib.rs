//! Brew Ledger
//!
//! Tracks a handcrafted tea batch through extraction and reduction,
//! classifies the final yield and keeps a local record of every batch.

pub mod batch;
pub mod calculator;
pub mod config;
pub mod db;
pub mod ledger;
pub mod models;
pub mod report;
pub mod shell;
pub mod timers;
pub mod transfer;
