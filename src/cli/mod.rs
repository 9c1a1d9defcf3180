//! Terminal front end for the trading commands

pub mod account;
pub mod history;
pub mod price;
pub mod setup;
pub mod trade;
pub mod ui;
