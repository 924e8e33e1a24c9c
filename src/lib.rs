//! Basket metrics - daily position and basket valuation in a target currency
//!
//! Positions are valued day by day over an inclusive calendar window, their
//! values converted with daily FX rates, and summed into a basket whose
//! returns are value-weighted. Results are quantized once, at the payload
//! boundary, before submission.

pub mod basket;
pub mod calendar;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod payload;
pub mod positions;
pub mod precision;
pub mod reports;
pub mod resolver;
pub mod submit;
pub mod utils;
pub mod valuation;

pub use error::{MetricsError, Result};
