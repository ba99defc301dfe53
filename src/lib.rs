//! Turn-based resolution of battles between two armies of troop groups, with skills, timed
//! status effects, casualty accounting and Monte Carlo outcome forecasting.

pub mod cli;
pub mod combat;
pub mod data;
pub mod error;
pub mod forecast;
pub mod parallel;
