//! Core domain logic: OHLCV bars, the indicator library, pattern detection,
//! the twin-state snapshot, and the engines built on top of it.

pub mod alert;
pub mod decision;
pub mod error;
pub mod frame;
pub mod indicator;
pub mod ohlcv;
pub mod patterns;
pub mod portfolio;
pub mod simulator;
pub mod twin_state;
