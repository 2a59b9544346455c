//! # Crypto Horizon
//!
//! Umbrella crate for the workspace:
//!
//! - [`trade_math`]: streaming EMA, RSI, MACD and ATR
//! - [`horizon_forecast`]: feature derivation, model bundles, single-step and
//!   horizon forecasting, training
//! - [`horizon_server`]: HTTP service and the `horizon` CLI
//!
//! ## Example
//!
//! ```
//! use crypto_horizon_workspace::forecast::{validate_horizon, MAX_HORIZON};
//!
//! assert_eq!(validate_horizon(7).unwrap(), 7);
//! assert!(validate_horizon(MAX_HORIZON as i64 + 1).is_err());
//! ```

pub use horizon_forecast as forecast;
pub use horizon_server as server;
pub use trade_math as math;
