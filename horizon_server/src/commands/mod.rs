//! CLI command implementations
//!
//! - [`serve`]: HTTP prediction service
//! - [`prepare`]: minute bars to daily bars and a feature table
//! - [`train`]: ridge model bundle from daily history

mod prepare;
mod serve;
mod train;

pub use prepare::PrepareCommand;
pub use serve::ServeCommand;
pub use train::TrainCommand;
