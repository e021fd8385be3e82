pub mod market;
pub mod market_match;
pub mod signal;
pub mod skipped_entry;
pub mod trade;
