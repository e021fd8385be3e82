pub mod confidence;
pub mod direction;
pub mod entry_pricing;
pub mod evaluated_pairs;
pub mod exit_policy;
pub mod similarity;
pub mod trade_side;
pub mod trade_status;
pub mod verdict;
