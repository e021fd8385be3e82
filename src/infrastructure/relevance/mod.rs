pub mod anthropic;
pub mod disabled;
