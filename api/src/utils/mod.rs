pub mod public_id;
pub mod rate_limit;
pub mod upload;
