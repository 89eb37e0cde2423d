pub mod errors;
pub mod match_record;
pub mod validation;
