pub mod filter;
pub mod lookup;
