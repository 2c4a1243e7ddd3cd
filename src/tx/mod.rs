//! Lock transaction construction

mod builder;

pub use builder::{build_lock_transaction, encode_chain_id, LockTransaction, BASE_FEE_STROOPS};
