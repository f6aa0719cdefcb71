//! NWK layer protocol entities
//!
//! The handle owns the data links; the transaction layer multiplexes
//! messages between them and the Call Control and Mobility Management
//! entities.

pub mod cc;
pub mod handle;
pub mod mm;
pub mod timer;
pub mod transaction;
