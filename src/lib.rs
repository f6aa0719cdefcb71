//! # DECT NWK - Network layer of the DECT protocol stack
//!
//! Implementation of the DECT NWK layer in pure RUST
//!
//! The library sits between a kernel-provided DECT socket family and an
//! application driving cordless telephony endpoints, on either side of
//! the air interface: fixed part (base station) or portable part
//! (handset). It speaks the S-format signaling codec, multiplexes
//! transactions over data links and runs the Call Control and Mobility
//! Management state machines. I/O and timers stay with the application's
//! event loop.
//!
//! # Standards
//!
//! | Document      | Title      |
//! | ------------- | ------------- |
//! | ETSI EN 300 175-5 | DECT Common Interface; Part 5: Network (NWK) layer |
//! | ETSI EN 300 175-6 | DECT Common Interface; Part 6: Identities and addressing |
//!

#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![cfg_attr(test, deny(warnings))]

mod nwk;
mod sfmt;
mod tools;

pub mod identity;
pub mod transport;

///
/// NWK layer handle, configuration and the application facing primitives
///
pub mod handle {
    pub use crate::nwk::cc::CallState;
    pub use crate::nwk::handle::{
        CallId, CcOps, Config, DectHandle, DectOps, DectRole, EventOps, FdEvents, LinkId, MmId,
        MmOps, MmParam, MnccParam, TimerId,
    };
    pub use crate::nwk::transaction::{Pd, ProtocolEntry, ReleaseMode, Transaction};
}

///
/// S-format codec: information elements, message grammars, parse and
/// build entry points
///
pub mod sformat {
    pub use crate::sfmt::ie;
    pub use crate::sfmt::mbuf::{Mbuf, MBUF_SIZE};
    pub use crate::sfmt::msg::{CcMsgType, IeStatus, MmMsgType, SfmtIeDesc};
    pub use crate::sfmt::{
        build_message, parse_ie_header, parse_message, IeCollection, IeList, RawIe,
    };
}

pub use crate::tools::error;

#[cfg(test)]
mod tests {
    pub fn init() {
        env_logger::builder().is_test(true).try_init().ok();
    }

    #[test]
    fn test_init() {
        init();
    }
}
