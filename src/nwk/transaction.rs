//! Transaction layer
//!
//! Tracks the transactions open on every data link and demultiplexes
//! inbound messages: a message matching an open transaction goes to its
//! protocol's receive path, anything else is offered to the protocol as a
//! prospective new transaction. Outbound transactions allocate the lowest
//! free transaction value, bounded by the protocol's ceiling.

use std::collections::HashMap;

use crate::nwk::handle::{CallId, DectHandle, DectRole, FdOwner, LinkId, MmId};
use crate::nwk::timer::TimerOwner;
use crate::identity::Ipui;
use crate::sfmt::mbuf::Mbuf;
use crate::sfmt::msg::SfmtIeDesc;
use crate::sfmt::{build_message, IeCollection};
use crate::tools::error::{DectError, ErrorKind, Result};
use crate::transport::{Dlei, LinkChannel};

/// NWK layer protocol discriminators (EN 300 175-5 §7.2)
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Pd {
    /// Link Control Entity
    Lce = 0x0,
    /// Call Control
    Cc = 0x3,
    /// Call Independent Supplementary Services
    Ciss = 0x4,
    /// Mobility Management
    Mm = 0x5,
    /// Connectionless Message Service
    Clms = 0x6,
    /// Connection Oriented Message Service
    Coms = 0x7,
}

impl TryFrom<u8> for Pd {
    type Error = ();

    fn try_from(v: u8) -> std::result::Result<Self, Self::Error> {
        match v {
            0x0 => Ok(Pd::Lce),
            0x3 => Ok(Pd::Cc),
            0x4 => Ok(Pd::Ciss),
            0x5 => Ok(Pd::Mm),
            0x6 => Ok(Pd::Clms),
            0x7 => Ok(Pd::Coms),
            _ => Err(()),
        }
    }
}

/// One protocol of the registry
#[derive(Clone, Copy, Debug)]
pub struct ProtocolEntry {
    /// Protocol discriminator
    pub pd: Pd,
    /// Protocol name
    pub name: &'static str,
    /// Maximum concurrent transactions per data link and direction
    pub max_transactions: u8,
}

/// Builds the protocol registry. CC and MM carry entities in this
/// library; the others are routed here only to be named in diagnostics.
pub(crate) fn register_protocols() -> Vec<ProtocolEntry> {
    vec![
        ProtocolEntry {
            pd: Pd::Lce,
            name: "Link Control",
            max_transactions: 7,
        },
        ProtocolEntry {
            pd: Pd::Cc,
            name: "Call Control",
            max_transactions: 7,
        },
        ProtocolEntry {
            pd: Pd::Ciss,
            name: "Call Independent Supplementary Services",
            max_transactions: 7,
        },
        ProtocolEntry {
            pd: Pd::Mm,
            name: "Mobility Management",
            max_transactions: 1,
        },
        ProtocolEntry {
            pd: Pd::Clms,
            name: "Connectionless Message Service",
            max_transactions: 1,
        },
        ProtocolEntry {
            pd: Pd::Coms,
            name: "Connection Oriented Message Service",
            max_transactions: 1,
        },
    ]
}

/// One open transaction: protocol, transaction value and the role that
/// initiated it. The initiating role is the F bit on the wire, doubling
/// the identifier space of a data link.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Transaction {
    /// Protocol discriminator
    pub pd: Pd,
    /// Transaction value (3 bits)
    pub tv: u8,
    /// Initiating role
    pub initiator: DectRole,
}

/// Owner of an open transaction; recovers the protocol state from the
/// transaction table
#[derive(Clone, Copy, Debug)]
pub(crate) enum TransactionOwner {
    Call(CallId),
    Mm(MmId),
}

/// Release mode when the last transaction of a link closes
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ReleaseMode {
    /// Release the link after the grace period
    Normal,
    /// Keep the link up
    Partial,
}

/// One signaling association with a peer
#[derive(Debug)]
pub(crate) struct DataLink {
    pub id: LinkId,
    pub ipui: Ipui,
    pub channel: Option<Box<dyn LinkChannel>>,
    pub transactions: HashMap<Transaction, TransactionOwner>,
    pub release_timer: Option<crate::nwk::handle::TimerId>,
}

/*
 * Frame header on the signaling SAP:
 *
 *  +-+-+-+-+-+-+-+-+
 *  |F| TV  |  PD   |   F: initiating role (0 = FP, 1 = PP)
 *  +-+-+-+-+-+-+-+-+
 *  | message type  |
 *  +-+-+-+-+-+-+-+-+
 *  | IE stream ... |
 */

pub(crate) fn encode_header(t: &Transaction, mtype: u8) -> [u8; 2] {
    let f = match t.initiator {
        DectRole::Fp => 0,
        DectRole::Pp => 0x80,
    };
    [f | (t.tv & 0x07) << 4 | t.pd as u8, mtype]
}

pub(crate) fn decode_header(frame: &[u8]) -> Result<(Transaction, u8)> {
    if frame.len() < 2 {
        return Err(DectError::new(ErrorKind::Truncated, "short frame header"));
    }
    let pd = Pd::try_from(frame[0] & 0x0f).map_err(|_| {
        DectError::new(
            ErrorKind::InvalidIe,
            format!("unknown protocol discriminator {}", frame[0] & 0x0f),
        )
    })?;
    let initiator = match frame[0] & 0x80 {
        0 => DectRole::Fp,
        _ => DectRole::Pp,
    };
    Ok((
        Transaction {
            pd,
            tv: (frame[0] >> 4) & 0x07,
            initiator,
        },
        frame[1],
    ))
}

impl DectHandle {
    fn protocol(&self, pd: Pd) -> &ProtocolEntry {
        self.protocols
            .iter()
            .find(|p| p.pd == pd)
            .expect("registry covers all discriminators")
    }

    ///
    /// Establishes a data link towards `ipui`, or returns the existing
    /// one. A signaling channel is opened through the transport and its
    /// descriptor, when it has one, registered with the event loop.
    ///
    pub fn link_establish(&mut self, ipui: &Ipui) -> Result<LinkId> {
        if let Some(link) = self.links.values().find(|l| &l.ipui == ipui) {
            return Ok(link.id);
        }
        let channel = self.transport.clone().open_signaling(&Dlei {
            ipui: ipui.clone(),
        })?;
        let id = LinkId(self.next_id());
        log::info!("link {:?}: established towards {:?}", id, ipui);
        let fd = channel.raw_fd();
        self.links.insert(
            id,
            DataLink {
                id,
                ipui: ipui.clone(),
                channel: Some(channel),
                transactions: HashMap::new(),
                release_timer: None,
            },
        );
        if let Some(fd) = fd {
            self.register_channel_fd(fd, FdOwner::Signaling(id));
        }
        Ok(id)
    }

    /// Data link handle of `ipui`, if one is established
    pub fn link_lookup(&self, ipui: &Ipui) -> Option<LinkId> {
        self.links.values().find(|l| &l.ipui == ipui).map(|l| l.id)
    }

    ///
    /// Delivers one inbound frame of a data link.
    ///
    /// Called by [`DectHandle::fd_process`] for kernel transports and
    /// directly by loopback setups. A message of an open transaction is
    /// handed to its protocol entity, anything else is offered to the
    /// protocol as a new transaction.
    ///
    pub fn link_rcv(&mut self, link: LinkId, frame: &[u8]) -> Result<()> {
        let (transaction, mtype) = decode_header(frame)?;
        let mut mb = Mbuf::from_slice(&frame[2..])?;
        mb.mtype = mtype;

        let dl = self.links.get(&link).ok_or_else(|| {
            DectError::new(ErrorKind::Io, format!("unknown link {:?}", link))
        })?;
        log::debug!(
            "link {:?}: {} transaction {}/{} message {:#04x}",
            link,
            self.protocol(transaction.pd).name,
            transaction.tv,
            match transaction.initiator {
                DectRole::Fp => "F",
                DectRole::Pp => "P",
            },
            mtype
        );

        match dl.transactions.get(&transaction).copied() {
            Some(TransactionOwner::Call(call)) => crate::nwk::cc::rcv(self, call, mb),
            Some(TransactionOwner::Mm(mmta)) => crate::nwk::mm::rcv(self, mmta, mb),
            None => self.protocol_open(link, transaction, mb),
        }
        Ok(())
    }

    /// Routes a message of an unknown transaction to its protocol
    fn protocol_open(&mut self, link: LinkId, transaction: Transaction, mb: Mbuf) {
        if transaction.initiator == self.role {
            // a reply to a transaction we never opened
            log::debug!("dropping reply to unknown transaction");
            return;
        }
        match transaction.pd {
            Pd::Cc => crate::nwk::cc::open(self, link, transaction, mb),
            Pd::Mm => crate::nwk::mm::open(self, link, transaction, mb),
            pd => {
                log::debug!("no entity for {}, dropping", self.protocol(pd).name);
            }
        }
    }

    /// Number of open transactions of `pd` on `link` initiated by `role`
    fn transactions_used(&self, link: LinkId, pd: Pd, role: DectRole) -> usize {
        match self.links.get(&link) {
            Some(dl) => dl
                .transactions
                .keys()
                .filter(|t| t.pd == pd && t.initiator == role)
                .count(),
            None => 0,
        }
    }

    /// Allocates the next free outbound transaction of `pd` on `link`
    pub(crate) fn transaction_alloc(&mut self, link: LinkId, pd: Pd) -> Result<Transaction> {
        let max = self.protocol(pd).max_transactions;
        let role = self.role;
        let dl = self.links.get(&link).ok_or_else(|| {
            DectError::new(ErrorKind::Io, format!("unknown link {:?}", link))
        })?;
        for tv in 0..max {
            let t = Transaction {
                pd,
                tv,
                initiator: role,
            };
            if !dl.transactions.contains_key(&t) {
                return Ok(t);
            }
        }
        Err(DectError::new(
            ErrorKind::Overload,
            format!("no {} transaction available", self.protocol(pd).name),
        ))
    }

    /// true when a new inbound transaction would exceed the ceiling
    pub(crate) fn transaction_over_ceiling(&self, link: LinkId, t: &Transaction) -> bool {
        let max = self.protocol(t.pd).max_transactions as usize;
        self.transactions_used(link, t.pd, t.initiator) >= max || t.tv >= max as u8
    }

    /// Promotes a transaction into the open set
    pub(crate) fn transaction_confirm(
        &mut self,
        link: LinkId,
        t: Transaction,
        owner: TransactionOwner,
    ) {
        let timer = match self.links.get_mut(&link) {
            Some(dl) => {
                dl.transactions.insert(t, owner);
                dl.release_timer.take()
            }
            None => None,
        };
        if let Some(timer) = timer {
            // the link is in use again
            self.timer_stop(timer);
        }
    }

    /// Closes a transaction and releases its identifier. When the last
    /// transaction of the link closes in `Normal` mode, the release grace
    /// timer is started.
    pub(crate) fn transaction_close(&mut self, link: LinkId, t: &Transaction, mode: ReleaseMode) {
        let idle = match self.links.get_mut(&link) {
            Some(dl) => {
                dl.transactions.remove(t);
                dl.transactions.is_empty() && dl.release_timer.is_none()
            }
            None => return,
        };
        log::debug!("link {:?}: closed transaction {}/{:?}", link, t.tv, t.pd);
        if idle && mode == ReleaseMode::Normal {
            let grace = self.link_grace;
            let timer = self.timer_start(TimerOwner::LinkRelease(link), grace);
            if let Some(dl) = self.links.get_mut(&link) {
                dl.release_timer = Some(timer);
            }
        }
    }

    /// Serializes and sends one message on a transaction
    pub(crate) fn transaction_send(
        &self,
        link: LinkId,
        t: &Transaction,
        mtype: u8,
        desc: &[SfmtIeDesc],
        col: &IeCollection,
    ) -> Result<()> {
        let mut mb = Mbuf::new();
        mb.mtype = mtype;
        build_message(self.role, desc, col, &mut mb)?;

        let dl = self.links.get(&link).ok_or_else(|| {
            DectError::new(ErrorKind::Io, format!("unknown link {:?}", link))
        })?;
        let channel = dl.channel.as_ref().ok_or_else(|| {
            DectError::new(ErrorKind::Io, format!("link {:?} has no channel", link))
        })?;

        let header = encode_header(t, mtype);
        let mut frame = Vec::with_capacity(2 + mb.len());
        frame.extend_from_slice(&header);
        frame.extend_from_slice(mb.data());
        channel.write(&frame)?;
        Ok(())
    }

    ///
    /// Shuts a data link down.
    ///
    /// Every open transaction's protocol is given the chance to notify
    /// the application, then the link and its channel are destroyed.
    ///
    pub fn link_shutdown(&mut self, link: LinkId) {
        let owners: Vec<TransactionOwner> = match self.links.get(&link) {
            Some(dl) => dl.transactions.values().copied().collect(),
            None => return,
        };
        log::info!("link {:?}: shutdown with {} transactions", link, owners.len());
        for owner in owners {
            match owner {
                TransactionOwner::Call(call) => crate::nwk::cc::shutdown(self, call),
                TransactionOwner::Mm(mmta) => crate::nwk::mm::shutdown(self, mmta),
            }
        }
        self.link_destroy(link);
    }

    pub(crate) fn link_destroy(&mut self, link: LinkId) {
        if let Some(dl) = self.links.remove(&link) {
            if let Some(timer) = dl.release_timer {
                self.timer_stop(timer);
            }
            if let Some(fd) = dl.channel.as_ref().and_then(|c| c.raw_fd()) {
                self.unregister_channel_fd(fd);
            }
            log::info!("link {:?}: destroyed", link);
        }
    }
}

/// Release grace period of an idle link ran out
pub(crate) fn link_release_expired(dh: &mut DectHandle, link: LinkId) {
    let idle = dh
        .links
        .get_mut(&link)
        .map(|dl| {
            dl.release_timer = None;
            dl.transactions.is_empty()
        })
        .unwrap_or(false);
    if idle {
        dh.link_destroy(link);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_codec() {
        let t = Transaction {
            pd: Pd::Cc,
            tv: 5,
            initiator: DectRole::Pp,
        };
        let header = encode_header(&t, 0x05);
        assert_eq!(header, [0x80 | 0x50 | 0x03, 0x05]);
        let (back, mtype) = decode_header(&header).unwrap();
        assert_eq!(back, t);
        assert_eq!(mtype, 0x05);

        let t = Transaction {
            pd: Pd::Mm,
            tv: 0,
            initiator: DectRole::Fp,
        };
        let (back, _) = decode_header(&encode_header(&t, 0x54)).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn test_header_decode_errors() {
        assert!(decode_header(&[0x03]).is_err());
        // discriminator 0x1 is not assigned
        assert!(decode_header(&[0x01, 0x05]).is_err());
    }
}
