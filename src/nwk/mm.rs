//! Mobility Management entity (ETSI EN 300 175-5 §13)
//!
//! MM exchanges are one-shot request/response transactions: the request
//! opens the transaction, the response closes it. No state beyond the
//! transaction itself is kept; the FP answers through the `*_res`
//! primitives, where a present reject reason turns the response into the
//! corresponding reject message.

use std::rc::Rc;

use crate::identity::Park;
use crate::nwk::handle::{DectHandle, LinkId, MmId, MmParam};
use crate::nwk::transaction::{Pd, ReleaseMode, Transaction, TransactionOwner};
use crate::sfmt::ie::{FixedIdentity, IeType, InfoElement, RejectReasonCode};
use crate::sfmt::mbuf::Mbuf;
use crate::sfmt::msg::MmMsgType;
use crate::sfmt::{parse_message, IeCollection};
use crate::tools::error::{DectError, ErrorKind, Result};

/// One MM exchange in progress
#[derive(Debug)]
pub(crate) struct MmTransaction {
    pub link: LinkId,
    pub transaction: Transaction,
    /// The request message this exchange services
    pub current: MmMsgType,
    /// Portable identity taken from the request
    pub portable_identity: Option<Rc<InfoElement>>,
}

fn send_mm(
    dh: &DectHandle,
    link: LinkId,
    t: &Transaction,
    mtype: MmMsgType,
    col: &IeCollection,
) -> Result<()> {
    log::debug!("send {{{}}}", mtype.name());
    dh.transaction_send(link, t, mtype as u8, mtype.desc(), col)
}

fn close_mm(dh: &mut DectHandle, mmta: MmId, mode: ReleaseMode) {
    if let Some(ta) = dh.mm_transactions.remove(&mmta) {
        dh.transaction_close(ta.link, &ta.transaction, mode);
        log::debug!("MM transaction {:?}: closed", mmta);
    }
}

fn mm_info(dh: &DectHandle, mmta: MmId) -> Result<(LinkId, Transaction, MmMsgType)> {
    dh.mm_transactions
        .get(&mmta)
        .map(|ta| (ta.link, ta.transaction, ta.current))
        .ok_or_else(|| {
            DectError::new(ErrorKind::Io, format!("unknown MM transaction {:?}", mmta))
        })
}

/// Reject message answering `request`, if the protocol defines one
fn reject_of(request: MmMsgType) -> Option<MmMsgType> {
    match request {
        MmMsgType::LocateRequest => Some(MmMsgType::LocateReject),
        MmMsgType::AccessRightsRequest => Some(MmMsgType::AccessRightsReject),
        MmMsgType::AuthenticationRequest => Some(MmMsgType::AuthenticationReject),
        MmMsgType::TemporaryIdentityAssign => Some(MmMsgType::TemporaryIdentityAssignRej),
        _ => None,
    }
}

impl DectHandle {
    fn mm_transaction_start(
        &mut self,
        link: LinkId,
        mtype: MmMsgType,
        col: &IeCollection,
    ) -> Result<MmId> {
        let t = self.transaction_alloc(link, Pd::Mm)?;
        send_mm(self, link, &t, mtype, col)?;
        let id = MmId(self.next_id());
        self.mm_transactions.insert(
            id,
            MmTransaction {
                link,
                transaction: t,
                current: mtype,
                portable_identity: col.get(IeType::PortableIdentity).cloned(),
            },
        );
        self.transaction_confirm(link, t, TransactionOwner::Mm(id));
        Ok(id)
    }

    ///
    /// MM-LOCATE-res: answers a location update request.
    ///
    /// A present `reject_reason` sends {LOCATE-REJECT}; otherwise
    /// {LOCATE-ACCEPT} carries the portable identity of the request and
    /// the location area of the parameters. The transaction closes.
    ///
    pub fn mm_locate_res(&mut self, mmta: MmId, param: &MmParam) -> Result<()> {
        let (link, t, current) = mm_info(self, mmta)?;
        if current != MmMsgType::LocateRequest {
            return Err(DectError::new(
                ErrorKind::InvalidIe,
                format!("no locate request on {:?}", mmta),
            ));
        }
        let mut col = IeCollection::new();
        let result = if param.reject_reason.is_some() {
            col.add_held(param.reject_reason.clone().unwrap());
            if let Some(duration) = &param.duration {
                col.add_held(duration.clone());
            }
            send_mm(self, link, &t, MmMsgType::LocateReject, &col)
        } else {
            param.fill(&mut col);
            if col.get(IeType::PortableIdentity).is_none() {
                if let Some(id) = self
                    .mm_transactions
                    .get(&mmta)
                    .and_then(|ta| ta.portable_identity.clone())
                {
                    col.add_held(id);
                }
            }
            send_mm(self, link, &t, MmMsgType::LocateAccept, &col)
        };
        close_mm(self, mmta, ReleaseMode::Normal);
        result
    }

    ///
    /// MM-ACCESS-RIGHTS-res: answers an access rights request.
    ///
    /// The accept defaults its fixed identity to the PARK of the handle's
    /// PARI and its portable identity to the one of the request.
    ///
    pub fn mm_access_rights_res(&mut self, mmta: MmId, param: &MmParam) -> Result<()> {
        let (link, t, current) = mm_info(self, mmta)?;
        if current != MmMsgType::AccessRightsRequest {
            return Err(DectError::new(
                ErrorKind::InvalidIe,
                format!("no access rights request on {:?}", mmta),
            ));
        }
        let mut col = IeCollection::new();
        let result = if param.reject_reason.is_some() {
            col.add_held(param.reject_reason.clone().unwrap());
            if let Some(duration) = &param.duration {
                col.add_held(duration.clone());
            }
            send_mm(self, link, &t, MmMsgType::AccessRightsReject, &col)
        } else {
            param.fill(&mut col);
            if col.get(IeType::PortableIdentity).is_none() {
                if let Some(id) = self
                    .mm_transactions
                    .get(&mmta)
                    .and_then(|ta| ta.portable_identity.clone())
                {
                    col.add_held(id);
                }
            }
            if col.get(IeType::FixedIdentity).is_none() {
                if let Some(pari) = &self.pari {
                    col.add(InfoElement::FixedIdentity(FixedIdentity::Park(
                        Park::from_ari(pari),
                    )));
                }
            }
            send_mm(self, link, &t, MmMsgType::AccessRightsAccept, &col)
        };
        close_mm(self, mmta, ReleaseMode::Normal);
        result
    }

    ///
    /// MM-LOCATE-req: requests a location update from the FP.
    ///
    /// The parameters carry the portable identity; the outcome arrives
    /// through [`MmOps::mm_locate_cfm`].
    ///
    /// [`MmOps::mm_locate_cfm`]: crate::nwk::handle::MmOps::mm_locate_cfm
    ///
    pub fn mm_locate_req(&mut self, link: LinkId, param: &MmParam) -> Result<MmId> {
        let mut col = IeCollection::new();
        param.fill(&mut col);
        self.mm_transaction_start(link, MmMsgType::LocateRequest, &col)
    }

    ///
    /// MM-ACCESS-RIGHTS-req: requests access rights from the FP.
    ///
    pub fn mm_access_rights_req(&mut self, link: LinkId, param: &MmParam) -> Result<MmId> {
        let mut col = IeCollection::new();
        param.fill(&mut col);
        self.mm_transaction_start(link, MmMsgType::AccessRightsRequest, &col)
    }

    ///
    /// MM-IDENTITY-ASSIGN-req: assigns a temporary identity to a PP.
    ///
    /// The parameters must carry the portable identity with the new
    /// TPUI. The transaction stays open until the PP acknowledges.
    ///
    pub fn mm_identity_assign_req(&mut self, link: LinkId, param: &MmParam) -> Result<MmId> {
        let mut col = IeCollection::new();
        param.fill(&mut col);
        self.mm_transaction_start(link, MmMsgType::TemporaryIdentityAssign, &col)
    }

    ///
    /// MM-IDENTITY-ASSIGN-res: accepts or rejects an assigned identity.
    ///
    pub fn mm_identity_assign_res(
        &mut self,
        mmta: MmId,
        accept: bool,
        param: &MmParam,
    ) -> Result<()> {
        let (link, t, current) = mm_info(self, mmta)?;
        if current != MmMsgType::TemporaryIdentityAssign {
            return Err(DectError::new(
                ErrorKind::InvalidIe,
                format!("no identity assignment on {:?}", mmta),
            ));
        }
        let mut col = IeCollection::new();
        let result = if accept {
            send_mm(self, link, &t, MmMsgType::TemporaryIdentityAssignAck, &col)
        } else {
            if let Some(reason) = &param.reject_reason {
                col.add_held(reason.clone());
            }
            send_mm(self, link, &t, MmMsgType::TemporaryIdentityAssignRej, &col)
        };
        close_mm(self, mmta, ReleaseMode::Normal);
        result
    }

    ///
    /// MM-AUTHENTICATE-req: starts an authentication exchange.
    ///
    /// The parameters carry AUTH-TYPE and RAND; the challenge
    /// computation itself happens in the application.
    ///
    pub fn mm_authenticate_req(&mut self, link: LinkId, param: &MmParam) -> Result<MmId> {
        let mut col = IeCollection::new();
        param.fill(&mut col);
        self.mm_transaction_start(link, MmMsgType::AuthenticationRequest, &col)
    }

    ///
    /// MM-AUTHENTICATE-res: answers an authentication request.
    ///
    /// A present RES sends {AUTHENTICATION-REPLY}, anything else
    /// {AUTHENTICATION-REJECT}.
    ///
    pub fn mm_authenticate_res(&mut self, mmta: MmId, param: &MmParam) -> Result<()> {
        let (link, t, current) = mm_info(self, mmta)?;
        if current != MmMsgType::AuthenticationRequest {
            return Err(DectError::new(
                ErrorKind::InvalidIe,
                format!("no authentication request on {:?}", mmta),
            ));
        }
        let mut col = IeCollection::new();
        let result = if param.res.is_some() {
            param.fill(&mut col);
            send_mm(self, link, &t, MmMsgType::AuthenticationReply, &col)
        } else {
            if let Some(reason) = &param.reject_reason {
                col.add_held(reason.clone());
            }
            if let Some(auth_type) = &param.auth_type {
                col.add_held(auth_type.clone());
            }
            send_mm(self, link, &t, MmMsgType::AuthenticationReject, &col)
        };
        close_mm(self, mmta, ReleaseMode::Normal);
        result
    }

    ///
    /// MM-KEY-ALLOCATE-req: offers key allocation to a PP.
    ///
    /// The exchange continues with a PP-initiated authentication, so the
    /// transaction closes after the send.
    ///
    pub fn mm_key_allocate_req(&mut self, link: LinkId, param: &MmParam) -> Result<()> {
        let t = self.transaction_alloc(link, Pd::Mm)?;
        let mut col = IeCollection::new();
        param.fill(&mut col);
        send_mm(self, link, &t, MmMsgType::KeyAllocate, &col)
    }

    ///
    /// MM-IDENTITY-req: requests identities from a PP.
    ///
    pub fn mm_identity_req(&mut self, link: LinkId, param: &MmParam) -> Result<MmId> {
        let mut col = IeCollection::new();
        param.fill(&mut col);
        self.mm_transaction_start(link, MmMsgType::IdentityRequest, &col)
    }

    ///
    /// MM-IDENTITY-res: reports identities to the FP.
    ///
    pub fn mm_identity_res(&mut self, mmta: MmId, param: &MmParam) -> Result<()> {
        let (link, t, current) = mm_info(self, mmta)?;
        if current != MmMsgType::IdentityRequest {
            return Err(DectError::new(
                ErrorKind::InvalidIe,
                format!("no identity request on {:?}", mmta),
            ));
        }
        let mut col = IeCollection::new();
        param.fill(&mut col);
        let result = send_mm(self, link, &t, MmMsgType::IdentityReply, &col);
        close_mm(self, mmta, ReleaseMode::Normal);
        result
    }
}

/// Offers a message of an unknown MM transaction to the entity
pub(crate) fn open(dh: &mut DectHandle, link: LinkId, t: Transaction, mb: Mbuf) {
    let mtype = match MmMsgType::try_from(mb.mtype) {
        Ok(mtype) => mtype,
        Err(_) => {
            log::debug!("MM: unknown message {:#04x}, dropping", mb.mtype);
            return;
        }
    };
    if dh.transaction_over_ceiling(link, &t) {
        log::warn!("MM: transaction ceiling reached, rejecting {}", mtype.name());
        if let Some(reject) = reject_of(mtype) {
            let mut col = IeCollection::new();
            col.add(InfoElement::RejectReason(
                RejectReasonCode::INSUFFICIENT_RESOURCES,
            ));
            if let Err(e) = send_mm(dh, link, &t, reject, &col) {
                log::warn!("failed to send {{{}}}: {}", reject.name(), e);
            }
        }
        return;
    }
    let col = match parse_message(dh.role, mtype.desc(), &mb) {
        Ok(col) => col,
        Err(e) => {
            log::warn!("MM: bad {{{}}}, dropping: {}", mtype.name(), e);
            return;
        }
    };

    let id = MmId(dh.next_id());
    dh.mm_transactions.insert(
        id,
        MmTransaction {
            link,
            transaction: t,
            current: mtype,
            portable_identity: col.get(IeType::PortableIdentity).cloned(),
        },
    );
    dh.transaction_confirm(link, t, TransactionOwner::Mm(id));
    log::info!("MM transaction {:?}: rcv {{{}}}", id, mtype.name());

    let param = MmParam::from_collection(&col);
    let ops = dh.ops.mm.clone();
    match mtype {
        MmMsgType::AccessRightsRequest => ops.mm_access_rights_ind(dh, id, &param),
        MmMsgType::LocateRequest => ops.mm_locate_ind(dh, id, &param),
        MmMsgType::AuthenticationRequest => ops.mm_authenticate_ind(dh, id, &param),
        MmMsgType::TemporaryIdentityAssign => ops.mm_identity_assign_ind(dh, id, &param),
        MmMsgType::IdentityRequest => ops.mm_identity_ind(dh, id, &param),
        MmMsgType::KeyAllocate => {
            ops.mm_key_allocate_ind(dh, id, &param);
            // answered by a PP-initiated authentication exchange
            close_mm(dh, id, ReleaseMode::Normal);
        }
        other => {
            log::debug!("MM: {{{}}} cannot open a transaction, dropping", other.name());
            close_mm(dh, id, ReleaseMode::Partial);
        }
    }
}

/// Receives the response of an open MM transaction
pub(crate) fn rcv(dh: &mut DectHandle, mmta: MmId, mb: Mbuf) {
    let current = match dh.mm_transactions.get(&mmta) {
        Some(ta) => ta.current,
        None => return,
    };
    let mtype = match MmMsgType::try_from(mb.mtype) {
        Ok(mtype) => mtype,
        Err(_) => {
            log::debug!("MM: unknown message {:#04x}, dropping", mb.mtype);
            return;
        }
    };
    let col = match parse_message(dh.role, mtype.desc(), &mb) {
        Ok(col) => col,
        Err(e) => {
            log::warn!("MM: bad {{{}}}, dropping: {}", mtype.name(), e);
            return;
        }
    };
    log::debug!("MM transaction {:?}: rcv {{{}}}", mmta, mtype.name());
    let param = MmParam::from_collection(&col);
    let ops = dh.ops.mm.clone();

    match (current, mtype) {
        (MmMsgType::LocateRequest, MmMsgType::LocateAccept) => {
            close_mm(dh, mmta, ReleaseMode::Normal);
            ops.mm_locate_cfm(dh, mmta, true, &param);
        }
        (MmMsgType::LocateRequest, MmMsgType::LocateReject) => {
            close_mm(dh, mmta, ReleaseMode::Normal);
            ops.mm_locate_cfm(dh, mmta, false, &param);
        }
        (MmMsgType::AccessRightsRequest, MmMsgType::AccessRightsAccept) => {
            close_mm(dh, mmta, ReleaseMode::Normal);
            ops.mm_access_rights_cfm(dh, mmta, true, &param);
        }
        (MmMsgType::AccessRightsRequest, MmMsgType::AccessRightsReject) => {
            close_mm(dh, mmta, ReleaseMode::Normal);
            ops.mm_access_rights_cfm(dh, mmta, false, &param);
        }
        (MmMsgType::TemporaryIdentityAssign, MmMsgType::TemporaryIdentityAssignAck) => {
            close_mm(dh, mmta, ReleaseMode::Normal);
            ops.mm_identity_assign_cfm(dh, mmta, true, None);
        }
        (MmMsgType::TemporaryIdentityAssign, MmMsgType::TemporaryIdentityAssignRej) => {
            let reason = match param.reject_reason.as_deref() {
                Some(InfoElement::RejectReason(code)) => Some(*code),
                _ => None,
            };
            close_mm(dh, mmta, ReleaseMode::Normal);
            ops.mm_identity_assign_cfm(dh, mmta, false, reason);
        }
        (MmMsgType::AuthenticationRequest, MmMsgType::AuthenticationReply) => {
            close_mm(dh, mmta, ReleaseMode::Normal);
            ops.mm_authenticate_cfm(dh, mmta, true, &param);
        }
        (MmMsgType::AuthenticationRequest, MmMsgType::AuthenticationReject) => {
            close_mm(dh, mmta, ReleaseMode::Normal);
            ops.mm_authenticate_cfm(dh, mmta, false, &param);
        }
        (MmMsgType::IdentityRequest, MmMsgType::IdentityReply) => {
            close_mm(dh, mmta, ReleaseMode::Normal);
            ops.mm_identity_cfm(dh, mmta, &param);
        }
        (current, other) => {
            log::debug!(
                "MM: {{{}}} not expected while servicing {{{}}}, dropping",
                other.name(),
                current.name()
            );
        }
    }
}

/// Link shutdown hook: MM exchanges close silently
pub(crate) fn shutdown(dh: &mut DectHandle, mmta: MmId) {
    close_mm(dh, mmta, ReleaseMode::Partial);
}
