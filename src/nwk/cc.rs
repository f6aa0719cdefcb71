//! Call Control entity (ETSI EN 300 175-5 §9)
//!
//! One state machine per call, driven from both ends of the MNCC service
//! boundary: primitives of the application on one side, CC messages of
//! the peer on the other. The setup supervision timer and the U-plane
//! channel of a call live here as well.

use std::rc::Rc;

use crate::nwk::handle::{CallId, DectHandle, DectRole, FdOwner, LinkId, MnccParam, TimerId};
use crate::nwk::timer::TimerOwner;
use crate::nwk::transaction::{Pd, ReleaseMode, Transaction, TransactionOwner};
use crate::sfmt::ie::{
    CallClass, FixedIdentity, IeType, InfoElement, ReleaseReasonCode, ServiceValue,
};
use crate::sfmt::mbuf::Mbuf;
use crate::sfmt::msg::CcMsgType;
use crate::sfmt::{parse_message, IeCollection};
use crate::tools::error::{DectError, ErrorKind, Result};
use crate::transport::Ulei;

/// Call control states (EN 300 175-5 §9.6)
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CallState {
    /// No call
    Null,
    /// Incoming call offered to the application
    CallInitiated,
    /// Initiator sends overlap digits
    OverlapSending,
    /// Call proceeding, no more setup information accepted
    CallProceeding,
    /// Alerting reported towards the initiator
    CallDelivered,
    /// Setup sent, awaiting a response
    CallPresent,
    /// Alerting
    CallReceived,
    /// Connect sent or indicated, awaiting the acknowledge
    ConnectPending,
    /// Call established
    Active,
    /// Release requested or indicated
    ReleasePending,
    /// Receiver collects overlap digits
    OverlapReceiving,
    /// Incoming call proceeding
    IncomingCallProceeding,
}

/// One call
#[derive(Debug)]
pub(crate) struct Call {
    pub link: LinkId,
    pub transaction: Transaction,
    pub state: CallState,
    pub portable_identity: Option<Rc<InfoElement>>,
    pub fixed_identity: Option<Rc<InfoElement>>,
    pub setup_timer: Option<TimerId>,
    pub uplane: Option<Box<dyn crate::transport::LinkChannel>>,
}

fn set_state(dh: &mut DectHandle, call: CallId, state: CallState) {
    if let Some(c) = dh.calls.get_mut(&call) {
        log::debug!("call {:?}: {:?} -> {:?}", call, c.state, state);
        c.state = state;
    }
}

fn stop_setup_timer(dh: &mut DectHandle, call: CallId) {
    let timer = dh.calls.get_mut(&call).and_then(|c| c.setup_timer.take());
    if let Some(timer) = timer {
        dh.timer_stop(timer);
    }
}

/// Opens the U-plane channel of a call at its transaction-derived
/// endpoint. A transport without U-plane support keeps the call up.
fn uplane_bind(dh: &mut DectHandle, call: CallId) {
    let (ipui, tv, bound) = match dh.calls.get(&call) {
        Some(c) => match dh.links.get(&c.link) {
            Some(dl) => (dl.ipui.clone(), c.transaction.tv, c.uplane.is_some()),
            None => return,
        },
        None => return,
    };
    if bound {
        return;
    }
    let ulei = Ulei { ipui, tv };
    match dh.transport.clone().open_uplane(&ulei) {
        Ok(channel) => {
            log::info!("call {:?}: U-plane connected", call);
            if let Some(fd) = channel.raw_fd() {
                dh.register_channel_fd(fd, FdOwner::UPlane(call));
            }
            if let Some(c) = dh.calls.get_mut(&call) {
                c.uplane = Some(channel);
            }
        }
        Err(e) => log::warn!("call {:?}: U-plane connect failed: {}", call, e),
    }
}

fn uplane_disconnect(dh: &mut DectHandle, call: CallId) {
    let channel = dh.calls.get_mut(&call).and_then(|c| c.uplane.take());
    if let Some(channel) = channel {
        log::info!("call {:?}: U-plane disconnected", call);
        if let Some(fd) = channel.raw_fd() {
            dh.unregister_channel_fd(fd);
        }
    }
}

fn destroy_call(dh: &mut DectHandle, call: CallId, mode: ReleaseMode) {
    stop_setup_timer(dh, call);
    uplane_disconnect(dh, call);
    if let Some(c) = dh.calls.remove(&call) {
        dh.transaction_close(c.link, &c.transaction, mode);
        log::info!("call {:?}: destroyed", call);
    }
}

fn send_cc(
    dh: &DectHandle,
    link: LinkId,
    t: &Transaction,
    mtype: CcMsgType,
    col: &IeCollection,
) -> Result<()> {
    log::debug!("send {{{}}}", mtype.name());
    dh.transaction_send(link, t, mtype as u8, mtype.desc(), col)
}

fn send_release_com(dh: &DectHandle, link: LinkId, t: &Transaction, reason: ReleaseReasonCode) {
    let mut col = IeCollection::new();
    col.add(InfoElement::ReleaseReason(reason));
    if let Err(e) = send_cc(dh, link, t, CcMsgType::ReleaseCom, &col) {
        log::warn!("failed to send {{CC-RELEASE-COM}}: {}", e);
    }
}

impl DectHandle {
    ///
    /// MNCC-SETUP-req: starts an outgoing call on a data link.
    ///
    /// The parameter set must carry the peer's portable identity; a
    /// missing fixed identity defaults to the PARK of the handle's PARI,
    /// a missing basic service to a normal speech call. On success the
    /// setup supervision timer runs until the peer responds.
    ///
    pub fn mncc_setup_req(&mut self, link: LinkId, param: &MnccParam) -> Result<CallId> {
        let t = self.transaction_alloc(link, Pd::Cc)?;

        let mut col = IeCollection::new();
        param.fill(&mut col);
        if col.get(IeType::FixedIdentity).is_none() {
            if let Some(pari) = &self.pari {
                col.add(InfoElement::FixedIdentity(FixedIdentity::Park(
                    crate::identity::Park::from_ari(pari),
                )));
            }
        }
        if col.get(IeType::BasicService).is_none() {
            col.add(InfoElement::BasicService {
                class: CallClass::Normal,
                service: ServiceValue::BasicSpeech,
            });
        }

        self.transaction_send(link, &t, CcMsgType::Setup as u8, CcMsgType::Setup.desc(), &col)?;

        let id = CallId(self.next_id());
        let timeout = self.setup_timeout;
        let timer = self.timer_start(TimerOwner::CcSetup(id), timeout);
        self.calls.insert(
            id,
            Call {
                link,
                transaction: t,
                state: CallState::CallPresent,
                portable_identity: col.get(IeType::PortableIdentity).cloned(),
                fixed_identity: col.get(IeType::FixedIdentity).cloned(),
                setup_timer: Some(timer),
                uplane: None,
            },
        );
        self.transaction_confirm(link, t, TransactionOwner::Call(id));
        log::info!("call {:?}: setup sent", id);
        Ok(id)
    }

    /// MNCC-SETUP-ACK-req: enters overlap receiving on an incoming call
    pub fn mncc_setup_ack_req(&mut self, call: CallId, param: &MnccParam) -> Result<()> {
        self.cc_respond(
            call,
            param,
            &[CallState::CallInitiated],
            CcMsgType::SetupAck,
            CallState::OverlapReceiving,
        )
    }

    /// MNCC-CALL-PROC-req: reports call proceeding on an incoming call
    pub fn mncc_call_proc_req(&mut self, call: CallId, param: &MnccParam) -> Result<()> {
        self.cc_respond(
            call,
            param,
            &[CallState::CallInitiated, CallState::OverlapReceiving],
            CcMsgType::CallProc,
            CallState::CallProceeding,
        )
    }

    /// MNCC-ALERT-req: starts alerting on an incoming call
    pub fn mncc_alert_req(&mut self, call: CallId, param: &MnccParam) -> Result<()> {
        self.cc_respond(
            call,
            param,
            &[
                CallState::CallInitiated,
                CallState::OverlapReceiving,
                CallState::CallProceeding,
            ],
            CcMsgType::Alerting,
            CallState::CallReceived,
        )
    }

    /// MNCC-CONNECT-req: answers an incoming call
    pub fn mncc_connect_req(&mut self, call: CallId, param: &MnccParam) -> Result<()> {
        self.cc_respond(
            call,
            param,
            &[
                CallState::CallInitiated,
                CallState::OverlapReceiving,
                CallState::CallProceeding,
                CallState::CallReceived,
            ],
            CcMsgType::Connect,
            CallState::ConnectPending,
        )
    }

    ///
    /// MNCC-CONNECT-res: confirms an indicated connect.
    ///
    /// Sends {CC-CONNECT-ACK} and activates the call.
    ///
    pub fn mncc_connect_res(&mut self, call: CallId, param: &MnccParam) -> Result<()> {
        self.cc_respond(
            call,
            param,
            &[CallState::ConnectPending],
            CcMsgType::ConnectAck,
            CallState::Active,
        )?;
        uplane_bind(self, call);
        Ok(())
    }

    /// Common send-and-transition of the incoming call responses
    fn cc_respond(
        &mut self,
        call: CallId,
        param: &MnccParam,
        valid: &[CallState],
        mtype: CcMsgType,
        next: CallState,
    ) -> Result<()> {
        let (link, t, state) = self.cc_call_info(call)?;
        if !valid.contains(&state) {
            return Err(DectError::new(
                ErrorKind::InvalidIe,
                format!("{} not valid in {:?}", mtype.name(), state),
            ));
        }
        let mut col = IeCollection::new();
        param.fill(&mut col);
        send_cc(self, link, &t, mtype, &col)?;
        set_state(self, call, next);
        Ok(())
    }

    ///
    /// MNCC-REJECT-req: rejects an incoming call.
    ///
    /// Sends {CC-RELEASE-COM} and destroys the call.
    ///
    pub fn mncc_reject_req(&mut self, call: CallId, param: &MnccParam) -> Result<()> {
        let (link, t, _) = self.cc_call_info(call)?;
        let mut col = IeCollection::new();
        param.fill(&mut col);
        if col.get(IeType::ReleaseReason).is_none() {
            col.add(InfoElement::ReleaseReason(ReleaseReasonCode::USER_REJECTION));
        }
        send_cc(self, link, &t, CcMsgType::ReleaseCom, &col)?;
        destroy_call(self, call, ReleaseMode::Normal);
        Ok(())
    }

    ///
    /// MNCC-RELEASE-req: starts releasing a call.
    ///
    /// Sends {CC-RELEASE} and awaits {CC-RELEASE-COM}.
    ///
    pub fn mncc_release_req(&mut self, call: CallId, param: &MnccParam) -> Result<()> {
        let (link, t, state) = self.cc_call_info(call)?;
        if state == CallState::ReleasePending {
            return Err(DectError::new(
                ErrorKind::InvalidIe,
                "release already in progress",
            ));
        }
        let mut col = IeCollection::new();
        param.fill(&mut col);
        if col.get(IeType::ReleaseReason).is_none() {
            col.add(InfoElement::ReleaseReason(ReleaseReasonCode::NORMAL));
        }
        stop_setup_timer(self, call);
        send_cc(self, link, &t, CcMsgType::Release, &col)?;
        set_state(self, call, CallState::ReleasePending);
        Ok(())
    }

    ///
    /// MNCC-RELEASE-res: completes a peer-initiated release.
    ///
    /// Sends {CC-RELEASE-COM} and destroys the call.
    ///
    pub fn mncc_release_res(&mut self, call: CallId, param: &MnccParam) -> Result<()> {
        let (link, t, state) = self.cc_call_info(call)?;
        if state != CallState::ReleasePending {
            return Err(DectError::new(
                ErrorKind::InvalidIe,
                format!("no release pending in {:?}", state),
            ));
        }
        let mut col = IeCollection::new();
        param.fill(&mut col);
        send_cc(self, link, &t, CcMsgType::ReleaseCom, &col)?;
        destroy_call(self, call, ReleaseMode::Normal);
        Ok(())
    }

    /// MNCC-INFO-req: sends in-call information
    pub fn mncc_info_req(&mut self, call: CallId, param: &MnccParam) -> Result<()> {
        let (link, t, _) = self.cc_call_info(call)?;
        let mut col = IeCollection::new();
        param.fill(&mut col);
        send_cc(self, link, &t, CcMsgType::Info, &col)
    }

    ///
    /// DL-U-DATA-req: writes U-plane data of an active call.
    ///
    pub fn dl_u_data_req(&mut self, call: CallId, data: &[u8]) -> Result<()> {
        let c = self.calls.get(&call).ok_or_else(|| {
            DectError::new(ErrorKind::Io, format!("unknown call {:?}", call))
        })?;
        let channel = c.uplane.as_ref().ok_or_else(|| {
            DectError::new(ErrorKind::Io, format!("call {:?} has no U-plane", call))
        })?;
        channel.write(data)?;
        Ok(())
    }

    /// Current state of a call
    pub fn call_state(&self, call: CallId) -> Option<CallState> {
        self.calls.get(&call).map(|c| c.state)
    }

    /// Portable identity held by a call
    pub fn call_portable_identity(&self, call: CallId) -> Option<&Rc<InfoElement>> {
        self.calls.get(&call).and_then(|c| c.portable_identity.as_ref())
    }

    /// Fixed identity held by a call
    pub fn call_fixed_identity(&self, call: CallId) -> Option<&Rc<InfoElement>> {
        self.calls.get(&call).and_then(|c| c.fixed_identity.as_ref())
    }

    fn cc_call_info(&self, call: CallId) -> Result<(LinkId, Transaction, CallState)> {
        self.calls
            .get(&call)
            .map(|c| (c.link, c.transaction, c.state))
            .ok_or_else(|| DectError::new(ErrorKind::Io, format!("unknown call {:?}", call)))
    }
}

/// Offers a message of an unknown CC transaction to the entity. Only a
/// {CC-SETUP} below the transaction ceiling opens a call.
pub(crate) fn open(dh: &mut DectHandle, link: LinkId, t: Transaction, mb: Mbuf) {
    if mb.mtype != CcMsgType::Setup as u8 {
        log::debug!("CC: message {:#04x} for unknown transaction, dropping", mb.mtype);
        return;
    }
    if dh.transaction_over_ceiling(link, &t) {
        log::warn!("CC: transaction ceiling reached, rejecting setup");
        send_release_com(dh, link, &t, ReleaseReasonCode::OVERLOAD);
        return;
    }
    let col = match parse_message(dh.role, CcMsgType::Setup.desc(), &mb) {
        Ok(col) => col,
        Err(e) => {
            log::warn!("CC: bad {{CC-SETUP}}, dropping: {}", e);
            return;
        }
    };

    let id = CallId(dh.next_id());
    dh.calls.insert(
        id,
        Call {
            link,
            transaction: t,
            state: CallState::CallInitiated,
            portable_identity: col.get(IeType::PortableIdentity).cloned(),
            fixed_identity: col.get(IeType::FixedIdentity).cloned(),
            setup_timer: None,
            uplane: None,
        },
    );
    dh.transaction_confirm(link, t, TransactionOwner::Call(id));
    log::info!("call {:?}: incoming setup", id);

    let param = MnccParam::from_collection(&col);
    let ops = dh.ops.cc.clone();
    ops.mncc_setup_ind(dh, id, &param);
}

/// Receives a message of an open call
pub(crate) fn rcv(dh: &mut DectHandle, call: CallId, mb: Mbuf) {
    let (link, t, state, initiated_here) = match dh.calls.get(&call) {
        Some(c) => (
            c.link,
            c.transaction,
            c.state,
            c.transaction.initiator == dh.role,
        ),
        None => return,
    };
    let mtype = match CcMsgType::try_from(mb.mtype) {
        Ok(mtype) => mtype,
        Err(_) => {
            log::debug!("CC: unknown message {:#04x}, dropping", mb.mtype);
            return;
        }
    };
    let col = match parse_message(dh.role, mtype.desc(), &mb) {
        Ok(col) => col,
        Err(e) => {
            log::warn!("CC: bad {{{}}}, dropping: {}", mtype.name(), e);
            return;
        }
    };
    log::debug!("call {:?}: rcv {{{}}} in {:?}", call, mtype.name(), state);
    let param = MnccParam::from_collection(&col);
    let ops = dh.ops.cc.clone();

    match mtype {
        CcMsgType::SetupAck if initiated_here && state == CallState::CallPresent => {
            stop_setup_timer(dh, call);
            set_state(dh, call, CallState::OverlapSending);
            ops.mncc_setup_ack_ind(dh, call, &param);
        }
        CcMsgType::CallProc
            if initiated_here
                && matches!(state, CallState::CallPresent | CallState::OverlapSending) =>
        {
            stop_setup_timer(dh, call);
            set_state(dh, call, CallState::CallProceeding);
            ops.mncc_call_proc_ind(dh, call, &param);
        }
        CcMsgType::Alerting
            if initiated_here
                && matches!(
                    state,
                    CallState::CallPresent | CallState::OverlapSending | CallState::CallProceeding
                ) =>
        {
            stop_setup_timer(dh, call);
            set_state(dh, call, CallState::CallReceived);
            ops.mncc_alert_ind(dh, call, &param);
        }
        CcMsgType::Connect
            if initiated_here
                && matches!(
                    state,
                    CallState::CallPresent
                        | CallState::OverlapSending
                        | CallState::CallProceeding
                        | CallState::CallReceived
                ) =>
        {
            stop_setup_timer(dh, call);
            match dh.role {
                DectRole::Fp => {
                    // the FP acknowledges on its own
                    send_connect_ack(dh, link, &t, call);
                    set_state(dh, call, CallState::Active);
                }
                DectRole::Pp => {
                    set_state(dh, call, CallState::ConnectPending);
                }
            }
            uplane_bind(dh, call);
            ops.mncc_connect_ind(dh, call, &param);
        }
        CcMsgType::ConnectAck if !initiated_here && state == CallState::ConnectPending => {
            set_state(dh, call, CallState::Active);
            uplane_bind(dh, call);
            ops.mncc_connect_cfm(dh, call, &param);
        }
        CcMsgType::Release => {
            stop_setup_timer(dh, call);
            set_state(dh, call, CallState::ReleasePending);
            ops.mncc_release_ind(dh, call, &param);
        }
        CcMsgType::ReleaseCom => {
            let confirmed = state == CallState::ReleasePending;
            destroy_call(dh, call, ReleaseMode::Normal);
            if confirmed {
                ops.mncc_release_cfm(dh, call, &param);
            } else {
                ops.mncc_release_ind(dh, call, &param);
            }
        }
        CcMsgType::Info if state != CallState::Null => {
            ops.mncc_info_ind(dh, call, &param);
        }
        _ => {
            log::debug!(
                "call {:?}: {{{}}} not expected in {:?}, dropping",
                call,
                mtype.name(),
                state
            );
        }
    }
}

/// {CC-CONNECT-ACK} of the FP's automatic acknowledge
fn send_connect_ack(dh: &DectHandle, link: LinkId, t: &Transaction, call: CallId) {
    let col = IeCollection::new();
    if let Err(e) = send_cc(dh, link, t, CcMsgType::ConnectAck, &col) {
        log::warn!("call {:?}: failed to send {{CC-CONNECT-ACK}}: {}", call, e);
    }
}

/// The setup supervision timer ran out: the peer never answered
pub(crate) fn setup_timeout(dh: &mut DectHandle, call: CallId) {
    if let Some(c) = dh.calls.get_mut(&call) {
        log::info!("call {:?}: setup timeout in {:?}", call, c.state);
        c.setup_timer = None;
    } else {
        return;
    }
    destroy_call(dh, call, ReleaseMode::Normal);
    let ops = dh.ops.cc.clone();
    ops.mncc_reject_ind(dh, call, &MnccParam::default());
}

/// Link shutdown hook: fail the call towards the application
pub(crate) fn shutdown(dh: &mut DectHandle, call: CallId) {
    let mut param = MnccParam::default();
    param.release_reason = Some(Rc::new(InfoElement::ReleaseReason(
        ReleaseReasonCode::OVERLOAD,
    )));
    destroy_call(dh, call, ReleaseMode::Partial);
    let ops = dh.ops.cc.clone();
    ops.mncc_reject_ind(dh, call, &param);
}
