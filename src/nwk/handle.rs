//! Library handle and application interface
//!
//! The handle owns every data link, transaction, call and timer. The
//! application drives it from a single-threaded event loop: descriptors
//! and timers the stack needs are registered through [`EventOps`], and
//! readiness is reported back with [`DectHandle::fd_process`] and
//! [`DectHandle::timer_expired`]. Indications run on the same thread and
//! receive the handle back, so primitives may be issued from within a
//! callback.

use std::collections::HashMap;
use std::os::unix::io::RawFd;
use std::rc::Rc;
use std::time::Duration;

use serde::Serialize;

use crate::identity::Ari;
use crate::nwk::cc::Call;
use crate::nwk::mm::MmTransaction;
use crate::nwk::timer::TimerOwner;
use crate::nwk::transaction::{DataLink, ProtocolEntry};
use crate::sfmt::ie::{IeType, InfoElement, RejectReasonCode};
use crate::sfmt::IeCollection;
use crate::tools::error::{DectError, ErrorKind, Result};
use crate::transport::{self, LinkTransport};

/// Protocol role of the endpoint
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
pub enum DectRole {
    /// Fixed part (base station)
    Fp,
    /// Portable part (handset)
    Pp,
}

/// Handle configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Protocol role
    pub role: DectRole,
    /// Primary access rights identity, FP only
    pub pari: Option<Ari>,
    /// CC setup supervision timeout
    pub setup_timeout: Duration,
    /// Grace period before an idle data link is released
    pub link_grace: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            role: DectRole::Pp,
            pari: None,
            setup_timeout: Duration::from_secs(60),
            link_grace: Duration::from_secs(5),
        }
    }
}

/// Handle of one data link
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkId(pub(crate) u32);

/// Handle of one call
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallId(pub(crate) u32);

/// Handle of one MM transaction
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MmId(pub(crate) u32);

/// Handle of one timer
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub(crate) u32);

impl std::fmt::Debug for LinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Debug for CallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Debug for MmId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Debug for TimerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Event mask for descriptor registration
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FdEvents(pub u32);

impl FdEvents {
    /// Readability
    pub const READ: FdEvents = FdEvents(0x1);
    /// Writability
    pub const WRITE: FdEvents = FdEvents(0x2);
}

/// Event loop operations provided by the application
pub trait EventOps {
    /// Adds a descriptor to the event loop
    fn register_fd(&self, fd: RawFd, events: FdEvents);
    /// Removes a descriptor from the event loop
    fn unregister_fd(&self, fd: RawFd);
    /// Arms a timer; [`DectHandle::timer_expired`] reports the expiry
    fn start_timer(&self, timer: TimerId, duration: Duration);
    /// Disarms a timer before its expiry
    fn stop_timer(&self, timer: TimerId);
}

/// Call control parameters, shared between indications and requests
///
/// Every field holds a reference into the parsed message; dropping the
/// parameter set releases them.
#[derive(Clone, Debug, Default)]
pub struct MnccParam {
    /// <<PORTABLE-IDENTITY>>
    pub portable_identity: Option<Rc<InfoElement>>,
    /// <<FIXED-IDENTITY>>
    pub fixed_identity: Option<Rc<InfoElement>>,
    /// <<BASIC-SERVICE>>
    pub basic_service: Option<Rc<InfoElement>>,
    /// <<SINGLE-DISPLAY>> or <<MULTI-DISPLAY>>
    pub display: Option<Rc<InfoElement>>,
    /// <<SINGLE-KEYPAD>> or <<MULTI-KEYPAD>>
    pub keypad: Option<Rc<InfoElement>>,
    /// <<SIGNAL>>
    pub signal: Option<Rc<InfoElement>>,
    /// <<RELEASE-REASON>>
    pub release_reason: Option<Rc<InfoElement>>,
    /// <<PROGRESS-INDICATOR>> list
    pub progress_indicator: Vec<Rc<InfoElement>>,
    /// <<CALLING-PARTY-NUMBER>>
    pub calling_party_number: Option<Rc<InfoElement>>,
    /// <<CALLED-PARTY-NUMBER>>
    pub called_party_number: Option<Rc<InfoElement>>,
    /// <<TERMINAL-CAPABILITY>>
    pub terminal_capability: Option<Rc<InfoElement>>,
    /// <<IWU-TO-IWU>> list
    pub iwu_to_iwu: Vec<Rc<InfoElement>>,
    /// <<ESCAPE-TO-PROPRIETARY>>
    pub escape_to_proprietary: Option<Rc<InfoElement>>,
}

impl MnccParam {
    pub(crate) fn from_collection(col: &IeCollection) -> MnccParam {
        MnccParam {
            portable_identity: col.get(IeType::PortableIdentity).cloned(),
            fixed_identity: col.get(IeType::FixedIdentity).cloned(),
            basic_service: col.get(IeType::BasicService).cloned(),
            display: col
                .get(IeType::SingleDisplay)
                .or_else(|| col.get(IeType::MultiDisplay))
                .cloned(),
            keypad: col
                .get(IeType::SingleKeypad)
                .or_else(|| col.get(IeType::MultiKeypad))
                .cloned(),
            signal: col.get(IeType::Signal).cloned(),
            release_reason: col.get(IeType::ReleaseReason).cloned(),
            progress_indicator: col
                .list(IeType::ProgressIndicator)
                .map(|list| list.iter().cloned().collect())
                .unwrap_or_default(),
            calling_party_number: col.get(IeType::CallingPartyNumber).cloned(),
            called_party_number: col.get(IeType::CalledPartyNumber).cloned(),
            terminal_capability: col.get(IeType::TerminalCapability).cloned(),
            iwu_to_iwu: col
                .list(IeType::IwuToIwu)
                .map(|list| list.iter().cloned().collect())
                .unwrap_or_default(),
            escape_to_proprietary: col.get(IeType::EscapeToProprietary).cloned(),
        }
    }

    pub(crate) fn fill(&self, col: &mut IeCollection) {
        let singles = [
            &self.portable_identity,
            &self.fixed_identity,
            &self.basic_service,
            &self.display,
            &self.keypad,
            &self.signal,
            &self.release_reason,
            &self.calling_party_number,
            &self.called_party_number,
            &self.terminal_capability,
            &self.escape_to_proprietary,
        ];
        for ie in singles.into_iter().flatten() {
            col.add_held(ie.clone());
        }
        for ie in &self.progress_indicator {
            col.add_held(ie.clone());
        }
        for ie in &self.iwu_to_iwu {
            col.add_held(ie.clone());
        }
    }
}

/// Call control indications
#[allow(unused_variables)]
pub trait CcOps {
    /// New incoming call
    fn mncc_setup_ind(&self, dh: &mut DectHandle, call: CallId, param: &MnccParam) {}
    /// Peer entered overlap sending
    fn mncc_setup_ack_ind(&self, dh: &mut DectHandle, call: CallId, param: &MnccParam) {}
    /// Peer reported call proceeding
    fn mncc_call_proc_ind(&self, dh: &mut DectHandle, call: CallId, param: &MnccParam) {}
    /// Peer is alerting
    fn mncc_alert_ind(&self, dh: &mut DectHandle, call: CallId, param: &MnccParam) {}
    /// Peer answered the call
    fn mncc_connect_ind(&self, dh: &mut DectHandle, call: CallId, param: &MnccParam) {}
    /// Peer confirmed the connection, the call is active
    fn mncc_connect_cfm(&self, dh: &mut DectHandle, call: CallId, param: &MnccParam) {}
    /// Peer started call release
    fn mncc_release_ind(&self, dh: &mut DectHandle, call: CallId, param: &MnccParam) {}
    /// Release completed, the call is gone
    fn mncc_release_cfm(&self, dh: &mut DectHandle, call: CallId, param: &MnccParam) {}
    /// The call failed
    fn mncc_reject_ind(&self, dh: &mut DectHandle, call: CallId, param: &MnccParam) {}
    /// In-call information
    fn mncc_info_ind(&self, dh: &mut DectHandle, call: CallId, param: &MnccParam) {}
    /// U-plane data arrived
    fn dl_u_data_ind(&self, dh: &mut DectHandle, call: CallId, data: &[u8]) {}
}

/// Mobility management parameters
#[derive(Clone, Debug, Default)]
pub struct MmParam {
    /// <<PORTABLE-IDENTITY>>
    pub portable_identity: Option<Rc<InfoElement>>,
    /// <<FIXED-IDENTITY>> list
    pub fixed_identity: Vec<Rc<InfoElement>>,
    /// <<LOCATION-AREA>>
    pub location_area: Option<Rc<InfoElement>>,
    /// <<NWK-ASSIGNED-IDENTITY>>
    pub nwk_assigned_identity: Option<Rc<InfoElement>>,
    /// <<AUTH-TYPE>>
    pub auth_type: Option<Rc<InfoElement>>,
    /// <<ALLOCATION-TYPE>>
    pub allocation_type: Option<Rc<InfoElement>>,
    /// <<RAND>>
    pub rand: Option<Rc<InfoElement>>,
    /// <<RES>>
    pub res: Option<Rc<InfoElement>>,
    /// <<RS>>
    pub rs: Option<Rc<InfoElement>>,
    /// <<CIPHER-INFO>>
    pub cipher_info: Option<Rc<InfoElement>>,
    /// <<IDENTITY-TYPE>> list
    pub identity_type: Vec<Rc<InfoElement>>,
    /// <<TERMINAL-CAPABILITY>>
    pub terminal_capability: Option<Rc<InfoElement>>,
    /// <<MODEL-IDENTIFIER>>
    pub model_identifier: Option<Rc<InfoElement>>,
    /// <<CODEC-LIST>>
    pub codec_list: Option<Rc<InfoElement>>,
    /// <<DURATION>>
    pub duration: Option<Rc<InfoElement>>,
    /// <<REJECT-REASON>>; its presence turns a response into a reject
    pub reject_reason: Option<Rc<InfoElement>>,
    /// <<ESCAPE-TO-PROPRIETARY>>
    pub escape_to_proprietary: Option<Rc<InfoElement>>,
}

impl MmParam {
    pub(crate) fn from_collection(col: &IeCollection) -> MmParam {
        MmParam {
            portable_identity: col.get(IeType::PortableIdentity).cloned(),
            fixed_identity: col
                .list(IeType::FixedIdentity)
                .map(|list| list.iter().cloned().collect())
                .unwrap_or_default(),
            location_area: col.get(IeType::LocationArea).cloned(),
            nwk_assigned_identity: col.get(IeType::NwkAssignedIdentity).cloned(),
            auth_type: col.get(IeType::AuthType).cloned(),
            allocation_type: col.get(IeType::AllocationType).cloned(),
            rand: col.get(IeType::Rand).cloned(),
            res: col.get(IeType::Res).cloned(),
            rs: col.get(IeType::Rs).cloned(),
            cipher_info: col.get(IeType::CipherInfo).cloned(),
            identity_type: col
                .list(IeType::IdentityType)
                .map(|list| list.iter().cloned().collect())
                .unwrap_or_default(),
            terminal_capability: col.get(IeType::TerminalCapability).cloned(),
            model_identifier: col.get(IeType::ModelIdentifier).cloned(),
            codec_list: col.get(IeType::CodecList).cloned(),
            duration: col.get(IeType::Duration).cloned(),
            reject_reason: col.get(IeType::RejectReason).cloned(),
            escape_to_proprietary: col.get(IeType::EscapeToProprietary).cloned(),
        }
    }

    pub(crate) fn fill(&self, col: &mut IeCollection) {
        let singles = [
            &self.portable_identity,
            &self.location_area,
            &self.nwk_assigned_identity,
            &self.auth_type,
            &self.allocation_type,
            &self.rand,
            &self.res,
            &self.rs,
            &self.cipher_info,
            &self.terminal_capability,
            &self.model_identifier,
            &self.codec_list,
            &self.duration,
            &self.reject_reason,
            &self.escape_to_proprietary,
        ];
        for ie in singles.into_iter().flatten() {
            col.add_held(ie.clone());
        }
        for ie in &self.fixed_identity {
            col.add_held(ie.clone());
        }
        for ie in &self.identity_type {
            col.add_held(ie.clone());
        }
    }
}

/// Mobility management indications
#[allow(unused_variables)]
pub trait MmOps {
    /// A PP requests access rights; answer with
    /// [`DectHandle::mm_access_rights_res`]
    fn mm_access_rights_ind(&self, dh: &mut DectHandle, mmta: MmId, param: &MmParam) {}
    /// A PP requests a location update; answer with
    /// [`DectHandle::mm_locate_res`]
    fn mm_locate_ind(&self, dh: &mut DectHandle, mmta: MmId, param: &MmParam) {}
    /// Outcome of a location update requested with
    /// [`DectHandle::mm_locate_req`]
    fn mm_locate_cfm(&self, dh: &mut DectHandle, mmta: MmId, accept: bool, param: &MmParam) {}
    /// Outcome of an access rights request issued with
    /// [`DectHandle::mm_access_rights_req`]
    fn mm_access_rights_cfm(&self, dh: &mut DectHandle, mmta: MmId, accept: bool, param: &MmParam) {
    }
    /// The FP assigns a temporary identity; answer with
    /// [`DectHandle::mm_identity_assign_res`]
    fn mm_identity_assign_ind(&self, dh: &mut DectHandle, mmta: MmId, param: &MmParam) {}
    /// Outcome of a temporary identity assignment
    fn mm_identity_assign_cfm(
        &self,
        dh: &mut DectHandle,
        mmta: MmId,
        accept: bool,
        reject_reason: Option<RejectReasonCode>,
    ) {
    }
    /// The peer requests authentication; answer with
    /// [`DectHandle::mm_authenticate_res`]
    fn mm_authenticate_ind(&self, dh: &mut DectHandle, mmta: MmId, param: &MmParam) {}
    /// Outcome of an authentication exchange
    fn mm_authenticate_cfm(&self, dh: &mut DectHandle, mmta: MmId, accept: bool, param: &MmParam) {
    }
    /// The FP allocates an authentication key
    fn mm_key_allocate_ind(&self, dh: &mut DectHandle, mmta: MmId, param: &MmParam) {}
    /// The FP requests identities; answer with
    /// [`DectHandle::mm_identity_res`]
    fn mm_identity_ind(&self, dh: &mut DectHandle, mmta: MmId, param: &MmParam) {}
    /// Identities reported by the PP
    fn mm_identity_cfm(&self, dh: &mut DectHandle, mmta: MmId, param: &MmParam) {}
}

/// Operation vectors of the application
#[derive(Clone)]
pub struct DectOps {
    /// Event loop operations
    pub event: Rc<dyn EventOps>,
    /// Call control indications
    pub cc: Rc<dyn CcOps>,
    /// Mobility management indications
    pub mm: Rc<dyn MmOps>,
}

impl std::fmt::Debug for DectOps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DectOps")
    }
}

pub(crate) enum FdOwner {
    Signaling(LinkId),
    UPlane(CallId),
}

///
/// DECT NWK layer handle
///
#[derive(Debug)]
pub struct DectHandle {
    pub(crate) role: DectRole,
    pub(crate) pari: Option<Ari>,
    pub(crate) setup_timeout: Duration,
    pub(crate) link_grace: Duration,
    pub(crate) ops: DectOps,
    pub(crate) transport: Rc<dyn LinkTransport>,
    pub(crate) links: HashMap<LinkId, DataLink>,
    pub(crate) calls: HashMap<CallId, Call>,
    pub(crate) mm_transactions: HashMap<MmId, MmTransaction>,
    pub(crate) timers: HashMap<TimerId, TimerOwner>,
    pub(crate) fds: HashMap<RawFd, FdOwner>,
    pub(crate) protocols: Vec<ProtocolEntry>,
    next_id: u32,
}

impl std::fmt::Debug for FdOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FdOwner::Signaling(link) => write!(f, "Signaling({:?})", link),
            FdOwner::UPlane(call) => write!(f, "UPlane({:?})", call),
        }
    }
}

impl DectHandle {
    ///
    /// Creates a handle.
    ///
    /// # Arguments
    /// * `config` - Role, identities and timer configuration
    /// * `transport` - Channel factory towards the kernel socket family
    /// * `ops` - Application operation vectors
    ///
    pub fn new(config: Config, transport: Rc<dyn LinkTransport>, ops: DectOps) -> DectHandle {
        if config.role == DectRole::Fp && config.pari.is_none() {
            log::warn!("FP handle without a PARI");
        }
        DectHandle {
            role: config.role,
            pari: config.pari,
            setup_timeout: config.setup_timeout,
            link_grace: config.link_grace,
            ops,
            transport,
            links: HashMap::new(),
            calls: HashMap::new(),
            mm_transactions: HashMap::new(),
            timers: HashMap::new(),
            fds: HashMap::new(),
            protocols: crate::nwk::transaction::register_protocols(),
            next_id: 1,
        }
    }

    /// Protocol role of this handle
    pub fn role(&self) -> DectRole {
        self.role
    }

    /// Primary access rights identity, FP only
    pub fn pari(&self) -> Option<&Ari> {
        self.pari.as_ref()
    }

    pub(crate) fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(crate) fn register_channel_fd(&mut self, fd: RawFd, owner: FdOwner) {
        self.fds.insert(fd, owner);
        self.ops.event.register_fd(fd, FdEvents::READ);
    }

    pub(crate) fn unregister_channel_fd(&mut self, fd: RawFd) {
        self.fds.remove(&fd);
        self.ops.event.unregister_fd(fd);
    }

    ///
    /// Processes a readable descriptor.
    ///
    /// The application calls this when the event loop reports readiness
    /// on a descriptor previously registered through [`EventOps`].
    ///
    pub fn fd_process(&mut self, fd: RawFd) -> Result<()> {
        let data = transport::fd_recv(fd)?;
        match self.fds.get(&fd) {
            Some(FdOwner::Signaling(link)) => {
                let link = *link;
                self.link_rcv(link, &data)
            }
            Some(FdOwner::UPlane(call)) => {
                let call = *call;
                let ops = self.ops.cc.clone();
                ops.dl_u_data_ind(self, call, &data);
                Ok(())
            }
            None => Err(DectError::new(
                ErrorKind::Io,
                format!("unknown descriptor {}", fd),
            )),
        }
    }
}
