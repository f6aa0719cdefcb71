//! S-format message grammars (ETSI EN 300 175-5 §6.3)
//!
//! Each message owns an ordered descriptor of the IEs it may carry, with
//! one presence column per direction. The descriptors drive both the
//! parser and the builder; a repeatable slot accepts a list introduced by
//! a REPEAT-INDICATOR on the wire.

use super::ie::IeType;

/// Presence of an IE in one direction
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum IeStatus {
    /// Not allowed in this direction
    None,
    /// May be present
    Optional,
    /// Must be present
    Mandatory,
}

/// One slot of a message descriptor
#[derive(Clone, Copy, Debug)]
pub struct SfmtIeDesc {
    /// The IE this slot accepts
    pub ie: IeType,
    /// Presence in FP to PP direction
    pub fp_pp: IeStatus,
    /// Presence in PP to FP direction
    pub pp_fp: IeStatus,
    /// Slot accepts a repeated list
    pub repeat: bool,
}

const fn ie(t: IeType, fp_pp: IeStatus, pp_fp: IeStatus) -> SfmtIeDesc {
    SfmtIeDesc {
        ie: t,
        fp_pp,
        pp_fp,
        repeat: false,
    }
}

const fn ie_rep(t: IeType, fp_pp: IeStatus, pp_fp: IeStatus) -> SfmtIeDesc {
    SfmtIeDesc {
        ie: t,
        fp_pp,
        pp_fp,
        repeat: true,
    }
}

use IeStatus::{Mandatory, None as No, Optional};

/// CC message types (EN 300 175-5 §7.4.2)
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CcMsgType {
    /// {CC-ALERTING}
    Alerting = 0x01,
    /// {CC-CALL-PROC}
    CallProc = 0x02,
    /// {CC-SETUP}
    Setup = 0x05,
    /// {CC-CONNECT}
    Connect = 0x07,
    /// {CC-SETUP-ACK}
    SetupAck = 0x0d,
    /// {CC-CONNECT-ACK}
    ConnectAck = 0x0f,
    /// {CC-RELEASE}
    Release = 0x4d,
    /// {CC-RELEASE-COM}
    ReleaseCom = 0x5a,
    /// {CC-INFO}
    Info = 0x7b,
}

impl TryFrom<u8> for CcMsgType {
    type Error = ();

    fn try_from(v: u8) -> std::result::Result<Self, Self::Error> {
        match v {
            0x01 => Ok(CcMsgType::Alerting),
            0x02 => Ok(CcMsgType::CallProc),
            0x05 => Ok(CcMsgType::Setup),
            0x07 => Ok(CcMsgType::Connect),
            0x0d => Ok(CcMsgType::SetupAck),
            0x0f => Ok(CcMsgType::ConnectAck),
            0x4d => Ok(CcMsgType::Release),
            0x5a => Ok(CcMsgType::ReleaseCom),
            0x7b => Ok(CcMsgType::Info),
            _ => Err(()),
        }
    }
}

impl CcMsgType {
    /// Message name
    pub fn name(&self) -> &'static str {
        match self {
            CcMsgType::Alerting => "CC-ALERTING",
            CcMsgType::CallProc => "CC-CALL-PROC",
            CcMsgType::Setup => "CC-SETUP",
            CcMsgType::Connect => "CC-CONNECT",
            CcMsgType::SetupAck => "CC-SETUP-ACK",
            CcMsgType::ConnectAck => "CC-CONNECT-ACK",
            CcMsgType::Release => "CC-RELEASE",
            CcMsgType::ReleaseCom => "CC-RELEASE-COM",
            CcMsgType::Info => "CC-INFO",
        }
    }

    /// IE grammar of this message
    pub fn desc(&self) -> &'static [SfmtIeDesc] {
        match self {
            CcMsgType::Setup => CC_SETUP_DESC,
            CcMsgType::Info => CC_INFO_DESC,
            CcMsgType::SetupAck => CC_SETUP_ACK_DESC,
            CcMsgType::CallProc => CC_CALL_PROC_DESC,
            CcMsgType::Alerting => CC_ALERTING_DESC,
            CcMsgType::Connect => CC_CONNECT_DESC,
            CcMsgType::ConnectAck => CC_CONNECT_ACK_DESC,
            CcMsgType::Release => CC_RELEASE_DESC,
            CcMsgType::ReleaseCom => CC_RELEASE_COM_DESC,
        }
    }
}

static CC_SETUP_DESC: &[SfmtIeDesc] = &[
    ie(IeType::PortableIdentity, Mandatory, Mandatory),
    ie(IeType::FixedIdentity, Mandatory, Mandatory),
    ie(IeType::NwkAssignedIdentity, Optional, No),
    ie(IeType::BasicService, Mandatory, Mandatory),
    ie(IeType::CipherInfo, Optional, Optional),
    ie_rep(IeType::ProgressIndicator, Optional, Optional),
    ie(IeType::SingleDisplay, Optional, No),
    ie(IeType::SingleKeypad, No, Optional),
    ie(IeType::Signal, Optional, No),
    ie(IeType::FeatureActivate, No, Optional),
    ie(IeType::FeatureIndicate, Optional, No),
    ie(IeType::TerminalCapability, No, Optional),
    ie(IeType::CallingPartyNumber, Optional, Optional),
    ie(IeType::CalledPartyNumber, Optional, Optional),
    ie(IeType::SendingComplete, No, Optional),
    ie_rep(IeType::IwuToIwu, Optional, Optional),
    ie(IeType::ModelIdentifier, Optional, Optional),
    ie(IeType::CodecList, Optional, Optional),
    ie(IeType::EscapeToProprietary, Optional, Optional),
];

static CC_INFO_DESC: &[SfmtIeDesc] = &[
    ie(IeType::Signal, Optional, No),
    ie(IeType::TimerRestart, Optional, No),
    ie(IeType::SingleDisplay, Optional, Optional),
    ie(IeType::SingleKeypad, Optional, Optional),
    ie(IeType::FeatureActivate, No, Optional),
    ie(IeType::FeatureIndicate, Optional, No),
    ie_rep(IeType::ProgressIndicator, Optional, Optional),
    ie(IeType::CalledPartyNumber, Optional, Optional),
    ie_rep(IeType::IwuToIwu, Optional, Optional),
    ie(IeType::EscapeToProprietary, Optional, Optional),
];

static CC_SETUP_ACK_DESC: &[SfmtIeDesc] = &[
    ie(IeType::SingleDisplay, Optional, No),
    ie(IeType::Signal, Optional, No),
    ie_rep(IeType::ProgressIndicator, Optional, Optional),
    ie(IeType::DelimiterRequest, Optional, No),
    ie(IeType::IwuToIwu, Optional, Optional),
    ie(IeType::EscapeToProprietary, Optional, Optional),
];

static CC_CALL_PROC_DESC: &[SfmtIeDesc] = &[
    ie(IeType::SingleDisplay, Optional, No),
    ie(IeType::Signal, Optional, No),
    ie_rep(IeType::ProgressIndicator, Optional, Optional),
    ie(IeType::IwuToIwu, Optional, Optional),
    ie(IeType::EscapeToProprietary, Optional, Optional),
];

static CC_ALERTING_DESC: &[SfmtIeDesc] = &[
    ie(IeType::SingleDisplay, Optional, No),
    ie(IeType::Signal, Optional, No),
    ie_rep(IeType::ProgressIndicator, Optional, Optional),
    ie(IeType::TerminalCapability, No, Optional),
    ie(IeType::IwuToIwu, Optional, Optional),
    ie(IeType::ModelIdentifier, No, Optional),
    ie(IeType::CodecList, Optional, Optional),
    ie(IeType::EscapeToProprietary, Optional, Optional),
];

static CC_CONNECT_DESC: &[SfmtIeDesc] = &[
    ie(IeType::SingleDisplay, Optional, No),
    ie(IeType::Signal, Optional, No),
    ie_rep(IeType::ProgressIndicator, Optional, Optional),
    ie(IeType::TerminalCapability, No, Optional),
    ie(IeType::IwuToIwu, Optional, Optional),
    ie(IeType::ModelIdentifier, No, Optional),
    ie(IeType::CodecList, Optional, Optional),
    ie(IeType::EscapeToProprietary, Optional, Optional),
];

static CC_CONNECT_ACK_DESC: &[SfmtIeDesc] = &[
    ie(IeType::SingleDisplay, Optional, No),
    ie(IeType::IwuToIwu, Optional, Optional),
    ie(IeType::EscapeToProprietary, Optional, Optional),
];

static CC_RELEASE_DESC: &[SfmtIeDesc] = &[
    ie(IeType::ReleaseReason, Optional, Optional),
    ie(IeType::SingleDisplay, Optional, No),
    ie_rep(IeType::ProgressIndicator, Optional, Optional),
    ie_rep(IeType::IwuToIwu, Optional, Optional),
    ie(IeType::EscapeToProprietary, Optional, Optional),
];

static CC_RELEASE_COM_DESC: &[SfmtIeDesc] = &[
    ie(IeType::ReleaseReason, Optional, Optional),
    ie(IeType::SingleDisplay, Optional, No),
    ie(IeType::SingleKeypad, No, Optional),
    ie_rep(IeType::IwuToIwu, Optional, Optional),
    ie(IeType::EscapeToProprietary, Optional, Optional),
];

/// MM message types (EN 300 175-5 §7.4.5)
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MmMsgType {
    /// {AUTHENTICATION-REQUEST}
    AuthenticationRequest = 0x40,
    /// {AUTHENTICATION-REPLY}
    AuthenticationReply = 0x41,
    /// {KEY-ALLOCATE}
    KeyAllocate = 0x42,
    /// {AUTHENTICATION-REJECT}
    AuthenticationReject = 0x43,
    /// {ACCESS-RIGHTS-REQUEST}
    AccessRightsRequest = 0x44,
    /// {ACCESS-RIGHTS-ACCEPT}
    AccessRightsAccept = 0x45,
    /// {ACCESS-RIGHTS-REJECT}
    AccessRightsReject = 0x47,
    /// {LOCATE-REQUEST}
    LocateRequest = 0x54,
    /// {LOCATE-ACCEPT}
    LocateAccept = 0x55,
    /// {LOCATE-REJECT}
    LocateReject = 0x57,
    /// {IDENTITY-REQUEST}
    IdentityRequest = 0x58,
    /// {IDENTITY-REPLY}
    IdentityReply = 0x59,
    /// {TEMPORARY-IDENTITY-ASSIGN}
    TemporaryIdentityAssign = 0x5c,
    /// {TEMPORARY-IDENTITY-ASSIGN-ACK}
    TemporaryIdentityAssignAck = 0x5d,
    /// {TEMPORARY-IDENTITY-ASSIGN-REJ}
    TemporaryIdentityAssignRej = 0x5f,
}

impl TryFrom<u8> for MmMsgType {
    type Error = ();

    fn try_from(v: u8) -> std::result::Result<Self, Self::Error> {
        match v {
            0x40 => Ok(MmMsgType::AuthenticationRequest),
            0x41 => Ok(MmMsgType::AuthenticationReply),
            0x42 => Ok(MmMsgType::KeyAllocate),
            0x43 => Ok(MmMsgType::AuthenticationReject),
            0x44 => Ok(MmMsgType::AccessRightsRequest),
            0x45 => Ok(MmMsgType::AccessRightsAccept),
            0x47 => Ok(MmMsgType::AccessRightsReject),
            0x54 => Ok(MmMsgType::LocateRequest),
            0x55 => Ok(MmMsgType::LocateAccept),
            0x57 => Ok(MmMsgType::LocateReject),
            0x58 => Ok(MmMsgType::IdentityRequest),
            0x59 => Ok(MmMsgType::IdentityReply),
            0x5c => Ok(MmMsgType::TemporaryIdentityAssign),
            0x5d => Ok(MmMsgType::TemporaryIdentityAssignAck),
            0x5f => Ok(MmMsgType::TemporaryIdentityAssignRej),
            _ => Err(()),
        }
    }
}

impl MmMsgType {
    /// Message name
    pub fn name(&self) -> &'static str {
        match self {
            MmMsgType::AuthenticationRequest => "AUTHENTICATION-REQUEST",
            MmMsgType::AuthenticationReply => "AUTHENTICATION-REPLY",
            MmMsgType::KeyAllocate => "KEY-ALLOCATE",
            MmMsgType::AuthenticationReject => "AUTHENTICATION-REJECT",
            MmMsgType::AccessRightsRequest => "ACCESS-RIGHTS-REQUEST",
            MmMsgType::AccessRightsAccept => "ACCESS-RIGHTS-ACCEPT",
            MmMsgType::AccessRightsReject => "ACCESS-RIGHTS-REJECT",
            MmMsgType::LocateRequest => "LOCATE-REQUEST",
            MmMsgType::LocateAccept => "LOCATE-ACCEPT",
            MmMsgType::LocateReject => "LOCATE-REJECT",
            MmMsgType::IdentityRequest => "IDENTITY-REQUEST",
            MmMsgType::IdentityReply => "IDENTITY-REPLY",
            MmMsgType::TemporaryIdentityAssign => "TEMPORARY-IDENTITY-ASSIGN",
            MmMsgType::TemporaryIdentityAssignAck => "TEMPORARY-IDENTITY-ASSIGN-ACK",
            MmMsgType::TemporaryIdentityAssignRej => "TEMPORARY-IDENTITY-ASSIGN-REJ",
        }
    }

    /// IE grammar of this message
    pub fn desc(&self) -> &'static [SfmtIeDesc] {
        match self {
            MmMsgType::AuthenticationRequest => MM_AUTHENTICATION_REQUEST_DESC,
            MmMsgType::AuthenticationReply => MM_AUTHENTICATION_REPLY_DESC,
            MmMsgType::KeyAllocate => MM_KEY_ALLOCATE_DESC,
            MmMsgType::AuthenticationReject => MM_AUTHENTICATION_REJECT_DESC,
            MmMsgType::AccessRightsRequest => MM_ACCESS_RIGHTS_REQUEST_DESC,
            MmMsgType::AccessRightsAccept => MM_ACCESS_RIGHTS_ACCEPT_DESC,
            MmMsgType::AccessRightsReject => MM_ACCESS_RIGHTS_REJECT_DESC,
            MmMsgType::LocateRequest => MM_LOCATE_REQUEST_DESC,
            MmMsgType::LocateAccept => MM_LOCATE_ACCEPT_DESC,
            MmMsgType::LocateReject => MM_LOCATE_REJECT_DESC,
            MmMsgType::IdentityRequest => MM_IDENTITY_REQUEST_DESC,
            MmMsgType::IdentityReply => MM_IDENTITY_REPLY_DESC,
            MmMsgType::TemporaryIdentityAssign => MM_TEMPORARY_IDENTITY_ASSIGN_DESC,
            MmMsgType::TemporaryIdentityAssignAck => MM_TEMPORARY_IDENTITY_ASSIGN_ACK_DESC,
            MmMsgType::TemporaryIdentityAssignRej => MM_TEMPORARY_IDENTITY_ASSIGN_REJ_DESC,
        }
    }
}

static MM_ACCESS_RIGHTS_REQUEST_DESC: &[SfmtIeDesc] = &[
    ie(IeType::PortableIdentity, No, Mandatory),
    ie(IeType::AuthType, No, Optional),
    ie(IeType::CipherInfo, No, Optional),
    ie(IeType::TerminalCapability, No, Optional),
    ie(IeType::ModelIdentifier, No, Optional),
    ie(IeType::CodecList, No, Optional),
    ie(IeType::EscapeToProprietary, No, Optional),
];

static MM_ACCESS_RIGHTS_ACCEPT_DESC: &[SfmtIeDesc] = &[
    ie(IeType::PortableIdentity, Mandatory, No),
    ie_rep(IeType::FixedIdentity, Mandatory, No),
    ie(IeType::LocationArea, Optional, No),
    ie(IeType::AuthType, Optional, No),
    ie(IeType::CipherInfo, Optional, No),
    ie(IeType::ModelIdentifier, Optional, No),
    ie(IeType::CodecList, Optional, No),
    ie(IeType::EscapeToProprietary, Optional, No),
];

static MM_ACCESS_RIGHTS_REJECT_DESC: &[SfmtIeDesc] = &[
    ie(IeType::RejectReason, Optional, No),
    ie(IeType::Duration, Optional, No),
    ie(IeType::IwuToIwu, Optional, No),
    ie(IeType::EscapeToProprietary, Optional, No),
];

static MM_LOCATE_REQUEST_DESC: &[SfmtIeDesc] = &[
    ie(IeType::PortableIdentity, No, Mandatory),
    ie(IeType::FixedIdentity, No, Optional),
    ie(IeType::LocationArea, No, Optional),
    ie(IeType::NwkAssignedIdentity, No, Optional),
    ie(IeType::CipherInfo, No, Optional),
    ie(IeType::TerminalCapability, No, Optional),
    ie(IeType::ModelIdentifier, No, Optional),
    ie(IeType::EscapeToProprietary, No, Optional),
];

static MM_LOCATE_ACCEPT_DESC: &[SfmtIeDesc] = &[
    ie(IeType::PortableIdentity, Mandatory, No),
    ie(IeType::LocationArea, Mandatory, No),
    ie(IeType::NwkAssignedIdentity, Optional, No),
    ie(IeType::UseTpui, Optional, No),
    ie(IeType::Duration, Optional, No),
    ie(IeType::IwuToIwu, Optional, No),
    ie(IeType::CodecList, Optional, No),
    ie(IeType::EscapeToProprietary, Optional, No),
];

static MM_LOCATE_REJECT_DESC: &[SfmtIeDesc] = &[
    ie(IeType::RejectReason, Optional, No),
    ie(IeType::Duration, Optional, No),
    ie(IeType::IwuToIwu, Optional, No),
    ie(IeType::EscapeToProprietary, Optional, No),
];

static MM_TEMPORARY_IDENTITY_ASSIGN_DESC: &[SfmtIeDesc] = &[
    ie(IeType::PortableIdentity, Mandatory, No),
    ie(IeType::LocationArea, Optional, No),
    ie(IeType::NwkAssignedIdentity, Optional, No),
    ie(IeType::Duration, Optional, No),
    ie(IeType::IwuToIwu, Optional, No),
    ie(IeType::EscapeToProprietary, Optional, No),
];

static MM_TEMPORARY_IDENTITY_ASSIGN_ACK_DESC: &[SfmtIeDesc] = &[
    ie(IeType::IwuToIwu, No, Optional),
    ie(IeType::EscapeToProprietary, No, Optional),
];

static MM_TEMPORARY_IDENTITY_ASSIGN_REJ_DESC: &[SfmtIeDesc] = &[
    ie(IeType::RejectReason, No, Optional),
    ie(IeType::IwuToIwu, No, Optional),
    ie(IeType::EscapeToProprietary, No, Optional),
];

static MM_AUTHENTICATION_REQUEST_DESC: &[SfmtIeDesc] = &[
    ie(IeType::AuthType, Mandatory, Mandatory),
    ie(IeType::Rand, Mandatory, Mandatory),
    ie(IeType::Res, Optional, Optional),
    ie(IeType::Rs, Optional, Optional),
    ie(IeType::CipherInfo, Optional, Optional),
    ie(IeType::IwuToIwu, Optional, Optional),
    ie(IeType::EscapeToProprietary, Optional, Optional),
];

static MM_AUTHENTICATION_REPLY_DESC: &[SfmtIeDesc] = &[
    ie(IeType::Res, Mandatory, Mandatory),
    ie(IeType::Rand, Optional, Optional),
    ie(IeType::Rs, Optional, Optional),
    ie(IeType::IwuToIwu, Optional, Optional),
    ie(IeType::EscapeToProprietary, Optional, Optional),
];

static MM_AUTHENTICATION_REJECT_DESC: &[SfmtIeDesc] = &[
    ie(IeType::AuthType, Optional, Optional),
    ie(IeType::RejectReason, Optional, Optional),
    ie(IeType::IwuToIwu, Optional, Optional),
    ie(IeType::EscapeToProprietary, Optional, Optional),
];

static MM_KEY_ALLOCATE_DESC: &[SfmtIeDesc] = &[
    ie(IeType::AllocationType, Mandatory, No),
    ie(IeType::Rand, Mandatory, No),
    ie(IeType::Rs, Mandatory, No),
    ie(IeType::EscapeToProprietary, Optional, No),
];

static MM_IDENTITY_REQUEST_DESC: &[SfmtIeDesc] = &[
    ie_rep(IeType::IdentityType, Mandatory, No),
    ie(IeType::IwuToIwu, Optional, No),
    ie(IeType::EscapeToProprietary, Optional, No),
];

static MM_IDENTITY_REPLY_DESC: &[SfmtIeDesc] = &[
    ie_rep(IeType::PortableIdentity, No, Optional),
    ie_rep(IeType::FixedIdentity, No, Optional),
    ie(IeType::NwkAssignedIdentity, No, Optional),
    ie(IeType::ModelIdentifier, No, Optional),
    ie(IeType::IwuToIwu, No, Optional),
    ie(IeType::EscapeToProprietary, No, Optional),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_msg_type_lookup() {
        assert_eq!(CcMsgType::try_from(0x05), Ok(CcMsgType::Setup));
        assert_eq!(CcMsgType::try_from(0x7b), Ok(CcMsgType::Info));
        assert!(CcMsgType::try_from(0x33).is_err());
        assert_eq!(MmMsgType::try_from(0x54), Ok(MmMsgType::LocateRequest));
        assert!(MmMsgType::try_from(0x00).is_err());
    }

    #[test]
    fn test_desc_shape() {
        // every descriptor slot names a unique IE
        for msg in [CcMsgType::Setup, CcMsgType::Info, CcMsgType::Release] {
            let desc = msg.desc();
            for (i, a) in desc.iter().enumerate() {
                for b in &desc[i + 1..] {
                    assert_ne!(a.ie, b.ie, "{}: duplicate slot", msg.name());
                }
            }
        }
        assert_eq!(CcMsgType::Setup.desc()[0].ie, IeType::PortableIdentity);
        assert_eq!(CcMsgType::Setup.desc()[0].fp_pp, IeStatus::Mandatory);
    }
}
