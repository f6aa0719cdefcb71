//! S-format information elements (ETSI EN 300 175-5 §7.6/7.7)
//!
//! The catalog maps every known IE identifier to a name and, for the IEs
//! the stack speaks, an octet-exact codec. Decoded IEs are carried as the
//! [`InfoElement`] tagged enum; dispatch on the tag replaces the per-IE
//! handler table of a classic implementation.

use serde::Serialize;

use crate::identity::{Ari, Ipui, Park, Tpui};
use crate::tools::error::{DectError, ErrorKind, Result};

/*
 * S-format IE framings:
 *
 *  fixed length, single octet:
 *  +-+-+-+-+-+-+-+-+
 *  |1| id  | value |
 *  +-+-+-+-+-+-+-+-+
 *
 *  fixed length, double octet:
 *  +-+-+-+-+-+-+-+-+ +-+-+-+-+-+-+-+-+
 *  |1|1 1 0|  sub  | |    content    |
 *  +-+-+-+-+-+-+-+-+ +-+-+-+-+-+-+-+-+
 *
 *  variable length:
 *  +-+-+-+-+-+-+-+-+ +-+-+-+-+-+-+-+-+ +--
 *  |0|  identifier | |  length N     | |  N content octets ...
 *  +-+-+-+-+-+-+-+-+ +-+-+-+-+-+-+-+-+ +--
 *
 * The single-octet group 0xa0 carries a sub-identifier in its value
 * nibble (the EXT-PREFIX family); the double-octet group 0xe0 likewise.
 */

/// IE framing on the wire
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum IeFraming {
    /// Fixed length, one octet, value in the low nibble
    Single,
    /// Fixed length, two octets
    Double,
    /// Variable length with a length octet
    Variable,
}

/// Catalog identifiers of the S-format information elements.
///
/// Fixed-length identifiers carry bit 8; the EXT-PREFIX (0xa1..) and
/// double-octet (0xe0..) families embed their sub-identifier.
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum IeType {
    /// <<SHIFT>>
    Shift = 0x90,
    /// <<SENDING-COMPLETE>>
    SendingComplete = 0xa1,
    /// <<DELIMITER-REQUEST>>
    DelimiterRequest = 0xa2,
    /// <<USE-TPUI>>
    UseTpui = 0xa3,
    /// <<REPEAT-INDICATOR>>
    RepeatIndicator = 0xd0,
    /// <<BASIC-SERVICE>>
    BasicService = 0xe0,
    /// <<RELEASE-REASON>>
    ReleaseReason = 0xe2,
    /// <<SIGNAL>>
    Signal = 0xe4,
    /// <<TIMER-RESTART>>
    TimerRestart = 0xe5,
    /// <<TEST-HOOK-CONTROL>>
    TestHookControl = 0xe6,
    /// <<SINGLE-DISPLAY>>
    SingleDisplay = 0xe8,
    /// <<SINGLE-KEYPAD>>
    SingleKeypad = 0xe9,
    /// <<INFO-TYPE>>
    InfoType = 0x01,
    /// <<IDENTITY-TYPE>>
    IdentityType = 0x02,
    /// <<PORTABLE-IDENTITY>>
    PortableIdentity = 0x05,
    /// <<FIXED-IDENTITY>>
    FixedIdentity = 0x06,
    /// <<LOCATION-AREA>>
    LocationArea = 0x07,
    /// <<NWK-ASSIGNED-IDENTITY>>
    NwkAssignedIdentity = 0x09,
    /// <<AUTH-TYPE>>
    AuthType = 0x0a,
    /// <<ALLOCATION-TYPE>>
    AllocationType = 0x0b,
    /// <<RAND>>
    Rand = 0x0c,
    /// <<RES>>
    Res = 0x0d,
    /// <<RS>>
    Rs = 0x0e,
    /// <<IWU-ATTRIBUTES>>
    IwuAttributes = 0x12,
    /// <<CALL-ATTRIBUTES>>
    CallAttributes = 0x13,
    /// <<SERVICE-CHANGE-INFO>>
    ServiceChangeInfo = 0x16,
    /// <<CONNECTION-ATTRIBUTES>>
    ConnectionAttributes = 0x17,
    /// <<CIPHER-INFO>>
    CipherInfo = 0x19,
    /// <<CALL-IDENTITY>>
    CallIdentity = 0x1a,
    /// <<CONNECTION-IDENTITY>>
    ConnectionIdentity = 0x1b,
    /// <<FACILITY>>
    Facility = 0x1c,
    /// <<PROGRESS-INDICATOR>>
    ProgressIndicator = 0x1e,
    /// <<MMS-GENERIC-HEADER>>
    MmsGenericHeader = 0x20,
    /// <<MMS-OBJECT-HEADER>>
    MmsObjectHeader = 0x21,
    /// <<MMS-EXTENDED-HEADER>>
    MmsExtendedHeader = 0x22,
    /// <<TIME-DATE>>
    TimeDate = 0x23,
    /// <<MULTI-DISPLAY>>
    MultiDisplay = 0x28,
    /// <<MULTI-KEYPAD>>
    MultiKeypad = 0x2c,
    /// <<FEATURE-ACTIVATE>>
    FeatureActivate = 0x38,
    /// <<FEATURE-INDICATE>>
    FeatureIndicate = 0x39,
    /// <<NETWORK-PARAMETER>>
    NetworkParameter = 0x41,
    /// <<EXT-H/O-INDICATOR>>
    ExtHoIndicator = 0x42,
    /// <<ZAP-FIELD>>
    ZapField = 0x52,
    /// <<SERVICE-CLASS>>
    ServiceClass = 0x54,
    /// <<KEY>>
    Key = 0x56,
    /// <<REJECT-REASON>>
    RejectReason = 0x60,
    /// <<SETUP-CAPABILITY>>
    SetupCapability = 0x62,
    /// <<TERMINAL-CAPABILITY>>
    TerminalCapability = 0x63,
    /// <<END-TO-END-COMPATIBILITY>>
    EndToEndCompatibility = 0x64,
    /// <<RATE-PARAMETERS>>
    RateParameters = 0x65,
    /// <<TRANSIT-DELAY>>
    TransitDelay = 0x66,
    /// <<WINDOW-SIZE>>
    WindowSize = 0x67,
    /// <<CALLING-PARTY-NUMBER>>
    CallingPartyNumber = 0x6c,
    /// <<CALLING-PARTY-NAME>>
    CallingPartyName = 0x6d,
    /// <<CALLED-PARTY-NUMBER>>
    CalledPartyNumber = 0x70,
    /// <<CALLED-PARTY-SUBADDRESS>>
    CalledPartySubaddress = 0x71,
    /// <<DURATION>>
    Duration = 0x72,
    /// <<SEGMENTED-INFO>>
    SegmentedInfo = 0x75,
    /// <<ALPHANUMERIC>>
    Alphanumeric = 0x76,
    /// <<IWU-TO-IWU>>
    IwuToIwu = 0x77,
    /// <<MODEL-IDENTIFIER>>
    ModelIdentifier = 0x78,
    /// <<IWU-PACKET>>
    IwuPacket = 0x7a,
    /// <<ESCAPE-TO-PROPRIETARY>>
    EscapeToProprietary = 0x7b,
    /// <<CODEC-LIST>>
    CodecList = 0x7c,
    /// <<EVENTS-NOTIFICATION>>
    EventsNotification = 0x7d,
    /// <<CALL-INFORMATION>>
    CallInformation = 0x7e,
    /// <<ESCAPE-FOR-EXTENSION>>
    EscapeForExtension = 0x7f,
}

impl IeType {
    /// Resolves the catalog identifier of a wire octet.
    ///
    /// For the EXT-PREFIX and double-octet families the sub-identifier in
    /// the value nibble is part of the catalog identifier; for the other
    /// fixed-length groups only the group bits identify the IE.
    pub fn id_of(octet: u8) -> u8 {
        if octet < 0x80 {
            return octet;
        }
        match octet & 0xf0 {
            0xa0 | 0xe0 => octet,
            group => group,
        }
    }

    /// Looks up a catalog identifier
    pub fn from_id(id: u8) -> Option<IeType> {
        let typ = match id {
            0x90 => IeType::Shift,
            0xa1 => IeType::SendingComplete,
            0xa2 => IeType::DelimiterRequest,
            0xa3 => IeType::UseTpui,
            0xd0 => IeType::RepeatIndicator,
            0xe0 => IeType::BasicService,
            0xe2 => IeType::ReleaseReason,
            0xe4 => IeType::Signal,
            0xe5 => IeType::TimerRestart,
            0xe6 => IeType::TestHookControl,
            0xe8 => IeType::SingleDisplay,
            0xe9 => IeType::SingleKeypad,
            0x01 => IeType::InfoType,
            0x02 => IeType::IdentityType,
            0x05 => IeType::PortableIdentity,
            0x06 => IeType::FixedIdentity,
            0x07 => IeType::LocationArea,
            0x09 => IeType::NwkAssignedIdentity,
            0x0a => IeType::AuthType,
            0x0b => IeType::AllocationType,
            0x0c => IeType::Rand,
            0x0d => IeType::Res,
            0x0e => IeType::Rs,
            0x12 => IeType::IwuAttributes,
            0x13 => IeType::CallAttributes,
            0x16 => IeType::ServiceChangeInfo,
            0x17 => IeType::ConnectionAttributes,
            0x19 => IeType::CipherInfo,
            0x1a => IeType::CallIdentity,
            0x1b => IeType::ConnectionIdentity,
            0x1c => IeType::Facility,
            0x1e => IeType::ProgressIndicator,
            0x20 => IeType::MmsGenericHeader,
            0x21 => IeType::MmsObjectHeader,
            0x22 => IeType::MmsExtendedHeader,
            0x23 => IeType::TimeDate,
            0x28 => IeType::MultiDisplay,
            0x2c => IeType::MultiKeypad,
            0x38 => IeType::FeatureActivate,
            0x39 => IeType::FeatureIndicate,
            0x41 => IeType::NetworkParameter,
            0x42 => IeType::ExtHoIndicator,
            0x52 => IeType::ZapField,
            0x54 => IeType::ServiceClass,
            0x56 => IeType::Key,
            0x60 => IeType::RejectReason,
            0x62 => IeType::SetupCapability,
            0x63 => IeType::TerminalCapability,
            0x64 => IeType::EndToEndCompatibility,
            0x65 => IeType::RateParameters,
            0x66 => IeType::TransitDelay,
            0x67 => IeType::WindowSize,
            0x6c => IeType::CallingPartyNumber,
            0x6d => IeType::CallingPartyName,
            0x70 => IeType::CalledPartyNumber,
            0x71 => IeType::CalledPartySubaddress,
            0x72 => IeType::Duration,
            0x75 => IeType::SegmentedInfo,
            0x76 => IeType::Alphanumeric,
            0x77 => IeType::IwuToIwu,
            0x78 => IeType::ModelIdentifier,
            0x7a => IeType::IwuPacket,
            0x7b => IeType::EscapeToProprietary,
            0x7c => IeType::CodecList,
            0x7d => IeType::EventsNotification,
            0x7e => IeType::CallInformation,
            0x7f => IeType::EscapeForExtension,
            _ => return None,
        };
        Some(typ)
    }

    /// Framing of this IE on the wire
    pub fn framing(&self) -> IeFraming {
        let id = *self as u8;
        if id < 0x80 {
            IeFraming::Variable
        } else if id & 0xf0 == 0xe0 {
            IeFraming::Double
        } else {
            IeFraming::Single
        }
    }

    /// Human readable catalog name
    pub fn name(&self) -> &'static str {
        match self {
            IeType::Shift => "SHIFT",
            IeType::SendingComplete => "SENDING-COMPLETE",
            IeType::DelimiterRequest => "DELIMITER-REQUEST",
            IeType::UseTpui => "USE-TPUI",
            IeType::RepeatIndicator => "REPEAT-INDICATOR",
            IeType::BasicService => "BASIC-SERVICE",
            IeType::ReleaseReason => "RELEASE-REASON",
            IeType::Signal => "SIGNAL",
            IeType::TimerRestart => "TIMER-RESTART",
            IeType::TestHookControl => "TEST-HOOK-CONTROL",
            IeType::SingleDisplay => "SINGLE-DISPLAY",
            IeType::SingleKeypad => "SINGLE-KEYPAD",
            IeType::InfoType => "INFO-TYPE",
            IeType::IdentityType => "IDENTITY-TYPE",
            IeType::PortableIdentity => "PORTABLE-IDENTITY",
            IeType::FixedIdentity => "FIXED-IDENTITY",
            IeType::LocationArea => "LOCATION-AREA",
            IeType::NwkAssignedIdentity => "NWK-ASSIGNED-IDENTITY",
            IeType::AuthType => "AUTH-TYPE",
            IeType::AllocationType => "ALLOCATION-TYPE",
            IeType::Rand => "RAND",
            IeType::Res => "RES",
            IeType::Rs => "RS",
            IeType::IwuAttributes => "IWU-ATTRIBUTES",
            IeType::CallAttributes => "CALL-ATTRIBUTES",
            IeType::ServiceChangeInfo => "SERVICE-CHANGE-INFO",
            IeType::ConnectionAttributes => "CONNECTION-ATTRIBUTES",
            IeType::CipherInfo => "CIPHER-INFO",
            IeType::CallIdentity => "CALL-IDENTITY",
            IeType::ConnectionIdentity => "CONNECTION-IDENTITY",
            IeType::Facility => "FACILITY",
            IeType::ProgressIndicator => "PROGRESS-INDICATOR",
            IeType::MmsGenericHeader => "MMS-GENERIC-HEADER",
            IeType::MmsObjectHeader => "MMS-OBJECT-HEADER",
            IeType::MmsExtendedHeader => "MMS-EXTENDED-HEADER",
            IeType::TimeDate => "TIME-DATE",
            IeType::MultiDisplay => "MULTI-DISPLAY",
            IeType::MultiKeypad => "MULTI-KEYPAD",
            IeType::FeatureActivate => "FEATURE-ACTIVATE",
            IeType::FeatureIndicate => "FEATURE-INDICATE",
            IeType::NetworkParameter => "NETWORK-PARAMETER",
            IeType::ExtHoIndicator => "EXT-H/O-INDICATOR",
            IeType::ZapField => "ZAP-FIELD",
            IeType::ServiceClass => "SERVICE-CLASS",
            IeType::Key => "KEY",
            IeType::RejectReason => "REJECT-REASON",
            IeType::SetupCapability => "SETUP-CAPABILITY",
            IeType::TerminalCapability => "TERMINAL-CAPABILITY",
            IeType::EndToEndCompatibility => "END-TO-END-COMPATIBILITY",
            IeType::RateParameters => "RATE-PARAMETERS",
            IeType::TransitDelay => "TRANSIT-DELAY",
            IeType::WindowSize => "WINDOW-SIZE",
            IeType::CallingPartyNumber => "CALLING-PARTY-NUMBER",
            IeType::CallingPartyName => "CALLING-PARTY-NAME",
            IeType::CalledPartyNumber => "CALLED-PARTY-NUMBER",
            IeType::CalledPartySubaddress => "CALLED-PARTY-SUBADDRESS",
            IeType::Duration => "DURATION",
            IeType::SegmentedInfo => "SEGMENTED-INFO",
            IeType::Alphanumeric => "ALPHANUMERIC",
            IeType::IwuToIwu => "IWU-TO-IWU",
            IeType::ModelIdentifier => "MODEL-IDENTIFIER",
            IeType::IwuPacket => "IWU-PACKET",
            IeType::EscapeToProprietary => "ESCAPE-TO-PROPRIETARY",
            IeType::CodecList => "CODEC-LIST",
            IeType::EventsNotification => "EVENTS-NOTIFICATION",
            IeType::CallInformation => "CALL-INFORMATION",
            IeType::EscapeForExtension => "ESCAPE-FOR-EXTENSION",
        }
    }
}

/// Ordering policy announced by a REPEAT-INDICATOR
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum RepeatIndicatorType {
    /// Non prioritized list
    Normal = 0x1,
    /// List in priority order
    Prioritized = 0x2,
}

/// Call class of a BASIC-SERVICE
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum CallClass {
    /// LiA service setup
    LiaService = 0x2,
    /// Message call
    Message = 0x4,
    /// DECT/ISDN IIP
    DectIsdn = 0x7,
    /// Normal call
    Normal = 0x8,
    /// Internal call
    Internal = 0x9,
    /// Emergency call
    Emergency = 0xa,
    /// Service call
    Service = 0xb,
    /// QA&M call
    QaM = 0xc,
    /// Incoming call
    Incoming = 0xe,
}

impl TryFrom<u8> for CallClass {
    type Error = ();

    fn try_from(v: u8) -> std::result::Result<Self, Self::Error> {
        match v {
            0x2 => Ok(CallClass::LiaService),
            0x4 => Ok(CallClass::Message),
            0x7 => Ok(CallClass::DectIsdn),
            0x8 => Ok(CallClass::Normal),
            0x9 => Ok(CallClass::Internal),
            0xa => Ok(CallClass::Emergency),
            0xb => Ok(CallClass::Service),
            0xc => Ok(CallClass::QaM),
            0xe => Ok(CallClass::Incoming),
            _ => Err(()),
        }
    }
}

/// Basic service value of a BASIC-SERVICE
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum ServiceValue {
    /// Basic speech, default attributes
    BasicSpeech = 0x0,
    /// DECT/GSM interworking profile
    DectGsm = 0x4,
    /// LRMS service
    Lrms = 0x5,
    /// DECT/UMTS interworking profile
    DectUmts = 0x6,
    /// Wideband speech, default attributes
    WidebandSpeech = 0x8,
    /// Other attributes follow in the message
    Other = 0xf,
}

impl TryFrom<u8> for ServiceValue {
    type Error = ();

    fn try_from(v: u8) -> std::result::Result<Self, Self::Error> {
        match v {
            0x0 => Ok(ServiceValue::BasicSpeech),
            0x4 => Ok(ServiceValue::DectGsm),
            0x5 => Ok(ServiceValue::Lrms),
            0x6 => Ok(ServiceValue::DectUmts),
            0x8 => Ok(ServiceValue::WidebandSpeech),
            0xf => Ok(ServiceValue::Other),
            _ => Err(()),
        }
    }
}

/// RELEASE-REASON code
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct ReleaseReasonCode(pub u8);

impl ReleaseReasonCode {
    /// Normal release
    pub const NORMAL: ReleaseReasonCode = ReleaseReasonCode(0x00);
    /// Message not expected in this state
    pub const UNEXPECTED_MESSAGE: ReleaseReasonCode = ReleaseReasonCode(0x01);
    /// Transaction identifier unknown
    pub const UNKNOWN_TRANSACTION: ReleaseReasonCode = ReleaseReasonCode(0x02);
    /// A mandatory information element was missing
    pub const MANDATORY_IE_MISSING: ReleaseReasonCode = ReleaseReasonCode(0x03);
    /// An information element had invalid contents
    pub const INVALID_IE_CONTENTS: ReleaseReasonCode = ReleaseReasonCode(0x04);
    /// Incompatible service requested
    pub const INCOMPATIBLE_SERVICE: ReleaseReasonCode = ReleaseReasonCode(0x05);
    /// Service not implemented
    pub const SERVICE_NOT_IMPLEMENTED: ReleaseReasonCode = ReleaseReasonCode(0x06);
    /// Authentication failed
    pub const AUTHENTICATION_FAILED: ReleaseReasonCode = ReleaseReasonCode(0x09);
    /// Protocol timer expired
    pub const TIMER_EXPIRY: ReleaseReasonCode = ReleaseReasonCode(0x0d);
    /// Partial release, the data link stays up
    pub const PARTIAL_RELEASE: ReleaseReasonCode = ReleaseReasonCode(0x0e);
    /// User busy
    pub const USER_BUSY: ReleaseReasonCode = ReleaseReasonCode(0x14);
    /// User rejected the call
    pub const USER_REJECTION: ReleaseReasonCode = ReleaseReasonCode(0x15);
    /// No transaction resources left
    pub const OVERLOAD: ReleaseReasonCode = ReleaseReasonCode(0x21);
}

/// REJECT-REASON code
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct RejectReasonCode(pub u8);

impl RejectReasonCode {
    /// TPUI unknown
    pub const TPUI_UNKNOWN: RejectReasonCode = RejectReasonCode(0x01);
    /// IPUI unknown
    pub const IPUI_UNKNOWN: RejectReasonCode = RejectReasonCode(0x02);
    /// Network assigned identity unknown
    pub const NWK_IDENTITY_UNKNOWN: RejectReasonCode = RejectReasonCode(0x03);
    /// IPEI not accepted
    pub const IPEI_NOT_ACCEPTED: RejectReasonCode = RejectReasonCode(0x05);
    /// IPUI not accepted
    pub const IPUI_NOT_ACCEPTED: RejectReasonCode = RejectReasonCode(0x06);
    /// Authentication failed
    pub const AUTHENTICATION_FAILED: RejectReasonCode = RejectReasonCode(0x10);
    /// No authentication algorithm available
    pub const NO_AUTH_ALGORITHM: RejectReasonCode = RejectReasonCode(0x11);
    /// Authentication key not supported
    pub const AUTH_KEY_NOT_SUPPORTED: RejectReasonCode = RejectReasonCode(0x13);
    /// No cipher algorithm available
    pub const NO_CIPHER_ALGORITHM: RejectReasonCode = RejectReasonCode(0x17);
    /// Insufficient resources at the FP
    pub const INSUFFICIENT_RESOURCES: RejectReasonCode = RejectReasonCode(0x47);
    /// Location area not allowed
    pub const LOCATION_AREA_NOT_ALLOWED: RejectReasonCode = RejectReasonCode(0x80);
    /// National roaming not allowed in this location area
    pub const NATIONAL_ROAMING_NOT_ALLOWED: RejectReasonCode = RejectReasonCode(0x81);
}

/// SIGNAL code
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct SignalCode(pub u8);

impl SignalCode {
    /// Dial tone on
    pub const DIAL_TONE_ON: SignalCode = SignalCode(0x10);
    /// Ring-back tone on
    pub const RING_BACK_TONE_ON: SignalCode = SignalCode(0x11);
    /// Busy tone on
    pub const BUSY_TONE_ON: SignalCode = SignalCode(0x13);
    /// All tones off
    pub const TONES_OFF: SignalCode = SignalCode(0x3f);
    /// Alerting on, pattern 0
    pub const ALERTING_PATTERN_0: SignalCode = SignalCode(0x40);
    /// Alerting off
    pub const ALERTING_OFF: SignalCode = SignalCode(0x4f);
}

/// TIMER-RESTART value
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum TimerRestartValue {
    /// Restart the timer
    Restart = 0x0,
    /// Stop the timer
    Stop = 0x1,
}

/// TEST-HOOK-CONTROL value
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum HookState {
    /// Go on-hook
    OnHook = 0x0,
    /// Go off-hook
    OffHook = 0x1,
}

/// Identity carried by a PORTABLE-IDENTITY
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub enum PortableIdentity {
    /// International Portable User Identity
    Ipui(Ipui),
    /// Temporary Portable User Identity
    Tpui(Tpui),
}

const PORTABLE_ID_IPUI: u8 = 0x00;
const PORTABLE_ID_TPUI: u8 = 0x20;

/// Identity carried by a FIXED-IDENTITY
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub enum FixedIdentity {
    /// Access Rights Identity
    Ari(Ari),
    /// ARI plus Radio fixed Part Number
    AriRpn {
        /// Access rights identity
        ari: Ari,
        /// Radio fixed part number (8 bits)
        rpn: u8,
    },
    /// Portable Access Rights Key
    Park(Park),
}

const FIXED_ID_ARI: u8 = 0x00;
const FIXED_ID_ARI_RPN: u8 = 0x01;
const FIXED_ID_PARK: u8 = 0x20;

/// LOCATION-AREA contents
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct LocationArea {
    /// Location information type (2 bits)
    pub li_type: u8,
    /// Location area level (6 bits)
    pub level: u8,
}

/// AUTH-TYPE contents
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct AuthType {
    /// Authentication algorithm identifier (DSAA = 0x01)
    pub algorithm: u8,
    /// Authentication key type
    pub ak_type: u8,
    /// Authentication key number (3 bits)
    pub ak_num: u8,
    /// INC: increment the ZAP value
    pub inc: bool,
    /// DEF: make the derived cipher key the default
    pub def: bool,
    /// TXC: transmit the derived cipher key
    pub txc: bool,
    /// UPC: store the derived cipher key
    pub upc: bool,
    /// Cipher key number (4 bits)
    pub cipher_key_num: u8,
    /// Default cipher key index, present when DEF is set
    pub default_cipher_key_index: Option<u16>,
}

/// ALLOCATION-TYPE contents
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct AllocationType {
    /// Authentication algorithm identifier
    pub algorithm: u8,
    /// Authentication key number (4 bits)
    pub ak_num: u8,
    /// Authentication code number (4 bits)
    pub ac_num: u8,
}

/// CIPHER-INFO contents
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct CipherInfo {
    /// Enable or disable ciphering
    pub enable: bool,
    /// Cipher algorithm identifier (DSC = 0x01)
    pub algorithm: u8,
    /// Cipher key type
    pub key_type: u8,
    /// Cipher key number (4 bits)
    pub key_num: u8,
}

/// PROGRESS-INDICATOR contents
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct ProgressIndicator {
    /// Location code (4 bits)
    pub location: u8,
    /// Progress description (7 bits)
    pub progress: u8,
}

/// TIME-DATE contents
///
/// The coding field selects which of the date and time parts are present.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct TimeDate {
    /// Interpretation of the time stamp (6 bits)
    pub interpretation: u8,
    /// BCD date: year, month, day
    pub date: Option<[u8; 3]>,
    /// BCD time: hour, minute, second, time zone
    pub time: Option<[u8; 4]>,
}

const TIME_DATE_DATE: u8 = 0x1;
const TIME_DATE_TIME: u8 = 0x2;

/// FEATURE-ACTIVATE contents
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct FeatureActivate {
    /// Feature code (7 bits)
    pub feature: u8,
    /// Feature parameter
    pub parameter: Option<u8>,
}

/// FEATURE-INDICATE contents
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct FeatureIndicate {
    /// Feature code (7 bits)
    pub feature: u8,
    /// Status indicator
    pub status: u8,
}

/// Audio parameters of a TERMINAL-CAPABILITY (octet 3a)
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct AudioParams {
    /// Echo parameters (3 bits)
    pub echo: u8,
    /// Ambient noise rejection (2 bits)
    pub noise_rejection: u8,
    /// Adaptive volume control (2 bits)
    pub volume: u8,
}

/// Display extension of a TERMINAL-CAPABILITY (octet group 4)
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct DisplayExtension {
    /// Display memory in characters
    pub memory: u32,
    /// Display lines (3 bits)
    pub lines: u8,
    /// Display columns (4 bits)
    pub columns: u8,
}

/// TERMINAL-CAPABILITY contents
///
/// Wire layout, organized in octet groups; within a group the high bit of
/// the last octet is set, inner octets keep it clear. Groups after group 3
/// are optional but ordered.
///
/// ```text
///  group 3: o3  = G | tone capability (6-4) | display capability (3-0)
///           o3a = G | echo (6-4) | noise rejection (3-2) | volume (1-0)
///           o3b = G | slot type capability (6-0)
///  group 4: one or more display memory septets, most significant first,
///           then o4z = G | display lines (6-4) | display columns (3-0)
///  group 5: o5  = G | scrolling behaviour (2-0)
///  group 6: profile indicator septets, most significant first
///  group 7: o7  = G | control codes (3-0)
/// ```
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct TerminalCapability {
    /// Tone capability (3 bits)
    pub tone: u8,
    /// Display capability (4 bits)
    pub display: u8,
    /// Audio parameters, octet 3a
    pub audio: Option<AudioParams>,
    /// Slot type capability, octet 3b (7 bits)
    pub slot: Option<u8>,
    /// Display extension, octet group 4
    pub display_ext: Option<DisplayExtension>,
    /// Scrolling behaviour, octet group 5 (3 bits)
    pub scrolling: Option<u8>,
    /// Profile indicators, octet group 6, accumulated MSB first
    pub profile_indicators: Option<u64>,
    /// Control codes, octet group 7 (4 bits)
    pub control_codes: Option<u8>,
}

/// Presentation and screening of a CALLING-PARTY-NUMBER (octet 3a)
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct PresentationInfo {
    /// Presentation indicator (2 bits)
    pub presentation: u8,
    /// Screening indicator (2 bits)
    pub screening: u8,
}

/// CALLING-PARTY-NUMBER contents
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct CallingPartyNumber {
    /// Number type (3 bits)
    pub number_type: u8,
    /// Numbering plan identification (4 bits)
    pub npi: u8,
    /// Presentation and screening, octet 3a
    pub presentation: Option<PresentationInfo>,
    /// IA5 address digits
    pub address: Vec<u8>,
}

/// CALLED-PARTY-NUMBER contents
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct CalledPartyNumber {
    /// Number type (3 bits)
    pub number_type: u8,
    /// Numbering plan identification (4 bits)
    pub npi: u8,
    /// IA5 address digits
    pub address: Vec<u8>,
}

/// DURATION contents
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct DurationIe {
    /// Lock limits (3 bits)
    pub lock: u8,
    /// Time limits (4 bits)
    pub time: u8,
    /// Time duration in units of 2^8 frames, octet 3a
    pub duration: Option<u8>,
}

/// IWU-TO-IWU contents
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct IwuToIwu {
    /// Send/Reject bit
    pub sr: bool,
    /// Protocol discriminator (6 bits)
    pub protocol: u8,
    /// Transparent information
    pub data: Vec<u8>,
}

/// ESCAPE-TO-PROPRIETARY contents
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct EscapeToProprietary {
    /// Equipment manufacturer code
    pub emc: u16,
    /// Proprietary contents
    pub content: Vec<u8>,
}

/// One codec of a CODEC-LIST
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct Codec {
    /// Codec identifier (7 bits)
    pub codec: u8,
    /// MAC/DLC service (4 bits)
    pub service: u8,
    /// C-plane routing (3 bits) and slot size (4 bits)
    pub slot: u8,
}

/// CODEC-LIST contents
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct CodecList {
    /// Negotiation indicator (2 bits)
    pub negotiation: u8,
    /// Codecs in preference order
    pub codecs: Vec<Codec>,
}

/// NWK-ASSIGNED-IDENTITY contents; only TPUI-style values are decoded
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct NwkAssignedIdentity {
    /// Assigned identity value (20 bits)
    pub tpui: Tpui,
}

///
/// A decoded S-format information element
///
/// Every variant corresponds to one catalog entry with a codec. Parsed
/// elements are shared as `Rc<InfoElement>`; cloning the `Rc` is the hold
/// operation, dropping it the put.
///
#[derive(Clone, PartialEq, Debug)]
pub enum InfoElement {
    /// <<SHIFT>>, codeset in the value nibble
    Shift(u8),
    /// <<SENDING-COMPLETE>>
    SendingComplete,
    /// <<DELIMITER-REQUEST>>
    DelimiterRequest,
    /// <<USE-TPUI>>
    UseTpui,
    /// <<REPEAT-INDICATOR>>
    RepeatIndicator(RepeatIndicatorType),
    /// <<BASIC-SERVICE>>
    BasicService {
        /// Call class
        class: CallClass,
        /// Basic service value
        service: ServiceValue,
    },
    /// <<RELEASE-REASON>>
    ReleaseReason(ReleaseReasonCode),
    /// <<SIGNAL>>
    Signal(SignalCode),
    /// <<TIMER-RESTART>>
    TimerRestart(TimerRestartValue),
    /// <<TEST-HOOK-CONTROL>>
    TestHookControl(HookState),
    /// <<SINGLE-DISPLAY>>, one DECT standard character
    SingleDisplay(u8),
    /// <<SINGLE-KEYPAD>>, one DECT standard character
    SingleKeypad(u8),
    /// <<INFO-TYPE>>, requested parameter types
    InfoType(Vec<u8>),
    /// <<IDENTITY-TYPE>>, requested identity types
    IdentityType(Vec<u8>),
    /// <<PORTABLE-IDENTITY>>
    PortableIdentity(PortableIdentity),
    /// <<FIXED-IDENTITY>>
    FixedIdentity(FixedIdentity),
    /// <<LOCATION-AREA>>
    LocationArea(LocationArea),
    /// <<NWK-ASSIGNED-IDENTITY>>
    NwkAssignedIdentity(NwkAssignedIdentity),
    /// <<AUTH-TYPE>>
    AuthType(AuthType),
    /// <<ALLOCATION-TYPE>>
    AllocationType(AllocationType),
    /// <<RAND>>
    Rand(Vec<u8>),
    /// <<RES>>
    Res(Vec<u8>),
    /// <<RS>>
    Rs(Vec<u8>),
    /// <<CIPHER-INFO>>
    CipherInfo(CipherInfo),
    /// <<PROGRESS-INDICATOR>>
    ProgressIndicator(ProgressIndicator),
    /// <<TIME-DATE>>
    TimeDate(TimeDate),
    /// <<MULTI-DISPLAY>>, DECT standard characters
    MultiDisplay(Vec<u8>),
    /// <<MULTI-KEYPAD>>, DECT standard characters
    MultiKeypad(Vec<u8>),
    /// <<FEATURE-ACTIVATE>>
    FeatureActivate(FeatureActivate),
    /// <<FEATURE-INDICATE>>
    FeatureIndicate(FeatureIndicate),
    /// <<REJECT-REASON>>
    RejectReason(RejectReasonCode),
    /// <<TERMINAL-CAPABILITY>>
    TerminalCapability(TerminalCapability),
    /// <<CALLING-PARTY-NUMBER>>
    CallingPartyNumber(CallingPartyNumber),
    /// <<CALLED-PARTY-NUMBER>>
    CalledPartyNumber(CalledPartyNumber),
    /// <<DURATION>>
    Duration(DurationIe),
    /// <<IWU-TO-IWU>>
    IwuToIwu(IwuToIwu),
    /// <<MODEL-IDENTIFIER>>
    ModelIdentifier(Vec<u8>),
    /// <<ESCAPE-TO-PROPRIETARY>>
    EscapeToProprietary(EscapeToProprietary),
    /// <<CODEC-LIST>>
    CodecList(CodecList),
}

fn short(name: &str) -> DectError {
    DectError::new(ErrorKind::InvalidIe, format!("{}: short contents", name))
}

fn check_chars(name: &str, data: &[u8]) -> Result<()> {
    // DECT standard characters are 7 bit
    if data.iter().any(|c| *c & 0x80 != 0) {
        return Err(DectError::new(
            ErrorKind::InvalidIe,
            format!("{}: invalid character", name),
        ));
    }
    Ok(())
}

impl InfoElement {
    /// Catalog identifier of this element
    pub fn ie_type(&self) -> IeType {
        match self {
            InfoElement::Shift(_) => IeType::Shift,
            InfoElement::SendingComplete => IeType::SendingComplete,
            InfoElement::DelimiterRequest => IeType::DelimiterRequest,
            InfoElement::UseTpui => IeType::UseTpui,
            InfoElement::RepeatIndicator(_) => IeType::RepeatIndicator,
            InfoElement::BasicService { .. } => IeType::BasicService,
            InfoElement::ReleaseReason(_) => IeType::ReleaseReason,
            InfoElement::Signal(_) => IeType::Signal,
            InfoElement::TimerRestart(_) => IeType::TimerRestart,
            InfoElement::TestHookControl(_) => IeType::TestHookControl,
            InfoElement::SingleDisplay(_) => IeType::SingleDisplay,
            InfoElement::SingleKeypad(_) => IeType::SingleKeypad,
            InfoElement::InfoType(_) => IeType::InfoType,
            InfoElement::IdentityType(_) => IeType::IdentityType,
            InfoElement::PortableIdentity(_) => IeType::PortableIdentity,
            InfoElement::FixedIdentity(_) => IeType::FixedIdentity,
            InfoElement::LocationArea(_) => IeType::LocationArea,
            InfoElement::NwkAssignedIdentity(_) => IeType::NwkAssignedIdentity,
            InfoElement::AuthType(_) => IeType::AuthType,
            InfoElement::AllocationType(_) => IeType::AllocationType,
            InfoElement::Rand(_) => IeType::Rand,
            InfoElement::Res(_) => IeType::Res,
            InfoElement::Rs(_) => IeType::Rs,
            InfoElement::CipherInfo(_) => IeType::CipherInfo,
            InfoElement::ProgressIndicator(_) => IeType::ProgressIndicator,
            InfoElement::TimeDate(_) => IeType::TimeDate,
            InfoElement::MultiDisplay(_) => IeType::MultiDisplay,
            InfoElement::MultiKeypad(_) => IeType::MultiKeypad,
            InfoElement::FeatureActivate(_) => IeType::FeatureActivate,
            InfoElement::FeatureIndicate(_) => IeType::FeatureIndicate,
            InfoElement::RejectReason(_) => IeType::RejectReason,
            InfoElement::TerminalCapability(_) => IeType::TerminalCapability,
            InfoElement::CallingPartyNumber(_) => IeType::CallingPartyNumber,
            InfoElement::CalledPartyNumber(_) => IeType::CalledPartyNumber,
            InfoElement::Duration(_) => IeType::Duration,
            InfoElement::IwuToIwu(_) => IeType::IwuToIwu,
            InfoElement::ModelIdentifier(_) => IeType::ModelIdentifier,
            InfoElement::EscapeToProprietary(_) => IeType::EscapeToProprietary,
            InfoElement::CodecList(_) => IeType::CodecList,
        }
    }

    /// Logs the element through the catalog dump channel
    pub fn dump(&self) {
        log::debug!("  <<{}>> {:?}", self.ie_type().name(), self);
    }

    /// Decodes one information element.
    ///
    /// `fixed_value` carries the value nibble of single-octet IEs,
    /// `content` the value octet of double-octet IEs or the payload of
    /// variable-length IEs.
    pub fn parse(typ: IeType, fixed_value: u8, content: &[u8]) -> Result<InfoElement> {
        match typ {
            IeType::Shift => Ok(InfoElement::Shift(fixed_value & 0x07)),
            IeType::SendingComplete => Ok(InfoElement::SendingComplete),
            IeType::DelimiterRequest => Ok(InfoElement::DelimiterRequest),
            IeType::UseTpui => Ok(InfoElement::UseTpui),
            IeType::RepeatIndicator => match fixed_value {
                0x1 => Ok(InfoElement::RepeatIndicator(RepeatIndicatorType::Normal)),
                0x2 => Ok(InfoElement::RepeatIndicator(RepeatIndicatorType::Prioritized)),
                v => Err(DectError::new(
                    ErrorKind::InvalidIe,
                    format!("REPEAT-INDICATOR: unknown list type {}", v),
                )),
            },
            IeType::BasicService => {
                let octet = *content.first().ok_or_else(|| short("BASIC-SERVICE"))?;
                let class = CallClass::try_from(octet >> 4).map_err(|_| {
                    DectError::new(
                        ErrorKind::InvalidIe,
                        format!("BASIC-SERVICE: unknown call class {}", octet >> 4),
                    )
                })?;
                let service = ServiceValue::try_from(octet & 0x0f).map_err(|_| {
                    DectError::new(
                        ErrorKind::InvalidIe,
                        format!("BASIC-SERVICE: unknown service {}", octet & 0x0f),
                    )
                })?;
                Ok(InfoElement::BasicService { class, service })
            }
            IeType::ReleaseReason => {
                let octet = *content.first().ok_or_else(|| short("RELEASE-REASON"))?;
                Ok(InfoElement::ReleaseReason(ReleaseReasonCode(octet)))
            }
            IeType::Signal => {
                let octet = *content.first().ok_or_else(|| short("SIGNAL"))?;
                Ok(InfoElement::Signal(SignalCode(octet)))
            }
            IeType::TimerRestart => {
                let octet = *content.first().ok_or_else(|| short("TIMER-RESTART"))?;
                match octet {
                    0x0 => Ok(InfoElement::TimerRestart(TimerRestartValue::Restart)),
                    0x1 => Ok(InfoElement::TimerRestart(TimerRestartValue::Stop)),
                    v => Err(DectError::new(
                        ErrorKind::InvalidIe,
                        format!("TIMER-RESTART: unknown value {}", v),
                    )),
                }
            }
            IeType::TestHookControl => {
                let octet = *content.first().ok_or_else(|| short("TEST-HOOK-CONTROL"))?;
                match octet {
                    0x0 => Ok(InfoElement::TestHookControl(HookState::OnHook)),
                    0x1 => Ok(InfoElement::TestHookControl(HookState::OffHook)),
                    v => Err(DectError::new(
                        ErrorKind::InvalidIe,
                        format!("TEST-HOOK-CONTROL: unknown value {}", v),
                    )),
                }
            }
            IeType::SingleDisplay => {
                let octet = *content.first().ok_or_else(|| short("SINGLE-DISPLAY"))?;
                check_chars("SINGLE-DISPLAY", &[octet])?;
                Ok(InfoElement::SingleDisplay(octet))
            }
            IeType::SingleKeypad => {
                let octet = *content.first().ok_or_else(|| short("SINGLE-KEYPAD"))?;
                check_chars("SINGLE-KEYPAD", &[octet])?;
                Ok(InfoElement::SingleKeypad(octet))
            }
            IeType::InfoType => parse_septet_list(content, "INFO-TYPE").map(InfoElement::InfoType),
            IeType::IdentityType => {
                parse_septet_list(content, "IDENTITY-TYPE").map(InfoElement::IdentityType)
            }
            IeType::PortableIdentity => parse_portable_identity(content),
            IeType::FixedIdentity => parse_fixed_identity(content),
            IeType::LocationArea => {
                let octet = *content.first().ok_or_else(|| short("LOCATION-AREA"))?;
                Ok(InfoElement::LocationArea(LocationArea {
                    li_type: (octet >> 6) & 0x03,
                    level: octet & 0x3f,
                }))
            }
            IeType::NwkAssignedIdentity => parse_nwk_assigned_identity(content),
            IeType::AuthType => parse_auth_type(content),
            IeType::AllocationType => {
                if content.len() < 2 {
                    return Err(short("ALLOCATION-TYPE"));
                }
                Ok(InfoElement::AllocationType(AllocationType {
                    algorithm: content[0],
                    ak_num: content[1] >> 4,
                    ac_num: content[1] & 0x0f,
                }))
            }
            IeType::Rand => Ok(InfoElement::Rand(content.to_vec())),
            IeType::Res => Ok(InfoElement::Res(content.to_vec())),
            IeType::Rs => Ok(InfoElement::Rs(content.to_vec())),
            IeType::CipherInfo => {
                if content.len() < 2 {
                    return Err(short("CIPHER-INFO"));
                }
                Ok(InfoElement::CipherInfo(CipherInfo {
                    enable: content[0] & 0x40 != 0,
                    algorithm: content[0] & 0x3f,
                    key_type: content[1] >> 4,
                    key_num: content[1] & 0x0f,
                }))
            }
            IeType::ProgressIndicator => {
                if content.len() < 2 {
                    return Err(short("PROGRESS-INDICATOR"));
                }
                Ok(InfoElement::ProgressIndicator(ProgressIndicator {
                    location: content[0] & 0x0f,
                    progress: content[1] & 0x7f,
                }))
            }
            IeType::TimeDate => parse_time_date(content),
            IeType::MultiDisplay => {
                check_chars("MULTI-DISPLAY", content)?;
                Ok(InfoElement::MultiDisplay(content.to_vec()))
            }
            IeType::MultiKeypad => {
                check_chars("MULTI-KEYPAD", content)?;
                Ok(InfoElement::MultiKeypad(content.to_vec()))
            }
            IeType::FeatureActivate => {
                let feature = *content.first().ok_or_else(|| short("FEATURE-ACTIVATE"))?;
                Ok(InfoElement::FeatureActivate(FeatureActivate {
                    feature: feature & 0x7f,
                    parameter: content.get(1).copied(),
                }))
            }
            IeType::FeatureIndicate => {
                if content.len() < 2 {
                    return Err(short("FEATURE-INDICATE"));
                }
                Ok(InfoElement::FeatureIndicate(FeatureIndicate {
                    feature: content[0] & 0x7f,
                    status: content[1],
                }))
            }
            IeType::RejectReason => {
                let octet = *content.first().ok_or_else(|| short("REJECT-REASON"))?;
                Ok(InfoElement::RejectReason(RejectReasonCode(octet)))
            }
            IeType::TerminalCapability => parse_terminal_capability(content),
            IeType::CallingPartyNumber => parse_calling_party_number(content),
            IeType::CalledPartyNumber => {
                let octet = *content.first().ok_or_else(|| short("CALLED-PARTY-NUMBER"))?;
                let address = content[1..].to_vec();
                check_chars("CALLED-PARTY-NUMBER", &address)?;
                Ok(InfoElement::CalledPartyNumber(CalledPartyNumber {
                    number_type: (octet >> 4) & 0x07,
                    npi: octet & 0x0f,
                    address,
                }))
            }
            IeType::Duration => {
                let octet = *content.first().ok_or_else(|| short("DURATION"))?;
                Ok(InfoElement::Duration(DurationIe {
                    lock: (octet >> 4) & 0x07,
                    time: octet & 0x0f,
                    duration: content.get(1).copied(),
                }))
            }
            IeType::IwuToIwu => {
                let octet = *content.first().ok_or_else(|| short("IWU-TO-IWU"))?;
                Ok(InfoElement::IwuToIwu(IwuToIwu {
                    sr: octet & 0x40 != 0,
                    protocol: octet & 0x3f,
                    data: content[1..].to_vec(),
                }))
            }
            IeType::ModelIdentifier => Ok(InfoElement::ModelIdentifier(content.to_vec())),
            IeType::EscapeToProprietary => {
                if content.len() < 3 {
                    return Err(short("ESCAPE-TO-PROPRIETARY"));
                }
                if content[0] & 0x7f != 0x01 {
                    return Err(DectError::new(
                        ErrorKind::InvalidIe,
                        "ESCAPE-TO-PROPRIETARY: unknown discriminator",
                    ));
                }
                Ok(InfoElement::EscapeToProprietary(EscapeToProprietary {
                    emc: u16::from_be_bytes([content[1], content[2]]),
                    content: content[3..].to_vec(),
                }))
            }
            IeType::CodecList => parse_codec_list(content),
            other => Err(DectError::new(
                ErrorKind::InvalidIe,
                format!("<<{}>>: no codec", other.name()),
            )),
        }
    }

    /// Value nibble of a single-octet IE
    pub(crate) fn fixed_value(&self) -> u8 {
        match self {
            InfoElement::Shift(codeset) => *codeset & 0x07,
            InfoElement::RepeatIndicator(t) => *t as u8,
            _ => 0,
        }
    }

    /// Encodes the contents: the value octet of a double-octet IE or the
    /// payload of a variable-length IE. Single-octet IEs contribute their
    /// value through [`Self::fixed_value`].
    pub(crate) fn build(&self, out: &mut Vec<u8>) -> Result<()> {
        match self {
            InfoElement::Shift(_)
            | InfoElement::SendingComplete
            | InfoElement::DelimiterRequest
            | InfoElement::UseTpui
            | InfoElement::RepeatIndicator(_) => Ok(()),
            InfoElement::BasicService { class, service } => {
                out.push((*class as u8) << 4 | (*service as u8));
                Ok(())
            }
            InfoElement::ReleaseReason(code) => {
                out.push(code.0);
                Ok(())
            }
            InfoElement::Signal(code) => {
                out.push(code.0);
                Ok(())
            }
            InfoElement::TimerRestart(v) => {
                out.push(*v as u8);
                Ok(())
            }
            InfoElement::TestHookControl(v) => {
                out.push(*v as u8);
                Ok(())
            }
            InfoElement::SingleDisplay(c) => {
                check_chars("SINGLE-DISPLAY", &[*c])?;
                out.push(*c);
                Ok(())
            }
            InfoElement::SingleKeypad(c) => {
                check_chars("SINGLE-KEYPAD", &[*c])?;
                out.push(*c);
                Ok(())
            }
            InfoElement::InfoType(types) => build_septet_list(types, "INFO-TYPE", out),
            InfoElement::IdentityType(types) => build_septet_list(types, "IDENTITY-TYPE", out),
            InfoElement::PortableIdentity(id) => build_portable_identity(id, out),
            InfoElement::FixedIdentity(id) => build_fixed_identity(id, out),
            InfoElement::LocationArea(la) => {
                out.push((la.li_type & 0x03) << 6 | la.level & 0x3f);
                Ok(())
            }
            InfoElement::NwkAssignedIdentity(nwk) => {
                out.push(0x80 | 0x01);
                out.push(0x80 | 20);
                nwk.tpui.pack(out);
                Ok(())
            }
            InfoElement::AuthType(at) => {
                out.push(at.algorithm);
                out.push((at.ak_type & 0x0f) << 4 | 0x08 | at.ak_num & 0x07);
                let mut flags = at.cipher_key_num & 0x0f;
                if at.inc {
                    flags |= 0x80;
                }
                if at.def {
                    flags |= 0x40;
                }
                if at.txc {
                    flags |= 0x20;
                }
                if at.upc {
                    flags |= 0x10;
                }
                out.push(flags);
                if at.def {
                    let index = at.default_cipher_key_index.ok_or_else(|| {
                        DectError::new(
                            ErrorKind::InvalidIe,
                            "AUTH-TYPE: DEF set without default cipher key index",
                        )
                    })?;
                    out.extend(index.to_be_bytes());
                }
                Ok(())
            }
            InfoElement::AllocationType(at) => {
                out.push(at.algorithm);
                out.push((at.ak_num & 0x0f) << 4 | at.ac_num & 0x0f);
                Ok(())
            }
            InfoElement::Rand(v) | InfoElement::Res(v) | InfoElement::Rs(v) => {
                out.extend_from_slice(v);
                Ok(())
            }
            InfoElement::CipherInfo(ci) => {
                let mut octet = 0x80 | ci.algorithm & 0x3f;
                if ci.enable {
                    octet |= 0x40;
                }
                out.push(octet);
                out.push((ci.key_type & 0x0f) << 4 | ci.key_num & 0x0f);
                Ok(())
            }
            InfoElement::ProgressIndicator(pi) => {
                out.push(0x80 | pi.location & 0x0f);
                out.push(0x80 | pi.progress & 0x7f);
                Ok(())
            }
            InfoElement::TimeDate(td) => build_time_date(td, out),
            InfoElement::MultiDisplay(chars) => {
                check_chars("MULTI-DISPLAY", chars)?;
                out.extend_from_slice(chars);
                Ok(())
            }
            InfoElement::MultiKeypad(chars) => {
                check_chars("MULTI-KEYPAD", chars)?;
                out.extend_from_slice(chars);
                Ok(())
            }
            InfoElement::FeatureActivate(fa) => {
                out.push(0x80 | fa.feature & 0x7f);
                if let Some(parameter) = fa.parameter {
                    out.push(parameter);
                }
                Ok(())
            }
            InfoElement::FeatureIndicate(fi) => {
                out.push(0x80 | fi.feature & 0x7f);
                out.push(fi.status);
                Ok(())
            }
            InfoElement::RejectReason(code) => {
                out.push(code.0);
                Ok(())
            }
            InfoElement::TerminalCapability(tc) => build_terminal_capability(tc, out),
            InfoElement::CallingPartyNumber(nb) => {
                check_chars("CALLING-PARTY-NUMBER", &nb.address)?;
                let mut octet = (nb.number_type & 0x07) << 4 | nb.npi & 0x0f;
                if nb.presentation.is_none() {
                    octet |= 0x80;
                }
                out.push(octet);
                if let Some(pi) = &nb.presentation {
                    out.push(0x80 | (pi.presentation & 0x03) << 5 | pi.screening & 0x03);
                }
                out.extend_from_slice(&nb.address);
                Ok(())
            }
            InfoElement::CalledPartyNumber(nb) => {
                check_chars("CALLED-PARTY-NUMBER", &nb.address)?;
                out.push(0x80 | (nb.number_type & 0x07) << 4 | nb.npi & 0x0f);
                out.extend_from_slice(&nb.address);
                Ok(())
            }
            InfoElement::Duration(d) => {
                out.push(0x80 | (d.lock & 0x07) << 4 | d.time & 0x0f);
                if let Some(duration) = d.duration {
                    out.push(duration);
                }
                Ok(())
            }
            InfoElement::IwuToIwu(iwu) => {
                let mut octet = 0x80 | iwu.protocol & 0x3f;
                if iwu.sr {
                    octet |= 0x40;
                }
                out.push(octet);
                out.extend_from_slice(&iwu.data);
                Ok(())
            }
            InfoElement::ModelIdentifier(data) => {
                out.extend_from_slice(data);
                Ok(())
            }
            InfoElement::EscapeToProprietary(esc) => {
                out.push(0x80 | 0x01);
                out.extend(esc.emc.to_be_bytes());
                out.extend_from_slice(&esc.content);
                Ok(())
            }
            InfoElement::CodecList(cl) => {
                out.push(0x80 | (cl.negotiation & 0x03) << 4);
                for codec in &cl.codecs {
                    out.push(codec.codec & 0x7f);
                    out.push(codec.service & 0x0f);
                    out.push(codec.slot & 0x7f);
                }
                Ok(())
            }
        }
    }
}

/*
 * A list of ext-bit terminated septets: every octet but the last keeps
 * bit 8 clear, the last sets it.
 */
fn parse_septet_list(content: &[u8], name: &str) -> Result<Vec<u8>> {
    if content.is_empty() {
        return Err(short(name));
    }
    let mut types = Vec::with_capacity(content.len());
    for (i, octet) in content.iter().enumerate() {
        types.push(octet & 0x7f);
        if octet & 0x80 != 0 {
            if i + 1 != content.len() {
                return Err(DectError::new(
                    ErrorKind::InvalidIe,
                    format!("{}: contents after final octet", name),
                ));
            }
            return Ok(types);
        }
    }
    Err(DectError::new(
        ErrorKind::InvalidIe,
        format!("{}: unterminated list", name),
    ))
}

fn build_septet_list(types: &[u8], name: &str, out: &mut Vec<u8>) -> Result<()> {
    if types.is_empty() {
        return Err(DectError::new(
            ErrorKind::InvalidIe,
            format!("{}: empty list", name),
        ));
    }
    for (i, t) in types.iter().enumerate() {
        let mut octet = t & 0x7f;
        if i + 1 == types.len() {
            octet |= 0x80;
        }
        out.push(octet);
    }
    Ok(())
}

/*
 *  PORTABLE-IDENTITY contents:
 *
 *  octet 3: |1| identity type  |
 *  octet 4: |1| length in bits |
 *  octet 5..: identity value, left-justified
 */
fn parse_portable_identity(content: &[u8]) -> Result<InfoElement> {
    if content.len() < 2 {
        return Err(short("PORTABLE-IDENTITY"));
    }
    let typ = content[0] & 0x7f;
    let bits = content[1] & 0x7f;
    let value = &content[2..];
    match typ {
        PORTABLE_ID_IPUI => {
            let ipui = Ipui::unpack(value, bits)?;
            Ok(InfoElement::PortableIdentity(PortableIdentity::Ipui(ipui)))
        }
        PORTABLE_ID_TPUI => {
            if bits != 20 {
                return Err(DectError::new(
                    ErrorKind::InvalidIe,
                    format!("PORTABLE-IDENTITY: TPUI of {} bits", bits),
                ));
            }
            let tpui = Tpui::unpack(value)?;
            Ok(InfoElement::PortableIdentity(PortableIdentity::Tpui(tpui)))
        }
        other => Err(DectError::new(
            ErrorKind::InvalidIe,
            format!("PORTABLE-IDENTITY: unknown type {:#04x}", other),
        )),
    }
}

fn build_portable_identity(id: &PortableIdentity, out: &mut Vec<u8>) -> Result<()> {
    match id {
        PortableIdentity::Ipui(ipui) => {
            out.push(0x80 | PORTABLE_ID_IPUI);
            out.push(0x80 | ipui.bits());
            ipui.pack(out);
        }
        PortableIdentity::Tpui(tpui) => {
            out.push(0x80 | PORTABLE_ID_TPUI);
            out.push(0x80 | 20);
            tpui.pack(out);
        }
    }
    Ok(())
}

/*
 *  FIXED-IDENTITY contents:
 *
 *  octet 3: |1| identity type  |
 *  octet 4: |1| length in bits |   (for a PARK: the PLI)
 *  octet 5..: ARI value, left-justified; ARI+RPN appends the RPN octet
 */
fn parse_fixed_identity(content: &[u8]) -> Result<InfoElement> {
    if content.len() < 2 {
        return Err(short("FIXED-IDENTITY"));
    }
    let typ = content[0] & 0x7f;
    let bits = content[1] & 0x7f;
    let value = &content[2..];
    match typ {
        FIXED_ID_ARI => {
            let ari = Ari::unpack(value, bits)?;
            Ok(InfoElement::FixedIdentity(FixedIdentity::Ari(ari)))
        }
        FIXED_ID_ARI_RPN => {
            if bits < 8 {
                return Err(short("FIXED-IDENTITY"));
            }
            let ari = Ari::unpack(value, bits - 8)?;
            let rpn_at = (ari.bits() as usize + 7) / 8;
            let rpn = *value
                .get(rpn_at)
                .ok_or_else(|| short("FIXED-IDENTITY"))?;
            Ok(InfoElement::FixedIdentity(FixedIdentity::AriRpn { ari, rpn }))
        }
        FIXED_ID_PARK => {
            // class A is the only ARI class with a fixed bit length; the
            // length indicator carries the PLI instead
            let ari = Ari::unpack(value, 36)?;
            Ok(InfoElement::FixedIdentity(FixedIdentity::Park(Park {
                ari,
                pli: bits,
            })))
        }
        other => Err(DectError::new(
            ErrorKind::InvalidIe,
            format!("FIXED-IDENTITY: unknown type {:#04x}", other),
        )),
    }
}

fn build_fixed_identity(id: &FixedIdentity, out: &mut Vec<u8>) -> Result<()> {
    match id {
        FixedIdentity::Ari(ari) => {
            out.push(0x80 | FIXED_ID_ARI);
            out.push(0x80 | ari.bits());
            ari.pack(out);
        }
        FixedIdentity::AriRpn { ari, rpn } => {
            out.push(0x80 | FIXED_ID_ARI_RPN);
            out.push(0x80 | (ari.bits() + 8));
            ari.pack(out);
            out.push(*rpn);
        }
        FixedIdentity::Park(park) => {
            if !matches!(park.ari, Ari::ClassA { .. }) {
                return Err(DectError::new(
                    ErrorKind::InvalidIe,
                    "FIXED-IDENTITY: PARK requires a class A ARI",
                ));
            }
            out.push(0x80 | FIXED_ID_PARK);
            out.push(0x80 | park.pli & 0x7f);
            park.ari.pack(out);
        }
    }
    Ok(())
}

fn parse_nwk_assigned_identity(content: &[u8]) -> Result<InfoElement> {
    if content.len() < 2 {
        return Err(short("NWK-ASSIGNED-IDENTITY"));
    }
    let typ = content[0] & 0x7f;
    let bits = content[1] & 0x7f;
    if typ != 0x01 || bits != 20 {
        return Err(DectError::new(
            ErrorKind::InvalidIe,
            format!("NWK-ASSIGNED-IDENTITY: unknown coding {:#04x}/{}", typ, bits),
        ));
    }
    let tpui = Tpui::unpack(&content[2..])?;
    Ok(InfoElement::NwkAssignedIdentity(NwkAssignedIdentity { tpui }))
}

/*
 *  AUTH-TYPE contents:
 *
 *  octet 3: authentication algorithm identifier
 *  octet 4: |AK type |1| AK num |
 *  octet 5: |INC|DEF|TXC|UPC| cipher key number |
 *  octets 5a,5b: default cipher key index, when DEF is set
 */
fn parse_auth_type(content: &[u8]) -> Result<InfoElement> {
    if content.len() < 3 {
        return Err(short("AUTH-TYPE"));
    }
    let def = content[2] & 0x40 != 0;
    let default_cipher_key_index = if def {
        if content.len() < 5 {
            return Err(short("AUTH-TYPE"));
        }
        Some(u16::from_be_bytes([content[3], content[4]]))
    } else {
        None
    };
    Ok(InfoElement::AuthType(AuthType {
        algorithm: content[0],
        ak_type: content[1] >> 4,
        ak_num: content[1] & 0x07,
        inc: content[2] & 0x80 != 0,
        def,
        txc: content[2] & 0x20 != 0,
        upc: content[2] & 0x10 != 0,
        cipher_key_num: content[2] & 0x0f,
        default_cipher_key_index,
    }))
}

/*
 *  TIME-DATE contents:
 *
 *  octet 3: | coding |  interpretation  |
 *  octets 4..6: BCD year, month, day      (coding includes the date part)
 *  octets 7..10: BCD hour, minute, second, time zone
 */
fn parse_time_date(content: &[u8]) -> Result<InfoElement> {
    let octet = *content.first().ok_or_else(|| short("TIME-DATE"))?;
    let coding = (octet >> 6) & 0x03;
    let interpretation = octet & 0x3f;
    let mut at = 1;
    let date = if coding & TIME_DATE_DATE != 0 {
        if content.len() < at + 3 {
            return Err(short("TIME-DATE"));
        }
        let d = [content[at], content[at + 1], content[at + 2]];
        at += 3;
        Some(d)
    } else {
        None
    };
    let time = if coding & TIME_DATE_TIME != 0 {
        if content.len() < at + 4 {
            return Err(short("TIME-DATE"));
        }
        Some([content[at], content[at + 1], content[at + 2], content[at + 3]])
    } else {
        None
    };
    if date.is_none() && time.is_none() {
        return Err(DectError::new(ErrorKind::InvalidIe, "TIME-DATE: empty coding"));
    }
    Ok(InfoElement::TimeDate(TimeDate {
        interpretation,
        date,
        time,
    }))
}

fn build_time_date(td: &TimeDate, out: &mut Vec<u8>) -> Result<()> {
    let mut coding = 0;
    if td.date.is_some() {
        coding |= TIME_DATE_DATE;
    }
    if td.time.is_some() {
        coding |= TIME_DATE_TIME;
    }
    if coding == 0 {
        return Err(DectError::new(ErrorKind::InvalidIe, "TIME-DATE: empty coding"));
    }
    out.push(coding << 6 | td.interpretation & 0x3f);
    if let Some(date) = &td.date {
        out.extend_from_slice(date);
    }
    if let Some(time) = &td.time {
        out.extend_from_slice(time);
    }
    Ok(())
}

fn parse_calling_party_number(content: &[u8]) -> Result<InfoElement> {
    let octet = *content.first().ok_or_else(|| short("CALLING-PARTY-NUMBER"))?;
    let mut at = 1;
    let presentation = if octet & 0x80 == 0 {
        let oct3a = *content.get(1).ok_or_else(|| short("CALLING-PARTY-NUMBER"))?;
        at = 2;
        Some(PresentationInfo {
            presentation: (oct3a >> 5) & 0x03,
            screening: oct3a & 0x03,
        })
    } else {
        None
    };
    let address = content[at..].to_vec();
    check_chars("CALLING-PARTY-NUMBER", &address)?;
    Ok(InfoElement::CallingPartyNumber(CallingPartyNumber {
        number_type: (octet >> 4) & 0x07,
        npi: octet & 0x0f,
        presentation,
        address,
    }))
}

/*
 * TERMINAL-CAPABILITY octet groups: within one group the high bit of the
 * last octet is set. Groups after group 3 are optional but stay in order;
 * the first octet of groups 4..7 can therefore be told apart only by
 * position, so the group index is tracked explicitly.
 */
fn parse_terminal_capability(content: &[u8]) -> Result<InfoElement> {
    let mut groups: Vec<&[u8]> = Vec::new();
    let mut start = 0;
    for (i, octet) in content.iter().enumerate() {
        if octet & 0x80 != 0 {
            groups.push(&content[start..=i]);
            start = i + 1;
        }
    }
    if start != content.len() {
        return Err(DectError::new(
            ErrorKind::InvalidIe,
            "TERMINAL-CAPABILITY: unterminated octet group",
        ));
    }
    if groups.is_empty() || groups.len() > 5 {
        return Err(DectError::new(
            ErrorKind::InvalidIe,
            format!("TERMINAL-CAPABILITY: {} octet groups", groups.len()),
        ));
    }

    // group 3: capabilities
    let g3 = groups[0];
    if g3.is_empty() || g3.len() > 3 {
        return Err(DectError::new(
            ErrorKind::InvalidIe,
            "TERMINAL-CAPABILITY: malformed group 3",
        ));
    }
    let tone = (g3[0] >> 4) & 0x07;
    let display = g3[0] & 0x0f;
    let audio = g3.get(1).map(|octet| AudioParams {
        echo: (octet >> 4) & 0x07,
        noise_rejection: (octet >> 2) & 0x03,
        volume: octet & 0x03,
    });
    let slot = g3.get(2).map(|octet| octet & 0x7f);

    let mut tc = TerminalCapability {
        tone,
        display,
        audio,
        slot,
        display_ext: None,
        scrolling: None,
        profile_indicators: None,
        control_codes: None,
    };

    for (index, group) in groups[1..].iter().enumerate() {
        match index {
            // group 4: display memory septets, then lines/columns
            0 => {
                let (last, mem) = group.split_last().unwrap();
                let mut memory: u32 = 0;
                for septet in mem {
                    memory = memory << 7 | (*septet & 0x7f) as u32;
                }
                tc.display_ext = Some(DisplayExtension {
                    memory,
                    lines: (last >> 4) & 0x07,
                    columns: last & 0x0f,
                });
            }
            // group 5: scrolling behaviour
            1 => {
                if group.len() != 1 {
                    return Err(DectError::new(
                        ErrorKind::InvalidIe,
                        "TERMINAL-CAPABILITY: malformed group 5",
                    ));
                }
                tc.scrolling = Some(group[0] & 0x07);
            }
            // group 6: profile indicators
            2 => {
                if group.len() > 8 {
                    return Err(DectError::new(
                        ErrorKind::InvalidIe,
                        "TERMINAL-CAPABILITY: oversized group 6",
                    ));
                }
                let mut profile: u64 = 0;
                for septet in *group {
                    profile = profile << 7 | (*septet & 0x7f) as u64;
                }
                tc.profile_indicators = Some(profile);
            }
            // group 7: control codes
            _ => {
                if group.len() != 1 {
                    return Err(DectError::new(
                        ErrorKind::InvalidIe,
                        "TERMINAL-CAPABILITY: malformed group 7",
                    ));
                }
                tc.control_codes = Some(group[0] & 0x0f);
            }
        }
    }
    Ok(InfoElement::TerminalCapability(tc))
}

fn push_septets(value: u64, out: &mut Vec<u8>) {
    let mut septets = Vec::new();
    let mut v = value;
    loop {
        septets.push((v & 0x7f) as u8);
        v >>= 7;
        if v == 0 {
            break;
        }
    }
    septets.reverse();
    out.extend(septets);
}

fn build_terminal_capability(tc: &TerminalCapability, out: &mut Vec<u8>) -> Result<()> {
    if (tc.scrolling.is_some() || tc.profile_indicators.is_some() || tc.control_codes.is_some())
        && tc.display_ext.is_none()
    {
        return Err(DectError::new(
            ErrorKind::InvalidIe,
            "TERMINAL-CAPABILITY: octet groups out of order",
        ));
    }
    if (tc.profile_indicators.is_some() || tc.control_codes.is_some()) && tc.scrolling.is_none() {
        return Err(DectError::new(
            ErrorKind::InvalidIe,
            "TERMINAL-CAPABILITY: octet groups out of order",
        ));
    }
    if tc.control_codes.is_some() && tc.profile_indicators.is_none() {
        return Err(DectError::new(
            ErrorKind::InvalidIe,
            "TERMINAL-CAPABILITY: octet groups out of order",
        ));
    }

    // group 3
    let o3 = (tc.tone & 0x07) << 4 | tc.display & 0x0f;
    match (tc.audio, tc.slot) {
        (None, None) => out.push(0x80 | o3),
        (Some(audio), None) => {
            out.push(o3);
            out.push(0x80 | (audio.echo & 0x07) << 4 | (audio.noise_rejection & 0x03) << 2
                | audio.volume & 0x03);
        }
        (Some(audio), Some(slot)) => {
            out.push(o3);
            out.push((audio.echo & 0x07) << 4 | (audio.noise_rejection & 0x03) << 2
                | audio.volume & 0x03);
            out.push(0x80 | slot & 0x7f);
        }
        (None, Some(_)) => {
            return Err(DectError::new(
                ErrorKind::InvalidIe,
                "TERMINAL-CAPABILITY: slot capability without audio parameters",
            ));
        }
    }

    if let Some(ext) = &tc.display_ext {
        push_septets(ext.memory as u64, out);
        out.push(0x80 | (ext.lines & 0x07) << 4 | ext.columns & 0x0f);
    }
    if let Some(scrolling) = tc.scrolling {
        out.push(0x80 | scrolling & 0x07);
    }
    if let Some(profile) = tc.profile_indicators {
        push_septets(profile, out);
        if let Some(last) = out.last_mut() {
            *last |= 0x80;
        }
    }
    if let Some(control) = tc.control_codes {
        out.push(0x80 | control & 0x0f);
    }
    Ok(())
}

fn parse_codec_list(content: &[u8]) -> Result<InfoElement> {
    let octet = *content.first().ok_or_else(|| short("CODEC-LIST"))?;
    let entries = &content[1..];
    if entries.is_empty() || entries.len() % 3 != 0 {
        return Err(DectError::new(
            ErrorKind::InvalidIe,
            format!("CODEC-LIST: {} entry octets", entries.len()),
        ));
    }
    let codecs = entries
        .chunks(3)
        .map(|chunk| Codec {
            codec: chunk[0] & 0x7f,
            service: chunk[1] & 0x0f,
            slot: chunk[2] & 0x7f,
        })
        .collect();
    Ok(InfoElement::CodecList(CodecList {
        negotiation: (octet >> 4) & 0x03,
        codecs,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn roundtrip(ie: InfoElement) {
        let mut content = Vec::new();
        ie.build(&mut content).unwrap();
        let back = InfoElement::parse(ie.ie_type(), ie.fixed_value(), &content).unwrap();
        assert_eq!(ie, back);
        let mut content2 = Vec::new();
        back.build(&mut content2).unwrap();
        assert_eq!(content, content2);
    }

    #[test]
    fn test_fixed_ie_roundtrip() {
        roundtrip(InfoElement::BasicService {
            class: CallClass::Normal,
            service: ServiceValue::BasicSpeech,
        });
        roundtrip(InfoElement::ReleaseReason(ReleaseReasonCode::NORMAL));
        roundtrip(InfoElement::Signal(SignalCode::ALERTING_PATTERN_0));
        roundtrip(InfoElement::TimerRestart(TimerRestartValue::Restart));
        roundtrip(InfoElement::TestHookControl(HookState::OffHook));
        roundtrip(InfoElement::SingleDisplay(b'A'));
        roundtrip(InfoElement::SingleKeypad(b'5'));
    }

    #[test]
    fn test_portable_identity_roundtrip() {
        roundtrip(InfoElement::PortableIdentity(PortableIdentity::Ipui(
            Ipui::N {
                emc: 0x1234,
                psn: 0x56789,
            },
        )));
        roundtrip(InfoElement::PortableIdentity(PortableIdentity::Tpui(Tpui(
            0xe1234,
        ))));
    }

    #[test]
    fn test_fixed_identity_roundtrip() {
        let ari = Ari::ClassA {
            emc: 0x1234,
            fpn: 0x1abcd,
        };
        roundtrip(InfoElement::FixedIdentity(FixedIdentity::Ari(ari.clone())));
        roundtrip(InfoElement::FixedIdentity(FixedIdentity::AriRpn {
            ari: ari.clone(),
            rpn: 0x42,
        }));
        roundtrip(InfoElement::FixedIdentity(FixedIdentity::Park(Park {
            ari,
            pli: 36,
        })));
    }

    #[test]
    fn test_auth_type_def_flag() {
        let at = AuthType {
            algorithm: 0x01,
            ak_type: 0x1,
            ak_num: 0x0,
            inc: false,
            def: true,
            txc: false,
            upc: true,
            cipher_key_num: 0x3,
            default_cipher_key_index: Some(0x1234),
        };
        let mut content = Vec::new();
        InfoElement::AuthType(at).build(&mut content).unwrap();
        // DEF adds the two index octets
        assert_eq!(content.len(), 5);
        roundtrip(InfoElement::AuthType(at));

        let at_nodef = AuthType {
            def: false,
            default_cipher_key_index: None,
            ..at
        };
        let mut content = Vec::new();
        InfoElement::AuthType(at_nodef).build(&mut content).unwrap();
        assert_eq!(content.len(), 3);
        roundtrip(InfoElement::AuthType(at_nodef));
    }

    #[test]
    fn test_time_date_codings() {
        roundtrip(InfoElement::TimeDate(TimeDate {
            interpretation: 0,
            date: Some([0x20, 0x08, 0x15]),
            time: None,
        }));
        roundtrip(InfoElement::TimeDate(TimeDate {
            interpretation: 0,
            date: None,
            time: Some([0x12, 0x30, 0x00, 0x08]),
        }));
        roundtrip(InfoElement::TimeDate(TimeDate {
            interpretation: 0x20,
            date: Some([0x20, 0x08, 0x15]),
            time: Some([0x12, 0x30, 0x00, 0x08]),
        }));
    }

    #[test]
    fn test_terminal_capability_octet_groups() {
        roundtrip(InfoElement::TerminalCapability(TerminalCapability {
            tone: 0x3,
            display: 0x4,
            audio: None,
            slot: None,
            display_ext: None,
            scrolling: None,
            profile_indicators: None,
            control_codes: None,
        }));
        roundtrip(InfoElement::TerminalCapability(TerminalCapability {
            tone: 0x3,
            display: 0x4,
            audio: Some(AudioParams {
                echo: 0x2,
                noise_rejection: 0x1,
                volume: 0x1,
            }),
            slot: Some(0x25),
            display_ext: Some(DisplayExtension {
                memory: 0x1ff,
                lines: 0x2,
                columns: 0xc,
            }),
            scrolling: Some(0x1),
            profile_indicators: Some(0x1234),
            control_codes: Some(0x2),
        }));
    }

    #[test]
    fn test_display_keypad_characters() {
        roundtrip(InfoElement::MultiDisplay(b"HELLO".to_vec()));
        assert!(InfoElement::parse(IeType::MultiKeypad, 0, &[b'1', 0xff]).is_err());
        assert!(InfoElement::SingleDisplay(0x80).build(&mut Vec::new()).is_err());
    }

    #[test]
    fn test_party_numbers() {
        roundtrip(InfoElement::CallingPartyNumber(CallingPartyNumber {
            number_type: 0x1,
            npi: 0x1,
            presentation: None,
            address: b"0401234567".to_vec(),
        }));
        roundtrip(InfoElement::CallingPartyNumber(CallingPartyNumber {
            number_type: 0x1,
            npi: 0x1,
            presentation: Some(PresentationInfo {
                presentation: 0x1,
                screening: 0x3,
            }),
            address: b"0401234567".to_vec(),
        }));
        roundtrip(InfoElement::CalledPartyNumber(CalledPartyNumber {
            number_type: 0x0,
            npi: 0x9,
            address: b"112".to_vec(),
        }));
    }

    #[test]
    fn test_misc_roundtrips() {
        roundtrip(InfoElement::LocationArea(LocationArea {
            li_type: 0x1,
            level: 0x24,
        }));
        roundtrip(InfoElement::NwkAssignedIdentity(NwkAssignedIdentity {
            tpui: Tpui(0xe0042),
        }));
        roundtrip(InfoElement::AllocationType(AllocationType {
            algorithm: 0x01,
            ak_num: 0x8,
            ac_num: 0x7,
        }));
        roundtrip(InfoElement::Rand(vec![0xde, 0xad, 0xbe, 0xef, 1, 2, 3, 4]));
        roundtrip(InfoElement::Rs(vec![0; 8]));
        roundtrip(InfoElement::CipherInfo(CipherInfo {
            enable: true,
            algorithm: 0x01,
            key_type: 0x9,
            key_num: 0x0,
        }));
        roundtrip(InfoElement::ProgressIndicator(ProgressIndicator {
            location: 0x0,
            progress: 0x08,
        }));
        roundtrip(InfoElement::FeatureActivate(FeatureActivate {
            feature: 0x42,
            parameter: Some(0x07),
        }));
        roundtrip(InfoElement::FeatureIndicate(FeatureIndicate {
            feature: 0x42,
            status: 0x80,
        }));
        roundtrip(InfoElement::RejectReason(RejectReasonCode::IPUI_UNKNOWN));
        roundtrip(InfoElement::Duration(DurationIe {
            lock: 0x6,
            time: 0x1,
            duration: Some(0x10),
        }));
        roundtrip(InfoElement::IwuToIwu(IwuToIwu {
            sr: true,
            protocol: 0x02,
            data: vec![1, 2, 3],
        }));
        roundtrip(InfoElement::ModelIdentifier(vec![0x01, 0x02]));
        roundtrip(InfoElement::EscapeToProprietary(EscapeToProprietary {
            emc: 0x1234,
            content: vec![0xaa, 0xbb],
        }));
        roundtrip(InfoElement::CodecList(CodecList {
            negotiation: 0x1,
            codecs: vec![
                Codec {
                    codec: 0x1,
                    service: 0x0,
                    slot: 0x0,
                },
                Codec {
                    codec: 0x3,
                    service: 0x1,
                    slot: 0x4,
                },
            ],
        }));
        roundtrip(InfoElement::InfoType(vec![0x20, 0x21]));
        roundtrip(InfoElement::IdentityType(vec![0x00, 0x10]));
    }

    #[test]
    fn test_rc_sharing() {
        let ie = Rc::new(InfoElement::SingleDisplay(b'X'));
        let held = ie.clone();
        assert_eq!(Rc::strong_count(&ie), 2);
        drop(held);
        assert_eq!(Rc::strong_count(&ie), 1);
    }

    #[test]
    fn test_catalog_lookup() {
        assert_eq!(IeType::id_of(0xd1), 0xd0);
        assert_eq!(IeType::id_of(0xe0), 0xe0);
        assert_eq!(IeType::id_of(0xa1), 0xa1);
        assert_eq!(IeType::id_of(0x77), 0x77);
        assert_eq!(IeType::from_id(0xd0), Some(IeType::RepeatIndicator));
        assert_eq!(IeType::from_id(0x05), Some(IeType::PortableIdentity));
        assert_eq!(IeType::from_id(0x33), None);
        assert_eq!(IeType::PortableIdentity.framing(), IeFraming::Variable);
        assert_eq!(IeType::BasicService.framing(), IeFraming::Double);
        assert_eq!(IeType::RepeatIndicator.framing(), IeFraming::Single);
        assert_eq!(IeType::TerminalCapability.name(), "TERMINAL-CAPABILITY");
    }
}
