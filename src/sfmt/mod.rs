//! S-format message codec (ETSI EN 300 175-5 Annex A)
//!
//! Drives IE-level parsing and building over a message buffer, steered by
//! the per-message descriptors of [`msg`] and the IE catalog of [`ie`].
//! The handle's role selects which direction column of a descriptor
//! applies: an FP receives with the PP→FP column and transmits with the
//! FP→PP column, a PP the other way around.

pub mod ie;
pub mod mbuf;
pub mod msg;

use std::rc::Rc;

use crate::nwk::handle::DectRole;
use crate::tools::error::{DectError, ErrorKind, Result};

use self::ie::{IeFraming, IeType, InfoElement, RepeatIndicatorType};
use self::mbuf::Mbuf;
use self::msg::{IeStatus, SfmtIeDesc};

/// One information element as found on the wire
#[derive(Debug)]
pub struct RawIe<'a> {
    /// Catalog identifier
    pub id: u8,
    /// Value nibble of a single-octet IE
    pub fixed_value: u8,
    /// Contents: the value octet of a double-octet IE or the payload of a
    /// variable-length IE
    pub content: &'a [u8],
}

/// Parses one IE header at `pos`, verifying that the announced contents
/// are available. Returns the IE and the position behind it.
pub fn parse_ie_header(data: &[u8], pos: usize) -> Result<(RawIe<'_>, usize)> {
    let octet = *data
        .get(pos)
        .ok_or_else(|| DectError::new(ErrorKind::Truncated, "IE header beyond buffer"))?;
    if octet & 0x80 != 0 {
        let id = IeType::id_of(octet);
        if id & 0xf0 == 0xe0 {
            if pos + 2 > data.len() {
                return Err(DectError::new(
                    ErrorKind::Truncated,
                    "double-octet IE without value octet",
                ));
            }
            return Ok((
                RawIe {
                    id,
                    fixed_value: 0,
                    content: &data[pos + 1..pos + 2],
                },
                pos + 2,
            ));
        }
        return Ok((
            RawIe {
                id,
                fixed_value: octet & 0x0f,
                content: &data[0..0],
            },
            pos + 1,
        ));
    }

    let len = *data
        .get(pos + 1)
        .ok_or_else(|| DectError::new(ErrorKind::Truncated, "IE without length octet"))?
        as usize;
    if pos + 2 + len > data.len() {
        return Err(DectError::new(
            ErrorKind::Truncated,
            format!("IE {:#04x}: {} content octets announced", octet, len),
        ));
    }
    Ok((
        RawIe {
            id: octet,
            fixed_value: 0,
            content: &data[pos + 2..pos + 2 + len],
        },
        pos + 2 + len,
    ))
}

/// An ordered list of same-type IEs
///
/// A single-element list is sent bare; a longer list is introduced by a
/// REPEAT-INDICATOR naming its ordering policy.
#[derive(Clone, Debug)]
pub struct IeList {
    /// Ordering policy of the list
    pub ri: RepeatIndicatorType,
    items: Vec<Rc<InfoElement>>,
}

impl IeList {
    /// Number of elements
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// true when the list holds no elements
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over the elements
    pub fn iter(&self) -> std::slice::Iter<'_, Rc<InfoElement>> {
        self.items.iter()
    }

    /// First element
    pub fn first(&self) -> Option<&Rc<InfoElement>> {
        self.items.first()
    }
}

/// Parameter collection of one message
///
/// Owns one reference per contained IE; dropping the collection releases
/// them all. Entries stay in insertion order, which is wire order for a
/// parsed message.
#[derive(Clone, Debug, Default)]
pub struct IeCollection {
    entries: Vec<(IeType, IeList)>,
}

impl IeCollection {
    /// Creates an empty collection
    pub fn new() -> IeCollection {
        IeCollection {
            entries: Vec::new(),
        }
    }

    /// Adds a single IE
    pub fn add(&mut self, ie: InfoElement) {
        self.add_held(Rc::new(ie));
    }

    /// Adds a reference to an already parsed IE
    pub fn add_held(&mut self, ie: Rc<InfoElement>) {
        self.push(ie.ie_type(), None, ie);
    }

    /// Adds a repeated list
    pub fn add_list(&mut self, ri: RepeatIndicatorType, ies: Vec<InfoElement>) {
        for ie in ies {
            self.push(ie.ie_type(), Some(ri), Rc::new(ie));
        }
    }

    fn push(&mut self, typ: IeType, ri: Option<RepeatIndicatorType>, ie: Rc<InfoElement>) {
        if let Some((_, list)) = self.entries.iter_mut().find(|(t, _)| *t == typ) {
            if let Some(ri) = ri {
                list.ri = ri;
            }
            list.items.push(ie);
            return;
        }
        self.entries.push((
            typ,
            IeList {
                ri: ri.unwrap_or(RepeatIndicatorType::Normal),
                items: vec![ie],
            },
        ));
    }

    /// First IE of the entry matching `typ`
    pub fn get(&self, typ: IeType) -> Option<&Rc<InfoElement>> {
        self.list(typ).and_then(|list| list.first())
    }

    /// The list stored for `typ`
    pub fn list(&self, typ: IeType) -> Option<&IeList> {
        self.entries
            .iter()
            .find(|(t, _)| *t == typ)
            .map(|(_, list)| list)
    }

    /// Iterates over all entries
    pub fn entries(&self) -> std::slice::Iter<'_, (IeType, IeList)> {
        self.entries.iter()
    }

    /// Total number of IE references held
    pub fn ie_count(&self) -> usize {
        self.entries.iter().map(|(_, list)| list.len()).sum()
    }

    fn lookup_slot(&self, slot: IeType) -> Option<&IeList> {
        self.entries
            .iter()
            .find(|(t, _)| slot_matches(slot, *t))
            .map(|(_, list)| list)
    }
}

/// Descriptor status in receive direction for `role`
fn rx_status(role: DectRole, desc: &SfmtIeDesc) -> IeStatus {
    match role {
        DectRole::Fp => desc.pp_fp,
        DectRole::Pp => desc.fp_pp,
    }
}

/// Descriptor status in transmit direction for `role`
fn tx_status(role: DectRole, desc: &SfmtIeDesc) -> IeStatus {
    match role {
        DectRole::Fp => desc.fp_pp,
        DectRole::Pp => desc.pp_fp,
    }
}

/// A SINGLE-DISPLAY slot also accepts MULTI-DISPLAY, keypad analogously
fn slot_matches(slot: IeType, wire: IeType) -> bool {
    slot == wire
        || (slot == IeType::SingleDisplay && wire == IeType::MultiDisplay)
        || (slot == IeType::SingleKeypad && wire == IeType::MultiKeypad)
}

///
/// Parses the IE stream of a message into a parameter collection.
///
/// The descriptor is walked in step with the wire: mismatching optional
/// slots are passed over, a mismatch against a mandatory slot fails with
/// `MandatoryIeMissing`, a corrupt mandatory IE with `MandatoryIeError`.
/// Corrupt optional IEs and IEs unknown to the descriptor are dropped.
/// An empty variable-length IE counts as absent.
///
pub fn parse_message(
    role: DectRole,
    desc: &[SfmtIeDesc],
    mb: &Mbuf,
) -> Result<IeCollection> {
    let data = mb.data();
    let mut col = IeCollection::new();
    let mut filled = vec![false; desc.len()];
    let mut pending_ri: Option<RepeatIndicatorType> = None;
    let mut cursor = 0;
    let mut pos = 0;

    while pos < data.len() {
        let (raw, next) = parse_ie_header(data, pos)?;
        pos = next;

        let typ = match IeType::from_id(raw.id) {
            Some(typ) => typ,
            None => {
                log::debug!("skipping unknown IE {:#04x}", raw.id);
                continue;
            }
        };

        if typ == IeType::RepeatIndicator {
            match InfoElement::parse(typ, raw.fixed_value, raw.content) {
                Ok(InfoElement::RepeatIndicator(ri)) => pending_ri = Some(ri),
                _ => log::debug!("dropping malformed <<REPEAT-INDICATOR>>"),
            }
            continue;
        }

        let empty = typ.framing() == IeFraming::Variable && raw.content.is_empty();

        // scan forward from the cursor; the cursor itself only moves when
        // a slot takes the IE, so an IE foreign to this message leaves
        // the walk where it was
        let mut scan = cursor;
        loop {
            if scan >= desc.len() {
                log::debug!("skipping unexpected <<{}>>", typ.name());
                break;
            }
            let entry = &desc[scan];
            let status = rx_status(role, entry);

            if !slot_matches(entry.ie, typ) {
                if status == IeStatus::Mandatory && !filled[scan] {
                    return Err(DectError::new(
                        ErrorKind::MandatoryIeMissing,
                        format!("<<{}>> missing", entry.ie.name()),
                    ));
                }
                scan += 1;
                continue;
            }

            if status == IeStatus::None {
                // IE not allowed in this direction
                return Err(DectError::new(
                    ErrorKind::InvalidIe,
                    format!("<<{}>> not allowed in this direction", typ.name()),
                ));
            }

            if empty {
                cursor = scan + 1;
                break;
            }

            match InfoElement::parse(typ, raw.fixed_value, raw.content) {
                Ok(parsed) => {
                    parsed.dump();
                    let ri = match entry.repeat {
                        true => pending_ri.take(),
                        false => None,
                    };
                    col.push(typ, ri, Rc::new(parsed));
                    filled[scan] = true;
                    cursor = match entry.repeat {
                        true => scan,
                        false => scan + 1,
                    };
                }
                Err(e) => {
                    if status == IeStatus::Mandatory {
                        return Err(DectError::new(
                            ErrorKind::MandatoryIeError,
                            format!("<<{}>>: {}", typ.name(), e),
                        ));
                    }
                    log::debug!("dropping corrupt optional <<{}>>", typ.name());
                    cursor = scan + 1;
                }
            }
            break;
        }
    }

    for (i, entry) in desc.iter().enumerate() {
        if rx_status(role, entry) == IeStatus::Mandatory && !filled[i] {
            return Err(DectError::new(
                ErrorKind::MandatoryIeMissing,
                format!("<<{}>> missing", entry.ie.name()),
            ));
        }
    }

    Ok(col)
}

///
/// Serializes a parameter collection into the IE stream of a message.
///
/// IEs are emitted in descriptor order. A repeated list of two or more
/// elements is introduced by a REPEAT-INDICATOR; a single-element list is
/// sent bare. A missing mandatory IE fails with `MandatoryIeMissing`, an
/// IE the descriptor forbids in this direction with `InvalidIe`.
///
pub fn build_message(
    role: DectRole,
    desc: &[SfmtIeDesc],
    col: &IeCollection,
    mb: &mut Mbuf,
) -> Result<()> {
    let mut emitted = 0;

    for entry in desc {
        let status = tx_status(role, entry);
        let list = match col.lookup_slot(entry.ie) {
            Some(list) => list,
            None => {
                if status == IeStatus::Mandatory {
                    return Err(DectError::new(
                        ErrorKind::MandatoryIeMissing,
                        format!("<<{}>> missing", entry.ie.name()),
                    ));
                }
                continue;
            }
        };

        if status == IeStatus::None {
            return Err(DectError::new(
                ErrorKind::InvalidIe,
                format!("<<{}>> not allowed in this direction", entry.ie.name()),
            ));
        }
        if !entry.repeat && list.len() > 1 {
            return Err(DectError::new(
                ErrorKind::InvalidIe,
                format!("<<{}>> repeated in a non-repeatable slot", entry.ie.name()),
            ));
        }

        if entry.repeat && list.len() >= 2 {
            emit_ie(&InfoElement::RepeatIndicator(list.ri), mb)?;
        }
        for item in list.iter() {
            emit_ie(item, mb)?;
        }
        emitted += 1;
    }

    if emitted != col.entries.len() {
        return Err(DectError::new(
            ErrorKind::InvalidIe,
            "collection holds IEs the message cannot carry",
        ));
    }
    Ok(())
}

/// Emits one IE with its framing
fn emit_ie(ie: &InfoElement, mb: &mut Mbuf) -> Result<()> {
    let typ = ie.ie_type();
    let id = typ as u8;
    match typ.framing() {
        IeFraming::Single => mb.push(id | ie.fixed_value() & 0x0f),
        IeFraming::Double => {
            let mut content = Vec::with_capacity(1);
            ie.build(&mut content)?;
            mb.push(id)?;
            mb.push(content[0])
        }
        IeFraming::Variable => {
            let mut content = Vec::new();
            ie.build(&mut content)?;
            if content.len() > u8::MAX as usize {
                return Err(DectError::new(
                    ErrorKind::InvalidIe,
                    format!("<<{}>>: {} content octets", typ.name(), content.len()),
                ));
            }
            mb.push(id)?;
            mb.push(content.len() as u8)?;
            mb.append(&content)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ie::*;
    use super::msg::CcMsgType;
    use super::*;
    use crate::identity::{Ari, Ipui, Park};

    fn init() {
        env_logger::builder().is_test(true).try_init().ok();
    }

    fn setup_collection() -> IeCollection {
        let mut col = IeCollection::new();
        col.add(InfoElement::PortableIdentity(PortableIdentity::Ipui(
            Ipui::N {
                emc: 0x1234,
                psn: 0x56789,
            },
        )));
        col.add(InfoElement::FixedIdentity(FixedIdentity::Park(
            Park::from_ari(&Ari::ClassA {
                emc: 0x1234,
                fpn: 0x00042,
            }),
        )));
        col.add(InfoElement::BasicService {
            class: CallClass::Normal,
            service: ServiceValue::BasicSpeech,
        });
        col
    }

    #[test]
    fn test_message_roundtrip() {
        init();
        let col = setup_collection();
        let mut mb = Mbuf::new();
        build_message(DectRole::Pp, CcMsgType::Setup.desc(), &col, &mut mb).unwrap();

        let parsed = parse_message(DectRole::Fp, CcMsgType::Setup.desc(), &mb).unwrap();
        assert_eq!(parsed.ie_count(), 3);
        assert!(matches!(
            parsed.get(IeType::BasicService).map(|ie| ie.as_ref()),
            Some(InfoElement::BasicService { .. })
        ));

        // rebuild reproduces the byte stream
        let mut mb2 = Mbuf::new();
        build_message(DectRole::Pp, CcMsgType::Setup.desc(), &parsed, &mut mb2).unwrap();
        assert_eq!(mb.data(), mb2.data());
    }

    #[test]
    fn test_mandatory_ie_missing() {
        init();
        let mut col = setup_collection();
        let mut mb = Mbuf::new();
        // no PORTABLE-IDENTITY on the wire
        col.entries.retain(|(t, _)| *t != IeType::PortableIdentity);
        let err = build_message(DectRole::Pp, CcMsgType::Setup.desc(), &col, &mut mb)
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::MandatoryIeMissing);
    }

    #[test]
    fn test_direction_policing() {
        init();
        // SIGNAL is FP to PP only
        let mut col = setup_collection();
        col.add(InfoElement::Signal(SignalCode::DIAL_TONE_ON));
        let mut mb = Mbuf::new();
        let err = build_message(DectRole::Pp, CcMsgType::Setup.desc(), &col, &mut mb)
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidIe);

        // and is rejected when a PP receives one
        let col = setup_collection();
        let mut mb = Mbuf::new();
        build_message(DectRole::Fp, CcMsgType::Setup.desc(), &col, &mut mb).unwrap();
        mb.push(IeType::Signal as u8).unwrap();
        mb.push(SignalCode::DIAL_TONE_ON.0).unwrap();
        assert!(parse_message(DectRole::Fp, CcMsgType::Setup.desc(), &mb).is_err());
    }

    #[test]
    fn test_empty_variable_ie_absent() {
        init();
        let col = setup_collection();
        let mut mb = Mbuf::new();
        build_message(DectRole::Pp, CcMsgType::Setup.desc(), &col, &mut mb).unwrap();
        // terminal capability with length zero
        mb.push(IeType::TerminalCapability as u8).unwrap();
        mb.push(0).unwrap();
        // followed by a regular IE further down the descriptor
        mb.push(IeType::IwuToIwu as u8).unwrap();
        mb.push(2).unwrap();
        mb.append(&[0x82, 0x55]).unwrap();

        let parsed = parse_message(DectRole::Fp, CcMsgType::Setup.desc(), &mb).unwrap();
        assert!(parsed.get(IeType::TerminalCapability).is_none());
        assert!(parsed.get(IeType::IwuToIwu).is_some());
    }

    #[test]
    fn test_repeat_list() {
        init();
        let mut col = setup_collection();
        col.add_list(
            RepeatIndicatorType::Normal,
            vec![
                InfoElement::IwuToIwu(IwuToIwu {
                    sr: true,
                    protocol: 0x02,
                    data: vec![1],
                }),
                InfoElement::IwuToIwu(IwuToIwu {
                    sr: true,
                    protocol: 0x02,
                    data: vec![2],
                }),
            ],
        );
        let mut mb = Mbuf::new();
        build_message(DectRole::Pp, CcMsgType::Setup.desc(), &col, &mut mb).unwrap();

        // the repeat indicator precedes the list on the wire
        let stream = mb.data();
        let ri_at = stream
            .iter()
            .position(|b| *b == (IeType::RepeatIndicator as u8 | RepeatIndicatorType::Normal as u8))
            .unwrap();
        assert_eq!(stream[ri_at + 1], IeType::IwuToIwu as u8);

        let parsed = parse_message(DectRole::Fp, CcMsgType::Setup.desc(), &mb).unwrap();
        let list = parsed.list(IeType::IwuToIwu).unwrap();
        assert_eq!(list.len(), 2);
        assert!(matches!(
            list.iter().next().unwrap().as_ref(),
            InfoElement::IwuToIwu(IwuToIwu { data, .. }) if data == &vec![1]
        ));

        let mut mb2 = Mbuf::new();
        build_message(DectRole::Pp, CcMsgType::Setup.desc(), &parsed, &mut mb2).unwrap();
        assert_eq!(mb.data(), mb2.data());
    }

    #[test]
    fn test_single_element_list_without_indicator() {
        init();
        let mut col = setup_collection();
        col.add(InfoElement::IwuToIwu(IwuToIwu {
            sr: false,
            protocol: 0x02,
            data: vec![7],
        }));
        let mut mb = Mbuf::new();
        build_message(DectRole::Pp, CcMsgType::Setup.desc(), &col, &mut mb).unwrap();
        assert!(!mb
            .data()
            .iter()
            .any(|b| *b & 0xf0 == IeType::RepeatIndicator as u8));
        let parsed = parse_message(DectRole::Fp, CcMsgType::Setup.desc(), &mb).unwrap();
        assert_eq!(parsed.list(IeType::IwuToIwu).unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_optional_dropped() {
        init();
        let col = setup_collection();
        let mut mb = Mbuf::new();
        build_message(DectRole::Fp, CcMsgType::Setup.desc(), &col, &mut mb).unwrap();
        // single display with an out-of-range character
        mb.push(IeType::SingleDisplay as u8).unwrap();
        mb.push(0xff).unwrap();
        let parsed = parse_message(DectRole::Pp, CcMsgType::Setup.desc(), &mb).unwrap();
        assert!(parsed.get(IeType::SingleDisplay).is_none());
        assert_eq!(parsed.ie_count(), 3);
    }

    #[test]
    fn test_multi_display_in_single_slot() {
        init();
        let col = setup_collection();
        let mut mb = Mbuf::new();
        build_message(DectRole::Fp, CcMsgType::Setup.desc(), &col, &mut mb).unwrap();
        mb.push(IeType::MultiDisplay as u8).unwrap();
        mb.push(2).unwrap();
        mb.append(b"OK").unwrap();
        let parsed = parse_message(DectRole::Pp, CcMsgType::Setup.desc(), &mb).unwrap();
        assert!(matches!(
            parsed.get(IeType::MultiDisplay).map(|ie| ie.as_ref()),
            Some(InfoElement::MultiDisplay(chars)) if chars == b"OK"
        ));
    }

    #[test]
    fn test_truncated_header() {
        init();
        // variable-length IE announcing more content than present
        let data = [IeType::Rand as u8, 4, 1, 2];
        let err = parse_ie_header(&data, 0).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Truncated);
    }
}
