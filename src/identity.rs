//! DECT identities (ETSI EN 300 175-6)
//!
//! Value types for the identities carried by the PORTABLE-IDENTITY,
//! FIXED-IDENTITY and NWK-ASSIGNED-IDENTITY information elements. The wire
//! codecs pack the identity bit fields big-endian and left-justified, the
//! way the length-indicator octet of the carrying IE expects them.

use serde::Serialize;

use crate::tools::error::{DectError, ErrorKind, Result};

/// Portable User Type of an IPUI
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum IpuiPut {
    /// IPEI based identity (16 bit EMC + 20 bit PSN)
    N = 0x0,
    /// Private identity, number assigned by the FP
    O = 0x1,
    /// Public identity, derived from an ISDN number
    P = 0x2,
    /// Public identity, PSTN or ISDN
    Q = 0x3,
    /// Public identity, derived from an IMSI
    R = 0x4,
    /// Private identity, number individually assigned
    S = 0x5,
    /// Private extended identity
    T = 0x6,
    /// Public identity, general purpose
    U = 0x7,
}

impl TryFrom<u8> for IpuiPut {
    type Error = ();

    fn try_from(v: u8) -> std::result::Result<Self, Self::Error> {
        match v {
            x if x == IpuiPut::N as u8 => Ok(IpuiPut::N),
            x if x == IpuiPut::O as u8 => Ok(IpuiPut::O),
            x if x == IpuiPut::P as u8 => Ok(IpuiPut::P),
            x if x == IpuiPut::Q as u8 => Ok(IpuiPut::Q),
            x if x == IpuiPut::R as u8 => Ok(IpuiPut::R),
            x if x == IpuiPut::S as u8 => Ok(IpuiPut::S),
            x if x == IpuiPut::T as u8 => Ok(IpuiPut::T),
            x if x == IpuiPut::U as u8 => Ok(IpuiPut::U),
            _ => Err(()),
        }
    }
}

/// International Portable User Identity
///
/// PUT N carries an IPEI and is fully decoded. The remaining PUTs keep
/// their PUN as a left-justified bit string.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub enum Ipui {
    /// PUT N: IPEI = Equipment Manufacturer Code + Portable Serial Number
    N {
        /// Equipment Manufacturer Code (16 bits)
        emc: u16,
        /// Portable Serial Number (20 bits)
        psn: u32,
    },
    /// Any other PUT, PUN kept as raw bits
    Raw {
        /// Portable User Type
        put: IpuiPut,
        /// PUN value, left-justified
        pun: Vec<u8>,
        /// Number of valid PUN bits
        bits: u8,
    },
}

impl Ipui {
    /// Total length of the identity value in bits, PUT included
    pub fn bits(&self) -> u8 {
        match self {
            Ipui::N { .. } => 40,
            Ipui::Raw { bits, .. } => 4 + bits,
        }
    }

    /// Portable User Type
    pub fn put(&self) -> IpuiPut {
        match self {
            Ipui::N { .. } => IpuiPut::N,
            Ipui::Raw { put, .. } => *put,
        }
    }

    /// Packs the identity value, left-justified
    ///
    /// PUT N layout:
    ///
    /// ```text
    ///  octet 0: PUT(4) | EMC bits 15..12
    ///  octet 1: EMC bits 11..4
    ///  octet 2: EMC bits 3..0 | PSN bits 19..16
    ///  octet 3: PSN bits 15..8
    ///  octet 4: PSN bits 7..0
    /// ```
    pub fn pack(&self, out: &mut Vec<u8>) {
        match self {
            Ipui::N { emc, psn } => {
                out.push((IpuiPut::N as u8) << 4 | (emc >> 12) as u8);
                out.push((emc >> 4) as u8);
                out.push(((emc << 4) as u8 & 0xf0) | ((psn >> 16) as u8 & 0x0f));
                out.push((psn >> 8) as u8);
                out.push(*psn as u8);
            }
            Ipui::Raw { put, pun, bits } => {
                let mut first = (*put as u8) << 4;
                if *bits > 0 && !pun.is_empty() {
                    first |= (pun[0] >> 4) & 0x0f;
                }
                out.push(first);
                // shift the PUN left by the 4 bits consumed by the PUT
                for i in 0..pun.len() {
                    let hi = (pun[i] << 4) & 0xf0;
                    let lo = match pun.get(i + 1) {
                        Some(next) => (next >> 4) & 0x0f,
                        None => 0,
                    };
                    let octet = hi | lo;
                    if (i + 1) * 8 < 4 + *bits as usize {
                        out.push(octet);
                    }
                }
            }
        }
    }

    /// Unpacks an identity value of `bits` bits
    pub fn unpack(data: &[u8], bits: u8) -> Result<Ipui> {
        if bits < 4 || data.len() * 8 < bits as usize {
            return Err(DectError::new(
                ErrorKind::Truncated,
                format!("IPUI: {} bits in {} octets", bits, data.len()),
            ));
        }
        let put = IpuiPut::try_from(data[0] >> 4)
            .map_err(|_| DectError::new(ErrorKind::InvalidIe, "IPUI: unknown PUT"))?;
        if put == IpuiPut::N {
            if bits != 40 || data.len() < 5 {
                return Err(DectError::new(
                    ErrorKind::InvalidIe,
                    format!("IPUI N: unexpected length of {} bits", bits),
                ));
            }
            let emc = ((data[0] as u16 & 0x0f) << 12)
                | (data[1] as u16) << 4
                | (data[2] as u16) >> 4;
            let psn = ((data[2] as u32 & 0x0f) << 16) | (data[3] as u32) << 8 | data[4] as u32;
            return Ok(Ipui::N { emc, psn });
        }
        // keep the PUN right behind the PUT, left-justified
        let pun_bits = bits - 4;
        let nb_octets = (pun_bits as usize + 7) / 8;
        let mut pun = Vec::with_capacity(nb_octets);
        for i in 0..nb_octets {
            let hi = (data[i] << 4) & 0xf0;
            let lo = match data.get(i + 1) {
                Some(next) => (next >> 4) & 0x0f,
                None => 0,
            };
            pun.push(hi | lo);
        }
        if pun_bits % 8 != 0 {
            if let Some(last) = pun.last_mut() {
                *last &= 0xffu8 << (8 - pun_bits % 8);
            }
        }
        Ok(Ipui::Raw {
            put,
            pun,
            bits: pun_bits,
        })
    }
}

/// Access Rights Identity
///
/// Class A is fully decoded, other classes keep their ARD as raw bits.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub enum Ari {
    /// Class A: residential and private single-cell systems
    ClassA {
        /// Equipment Manufacturer Code (16 bits)
        emc: u16,
        /// Fixed Part Number (17 bits)
        fpn: u32,
    },
    /// Classes B-E, ARD kept as raw bits
    Raw {
        /// Access Rights Class (3 bits)
        arc: u8,
        /// ARD value, left-justified
        ard: Vec<u8>,
        /// Number of valid ARD bits
        bits: u8,
    },
}

impl Ari {
    /// Total length of the identity value in bits, ARC included
    pub fn bits(&self) -> u8 {
        match self {
            Ari::ClassA { .. } => 36,
            Ari::Raw { bits, .. } => 3 + bits,
        }
    }

    /// Packs the ARI value, left-justified
    ///
    /// Class A layout:
    ///
    /// ```text
    ///  octet 0: ARC(3) | EMC bits 15..11
    ///  octet 1: EMC bits 10..3
    ///  octet 2: EMC bits 2..0 | FPN bits 16..12
    ///  octet 3: FPN bits 11..4
    ///  octet 4: FPN bits 3..0, low nibble zero
    /// ```
    pub fn pack(&self, out: &mut Vec<u8>) {
        match self {
            Ari::ClassA { emc, fpn } => {
                out.push((emc >> 11) as u8); // ARC = 0b000
                out.push((emc >> 3) as u8);
                out.push(((emc << 5) as u8 & 0xe0) | ((fpn >> 12) as u8 & 0x1f));
                out.push((fpn >> 4) as u8);
                out.push((fpn << 4) as u8 & 0xf0);
            }
            Ari::Raw { arc, ard, bits } => {
                let mut first = (*arc & 0x07) << 5;
                if *bits > 0 && !ard.is_empty() {
                    first |= (ard[0] >> 3) & 0x1f;
                }
                out.push(first);
                let total = 3 + *bits as usize;
                for i in 0..ard.len() {
                    if 8 + i * 8 >= total {
                        break;
                    }
                    let hi = (ard[i] << 5) & 0xe0;
                    let lo = match ard.get(i + 1) {
                        Some(next) => (next >> 3) & 0x1f,
                        None => 0,
                    };
                    out.push(hi | lo);
                }
            }
        }
    }

    /// Unpacks an ARI value of `bits` bits
    pub fn unpack(data: &[u8], bits: u8) -> Result<Ari> {
        if bits < 3 || data.len() * 8 < bits as usize {
            return Err(DectError::new(
                ErrorKind::Truncated,
                format!("ARI: {} bits in {} octets", bits, data.len()),
            ));
        }
        let arc = (data[0] >> 5) & 0x07;
        if arc == 0 {
            if bits != 36 || data.len() < 5 {
                return Err(DectError::new(
                    ErrorKind::InvalidIe,
                    format!("ARI class A: unexpected length of {} bits", bits),
                ));
            }
            let emc = ((data[0] as u16 & 0x1f) << 11) | (data[1] as u16) << 3 | (data[2] >> 5) as u16;
            let fpn =
                ((data[2] as u32 & 0x1f) << 12) | (data[3] as u32) << 4 | (data[4] >> 4) as u32;
            return Ok(Ari::ClassA { emc, fpn });
        }
        let ard_bits = bits - 3;
        let nb_octets = (ard_bits as usize + 7) / 8;
        let mut ard = Vec::with_capacity(nb_octets);
        for i in 0..nb_octets {
            let hi = (data[i] << 3) & 0xf8;
            let lo = match data.get(i + 1) {
                Some(next) => (next >> 5) & 0x07,
                None => 0,
            };
            ard.push(hi | lo);
        }
        if ard_bits % 8 != 0 {
            if let Some(last) = ard.last_mut() {
                *last &= 0xffu8 << (8 - ard_bits % 8);
            }
        }
        Ok(Ari::Raw {
            arc,
            ard,
            bits: ard_bits,
        })
    }
}

/// Portable Access Rights Key: an ARI prefix
///
/// The PARK Length Indicator (PLI) gives the number of relevant ARI bits a
/// PP has to match when selecting an FP.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct Park {
    /// The access rights identity
    pub ari: Ari,
    /// PARK Length Indicator
    pub pli: u8,
}

impl Park {
    /// PARK covering the full ARI
    pub fn from_ari(ari: &Ari) -> Park {
        let pli = ari.bits();
        Park {
            ari: ari.clone(),
            pli,
        }
    }
}

/// Temporary Portable User Identity (20 bits)
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct Tpui(pub u32);

impl Tpui {
    /// Individual default TPUI, derived from the low bits of the IPUI
    pub fn default_individual(ipui: &Ipui) -> Tpui {
        let low = match ipui {
            Ipui::N { psn, .. } => psn & 0xffff,
            Ipui::Raw { pun, .. } => {
                let mut v: u32 = 0;
                for octet in pun.iter().rev().take(2).rev() {
                    v = (v << 8) | *octet as u32;
                }
                v & 0xffff
            }
        };
        Tpui(0xe0000 | low)
    }

    /// Packs the 20 bit value into 3 octets, left-justified
    pub fn pack(&self, out: &mut Vec<u8>) {
        out.push((self.0 >> 12) as u8);
        out.push((self.0 >> 4) as u8);
        out.push((self.0 << 4) as u8 & 0xf0);
    }

    /// Unpacks a 20 bit TPUI
    pub fn unpack(data: &[u8]) -> Result<Tpui> {
        if data.len() < 3 {
            return Err(DectError::new(ErrorKind::Truncated, "TPUI: short value"));
        }
        Ok(Tpui((data[0] as u32) << 12
            | (data[1] as u32) << 4
            | (data[2] >> 4) as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipui_n_pack_unpack() {
        let ipui = Ipui::N {
            emc: 0x1234,
            psn: 0x6789a,
        };
        let mut buf = Vec::new();
        ipui.pack(&mut buf);
        assert_eq!(buf.len(), 5);
        let back = Ipui::unpack(&buf, ipui.bits()).unwrap();
        assert_eq!(ipui, back);
    }

    #[test]
    fn test_ipui_raw_roundtrip() {
        let ipui = Ipui::Raw {
            put: IpuiPut::O,
            pun: vec![0xab, 0xcd, 0xe0],
            bits: 20,
        };
        let mut buf = Vec::new();
        ipui.pack(&mut buf);
        let back = Ipui::unpack(&buf, ipui.bits()).unwrap();
        assert_eq!(ipui, back);
    }

    #[test]
    fn test_ari_class_a_roundtrip() {
        let ari = Ari::ClassA {
            emc: 0x0fd2,
            fpn: 0x1fa50,
        };
        let mut buf = Vec::new();
        ari.pack(&mut buf);
        assert_eq!(buf.len(), 5);
        let back = Ari::unpack(&buf, ari.bits()).unwrap();
        assert_eq!(ari, back);
    }

    #[test]
    fn test_tpui_default() {
        let ipui = Ipui::N {
            emc: 0x1234,
            psn: 0x5789a,
        };
        let tpui = Tpui::default_individual(&ipui);
        assert_eq!(tpui.0, 0xe789a);
        let mut buf = Vec::new();
        tpui.pack(&mut buf);
        assert_eq!(Tpui::unpack(&buf).unwrap(), tpui);
    }
}
