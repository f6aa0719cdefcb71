//! Kernel DECT socket family access
//!
//! The stack never drives I/O itself; it opens channels here, hands their
//! file descriptors to the application's event loop and writes outbound
//! frames synchronously. [`KernelTransport`] talks to the AF_DECT socket
//! family of the DECT kernel patches; [`QueueTransport`] keeps frames in
//! memory for tests and loopback setups.

use std::cell::RefCell;
use std::os::unix::io::RawFd;
use std::rc::Rc;

use crate::identity::Ipui;
use crate::tools::error::Result;

/// Address family of the out-of-tree DECT kernel patches
pub const AF_DECT: libc::c_int = 38;

/// Signaling SAP, datagram semantics
pub const DECT_SAP_S: u8 = 0;
/// LU1 U-plane SAP, stream semantics
pub const DECT_SAP_LU1: u8 = 1;

/// Data link endpoint identifier: one signaling association
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Dlei {
    /// Portable identity of the peer
    pub ipui: Ipui,
}

/// U-plane link endpoint identifier, derived from the owning call's
/// transaction
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Ulei {
    /// Portable identity of the peer
    pub ipui: Ipui,
    /// Transaction value of the owning call
    pub tv: u8,
}

impl Ulei {
    /// Packs the endpoint identifier for the kernel address layout
    fn encode(&self) -> u32 {
        let mut value = Vec::new();
        self.ipui.pack(&mut value);
        let mut hash: u32 = 0;
        for octet in value {
            hash = hash.rotate_left(8) ^ octet as u32;
        }
        hash << 4 | (self.tv & 0x0f) as u32
    }
}

/// One open channel towards the kernel or a test fixture
pub trait LinkChannel: std::fmt::Debug {
    /// Writes one outbound frame
    fn write(&self, data: &[u8]) -> Result<usize>;

    /// File descriptor to register with the event loop, if any
    fn raw_fd(&self) -> Option<RawFd>;
}

/// Channel factory: one signaling channel per data link, one U-plane
/// channel per call
pub trait LinkTransport: std::fmt::Debug {
    /// Opens the signaling (S SAP) channel of a data link
    fn open_signaling(&self, dlei: &Dlei) -> Result<Box<dyn LinkChannel>>;

    /// Opens the U-plane (LU1 SAP) channel of a call
    fn open_uplane(&self, ulei: &Ulei) -> Result<Box<dyn LinkChannel>>;
}

/*
 * struct sockaddr_dect of the kernel patches; dect_ulei selects the
 * U-plane endpoint on the LU1 SAP and is ignored on the S SAP. The
 * fields are only ever read by the kernel.
 */
#[repr(C)]
#[allow(dead_code)]
struct SockaddrDect {
    sd_family: libc::sa_family_t,
    sd_sap: u8,
    sd_pad: u8,
    sd_ulei: u32,
}

/// A connected AF_DECT socket
pub struct DectSocket {
    fd: RawFd,
}

impl DectSocket {
    fn open(sap: u8, socktype: libc::c_int, ulei: u32) -> Result<DectSocket> {
        let fd = unsafe { libc::socket(AF_DECT, socktype | libc::SOCK_NONBLOCK, 0) };
        if fd < 0 {
            return Err(std::io::Error::last_os_error().into());
        }
        let addr = SockaddrDect {
            sd_family: AF_DECT as libc::sa_family_t,
            sd_sap: sap,
            sd_pad: 0,
            sd_ulei: ulei,
        };
        let ret = unsafe {
            libc::connect(
                fd,
                &addr as *const SockaddrDect as *const libc::sockaddr,
                std::mem::size_of::<SockaddrDect>() as libc::socklen_t,
            )
        };
        if ret < 0 {
            let err = std::io::Error::last_os_error();
            unsafe { libc::close(fd) };
            return Err(err.into());
        }
        Ok(DectSocket { fd })
    }
}

impl Drop for DectSocket {
    fn drop(&mut self) {
        unsafe { libc::close(self.fd) };
    }
}

impl std::fmt::Debug for DectSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DectSocket {{ fd: {} }}", self.fd)
    }
}

impl LinkChannel for DectSocket {
    fn write(&self, data: &[u8]) -> Result<usize> {
        let ret = unsafe {
            libc::send(
                self.fd,
                data.as_ptr() as *const libc::c_void,
                data.len(),
                0,
            )
        };
        if ret < 0 {
            return Err(std::io::Error::last_os_error().into());
        }
        Ok(ret as usize)
    }

    fn raw_fd(&self) -> Option<RawFd> {
        Some(self.fd)
    }
}

/// Reads one datagram from a registered descriptor
pub fn fd_recv(fd: RawFd) -> Result<Vec<u8>> {
    let mut buf = [0u8; 256];
    let ret = unsafe { libc::recv(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len(), 0) };
    if ret < 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    Ok(buf[..ret as usize].to_vec())
}

/// Transport over the AF_DECT socket family
#[derive(Debug, Default)]
pub struct KernelTransport {}

impl KernelTransport {
    /// Creates the kernel transport
    pub fn new() -> KernelTransport {
        KernelTransport {}
    }
}

impl LinkTransport for KernelTransport {
    fn open_signaling(&self, dlei: &Dlei) -> Result<Box<dyn LinkChannel>> {
        log::debug!("open S SAP socket for {:?}", dlei.ipui);
        let socket = DectSocket::open(DECT_SAP_S, libc::SOCK_DGRAM, 0)?;
        Ok(Box::new(socket))
    }

    fn open_uplane(&self, ulei: &Ulei) -> Result<Box<dyn LinkChannel>> {
        log::debug!("open LU1 SAP socket for tv {}", ulei.tv);
        let socket = DectSocket::open(DECT_SAP_LU1, libc::SOCK_STREAM, ulei.encode())?;
        Ok(Box::new(socket))
    }
}

/// Shared frame queue of a [`QueueTransport`] channel
pub type FrameQueue = Rc<RefCell<Vec<Vec<u8>>>>;

/// In-memory channel collecting written frames
#[derive(Debug)]
pub struct QueueChannel {
    queue: FrameQueue,
}

impl LinkChannel for QueueChannel {
    fn write(&self, data: &[u8]) -> Result<usize> {
        self.queue.borrow_mut().push(data.to_vec());
        Ok(data.len())
    }

    fn raw_fd(&self) -> Option<RawFd> {
        None
    }
}

/// In-memory transport: every opened channel appends its frames to a
/// queue shared with the creator
#[derive(Debug, Default)]
pub struct QueueTransport {
    signaling: RefCell<Vec<(Dlei, FrameQueue)>>,
    uplane: RefCell<Vec<(Ulei, FrameQueue)>>,
}

impl QueueTransport {
    /// Creates an empty transport
    pub fn new() -> Rc<QueueTransport> {
        Rc::new(QueueTransport::default())
    }

    /// Frames written to the signaling channel of `dlei`
    pub fn signaling_frames(&self, dlei: &Dlei) -> Option<FrameQueue> {
        self.signaling
            .borrow()
            .iter()
            .find(|(d, _)| d == dlei)
            .map(|(_, q)| q.clone())
    }

    /// Frames written to the U-plane channel of `ulei`
    pub fn uplane_frames(&self, ulei: &Ulei) -> Option<FrameQueue> {
        self.uplane
            .borrow()
            .iter()
            .find(|(u, _)| u == ulei)
            .map(|(_, q)| q.clone())
    }
}

impl LinkTransport for QueueTransport {
    fn open_signaling(&self, dlei: &Dlei) -> Result<Box<dyn LinkChannel>> {
        let queue: FrameQueue = Rc::new(RefCell::new(Vec::new()));
        self.signaling
            .borrow_mut()
            .push((dlei.clone(), queue.clone()));
        Ok(Box::new(QueueChannel { queue }))
    }

    fn open_uplane(&self, ulei: &Ulei) -> Result<Box<dyn LinkChannel>> {
        let queue: FrameQueue = Rc::new(RefCell::new(Vec::new()));
        self.uplane
            .borrow_mut()
            .push((ulei.clone(), queue.clone()));
        Ok(Box::new(QueueChannel { queue }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_transport() {
        let transport = QueueTransport::new();
        let dlei = Dlei {
            ipui: Ipui::N {
                emc: 1,
                psn: 2,
            },
        };
        let channel = transport.open_signaling(&dlei).unwrap();
        channel.write(&[1, 2, 3]).unwrap();
        let frames = transport.signaling_frames(&dlei).unwrap();
        assert_eq!(frames.borrow().len(), 1);
        assert_eq!(frames.borrow()[0], vec![1, 2, 3]);
        assert!(channel.raw_fd().is_none());
    }

    #[test]
    fn test_ulei_encoding() {
        let a = Ulei {
            ipui: Ipui::N { emc: 1, psn: 2 },
            tv: 1,
        };
        let b = Ulei {
            ipui: Ipui::N { emc: 1, psn: 2 },
            tv: 2,
        };
        assert_ne!(a.encode(), b.encode());
    }
}
