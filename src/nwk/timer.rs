//! Timer bookkeeping
//!
//! Timers are armed through the application's [`EventOps`] and fire back
//! through [`DectHandle::timer_expired`]. A slot is removed when it
//! expires or is stopped, so each start delivers at most one expiry.
//!
//! [`EventOps`]: crate::nwk::handle::EventOps

use std::time::Duration;

use crate::nwk::handle::{CallId, DectHandle, LinkId, TimerId};

/// What a running timer supervises
#[derive(Clone, Copy, Debug)]
pub(crate) enum TimerOwner {
    /// CC setup supervision of a call
    CcSetup(CallId),
    /// Release grace period of an idle data link
    LinkRelease(LinkId),
}

impl DectHandle {
    pub(crate) fn timer_start(&mut self, owner: TimerOwner, duration: Duration) -> TimerId {
        let timer = TimerId(self.next_id());
        log::debug!("start timer {:?} for {:?}", timer, owner);
        self.timers.insert(timer, owner);
        self.ops.event.start_timer(timer, duration);
        timer
    }

    pub(crate) fn timer_stop(&mut self, timer: TimerId) {
        if self.timers.remove(&timer).is_some() {
            self.ops.event.stop_timer(timer);
        }
    }

    ///
    /// Reports a timer expiry.
    ///
    /// The application calls this when a timer registered through
    /// [`EventOps::start_timer`] fires. Unknown or already stopped timers
    /// are ignored.
    ///
    /// [`EventOps::start_timer`]: crate::nwk::handle::EventOps::start_timer
    ///
    pub fn timer_expired(&mut self, timer: TimerId) {
        let owner = match self.timers.remove(&timer) {
            Some(owner) => owner,
            None => {
                log::debug!("expiry of unknown timer {:?}", timer);
                return;
            }
        };
        match owner {
            TimerOwner::CcSetup(call) => crate::nwk::cc::setup_timeout(self, call),
            TimerOwner::LinkRelease(link) => {
                crate::nwk::transaction::link_release_expired(self, link)
            }
        }
    }
}
