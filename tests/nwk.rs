mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use dect::error::ErrorKind;
    use dect::handle::{
        CallId, CallState, CcOps, Config, DectHandle, DectOps, DectRole, EventOps, FdEvents,
        LinkId, MmId, MmOps, MmParam, MnccParam, TimerId,
    };
    use dect::identity::{Ari, Ipui, Park, Tpui};
    use dect::sformat::ie::{
        FixedIdentity, IeType, InfoElement, LocationArea, PortableIdentity, RejectReasonCode,
        RepeatIndicatorType,
    };
    use dect::sformat::{CcMsgType, MmMsgType};
    use dect::transport::{Dlei, LinkTransport, QueueTransport};

    pub fn init() {
        env_logger::builder().is_test(true).try_init().ok();
    }

    #[derive(Default)]
    struct TestEventOps {
        timers: RefCell<Vec<(TimerId, Duration)>>,
    }

    impl EventOps for TestEventOps {
        fn register_fd(&self, _fd: i32, _events: FdEvents) {}
        fn unregister_fd(&self, _fd: i32) {}
        fn start_timer(&self, timer: TimerId, duration: Duration) {
            self.timers.borrow_mut().push((timer, duration));
        }
        fn stop_timer(&self, timer: TimerId) {
            self.timers.borrow_mut().retain(|(t, _)| *t != timer);
        }
    }

    #[derive(Default)]
    struct Recorder {
        cc_events: RefCell<Vec<(&'static str, CallId)>>,
        cc_params: RefCell<Vec<MnccParam>>,
        mm_events: RefCell<Vec<(&'static str, MmId, bool)>>,
        mm_params: RefCell<Vec<MmParam>>,
    }

    impl Recorder {
        fn cc_count(&self, name: &str) -> usize {
            self.cc_events
                .borrow()
                .iter()
                .filter(|(n, _)| *n == name)
                .count()
        }

        fn mm_count(&self, name: &str) -> usize {
            self.mm_events
                .borrow()
                .iter()
                .filter(|(n, _, _)| *n == name)
                .count()
        }

        fn record_cc(&self, name: &'static str, call: CallId, param: &MnccParam) {
            self.cc_events.borrow_mut().push((name, call));
            self.cc_params.borrow_mut().push(param.clone());
        }

        fn record_mm(&self, name: &'static str, mmta: MmId, accept: bool, param: &MmParam) {
            self.mm_events.borrow_mut().push((name, mmta, accept));
            self.mm_params.borrow_mut().push(param.clone());
        }
    }

    impl CcOps for Recorder {
        fn mncc_setup_ind(&self, _dh: &mut DectHandle, call: CallId, param: &MnccParam) {
            self.record_cc("setup_ind", call, param);
        }
        fn mncc_alert_ind(&self, _dh: &mut DectHandle, call: CallId, param: &MnccParam) {
            self.record_cc("alert_ind", call, param);
        }
        fn mncc_connect_ind(&self, _dh: &mut DectHandle, call: CallId, param: &MnccParam) {
            self.record_cc("connect_ind", call, param);
        }
        fn mncc_connect_cfm(&self, _dh: &mut DectHandle, call: CallId, param: &MnccParam) {
            self.record_cc("connect_cfm", call, param);
        }
        fn mncc_release_ind(&self, _dh: &mut DectHandle, call: CallId, param: &MnccParam) {
            self.record_cc("release_ind", call, param);
        }
        fn mncc_release_cfm(&self, _dh: &mut DectHandle, call: CallId, param: &MnccParam) {
            self.record_cc("release_cfm", call, param);
        }
        fn mncc_reject_ind(&self, _dh: &mut DectHandle, call: CallId, param: &MnccParam) {
            self.record_cc("reject_ind", call, param);
        }
        fn mncc_info_ind(&self, _dh: &mut DectHandle, call: CallId, param: &MnccParam) {
            self.record_cc("info_ind", call, param);
        }
    }

    impl MmOps for Recorder {
        fn mm_locate_ind(&self, _dh: &mut DectHandle, mmta: MmId, param: &MmParam) {
            self.record_mm("locate_ind", mmta, true, param);
        }
        fn mm_locate_cfm(&self, _dh: &mut DectHandle, mmta: MmId, accept: bool, param: &MmParam) {
            self.record_mm("locate_cfm", mmta, accept, param);
        }
        fn mm_access_rights_ind(&self, _dh: &mut DectHandle, mmta: MmId, param: &MmParam) {
            self.record_mm("access_rights_ind", mmta, true, param);
        }
        fn mm_access_rights_cfm(
            &self,
            _dh: &mut DectHandle,
            mmta: MmId,
            accept: bool,
            param: &MmParam,
        ) {
            self.record_mm("access_rights_cfm", mmta, accept, param);
        }
        fn mm_identity_assign_ind(&self, _dh: &mut DectHandle, mmta: MmId, param: &MmParam) {
            self.record_mm("identity_assign_ind", mmta, true, param);
        }
        fn mm_identity_assign_cfm(
            &self,
            _dh: &mut DectHandle,
            mmta: MmId,
            accept: bool,
            reject_reason: Option<RejectReasonCode>,
        ) {
            let mut param = MmParam::default();
            param.reject_reason =
                reject_reason.map(|code| Rc::new(InfoElement::RejectReason(code)));
            self.record_mm("identity_assign_cfm", mmta, accept, &param);
        }
        fn mm_authenticate_ind(&self, _dh: &mut DectHandle, mmta: MmId, param: &MmParam) {
            self.record_mm("authenticate_ind", mmta, true, param);
        }
        fn mm_key_allocate_ind(&self, _dh: &mut DectHandle, mmta: MmId, param: &MmParam) {
            self.record_mm("key_allocate_ind", mmta, true, param);
        }
    }

    struct Endpoint {
        dh: DectHandle,
        transport: Rc<QueueTransport>,
        events: Rc<TestEventOps>,
        recorder: Rc<Recorder>,
    }

    fn pp_ipui() -> Ipui {
        Ipui::N {
            emc: 0x1234,
            psn: 0x6789a,
        }
    }

    fn fp_ari() -> Ari {
        Ari::ClassA {
            emc: 0x1234,
            fpn: 0x00042,
        }
    }

    fn create_endpoint(role: DectRole) -> Endpoint {
        let transport = QueueTransport::new();
        let events = Rc::new(TestEventOps::default());
        let recorder = Rc::new(Recorder::default());
        let config = Config {
            role,
            pari: match role {
                DectRole::Fp => Some(fp_ari()),
                DectRole::Pp => None,
            },
            ..Default::default()
        };
        let ops = DectOps {
            event: events.clone(),
            cc: recorder.clone(),
            mm: recorder.clone(),
        };
        let dh = DectHandle::new(config, transport.clone() as Rc<dyn LinkTransport>, ops);
        Endpoint {
            dh,
            transport,
            events,
            recorder,
        }
    }

    /// Moves queued signaling frames of `from` over to `to`
    fn pump(from: &Endpoint, to: &mut Endpoint, to_link: LinkId) -> usize {
        let queue = from
            .transport
            .signaling_frames(&Dlei { ipui: pp_ipui() })
            .unwrap();
        let frames: Vec<Vec<u8>> = queue.borrow_mut().drain(..).collect();
        let n = frames.len();
        for frame in &frames {
            to.dh.link_rcv(to_link, frame).unwrap();
        }
        n
    }

    fn setup_param() -> MnccParam {
        let mut param = MnccParam::default();
        param.portable_identity = Some(Rc::new(InfoElement::PortableIdentity(
            PortableIdentity::Ipui(pp_ipui()),
        )));
        param.fixed_identity = Some(Rc::new(InfoElement::FixedIdentity(FixedIdentity::Park(
            Park::from_ari(&fp_ari()),
        ))));
        param
    }

    fn fp_call(fp: &Endpoint) -> CallId {
        fp.recorder.cc_events.borrow()[0].1
    }

    #[test]
    fn test_s1_outgoing_call_to_active() {
        init();
        let mut pp = create_endpoint(DectRole::Pp);
        let mut fp = create_endpoint(DectRole::Fp);
        let pp_link = pp.dh.link_establish(&pp_ipui()).unwrap();
        let fp_link = fp.dh.link_establish(&pp_ipui()).unwrap();

        let pp_call = pp.dh.mncc_setup_req(pp_link, &setup_param()).unwrap();
        assert_eq!(pp.dh.call_state(pp_call), Some(CallState::CallPresent));

        // the setup travels to the FP
        let queue = pp
            .transport
            .signaling_frames(&Dlei { ipui: pp_ipui() })
            .unwrap();
        assert_eq!(queue.borrow()[0][1], CcMsgType::Setup as u8);
        assert_eq!(pump(&pp, &mut fp, fp_link), 1);
        assert_eq!(fp.recorder.cc_count("setup_ind"), 1);
        let fp_call = fp_call(&fp);
        assert_eq!(fp.dh.call_state(fp_call), Some(CallState::CallInitiated));
        assert!(fp
            .recorder
            .cc_params
            .borrow()[0]
            .basic_service
            .is_some());

        // alerting
        fp.dh.mncc_alert_req(fp_call, &MnccParam::default()).unwrap();
        assert_eq!(fp.dh.call_state(fp_call), Some(CallState::CallReceived));
        pump(&fp, &mut pp, pp_link);
        assert_eq!(pp.recorder.cc_count("alert_ind"), 1);
        assert_eq!(pp.dh.call_state(pp_call), Some(CallState::CallReceived));
        // the setup timer was stopped by the response
        assert!(pp.events.timers.borrow().is_empty());

        // connect
        fp.dh.mncc_connect_req(fp_call, &MnccParam::default()).unwrap();
        assert_eq!(fp.dh.call_state(fp_call), Some(CallState::ConnectPending));
        pump(&fp, &mut pp, pp_link);
        assert_eq!(pp.recorder.cc_count("connect_ind"), 1);
        assert_eq!(pp.dh.call_state(pp_call), Some(CallState::ConnectPending));

        // the PP opened its U-plane when the connect arrived
        let ulei = dect::transport::Ulei {
            ipui: pp_ipui(),
            tv: 0,
        };
        assert!(pp.transport.uplane_frames(&ulei).is_some());

        // connect acknowledge activates both ends
        pp.dh.mncc_connect_res(pp_call, &MnccParam::default()).unwrap();
        assert_eq!(pp.dh.call_state(pp_call), Some(CallState::Active));
        pump(&pp, &mut fp, fp_link);
        assert_eq!(fp.recorder.cc_count("connect_cfm"), 1);
        assert_eq!(fp.dh.call_state(fp_call), Some(CallState::Active));

        // U-plane data flows through the call's channel
        pp.dh.dl_u_data_req(pp_call, &[0x55; 40]).unwrap();
        let uplane = pp.transport.uplane_frames(&ulei).unwrap();
        assert_eq!(uplane.borrow().len(), 1);
        assert_eq!(uplane.borrow()[0].len(), 40);
    }

    #[test]
    fn test_s2_setup_timeout() {
        init();
        let mut pp = create_endpoint(DectRole::Pp);
        let pp_link = pp.dh.link_establish(&pp_ipui()).unwrap();
        let pp_call = pp.dh.mncc_setup_req(pp_link, &setup_param()).unwrap();

        let (timer, duration) = pp.events.timers.borrow()[0];
        assert_eq!(duration, Duration::from_secs(60));

        pp.dh.timer_expired(timer);
        assert_eq!(pp.recorder.cc_count("reject_ind"), 1);
        assert!(pp.recorder.cc_params.borrow()[0].release_reason.is_none());
        assert_eq!(pp.dh.call_state(pp_call), None);

        // a late second expiry of the same timer does nothing
        pp.dh.timer_expired(timer);
        assert_eq!(pp.recorder.cc_count("reject_ind"), 1);
    }

    #[test]
    fn test_s3_locate_accept() {
        init();
        let mut pp = create_endpoint(DectRole::Pp);
        let mut fp = create_endpoint(DectRole::Fp);
        let pp_link = pp.dh.link_establish(&pp_ipui()).unwrap();
        let fp_link = fp.dh.link_establish(&pp_ipui()).unwrap();

        let mut param = MmParam::default();
        param.portable_identity = Some(Rc::new(InfoElement::PortableIdentity(
            PortableIdentity::Ipui(pp_ipui()),
        )));
        pp.dh.mm_locate_req(pp_link, &param).unwrap();
        pump(&pp, &mut fp, fp_link);
        assert_eq!(fp.recorder.mm_count("locate_ind"), 1);
        let mmta = fp.recorder.mm_events.borrow()[0].1;

        let mut res = MmParam::default();
        res.location_area = Some(Rc::new(InfoElement::LocationArea(LocationArea {
            li_type: 0,
            level: 0x21,
        })));
        fp.dh.mm_locate_res(mmta, &res).unwrap();

        // LOCATE-ACCEPT with PORTABLE-IDENTITY and LOCATION-AREA once each
        {
            let queue = fp
                .transport
                .signaling_frames(&Dlei { ipui: pp_ipui() })
                .unwrap();
            let queue = queue.borrow();
            let frame = &queue[0];
            assert_eq!(frame[1], MmMsgType::LocateAccept as u8);
            let pi_count = frame[2..]
                .iter()
                .filter(|b| **b == IeType::PortableIdentity as u8)
                .count();
            assert_eq!(pi_count, 1);
        }
        pump(&fp, &mut pp, pp_link);
        assert_eq!(pp.recorder.mm_count("locate_cfm"), 1);
        assert!(pp.recorder.mm_events.borrow().last().unwrap().2);
        let cfm = pp.recorder.mm_params.borrow();
        let cfm = cfm.last().unwrap();
        assert!(cfm.portable_identity.is_some());
        assert!(cfm.location_area.is_some());

        // the transaction is gone on both sides
        assert!(fp.dh.mm_locate_res(mmta, &res).is_err());
    }

    #[test]
    fn test_s3_locate_reject() {
        init();
        let mut pp = create_endpoint(DectRole::Pp);
        let mut fp = create_endpoint(DectRole::Fp);
        let pp_link = pp.dh.link_establish(&pp_ipui()).unwrap();
        let fp_link = fp.dh.link_establish(&pp_ipui()).unwrap();

        let mut param = MmParam::default();
        param.portable_identity = Some(Rc::new(InfoElement::PortableIdentity(
            PortableIdentity::Ipui(pp_ipui()),
        )));
        pp.dh.mm_locate_req(pp_link, &param).unwrap();
        pump(&pp, &mut fp, fp_link);
        let mmta = fp.recorder.mm_events.borrow()[0].1;

        let mut res = MmParam::default();
        res.reject_reason = Some(Rc::new(InfoElement::RejectReason(
            RejectReasonCode::LOCATION_AREA_NOT_ALLOWED,
        )));
        fp.dh.mm_locate_res(mmta, &res).unwrap();
        pump(&fp, &mut pp, pp_link);
        assert_eq!(pp.recorder.mm_count("locate_cfm"), 1);
        // rejected
        assert!(!pp.recorder.mm_events.borrow().last().unwrap().2);
    }

    #[test]
    fn test_s4_corrupt_optional_keypad() {
        init();
        let mut pp = create_endpoint(DectRole::Pp);
        let mut fp = create_endpoint(DectRole::Fp);
        let pp_link = pp.dh.link_establish(&pp_ipui()).unwrap();
        let fp_link = fp.dh.link_establish(&pp_ipui()).unwrap();

        let pp_call = pp.dh.mncc_setup_req(pp_link, &setup_param()).unwrap();
        pump(&pp, &mut fp, fp_link);

        // {CC-INFO} with a valid display and a malformed keypad, crafted
        // on the PP initiated transaction 0
        let header = [0x80 | 0x03, CcMsgType::Info as u8];
        let mut frame = header.to_vec();
        frame.extend_from_slice(&[IeType::SingleDisplay as u8, b'A']);
        frame.extend_from_slice(&[IeType::MultiKeypad as u8, 2, b'1', 0xff]);
        fp.dh.link_rcv(fp_link, &frame).unwrap();

        assert_eq!(fp.recorder.cc_count("info_ind"), 1);
        let params = fp.recorder.cc_params.borrow();
        let info = params.last().unwrap();
        assert!(info.display.is_some());
        assert!(info.keypad.is_none());
        drop(params);
        let _ = pp_call;
    }

    #[test]
    fn test_s5_setup_without_portable_identity() {
        init();
        let mut fp = create_endpoint(DectRole::Fp);
        let fp_link = fp.dh.link_establish(&pp_ipui()).unwrap();

        // {CC-SETUP} carrying only a basic service
        let frame = [
            0x80 | 0x03, // PP initiated transaction 0, CC
            CcMsgType::Setup as u8,
            IeType::BasicService as u8,
            0x80,
        ];
        fp.dh.link_rcv(fp_link, &frame).unwrap();

        // no call, no indication, no answer on the wire
        assert_eq!(fp.recorder.cc_count("setup_ind"), 0);
        let queue = fp
            .transport
            .signaling_frames(&Dlei { ipui: pp_ipui() })
            .unwrap();
        assert!(queue.borrow().is_empty());
    }

    #[test]
    fn test_s6_repeated_iwu_to_iwu() {
        init();
        let mut pp = create_endpoint(DectRole::Pp);
        let mut fp = create_endpoint(DectRole::Fp);
        let pp_link = pp.dh.link_establish(&pp_ipui()).unwrap();
        let fp_link = fp.dh.link_establish(&pp_ipui()).unwrap();

        let mut param = setup_param();
        for data in [vec![1u8], vec![2u8]] {
            param.iwu_to_iwu.push(Rc::new(InfoElement::IwuToIwu(
                dect::sformat::ie::IwuToIwu {
                    sr: false,
                    protocol: 0x02,
                    data,
                },
            )));
        }
        pp.dh.mncc_setup_req(pp_link, &param).unwrap();

        {
            let queue = pp
                .transport
                .signaling_frames(&Dlei { ipui: pp_ipui() })
                .unwrap();
            let queue = queue.borrow();
            let frame = &queue[0];
            // REPEAT-INDICATOR (normal list) directly before the list
            let ri = IeType::RepeatIndicator as u8 | RepeatIndicatorType::Normal as u8;
            let at = frame.iter().position(|b| *b == ri).unwrap();
            assert_eq!(frame[at + 1], IeType::IwuToIwu as u8);
        }

        pump(&pp, &mut fp, fp_link);
        assert_eq!(fp.recorder.cc_count("setup_ind"), 1);
        let params = fp.recorder.cc_params.borrow();
        let setup = params.last().unwrap();
        assert_eq!(setup.iwu_to_iwu.len(), 2);
        assert!(matches!(
            setup.iwu_to_iwu[0].as_ref(),
            InfoElement::IwuToIwu(iwu) if iwu.data == vec![1]
        ));
    }

    #[test]
    fn test_release_handshake() {
        init();
        let mut pp = create_endpoint(DectRole::Pp);
        let mut fp = create_endpoint(DectRole::Fp);
        let pp_link = pp.dh.link_establish(&pp_ipui()).unwrap();
        let fp_link = fp.dh.link_establish(&pp_ipui()).unwrap();

        let pp_call = pp.dh.mncc_setup_req(pp_link, &setup_param()).unwrap();
        pump(&pp, &mut fp, fp_link);
        let fp_call = fp_call(&fp);
        fp.dh.mncc_connect_req(fp_call, &MnccParam::default()).unwrap();
        pump(&fp, &mut pp, pp_link);
        pp.dh.mncc_connect_res(pp_call, &MnccParam::default()).unwrap();
        pump(&pp, &mut fp, fp_link);
        assert_eq!(fp.dh.call_state(fp_call), Some(CallState::Active));

        // PP hangs up
        pp.dh.mncc_release_req(pp_call, &MnccParam::default()).unwrap();
        assert_eq!(pp.dh.call_state(pp_call), Some(CallState::ReleasePending));
        pump(&pp, &mut fp, fp_link);
        assert_eq!(fp.recorder.cc_count("release_ind"), 1);

        fp.dh.mncc_release_res(fp_call, &MnccParam::default()).unwrap();
        assert_eq!(fp.dh.call_state(fp_call), None);
        pump(&fp, &mut pp, pp_link);
        assert_eq!(pp.recorder.cc_count("release_cfm"), 1);
        assert_eq!(pp.dh.call_state(pp_call), None);
    }

    #[test]
    fn test_transaction_identifier_allocation() {
        init();
        let mut pp = create_endpoint(DectRole::Pp);
        let pp_link = pp.dh.link_establish(&pp_ipui()).unwrap();

        // CC allows 7 concurrent transactions per link
        let mut calls = Vec::new();
        for _ in 0..7 {
            calls.push(pp.dh.mncc_setup_req(pp_link, &setup_param()).unwrap());
        }
        let err = pp.dh.mncc_setup_req(pp_link, &setup_param()).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Overload);

        // the transaction values on the wire are distinct
        let queue = pp
            .transport
            .signaling_frames(&Dlei { ipui: pp_ipui() })
            .unwrap();
        let mut tvs: Vec<u8> = queue.borrow().iter().map(|f| (f[0] >> 4) & 0x7).collect();
        tvs.sort_unstable();
        assert_eq!(tvs, vec![0, 1, 2, 3, 4, 5, 6]);

        // closing a call frees its identifier
        pp.dh.mncc_reject_req(calls[0], &MnccParam::default()).unwrap();
        pp.dh.mncc_setup_req(pp_link, &setup_param()).unwrap();
    }

    #[test]
    fn test_mm_transaction_ceiling() {
        init();
        let mut pp = create_endpoint(DectRole::Pp);
        let pp_link = pp.dh.link_establish(&pp_ipui()).unwrap();

        let mut param = MmParam::default();
        param.portable_identity = Some(Rc::new(InfoElement::PortableIdentity(
            PortableIdentity::Ipui(pp_ipui()),
        )));
        pp.dh.mm_locate_req(pp_link, &param).unwrap();
        // MM allows a single concurrent transaction
        let err = pp.dh.mm_locate_req(pp_link, &param).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Overload);
    }

    #[test]
    fn test_access_rights_default_park() {
        init();
        let mut pp = create_endpoint(DectRole::Pp);
        let mut fp = create_endpoint(DectRole::Fp);
        let pp_link = pp.dh.link_establish(&pp_ipui()).unwrap();
        let fp_link = fp.dh.link_establish(&pp_ipui()).unwrap();

        let mut param = MmParam::default();
        param.portable_identity = Some(Rc::new(InfoElement::PortableIdentity(
            PortableIdentity::Ipui(pp_ipui()),
        )));
        pp.dh.mm_access_rights_req(pp_link, &param).unwrap();
        pump(&pp, &mut fp, fp_link);
        assert_eq!(fp.recorder.mm_count("access_rights_ind"), 1);
        let mmta = fp.recorder.mm_events.borrow()[0].1;

        // the accept fills the PARK of the FP's PARI
        fp.dh.mm_access_rights_res(mmta, &MmParam::default()).unwrap();
        pump(&fp, &mut pp, pp_link);
        assert_eq!(pp.recorder.mm_count("access_rights_cfm"), 1);
        let cfm = pp.recorder.mm_params.borrow();
        let cfm = cfm.last().unwrap();
        assert_eq!(cfm.fixed_identity.len(), 1);
        assert!(matches!(
            cfm.fixed_identity[0].as_ref(),
            InfoElement::FixedIdentity(FixedIdentity::Park(park)) if park.ari == fp_ari()
        ));
    }

    #[test]
    fn test_identity_assignment() {
        init();
        let mut pp = create_endpoint(DectRole::Pp);
        let mut fp = create_endpoint(DectRole::Fp);
        let pp_link = pp.dh.link_establish(&pp_ipui()).unwrap();
        let fp_link = fp.dh.link_establish(&pp_ipui()).unwrap();

        let mut param = MmParam::default();
        param.portable_identity = Some(Rc::new(InfoElement::PortableIdentity(
            PortableIdentity::Tpui(Tpui::default_individual(&pp_ipui())),
        )));
        fp.dh.mm_identity_assign_req(fp_link, &param).unwrap();
        pump(&fp, &mut pp, pp_link);
        assert_eq!(pp.recorder.mm_count("identity_assign_ind"), 1);
        let pp_mmta = pp.recorder.mm_events.borrow()[0].1;

        pp.dh
            .mm_identity_assign_res(pp_mmta, true, &MmParam::default())
            .unwrap();
        pump(&pp, &mut fp, fp_link);
        assert_eq!(fp.recorder.mm_count("identity_assign_cfm"), 1);
        assert!(fp.recorder.mm_events.borrow().last().unwrap().2);
    }

    #[test]
    fn test_identity_assignment_rejected() {
        init();
        let mut pp = create_endpoint(DectRole::Pp);
        let mut fp = create_endpoint(DectRole::Fp);
        let pp_link = pp.dh.link_establish(&pp_ipui()).unwrap();
        let fp_link = fp.dh.link_establish(&pp_ipui()).unwrap();

        let mut param = MmParam::default();
        param.portable_identity = Some(Rc::new(InfoElement::PortableIdentity(
            PortableIdentity::Tpui(Tpui(0xe0007)),
        )));
        fp.dh.mm_identity_assign_req(fp_link, &param).unwrap();
        pump(&fp, &mut pp, pp_link);
        let pp_mmta = pp.recorder.mm_events.borrow()[0].1;

        let mut rej = MmParam::default();
        rej.reject_reason = Some(Rc::new(InfoElement::RejectReason(
            RejectReasonCode::TPUI_UNKNOWN,
        )));
        pp.dh.mm_identity_assign_res(pp_mmta, false, &rej).unwrap();
        pump(&pp, &mut fp, fp_link);
        let events = fp.recorder.mm_events.borrow();
        let (name, _, accept) = events.last().unwrap();
        assert_eq!(*name, "identity_assign_cfm");
        assert!(!accept);
        drop(events);
        let params = fp.recorder.mm_params.borrow();
        assert!(matches!(
            params.last().unwrap().reject_reason.as_deref(),
            Some(InfoElement::RejectReason(code)) if *code == RejectReasonCode::TPUI_UNKNOWN
        ));
    }

    #[test]
    fn test_reference_counting_across_indication() {
        init();
        let mut pp = create_endpoint(DectRole::Pp);
        let mut fp = create_endpoint(DectRole::Fp);
        let pp_link = pp.dh.link_establish(&pp_ipui()).unwrap();
        let fp_link = fp.dh.link_establish(&pp_ipui()).unwrap();

        pp.dh.mncc_setup_req(pp_link, &setup_param()).unwrap();
        pump(&pp, &mut fp, fp_link);
        let fp_call = fp_call(&fp);

        // the recorder and the call both hold the parsed identity
        {
            let params = fp.recorder.cc_params.borrow();
            let held = params[0].portable_identity.as_ref().unwrap();
            assert!(Rc::strong_count(held) >= 2);
        }

        // destroying the call leaves the recorder's reference intact
        fp.dh.mncc_reject_req(fp_call, &MnccParam::default()).unwrap();
        let params = fp.recorder.cc_params.borrow();
        let held = params[0].portable_identity.as_ref().unwrap();
        assert_eq!(Rc::strong_count(held), 1);
        assert!(matches!(
            held.as_ref(),
            InfoElement::PortableIdentity(PortableIdentity::Ipui(ipui)) if *ipui == pp_ipui()
        ));
    }

    #[test]
    fn test_randomized_identity_roundtrip() {
        init();
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let ipui = Ipui::N {
                emc: rand::Rng::gen(&mut rng),
                psn: rand::Rng::gen_range(&mut rng, 0..0x100000),
            };
            let mut packed = Vec::new();
            ipui.pack(&mut packed);
            assert_eq!(Ipui::unpack(&packed, ipui.bits()).unwrap(), ipui);

            let ari = Ari::ClassA {
                emc: rand::Rng::gen(&mut rng),
                fpn: rand::Rng::gen_range(&mut rng, 0..0x20000),
            };
            let mut packed = Vec::new();
            ari.pack(&mut packed);
            assert_eq!(Ari::unpack(&packed, ari.bits()).unwrap(), ari);

            let tpui = Tpui(rand::Rng::gen_range(&mut rng, 0..0x100000));
            let mut packed = Vec::new();
            tpui.pack(&mut packed);
            assert_eq!(Tpui::unpack(&packed).unwrap(), tpui);
        }
    }

    #[test]
    fn test_serialize_identities() {
        init();
        let text = serde_json::to_string(&pp_ipui()).unwrap();
        assert!(text.contains("emc"));
        let text = serde_json::to_string(&Park::from_ari(&fp_ari())).unwrap();
        assert!(text.contains("pli"));
    }
}
