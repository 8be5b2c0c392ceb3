// SPDX-FileCopyrightText: © 2024 Marvell Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

mod test_utils;

use std::sync::Arc;

use test_utils::MockBus;
use umsd::umsd_if::error::SwitchError;
use umsd::umsd_if::switch::ptp::{PtpTimeStruct, PtpTsReg};
use umsd::umsd_if::switch::{DirectSmi, Peridot};
use umsd::Switch;

const GLOBAL2: u8 = 0x1C;
const AVB_CMD_REG: u8 = 0x16;
const AVB_DATA_REG: u8 = 0x17;

fn open_peridot(bus: &Arc<MockBus>) -> Switch {
    Switch {
        inner: Box::new(Peridot::create(bus.clone(), Arc::new(DirectSmi), 0x390)),
    }
}

#[test]
fn global_time_spans_two_tai_registers() {
    let bus = Arc::new(MockBus::new().busy_reg(GLOBAL2, AVB_CMD_REG));
    let sw = open_peridot(&bus);

    sw.ptp()
        .unwrap()
        .set_ptp_global_time(PtpTimeStruct { time: 0x1234_5678 })
        .unwrap();
    assert_eq!(
        bus.writes_to(GLOBAL2),
        vec![
            (AVB_DATA_REG, 0x5678),
            (AVB_CMD_REG, 0xBF2E), // write, global block, time low
            (AVB_DATA_REG, 0x1234),
            (AVB_CMD_REG, 0xBF2F), // write, global block, time high
        ]
    );

    bus.queue_read(GLOBAL2, AVB_DATA_REG, 0x5678);
    bus.queue_read(GLOBAL2, AVB_DATA_REG, 0x1234);
    let time = sw.ptp().unwrap().get_ptp_global_time().unwrap();
    assert_eq!(time.time, 0x1234_5678);
}

#[test]
fn timestamp_readout() {
    let bus = Arc::new(MockBus::new().busy_reg(GLOBAL2, AVB_CMD_REG));
    bus.queue_read(GLOBAL2, AVB_DATA_REG, 0x0001); // status: valid
    bus.queue_read(GLOBAL2, AVB_DATA_REG, 0xBBBB); // timestamp low
    bus.queue_read(GLOBAL2, AVB_DATA_REG, 0xAAAA); // timestamp high
    bus.queue_read(GLOBAL2, AVB_DATA_REG, 0x0042); // sequence id
    let sw = open_peridot(&bus);

    let ts = sw.ptp().unwrap().get_time_stamp(1, PtpTsReg::Arr0).unwrap();
    assert!(ts.is_valid);
    assert_eq!(ts.time_stamp, 0xAAAA_BBBB);
    assert_eq!(ts.seq_id, 0x42);

    // Four reads of the arrival-0 block on port 1.
    assert_eq!(
        bus.writes_to(GLOBAL2),
        vec![
            (AVB_CMD_REG, 0xA108),
            (AVB_CMD_REG, 0xA109),
            (AVB_CMD_REG, 0xA10A),
            (AVB_CMD_REG, 0xA10B),
        ]
    );
}

#[test]
fn port_ptp_enable_inverts_the_disable_bit() {
    let bus = Arc::new(MockBus::new().busy_reg(GLOBAL2, AVB_CMD_REG));
    bus.queue_read(GLOBAL2, AVB_DATA_REG, 0x0001); // PTP currently disabled
    let sw = open_peridot(&bus);

    assert!(!sw.ptp().unwrap().get_port_ptp_enable(0).unwrap());

    bus.queue_read(GLOBAL2, AVB_DATA_REG, 0x0001);
    sw.ptp().unwrap().set_port_ptp_enable(0, true).unwrap();
    // Read-modify-write of port 0's config with the disable bit cleared.
    let last_two: Vec<_> = bus.writes_to(GLOBAL2).into_iter().rev().take(2).collect();
    assert_eq!(last_two, vec![(AVB_CMD_REG, 0xB000), (AVB_DATA_REG, 0x0000)]);
}

#[test]
fn ptp_port_is_bounded() {
    let bus = Arc::new(MockBus::new().busy_reg(GLOBAL2, AVB_CMD_REG));
    let sw = open_peridot(&bus);

    assert!(matches!(
        sw.ptp().unwrap().get_port_ptp_enable(11),
        Err(SwitchError::BadParam("port"))
    ));
}
