// SPDX-FileCopyrightText: © 2024 Marvell Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

mod test_utils;

use std::sync::Arc;

use test_utils::MockBus;
use umsd::umsd_if::error::SwitchError;
use umsd::umsd_if::switch::atu::{AtuEntry, FlushCmd};
use umsd::umsd_if::switch::{DirectSmi, Peridot};
use umsd::Switch;

const GLOBAL1: u8 = 0x1B;
const ATU_OP_REG: u8 = 0x0B;

fn open_peridot(bus: &Arc<MockBus>) -> Switch {
    Switch {
        inner: Box::new(Peridot::create(bus.clone(), Arc::new(DirectSmi), 0x390)),
    }
}

#[test]
fn add_entry_register_sequence() {
    let bus = Arc::new(MockBus::new().busy_reg(GLOBAL1, ATU_OP_REG));
    let sw = open_peridot(&bus);

    let entry = AtuEntry {
        mac: [0x00, 0x11, 0x22, 0x33, 0x44, 0x55],
        port_vec: 0b101,
        db_num: 1,
        entry_state: 0xE,
        fpri: 2,
        qpri: 3,
        lag: false,
    };
    sw.atu().unwrap().add_entry(&entry).unwrap();

    assert_eq!(
        bus.writes_to(GLOBAL1),
        vec![
            (0x01, 0x2001), // FID 1, FPri 2
            (0x0D, 0x0011),
            (0x0E, 0x2233),
            (0x0F, 0x4455),
            (0x0C, 0x005E), // state 0xE, port vector 0b101
            (0x0B, 0xB300), // busy, load/purge, QPri 3
        ]
    );
}

#[test]
fn add_entry_validates_the_port_vector() {
    let bus = Arc::new(MockBus::new().busy_reg(GLOBAL1, ATU_OP_REG));
    let sw = open_peridot(&bus);

    let entry = AtuEntry {
        mac: [0; 6],
        port_vec: 1 << 11, // Peridot has 11 ports
        entry_state: 0xE,
        ..Default::default()
    };
    assert!(matches!(
        sw.atu().unwrap().add_entry(&entry),
        Err(SwitchError::BadParam("port_vec"))
    ));
    assert!(bus.writes().is_empty());
}

#[test]
fn get_entry_next_reads_back_the_found_entry() {
    let bus = Arc::new(MockBus::new().busy_reg(GLOBAL1, ATU_OP_REG));
    let sw = open_peridot(&bus);

    // Scripted readback for the entry past the probe address.
    bus.queue_read(GLOBAL1, 0x0D, 0x0011);
    bus.queue_read(GLOBAL1, 0x0E, 0x2233);
    bus.queue_read(GLOBAL1, 0x0F, 0x4466);
    bus.queue_read(GLOBAL1, 0x0C, 0x005E);

    let entry = sw
        .atu()
        .unwrap()
        .get_entry_next([0x00, 0x11, 0x22, 0x33, 0x44, 0x55])
        .unwrap();

    assert_eq!(entry.mac, [0x00, 0x11, 0x22, 0x33, 0x44, 0x66]);
    assert_eq!(entry.entry_state, 0xE);
    assert_eq!(entry.port_vec, 0b101);
    assert!(!entry.lag);
}

#[test]
fn get_entry_next_past_the_end_is_no_such_entry() {
    let bus = Arc::new(MockBus::new().busy_reg(GLOBAL1, ATU_OP_REG));
    let sw = open_peridot(&bus);

    // Nothing scripted: the data register reads back state 0.
    assert!(matches!(
        sw.atu().unwrap().get_entry_next([0xFF; 6]),
        Err(SwitchError::NoSuchEntry)
    ));
}

#[test]
fn flush_commands() {
    let bus = Arc::new(MockBus::new().busy_reg(GLOBAL1, ATU_OP_REG));
    let sw = open_peridot(&bus);

    sw.atu().unwrap().flush(FlushCmd::All).unwrap();
    assert_eq!(
        bus.writes_to(GLOBAL1),
        vec![(0x0C, 0x000F), (0x0B, 0x9000)]
    );

    let bus = Arc::new(MockBus::new().busy_reg(GLOBAL1, ATU_OP_REG));
    let sw = open_peridot(&bus);

    sw.atu()
        .unwrap()
        .flush_in_db(FlushCmd::NonStatic, 7)
        .unwrap();
    assert_eq!(
        bus.writes_to(GLOBAL1),
        vec![(0x01, 0x0007), (0x0C, 0x000F), (0x0B, 0xE000)]
    );
}

#[test]
fn aging_timeout_scales_by_the_family_step() {
    let bus = Arc::new(MockBus::new());
    let sw = open_peridot(&bus);

    // Peridot ages in 3.75s steps.
    sw.atu().unwrap().set_aging_timeout(300_000).unwrap();
    assert_eq!(bus.writes_to(GLOBAL1), vec![(0x0A, 80 << 4)]);

    assert_eq!(sw.atu().unwrap().get_aging_timeout().unwrap(), 300_000);

    assert!(matches!(
        sw.atu().unwrap().set_aging_timeout(4_000_000),
        Err(SwitchError::BadParam("timeout_ms"))
    ));
}
