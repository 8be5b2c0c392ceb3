// SPDX-FileCopyrightText: © 2024 Marvell Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

mod test_utils;

use std::sync::Arc;

use test_utils::MockBus;
use umsd::umsd_if::error::SwitchError;
use umsd::umsd_if::switch::ecid::EcidEntry;
use umsd::umsd_if::switch::{Amethyst, DirectSmi};
use umsd::Switch;

const GLOBAL1: u8 = 0x1B;
const ATU_CTRL_REG: u8 = 0x0A;
const ATU_OP_REG: u8 = 0x0B;

/// BPE enable bit in the ATU control register.
const BPE_ENABLE: u16 = 1 << 14;

fn open_amethyst(bus: &Arc<MockBus>) -> Switch {
    Switch {
        inner: Box::new(Amethyst::create(bus.clone(), Arc::new(DirectSmi), 0x393)),
    }
}

#[test]
fn ecid_requires_port_extender_mode() {
    let bus = Arc::new(MockBus::new().busy_reg(GLOBAL1, ATU_OP_REG));
    let sw = open_amethyst(&bus);

    let entry = EcidEntry {
        group: 1,
        ecid: 2,
        entry_state: 1,
        port_vec: 1,
        ..Default::default()
    };
    assert!(matches!(
        sw.ecid().unwrap().add_entry(&entry),
        Err(SwitchError::FeatureNotEnabled(_))
    ));
    assert!(bus.writes().is_empty());
}

#[test]
fn bpe_enable_toggles_the_control_bit() {
    let bus = Arc::new(MockBus::new());
    let sw = open_amethyst(&bus);

    assert!(!sw.ecid().unwrap().get_bpe_enable().unwrap());

    sw.ecid().unwrap().set_bpe_enable(true).unwrap();
    assert_eq!(bus.writes_to(GLOBAL1), vec![(ATU_CTRL_REG, BPE_ENABLE)]);
    assert!(sw.ecid().unwrap().get_bpe_enable().unwrap());
}

#[test]
fn add_entry_brackets_the_load_in_ecid_mode() {
    let bus = Arc::new(MockBus::new().busy_reg(GLOBAL1, ATU_OP_REG));
    bus.set_reg(GLOBAL1, ATU_CTRL_REG, BPE_ENABLE);
    let sw = open_amethyst(&bus);

    let entry = EcidEntry {
        group: 1,
        ecid: 2,
        entry_state: 1,
        port_vec: 1,
        ..Default::default()
    };
    sw.ecid().unwrap().add_entry(&entry).unwrap();

    assert_eq!(
        bus.writes_to(GLOBAL1),
        vec![
            (ATU_CTRL_REG, 0xC000), // ECID mode on, BPE still set
            (0x01, 0x0000),         // FID 0
            (0x0D, 0x0000),
            (0x0E, 0x0000),
            (0x0F, 0x1002), // group 1, ecid 2
            (0x0C, 0x0011), // state 1, port vector 1
            (0x0B, 0xB000), // busy, load/purge
            (ATU_CTRL_REG, BPE_ENABLE), // ECID mode back off
        ]
    );
}

#[test]
fn find_entry_matches_an_entry_stored_with_etag_removal() {
    let bus = Arc::new(MockBus::new().busy_reg(GLOBAL1, ATU_OP_REG));
    bus.set_reg(GLOBAL1, ATU_CTRL_REG, BPE_ENABLE);
    let sw = open_amethyst(&bus);

    let entry = EcidEntry {
        group: 2,
        ecid: 0xABC,
        entry_state: 1,
        port_vec: 1,
        remove_etag: true,
        ..Default::default()
    };
    sw.ecid().unwrap().add_entry(&entry).unwrap();

    // The E-TAG removal flag travels in the FID word; the key holds only
    // {group, ecid} so the lookup below can hit it.
    let writes = bus.writes_to(GLOBAL1);
    assert_eq!(writes[1], (0x01, 0x0001));
    assert_eq!(writes[4], (0x0F, 0x2ABC));

    // Hand the stored entry back on the readback registers.
    bus.queue_read(GLOBAL1, 0x0D, 0x0000);
    bus.queue_read(GLOBAL1, 0x0E, 0x0000);
    bus.queue_read(GLOBAL1, 0x0F, 0x2ABC);
    bus.queue_read(GLOBAL1, 0x0C, 0x0011); // state 1, port vector 1
    bus.queue_read(GLOBAL1, 0x01, 0x0001); // E-TAG removal flag

    let found = sw.ecid().unwrap().find_entry(2, 0xABC).unwrap();
    assert_eq!(found, entry);
}

#[test]
fn entry_count_advances_from_the_found_key() {
    let bus = Arc::new(MockBus::new().busy_reg(GLOBAL1, ATU_OP_REG));
    bus.set_reg(GLOBAL1, ATU_CTRL_REG, BPE_ENABLE);
    let sw = open_amethyst(&bus);

    // One entry with the removal flag set, then end of table.
    bus.queue_read(GLOBAL1, 0x0D, 0x0000);
    bus.queue_read(GLOBAL1, 0x0E, 0x0000);
    bus.queue_read(GLOBAL1, 0x0F, 0x1002);
    bus.queue_read(GLOBAL1, 0x0C, 0x0011);
    bus.queue_read(GLOBAL1, 0x01, 0x0001);
    bus.queue_read(GLOBAL1, 0x0C, 0x0000);

    assert_eq!(sw.ecid().unwrap().entry_count().unwrap(), 1);
}

#[test]
fn keys_are_validated_before_touching_the_bus() {
    let bus = Arc::new(MockBus::new());
    bus.set_reg(GLOBAL1, ATU_CTRL_REG, BPE_ENABLE);
    let sw = open_amethyst(&bus);

    assert!(matches!(
        sw.ecid().unwrap().find_entry(4, 0),
        Err(SwitchError::BadParam("group"))
    ));
    assert!(matches!(
        sw.ecid().unwrap().find_entry(0, 0x1000),
        Err(SwitchError::BadParam("ecid"))
    ));
    assert!(bus.writes().is_empty());
}
