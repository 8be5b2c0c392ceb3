// SPDX-FileCopyrightText: © 2024 Marvell Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

mod test_utils;

use std::sync::Arc;

use test_utils::MockBus;
use umsd::umsd_if::error::SwitchError;
use umsd::umsd_if::switch::pirl::{
    custom_setup_sr2c, PirlAction, PirlCountMode, PirlCustomRate, PirlData,
};
use umsd::umsd_if::switch::{DirectSmi, Peridot};
use umsd::Switch;

const GLOBAL2: u8 = 0x1C;
const IRL_OP_REG: u8 = 0x09;
const IRL_DATA_REG: u8 = 0x0A;

fn open_peridot(bus: &Arc<MockBus>) -> Switch {
    Switch {
        inner: Box::new(Peridot::create(bus.clone(), Arc::new(DirectSmi), 0x390)),
    }
}

#[test]
fn initialize_hits_every_resource() {
    let bus = Arc::new(MockBus::new().busy_reg(GLOBAL2, IRL_OP_REG));
    let sw = open_peridot(&bus);

    sw.pirl().unwrap().initialize().unwrap();
    assert_eq!(bus.writes_to(GLOBAL2), vec![(IRL_OP_REG, 0x9000)]);

    sw.pirl().unwrap().init_resource(2, 1).unwrap();
    // busy | init-resource | port 2 | resource 1
    assert_eq!(bus.writes_to(GLOBAL2)[1], (IRL_OP_REG, 0xA220));
}

#[test]
fn write_resource_streams_all_eight_words() {
    let bus = Arc::new(MockBus::new().busy_reg(GLOBAL2, IRL_OP_REG));
    let sw = open_peridot(&bus);

    let data = PirlData {
        bkt_type_mask: 0x7FFF,
        account_filtered: false,
        action: PirlAction::Drop,
        custom: custom_setup_sr2c(100_000, 1600, PirlCountMode::Byte).unwrap(),
    };
    sw.pirl().unwrap().write_resource(1, 0, &data).unwrap();

    let writes = bus.writes_to(GLOBAL2);
    assert_eq!(writes.len(), 16); // data word + command, eight times

    let ops: Vec<u16> = writes
        .iter()
        .filter(|(reg, _)| *reg == IRL_OP_REG)
        .map(|(_, v)| *v)
        .collect();
    // busy | write-resource | port 1 | resource 0 | word address 0..7
    assert_eq!(ops, (0..8).map(|a| 0xB100 | a).collect::<Vec<_>>());

    let data_words: Vec<u16> = writes
        .iter()
        .filter(|(reg, _)| *reg == IRL_DATA_REG)
        .map(|(_, v)| *v)
        .collect();
    assert_eq!(data_words[0], 0x7FFF); // bucket type mask
    assert_eq!(data_words[1], 0x1FFF); // increment, byte mode
}

#[test]
fn read_resource_decodes_the_bucket() {
    let bus = Arc::new(MockBus::new().busy_reg(GLOBAL2, IRL_OP_REG));
    let sw = open_peridot(&bus);

    for word in [
        0x00FFu16, // bucket type mask
        0x0100,    // increment, byte mode
        0x0020,    // green rate factor
        0x2345,    // CBS low
        0x0301,    // CBS high 0x01, filtered, flow control
        0xFFFF,    // EBS low
        0x00FF,    // EBS high
        0x0000,    // yellow rate factor
    ] {
        bus.queue_read(GLOBAL2, IRL_DATA_REG, word);
    }

    let data = sw.pirl().unwrap().read_resource(0, 0).unwrap();
    assert_eq!(
        data,
        PirlData {
            bkt_type_mask: 0x00FF,
            account_filtered: true,
            action: PirlAction::FlowControl,
            custom: PirlCustomRate {
                is_valid: true,
                ebs_limit: 0xFF_FFFF,
                cbs_limit: 0x1_2345,
                bkt_increment: 0x100,
                bkt_rate_factor_grn: 0x20,
                bkt_rate_factor_ylw: 0,
                count_mode: PirlCountMode::Byte,
            },
        }
    );

    // One read command per word.
    let ops: Vec<u16> = bus
        .writes_to(GLOBAL2)
        .iter()
        .filter(|(reg, _)| *reg == IRL_OP_REG)
        .map(|(_, v)| *v)
        .collect();
    assert_eq!(ops, (0..8).map(|a| 0xC000 | a).collect::<Vec<_>>());
}

#[test]
fn sr2c_math_is_reachable_through_the_ops_trait() {
    let bus = Arc::new(MockBus::new());
    let sw = open_peridot(&bus);

    let custom = sw
        .pirl()
        .unwrap()
        .custom_setup_sr2c(100_000, 1600, PirlCountMode::Byte)
        .unwrap();
    assert_eq!(
        custom,
        custom_setup_sr2c(100_000, 1600, PirlCountMode::Byte).unwrap()
    );
    // Pure math; nothing touches the bus.
    assert!(bus.writes().is_empty());
}

#[test]
fn resources_are_bounded() {
    let bus = Arc::new(MockBus::new().busy_reg(GLOBAL2, IRL_OP_REG));
    let sw = open_peridot(&bus);

    assert!(matches!(
        sw.pirl().unwrap().init_resource(11, 0),
        Err(SwitchError::BadParam("port"))
    ));
    assert!(matches!(
        sw.pirl().unwrap().init_resource(0, 8),
        Err(SwitchError::BadParam("res"))
    ));
    assert!(matches!(
        sw.pirl().unwrap().get_resource_reg(0, 0, 8),
        Err(SwitchError::BadParam("addr"))
    ));
    assert!(bus.writes().is_empty());
}
