// SPDX-FileCopyrightText: © 2024 Marvell Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

mod test_utils;

use std::sync::Arc;

use test_utils::MockBus;
use umsd::umsd_if::error::SwitchError;
use umsd::umsd_if::switch::phy::PhySpeed;
use umsd::umsd_if::switch::qc::SchedMode;
use umsd::umsd_if::switch::{DirectSmi, Peridot};
use umsd::Switch;

const GLOBAL2: u8 = 0x1C;
const SMI_PHY_CMD_REG: u8 = 0x18;
const SMI_PHY_DATA_REG: u8 = 0x19;

/// Pointered queue-control register in each port block.
const QC_REG: u8 = 0x1C;

fn open_peridot(bus: &Arc<MockBus>) -> Switch {
    Switch {
        inner: Box::new(Peridot::create(bus.clone(), Arc::new(DirectSmi), 0x390)),
    }
}

#[test]
fn phy_reads_go_through_the_indirect_unit() {
    let bus = Arc::new(MockBus::new().busy_reg(GLOBAL2, SMI_PHY_CMD_REG));
    bus.queue_read(GLOBAL2, SMI_PHY_DATA_REG, 0x796D);
    let sw = open_peridot(&bus);

    assert_eq!(sw.phy().unwrap().read_reg(2, 2).unwrap(), 0x796D);
    // busy | clause 22 | read | phy 2 | reg 2
    assert_eq!(bus.writes_to(GLOBAL2), vec![(SMI_PHY_CMD_REG, 0x9842)]);
}

#[test]
fn phy_writes_latch_data_then_command() {
    let bus = Arc::new(MockBus::new().busy_reg(GLOBAL2, SMI_PHY_CMD_REG));
    let sw = open_peridot(&bus);

    sw.phy().unwrap().write_reg(1, 4, 0x01E1).unwrap();
    assert_eq!(
        bus.writes_to(GLOBAL2),
        vec![(SMI_PHY_DATA_REG, 0x01E1), (SMI_PHY_CMD_REG, 0x9424)]
    );
}

#[test]
fn forcing_speed_clears_autoneg_and_soft_resets() {
    let bus = Arc::new(MockBus::new().busy_reg(GLOBAL2, SMI_PHY_CMD_REG));
    // Control register as a PHY out of reset would read it.
    bus.queue_read(GLOBAL2, SMI_PHY_DATA_REG, 0x1140);
    let sw = open_peridot(&bus);

    sw.phy()
        .unwrap()
        .set_speed_duplex(0, PhySpeed::Mb1000, true)
        .unwrap();

    assert_eq!(
        bus.writes_to(GLOBAL2),
        vec![
            (SMI_PHY_CMD_REG, 0x9800),  // read control
            (SMI_PHY_DATA_REG, 0x8140), // reset | 1000M | full duplex
            (SMI_PHY_CMD_REG, 0x9400),  // write control
        ]
    );
}

#[test]
fn phy_address_is_bounded() {
    let bus = Arc::new(MockBus::new().busy_reg(GLOBAL2, SMI_PHY_CMD_REG));
    let sw = open_peridot(&bus);

    assert!(matches!(
        sw.phy().unwrap().read_reg(8, 0),
        Err(SwitchError::BadParam("phy"))
    ));
}

#[test]
fn sched_mode_rides_the_queue_control_pointer() {
    let bus = Arc::new(MockBus::new());
    let sw = open_peridot(&bus);

    sw.qc().unwrap().set_port_sched(3, SchedMode::Strict).unwrap();
    // update | pointer 0x17 | mode 3, written into port 3's block
    assert_eq!(bus.writes(), vec![(3, QC_REG, 0x9703)]);

    bus.queue_read(2, QC_REG, 0x1702);
    assert_eq!(
        sw.qc().unwrap().get_port_sched(2).unwrap(),
        SchedMode::StrictQ7Q6
    );
}

#[test]
fn raw_queue_control_access() {
    let bus = Arc::new(MockBus::new());
    let sw = open_peridot(&bus);

    sw.qc().unwrap().set_queue_ctrl(0, 0x20, 0xAB).unwrap();
    assert_eq!(bus.writes(), vec![(0, QC_REG, 0xA0AB)]);

    assert!(matches!(
        sw.qc().unwrap().get_queue_ctrl(11, 0),
        Err(SwitchError::BadParam("port"))
    ));
}
