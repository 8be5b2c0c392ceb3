// SPDX-FileCopyrightText: © 2024 Marvell Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Register map of the Peridot family. Shares the port-at-zero layout with
//! Amethyst but predates the ECID and ARP tables.

use crate::switch::atu::AtuRegs;
use crate::switch::eeprom::EepromRegs;
use crate::switch::phy::SmiPhyRegs;
use crate::switch::pirl::PirlRegs;
use crate::switch::ptp::AvbRegs;
use crate::switch::qc::QcRegs;
use crate::switch::rmon::StatsRegs;
use crate::switch::tcam::TcamRegs;

pub(crate) const GLOBAL1: u8 = 0x1B;
pub(crate) const GLOBAL2: u8 = 0x1C;
pub(crate) const TCAM_DEV: u8 = 0x1D;

pub(crate) const PORT_COUNT: u8 = 11;

pub(crate) const ATU: AtuRegs = AtuRegs {
    global1: GLOBAL1,
    fid_reg: 0x01,
    ctrl_reg: 0x0A,
    op_reg: 0x0B,
    data_reg: 0x0C,
    mac_regs: [0x0D, 0x0E, 0x0F],
    age_step_ms: 3750,
    port_count: PORT_COUNT,
};

pub(crate) const PIRL: PirlRegs = PirlRegs {
    global2: GLOBAL2,
    op_reg: 0x09,
    data_reg: 0x0A,
    port_count: PORT_COUNT,
    resources_per_port: 8,
};

pub(crate) const TCAM: TcamRegs = TcamRegs {
    dev: TCAM_DEV,
    op_reg: 0x00,
    ptr_reg: 0x01,
    data_base: 0x02,
    words_per_page: 24,
    entries: 255,
};

pub(crate) const AVB: AvbRegs = AvbRegs {
    global2: GLOBAL2,
    cmd_reg: 0x16,
    data_reg: 0x17,
    port_count: PORT_COUNT,
};

pub(crate) const STATS: StatsRegs = StatsRegs {
    global1: GLOBAL1,
    op_reg: 0x1D,
    data_hi_reg: 0x1E,
    data_lo_reg: 0x1F,
    port_count: PORT_COUNT,
    histogram_mode: 3,
};

pub(crate) const SMI_PHY: SmiPhyRegs = SmiPhyRegs {
    global2: GLOBAL2,
    cmd_reg: 0x18,
    data_reg: 0x19,
    phy_base: 0x00,
    phy_count: 8,
};

pub(crate) const QC: QcRegs = QcRegs {
    port_base: 0x00,
    qc_reg: 0x1C,
    port_count: PORT_COUNT,
};

pub(crate) const EEPROM: EepromRegs = EepromRegs {
    global2: GLOBAL2,
    cmd_reg: 0x14,
    data_reg: 0x15,
};
