// SPDX-FileCopyrightText: © 2024 Marvell Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Topaz is the small 7-port family. Its port registers are offset to
//! device address 0x10 and the management processor, ECID and ARP tables
//! are absent.

use std::sync::{Arc, Mutex, MutexGuard};

use umsd_core::SwitchFamily;

use crate::error::SwitchError;
use crate::interface::{DeviceInfo, SmiInterface};
use crate::rmu::{self, RegCmd, RmuOps};

use super::atu::{self, AtuEntry, AtuOps, AtuRegs, FlushCmd};
use super::communication::RegComms;
use super::eeprom::{self, EepromOps, EepromRegs};
use super::phy::{self, PhyOps, PhySpeed, SmiPhyRegs};
use super::pirl::{self, PirlData, PirlOps, PirlRegs};
use super::ptp::{self, AvbRegs, PtpIntStatus, PtpOps, PtpTimeStruct, PtpTsReg, PtpTsStatus};
use super::qc::{self, QcOps, QcRegs, SchedMode};
use super::rmon::{self, RmonCounters, RmonOps, StatsRegs};
use super::tcam::{self, TcamEntry, TcamOps, TcamRegs};
use super::{HlRegs, SwitchImpl};

const GLOBAL1: u8 = 0x1B;
const GLOBAL2: u8 = 0x1C;
const TCAM_DEV: u8 = 0x1D;

/// Port registers are shifted up to make room for the directly-addressable
/// PHYs below.
pub(crate) const PORT_BASE: u8 = 0x10;
const PORT_COUNT: u8 = 7;

const ATU: AtuRegs = AtuRegs {
    global1: GLOBAL1,
    fid_reg: 0x01,
    ctrl_reg: 0x0A,
    op_reg: 0x0B,
    data_reg: 0x0C,
    mac_regs: [0x0D, 0x0E, 0x0F],
    age_step_ms: 15000,
    port_count: PORT_COUNT,
};

const PIRL: PirlRegs = PirlRegs {
    global2: GLOBAL2,
    op_reg: 0x09,
    data_reg: 0x0A,
    port_count: PORT_COUNT,
    resources_per_port: 5,
};

const TCAM: TcamRegs = TcamRegs {
    dev: TCAM_DEV,
    op_reg: 0x00,
    ptr_reg: 0x01,
    data_base: 0x02,
    words_per_page: 24,
    entries: 255,
};

const AVB: AvbRegs = AvbRegs {
    global2: GLOBAL2,
    cmd_reg: 0x16,
    data_reg: 0x17,
    port_count: PORT_COUNT,
};

const STATS: StatsRegs = StatsRegs {
    global1: GLOBAL1,
    op_reg: 0x1D,
    data_hi_reg: 0x1E,
    data_lo_reg: 0x1F,
    port_count: PORT_COUNT,
    histogram_mode: 3,
};

const SMI_PHY: SmiPhyRegs = SmiPhyRegs {
    global2: GLOBAL2,
    cmd_reg: 0x18,
    data_reg: 0x19,
    phy_base: 0x00,
    phy_count: 5,
};

const QC: QcRegs = QcRegs {
    port_base: PORT_BASE,
    qc_reg: 0x1C,
    port_count: PORT_COUNT,
};

const EEPROM: EepromRegs = EepromRegs {
    global2: GLOBAL2,
    cmd_reg: 0x14,
    data_reg: 0x15,
};

pub struct Topaz {
    pub smi_if: Arc<dyn SmiInterface>,
    pub reg_if: Arc<dyn RegComms>,

    product_num: u16,

    table_lock: Mutex<()>,
}

impl Topaz {
    pub fn create(
        smi_if: Arc<dyn SmiInterface>,
        reg_if: Arc<dyn RegComms>,
        product_num: u16,
    ) -> Self {
        Self {
            smi_if,
            reg_if,
            product_num,
            table_lock: Mutex::new(()),
        }
    }

    pub fn get_if<T: SmiInterface + 'static>(&self) -> Option<&T> {
        self.smi_if.as_any().downcast_ref::<T>()
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.table_lock.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl HlRegs for Topaz {
    fn comms_obj(&self) -> (&dyn RegComms, &dyn SmiInterface) {
        (self.reg_if.as_ref(), self.smi_if.as_ref())
    }
}

impl AtuOps for Topaz {
    fn add_entry(&self, entry: &AtuEntry) -> Result<(), SwitchError> {
        let _lock = self.lock();
        atu::load_entry(self, &ATU, entry)
    }

    fn get_entry_next(&self, mac: [u8; 6]) -> Result<AtuEntry, SwitchError> {
        let _lock = self.lock();
        atu::get_next(self, &ATU, mac, 0)
    }

    fn find_entry(&self, mac: [u8; 6]) -> Result<AtuEntry, SwitchError> {
        let _lock = self.lock();
        atu::find_entry(self, &ATU, mac, 0)
    }

    fn del_entry(&self, mac: [u8; 6], db_num: u16) -> Result<(), SwitchError> {
        let _lock = self.lock();
        atu::load_entry(
            self,
            &ATU,
            &AtuEntry {
                mac,
                db_num,
                ..Default::default()
            },
        )
    }

    fn flush(&self, cmd: FlushCmd) -> Result<(), SwitchError> {
        let _lock = self.lock();
        atu::flush_op(self, &ATU, cmd, None)
    }

    fn flush_in_db(&self, cmd: FlushCmd, db_num: u16) -> Result<(), SwitchError> {
        let _lock = self.lock();
        atu::flush_op(self, &ATU, cmd, Some(db_num))
    }

    fn get_aging_timeout(&self) -> Result<u32, SwitchError> {
        atu::get_aging_timeout(self, &ATU)
    }

    fn set_aging_timeout(&self, timeout_ms: u32) -> Result<(), SwitchError> {
        let _lock = self.lock();
        atu::set_aging_timeout(self, &ATU, timeout_ms)
    }
}

impl PirlOps for Topaz {
    fn initialize(&self) -> Result<(), SwitchError> {
        let _lock = self.lock();
        pirl::initialize(self, &PIRL)
    }

    fn init_resource(&self, port: u8, res: u8) -> Result<(), SwitchError> {
        let _lock = self.lock();
        pirl::init_resource(self, &PIRL, port, res)
    }

    fn write_resource(&self, port: u8, res: u8, data: &PirlData) -> Result<(), SwitchError> {
        let _lock = self.lock();
        pirl::write_resource(self, &PIRL, port, res, data)
    }

    fn read_resource(&self, port: u8, res: u8) -> Result<PirlData, SwitchError> {
        let _lock = self.lock();
        pirl::read_resource(self, &PIRL, port, res)
    }

    fn get_resource_reg(&self, port: u8, res: u8, addr: u8) -> Result<u16, SwitchError> {
        let _lock = self.lock();
        pirl::get_resource_reg(self, &PIRL, port, res, addr)
    }

    fn set_resource_reg(
        &self,
        port: u8,
        res: u8,
        addr: u8,
        value: u16,
    ) -> Result<(), SwitchError> {
        let _lock = self.lock();
        pirl::set_resource_reg(self, &PIRL, port, res, addr, value)
    }
}

impl TcamOps for Topaz {
    fn flush_all(&self) -> Result<(), SwitchError> {
        let _lock = self.lock();
        tcam::flush_all(self, &TCAM)
    }

    fn flush_entry(&self, id: u16) -> Result<(), SwitchError> {
        let _lock = self.lock();
        tcam::flush_entry(self, &TCAM, id)
    }

    fn load_entry(&self, id: u16, entry: &TcamEntry) -> Result<(), SwitchError> {
        let _lock = self.lock();
        tcam::load_entry(self, &TCAM, id, entry)
    }

    fn read_entry(&self, id: u16) -> Result<TcamEntry, SwitchError> {
        let _lock = self.lock();
        tcam::read_entry(self, &TCAM, id)
    }

    fn get_entry_next(&self, id: Option<u16>) -> Result<(u16, TcamEntry), SwitchError> {
        let _lock = self.lock();
        tcam::get_entry_next(self, &TCAM, id)
    }

    fn find_entry(&self, id: u16) -> Result<TcamEntry, SwitchError> {
        let _lock = self.lock();
        tcam::find_entry(self, &TCAM, id)
    }
}

impl PtpOps for Topaz {
    fn get_port_ptp_enable(&self, port: u8) -> Result<bool, SwitchError> {
        let _lock = self.lock();
        ptp::get_port_ptp_enable(self, &AVB, port)
    }

    fn set_port_ptp_enable(&self, port: u8, enable: bool) -> Result<(), SwitchError> {
        let _lock = self.lock();
        ptp::set_port_ptp_enable(self, &AVB, port, enable)
    }

    fn get_time_stamp(&self, port: u8, ts_reg: PtpTsReg) -> Result<PtpTsStatus, SwitchError> {
        let _lock = self.lock();
        ptp::get_time_stamp(self, &AVB, port, ts_reg)
    }

    fn get_ptp_global_time(&self) -> Result<PtpTimeStruct, SwitchError> {
        let _lock = self.lock();
        ptp::get_ptp_global_time(self, &AVB)
    }

    fn set_ptp_global_time(&self, time: PtpTimeStruct) -> Result<(), SwitchError> {
        let _lock = self.lock();
        ptp::set_ptp_global_time(self, &AVB, time)
    }

    fn get_int_status(&self) -> Result<PtpIntStatus, SwitchError> {
        let _lock = self.lock();
        ptp::get_int_status(self, &AVB)
    }
}

impl RmonOps for Topaz {
    fn flush_all(&self) -> Result<(), SwitchError> {
        let _lock = self.lock();
        rmon::flush_all(self, &STATS)
    }

    fn flush_port(&self, port: u8) -> Result<(), SwitchError> {
        let _lock = self.lock();
        rmon::flush_port(self, &STATS, port)
    }

    fn read_counter(&self, port: u8, counter: u8) -> Result<u32, SwitchError> {
        let _lock = self.lock();
        rmon::read_counter(self, &STATS, port, counter)
    }

    fn dump_port(&self, port: u8) -> Result<RmonCounters, SwitchError> {
        let _lock = self.lock();
        rmon::dump_port(self, &STATS, port)
    }
}

impl PhyOps for Topaz {
    fn read_reg(&self, phy: u8, reg: u8) -> Result<u16, SwitchError> {
        let _lock = self.lock();
        phy::read_reg(self, &SMI_PHY, phy, reg)
    }

    fn write_reg(&self, phy: u8, reg: u8, value: u16) -> Result<(), SwitchError> {
        let _lock = self.lock();
        phy::write_reg(self, &SMI_PHY, phy, reg, value)
    }

    fn reset(&self, phy: u8) -> Result<(), SwitchError> {
        let _lock = self.lock();
        phy::reset(self, &SMI_PHY, phy)
    }

    fn get_loopback(&self, phy: u8) -> Result<bool, SwitchError> {
        let _lock = self.lock();
        phy::get_loopback(self, &SMI_PHY, phy)
    }

    fn set_loopback(&self, phy: u8, enable: bool) -> Result<(), SwitchError> {
        let _lock = self.lock();
        phy::set_loopback(self, &SMI_PHY, phy, enable)
    }

    fn set_speed_duplex(
        &self,
        phy: u8,
        speed: PhySpeed,
        full_duplex: bool,
    ) -> Result<(), SwitchError> {
        let _lock = self.lock();
        phy::set_speed_duplex(self, &SMI_PHY, phy, speed, full_duplex)
    }
}

impl QcOps for Topaz {
    fn get_queue_ctrl(&self, port: u8, pointer: u8) -> Result<u8, SwitchError> {
        let _lock = self.lock();
        qc::get_queue_ctrl(self, &QC, port, pointer)
    }

    fn set_queue_ctrl(&self, port: u8, pointer: u8, data: u8) -> Result<(), SwitchError> {
        let _lock = self.lock();
        qc::set_queue_ctrl(self, &QC, port, pointer, data)
    }

    fn get_port_sched(&self, port: u8) -> Result<SchedMode, SwitchError> {
        let _lock = self.lock();
        qc::get_port_sched(self, &QC, port)
    }

    fn set_port_sched(&self, port: u8, mode: SchedMode) -> Result<(), SwitchError> {
        let _lock = self.lock();
        qc::set_port_sched(self, &QC, port, mode)
    }
}

impl EepromOps for Topaz {
    fn read_word(&self, addr: u8) -> Result<u16, SwitchError> {
        let _lock = self.lock();
        eeprom::read_word(self, &EEPROM, addr)
    }

    fn write_word(&self, addr: u8, data: u16) -> Result<(), SwitchError> {
        let _lock = self.lock();
        eeprom::write_word(self, &EEPROM, addr, data)
    }

    fn get_chip_select(&self) -> Result<u8, SwitchError> {
        let _lock = self.lock();
        eeprom::get_chip_select(self, &EEPROM)
    }

    fn set_chip_select(&self, chip_sel: u8) -> Result<(), SwitchError> {
        let _lock = self.lock();
        eeprom::set_chip_select(self, &EEPROM, chip_sel)
    }
}

impl RmuOps for Topaz {
    fn get_id(&self) -> Result<u16, SwitchError> {
        rmu::get_id(self.smi_if.as_ref())
    }

    fn dump_atu(&self) -> Result<Vec<AtuEntry>, SwitchError> {
        rmu::dump_atu(self.smi_if.as_ref())
    }

    fn dump_mib(&self, port: u8, flush: bool) -> Result<RmonCounters, SwitchError> {
        rmu::dump_mib(self.smi_if.as_ref(), port, flush)
    }

    fn reg_cmds(&self, cmds: &[RegCmd]) -> Result<Vec<RegCmd>, SwitchError> {
        rmu::reg_cmds(self.smi_if.as_ref(), cmds)
    }
}

impl SwitchImpl for Topaz {
    fn get_family(&self) -> SwitchFamily {
        SwitchFamily::Topaz
    }

    fn get_product_num(&self) -> u16 {
        self.product_num
    }

    fn port_count(&self) -> u8 {
        PORT_COUNT
    }

    fn get_device_info(&self) -> Result<Option<DeviceInfo>, SwitchError> {
        Ok(self.smi_if.get_device_info()?)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn atu(&self) -> Option<&dyn AtuOps> {
        Some(self)
    }

    fn pirl(&self) -> Option<&dyn PirlOps> {
        Some(self)
    }

    fn tcam(&self) -> Option<&dyn TcamOps> {
        Some(self)
    }

    fn ptp(&self) -> Option<&dyn PtpOps> {
        Some(self)
    }

    fn rmon(&self) -> Option<&dyn RmonOps> {
        Some(self)
    }

    fn phy(&self) -> Option<&dyn PhyOps> {
        Some(self)
    }

    fn qc(&self) -> Option<&dyn QcOps> {
        Some(self)
    }

    fn eeprom(&self) -> Option<&dyn EepromOps> {
        Some(self)
    }

    fn rmu(&self) -> Option<&dyn RmuOps> {
        Some(self)
    }
}
