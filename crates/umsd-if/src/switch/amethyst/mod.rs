// SPDX-FileCopyrightText: © 2024 Marvell Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Amethyst is the full-featured family: every table engine is present,
//! including the 802.1BR ECID table, the TCAM-resident ARP table and the
//! in-chip management processor.

pub(crate) mod regs;

use std::sync::{Arc, Mutex, MutexGuard};

use umsd_core::SwitchFamily;

use crate::error::SwitchError;
use crate::interface::{DeviceInfo, SmiInterface};
use crate::rmu::{self, RegCmd, RmuOps};

use super::arp::{self, ArpData, ArpMcData, ArpOps, ArpUcData};
use super::atu::{self, AtuEntry, AtuOps, FlushCmd};
use super::communication::RegComms;
use super::ecid::{self, EcidEntry, EcidOps};
use super::eeprom::{self, EepromOps};
use super::imp::{self, ImpOps};
use super::phy::{self, PhyOps, PhySpeed};
use super::pirl::{self, PirlData, PirlOps};
use super::ptp::{self, PtpIntStatus, PtpOps, PtpTimeStruct, PtpTsReg, PtpTsStatus};
use super::qc::{self, QcOps, SchedMode};
use super::rmon::{self, RmonCounters, RmonOps};
use super::tcam::{self, TcamEntry, TcamOps};
use super::{HlRegs, SwitchImpl};

pub struct Amethyst {
    pub smi_if: Arc<dyn SmiInterface>,
    pub reg_if: Arc<dyn RegComms>,

    product_num: u16,

    /// Serializes the multi-register table sequences. One per device, per
    /// the driver concurrency model.
    table_lock: Mutex<()>,
}

impl Amethyst {
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

impl HlRegs for Amethyst {
    fn comms_obj(&self) -> (&dyn RegComms, &dyn SmiInterface) {
        (self.reg_if.as_ref(), self.smi_if.as_ref())
    }
}

impl AtuOps for Amethyst {
    fn add_entry(&self, entry: &AtuEntry) -> Result<(), SwitchError> {
        let _lock = self.lock();
        atu::load_entry(self, &regs::ATU, entry)
    }

    fn get_entry_next(&self, mac: [u8; 6]) -> Result<AtuEntry, SwitchError> {
        let _lock = self.lock();
        atu::get_next(self, &regs::ATU, mac, 0)
    }

    fn find_entry(&self, mac: [u8; 6]) -> Result<AtuEntry, SwitchError> {
        let _lock = self.lock();
        atu::find_entry(self, &regs::ATU, mac, 0)
    }

    fn del_entry(&self, mac: [u8; 6], db_num: u16) -> Result<(), SwitchError> {
        let _lock = self.lock();
        // Loading with an invalid state purges the entry.
        atu::load_entry(
            self,
            &regs::ATU,
            &AtuEntry {
                mac,
                db_num,
                ..Default::default()
            },
        )
    }

    fn flush(&self, cmd: FlushCmd) -> Result<(), SwitchError> {
        let _lock = self.lock();
        atu::flush_op(self, &regs::ATU, cmd, None)
    }

    fn flush_in_db(&self, cmd: FlushCmd, db_num: u16) -> Result<(), SwitchError> {
        let _lock = self.lock();
        atu::flush_op(self, &regs::ATU, cmd, Some(db_num))
    }

    fn get_aging_timeout(&self) -> Result<u32, SwitchError> {
        atu::get_aging_timeout(self, &regs::ATU)
    }

    fn set_aging_timeout(&self, timeout_ms: u32) -> Result<(), SwitchError> {
        let _lock = self.lock();
        atu::set_aging_timeout(self, &regs::ATU, timeout_ms)
    }
}

impl EcidOps for Amethyst {
    fn get_bpe_enable(&self) -> Result<bool, SwitchError> {
        Ok(self.read_field(regs::GLOBAL1, regs::ECID.bpe_reg, regs::ECID.bpe_bit, 1)? == 1)
    }

    fn set_bpe_enable(&self, enable: bool) -> Result<(), SwitchError> {
        let _lock = self.lock();
        self.write_field(
            regs::GLOBAL1,
            regs::ECID.bpe_reg,
            regs::ECID.bpe_bit,
            1,
            enable as u16,
        )?;
        Ok(())
    }

    fn add_entry(&self, entry: &EcidEntry) -> Result<(), SwitchError> {
        let _lock = self.lock();
        ecid::add_entry(self, &regs::ATU, &regs::ECID, entry)
    }

    fn get_entry_next(&self, group: u8, ecid_key: u16) -> Result<EcidEntry, SwitchError> {
        let _lock = self.lock();
        ecid::get_entry_next(self, &regs::ATU, &regs::ECID, group, ecid_key)
    }

    fn find_entry(&self, group: u8, ecid_key: u16) -> Result<EcidEntry, SwitchError> {
        let _lock = self.lock();
        ecid::find_entry(self, &regs::ATU, &regs::ECID, group, ecid_key)
    }

    fn flush_entry(&self, group: u8, ecid_key: u16) -> Result<(), SwitchError> {
        let _lock = self.lock();
        ecid::flush_entry(self, &regs::ATU, &regs::ECID, group, ecid_key)
    }

    fn flush_all(&self) -> Result<(), SwitchError> {
        let _lock = self.lock();
        ecid::flush_all(self, &regs::ATU, &regs::ECID)
    }

    fn entry_count(&self) -> Result<u32, SwitchError> {
        let _lock = self.lock();
        ecid::entry_count(self, &regs::ATU, &regs::ECID)
    }
}

impl ArpOps for Amethyst {
    fn load_uc_entry(&self, ptr: u16, data: &ArpUcData) -> Result<(), SwitchError> {
        let _lock = self.lock();
        arp::load_uc_entry(self, &regs::TCAM, regs::ARP_ENTRIES, ptr, data)
    }

    fn load_mc_entry(&self, ptr: u16, data: &ArpMcData) -> Result<(), SwitchError> {
        let _lock = self.lock();
        arp::load_mc_entry(self, &regs::TCAM, regs::ARP_ENTRIES, ptr, data)
    }

    fn read_entry(&self, ptr: u16) -> Result<ArpData, SwitchError> {
        let _lock = self.lock();
        arp::read_entry(self, &regs::TCAM, regs::ARP_ENTRIES, ptr)
    }

    fn flush_entry(&self, ptr: u16) -> Result<(), SwitchError> {
        let _lock = self.lock();
        arp::flush_entry(self, &regs::TCAM, regs::ARP_ENTRIES, ptr)
    }

    fn flush_all(&self) -> Result<(), SwitchError> {
        let _lock = self.lock();
        arp::flush_all(self, &regs::TCAM, regs::ARP_ENTRIES)
    }
}

impl PirlOps for Amethyst {
    fn initialize(&self) -> Result<(), SwitchError> {
        let _lock = self.lock();
        pirl::initialize(self, &regs::PIRL)
    }

    fn init_resource(&self, port: u8, res: u8) -> Result<(), SwitchError> {
        let _lock = self.lock();
        pirl::init_resource(self, &regs::PIRL, port, res)
    }

    fn write_resource(&self, port: u8, res: u8, data: &PirlData) -> Result<(), SwitchError> {
        let _lock = self.lock();
        pirl::write_resource(self, &regs::PIRL, port, res, data)
    }

    fn read_resource(&self, port: u8, res: u8) -> Result<PirlData, SwitchError> {
        let _lock = self.lock();
        pirl::read_resource(self, &regs::PIRL, port, res)
    }

    fn get_resource_reg(&self, port: u8, res: u8, addr: u8) -> Result<u16, SwitchError> {
        let _lock = self.lock();
        pirl::get_resource_reg(self, &regs::PIRL, port, res, addr)
    }

    fn set_resource_reg(
        &self,
        port: u8,
        res: u8,
        addr: u8,
        value: u16,
    ) -> Result<(), SwitchError> {
        let _lock = self.lock();
        pirl::set_resource_reg(self, &regs::PIRL, port, res, addr, value)
    }
}

impl TcamOps for Amethyst {
    fn flush_all(&self) -> Result<(), SwitchError> {
        let _lock = self.lock();
        tcam::flush_all(self, &regs::TCAM)
    }

    fn flush_entry(&self, id: u16) -> Result<(), SwitchError> {
        let _lock = self.lock();
        tcam::flush_entry(self, &regs::TCAM, id)
    }

    fn load_entry(&self, id: u16, entry: &TcamEntry) -> Result<(), SwitchError> {
        let _lock = self.lock();
        tcam::load_entry(self, &regs::TCAM, id, entry)
    }

    fn read_entry(&self, id: u16) -> Result<TcamEntry, SwitchError> {
        let _lock = self.lock();
        tcam::read_entry(self, &regs::TCAM, id)
    }

    fn get_entry_next(&self, id: Option<u16>) -> Result<(u16, TcamEntry), SwitchError> {
        let _lock = self.lock();
        tcam::get_entry_next(self, &regs::TCAM, id)
    }

    fn find_entry(&self, id: u16) -> Result<TcamEntry, SwitchError> {
        let _lock = self.lock();
        tcam::find_entry(self, &regs::TCAM, id)
    }
}

impl PtpOps for Amethyst {
    fn get_port_ptp_enable(&self, port: u8) -> Result<bool, SwitchError> {
        let _lock = self.lock();
        ptp::get_port_ptp_enable(self, &regs::AVB, port)
    }

    fn set_port_ptp_enable(&self, port: u8, enable: bool) -> Result<(), SwitchError> {
        let _lock = self.lock();
        ptp::set_port_ptp_enable(self, &regs::AVB, port, enable)
    }

    fn get_time_stamp(&self, port: u8, ts_reg: PtpTsReg) -> Result<PtpTsStatus, SwitchError> {
        let _lock = self.lock();
        ptp::get_time_stamp(self, &regs::AVB, port, ts_reg)
    }

    fn get_ptp_global_time(&self) -> Result<PtpTimeStruct, SwitchError> {
        let _lock = self.lock();
        ptp::get_ptp_global_time(self, &regs::AVB)
    }

    fn set_ptp_global_time(&self, time: PtpTimeStruct) -> Result<(), SwitchError> {
        let _lock = self.lock();
        ptp::set_ptp_global_time(self, &regs::AVB, time)
    }

    fn get_int_status(&self) -> Result<PtpIntStatus, SwitchError> {
        let _lock = self.lock();
        ptp::get_int_status(self, &regs::AVB)
    }
}

impl RmonOps for Amethyst {
    fn flush_all(&self) -> Result<(), SwitchError> {
        let _lock = self.lock();
        rmon::flush_all(self, &regs::STATS)
    }

    fn flush_port(&self, port: u8) -> Result<(), SwitchError> {
        let _lock = self.lock();
        rmon::flush_port(self, &regs::STATS, port)
    }

    fn read_counter(&self, port: u8, counter: u8) -> Result<u32, SwitchError> {
        let _lock = self.lock();
        rmon::read_counter(self, &regs::STATS, port, counter)
    }

    fn dump_port(&self, port: u8) -> Result<RmonCounters, SwitchError> {
        let _lock = self.lock();
        rmon::dump_port(self, &regs::STATS, port)
    }
}

impl PhyOps for Amethyst {
    fn read_reg(&self, phy: u8, reg: u8) -> Result<u16, SwitchError> {
        let _lock = self.lock();
        phy::read_reg(self, &regs::SMI_PHY, phy, reg)
    }

    fn write_reg(&self, phy: u8, reg: u8, value: u16) -> Result<(), SwitchError> {
        let _lock = self.lock();
        phy::write_reg(self, &regs::SMI_PHY, phy, reg, value)
    }

    fn reset(&self, phy: u8) -> Result<(), SwitchError> {
        let _lock = self.lock();
        phy::reset(self, &regs::SMI_PHY, phy)
    }

    fn get_loopback(&self, phy: u8) -> Result<bool, SwitchError> {
        let _lock = self.lock();
        phy::get_loopback(self, &regs::SMI_PHY, phy)
    }

    fn set_loopback(&self, phy: u8, enable: bool) -> Result<(), SwitchError> {
        let _lock = self.lock();
        phy::set_loopback(self, &regs::SMI_PHY, phy, enable)
    }

    fn set_speed_duplex(
        &self,
        phy: u8,
        speed: PhySpeed,
        full_duplex: bool,
    ) -> Result<(), SwitchError> {
        let _lock = self.lock();
        phy::set_speed_duplex(self, &regs::SMI_PHY, phy, speed, full_duplex)
    }
}

impl QcOps for Amethyst {
    fn get_queue_ctrl(&self, port: u8, pointer: u8) -> Result<u8, SwitchError> {
        let _lock = self.lock();
        qc::get_queue_ctrl(self, &regs::QC, port, pointer)
    }

    fn set_queue_ctrl(&self, port: u8, pointer: u8, data: u8) -> Result<(), SwitchError> {
        let _lock = self.lock();
        qc::set_queue_ctrl(self, &regs::QC, port, pointer, data)
    }

    fn get_port_sched(&self, port: u8) -> Result<SchedMode, SwitchError> {
        let _lock = self.lock();
        qc::get_port_sched(self, &regs::QC, port)
    }

    fn set_port_sched(&self, port: u8, mode: SchedMode) -> Result<(), SwitchError> {
        let _lock = self.lock();
        qc::set_port_sched(self, &regs::QC, port, mode)
    }
}

impl EepromOps for Amethyst {
    fn read_word(&self, addr: u8) -> Result<u16, SwitchError> {
        let _lock = self.lock();
        eeprom::read_word(self, &regs::EEPROM, addr)
    }

    fn write_word(&self, addr: u8, data: u16) -> Result<(), SwitchError> {
        let _lock = self.lock();
        eeprom::write_word(self, &regs::EEPROM, addr, data)
    }

    fn get_chip_select(&self) -> Result<u8, SwitchError> {
        let _lock = self.lock();
        eeprom::get_chip_select(self, &regs::EEPROM)
    }

    fn set_chip_select(&self, chip_sel: u8) -> Result<(), SwitchError> {
        let _lock = self.lock();
        eeprom::set_chip_select(self, &regs::EEPROM, chip_sel)
    }
}

impl ImpOps for Amethyst {
    fn run(&self, addr: u16) -> Result<(), SwitchError> {
        let _lock = self.lock();
        imp::run(self, &regs::EEPROM, addr)
    }

    fn stop(&self) -> Result<(), SwitchError> {
        let _lock = self.lock();
        imp::stop(self, &regs::EEPROM)
    }

    fn reset(&self) -> Result<(), SwitchError> {
        let _lock = self.lock();
        imp::reset(self, &regs::EEPROM)
    }

    fn write_mem(&self, addr: u16, data: u8) -> Result<(), SwitchError> {
        let _lock = self.lock();
        imp::write_mem(self, &regs::EEPROM, addr, data)
    }

    fn read_mem(&self, addr: u16) -> Result<u8, SwitchError> {
        let _lock = self.lock();
        imp::read_mem(self, &regs::EEPROM, addr)
    }
}

impl RmuOps for Amethyst {
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

impl SwitchImpl for Amethyst {
    fn get_family(&self) -> SwitchFamily {
        SwitchFamily::Amethyst
    }

    fn get_product_num(&self) -> u16 {
        self.product_num
    }

    fn port_count(&self) -> u8 {
        regs::PORT_COUNT
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

    fn ecid(&self) -> Option<&dyn EcidOps> {
        Some(self)
    }

    fn arp(&self) -> Option<&dyn ArpOps> {
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

    fn imp(&self) -> Option<&dyn ImpOps> {
        Some(self)
    }

    fn rmu(&self) -> Option<&dyn RmuOps> {
        Some(self)
    }
}
