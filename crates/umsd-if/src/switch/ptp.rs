// SPDX-FileCopyrightText: © 2024 Marvell Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

//! PTP hardware timestamping. All PTP/TAI registers sit behind the AVB
//! command/data pair in Global2; each access is one busy-polled indirect
//! cycle.

use bitfield_struct::bitfield;
use serde::{Deserialize, Serialize};

use crate::error::SwitchError;

use super::hl_regs::{wait_bit, HlRegs};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PtpTimeStruct {
    /// Free-running PTP global time (TAI), in clock ticks.
    pub time: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PtpTsStatus {
    pub is_valid: bool,
    pub time_stamp: u32,
    pub seq_id: u16,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PtpIntStatus {
    pub port_int_vec: u16,
    pub tai_trig_int: bool,
    pub tai_event_int: bool,
}

/// Which capture slot of a port to read a timestamp from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PtpTsReg {
    /// Arrival 0 (SYNC et al).
    Arr0,
    /// Arrival 1 (PDELAY).
    Arr1,
    /// Departure.
    Dep,
}

pub struct AvbRegs {
    pub global2: u8,
    pub cmd_reg: u8,
    pub data_reg: u8,
    pub port_count: u8,
}

#[bitfield(u16)]
struct AvbCmdWord {
    #[bits(5)]
    pub addr: u8,
    #[bits(3)]
    pub block: u8,
    #[bits(4)]
    pub port: u8,
    #[bits(3)]
    pub op: u8,
    pub busy: bool,
}

const AVB_OP_READ: u8 = 0b010;
const AVB_OP_WRITE: u8 = 0b011;

const AVB_BLOCK_PTP_PORT: u8 = 0;
const AVB_BLOCK_PTP_GLOBAL: u8 = 1;

/// The TAI/global-port value used when addressing the global block.
const AVB_GLOBAL_PORT: u8 = 0xF;

// PTP per-port register addresses within the port block.
const PTP_PORT_CONFIG: u8 = 0x00;
const PTP_ARR0_STATUS: u8 = 0x08;
const PTP_ARR1_STATUS: u8 = 0x0C;
const PTP_DEP_STATUS: u8 = 0x10;

// Global block addresses.
const PTP_GLOBAL_TIME_LO: u8 = 0x0E;
const PTP_GLOBAL_TIME_HI: u8 = 0x0F;
const PTP_INT_STATUS: u8 = 0x08;

pub trait PtpOps {
    fn get_port_ptp_enable(&self, port: u8) -> Result<bool, SwitchError>;
    fn set_port_ptp_enable(&self, port: u8, enable: bool) -> Result<(), SwitchError>;
    fn get_time_stamp(&self, port: u8, ts_reg: PtpTsReg) -> Result<PtpTsStatus, SwitchError>;
    fn get_ptp_global_time(&self) -> Result<PtpTimeStruct, SwitchError>;
    fn set_ptp_global_time(&self, time: PtpTimeStruct) -> Result<(), SwitchError>;
    fn get_int_status(&self) -> Result<PtpIntStatus, SwitchError>;
}

fn wait_avb<T: HlRegs + ?Sized>(comms: &T, regs: &AvbRegs) -> Result<(), SwitchError> {
    wait_bit(comms, regs.global2, regs.cmd_reg, 15, false, "AVB operation")
}

fn avb_read<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &AvbRegs,
    port: u8,
    block: u8,
    addr: u8,
) -> Result<u16, SwitchError> {
    wait_avb(comms, regs)?;
    let cmd = AvbCmdWord::new()
        .with_busy(true)
        .with_op(AVB_OP_READ)
        .with_port(port)
        .with_block(block)
        .with_addr(addr);
    comms.write_reg(regs.global2, regs.cmd_reg, cmd.into())?;
    wait_avb(comms, regs)?;
    Ok(comms.read_reg(regs.global2, regs.data_reg)?)
}

fn avb_write<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &AvbRegs,
    port: u8,
    block: u8,
    addr: u8,
    value: u16,
) -> Result<(), SwitchError> {
    wait_avb(comms, regs)?;
    comms.write_reg(regs.global2, regs.data_reg, value)?;
    let cmd = AvbCmdWord::new()
        .with_busy(true)
        .with_op(AVB_OP_WRITE)
        .with_port(port)
        .with_block(block)
        .with_addr(addr);
    comms.write_reg(regs.global2, regs.cmd_reg, cmd.into())?;
    wait_avb(comms, regs)
}

fn check_port(regs: &AvbRegs, port: u8) -> Result<(), SwitchError> {
    if port >= regs.port_count {
        return Err(SwitchError::BadParam("port"));
    }
    Ok(())
}

pub(crate) fn get_port_ptp_enable<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &AvbRegs,
    port: u8,
) -> Result<bool, SwitchError> {
    check_port(regs, port)?;
    let config = avb_read(comms, regs, port, AVB_BLOCK_PTP_PORT, PTP_PORT_CONFIG)?;
    // Bit 0 disables PTP on the port.
    Ok(config & 1 == 0)
}

pub(crate) fn set_port_ptp_enable<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &AvbRegs,
    port: u8,
    enable: bool,
) -> Result<(), SwitchError> {
    check_port(regs, port)?;
    let config = avb_read(comms, regs, port, AVB_BLOCK_PTP_PORT, PTP_PORT_CONFIG)?;
    let config = if enable { config & !1 } else { config | 1 };
    avb_write(comms, regs, port, AVB_BLOCK_PTP_PORT, PTP_PORT_CONFIG, config)
}

pub(crate) fn get_time_stamp<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &AvbRegs,
    port: u8,
    ts_reg: PtpTsReg,
) -> Result<PtpTsStatus, SwitchError> {
    check_port(regs, port)?;

    let base = match ts_reg {
        PtpTsReg::Arr0 => PTP_ARR0_STATUS,
        PtpTsReg::Arr1 => PTP_ARR1_STATUS,
        PtpTsReg::Dep => PTP_DEP_STATUS,
    };

    let status = avb_read(comms, regs, port, AVB_BLOCK_PTP_PORT, base)?;
    let ts_lo = avb_read(comms, regs, port, AVB_BLOCK_PTP_PORT, base + 1)?;
    let ts_hi = avb_read(comms, regs, port, AVB_BLOCK_PTP_PORT, base + 2)?;
    let seq_id = avb_read(comms, regs, port, AVB_BLOCK_PTP_PORT, base + 3)?;

    Ok(PtpTsStatus {
        is_valid: status & 1 == 1,
        time_stamp: ((ts_hi as u32) << 16) | ts_lo as u32,
        seq_id,
    })
}

pub(crate) fn get_ptp_global_time<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &AvbRegs,
) -> Result<PtpTimeStruct, SwitchError> {
    let lo = avb_read(
        comms,
        regs,
        AVB_GLOBAL_PORT,
        AVB_BLOCK_PTP_GLOBAL,
        PTP_GLOBAL_TIME_LO,
    )?;
    let hi = avb_read(
        comms,
        regs,
        AVB_GLOBAL_PORT,
        AVB_BLOCK_PTP_GLOBAL,
        PTP_GLOBAL_TIME_HI,
    )?;
    Ok(PtpTimeStruct {
        time: ((hi as u32) << 16) | lo as u32,
    })
}

pub(crate) fn set_ptp_global_time<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &AvbRegs,
    time: PtpTimeStruct,
) -> Result<(), SwitchError> {
    avb_write(
        comms,
        regs,
        AVB_GLOBAL_PORT,
        AVB_BLOCK_PTP_GLOBAL,
        PTP_GLOBAL_TIME_LO,
        time.time as u16,
    )?;
    avb_write(
        comms,
        regs,
        AVB_GLOBAL_PORT,
        AVB_BLOCK_PTP_GLOBAL,
        PTP_GLOBAL_TIME_HI,
        (time.time >> 16) as u16,
    )
}

pub(crate) fn get_int_status<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &AvbRegs,
) -> Result<PtpIntStatus, SwitchError> {
    let status = avb_read(
        comms,
        regs,
        AVB_GLOBAL_PORT,
        AVB_BLOCK_PTP_GLOBAL,
        PTP_INT_STATUS,
    )?;
    Ok(PtpIntStatus {
        port_int_vec: status & 0x7FF,
        tai_trig_int: status & (1 << 14) != 0,
        tai_event_int: status & (1 << 15) != 0,
    })
}
