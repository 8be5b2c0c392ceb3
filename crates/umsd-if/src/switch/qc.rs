// SPDX-FileCopyrightText: © 2024 Marvell Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-port queue control. Queue parameters hide behind a pointered
//! register in each port's block: write the pointer with the update bit for
//! a write, write it bare and read back for a read.

use bitfield_struct::bitfield;
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::{FromPrimitive, ToPrimitive};

use crate::error::SwitchError;

use super::hl_regs::HlRegs;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum SchedMode {
    /// Weighted round robin across all queues.
    #[default]
    Wrr = 0,
    /// Strict priority on the top queue, WRR below.
    StrictQ7 = 1,
    /// Strict priority on the top two queues.
    StrictQ7Q6 = 2,
    /// Strict priority everywhere.
    Strict = 3,
}

pub struct QcRegs {
    /// Device address of port 0's register block.
    pub port_base: u8,
    /// Pointered queue-control register within the port block.
    pub qc_reg: u8,
    pub port_count: u8,
}

#[bitfield(u16)]
struct QcWord {
    pub data: u8,
    #[bits(7)]
    pub pointer: u8,
    pub update: bool,
}

/// Queue-control pointer holding the scheduling mode.
const QC_POINTER_SCHED: u8 = 0x17;

pub trait QcOps {
    fn get_queue_ctrl(&self, port: u8, pointer: u8) -> Result<u8, SwitchError>;
    fn set_queue_ctrl(&self, port: u8, pointer: u8, data: u8) -> Result<(), SwitchError>;
    fn get_port_sched(&self, port: u8) -> Result<SchedMode, SwitchError>;
    fn set_port_sched(&self, port: u8, mode: SchedMode) -> Result<(), SwitchError>;
}

fn check_args(regs: &QcRegs, port: u8, pointer: u8) -> Result<(), SwitchError> {
    if port >= regs.port_count {
        return Err(SwitchError::BadParam("port"));
    }
    if pointer > 0x7F {
        return Err(SwitchError::BadParam("pointer"));
    }
    Ok(())
}

pub(crate) fn get_queue_ctrl<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &QcRegs,
    port: u8,
    pointer: u8,
) -> Result<u8, SwitchError> {
    check_args(regs, port, pointer)?;

    let word = QcWord::new().with_pointer(pointer);
    comms.write_reg(regs.port_base + port, regs.qc_reg, word.into())?;
    let word = QcWord::from(comms.read_reg(regs.port_base + port, regs.qc_reg)?);
    Ok(word.data())
}

pub(crate) fn set_queue_ctrl<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &QcRegs,
    port: u8,
    pointer: u8,
    data: u8,
) -> Result<(), SwitchError> {
    check_args(regs, port, pointer)?;

    let word = QcWord::new()
        .with_update(true)
        .with_pointer(pointer)
        .with_data(data);
    comms.write_reg(regs.port_base + port, regs.qc_reg, word.into())?;
    Ok(())
}

pub(crate) fn get_port_sched<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &QcRegs,
    port: u8,
) -> Result<SchedMode, SwitchError> {
    let data = get_queue_ctrl(comms, regs, port, QC_POINTER_SCHED)?;
    SchedMode::from_u8(data & 0x3).ok_or(SwitchError::BadParam("sched mode"))
}

pub(crate) fn set_port_sched<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &QcRegs,
    port: u8,
    mode: SchedMode,
) -> Result<(), SwitchError> {
    set_queue_ctrl(
        comms,
        regs,
        port,
        QC_POINTER_SCHED,
        mode.to_u8().unwrap_or_default(),
    )
}
