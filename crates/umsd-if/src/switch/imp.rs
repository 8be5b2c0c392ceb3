// SPDX-FileCopyrightText: © 2024 Marvell Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The In-chip Management Processor. Its communication registers share the
//! EEPROM command engine: an IMP-register write is an EEPROM command with
//! the register-comm opcode, the comm register in the address field and the
//! payload in the data register.

use crate::error::SwitchError;

use super::eeprom::EepromRegs;
use super::hl_regs::{wait_bit, HlRegs};

use bitfield_struct::bitfield;

#[bitfield(u16)]
struct ImpCmdWord {
    pub addr: u8,
    #[bits(4)]
    __: u8,
    #[bits(3)]
    pub op: u8,
    pub busy: bool,
}

/// EEPROM-engine opcodes for IMP register comm.
const IMP_OP_WRITE_COMM: u8 = 0b111;
const IMP_OP_READ_COMM: u8 = 0b110;

// IMP comm registers.
const IMP_COMM_OPCODE: u8 = 0x08;
const IMP_COMM_ADDR_LO: u8 = 0x0A;
const IMP_COMM_ADDR_HI: u8 = 0x0B;
const IMP_COMM_DATA: u8 = 0x0C;

// Opcodes understood by the IMP bootloader.
const IMP_OPCODE_RUN: u16 = 0x01;
const IMP_OPCODE_STOP: u16 = 0x02;
const IMP_OPCODE_RESET: u16 = 0x03;

pub trait ImpOps {
    /// Point the IMP at `addr` and start executing.
    fn run(&self, addr: u16) -> Result<(), SwitchError>;
    fn stop(&self) -> Result<(), SwitchError>;
    fn reset(&self) -> Result<(), SwitchError>;
    fn write_mem(&self, addr: u16, data: u8) -> Result<(), SwitchError>;
    fn read_mem(&self, addr: u16) -> Result<u8, SwitchError>;
}

fn wait_imp<T: HlRegs + ?Sized>(comms: &T, regs: &EepromRegs) -> Result<(), SwitchError> {
    wait_bit(comms, regs.global2, regs.cmd_reg, 15, false, "IMP comm")
}

fn comm_write<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &EepromRegs,
    comm_reg: u8,
    value: u16,
) -> Result<(), SwitchError> {
    wait_imp(comms, regs)?;
    comms.write_reg(regs.global2, regs.data_reg, value)?;
    let cmd = ImpCmdWord::new()
        .with_busy(true)
        .with_op(IMP_OP_WRITE_COMM)
        .with_addr(comm_reg);
    comms.write_reg(regs.global2, regs.cmd_reg, cmd.into())?;
    wait_imp(comms, regs)
}

fn comm_read<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &EepromRegs,
    comm_reg: u8,
) -> Result<u16, SwitchError> {
    wait_imp(comms, regs)?;
    let cmd = ImpCmdWord::new()
        .with_busy(true)
        .with_op(IMP_OP_READ_COMM)
        .with_addr(comm_reg);
    comms.write_reg(regs.global2, regs.cmd_reg, cmd.into())?;
    wait_imp(comms, regs)?;
    Ok(comms.read_reg(regs.global2, regs.data_reg)?)
}

fn set_addr<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &EepromRegs,
    addr: u16,
) -> Result<(), SwitchError> {
    comm_write(comms, regs, IMP_COMM_ADDR_LO, addr & 0xFF)?;
    comm_write(comms, regs, IMP_COMM_ADDR_HI, addr >> 8)
}

pub(crate) fn run<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &EepromRegs,
    addr: u16,
) -> Result<(), SwitchError> {
    // Halt before moving the PC so we never execute from a half-set address.
    comm_write(comms, regs, IMP_COMM_OPCODE, IMP_OPCODE_STOP)?;
    set_addr(comms, regs, addr)?;
    comm_write(comms, regs, IMP_COMM_OPCODE, IMP_OPCODE_RUN)
}

pub(crate) fn stop<T: HlRegs + ?Sized>(comms: &T, regs: &EepromRegs) -> Result<(), SwitchError> {
    comm_write(comms, regs, IMP_COMM_OPCODE, IMP_OPCODE_STOP)
}

pub(crate) fn reset<T: HlRegs + ?Sized>(comms: &T, regs: &EepromRegs) -> Result<(), SwitchError> {
    comm_write(comms, regs, IMP_COMM_OPCODE, IMP_OPCODE_RESET)
}

pub(crate) fn write_mem<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &EepromRegs,
    addr: u16,
    data: u8,
) -> Result<(), SwitchError> {
    set_addr(comms, regs, addr)?;
    comm_write(comms, regs, IMP_COMM_DATA, data as u16)
}

pub(crate) fn read_mem<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &EepromRegs,
    addr: u16,
) -> Result<u8, SwitchError> {
    set_addr(comms, regs, addr)?;
    Ok(comm_read(comms, regs, IMP_COMM_DATA)? as u8)
}
