// SPDX-FileCopyrightText: © 2024 Marvell Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Attached configuration EEPROM, reached through the EEPROM command
//! register in Global2: poll the busy bit, issue the command, poll again.
//! Writes additionally require the write-enable strap to be latched.

use bitfield_struct::bitfield;

use crate::error::SwitchError;

use super::hl_regs::{wait_bit, HlRegs};

pub struct EepromRegs {
    pub global2: u8,
    pub cmd_reg: u8,
    pub data_reg: u8,
}

#[bitfield(u16)]
pub(crate) struct EepromCmdWord {
    pub addr: u8,
    #[bits(2)]
    __: u8,
    /// Reflects the write-enable strap; read-only.
    pub write_en: bool,
    pub running: bool,
    #[bits(3)]
    pub op: u8,
    pub busy: bool,
}

pub(crate) const EEPROM_OP_WRITE: u8 = 0b011;
pub(crate) const EEPROM_OP_READ: u8 = 0b100;

/// Chip-select field of the data register (multiple EEPROM parts).
const EEPROM_CHIP_SEL_OFFSET: u8 = 12;
const EEPROM_CHIP_SEL_LEN: u8 = 3;

pub trait EepromOps {
    fn read_word(&self, addr: u8) -> Result<u16, SwitchError>;
    fn write_word(&self, addr: u8, data: u16) -> Result<(), SwitchError>;
    fn get_chip_select(&self) -> Result<u8, SwitchError>;
    fn set_chip_select(&self, chip_sel: u8) -> Result<(), SwitchError>;
}

fn wait_eeprom<T: HlRegs + ?Sized>(comms: &T, regs: &EepromRegs) -> Result<(), SwitchError> {
    wait_bit(comms, regs.global2, regs.cmd_reg, 15, false, "EEPROM operation")
}

pub(crate) fn read_word<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &EepromRegs,
    addr: u8,
) -> Result<u16, SwitchError> {
    wait_eeprom(comms, regs)?;

    let cmd = EepromCmdWord::new()
        .with_busy(true)
        .with_op(EEPROM_OP_READ)
        .with_addr(addr);
    comms.write_reg(regs.global2, regs.cmd_reg, cmd.into())?;

    wait_eeprom(comms, regs)?;
    Ok(comms.read_reg(regs.global2, regs.data_reg)?)
}

pub(crate) fn write_word<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &EepromRegs,
    addr: u8,
    data: u16,
) -> Result<(), SwitchError> {
    wait_eeprom(comms, regs)?;

    let cmd = EepromCmdWord::from(comms.read_reg(regs.global2, regs.cmd_reg)?);
    if !cmd.write_en() {
        return Err(SwitchError::FeatureNotEnabled("EEPROM write"));
    }

    comms.write_reg(regs.global2, regs.data_reg, data)?;
    let cmd = EepromCmdWord::new()
        .with_busy(true)
        .with_op(EEPROM_OP_WRITE)
        .with_addr(addr);
    comms.write_reg(regs.global2, regs.cmd_reg, cmd.into())?;

    wait_eeprom(comms, regs)
}

pub(crate) fn get_chip_select<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &EepromRegs,
) -> Result<u8, SwitchError> {
    wait_eeprom(comms, regs)?;
    let sel = comms.read_field(
        regs.global2,
        regs.data_reg,
        EEPROM_CHIP_SEL_OFFSET,
        EEPROM_CHIP_SEL_LEN,
    )?;
    Ok(sel as u8)
}

pub(crate) fn set_chip_select<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &EepromRegs,
    chip_sel: u8,
) -> Result<(), SwitchError> {
    if chip_sel >= 1 << EEPROM_CHIP_SEL_LEN {
        return Err(SwitchError::BadParam("chip_sel"));
    }
    wait_eeprom(comms, regs)?;
    comms.write_field(
        regs.global2,
        regs.data_reg,
        EEPROM_CHIP_SEL_OFFSET,
        EEPROM_CHIP_SEL_LEN,
        chip_sel as u16,
    )?;
    Ok(())
}
