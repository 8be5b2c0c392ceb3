// SPDX-FileCopyrightText: © 2024 Marvell Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Internal PHY access. On chips whose PHYs are not directly addressable the
//! access goes through the SMI PHY command/data pair in Global2, one
//! busy-polled cycle per PHY register.

use bitfield_struct::bitfield;

use crate::error::SwitchError;

use super::hl_regs::{wait_bit, HlRegs};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhySpeed {
    Mb10,
    Mb100,
    Mb1000,
}

/// How the indirect SMI PHY unit reaches a PHY.
pub struct SmiPhyRegs {
    pub global2: u8,
    pub cmd_reg: u8,
    pub data_reg: u8,
    /// SMI sub-address of the first internal PHY.
    pub phy_base: u8,
    pub phy_count: u8,
}

#[bitfield(u16)]
struct SmiPhyCmdWord {
    #[bits(5)]
    pub reg: u8,
    #[bits(5)]
    pub dev: u8,
    #[bits(2)]
    pub op: u8,
    pub clause22: bool,
    #[bits(2)]
    __: u8,
    pub busy: bool,
}

const SMI_PHY_OP_WRITE: u8 = 0b01;
const SMI_PHY_OP_READ: u8 = 0b10;

// IEEE 802.3 clause 22 control register bits.
const PHY_CONTROL_REG: u8 = 0x00;
const PHY_RESET: u16 = 1 << 15;
const PHY_LOOPBACK: u16 = 1 << 14;
const PHY_SPEED_LSB: u16 = 1 << 13;
const PHY_AUTONEG: u16 = 1 << 12;
const PHY_DUPLEX: u16 = 1 << 8;
const PHY_SPEED_MSB: u16 = 1 << 6;

pub trait PhyOps {
    fn read_reg(&self, phy: u8, reg: u8) -> Result<u16, SwitchError>;
    fn write_reg(&self, phy: u8, reg: u8, value: u16) -> Result<(), SwitchError>;
    fn reset(&self, phy: u8) -> Result<(), SwitchError>;
    fn get_loopback(&self, phy: u8) -> Result<bool, SwitchError>;
    fn set_loopback(&self, phy: u8, enable: bool) -> Result<(), SwitchError>;
    /// Force speed and duplex, disabling auto-negotiation.
    fn set_speed_duplex(&self, phy: u8, speed: PhySpeed, full_duplex: bool)
        -> Result<(), SwitchError>;
}

fn wait_smi_phy<T: HlRegs + ?Sized>(comms: &T, regs: &SmiPhyRegs) -> Result<(), SwitchError> {
    wait_bit(comms, regs.global2, regs.cmd_reg, 15, false, "SMI PHY operation")
}

fn check_phy(regs: &SmiPhyRegs, phy: u8) -> Result<(), SwitchError> {
    if phy >= regs.phy_count {
        return Err(SwitchError::BadParam("phy"));
    }
    Ok(())
}

pub(crate) fn read_reg<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &SmiPhyRegs,
    phy: u8,
    reg: u8,
) -> Result<u16, SwitchError> {
    check_phy(regs, phy)?;
    if reg > 0x1F {
        return Err(SwitchError::BadParam("reg"));
    }

    wait_smi_phy(comms, regs)?;
    let cmd = SmiPhyCmdWord::new()
        .with_busy(true)
        .with_clause22(true)
        .with_op(SMI_PHY_OP_READ)
        .with_dev(regs.phy_base + phy)
        .with_reg(reg);
    comms.write_reg(regs.global2, regs.cmd_reg, cmd.into())?;
    wait_smi_phy(comms, regs)?;
    Ok(comms.read_reg(regs.global2, regs.data_reg)?)
}

pub(crate) fn write_reg<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &SmiPhyRegs,
    phy: u8,
    reg: u8,
    value: u16,
) -> Result<(), SwitchError> {
    check_phy(regs, phy)?;
    if reg > 0x1F {
        return Err(SwitchError::BadParam("reg"));
    }

    wait_smi_phy(comms, regs)?;
    comms.write_reg(regs.global2, regs.data_reg, value)?;
    let cmd = SmiPhyCmdWord::new()
        .with_busy(true)
        .with_clause22(true)
        .with_op(SMI_PHY_OP_WRITE)
        .with_dev(regs.phy_base + phy)
        .with_reg(reg);
    comms.write_reg(regs.global2, regs.cmd_reg, cmd.into())?;
    wait_smi_phy(comms, regs)
}

pub(crate) fn reset<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &SmiPhyRegs,
    phy: u8,
) -> Result<(), SwitchError> {
    let control = read_reg(comms, regs, phy, PHY_CONTROL_REG)?;
    write_reg(comms, regs, phy, PHY_CONTROL_REG, control | PHY_RESET)
}

pub(crate) fn get_loopback<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &SmiPhyRegs,
    phy: u8,
) -> Result<bool, SwitchError> {
    Ok(read_reg(comms, regs, phy, PHY_CONTROL_REG)? & PHY_LOOPBACK != 0)
}

pub(crate) fn set_loopback<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &SmiPhyRegs,
    phy: u8,
    enable: bool,
) -> Result<(), SwitchError> {
    let control = read_reg(comms, regs, phy, PHY_CONTROL_REG)?;
    let control = if enable {
        control | PHY_LOOPBACK
    } else {
        control & !PHY_LOOPBACK
    };
    write_reg(comms, regs, phy, PHY_CONTROL_REG, control)
}

pub(crate) fn set_speed_duplex<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &SmiPhyRegs,
    phy: u8,
    speed: PhySpeed,
    full_duplex: bool,
) -> Result<(), SwitchError> {
    let mut control = read_reg(comms, regs, phy, PHY_CONTROL_REG)?;

    control &= !(PHY_AUTONEG | PHY_SPEED_LSB | PHY_SPEED_MSB | PHY_DUPLEX);
    match speed {
        PhySpeed::Mb10 => {}
        PhySpeed::Mb100 => control |= PHY_SPEED_LSB,
        PhySpeed::Mb1000 => control |= PHY_SPEED_MSB,
    }
    if full_duplex {
        control |= PHY_DUPLEX;
    }

    // A forced-mode change only takes effect on a soft reset.
    write_reg(comms, regs, phy, PHY_CONTROL_REG, control | PHY_RESET)
}
