// SPDX-FileCopyrightText: © 2024 Marvell Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::error::SwitchError;
use crate::interface::SmiInterface;

use super::communication::RegComms;

/// Convenience trait for register access on an arbitrary switch.
///
/// Every table engine (ATU, TCAM, PIRL, stats, ...) is written against this
/// trait so it works over both SMI addressing modes and over mocked buses in
/// tests.
pub trait HlRegs {
    fn comms_obj(&self) -> (&dyn RegComms, &dyn SmiInterface);

    fn read_reg(&self, dev: u8, reg: u8) -> Result<u16, Box<dyn std::error::Error>> {
        let (reg_if, smi_if) = self.comms_obj();
        reg_if.read_reg(smi_if, dev, reg)
    }

    fn write_reg(&self, dev: u8, reg: u8, value: u16) -> Result<(), Box<dyn std::error::Error>> {
        let (reg_if, smi_if) = self.comms_obj();
        reg_if.write_reg(smi_if, dev, reg, value)
    }

    /// Read-modify-write the bits selected by `mask`.
    fn modify_reg(
        &self,
        dev: u8,
        reg: u8,
        mask: u16,
        value: u16,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let old = self.read_reg(dev, reg)?;
        self.write_reg(dev, reg, (old & !mask) | (value & mask))
    }

    fn read_field(
        &self,
        dev: u8,
        reg: u8,
        offset: u8,
        len: u8,
    ) -> Result<u16, Box<dyn std::error::Error>> {
        let value = self.read_reg(dev, reg)?;
        Ok((value >> offset) & ((1 << len) - 1))
    }

    fn write_field(
        &self,
        dev: u8,
        reg: u8,
        offset: u8,
        len: u8,
        value: u16,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mask = ((1u16 << len) - 1) << offset;
        self.modify_reg(dev, reg, mask, value << offset)
    }
}

/// Poll `bit` of (dev, reg) until it reads back as `target`.
///
/// This is the busy-bit wait every indirect table engine is built on:
/// poll, issue the command, poll again.
pub fn wait_bit<T: HlRegs + ?Sized>(
    comms: &T,
    dev: u8,
    reg: u8,
    bit: u8,
    target: bool,
    what: &'static str,
) -> Result<(), SwitchError> {
    let timeout = std::time::Duration::from_millis(100);
    let start = std::time::Instant::now();

    loop {
        let value = comms.read_reg(dev, reg)?;
        if ((value >> bit) & 1 == 1) == target {
            return Ok(());
        }

        if start.elapsed() > timeout {
            tracing::warn!("timed out waiting for {what} (dev {dev:#x} reg {reg:#x})");
            return Err(SwitchError::Timeout { what, timeout });
        }

        tracing::debug!("{what} still busy, retrying");
        std::thread::sleep(std::time::Duration::from_micros(100));
    }
}
