// SPDX-FileCopyrightText: © 2024 Marvell Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

use bitfield_struct::bitfield;

use crate::interface::SmiInterface;

/// SMI Command register layout used for multi-chip (indirect) addressing.
/// The pair lives at offsets 0 and 1 of the chip's single SMI address.
#[bitfield(u16)]
pub struct SmiCmd {
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

pub const SMI_CMD_OP_WRITE: u8 = 0b01;
pub const SMI_CMD_OP_READ: u8 = 0b10;

const SMI_CMD_REG: u8 = 0x00;
const SMI_DATA_REG: u8 = 0x01;

/// How many times the indirect path polls the command busy bit before
/// giving up. The silicon completes an indirect cycle in a handful of MDIO
/// frames, so this is generous.
const SMI_BUSY_RETRIES: usize = 100;

/// Maps a (device address, register) pair onto the SMI bus.
///
/// This is the seam between the chip logic and the two silicon addressing
/// modes. Chip code never talks to `SmiInterface` directly for register
/// access; it always goes through one of these.
pub trait RegComms: Send + Sync {
    fn read_reg(
        &self,
        smi_if: &dyn SmiInterface,
        dev: u8,
        reg: u8,
    ) -> Result<u16, Box<dyn std::error::Error>>;

    fn write_reg(
        &self,
        smi_if: &dyn SmiInterface,
        dev: u8,
        reg: u8,
        value: u16,
    ) -> Result<(), Box<dyn std::error::Error>>;
}

/// Single-chip addressing: every internal device answers on its own SMI
/// address, so register access is a plain MDIO read/write.
pub struct DirectSmi;

impl RegComms for DirectSmi {
    fn read_reg(
        &self,
        smi_if: &dyn SmiInterface,
        dev: u8,
        reg: u8,
    ) -> Result<u16, Box<dyn std::error::Error>> {
        smi_if.smi_read(dev, reg)
    }

    fn write_reg(
        &self,
        smi_if: &dyn SmiInterface,
        dev: u8,
        reg: u8,
        value: u16,
    ) -> Result<(), Box<dyn std::error::Error>> {
        smi_if.smi_write(dev, reg, value)
    }
}

/// Multi-chip addressing: the switch claims a single SMI address and all
/// internal registers are reached through the SMI Command/Data pair, with a
/// busy bit gating each cycle.
pub struct MultiChipSmi {
    pub smi_addr: u8,
}

impl MultiChipSmi {
    fn wait_smi_ready(
        &self,
        smi_if: &dyn SmiInterface,
    ) -> Result<(), Box<dyn std::error::Error>> {
        for _ in 0..SMI_BUSY_RETRIES {
            let cmd = SmiCmd::from(smi_if.smi_read(self.smi_addr, SMI_CMD_REG)?);
            if !cmd.busy() {
                return Ok(());
            }
        }

        tracing::warn!("SMI command register stuck busy on address {}", self.smi_addr);
        Err("SMI command register stuck busy".to_string().into())
    }
}

impl RegComms for MultiChipSmi {
    fn read_reg(
        &self,
        smi_if: &dyn SmiInterface,
        dev: u8,
        reg: u8,
    ) -> Result<u16, Box<dyn std::error::Error>> {
        self.wait_smi_ready(smi_if)?;

        let cmd = SmiCmd::new()
            .with_busy(true)
            .with_clause22(true)
            .with_op(SMI_CMD_OP_READ)
            .with_dev(dev)
            .with_reg(reg);
        smi_if.smi_write(self.smi_addr, SMI_CMD_REG, cmd.into())?;

        self.wait_smi_ready(smi_if)?;

        smi_if.smi_read(self.smi_addr, SMI_DATA_REG)
    }

    fn write_reg(
        &self,
        smi_if: &dyn SmiInterface,
        dev: u8,
        reg: u8,
        value: u16,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.wait_smi_ready(smi_if)?;

        smi_if.smi_write(self.smi_addr, SMI_DATA_REG, value)?;

        let cmd = SmiCmd::new()
            .with_busy(true)
            .with_clause22(true)
            .with_op(SMI_CMD_OP_WRITE)
            .with_dev(dev)
            .with_reg(reg);
        smi_if.smi_write(self.smi_addr, SMI_CMD_REG, cmd.into())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use std::sync::Mutex;

    #[derive(Default)]
    struct TraceBus {
        writes: Mutex<Vec<(u8, u8, u16)>>,
        regs: Mutex<std::collections::HashMap<(u8, u8), u16>>,
    }

    impl SmiInterface for TraceBus {
        fn smi_read(&self, dev: u8, reg: u8) -> Result<u16, Box<dyn std::error::Error>> {
            Ok(*self.regs.lock().unwrap().get(&(dev, reg)).unwrap_or(&0))
        }

        fn smi_write(
            &self,
            dev: u8,
            reg: u8,
            value: u16,
        ) -> Result<(), Box<dyn std::error::Error>> {
            self.writes.lock().unwrap().push((dev, reg, value));
            // Command cycles complete instantly on the fake bus.
            let stored = if reg == SMI_CMD_REG {
                SmiCmd::from(value).with_busy(false).into()
            } else {
                value
            };
            self.regs.lock().unwrap().insert((dev, reg), stored);
            Ok(())
        }

        fn rmu_request(
            &self,
            _req: &[u8],
            _resp: &mut [u8],
        ) -> Result<usize, Box<dyn std::error::Error>> {
            unimplemented!()
        }

        fn get_device_info(
            &self,
        ) -> Result<Option<crate::interface::DeviceInfo>, Box<dyn std::error::Error>> {
            Ok(None)
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    #[test]
    fn smi_cmd_packing() {
        let cmd = SmiCmd::new()
            .with_busy(true)
            .with_clause22(true)
            .with_op(SMI_CMD_OP_READ)
            .with_dev(0x1B)
            .with_reg(0x0B);
        assert_eq!(u16::from(cmd), 0x9B6B);

        let cmd = SmiCmd::from(0x9B6Bu16);
        assert!(cmd.busy());
        assert_eq!(cmd.op(), SMI_CMD_OP_READ);
        assert_eq!(cmd.dev(), 0x1B);
        assert_eq!(cmd.reg(), 0x0B);
    }

    #[test]
    fn multichip_write_sequence() {
        let bus = TraceBus::default();
        let comms = MultiChipSmi { smi_addr: 0x04 };

        comms.write_reg(&bus, 0x1B, 0x0B, 0xB000).unwrap();

        let writes = bus.writes.lock().unwrap();
        // Data first, then the command that latches it.
        assert_eq!(writes[0], (0x04, SMI_DATA_REG, 0xB000));
        let cmd = SmiCmd::from(writes[1].2);
        assert_eq!(writes[1].0, 0x04);
        assert_eq!(writes[1].1, SMI_CMD_REG);
        assert!(cmd.busy());
        assert_eq!(cmd.op(), SMI_CMD_OP_WRITE);
        assert_eq!(cmd.dev(), 0x1B);
        assert_eq!(cmd.reg(), 0x0B);
    }

    #[test]
    fn multichip_read_roundtrip() {
        let bus = TraceBus::default();
        bus.regs
            .lock()
            .unwrap()
            .insert((0x04, SMI_DATA_REG), 0x1234);
        let comms = MultiChipSmi { smi_addr: 0x04 };

        assert_eq!(comms.read_reg(&bus, 0x1C, 0x14).unwrap(), 0x1234);
    }
}
