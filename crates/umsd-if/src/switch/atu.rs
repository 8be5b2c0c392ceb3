// SPDX-FileCopyrightText: © 2024 Marvell Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

use bitfield_struct::bitfield;
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::SwitchError;

use super::hl_regs::{wait_bit, HlRegs};

/// One row of the MAC address table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtuEntry {
    pub mac: [u8; 6],
    /// When set, `port_vec` holds a LAG id instead of a port vector.
    pub lag: bool,
    pub port_vec: u16,
    pub db_num: u16,
    /// 4-bit hardware entry state; 0 means invalid, 0xE/0xF are the static
    /// unicast states. The encoding of the values in between is silicon
    /// defined and passed through untouched.
    pub entry_state: u8,
    pub fpri: u8,
    pub qpri: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlushCmd {
    All,
    NonStatic,
}

#[derive(Clone, Copy, Debug, FromPrimitive, ToPrimitive)]
pub(crate) enum AtuOpCode {
    FlushAll = 1,
    FlushNonStatic = 2,
    LoadPurge = 3,
    GetNext = 4,
    FlushAllInDb = 5,
    FlushNonStaticInDb = 6,
}

#[bitfield(u16)]
pub(crate) struct AtuOpWord {
    #[bits(8)]
    __: u8,
    #[bits(3)]
    pub mac_qpri: u8,
    #[bits(1)]
    _pad: u8,
    #[bits(3)]
    pub op: u8,
    pub busy: bool,
}

#[bitfield(u16)]
pub(crate) struct AtuDataWord {
    #[bits(4)]
    pub state: u8,
    #[bits(11)]
    pub port_vec: u16,
    pub lag: bool,
}

#[bitfield(u16)]
pub(crate) struct AtuFidWord {
    #[bits(12)]
    pub fid: u16,
    #[bits(3)]
    pub mac_fpri: u8,
    __: bool,
}

/// Where the ATU engine lives on a given chip. Built from the per-chip
/// register constants.
pub struct AtuRegs {
    pub global1: u8,
    pub fid_reg: u8,
    pub ctrl_reg: u8,
    pub op_reg: u8,
    pub data_reg: u8,
    pub mac_regs: [u8; 3],
    /// Granularity of the age-time field in milliseconds.
    pub age_step_ms: u32,
    pub port_count: u8,
}

/// Address-table operations, dispatched through the per-chip vtable.
pub trait AtuOps {
    fn add_entry(&self, entry: &AtuEntry) -> Result<(), SwitchError>;
    fn get_entry_next(&self, mac: [u8; 6]) -> Result<AtuEntry, SwitchError>;
    fn find_entry(&self, mac: [u8; 6]) -> Result<AtuEntry, SwitchError>;
    fn del_entry(&self, mac: [u8; 6], db_num: u16) -> Result<(), SwitchError>;
    fn flush(&self, cmd: FlushCmd) -> Result<(), SwitchError>;
    fn flush_in_db(&self, cmd: FlushCmd, db_num: u16) -> Result<(), SwitchError>;
    fn get_aging_timeout(&self) -> Result<u32, SwitchError>;
    fn set_aging_timeout(&self, timeout_ms: u32) -> Result<(), SwitchError>;
}

fn wait_atu<T: HlRegs + ?Sized>(comms: &T, regs: &AtuRegs) -> Result<(), SwitchError> {
    wait_bit(comms, regs.global1, regs.op_reg, 15, false, "ATU operation")
}

fn write_mac<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &AtuRegs,
    mac: &[u8; 6],
) -> Result<(), SwitchError> {
    for (i, reg) in regs.mac_regs.iter().enumerate() {
        let word = ((mac[i * 2] as u16) << 8) | mac[i * 2 + 1] as u16;
        comms.write_reg(regs.global1, *reg, word)?;
    }
    Ok(())
}

fn read_mac<T: HlRegs + ?Sized>(comms: &T, regs: &AtuRegs) -> Result<[u8; 6], SwitchError> {
    let mut mac = [0u8; 6];
    for (i, reg) in regs.mac_regs.iter().enumerate() {
        let word = comms.read_reg(regs.global1, *reg)?;
        mac[i * 2] = (word >> 8) as u8;
        mac[i * 2 + 1] = word as u8;
    }
    Ok(mac)
}

fn start_op<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &AtuRegs,
    op: AtuOpCode,
    qpri: u8,
) -> Result<(), SwitchError> {
    let word = AtuOpWord::new()
        .with_busy(true)
        .with_op(op.to_u8().unwrap_or_default())
        .with_mac_qpri(qpri);
    comms.write_reg(regs.global1, regs.op_reg, word.into())?;
    wait_atu(comms, regs)
}

pub(crate) fn load_entry<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &AtuRegs,
    entry: &AtuEntry,
) -> Result<(), SwitchError> {
    if entry.db_num >= 4096 {
        return Err(SwitchError::BadParam("db_num"));
    }
    if entry.entry_state > 0xF {
        return Err(SwitchError::BadParam("entry_state"));
    }
    if !entry.lag && entry.port_vec >> regs.port_count != 0 {
        return Err(SwitchError::BadParam("port_vec"));
    }
    if entry.fpri > 7 || entry.qpri > 7 {
        return Err(SwitchError::BadParam("priority"));
    }

    wait_atu(comms, regs)?;

    let fid = AtuFidWord::new()
        .with_fid(entry.db_num)
        .with_mac_fpri(entry.fpri);
    comms.write_reg(regs.global1, regs.fid_reg, fid.into())?;

    write_mac(comms, regs, &entry.mac)?;

    let data = AtuDataWord::new()
        .with_state(entry.entry_state)
        .with_port_vec(entry.port_vec)
        .with_lag(entry.lag);
    comms.write_reg(regs.global1, regs.data_reg, data.into())?;

    start_op(comms, regs, AtuOpCode::LoadPurge, entry.qpri)
}

pub(crate) fn get_next<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &AtuRegs,
    mac: [u8; 6],
    db_num: u16,
) -> Result<AtuEntry, SwitchError> {
    if db_num >= 4096 {
        return Err(SwitchError::BadParam("db_num"));
    }

    wait_atu(comms, regs)?;

    let fid = AtuFidWord::new().with_fid(db_num);
    comms.write_reg(regs.global1, regs.fid_reg, fid.into())?;
    write_mac(comms, regs, &mac)?;
    start_op(comms, regs, AtuOpCode::GetNext, 0)?;

    let found_mac = read_mac(comms, regs)?;
    let data = AtuDataWord::from(comms.read_reg(regs.global1, regs.data_reg)?);

    // The table signals "nothing past here" with the broadcast address and
    // an invalid state.
    if data.state() == 0 {
        return Err(SwitchError::NoSuchEntry);
    }

    let fid = AtuFidWord::from(comms.read_reg(regs.global1, regs.fid_reg)?);
    let op = AtuOpWord::from(comms.read_reg(regs.global1, regs.op_reg)?);

    Ok(AtuEntry {
        mac: found_mac,
        lag: data.lag(),
        port_vec: data.port_vec(),
        db_num: fid.fid(),
        entry_state: data.state(),
        fpri: fid.mac_fpri(),
        qpri: op.mac_qpri(),
    })
}

pub(crate) fn flush_op<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &AtuRegs,
    cmd: FlushCmd,
    db_num: Option<u16>,
) -> Result<(), SwitchError> {
    wait_atu(comms, regs)?;

    let op = match (cmd, db_num) {
        (FlushCmd::All, None) => AtuOpCode::FlushAll,
        (FlushCmd::NonStatic, None) => AtuOpCode::FlushNonStatic,
        (FlushCmd::All, Some(_)) => AtuOpCode::FlushAllInDb,
        (FlushCmd::NonStatic, Some(_)) => AtuOpCode::FlushNonStaticInDb,
    };

    if let Some(db) = db_num {
        if db >= 4096 {
            return Err(SwitchError::BadParam("db_num"));
        }
        let fid = AtuFidWord::new().with_fid(db);
        comms.write_reg(regs.global1, regs.fid_reg, fid.into())?;
    }

    // Flush commands act on valid entries, which the silicon identifies by a
    // non-zero state written to the data register.
    let data = AtuDataWord::new().with_state(0xF);
    comms.write_reg(regs.global1, regs.data_reg, data.into())?;

    start_op(comms, regs, op, 0)
}

/// `find` is `get_next` from one below the target address.
pub(crate) fn find_entry<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &AtuRegs,
    mac: [u8; 6],
    db_num: u16,
) -> Result<AtuEntry, SwitchError> {
    let probe = mac_dec(mac);
    let entry = get_next(comms, regs, probe, db_num)?;
    if entry.mac != mac {
        return Err(SwitchError::NoSuchEntry);
    }
    Ok(entry)
}

pub(crate) fn get_aging_timeout<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &AtuRegs,
) -> Result<u32, SwitchError> {
    let age = comms.read_field(regs.global1, regs.ctrl_reg, 4, 8)?;
    Ok(age as u32 * regs.age_step_ms)
}

pub(crate) fn set_aging_timeout<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &AtuRegs,
    timeout_ms: u32,
) -> Result<(), SwitchError> {
    // 0 disables aging entirely.
    let age = (timeout_ms + regs.age_step_ms / 2) / regs.age_step_ms;
    if age > 0xFF {
        return Err(SwitchError::BadParam("timeout_ms"));
    }
    comms.write_field(regs.global1, regs.ctrl_reg, 4, 8, age as u16)?;
    Ok(())
}

/// Decrement a 48-bit MAC address, wrapping at zero.
fn mac_dec(mac: [u8; 6]) -> [u8; 6] {
    let mut out = mac;
    for byte in out.iter_mut().rev() {
        let (value, borrow) = byte.overflowing_sub(1);
        *byte = value;
        if !borrow {
            break;
        }
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn mac_decrement() {
        assert_eq!(
            mac_dec([0, 0, 0, 0, 0x12, 0x00]),
            [0, 0, 0, 0, 0x11, 0xFF]
        );
        assert_eq!(
            mac_dec([0, 0, 0, 0, 0, 0]),
            [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn data_word_packing() {
        let data = AtuDataWord::new()
            .with_state(0xE)
            .with_port_vec(0b101)
            .with_lag(false);
        assert_eq!(u16::from(data), 0x005E);
    }
}
