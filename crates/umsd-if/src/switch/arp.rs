// SPDX-FileCopyrightText: © 2024 Marvell Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

//! ARP-to-me destination data (Amethyst). The table is a page of the TCAM
//! engine: a TCAM rule whose action points at an ARP entry picks up the
//! routing data stored here.

use serde::{Deserialize, Serialize};

use crate::error::SwitchError;

use super::hl_regs::{wait_bit, HlRegs};
use super::tcam::{self, TcamRegs, TCAM_PAGE_ARP};

/// Routed-unicast data: the egress port vector for the rewritten frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArpUcData {
    pub route_dpv: u16,
}

/// Multicast data: per-port duplication counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArpMcData {
    pub dup_num: [u8; 6],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArpData {
    Uc(ArpUcData),
    Mc(ArpMcData),
}

pub trait ArpOps {
    fn load_uc_entry(&self, ptr: u16, data: &ArpUcData) -> Result<(), SwitchError>;
    fn load_mc_entry(&self, ptr: u16, data: &ArpMcData) -> Result<(), SwitchError>;
    fn read_entry(&self, ptr: u16) -> Result<ArpData, SwitchError>;
    fn flush_entry(&self, ptr: u16) -> Result<(), SwitchError>;
    fn flush_all(&self) -> Result<(), SwitchError>;
}

/// Entry layout on the ARP page: a type word followed by three data words.
const ARP_WORDS: u8 = 4;
const ARP_TYPE_MC: u16 = 1 << 15;
const ARP_TYPE_VALID: u16 = 1 << 14;

fn encode(data: &ArpData) -> [u16; ARP_WORDS as usize] {
    match data {
        ArpData::Uc(uc) => [ARP_TYPE_VALID, uc.route_dpv & 0x7FF, 0, 0],
        ArpData::Mc(mc) => [
            ARP_TYPE_VALID | ARP_TYPE_MC,
            ((mc.dup_num[0] as u16) << 8) | mc.dup_num[1] as u16,
            ((mc.dup_num[2] as u16) << 8) | mc.dup_num[3] as u16,
            ((mc.dup_num[4] as u16) << 8) | mc.dup_num[5] as u16,
        ],
    }
}

fn decode(words: &[u16; ARP_WORDS as usize]) -> Option<ArpData> {
    if words[0] & ARP_TYPE_VALID == 0 {
        return None;
    }
    if words[0] & ARP_TYPE_MC != 0 {
        let mut dup_num = [0u8; 6];
        for i in 0..3 {
            dup_num[i * 2] = (words[i + 1] >> 8) as u8;
            dup_num[i * 2 + 1] = words[i + 1] as u8;
        }
        Some(ArpData::Mc(ArpMcData { dup_num }))
    } else {
        Some(ArpData::Uc(ArpUcData {
            route_dpv: words[1] & 0x7FF,
        }))
    }
}

fn check_ptr(entries: u16, ptr: u16) -> Result<(), SwitchError> {
    if ptr >= entries {
        return Err(SwitchError::BadParam("ptr"));
    }
    Ok(())
}

fn write_entry<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &TcamRegs,
    entries: u16,
    ptr: u16,
    words: &[u16; ARP_WORDS as usize],
) -> Result<(), SwitchError> {
    check_ptr(entries, ptr)?;
    wait_bit(comms, regs.dev, regs.op_reg, 15, false, "ARP operation")?;

    // Load latches the whole shared data window into the ARP page, so the
    // words past the entry must be cleared.
    for i in 0..regs.words_per_page as usize {
        let word = words.get(i).copied().unwrap_or(0);
        comms.write_reg(regs.dev, regs.data_base + i as u8, word)?;
    }
    comms.write_reg(regs.dev, regs.ptr_reg, ptr)?;
    tcam::start_op(comms, regs, tcam::TcamOpCode::Load, TCAM_PAGE_ARP)
}

pub(crate) fn load_uc_entry<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &TcamRegs,
    entries: u16,
    ptr: u16,
    data: &ArpUcData,
) -> Result<(), SwitchError> {
    if data.route_dpv > 0x7FF {
        return Err(SwitchError::BadParam("route_dpv"));
    }
    write_entry(comms, regs, entries, ptr, &encode(&ArpData::Uc(*data)))
}

pub(crate) fn load_mc_entry<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &TcamRegs,
    entries: u16,
    ptr: u16,
    data: &ArpMcData,
) -> Result<(), SwitchError> {
    write_entry(comms, regs, entries, ptr, &encode(&ArpData::Mc(*data)))
}

pub(crate) fn read_entry<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &TcamRegs,
    entries: u16,
    ptr: u16,
) -> Result<ArpData, SwitchError> {
    check_ptr(entries, ptr)?;
    wait_bit(comms, regs.dev, regs.op_reg, 15, false, "ARP operation")?;

    comms.write_reg(regs.dev, regs.ptr_reg, ptr)?;
    tcam::start_op(comms, regs, tcam::TcamOpCode::Read, TCAM_PAGE_ARP)?;

    let mut words = [0u16; ARP_WORDS as usize];
    for (i, word) in words.iter_mut().enumerate() {
        *word = comms.read_reg(regs.dev, regs.data_base + i as u8)?;
    }

    decode(&words).ok_or(SwitchError::NoSuchEntry)
}

pub(crate) fn flush_entry<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &TcamRegs,
    entries: u16,
    ptr: u16,
) -> Result<(), SwitchError> {
    write_entry(comms, regs, entries, ptr, &[0; ARP_WORDS as usize])
}

pub(crate) fn flush_all<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &TcamRegs,
    entries: u16,
) -> Result<(), SwitchError> {
    for ptr in 0..entries {
        flush_entry(comms, regs, entries, ptr)?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn uc_mc_encoding() {
        let uc = ArpData::Uc(ArpUcData { route_dpv: 0x155 });
        assert_eq!(decode(&encode(&uc)), Some(uc));

        let mc = ArpData::Mc(ArpMcData {
            dup_num: [1, 2, 3, 0, 0, 4],
        });
        assert_eq!(decode(&encode(&mc)), Some(mc));

        assert_eq!(decode(&[0; 4]), None);
    }
}
