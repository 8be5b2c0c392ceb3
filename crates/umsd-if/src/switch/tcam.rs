// SPDX-FileCopyrightText: © 2024 Marvell Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Flow classification TCAM. Entries are wider than the data-register
//! window, so each entry is paged: pages 0 and 1 carry the 48 frame-octet
//! key/mask pairs, page 2 the action words. The ARP table (Amethyst) is a
//! further page on the same engine.

use bitfield_struct::bitfield;
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::ToPrimitive;

use crate::error::SwitchError;

use super::hl_regs::{wait_bit, HlRegs};

/// Octets of frame data a TCAM rule can match on.
pub const TCAM_KEY_OCTETS: usize = 48;

/// Entry-pointer value meaning "no entry" / "start of table".
const TCAM_PTR_NONE: u16 = 0xFF;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TcamEntry {
    pub frame_octets: [u8; TCAM_KEY_OCTETS],
    pub frame_octets_mask: [u8; TCAM_KEY_OCTETS],
    pub action: TcamAction,
}

impl Default for TcamEntry {
    fn default() -> Self {
        Self {
            frame_octets: [0; TCAM_KEY_OCTETS],
            frame_octets_mask: [0; TCAM_KEY_OCTETS],
            action: TcamAction::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TcamAction {
    pub interrupt: bool,
    pub vid_override: Option<u16>,
    pub qpri_override: Option<u8>,
    pub fpri_override: Option<u8>,
    /// Destination port vector override.
    pub dpv_override: Option<u16>,
}

pub struct TcamRegs {
    /// SMI device address of the TCAM register block.
    pub dev: u8,
    pub op_reg: u8,
    pub ptr_reg: u8,
    pub data_base: u8,
    /// 16-bit data registers visible per page.
    pub words_per_page: u8,
    pub entries: u16,
}

#[derive(Clone, Copy, Debug, FromPrimitive, ToPrimitive)]
pub(crate) enum TcamOpCode {
    FlushAll = 1,
    FlushEntry = 2,
    Load = 3,
    GetNext = 4,
    Read = 5,
}

#[bitfield(u16)]
pub(crate) struct TcamOpWord {
    #[bits(9)]
    __: u16,
    #[bits(3)]
    pub page: u8,
    #[bits(3)]
    pub op: u8,
    pub busy: bool,
}

pub(crate) const TCAM_PAGE_KEY0: u8 = 0;
pub(crate) const TCAM_PAGE_KEY1: u8 = 1;
pub(crate) const TCAM_PAGE_ACTION: u8 = 2;
/// ARP destination data rides the same engine on Amethyst.
pub(crate) const TCAM_PAGE_ARP: u8 = 4;

pub trait TcamOps {
    fn flush_all(&self) -> Result<(), SwitchError>;
    fn flush_entry(&self, id: u16) -> Result<(), SwitchError>;
    fn load_entry(&self, id: u16, entry: &TcamEntry) -> Result<(), SwitchError>;
    fn read_entry(&self, id: u16) -> Result<TcamEntry, SwitchError>;
    /// Next valid entry strictly after `id`; pass `None` to start from the
    /// top of the table.
    fn get_entry_next(&self, id: Option<u16>) -> Result<(u16, TcamEntry), SwitchError>;
    fn find_entry(&self, id: u16) -> Result<TcamEntry, SwitchError>;
}

fn wait_tcam<T: HlRegs + ?Sized>(comms: &T, regs: &TcamRegs) -> Result<(), SwitchError> {
    wait_bit(comms, regs.dev, regs.op_reg, 15, false, "TCAM operation")
}

fn check_id(regs: &TcamRegs, id: u16) -> Result<(), SwitchError> {
    if id >= regs.entries {
        return Err(SwitchError::BadParam("id"));
    }
    Ok(())
}

pub(crate) fn start_op<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &TcamRegs,
    op: TcamOpCode,
    page: u8,
) -> Result<(), SwitchError> {
    let word = TcamOpWord::new()
        .with_busy(true)
        .with_op(op.to_u8().unwrap_or_default())
        .with_page(page);
    comms.write_reg(regs.dev, regs.op_reg, word.into())?;
    wait_tcam(comms, regs)
}

/// One key/mask pair per data word: mask in the high byte, octet in the low.
fn key_words(entry: &TcamEntry, page: u8, words: u8) -> Vec<u16> {
    let base = page as usize * words as usize;
    (0..words as usize)
        .map(|i| {
            let octet = base + i;
            if octet < TCAM_KEY_OCTETS {
                ((entry.frame_octets_mask[octet] as u16) << 8) | entry.frame_octets[octet] as u16
            } else {
                0
            }
        })
        .collect()
}

fn action_words(action: &TcamAction) -> [u16; 5] {
    let flag = |opt: bool| (opt as u16) << 15;
    [
        (action.interrupt as u16),
        flag(action.vid_override.is_some()) | action.vid_override.unwrap_or(0),
        flag(action.qpri_override.is_some()) | action.qpri_override.unwrap_or(0) as u16,
        flag(action.fpri_override.is_some()) | action.fpri_override.unwrap_or(0) as u16,
        flag(action.dpv_override.is_some()) | (action.dpv_override.unwrap_or(0) & 0x7FF),
    ]
}

fn decode_action(words: &[u16; 5]) -> TcamAction {
    let opt = |word: u16, mask: u16| (word & 0x8000 != 0).then_some(word & mask);
    TcamAction {
        interrupt: words[0] & 1 == 1,
        vid_override: opt(words[1], 0xFFF),
        qpri_override: opt(words[2], 0x7).map(|v| v as u8),
        fpri_override: opt(words[3], 0x7).map(|v| v as u8),
        dpv_override: opt(words[4], 0x7FF),
    }
}

fn write_page<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &TcamRegs,
    id: u16,
    page: u8,
    words: &[u16],
) -> Result<(), SwitchError> {
    // The data window is shared between pages; a Load latches all of it, so
    // words past the payload must be cleared or the previous page's content
    // leaks into this one.
    for i in 0..regs.words_per_page as usize {
        let word = words.get(i).copied().unwrap_or(0);
        comms.write_reg(regs.dev, regs.data_base + i as u8, word)?;
    }
    comms.write_reg(regs.dev, regs.ptr_reg, id)?;
    start_op(comms, regs, TcamOpCode::Load, page)
}

fn read_page<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &TcamRegs,
    id: u16,
    page: u8,
    count: u8,
) -> Result<Vec<u16>, SwitchError> {
    comms.write_reg(regs.dev, regs.ptr_reg, id)?;
    start_op(comms, regs, TcamOpCode::Read, page)?;

    let mut words = Vec::with_capacity(count as usize);
    for i in 0..count {
        words.push(comms.read_reg(regs.dev, regs.data_base + i)?);
    }
    Ok(words)
}

pub(crate) fn flush_all<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &TcamRegs,
) -> Result<(), SwitchError> {
    wait_tcam(comms, regs)?;
    start_op(comms, regs, TcamOpCode::FlushAll, 0)
}

pub(crate) fn flush_entry<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &TcamRegs,
    id: u16,
) -> Result<(), SwitchError> {
    check_id(regs, id)?;
    wait_tcam(comms, regs)?;
    comms.write_reg(regs.dev, regs.ptr_reg, id)?;
    start_op(comms, regs, TcamOpCode::FlushEntry, 0)
}

pub(crate) fn load_entry<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &TcamRegs,
    id: u16,
    entry: &TcamEntry,
) -> Result<(), SwitchError> {
    check_id(regs, id)?;
    if let Some(vid) = entry.action.vid_override {
        if vid > 0xFFF {
            return Err(SwitchError::BadParam("vid_override"));
        }
    }
    if entry.action.qpri_override.unwrap_or(0) > 7 || entry.action.fpri_override.unwrap_or(0) > 7
    {
        return Err(SwitchError::BadParam("priority override"));
    }

    wait_tcam(comms, regs)?;
    write_page(
        comms,
        regs,
        id,
        TCAM_PAGE_KEY0,
        &key_words(entry, 0, regs.words_per_page),
    )?;
    write_page(
        comms,
        regs,
        id,
        TCAM_PAGE_KEY1,
        &key_words(entry, 1, regs.words_per_page),
    )?;
    write_page(comms, regs, id, TCAM_PAGE_ACTION, &action_words(&entry.action))
}

pub(crate) fn read_entry<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &TcamRegs,
    id: u16,
) -> Result<TcamEntry, SwitchError> {
    check_id(regs, id)?;
    wait_tcam(comms, regs)?;

    let mut entry = TcamEntry::default();
    for page in [TCAM_PAGE_KEY0, TCAM_PAGE_KEY1] {
        let words = read_page(comms, regs, id, page, regs.words_per_page)?;
        let base = page as usize * regs.words_per_page as usize;
        for (i, word) in words.iter().enumerate() {
            let octet = base + i;
            if octet < TCAM_KEY_OCTETS {
                entry.frame_octets_mask[octet] = (word >> 8) as u8;
                entry.frame_octets[octet] = *word as u8;
            }
        }
    }

    let words = read_page(comms, regs, id, TCAM_PAGE_ACTION, 5)?;
    let mut action = [0u16; 5];
    action.copy_from_slice(&words);
    entry.action = decode_action(&action);

    Ok(entry)
}

pub(crate) fn get_entry_next<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &TcamRegs,
    id: Option<u16>,
) -> Result<(u16, TcamEntry), SwitchError> {
    if let Some(id) = id {
        check_id(regs, id)?;
    }

    wait_tcam(comms, regs)?;
    comms.write_reg(regs.dev, regs.ptr_reg, id.unwrap_or(TCAM_PTR_NONE))?;
    start_op(comms, regs, TcamOpCode::GetNext, 0)?;

    let found = comms.read_reg(regs.dev, regs.ptr_reg)?;
    if found == TCAM_PTR_NONE {
        return Err(SwitchError::NoSuchEntry);
    }

    let entry = read_entry(comms, regs, found)?;
    Ok((found, entry))
}

pub(crate) fn find_entry<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &TcamRegs,
    id: u16,
) -> Result<TcamEntry, SwitchError> {
    check_id(regs, id)?;

    let probe = if id == 0 { None } else { Some(id - 1) };
    let (found, entry) = get_entry_next(comms, regs, probe)?;
    if found != id {
        return Err(SwitchError::NoSuchEntry);
    }
    Ok(entry)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn action_encoding() {
        let action = TcamAction {
            interrupt: true,
            vid_override: Some(0x123),
            qpri_override: None,
            fpri_override: Some(5),
            dpv_override: Some(0b1010),
        };
        let words = action_words(&action);
        assert_eq!(words[0], 1);
        assert_eq!(words[1], 0x8123);
        assert_eq!(words[2], 0);
        assert_eq!(words[3], 0x8005);
        assert_eq!(words[4], 0x800A);
        assert_eq!(decode_action(&words), action);
    }

    #[test]
    fn key_words_cover_the_tail_page() {
        let mut entry = TcamEntry::default();
        entry.frame_octets[47] = 0xAB;
        entry.frame_octets_mask[47] = 0xFF;

        // 26 words per page puts octet 47 at page-1 word 21.
        let words = key_words(&entry, 1, 26);
        assert_eq!(words[21], 0xFFAB);
        // Words past the key are padding.
        assert_eq!(words[25], 0);
    }
}
