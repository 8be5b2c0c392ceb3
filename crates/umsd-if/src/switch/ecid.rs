// SPDX-FileCopyrightText: © 2024 Marvell Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

//! E-CID (802.1BR port extender) entries. The silicon stores these in the
//! ATU, reusing the MAC-address key slots for the {group, ecid} pair, so the
//! engine here is a thin layer over the ATU engine with the table switched
//! into ECID mode.

use serde::{Deserialize, Serialize};

use crate::error::SwitchError;

use super::atu::{self, AtuEntry, AtuRegs, FlushCmd};
use super::hl_regs::HlRegs;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcidEntry {
    /// 2-bit E-CID group (GRP field of the E-TAG).
    pub group: u8,
    /// 12-bit E-CID.
    pub ecid: u16,
    pub entry_state: u8,
    pub port_vec: u16,
    pub lag: bool,
    pub lag_id: u8,
    pub mac_fpri: u8,
    pub mac_qpri: u8,
    pub remove_etag: bool,
}

/// ECID-mode plumbing on top of the chip's ATU registers.
pub struct EcidRegs {
    /// Bit of the ATU control register that flips the table into ECID mode.
    pub mode_bit: u8,
    /// Global1 register and bit holding the BPE (port extender) enable.
    pub bpe_reg: u8,
    pub bpe_bit: u8,
}

pub trait EcidOps {
    fn get_bpe_enable(&self) -> Result<bool, SwitchError>;
    fn set_bpe_enable(&self, enable: bool) -> Result<(), SwitchError>;
    fn add_entry(&self, entry: &EcidEntry) -> Result<(), SwitchError>;
    fn get_entry_next(&self, group: u8, ecid: u16) -> Result<EcidEntry, SwitchError>;
    fn find_entry(&self, group: u8, ecid: u16) -> Result<EcidEntry, SwitchError>;
    fn flush_entry(&self, group: u8, ecid: u16) -> Result<(), SwitchError>;
    fn flush_all(&self) -> Result<(), SwitchError>;
    fn entry_count(&self) -> Result<u32, SwitchError>;
}

fn check_key(group: u8, ecid: u16) -> Result<(), SwitchError> {
    if group > 3 {
        return Err(SwitchError::BadParam("group"));
    }
    if ecid > 0xFFF {
        return Err(SwitchError::BadParam("ecid"));
    }
    Ok(())
}

/// The {group, ecid} key occupies the low end of the MAC key slots. Nothing
/// else may land in the key: lookups probe by {group, ecid} alone, so any
/// extra key bit would make a stored entry unfindable.
fn pack_key(group: u8, ecid: u16) -> [u8; 6] {
    [
        0,
        0,
        0,
        0,
        ((group & 0x3) << 4) | (ecid >> 8) as u8,
        ecid as u8,
    ]
}

fn unpack_key(mac: &[u8; 6]) -> (u8, u16) {
    let group = (mac[4] >> 4) & 0x3;
    let ecid = ((mac[4] as u16 & 0xF) << 8) | mac[5] as u16;
    (group, ecid)
}

fn from_atu(entry: AtuEntry) -> EcidEntry {
    let (group, ecid) = unpack_key(&entry.mac);
    EcidEntry {
        group,
        ecid,
        entry_state: entry.entry_state,
        port_vec: if entry.lag { 0 } else { entry.port_vec },
        lag: entry.lag,
        lag_id: if entry.lag { entry.port_vec as u8 } else { 0 },
        mac_fpri: entry.fpri,
        mac_qpri: entry.qpri,
        // ECID mode has no database number; the FID field carries the E-TAG
        // removal flag instead.
        remove_etag: entry.db_num & 1 == 1,
    }
}

pub(crate) fn check_bpe<T: HlRegs + ?Sized>(
    comms: &T,
    atu: &AtuRegs,
    ecid: &EcidRegs,
) -> Result<(), SwitchError> {
    let enabled = comms.read_field(atu.global1, ecid.bpe_reg, ecid.bpe_bit, 1)? == 1;
    if !enabled {
        return Err(SwitchError::FeatureNotEnabled("802.1BR port extender mode"));
    }
    Ok(())
}

/// Run `f` with the ATU switched into ECID mode, restoring normal mode even
/// when the operation fails.
fn with_ecid_mode<T, R>(
    comms: &T,
    atu: &AtuRegs,
    ecid: &EcidRegs,
    f: impl FnOnce(&T) -> Result<R, SwitchError>,
) -> Result<R, SwitchError>
where
    T: HlRegs + ?Sized,
{
    comms.write_field(atu.global1, atu.ctrl_reg, ecid.mode_bit, 1, 1)?;
    let result = f(comms);
    comms.write_field(atu.global1, atu.ctrl_reg, ecid.mode_bit, 1, 0)?;
    result
}

pub(crate) fn add_entry<T: HlRegs + ?Sized>(
    comms: &T,
    atu: &AtuRegs,
    ecid: &EcidRegs,
    entry: &EcidEntry,
) -> Result<(), SwitchError> {
    check_bpe(comms, atu, ecid)?;
    check_key(entry.group, entry.ecid)?;
    if entry.entry_state == 0 {
        return Err(SwitchError::BadParam("entry_state"));
    }

    let atu_entry = AtuEntry {
        mac: pack_key(entry.group, entry.ecid),
        lag: entry.lag,
        port_vec: if entry.lag {
            entry.lag_id as u16
        } else {
            entry.port_vec
        },
        db_num: entry.remove_etag as u16,
        entry_state: entry.entry_state,
        fpri: entry.mac_fpri,
        qpri: entry.mac_qpri,
    };

    with_ecid_mode(comms, atu, ecid, |comms| {
        atu::load_entry(comms, atu, &atu_entry)
    })
}

pub(crate) fn get_entry_next<T: HlRegs + ?Sized>(
    comms: &T,
    atu: &AtuRegs,
    ecid: &EcidRegs,
    group: u8,
    ecid_key: u16,
) -> Result<EcidEntry, SwitchError> {
    check_bpe(comms, atu, ecid)?;
    check_key(group, ecid_key)?;

    let entry = with_ecid_mode(comms, atu, ecid, |comms| {
        atu::get_next(comms, atu, pack_key(group, ecid_key), 0)
    })?;
    Ok(from_atu(entry))
}

pub(crate) fn find_entry<T: HlRegs + ?Sized>(
    comms: &T,
    atu: &AtuRegs,
    ecid: &EcidRegs,
    group: u8,
    ecid_key: u16,
) -> Result<EcidEntry, SwitchError> {
    check_bpe(comms, atu, ecid)?;
    check_key(group, ecid_key)?;

    let entry = with_ecid_mode(comms, atu, ecid, |comms| {
        atu::find_entry(comms, atu, pack_key(group, ecid_key), 0)
    })?;
    Ok(from_atu(entry))
}

pub(crate) fn flush_entry<T: HlRegs + ?Sized>(
    comms: &T,
    atu: &AtuRegs,
    ecid: &EcidRegs,
    group: u8,
    ecid_key: u16,
) -> Result<(), SwitchError> {
    check_bpe(comms, atu, ecid)?;
    check_key(group, ecid_key)?;

    // Loading with an invalid state purges the entry.
    let atu_entry = AtuEntry {
        mac: pack_key(group, ecid_key),
        ..Default::default()
    };
    with_ecid_mode(comms, atu, ecid, |comms| {
        atu::load_entry(comms, atu, &atu_entry)
    })
}

pub(crate) fn flush_all<T: HlRegs + ?Sized>(
    comms: &T,
    atu: &AtuRegs,
    ecid: &EcidRegs,
) -> Result<(), SwitchError> {
    check_bpe(comms, atu, ecid)?;
    with_ecid_mode(comms, atu, ecid, |comms| {
        atu::flush_op(comms, atu, FlushCmd::All, None)
    })
}

pub(crate) fn entry_count<T: HlRegs + ?Sized>(
    comms: &T,
    atu: &AtuRegs,
    ecid: &EcidRegs,
) -> Result<u32, SwitchError> {
    check_bpe(comms, atu, ecid)?;

    let mut count = 0u32;
    let mut key = [0xFFu8; 6];
    loop {
        let entry = with_ecid_mode(comms, atu, ecid, |comms| atu::get_next(comms, atu, key, 0));
        match entry {
            Ok(entry) => {
                // Continue from the raw key the table handed back. A table
                // that returns the same key twice is a hardware fault; bail
                // rather than spin.
                if entry.mac == key {
                    return Err(SwitchError::Generic(
                        "ECID walk did not advance".to_string(),
                        crate::error::BtWrapper::capture(),
                    ));
                }
                key = entry.mac;
                count += 1;
            }
            Err(SwitchError::NoSuchEntry) => return Ok(count),
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn key_roundtrip() {
        let key = pack_key(2, 0xABC);
        assert_eq!(key, [0, 0, 0, 0, 0x2A, 0xBC]);
        assert_eq!(unpack_key(&key), (2, 0xABC));
    }

    #[test]
    fn etag_removal_stays_out_of_the_key() {
        // pack_key takes only the lookup key, so the flag cannot leak into
        // it; it travels through the FID field instead.
        let stored = AtuEntry {
            mac: pack_key(2, 0xABC),
            db_num: 1,
            entry_state: 1,
            port_vec: 1,
            ..Default::default()
        };
        let entry = from_atu(stored);
        assert!(entry.remove_etag);
        assert_eq!((entry.group, entry.ecid), (2, 0xABC));
    }
}
