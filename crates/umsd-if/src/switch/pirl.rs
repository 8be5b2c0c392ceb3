// SPDX-FileCopyrightText: © 2024 Marvell Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Ingress rate limiting. The interesting part is `custom_setup_sr2c`,
//! which turns a target rate into the token-bucket register fields; the
//! rest is the usual busy-polled command/data engine.

use bitfield_struct::bitfield;
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::error::SwitchError;

use super::hl_regs::{wait_bit, HlRegs};

/// Token refresh budget in tokens per second when the bucket increment is
/// taken at face value. Rate factors are expressed as fractions of this.
const IRL_CONSTANT: u64 = 500_000_000;
const CBS_MAX: u64 = 0xFF_FFFF;
const BKT_INC_MAX: u64 = 0x1FFF;
const RATE_FACTOR_MAX: u64 = 0xFFFF;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PirlCountMode {
    /// Rate is in kbps, burst in bytes.
    #[default]
    Byte,
    /// Rate is in frames per second, burst in frames.
    Frame,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromPrimitive, ToPrimitive)]
pub enum PirlAction {
    #[default]
    Drop = 0,
    FlowControl = 1,
}

/// Register-encoded bucket parameters for a single-rate two-color limiter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PirlCustomRate {
    pub is_valid: bool,
    pub ebs_limit: u32,
    pub cbs_limit: u32,
    pub bkt_increment: u16,
    pub bkt_rate_factor_grn: u16,
    pub bkt_rate_factor_ylw: u16,
    pub count_mode: PirlCountMode,
}

/// Configuration of one ingress rate resource.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PirlData {
    /// Which frame types the bucket accounts (silicon-defined mask).
    pub bkt_type_mask: u16,
    pub account_filtered: bool,
    pub action: PirlAction,
    pub custom: PirlCustomRate,
}

pub struct PirlRegs {
    pub global2: u8,
    pub op_reg: u8,
    pub data_reg: u8,
    pub port_count: u8,
    pub resources_per_port: u8,
}

#[derive(Clone, Copy, Debug, FromPrimitive, ToPrimitive)]
enum IrlOpCode {
    InitAll = 1,
    InitResource = 2,
    WriteResource = 3,
    ReadResource = 4,
}

#[bitfield(u16)]
struct IrlOpWord {
    #[bits(4)]
    pub addr: u8,
    #[bits(1)]
    _pad: u8,
    #[bits(3)]
    pub res: u8,
    #[bits(4)]
    pub port: u8,
    #[bits(3)]
    pub op: u8,
    pub busy: bool,
}

/// Number of 16-bit words backing one rate resource.
const IRL_RESOURCE_WORDS: u8 = 8;

pub trait PirlOps {
    /// Re-initialize every rate resource on every port.
    fn initialize(&self) -> Result<(), SwitchError>;
    fn init_resource(&self, port: u8, res: u8) -> Result<(), SwitchError>;
    fn write_resource(&self, port: u8, res: u8, data: &PirlData) -> Result<(), SwitchError>;
    fn read_resource(&self, port: u8, res: u8) -> Result<PirlData, SwitchError>;
    fn get_resource_reg(&self, port: u8, res: u8, addr: u8) -> Result<u16, SwitchError>;
    fn set_resource_reg(&self, port: u8, res: u8, addr: u8, value: u16)
        -> Result<(), SwitchError>;
    /// Pure bucket math, no bus access; also available as a free function
    /// for offline use.
    fn custom_setup_sr2c(
        &self,
        tgt_rate: u32,
        tgt_bst_size: u32,
        count_mode: PirlCountMode,
    ) -> Result<PirlCustomRate, SwitchError> {
        custom_setup_sr2c(tgt_rate, tgt_bst_size, count_mode)
    }
}

/// Convert a target rate and burst size into single-rate two-color bucket
/// parameters.
///
/// The constraint being juggled: `cbs_limit = bkt_increment * burst` must
/// fit in 24 bits while `bkt_increment` stays in 13 bits, and the rate
/// factor (the fraction of `IRL_CONSTANT` refreshed per second, scaled by
/// the increment) must land in 16 bits without rounding to zero. Accuracy
/// improves with larger increments, so the increment is taken as large as
/// the burst allows.
pub fn custom_setup_sr2c(
    tgt_rate: u32,
    tgt_bst_size: u32,
    count_mode: PirlCountMode,
) -> Result<PirlCustomRate, SwitchError> {
    if tgt_rate == 0 {
        return Err(SwitchError::BadParam("tgt_rate"));
    }

    let (rate_units, constant, bst_min) = match count_mode {
        PirlCountMode::Byte => (tgt_rate as u64 * 1000, IRL_CONSTANT, 1600),
        PirlCountMode::Frame => (tgt_rate as u64, IRL_CONSTANT / 8, 1),
    };

    if tgt_bst_size < bst_min {
        return Err(SwitchError::BadParam("tgt_bst_size"));
    }

    let bkt_increment = (CBS_MAX / tgt_bst_size as u64).min(BKT_INC_MAX);
    if bkt_increment == 0 {
        return Err(SwitchError::BadParam("tgt_bst_size"));
    }

    let cbs_limit = bkt_increment * tgt_bst_size as u64;

    let factor = (rate_units * bkt_increment + constant / 2) / constant;
    if factor == 0 || factor > RATE_FACTOR_MAX {
        return Err(SwitchError::BadParam("tgt_rate"));
    }

    Ok(PirlCustomRate {
        is_valid: true,
        ebs_limit: CBS_MAX as u32,
        cbs_limit: cbs_limit as u32,
        bkt_increment: bkt_increment as u16,
        bkt_rate_factor_grn: factor as u16,
        bkt_rate_factor_ylw: 0,
        count_mode,
    })
}

fn wait_irl<T: HlRegs + ?Sized>(comms: &T, regs: &PirlRegs) -> Result<(), SwitchError> {
    wait_bit(comms, regs.global2, regs.op_reg, 15, false, "IRL operation")
}

fn check_resource(regs: &PirlRegs, port: u8, res: u8) -> Result<(), SwitchError> {
    if port >= regs.port_count {
        return Err(SwitchError::BadParam("port"));
    }
    if res >= regs.resources_per_port {
        return Err(SwitchError::BadParam("res"));
    }
    Ok(())
}

fn start_op<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &PirlRegs,
    op: IrlOpCode,
    port: u8,
    res: u8,
    addr: u8,
) -> Result<(), SwitchError> {
    let word = IrlOpWord::new()
        .with_busy(true)
        .with_op(op.to_u8().unwrap_or_default())
        .with_port(port)
        .with_res(res)
        .with_addr(addr);
    comms.write_reg(regs.global2, regs.op_reg, word.into())?;
    wait_irl(comms, regs)
}

pub(crate) fn initialize<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &PirlRegs,
) -> Result<(), SwitchError> {
    wait_irl(comms, regs)?;
    start_op(comms, regs, IrlOpCode::InitAll, 0, 0, 0)
}

pub(crate) fn init_resource<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &PirlRegs,
    port: u8,
    res: u8,
) -> Result<(), SwitchError> {
    check_resource(regs, port, res)?;
    wait_irl(comms, regs)?;
    start_op(comms, regs, IrlOpCode::InitResource, port, res, 0)
}

fn encode_resource(data: &PirlData) -> [u16; IRL_RESOURCE_WORDS as usize] {
    let mode = match data.custom.count_mode {
        PirlCountMode::Byte => 0u16,
        PirlCountMode::Frame => 1,
    };
    [
        data.bkt_type_mask,
        (data.custom.bkt_increment & 0x1FFF) | (mode << 13),
        data.custom.bkt_rate_factor_grn,
        data.custom.cbs_limit as u16,
        ((data.custom.cbs_limit >> 16) as u16 & 0xFF)
            | ((data.account_filtered as u16) << 8)
            | ((data.action.to_u16().unwrap_or_default()) << 9),
        data.custom.ebs_limit as u16,
        (data.custom.ebs_limit >> 16) as u16 & 0xFF,
        data.custom.bkt_rate_factor_ylw,
    ]
}

fn decode_resource(words: &[u16; IRL_RESOURCE_WORDS as usize]) -> PirlData {
    let count_mode = if words[1] >> 13 & 1 == 1 {
        PirlCountMode::Frame
    } else {
        PirlCountMode::Byte
    };
    PirlData {
        bkt_type_mask: words[0],
        account_filtered: words[4] >> 8 & 1 == 1,
        action: PirlAction::from_u16(words[4] >> 9 & 0x3).unwrap_or_default(),
        custom: PirlCustomRate {
            is_valid: true,
            ebs_limit: ((words[6] as u32 & 0xFF) << 16) | words[5] as u32,
            cbs_limit: ((words[4] as u32 & 0xFF) << 16) | words[3] as u32,
            bkt_increment: words[1] & 0x1FFF,
            bkt_rate_factor_grn: words[2],
            bkt_rate_factor_ylw: words[7],
            count_mode,
        },
    }
}

pub(crate) fn write_resource<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &PirlRegs,
    port: u8,
    res: u8,
    data: &PirlData,
) -> Result<(), SwitchError> {
    check_resource(regs, port, res)?;
    if !data.custom.is_valid {
        return Err(SwitchError::BadParam("custom"));
    }

    wait_irl(comms, regs)?;
    for (addr, word) in encode_resource(data).iter().enumerate() {
        comms.write_reg(regs.global2, regs.data_reg, *word)?;
        start_op(comms, regs, IrlOpCode::WriteResource, port, res, addr as u8)?;
    }
    Ok(())
}

pub(crate) fn read_resource<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &PirlRegs,
    port: u8,
    res: u8,
) -> Result<PirlData, SwitchError> {
    check_resource(regs, port, res)?;

    wait_irl(comms, regs)?;
    let mut words = [0u16; IRL_RESOURCE_WORDS as usize];
    for (addr, word) in words.iter_mut().enumerate() {
        start_op(comms, regs, IrlOpCode::ReadResource, port, res, addr as u8)?;
        *word = comms.read_reg(regs.global2, regs.data_reg)?;
    }
    Ok(decode_resource(&words))
}

pub(crate) fn get_resource_reg<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &PirlRegs,
    port: u8,
    res: u8,
    addr: u8,
) -> Result<u16, SwitchError> {
    check_resource(regs, port, res)?;
    if addr >= IRL_RESOURCE_WORDS {
        return Err(SwitchError::BadParam("addr"));
    }

    wait_irl(comms, regs)?;
    start_op(comms, regs, IrlOpCode::ReadResource, port, res, addr)?;
    Ok(comms.read_reg(regs.global2, regs.data_reg)?)
}

pub(crate) fn set_resource_reg<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &PirlRegs,
    port: u8,
    res: u8,
    addr: u8,
    value: u16,
) -> Result<(), SwitchError> {
    check_resource(regs, port, res)?;
    if addr >= IRL_RESOURCE_WORDS {
        return Err(SwitchError::BadParam("addr"));
    }

    wait_irl(comms, regs)?;
    comms.write_reg(regs.global2, regs.data_reg, value)?;
    start_op(comms, regs, IrlOpCode::WriteResource, port, res, addr)
}

#[cfg(test)]
mod test {
    use super::*;

    fn achieved_rate_kbps(rate: &PirlCustomRate) -> f64 {
        rate.bkt_rate_factor_grn as f64 * IRL_CONSTANT as f64
            / rate.bkt_increment as f64
            / 1000.0
    }

    #[test]
    fn sr2c_100mbps() {
        let rate = custom_setup_sr2c(100_000, 1600, PirlCountMode::Byte).unwrap();
        assert!(rate.is_valid);
        // 1600 bytes leaves room for a full-size increment.
        assert_eq!(rate.bkt_increment, 0x1FFF);
        assert_eq!(rate.cbs_limit as u64, 0x1FFF * 1600);
        assert!(rate.cbs_limit as u64 <= CBS_MAX);
        assert_eq!(rate.bkt_rate_factor_ylw, 0);

        let achieved = achieved_rate_kbps(&rate);
        assert!((achieved - 100_000.0).abs() / 100_000.0 < 0.01);
    }

    #[test]
    fn sr2c_cbs_constraint_on_large_burst() {
        // Burst too big for a full-size increment; the increment must shrink
        // so the committed burst still fits in 24 bits.
        let rate = custom_setup_sr2c(1_000_000, 64_000, PirlCountMode::Byte).unwrap();
        assert!(rate.bkt_increment < 0x1FFF);
        assert!(rate.cbs_limit as u64 <= CBS_MAX);
        assert!(rate.cbs_limit as u64 + 64_000 > CBS_MAX);
    }

    #[test]
    fn sr2c_accuracy_over_range() {
        for rate_kbps in [10_000u32, 50_000, 100_000, 500_000, 1_000_000] {
            for burst in [1600u32, 3000, 10_000, 64_000] {
                let rate = custom_setup_sr2c(rate_kbps, burst, PirlCountMode::Byte).unwrap();
                let achieved = achieved_rate_kbps(&rate);
                let err = (achieved - rate_kbps as f64).abs() / rate_kbps as f64;

                // Rounding the factor to an integer is the only source of
                // error, so the relative error is at most half a factor
                // step. Once the factor has some headroom that is well
                // under 1%.
                let bound = 0.5 / rate.bkt_rate_factor_grn as f64 + 1e-9;
                assert!(
                    err <= bound,
                    "{rate_kbps} kbps / {burst} B off by {} (bound {})",
                    err * 100.0,
                    bound * 100.0
                );
                if rate.bkt_rate_factor_grn >= 50 {
                    assert!(err < 0.01);
                }
            }
        }
    }

    #[test]
    fn sr2c_frame_mode() {
        let rate = custom_setup_sr2c(1_000_000, 100, PirlCountMode::Frame).unwrap();
        assert_eq!(rate.count_mode, PirlCountMode::Frame);
        let achieved = rate.bkt_rate_factor_grn as f64 * (IRL_CONSTANT / 8) as f64
            / rate.bkt_increment as f64;
        assert!((achieved - 1_000_000.0).abs() / 1_000_000.0 < 0.01);
    }

    #[test]
    fn sr2c_rejects_bad_params() {
        assert!(matches!(
            custom_setup_sr2c(0, 3000, PirlCountMode::Byte),
            Err(SwitchError::BadParam("tgt_rate"))
        ));
        assert!(matches!(
            custom_setup_sr2c(100_000, 100, PirlCountMode::Byte),
            Err(SwitchError::BadParam("tgt_bst_size"))
        ));
        // Rate too low to represent: factor rounds to zero.
        assert!(matches!(
            custom_setup_sr2c(1, 1600, PirlCountMode::Byte),
            Err(SwitchError::BadParam("tgt_rate"))
        ));
        // Rate too high for the factor field.
        assert!(matches!(
            custom_setup_sr2c(u32::MAX, 1600, PirlCountMode::Byte),
            Err(SwitchError::BadParam("tgt_rate"))
        ));
    }

    #[test]
    fn resource_words_roundtrip() {
        let data = PirlData {
            bkt_type_mask: 0x7FFF,
            account_filtered: true,
            action: PirlAction::FlowControl,
            custom: custom_setup_sr2c(250_000, 4000, PirlCountMode::Byte).unwrap(),
        };
        assert_eq!(decode_resource(&encode_resource(&data)), data);
    }
}
