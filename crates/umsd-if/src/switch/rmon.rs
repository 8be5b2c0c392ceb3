// SPDX-FileCopyrightText: © 2024 Marvell Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

//! RMON/MIB counters. Counters are captured per port into a holding area
//! and then read out one id at a time through the stats operation register,
//! 32 bits as two 16-bit halves.

use bitfield_struct::bitfield;
use serde::{Deserialize, Serialize};

use crate::error::SwitchError;

use super::hl_regs::{wait_bit, HlRegs};

/// Snapshot of one port's counter bank.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RmonCounters {
    pub in_good_octets: u64,
    pub in_bad_octets: u32,
    pub out_fcs_err: u32,
    pub in_unicasts: u32,
    pub deferred: u32,
    pub in_broadcasts: u32,
    pub in_multicasts: u32,
    pub octets_64: u32,
    pub octets_65_127: u32,
    pub octets_128_255: u32,
    pub octets_256_511: u32,
    pub octets_512_1023: u32,
    pub octets_1024_max: u32,
    pub out_octets: u64,
    pub out_unicasts: u32,
    pub excessive: u32,
    pub out_multicasts: u32,
    pub out_broadcasts: u32,
    pub single: u32,
    pub out_pause: u32,
    pub in_pause: u32,
    pub multiple: u32,
    pub in_undersize: u32,
    pub in_fragments: u32,
    pub in_oversize: u32,
    pub in_jabber: u32,
    pub in_rx_err: u32,
    pub in_fcs_err: u32,
    pub collisions: u32,
    pub late: u32,
}

/// Counter ids within bank 0.
mod id {
    pub const IN_GOOD_OCTETS_LO: u8 = 0x00;
    pub const IN_GOOD_OCTETS_HI: u8 = 0x01;
    pub const IN_BAD_OCTETS: u8 = 0x02;
    pub const OUT_FCS_ERR: u8 = 0x03;
    pub const IN_UNICASTS: u8 = 0x04;
    pub const DEFERRED: u8 = 0x05;
    pub const IN_BROADCASTS: u8 = 0x06;
    pub const IN_MULTICASTS: u8 = 0x07;
    pub const OCTETS_64: u8 = 0x08;
    pub const OCTETS_65_127: u8 = 0x09;
    pub const OCTETS_128_255: u8 = 0x0A;
    pub const OCTETS_256_511: u8 = 0x0B;
    pub const OCTETS_512_1023: u8 = 0x0C;
    pub const OCTETS_1024_MAX: u8 = 0x0D;
    pub const OUT_OCTETS_LO: u8 = 0x0E;
    pub const OUT_OCTETS_HI: u8 = 0x0F;
    pub const OUT_UNICASTS: u8 = 0x10;
    pub const EXCESSIVE: u8 = 0x11;
    pub const OUT_MULTICASTS: u8 = 0x12;
    pub const OUT_BROADCASTS: u8 = 0x13;
    pub const SINGLE: u8 = 0x14;
    pub const OUT_PAUSE: u8 = 0x15;
    pub const IN_PAUSE: u8 = 0x16;
    pub const MULTIPLE: u8 = 0x17;
    pub const IN_UNDERSIZE: u8 = 0x18;
    pub const IN_FRAGMENTS: u8 = 0x19;
    pub const IN_OVERSIZE: u8 = 0x1A;
    pub const IN_JABBER: u8 = 0x1B;
    pub const IN_RX_ERR: u8 = 0x1C;
    pub const IN_FCS_ERR: u8 = 0x1D;
    pub const COLLISIONS: u8 = 0x1E;
    pub const LATE: u8 = 0x1F;
}

pub struct StatsRegs {
    pub global1: u8,
    pub op_reg: u8,
    pub data_hi_reg: u8,
    pub data_lo_reg: u8,
    pub port_count: u8,
    /// Histogram-mode bits the chip expects in every stats command.
    pub histogram_mode: u8,
}

#[bitfield(u16)]
struct StatsOpWord {
    #[bits(5)]
    pub port: u8,
    #[bits(5)]
    pub counter: u8,
    #[bits(2)]
    pub histogram: u8,
    #[bits(3)]
    pub op: u8,
    pub busy: bool,
}

const STATS_OP_FLUSH_ALL: u8 = 1;
const STATS_OP_FLUSH_PORT: u8 = 2;
const STATS_OP_READ: u8 = 4;
const STATS_OP_CAPTURE_PORT: u8 = 5;

pub trait RmonOps {
    fn flush_all(&self) -> Result<(), SwitchError>;
    fn flush_port(&self, port: u8) -> Result<(), SwitchError>;
    /// Read a single captured counter by hardware id.
    fn read_counter(&self, port: u8, counter: u8) -> Result<u32, SwitchError>;
    /// Capture and read out the whole bank for one port.
    fn dump_port(&self, port: u8) -> Result<RmonCounters, SwitchError>;
}

fn wait_stats<T: HlRegs + ?Sized>(comms: &T, regs: &StatsRegs) -> Result<(), SwitchError> {
    wait_bit(comms, regs.global1, regs.op_reg, 15, false, "stats operation")
}

fn start_op<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &StatsRegs,
    op: u8,
    port: u8,
    counter: u8,
) -> Result<(), SwitchError> {
    let word = StatsOpWord::new()
        .with_busy(true)
        .with_op(op)
        .with_histogram(regs.histogram_mode)
        .with_counter(counter)
        // Stats port numbering is offset by one so that 0 can mean "all".
        .with_port(port);
    comms.write_reg(regs.global1, regs.op_reg, word.into())?;
    wait_stats(comms, regs)
}

fn check_port(regs: &StatsRegs, port: u8) -> Result<(), SwitchError> {
    if port >= regs.port_count {
        return Err(SwitchError::BadParam("port"));
    }
    Ok(())
}

fn read_counter_raw<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &StatsRegs,
    counter: u8,
) -> Result<u32, SwitchError> {
    start_op(comms, regs, STATS_OP_READ, 0, counter)?;
    let hi = comms.read_reg(regs.global1, regs.data_hi_reg)?;
    let lo = comms.read_reg(regs.global1, regs.data_lo_reg)?;
    Ok(((hi as u32) << 16) | lo as u32)
}

pub(crate) fn flush_all<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &StatsRegs,
) -> Result<(), SwitchError> {
    wait_stats(comms, regs)?;
    start_op(comms, regs, STATS_OP_FLUSH_ALL, 0, 0)
}

pub(crate) fn flush_port<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &StatsRegs,
    port: u8,
) -> Result<(), SwitchError> {
    check_port(regs, port)?;
    wait_stats(comms, regs)?;
    start_op(comms, regs, STATS_OP_FLUSH_PORT, port + 1, 0)
}

pub(crate) fn read_counter<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &StatsRegs,
    port: u8,
    counter: u8,
) -> Result<u32, SwitchError> {
    check_port(regs, port)?;
    if counter > 0x1F {
        return Err(SwitchError::BadParam("counter"));
    }

    wait_stats(comms, regs)?;
    start_op(comms, regs, STATS_OP_CAPTURE_PORT, port + 1, 0)?;
    read_counter_raw(comms, regs, counter)
}

pub(crate) fn dump_port<T: HlRegs + ?Sized>(
    comms: &T,
    regs: &StatsRegs,
    port: u8,
) -> Result<RmonCounters, SwitchError> {
    check_port(regs, port)?;

    wait_stats(comms, regs)?;
    start_op(comms, regs, STATS_OP_CAPTURE_PORT, port + 1, 0)?;

    let mut c = RmonCounters::default();
    let rd = |counter: u8| read_counter_raw(comms, regs, counter);

    c.in_good_octets =
        ((rd(id::IN_GOOD_OCTETS_HI)? as u64) << 32) | rd(id::IN_GOOD_OCTETS_LO)? as u64;
    c.in_bad_octets = rd(id::IN_BAD_OCTETS)?;
    c.out_fcs_err = rd(id::OUT_FCS_ERR)?;
    c.in_unicasts = rd(id::IN_UNICASTS)?;
    c.deferred = rd(id::DEFERRED)?;
    c.in_broadcasts = rd(id::IN_BROADCASTS)?;
    c.in_multicasts = rd(id::IN_MULTICASTS)?;
    c.octets_64 = rd(id::OCTETS_64)?;
    c.octets_65_127 = rd(id::OCTETS_65_127)?;
    c.octets_128_255 = rd(id::OCTETS_128_255)?;
    c.octets_256_511 = rd(id::OCTETS_256_511)?;
    c.octets_512_1023 = rd(id::OCTETS_512_1023)?;
    c.octets_1024_max = rd(id::OCTETS_1024_MAX)?;
    c.out_octets = ((rd(id::OUT_OCTETS_HI)? as u64) << 32) | rd(id::OUT_OCTETS_LO)? as u64;
    c.out_unicasts = rd(id::OUT_UNICASTS)?;
    c.excessive = rd(id::EXCESSIVE)?;
    c.out_multicasts = rd(id::OUT_MULTICASTS)?;
    c.out_broadcasts = rd(id::OUT_BROADCASTS)?;
    c.single = rd(id::SINGLE)?;
    c.out_pause = rd(id::OUT_PAUSE)?;
    c.in_pause = rd(id::IN_PAUSE)?;
    c.multiple = rd(id::MULTIPLE)?;
    c.in_undersize = rd(id::IN_UNDERSIZE)?;
    c.in_fragments = rd(id::IN_FRAGMENTS)?;
    c.in_oversize = rd(id::IN_OVERSIZE)?;
    c.in_jabber = rd(id::IN_JABBER)?;
    c.in_rx_err = rd(id::IN_RX_ERR)?;
    c.in_fcs_err = rd(id::IN_FCS_ERR)?;
    c.collisions = rd(id::COLLISIONS)?;
    c.late = rd(id::LATE)?;

    Ok(c)
}

/// Decode a 32-entry bank-0 counter block (as carried in an RMU MIB dump)
/// into the counter struct.
pub(crate) fn counters_from_bank0(raw: &[u32; 32]) -> RmonCounters {
    RmonCounters {
        in_good_octets: ((raw[id::IN_GOOD_OCTETS_HI as usize] as u64) << 32)
            | raw[id::IN_GOOD_OCTETS_LO as usize] as u64,
        in_bad_octets: raw[id::IN_BAD_OCTETS as usize],
        out_fcs_err: raw[id::OUT_FCS_ERR as usize],
        in_unicasts: raw[id::IN_UNICASTS as usize],
        deferred: raw[id::DEFERRED as usize],
        in_broadcasts: raw[id::IN_BROADCASTS as usize],
        in_multicasts: raw[id::IN_MULTICASTS as usize],
        octets_64: raw[id::OCTETS_64 as usize],
        octets_65_127: raw[id::OCTETS_65_127 as usize],
        octets_128_255: raw[id::OCTETS_128_255 as usize],
        octets_256_511: raw[id::OCTETS_256_511 as usize],
        octets_512_1023: raw[id::OCTETS_512_1023 as usize],
        octets_1024_max: raw[id::OCTETS_1024_MAX as usize],
        out_octets: ((raw[id::OUT_OCTETS_HI as usize] as u64) << 32)
            | raw[id::OUT_OCTETS_LO as usize] as u64,
        out_unicasts: raw[id::OUT_UNICASTS as usize],
        excessive: raw[id::EXCESSIVE as usize],
        out_multicasts: raw[id::OUT_MULTICASTS as usize],
        out_broadcasts: raw[id::OUT_BROADCASTS as usize],
        single: raw[id::SINGLE as usize],
        out_pause: raw[id::OUT_PAUSE as usize],
        in_pause: raw[id::IN_PAUSE as usize],
        multiple: raw[id::MULTIPLE as usize],
        in_undersize: raw[id::IN_UNDERSIZE as usize],
        in_fragments: raw[id::IN_FRAGMENTS as usize],
        in_oversize: raw[id::IN_OVERSIZE as usize],
        in_jabber: raw[id::IN_JABBER as usize],
        in_rx_err: raw[id::IN_RX_ERR as usize],
        in_fcs_err: raw[id::IN_FCS_ERR as usize],
        collisions: raw[id::COLLISIONS as usize],
        late: raw[id::LATE as usize],
    }
}
