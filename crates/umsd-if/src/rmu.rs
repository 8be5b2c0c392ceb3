// SPDX-FileCopyrightText: © 2024 Marvell Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

//! RMU payload codec. The Remote Management Unit accepts register-access
//! and table-dump commands as Ethernet payloads; this module builds the
//! request payloads and decodes the responses. The L2 framing around the
//! payload belongs to the platform transport.

use bitfield_struct::bitfield;
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;
use thiserror::Error;

use crate::error::SwitchError;
use crate::interface::SmiInterface;
use crate::switch::atu::AtuEntry;
use crate::switch::rmon::{counters_from_bank0, RmonCounters};

/// Request/response format revision carried in the first payload word.
pub const RMU_FORMAT: u16 = 0x0001;

/// Largest response payload we accept; bounded by the MTU of the frame the
/// RMU answers with.
pub const RMU_MAX_PAYLOAD: usize = 1500;

/// Upper bound on register commands per request so the frame stays inside
/// the MTU.
pub const RMU_MAX_REG_CMDS: usize = 120;

const REG_CMD_END: u16 = 0xFFFF;

#[derive(Clone, Copy, Debug, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum RmuCode {
    GetId = 0x0000,
    DumpAtu = 0x1000,
    DumpMib = 0x1020,
    RegCmds = 0x2000,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum RegOp {
    Write = 0b01,
    Read = 0b10,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegCmd {
    pub op: RegOp,
    pub dev: u8,
    pub reg: u8,
    /// Write payload on requests; read result on responses.
    pub data: u16,
}

#[bitfield(u16)]
struct RegCmdWord {
    #[bits(5)]
    pub reg: u8,
    #[bits(5)]
    pub dev: u8,
    #[bits(2)]
    pub op: u8,
    #[bits(4)]
    __: u8,
}

#[derive(Debug)]
pub enum RmuMsg {
    GetId,
    DumpAtu { continue_code: u16 },
    DumpMib { port: u8, flush: bool },
    RegCmds(Vec<RegCmd>),
}

impl RmuMsg {
    pub fn code(&self) -> u16 {
        match self {
            RmuMsg::GetId => RmuCode::GetId as u16,
            RmuMsg::DumpAtu { .. } => RmuCode::DumpAtu as u16,
            RmuMsg::DumpMib { .. } => RmuCode::DumpMib as u16,
            RmuMsg::RegCmds(_) => RmuCode::RegCmds as u16,
        }
    }

    /// Encode the request payload. Everything on the wire is big-endian.
    pub fn encode(&self) -> Result<Vec<u8>, RmuError> {
        let mut out = Vec::with_capacity(16);
        push_u16(&mut out, RMU_FORMAT);
        push_u16(&mut out, 0);
        push_u16(&mut out, self.code());

        match self {
            RmuMsg::GetId => {}
            RmuMsg::DumpAtu { continue_code } => {
                push_u16(&mut out, *continue_code);
            }
            RmuMsg::DumpMib { port, flush } => {
                push_u16(&mut out, ((*flush as u16) << 15) | *port as u16);
            }
            RmuMsg::RegCmds(cmds) => {
                if cmds.len() > RMU_MAX_REG_CMDS {
                    return Err(RmuProtocolError::TooManyCmds(cmds.len()).into_error());
                }
                for cmd in cmds {
                    let word = RegCmdWord::new()
                        .with_op(cmd.op as u8)
                        .with_dev(cmd.dev)
                        .with_reg(cmd.reg);
                    push_u16(&mut out, word.into());
                    push_u16(&mut out, cmd.data);
                }
                push_u16(&mut out, REG_CMD_END);
                push_u16(&mut out, REG_CMD_END);
            }
        }

        Ok(out)
    }
}

/// An ATU row as carried in a DumpAtu response: the MAC plus a packed
/// state/port-vector word.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RmuAtuEntry {
    pub mac: [u8; 6],
    pub entry_state: u8,
    pub port_vec: u16,
}

impl From<RmuAtuEntry> for AtuEntry {
    fn from(e: RmuAtuEntry) -> Self {
        AtuEntry {
            mac: e.mac,
            port_vec: e.port_vec,
            entry_state: e.entry_state,
            ..Default::default()
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum RmuResponse {
    GetId {
        product_num: u16,
    },
    DumpAtu {
        /// Zero when the dump is complete; otherwise pass back into the
        /// next DumpAtu request.
        continue_code: u16,
        entries: Vec<RmuAtuEntry>,
    },
    DumpMib {
        port: u8,
        counters: RmonCounters,
    },
    RegCmds(Vec<RegCmd>),
}

#[derive(Error, Debug)]
pub enum RmuProtocolError {
    #[error("response payload truncated at {0} bytes")]
    Truncated(usize),
    #[error("unknown response format {0:#06x}")]
    BadFormat(u16),
    #[error("sent command {sent:#06x} but device answered {got:#06x}")]
    CodeMismatch { sent: u16, got: u16 },
    #[error("{0} register commands exceed the per-frame limit")]
    TooManyCmds(usize),
    #[error("register command list is missing its end marker")]
    MissingEndMarker,
    #[error("invalid register command word {0:#06x}")]
    BadRegCmd(u16),
}

impl RmuProtocolError {
    #[inline(always)]
    pub fn into_error(self) -> RmuError {
        RmuError::ProtocolError {
            source: self,
            backtrace: crate::error::BtWrapper(std::backtrace::Backtrace::capture()),
        }
    }
}

#[derive(Error, Debug)]
pub enum RmuError {
    #[error("{source}\n{backtrace}")]
    ProtocolError {
        source: RmuProtocolError,
        backtrace: crate::error::BtWrapper,
    },
}

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn u16(&mut self) -> Result<u16, RmuError> {
        if self.pos + 2 > self.buf.len() {
            return Err(RmuProtocolError::Truncated(self.buf.len()).into_error());
        }
        let value = u16::from_be_bytes([self.buf[self.pos], self.buf[self.pos + 1]]);
        self.pos += 2;
        Ok(value)
    }

    fn u32(&mut self) -> Result<u32, RmuError> {
        let hi = self.u16()? as u32;
        let lo = self.u16()? as u32;
        Ok((hi << 16) | lo)
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}

/// Decode a response payload against the request that produced it.
pub fn decode_response(msg: &RmuMsg, payload: &[u8]) -> Result<RmuResponse, RmuError> {
    let mut r = Reader {
        buf: payload,
        pos: 0,
    };

    let format = r.u16()?;
    if format != RMU_FORMAT {
        return Err(RmuProtocolError::BadFormat(format).into_error());
    }
    let _pad = r.u16()?;
    let code = r.u16()?;
    if code != msg.code() {
        return Err(RmuProtocolError::CodeMismatch {
            sent: msg.code(),
            got: code,
        }
        .into_error());
    }

    match msg {
        RmuMsg::GetId => Ok(RmuResponse::GetId {
            product_num: r.u16()?,
        }),

        RmuMsg::DumpAtu { .. } => {
            let continue_code = r.u16()?;
            let mut entries = Vec::new();
            while r.remaining() >= 8 {
                let mut mac = [0u8; 6];
                mac.copy_from_slice(&r.buf[r.pos..r.pos + 6]);
                r.pos += 6;
                let word = r.u16()?;
                entries.push(RmuAtuEntry {
                    mac,
                    entry_state: (word >> 12) as u8,
                    port_vec: word & 0x7FF,
                });
            }
            if r.remaining() != 0 {
                return Err(RmuProtocolError::Truncated(payload.len()).into_error());
            }
            Ok(RmuResponse::DumpAtu {
                continue_code,
                entries,
            })
        }

        RmuMsg::DumpMib { .. } => {
            let port = (r.u16()? & 0xFF) as u8;
            let mut raw = [0u32; 32];
            for counter in raw.iter_mut() {
                *counter = r.u32()?;
            }
            Ok(RmuResponse::DumpMib {
                port,
                counters: counters_from_bank0(&raw),
            })
        }

        RmuMsg::RegCmds(sent) => {
            let mut cmds = Vec::with_capacity(sent.len());
            loop {
                let word = r.u16()?;
                let data = r.u16()?;
                if word == REG_CMD_END && data == REG_CMD_END {
                    break;
                }
                if cmds.len() == RMU_MAX_REG_CMDS {
                    return Err(RmuProtocolError::MissingEndMarker.into_error());
                }
                let parsed = RegCmdWord::from(word);
                let op = RegOp::from_u8(parsed.op())
                    .ok_or_else(|| RmuProtocolError::BadRegCmd(word).into_error())?;
                cmds.push(RegCmd {
                    op,
                    dev: parsed.dev(),
                    reg: parsed.reg(),
                    data,
                });
            }
            Ok(RmuResponse::RegCmds(cmds))
        }
    }
}

/// RMU operations, dispatched through the per-chip vtable. Only available
/// when the platform transport answers `rmu_request`.
pub trait RmuOps {
    fn get_id(&self) -> Result<u16, SwitchError>;
    /// Dump the whole address table, following continuation codes across
    /// frames.
    fn dump_atu(&self) -> Result<Vec<AtuEntry>, SwitchError>;
    fn dump_mib(&self, port: u8, flush: bool) -> Result<RmonCounters, SwitchError>;
    /// Run a batch of register accesses in one frame; reads come back with
    /// their data filled in.
    fn reg_cmds(&self, cmds: &[RegCmd]) -> Result<Vec<RegCmd>, SwitchError>;
}

fn transact(smi_if: &dyn SmiInterface, msg: &RmuMsg) -> Result<RmuResponse, SwitchError> {
    let req = msg.encode()?;
    let mut resp = vec![0u8; RMU_MAX_PAYLOAD];
    let len = smi_if.rmu_request(&req, &mut resp)?;
    Ok(decode_response(msg, &resp[..len])?)
}

fn mismatch(msg: &RmuMsg) -> SwitchError {
    RmuProtocolError::CodeMismatch {
        sent: msg.code(),
        got: 0,
    }
    .into_error()
    .into()
}

pub(crate) fn get_id(smi_if: &dyn SmiInterface) -> Result<u16, SwitchError> {
    let msg = RmuMsg::GetId;
    match transact(smi_if, &msg)? {
        RmuResponse::GetId { product_num } => Ok(product_num),
        _ => Err(mismatch(&msg)),
    }
}

pub(crate) fn dump_atu(smi_if: &dyn SmiInterface) -> Result<Vec<AtuEntry>, SwitchError> {
    let mut out = Vec::new();
    let mut continue_code = 0u16;
    loop {
        let msg = RmuMsg::DumpAtu { continue_code };
        match transact(smi_if, &msg)? {
            RmuResponse::DumpAtu {
                continue_code: next,
                entries,
            } => {
                out.extend(entries.into_iter().map(AtuEntry::from));
                // A device that hands back the same continuation twice would
                // otherwise keep us here forever.
                if next == 0 || next == continue_code {
                    return Ok(out);
                }
                continue_code = next;
            }
            _ => return Err(mismatch(&msg)),
        }
    }
}

pub(crate) fn dump_mib(
    smi_if: &dyn SmiInterface,
    port: u8,
    flush: bool,
) -> Result<RmonCounters, SwitchError> {
    let msg = RmuMsg::DumpMib { port, flush };
    match transact(smi_if, &msg)? {
        RmuResponse::DumpMib { counters, .. } => Ok(counters),
        _ => Err(mismatch(&msg)),
    }
}

pub(crate) fn reg_cmds(
    smi_if: &dyn SmiInterface,
    cmds: &[RegCmd],
) -> Result<Vec<RegCmd>, SwitchError> {
    let msg = RmuMsg::RegCmds(cmds.to_vec());
    match transact(smi_if, &msg)? {
        RmuResponse::RegCmds(answered) => Ok(answered),
        _ => Err(mismatch(&msg)),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn get_id_encoding() {
        let req = RmuMsg::GetId.encode().unwrap();
        assert_eq!(req, [0x00, 0x01, 0x00, 0x00, 0x00, 0x00]);

        let resp = [0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x03, 0x90];
        match decode_response(&RmuMsg::GetId, &resp).unwrap() {
            RmuResponse::GetId { product_num } => assert_eq!(product_num, 0x390),
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[test]
    fn reg_cmds_roundtrip() {
        let cmds = vec![
            RegCmd {
                op: RegOp::Write,
                dev: 0x1B,
                reg: 0x0B,
                data: 0xB000,
            },
            RegCmd {
                op: RegOp::Read,
                dev: 0x1C,
                reg: 0x14,
                data: 0,
            },
        ];
        let msg = RmuMsg::RegCmds(cmds.clone());
        let req = msg.encode().unwrap();

        // Header + two cmd/data pairs + end marker.
        assert_eq!(req.len(), 6 + 2 * 4 + 4);
        assert_eq!(&req[req.len() - 4..], &[0xFF, 0xFF, 0xFF, 0xFF]);

        // A device echoes the commands with read data filled in; reuse the
        // request body as a synthetic response with the read answered.
        let mut resp = req.clone();
        resp[12] = 0x12;
        resp[13] = 0x34;
        match decode_response(&msg, &resp).unwrap() {
            RmuResponse::RegCmds(parsed) => {
                assert_eq!(parsed[0], cmds[0]);
                assert_eq!(parsed[1].op, RegOp::Read);
                assert_eq!(parsed[1].data, 0x1234);
            }
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[test]
    fn dump_atu_decoding() {
        let mut resp = vec![0x00, 0x01, 0x00, 0x00, 0x10, 0x00];
        resp.extend_from_slice(&[0x00, 0x42]); // continue code
        resp.extend_from_slice(&[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]); // mac
        resp.extend_from_slice(&[0xE0, 0x05]); // state 0xE, port_vec 0b101

        let msg = RmuMsg::DumpAtu { continue_code: 0 };
        match decode_response(&msg, &resp).unwrap() {
            RmuResponse::DumpAtu {
                continue_code,
                entries,
            } => {
                assert_eq!(continue_code, 0x42);
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].mac, [0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
                assert_eq!(entries[0].entry_state, 0xE);
                assert_eq!(entries[0].port_vec, 0b101);
            }
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[test]
    fn response_validation() {
        assert!(matches!(
            decode_response(&RmuMsg::GetId, &[0x00]),
            Err(RmuError::ProtocolError {
                source: RmuProtocolError::Truncated(_),
                ..
            })
        ));

        let wrong_code = [0x00, 0x01, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00];
        assert!(matches!(
            decode_response(&RmuMsg::GetId, &wrong_code),
            Err(RmuError::ProtocolError {
                source: RmuProtocolError::CodeMismatch { .. },
                ..
            })
        ));

        let bad_format = [0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert!(matches!(
            decode_response(&RmuMsg::GetId, &bad_format),
            Err(RmuError::ProtocolError {
                source: RmuProtocolError::BadFormat(2),
                ..
            })
        ));
    }
}
