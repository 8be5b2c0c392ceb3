// SPDX-FileCopyrightText: © 2024 Marvell Technology, Inc.
// SPDX-License-Identifier: Apache-2.0
#![crate_type = "lib"]

pub use interface::{CallbackStorage, DeviceInfo, FnDriver, FnOptions, FnRmu, FnSmi, SmiInterface};
pub use rmu::{RegCmd, RegOp, RmuError, RmuMsg, RmuOps, RmuProtocolError, RmuResponse};
pub use switch::{Switch, SwitchImpl};

/// umsd-if implements the driver logic in a transport agnostic way.
/// In the simplest terms this includes everything defined in `SwitchImpl`,
/// `HlRegs` and the per-feature operation traits, plus family specific
/// functions found on `Topaz`, `Peridot` and `Amethyst`.

pub mod error;
mod interface;
mod rmu;
pub mod switch;
