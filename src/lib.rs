// SPDX-FileCopyrightText: © 2024 Marvell Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Facade crate tying the workspace together. Platform glue implements
//! [`umsd_if::SmiInterface`] (usually through [`CallbackStorage`]); everything
//! above that is family-agnostic driver logic.

pub use umsd_core;
pub use umsd_if;

pub use umsd_core::SwitchFamily;
pub use umsd_if::switch::{
    ArpOps, AtuOps, EcidOps, EepromOps, HlRegs, ImpOps, PhyOps, PirlOps, PtpOps, QcOps, RmonOps,
    Switch, SwitchImpl, TcamOps,
};
pub use umsd_if::{CallbackStorage, DeviceInfo, FnOptions, RmuOps, SmiInterface};
