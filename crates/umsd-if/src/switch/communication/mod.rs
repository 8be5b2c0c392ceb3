// SPDX-FileCopyrightText: © 2024 Marvell Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

pub mod reg_comms;

pub use reg_comms::{DirectSmi, MultiChipSmi, RegComms, SmiCmd};
