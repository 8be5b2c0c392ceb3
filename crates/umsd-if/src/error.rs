// SPDX-FileCopyrightText: © 2024 Marvell Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::fmt::Display;

use thiserror::Error;
use umsd_core::SwitchFamily;

use crate::rmu::RmuError;

#[derive(Debug)]
pub struct BtWrapper(pub std::backtrace::Backtrace);

impl BtWrapper {
    #[inline(always)]
    pub fn capture() -> Self {
        Self(std::backtrace::Backtrace::capture())
    }
}

impl Display for BtWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let std::backtrace::BacktraceStatus::Captured = self.0.status() {
            self.0.fmt(f)?;
        }
        Ok(())
    }
}

/// Driver level status.
///
/// These map onto the classic UMSD status codes: `BadParam` is
/// `MSD_BAD_PARAM`, `NotSupported` is `MSD_NOT_SUPPORTED`, `NoSuchEntry` is
/// `MSD_NO_SUCH`, `FeatureNotEnabled` is `MSD_FEATURE_NOT_ENABLE` and the
/// transport/timeout variants cover `MSD_FAIL`.
#[derive(Error, Debug)]
pub enum SwitchError {
    #[error("bad parameter: {0}")]
    BadParam(&'static str),

    #[error("{feature} is not supported on {family}")]
    NotSupported {
        family: SwitchFamily,
        feature: &'static str,
    },

    #[error("no such entry")]
    NoSuchEntry,

    #[error("{0} is not enabled")]
    FeatureNotEnabled(&'static str),

    #[error("timed out after {timeout:?} waiting for {what}")]
    Timeout {
        what: &'static str,
        timeout: std::time::Duration,
    },

    #[error("tried to open a {actual} device as {expected}\n{backtrace}")]
    WrongFamily {
        actual: SwitchFamily,
        expected: SwitchFamily,
        backtrace: BtWrapper,
    },

    #[error("switch identifier {0:#x} does not match a known product\n{1}")]
    UnknownProduct(u16, BtWrapper),

    #[error(transparent)]
    Rmu(#[from] RmuError),

    #[error("{0}\n{1}")]
    Smi(Box<dyn std::error::Error>, BtWrapper),

    #[error("{0}\n{1}")]
    Generic(String, BtWrapper),
}

impl From<Box<dyn std::error::Error>> for SwitchError {
    #[inline]
    fn from(e: Box<dyn std::error::Error>) -> Self {
        Self::Smi(e, BtWrapper::capture())
    }
}

impl From<String> for SwitchError {
    #[inline]
    fn from(e: String) -> Self {
        Self::Generic(e, BtWrapper::capture())
    }
}
