// SPDX-FileCopyrightText: © 2024 Marvell Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown switch family: {0}")]
pub struct UnknownFamily(pub String);

/// Switch silicon families known to the driver.
///
/// Concrete register-level support exists for Topaz, Peridot and Amethyst.
/// The remaining names are carried so that platform code can label devices
/// it discovers even when this crate has no driver for them yet.
#[derive(Clone, Hash, Copy, Debug, PartialEq, Eq)]
pub enum SwitchFamily {
    Topaz,
    Peridot,
    Amethyst,
    Agate,
    Pearl,
    Fir,
    Oak,
    Spruce,
    Bonsai,
    BonsaiZ1,
}

impl Default for SwitchFamily {
    fn default() -> Self {
        Self::Peridot
    }
}

impl SwitchFamily {
    pub fn is_topaz(&self) -> bool {
        matches!(self, SwitchFamily::Topaz)
    }

    pub fn is_peridot(&self) -> bool {
        matches!(self, SwitchFamily::Peridot)
    }

    pub fn is_amethyst(&self) -> bool {
        matches!(self, SwitchFamily::Amethyst)
    }

    /// Number of switch ports on the largest member of the family.
    pub fn max_ports(&self) -> u8 {
        match self {
            SwitchFamily::Topaz | SwitchFamily::Agate | SwitchFamily::Pearl => 7,
            SwitchFamily::Bonsai | SwitchFamily::BonsaiZ1 => 6,
            _ => 11,
        }
    }
}

impl FromStr for SwitchFamily {
    type Err = UnknownFamily;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "topaz" => Ok(SwitchFamily::Topaz),
            "peridot" => Ok(SwitchFamily::Peridot),
            "amethyst" => Ok(SwitchFamily::Amethyst),
            "agate" => Ok(SwitchFamily::Agate),
            "pearl" => Ok(SwitchFamily::Pearl),
            "fir" => Ok(SwitchFamily::Fir),
            "oak" => Ok(SwitchFamily::Oak),
            "spruce" => Ok(SwitchFamily::Spruce),
            "bonsai" => Ok(SwitchFamily::Bonsai),
            "bonsaiz1" => Ok(SwitchFamily::BonsaiZ1),
            err => Err(UnknownFamily(err.to_string())),
        }
    }
}

impl fmt::Display for SwitchFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchFamily::Topaz => write!(f, "Topaz"),
            SwitchFamily::Peridot => write!(f, "Peridot"),
            SwitchFamily::Amethyst => write!(f, "Amethyst"),
            SwitchFamily::Agate => write!(f, "Agate"),
            SwitchFamily::Pearl => write!(f, "Pearl"),
            SwitchFamily::Fir => write!(f, "Fir"),
            SwitchFamily::Oak => write!(f, "Oak"),
            SwitchFamily::Spruce => write!(f, "Spruce"),
            SwitchFamily::Bonsai => write!(f, "Bonsai"),
            SwitchFamily::BonsaiZ1 => write!(f, "BonsaiZ1"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_family() {
        assert_eq!(
            "peridot".parse::<SwitchFamily>(),
            Ok(SwitchFamily::Peridot)
        );
        assert_eq!(
            "garnet".parse::<SwitchFamily>(),
            Err(UnknownFamily("garnet".to_string()))
        );
    }
}
