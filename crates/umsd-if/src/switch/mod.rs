// SPDX-FileCopyrightText: © 2024 Marvell Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

mod amethyst;
pub mod arp;
pub mod atu;
pub mod communication;
mod creation;
pub mod ecid;
pub mod eeprom;
mod hl_regs;
pub mod imp;
mod peridot;
pub mod phy;
pub mod pirl;
pub mod ptp;
pub mod qc;
pub mod rmon;
mod topaz;
pub mod tcam;

pub use amethyst::Amethyst;
pub use arp::ArpOps;
pub use atu::AtuOps;
pub use communication::{DirectSmi, MultiChipSmi, RegComms};
pub use ecid::EcidOps;
pub use eeprom::EepromOps;
pub use hl_regs::{wait_bit, HlRegs};
pub use imp::ImpOps;
pub use peridot::Peridot;
pub use phy::PhyOps;
pub use pirl::PirlOps;
pub use ptp::PtpOps;
pub use qc::QcOps;
pub use rmon::RmonOps;
pub use tcam::TcamOps;
pub use topaz::Topaz;

use umsd_core::SwitchFamily;

use crate::error::SwitchError;
use crate::interface::DeviceInfo;
use crate::rmu::RmuOps;

/// Defines common functionality for all switch families.
///
/// A feature accessor returns `None` on silicon that does not implement the
/// feature; the [`Switch`] front door turns that into a `NotSupported`
/// error so family-agnostic code never has to know the feature matrix.
pub trait SwitchImpl: HlRegs + Send + Sync + 'static {
    /// Returns the family of the chip, can be used to avoid needing to
    /// ducktype when downcasting.
    fn get_family(&self) -> SwitchFamily;

    /// Product number read out of the identification register at open time.
    fn get_product_num(&self) -> u16;

    fn port_count(&self) -> u8;

    /// Get information about the underlying transport.
    fn get_device_info(&self) -> Result<Option<DeviceInfo>, SwitchError>;

    /// Convenience function to downcast to a concrete type.
    fn as_any(&self) -> &dyn std::any::Any;

    fn atu(&self) -> Option<&dyn AtuOps> {
        None
    }

    fn ecid(&self) -> Option<&dyn EcidOps> {
        None
    }

    fn arp(&self) -> Option<&dyn ArpOps> {
        None
    }

    fn pirl(&self) -> Option<&dyn PirlOps> {
        None
    }

    fn tcam(&self) -> Option<&dyn TcamOps> {
        None
    }

    fn ptp(&self) -> Option<&dyn PtpOps> {
        None
    }

    fn rmon(&self) -> Option<&dyn RmonOps> {
        None
    }

    fn phy(&self) -> Option<&dyn PhyOps> {
        None
    }

    fn qc(&self) -> Option<&dyn QcOps> {
        None
    }

    fn eeprom(&self) -> Option<&dyn EepromOps> {
        None
    }

    fn imp(&self) -> Option<&dyn ImpOps> {
        None
    }

    fn rmu(&self) -> Option<&dyn RmuOps> {
        None
    }
}

/// A wrapper around a switch that implements `SwitchImpl`.
/// This allows us to open and use switches without knowing their type,
/// but we can still downcast to the concrete type if we need to.
pub struct Switch {
    pub inner: Box<dyn SwitchImpl>,
}

impl From<Box<dyn SwitchImpl>> for Switch {
    fn from(inner: Box<dyn SwitchImpl>) -> Self {
        Self { inner }
    }
}

impl Switch {
    /// Downcast to a Topaz switch
    pub fn as_topaz(&self) -> Option<&Topaz> {
        self.inner.as_any().downcast_ref::<Topaz>()
    }

    /// Downcast to a Peridot switch
    pub fn as_peridot(&self) -> Option<&Peridot> {
        self.inner.as_any().downcast_ref::<Peridot>()
    }

    /// Downcast to an Amethyst switch
    pub fn as_amethyst(&self) -> Option<&Amethyst> {
        self.inner.as_any().downcast_ref::<Amethyst>()
    }

    fn unsupported(&self, feature: &'static str) -> SwitchError {
        SwitchError::NotSupported {
            family: self.inner.get_family(),
            feature,
        }
    }

    pub fn atu(&self) -> Result<&dyn AtuOps, SwitchError> {
        self.inner.atu().ok_or_else(|| self.unsupported("ATU"))
    }

    pub fn ecid(&self) -> Result<&dyn EcidOps, SwitchError> {
        self.inner.ecid().ok_or_else(|| self.unsupported("ECID"))
    }

    pub fn arp(&self) -> Result<&dyn ArpOps, SwitchError> {
        self.inner.arp().ok_or_else(|| self.unsupported("ARP"))
    }

    pub fn pirl(&self) -> Result<&dyn PirlOps, SwitchError> {
        self.inner.pirl().ok_or_else(|| self.unsupported("PIRL"))
    }

    pub fn tcam(&self) -> Result<&dyn TcamOps, SwitchError> {
        self.inner.tcam().ok_or_else(|| self.unsupported("TCAM"))
    }

    pub fn ptp(&self) -> Result<&dyn PtpOps, SwitchError> {
        self.inner.ptp().ok_or_else(|| self.unsupported("PTP"))
    }

    pub fn rmon(&self) -> Result<&dyn RmonOps, SwitchError> {
        self.inner.rmon().ok_or_else(|| self.unsupported("RMON"))
    }

    pub fn phy(&self) -> Result<&dyn PhyOps, SwitchError> {
        self.inner.phy().ok_or_else(|| self.unsupported("PHY"))
    }

    pub fn qc(&self) -> Result<&dyn QcOps, SwitchError> {
        self.inner.qc().ok_or_else(|| self.unsupported("queue control"))
    }

    pub fn eeprom(&self) -> Result<&dyn EepromOps, SwitchError> {
        self.inner.eeprom().ok_or_else(|| self.unsupported("EEPROM"))
    }

    pub fn imp(&self) -> Result<&dyn ImpOps, SwitchError> {
        self.inner.imp().ok_or_else(|| self.unsupported("IMP"))
    }

    pub fn rmu(&self) -> Result<&dyn RmuOps, SwitchError> {
        self.inner.rmu().ok_or_else(|| self.unsupported("RMU"))
    }
}

impl HlRegs for Switch {
    fn comms_obj(&self) -> (&dyn RegComms, &dyn crate::interface::SmiInterface) {
        self.inner.comms_obj()
    }
}

impl SwitchImpl for Switch {
    fn get_family(&self) -> SwitchFamily {
        self.inner.get_family()
    }

    fn get_product_num(&self) -> u16 {
        self.inner.get_product_num()
    }

    fn port_count(&self) -> u8 {
        self.inner.port_count()
    }

    fn get_device_info(&self) -> Result<Option<DeviceInfo>, SwitchError> {
        self.inner.get_device_info()
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self.inner.as_any()
    }

    fn atu(&self) -> Option<&dyn AtuOps> {
        self.inner.atu()
    }

    fn ecid(&self) -> Option<&dyn EcidOps> {
        self.inner.ecid()
    }

    fn arp(&self) -> Option<&dyn ArpOps> {
        self.inner.arp()
    }

    fn pirl(&self) -> Option<&dyn PirlOps> {
        self.inner.pirl()
    }

    fn tcam(&self) -> Option<&dyn TcamOps> {
        self.inner.tcam()
    }

    fn ptp(&self) -> Option<&dyn PtpOps> {
        self.inner.ptp()
    }

    fn rmon(&self) -> Option<&dyn RmonOps> {
        self.inner.rmon()
    }

    fn phy(&self) -> Option<&dyn PhyOps> {
        self.inner.phy()
    }

    fn qc(&self) -> Option<&dyn QcOps> {
        self.inner.qc()
    }

    fn eeprom(&self) -> Option<&dyn EepromOps> {
        self.inner.eeprom()
    }

    fn imp(&self) -> Option<&dyn ImpOps> {
        self.inner.imp()
    }

    fn rmu(&self) -> Option<&dyn RmuOps> {
        self.inner.rmu()
    }
}
