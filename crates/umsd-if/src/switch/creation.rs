// SPDX-FileCopyrightText: © 2024 Marvell Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use umsd_core::SwitchFamily;

use crate::{
    error::{BtWrapper, SwitchError},
    interface::{DeviceInfo, SmiInterface},
    CallbackStorage,
};

use super::{Amethyst, DirectSmi, MultiChipSmi, Peridot, RegComms, Switch, SwitchImpl, Topaz};

/// Port register 0x03 carries the product number in bits 15:4.
const PORT_REG_IDENT: u8 = 0x03;

/// Device addresses port 0 may answer on. Most families map port 0 to
/// device address 0; Topaz parts shift the ports up to 0x10.
const PORT0_DEVS: [u8; 2] = [0x00, super::topaz::PORT_BASE];

fn family_of(product_num: u16) -> Option<SwitchFamily> {
    match product_num {
        0x115 | 0x310 => Some(SwitchFamily::Topaz),
        0x190 | 0x290 | 0x390 => Some(SwitchFamily::Peridot),
        0x193 | 0x393 => Some(SwitchFamily::Amethyst),
        _ => None,
    }
}

fn reg_if_for(info: Option<&DeviceInfo>) -> Arc<dyn RegComms> {
    match info {
        Some(info) if info.multi_chip => Arc::new(MultiChipSmi {
            smi_addr: info.smi_addr,
        }),
        _ => Arc::new(DirectSmi),
    }
}

fn read_product(
    reg_if: &dyn RegComms,
    smi_if: &dyn SmiInterface,
    port0: u8,
) -> Result<u16, SwitchError> {
    Ok(reg_if.read_reg(smi_if, port0, PORT_REG_IDENT)? >> 4)
}

impl Switch {
    /// Probe the identification register and report what is out there.
    ///
    /// Returns the family and the raw product number. Both candidate port-0
    /// addresses are tried; a PHY identifier read from address 0 on a Topaz
    /// part never matches the product table, so the probe order is safe.
    pub fn detect_family<T: Clone + Send + Sync + 'static>(
        backend: &CallbackStorage<T>,
    ) -> Result<(SwitchFamily, u16), SwitchError> {
        let info = backend.get_device_info()?;
        let reg_if = reg_if_for(info.as_ref());

        let mut last = 0;
        for port0 in PORT0_DEVS {
            let num = read_product(reg_if.as_ref(), backend, port0)?;
            if let Some(family) = family_of(num) {
                tracing::debug!("detected {family} (product {num:#x}) behind port dev {port0:#x}");
                return Ok((family, num));
            }
            last = num;
        }

        Err(SwitchError::UnknownProduct(last, BtWrapper::capture()))
    }

    pub fn topaz_open<T: Clone + Send + Sync + 'static>(
        family: SwitchFamily,
        backend: CallbackStorage<T>,
    ) -> Result<Topaz, SwitchError> {
        if family.is_topaz() {
            let smi_if: Arc<dyn SmiInterface> = Arc::new(backend);
            let info = smi_if.get_device_info()?;
            let reg_if = reg_if_for(info.as_ref());

            let num = read_product(reg_if.as_ref(), smi_if.as_ref(), super::topaz::PORT_BASE)?;
            Ok(Topaz::create(smi_if, reg_if, num))
        } else {
            Err(SwitchError::WrongFamily {
                actual: family,
                expected: SwitchFamily::Topaz,
                backtrace: BtWrapper::capture(),
            })
        }
    }

    pub fn peridot_open<T: Clone + Send + Sync + 'static>(
        family: SwitchFamily,
        backend: CallbackStorage<T>,
    ) -> Result<Peridot, SwitchError> {
        if family.is_peridot() {
            let smi_if: Arc<dyn SmiInterface> = Arc::new(backend);
            let info = smi_if.get_device_info()?;
            let reg_if = reg_if_for(info.as_ref());

            let num = read_product(reg_if.as_ref(), smi_if.as_ref(), 0x00)?;
            Ok(Peridot::create(smi_if, reg_if, num))
        } else {
            Err(SwitchError::WrongFamily {
                actual: family,
                expected: SwitchFamily::Peridot,
                backtrace: BtWrapper::capture(),
            })
        }
    }

    pub fn amethyst_open<T: Clone + Send + Sync + 'static>(
        family: SwitchFamily,
        backend: CallbackStorage<T>,
    ) -> Result<Amethyst, SwitchError> {
        if family.is_amethyst() {
            let smi_if: Arc<dyn SmiInterface> = Arc::new(backend);
            let info = smi_if.get_device_info()?;
            let reg_if = reg_if_for(info.as_ref());

            let num = read_product(reg_if.as_ref(), smi_if.as_ref(), 0x00)?;
            Ok(Amethyst::create(smi_if, reg_if, num))
        } else {
            Err(SwitchError::WrongFamily {
                actual: family,
                expected: SwitchFamily::Amethyst,
                backtrace: BtWrapper::capture(),
            })
        }
    }

    /// Detect the attached switch and open it behind the family-agnostic
    /// wrapper.
    pub fn open<T: Clone + Send + Sync + 'static>(
        backend: CallbackStorage<T>,
    ) -> Result<Switch, SwitchError> {
        let (family, _num) = Self::detect_family(&backend)?;

        Ok(Switch {
            inner: match family {
                f if f.is_topaz() => Box::new(Self::topaz_open(f, backend)?) as Box<dyn SwitchImpl>,
                f if f.is_peridot() => Box::new(Self::peridot_open(f, backend)?),
                f if f.is_amethyst() => Box::new(Self::amethyst_open(f, backend)?),
                f => {
                    return Err(SwitchError::NotSupported {
                        family: f,
                        feature: "driver support",
                    })
                }
            },
        })
    }
}
