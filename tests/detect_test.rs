// SPDX-FileCopyrightText: © 2024 Marvell Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

mod test_utils;

use std::sync::Arc;

use test_utils::{smi_callback, MockBus};
use umsd::umsd_if::error::SwitchError;
use umsd::umsd_if::switch::{Amethyst, DirectSmi, Peridot, Topaz};
use umsd::{CallbackStorage, DeviceInfo, Switch, SwitchFamily, SwitchImpl};

#[test]
fn detects_peridot_in_single_chip_mode() {
    let bus = Arc::new(MockBus::new());
    bus.set_reg(0x00, 0x03, 0x3900);

    let backend = CallbackStorage::new(smi_callback, bus);
    let (family, num) = Switch::detect_family(&backend).unwrap();
    assert_eq!(family, SwitchFamily::Peridot);
    assert_eq!(num, 0x390);

    let sw = Switch::open(backend).unwrap();
    assert_eq!(sw.get_family(), SwitchFamily::Peridot);
    assert_eq!(sw.get_product_num(), 0x390);
    assert_eq!(sw.port_count(), 11);
    assert!(sw.as_peridot().is_some());
    assert!(sw.as_topaz().is_none());
}

#[test]
fn detects_topaz_on_shifted_port_devices() {
    let bus = Arc::new(MockBus::new());
    // Address 0 answers with a PHY identifier, which must not be mistaken
    // for a product number.
    bus.set_reg(0x00, 0x03, 0x0141);
    bus.set_reg(0x10, 0x03, 0x1150);

    let sw = Switch::open(CallbackStorage::new(smi_callback, bus)).unwrap();
    assert_eq!(sw.get_family(), SwitchFamily::Topaz);
    assert_eq!(sw.get_product_num(), 0x115);
    assert_eq!(sw.port_count(), 7);
    assert!(sw.as_topaz().is_some());
}

#[test]
fn unknown_product_is_an_error() {
    let bus = Arc::new(MockBus::new());
    bus.set_reg(0x00, 0x03, 0x9990);

    let backend = CallbackStorage::new(smi_callback, bus);
    assert!(matches!(
        Switch::detect_family(&backend),
        Err(SwitchError::UnknownProduct(..))
    ));
}

#[test]
fn multi_chip_mode_goes_through_the_command_pair() {
    let info = DeviceInfo {
        interface_id: 0,
        smi_addr: 4,
        multi_chip: true,
        bus: 0,
    };
    let bus = Arc::new(MockBus::with_info(info).busy_reg(4, 0));
    bus.set_reg(4, 1, 0x3930);

    let sw = Switch::open(CallbackStorage::new(smi_callback, bus.clone())).unwrap();
    assert_eq!(sw.get_family(), SwitchFamily::Amethyst);
    assert_eq!(sw.get_product_num(), 0x393);
    assert!(sw.as_amethyst().is_some());

    // Every bus cycle must target the switch's single SMI address.
    assert!(bus.writes().iter().all(|(dev, _, _)| *dev == 4));
}

#[test]
fn wrong_family_open_is_rejected() {
    let bus = Arc::new(MockBus::new());
    bus.set_reg(0x00, 0x03, 0x3900);

    let backend = CallbackStorage::new(smi_callback, bus);
    assert!(matches!(
        Switch::topaz_open(SwitchFamily::Peridot, backend),
        Err(SwitchError::WrongFamily {
            actual: SwitchFamily::Peridot,
            expected: SwitchFamily::Topaz,
            ..
        })
    ));
}

#[test]
fn feature_matrix_matches_the_silicon() {
    let bus = Arc::new(MockBus::new());

    let topaz = Switch {
        inner: Box::new(Topaz::create(bus.clone(), Arc::new(DirectSmi), 0x115)),
    };
    assert!(topaz.atu().is_ok());
    assert!(topaz.rmon().is_ok());
    assert!(matches!(
        topaz.ecid(),
        Err(SwitchError::NotSupported { feature: "ECID", .. })
    ));
    assert!(matches!(topaz.arp(), Err(SwitchError::NotSupported { .. })));
    assert!(matches!(topaz.imp(), Err(SwitchError::NotSupported { .. })));

    let peridot = Switch {
        inner: Box::new(Peridot::create(bus.clone(), Arc::new(DirectSmi), 0x390)),
    };
    assert!(peridot.imp().is_ok());
    assert!(matches!(peridot.ecid(), Err(SwitchError::NotSupported { .. })));
    assert!(matches!(peridot.arp(), Err(SwitchError::NotSupported { .. })));

    let amethyst = Switch {
        inner: Box::new(Amethyst::create(bus, Arc::new(DirectSmi), 0x393)),
    };
    assert!(amethyst.ecid().is_ok());
    assert!(amethyst.arp().is_ok());
    assert!(amethyst.imp().is_ok());
}
