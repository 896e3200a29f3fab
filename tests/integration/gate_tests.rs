//! Attribute gate decisions as the mode engine changes state.

use locator_tag::app::commands::UiRequest;
use locator_tag::events::ModeEvent;
use locator_tag::gate::{
    AttributeUuid, GAP_DEVICE_NAME_UUID, GateFlags, SMP_CHARACTERISTIC_UUID, authorize_attribute,
};

use crate::mock_dev::{Harness, MockDevice};

const SMP: AttributeUuid = AttributeUuid::Uuid128(SMP_CHARACTERISTIC_UUID);
const NAME: AttributeUuid = AttributeUuid::Uuid16(GAP_DEVICE_NAME_UUID);
const BATTERY: AttributeUuid = AttributeUuid::Uuid16(0x2A19);

#[test]
fn unprovisioned_tag_shares_identity_but_not_dfu() {
    let mut h = Harness::new(MockDevice::new());
    h.send(ModeEvent::ProvisioningChanged(false)).unwrap();
    let ledger = h.engine.ledger();

    assert!(authorize_attribute(NAME, ledger));
    assert!(!authorize_attribute(SMP, ledger));
    assert!(authorize_attribute(BATTERY, ledger));
}

#[test]
fn provisioned_tag_hides_identity_until_identification_mode() {
    let mut h = Harness::provisioned();
    assert!(!authorize_attribute(NAME, h.engine.ledger()));

    h.send(ModeEvent::UiRequest(UiRequest::EnterIdentification))
        .unwrap();
    assert!(authorize_attribute(NAME, h.engine.ledger()));

    h.advance_to_secs(300);
    assert!(!authorize_attribute(NAME, h.engine.ledger()));
}

#[test]
fn recovery_mode_does_not_open_identity() {
    let mut h = Harness::provisioned();
    h.send(ModeEvent::UiRequest(UiRequest::EnterRecovery)).unwrap();
    assert!(!authorize_attribute(NAME, h.engine.ledger()));
}

#[test]
fn smp_characteristic_open_only_during_dfu() {
    let mut h = Harness::provisioned();
    h.send(ModeEvent::UiRequest(UiRequest::EnterDfu)).unwrap();
    assert!(authorize_attribute(SMP, h.engine.ledger()));

    h.advance_to_secs(60);
    assert!(!authorize_attribute(SMP, h.engine.ledger()));
}

#[test]
fn published_flags_match_the_ledger() {
    let flags = GateFlags::new();
    assert!(authorize_attribute(NAME, &flags));
    assert!(!authorize_attribute(SMP, &flags));

    let mut h = Harness::provisioned();
    h.send(ModeEvent::UiRequest(UiRequest::EnterDfu)).unwrap();
    flags.publish(h.engine.ledger());

    assert!(!authorize_attribute(NAME, &flags));
    assert!(authorize_attribute(SMP, &flags));
}
