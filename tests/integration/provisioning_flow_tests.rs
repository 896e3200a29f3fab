//! Provisioning and factory-reset flows through the mode engine.
//!
//! Walks the tag through the sequences a pairing peer produces: first
//! boot, account-key write, beacon provisioning, mismatches and the
//! provisioning timeout.

use embassy_time::Instant;

use locator_tag::app::ports::{AdvMode, TimerPort, UiState};
use locator_tag::error::ModeError;
use locator_tag::events::ModeEvent;
use locator_tag::fsm::context::FactoryResetTrigger;
use locator_tag::timer::TimerId;

use crate::mock_dev::{DeviceCall, Harness, MockDevice};

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn fresh_tag_boots_discoverable() {
    let mut h = Harness::new(MockDevice::new());

    h.send(ModeEvent::ProvisioningChanged(false)).unwrap();
    assert_eq!(h.dev.last_adv(), Some(AdvMode::Discoverable));
    assert!(!h.engine.ledger().first_provisioning_callback());
    assert!(!h.dev.ui_shown(UiState::Provisioned));

    h.send(ModeEvent::ProvisioningChanged(false)).unwrap();
    assert_eq!(h.dev.last_adv(), Some(AdvMode::Discoverable));
}

#[test]
fn provisioned_boot_is_not_discoverable_then_off() {
    let mut h = Harness::new(MockDevice::with_key());
    h.send(ModeEvent::ProvisioningChanged(true)).unwrap();

    assert_eq!(h.dev.last_adv(), Some(AdvMode::NotDiscoverable));
    assert!(h.dev.ui_shown(UiState::Provisioned));
    assert!(h.engine.ledger().provisioned());
    assert!(h.engine.ledger().account_key_present());
    assert!(!h.timers.is_armed(TimerId::FactoryReset));

    h.send(ModeEvent::ProvisioningChanged(true)).unwrap();
    assert_eq!(h.dev.last_adv(), Some(AdvMode::Off));
}

#[test]
fn advertising_failure_keeps_first_callback_flag() {
    let mut dev = MockDevice::with_key();
    dev.fail_adv = true;
    let mut h = Harness::new(dev);

    let err = h.send(ModeEvent::ProvisioningChanged(true)).unwrap_err();
    assert!(matches!(
        err,
        ModeError::Collaborator {
            step: "set advertising mode",
            ..
        }
    ));
    assert!(h.engine.ledger().first_provisioning_callback());

    // Once the radio recovers, the retry still takes the first-boot path.
    h.dev.fail_adv = false;
    h.send(ModeEvent::ProvisioningChanged(true)).unwrap();
    assert_eq!(h.dev.last_adv(), Some(AdvMode::NotDiscoverable));
    assert!(!h.engine.ledger().first_provisioning_callback());
}

// ── Full pairing sequence ─────────────────────────────────────

#[test]
fn pairing_then_provisioning_completes_cleanly() {
    let mut h = Harness::new(MockDevice::new());
    h.send(ModeEvent::ProvisioningChanged(false)).unwrap();
    h.dev.clear();

    // Peer writes the first account key.
    h.dev.key_present = true;
    h.send(ModeEvent::AccountKeyWritten).unwrap();
    assert_eq!(h.dev.last_adv(), Some(AdvMode::NotDiscoverable));
    assert_eq!(h.dev.count(DeviceCall::SuspendRotation(true)), 1);
    assert_eq!(
        h.engine.ledger().factory_reset_trigger(),
        Some(FactoryResetTrigger::ProvisioningTimeout)
    );

    // Peer provisions the beacon two minutes later.
    h.advance_to_secs(120);
    h.send(ModeEvent::ProvisioningChanged(true)).unwrap();
    assert!(!h.engine.ledger().factory_reset_pending());
    assert!(!h.timers.is_armed(TimerId::FactoryReset));
    assert_eq!(h.dev.count(DeviceCall::SuspendRotation(false)), 1);
    assert_eq!(h.dev.last_adv(), Some(AdvMode::Off));

    // Nothing fires when the old deadline passes.
    h.advance_to_secs(600);
    assert_eq!(h.dev.count(DeviceCall::FactoryReset), 0);
}

#[test]
fn abandoned_pairing_resets_after_timeout() {
    let mut h = Harness::new(MockDevice::new());
    h.send(ModeEvent::ProvisioningChanged(false)).unwrap();
    h.dev.key_present = true;
    h.send(ModeEvent::AccountKeyWritten).unwrap();

    assert_eq!(h.dev.rotation_suspended(), Some(true));

    h.advance_to_secs(299);
    assert_eq!(h.dev.count(DeviceCall::FactoryReset), 0);
    assert_eq!(h.dev.rotation_suspended(), Some(true));

    h.advance_to_secs(300);
    assert_eq!(h.dev.count(DeviceCall::FactoryReset), 1);
    assert_eq!(h.dev.rotation_suspended(), Some(false));
    assert_eq!(h.dev.count(DeviceCall::SuspendRotation(false)), 1);
    assert!(h.engine.ledger().factory_reset_executed());
    assert!(!h.engine.ledger().factory_reset_pending());
    assert_eq!(h.engine.factory_reset().executed_count(), 1);

    // The reset's own provisioning callback consumes the flag without
    // touching advertising.
    h.dev.clear();
    h.send(ModeEvent::ProvisioningChanged(false)).unwrap();
    assert_eq!(h.dev.last_adv(), None);
    assert!(!h.engine.ledger().factory_reset_executed());

    // The next callback starts discoverable advertising again.
    h.send(ModeEvent::ProvisioningChanged(false)).unwrap();
    assert_eq!(h.dev.last_adv(), Some(AdvMode::Discoverable));
}

#[test]
fn second_account_key_does_not_rearm_timeout() {
    let mut h = Harness::new(MockDevice::new());
    h.send(ModeEvent::ProvisioningChanged(false)).unwrap();
    h.dev.key_present = true;
    h.send(ModeEvent::AccountKeyWritten).unwrap();

    h.advance_to_secs(200);
    h.send(ModeEvent::AccountKeyWritten).unwrap();
    assert_eq!(
        h.timers.deadline(TimerId::FactoryReset),
        Some(Instant::from_secs(300))
    );
}

// ── Mismatches ────────────────────────────────────────────────

#[test]
fn key_without_provisioning_schedules_quick_reset() {
    let mut h = Harness::new(MockDevice::with_key());
    h.send(ModeEvent::ProvisioningChanged(false)).unwrap();

    assert_eq!(h.dev.last_adv(), Some(AdvMode::Off));
    assert_eq!(
        h.engine.ledger().factory_reset_trigger(),
        Some(FactoryResetTrigger::KeyStateMismatch)
    );
    assert_eq!(
        h.timers.deadline(TimerId::FactoryReset),
        Some(Instant::from_secs(3))
    );

    h.advance_to_secs(3);
    assert_eq!(h.dev.count(DeviceCall::FactoryReset), 1);
    assert!(!h.dev.key_present);
}

#[test]
fn provisioning_without_key_schedules_quick_reset() {
    let mut h = Harness::new(MockDevice::new());
    h.send(ModeEvent::ProvisioningChanged(true)).unwrap();
    assert!(h.dev.ui_shown(UiState::Provisioned));
    assert_eq!(
        h.engine.ledger().factory_reset_trigger(),
        Some(FactoryResetTrigger::KeyStateMismatch)
    );
}

#[test]
fn mismatch_replaces_pending_provisioning_timeout() {
    let mut h = Harness::new(MockDevice::new());
    h.send(ModeEvent::ProvisioningChanged(false)).unwrap();
    h.dev.key_present = true;
    h.send(ModeEvent::AccountKeyWritten).unwrap();

    assert_eq!(h.dev.rotation_suspended(), Some(true));

    h.advance_to_secs(10);
    // Beacon reports unprovisioned again while a key is stored.
    h.send(ModeEvent::ProvisioningChanged(false)).unwrap();
    assert_eq!(
        h.engine.ledger().factory_reset_trigger(),
        Some(FactoryResetTrigger::KeyStateMismatch)
    );
    assert_eq!(h.dev.rotation_suspended(), Some(false));
    assert_eq!(
        h.timers.deadline(TimerId::FactoryReset),
        Some(Instant::from_secs(13))
    );

    h.advance_to_secs(13);
    assert_eq!(h.dev.count(DeviceCall::FactoryReset), 1);
    assert_eq!(h.dev.count(DeviceCall::SuspendRotation(false)), 1);
}

#[test]
fn failed_timeout_reset_still_resumes_rotation() {
    let mut dev = MockDevice::new();
    dev.fail_reset = true;
    let mut h = Harness::new(dev);
    h.send(ModeEvent::ProvisioningChanged(false)).unwrap();
    h.dev.key_present = true;
    h.send(ModeEvent::AccountKeyWritten).unwrap();

    let fired = h.timers.advance(Instant::from_secs(300));
    assert_eq!(fired.as_slice(), &[TimerId::FactoryReset]);
    let err = h.send(ModeEvent::TimerExpired(TimerId::FactoryReset)).unwrap_err();
    assert!(matches!(
        err,
        ModeError::FactoryResetFailed {
            trigger: FactoryResetTrigger::ProvisioningTimeout,
            ..
        }
    ));
    assert_eq!(h.dev.rotation_suspended(), Some(false));
    assert!(!h.engine.ledger().factory_reset_pending());
}

#[test]
fn key_mismatch_reset_leaves_rotation_alone() {
    let mut h = Harness::new(MockDevice::with_key());
    h.send(ModeEvent::ProvisioningChanged(false)).unwrap();
    h.advance_to_secs(3);
    assert_eq!(h.dev.count(DeviceCall::FactoryReset), 1);
    assert_eq!(h.dev.rotation_suspended(), None);
}

#[test]
fn failed_reset_clears_trigger_and_reports() {
    let mut dev = MockDevice::with_key();
    dev.fail_reset = true;
    let mut h = Harness::new(dev);
    h.send(ModeEvent::ProvisioningChanged(false)).unwrap();

    let fired = h.timers.advance(Instant::from_secs(3));
    assert_eq!(fired.as_slice(), &[TimerId::FactoryReset]);
    let err = h.send(ModeEvent::TimerExpired(TimerId::FactoryReset)).unwrap_err();
    assert!(matches!(
        err,
        ModeError::FactoryResetFailed {
            trigger: FactoryResetTrigger::KeyStateMismatch,
            ..
        }
    ));
    assert!(!h.engine.ledger().factory_reset_pending());
    assert!(!h.engine.ledger().factory_reset_executed());
    assert_eq!(h.engine.factory_reset().failed_count(), 1);
}

#[test]
fn key_query_failure_still_records_provisioned_state() {
    let mut dev = MockDevice::with_key();
    dev.fail_key_query = true;
    let mut h = Harness::new(dev);

    assert!(h.send(ModeEvent::ProvisioningChanged(true)).is_err());
    assert!(h.engine.ledger().provisioned());
    assert!(h.dev.ui_shown(UiState::Provisioned));
    assert_eq!(h.dev.last_adv(), None);
}

#[test]
fn clock_sync_stops_advertising_once_provisioned() {
    let mut h = Harness::provisioned();
    h.send(ModeEvent::ClockSynced).unwrap();
    assert_eq!(h.dev.calls, vec![DeviceCall::SetAdv(AdvMode::Off)]);
}
