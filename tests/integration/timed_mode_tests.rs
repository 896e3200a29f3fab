//! Recovery, identification and DFU windows.

use embassy_time::Instant;

use locator_tag::app::commands::UiRequest;
use locator_tag::app::ports::{AdvMode, ReadMode, TimerPort, UiState};
use locator_tag::events::ModeEvent;
use locator_tag::smp::{MGMT_GROUP_ID_IMAGE, MGMT_GROUP_ID_OS, OS_MGMT_ID_RESET, SmpCommand};
use locator_tag::timer::TimerId;

use crate::mock_dev::{DeviceCall, Harness, MockDevice};

// ── Recovery / identification ─────────────────────────────────

#[test]
fn unprovisioned_tag_ignores_read_mode_requests() {
    let mut h = Harness::new(MockDevice::new());
    h.send(ModeEvent::UiRequest(UiRequest::EnterRecovery)).unwrap();
    h.send(ModeEvent::UiRequest(UiRequest::EnterIdentification))
        .unwrap();

    assert!(h.dev.calls.is_empty());
    assert!(!h.engine.ledger().recovery_active());
    assert!(!h.engine.ledger().identification_active());
    assert_eq!(h.timers.next_deadline(), None);
}

#[test]
fn recovery_runs_for_one_minute() {
    let mut h = Harness::provisioned();
    h.send(ModeEvent::UiRequest(UiRequest::EnterRecovery)).unwrap();

    assert_eq!(
        h.dev.calls,
        vec![
            DeviceCall::EnterReadMode(ReadMode::Recovery),
            DeviceCall::Indicate(UiState::RecoveryMode, true),
        ]
    );
    assert!(h.engine.ledger().recovery_active());

    h.advance_to_secs(59);
    assert!(h.engine.ledger().recovery_active());
    h.advance_to_secs(60);
    assert!(!h.engine.ledger().recovery_active());
    assert!(!h.dev.ui_shown(UiState::RecoveryMode));
}

#[test]
fn recovery_and_identification_are_independent() {
    let mut h = Harness::provisioned();
    h.send(ModeEvent::UiRequest(UiRequest::EnterIdentification))
        .unwrap();
    h.advance_to_secs(30);
    h.send(ModeEvent::UiRequest(UiRequest::EnterRecovery)).unwrap();

    h.advance_to_secs(90);
    assert!(!h.engine.ledger().recovery_active());
    assert!(h.engine.ledger().identification_active());

    h.advance_to_secs(300);
    assert!(!h.engine.ledger().identification_active());
}

#[test]
fn beacon_closing_window_exits_early() {
    let mut h = Harness::provisioned();
    h.send(ModeEvent::UiRequest(UiRequest::EnterIdentification))
        .unwrap();
    h.advance_to_secs(10);

    h.send(ModeEvent::ReadModeExited(ReadMode::Identification))
        .unwrap();
    assert!(!h.engine.ledger().identification_active());
    assert!(!h.timers.is_armed(TimerId::IdentificationMode));

    // The old deadline no longer fires an exit.
    h.dev.clear();
    h.advance_to_secs(400);
    assert!(h.dev.calls.is_empty());
}

#[test]
fn exit_of_inactive_mode_is_silent() {
    let mut h = Harness::provisioned();
    h.send(ModeEvent::ReadModeExited(ReadMode::Recovery)).unwrap();
    h.send(ModeEvent::TimerExpired(TimerId::IdentificationMode))
        .unwrap();
    assert!(h.dev.calls.is_empty());
}

#[test]
fn refused_read_mode_leaves_nothing_behind() {
    let mut h = Harness::provisioned();
    h.dev.fail_read_mode = true;
    assert!(
        h.send(ModeEvent::UiRequest(UiRequest::EnterIdentification))
            .is_err()
    );
    assert!(h.dev.calls.is_empty());
    assert!(!h.timers.is_armed(TimerId::IdentificationMode));
}

#[test]
fn repeated_request_extends_from_now() {
    let mut h = Harness::provisioned();
    h.send(ModeEvent::UiRequest(UiRequest::EnterRecovery)).unwrap();
    h.advance_to_secs(45);
    h.send(ModeEvent::UiRequest(UiRequest::EnterRecovery)).unwrap();

    assert_eq!(
        h.timers.deadline(TimerId::RecoveryMode),
        Some(Instant::from_secs(105))
    );
    h.advance_to_secs(104);
    assert!(h.engine.ledger().recovery_active());
    h.advance_to_secs(105);
    assert!(!h.engine.ledger().recovery_active());
}

// ── DFU ───────────────────────────────────────────────────────

#[test]
fn dfu_entry_order_when_provisioned() {
    let mut h = Harness::provisioned();
    h.send(ModeEvent::UiRequest(UiRequest::EnterDfu)).unwrap();

    assert_eq!(
        h.dev.calls,
        vec![
            DeviceCall::SetAdv(AdvMode::NotDiscoverable),
            DeviceCall::UpdateTransport(true),
            DeviceCall::Indicate(UiState::DfuMode, true),
        ]
    );
    assert!(h.engine.ledger().dfu_active());
}

#[test]
fn dfu_available_without_provisioning() {
    let mut h = Harness::new(MockDevice::new());
    h.send(ModeEvent::UiRequest(UiRequest::EnterDfu)).unwrap();
    assert_eq!(h.dev.last_adv(), Some(AdvMode::Discoverable));
    assert!(h.engine.ledger().dfu_active());
}

#[test]
fn dfu_advertising_failure_abandons_entry() {
    let mut h = Harness::provisioned();
    h.dev.fail_adv = true;
    assert!(h.send(ModeEvent::UiRequest(UiRequest::EnterDfu)).is_err());
    assert!(!h.engine.ledger().dfu_active());
    assert!(!h.timers.is_armed(TimerId::DfuMode));
    assert_eq!(h.dev.count(DeviceCall::UpdateTransport(true)), 0);
}

#[test]
fn upload_traffic_keeps_dfu_open() {
    let mut h = Harness::provisioned();
    h.send(ModeEvent::UiRequest(UiRequest::EnterDfu)).unwrap();

    let upload = SmpCommand::request(MGMT_GROUP_ID_IMAGE, 1);
    for t in [40, 80, 120] {
        h.advance_to_secs(t);
        h.send(ModeEvent::FirmwareUpdateCommand(upload)).unwrap();
        assert!(h.engine.ledger().dfu_active());
    }
    h.advance_to_secs(170);
    assert!(h.engine.ledger().dfu_active());

    // Device reset command after the upload also counts.
    h.send(ModeEvent::FirmwareUpdateCommand(SmpCommand::request(
        MGMT_GROUP_ID_OS,
        OS_MGMT_ID_RESET,
    )))
    .unwrap();
    assert_eq!(
        h.timers.deadline(TimerId::DfuMode),
        Some(Instant::from_secs(230))
    );

    h.advance_to_secs(230);
    assert!(!h.engine.ledger().dfu_active());
    assert_eq!(h.dev.count(DeviceCall::UpdateTransport(false)), 1);
    assert_eq!(h.dev.last_adv(), Some(AdvMode::Off));
    assert!(!h.dev.ui_shown(UiState::DfuMode));
}

#[test]
fn unrelated_smp_traffic_does_not_extend() {
    let mut h = Harness::provisioned();
    h.send(ModeEvent::UiRequest(UiRequest::EnterDfu)).unwrap();
    h.advance_to_secs(30);
    // OS echo.
    h.send(ModeEvent::FirmwareUpdateCommand(SmpCommand::request(
        MGMT_GROUP_ID_OS,
        0,
    )))
    .unwrap();
    assert_eq!(
        h.timers.deadline(TimerId::DfuMode),
        Some(Instant::from_secs(60))
    );
}

#[test]
fn dfu_exit_survives_advertising_failure() {
    let mut h = Harness::provisioned();
    h.send(ModeEvent::UiRequest(UiRequest::EnterDfu)).unwrap();
    h.dev.fail_adv = true;
    h.advance_to_secs(60);

    assert!(!h.engine.ledger().dfu_active());
    assert_eq!(h.dev.count(DeviceCall::UpdateTransport(false)), 1);
    assert!(!h.dev.ui_shown(UiState::DfuMode));
}
