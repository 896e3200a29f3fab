//! Fuzz target: mode engine event sequences
//!
//! Interprets the input as a stream of events and clock steps, applies
//! them to a `ModeEngine` with a device whose collaborators fail on
//! demand, and checks the ledger invariants after every step.
//!
//! cargo fuzz run fuzz_event_sequence

#![no_main]

use embassy_time::{Duration, Instant};
use libfuzzer_sys::fuzz_target;

use locator_tag::app::commands::UiRequest;
use locator_tag::app::ports::{
    AdvMode, AdvertisingPort, FactoryResetPort, KeyStorePort, PortError, ReadMode, ReadModePort,
    TimerPort, UiPort, UiState,
};
use locator_tag::config::ModeConfig;
use locator_tag::events::ModeEvent;
use locator_tag::fsm::ModeEngine;
use locator_tag::fsm::states::TimedMode;
use locator_tag::smp::SmpCommand;
use locator_tag::timer::{DeadlineTimers, TimerId};

struct FlakyDevice {
    key: bool,
    fail: u8,
}

impl FlakyDevice {
    fn fails(&self, bit: u8) -> Result<(), PortError> {
        if self.fail & bit != 0 {
            Err(PortError::Unavailable)
        } else {
            Ok(())
        }
    }
}

impl AdvertisingPort for FlakyDevice {
    fn set_mode(&mut self, _mode: AdvMode) -> Result<(), PortError> {
        self.fails(0x01)
    }
    fn suspend_address_rotation(&mut self, _suspend: bool) {}
    fn enable_update_transport(&mut self, _enable: bool) {}
}

impl KeyStorePort for FlakyDevice {
    fn has_account_key(&self) -> Result<bool, PortError> {
        self.fails(0x02).map(|()| self.key)
    }
}

impl ReadModePort for FlakyDevice {
    fn enter_read_mode(&mut self, _mode: ReadMode) -> Result<(), PortError> {
        self.fails(0x04)
    }
}

impl UiPort for FlakyDevice {
    fn indicate(&mut self, _state: UiState, _active: bool) {}
}

impl FactoryResetPort for FlakyDevice {
    fn perform_factory_reset(&mut self) -> Result<(), PortError> {
        self.fails(0x08)?;
        self.key = false;
        Ok(())
    }
}

fuzz_target!(|data: &[u8]| {
    let mut engine = ModeEngine::new(ModeConfig::default());
    let mut timers = DeadlineTimers::new(Instant::from_secs(0));
    let mut dev = FlakyDevice { key: false, fail: 0 };
    let mut now = Instant::from_secs(0);

    for pair in data.chunks_exact(2) {
        let (op, arg) = (pair[0], pair[1]);
        let event = match op % 10 {
            0 => ModeEvent::ProvisioningChanged(arg & 1 != 0),
            1 => {
                dev.key = true;
                ModeEvent::AccountKeyWritten
            }
            2 => ModeEvent::ReadModeExited(if arg & 1 == 0 {
                ReadMode::Recovery
            } else {
                ReadMode::Identification
            }),
            3 => ModeEvent::ClockSynced,
            4 => ModeEvent::FirmwareUpdateCommand(SmpCommand::request(
                u16::from(arg & 0x03),
                arg >> 2,
            )),
            5 => ModeEvent::UiRequest(match arg % 3 {
                0 => UiRequest::EnterRecovery,
                1 => UiRequest::EnterIdentification,
                _ => UiRequest::EnterDfu,
            }),
            6 => {
                dev.fail = arg & 0x0F;
                continue;
            }
            _ => {
                now += Duration::from_secs(u64::from(arg));
                for id in timers.advance(now) {
                    let _ = engine.handle(ModeEvent::TimerExpired(id), &mut timers, &mut dev);
                }
                continue;
            }
        };
        let _ = engine.handle(event, &mut timers, &mut dev);

        let ledger = engine.ledger();
        // A pending reset always has a timer behind it.
        assert_eq!(
            ledger.factory_reset_pending(),
            timers.is_armed(TimerId::FactoryReset)
        );
        // Timed modes and their timers move together.
        for mode in TimedMode::ALL {
            assert_eq!(
                ledger.mode_state(mode).is_active(),
                timers.is_armed(mode.timer())
            );
        }
    }
});
