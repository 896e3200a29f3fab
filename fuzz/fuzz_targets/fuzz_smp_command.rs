//! Fuzz target: SMP callback decoding
//!
//! Feeds arbitrary callback ids and payloads through the same path the
//! management-transport hook uses and checks that only well-formed
//! "command received" headers ever reach the event queue.
//!
//! cargo fuzz run fuzz_smp_command

#![no_main]

use libfuzzer_sys::fuzz_target;
use locator_tag::events::{EventBus, ModeEvent, post_smp_callback};
use locator_tag::smp::{MGMT_EVT_CMD_RECV, SMP_HEADER_LEN, SmpCommand};

fuzz_target!(|data: &[u8]| {
    let Some((&selector, payload)) = data.split_first() else {
        return;
    };
    let event = if selector & 1 == 0 {
        MGMT_EVT_CMD_RECV
    } else {
        u32::from(selector)
    };

    let direct = SmpCommand::from_callback(event, payload);
    if direct.is_ok() {
        assert_eq!(event, MGMT_EVT_CMD_RECV);
        assert_eq!(payload.len(), SMP_HEADER_LEN);
    }

    let bus = EventBus::new();
    let posted = post_smp_callback(&bus, event, payload);
    assert_eq!(posted.is_ok(), direct.is_ok());
    match bus.try_next() {
        Some(ModeEvent::FirmwareUpdateCommand(cmd)) => assert_eq!(Ok(cmd), direct),
        Some(other) => panic!("unexpected event {:?}", other),
        None => assert!(direct.is_err()),
    }
});
