//! Locator Tag Firmware — Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  AdvertisingAdapter  NvsKeyStore   ReadWindowAdapter           │
//! │  (Advertising)       (Keys+Reset)  (Beacon read modes)         │
//! │  IndicatorUi         NvsAdapter    SystemClock                 │
//! │  (UI + LED)          (Config)      (Timebase)                  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            ModeService (serialized context)            │    │
//! │  │  ModeEngine · DeadlineTimers · FactoryResetScheduler   │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  EventBus (producers: buttons, beacon, SMP) · GateFlags        │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use anyhow::Result;
use async_io_mini::Timer;
use edge_executor::LocalExecutor;
use esp_idf_hal::gpio::{Input, InputPin, Output, OutputPin, PinDriver, Pull};
use esp_idf_hal::peripherals::Peripherals;
use futures_lite::future::{block_on, or};
use log::{error, info, warn};

use locator_tag::adapters::advertising::AdvertisingAdapter;
use locator_tag::adapters::device::DeviceAdapter;
use locator_tag::adapters::key_store::NvsKeyStore;
use locator_tag::adapters::nvs::NvsAdapter;
use locator_tag::adapters::read_mode::ReadWindowAdapter;
use locator_tag::adapters::time::SystemClock;
use locator_tag::adapters::ui::IndicatorUi;
use locator_tag::app::commands::{ButtonRole, request_for};
use locator_tag::app::ports::{ConfigPort, KeyStorePort, PortError};
use locator_tag::app::service::ModeService;
use locator_tag::config::ModeConfig;
use locator_tag::drivers::button::{ButtonDriver, ButtonEvent};
use locator_tag::events::{EVENTS, ModeEvent};
use locator_tag::gate::GATE;
use locator_tag::startup::{InitHandshake, InitStage, PlatformInit, run_init_sequence};

/// Button/LED polling period.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

const CONTROLLER_STACK_SIZE: usize = 8 * 1024;

static INIT: InitHandshake = InitHandshake::new();

// ── Boot platform ─────────────────────────────────────────────
//
// Brings up the collaborators this firmware owns.  Stages handled by the
// radio and beacon stacks themselves only log here.

struct BootPlatform<'a> {
    device: &'a mut DeviceAdapter<NvsAdapter>,
}

impl PlatformInit for BootPlatform<'_> {
    fn init_stage(&mut self, stage: InitStage) -> Result<(), PortError> {
        match stage {
            InitStage::Radio => {
                self.device.advertising.set_ready(true);
            }
            InitStage::FactoryReset => {
                // Fails early if the key namespace cannot be read.
                self.device.keys.has_account_key()?;
            }
            _ => {}
        }
        Ok(())
    }
}

// ── Controller thread ─────────────────────────────────────────
//
// Two cooperative tasks on one local executor: the button task only posts
// requests; the mode task owns the service, the device and the LED.

struct Buttons<'d, M: InputPin, D: InputPin> {
    mode: ButtonDriver<PinDriver<'d, M, Input>>,
    dfu: ButtonDriver<PinDriver<'d, D, Input>>,
}

async fn button_task<M: InputPin, D: InputPin>(
    config: &ModeConfig,
    clock: &SystemClock,
    mut buttons: Buttons<'static, M, D>,
) {
    loop {
        let now_ms = clock.uptime_ms();
        if let Some(ButtonEvent::Released { held_ms }) = buttons.mode.tick(now_ms) {
            let request = request_for(ButtonRole::Mode, held_ms, config);
            EVENTS.post(ModeEvent::UiRequest(request));
        }
        if let Some(ButtonEvent::Released { held_ms }) = buttons.dfu.tick(now_ms) {
            let request = request_for(ButtonRole::Dfu, held_ms, config);
            EVENTS.post(ModeEvent::UiRequest(request));
        }
        Timer::after(POLL_INTERVAL).await;
    }
}

async fn mode_task<L: OutputPin>(
    config: ModeConfig,
    clock: &SystemClock,
    mut device: DeviceAdapter<NvsAdapter>,
    mut led: PinDriver<'static, L, Output>,
) {
    let mut service = ModeService::new(config, clock.now());
    service.start(&mut device);

    // The beacon stack reports its restored provisioning state once at boot.
    EVENTS.post(ModeEvent::ProvisioningChanged(
        device.keys.beacon_provisioned(),
    ));

    let mut last_ms = clock.uptime_ms();
    loop {
        let now = clock.now();
        device.read_windows.advance(now, &EVENTS);
        service.run_once(now, &EVENTS, &mut device, &GATE);

        let now_ms = clock.uptime_ms();
        let on = device.ui.tick(now_ms.wrapping_sub(last_ms));
        let driven = if on { led.set_high() } else { led.set_low() };
        if let Err(e) = driven {
            warn!("Status LED write failed: {}", e);
        }
        last_ms = now_ms;

        // Sleep until the next LED step, or until an event arrives.
        let woke = or(async { Some(EVENTS.next().await) }, async {
            Timer::after(POLL_INTERVAL).await;
            None
        })
        .await;
        if let Some(event) = woke {
            let now = clock.now();
            device.read_windows.advance(now, &EVENTS);
            service.run_woken(now, event, &EVENTS, &mut device, &GATE);
        }
    }
}

fn run_controller<M: InputPin, D: InputPin, L: OutputPin>(
    config: ModeConfig,
    nvs: NvsAdapter,
    buttons: Buttons<'static, M, D>,
    led: PinDriver<'static, L, Output>,
) {
    let clock = SystemClock::new();
    let mut device = DeviceAdapter::new(
        AdvertisingAdapter::new(),
        NvsKeyStore::new(nvs),
        ReadWindowAdapter::new(&config, clock.now()),
        IndicatorUi::new(),
    );

    let result = run_init_sequence(&mut BootPlatform {
        device: &mut device,
    });
    let ok = result.is_ok();
    INIT.complete(result);
    if !ok {
        return;
    }

    let executor: LocalExecutor<'_, 4> = LocalExecutor::new();
    executor
        .spawn(button_task(&config, &clock, buttons))
        .detach();
    executor
        .spawn(mode_task(config.clone(), &clock, device, led))
        .detach();

    info!("Controller tasks started");
    block_on(executor.run(core::future::pending::<()>()));
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Locator Tag v{}                     ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let nvs = NvsAdapter::new().map_err(|e| anyhow::anyhow!("NVS init failed: {e}"))?;
    let config = match nvs.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("Config load failed ({}), using defaults", e);
            ModeConfig::default()
        }
    };

    // ── 3. Buttons and status LED ─────────────────────────────
    let peripherals = Peripherals::take()?;
    let mut mode_pin = PinDriver::input(peripherals.pins.gpio9)?;
    mode_pin.set_pull(Pull::Up)?;
    let mut dfu_pin = PinDriver::input(peripherals.pins.gpio10)?;
    dfu_pin.set_pull(Pull::Up)?;
    let led = PinDriver::output(peripherals.pins.gpio8)?;

    let buttons = Buttons {
        mode: ButtonDriver::new(mode_pin, config.button_debounce_ms),
        dfu: ButtonDriver::new(dfu_pin, config.button_debounce_ms),
    };

    // ── 4. Controller thread ──────────────────────────────────
    let init_timeout = config.init_timeout();
    std::thread::Builder::new()
        .name("mode-ctl".into())
        .stack_size(CONTROLLER_STACK_SIZE)
        .spawn(move || run_controller(config, nvs, buttons, led))?;

    // ── 5. Wait for initialisation ────────────────────────────
    if let Err(e) = INIT.block_on_wait(init_timeout) {
        error!("Initialisation failed: {} — halting", e);
        panic!("initialisation failed: {e}");
    }
    info!("Locator tag running");

    Ok(())
}
