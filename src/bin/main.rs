#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use embassy_executor::Spawner;
use embassy_net::StackResources;
use embassy_time::{Instant, Timer};
use embedded_hal_bus::spi::ExclusiveDevice;
use esp_hal::{
    clock::CpuClock,
    gpio::{Input, InputConfig, Level, Output, OutputConfig},
    ledc::{LSGlobalClkSource, Ledc, LowSpeed, channel, timer},
    rng::Rng,
    spi::master::Spi,
    time::Rate,
    timer::timg::TimerGroup,
};
use esp_radio::wifi::{ClientConfig, ModeConfig};
use homedash_core::{
    app::Dashboard,
    config::{DeviceConfig, Transport},
    connectivity::{Supervisor, SupervisorConfig, client_id},
    protocol::url::{MQTT_PORT, parse_endpoint, parse_http_url},
    screen::{Backlight, ControllerConfig, DisplayMode, TickResult},
    telemetry::scrape::DEFAULT_KEYS,
};
use homedash_hal_esp32::{
    input::buttons::{ButtonConfig, FrontButtons},
    network::{
        LinkHandle, RemoteSession, SessionHandle, WifiLink,
        http::{HttpTarget, http_worker},
        mqtt::{MqttTarget, mqtt_worker},
        wifi::wifi_worker,
    },
    platform::backlight::{self, LedcBacklight},
    render::{FrameRenderer, LcdFonts, LcdRenderer},
};
use log::{LevelFilter, info, warn};
use mipidsi::{
    Builder as MipidsiBuilder,
    interface::SpiInterface,
    models::ILI9342CRgb565,
    options::{ColorInversion, ColorOrder},
};
use static_cell::StaticCell;

const DISPLAY_SPI_HZ: u32 = 40_000_000;
const DISPLAY_WIDTH: u16 = 320;
const DISPLAY_HEIGHT: u16 = 240;
const UI_TICK_MS: u64 = 20;
const CLIENT_ID_PREFIX: &str = "homedash-";
const VERSION: &str = env!("CARGO_PKG_VERSION");

const WIFI_SSID: &str = env!(
    "HOMEDASH_WIFI_SSID",
    "Set HOMEDASH_WIFI_SSID in your environment before building/flashing."
);
const WIFI_PASSWORD: &str = env!(
    "HOMEDASH_WIFI_PASSWORD",
    "Set HOMEDASH_WIFI_PASSWORD in your environment before building/flashing."
);
const ENDPOINT: &str = env!(
    "HOMEDASH_ENDPOINT",
    "Set HOMEDASH_ENDPOINT (broker host[:port] or http:// status page URL)."
);
const TOPIC: &str = match option_env!("HOMEDASH_TOPIC") {
    Some(topic) => topic,
    None => "",
};
const TITLE: &str = match option_env!("HOMEDASH_TITLE") {
    Some(title) => title,
    None => "Tableau de bord",
};

static LINK: LinkHandle = LinkHandle::new();
static SESSION: SessionHandle = SessionHandle::new();
static NET_RESOURCES: StaticCell<StackResources<4>> = StaticCell::new();
static BACKLIGHT_TIMER: StaticCell<timer::Timer<'static, LowSpeed>> = StaticCell::new();

#[panic_handler]
fn panic(_: &core::panic::PanicInfo) -> ! {
    loop {}
}

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

async fn park() -> ! {
    loop {
        Timer::after_secs(1).await;
    }
}

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(_spawner: Spawner) -> ! {
    esp_println::logger::init_logger(LevelFilter::Info);
    esp_println::println!("boot: homedash {} starting", VERSION);

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    // esp-radio requires an allocator.
    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 65536);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    let device = DeviceConfig::new(WIFI_SSID, WIFI_PASSWORD, ENDPOINT)
        .with_topic(TOPIC)
        .with_title(TITLE)
        .with_transport(Transport::from_selector(option_env!("HOMEDASH_TRANSPORT")));
    if let Err(err) = device.validate() {
        info!("config: {}; halting", err);
        park().await;
    }

    // M5Stack Core wiring:
    // LCD MOSI=GPIO23 SCK=GPIO18 CS=GPIO14 DC=GPIO27 RST=GPIO33 BL=GPIO32
    // Buttons A=GPIO39 B=GPIO38 C=GPIO37 (external pull-ups, active low)
    let spi_config = esp_hal::spi::master::Config::default()
        .with_frequency(Rate::from_hz(DISPLAY_SPI_HZ))
        .with_mode(esp_hal::spi::Mode::_0);
    let spi_bus = match Spi::new(peripherals.SPI2, spi_config) {
        Ok(spi) => spi
            .with_sck(peripherals.GPIO18)
            .with_mosi(peripherals.GPIO23),
        Err(err) => {
            info!("display spi config failed: {:?}", err);
            park().await;
        }
    };
    let cs = Output::new(peripherals.GPIO14, Level::High, OutputConfig::default());
    let dc = Output::new(peripherals.GPIO27, Level::Low, OutputConfig::default());
    let rst = Output::new(peripherals.GPIO33, Level::High, OutputConfig::default());

    let Ok(spi_device) = ExclusiveDevice::new_no_delay(spi_bus, cs);
    let mut spi_buffer = [0u8; 512];
    let di = SpiInterface::new(spi_device, dc, &mut spi_buffer);
    let display = match MipidsiBuilder::new(ILI9342CRgb565, di)
        .reset_pin(rst)
        .display_size(DISPLAY_WIDTH, DISPLAY_HEIGHT)
        .invert_colors(ColorInversion::Inverted)
        .color_order(ColorOrder::Bgr)
        .init(&mut embassy_time::Delay)
    {
        Ok(display) => display,
        Err(err) => {
            info!("display init failed: {:?}", err);
            park().await;
        }
    };
    let mut renderer = LcdRenderer::new(display);

    let mut ledc = Ledc::new(peripherals.LEDC);
    ledc.set_global_slow_clock(LSGlobalClkSource::APBClk);
    let mut backlight_timer = ledc.timer::<LowSpeed>(timer::Number::Timer0);
    if let Err(err) = backlight::configure_timer(&mut backlight_timer) {
        info!("backlight timer config failed: {:?}", err);
        park().await;
    }
    let backlight_timer = BACKLIGHT_TIMER.init(backlight_timer);
    let backlight_channel = ledc.channel(channel::Number::Channel0, peripherals.GPIO32);
    let mut backlight = match LedcBacklight::new(backlight_channel, backlight_timer) {
        Ok(backlight) => backlight,
        Err(err) => {
            info!("backlight channel config failed: {:?}", err);
            park().await;
        }
    };

    let button_cfg = InputConfig::default();
    let buttons = match FrontButtons::new(
        Input::new(peripherals.GPIO39, button_cfg),
        Input::new(peripherals.GPIO38, button_cfg),
        Input::new(peripherals.GPIO37, button_cfg),
        ButtonConfig::default(),
    ) {
        Ok(buttons) => buttons,
        Err(err) => {
            info!("button init failed: {:?}", err);
            park().await;
        }
    };

    let radio = match esp_radio::init() {
        Ok(radio) => radio,
        Err(err) => {
            info!("esp-radio init failed: {:?}", err);
            park().await;
        }
    };
    let (mut wifi_controller, interfaces) =
        match esp_radio::wifi::new(&radio, peripherals.WIFI, esp_radio::wifi::Config::default()) {
            Ok(parts) => parts,
            Err(err) => {
                info!("wifi peripheral init failed: {:?}", err);
                park().await;
            }
        };

    let client_config = ClientConfig::default()
        .with_ssid(device.ssid.into())
        .with_password(device.passphrase.into());
    if let Err(err) = wifi_controller.set_config(&ModeConfig::Client(client_config)) {
        info!("wifi mode config failed: {:?}", err);
        park().await;
    }

    let mac = interfaces.sta.mac_address();
    let rng = Rng::new();
    let seed = (u64::from(rng.random()) << 32) | u64::from(rng.random());
    let (stack, mut net_runner) = embassy_net::new(
        interfaces.sta,
        embassy_net::Config::dhcpv4(Default::default()),
        NET_RESOURCES.init(StackResources::<4>::new()),
        seed,
    );

    let display_mode = match device.transport {
        Transport::Mqtt => DisplayMode::MultiScreen,
        Transport::HttpPoll => DisplayMode::SingleValue,
    };
    let supervisor = Supervisor::new(
        WifiLink::new(&LINK, device.ssid),
        RemoteSession::new(&SESSION, device.endpoint),
        client_id(CLIENT_ID_PREFIX, mac),
        SupervisorConfig::default(),
    );
    info!(
        "homedash {} started: client_id={} transport={:?} endpoint={}",
        VERSION,
        supervisor.client_id(),
        device.transport,
        device.endpoint
    );

    let boot = Instant::now();
    let mut dashboard = Dashboard::new(
        supervisor,
        buttons,
        &device,
        ControllerConfig::default().with_display_mode(display_mode),
        VERSION,
        boot.elapsed().as_millis(),
    );

    let session_future = async {
        match device.transport {
            Transport::Mqtt => {
                let endpoint = match parse_endpoint(device.endpoint, MQTT_PORT) {
                    Ok(endpoint) => endpoint,
                    Err(err) => {
                        warn!("mqtt: {}", err);
                        park().await
                    }
                };
                let target = MqttTarget {
                    endpoint,
                    topic: device.topic,
                };
                mqtt_worker(stack, &SESSION, target).await
            }
            Transport::HttpPoll => {
                let url = match parse_http_url(device.endpoint) {
                    Ok(url) => url,
                    Err(err) => {
                        warn!("http: {}", err);
                        park().await
                    }
                };
                let target = HttpTarget {
                    url,
                    anchor: DEFAULT_KEYS[0].id,
                };
                http_worker(stack, &SESSION, target).await
            }
        }
    };

    let net_future = net_runner.run();
    let wifi_future = wifi_worker(&mut wifi_controller, stack, &LINK);
    let ui_future = async {
        let mut display_fault_logged = false;
        let mut last_state = dashboard.connection_state();

        loop {
            let now_ms = boot.elapsed().as_millis();
            let tick = dashboard.tick(now_ms);

            if let Some(brightness) = dashboard.take_brightness_change()
                && let Err(err) = backlight.set_brightness(brightness)
            {
                warn!("backlight: {:?}", err);
            }

            if tick == TickResult::RenderRequested {
                let frame = dashboard.frame(&LcdFonts);
                if let Err(err) = renderer.render(&frame)
                    && !display_fault_logged
                {
                    info!("display draw failed: {:?}", err);
                    display_fault_logged = true;
                }
            }

            let state = dashboard.connection_state();
            if state != last_state {
                info!(
                    "connectivity: {} (link revision {})",
                    state.as_str(),
                    LINK.revision()
                );
                last_state = state;
            }

            Timer::after_millis(UI_TICK_MS).await;
        }
    };

    embassy_futures::join::join4(net_future, wifi_future, session_future, ui_future).await;
    park().await
}
