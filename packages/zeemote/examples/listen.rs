use std::time::Duration;

use log::info;
use zeemote::{
    protocol::{report, Report},
    serial::SerialDiscovery,
    Incoming, ZeemoteConfig, ZeemoteConnection, ZeemoteError,
};

#[tokio::main]
async fn main() -> Result<(), ZeemoteError> {
    simplelog::TermLogger::init(
        log::LevelFilter::Debug,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Always,
    )
    .unwrap();

    let config = ZeemoteConfig::default()
        .with_discovery_backoff(Duration::from_secs(2))
        .with_capture(zeemote::config::DEFAULT_CAPTURE_PATH);

    let mut connection = ZeemoteConnection::new(SerialDiscovery::new(), config);
    connection.connect().await?;

    // Ask for 8-bit joystick reports and battery updates.
    connection
        .set_report_type_enable(report::ids::JOYSTICK_8, 1, 0, 0)
        .await?;
    connection
        .set_report_type_enable(report::ids::BATTERY, 1, 0, 0)
        .await?;

    loop {
        match connection.decode_one().await? {
            Incoming::Report(Report::Joystick8(stick)) => {
                info!("Stick {}: x={} y={}", stick.joystick_id, stick.x[0] as i8, stick.y[0] as i8)
            }
            Incoming::Report(Report::KeyCodes(keys)) => info!("Keys down: {:02x?}", keys.key_codes),
            Incoming::Report(Report::Battery(battery)) => info!("Battery: {} mV", battery.voltage),
            Incoming::Report(Report::DeviceInfo(device)) => info!(
                "{} firmware {}.{}.{}",
                String::from_utf8_lossy(device.model_name()),
                u16::from_be_bytes(device.firmware_major),
                u16::from_be_bytes(device.firmware_minor),
                u16::from_be_bytes(device.firmware_revision)
            ),
            Incoming::Report(other) => info!("{:?}", other),
            Incoming::Ignored { report_id, .. } => info!("Skipped report 0x{:02x}", report_id),
            Incoming::Reconnected => info!("Reconnected to {:?}", connection.endpoint()),
        }
    }
}
