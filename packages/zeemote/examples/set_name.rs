use std::time::Duration;

use log::{info, warn};
use rustyline::DefaultEditor;
use zeemote::{serial::SerialDiscovery, ZeemoteConfig, ZeemoteConnection, ZeemoteError};

#[tokio::main]
async fn main() -> Result<(), ZeemoteError> {
    simplelog::TermLogger::init(
        log::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Always,
    )
    .unwrap();

    let mut connection = ZeemoteConnection::new(SerialDiscovery::new(), ZeemoteConfig::default());
    connection.connect().await?;

    let mut editor = DefaultEditor::new().unwrap();
    let name = editor.readline("New name: >> ").unwrap();

    match connection
        .set_device_local_name(name.trim(), Duration::from_secs(2))
        .await
    {
        Ok(result) if result.is_successful() => info!("Name changed to {:?}", name.trim()),
        Ok(result) => warn!("The controller refused the name: {}", result),
        Err(ZeemoteError::NoReply) => warn!("The controller does not support renaming"),
        Err(e) => return Err(e),
    }

    connection.disconnect().await;
    Ok(())
}
