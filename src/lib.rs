pub mod completion;
pub mod error;
pub mod io_struct;
pub mod relay_state;
pub mod server;

use relay_state::{RelayConfig, RelayState};
use server::startup;
use tokio::signal;

/// Builds the relay from `relay_config` and serves until Ctrl+C.
pub fn run(relay_config: RelayConfig) -> anyhow::Result<()> {
    let relay_state = RelayState::new(relay_config.clone())?;

    actix_web::rt::System::new().block_on(async move {
        tokio::select! {
            res = startup(relay_config, relay_state) => {
                res.map_err(anyhow::Error::from)
            }
            _ = signal::ctrl_c() => {
                log::info!("Received Ctrl+C, shutting down");
                Ok(())
            }
        }
    })
}
