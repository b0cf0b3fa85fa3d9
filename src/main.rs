mod app;
mod config;
mod consts;
mod gui;
mod renderer;

use native_dialog::{DialogBuilder, MessageLevel};
use tracing_subscriber::EnvFilter;

fn main() {
    initialise_tracing();

    if let Err(e) = app::run() {
        tracing::error!("{e:?}");

        // best effort, the log above already has the details
        if let Err(dialog) = DialogBuilder::message()
            .set_title(format!("{} - Failure", consts::WINDOW_TITLE))
            .set_text(format!("{:#}", e))
            .set_level(MessageLevel::Error)
            .alert()
            .show()
        {
            tracing::warn!("failed to show error dialog: {dialog}");
        }

        std::process::exit(-1);
    }
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
