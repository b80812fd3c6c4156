use comet::config;
use comet::gui::app::AppModel;
use comet::gui::trail::TrailState;
use comet::sys::runtime;
use relm4::prelude::*;

fn main() {
    env_logger::init();

    match config::write_default_config() {
        Ok(path) => log::debug!("Config file: {}", path.display()),
        Err(e) => log::debug!("Could not write default config: {}", e),
    }

    let config = config::load_or_default();

    let state = match TrailState::activate(config) {
        Ok(state) => state,
        Err(e) => {
            log::warn!("Refusing to start: {}", e);
            return;
        }
    };

    let (tx, rx) = async_channel::bounded(32);

    // Start Background Services
    runtime::start_background_services(tx);

    let app = RelmApp::new("org.troia.comet");

    app.run::<AppModel>((state, rx));
}
