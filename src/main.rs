mod actions;
mod clock;
mod render;
mod settings;
mod store;
mod ticker;

use streamdeck_lib::prelude::*;
use tracing::info;

use actions::{control::ControlAction, display::DisplayAction};

pub const PLUGIN_ID: &str = "icu.veelume.counterz";

fn main() -> anyhow::Result<()> {
    let _guard = init(PLUGIN_ID);
    info!("Starting V's Counterz Stream Deck plugin");

    let plugin = Plugin::new()
        .add_action(ActionFactory::default_of::<DisplayAction>())
        .add_action(ActionFactory::default_of::<ControlAction>());

    run_plugin(plugin)
}
