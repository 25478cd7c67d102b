pub mod control;
pub mod display;

pub mod ids {
    use crate::PLUGIN_ID;

    pub const DISPLAY: &str = const_format::concatcp!(PLUGIN_ID, ".display");
    pub const CONTROL: &str = const_format::concatcp!(PLUGIN_ID, ".control");
}
