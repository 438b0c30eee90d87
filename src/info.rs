//! Build and runtime information about the emulator core.

pub struct Info;

impl Info {
    pub fn name() -> &'static str {
        env!("CARGO_PKG_NAME")
    }

    pub fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    pub fn system() -> &'static str {
        "Game Boy (DMG)"
    }

    pub fn compiler() -> &'static str {
        "rustc"
    }
}
