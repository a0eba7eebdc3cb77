use crate::{
    gfx::{Color, DriverType},
    os::WindowDesc,
};

pub const DEFAULT_TITLE: &str = "Program";
pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 600;

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub window: WindowDesc,
    pub clear_color: Color,
    pub driver_type: DriverType,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: WindowDesc::new(DEFAULT_TITLE, DEFAULT_WIDTH, DEFAULT_HEIGHT),
            clear_color: Color::WHITE,
            driver_type: DriverType::Hardware,
        }
    }
}

impl Config {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.window.title = title.into();
        self
    }

    pub fn with_clear_color(mut self, clear_color: Color) -> Self {
        self.clear_color = clear_color;
        self
    }

    pub fn with_driver_type(mut self, driver_type: DriverType) -> Self {
        self.driver_type = driver_type;
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandLine {
    pub use_warp_device: bool,
}

impl CommandLine {
    /// Applies the switches to `config`. WARP devices get a " (WARP)" title suffix.
    pub fn apply(&self, config: Config) -> Config {
        if !self.use_warp_device {
            return config;
        }

        let title = format!("{} (WARP)", config.window.title);
        config
            .with_title(title)
            .with_driver_type(DriverType::Warp)
    }
}

pub fn build_command_line<I, S>(args: I) -> CommandLine
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut use_warp_device = false;

    for arg in args {
        let arg = arg.as_ref();
        if arg.eq_ignore_ascii_case("-warp") || arg.eq_ignore_ascii_case("/warp") {
            use_warp_device = true;
        }
    }

    CommandLine { use_warp_device }
}
