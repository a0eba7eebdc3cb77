#![windows_subsystem = "windows"]

use common::{
    config::{build_command_line, Config},
    gfx::Color,
};

fn config() -> Config {
    let command_line = build_command_line(std::env::args());

    command_line.apply(
        Config::default()
            .with_title("Hello Triangle")
            .with_clear_color(Color::rgb(0.0, 0.2, 0.4)),
    )
}

#[cfg(windows)]
fn run(config: &Config) -> i32 {
    use common::{
        driver::Driver,
        gfx::{Direct3D11, GraphicsDevice, Triangle},
        os::{MessageBoxReporter, Win32Host},
    };

    let mut driver = Driver::new(Win32Host::default(), MessageBoxReporter);
    driver.run(&config.window, |window, width, height| {
        GraphicsDevice::<Direct3D11, Triangle>::init(
            Direct3D11::new(config.driver_type),
            window,
            width,
            height,
            config.clear_color,
        )
    })
}

#[cfg(windows)]
fn main() {
    common::util::init_logging();

    let exit_code = run(&config());
    common::gfx::report_live_objects();

    std::process::exit(exit_code);
}

#[cfg(not(windows))]
fn main() {
    common::util::init_logging();
    log::error!(
        "{:?} needs Windows and Direct3D 11",
        config().window.title
    );
    std::process::exit(1);
}
