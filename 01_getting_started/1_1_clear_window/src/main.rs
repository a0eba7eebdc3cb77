#![windows_subsystem = "windows"]

#[cfg(windows)]
fn run() -> i32 {
    use common::{
        config::Config,
        driver::Driver,
        gfx::{Direct3D11, GraphicsDevice},
        os::{MessageBoxReporter, Win32Host},
    };

    let config = Config::default();

    let mut driver = Driver::new(Win32Host::default(), MessageBoxReporter);
    driver.run(&config.window, |window, width, height| {
        GraphicsDevice::<Direct3D11>::init(
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

    let exit_code = run();
    common::gfx::report_live_objects();

    std::process::exit(exit_code);
}

#[cfg(not(windows))]
fn main() {
    common::util::init_logging();
    log::error!("this sample needs Windows and Direct3D 11");
    std::process::exit(1);
}
