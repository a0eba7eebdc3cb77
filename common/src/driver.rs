//! Start-up sequencing: create the window, bring up the device, run the loop.
//!
//! Every start-up failure ends up here and nowhere else; the driver reports it
//! once and terminates with exit code 0.

use log::{debug, error, info};

use crate::{
    error::{Error, Result},
    os::{Action, WindowDesc, WindowHandle, WindowHost},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Start,
    WindowCreated,
    DeviceReady,
    Running,
    Terminated { exit_code: i32 },
}

/// A ready graphics device, as seen by the frame loop.
pub trait Graphics {
    fn render_frame(&mut self);

    fn shutdown(self);
}

/// Tells the user that start-up failed.
pub trait ReportFailure {
    fn report(&mut self, error: &Error);
}

pub struct Driver<H, R> {
    host: H,
    reporter: R,
    state: State,
    frames: u64,
}

impl<H: WindowHost, R: ReportFailure> Driver<H, R> {
    pub fn new(host: H, reporter: R) -> Self {
        Self {
            host,
            reporter,
            state: State::Start,
            frames: 0,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Runs until the window's quit message arrives and returns its exit code.
    ///
    /// `init_device` receives the new window and its client size.
    pub fn run<G, F>(&mut self, window: &WindowDesc, init_device: F) -> i32
    where
        G: Graphics,
        F: FnOnce(WindowHandle, u32, u32) -> Result<G>,
    {
        if let State::Terminated { exit_code } = self.state {
            return exit_code;
        }

        info!("starting {:?}", window.title);

        let handle = match self.host.create_window(window) {
            Ok(handle) => handle,
            Err(e) => return self.fail(e),
        };
        self.transition(State::WindowCreated);

        let mut graphics = match init_device(handle, window.width, window.height) {
            Ok(graphics) => graphics,
            Err(e) => return self.fail(e),
        };
        self.transition(State::DeviceReady);

        self.transition(State::Running);
        let exit_code = loop {
            match self.host.pump_messages() {
                Action::Continue => {
                    graphics.render_frame();
                    self.frames += 1;
                }
                Action::Quit(exit_code) => break exit_code,
            }
        };

        graphics.shutdown();
        self.transition(State::Terminated { exit_code });
        info!("quit with code {exit_code} after {} frames", self.frames);

        exit_code
    }

    fn fail(&mut self, e: Error) -> i32 {
        error!("{e}: {}", e.cause());
        self.reporter.report(&e);
        self.transition(State::Terminated { exit_code: 0 });
        0
    }

    fn transition(&mut self, next: State) {
        debug!("{:?} -> {:?}", self.state, next);
        self.state = next;
    }
}
