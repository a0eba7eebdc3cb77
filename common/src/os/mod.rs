//! Window host: window creation and the native message pump.
//!
//! The message model and the pump itself are platform neutral. The Win32
//! binding lives in [`win32`] and only translates native messages into
//! [`WindowMessage`]s and [`Response`]s back into native calls.

#[cfg(windows)]
mod win32;

#[cfg(windows)]
pub use win32::{MessageBoxReporter, Win32Host, Win32Queue, Window};

use crate::error::Result;

/// Opaque native window handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub isize);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowDesc {
    pub title: String,
    /// Client area width in pixels.
    pub width: u32,
    /// Client area height in pixels.
    pub height: u32,
    pub visible: bool,
}

impl WindowDesc {
    pub fn new(title: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            title: title.into(),
            width,
            height,
            visible: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowMessage {
    Destroy,
    Quit { exit_code: i32 },
    Other { id: u32 },
}

/// What the window procedure should do after a handler has seen a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Response {
    Handled,
    /// Post a quit message carrying `exit_code` to the thread's queue.
    PostQuit { exit_code: i32 },
    /// Forward to the platform's default window procedure.
    Default,
}

pub trait MessageHandler {
    fn handle(&mut self, message: WindowMessage) -> Response;
}

/// Quits with code 0 once the window is destroyed and leaves everything else
/// to the platform.
#[derive(Clone, Copy, Debug, Default)]
pub struct CloseOnDestroy;

impl MessageHandler for CloseOnDestroy {
    fn handle(&mut self, message: WindowMessage) -> Response {
        match message {
            WindowMessage::Destroy => Response::PostQuit { exit_code: 0 },
            _ => Response::Default,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// The queue is empty: time to render a frame.
    Continue,
    Quit(i32),
}

/// A thread message queue.
pub trait MessageQueue {
    /// Removes and returns the next pending message without blocking.
    fn poll(&mut self) -> Option<WindowMessage>;

    /// Translates and dispatches the message last returned by [`poll`](Self::poll).
    fn dispatch(&mut self, message: WindowMessage);
}

/// Drains the queue, dispatching every pending message.
///
/// Returns [`Action::Quit`] as soon as a quit message has been dispatched and
/// [`Action::Continue`] once nothing is pending.
pub fn pump_messages<Q: MessageQueue + ?Sized>(queue: &mut Q) -> Action {
    while let Some(message) = queue.poll() {
        queue.dispatch(message);

        if let WindowMessage::Quit { exit_code } = message {
            return Action::Quit(exit_code);
        }
    }

    Action::Continue
}

pub trait WindowHost {
    /// Creates and optionally shows the single application window.
    fn create_window(&mut self, desc: &WindowDesc) -> Result<WindowHandle>;

    fn pump_messages(&mut self) -> Action;
}
