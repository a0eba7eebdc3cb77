use std::ffi::c_void;

use log::debug;
use windows::{
    core::{s, PCSTR},
    Win32::{
        Foundation::{
            GetLastError, ERROR_CLASS_ALREADY_EXISTS, HINSTANCE, HWND, LPARAM, LRESULT, RECT,
            WPARAM,
        },
        System::LibraryLoader::GetModuleHandleA,
        UI::WindowsAndMessaging::{
            AdjustWindowRect, CreateWindowExA, DefWindowProcA, DestroyWindow, DispatchMessageA,
            GetWindowLongPtrA, IsWindow, LoadCursorA, MessageBoxA, PeekMessageA,
            PostQuitMessage, RegisterClassExA, SetWindowLongPtrA, ShowWindow, TranslateMessage,
            CREATESTRUCTA, CS_HREDRAW, CS_VREDRAW, CW_USEDEFAULT, GWLP_USERDATA, IDC_ARROW,
            MB_OK, MSG, PM_REMOVE, SW_HIDE, SW_SHOW, WM_CREATE, WM_DESTROY, WM_QUIT,
            WNDCLASSEXA, WS_OVERLAPPEDWINDOW,
        },
    },
};

use super::{
    pump_messages, Action, CloseOnDestroy, MessageHandler, MessageQueue, Response, WindowDesc,
    WindowHandle, WindowHost, WindowMessage,
};
use crate::{
    driver::ReportFailure,
    error::{Error, PlatformError, Result},
    util::AsCString,
};

const CLASS_NAME: PCSTR = s!("LearnD3D11Class");

impl From<WindowHandle> for HWND {
    fn from(handle: WindowHandle) -> Self {
        HWND(handle.0 as _)
    }
}

pub struct Window {
    hwnd: HWND,
    // Boxed twice so the window procedure can reach the handler through a thin
    // pointer that stays put for the lifetime of the window.
    _handler: Box<Box<dyn MessageHandler>>,
}

impl Window {
    pub fn new(
        desc: &WindowDesc,
        handler: Box<dyn MessageHandler>,
    ) -> std::result::Result<Self, PlatformError> {
        let instance = unsafe { GetModuleHandleA(None) }
            .map_err(|e| PlatformError::new("get module handle", e))?;

        register_class(instance.into())?;

        let mut window_rect = RECT {
            left: 0,
            top: 0,
            right: desc.width as i32,
            bottom: desc.height as i32,
        };
        unsafe { AdjustWindowRect(&mut window_rect, WS_OVERLAPPEDWINDOW, false) }
            .map_err(|e| PlatformError::new("adjust window rect", e))?;

        let handler = Box::new(handler);
        let create_params = &*handler as *const Box<dyn MessageHandler> as *const c_void;
        let title = desc.title.as_c_string();

        let hwnd = unsafe {
            CreateWindowExA(
                Default::default(),
                CLASS_NAME,
                PCSTR(title.as_ptr() as _),
                WS_OVERLAPPEDWINDOW,
                CW_USEDEFAULT,
                CW_USEDEFAULT,
                window_rect.right - window_rect.left,
                window_rect.bottom - window_rect.top,
                None, // No parent window.
                None, // No menus.
                instance,
                Some(create_params),
            )
        }
        .map_err(|e| PlatformError::new("create window", e))?;

        if hwnd == HWND::default() {
            return Err(PlatformError::new("create window", "null window handle"));
        }

        debug!(
            "created window {:?} with a {}x{} client area",
            desc.title, desc.width, desc.height
        );

        Ok(Self {
            hwnd,
            _handler: handler,
        })
    }

    pub fn handle(&self) -> WindowHandle {
        WindowHandle(self.hwnd.0 as isize)
    }

    pub fn set_visible(&self, visible: bool) {
        let show = if visible { SW_SHOW } else { SW_HIDE };
        let _ = unsafe { ShowWindow(self.hwnd, show) };
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        unsafe {
            // Detach the handler first: it is about to be freed and destroying
            // the window from here must not post a quit message.
            SetWindowLongPtrA(self.hwnd, GWLP_USERDATA, 0);
            if IsWindow(self.hwnd).as_bool() {
                let _ = DestroyWindow(self.hwnd);
            }
        }
    }
}

fn register_class(instance: HINSTANCE) -> std::result::Result<(), PlatformError> {
    let wc = WNDCLASSEXA {
        cbSize: std::mem::size_of::<WNDCLASSEXA>() as u32,
        style: CS_HREDRAW | CS_VREDRAW,
        lpfnWndProc: Some(wndproc),
        hInstance: instance,
        hCursor: unsafe { LoadCursorA(None, PCSTR(IDC_ARROW.0 as _)) }
            .map_err(|e| PlatformError::new("load cursor", e))?,
        lpszClassName: CLASS_NAME,
        ..Default::default()
    };

    if unsafe { RegisterClassExA(&wc) } == 0 {
        let error = unsafe { GetLastError() };
        // One class serves every window in the process.
        if error != ERROR_CLASS_ALREADY_EXISTS {
            return Err(PlatformError::new(
                "register window class",
                windows::core::Error::from(error.to_hresult()),
            ));
        }
    }

    Ok(())
}

fn translate(message: u32, wparam: WPARAM) -> WindowMessage {
    match message {
        WM_DESTROY => WindowMessage::Destroy,
        WM_QUIT => WindowMessage::Quit {
            exit_code: wparam.0 as i32,
        },
        id => WindowMessage::Other { id },
    }
}

extern "system" fn wndproc(hwnd: HWND, message: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if message == WM_CREATE {
        let create_struct = unsafe { &*(lparam.0 as *const CREATESTRUCTA) };
        unsafe { SetWindowLongPtrA(hwnd, GWLP_USERDATA, create_struct.lpCreateParams as _) };
        return LRESULT::default();
    }

    let user_data = unsafe { GetWindowLongPtrA(hwnd, GWLP_USERDATA) };
    let handler = std::ptr::NonNull::<Box<dyn MessageHandler>>::new(user_data as _);
    let response = handler.map(|mut h| unsafe { h.as_mut() }.handle(translate(message, wparam)));

    match response {
        Some(Response::Handled) => LRESULT::default(),
        Some(Response::PostQuit { exit_code }) => {
            unsafe { PostQuitMessage(exit_code) };
            LRESULT::default()
        }
        Some(Response::Default) | None => unsafe { DefWindowProcA(hwnd, message, wparam, lparam) },
    }
}

/// The calling thread's message queue.
#[derive(Default)]
pub struct Win32Queue {
    message: MSG,
}

impl MessageQueue for Win32Queue {
    fn poll(&mut self) -> Option<WindowMessage> {
        unsafe { PeekMessageA(&mut self.message, None, 0, 0, PM_REMOVE) }
            .as_bool()
            .then(|| translate(self.message.message, self.message.wParam))
    }

    fn dispatch(&mut self, _message: WindowMessage) {
        unsafe {
            let _ = TranslateMessage(&self.message);
            DispatchMessageA(&self.message);
        }
    }
}

pub struct Win32Host {
    handler: Option<Box<dyn MessageHandler>>,
    window: Option<Window>,
    queue: Win32Queue,
}

impl Win32Host {
    pub fn new(handler: impl MessageHandler + 'static) -> Self {
        Self {
            handler: Some(Box::new(handler)),
            window: None,
            queue: Win32Queue::default(),
        }
    }

    pub fn window(&self) -> Option<&Window> {
        self.window.as_ref()
    }
}

impl Default for Win32Host {
    fn default() -> Self {
        Self::new(CloseOnDestroy)
    }
}

impl WindowHost for Win32Host {
    fn create_window(&mut self, desc: &WindowDesc) -> Result<WindowHandle> {
        let handler = self
            .handler
            .take()
            .unwrap_or_else(|| Box::new(CloseOnDestroy));
        let window = Window::new(desc, handler).map_err(Error::WindowCreationFailed)?;
        window.set_visible(desc.visible);

        let handle = window.handle();
        self.window = Some(window);
        Ok(handle)
    }

    fn pump_messages(&mut self) -> Action {
        pump_messages(&mut self.queue)
    }
}

/// Reports start-up failures in a modal message box.
pub struct MessageBoxReporter;

impl ReportFailure for MessageBoxReporter {
    fn report(&mut self, error: &Error) {
        let text = error.to_string().as_c_string();
        unsafe {
            MessageBoxA(None, PCSTR(text.as_ptr() as _), s!("Error"), MB_OK);
        }
    }
}
