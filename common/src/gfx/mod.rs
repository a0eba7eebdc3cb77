//! Graphics device and frame renderer.
//!
//! [`GraphicsDevice`] owns every GPU object for the lifetime of the window and
//! talks to the platform through [`GraphicsApi`]. On Windows that is
//! [`Direct3D11`].

#[cfg(windows)]
mod d3d11;
#[cfg(windows)]
mod triangle;

#[cfg(windows)]
pub use d3d11::{report_live_objects, Direct3D11};
#[cfg(windows)]
pub use triangle::Triangle;

use log::{debug, warn};

use crate::{
    driver::Graphics,
    error::{Error, PlatformError, Result},
    os::WindowHandle,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DriverType {
    #[default]
    Hardware,
    /// The WARP software rasterizer.
    Warp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Rgba8Unorm,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwapChainDesc {
    pub width: u32,
    pub height: u32,
    pub format: Format,
    pub buffer_count: u32,
    pub sample_count: u32,
    pub windowed: bool,
    /// Let alt+enter switch the display mode.
    pub allow_mode_switch: bool,
}

impl SwapChainDesc {
    pub fn for_window(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            format: Format::Rgba8Unorm,
            buffer_count: 1,
            sample_count: 4,
            windowed: true,
            allow_mode_switch: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// A viewport over the whole `width` x `height` render target.
    pub fn covering(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// Layout of the triangle's vertices: a position followed by an RGBA color.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl Vertex {
    pub const STRIDE: u32 = std::mem::size_of::<Vertex>() as u32;
    pub const COLOR_OFFSET: u32 = std::mem::size_of::<[f32; 3]>() as u32;
}

pub const TRIANGLE: [Vertex; 3] = [
    Vertex {
        position: [0.0, 0.5, 0.0],
        color: [1.0, 0.0, 0.0, 1.0],
    },
    Vertex {
        position: [0.45, -0.5, 0.0],
        color: [0.0, 1.0, 0.0, 1.0],
    },
    Vertex {
        position: [-0.45, -0.5, 0.0],
        color: [0.0, 0.0, 1.0, 1.0],
    },
];

/// The platform graphics API. Objects release themselves when dropped.
pub trait GraphicsApi {
    type Device;
    type Context;
    type SwapChain;
    type BackBuffer;
    type RenderTargetView;

    /// Creates a device, its immediate context and a swap chain bound to
    /// `window`, letting the platform pick the adapter.
    fn create_device_and_swap_chain(
        &self,
        window: WindowHandle,
        desc: &SwapChainDesc,
    ) -> Result<(Self::Device, Self::Context, Self::SwapChain), PlatformError>;

    fn back_buffer(&self, swap_chain: &Self::SwapChain) -> Result<Self::BackBuffer, PlatformError>;

    fn create_render_target_view(
        &self,
        device: &Self::Device,
        back_buffer: &Self::BackBuffer,
    ) -> Result<Self::RenderTargetView, PlatformError>;

    /// Makes `view` the only output-merger target.
    fn bind_render_target(&self, context: &Self::Context, view: &Self::RenderTargetView);

    fn set_viewport(&self, context: &Self::Context, viewport: &Viewport);

    fn clear_render_target(
        &self,
        context: &Self::Context,
        view: &Self::RenderTargetView,
        color: Color,
    );

    fn present(&self, swap_chain: &Self::SwapChain, sync_interval: u32)
        -> Result<(), PlatformError>;

    fn leave_fullscreen(&self, swap_chain: &Self::SwapChain);
}

/// Whatever gets drawn between the clear and the present.
pub trait DrawPayload<A: GraphicsApi>: Sized {
    fn create(api: &A, device: &A::Device) -> Result<Self, PlatformError>;

    fn draw(&self, api: &A, context: &A::Context);
}

/// Draws nothing; frames are just the clear color.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClearOnly;

impl<A: GraphicsApi> DrawPayload<A> for ClearOnly {
    fn create(_api: &A, _device: &A::Device) -> Result<Self, PlatformError> {
        Ok(ClearOnly)
    }

    fn draw(&self, _api: &A, _context: &A::Context) {}
}

struct Resources<A: GraphicsApi, P> {
    payload: P,
    render_target: A::RenderTargetView,
    swap_chain: A::SwapChain,
    device: A::Device,
    context: A::Context,
}

pub struct GraphicsDevice<A: GraphicsApi, P: DrawPayload<A> = ClearOnly> {
    api: A,
    clear_color: Color,
    viewport: Viewport,
    resources: Option<Resources<A, P>>,
}

impl<A: GraphicsApi, P: DrawPayload<A>> GraphicsDevice<A, P> {
    /// Creates the device, swap chain and render target for `window` and points
    /// a single viewport at the whole `width` x `height` client area.
    ///
    /// Objects created before a failing step are released on the way out.
    pub fn init(
        api: A,
        window: WindowHandle,
        width: u32,
        height: u32,
        clear_color: Color,
    ) -> Result<Self> {
        let desc = SwapChainDesc::for_window(width, height);
        let (device, context, swap_chain) = api
            .create_device_and_swap_chain(window, &desc)
            .map_err(Error::DeviceInitFailed)?;

        let back_buffer = api
            .back_buffer(&swap_chain)
            .map_err(Error::DeviceInitFailed)?;
        let render_target = api
            .create_render_target_view(&device, &back_buffer)
            .map_err(Error::DeviceInitFailed)?;
        // The view keeps what it needs of the back buffer alive.
        drop(back_buffer);
        api.bind_render_target(&context, &render_target);

        let viewport = Viewport::covering(width, height);
        api.set_viewport(&context, &viewport);

        let payload = P::create(&api, &device).map_err(Error::DeviceInitFailed)?;

        debug!("graphics device ready, {width}x{height}");

        Ok(Self {
            api,
            clear_color,
            viewport,
            resources: Some(Resources {
                payload,
                render_target,
                swap_chain,
                device,
                context,
            }),
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    /// Clears the back buffer, draws the payload and presents immediately.
    ///
    /// A failed present is logged and otherwise ignored.
    pub fn render_frame(&mut self) {
        let Some(resources) = &self.resources else {
            return;
        };

        self.api.clear_render_target(
            &resources.context,
            &resources.render_target,
            self.clear_color,
        );
        resources.payload.draw(&self.api, &resources.context);

        if let Err(e) = self.api.present(&resources.swap_chain, 0) {
            warn!("failed to present the frame {e}");
        }
    }

    /// Releases the payload, render target, swap chain, device and context, in
    /// that order.
    pub fn shutdown(mut self) {
        self.release();
    }

    fn release(&mut self) {
        let Some(Resources {
            payload,
            render_target,
            swap_chain,
            device,
            context,
        }) = self.resources.take()
        else {
            return;
        };

        self.api.leave_fullscreen(&swap_chain);

        drop(payload);
        drop(render_target);
        drop(swap_chain);
        drop(device);
        drop(context);

        debug!("graphics device released");
    }
}

impl<A: GraphicsApi, P: DrawPayload<A>> Drop for GraphicsDevice<A, P> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<A: GraphicsApi, P: DrawPayload<A>> Graphics for GraphicsDevice<A, P> {
    fn render_frame(&mut self) {
        GraphicsDevice::render_frame(self);
    }

    fn shutdown(self) {
        GraphicsDevice::shutdown(self);
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;

    type CallLog = Rc<RefCell<Vec<String>>>;

    struct Tracked {
        name: &'static str,
        log: CallLog,
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.log.borrow_mut().push(format!("release {}", self.name));
        }
    }

    #[derive(Default)]
    struct FakeApi {
        log: CallLog,
        fail_at: Option<&'static str>,
        fail_present: bool,
        swap_chain_desc: RefCell<Option<SwapChainDesc>>,
        viewport: RefCell<Option<Viewport>>,
    }

    impl FakeApi {
        fn failing_at(step: &'static str) -> Self {
            Self {
                fail_at: Some(step),
                ..Default::default()
            }
        }

        fn step(&self, name: &'static str) -> Result<Tracked, PlatformError> {
            self.record(format!("create {name}"));
            if self.fail_at == Some(name) {
                return Err(PlatformError::new(name, "E_FAIL"));
            }
            Ok(Tracked {
                name,
                log: self.log.clone(),
            })
        }

        fn record(&self, call: String) {
            self.log.borrow_mut().push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.log.borrow().clone()
        }
    }

    impl GraphicsApi for FakeApi {
        type Device = Tracked;
        type Context = Tracked;
        type SwapChain = Tracked;
        type BackBuffer = Tracked;
        type RenderTargetView = Tracked;

        fn create_device_and_swap_chain(
            &self,
            _window: WindowHandle,
            desc: &SwapChainDesc,
        ) -> Result<(Tracked, Tracked, Tracked), PlatformError> {
            *self.swap_chain_desc.borrow_mut() = Some(*desc);
            let device = self.step("device")?;
            let context = self.step("context")?;
            let swap_chain = self.step("swap chain")?;
            Ok((device, context, swap_chain))
        }

        fn back_buffer(&self, _swap_chain: &Tracked) -> Result<Tracked, PlatformError> {
            self.step("back buffer")
        }

        fn create_render_target_view(
            &self,
            _device: &Tracked,
            _back_buffer: &Tracked,
        ) -> Result<Tracked, PlatformError> {
            self.step("render target view")
        }

        fn bind_render_target(&self, _context: &Tracked, _view: &Tracked) {
            self.record("bind render target".into());
        }

        fn set_viewport(&self, _context: &Tracked, viewport: &Viewport) {
            *self.viewport.borrow_mut() = Some(*viewport);
            self.record("set viewport".into());
        }

        fn clear_render_target(&self, _context: &Tracked, _view: &Tracked, color: Color) {
            self.record(format!("clear {:?}", color.to_array()));
        }

        fn present(&self, _swap_chain: &Tracked, sync_interval: u32) -> Result<(), PlatformError> {
            self.record(format!("present {sync_interval}"));
            if self.fail_present {
                return Err(PlatformError::new("present", "DXGI_ERROR_DEVICE_REMOVED"));
            }
            Ok(())
        }

        fn leave_fullscreen(&self, _swap_chain: &Tracked) {
            self.record("leave fullscreen".into());
        }
    }

    struct RecordingPayload(Tracked);

    impl DrawPayload<FakeApi> for RecordingPayload {
        fn create(api: &FakeApi, _device: &Tracked) -> Result<Self, PlatformError> {
            api.step("payload").map(RecordingPayload)
        }

        fn draw(&self, api: &FakeApi, _context: &Tracked) {
            api.record("draw payload".into());
        }
    }

    fn init_with<P: DrawPayload<FakeApi>>(
        api: FakeApi,
        width: u32,
        height: u32,
    ) -> (Result<GraphicsDevice<FakeApi, P>>, CallLog) {
        let log = api.log.clone();
        let device = GraphicsDevice::init(api, WindowHandle(1), width, height, Color::WHITE);
        (device, log)
    }

    fn take(log: &CallLog) -> Vec<String> {
        std::mem::take(&mut *log.borrow_mut())
    }

    #[test]
    fn swap_chain_desc_for_window() {
        let desc = SwapChainDesc::for_window(800, 600);

        assert_eq!(desc.width, 800);
        assert_eq!(desc.height, 600);
        assert_eq!(desc.format, Format::Rgba8Unorm);
        assert_eq!(desc.buffer_count, 1);
        assert_eq!(desc.sample_count, 4);
        assert!(desc.windowed);
        assert!(desc.allow_mode_switch);
    }

    #[test]
    fn init_requests_the_window_sized_swap_chain() {
        let api = FakeApi::default();
        let log = api.log.clone();
        let device =
            GraphicsDevice::<FakeApi>::init(api, WindowHandle(1), 1024, 768, Color::WHITE)
                .unwrap();

        assert_eq!(
            *device.api.swap_chain_desc.borrow(),
            Some(SwapChainDesc::for_window(1024, 768))
        );
        assert_eq!(
            take(&log),
            vec![
                "create device",
                "create context",
                "create swap chain",
                "create back buffer",
                "create render target view",
                "release back buffer",
                "bind render target",
                "set viewport",
            ]
        );
    }

    #[test]
    fn viewport_covers_the_requested_size() {
        for (width, height) in [(800, 600), (1, 1), (1920, 1080), (3000, 17)] {
            let (device, _log) = init_with::<ClearOnly>(FakeApi::default(), width, height);
            let device = device.unwrap();

            let expected = Viewport {
                x: 0.0,
                y: 0.0,
                width: width as f32,
                height: height as f32,
                min_depth: 0.0,
                max_depth: 1.0,
            };
            assert_eq!(device.viewport(), expected);
            assert_eq!(*device.api.viewport.borrow(), Some(expected));
        }
    }

    #[test]
    fn shutdown_releases_in_order() {
        let (device, log) = init_with::<RecordingPayload>(FakeApi::default(), 800, 600);
        let device = device.unwrap();
        take(&log);

        device.shutdown();

        assert_eq!(
            take(&log),
            vec![
                "leave fullscreen",
                "release payload",
                "release render target view",
                "release swap chain",
                "release device",
                "release context",
            ]
        );
    }

    #[test]
    fn dropping_without_shutdown_releases_once() {
        let (device, log) = init_with::<ClearOnly>(FakeApi::default(), 800, 600);
        take(&log);

        drop(device);

        assert_eq!(
            take(&log),
            vec![
                "leave fullscreen",
                "release render target view",
                "release swap chain",
                "release device",
                "release context",
            ]
        );
    }

    #[test]
    fn failed_render_target_releases_what_was_created() {
        let (device, log) =
            init_with::<ClearOnly>(FakeApi::failing_at("render target view"), 800, 600);

        let error = device.err().unwrap();
        assert!(matches!(error, Error::DeviceInitFailed(_)));
        assert_eq!(error.cause().context(), "render target view");

        let calls = take(&log);
        for released in [
            "release back buffer",
            "release swap chain",
            "release device",
            "release context",
        ] {
            assert!(calls.iter().any(|c| c == released), "{released} missing");
        }
        assert!(!calls.iter().any(|c| c == "set viewport"));
    }

    #[test]
    fn every_init_step_failure_is_device_init_failed() {
        for step in [
            "device",
            "context",
            "swap chain",
            "back buffer",
            "render target view",
            "payload",
        ] {
            let (device, _log) = init_with::<RecordingPayload>(FakeApi::failing_at(step), 800, 600);

            match device {
                Err(Error::DeviceInitFailed(cause)) => assert_eq!(cause.context(), step),
                Err(other) => panic!("{step}: unexpected error {other:?}"),
                Ok(_) => panic!("{step}: init should have failed"),
            }
        }
    }

    #[test]
    fn frame_clears_draws_then_presents_immediately() {
        let api = FakeApi::default();
        let log = api.log.clone();
        let mut device = GraphicsDevice::<FakeApi, RecordingPayload>::init(
            api,
            WindowHandle(1),
            800,
            600,
            Color::rgb(0.0, 0.2, 0.4),
        )
        .unwrap();
        take(&log);

        device.render_frame();

        assert_eq!(
            take(&log),
            vec!["clear [0.0, 0.2, 0.4, 1.0]", "draw payload", "present 0"]
        );
    }

    #[test]
    fn clear_only_frame_is_white_by_default() {
        let (device, log) = init_with::<ClearOnly>(FakeApi::default(), 800, 600);
        let mut device = device.unwrap();
        take(&log);

        device.render_frame();

        assert_eq!(device.clear_color(), Color::WHITE);
        assert_eq!(take(&log), vec!["clear [1.0, 1.0, 1.0, 1.0]", "present 0"]);
    }

    #[test]
    fn present_failure_is_not_fatal() {
        let api = FakeApi {
            fail_present: true,
            ..Default::default()
        };
        let (device, log) = init_with::<ClearOnly>(api, 800, 600);
        let mut device = device.unwrap();
        take(&log);

        device.render_frame();
        device.render_frame();

        assert_eq!(take(&log).len(), 4);
    }

    #[test]
    fn vertex_layout_matches_the_input_elements() {
        assert_eq!(Vertex::STRIDE, 28);
        assert_eq!(Vertex::COLOR_OFFSET, 12);
        assert_eq!(std::mem::size_of_val(&TRIANGLE), 3 * 28);
    }
}
