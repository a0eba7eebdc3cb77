use log::{debug, warn};
use windows::Win32::{
    Foundation::HWND,
    Graphics::{
        Direct3D::{D3D_DRIVER_TYPE, D3D_DRIVER_TYPE_HARDWARE, D3D_DRIVER_TYPE_WARP},
        Direct3D11::{
            D3D11CreateDeviceAndSwapChain, ID3D11Device, ID3D11DeviceContext,
            ID3D11RenderTargetView, ID3D11Texture2D, D3D11_CREATE_DEVICE_DEBUG,
            D3D11_CREATE_DEVICE_FLAG, D3D11_SDK_VERSION, D3D11_VIEWPORT,
        },
        Dxgi::{
            Common::{DXGI_FORMAT, DXGI_FORMAT_R8G8B8A8_UNORM, DXGI_MODE_DESC, DXGI_SAMPLE_DESC},
            DXGIGetDebugInterface1, IDXGIDebug1, IDXGISwapChain, DXGI_DEBUG_ALL,
            DXGI_DEBUG_RLO_DETAIL, DXGI_DEBUG_RLO_IGNORE_INTERNAL, DXGI_PRESENT,
            DXGI_SWAP_CHAIN_DESC, DXGI_SWAP_CHAIN_FLAG_ALLOW_MODE_SWITCH, DXGI_SWAP_EFFECT_DISCARD,
            DXGI_USAGE_RENDER_TARGET_OUTPUT,
        },
    },
};

use super::{Color, DriverType, Format, GraphicsApi, SwapChainDesc, Viewport};
use crate::{error::PlatformError, os::WindowHandle};

type DeviceObjects = (ID3D11Device, ID3D11DeviceContext, IDXGISwapChain);

#[derive(Clone, Copy, Debug, Default)]
pub struct Direct3D11 {
    driver_type: DriverType,
}

impl Direct3D11 {
    pub fn new(driver_type: DriverType) -> Self {
        Self { driver_type }
    }

    fn create_with_flags(
        &self,
        desc: &DXGI_SWAP_CHAIN_DESC,
        flags: D3D11_CREATE_DEVICE_FLAG,
    ) -> Result<DeviceObjects, PlatformError> {
        let mut swap_chain = None;
        let mut device = None;
        let mut context = None;

        unsafe {
            D3D11CreateDeviceAndSwapChain(
                None, // Let DXGI pick the adapter.
                driver_type(self.driver_type),
                None,
                flags,
                None,
                D3D11_SDK_VERSION,
                Some(desc),
                Some(&mut swap_chain),
                Some(&mut device),
                None,
                Some(&mut context),
            )
        }
        .map_err(|e| PlatformError::new("create device and swap chain", e))?;

        match (device, context, swap_chain) {
            (Some(device), Some(context), Some(swap_chain)) => Ok((device, context, swap_chain)),
            _ => Err(PlatformError::new(
                "create device and swap chain",
                "the runtime returned no objects",
            )),
        }
    }
}

fn driver_type(driver_type: DriverType) -> D3D_DRIVER_TYPE {
    match driver_type {
        DriverType::Hardware => D3D_DRIVER_TYPE_HARDWARE,
        DriverType::Warp => D3D_DRIVER_TYPE_WARP,
    }
}

fn dxgi_format(format: Format) -> DXGI_FORMAT {
    match format {
        Format::Rgba8Unorm => DXGI_FORMAT_R8G8B8A8_UNORM,
    }
}

impl GraphicsApi for Direct3D11 {
    type Device = ID3D11Device;
    type Context = ID3D11DeviceContext;
    type SwapChain = IDXGISwapChain;
    type BackBuffer = ID3D11Texture2D;
    type RenderTargetView = ID3D11RenderTargetView;

    fn create_device_and_swap_chain(
        &self,
        window: WindowHandle,
        desc: &SwapChainDesc,
    ) -> Result<DeviceObjects, PlatformError> {
        let swap_chain_desc = DXGI_SWAP_CHAIN_DESC {
            BufferDesc: DXGI_MODE_DESC {
                Width: desc.width,
                Height: desc.height,
                Format: dxgi_format(desc.format),
                ..Default::default()
            },
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: desc.sample_count,
                Quality: 0,
            },
            BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
            BufferCount: desc.buffer_count,
            OutputWindow: HWND::from(window),
            Windowed: desc.windowed.into(),
            SwapEffect: DXGI_SWAP_EFFECT_DISCARD,
            Flags: if desc.allow_mode_switch {
                DXGI_SWAP_CHAIN_FLAG_ALLOW_MODE_SWITCH.0 as u32
            } else {
                0
            },
        };

        if cfg!(debug_assertions) {
            match self.create_with_flags(&swap_chain_desc, D3D11_CREATE_DEVICE_DEBUG) {
                Ok(objects) => {
                    debug!("created {:?} device with the debug layer", self.driver_type);
                    return Ok(objects);
                }
                // The SDK layers are not installed everywhere.
                Err(e) => warn!("debug layer unavailable, retrying without it: {e}"),
            }
        }

        let objects = self.create_with_flags(&swap_chain_desc, D3D11_CREATE_DEVICE_FLAG(0))?;
        debug!("created {:?} device", self.driver_type);
        Ok(objects)
    }

    fn back_buffer(&self, swap_chain: &IDXGISwapChain) -> Result<ID3D11Texture2D, PlatformError> {
        unsafe { swap_chain.GetBuffer::<ID3D11Texture2D>(0) }
            .map_err(|e| PlatformError::new("get back buffer", e))
    }

    fn create_render_target_view(
        &self,
        device: &ID3D11Device,
        back_buffer: &ID3D11Texture2D,
    ) -> Result<ID3D11RenderTargetView, PlatformError> {
        let mut view = None;
        unsafe { device.CreateRenderTargetView(back_buffer, None, Some(&mut view)) }
            .map_err(|e| PlatformError::new("create render target view", e))?;
        view.ok_or_else(|| PlatformError::new("create render target view", "no view returned"))
    }

    fn bind_render_target(&self, context: &ID3D11DeviceContext, view: &ID3D11RenderTargetView) {
        unsafe { context.OMSetRenderTargets(Some(&[Some(view.clone())]), None) };
    }

    fn set_viewport(&self, context: &ID3D11DeviceContext, viewport: &Viewport) {
        let viewport = D3D11_VIEWPORT {
            TopLeftX: viewport.x,
            TopLeftY: viewport.y,
            Width: viewport.width,
            Height: viewport.height,
            MinDepth: viewport.min_depth,
            MaxDepth: viewport.max_depth,
        };
        unsafe { context.RSSetViewports(Some(&[viewport])) };
    }

    fn clear_render_target(
        &self,
        context: &ID3D11DeviceContext,
        view: &ID3D11RenderTargetView,
        color: Color,
    ) {
        unsafe { context.ClearRenderTargetView(view, &color.to_array()) };
    }

    fn present(&self, swap_chain: &IDXGISwapChain, sync_interval: u32) -> Result<(), PlatformError> {
        unsafe { swap_chain.Present(sync_interval, DXGI_PRESENT(0)) }
            .ok()
            .map_err(|e| PlatformError::new("present", e))
    }

    fn leave_fullscreen(&self, swap_chain: &IDXGISwapChain) {
        // A swap chain must not be released while it owns the display.
        if let Err(e) = unsafe { swap_chain.SetFullscreenState(false, None) } {
            warn!("failed to leave fullscreen {e}");
        }
    }
}

/// Dumps the DXGI objects still alive to the debugger output. Debug builds only.
pub fn report_live_objects() {
    unsafe {
        if cfg!(debug_assertions) {
            if let Ok(dxgi_debug) = DXGIGetDebugInterface1::<IDXGIDebug1>(0) {
                let _ = dxgi_debug.ReportLiveObjects(
                    DXGI_DEBUG_ALL,
                    DXGI_DEBUG_RLO_DETAIL | DXGI_DEBUG_RLO_IGNORE_INTERNAL,
                );
            }
        }
    }
}
