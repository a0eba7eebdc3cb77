use windows::{
    core::{s, PCSTR},
    Win32::Graphics::{
        Direct3D::{
            Fxc::{D3DCompile, D3DCOMPILE_DEBUG, D3DCOMPILE_SKIP_OPTIMIZATION},
            ID3DBlob, D3D11_PRIMITIVE_TOPOLOGY_TRIANGLELIST,
        },
        Direct3D11::{
            ID3D11Buffer, ID3D11Device, ID3D11DeviceContext, ID3D11InputLayout,
            ID3D11PixelShader, ID3D11VertexShader, D3D11_BIND_VERTEX_BUFFER, D3D11_BUFFER_DESC,
            D3D11_INPUT_ELEMENT_DESC, D3D11_INPUT_PER_VERTEX_DATA, D3D11_SUBRESOURCE_DATA,
            D3D11_USAGE_DEFAULT,
        },
        Dxgi::Common::{DXGI_FORMAT_R32G32B32A32_FLOAT, DXGI_FORMAT_R32G32B32_FLOAT},
    },
};

use super::{Direct3D11, DrawPayload, Vertex, TRIANGLE};
use crate::error::PlatformError;

const SHADERS: &str = include_str!("shaders.hlsl");

/// One colored triangle drawn over the clear color.
pub struct Triangle {
    input_layout: ID3D11InputLayout,
    vertex_shader: ID3D11VertexShader,
    pixel_shader: ID3D11PixelShader,
    vertex_buffer: ID3D11Buffer,
}

fn blob_bytes(blob: &ID3DBlob) -> &[u8] {
    unsafe { std::slice::from_raw_parts(blob.GetBufferPointer() as *const u8, blob.GetBufferSize()) }
}

fn compile_shader(entry_point: PCSTR, target: PCSTR) -> Result<ID3DBlob, PlatformError> {
    let flags = if cfg!(debug_assertions) {
        D3DCOMPILE_DEBUG | D3DCOMPILE_SKIP_OPTIMIZATION
    } else {
        0
    };

    let mut code = None;
    let mut errors = None;
    let result = unsafe {
        D3DCompile(
            SHADERS.as_ptr() as _,
            SHADERS.len(),
            s!("shaders.hlsl"),
            None,
            None,
            entry_point,
            target,
            flags,
            0,
            &mut code,
            Some(&mut errors),
        )
    };

    if let Err(e) = result {
        let message = match errors {
            Some(errors) => String::from_utf8_lossy(blob_bytes(&errors)).into_owned(),
            None => e.to_string(),
        };
        return Err(PlatformError::new("compile shader", message));
    }

    code.ok_or_else(|| PlatformError::new("compile shader", "no bytecode returned"))
}

impl DrawPayload<Direct3D11> for Triangle {
    fn create(_api: &Direct3D11, device: &ID3D11Device) -> Result<Self, PlatformError> {
        let vs_blob = compile_shader(s!("VShader"), s!("vs_4_0"))?;
        let ps_blob = compile_shader(s!("PShader"), s!("ps_4_0"))?;
        let vs_bytecode = blob_bytes(&vs_blob);

        let mut vertex_shader = None;
        unsafe { device.CreateVertexShader(vs_bytecode, None, Some(&mut vertex_shader)) }
            .map_err(|e| PlatformError::new("create vertex shader", e))?;

        let mut pixel_shader = None;
        unsafe { device.CreatePixelShader(blob_bytes(&ps_blob), None, Some(&mut pixel_shader)) }
            .map_err(|e| PlatformError::new("create pixel shader", e))?;

        let input_elements = [
            D3D11_INPUT_ELEMENT_DESC {
                SemanticName: s!("POSITION"),
                SemanticIndex: 0,
                Format: DXGI_FORMAT_R32G32B32_FLOAT,
                InputSlot: 0,
                AlignedByteOffset: 0,
                InputSlotClass: D3D11_INPUT_PER_VERTEX_DATA,
                InstanceDataStepRate: 0,
            },
            D3D11_INPUT_ELEMENT_DESC {
                SemanticName: s!("COLOR"),
                SemanticIndex: 0,
                Format: DXGI_FORMAT_R32G32B32A32_FLOAT,
                InputSlot: 0,
                AlignedByteOffset: Vertex::COLOR_OFFSET,
                InputSlotClass: D3D11_INPUT_PER_VERTEX_DATA,
                InstanceDataStepRate: 0,
            },
        ];

        let mut input_layout = None;
        unsafe { device.CreateInputLayout(&input_elements, vs_bytecode, Some(&mut input_layout)) }
            .map_err(|e| PlatformError::new("create input layout", e))?;

        let vertices = TRIANGLE;
        let buffer_desc = D3D11_BUFFER_DESC {
            ByteWidth: std::mem::size_of_val(&vertices) as u32,
            Usage: D3D11_USAGE_DEFAULT,
            BindFlags: D3D11_BIND_VERTEX_BUFFER.0 as u32,
            ..Default::default()
        };
        let initial_data = D3D11_SUBRESOURCE_DATA {
            pSysMem: vertices.as_ptr() as _,
            ..Default::default()
        };

        let mut vertex_buffer = None;
        unsafe { device.CreateBuffer(&buffer_desc, Some(&initial_data), Some(&mut vertex_buffer)) }
            .map_err(|e| PlatformError::new("create vertex buffer", e))?;

        match (input_layout, vertex_shader, pixel_shader, vertex_buffer) {
            (Some(input_layout), Some(vertex_shader), Some(pixel_shader), Some(vertex_buffer)) => {
                Ok(Self {
                    input_layout,
                    vertex_shader,
                    pixel_shader,
                    vertex_buffer,
                })
            }
            _ => Err(PlatformError::new(
                "create triangle resources",
                "the runtime returned no object",
            )),
        }
    }

    fn draw(&self, _api: &Direct3D11, context: &ID3D11DeviceContext) {
        let stride = Vertex::STRIDE;
        let offset = 0;

        unsafe {
            context.IASetInputLayout(&self.input_layout);
            context.VSSetShader(&self.vertex_shader, None);
            context.PSSetShader(&self.pixel_shader, None);
            context.IASetVertexBuffers(
                0,
                1,
                Some(&Some(self.vertex_buffer.clone())),
                Some(&stride),
                Some(&offset),
            );
            context.IASetPrimitiveTopology(D3D11_PRIMITIVE_TOPOLOGY_TRIANGLELIST);
            context.Draw(TRIANGLE.len() as u32, 0);
        }
    }
}
