use std::rc::Rc;
use anyhow::{anyhow, Result};
use imgui_glow_renderer::glow;
use imgui_glow_renderer::glow::{HasContext, NativeBuffer, NativeProgram, NativeShader, NativeUniformLocation, NativeVertexArray};
use thiserror::Error;
use crate::consts::{
    COLOR_UNIFORM, QUAD_VERTEX_COUNT, QUAD_VERTICES, RESOLUTION_UNIFORM, TIME_UNIFORM,
    VERTEX_SHADER_SOURCE,
};
use crate::gui::ColorParams;

const GLSL_VERSION: &str = "#version 330 core";

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("failed to create {0}: {1}")]
    Create(&'static str, String),
    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: &'static str, log: String },
    #[error("shader program failed to link:\n{0}")]
    Link(String),
}

/// The time-driven green channel, `sin(t) / 2 + 0.5`.
pub fn green_channel(elapsed_secs: f64) -> f32 {
    (elapsed_secs.sin() / 2.0 + 0.5) as f32
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    pub color: [f32; 4],
    pub resolution: [f32; 2],
    pub time: f32,
}

impl FrameUniforms {
    /// Red and blue come from the sliders, green follows the clock.
    pub fn new(params: ColorParams, elapsed_secs: f64, resolution: [u32; 2]) -> Self {
        Self {
            color: [params.red, green_channel(elapsed_secs), params.blue, 1.0],
            resolution: [resolution[0] as f32, resolution[1] as f32],
            time: elapsed_secs as f32,
        }
    }
}

struct Uniforms {
    color: Option<NativeUniformLocation>,
    resolution: Option<NativeUniformLocation>,
    time: Option<NativeUniformLocation>,
}

struct LinkedProgram {
    program: NativeProgram,
    uniforms: Uniforms,
}

pub struct QuadRenderer {
    gl: Rc<glow::Context>,
    program: Option<LinkedProgram>,
    vertex_array: NativeVertexArray,
    vertex_buffer: NativeBuffer,
    released: bool,
}

impl QuadRenderer {
    /// Uploads the quad and builds the shader program. A program that fails to
    /// build is logged and leaves the renderer drawing nothing but the clear color.
    pub fn new(gl: &Rc<glow::Context>, fragment_source: &str) -> Result<Self> {
        let (vertex_array, vertex_buffer) = unsafe { upload_quad(gl)? };

        let program = match unsafe { compile_program(gl, VERTEX_SHADER_SOURCE, fragment_source) } {
            Ok(program) => {
                tracing::debug!(?program, "shader program linked");
                Some(LinkedProgram {
                    program,
                    uniforms: unsafe { Uniforms::locate(gl, program) },
                })
            }
            Err(e) => {
                tracing::error!("{e}");
                None
            }
        };

        Ok(
            Self {
                gl: gl.clone(),
                program,
                vertex_array,
                vertex_buffer,
                released: false,
            }
        )
    }

    pub fn program(&self) -> Option<NativeProgram> {
        self.program.as_ref().map(|p| p.program)
    }

    pub fn resize(&self, width: u32, height: u32) {
        unsafe { self.gl.viewport(0, 0, width as i32, height as i32); }
    }

    pub fn draw(&self, frame: &FrameUniforms) {
        let [r, g, b, a] = crate::consts::CLEAR_COLOR;

        unsafe {
            self.gl.clear_color(r, g, b, a);
            self.gl.clear(glow::COLOR_BUFFER_BIT);

            let Some(linked) = &self.program else { return };

            self.gl.use_program(Some(linked.program));

            let [r, g, b, a] = frame.color;
            self.gl.uniform_4_f32(linked.uniforms.color.as_ref(), r, g, b, a);
            self.gl.uniform_2_f32(linked.uniforms.resolution.as_ref(), frame.resolution[0], frame.resolution[1]);
            self.gl.uniform_1_f32(linked.uniforms.time.as_ref(), frame.time);

            self.gl.bind_vertex_array(Some(self.vertex_array));
            self.gl.draw_arrays(glow::TRIANGLES, 0, QUAD_VERTEX_COUNT);

            // leave the pipeline clean for the GUI renderer
            self.gl.bind_vertex_array(None);
            self.gl.use_program(None);
        }
    }

    pub fn shutdown(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        unsafe {
            if let Some(linked) = self.program.take() {
                self.gl.delete_program(linked.program);
            }
            self.gl.delete_buffer(self.vertex_buffer);
            self.gl.delete_vertex_array(self.vertex_array);
        }
    }
}

impl Drop for QuadRenderer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Uniforms {
    unsafe fn locate(gl: &glow::Context, program: NativeProgram) -> Self {
        // absent uniforms stay None and their updates are no-ops
        unsafe {
            Self {
                color: gl.get_uniform_location(program, COLOR_UNIFORM),
                resolution: gl.get_uniform_location(program, RESOLUTION_UNIFORM),
                time: gl.get_uniform_location(program, TIME_UNIFORM),
            }
        }
    }
}

unsafe fn upload_quad(gl: &glow::Context) -> Result<(NativeVertexArray, NativeBuffer)> {
    unsafe {
        let vertex_array = gl
            .create_vertex_array()
            .map_err(|e| anyhow!("Failed to create vertex array: {e}"))?;

        let vertex_buffer = gl
            .create_buffer()
            .map_err(|e| anyhow!("Failed to create vertex buffer: {e}"))?;

        gl.bind_vertex_array(Some(vertex_array));
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(vertex_buffer));
        gl.buffer_data_u8_slice(
            glow::ARRAY_BUFFER,
            bytemuck::cast_slice(&QUAD_VERTICES),
            glow::STATIC_DRAW,
        );

        let stride = 3 * size_of::<f32>() as i32;
        gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, stride, 0);
        gl.enable_vertex_attrib_array(0);

        gl.bind_vertex_array(None);
        gl.bind_buffer(glow::ARRAY_BUFFER, None);

        Ok((vertex_array, vertex_buffer))
    }
}

unsafe fn compile_program(
    gl: &glow::Context,
    vertex_source: &str,
    fragment_source: &str,
) -> Result<NativeProgram, ShaderError> {
    unsafe {
        let program = gl
            .create_program()
            .map_err(|e| ShaderError::Create("program", e))?;

        let stages = [
            (glow::VERTEX_SHADER, "vertex", vertex_source),
            (glow::FRAGMENT_SHADER, "fragment", fragment_source),
        ];

        let mut shaders: Vec<NativeShader> = Vec::with_capacity(stages.len());
        let mut result = Ok(());

        for (kind, stage, source) in stages {
            match compile_shader(gl, kind, stage, source) {
                Ok(shader) => {
                    gl.attach_shader(program, shader);
                    shaders.push(shader);
                }
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }

        if result.is_ok() {
            gl.link_program(program);
            if !gl.get_program_link_status(program) {
                result = Err(ShaderError::Link(gl.get_program_info_log(program)));
            }
        }

        // cleanup shaders
        for shader in shaders {
            gl.detach_shader(program, shader);
            gl.delete_shader(shader);
        }

        match result {
            Ok(()) => Ok(program),
            Err(e) => {
                gl.delete_program(program);
                Err(e)
            }
        }
    }
}

unsafe fn compile_shader(
    gl: &glow::Context,
    kind: u32,
    stage: &'static str,
    source: &str,
) -> Result<NativeShader, ShaderError> {
    unsafe {
        let shader = gl
            .create_shader(kind)
            .map_err(|e| ShaderError::Create("shader", e))?;

        gl.shader_source(shader, &format!("{GLSL_VERSION}\n{source}"));
        gl.compile_shader(shader);

        if !gl.get_shader_compile_status(shader) {
            let log = gl.get_shader_info_log(shader);
            gl.delete_shader(shader);
            return Err(ShaderError::Compile { stage, log });
        }

        Ok(shader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn green_channel_follows_half_sine() {
        assert!((green_channel(0.0) - 0.5).abs() < 1e-6);
        assert!((green_channel(FRAC_PI_2) - 1.0).abs() < 1e-6);
        assert!((green_channel(PI + FRAC_PI_2) - 0.0).abs() < 1e-6);

        for t in [0.25, 1.0, 7.5, 123.456] {
            let expected = (f64::sin(t) / 2.0 + 0.5) as f32;
            assert_eq!(green_channel(t), expected);
        }
    }

    #[test]
    fn green_channel_stays_in_unit_range() {
        for i in 0..10_000 {
            let g = green_channel(i as f64 * 0.01);
            assert!((0.0..=1.0).contains(&g), "{g} out of range");
        }
    }

    #[test]
    fn frame_uniforms_mix_sliders_and_clock() {
        let params = ColorParams { red: 0.25, green: 0.9, blue: 0.75 };
        let frame = FrameUniforms::new(params, FRAC_PI_2, [1024, 768]);

        assert_eq!(frame.color[0], 0.25);
        assert!((frame.color[1] - 1.0).abs() < 1e-6, "green ignores the slider");
        assert_eq!(frame.color[2], 0.75);
        assert_eq!(frame.color[3], 1.0);
        assert_eq!(frame.resolution, [1024.0, 768.0]);
        assert!((frame.time - FRAC_PI_2 as f32).abs() < 1e-6);
    }

    /// Needs an EGL device with a 3.3 core driver: `cargo test -- --ignored`.
    #[cfg(target_os = "linux")]
    #[test]
    #[ignore]
    fn embedded_shaders_link_on_headless_core_context() {
        use glutin::api::egl::{device::Device, display::Display};
        use glutin::config::{ConfigSurfaceTypes, ConfigTemplateBuilder};
        use glutin::context::{ContextApi, ContextAttributesBuilder, GlProfile, Version};
        use glutin::display::GlDisplay;
        use crate::config::ShaderVariant;

        let device = Device::query_devices()
            .expect("EGL device enumeration")
            .next()
            .expect("an EGL device");
        let display = unsafe { Display::with_device(&device, None) }.expect("EGL display");

        let template = ConfigTemplateBuilder::new()
            .with_surface_type(ConfigSurfaceTypes::empty())
            .build();
        let config = unsafe { display.find_configs(template) }
            .expect("EGL configs")
            .next()
            .expect("a GL config");

        let attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .with_profile(GlProfile::Core)
            .build(None);
        let _context = unsafe { display.create_context(&config, &attributes) }
            .expect("3.3 core context")
            .make_current_surfaceless()
            .expect("surfaceless current context");

        let gl = Rc::new(unsafe {
            glow::Context::from_loader_function_cstr(|name| display.get_proc_address(name).cast())
        });

        for variant in [ShaderVariant::Gradient, ShaderVariant::Plasma] {
            let mut renderer = QuadRenderer::new(&gl, variant.fragment_source()).expect("quad upload");
            assert!(renderer.program().is_some(), "{} failed to link", variant.name());
            renderer.shutdown();
        }
    }

    #[test]
    fn shader_errors_carry_driver_log() {
        let e = ShaderError::Compile { stage: "fragment", log: "0:3: syntax error".into() };
        assert_eq!(e.to_string(), "fragment shader failed to compile:\n0:3: syntax error");
        assert!(ShaderError::Link("mismatch".into()).to_string().ends_with("mismatch"));
    }
}
