use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    raw_window_handle::HasWindowHandle,
    window::{Window, WindowAttributes, WindowId}
};
use glutin::{
    config::{Config, ConfigTemplateBuilder},
    context::{ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentGlContext, PossiblyCurrentContext as OpenGlContext, Version},
    display::{GetGlDisplay, GlDisplay},
    surface::{GlSurface, Surface, SurfaceAttributesBuilder, SwapInterval, WindowSurface}
};
use imgui_winit_support::{HiDpiMode, WinitPlatform};
use std::{
    num::NonZeroU32,
    sync::mpsc::channel,
    sync::mpsc::Sender,
    time::Instant
};
use imgui_glow_renderer::{
    glow,
    glow::HasContext,
    AutoRenderer
};
use imgui::{Context as ImGuiContext, FontConfig, FontSource};
use anyhow::{anyhow, bail, Context, Error, Result};
use crate::config::ShaderVariant;
use crate::consts::{WINDOW_SIZE, WINDOW_TITLE};
use crate::gui::{ColorControls, ColorParams};
use crate::renderer::{FrameUniforms, QuadRenderer};

const FONT_SIZE: f32 = 15.0;
const GL_VERSION: (u8, u8) = (3, 3);

#[allow(unused)] // contexts are all important, even if not currently used
struct DemoContexts {
    pub imgui: ImGuiContext,
    pub winit: WinitPlatform,
    pub window: Window,
    pub opengl: OpenGlContext,
    pub glow: AutoRenderer,
    pub surface: Surface<WindowSurface>,
}

// field order matters: the renderer releases GL objects before the contexts go
struct DemoApplication {
    renderer: QuadRenderer,
    controls: ColorControls,
    contexts: DemoContexts,
    started: Instant,
    last_frame: Option<Instant>,
    resolution: PhysicalSize<u32>,
}

struct DemoApplicationHandler {
    application: Option<DemoApplication>,
    variant: ShaderVariant,
    error_tx: Sender<Error>,
}

impl DemoApplicationHandler {
    pub fn new(variant: ShaderVariant, error_tx: Sender<Error>) -> Self {
        Self {
            application: None,
            variant,
            error_tx,
        }
    }
}

impl DemoApplication {
    pub fn new(event_loop: &ActiveEventLoop, variant: ShaderVariant) -> Result<Self> {
        let (window, config) = init_glutin(event_loop)?;
        let (opengl, surface) = init_opengl(&window, &config)?;
        let (mut imgui, winit) = init_imgui(&window);
        let glow = AutoRenderer::new(load_gl(&opengl), &mut imgui)
            .context("Failed to upload ImGui font atlas")?;

        surface.set_swap_interval(
            &opengl,
            SwapInterval::Wait(
                NonZeroU32::new(1)
                    .context("Swap interval was zero or out-of-bounds")?
            )
        ).context("Failed to set swap interval")?;

        let resolution = window.inner_size();

        unsafe {
            let gl = glow.gl_context();
            tracing::info!(
                version = %gl.get_parameter_string(glow::VERSION),
                renderer = %gl.get_parameter_string(glow::RENDERER),
                shader = variant.name(),
                "OpenGL context ready"
            );
        }

        let renderer = QuadRenderer::new(glow.gl_context(), variant.fragment_source())
            .context("Failed to create quad renderer")?;
        renderer.resize(resolution.width, resolution.height);

        if renderer.program().is_none() {
            tracing::warn!("no usable shader program, only the clear color and GUI will be drawn");
        }

        let contexts = DemoContexts {
            glow,
            imgui,
            opengl,
            winit,
            window,
            surface,
        };

        Ok(
            Self {
                renderer,
                controls: ColorControls::new(ColorParams::default()),
                contexts,
                started: Instant::now(),
                last_frame: None,
                resolution,
            }
        )
    }

    /// Feeds one window event to the imgui platform layer.
    fn forward_to_imgui(&mut self, event: WindowEvent) {
        let DemoContexts { imgui, winit, window, .. } = &mut self.contexts;
        let window_id = window.id();

        winit.handle_event(imgui.io_mut(), window, &Event::<()>::WindowEvent { window_id, event });
    }

    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        let (Some(width), Some(height)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) else {
            // minimized
            return;
        };

        self.contexts.surface.resize(&self.contexts.opengl, width, height);
        self.renderer.resize(size.width, size.height);
        self.resolution = size;

        tracing::debug!(width = size.width, height = size.height, "framebuffer resized");
    }

    pub fn shutdown(&mut self) -> Result<()> {
        self.renderer.shutdown();
        tracing::info!(elapsed = ?self.started.elapsed(), "shut down");

        Ok(())
    }

    pub fn render(&mut self) -> Result<()> {
        let now = Instant::now();
        self.contexts.imgui.io_mut().update_delta_time(now - self.last_frame.unwrap_or(now));
        self.last_frame = Some(now);

        self.contexts.winit
            .prepare_frame(self.contexts.imgui.io_mut(), &self.contexts.window)
            .context("Failed to prepare ImGui frame")?;

        let frame = FrameUniforms::new(
            self.controls.params(),
            self.started.elapsed().as_secs_f64(),
            [self.resolution.width, self.resolution.height],
        );
        self.renderer.draw(&frame);

        let ui = self.contexts.imgui.new_frame();
        self.controls.build(ui);
        self.contexts.winit.prepare_render(ui, &self.contexts.window);

        self.contexts.glow
            .render(self.contexts.imgui.render())
            .map_err(|_| anyhow!("Failed to render ImGui renderer data"))?;

        self.contexts.surface
            .swap_buffers(&self.contexts.opengl)
            .context("Failed to swap surface buffers")?;

        Ok(())
    }
}

fn is_escape(event: &KeyEvent) -> bool {
    event.state == ElementState::Pressed && event.logical_key == Key::Named(NamedKey::Escape)
}

impl ApplicationHandler for DemoApplicationHandler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.application.is_none() {
            match DemoApplication::new(event_loop, self.variant) {
                Ok(app) => self.application = Some(app),
                Err(e) => {
                    // the receiver outlives the event loop
                    let _ = self.error_tx.send(e);
                    event_loop.exit();
                }
            }
        }
    }

    fn about_to_wait(&mut self, _: &ActiveEventLoop) {
        // vsync in swap_buffers paces the loop
        if let Some(app) = &self.application {
            app.contexts.window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _: WindowId, event: WindowEvent) {
        let mut perform = || -> Result<()> {
            if let Some(app) = self.application.as_mut() {
                app.forward_to_imgui(event.clone());

                match &event {
                    WindowEvent::KeyboardInput { event: key, .. } if is_escape(key) => {
                        tracing::debug!("escape pressed");
                        app.shutdown().context("Failed to shutdown demo application")?;
                        event_loop.exit();
                        return Ok(());
                    },

                    WindowEvent::CloseRequested => {
                        app.shutdown().context("Failed to shutdown demo application")?;
                        event_loop.exit();
                        return Ok(());
                    },

                    WindowEvent::Resized(size) => app.resize(*size),

                    WindowEvent::RedrawRequested => {
                        app.render().context("Failed to draw frame")?;
                    }

                    _ => { }
                }
            }

            Ok(())
        };

        if let Err(e) = perform() {
            let _ = self.error_tx.send(e);
            event_loop.exit();
        }
    }
}

fn init_imgui(window: &Window) -> (ImGuiContext, WinitPlatform) {
    let mut imgui = ImGuiContext::create();
    // slider values are not persisted between runs
    imgui.set_ini_filename(None);

    let mut platform = WinitPlatform::new(&mut imgui);
    platform.attach_window(imgui.io_mut(), window, HiDpiMode::Default);

    // rasterize at device resolution, lay out at logical size
    let scale = platform.hidpi_factor() as f32;
    imgui.io_mut().font_global_scale = scale.recip();
    imgui.fonts().add_font(&[FontSource::DefaultFontData {
        config: Some(FontConfig { size_pixels: FONT_SIZE * scale, ..FontConfig::default() }),
    }]);

    (imgui, platform)
}

fn init_glutin(event_loop: &ActiveEventLoop) -> Result<(Window, Config)> {
    let (window, config) = glutin_winit::DisplayBuilder::new()
        .with_window_attributes(Some(
            WindowAttributes::default()
                .with_title(WINDOW_TITLE)
                .with_inner_size(PhysicalSize::new(WINDOW_SIZE[0], WINDOW_SIZE[1]))
                .with_resizable(false)
        )
        ).build(
        event_loop,
        ConfigTemplateBuilder::new(),
        |mut cfg| {
            // glutin reports an empty config list as a build error
            cfg.next().expect("at least one GL config")
        }
    ).map_err(|e| anyhow!("Failed to initialize glutin: {e}"))?;

    Ok(
        (window.context("Failed to create window")?, config)
    )
}

fn init_opengl(window: &Window, config: &Config) -> Result<(OpenGlContext, Surface<WindowSurface>)> {
    let raw_handle = window
        .window_handle()
        .context("Failed to get window handle")?
        .as_raw();

    // glutin does not provide a
    // safe alternative to creating
    // display contexts with winit
    let context = unsafe {
        config.display().create_context(
            config,
            &ContextAttributesBuilder::new()
                .with_context_api(ContextApi::OpenGl(Some(Version::new(GL_VERSION.0, GL_VERSION.1))))
                .with_profile(GlProfile::Core)
                .build(Some(raw_handle))
        ).context("Failed to create OpenGL 3.3 core context")?
    };

    let size = window.inner_size();
    if size.width != WINDOW_SIZE[0] || size.height != WINDOW_SIZE[1] {
        tracing::warn!(width = size.width, height = size.height, "window manager changed the requested size");
    }

    // glutin does not provide a safe
    // alternative to creating window
    // surfaces with winit
    let surface = unsafe {
        config
            .display()
            .create_window_surface(
                config,
                &SurfaceAttributesBuilder::<WindowSurface>::new()
                    .build(
                        raw_handle,
                        NonZeroU32::new(size.width).context("Window surface width was zero or out-of-bounds")?,
                        NonZeroU32::new(size.height).context("Window surface height was zero or out-of-bounds")?,
                    )
            )
            .context("Failed to create window surface")?
    };

    Ok((
        context.make_current(&surface)
            .context("Failed to make OpenGL context current")?,

        surface
    ))
}

fn load_gl(opengl: &OpenGlContext) -> glow::Context {
    let display = opengl.display();

    // entry points come back as raw pointers from the platform loader
    unsafe { glow::Context::from_loader_function_cstr(|name| display.get_proc_address(name).cast()) }
}

pub fn run() -> Result<()> {
    let variant = ShaderVariant::from_env();
    let event_loop = EventLoop::new().context("Failed to create event loop")?;

    // winit advises using Poll for vertically synced apps
    event_loop.set_control_flow(ControlFlow::Poll);

    let (tx, rx) = channel::<Error>();

    event_loop.run_app(
        &mut DemoApplicationHandler::new(variant, tx)
    ).context("Failed to run app loop")?;

    if let Ok(error) = rx.try_recv() {
        bail!(error)
    }

    Ok(())
}
