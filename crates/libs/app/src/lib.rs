pub use anyhow;
pub use nalgebra as na;
pub use vulkan;

pub mod camera;
pub mod controls;
pub mod error;
pub mod presentation;
pub mod types;

use anyhow::Result;
use camera::Camera;
use controls::Controls;
use error::RenderError;
use presentation::Presentation;
use vulkan::{Context, ContextBuilder, DeviceFeatures};
use winit::{
    dpi::PhysicalSize,
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::{Window, WindowBuilder},
};

pub struct BaseApp {
    pub presentation: Presentation,
    pub camera: Camera,
    pub context: Context,
}

pub trait App: Sized {
    fn new(base: &BaseApp) -> Result<Self>;

    /// One render step. `camera_changed` reports whether this step's camera
    /// update produced a new view-projection.
    fn dispatch(&mut self, base: &mut BaseApp, camera_changed: bool) -> Result<(), RenderError>;
}

pub fn run<A: App + 'static>(app_name: &str, width: u32, height: u32) -> Result<()> {
    pretty_env_logger::init();
    let (window, event_loop) = create_window(app_name, width, height);
    let mut base_app = BaseApp::new(&window, app_name)?;

    // start both images of the pair from known black content
    base_app.presentation.clear(&base_app.context)?;

    let mut app = A::new(&base_app)?;
    let mut controls = Controls::default();

    log::info!("Entering render loop");

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        let app = &mut app; // Make sure it is dropped before base_app

        controls = controls.handle_event(&event);

        match event {
            // Draw
            Event::MainEventsCleared => {
                let camera_changed = base_app.camera.update(&controls);

                match app.dispatch(&mut base_app, camera_changed) {
                    Ok(()) => {}
                    Err(RenderError::SurfaceInvalidated) => {
                        // no recreation path; skip the frame
                        log::warn!("Presentation surface invalidated, skipping frame");
                    }
                    Err(err) => panic!("Failed to render frame. Cause: {err}"),
                }
            }
            // Exit app on request to close window
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => *control_flow = ControlFlow::Exit,
            // Wait for gpu to finish pending work before closing app
            Event::LoopDestroyed => base_app
                .wait_for_gpu()
                .expect("Failed to wait for gpu to finish work"),
            _ => (),
        }
    });
}

fn create_window(app_name: &str, width: u32, height: u32) -> (Window, EventLoop<()>) {
    log::debug!("Creating window and event loop");
    let events_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title(app_name)
        .with_inner_size(PhysicalSize::new(width, height))
        .with_resizable(false)
        .build(&events_loop)
        .unwrap();

    (window, events_loop)
}

impl BaseApp {
    fn new(window: &Window, app_name: &str) -> Result<Self> {
        log::info!("Create application: {}", app_name);

        let context = ContextBuilder::new(window)
            .vulkan_version(vulkan::VERSION_1_3)
            .app_name(app_name)
            .required_extensions(&["VK_KHR_swapchain"])
            .required_device_features(DeviceFeatures {
                synchronization2: true,
            })
            .build()?;

        let size = window.inner_size();
        let presentation = Presentation::new(&context, size.width, size.height)?;

        let camera = Camera::new(size.width as f32, size.height as f32);

        Ok(Self {
            presentation,
            camera,
            context,
        })
    }

    pub fn wait_for_gpu(&self) -> Result<()> {
        self.context.device_wait_idle()
    }
}
