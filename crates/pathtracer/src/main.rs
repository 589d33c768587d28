use app::anyhow::Result;

mod scene;
mod tracer;
mod uniforms;

use tracer::PathTracer;

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;
const APP_NAME: &str = "Compute path tracer";

fn main() -> Result<()> {
    app::run::<PathTracer>(APP_NAME, WIDTH, HEIGHT)
}
