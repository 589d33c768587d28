use thiserror::Error;
use vulkan::ash::vk;

/// Failures of the steady-state render loop. Construction-time failures are
/// plain `anyhow` errors and abort the process; these are per-frame
/// conditions a running loop has to tell apart.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The presentation engine rejected the surface (out of date, lost).
    /// Surface recreation is not implemented; callers skip the frame.
    #[error("presentation surface invalidated")]
    SurfaceInvalidated,

    /// Any other device-side failure. Fatal.
    #[error(transparent)]
    Device(anyhow::Error),
}

impl From<anyhow::Error> for RenderError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<vk::Result>() {
            Some(&vk::Result::ERROR_OUT_OF_DATE_KHR) | Some(&vk::Result::ERROR_SURFACE_LOST_KHR) => {
                Self::SurfaceInvalidated
            }
            _ => Self::Device(err),
        }
    }
}
