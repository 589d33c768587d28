use anyhow::{ensure, Result};
use vulkan::ash::vk;
use vulkan::{Context, ImageBarrier, ImageView, Sampler, Semaphore, Swapchain};

use crate::error::RenderError;

/// References needed to bind a presentable image into a descriptor set.
pub struct ImageDescriptor<'a> {
    pub view: &'a ImageView,
    pub sampler: &'a Sampler,
    pub layout: vk::ImageLayout,
}

/// The image the accumulation pass samples while `index` is being written.
/// With a double-buffered chain the pair alternates, so this is the image
/// presented by the previous dispatch.
pub const fn paired_image(index: usize, count: usize) -> usize {
    (index + 1) % count
}

/// Owns the presentable image pair and the semaphores sequencing
/// acquire -> render -> present.
///
/// Invariant: after any `prepare_frame` call, `previous_image` is the
/// `current_image` of the call before it.
pub struct Presentation {
    pub swapchain: Swapchain,
    sampler: Sampler,
    image_available: Semaphore,
    rendering_finished: Semaphore,
    current_image: usize,
    previous_image: usize,
}

impl Presentation {
    pub fn new(context: &Context, width: u32, height: u32) -> Result<Self> {
        let swapchain = Swapchain::new(context, width, height)?;

        // the ping-pong accumulation scheme needs exactly one previous image
        // per current image
        ensure!(
            swapchain.image_count() == 2,
            "expected a double-buffered swapchain, got {} images",
            swapchain.image_count()
        );

        let sampler_info = vk::SamplerCreateInfo::builder()
            .mag_filter(vk::Filter::LINEAR)
            .min_filter(vk::Filter::LINEAR)
            .mipmap_mode(vk::SamplerMipmapMode::NEAREST)
            .address_mode_u(vk::SamplerAddressMode::CLAMP_TO_EDGE)
            .address_mode_v(vk::SamplerAddressMode::CLAMP_TO_EDGE)
            .address_mode_w(vk::SamplerAddressMode::CLAMP_TO_EDGE)
            .max_anisotropy(1.0)
            .border_color(vk::BorderColor::FLOAT_TRANSPARENT_BLACK);
        let sampler = context.create_sampler(&sampler_info)?;

        let image_available = context.create_semaphore()?;
        let rendering_finished = context.create_semaphore()?;

        Ok(Self {
            swapchain,
            sampler,
            image_available,
            rendering_finished,
            current_image: 0,
            previous_image: 0,
        })
    }

    pub fn image_count(&self) -> usize {
        self.swapchain.image_count()
    }

    pub fn previous_image(&self) -> usize {
        self.previous_image
    }

    pub fn image_available_semaphore(&self) -> &Semaphore {
        &self.image_available
    }

    pub fn rendering_finished_semaphore(&self) -> &Semaphore {
        &self.rendering_finished
    }

    pub fn image_descriptor(&self, index: usize) -> ImageDescriptor {
        ImageDescriptor {
            view: &self.swapchain.views[index],
            sampler: &self.sampler,
            layout: vk::ImageLayout::GENERAL,
        }
    }

    /// Blocks until the presentation engine hands out the next image and
    /// returns its index. The previously current image becomes `previous`.
    pub fn prepare_frame(&mut self) -> Result<usize, RenderError> {
        self.previous_image = self.current_image;

        let acquired = self
            .swapchain
            .acquire_next_image(u64::MAX, &self.image_available)
            .map_err(RenderError::from)?;
        self.current_image = acquired.index as usize;

        Ok(self.current_image)
    }

    /// Presents `index`, gated on the rendering-finished semaphore.
    pub fn render_frame(&self, context: &Context, index: usize) -> Result<(), RenderError> {
        let suboptimal = self
            .swapchain
            .queue_present(
                index as u32,
                &[&self.rendering_finished],
                &context.present_queue,
            )
            .map_err(RenderError::from)?;

        if suboptimal {
            log::debug!("Presented to a suboptimal surface");
        }

        Ok(())
    }

    /// Startup-only: clears every image to black through a throwaway command
    /// buffer and leaves the whole chain in PRESENT_SRC, the layout the
    /// per-frame command buffers start from.
    pub fn clear(&self, context: &Context) -> Result<()> {
        log::debug!("Clearing swapchain images");

        context.execute_one_time_commands(|cmd_buffer| {
            for image in &self.swapchain.images {
                cmd_buffer.pipeline_image_barriers(&[ImageBarrier {
                    image,
                    old_layout: vk::ImageLayout::UNDEFINED,
                    new_layout: vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    src_access_mask: vk::AccessFlags2::NONE,
                    dst_access_mask: vk::AccessFlags2::TRANSFER_WRITE,
                    src_stage_mask: vk::PipelineStageFlags2::NONE,
                    dst_stage_mask: vk::PipelineStageFlags2::TRANSFER,
                }]);

                cmd_buffer.clear_color_image(
                    image,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    [0.0, 0.0, 0.0, 0.0],
                );

                cmd_buffer.pipeline_image_barriers(&[ImageBarrier {
                    image,
                    old_layout: vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    new_layout: vk::ImageLayout::PRESENT_SRC_KHR,
                    src_access_mask: vk::AccessFlags2::TRANSFER_WRITE,
                    dst_access_mask: vk::AccessFlags2::MEMORY_READ,
                    src_stage_mask: vk::PipelineStageFlags2::TRANSFER,
                    dst_stage_mask: vk::PipelineStageFlags2::ALL_COMMANDS,
                }]);
            }
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_mapping_alternates_over_dispatches() {
        // with two images the acquisition order is 0, 1, 0, 1, ...
        for dispatch in 0..6 {
            let written = dispatch % 2;
            assert_eq!(paired_image(written, 2), (dispatch + 1) % 2);
        }
    }

    #[test]
    fn pair_mapping_is_an_involution() {
        assert_eq!(paired_image(paired_image(0, 2), 2), 0);
        assert_eq!(paired_image(paired_image(1, 2), 2), 1);
    }
}
