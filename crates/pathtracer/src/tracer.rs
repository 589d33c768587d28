use app::anyhow::Result;
use app::error::RenderError;
use app::presentation::paired_image;
use app::vulkan::ash::vk;
use app::vulkan::{
    Buffer, CommandBuffer, CommandPool, ComputePipeline, DescriptorPool, DescriptorSet,
    DescriptorSetLayout, Fence, Image, ImageBarrier, PipelineLayout, SemaphoreSubmitInfo,
    ShaderCache, WriteDescriptorSet, WriteDescriptorSetKind,
};
use app::{App, BaseApp};

use crate::scene;
use crate::uniforms::{FrameCounter, FrameUniform, TIME_STEP};

const PATHTRACE_SHADER: &str = "pathtracer.comp";

/// Work-group footprint of the compute shader.
const TILE_SIZE: u32 = 16;

const PREVIOUS_FRAME_BIND: u32 = 0;
const OUTPUT_IMAGE_BIND: u32 = 1;
const FRAME_BIND: u32 = 2;
const LIGHT_BIND: u32 = 3;
const PLANES_BIND: u32 = 4;
const SPHERES_BIND: u32 = 5;

/// Round-up division so the whole target area is covered when the extent is
/// not a multiple of the tile size.
const fn group_count(size: u32, tile: u32) -> u32 {
    (size + tile - 1) / tile
}

/// Owns the scene uniforms, the per-image descriptor sets and command
/// buffers, and the dispatch protocol that drives the accumulation loop.
pub struct PathTracer {
    frame: FrameUniform,
    frames: FrameCounter,

    frame_ubo: Buffer,
    _light_ubo: Buffer,
    _planes_ubo: Buffer,
    _spheres_ubo: Buffer,

    _shader_cache: ShaderCache,
    _pipeline_layout: PipelineLayout,
    _pipeline: ComputePipeline,
    _descriptor_layout: DescriptorSetLayout,
    _descriptor_pool: DescriptorPool,
    _descriptor_sets: Vec<DescriptorSet>,

    _command_pool: CommandPool,
    command_buffers: Vec<CommandBuffer>,

    /// At most one submission may be outstanding. This single fence guards
    /// reuse of the command buffers, the frame uniform memory and both
    /// swapchain images, making the pipeline strictly one frame deep.
    in_flight: Fence,
}

impl App for PathTracer {
    fn new(base: &BaseApp) -> Result<Self> {
        let context = &base.context;
        let extent = base.presentation.swapchain.extent;
        let image_count = base.presentation.image_count();

        log::info!("Creating scene data");

        let frame = FrameUniform {
            inverse_projection_view: base.camera.inverse_projection_view(),
            resolution: [extent.width as f32, extent.height as f32],
            frame: 0,
            time: 0.0,
        };
        let frame_ubo = context.create_uniform_buffer(&[frame])?;

        let light_ubo = context.create_uniform_buffer(&[scene::light()])?;

        let planes = scene::planes();
        let planes_ubo = context.create_uniform_buffer(&planes[..])?;

        let spheres = scene::spheres();
        let spheres_ubo = context.create_uniform_buffer(&spheres[..])?;

        log::info!("Creating the compute pipeline");

        let stage = vk::ShaderStageFlags::COMPUTE;
        let layout_bindings = [
            vk::DescriptorSetLayoutBinding::builder()
                .binding(PREVIOUS_FRAME_BIND)
                .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .descriptor_count(1)
                .stage_flags(stage)
                .build(),
            vk::DescriptorSetLayoutBinding::builder()
                .binding(OUTPUT_IMAGE_BIND)
                .descriptor_type(vk::DescriptorType::STORAGE_IMAGE)
                .descriptor_count(1)
                .stage_flags(stage)
                .build(),
            vk::DescriptorSetLayoutBinding::builder()
                .binding(FRAME_BIND)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .descriptor_count(1)
                .stage_flags(stage)
                .build(),
            vk::DescriptorSetLayoutBinding::builder()
                .binding(LIGHT_BIND)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .descriptor_count(1)
                .stage_flags(stage)
                .build(),
            vk::DescriptorSetLayoutBinding::builder()
                .binding(PLANES_BIND)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .descriptor_count(1)
                .stage_flags(stage)
                .build(),
            vk::DescriptorSetLayoutBinding::builder()
                .binding(SPHERES_BIND)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .descriptor_count(1)
                .stage_flags(stage)
                .build(),
        ];
        let descriptor_layout = context.create_descriptor_set_layout(&layout_bindings)?;
        let pipeline_layout = context.create_pipeline_layout(&[&descriptor_layout])?;

        let mut shader_cache = context.create_shader_cache();
        let shader = shader_cache.load(PATHTRACE_SHADER)?;
        let pipeline = context.create_compute_pipeline(&pipeline_layout, &shader)?;

        let pool_sizes = [
            vk::DescriptorPoolSize::builder()
                .ty(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .descriptor_count(image_count as u32)
                .build(),
            vk::DescriptorPoolSize::builder()
                .ty(vk::DescriptorType::STORAGE_IMAGE)
                .descriptor_count(image_count as u32)
                .build(),
            vk::DescriptorPoolSize::builder()
                .ty(vk::DescriptorType::UNIFORM_BUFFER)
                .descriptor_count(4 * image_count as u32)
                .build(),
        ];
        let descriptor_pool = context.create_descriptor_pool(image_count as u32, &pool_sizes)?;

        // One set per image: set `i` samples the paired image and writes
        // image `i`, which is what ping-pongs the accumulation.
        let descriptor_sets = descriptor_pool.allocate_sets(&descriptor_layout, image_count as u32)?;
        for (i, set) in descriptor_sets.iter().enumerate() {
            let read = base
                .presentation
                .image_descriptor(paired_image(i, image_count));
            let write = base.presentation.image_descriptor(i);

            set.update(&[
                WriteDescriptorSet {
                    binding: PREVIOUS_FRAME_BIND,
                    kind: WriteDescriptorSetKind::CombinedImageSampler {
                        view: read.view,
                        sampler: read.sampler,
                        layout: read.layout,
                    },
                },
                WriteDescriptorSet {
                    binding: OUTPUT_IMAGE_BIND,
                    kind: WriteDescriptorSetKind::StorageImage {
                        view: write.view,
                        layout: write.layout,
                    },
                },
                WriteDescriptorSet {
                    binding: FRAME_BIND,
                    kind: WriteDescriptorSetKind::UniformBuffer { buffer: &frame_ubo },
                },
                WriteDescriptorSet {
                    binding: LIGHT_BIND,
                    kind: WriteDescriptorSetKind::UniformBuffer { buffer: &light_ubo },
                },
                WriteDescriptorSet {
                    binding: PLANES_BIND,
                    kind: WriteDescriptorSetKind::UniformBuffer {
                        buffer: &planes_ubo,
                    },
                },
                WriteDescriptorSet {
                    binding: SPHERES_BIND,
                    kind: WriteDescriptorSetKind::UniformBuffer {
                        buffer: &spheres_ubo,
                    },
                },
            ]);
        }

        log::info!("Recording dispatch command buffers");

        let command_pool = context.create_command_pool(context.graphics_queue_family, None)?;
        let command_buffers =
            command_pool.allocate_command_buffers(vk::CommandBufferLevel::PRIMARY, image_count as u32)?;

        for (i, cmd_buffer) in command_buffers.iter().enumerate() {
            record_dispatch(
                cmd_buffer,
                &pipeline,
                &pipeline_layout,
                &descriptor_sets[i],
                &base.presentation.swapchain.images[i],
                &base.presentation.swapchain.images[paired_image(i, image_count)],
                extent,
            )?;
        }

        let in_flight = context.create_fence(Some(vk::FenceCreateFlags::SIGNALED))?;

        Ok(Self {
            frame,
            frames: FrameCounter::default(),
            frame_ubo,
            _light_ubo: light_ubo,
            _planes_ubo: planes_ubo,
            _spheres_ubo: spheres_ubo,
            _shader_cache: shader_cache,
            _pipeline_layout: pipeline_layout,
            _pipeline: pipeline,
            _descriptor_layout: descriptor_layout,
            _descriptor_pool: descriptor_pool,
            _descriptor_sets: descriptor_sets,
            _command_pool: command_pool,
            command_buffers,
            in_flight,
        })
    }

    fn dispatch(&mut self, base: &mut BaseApp, camera_changed: bool) -> Result<(), RenderError> {
        // refresh the frame block
        self.frame.inverse_projection_view = base.camera.inverse_projection_view();
        self.frame.frame = self.frames.advance(camera_changed);
        self.frame.time += TIME_STEP;
        self.frame_ubo.write_data(&[self.frame])?;

        // acquire, then drain the previous submission before reusing its
        // command buffer and fence
        let image_index = base.presentation.prepare_frame()?;

        self.in_flight.wait(None)?;
        self.in_flight.reset()?;

        base.context.graphics_queue.submit(
            &self.command_buffers[image_index],
            Some(SemaphoreSubmitInfo {
                semaphore: base.presentation.image_available_semaphore(),
                stage_mask: vk::PipelineStageFlags2::COMPUTE_SHADER,
            }),
            Some(SemaphoreSubmitInfo {
                semaphore: base.presentation.rendering_finished_semaphore(),
                stage_mask: vk::PipelineStageFlags2::ALL_COMMANDS,
            }),
            &self.in_flight,
        )?;

        base.presentation.render_frame(&base.context, image_index)?;

        Ok(())
    }
}

fn record_dispatch(
    cmd_buffer: &CommandBuffer,
    pipeline: &ComputePipeline,
    pipeline_layout: &PipelineLayout,
    set: &DescriptorSet,
    write_image: &Image,
    read_image: &Image,
    extent: vk::Extent2D,
) -> Result<()> {
    cmd_buffer.begin(None)?;

    // both images start from the PRESENT_SRC layout the chain was left in
    cmd_buffer.pipeline_image_barriers(&[
        ImageBarrier {
            image: write_image,
            old_layout: vk::ImageLayout::PRESENT_SRC_KHR,
            new_layout: vk::ImageLayout::GENERAL,
            src_access_mask: vk::AccessFlags2::NONE,
            dst_access_mask: vk::AccessFlags2::SHADER_STORAGE_WRITE,
            src_stage_mask: vk::PipelineStageFlags2::NONE,
            dst_stage_mask: vk::PipelineStageFlags2::COMPUTE_SHADER,
        },
        ImageBarrier {
            image: read_image,
            old_layout: vk::ImageLayout::PRESENT_SRC_KHR,
            new_layout: vk::ImageLayout::GENERAL,
            src_access_mask: vk::AccessFlags2::NONE,
            dst_access_mask: vk::AccessFlags2::SHADER_SAMPLED_READ,
            src_stage_mask: vk::PipelineStageFlags2::NONE,
            dst_stage_mask: vk::PipelineStageFlags2::COMPUTE_SHADER,
        },
    ]);

    cmd_buffer.bind_compute_pipeline(pipeline);
    cmd_buffer.bind_descriptor_sets(
        vk::PipelineBindPoint::COMPUTE,
        pipeline_layout,
        0,
        &[set],
    );

    cmd_buffer.dispatch(
        group_count(extent.width, TILE_SIZE),
        group_count(extent.height, TILE_SIZE),
        1,
    );

    cmd_buffer.pipeline_image_barriers(&[
        ImageBarrier {
            image: write_image,
            old_layout: vk::ImageLayout::GENERAL,
            new_layout: vk::ImageLayout::PRESENT_SRC_KHR,
            src_access_mask: vk::AccessFlags2::SHADER_STORAGE_WRITE,
            dst_access_mask: vk::AccessFlags2::MEMORY_READ,
            src_stage_mask: vk::PipelineStageFlags2::COMPUTE_SHADER,
            dst_stage_mask: vk::PipelineStageFlags2::ALL_COMMANDS,
        },
        ImageBarrier {
            image: read_image,
            old_layout: vk::ImageLayout::GENERAL,
            new_layout: vk::ImageLayout::PRESENT_SRC_KHR,
            src_access_mask: vk::AccessFlags2::SHADER_SAMPLED_READ,
            dst_access_mask: vk::AccessFlags2::MEMORY_READ,
            src_stage_mask: vk::PipelineStageFlags2::COMPUTE_SHADER,
            dst_stage_mask: vk::PipelineStageFlags2::ALL_COMMANDS,
        },
    ]);

    cmd_buffer.end()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_count_rounds_up_to_cover_the_extent() {
        assert_eq!(group_count(800, TILE_SIZE), 50);
        assert_eq!(group_count(600, TILE_SIZE), 38);
        assert_eq!(group_count(610, TILE_SIZE), 39);
        assert_eq!(group_count(1, TILE_SIZE), 1);
        assert_eq!(group_count(16, TILE_SIZE), 1);
        assert_eq!(group_count(17, TILE_SIZE), 2);
    }

    #[test]
    fn covered_area_is_never_smaller_than_the_extent() {
        for size in 1..100 {
            assert!(group_count(size, TILE_SIZE) * TILE_SIZE >= size);
        }
    }
}
