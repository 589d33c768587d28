use std::{ffi::CString, sync::Arc};

use anyhow::Result;
use ash::vk;

use crate::{device::Device, Context, PipelineLayout, ShaderModule};

pub struct ComputePipeline {
    device: Arc<Device>,
    pub(crate) inner: vk::Pipeline,
}

impl ComputePipeline {
    pub(crate) fn new(
        device: Arc<Device>,
        layout: &PipelineLayout,
        shader: &ShaderModule,
    ) -> Result<Self> {
        let entry_point_name = CString::new("main").unwrap();
        let shader_stage_info = vk::PipelineShaderStageCreateInfo::builder()
            .stage(vk::ShaderStageFlags::COMPUTE)
            .module(shader.inner)
            .name(&entry_point_name)
            .build();

        let pipeline_info = vk::ComputePipelineCreateInfo::builder()
            .stage(shader_stage_info)
            .layout(layout.inner);

        let inner = unsafe {
            device
                .inner
                .create_compute_pipelines(
                    vk::PipelineCache::null(),
                    std::slice::from_ref(&pipeline_info),
                    None,
                )
                .map_err(|e| e.1)?[0]
        };

        Ok(Self { device, inner })
    }
}

impl Context {
    pub fn create_compute_pipeline(
        &self,
        layout: &PipelineLayout,
        shader: &ShaderModule,
    ) -> Result<ComputePipeline> {
        ComputePipeline::new(self.device.clone(), layout, shader)
    }
}

impl Drop for ComputePipeline {
    fn drop(&mut self) {
        unsafe { self.device.inner.destroy_pipeline(self.inner, None) };
    }
}
