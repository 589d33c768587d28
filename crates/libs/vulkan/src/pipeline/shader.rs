use std::{collections::HashMap, fs, path::Path, sync::Arc};

use anyhow::{anyhow, Result};
use ash::vk;

use crate::{device::Device, Context};

const SPV_SEARCH_PATHS: [&str; 3] = ["", "./spv", "../spv"];

pub struct ShaderModule {
    device: Arc<Device>,
    pub(crate) inner: vk::ShaderModule,
}

impl ShaderModule {
    pub(crate) fn from_bytes(device: Arc<Device>, source: &[u8]) -> Result<Self> {
        let mut cursor = std::io::Cursor::new(source);
        let source = ash::util::read_spv(&mut cursor)?;

        let create_info = vk::ShaderModuleCreateInfo::builder().code(&source);
        let inner = unsafe { device.inner.create_shader_module(&create_info, None)? };

        Ok(Self { device, inner })
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.device.inner.destroy_shader_module(self.inner, None);
        }
    }
}

/// Name-keyed cache of compiled shader modules. Re-requesting a name returns
/// the module created for it the first time. The cache owns its modules and
/// must be dropped before the device it was created from.
pub struct ShaderCache {
    device: Arc<Device>,
    modules: HashMap<String, Arc<ShaderModule>>,
}

impl ShaderCache {
    pub(crate) fn new(device: Arc<Device>) -> Self {
        Self {
            device,
            modules: HashMap::new(),
        }
    }

    /// Loads `<name>.spv` from the spv search paths, creating the module on
    /// first request only.
    pub fn load(&mut self, name: &str) -> Result<Arc<ShaderModule>> {
        if let Some(module) = self.modules.get(name) {
            return Ok(module.clone());
        }

        let bytes = read_spv_file(name)?;
        let module = Arc::new(ShaderModule::from_bytes(self.device.clone(), &bytes)?);
        self.modules.insert(name.to_owned(), module.clone());

        log::debug!("Loaded shader module {name}");

        Ok(module)
    }
}

impl Context {
    pub fn create_shader_cache(&self) -> ShaderCache {
        ShaderCache::new(self.device.clone())
    }
}

fn read_spv_file(name: &str) -> Result<Vec<u8>> {
    let file_name = format!("{name}.spv");

    for prefix in SPV_SEARCH_PATHS {
        let path = Path::new(prefix).join(&file_name);
        if let Ok(bytes) = fs::read(&path) {
            return Ok(bytes);
        }
    }

    Err(anyhow!("couldn't find {file_name} in any spv search path"))
}
