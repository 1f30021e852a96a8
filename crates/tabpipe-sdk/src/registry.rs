use std::collections::HashMap;
use std::path::Path;

use crate::component::ComponentSpec;
use crate::engine::{DatasetLoader, DatasetSaver, Transform};
use crate::error::{PipelineError, Result};

type TransformFactory = Box<dyn Fn(&[String]) -> Result<Box<dyn Transform>> + Send + Sync>;
type LoaderFactory = Box<dyn Fn(&[String]) -> Result<Box<dyn DatasetLoader>> + Send + Sync>;
type SaverFactory = Box<dyn Fn(&[String]) -> Result<Box<dyn DatasetSaver>> + Send + Sync>;
type RestoreFn = Box<dyn Fn(&[u8]) -> Result<Box<dyn Transform>> + Send + Sync>;

/// Maps component identifiers to constructor closures.
///
/// Populated at process start by the embedding application; the core only
/// resolves identifiers, it never knows concrete component types. File
/// extensions map to loader/saver identifiers for automatic detection.
#[derive(Default)]
pub struct ComponentRegistry {
    transforms: HashMap<String, TransformFactory>,
    loaders: HashMap<String, LoaderFactory>,
    savers: HashMap<String, SaverFactory>,
    loader_extensions: HashMap<String, String>,
    saver_extensions: HashMap<String, String>,
    restore: Option<RestoreFn>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_transform<F>(&mut self, id: &str, factory: F)
    where
        F: Fn(&[String]) -> Result<Box<dyn Transform>> + Send + Sync + 'static,
    {
        self.transforms.insert(id.to_string(), Box::new(factory));
    }

    pub fn register_loader<F>(&mut self, id: &str, factory: F)
    where
        F: Fn(&[String]) -> Result<Box<dyn DatasetLoader>> + Send + Sync + 'static,
    {
        self.loaders.insert(id.to_string(), Box::new(factory));
    }

    pub fn register_saver<F>(&mut self, id: &str, factory: F)
    where
        F: Fn(&[String]) -> Result<Box<dyn DatasetSaver>> + Send + Sync + 'static,
    {
        self.savers.insert(id.to_string(), Box::new(factory));
    }

    /// Associate a file extension (without the dot) with a loader identifier.
    pub fn register_loader_extension(&mut self, extension: &str, id: &str) {
        self.loader_extensions
            .insert(extension.to_ascii_lowercase(), id.to_string());
    }

    pub fn register_saver_extension(&mut self, extension: &str, id: &str) {
        self.saver_extensions
            .insert(extension.to_ascii_lowercase(), id.to_string());
    }

    /// Install the hook that revives a transform from its persisted blob.
    /// The blob format is owned by the engine backend.
    pub fn register_restore_transform<F>(&mut self, restore: F)
    where
        F: Fn(&[u8]) -> Result<Box<dyn Transform>> + Send + Sync + 'static,
    {
        self.restore = Some(Box::new(restore));
    }

    pub fn build_transform(&self, spec: &ComponentSpec) -> Result<Box<dyn Transform>> {
        let factory = self
            .transforms
            .get(&spec.id)
            .ok_or_else(|| PipelineError::UnknownComponent(spec.id.clone()))?;
        factory(&spec.options)
    }

    pub fn build_loader(&self, spec: &ComponentSpec) -> Result<Box<dyn DatasetLoader>> {
        let factory = self
            .loaders
            .get(&spec.id)
            .ok_or_else(|| PipelineError::UnknownComponent(spec.id.clone()))?;
        factory(&spec.options)
    }

    pub fn build_saver(&self, spec: &ComponentSpec) -> Result<Box<dyn DatasetSaver>> {
        let factory = self
            .savers
            .get(&spec.id)
            .ok_or_else(|| PipelineError::UnknownComponent(spec.id.clone()))?;
        factory(&spec.options)
    }

    /// Detect a loader from the path's extension, built with no options.
    pub fn loader_for_path(&self, path: &Path) -> Result<Box<dyn DatasetLoader>> {
        let id = extension_of(path)
            .and_then(|ext| self.loader_extensions.get(&ext))
            .ok_or_else(|| PipelineError::NoLoader(path.to_path_buf()))?;
        self.build_loader(&ComponentSpec::new(id.clone(), Vec::new()))
    }

    /// Detect a saver from the path's extension, built with no options.
    pub fn saver_for_path(&self, path: &Path) -> Result<Box<dyn DatasetSaver>> {
        let id = extension_of(path)
            .and_then(|ext| self.saver_extensions.get(&ext))
            .ok_or_else(|| PipelineError::NoSaver(path.to_path_buf()))?;
        self.build_saver(&ComponentSpec::new(id.clone(), Vec::new()))
    }

    pub fn restore_transform(&self, blob: &[u8]) -> Result<Box<dyn Transform>> {
        let restore = self.restore.as_ref().ok_or_else(|| {
            PipelineError::Config("no transform restore hook registered".to_string())
        })?;
        restore(blob)
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}
