//! Pluggable fact extractors
//!
//! Extractors see every candidate file of a module and report raw facts
//! through the [`ModuleContext`]. They are created fresh for each module
//! from the factories in an [`ExtractorRegistry`], so an extractor may keep
//! per-module state between `on_file` and `on_analysis_complete`.

use crate::build::SourceFile;
use crate::graph::module::ModuleContext;

pub trait Extractor {
    fn name(&self) -> &str;

    /// Called once for every file of the module, Java sources included.
    fn on_file(&mut self, ctx: &mut ModuleContext, file: &SourceFile);

    /// Called once after every file of the module has been seen.
    fn on_analysis_complete(&mut self, _ctx: &mut ModuleContext) {}
}

type Factory = Box<dyn Fn() -> Box<dyn Extractor> + Send + Sync>;

#[derive(Default)]
pub struct ExtractorRegistry {
    factories: Vec<Factory>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, factory: F)
    where
        F: Fn() -> Box<dyn Extractor> + Send + Sync + 'static,
    {
        self.factories.push(Box::new(factory));
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// One fresh extractor per registered factory, in registration order.
    pub fn instantiate(&self) -> Vec<Box<dyn Extractor>> {
        self.factories.iter().map(|factory| factory()).collect()
    }
}

impl std::fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractorRegistry")
            .field("factories", &self.factories.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::graph::merge::Inheritance;

    struct Counting {
        files: usize,
    }

    impl Extractor for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        fn on_file(&mut self, _ctx: &mut ModuleContext, _file: &SourceFile) {
            self.files += 1;
        }

        fn on_analysis_complete(&mut self, ctx: &mut ModuleContext) {
            ctx.add_declared_symbol(&format!("generated.Seen{}", self.files));
        }
    }

    #[test]
    fn instantiates_fresh_extractors() {
        let mut registry = ExtractorRegistry::new();
        registry.register(|| Box::new(Counting { files: 0 }));
        assert_eq!(registry.len(), 1);

        let file = SourceFile::Inline {
            path: "a.txt".into(),
            text: String::new(),
        };

        for _ in 0..2 {
            let mut ctx = ModuleContext::new("core", Arc::new(Inheritance::default()));
            let mut extractors = registry.instantiate();
            for extractor in &mut extractors {
                extractor.on_file(&mut ctx, &file);
                extractor.on_analysis_complete(&mut ctx);
            }
            let result = ctx.seal();
            assert!(result.declared.contains("generated.Seen1"));
        }
    }
}
