use crate::config::RealignerConfig;
use crate::error::AlignmentError;
use crate::pipeline::defaults::{ArabicNormalizer, FuzzyWindowMatcher};
use crate::pipeline::runtime::{Realigner, RealignerParts};
use crate::pipeline::traits::{TextNormalizer, WindowMatcher};

pub struct RealignerBuilder {
    config: RealignerConfig,
    normalizer: Option<Box<dyn TextNormalizer>>,
    matcher: Option<Box<dyn WindowMatcher>>,
}

impl RealignerBuilder {
    pub fn new(config: RealignerConfig) -> Self {
        Self {
            config,
            normalizer: None,
            matcher: None,
        }
    }

    pub fn with_normalizer(mut self, normalizer: Box<dyn TextNormalizer>) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    pub fn with_matcher(mut self, matcher: Box<dyn WindowMatcher>) -> Self {
        self.matcher = Some(matcher);
        self
    }

    pub fn build(self) -> Result<Realigner, AlignmentError> {
        self.config.validate()?;
        Ok(Realigner::from_parts(RealignerParts {
            config: self.config,
            normalizer: self
                .normalizer
                .unwrap_or_else(|| Box::new(ArabicNormalizer)),
            matcher: self
                .matcher
                .unwrap_or_else(|| Box::new(FuzzyWindowMatcher)),
        }))
    }
}
