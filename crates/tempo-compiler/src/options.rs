//! Emitter and pipeline configuration.

/// Options for one [`Emitter`](crate::Emitter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitterOptions {
    /// Cache results of functions declared pure.
    pub memoize: bool,
    /// Keep source lines in spawned code names (`spork~code:12`).
    pub debug_names: bool,
}

impl Default for EmitterOptions {
    fn default() -> Self {
        Self {
            memoize: false,
            debug_names: true,
        }
    }
}

impl EmitterOptions {
    /// Enable or disable memoization.
    pub fn with_memoize(mut self, memoize: bool) -> Self {
        self.memoize = memoize;
        self
    }

    /// Enable or disable source lines in generated names.
    pub fn with_debug_names(mut self, debug_names: bool) -> Self {
        self.debug_names = debug_names;
        self
    }
}

/// Names of the passes in the default sequence.
pub const DEFAULT_PASSES: [&str; 2] = ["check", "emit"];

/// Options for a [`Pipeline`](crate::passes::Pipeline).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Pass names to run, in order.
    pub passes: Vec<String>,
    /// Options for the emit pass.
    pub emitter: EmitterOptions,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            passes: DEFAULT_PASSES.iter().map(|s| s.to_string()).collect(),
            emitter: EmitterOptions::default(),
        }
    }
}

impl PipelineOptions {
    /// Set the active pass sequence.
    pub fn with_passes<I, S>(mut self, passes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.passes = passes.into_iter().map(Into::into).collect();
        self
    }

    /// Set the emitter options.
    pub fn with_emitter(mut self, emitter: EmitterOptions) -> Self {
        self.emitter = emitter;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = PipelineOptions::default();
        assert_eq!(options.passes, vec!["check", "emit"]);
        assert!(!options.emitter.memoize);
    }

    #[test]
    fn builders() {
        let options = PipelineOptions::default()
            .with_passes(["emit"])
            .with_emitter(EmitterOptions::default().with_memoize(true));
        assert_eq!(options.passes, vec!["emit"]);
        assert!(options.emitter.memoize);
    }
}
