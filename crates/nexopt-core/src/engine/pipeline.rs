use super::context::EvaluationContext;
use crate::core::forest::ConfigForest;

/// What a step reports when it cannot complete. The engine attaches the
/// step's name before surfacing it.
pub type StepError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// One opaque unit of physics computation: geometry sizing, weight buildup,
/// mission integration, post-processing. Steps read and write the
/// configuration forest and the evaluation context in place, and must not
/// touch anything else.
pub trait Step: Send {
    fn name(&self) -> &str;

    fn run(
        &self,
        forest: &mut ConfigForest,
        context: &mut EvaluationContext,
    ) -> Result<(), StepError>;
}

/// Adapter turning a plain function or closure into a named step.
pub struct FnStep<F> {
    name: String,
    f: F,
}

impl<F> FnStep<F>
where
    F: Fn(&mut ConfigForest, &mut EvaluationContext) -> Result<(), StepError> + Send,
{
    pub fn new(name: &str, f: F) -> Self {
        Self {
            name: name.to_string(),
            f,
        }
    }
}

impl<F> Step for FnStep<F>
where
    F: Fn(&mut ConfigForest, &mut EvaluationContext) -> Result<(), StepError> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(
        &self,
        forest: &mut ConfigForest,
        context: &mut EvaluationContext,
    ) -> Result<(), StepError> {
        (self.f)(forest, context)
    }
}

struct NamedStep {
    qualified: String,
    inner: Box<dyn Step>,
}

/// An ordered, flattened sequence of steps.
///
/// The pipeline is assembled once, before any evaluation: nested sequences
/// are flattened into a single ordered list with dotted qualified names
/// (`missions.design_mission`). Which steps run is decided here, at build
/// time; evaluation never skips or reorders a step based on data.
#[derive(Default)]
pub struct Pipeline {
    steps: Vec<NamedStep>,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// A pipeline with no steps. Useful for validating a study definition
    /// without running anything.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Qualified step names in execution order.
    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.qualified.as_str()).collect()
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (&str, &dyn Step)> {
        self.steps
            .iter()
            .map(|s| (s.qualified.as_str(), s.inner.as_ref()))
    }
}

enum BuilderEntry {
    Step(Box<dyn Step>),
    Sequence { name: String, entries: Vec<BuilderEntry> },
}

#[derive(Default)]
pub struct PipelineBuilder {
    entries: Vec<BuilderEntry>,
}

impl PipelineBuilder {
    pub fn step<S: Step + 'static>(mut self, step: S) -> Self {
        self.entries.push(BuilderEntry::Step(Box::new(step)));
        self
    }

    pub fn step_fn<F>(self, name: &str, f: F) -> Self
    where
        F: Fn(&mut ConfigForest, &mut EvaluationContext) -> Result<(), StepError>
            + Send
            + 'static,
    {
        self.step(FnStep::new(name, f))
    }

    /// Adds a named sub-sequence. Its steps are flattened into the main list
    /// at build time with `name.` prefixed to each qualified name.
    pub fn sequence(
        mut self,
        name: &str,
        build: impl FnOnce(PipelineBuilder) -> PipelineBuilder,
    ) -> Self {
        let nested = build(PipelineBuilder::default());
        self.entries.push(BuilderEntry::Sequence {
            name: name.to_string(),
            entries: nested.entries,
        });
        self
    }

    pub fn build(self) -> Pipeline {
        let mut steps = Vec::new();
        flatten(self.entries, "", &mut steps);
        Pipeline { steps }
    }
}

fn flatten(entries: Vec<BuilderEntry>, prefix: &str, out: &mut Vec<NamedStep>) {
    for entry in entries {
        match entry {
            BuilderEntry::Step(step) => {
                let qualified = if prefix.is_empty() {
                    step.name().to_string()
                } else {
                    format!("{prefix}.{}", step.name())
                };
                out.push(NamedStep {
                    qualified,
                    inner: step,
                });
            }
            BuilderEntry::Sequence { name, entries } => {
                let nested_prefix = if prefix.is_empty() {
                    name
                } else {
                    format!("{prefix}.{name}")
                };
                flatten(entries, &nested_prefix, out);
            }
        }
    }
}
