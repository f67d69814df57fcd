use super::alias::{AliasPlan, Target, resolve_alias};
use super::config::{Comparison, StudyConfig};
use super::context::EvaluationContext;
use super::error::EngineError;
use super::history::{EvaluationRecord, History};
use super::pipeline::Pipeline;
use super::progress::{Progress, ProgressReporter};
use crate::core::forest::ConfigForest;
use crate::core::path::TreePath;
use std::io;
use tracing::{debug, info, instrument};

/// The packed outputs of one evaluation, in the optimizer's conventions:
/// a minimization objective and one residual per constraint, where a
/// feasible point has every residual >= 0 (for `=` constraints, == 0).
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub objective: f64,
    pub constraints: Vec<f64>,
}

/// The session object for one optimization study.
///
/// A `Nexus` owns the problem description, the configuration forest, the
/// analysis pipeline, and the results of the most recent evaluation. Per
/// call it unpacks a raw optimizer vector into the forest, runs every
/// pipeline step in declaration order, and packs the summary quantities
/// back into an objective and constraint residuals.
///
/// Evaluations are sequential; a `Nexus` is never shared across threads.
/// The forest deliberately carries state between calls: sizing overrides a
/// step records during one evaluation stay in place for the next, which is
/// how successive evaluations converge faster.
pub struct Nexus {
    study: StudyConfig,
    forest: ConfigForest,
    pipeline: Pipeline,
    variable_plans: Vec<AliasPlan>,
    objective_path: TreePath,
    constraint_paths: Vec<TreePath>,
    context: EvaluationContext,
    history: History,
    evaluations: usize,
}

impl Nexus {
    /// Builds a nexus, resolving every alias against the forest's static
    /// shape. Malformed or unresolvable targets fail here, before the first
    /// evaluation.
    pub fn new(
        study: StudyConfig,
        forest: ConfigForest,
        pipeline: Pipeline,
    ) -> Result<Self, EngineError> {
        let mut variable_plans = Vec::with_capacity(study.variables().len());
        for descriptor in study.variables() {
            let entry = study.alias_for(&descriptor.name).ok_or_else(|| {
                EngineError::from(super::config::ConfigError::MissingAlias(
                    descriptor.name.clone(),
                ))
            })?;
            let plan = resolve_alias(entry, &forest)?;
            for target in &plan.targets {
                if matches!(target, Target::Summary { .. }) {
                    return Err(EngineError::AliasTarget {
                        name: descriptor.name.clone(),
                        target: "summary".to_string(),
                        reason: "design variables must target the configuration forest".into(),
                    });
                }
            }
            variable_plans.push(plan);
        }

        let objective_path = summary_path(&study, &forest, &study.objective().name)?;
        let constraint_paths = study
            .constraints()
            .iter()
            .map(|spec| summary_path(&study, &forest, &spec.name))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            study,
            forest,
            pipeline,
            variable_plans,
            objective_path,
            constraint_paths,
            context: EvaluationContext::new(),
            history: History::new(),
            evaluations: 0,
        })
    }

    /// Evaluates one raw optimizer vector without progress reporting.
    pub fn evaluate(&mut self, raw: &[f64]) -> Result<Evaluation, EngineError> {
        self.evaluate_with(raw, &ProgressReporter::new())
    }

    /// Evaluates one raw optimizer vector: unpack, pipeline, pack.
    #[instrument(skip_all, name = "nexus_evaluate")]
    pub fn evaluate_with(
        &mut self,
        raw: &[f64],
        reporter: &ProgressReporter,
    ) -> Result<Evaluation, EngineError> {
        let expected = self.study.variables().len();
        if raw.len() != expected {
            return Err(EngineError::VectorLength {
                expected,
                actual: raw.len(),
            });
        }

        let index = self.evaluations;
        reporter.report(Progress::EvaluationStart { index });
        info!(evaluation = index, "Starting nexus evaluation");

        // Leftover context from a previous call must not leak into this one.
        self.context = EvaluationContext::new();

        self.unpack(raw)?;
        self.run_pipeline(reporter)?;
        let evaluation = self.pack()?;

        self.evaluations += 1;
        self.history.push(EvaluationRecord {
            index,
            raw: raw.to_vec(),
            objective: evaluation.objective,
            constraints: evaluation.constraints.clone(),
        });
        info!(
            evaluation = index,
            objective = evaluation.objective,
            "Nexus evaluation complete"
        );
        reporter.report(Progress::EvaluationFinish {
            objective: evaluation.objective,
        });
        Ok(evaluation)
    }

    /// Writes each variable's engineering value to every leaf its alias
    /// reaches, in variable declaration order. Wildcard membership is
    /// expanded per call against the forest's current shape.
    fn unpack(&mut self, raw: &[f64]) -> Result<(), EngineError> {
        for (i, descriptor) in self.study.variables().iter().enumerate() {
            let value = descriptor.units.to_si(raw[i] * descriptor.scale);
            apply_variable(&mut self.forest, value, &self.variable_plans[i])?;
            debug!(
                variable = descriptor.name.as_str(),
                value, "Unpacked design variable"
            );
        }
        Ok(())
    }

    fn run_pipeline(&mut self, reporter: &ProgressReporter) -> Result<(), EngineError> {
        for (name, step) in self.pipeline.entries() {
            reporter.report(Progress::StepStart {
                name: name.to_string(),
            });
            debug!(step = name, "Running pipeline step");
            step.run(&mut self.forest, &mut self.context)
                .map_err(|source| EngineError::Step {
                    step: name.to_string(),
                    source,
                })?;
            reporter.report(Progress::StepFinish);
        }
        Ok(())
    }

    /// Reads the objective and constraint quantities out of the summary
    /// store and normalizes them for the optimizer.
    fn pack(&self) -> Result<Evaluation, EngineError> {
        let spec = self.study.objective();
        let value = spec.units.from_si(self.read_summary(&self.objective_path)?);
        let objective = value * spec.scale;
        ensure_finite(&spec.name, objective)?;

        let mut constraints = Vec::with_capacity(self.study.constraints().len());
        for (spec, path) in self.study.constraints().iter().zip(&self.constraint_paths) {
            let value = spec.units.from_si(self.read_summary(path)?);
            let residual = match spec.comparison {
                Comparison::Greater | Comparison::Equal => (value - spec.edge) / spec.scale,
                Comparison::Less => (spec.edge - value) / spec.scale,
            };
            ensure_finite(&spec.name, residual)?;
            constraints.push(residual);
        }

        Ok(Evaluation {
            objective,
            constraints,
        })
    }

    fn read_summary(&self, path: &TreePath) -> Result<f64, EngineError> {
        self.context
            .get_path(path)
            .map_err(|source| EngineError::PathResolution {
                path: path.to_string(),
                source: source.into(),
            })
    }

    /// The most recent evaluation's full result tree, for diagnostics,
    /// printing, or plotting sinks.
    pub fn last_results(&self) -> &EvaluationContext {
        &self.context
    }

    pub fn forest(&self) -> &ConfigForest {
        &self.forest
    }

    pub fn study(&self) -> &StudyConfig {
        &self.study
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn variable_names(&self) -> Vec<&str> {
        self.study
            .variables()
            .iter()
            .map(|v| v.name.as_str())
            .collect()
    }

    pub fn constraint_names(&self) -> Vec<&str> {
        self.study
            .constraints()
            .iter()
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Initial values in optimizer space (engineering value divided by the
    /// variable's scale), in declaration order.
    pub fn initial_vector(&self) -> Vec<f64> {
        self.study
            .variables()
            .iter()
            .map(|v| v.initial / v.scale)
            .collect()
    }

    /// Variable bounds in optimizer space. A negative scale flips the
    /// interval, so the endpoints are reordered after division.
    pub fn bounds(&self) -> Vec<(f64, f64)> {
        self.study
            .variables()
            .iter()
            .map(|v| {
                let a = v.lower / v.scale;
                let b = v.upper / v.scale;
                (a.min(b), a.max(b))
            })
            .collect()
    }

    pub fn scales(&self) -> Vec<f64> {
        self.study.variables().iter().map(|v| v.scale).collect()
    }

    pub fn write_history_csv<W: io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        self.history
            .write_csv(writer, &self.variable_names(), &self.constraint_names())
    }
}

/// Writes one variable's value to every leaf its plan reaches. All target
/// resolution happens before the first write, so a resolution failure
/// leaves every leaf of this variable untouched. No atomicity is promised
/// across different variables.
fn apply_variable(
    forest: &mut ConfigForest,
    value: f64,
    plan: &AliasPlan,
) -> Result<(), EngineError> {
    let mut writes: Vec<(String, TreePath)> = Vec::new();
    for target in &plan.targets {
        let Target::Forest { selector, path } = target else {
            // Summary targets on variables are rejected when the nexus is built.
            continue;
        };
        let leaves = forest
            .resolve(path)
            .map_err(|source| EngineError::PathResolution {
                path: path.to_string(),
                source,
            })?;
        for tag in selector.expand(forest) {
            for leaf in &leaves {
                writes.push((tag.to_string(), leaf.clone()));
            }
        }
    }
    for (tag, leaf) in writes {
        forest
            .set(&tag, &leaf, value)
            .map_err(|source| EngineError::PathResolution {
                path: leaf.to_string(),
                source,
            })?;
    }
    Ok(())
}

fn ensure_finite(quantity: &str, value: f64) -> Result<(), EngineError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(EngineError::NonFinite {
            quantity: quantity.to_string(),
            value,
        })
    }
}

fn summary_path(
    study: &StudyConfig,
    forest: &ConfigForest,
    name: &str,
) -> Result<TreePath, EngineError> {
    let entry = study
        .alias_for(name)
        .ok_or_else(|| EngineError::from(super::config::ConfigError::MissingAlias(name.into())))?;
    let plan = resolve_alias(entry, forest)?;
    match plan.targets.as_slice() {
        [Target::Summary { path }] => Ok(path.clone()),
        _ => Err(EngineError::AliasTarget {
            name: name.to_string(),
            target: entry.targets.join(", "),
            reason: "objective and constraint aliases must name exactly one summary quantity"
                .into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forest::ForestError;
    use crate::core::path::PathError;
    use crate::core::tree::ConfigTree;
    use crate::core::units::Unit;
    use crate::engine::config::{ConstraintSpec, ObjectiveSpec, VariableDescriptor};
    use approx::assert_relative_eq;
    use std::sync::Mutex;

    fn path(raw: &str) -> TreePath {
        TreePath::parse(raw).unwrap()
    }

    fn sample_forest() -> ConfigForest {
        let mut base = ConfigTree::new();
        base.set(&path("wings.main_wing.areas.reference"), 30.0).unwrap();
        base.set(&path("mass_properties.max_takeoff"), 8000.0).unwrap();
        base.set(&path("propulsors.turbofan.thrust.total_design"), 1000.0)
            .unwrap();
        base.set(&path("propulsors.turbofan.sealevel_static_thrust"), 0.0)
            .unwrap();
        let mut forest = ConfigForest::new("base", base);
        forest.derive_tree("cruise").unwrap();
        forest.derive_tree("takeoff").unwrap();
        forest
    }

    fn variable(name: &str, initial: f64, lower: f64, upper: f64, scale: f64, units: &str) -> VariableDescriptor {
        VariableDescriptor {
            name: name.to_string(),
            initial,
            lower,
            upper,
            scale,
            units: Unit::parse(units).unwrap(),
        }
    }

    fn sample_study() -> StudyConfig {
        StudyConfig::builder()
            .variable(variable("wing_area", 30.0, 20.0, 80.0, 1.0, "m^2"))
            .variable(variable("mtow", 8000.0, 6000.0, 12000.0, 1.0, "kg"))
            .objective(ObjectiveSpec {
                name: "mtow_objective".to_string(),
                scale: 1.0e-3,
                units: Unit::parse("kg").unwrap(),
            })
            .constraint(ConstraintSpec {
                name: "cruise_distance".to_string(),
                comparison: Comparison::Greater,
                edge: 1000.0,
                scale: 1.0,
                units: Unit::parse("km").unwrap(),
            })
            .alias("wing_area", &["configs.*.wings.main_wing.areas.reference"])
            .alias("mtow", &["configs.*.mass_properties.max_takeoff"])
            .alias("mtow_objective", &["summary.mtow"])
            .alias("cruise_distance", &["summary.mission_range"])
            .build()
            .unwrap()
    }

    /// Mission surrogate: range scales linearly with wing area, 40 km of
    /// range per square meter of wing.
    fn sample_pipeline() -> Pipeline {
        Pipeline::builder()
            .step_fn("design_mission", |forest, context| {
                let area = forest.get("cruise", &TreePath::parse("wings.main_wing.areas.reference")?)?;
                context.set("summary.mission_range", area * 40_000.0)?;
                Ok(())
            })
            .step_fn("post_process", |forest, context| {
                let mtow = forest.get("base", &TreePath::parse("mass_properties.max_takeoff")?)?;
                context.set("summary.mtow", mtow)?;
                Ok(())
            })
            .build()
    }

    fn sample_nexus() -> Nexus {
        Nexus::new(sample_study(), sample_forest(), sample_pipeline()).unwrap()
    }

    #[test]
    fn unpack_round_trips_through_every_tree() {
        let mut nexus = sample_nexus();
        nexus.evaluate(&[45.0, 9000.0]).unwrap();

        for tag in ["base", "cruise", "takeoff"] {
            assert_eq!(
                nexus
                    .forest()
                    .get(tag, &path("wings.main_wing.areas.reference"))
                    .unwrap(),
                45.0
            );
            assert_eq!(
                nexus.forest().get(tag, &path("mass_properties.max_takeoff")).unwrap(),
                9000.0
            );
        }
    }

    #[test]
    fn unpack_applies_unit_conversion() {
        let study = StudyConfig::builder()
            .variable(variable("design_range", 1.2, 0.5, 3.0, 1.0, "km"))
            .objective(ObjectiveSpec {
                name: "nothing".to_string(),
                scale: 1.0,
                units: Unit::DIMENSIONLESS,
            })
            .alias("design_range", &["configs.base.mass_properties.max_takeoff"])
            .alias("nothing", &["summary.nothing"])
            .build()
            .unwrap();
        let pipeline = Pipeline::builder()
            .step_fn("noop", |_, context| {
                context.set("summary.nothing", 0.0)?;
                Ok(())
            })
            .build();
        let mut nexus = Nexus::new(study, sample_forest(), pipeline).unwrap();
        nexus.evaluate(&[1.2]).unwrap();
        assert_relative_eq!(
            nexus.forest().get("base", &path("mass_properties.max_takeoff")).unwrap(),
            1200.0
        );
    }

    #[test]
    fn unpack_applies_scale_factor() {
        let study = StudyConfig::builder()
            .variable(variable("wing_area", 30.0, 20.0, 80.0, 30.0, "m^2"))
            .objective(ObjectiveSpec {
                name: "nothing".to_string(),
                scale: 1.0,
                units: Unit::DIMENSIONLESS,
            })
            .alias("wing_area", &["configs.*.wings.main_wing.areas.reference"])
            .alias("nothing", &["summary.nothing"])
            .build()
            .unwrap();
        let pipeline = Pipeline::builder()
            .step_fn("noop", |_, context| {
                context.set("summary.nothing", 0.0)?;
                Ok(())
            })
            .build();
        let mut nexus = Nexus::new(study, sample_forest(), pipeline).unwrap();
        // Optimizer works near 1.0; scale 30 maps it back to square meters.
        nexus.evaluate(&[1.5]).unwrap();
        assert_relative_eq!(
            nexus.forest().get("base", &path("wings.main_wing.areas.reference")).unwrap(),
            45.0
        );
    }

    #[test]
    fn variables_land_before_the_first_step_runs() {
        let seen = std::sync::Arc::new(Mutex::new(Vec::new()));
        let seen_in_step = seen.clone();
        let pipeline = Pipeline::builder()
            .step_fn("record", move |forest, context| {
                for tag in ["base", "cruise", "takeoff"] {
                    let area =
                        forest.get(tag, &TreePath::parse("wings.main_wing.areas.reference")?)?;
                    seen_in_step.lock().unwrap().push(area);
                }
                context.set("summary.mission_range", 1.2e6)?;
                context.set("summary.mtow", 8000.0)?;
                Ok(())
            })
            .build();
        let mut nexus = Nexus::new(sample_study(), sample_forest(), pipeline).unwrap();
        nexus.evaluate(&[45.0, 9000.0]).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![45.0, 45.0, 45.0]);
    }

    #[test]
    fn greater_constraint_residual_signs() {
        let mut nexus = sample_nexus();

        // 30 m^2 -> 1200 km of range, 200 km past the 1000 km edge.
        let feasible = nexus.evaluate(&[30.0, 8000.0]).unwrap();
        assert_relative_eq!(feasible.constraints[0], 200.0);

        // 20 m^2 -> 800 km, short of the edge.
        let infeasible = nexus.evaluate(&[20.0, 8000.0]).unwrap();
        assert_relative_eq!(infeasible.constraints[0], -200.0);
    }

    #[test]
    fn less_constraint_residual_signs() {
        let study = StudyConfig::builder()
            .variable(variable("wing_area", 30.0, 20.0, 80.0, 1.0, "m^2"))
            .objective(ObjectiveSpec {
                name: "mtow_objective".to_string(),
                scale: 1.0,
                units: Unit::parse("kg").unwrap(),
            })
            .constraint(ConstraintSpec {
                name: "mission_time".to_string(),
                comparison: Comparison::Less,
                edge: 11.1,
                scale: 10.0,
                units: Unit::parse("h").unwrap(),
            })
            .alias("wing_area", &["configs.*.wings.main_wing.areas.reference"])
            .alias("mtow_objective", &["summary.mtow"])
            .alias("mission_time", &["summary.mission_time"])
            .build()
            .unwrap();
        let pipeline = Pipeline::builder()
            .step_fn("mission", |_, context| {
                context.set("summary.mtow", 8000.0)?;
                context.set("summary.mission_time", 10.0 * 3600.0)?;
                Ok(())
            })
            .build();
        let mut nexus = Nexus::new(study, sample_forest(), pipeline).unwrap();
        let evaluation = nexus.evaluate(&[30.0]).unwrap();
        // 10 h is under the 11.1 h limit: residual positive, scaled by 10.
        assert_relative_eq!(evaluation.constraints[0], 0.11, epsilon = 1e-12);
    }

    #[test]
    fn equal_constraint_residual_signs() {
        let study = StudyConfig::builder()
            .variable(variable("wing_area", 30.0, 20.0, 80.0, 1.0, "m^2"))
            .objective(ObjectiveSpec {
                name: "nothing".to_string(),
                scale: 1.0,
                units: Unit::DIMENSIONLESS,
            })
            .constraint(ConstraintSpec {
                name: "fuel_margin".to_string(),
                comparison: Comparison::Equal,
                edge: 0.0,
                scale: 2.0,
                units: Unit::DIMENSIONLESS,
            })
            .alias("wing_area", &["configs.*.wings.main_wing.areas.reference"])
            .alias("nothing", &["summary.nothing"])
            .alias("fuel_margin", &["summary.fuel_margin"])
            .build()
            .unwrap();
        let pipeline = Pipeline::builder()
            .step_fn("post_process", |forest, context| {
                let area =
                    forest.get("base", &TreePath::parse("wings.main_wing.areas.reference")?)?;
                context.set("summary.nothing", 0.0)?;
                context.set("summary.fuel_margin", area - 30.0)?;
                Ok(())
            })
            .build();
        let mut nexus = Nexus::new(study, sample_forest(), pipeline).unwrap();

        // Residual is (value - edge) / scale; zero only at the edge.
        assert_relative_eq!(nexus.evaluate(&[30.0]).unwrap().constraints[0], 0.0);
        assert_relative_eq!(nexus.evaluate(&[34.0]).unwrap().constraints[0], 2.0);
        assert_relative_eq!(nexus.evaluate(&[26.0]).unwrap().constraints[0], -2.0);
    }

    #[test]
    fn objective_is_scaled_and_unit_converted() {
        let mut nexus = sample_nexus();
        let evaluation = nexus.evaluate(&[30.0, 9000.0]).unwrap();
        assert_relative_eq!(evaluation.objective, 9.0);
    }

    #[test]
    fn repeated_evaluation_is_deterministic() {
        let mut nexus = sample_nexus();
        let first = nexus.evaluate(&[42.0, 8500.0]).unwrap();
        let second = nexus.evaluate(&[42.0, 8500.0]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn sizing_overrides_carry_across_evaluations() {
        let trace = std::sync::Arc::new(Mutex::new(Vec::new()));
        let trace_in_step = trace.clone();
        let pipeline = Pipeline::builder()
            .step_fn("engine_sizing", move |forest, context| {
                let thrust_path =
                    TreePath::parse("propulsors.turbofan.sealevel_static_thrust")?;
                trace_in_step
                    .lock()
                    .unwrap()
                    .push(forest.get("base", &thrust_path)?);
                forest.set("base", &thrust_path, 4200.0)?;
                context.set("summary.mission_range", 1.2e6)?;
                context.set("summary.mtow", 8000.0)?;
                Ok(())
            })
            .build();
        let mut nexus = Nexus::new(sample_study(), sample_forest(), pipeline).unwrap();

        nexus.evaluate(&[30.0, 8000.0]).unwrap();
        nexus.evaluate(&[35.0, 8000.0]).unwrap();

        // The second evaluation starts from the thrust the first one sized.
        assert_eq!(*trace.lock().unwrap(), vec![0.0, 4200.0]);
    }

    #[test]
    fn missing_summary_quantity_is_path_resolution_error() {
        let pipeline = Pipeline::builder()
            .step_fn("half_done", |_, context| {
                context.set("summary.mission_range", 1.2e6)?;
                Ok(())
            })
            .build();
        let mut nexus = Nexus::new(sample_study(), sample_forest(), pipeline).unwrap();
        let result = nexus.evaluate(&[30.0, 8000.0]);
        assert!(matches!(result, Err(EngineError::PathResolution { .. })));
    }

    #[test]
    fn failing_step_is_surfaced_with_its_name() {
        let pipeline = Pipeline::builder()
            .sequence("missions", |b| {
                b.step_fn("design_mission", |_, _| Err("mission diverged".into()))
            })
            .build();
        let mut nexus = Nexus::new(sample_study(), sample_forest(), pipeline).unwrap();
        let err = nexus.evaluate(&[30.0, 8000.0]).unwrap_err();
        match err {
            EngineError::Step { step, .. } => assert_eq!(step, "missions.design_mission"),
            other => panic!("expected step error, got {other:?}"),
        }
    }

    #[test]
    fn non_finite_summary_value_is_rejected() {
        let pipeline = Pipeline::builder()
            .step_fn("bad_mission", |_, context| {
                context.set("summary.mission_range", f64::NAN)?;
                context.set("summary.mtow", 8000.0)?;
                Ok(())
            })
            .build();
        let mut nexus = Nexus::new(sample_study(), sample_forest(), pipeline).unwrap();
        let result = nexus.evaluate(&[30.0, 8000.0]);
        assert!(matches!(result, Err(EngineError::NonFinite { .. })));
    }

    #[test]
    fn wrong_vector_length_is_rejected() {
        let mut nexus = sample_nexus();
        let result = nexus.evaluate(&[30.0]);
        assert!(matches!(
            result,
            Err(EngineError::VectorLength {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn unresolvable_alias_fails_when_the_nexus_is_built() {
        let study = StudyConfig::builder()
            .variable(variable("fus_length", 20.0, 14.0, 25.0, 1.0, "m"))
            .objective(ObjectiveSpec {
                name: "mtow_objective".to_string(),
                scale: 1.0,
                units: Unit::parse("kg").unwrap(),
            })
            .alias("fus_length", &["configs.*.fuselages.fuselage.lengths.total"])
            .alias("mtow_objective", &["summary.mtow"])
            .build()
            .unwrap();
        let result = Nexus::new(study, sample_forest(), Pipeline::empty());
        assert!(matches!(result, Err(EngineError::AliasTarget { .. })));
    }

    #[test]
    fn variable_aliased_to_summary_is_rejected() {
        let study = StudyConfig::builder()
            .variable(variable("wing_area", 30.0, 20.0, 80.0, 1.0, "m^2"))
            .objective(ObjectiveSpec {
                name: "mtow_objective".to_string(),
                scale: 1.0,
                units: Unit::parse("kg").unwrap(),
            })
            .alias("wing_area", &["summary.wing_area"])
            .alias("mtow_objective", &["summary.mtow"])
            .build()
            .unwrap();
        let result = Nexus::new(study, sample_forest(), Pipeline::empty());
        assert!(matches!(result, Err(EngineError::AliasTarget { .. })));
    }

    #[test]
    fn apply_variable_is_atomic_per_variable() {
        // Bypass configure-time validation to exercise the runtime guard:
        // resolution of every target happens before the first write.
        let mut forest = sample_forest();
        let plan = AliasPlan {
            name: "wing_area".to_string(),
            targets: vec![
                Target::Forest {
                    selector: super::super::alias::TreeSelector::All,
                    path: path("wings.main_wing.areas.reference"),
                },
                Target::Forest {
                    selector: super::super::alias::TreeSelector::All,
                    path: path("wings.canard.areas.reference"),
                },
            ],
        };

        let err = apply_variable(&mut forest, 45.0, &plan).unwrap_err();
        assert!(matches!(
            err,
            EngineError::PathResolution {
                source: ForestError::Path(PathError::NotFound(_)),
                ..
            }
        ));
        // The resolvable first target was not applied either.
        assert_eq!(
            forest.get("base", &path("wings.main_wing.areas.reference")).unwrap(),
            30.0
        );
    }

    #[test]
    fn solver_views_are_in_declaration_order() {
        let study = StudyConfig::builder()
            .variable(variable("wing_area", 30.0, 20.0, 80.0, 30.0, "m^2"))
            .variable(variable("mtow", 8000.0, 6000.0, 12000.0, 1.0, "kg"))
            .objective(ObjectiveSpec {
                name: "mtow_objective".to_string(),
                scale: 1.0,
                units: Unit::parse("kg").unwrap(),
            })
            .alias("wing_area", &["configs.*.wings.main_wing.areas.reference"])
            .alias("mtow", &["configs.*.mass_properties.max_takeoff"])
            .alias("mtow_objective", &["summary.mtow"])
            .build()
            .unwrap();
        let nexus = Nexus::new(study, sample_forest(), Pipeline::empty()).unwrap();

        assert_eq!(nexus.variable_names(), vec!["wing_area", "mtow"]);
        assert_eq!(nexus.initial_vector(), vec![1.0, 8000.0]);
        let bounds = nexus.bounds();
        assert_relative_eq!(bounds[0].0, 20.0 / 30.0);
        assert_relative_eq!(bounds[0].1, 80.0 / 30.0);
        assert_eq!(nexus.scales(), vec![30.0, 1.0]);
    }

    #[test]
    fn progress_events_follow_the_pipeline() {
        let events = std::sync::Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let reporter = ProgressReporter::with_callback(Box::new(move |event| {
            sink.lock().unwrap().push(event);
        }));

        let mut nexus = sample_nexus();
        nexus.evaluate_with(&[30.0, 8000.0], &reporter).unwrap();

        let events = events.lock().unwrap();
        assert!(matches!(events[0], Progress::EvaluationStart { index: 0 }));
        assert!(
            matches!(&events[1], Progress::StepStart { name } if name == "design_mission")
        );
        assert!(matches!(events[2], Progress::StepFinish));
        assert!(
            matches!(&events[3], Progress::StepStart { name } if name == "post_process")
        );
        assert!(matches!(events[4], Progress::StepFinish));
        assert!(matches!(
            events[5],
            Progress::EvaluationFinish { .. }
        ));
    }

    #[test]
    fn history_records_every_evaluation() {
        let mut nexus = sample_nexus();
        nexus.evaluate(&[30.0, 9000.0]).unwrap();
        nexus.evaluate(&[40.0, 8000.0]).unwrap();

        assert_eq!(nexus.history().len(), 2);
        assert_eq!(nexus.history().best().unwrap().index, 1);

        let mut buffer = Vec::new();
        nexus.write_history_csv(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with("evaluation,wing_area,mtow,objective,residual_cruise_distance"));
    }

    #[test]
    fn last_results_expose_the_summary_store() {
        let mut nexus = sample_nexus();
        nexus.evaluate(&[30.0, 8000.0]).unwrap();
        assert_relative_eq!(
            nexus.last_results().get("summary.mission_range").unwrap(),
            1.2e6
        );
    }
}
