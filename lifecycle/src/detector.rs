//! The detect resolver: group selection, meta-buildpack expansion and the
//! backtracking search for a consistent build plan.

use crate::buildpack_store::BuildpackStore;
use crate::errors::Error;
use crate::exit_code;
use crate::log::Logger;
use crate::runner::{BuildpackRunner, DetectConfig, DetectRun};
use crate::verify_buildpack_api;
use lifecycle_data::build_plan::{PlanSections, Require};
use lifecycle_data::buildpack::BuildpackDescriptor;
use lifecycle_data::group::{BuildpackGroup, GroupEntry};
use lifecycle_data::plan::{BuildPlan, BuildPlanEntry};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};
use std::thread;

/// Resolves an order into the first group that produces a consistent build
/// plan.
///
/// Detect executables for a candidate group run concurrently; their outcomes
/// are kept in a map keyed by `id@version` that is shared across candidate
/// groups, so a buildpack is invoked at most once per order resolution.
pub struct Detector<'a> {
    config: DetectConfig,
    store: &'a dyn BuildpackStore,
    runner: &'a (dyn BuildpackRunner + Sync),
    logger: &'a dyn Logger,
    runs: Mutex<HashMap<String, DetectRun>>,
}

impl<'a> Detector<'a> {
    pub fn new(
        config: DetectConfig,
        store: &'a dyn BuildpackStore,
        runner: &'a (dyn BuildpackRunner + Sync),
        logger: &'a dyn Logger,
    ) -> Self {
        Self {
            config,
            store,
            runner,
            logger,
            runs: Mutex::new(HashMap::new()),
        }
    }

    /// Tries each group of the order until one detects. A group that merely
    /// fails detection is skipped; every other error is fatal.
    pub fn detect(&self, order: &[BuildpackGroup]) -> Result<(BuildpackGroup, BuildPlan), Error> {
        for group in order {
            let candidates = self.expand(&group.group)?;

            for candidate in candidates {
                match self.detect_candidate(&candidate) {
                    Ok(resolved) => return Ok(resolved),
                    Err(Error::FailedDetection) => continue,
                    Err(other) => return Err(other),
                }
            }
        }

        Err(Error::FailedDetection)
    }

    /// Flattens meta-buildpacks into a static list of candidate groups.
    ///
    /// The first meta-buildpack in the group is replaced by each of its
    /// nested groups in turn, the result is expanded again, and the
    /// candidates are returned in nested-order traversal order. Members
    /// spliced out of an optional meta-buildpack become optional themselves.
    fn expand(
        &self,
        members: &[GroupEntry],
    ) -> Result<Vec<Vec<(GroupEntry, BuildpackDescriptor)>>, Error> {
        self.expand_inner(members, &mut Vec::new())
    }

    fn expand_inner(
        &self,
        members: &[GroupEntry],
        expanding: &mut Vec<String>,
    ) -> Result<Vec<Vec<(GroupEntry, BuildpackDescriptor)>>, Error> {
        let mut resolved = Vec::new();

        for (position, entry) in members.iter().enumerate() {
            let descriptor = self.store.lookup(&entry.id, &entry.version)?;
            verify_buildpack_api(&descriptor)?;

            if !descriptor.is_meta() {
                resolved.push((entry.clone(), descriptor));
                continue;
            }

            let key = entry.to_string();
            if expanding.contains(&key) {
                return Err(Error::OrderCycle(key));
            }
            expanding.push(key);

            let mut candidates = Vec::new();
            for nested_group in &descriptor.order {
                let mut spliced = members[..position].to_vec();
                for nested_member in &nested_group.group {
                    let mut nested_member = nested_member.clone();
                    nested_member.optional = nested_member.optional || entry.optional;
                    spliced.push(nested_member);
                }
                spliced.extend_from_slice(&members[position + 1..]);

                candidates.extend(self.expand_inner(&spliced, expanding)?);
            }
            expanding.pop();

            return Ok(candidates);
        }

        Ok(vec![resolved])
    }

    fn detect_candidate(
        &self,
        candidate: &[(GroupEntry, BuildpackDescriptor)],
    ) -> Result<(BuildpackGroup, BuildPlan), Error> {
        self.run_detects(candidate);

        let results = self.classify(candidate)?;

        let mut try_count = 0;
        let (deps, trial) = self.run_trials(&results, Vec::new(), &mut try_count)?;

        if candidate.len() != trial.len() {
            self.logger.info(&format!(
                "{} of {} buildpacks participating",
                trial.len(),
                candidate.len()
            ));
        }

        let max_id_length = trial
            .iter()
            .map(|option| option.entry.id.len())
            .max()
            .unwrap_or(0);
        for option in &trial {
            self.logger.info(&format!(
                "{:max_id_length$} {}",
                option.entry.id.as_str(),
                option.entry.version
            ));
        }

        let group = BuildpackGroup {
            group: trial
                .iter()
                .map(|option| option.entry.clone().no_opt())
                .collect(),
        };
        let plan = deps.into_build_plan();

        Ok((group, plan))
    }

    /// Runs detect for every candidate member without a recorded outcome.
    /// The detects are independent and run concurrently.
    fn run_detects(&self, candidate: &[(GroupEntry, BuildpackDescriptor)]) {
        let todo: Vec<&(GroupEntry, BuildpackDescriptor)> = {
            let runs = self.lock_runs();
            candidate
                .iter()
                .filter(|(entry, _)| !runs.contains_key(&entry.to_string()))
                .collect()
        };

        let runner = self.runner;
        let config = &self.config;
        let runs = &self.runs;

        thread::scope(|scope| {
            for (entry, descriptor) in todo {
                scope.spawn(move || {
                    let run = runner.run_detect(descriptor, config);
                    runs.lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .insert(entry.to_string(), run);
                });
            }
        });
    }

    fn lock_runs(&self) -> std::sync::MutexGuard<'_, HashMap<String, DetectRun>> {
        self.runs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Classifies each member's detect outcome and keeps the passing ones.
    fn classify(
        &self,
        candidate: &[(GroupEntry, BuildpackDescriptor)],
    ) -> Result<Vec<DetectResult>, Error> {
        let runs = self.lock_runs();

        for (entry, _) in candidate {
            let run = runs
                .get(&entry.to_string())
                .ok_or_else(|| Error::MissingDetectRun(entry.to_string()))?;

            let output_is_noise = matches!(
                run.code,
                exit_code::CODE_DETECT_PASS | exit_code::CODE_DETECT_FAIL
            );
            let log = |message: &str| {
                if output_is_noise {
                    self.logger.debug(message);
                } else {
                    self.logger.info(message);
                }
            };

            if !run.stdout.is_empty() || !run.stderr.is_empty() {
                log(&format!("======== Output: {entry} ========"));
                if !run.stdout.is_empty() {
                    log(run.stdout.trim_end());
                }
                if !run.stderr.is_empty() {
                    log(run.stderr.trim_end());
                }
            }
            if let Some(err) = &run.err {
                log(&format!("======== Error: {entry} ========"));
                log(err);
            }
        }

        self.logger.debug("======== Results ========");

        let mut results = Vec::new();
        let mut detected = true;
        let mut buildpack_err = false;

        for (entry, _) in candidate {
            let run = &runs[&entry.to_string()];

            match run.code {
                exit_code::CODE_DETECT_PASS => {
                    self.logger.debug(&format!("pass: {entry}"));
                    results.push(DetectResult {
                        entry: entry.clone(),
                        run: run.clone(),
                    });
                }
                exit_code::CODE_DETECT_FAIL => {
                    if entry.optional {
                        self.logger.debug(&format!("skip: {entry}"));
                    } else {
                        self.logger.debug(&format!("fail: {entry}"));
                    }
                    detected = detected && entry.optional;
                }
                -1 => {
                    self.logger.info(&format!("err:  {entry}"));
                    buildpack_err = true;
                    detected = detected && entry.optional;
                }
                code => {
                    self.logger.info(&format!("err:  {entry} ({code})"));
                    buildpack_err = true;
                    detected = detected && entry.optional;
                }
            }
        }

        if !detected {
            if buildpack_err {
                return Err(Error::FailedDetectionWithErrors);
            }
            return Err(Error::FailedDetection);
        }

        Ok(results)
    }

    /// Depth-first backtracking over each passing buildpack's plan options.
    fn run_trials(
        &self,
        remaining: &[DetectResult],
        prefix: DetectTrial,
        try_count: &mut usize,
    ) -> Result<(DepMap, DetectTrial), Error> {
        if remaining.is_empty() {
            *try_count += 1;
            return self.run_trial(*try_count, prefix);
        }

        let mut last_err = None;
        for option in remaining[0].options() {
            let mut trial = prefix.clone();
            trial.push(option);

            match self.run_trials(&remaining[1..], trial, try_count) {
                Ok(resolved) => return Ok(resolved),
                Err(err) => last_err = Some(err),
            }
        }

        Err(last_err.unwrap_or(Error::FailedDetection))
    }

    /// Evaluates one concrete trial, repeatedly removing optional buildpacks
    /// with unmet requirements or unused provides until the trial is stable.
    fn run_trial(
        &self,
        try_count: usize,
        mut trial: DetectTrial,
    ) -> Result<(DepMap, DetectTrial), Error> {
        self.logger
            .debug(&format!("Resolving plan... (try #{try_count})"));

        loop {
            let deps = DepMap::new(&trial);
            let mut retry = false;

            for (name, entry) in deps.unmet_requires() {
                retry = true;
                if !entry.optional {
                    self.logger.debug(&format!("fail: {entry} requires {name}"));
                    return Err(Error::FailedDetection);
                }
                self.logger.debug(&format!("skip: {entry} requires {name}"));
                trial.retain(|option| option.entry != entry);
            }

            for (name, entry) in deps.unmet_provides() {
                retry = true;
                if !entry.optional {
                    self.logger
                        .debug(&format!("fail: {entry} provides unused {name}"));
                    return Err(Error::FailedDetection);
                }
                self.logger
                    .debug(&format!("skip: {entry} provides unused {name}"));
                trial.retain(|option| option.entry != entry);
            }

            if !retry {
                if trial.is_empty() {
                    self.logger.debug("fail: no viable buildpacks in group");
                    return Err(Error::FailedDetection);
                }
                return Ok((deps, trial));
            }
        }
    }
}

/// A buildpack that passed detection, with its emitted plan.
struct DetectResult {
    entry: GroupEntry,
    run: DetectRun,
}

impl DetectResult {
    /// The plan options this buildpack offers: its primary sections followed
    /// by its `or` alternatives. Only the last option of an optional
    /// buildpack keeps the `optional` flag, so a required buildpack must
    /// contribute one of its alternatives.
    fn options(&self) -> Vec<DetectOption> {
        let mut sections = vec![self.run.plan.sections()];
        sections.extend(self.run.plan.or.iter().cloned());

        let last = sections.len() - 1;
        sections
            .into_iter()
            .enumerate()
            .map(|(index, sections)| {
                let mut entry = self.entry.clone();
                entry.optional = entry.optional && index == last;
                DetectOption { entry, sections }
            })
            .collect()
    }
}

/// One concrete `(buildpack, plan sections)` choice inside a trial.
#[derive(Clone)]
struct DetectOption {
    entry: GroupEntry,
    sections: PlanSections,
}

type DetectTrial = Vec<DetectOption>;

#[derive(Default)]
struct DepEntry {
    providers: Vec<GroupEntry>,
    requires: Vec<Require>,
    extra_provides: Vec<GroupEntry>,
    early_requires: Vec<GroupEntry>,
}

/// Dependency state of one trial, keyed by dependency name.
///
/// Built by an ordered walk of the trial: each option's provides are
/// buffered in `extra_provides`, and a later require moves them into
/// `providers`. A require that finds no buffered provide is early (no
/// earlier buildpack provides it); a provide still buffered at the end is
/// unused. A trial is consistent iff both lists are empty for every name.
struct DepMap(BTreeMap<String, DepEntry>);

impl DepMap {
    fn new(trial: &[DetectOption]) -> Self {
        let mut map = Self(BTreeMap::new());

        for option in trial {
            for provide in &option.sections.provides {
                map.provide(&option.entry, &provide.name);
            }
            for require in &option.sections.requires {
                map.require(&option.entry, require);
            }
        }

        map
    }

    fn provide(&mut self, entry: &GroupEntry, name: &str) {
        self.0
            .entry(String::from(name))
            .or_default()
            .extra_provides
            .push(entry.clone());
    }

    fn require(&mut self, entry: &GroupEntry, require: &Require) {
        let dep_entry = self.0.entry(require.name.clone()).or_default();

        dep_entry.providers.append(&mut dep_entry.extra_provides);

        if dep_entry.providers.is_empty() {
            dep_entry.early_requires.push(entry.clone());
        } else {
            dep_entry.requires.push(require.clone());
        }
    }

    fn unmet_requires(&self) -> Vec<(String, GroupEntry)> {
        self.collect(|dep_entry| &dep_entry.early_requires)
    }

    fn unmet_provides(&self) -> Vec<(String, GroupEntry)> {
        self.collect(|dep_entry| &dep_entry.extra_provides)
    }

    fn collect(&self, select: impl Fn(&DepEntry) -> &Vec<GroupEntry>) -> Vec<(String, GroupEntry)> {
        let mut offenders = Vec::new();
        for (name, dep_entry) in &self.0 {
            for entry in select(dep_entry) {
                offenders.push((name.clone(), entry.clone()));
            }
        }
        offenders
    }

    fn into_build_plan(self) -> BuildPlan {
        BuildPlan {
            entries: self
                .0
                .into_values()
                .map(|dep_entry| {
                    BuildPlanEntry {
                        providers: dep_entry.providers,
                        requires: dep_entry.requires,
                    }
                    .no_opt()
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Env;
    use crate::log::MemoryLogger;
    use crate::runner::{BuildConfig, BuildResult};
    use lifecycle_data::api::ApiVersion;
    use lifecycle_data::build_plan::{DetectPlan, Provide};
    use lifecycle_data::buildpack::BuildpackInfo;
    use lifecycle_data::buildpack_plan::BuildpackPlan;
    use std::path::PathBuf;

    /// A buildpack store over a static set of descriptors.
    #[derive(Default)]
    struct FakeStore {
        descriptors: Vec<BuildpackDescriptor>,
    }

    impl FakeStore {
        fn with(mut self, descriptor: BuildpackDescriptor) -> Self {
            self.descriptors.push(descriptor);
            self
        }
    }

    impl BuildpackStore for FakeStore {
        fn lookup(&self, id: &lifecycle_data::buildpack::BuildpackId, version: &str) -> Result<BuildpackDescriptor, Error> {
            self.descriptors
                .iter()
                .find(|descriptor| {
                    descriptor.buildpack.id == *id && descriptor.buildpack.version == version
                })
                .cloned()
                .ok_or_else(|| Error::InvalidArgs(format!("unknown buildpack '{id}@{version}'")))
        }
    }

    /// A runner whose detect outcomes are scripted per buildpack id.
    #[derive(Default)]
    struct FakeRunner {
        runs: HashMap<String, DetectRun>,
    }

    impl FakeRunner {
        fn with(mut self, id: &str, run: DetectRun) -> Self {
            self.runs.insert(String::from(id), run);
            self
        }
    }

    impl BuildpackRunner for FakeRunner {
        fn run_detect(&self, descriptor: &BuildpackDescriptor, _: &DetectConfig) -> DetectRun {
            self.runs
                .get(descriptor.buildpack.id.as_str())
                .cloned()
                .unwrap_or(DetectRun {
                    code: 100,
                    ..DetectRun::default()
                })
        }

        fn run_build(
            &self,
            _: &BuildpackDescriptor,
            _: BuildpackPlan,
            _: &mut BuildConfig<'_>,
        ) -> Result<BuildResult, Error> {
            unimplemented!("detect tests never build")
        }
    }

    fn descriptor(id: &str) -> BuildpackDescriptor {
        BuildpackDescriptor {
            api: ApiVersion::new(0, 5),
            buildpack: BuildpackInfo {
                id: id.parse().unwrap(),
                name: None,
                version: String::from("1"),
                homepage: None,
                clear_env: false,
            },
            order: Vec::new(),
            dir: PathBuf::new(),
        }
    }

    fn meta_descriptor(id: &str, order: Vec<BuildpackGroup>) -> BuildpackDescriptor {
        let mut descriptor = descriptor(id);
        descriptor.order = order;
        descriptor
    }

    fn entry(id: &str) -> GroupEntry {
        GroupEntry::new(id.parse().unwrap(), "1")
    }

    fn optional_entry(id: &str) -> GroupEntry {
        let mut entry = entry(id);
        entry.optional = true;
        entry
    }

    fn group(entries: Vec<GroupEntry>) -> BuildpackGroup {
        BuildpackGroup { group: entries }
    }

    fn pass(plan: DetectPlan) -> DetectRun {
        DetectRun {
            code: 0,
            plan,
            ..DetectRun::default()
        }
    }

    fn provides(names: &[&str]) -> DetectPlan {
        DetectPlan {
            provides: names.iter().map(|name| Provide::new(*name)).collect(),
            ..DetectPlan::default()
        }
    }

    fn requires(names: &[&str]) -> DetectPlan {
        DetectPlan {
            requires: names.iter().map(|name| Require::new(*name)).collect(),
            ..DetectPlan::default()
        }
    }

    fn provides_and_requires(name: &str) -> DetectPlan {
        DetectPlan {
            provides: vec![Provide::new(name)],
            requires: vec![Require::new(name)],
            ..DetectPlan::default()
        }
    }

    fn config() -> DetectConfig {
        DetectConfig {
            app_dir: PathBuf::from("/app"),
            platform_dir: PathBuf::from("/platform"),
            full_env: Env::new(),
            clear_env: Env::new(),
        }
    }

    #[test]
    fn self_satisfied_buildpack_detects() {
        let store = FakeStore::default().with(descriptor("a"));
        let runner = FakeRunner::default().with("a", pass(provides_and_requires("water")));
        let logger = MemoryLogger::new();
        let detector = Detector::new(config(), &store, &runner, &logger);

        let (group, plan) = detector.detect(&[group(vec![entry("a")])]).unwrap();

        assert_eq!(group.group, [entry("a")]);
        assert_eq!(plan.entries.len(), 1);
        assert_eq!(plan.entries[0].providers, [entry("a")]);
        assert_eq!(plan.entries[0].requires, [Require::new("water")]);
    }

    #[test]
    fn unused_provide_of_required_buildpack_fails_detection() {
        let store = FakeStore::default().with(descriptor("a"));
        let runner = FakeRunner::default().with("a", pass(provides(&["water"])));
        let logger = MemoryLogger::new();
        let detector = Detector::new(config(), &store, &runner, &logger);

        let result = detector.detect(&[group(vec![entry("a")])]);

        assert!(matches!(result, Err(Error::FailedDetection)));
        assert!(logger.contains("provides unused water"));
    }

    #[test]
    fn require_before_provide_fails_detection() {
        let store = FakeStore::default()
            .with(descriptor("a"))
            .with(descriptor("b"));
        let runner = FakeRunner::default()
            .with("a", pass(requires(&["water"])))
            .with("b", pass(provides(&["water"])));
        let logger = MemoryLogger::new();
        let detector = Detector::new(config(), &store, &runner, &logger);

        let result = detector.detect(&[group(vec![entry("a"), entry("b")])]);

        assert!(matches!(result, Err(Error::FailedDetection)));
        assert!(logger.contains("requires water"));
    }

    #[test]
    fn provide_before_require_detects() {
        let store = FakeStore::default()
            .with(descriptor("a"))
            .with(descriptor("b"));
        let runner = FakeRunner::default()
            .with("a", pass(provides(&["water"])))
            .with("b", pass(requires(&["water"])));
        let logger = MemoryLogger::new();
        let detector = Detector::new(config(), &store, &runner, &logger);

        let (group, plan) = detector
            .detect(&[group(vec![entry("a"), entry("b")])])
            .unwrap();

        assert_eq!(group.group, [entry("a"), entry("b")]);
        assert_eq!(plan.entries[0].providers, [entry("a")]);
        assert_eq!(plan.entries[0].requires, [Require::new("water")]);
    }

    #[test]
    fn optional_buildpack_with_unused_alternative_is_skipped() {
        let store = FakeStore::default()
            .with(descriptor("a"))
            .with(descriptor("b"))
            .with(descriptor("c"));
        let runner = FakeRunner::default()
            .with("a", pass(provides(&["water"])))
            .with(
                "b",
                pass(DetectPlan {
                    provides: vec![Provide::new("unused")],
                    or: vec![PlanSections {
                        provides: vec![Provide::new("bar")],
                        requires: Vec::new(),
                    }],
                    ..DetectPlan::default()
                }),
            )
            .with("c", pass(requires(&["water"])));
        let logger = MemoryLogger::new();
        let detector = Detector::new(config(), &store, &runner, &logger);

        let (group, plan) = detector
            .detect(&[group(vec![entry("a"), optional_entry("b"), entry("c")])])
            .unwrap();

        assert_eq!(group.group, [entry("a"), entry("c")]);
        assert_eq!(plan.entries.len(), 1);
        assert!(logger.contains("2 of 3 buildpacks participating"));
    }

    #[test]
    fn meta_buildpack_candidates_are_tried_in_order() {
        let store = FakeStore::default()
            .with(meta_descriptor(
                "m",
                vec![group(vec![entry("a")]), group(vec![entry("b")])],
            ))
            .with(descriptor("a"))
            .with(descriptor("b"))
            .with(descriptor("c"));
        let runner = FakeRunner::default()
            .with("a", DetectRun { code: 100, ..DetectRun::default() })
            .with("b", pass(provides_and_requires("water")))
            .with("c", pass(requires(&["water"])));
        let logger = MemoryLogger::new();
        let detector = Detector::new(config(), &store, &runner, &logger);

        let (group, _) = detector
            .detect(&[group(vec![entry("m"), entry("c")])])
            .unwrap();

        assert_eq!(group.group, [entry("b"), entry("c")]);
    }

    #[test]
    fn meta_buildpack_optionality_is_inherited() {
        let store = FakeStore::default()
            .with(meta_descriptor("m", vec![group(vec![entry("a")])]))
            .with(descriptor("a"))
            .with(descriptor("b"));
        let runner = FakeRunner::default()
            .with("a", DetectRun { code: 100, ..DetectRun::default() })
            .with("b", pass(provides_and_requires("water")));
        let logger = MemoryLogger::new();
        let detector = Detector::new(config(), &store, &runner, &logger);

        // `a` fails detection, but since it was spliced out of an optional
        // meta-buildpack the group still detects with `b` alone.
        let (group, _) = detector
            .detect(&[group(vec![optional_entry("m"), entry("b")])])
            .unwrap();

        assert_eq!(group.group, [entry("b")]);
    }

    #[test]
    fn meta_buildpack_cycles_are_rejected() {
        let store = FakeStore::default()
            .with(meta_descriptor("m", vec![group(vec![entry("n")])]))
            .with(meta_descriptor("n", vec![group(vec![entry("m")])]));
        let runner = FakeRunner::default();
        let logger = MemoryLogger::new();
        let detector = Detector::new(config(), &store, &runner, &logger);

        let result = detector.detect(&[group(vec![entry("m")])]);

        assert!(matches!(result, Err(Error::OrderCycle(_))));
    }

    #[test]
    fn second_group_is_tried_after_failed_detection() {
        let store = FakeStore::default()
            .with(descriptor("a"))
            .with(descriptor("b"));
        let runner = FakeRunner::default()
            .with("a", DetectRun { code: 100, ..DetectRun::default() })
            .with("b", pass(provides_and_requires("water")));
        let logger = MemoryLogger::new();
        let detector = Detector::new(config(), &store, &runner, &logger);

        let (group, _) = detector
            .detect(&[group(vec![entry("a")]), group(vec![entry("b")])])
            .unwrap();

        assert_eq!(group.group, [entry("b")]);
    }

    #[test]
    fn required_buildpack_error_fails_with_buildpack_error() {
        let store = FakeStore::default().with(descriptor("a"));
        let runner = FakeRunner::default().with(
            "a",
            DetectRun {
                code: 3,
                err: Some(String::from("boom")),
                ..DetectRun::default()
            },
        );
        let logger = MemoryLogger::new();
        let detector = Detector::new(config(), &store, &runner, &logger);

        let result = detector.detect(&[group(vec![entry("a")])]);

        assert!(matches!(result, Err(Error::FailedDetectionWithErrors)));
        assert!(logger.contains("err:  a@1 (3)"));
    }

    #[test]
    fn optional_buildpack_error_is_skipped() {
        let store = FakeStore::default()
            .with(descriptor("a"))
            .with(descriptor("b"));
        let runner = FakeRunner::default()
            .with("a", DetectRun { code: 3, ..DetectRun::default() })
            .with("b", pass(provides_and_requires("water")));
        let logger = MemoryLogger::new();
        let detector = Detector::new(config(), &store, &runner, &logger);

        let (group, _) = detector
            .detect(&[group(vec![optional_entry("a"), entry("b")])])
            .unwrap();

        assert_eq!(group.group, [entry("b")]);
    }

    #[test]
    fn resolved_group_strips_optionality() {
        let store = FakeStore::default()
            .with(descriptor("a"))
            .with(descriptor("b"));
        let runner = FakeRunner::default()
            .with("a", pass(provides_and_requires("water")))
            .with("b", pass(requires(&["water"])));
        let logger = MemoryLogger::new();
        let detector = Detector::new(config(), &store, &runner, &logger);

        let (group, plan) = detector
            .detect(&[group(vec![entry("a"), optional_entry("b")])])
            .unwrap();

        assert!(group.group.iter().all(|member| !member.optional));
        assert!(plan
            .entries
            .iter()
            .flat_map(|plan_entry| plan_entry.providers.iter())
            .all(|provider| !provider.optional));
    }

    #[test]
    fn detection_is_deterministic() {
        let store = FakeStore::default()
            .with(descriptor("a"))
            .with(descriptor("b"))
            .with(descriptor("c"));
        let runner = FakeRunner::default()
            .with("a", pass(provides(&["water", "tea"])))
            .with("b", pass(requires(&["tea"])))
            .with("c", pass(requires(&["water"])));
        let logger = MemoryLogger::new();

        let order = [group(vec![entry("a"), entry("b"), entry("c")])];

        let first = Detector::new(config(), &store, &runner, &logger)
            .detect(&order)
            .unwrap();
        let second = Detector::new(config(), &store, &runner, &logger)
            .detect(&order)
            .unwrap();

        assert_eq!(first.0, second.0);
        assert_eq!(first.1, second.1);
    }

    #[test]
    fn dep_map_orders_provides_before_requires_per_option() {
        // A single option that both provides and requires the same name
        // satisfies itself.
        let trial = vec![DetectOption {
            entry: entry("a"),
            sections: PlanSections {
                provides: vec![Provide::new("water")],
                requires: vec![Require::new("water")],
            },
        }];

        let deps = DepMap::new(&trial);

        assert!(deps.unmet_requires().is_empty());
        assert!(deps.unmet_provides().is_empty());
    }

    #[test]
    fn dep_map_flags_unused_provides() {
        let trial = vec![DetectOption {
            entry: entry("a"),
            sections: PlanSections {
                provides: vec![Provide::new("water")],
                requires: Vec::new(),
            },
        }];

        let deps = DepMap::new(&trial);

        assert_eq!(deps.unmet_provides().len(), 1);
    }
}
