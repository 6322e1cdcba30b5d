use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// Wall-clock time spent in one named stage.
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: String,
    #[serde(rename = "millis", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

/// Ordered per-stage timings for one request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StageTimings {
    steps: Vec<StepTiming>,
    #[serde(skip)]
    step_map: HashMap<String, Duration>,
}

impl StageTimings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_step(&mut self, name: impl Into<String>, duration: Duration) {
        let name = name.into();
        debug!(stage = %name, millis = duration.as_secs_f64() * 1000.0, "stage finished");
        *self.step_map.entry(name.clone()).or_insert(Duration::ZERO) += duration;
        self.steps.push(StepTiming { name, duration });
    }

    /// Appends every step of `other`, prefixing its names with `prefix.`.
    pub fn extend_prefixed(&mut self, prefix: &str, other: &StageTimings) {
        for step in &other.steps {
            self.add_step(format!("{}.{}", prefix, step.name), step.duration);
        }
    }

    /// Runs `f` and records how long it took under `name`.
    pub fn time<T>(&mut self, name: &str, f: impl FnOnce() -> T) -> T {
        let timer = Timer::start(name);
        let value = f();
        let (name, duration) = timer.stop();
        self.add_step(name, duration);
        value
    }

    pub fn total_duration(&self) -> Duration {
        self.steps.iter().map(|s| s.duration).sum()
    }

    pub fn get_step(&self, name: &str) -> Option<Duration> {
        self.step_map.get(name).copied()
    }

    pub fn steps(&self) -> &[StepTiming] {
        &self.steps
    }
}

pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    pub fn stop(self) -> (String, Duration) {
        (self.name, self.start.elapsed())
    }
}

fn serialize_millis<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
}
