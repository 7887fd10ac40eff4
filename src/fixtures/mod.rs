//! Fixture utilities for the deterministic CLI harness.
//!
//! A fixture is a recorded pose trace (`<name>.trace.json`): the per-frame
//! head angles, hand shape and landmark confidences a vision pipeline would
//! have produced, optionally with the config it was tuned for and the
//! gestures it must yield. Replay applies the confidence floors the vision
//! collaborator would apply, then drives the samples through an
//! `EngineHandle` exactly as the live frame loop does.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::{GestureEvent, GestureKind, GesturePhase, HandShape, PoseSample};
use crate::config::{AppConfig, DetectionConfig, MediapipeConfig};
use crate::engine::EngineHandle;

/// Default location for pose-trace assets.
pub const DEFAULT_FIXTURE_ROOT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures");

const TRACE_SUFFIX: &str = ".trace.json";
const EXPECT_SUFFIX: &str = ".expect.json";

/// Metadata describing an available fixture.
#[derive(Clone, Debug)]
pub struct FixtureMetadata {
    pub name: String,
    pub trace_path: PathBuf,
    pub expect_path: Option<PathBuf>,
}

/// Loaded fixture: the trace plus whichever expectations apply.
pub struct FixtureData {
    pub metadata: FixtureMetadata,
    pub trace: PoseTrace,
    pub expectations: Option<FixtureExpectations>,
}

/// Recorded pose trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoseTrace {
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
    /// Detection settings the trace was recorded against
    #[serde(default)]
    pub config: Option<DetectionConfig>,
    #[serde(default)]
    pub mediapipe: Option<MediapipeConfig>,
    pub samples: Vec<TraceSample>,
    /// Inline expectations, used when no `.expect.json` sidecar exists
    #[serde(default)]
    pub expect: Option<Vec<ExpectedGesture>>,
}

/// One recorded frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceSample {
    pub t_ms: u64,
    pub pitch: f64,
    pub yaw: f64,
    #[serde(default)]
    pub hand: HandShape,
    #[serde(default)]
    pub hand_x: Option<f64>,
    /// Face landmark confidence; absent means fully confident
    #[serde(default)]
    pub face_confidence: Option<f32>,
    #[serde(default)]
    pub hand_confidence: Option<f32>,
    /// Host sent a recalibrate command just before this frame
    #[serde(default)]
    pub recalibrate: bool,
}

/// What the vision collaborator hands the engine for one recorded frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GatedSample {
    /// Face below the detection floor; the frame never reaches the engine
    Dropped,
    /// Frame delivered; `demoted_hand` is set when the hand was discarded
    Delivered {
        sample: PoseSample,
        demoted_hand: bool,
    },
}

impl TraceSample {
    /// Apply the detector confidence floors to this frame.
    pub fn gate(&self, mediapipe: &MediapipeConfig) -> GatedSample {
        let face = self.face_confidence.unwrap_or(1.0);
        if face < mediapipe.face_mesh.min_detection_confidence {
            return GatedSample::Dropped;
        }

        let sample = PoseSample::head(self.pitch, self.yaw, self.t_ms);
        let hand_confident = self
            .hand_confidence
            .map_or(true, |c| c >= mediapipe.hands.min_detection_confidence);

        if hand_confident {
            GatedSample::Delivered {
                sample: sample.with_hand(self.hand, self.hand_x),
                demoted_hand: false,
            }
        } else {
            GatedSample::Delivered {
                sample,
                demoted_hand: self.hand != HandShape::None,
            }
        }
    }
}

/// JSON expectation schema for fixture verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureExpectations {
    pub fixture: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub events: Vec<ExpectedGesture>,
}

impl FixtureExpectations {
    pub fn verify(&self, actual: &[GestureEvent]) -> std::result::Result<(), ExpectationDiff> {
        let mut failures = Vec::new();

        for (idx, expected) in self.events.iter().enumerate() {
            match actual.get(idx) {
                Some(event) => {
                    let delta = event.timestamp_ms.abs_diff(expected.t_ms);
                    if event.kind != expected.gesture
                        || event.phase != expected.phase
                        || delta > expected.tolerance_ms
                    {
                        failures.push(ExpectationFailure {
                            index: idx,
                            expected: Some(expected.clone()),
                            actual: Some(*event),
                            delta_ms: Some(delta),
                        });
                    }
                }
                None => failures.push(ExpectationFailure {
                    index: idx,
                    expected: Some(expected.clone()),
                    actual: None,
                    delta_ms: None,
                }),
            }
        }

        for (idx, event) in actual.iter().enumerate().skip(self.events.len()) {
            failures.push(ExpectationFailure {
                index: idx,
                expected: None,
                actual: Some(*event),
                delta_ms: None,
            });
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ExpectationDiff { failures })
        }
    }
}

/// Expected gesture event definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedGesture {
    pub gesture: GestureKind,
    #[serde(default)]
    pub phase: GesturePhase,
    pub t_ms: u64,
    #[serde(default)]
    pub tolerance_ms: u64,
}

/// Outcome of comparing actual events with expectations.
#[derive(Debug)]
pub struct ExpectationDiff {
    pub failures: Vec<ExpectationFailure>,
}

impl ExpectationDiff {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "failures": self.failures.iter().map(|failure| {
                serde_json::json!({
                    "index": failure.index,
                    "expected": failure.expected,
                    "actual": failure.actual,
                    "delta_ms": failure.delta_ms,
                })
            }).collect::<Vec<_>>()
        })
    }
}

/// Detailed diff entry for a single failure.
#[derive(Debug)]
pub struct ExpectationFailure {
    pub index: usize,
    /// `None` when the engine emitted more events than expected
    pub expected: Option<ExpectedGesture>,
    pub actual: Option<GestureEvent>,
    pub delta_ms: Option<u64>,
}

/// Catalog responsible for discovering fixtures on disk.
pub struct FixtureCatalog {
    root: PathBuf,
}

impl FixtureCatalog {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List all fixtures by their metadata.
    pub fn discover(&self) -> Result<Vec<FixtureMetadata>> {
        let mut fixtures = Vec::new();
        if !self.root.exists() {
            return Ok(fixtures);
        }

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                let path = entry.path();
                if trace_name(&path).is_some() {
                    fixtures.push(self.metadata_for_path(&path)?);
                }
            }
        }

        fixtures.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(fixtures)
    }

    /// Load trace + expectations for provided name or path.
    ///
    /// Expectations come from `override_expect`, else the `.expect.json`
    /// sidecar, else the trace's inline `expect` list.
    pub fn load(&self, fixture: &str, override_expect: Option<PathBuf>) -> Result<FixtureData> {
        let trace_path = self.resolve_fixture_path(fixture)?;
        let metadata = self.metadata_for_path(&trace_path)?;

        let json = fs::read_to_string(&trace_path)
            .with_context(|| format!("reading trace {}", trace_path.display()))?;
        let trace: PoseTrace = serde_json::from_str(&json)
            .with_context(|| format!("parsing {}", trace_path.display()))?;

        let expectation_path = override_expect.or(metadata.expect_path.clone());
        let expectations = match expectation_path {
            Some(path) => {
                let json = fs::read_to_string(&path)
                    .with_context(|| format!("reading expectation {}", path.display()))?;
                Some(
                    serde_json::from_str(&json)
                        .with_context(|| format!("parsing {}", path.display()))?,
                )
            }
            None => trace.expect.clone().map(|events| FixtureExpectations {
                fixture: trace.name.clone(),
                notes: None,
                events,
            }),
        };

        Ok(FixtureData {
            metadata,
            trace,
            expectations,
        })
    }

    fn resolve_fixture_path(&self, fixture: &str) -> Result<PathBuf> {
        let as_path = Path::new(fixture);
        if as_path.is_file() {
            return Ok(as_path.to_path_buf());
        }

        let candidate = self.root.join(format!("{fixture}{TRACE_SUFFIX}"));
        if candidate.exists() {
            Ok(candidate)
        } else {
            Err(anyhow!(
                "Fixture '{fixture}' not found in {}",
                self.root.display()
            ))
        }
    }

    fn metadata_for_path(&self, trace_path: &Path) -> Result<FixtureMetadata> {
        let name = trace_name(trace_path)
            .ok_or_else(|| anyhow!("Invalid fixture name for {}", trace_path.display()))?;
        let expect_path = trace_path.with_file_name(format!("{name}{EXPECT_SUFFIX}"));
        Ok(FixtureMetadata {
            name,
            trace_path: trace_path.to_path_buf(),
            expect_path: expect_path.exists().then_some(expect_path),
        })
    }
}

impl Default for FixtureCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_FIXTURE_ROOT)
    }
}

fn trace_name(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let name = file_name.strip_suffix(TRACE_SUFFIX)?;
    (!name.is_empty()).then(|| name.to_string())
}

/// Result of replaying one trace.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub fixture: String,
    pub samples_total: usize,
    /// Frames below the face detection floor
    pub samples_dropped: usize,
    /// Frames whose hand was discarded for low confidence
    pub hands_demoted: usize,
    pub events: Vec<GestureEvent>,
}

/// Replays pose traces through an `EngineHandle`.
pub struct TraceRunner {
    detection: DetectionConfig,
    mediapipe: MediapipeConfig,
}

impl TraceRunner {
    pub fn new(app_config: &AppConfig) -> Self {
        Self {
            detection: app_config.detection.clone(),
            mediapipe: app_config.mediapipe.clone(),
        }
    }

    /// Replay a trace, invoking `on_event` for every event as it is emitted.
    ///
    /// Settings embedded in the trace take precedence over the runner's.
    pub fn run_with<F>(&self, trace: &PoseTrace, mut on_event: F) -> Result<ReplayReport>
    where
        F: FnMut(&GestureEvent),
    {
        let detection = trace.config.as_ref().unwrap_or(&self.detection);
        let mediapipe = trace.mediapipe.as_ref().unwrap_or(&self.mediapipe);
        mediapipe
            .validate()
            .with_context(|| format!("mediapipe settings for {}", trace.name))?;
        let handle = EngineHandle::new(detection)
            .with_context(|| format!("detection settings for {}", trace.name))?;

        let mut report = ReplayReport {
            fixture: trace.name.clone(),
            samples_total: trace.samples.len(),
            samples_dropped: 0,
            hands_demoted: 0,
            events: Vec::new(),
        };

        for recorded in &trace.samples {
            if recorded.recalibrate {
                handle.recalibrate()?;
            }

            let sample = match recorded.gate(mediapipe) {
                GatedSample::Dropped => {
                    report.samples_dropped += 1;
                    continue;
                }
                GatedSample::Delivered {
                    sample,
                    demoted_hand,
                } => {
                    if demoted_hand {
                        report.hands_demoted += 1;
                    }
                    sample
                }
            };

            for event in &handle.tick(&sample)? {
                on_event(event);
                report.events.push(*event);
            }
        }

        tracing::info!(
            "[TraceRunner] {}: {} samples, {} dropped, {} events",
            report.fixture,
            report.samples_total,
            report.samples_dropped,
            report.events.len()
        );
        Ok(report)
    }

    pub fn run(&self, trace: &PoseTrace) -> Result<ReplayReport> {
        self.run_with(trace, |_| {})
    }
}
