use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};

use crate::models::integrity::{PointerSample, SignalEvent};

const MAX_SAMPLES: usize = 256;

/// Trajectory classification: `is_valid` is the plausibility verdict,
/// `confidence` in [0, 1] grows as the rolling window fills past the
/// calibrated minimum.
#[derive(Debug, Clone, Copy)]
pub struct MotionAssessment {
    pub is_valid: bool,
    pub confidence: f64,
}

/// Classifies recent pointer trajectories. Scripted pointers tend to
/// move in near-perfect lines at near-constant speed; human motion has
/// curvature and speed jitter. The controller only reacts to an invalid
/// verdict below the confidence floor, so imprecise classifications
/// never feed the termination score.
#[derive(Debug)]
pub struct MotionAnomalyDetector {
    window: Duration,
    min_samples: usize,
    confidence_floor: f64,
    samples: VecDeque<PointerSample>,
}

impl MotionAnomalyDetector {
    pub fn new(window: Duration, min_samples: usize, confidence_floor: f64) -> Self {
        Self {
            window,
            min_samples: min_samples.max(3),
            confidence_floor,
            samples: VecDeque::new(),
        }
    }

    pub fn push(&mut self, sample: PointerSample) {
        self.prune(sample.at);
        self.samples.push_back(sample);
        if self.samples.len() > MAX_SAMPLES {
            self.samples.pop_front();
        }
    }

    /// Classify the current window. None until enough samples arrived.
    pub fn assess(&mut self, now: DateTime<Utc>) -> Option<MotionAssessment> {
        self.prune(now);
        let n = self.samples.len();
        if n < self.min_samples {
            return None;
        }

        let (path_length, displacement, speeds) = self.trajectory_metrics();
        if path_length <= f64::EPSILON || speeds.len() < 2 {
            // A motionless pointer is not evidence either way.
            return None;
        }

        let straightness = displacement / path_length;
        let speed_cv = coefficient_of_variation(&speeds);
        let is_valid = straightness <= 0.98 && speed_cv >= 0.05;

        let confidence =
            ((n - self.min_samples) as f64 / self.min_samples as f64).clamp(0.0, 1.0);

        tracing::debug!(
            "Motion assessment: samples={}, straightness={:.3}, speed_cv={:.3}, valid={}, confidence={:.2}",
            n,
            straightness,
            speed_cv,
            is_valid,
            confidence
        );

        Some(MotionAssessment {
            is_valid,
            confidence,
        })
    }

    /// Cadence hook: emits an anomaly event only for the combination the
    /// controller acts on (invalid below the confidence floor), so every
    /// emitted event produces a warning.
    pub fn classify(&mut self, now: DateTime<Utc>) -> Option<SignalEvent> {
        let assessment = self.assess(now)?;
        if !assessment.is_valid && assessment.confidence < self.confidence_floor {
            Some(SignalEvent::MotionAnomaly {
                is_valid: assessment.is_valid,
                confidence: assessment.confidence,
                at: now,
            })
        } else {
            None
        }
    }

    fn trajectory_metrics(&self) -> (f64, f64, Vec<f64>) {
        let mut path_length = 0.0;
        let mut speeds = Vec::with_capacity(self.samples.len());

        for pair in self.samples.iter().zip(self.samples.iter().skip(1)) {
            let (a, b) = pair;
            let segment = ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt();
            path_length += segment;
            let dt = (b.at - a.at).num_milliseconds() as f64 / 1000.0;
            if dt > 0.0 {
                speeds.push(segment / dt);
            }
        }

        let displacement = match (self.samples.front(), self.samples.back()) {
            (Some(first), Some(last)) => {
                ((last.x - first.x).powi(2) + (last.y - first.y).powi(2)).sqrt()
            }
            _ => 0.0,
        };

        (path_length, displacement, speeds)
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.window;
        while self.samples.front().is_some_and(|s| s.at < cutoff) {
            self.samples.pop_front();
        }
    }
}

fn coefficient_of_variation(values: &[f64]) -> f64 {
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    if mean <= f64::EPSILON {
        return 0.0;
    }
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt() / mean
}
