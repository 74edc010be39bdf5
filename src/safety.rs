//! Safety classification.
//!
//! Two independent classification paths run every cycle:
//!
//! 1. **Per-metric** — each metric against its own survival band, with an
//!    inner warning margin of 20 % of the band width on both sides:
//!
//!    ```text
//!    CRITICAL | WARNING |     NORMAL      | WARNING | CRITICAL
//!           min     min+m               max-m     max
//!    ```
//!
//! 2. **Organism health** — water temperature, pH and EC together against
//!    a wide survival set and a narrower, hand-tuned comfort set. This is
//!    *not* the worst of the per-metric severities: the comfort limits are
//!    deliberately tighter than the per-metric bars, so the two paths can
//!    disagree at the boundaries.
//!
//! Unknown is never safe. An unavailable or non-finite value classifies
//! CRITICAL, and so does any value checked against a malformed band.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Fraction of the band width used as the inner warning margin.
pub const WARNING_MARGIN_FRACTION: f32 = 0.2;

// ───────────────────────────────────────────────────────────────
// Severity
// ───────────────────────────────────────────────────────────────

/// Ordered safety level: `Critical > Warning > Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Normal,
    Warning,
    Critical,
}

impl Severity {
    /// Worst severity of the set; `Normal` for an empty set.
    pub fn worst(levels: impl IntoIterator<Item = Severity>) -> Severity {
        levels.into_iter().max().unwrap_or(Severity::Normal)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL"),
            Self::Warning => write!(f, "WARNING"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// ThresholdBand
// ───────────────────────────────────────────────────────────────

/// Inclusive safe range `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdBand {
    pub min: f32,
    pub max: f32,
}

impl ThresholdBand {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Finite bounds with `min < max`.
    pub fn is_well_formed(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.max - self.min > 0.0
    }

    /// Width of the inner warning zone on each side.
    pub fn margin(&self) -> f32 {
        (self.max - self.min) * WARNING_MARGIN_FRACTION
    }

    /// Inclusive membership test. Always false for a malformed band or a
    /// missing/non-finite value.
    pub fn contains(&self, value: Option<f32>) -> bool {
        match value {
            Some(v) if v.is_finite() && self.is_well_formed() => {
                v >= self.min && v <= self.max
            }
            _ => false,
        }
    }
}

/// Classify one metric against its band.
pub fn classify(value: Option<f32>, band: &ThresholdBand) -> Severity {
    let Some(v) = value.filter(|v| v.is_finite()) else {
        return Severity::Critical;
    };
    if !band.is_well_formed() {
        return Severity::Critical;
    }
    if v < band.min || v > band.max {
        return Severity::Critical;
    }
    let margin = band.margin();
    if v < band.min + margin || v > band.max - margin {
        return Severity::Warning;
    }
    Severity::Normal
}

// ───────────────────────────────────────────────────────────────
// Per-metric bands
// ───────────────────────────────────────────────────────────────

/// Survival bands for the individually displayed metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricBands {
    /// Averaged water temperature (°C).
    pub water_temperature: ThresholdBand,
    /// pH.
    pub ph: ThresholdBand,
    /// Electrical conductivity (µS/cm).
    pub conductivity: ThresholdBand,
}

impl MetricBands {
    pub const DEFAULT: Self = Self {
        water_temperature: ThresholdBand::new(18.0, 28.0),
        ph: ThresholdBand::new(6.2, 7.2),
        conductivity: ThresholdBand::new(500.0, 1500.0),
    };
}

impl Default for MetricBands {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ───────────────────────────────────────────────────────────────
// Organism health
// ───────────────────────────────────────────────────────────────

/// One set of organism-health limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthLimits {
    pub water_temperature: ThresholdBand,
    pub ph: ThresholdBand,
    pub conductivity: ThresholdBand,
}

impl HealthLimits {
    fn admits(&self, water_temp: Option<f32>, ph: Option<f32>, ec: Option<f32>) -> bool {
        self.water_temperature.contains(water_temp)
            && self.ph.contains(ph)
            && self.conductivity.contains(ec)
    }

    fn is_well_formed(&self) -> bool {
        self.water_temperature.is_well_formed()
            && self.ph.is_well_formed()
            && self.conductivity.is_well_formed()
    }
}

/// Survival and comfort limits for the fish.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrganismBands {
    /// Outside any of these: CRITICAL.
    pub survival: HealthLimits,
    /// Outside any of these (but inside survival): WARNING.
    pub comfort: HealthLimits,
}

impl OrganismBands {
    /// EC has no separate comfort zone, so its comfort limits equal survival.
    pub const DEFAULT: Self = Self {
        survival: HealthLimits {
            water_temperature: ThresholdBand::new(18.0, 28.0),
            ph: ThresholdBand::new(6.0, 7.5),
            conductivity: ThresholdBand::new(400.0, 1600.0),
        },
        comfort: HealthLimits {
            water_temperature: ThresholdBand::new(20.0, 26.0),
            ph: ThresholdBand::new(6.4, 7.2),
            conductivity: ThresholdBand::new(400.0, 1600.0),
        },
    };

    /// Combined organism-health severity. Any malformed limit, survival or
    /// comfort, makes the result CRITICAL.
    pub fn classify(&self, water_temp: Option<f32>, ph: Option<f32>, ec: Option<f32>) -> Severity {
        if !self.survival.is_well_formed() || !self.comfort.is_well_formed() {
            Severity::Critical
        } else if !self.survival.admits(water_temp, ph, ec) {
            Severity::Critical
        } else if !self.comfort.admits(water_temp, ph, ec) {
            Severity::Warning
        } else {
            Severity::Normal
        }
    }
}

impl Default for OrganismBands {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Organism-health severity against the default fish limits.
pub fn classify_organism_health(water_temp: Option<f32>, ph: Option<f32>, ec: Option<f32>) -> Severity {
    OrganismBands::DEFAULT.classify(water_temp, ph, ec)
}

// ───────────────────────────────────────────────────────────────
// Health score
// ───────────────────────────────────────────────────────────────

/// 0–100 score for one metric against its band.
///
/// 100 in the normal zone, falling linearly to 50 at the band edge, 0
/// outside the band or against a malformed one. `None` when the value is
/// unavailable or non-finite.
pub fn metric_score(value: Option<f32>, band: &ThresholdBand) -> Option<u8> {
    let v = value.filter(|v| v.is_finite())?;
    if !band.is_well_formed() || v < band.min || v > band.max {
        return Some(0);
    }
    let margin = band.margin();
    let distance = if v < band.min + margin {
        band.min + margin - v
    } else if v > band.max - margin {
        v - (band.max - margin)
    } else {
        0.0
    };
    let score = 100.0 - (distance / margin) * 50.0;
    Some(score.round().clamp(0.0, 100.0) as u8)
}

/// Mean of the available metric scores for water temperature, pH and EC.
/// `None` when none of the three is available.
pub fn health_score(
    bands: &MetricBands,
    water_temp: Option<f32>,
    ph: Option<f32>,
    ec: Option<f32>,
) -> Option<u8> {
    let scores = [
        metric_score(water_temp, &bands.water_temperature),
        metric_score(ph, &bands.ph),
        metric_score(ec, &bands.conductivity),
    ];
    let (sum, n) = scores
        .into_iter()
        .flatten()
        .fold((0u16, 0u16), |(sum, n), s| (sum + u16::from(s), n + 1));
    (n > 0).then(|| (f32::from(sum) / f32::from(n)).round() as u8)
}

// ───────────────────────────────────────────────────────────────
// Per-cycle report
// ───────────────────────────────────────────────────────────────

/// Every severity computed in one cycle, plus the health score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityReport {
    pub water_temperature: Severity,
    pub ph: Severity,
    pub conductivity: Severity,
    pub organism: Severity,
    /// Worst of the four above.
    pub overall: Severity,
    /// 0–100 summary of the per-metric positions; `None` with no water data.
    pub health_score: Option<u8>,
}

impl SeverityReport {
    /// Run both classification paths over one cycle's values.
    pub fn evaluate(
        bands: &MetricBands,
        organism: &OrganismBands,
        water_temp: Option<f32>,
        ph: Option<f32>,
        ec: Option<f32>,
    ) -> Self {
        let water_temperature = classify(water_temp, &bands.water_temperature);
        let ph_level = classify(ph, &bands.ph);
        let conductivity = classify(ec, &bands.conductivity);
        let organism = organism.classify(water_temp, ph, ec);
        Self {
            water_temperature,
            ph: ph_level,
            conductivity,
            organism,
            overall: Severity::worst([water_temperature, ph_level, conductivity, organism]),
            health_score: health_score(bands, water_temp, ph, ec),
        }
    }
}
