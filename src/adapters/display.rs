//! Dashboard adapter.
//!
//! Implements [`DisplayPort`]. Each cycle is composed into a
//! [`DashboardFrame`] (text lines, three range bars, the fish indicator,
//! the health score) and written to a text console. Bars span the configured per-metric
//! bands; their colour follows the metric's severity, the fish follows
//! organism health.

use core::fmt::{self, Write};

use log::{info, warn};

use crate::app::ports::{DashboardView, DisplayError, DisplayPort};
use crate::safety::{MetricBands, Severity, ThresholdBand};

/// Bar outline width in pixels; the fill area is two pixels narrower.
pub const BAR_WIDTH_PX: u16 = 60;
pub const BAR_MAX_FILL_PX: u16 = BAR_WIDTH_PX - 2;

pub const HEADER: &str = "AQUAPONICS";

/// Linear remap of `value` from one range to another.
///
/// A degenerate input range (`in_max <= in_min`) maps everything to
/// `out_min`.
pub fn map_float(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    if in_max <= in_min {
        return out_min;
    }
    (value - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

/// Filled pixels for `value` on a bar spanning `band`, clamped to the bar.
pub fn bar_fill(value: Option<f32>, band: &ThresholdBand) -> u16 {
    let Some(v) = value.filter(|v| v.is_finite()) else {
        return 0;
    };
    let max = f32::from(BAR_MAX_FILL_PX);
    map_float(v, band.min, band.max, 0.0, max).clamp(0.0, max) as u16
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colour {
    Green,
    Orange,
    Red,
}

impl From<Severity> for Colour {
    fn from(s: Severity) -> Self {
        match s {
            Severity::Normal => Self::Green,
            Severity::Warning => Self::Orange,
            Severity::Critical => Self::Red,
        }
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Green => write!(f, "green"),
            Self::Orange => write!(f, "orange"),
            Self::Red => write!(f, "red"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub label: &'static str,
    pub value: Option<f32>,
    pub fill_px: u16,
    pub colour: Colour,
}

pub type Line = heapless::String<40>;

/// One composed dashboard screen.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardFrame {
    pub lines: heapless::Vec<Line, 7>,
    pub bars: [Bar; 3],
    pub fish: Colour,
    pub overall: Severity,
    pub health_score: Option<u8>,
}

/// `Display` value, or `--` when unavailable.
struct OrDash<T>(Option<T>);

impl<T: fmt::Display> fmt::Display for OrDash<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(v) => write!(f, "{}", v),
            None => write!(f, "--"),
        }
    }
}

/// `value` with `decimals`, or `--` when unavailable.
struct Opt(Option<f32>, usize);

impl fmt::Display for Opt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{:.*}", self.1, v),
            None => write!(f, "--"),
        }
    }
}

fn line(args: fmt::Arguments<'_>) -> Line {
    let mut l = Line::new();
    // Overlong lines are cut, as on the panel.
    let _ = l.write_fmt(args);
    l
}

impl DashboardFrame {
    pub fn compose(view: &DashboardView<'_>, bands: &MetricBands) -> Self {
        let r = view.reading;
        let s = view.severities;
        let d = view.derived;
        let avg = d.water_temperature_avg;

        let mut lines = heapless::Vec::new();
        for l in [
            line(format_args!("T1 {} T2 {}", Opt(r.temp_probe_1, 1), Opt(r.temp_probe_2, 1))),
            line(format_args!("pH {}", Opt(r.ph, 2))),
            line(format_args!("EC {}", Opt(r.electrical_conductivity, 0))),
            line(format_args!("Lux {}", Opt(r.illuminance, 0))),
            line(format_args!("Lvl {}cm", Opt(r.distance_level, 1))),
            line(format_args!(
                "Air {}C {}hPa",
                Opt(r.air_temperature, 1),
                Opt(r.air_pressure, 0)
            )),
            line(format_args!(
                "O2 {}mg/L algae {}",
                Opt(d.estimated_oxygen, 1),
                OrDash(d.algae_risk)
            )),
        ] {
            let _ = lines.push(l);
        }

        let bar = |label, value, band: &ThresholdBand, severity: Severity| Bar {
            label,
            value,
            fill_px: bar_fill(value, band),
            colour: severity.into(),
        };

        Self {
            lines,
            bars: [
                bar("T", avg, &bands.water_temperature, s.water_temperature),
                bar("pH", r.ph, &bands.ph, s.ph),
                bar("EC", r.electrical_conductivity, &bands.conductivity, s.conductivity),
            ],
            fish: s.organism.into(),
            overall: s.overall,
            health_score: s.health_score,
        }
    }

    /// Text rendering of the frame, one bar cell per two pixels.
    pub fn write_to(&self, out: &mut impl Write) -> fmt::Result {
        writeln!(
            out,
            "{} [{}] score {}",
            HEADER,
            self.overall,
            OrDash(self.health_score)
        )?;
        for l in &self.lines {
            writeln!(out, "  {}", l)?;
        }
        let cells = usize::from(BAR_MAX_FILL_PX / 2);
        for b in &self.bars {
            let filled = usize::from(b.fill_px / 2);
            write!(out, "  {:<2} [", b.label)?;
            for i in 0..cells {
                out.write_char(if i < filled { '#' } else { '.' })?;
            }
            writeln!(out, "] {}", b.colour)?;
        }
        writeln!(out, "  fish: {}", self.fish)
    }
}

/// Dashboard written to a text console.
pub struct StatusDisplay<W> {
    out: W,
    bands: MetricBands,
    ready: bool,
    last_frame: Option<DashboardFrame>,
}

impl<W: Write> StatusDisplay<W> {
    pub fn new(out: W, bands: MetricBands) -> Self {
        Self {
            out,
            bands,
            ready: false,
            last_frame: None,
        }
    }

    /// Draw the splash line. A console that refuses it stays dark for the run.
    pub fn begin(&mut self) -> Result<(), DisplayError> {
        match writeln!(self.out, "{} starting", HEADER) {
            Ok(()) => {
                self.ready = true;
                info!("Display: ready");
                Ok(())
            }
            Err(_) => {
                warn!("Display: console not writable");
                Err(DisplayError::NotInitialised)
            }
        }
    }

    pub fn last_frame(&self) -> Option<&DashboardFrame> {
        self.last_frame.as_ref()
    }

    pub fn output(&self) -> &W {
        &self.out
    }
}

impl<W: Write> DisplayPort for StatusDisplay<W> {
    fn render(&mut self, view: &DashboardView<'_>) -> Result<(), DisplayError> {
        if !self.ready {
            return Err(DisplayError::NotInitialised);
        }
        let frame = DashboardFrame::compose(view, &self.bands);
        let written = frame.write_to(&mut self.out);
        self.last_frame = Some(frame);
        written.map_err(|_| DisplayError::Bus)
    }
}

/// Process stdout (UART0 on the device) as a `fmt::Write` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialConsole;

impl Write for SerialConsole {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        use std::io::Write as _;
        std::io::stdout().write_all(s.as_bytes()).map_err(|_| fmt::Error)
    }
}
