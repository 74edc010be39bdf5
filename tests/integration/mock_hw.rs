//! Mock adapters for integration tests.
//!
//! Every mock appends to one shared [`Journal`] so tests can assert on the
//! order of calls across collaborators, not just on each one in isolation.

use std::cell::RefCell;
use std::rc::Rc;

use aquamon::app::events::AppEvent;
use aquamon::app::ports::{
    DashboardView, DisplayError, DisplayPort, EventSink, SensorPort, TelemetryPort,
};
use aquamon::reading::RawReading;
use aquamon::safety::SeverityReport;
use embedded_hal::delay::DelayNs;

// ── Call journal ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    ReadWater,
    ReadPh,
    ReadEc,
    ReadLux,
    ReadLevel,
    ReadAir,
    Reconnect,
    Render,
    Publish,
    Delay(u32),
}

pub type Journal = Rc<RefCell<Vec<Step>>>;

pub fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn count(journal: &Journal, step: &Step) -> usize {
    journal.borrow().iter().filter(|s| *s == step).count()
}

pub fn position(journal: &Journal, step: &Step) -> Option<usize> {
    journal.borrow().iter().position(|s| s == step)
}

// ── Sensors ───────────────────────────────────────────────────

/// Returns the same reading every cycle.
pub struct ScriptedSensors {
    pub reading: RawReading,
    journal: Journal,
}

impl ScriptedSensors {
    pub fn new(reading: RawReading, journal: &Journal) -> Self {
        Self {
            reading,
            journal: Rc::clone(journal),
        }
    }

    fn log(&self, step: Step) {
        self.journal.borrow_mut().push(step);
    }
}

impl SensorPort for ScriptedSensors {
    fn read_water_temperatures(&mut self) -> (Option<f32>, Option<f32>) {
        self.log(Step::ReadWater);
        (self.reading.temp_probe_1, self.reading.temp_probe_2)
    }

    fn read_ph(&mut self) -> Option<f32> {
        self.log(Step::ReadPh);
        self.reading.ph
    }

    fn read_conductivity(&mut self) -> Option<f32> {
        self.log(Step::ReadEc);
        self.reading.electrical_conductivity
    }

    fn read_illuminance(&mut self) -> Option<f32> {
        self.log(Step::ReadLux);
        self.reading.illuminance
    }

    fn read_distance_level(&mut self) -> Option<f32> {
        self.log(Step::ReadLevel);
        self.reading.distance_level
    }

    fn read_air(&mut self) -> (Option<f32>, Option<f32>) {
        self.log(Step::ReadAir);
        (self.reading.air_temperature, self.reading.air_pressure)
    }
}

/// 24.0 / 26.0 °C, pH 6.8, 900 µS/cm and plausible ambient values.
pub fn nominal_reading() -> RawReading {
    RawReading {
        temp_probe_1: Some(24.0),
        temp_probe_2: Some(26.0),
        ph: Some(6.8),
        electrical_conductivity: Some(900.0),
        illuminance: Some(420.0),
        distance_level: Some(35.5),
        air_temperature: Some(22.3),
        air_pressure: Some(1012.8),
    }
}

// ── Broker ────────────────────────────────────────────────────

pub struct MockBroker {
    pub connected: bool,
    pub reconnect_succeeds: bool,
    pub accept: bool,
    pub published: Vec<(String, Vec<u8>)>,
    journal: Journal,
}

#[allow(dead_code)]
impl MockBroker {
    pub fn up(journal: &Journal) -> Self {
        Self {
            connected: true,
            reconnect_succeeds: true,
            accept: true,
            published: Vec::new(),
            journal: Rc::clone(journal),
        }
    }

    /// Down, and stays down.
    pub fn unreachable(journal: &Journal) -> Self {
        Self {
            connected: false,
            reconnect_succeeds: false,
            ..Self::up(journal)
        }
    }

    /// Down, but the first reconnect works.
    pub fn recovering(journal: &Journal) -> Self {
        Self {
            connected: false,
            ..Self::up(journal)
        }
    }
}

impl TelemetryPort for MockBroker {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn reconnect(&mut self) -> bool {
        self.journal.borrow_mut().push(Step::Reconnect);
        self.connected = self.reconnect_succeeds;
        self.connected
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> bool {
        self.journal.borrow_mut().push(Step::Publish);
        if self.accept {
            self.published.push((topic.to_owned(), payload.to_vec()));
        }
        self.accept
    }
}

// ── Display ───────────────────────────────────────────────────

pub struct MockDisplay {
    pub fail: bool,
    pub frames: Vec<(RawReading, SeverityReport)>,
    journal: Journal,
}

impl MockDisplay {
    pub fn new(journal: &Journal) -> Self {
        Self {
            fail: false,
            frames: Vec::new(),
            journal: Rc::clone(journal),
        }
    }

    pub fn broken(journal: &Journal) -> Self {
        Self {
            fail: true,
            ..Self::new(journal)
        }
    }
}

impl DisplayPort for MockDisplay {
    fn render(&mut self, view: &DashboardView<'_>) -> Result<(), DisplayError> {
        self.journal.borrow_mut().push(Step::Render);
        self.frames.push((*view.reading, *view.severities));
        if self.fail {
            Err(DisplayError::Bus)
        } else {
            Ok(())
        }
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Delay ─────────────────────────────────────────────────────

pub struct RecordingDelay {
    journal: Journal,
}

impl RecordingDelay {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: Rc::clone(journal),
        }
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.journal.borrow_mut().push(Step::Delay(ns / 1_000_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.journal.borrow_mut().push(Step::Delay(ms));
    }
}
