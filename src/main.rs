//! Chamber controller simulation: host entry point.
//!
//! Drives the real [`Controller`] against a lumped thermal model of two
//! fermentation chambers for a simulated day, talking to it through the
//! same line protocol the host uses.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  Plant (SensorPort + ActuatorPort)   MemEeprom (Storage)   │
//! │  LogDiagnostics + DiagnosticRing (DiagnosticSink)          │
//! │                                                            │
//! │  ──────────────── Port Trait Boundary ───────────────      │
//! │                                                            │
//! │     Controller: engine · dwell guard · pulse · PID         │
//! └────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Context, Result};
use env_logger::Env;
use log::info;

use chamberctl::adapters::eeprom::MemEeprom;
use chamberctl::adapters::log_sink::LogDiagnostics;
use chamberctl::app::ports::{ActuatorPort, SensorPort};
use chamberctl::chamber::ChamberId;
use chamberctl::config::{ControlTuning, MAX_CHAMBERS};
use chamberctl::diagnostics::DiagnosticRing;
use chamberctl::error::SensorError;
use chamberctl::{Controller, protocol};

const SIM_HOURS: u32 = 24;
const EEPROM_BYTES: usize = 1024;

// ── Thermal plant ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
struct Vessel {
    beer_c: f32,
    air_c: f32,
    cooler: bool,
    heater: bool,
    /// Fermentation heat, degrees per second.
    exotherm: f32,
}

struct Plant {
    ambient_c: f32,
    vessels: [Vessel; MAX_CHAMBERS],
}

impl Plant {
    fn new(ambient_c: f32) -> Self {
        Self {
            ambient_c,
            vessels: [Vessel {
                beer_c: ambient_c,
                air_c: ambient_c,
                ..Vessel::default()
            }; MAX_CHAMBERS],
        }
    }

    /// Advance the model by one second at `t_secs`.
    fn step(&mut self, t_secs: u32) {
        let day = t_secs as f32 / 86_400.0;
        self.ambient_c = 18.0 + 5.0 * (day * core::f32::consts::TAU).sin();
        for v in &mut self.vessels {
            let mut d_air = (self.ambient_c - v.air_c) * 0.000_5;
            if v.cooler {
                d_air -= 0.004;
            }
            if v.heater {
                d_air += 0.006;
            }
            v.air_c += d_air;
            v.beer_c += (v.air_c - v.beer_c) * 0.000_2 + v.exotherm;
        }
    }

    fn tenths(c: f32) -> i16 {
        (c * 10.0).round() as i16
    }
}

impl SensorPort for Plant {
    fn read_beer_temp(&mut self, chamber: ChamberId) -> Result<i16, SensorError> {
        Ok(Self::tenths(self.vessels[chamber.index()].beer_c))
    }

    fn read_chamber_temp(&mut self, chamber: ChamberId) -> Result<i16, SensorError> {
        Ok(Self::tenths(self.vessels[chamber.index()].air_c))
    }

    fn read_external_temp(&mut self) -> Result<i16, SensorError> {
        Ok(Self::tenths(self.ambient_c))
    }
}

impl ActuatorPort for Plant {
    fn set_cooler(&mut self, chamber: ChamberId, on: bool) {
        self.vessels[chamber.index()].cooler = on;
    }

    fn set_heater_element(&mut self, chamber: ChamberId, on: bool) {
        self.vessels[chamber.index()].heater = on;
    }
}

// ── Entry point ───────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().filter_or("CHAMBER_LOG", "info"))
        .format_timestamp(None)
        .init();

    let tuning = ControlTuning::default();
    let diag = (LogDiagnostics::new(), DiagnosticRing::new());
    let mut ctl = Controller::new(tuning, MemEeprom::new(EEPROM_BYTES), diag, 0)
        .context("controller initialisation failed")?;

    let mut plant = Plant::new(18.0);
    plant.vessels[1].exotherm = 0.000_02;

    let mut reply = String::new();
    for line in [
        "setChParams:1,-1,120,120,-10,400,1,10,15,0,16.0,0.32,20.0,A",
        "setChParams:2,24,190,190,-10,400,1,10,15,2,16.0,0.32,20.0,A",
    ] {
        protocol::dispatch(&mut ctl, line, &mut reply).context("protocol reply")?;
    }
    info!("host setup replies: {}", reply.trim_end().replace('\n', " | "));

    let mut cooler_secs = [0u32; MAX_CHAMBERS];
    let mut heater_secs = [0u32; MAX_CHAMBERS];

    for t in 1..=SIM_HOURS * 3600 {
        plant.step(t);
        ctl.poll(t.wrapping_mul(1000), &mut plant);

        for (i, v) in plant.vessels.iter().enumerate() {
            cooler_secs[i] += u32::from(v.cooler);
            heater_secs[i] += u32::from(v.heater);
        }

        if t % 3600 == 0 {
            let mut rds = String::new();
            for id in 1..=ctl.chamber_count() {
                protocol::dispatch(&mut ctl, &format!("getChRds:{id}"), &mut rds)
                    .context("protocol reply")?;
            }
            info!(
                "hour {:>2}: {}",
                t / 3600,
                rds.trim_end().replace('\n', " | ")
            );
        }
    }

    let mut status = String::new();
    protocol::dispatch(&mut ctl, "status", &mut status).context("protocol reply")?;
    info!("{}", status.trim_end());

    for id in 1..=ctl.chamber_count() {
        let i = usize::from(id - 1);
        info!(
            "chamber {id}: cooler {:.1} h, heater {:.1} h",
            cooler_secs[i] as f32 / 3600.0,
            heater_secs[i] as f32 / 3600.0
        );
    }
    info!(
        "EEPROM bytes programmed: {}",
        ctl.store().storage().bytes_programmed()
    );

    info!(
        "{} diagnostic record(s) left in the ring",
        ctl.diagnostics().1.len()
    );
    Ok(())
}
