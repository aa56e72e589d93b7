//! Line-oriented host protocol.
//!
//! One request per line, `<command>[:<csv args>]`, one or more response
//! lines per request:
//!
//! ```text
//!  setChParams:<id>,<age>,<target>,<next>,<tMin>,<tMax>,<heater>,<minOn>,<minOff>,<lag>,<Kp>,<Ki>,<Kd>,<mode>
//!      → ack | err:chamberId,<id> | err:params,<why> | err:parse,<field>
//!  getChRds:<id>
//!      → chRds:<age>,<target>,<next>,<tMin>,<tMax>,<heater>,<minOn>,<minOff>,<lag>,<Kp>,<Ki>,<Kd>,<mode>,
//!              <beer>,<chamber>,<external>,<heatPct>,<coolerOn>
//!  status       → status:<uptimeMins>,<external>,<logEjected>
//!  getLogMsgs   → logMsg:<event>* then ack
//!  <other>      → UnrecCmd:<command>
//! ```
//!
//! Temperatures are integer tenths, booleans `0`/`1`, mode a single
//! character code.
//!
//! There is no project-box probe, so `chRds` has 18 fields and `status` 3.
//! Hosts built for the older Arduino controller read a project-box
//! temperature between `<external>` and `<heatPct>` in `chRds`, and a
//! project-box temperature plus RAM and bad-sensor counters in `status`.
//! Those hosts need a shim that inserts placeholders.

use core::fmt::{self, Write};
use core::str::FromStr;

use crate::app::commands::ChamberParams;
use crate::app::ports::{DiagnosticSink, StoragePort};
use crate::app::service::Controller;
use crate::chamber::Mode;
use crate::diagnostics::LogBuffer;
use crate::error::Error;

/// Longest accepted request line.
pub const MAX_LINE_LEN: usize = 160;

/// A parsed request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Request<'a> {
    SetParams { chamber: u8, params: ChamberParams },
    GetReadings { chamber: u8 },
    Status,
    GetLogMessages,
    Unrecognised(&'a str),
}

/// Why a recognised command could not be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    TooLong,
    MissingField(&'static str),
    BadField(&'static str),
    TrailingData,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLong => write!(f, "line"),
            Self::MissingField(name) | Self::BadField(name) => write!(f, "{name}"),
            Self::TrailingData => write!(f, "trailing"),
        }
    }
}

// ── Parsing ───────────────────────────────────────────────────

struct Fields<'a> {
    it: core::str::Split<'a, char>,
}

impl<'a> Fields<'a> {
    fn new(args: &'a str) -> Self {
        Self {
            it: args.split(','),
        }
    }

    fn raw(&mut self, name: &'static str) -> Result<&'a str, ProtocolError> {
        self.it
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ProtocolError::MissingField(name))
    }

    fn parse<T: FromStr>(&mut self, name: &'static str) -> Result<T, ProtocolError> {
        self.raw(name)?
            .parse()
            .map_err(|_| ProtocolError::BadField(name))
    }

    fn flag(&mut self, name: &'static str) -> Result<bool, ProtocolError> {
        match self.raw(name)? {
            "0" => Ok(false),
            "1" => Ok(true),
            _ => Err(ProtocolError::BadField(name)),
        }
    }

    fn mode(&mut self, name: &'static str) -> Result<Mode, ProtocolError> {
        let raw = self.raw(name)?;
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Mode::from_code(c).ok_or(ProtocolError::BadField(name)),
            _ => Err(ProtocolError::BadField(name)),
        }
    }

    fn finish(mut self) -> Result<(), ProtocolError> {
        match self.it.next() {
            None => Ok(()),
            Some(_) => Err(ProtocolError::TrailingData),
        }
    }
}

/// Parse one request line (without its terminator).
pub fn parse(line: &str) -> Result<Request<'_>, ProtocolError> {
    if line.len() > MAX_LINE_LEN {
        return Err(ProtocolError::TooLong);
    }
    let line = line.trim();
    let (cmd, args) = line.split_once(':').unwrap_or((line, ""));

    match cmd {
        "setChParams" => {
            let mut f = Fields::new(args);
            let chamber = f.parse("chamberId")?;
            let params = ChamberParams {
                batch_age_hours: f.parse("gyleAgeHours")?,
                target_temp: f.parse("tTarget")?,
                next_target_temp: f.parse("tTargetNext")?,
                temp_min: f.parse("tMin")?,
                temp_max: f.parse("tMax")?,
                has_heater: f.flag("hasHeater")?,
                cool_min_on_mins: f.parse("fridgeMinOnTimeMins")?,
                cool_min_off_mins: f.parse("fridgeMinOffTimeMins")?,
                cool_switch_on_lag_mins: f.parse("fridgeSwitchOnLagMins")?,
                kp: f.parse("Kp")?,
                ki: f.parse("Ki")?,
                kd: f.parse("Kd")?,
                mode: f.mode("mode")?,
            };
            f.finish()?;
            Ok(Request::SetParams { chamber, params })
        }
        "getChRds" => {
            let mut f = Fields::new(args);
            let chamber = f.parse("chamberId")?;
            f.finish()?;
            Ok(Request::GetReadings { chamber })
        }
        "status" => Ok(Request::Status),
        "getLogMsgs" => Ok(Request::GetLogMessages),
        other => Ok(Request::Unrecognised(other)),
    }
}

// ── Dispatch ──────────────────────────────────────────────────

/// Parse `line`, act on it and write the response lines to `out`.
pub fn dispatch<S, D>(
    ctl: &mut Controller<S, D>,
    line: &str,
    out: &mut impl Write,
) -> fmt::Result
where
    S: StoragePort,
    D: DiagnosticSink + LogBuffer,
{
    let request = match parse(line) {
        Ok(r) => r,
        Err(e) => return writeln!(out, "err:parse,{e}"),
    };

    match request {
        Request::SetParams { chamber, params } => match ctl.apply_config(chamber, &params) {
            Ok(()) => writeln!(out, "ack"),
            Err(e) => write_error(out, e),
        },
        Request::GetReadings { chamber } => match ctl.read_snapshot(chamber) {
            Ok(s) => {
                let cfg = &s.config;
                let mt = &s.targets;
                writeln!(
                    out,
                    "chRds:{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
                    mt.batch_age_hours,
                    mt.target_temp,
                    mt.next_target_temp,
                    cfg.temp_min,
                    cfg.temp_max,
                    u8::from(cfg.has_heater),
                    cfg.cool_min_on_mins,
                    cfg.cool_min_off_mins,
                    cfg.cool_switch_on_lag_mins,
                    cfg.kp,
                    cfg.ki,
                    cfg.kd,
                    cfg.mode.code(),
                    s.beer_temp,
                    s.chamber_temp,
                    s.external_temp,
                    s.heater_output_percent,
                    u8::from(s.cooler_on),
                )
            }
            Err(e) => write_error(out, e),
        },
        Request::Status => {
            let ejected = ctl.diagnostics_mut().take_ejected();
            writeln!(
                out,
                "status:{},{},{}",
                ctl.uptime_mins(),
                ctl.external_temp(),
                u8::from(ejected)
            )
        }
        Request::GetLogMessages => {
            while let Some(event) = ctl.diagnostics_mut().pop_oldest() {
                writeln!(out, "logMsg:{event}")?;
            }
            writeln!(out, "ack")
        }
        Request::Unrecognised(cmd) => writeln!(out, "UnrecCmd:{cmd}"),
    }
}

fn write_error(out: &mut impl Write, e: Error) -> fmt::Result {
    match e {
        Error::UnknownChamber(id) => writeln!(out, "err:chamberId,{id}"),
        Error::InvalidParams(why) => writeln!(out, "err:params,{why}"),
        other => writeln!(out, "err:{other}"),
    }
}
