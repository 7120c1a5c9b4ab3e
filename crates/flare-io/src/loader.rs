//! Record assembly: channel matching, calibration, and primary referral.
//!
//! The loader is a pure function of its inputs: it reads both files once,
//! produces a [`Record`], and retains nothing.

use std::fs;
use std::path::Path;

use flare_core::{
    AnalysisSettings, ChannelDefinition, ChannelId, ChannelKind, FlareError, FlareResult, Hertz,
    Phase, Record,
};

use crate::comtrade::{
    parse_ascii_data, parse_binary_data, parse_config, AnalogChannelLine, ComtradeConfig,
    DataFormat, RawSamples,
};

/// Load a calibrated record from a COMTRADE file pair.
///
/// The operator-supplied CT/VT ratios in `settings` always override the
/// primary/secondary tap ratios embedded in the channel lines: recorder tap
/// settings frequently do not match the monitored circuit.
pub fn load_record(
    cfg_path: impl AsRef<Path>,
    dat_path: impl AsRef<Path>,
    settings: &AnalysisSettings,
) -> FlareResult<Record> {
    let cfg_text = fs::read_to_string(cfg_path.as_ref())?;
    let dat_bytes = fs::read(dat_path.as_ref())?;
    load_record_from_parts(&cfg_text, &dat_bytes, settings)
}

/// Load a record from in-memory file contents.
pub fn load_record_from_parts(
    cfg_text: &str,
    dat_bytes: &[u8],
    settings: &AnalysisSettings,
) -> FlareResult<Record> {
    let cfg = parse_config(cfg_text)?;

    let raw = match cfg.data_format {
        DataFormat::Ascii => {
            let text = std::str::from_utf8(dat_bytes).map_err(|e| {
                FlareError::Parse(format!("ASCII data file is not valid UTF-8: {e}"))
            })?;
            parse_ascii_data(text, cfg.analog_count, cfg.sample_count)?
        }
        DataFormat::Binary => parse_binary_data(
            dat_bytes,
            cfg.analog_count,
            cfg.digital_count,
            cfg.sample_count,
        )?,
    };

    build_record(&cfg, &raw, settings)
}

fn build_record(
    cfg: &ComtradeConfig,
    raw: &RawSamples,
    settings: &AnalysisSettings,
) -> FlareResult<Record> {
    let mut channels: [Option<Vec<f64>>; 6] = Default::default();
    let mut definitions = Vec::with_capacity(6);

    for id in ChannelId::ALL {
        let (column, line) = find_channel(cfg, id)?;
        let ratio = match id.kind() {
            ChannelKind::Voltage => settings.vt_ratio,
            ChannelKind::Current => settings.ct_ratio,
        };
        let def = ChannelDefinition {
            index: line.index,
            name: line.name.clone(),
            phase: id.phase(),
            kind: id.kind(),
            multiplier: line.multiplier,
            offset: line.offset,
            ratio,
            primary_ratio: line.primary_ratio,
            secondary_ratio: line.secondary_ratio,
        };
        def.validate()?;

        let samples: Vec<f64> = raw.columns[column].iter().map(|&r| def.to_primary(r)).collect();
        channels[slot(id)] = Some(samples);
        definitions.push(def);
    }

    let channels = channels.map(|c| c.expect("all six channels matched"));

    Record::new(
        Hertz(cfg.sample_rate_hz),
        Hertz(cfg.nominal_freq_hz),
        cfg.start_time,
        cfg.trigger_time,
        channels,
        definitions,
    )
}

/// Find the unique analog channel line matching a channel identity by
/// physical unit and phase label. Neutral or duplicate-phase channels are
/// rejected rather than guessed at.
fn find_channel<'a>(
    cfg: &'a ComtradeConfig,
    id: ChannelId,
) -> FlareResult<(usize, &'a AnalogChannelLine)> {
    let wanted_unit = match id.kind() {
        ChannelKind::Voltage => "V",
        ChannelKind::Current => "A",
    };
    let wanted_phase = id.phase();

    let mut found = None;
    for (column, line) in cfg.analog_channels.iter().enumerate() {
        if !line.unit.eq_ignore_ascii_case(wanted_unit) {
            continue;
        }
        if parse_phase(&line.phase) != Some(wanted_phase) {
            continue;
        }
        if found.is_some() {
            return Err(FlareError::Parse(format!(
                "duplicate {} channel for phase {} (channel {})",
                wanted_unit, wanted_phase, line.index
            )));
        }
        found = Some((column, line));
    }

    found.ok_or_else(|| {
        FlareError::Parse(format!(
            "no {} channel found for phase {} ({} expected)",
            wanted_unit,
            wanted_phase,
            id.as_str()
        ))
    })
}

fn parse_phase(label: &str) -> Option<Phase> {
    match label.trim().to_ascii_uppercase().as_str() {
        "A" => Some(Phase::A),
        "B" => Some(Phase::B),
        "C" => Some(Phase::C),
        _ => None,
    }
}

fn slot(id: ChannelId) -> usize {
    ChannelId::ALL.iter().position(|c| *c == id).expect("closed set")
}
