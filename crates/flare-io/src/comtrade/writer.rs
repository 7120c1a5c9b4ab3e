//! ASCII COMTRADE writer for synthetic validation events.
//!
//! Produces a (cfg, dat) pair from six primary-referred waveforms, encoding
//! samples at millivolt/milliamp resolution on the secondary side. The
//! written pair loads back through the regular parser, which makes it the
//! backbone of the end-to-end tests and the `synth` CLI command.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;

use flare_core::{ChannelId, ChannelKind, FlareError, FlareResult, Hertz};

/// Six primary-referred waveforms plus the recorder context needed to
/// serialize them.
#[derive(Debug, Clone)]
pub struct EventWaveforms {
    pub station_name: String,
    pub recorder_id: String,
    pub sample_rate: Hertz,
    pub nominal_freq: Hertz,
    pub trigger_time: NaiveDateTime,
    pub start_time: NaiveDateTime,
    /// CT ratio used to scale currents down to secondary values
    pub ct_ratio: f64,
    /// VT ratio used to scale voltages down to secondary values
    pub vt_ratio: f64,
    /// Primary-referred samples ordered Va, Vb, Vc, Ia, Ib, Ic
    pub channels: [Vec<f64>; 6],
}

/// Secondary-side resolution of one raw count (1 mV / 1 mA).
const LSB: f64 = 0.001;

/// Write the event as an ASCII COMTRADE pair at the given paths.
pub fn write_ascii_event(
    waveforms: &EventWaveforms,
    cfg_path: &Path,
    dat_path: &Path,
) -> FlareResult<()> {
    let n = waveforms.channels[0].len();
    if n == 0 {
        return Err(FlareError::Other("cannot write an empty event".into()));
    }
    if waveforms.channels.iter().any(|c| c.len() != n) {
        return Err(FlareError::Other("channel lengths disagree".into()));
    }

    // Raw integer encoding: secondary value at 1 mV / 1 mA per count.
    let mut raw = Vec::with_capacity(6);
    for (slot, id) in ChannelId::ALL.iter().enumerate() {
        let ratio = match id.kind() {
            ChannelKind::Voltage => waveforms.vt_ratio,
            ChannelKind::Current => waveforms.ct_ratio,
        };
        let column: Vec<i64> = waveforms.channels[slot]
            .iter()
            .map(|&v| (v / ratio / LSB).round() as i64)
            .collect();
        raw.push((ratio, column));
    }

    let mut cfg = String::new();
    let _ = writeln!(
        cfg,
        "{},{},1991",
        waveforms.station_name, waveforms.recorder_id
    );
    let _ = writeln!(cfg, "6,6A,0D");
    for (slot, id) in ChannelId::ALL.iter().enumerate() {
        let (ratio, column) = &raw[slot];
        let max_raw = column.iter().map(|r| r.abs()).max().unwrap_or(0) as f64;
        let bound = (max_raw * 1.1).max(1.0);
        let _ = writeln!(
            cfg,
            "{},{},{},{},{},{:.6},{:.6},0,{:.4},{:.4},{:.1},1.0,P",
            slot + 1,
            id.as_str(),
            id.phase().as_str(),
            id.phase().as_str(),
            match id.kind() {
                ChannelKind::Voltage => "V",
                ChannelKind::Current => "A",
            },
            LSB,
            0.0,
            -bound,
            bound,
            ratio,
        );
    }
    let _ = writeln!(cfg, "{}", waveforms.nominal_freq.value());
    let _ = writeln!(cfg, "1");
    let _ = writeln!(cfg, "{},{}", waveforms.sample_rate.value(), n);
    let _ = writeln!(
        cfg,
        "{}",
        waveforms.trigger_time.format("%m/%d/%Y,%H:%M:%S%.6f")
    );
    let _ = writeln!(
        cfg,
        "{}",
        waveforms.start_time.format("%m/%d/%Y,%H:%M:%S%.6f")
    );
    let _ = writeln!(cfg, "ASCII");
    let _ = writeln!(cfg, "1.0");

    let mut dat = String::new();
    for i in 0..n {
        let t_us = (i as f64 / waveforms.sample_rate.value() * 1e6).round() as u64;
        let _ = write!(dat, "{},{}", i + 1, t_us);
        for (_, column) in &raw {
            let _ = write!(dat, ",{}", column[i]);
        }
        dat.push('\n');
    }

    fs::write(cfg_path, cfg)?;
    fs::write(dat_path, dat)?;
    Ok(())
}
