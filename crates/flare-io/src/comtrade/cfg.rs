//! COMTRADE configuration (.cfg) parser.
//!
//! Layout, one field group per line:
//!
//! ```text
//! station_name,recorder_id,revision_year
//! total_channels,<n>A,<m>D
//! index,name,phase,component,unit,multiplier,offset,skew,min,max,primary,secondary,P|S   (× n)
//! <digital channel lines>                                                                 (× m)
//! nominal_frequency
//! number_of_sample_rates
//! sample_rate,sample_count
//! trigger timestamp   MM/DD/YYYY,HH:MM:SS.ffffff
//! start timestamp     MM/DD/YYYY,HH:MM:SS.ffffff
//! ASCII | BINARY
//! file version tag
//! ```

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use flare_core::{FlareError, FlareResult};

/// Sample stream encoding declared by the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataFormat {
    Ascii,
    Binary,
}

/// One analog channel line, fields as written by the recorder.
///
/// The embedded primary/secondary ratio reflects the recorder's tap
/// settings; the loader overrides it with the operator-supplied CT/VT
/// ratio when referring samples to the primary side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalogChannelLine {
    pub index: usize,
    pub name: String,
    /// Raw phase label: "A", "B", "C", or a neutral/other marker
    pub phase: String,
    pub component: String,
    /// Physical unit: "V" or "A"
    pub unit: String,
    pub multiplier: f64,
    pub offset: f64,
    pub skew_us: f64,
    pub min_value: f64,
    pub max_value: f64,
    pub primary_ratio: f64,
    pub secondary_ratio: f64,
    /// 'P' when stored values are primary-referred, 'S' for secondary
    pub ps: char,
}

/// Parsed configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComtradeConfig {
    pub station_name: String,
    pub recorder_id: String,
    pub revision_year: Option<i32>,
    pub analog_count: usize,
    pub digital_count: usize,
    pub analog_channels: Vec<AnalogChannelLine>,
    pub nominal_freq_hz: f64,
    pub sample_rate_hz: f64,
    pub sample_count: usize,
    pub trigger_time: NaiveDateTime,
    pub start_time: NaiveDateTime,
    pub data_format: DataFormat,
    pub file_version: String,
}

const TIMESTAMP_FORMAT: &str = "%m/%d/%Y,%H:%M:%S%.f";

/// Parse a configuration file from its text content.
pub fn parse_config(content: &str) -> FlareResult<ComtradeConfig> {
    let mut lines = content
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty());

    // Station line
    let (num, station_line) = next_line(&mut lines, "station line")?;
    let station_fields: Vec<&str> = station_line.split(',').map(str::trim).collect();
    if station_fields.len() < 2 {
        return Err(parse_err(num, "expected `station,recorder,rev_year`"));
    }
    let station_name = station_fields[0].to_string();
    let recorder_id = station_fields[1].to_string();
    let revision_year = station_fields.get(2).and_then(|y| y.parse().ok());

    // Channel-count line: total,<n>A,<m>D
    let (num, counts_line) = next_line(&mut lines, "channel count line")?;
    let counts: Vec<&str> = counts_line.split(',').map(str::trim).collect();
    if counts.len() != 3 {
        return Err(parse_err(num, "expected `total,<n>A,<m>D`"));
    }
    let total: usize = parse_field(num, counts[0], "total channel count")?;
    let analog_count: usize = parse_field(
        num,
        counts[1].trim_end_matches(['A', 'a']),
        "analog channel count",
    )?;
    let digital_count: usize = parse_field(
        num,
        counts[2].trim_end_matches(['D', 'd']),
        "digital channel count",
    )?;
    if total != analog_count + digital_count {
        return Err(parse_err(
            num,
            &format!("channel counts inconsistent: {total} != {analog_count}A + {digital_count}D"),
        ));
    }

    // Analog channel lines
    let mut analog_channels = Vec::with_capacity(analog_count);
    for _ in 0..analog_count {
        let (num, line) = next_line(&mut lines, "analog channel line")?;
        analog_channels.push(parse_analog_channel(num, line)?);
    }

    // Digital channel lines carry no calibration; consume and discard.
    for _ in 0..digital_count {
        next_line(&mut lines, "digital channel line")?;
    }

    // Nominal frequency
    let (num, freq_line) = next_line(&mut lines, "nominal frequency line")?;
    let nominal_freq_hz: f64 = parse_field(num, freq_line, "nominal frequency")?;

    // Sample-rate segments; only single-rate recordings are supported.
    let (num, nrates_line) = next_line(&mut lines, "sample-rate count line")?;
    let nrates: usize = parse_field(num, nrates_line, "sample-rate count")?;
    if nrates != 1 {
        return Err(parse_err(
            num,
            &format!("multi-rate recordings are not supported (nrates = {nrates})"),
        ));
    }

    let (num, rate_line) = next_line(&mut lines, "sample rate line")?;
    let rate_fields: Vec<&str> = rate_line.split(',').map(str::trim).collect();
    if rate_fields.len() != 2 {
        return Err(parse_err(num, "expected `sample_rate,sample_count`"));
    }
    let sample_rate_hz: f64 = parse_field(num, rate_fields[0], "sample rate")?;
    let sample_count: usize = parse_field(num, rate_fields[1], "sample count")?;
    if sample_rate_hz <= 0.0 {
        return Err(parse_err(
            num,
            &format!("sample rate must be positive, got {sample_rate_hz}"),
        ));
    }

    // Trigger then start timestamps
    let (num, trigger_line) = next_line(&mut lines, "trigger timestamp line")?;
    let trigger_time = parse_timestamp(num, trigger_line)?;
    let (num, start_line) = next_line(&mut lines, "start timestamp line")?;
    let start_time = parse_timestamp(num, start_line)?;

    // Data format tag
    let (num, format_line) = next_line(&mut lines, "data format line")?;
    let data_format = match format_line.to_ascii_uppercase().as_str() {
        "ASCII" => DataFormat::Ascii,
        "BINARY" => DataFormat::Binary,
        other => return Err(parse_err(num, &format!("unknown data format tag `{other}`"))),
    };

    // File version tag (free-form)
    let file_version = lines
        .next()
        .map(|(_, l)| l.to_string())
        .unwrap_or_default();

    Ok(ComtradeConfig {
        station_name,
        recorder_id,
        revision_year,
        analog_count,
        digital_count,
        analog_channels,
        nominal_freq_hz,
        sample_rate_hz,
        sample_count,
        trigger_time,
        start_time,
        data_format,
        file_version,
    })
}

fn parse_analog_channel(num: usize, line: &str) -> FlareResult<AnalogChannelLine> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != 13 {
        return Err(parse_err(
            num,
            &format!("analog channel line has {} fields, expected 13", fields.len()),
        ));
    }
    Ok(AnalogChannelLine {
        index: parse_field(num, fields[0], "channel index")?,
        name: fields[1].to_string(),
        phase: fields[2].to_string(),
        component: fields[3].to_string(),
        unit: fields[4].to_string(),
        multiplier: parse_field(num, fields[5], "multiplier")?,
        offset: parse_field(num, fields[6], "offset")?,
        skew_us: parse_field(num, fields[7], "skew")?,
        min_value: parse_field(num, fields[8], "min value")?,
        max_value: parse_field(num, fields[9], "max value")?,
        primary_ratio: parse_field(num, fields[10], "primary ratio")?,
        secondary_ratio: parse_field(num, fields[11], "secondary ratio")?,
        ps: fields[12].chars().next().unwrap_or('S').to_ascii_uppercase(),
    })
}

fn parse_timestamp(num: usize, line: &str) -> FlareResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(line, TIMESTAMP_FORMAT)
        .map_err(|e| parse_err(num, &format!("bad timestamp `{line}`: {e}")))
}

fn next_line<'a>(
    lines: &mut impl Iterator<Item = (usize, &'a str)>,
    what: &str,
) -> FlareResult<(usize, &'a str)> {
    lines
        .next()
        .ok_or_else(|| FlareError::Parse(format!("configuration ended early, expected {what}")))
}

fn parse_field<T: std::str::FromStr>(num: usize, field: &str, what: &str) -> FlareResult<T> {
    field
        .parse()
        .map_err(|_| parse_err(num, &format!("invalid {what} `{field}`")))
}

fn parse_err(line: usize, msg: &str) -> FlareError {
    FlareError::Parse(format!("cfg line {line}: {msg}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CFG: &str = "\
fault_AG_69kV,69kV Line,1991
6,6A,0D
1,Va,A,A,V,0.001000,0.000000,0,-79.5,79.5,600.0,1.0,P
2,Vb,B,B,V,0.001000,0.000000,0,-79.5,79.5,600.0,1.0,P
3,Vc,C,C,V,0.001000,0.000000,0,-79.5,79.5,600.0,1.0,P
4,Ia,A,A,A,0.001000,0.000000,0,-3.2,3.2,400.0,1.0,P
5,Ib,B,B,A,0.001000,0.000000,0,-3.2,3.2,400.0,1.0,P
6,Ic,C,C,A,0.001000,0.000000,0,-3.2,3.2,400.0,1.0,P
60
1
3840,768
01/01/2024,00:00:00.050000
01/01/2024,00:00:00.000000
ASCII
1.0
";

    #[test]
    fn test_parse_sample_cfg() {
        let cfg = parse_config(SAMPLE_CFG).unwrap();
        assert_eq!(cfg.station_name, "fault_AG_69kV");
        assert_eq!(cfg.recorder_id, "69kV Line");
        assert_eq!(cfg.revision_year, Some(1991));
        assert_eq!(cfg.analog_count, 6);
        assert_eq!(cfg.digital_count, 0);
        assert_eq!(cfg.analog_channels.len(), 6);
        assert_eq!(cfg.nominal_freq_hz, 60.0);
        assert_eq!(cfg.sample_rate_hz, 3840.0);
        assert_eq!(cfg.sample_count, 768);
        assert_eq!(cfg.data_format, DataFormat::Ascii);
        assert_eq!(cfg.file_version, "1.0");

        let ia = &cfg.analog_channels[3];
        assert_eq!(ia.name, "Ia");
        assert_eq!(ia.phase, "A");
        assert_eq!(ia.unit, "A");
        assert!((ia.multiplier - 0.001).abs() < 1e-12);
        assert!((ia.primary_ratio - 400.0).abs() < 1e-12);
        assert_eq!(ia.ps, 'P');

        // Trigger precedes start in the file; both parse with microseconds.
        assert_eq!(
            cfg.trigger_time.format("%H:%M:%S%.6f").to_string(),
            "00:00:00.050000"
        );
        assert_eq!(
            cfg.start_time.format("%H:%M:%S%.6f").to_string(),
            "00:00:00.000000"
        );
    }

    #[test]
    fn test_inconsistent_channel_counts() {
        let bad = SAMPLE_CFG.replacen("6,6A,0D", "7,6A,0D", 1);
        let err = parse_config(&bad).unwrap_err();
        assert!(matches!(err, FlareError::Parse(_)));
        assert!(err.to_string().contains("inconsistent"));
    }

    #[test]
    fn test_wrong_channel_field_count() {
        let bad = SAMPLE_CFG.replacen(
            "1,Va,A,A,V,0.001000,0.000000,0,-79.5,79.5,600.0,1.0,P",
            "1,Va,A,A,V,0.001000,0.000000,0,-79.5,79.5,600.0,1.0",
            1,
        );
        let err = parse_config(&bad).unwrap_err();
        assert!(err.to_string().contains("expected 13"));
    }

    #[test]
    fn test_non_positive_sample_rate() {
        let bad = SAMPLE_CFG.replacen("3840,768", "0,768", 1);
        let err = parse_config(&bad).unwrap_err();
        assert!(err.to_string().contains("sample rate must be positive"));
    }

    #[test]
    fn test_multi_rate_rejected() {
        let bad = SAMPLE_CFG.replacen("\n1\n3840,768", "\n2\n3840,384\n1920,384", 1);
        let err = parse_config(&bad).unwrap_err();
        assert!(err.to_string().contains("multi-rate"));
    }

    #[test]
    fn test_truncated_cfg() {
        let truncated: String = SAMPLE_CFG.lines().take(5).collect::<Vec<_>>().join("\n");
        let err = parse_config(&truncated).unwrap_err();
        assert!(err.to_string().contains("ended early"));
    }

    #[test]
    fn test_binary_format_tag() {
        let bin = SAMPLE_CFG.replacen("ASCII", "BINARY", 1);
        let cfg = parse_config(&bin).unwrap();
        assert_eq!(cfg.data_format, DataFormat::Binary);
    }

    #[test]
    fn test_unknown_format_tag() {
        let bad = SAMPLE_CFG.replacen("ASCII", "FLOAT32", 1);
        assert!(parse_config(&bad).is_err());
    }
}
