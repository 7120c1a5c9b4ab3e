//! COMTRADE data (.dat) parsers.
//!
//! ASCII rows: `sample_index,elapsed_us,raw_1,...,raw_n` with 1-based,
//! strictly increasing sample indices. Binary records: little-endian
//! u32 sample number, u32 elapsed microseconds, one i16 per analog
//! channel, then one u16 status word per 16 digital channels.

use flare_core::{FlareError, FlareResult};

/// Raw sample stream: one elapsed-time stamp per row and one raw value
/// column per analog channel, in channel-line order.
#[derive(Debug, Clone)]
pub struct RawSamples {
    /// Elapsed time since the start timestamp, microseconds, one per row
    pub elapsed_us: Vec<u32>,
    /// Column-major raw values: `columns[channel][row]`
    pub columns: Vec<Vec<f64>>,
}

impl RawSamples {
    pub fn n_rows(&self) -> usize {
        self.elapsed_us.len()
    }
}

/// Parse an ASCII data file.
///
/// `analog_count` and `declared_count` come from the configuration file;
/// any disagreement between the header and the data is a parse error.
pub fn parse_ascii_data(
    content: &str,
    analog_count: usize,
    declared_count: usize,
) -> FlareResult<RawSamples> {
    let mut elapsed_us = Vec::with_capacity(declared_count);
    let mut columns = vec![Vec::with_capacity(declared_count); analog_count];
    let mut last_index: u64 = 0;

    for (i, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let num = i + 1;
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != 2 + analog_count {
            return Err(FlareError::Parse(format!(
                "dat line {num}: {} columns, expected {} (index, time, {} channels)",
                fields.len(),
                2 + analog_count,
                analog_count
            )));
        }
        let index: u64 = fields[0]
            .parse()
            .map_err(|_| FlareError::Parse(format!("dat line {num}: bad sample index `{}`", fields[0])))?;
        if index != last_index + 1 {
            return Err(FlareError::Parse(format!(
                "dat line {num}: sample index {index} breaks 1-based monotonic order (previous {last_index})"
            )));
        }
        last_index = index;

        let t_us: u32 = fields[1]
            .parse()
            .map_err(|_| FlareError::Parse(format!("dat line {num}: bad timestamp `{}`", fields[1])))?;
        elapsed_us.push(t_us);

        for (ch, field) in fields[2..].iter().enumerate() {
            let raw: i64 = field
                .parse()
                .map_err(|_| FlareError::Parse(format!("dat line {num}: bad raw value `{field}`")))?;
            columns[ch].push(raw as f64);
        }
    }

    if elapsed_us.len() != declared_count {
        return Err(FlareError::Parse(format!(
            "data file holds {} samples but the header declares {}",
            elapsed_us.len(),
            declared_count
        )));
    }

    Ok(RawSamples { elapsed_us, columns })
}

/// Parse a binary data file.
pub fn parse_binary_data(
    bytes: &[u8],
    analog_count: usize,
    digital_count: usize,
    declared_count: usize,
) -> FlareResult<RawSamples> {
    let status_words = digital_count.div_ceil(16);
    let record_size = 4 + 4 + 2 * analog_count + 2 * status_words;
    if bytes.len() != record_size * declared_count {
        return Err(FlareError::Parse(format!(
            "binary data is {} bytes; {} records of {} bytes ({} analog, {} digital) need {}",
            bytes.len(),
            declared_count,
            record_size,
            analog_count,
            digital_count,
            record_size * declared_count
        )));
    }

    let mut elapsed_us = Vec::with_capacity(declared_count);
    let mut columns = vec![Vec::with_capacity(declared_count); analog_count];

    for (row, record) in bytes.chunks_exact(record_size).enumerate() {
        let index = u32::from_le_bytes(record[0..4].try_into().expect("4-byte slice"));
        if index as usize != row + 1 {
            return Err(FlareError::Parse(format!(
                "binary record {}: sample number {index} breaks 1-based monotonic order",
                row + 1
            )));
        }
        let t_us = u32::from_le_bytes(record[4..8].try_into().expect("4-byte slice"));
        elapsed_us.push(t_us);

        for ch in 0..analog_count {
            let off = 8 + 2 * ch;
            let raw = i16::from_le_bytes(record[off..off + 2].try_into().expect("2-byte slice"));
            columns[ch].push(raw as f64);
        }
        // Digital status words are not used by the analog pipeline.
    }

    Ok(RawSamples { elapsed_us, columns })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ascii_rows(n: usize, channels: usize) -> String {
        (0..n)
            .map(|i| {
                let vals: Vec<String> = (0..channels).map(|c| format!("{}", (i + c) as i64)).collect();
                format!("{},{},{}", i + 1, i * 260, vals.join(","))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_parse_ascii() {
        let data = ascii_rows(10, 6);
        let raw = parse_ascii_data(&data, 6, 10).unwrap();
        assert_eq!(raw.n_rows(), 10);
        assert_eq!(raw.columns.len(), 6);
        assert_eq!(raw.elapsed_us[3], 780);
        assert_eq!(raw.columns[2][4], 6.0); // row 4, channel 2 → 4 + 2
    }

    #[test]
    fn test_ascii_declared_count_mismatch() {
        let data = ascii_rows(9, 6);
        let err = parse_ascii_data(&data, 6, 10).unwrap_err();
        assert!(err.to_string().contains("declares 10"));
    }

    #[test]
    fn test_ascii_column_count_mismatch() {
        let mut data = ascii_rows(3, 6);
        data = data.replacen("3,520,2,3,4,5,6,7", "3,520,2,3,4,5,6", 1);
        let err = parse_ascii_data(&data, 6, 3).unwrap_err();
        assert!(err.to_string().contains("expected 8"));
    }

    #[test]
    fn test_ascii_non_monotonic_index() {
        let data = "1,0,1,1,1,1,1,1\n3,260,2,2,2,2,2,2\n";
        let err = parse_ascii_data(data, 6, 2).unwrap_err();
        assert!(err.to_string().contains("monotonic"));
    }

    #[test]
    fn test_ascii_negative_values() {
        let data = "1,0,-120,4,-7,0,3,-1\n2,260,5,-5,5,-5,5,-5\n";
        let raw = parse_ascii_data(data, 6, 2).unwrap();
        assert_eq!(raw.columns[0][0], -120.0);
        assert_eq!(raw.columns[5][1], -5.0);
    }

    fn binary_records(n: usize, channels: usize) -> Vec<u8> {
        let mut bytes = Vec::new();
        for i in 0..n {
            bytes.extend_from_slice(&(i as u32 + 1).to_le_bytes());
            bytes.extend_from_slice(&(i as u32 * 260).to_le_bytes());
            for c in 0..channels {
                bytes.extend_from_slice(&((i as i16) - (c as i16)).to_le_bytes());
            }
        }
        bytes
    }

    #[test]
    fn test_parse_binary() {
        let bytes = binary_records(5, 6);
        let raw = parse_binary_data(&bytes, 6, 0, 5).unwrap();
        assert_eq!(raw.n_rows(), 5);
        assert_eq!(raw.elapsed_us[2], 520);
        assert_eq!(raw.columns[4][3], -1.0); // row 3, channel 4 → 3 - 4
    }

    #[test]
    fn test_binary_truncated() {
        let mut bytes = binary_records(5, 6);
        bytes.truncate(bytes.len() - 3);
        let err = parse_binary_data(&bytes, 6, 0, 5).unwrap_err();
        assert!(matches!(err, FlareError::Parse(_)));
    }

    #[test]
    fn test_binary_with_digital_words() {
        // 2 digital channels pack into one u16 status word per record
        let mut bytes = Vec::new();
        for i in 0..3u32 {
            bytes.extend_from_slice(&(i + 1).to_le_bytes());
            bytes.extend_from_slice(&(i * 100).to_le_bytes());
            for _ in 0..6 {
                bytes.extend_from_slice(&42i16.to_le_bytes());
            }
            bytes.extend_from_slice(&0u16.to_le_bytes());
        }
        let raw = parse_binary_data(&bytes, 6, 2, 3).unwrap();
        assert_eq!(raw.n_rows(), 3);
        assert_eq!(raw.columns[0][0], 42.0);
    }
}
