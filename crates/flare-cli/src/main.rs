use std::io::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tabwriter::TabWriter;
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

use flare_algo::test_utils::SyntheticFault;
use flare_cli::cli::{Cli, Commands, OutputFormat};
use flare_cli::line_table::BuiltinLineTable;
use flare_cli::report::render_text;
use flare_core::{AnalysisSettings, FaultType, Hertz, Kilometers, LineParameterProvider};
use flare_io::comtrade::{parse_config, write_ascii_event, EventWaveforms};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    match cli.command {
        Commands::Analyze {
            cfg,
            dat,
            ct_ratio,
            vt_ratio,
            line_type,
            line_length,
            format,
        } => handle_analyze(&cfg, &dat, ct_ratio, vt_ratio, &line_type, line_length, format),
        Commands::Inspect { cfg } => handle_inspect(&cfg),
        Commands::Lines => handle_lines(),
        Commands::Synth { out_dir } => handle_synth(&out_dir),
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_analyze(
    cfg: &Path,
    dat: &Path,
    ct_ratio: f64,
    vt_ratio: f64,
    line_type: &str,
    line_length: f64,
    format: OutputFormat,
) -> Result<()> {
    let settings =
        AnalysisSettings::new(ct_ratio, vt_ratio, line_type, Kilometers(line_length))?;
    let line = BuiltinLineTable::new().line_parameters(&settings.line_type)?;

    info!(
        cfg = %cfg.display(),
        dat = %dat.display(),
        "loading COMTRADE pair"
    );
    let record = flare_io::load_record(cfg, dat, &settings)?;
    info!(
        samples = record.n_samples(),
        sample_rate_hz = record.sample_rate().value(),
        "record loaded"
    );

    let report = flare_algo::analyze(&record, &line, settings.line_length)?;
    if report.classification.fault_type == FaultType::Unknown {
        warn!("no classifiable disturbance; location skipped");
    } else {
        info!(
            fault_type = %report.classification.fault_type,
            confidence = %report.classification.confidence,
            "classification complete"
        );
    }

    match format {
        OutputFormat::Text => print!("{}", render_text(&report)?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

fn handle_inspect(cfg_path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(cfg_path)
        .with_context(|| format!("reading {}", cfg_path.display()))?;
    let cfg = parse_config(&content)?;

    println!(
        "{} ({}) — rev {}",
        cfg.station_name,
        cfg.recorder_id,
        cfg.revision_year.map_or("?".to_string(), |y| y.to_string())
    );
    println!(
        "{} analog / {} digital channels | {} Hz nominal | {} Hz sampling | {} samples | {:?} data",
        cfg.analog_count,
        cfg.digital_count,
        cfg.nominal_freq_hz,
        cfg.sample_rate_hz,
        cfg.sample_count,
        cfg.data_format
    );
    println!(
        "trigger {} | start {}",
        cfg.trigger_time.format("%Y-%m-%d %H:%M:%S%.6f"),
        cfg.start_time.format("%Y-%m-%d %H:%M:%S%.6f")
    );

    let mut tw = TabWriter::new(Vec::new());
    writeln!(tw, "#\tName\tPhase\tUnit\tMultiplier\tOffset\tRatio\tP/S")?;
    for ch in &cfg.analog_channels {
        writeln!(
            tw,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}/{}\t{}",
            ch.index,
            ch.name,
            ch.phase,
            ch.unit,
            ch.multiplier,
            ch.offset,
            ch.primary_ratio,
            ch.secondary_ratio,
            ch.ps
        )?;
    }
    let table = tw
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flushing channel table: {e}"))?;
    print!("{}", String::from_utf8_lossy(&table));
    Ok(())
}

fn handle_lines() -> Result<()> {
    let table = BuiltinLineTable::new();
    let mut tw = TabWriter::new(Vec::new());
    writeln!(tw, "Line type\tZ1 (Ω/km)\tZ0 (Ω/km)\tAmpacity (A)")?;
    for name in table.line_types() {
        let lp = table.line_parameters(&name)?;
        writeln!(
            tw,
            "{}\t{:.4}+j{:.4}\t{:.4}+j{:.4}\t{:.0}",
            name,
            lp.z1_per_km.re,
            lp.z1_per_km.im,
            lp.z0_per_km.re,
            lp.z0_per_km.im,
            lp.ampacity_a
        )?;
    }
    let rendered = tw
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flushing line table: {e}"))?;
    print!("{}", String::from_utf8_lossy(&rendered));
    Ok(())
}

fn handle_synth(out_dir: &Path) -> Result<()> {
    let params = SyntheticFault::ag().with_noise(0.01);
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;
    let cfg_path = out_dir.join("fault_AG_69kV.cfg");
    let dat_path = out_dir.join("fault_AG_69kV.dat");

    let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let trigger = start + chrono::Duration::microseconds((params.onset_s * 1e6) as i64);

    let event = EventWaveforms {
        station_name: "fault_AG_69kV".into(),
        recorder_id: "69kV Line".into(),
        sample_rate: Hertz(params.sample_rate_hz),
        nominal_freq: Hertz(params.nominal_freq_hz),
        trigger_time: trigger,
        start_time: start,
        ct_ratio: 400.0,
        vt_ratio: 600.0,
        channels: params.waveforms(),
    };
    write_ascii_event(&event, &cfg_path, &dat_path)?;

    info!(cfg = %cfg_path.display(), dat = %dat_path.display(), "synthetic event written");
    println!("Wrote {}", cfg_path.display());
    println!("Wrote {}", dat_path.display());
    println!(
        "Analyze with: flare analyze {} {} --ct-ratio 400 --vt-ratio 600 \
         --line-type 69kv --line-length 50",
        cfg_path.display(),
        dat_path.display()
    );
    Ok(())
}
