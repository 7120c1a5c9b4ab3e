//! Text rendering of an analysis report.

use std::io::Write as _;

use tabwriter::TabWriter;

use flare_algo::AnalysisReport;
use flare_core::FlareResult;

/// Render the full text report: executive summary, sequence ratios, and
/// the per-method comparison table.
pub fn render_text(report: &AnalysisReport) -> FlareResult<String> {
    let mut out = String::new();

    let r = &report.record;
    out.push_str(&format!(
        "Event {} | {:.0} Hz sampling | {} samples ({:.1} ms)\n",
        r.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
        r.sample_rate_hz,
        r.n_samples,
        r.duration_ms
    ));

    let c = &report.classification;
    out.push_str(&format!(
        "Fault type {} | phases {} | confidence {}\n",
        c.fault_type,
        c.phases_display(),
        c.confidence
    ));
    if let (Some(onset), Some(clear), Some(duration)) = (c.onset_ms, c.clear_ms, c.duration_ms) {
        out.push_str(&format!(
            "Onset {onset:.1} ms | cleared {clear:.1} ms | duration {duration:.1} ms\n"
        ));
    }

    if let Some(sym) = &report.symmetrical {
        out.push_str(&format!(
            "Sequence ratios |I2/I1| {} | |I0/I1| {}\n",
            format_ratio(sym.i2_i1_ratio),
            format_ratio(sym.i0_i1_ratio)
        ));
    }

    if report.locations.is_empty() {
        out.push_str("\nNo location estimate: no classifiable fault loop.\n");
        return Ok(out);
    }

    out.push('\n');
    let mut tw = TabWriter::new(Vec::new());
    writeln!(tw, "Method\tDistance (km)\tDistance (%)\tZf (Ω)\tRf (Ω)\tConfidence")
        .map_err(|e| flare_core::FlareError::Other(e.to_string()))?;
    for result in report.locations.values() {
        writeln!(
            tw,
            "{}\t{:.3}\t{:.2}%\t{:.3}+j{:.3}\t{:.3}\t{}",
            result.method.display_name(),
            result.distance_km,
            result.distance_pct,
            result.zf_r,
            result.zf_x,
            result.rf,
            result.confidence
        )
        .map_err(|e| flare_core::FlareError::Other(e.to_string()))?;
    }
    let table = tw
        .into_inner()
        .map_err(|e| flare_core::FlareError::Other(e.to_string()))?;
    out.push_str(&String::from_utf8_lossy(&table));

    if let Some(best) = report.recommended_result() {
        out.push_str(&format!(
            "\nRecommended ({}): {:.3} km ({:.2}% of line), Rf {:.3} Ω, |Zf| {:.3} Ω\n",
            best.method.display_name(),
            best.distance_km,
            best.distance_pct,
            best.rf,
            best.zf_mag
        ));
    }

    Ok(out)
}

fn format_ratio(ratio: f64) -> String {
    if ratio.is_finite() {
        format!("{ratio:.4}")
    } else {
        "undefined".to_string()
    }
}
