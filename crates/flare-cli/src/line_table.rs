//! Built-in line parameter table.
//!
//! The analytic core takes line parameters through the
//! [`LineParameterProvider`] seam; this table is the concrete provider the
//! CLI injects. Adding a line type here never touches location logic.

use flare_core::{FlareError, FlareResult, LineParameterProvider, LineParameters};

/// One named line construction.
struct LineEntry {
    name: &'static str,
    aliases: &'static [&'static str],
    parameters: LineParameters,
}

/// The built-in table of known line constructions.
pub struct BuiltinLineTable {
    entries: Vec<LineEntry>,
}

impl Default for BuiltinLineTable {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltinLineTable {
    pub fn new() -> Self {
        Self {
            entries: vec![
                LineEntry {
                    name: "69 kV – ACSR HAWK 477",
                    aliases: &["69kv", "hawk477", "acsr-hawk-477"],
                    parameters: LineParameters::new(0.0839, 0.3927, 0.2530, 1.1780, 659.0),
                },
                LineEntry {
                    name: "13.8 kV – ACSR 266",
                    aliases: &["13.8kv", "acsr266", "acsr-266"],
                    parameters: LineParameters::new(0.1712, 0.3810, 0.3400, 1.1430, 340.0),
                },
            ],
        }
    }
}

/// Case/spacing-insensitive key for matching operator input.
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl LineParameterProvider for BuiltinLineTable {
    fn line_parameters(&self, line_type: &str) -> FlareResult<LineParameters> {
        let key = normalize(line_type);
        self.entries
            .iter()
            .find(|e| {
                normalize(e.name) == key || e.aliases.iter().any(|a| normalize(a) == key)
            })
            .map(|e| e.parameters)
            .ok_or_else(|| {
                FlareError::UnsupportedLineType(format!(
                    "{line_type} (known: {})",
                    self.line_types().join(", ")
                ))
            })
    }

    fn line_types(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.to_string()).collect()
    }
}
