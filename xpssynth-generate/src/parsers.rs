use std::io;
use std::path::Path;

use xpssynth_data::SampleTable;

/// Columns of a tabulated shell file: photon energy, three cross-sections,
/// three asymmetry parameters.
const COLUMNS: usize = 7;

/// Parse one tab-separated shell table, keeping photon energy, `cs0` and
/// `beta0`. Rows that do not hold seven numbers are skipped.
pub fn parse_shell_table(path: &Path) -> io::Result<SampleTable> {
    let content = std::fs::read_to_string(path)?;
    let mut table = SampleTable::default();
    for (n, line) in content.lines().enumerate() {
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        let values: Result<Vec<f64>, _> = line
            .split(|c: char| c == '\t' || c == ',')
            .map(|v| v.trim().parse::<f64>())
            .collect();
        match values {
            Ok(v) if v.len() == COLUMNS => {
                table.photon_energy.push(v[0]);
                table.cross_section.push(v[1]);
                table.beta.push(v[4]);
            }
            _ => tracing::debug!(file = %path.display(), line = n + 1, "skipping row"),
        }
    }
    Ok(table)
}

/// File stem of the table covering `shell`: lowercase symbol followed by the
/// orbital with any spin-orbit suffix removed, e.g. `Ar` + `L3 2p3/2` → `ar2p`.
pub fn table_stem(symbol: &str, shell: &str) -> String {
    let orbital = shell.rsplit(' ').next().unwrap_or(shell);
    // Principal quantum number plus the orbital letter
    let digits = orbital.chars().take_while(|c| c.is_ascii_digit()).count();
    let end = orbital
        .char_indices()
        .nth(digits + 1)
        .map_or(orbital.len(), |(i, _)| i);
    let orbital = &orbital[..end];
    format!("{}{}", symbol.to_lowercase(), orbital)
}
