/// Usage of one filesystem as reported by `df`, converted to bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskUsage {
    pub capacity: u64,
    pub used: u64,
    pub available: u64,
}

impl DiskUsage {
    /// Used share of the capacity, rounded down
    pub fn percentage(&self) -> u64 {
        if self.capacity == 0 {
            return 0;
        }
        self.used * 100 / self.capacity
    }
}

const KIB: u64 = 1024;

/// Parse the output of `df <path>`. Counters are 1K blocks.
///
/// Only rows whose last five fields read capacity, used, available, use% and
/// mount point are accepted. Wrapped rows (long device names on their own
/// line) work because only the trailing fields are looked at. When several
/// rows qualify, the last one wins.
pub fn parse_df_output(output: &str) -> Option<DiskUsage> {
    output.lines().filter_map(parse_df_row).last()
}

fn parse_df_row(line: &str) -> Option<DiskUsage> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    // the header row has seven fields ("Mounted on")
    if fields.len() < 5 || fields.len() > 6 {
        return None;
    }
    let tail = &fields[fields.len() - 5..];
    let capacity = parse_blocks(tail[0])?;
    let used = parse_blocks(tail[1])?;
    let available = parse_blocks(tail[2])?;
    if capacity == 0 || used > capacity {
        return None;
    }
    Some(DiskUsage {
        capacity: capacity.checked_mul(KIB)?,
        used: used.checked_mul(KIB)?,
        available: available.checked_mul(KIB)?,
    })
}

fn parse_blocks(field: &str) -> Option<u64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

/// Render a byte count with binary units, e.g. `1.50 KB`
pub fn bytes_to_human_readable(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < KIB {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / KIB as f64;
    let mut unit = 0;
    while value >= KIB as f64 && unit < UNITS.len() - 1 {
        value /= KIB as f64;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}
