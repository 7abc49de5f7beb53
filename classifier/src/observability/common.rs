//! Progress reporting and plain-text tables for log output.

/// Which phase of a run a [`Progress`] update comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ProgressStage {
    /// `current`/`total` count batches of the initial pass
    #[default]
    Dispatch,
    /// `current`/`total` count reconciliation iterations
    Reconcile,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub stage: ProgressStage,
    pub current: usize,
    pub total: usize,
}

/// Callback invoked after each batch or reconciliation iteration
pub type TrackFn = dyn Fn(Progress) + Send + Sync;

impl Progress {
    pub fn percentage(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            (self.current as f32 / self.total as f32) * 100.0
        }
    }

    /// Format as "current / total"
    pub fn format_progress(&self) -> String {
        format!("{} / {}", self.current, self.total)
    }
}

/// Left-aligned plain-text table; empty when there are no rows
pub fn format_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .fold(h.chars().count(), usize::max)
        })
        .collect();

    let line = |cells: Vec<&str>| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:width$}", cell, width = width))
            .collect();
        format!("| {} |\n", padded.join(" | "))
    };

    let mut output = line(headers.to_vec());
    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    output.push_str(&format!("|-{}-|\n", separator.join("-|-")));
    for row in rows {
        output.push_str(&line(row.iter().map(String::as_str).collect()));
    }

    output
}

/// Format elapsed time as "Xm Ys" or "Ys"
pub fn format_elapsed_secs(secs: u64) -> String {
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}
