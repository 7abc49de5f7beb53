use std::collections::HashMap;

use crate::observability::format_table;

use super::{Record, RecordStatus};

/// Distribution of primary classes over a finished run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassSummary {
    /// Sorted by count descending, then by class name
    pub counts: Vec<(String, usize)>,
    pub no_class: usize,
    pub unresolved: usize,
}

impl ClassSummary {
    pub fn resolved(&self) -> usize {
        self.counts.iter().map(|(_, n)| n).sum()
    }

    pub fn to_table(&self) -> String {
        let mut rows: Vec<Vec<String>> = self
            .counts
            .iter()
            .map(|(class, n)| vec![class.clone(), n.to_string()])
            .collect();
        if self.no_class > 0 {
            rows.push(vec!["(no class)".to_string(), self.no_class.to_string()]);
        }
        if self.unresolved > 0 {
            rows.push(vec!["(unresolved)".to_string(), self.unresolved.to_string()]);
        }

        format_table(&["Class", "Count"], &rows)
    }
}

pub fn class_counts(records: &[Record]) -> ClassSummary {
    let mut by_class: HashMap<&str, usize> = HashMap::new();
    let mut summary = ClassSummary::default();

    for record in records {
        match &record.status {
            RecordStatus::Resolved(r) => *by_class.entry(r.primary_class.as_str()).or_default() += 1,
            RecordStatus::NoClass => summary.no_class += 1,
            RecordStatus::Pending => summary.unresolved += 1,
        }
    }

    let mut counts: Vec<(String, usize)> = by_class
        .into_iter()
        .map(|(class, n)| (class.to_string(), n))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    summary.counts = counts;

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{ClassScore, ClassificationResult};

    fn resolved(id: usize, class: &str) -> Record {
        let mut record = Record::new(id, format!("text {id}"));
        record.apply(&ClassificationResult::new(vec![ClassScore {
            name: class.to_string(),
            score: 0.9,
        }]));
        record
    }

    #[test]
    fn test_class_counts() {
        let mut no_class = Record::new(4, "empty");
        no_class.apply(&ClassificationResult::default());

        let records = vec![
            resolved(0, "pension"),
            resolved(1, "address"),
            resolved(2, "pension"),
            resolved(3, "bank"),
            no_class,
            Record::new(5, "never answered"),
        ];

        let summary = class_counts(&records);

        assert_eq!(
            summary.counts,
            vec![
                ("pension".to_string(), 2),
                ("address".to_string(), 1),
                ("bank".to_string(), 1),
            ]
        );
        assert_eq!(summary.resolved(), 4);
        assert_eq!(summary.no_class, 1);
        assert_eq!(summary.unresolved, 1);

        let table = summary.to_table();
        assert!(table.contains("| pension      | 2     |"));
        assert!(table.contains("(unresolved)"));
    }

    #[test]
    fn test_empty_run() {
        let summary = class_counts(&[]);
        assert_eq!(summary, ClassSummary::default());
        assert_eq!(summary.to_table(), "");
    }
}
