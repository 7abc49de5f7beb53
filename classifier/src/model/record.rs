use serde::Serialize;

use crate::{
    classify::assembler::{assemble, format_score, AssembledResult},
    service::ClassificationResult,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecordStatus {
    /// No response obtained yet
    #[default]
    Pending,
    /// The service answered but returned no classes
    NoClass,
    Resolved(AssembledResult),
}

/// One input row with its classification fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Position in the caller's input
    pub id: usize,
    pub text: String,
    pub status: RecordStatus,
}

impl Record {
    pub fn new(id: usize, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            status: RecordStatus::Pending,
        }
    }

    /// Merge subject and body into the text sent for classification
    pub fn from_email(
        id: usize,
        subject_prefix: &str,
        subject: Option<&str>,
        body: Option<&str>,
    ) -> Self {
        let text = format!(
            "{}{}\n\n{}",
            subject_prefix,
            subject.unwrap_or(""),
            body.unwrap_or("")
        );
        Self::new(id, text)
    }

    pub fn from_texts<I, S>(texts: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        texts
            .into_iter()
            .enumerate()
            .map(|(id, text)| Self::new(id, text))
            .collect()
    }

    pub fn is_resolved(&self) -> bool {
        matches!(&self.status, RecordStatus::Resolved(r) if !r.primary_class.is_empty())
    }

    /// Still waiting for any response from the service. A `NoClass` record has
    /// its answer and is not pending, so reconciliation never re-submits it.
    pub fn is_pending(&self) -> bool {
        self.status == RecordStatus::Pending
    }

    pub fn result(&self) -> Option<&AssembledResult> {
        match &self.status {
            RecordStatus::Resolved(r) => Some(r),
            _ => None,
        }
    }

    pub fn primary_class(&self) -> Option<&str> {
        self.result().map(|r| r.primary_class.as_str())
    }

    /// Store a service response. Resolved records are never overwritten.
    pub fn apply(&mut self, raw: &ClassificationResult) -> bool {
        if self.is_resolved() {
            return false;
        }

        self.status = match assemble(raw) {
            Some(assembled) if !assembled.primary_class.is_empty() => {
                RecordStatus::Resolved(assembled)
            }
            _ => RecordStatus::NoClass,
        };
        true
    }

    pub fn display_row(&self) -> DisplayRow {
        match self.result() {
            Some(r) => DisplayRow {
                id: self.id,
                primary_class: r.primary_class.clone(),
                primary_score: format_score(r.primary_score),
                other_classes: r.secondary_classes.join(", "),
                other_scores: r
                    .secondary_scores
                    .iter()
                    .map(|s| format_score(*s))
                    .collect::<Vec<_>>()
                    .join(", "),
            },
            None => DisplayRow {
                id: self.id,
                ..Default::default()
            },
        }
    }
}

/// Presentation form of a record: lists joined, scores as `xx.xx%`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DisplayRow {
    pub id: usize,
    pub primary_class: String,
    pub primary_score: String,
    pub other_classes: String,
    pub other_scores: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ClassScore;

    fn raw(classes: &[(&str, f64)]) -> ClassificationResult {
        ClassificationResult::new(
            classes
                .iter()
                .map(|(name, score)| ClassScore {
                    name: name.to_string(),
                    score: *score,
                })
                .collect(),
        )
    }

    #[test]
    fn test_from_email_merges_subject_and_body() {
        let record = Record::from_email(
            3,
            "Betreff: ",
            Some("Neue Adresse"),
            Some("Bitte ändern Sie meine Adresse."),
        );

        assert_eq!(record.id, 3);
        assert_eq!(
            record.text,
            "Betreff: Neue Adresse\n\nBitte ändern Sie meine Adresse."
        );
        assert!(record.is_pending());
    }

    #[test]
    fn test_from_email_missing_fields() {
        let record = Record::from_email(0, "Subject: ", None, Some("body only"));
        assert_eq!(record.text, "Subject: \n\nbody only");
    }

    #[test]
    fn test_apply_resolves_and_never_overwrites() {
        let mut record = Record::new(0, "text");

        assert!(record.apply(&raw(&[("first", 0.8), ("second", 0.2)])));
        assert!(record.is_resolved());

        assert!(!record.apply(&raw(&[("other", 0.99)])));
        assert_eq!(record.primary_class(), Some("first"));
    }

    #[test]
    fn test_empty_response_is_no_class() {
        let mut record = Record::new(0, "text");

        record.apply(&ClassificationResult::default());

        assert_eq!(record.status, RecordStatus::NoClass);
        assert!(!record.is_resolved());
        assert!(!record.is_pending());
        assert_eq!(record.primary_class(), None);
    }

    #[test]
    fn test_display_row() {
        let mut record = Record::new(7, "text");
        record.apply(&raw(&[("pension", 0.9), ("address", 0.075), ("bank", 0.025)]));

        let row = record.display_row();
        assert_eq!(row.id, 7);
        assert_eq!(row.primary_class, "pension");
        assert_eq!(row.primary_score, "90.00%");
        assert_eq!(row.other_classes, "address, bank");
        assert_eq!(row.other_scores, "7.50%, 2.50%");
    }

    #[test]
    fn test_unresolved_display_row_is_empty() {
        let row = Record::new(2, "text").display_row();
        assert_eq!(
            row,
            DisplayRow {
                id: 2,
                ..Default::default()
            }
        );
    }
}
