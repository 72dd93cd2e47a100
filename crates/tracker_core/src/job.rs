use serde::{Deserialize, Serialize};

use crate::ProgressSnapshot;

/// Region code identifying a job (digits only, e.g. `88015200`).
pub type JobKey = String;

/// Identifies one opened live stream; a reopened stream gets a new id.
pub type StreamId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoarseStatus {
    #[serde(rename = "pendente")]
    Pending,
    #[serde(rename = "processando")]
    Active,
    #[serde(rename = "concluido")]
    Done,
    #[serde(rename = "erro")]
    Failed,
}

impl CoarseStatus {
    /// Pending and active jobs keep the polling loop alive.
    pub fn is_in_flight(self) -> bool {
        matches!(self, CoarseStatus::Pending | CoarseStatus::Active)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PropertyKind {
    #[default]
    #[serde(rename = "apartamento")]
    Apartment,
    #[serde(rename = "casa")]
    House,
}

impl PropertyKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "apartamento" | "apartment" | "apto" => Some(PropertyKind::Apartment),
            "casa" | "house" => Some(PropertyKind::House),
            _ => None,
        }
    }

    pub fn short_label(self) -> &'static str {
        match self {
            PropertyKind::Apartment => "Apto",
            PropertyKind::House => "Casa",
        }
    }
}

/// Coarse job record as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: u64,
    #[serde(rename = "cep")]
    pub code: JobKey,
    #[serde(rename = "tipo", default)]
    pub kind: Option<PropertyKind>,
    pub status: CoarseStatus,
    #[serde(rename = "tentativas", default)]
    pub attempts: u32,
    #[serde(rename = "erro_msg", default)]
    pub error_message: Option<String>,
    #[serde(rename = "total_anuncios", default)]
    pub result_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveStream {
    pub stream_id: StreamId,
    pub snapshot: ProgressSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub key: JobKey,
    pub id: u64,
    pub kind: Option<PropertyKind>,
    pub status: CoarseStatus,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub result_count: u32,
    pub live: Option<LiveStream>,
    /// Terminal snapshot of the last stream, kept while the job stays done.
    pub completed: Option<ProgressSnapshot>,
}

impl Job {
    pub fn from_record(record: JobRecord) -> Self {
        let mut job = Self {
            key: record.code.clone(),
            id: record.id,
            kind: None,
            status: record.status,
            attempts: 0,
            last_error: None,
            result_count: 0,
            live: None,
            completed: None,
        };
        job.apply_coarse(record);
        job
    }

    /// Overwrites the poll-owned fields; `live` is left alone.
    ///
    /// The completed snapshot is dropped once the job is no longer done.
    pub(crate) fn apply_coarse(&mut self, record: JobRecord) {
        if record.status != CoarseStatus::Done {
            self.completed = None;
        }
        self.id = record.id;
        self.kind = record.kind;
        self.status = record.status;
        self.attempts = record.attempts;
        self.last_error = match record.status {
            CoarseStatus::Failed => record.error_message,
            _ => None,
        };
        self.result_count = record.result_count;
    }
}

/// Strips everything but digits from operator input (`88015-200` -> `88015200`).
pub fn normalize_region_code(raw: &str) -> Option<JobKey> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

/// Formats an 8-digit code as `12345-678`; anything else is returned unchanged.
pub fn format_region_code(code: &str) -> String {
    let digits: String = code.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != 8 {
        return code.to_string();
    }
    format!("{}-{}", &digits[..5], &digits[5..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_decodes_backend_field_names() {
        let json = r#"{
            "id": 7,
            "cep": "88015200",
            "tipo": "casa",
            "status": "erro",
            "erro_msg": "timeout",
            "tentativas": 2,
            "total_anuncios": 0,
            "criado_em": "2026-01-01T00:00:00",
            "atualizado_em": "2026-01-01T00:00:00"
        }"#;
        let record: JobRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, 7);
        assert_eq!(record.code, "88015200");
        assert_eq!(record.kind, Some(PropertyKind::House));
        assert_eq!(record.status, CoarseStatus::Failed);
        assert_eq!(record.error_message.as_deref(), Some("timeout"));
        assert_eq!(record.attempts, 2);
    }

    #[test]
    fn record_tolerates_null_kind_and_error() {
        let json = r#"{"id":1,"cep":"01001000","tipo":null,"status":"pendente","erro_msg":null,"tentativas":0,"total_anuncios":0}"#;
        let record: JobRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.kind, None);
        assert_eq!(record.status, CoarseStatus::Pending);
    }

    #[test]
    fn last_error_only_kept_while_failed() {
        let job = Job::from_record(JobRecord {
            id: 1,
            code: "01001000".into(),
            kind: None,
            status: CoarseStatus::Active,
            attempts: 1,
            error_message: Some("stale".into()),
            result_count: 0,
        });
        assert_eq!(job.last_error, None);
    }

    #[test]
    fn region_codes_are_normalized_and_formatted() {
        assert_eq!(normalize_region_code(" 88015-200 ").as_deref(), Some("88015200"));
        assert_eq!(normalize_region_code("abc"), None);
        assert_eq!(format_region_code("88015200"), "88015-200");
        assert_eq!(format_region_code("123"), "123");
    }
}
