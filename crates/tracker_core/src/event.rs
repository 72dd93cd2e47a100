//! Typed progress events pushed by the backend on a job's live stream.
//!
//! The backend names each server-sent event (`event: busca_iniciada`) and
//! carries a JSON object in its `data` field. [`ProgressEvent::decode`] turns
//! one such frame into a variant of the closed set below.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

/// Every event name the reducer understands.
pub const KNOWN_EVENT_NAMES: [&str; 8] = [
    "consultando_viacep",
    "endereco_obtido",
    "busca_iniciada",
    "cards_encontrados",
    "enriquecendo_detalhe",
    "robo_concluido",
    "anuncio_salvo",
    "concluido",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// `consultando_viacep`
    LookingUpAddress { source: Option<String> },
    /// `endereco_obtido`
    AddressResolved {
        source: Option<String>,
        address: String,
    },
    /// `busca_iniciada`
    SearchStarted {
        source: Option<String>,
        site: String,
    },
    /// `cards_encontrados`
    CardsFound { source: Option<String>, total: u32 },
    /// `enriquecendo_detalhe`
    EnrichingDetail {
        source: Option<String>,
        current: u32,
        total: u32,
    },
    /// `robo_concluido`
    SiteFinished {
        source: Option<String>,
        listings: u32,
    },
    /// `anuncio_salvo`
    ListingSaved {
        source: Option<String>,
        saved: u32,
        total: u32,
    },
    /// `concluido`
    Completed {
        source: Option<String>,
        total_saved: u32,
    },
    /// Any name outside [`KNOWN_EVENT_NAMES`].
    Unknown { name: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed `{name}` payload: {reason}")]
pub struct EventDecodeError {
    pub name: String,
    pub reason: String,
}

#[derive(Deserialize)]
struct SourceOnly {
    #[serde(default)]
    worker: Option<String>,
}

#[derive(Deserialize)]
struct AddressPayload {
    #[serde(default)]
    worker: Option<String>,
    endereco: String,
}

#[derive(Deserialize)]
struct SearchPayload {
    #[serde(default)]
    worker: Option<String>,
    robo: String,
}

#[derive(Deserialize)]
struct CardsPayload {
    #[serde(default)]
    worker: Option<String>,
    total: u32,
}

#[derive(Deserialize)]
struct EnrichPayload {
    #[serde(default)]
    worker: Option<String>,
    atual: u32,
    total: u32,
}

#[derive(Deserialize)]
struct SiteFinishedPayload {
    #[serde(default)]
    worker: Option<String>,
    anuncios: u32,
}

#[derive(Deserialize)]
struct SavedPayload {
    #[serde(default)]
    worker: Option<String>,
    salvos: u32,
    total: u32,
}

#[derive(Deserialize)]
struct CompletedPayload {
    #[serde(default)]
    worker: Option<String>,
    total_salvos: u32,
}

impl ProgressEvent {
    /// Decodes one named frame. Unknown names are not an error.
    pub fn decode(name: &str, data: &str) -> Result<Self, EventDecodeError> {
        let event = match name {
            "consultando_viacep" => {
                let p: SourceOnly = payload(name, data)?;
                ProgressEvent::LookingUpAddress { source: p.worker }
            }
            "endereco_obtido" => {
                let p: AddressPayload = payload(name, data)?;
                ProgressEvent::AddressResolved {
                    source: p.worker,
                    address: p.endereco,
                }
            }
            "busca_iniciada" => {
                let p: SearchPayload = payload(name, data)?;
                ProgressEvent::SearchStarted {
                    source: p.worker,
                    site: p.robo,
                }
            }
            "cards_encontrados" => {
                let p: CardsPayload = payload(name, data)?;
                ProgressEvent::CardsFound {
                    source: p.worker,
                    total: p.total,
                }
            }
            "enriquecendo_detalhe" => {
                let p: EnrichPayload = payload(name, data)?;
                ProgressEvent::EnrichingDetail {
                    source: p.worker,
                    current: p.atual,
                    total: p.total,
                }
            }
            "robo_concluido" => {
                let p: SiteFinishedPayload = payload(name, data)?;
                ProgressEvent::SiteFinished {
                    source: p.worker,
                    listings: p.anuncios,
                }
            }
            "anuncio_salvo" => {
                let p: SavedPayload = payload(name, data)?;
                ProgressEvent::ListingSaved {
                    source: p.worker,
                    saved: p.salvos,
                    total: p.total,
                }
            }
            "concluido" => {
                let p: CompletedPayload = payload(name, data)?;
                ProgressEvent::Completed {
                    source: p.worker,
                    total_saved: p.total_salvos,
                }
            }
            other => ProgressEvent::Unknown {
                name: other.to_string(),
            },
        };
        Ok(event)
    }

    pub fn source(&self) -> Option<&str> {
        match self {
            ProgressEvent::LookingUpAddress { source }
            | ProgressEvent::AddressResolved { source, .. }
            | ProgressEvent::SearchStarted { source, .. }
            | ProgressEvent::CardsFound { source, .. }
            | ProgressEvent::EnrichingDetail { source, .. }
            | ProgressEvent::SiteFinished { source, .. }
            | ProgressEvent::ListingSaved { source, .. }
            | ProgressEvent::Completed { source, .. } => source.as_deref(),
            ProgressEvent::Unknown { .. } => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressEvent::Completed { .. })
    }
}

fn payload<T: DeserializeOwned>(name: &str, data: &str) -> Result<T, EventDecodeError> {
    serde_json::from_str(data).map_err(|err| EventDecodeError {
        name: name.to_string(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_search_started() {
        let event = ProgressEvent::decode("busca_iniciada", r#"{"robo":"zap","worker":"w-1"}"#)
            .unwrap();
        assert_eq!(
            event,
            ProgressEvent::SearchStarted {
                source: Some("w-1".into()),
                site: "zap".into(),
            }
        );
        assert_eq!(event.source(), Some("w-1"));
    }

    #[test]
    fn decode_enrichment_uses_backend_field_names() {
        let event =
            ProgressEvent::decode("enriquecendo_detalhe", r#"{"atual":3,"total":12}"#).unwrap();
        assert_eq!(
            event,
            ProgressEvent::EnrichingDetail {
                source: None,
                current: 3,
                total: 12,
            }
        );
    }

    #[test]
    fn decode_lookup_accepts_empty_object() {
        let event = ProgressEvent::decode("consultando_viacep", "{}").unwrap();
        assert_eq!(event, ProgressEvent::LookingUpAddress { source: None });
    }

    #[test]
    fn decode_completed_is_terminal() {
        let event = ProgressEvent::decode("concluido", r#"{"total_salvos":9}"#).unwrap();
        assert!(event.is_terminal());
    }

    #[test]
    fn unknown_name_is_not_an_error() {
        let event = ProgressEvent::decode("foo_bar", "not even json").unwrap();
        assert_eq!(
            event,
            ProgressEvent::Unknown {
                name: "foo_bar".into()
            }
        );
    }

    #[test]
    fn missing_field_is_malformed() {
        let err = ProgressEvent::decode("anuncio_salvo", r#"{"salvos":1}"#).unwrap_err();
        assert_eq!(err.name, "anuncio_salvo");
    }

    #[test]
    fn invalid_json_is_malformed() {
        assert!(ProgressEvent::decode("cards_encontrados", "{total:").is_err());
    }

    #[test]
    fn negative_counter_is_malformed() {
        assert!(ProgressEvent::decode("cards_encontrados", r#"{"total":-1}"#).is_err());
    }
}
