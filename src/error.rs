use thiserror::Error;

/// Maximum length of an upstream error body carried in a message.
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// A recognised failure of the scraping service.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("scraping service unreachable: {0}")]
    Network(#[from] reqwest::Error),

    #[error("scraping service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed scraping service response: {0}")]
    Malformed(String),
}

impl ServiceError {
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        ServiceError::Status {
            status: status.as_u16(),
            body: truncate_body(body),
        }
    }
}

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_owned();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
}

/// Failure of a [`crate::source::ConferenceSource`] call.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}
