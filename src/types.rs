use serde::{Deserialize, Serialize};

use crate::SiputzxError;

/// Common `{ status, data, error? }` envelope returned by most API endpoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Unwraps `data`, turning `status: false` or a missing payload into [`SiputzxError::Api`].
    pub fn into_data(self) -> Result<T, SiputzxError> {
        if !self.status {
            return Err(SiputzxError::Api {
                message: self
                    .error
                    .unwrap_or_else(|| "upstream reported failure".to_owned()),
            });
        }
        self.data.ok_or_else(|| SiputzxError::Api {
            message: "response is missing data".to_owned(),
        })
    }
}
