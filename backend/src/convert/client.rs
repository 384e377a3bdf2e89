//! Client for the remote conversion service
//!
//! Wraps a single HTTPS call: the file content travels base64-encoded in a
//! JSON parameter list, the response lists the produced output files. The
//! client holds no per-call state; concurrent invocations are independent.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::config::ConvertApiSettings;
use crate::convert::error::ConvertError;

/// Request payload for the conversion service
#[derive(Debug, Serialize)]
pub struct ConversionRequest {
    #[serde(rename = "Parameters")]
    parameters: Vec<Parameter>,
}

impl ConversionRequest {
    /// Build the request for one file, asking the service to store the
    /// result and hand back a retrieval URL
    fn for_file(file_name: &str, base64_data: String) -> Self {
        Self {
            parameters: vec![
                Parameter {
                    name: "File",
                    file_value: Some(FileValue {
                        name: file_name.to_string(),
                        data: base64_data,
                    }),
                    value: None,
                },
                Parameter {
                    name: "StoreFile",
                    file_value: None,
                    value: Some(serde_json::Value::Bool(true)),
                },
            ],
        }
    }
}

#[derive(Debug, Serialize)]
struct Parameter {
    #[serde(rename = "Name")]
    name: &'static str,
    #[serde(rename = "FileValue", skip_serializing_if = "Option::is_none")]
    file_value: Option<FileValue>,
    #[serde(rename = "Value", skip_serializing_if = "Option::is_none")]
    value: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct FileValue {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Data")]
    data: String,
}

/// Successful response from the conversion service
#[derive(Debug, Clone, Deserialize)]
pub struct ConversionResponse {
    #[serde(rename = "ConversionCost", default)]
    pub conversion_cost: u64,
    #[serde(rename = "Files", default)]
    pub files: Vec<OutputFile>,
}

/// One produced output file; carries a retrieval URL, inline data, or both
#[derive(Debug, Clone, Deserialize)]
pub struct OutputFile {
    #[serde(rename = "FileName")]
    pub file_name: String,
    #[serde(rename = "FileExt", default)]
    pub file_ext: String,
    #[serde(rename = "FileSize", default)]
    pub file_size: u64,
    #[serde(rename = "FileData")]
    pub file_data: Option<String>,
    #[serde(rename = "Url")]
    pub url: Option<String>,
}

/// Thin wrapper around the conversion service's HTTP API
#[derive(Clone)]
pub struct ConvertClient {
    http: reqwest::Client,
    base_url: Url,
    token: String,
}

impl ConvertClient {
    pub fn new(settings: &ConvertApiSettings) -> Result<Self, ConvertError> {
        let http = reqwest::Client::builder()
            .user_agent("FileFlexer/1.0")
            .build()?;

        Ok(Self {
            http,
            base_url: settings.base_url.clone(),
            token: settings.token.clone(),
        })
    }

    fn conversion_url(&self, from_format: &str, to_format: &str) -> String {
        format!(
            "{}/convert/{}/to/{}",
            self.base_url.as_str().trim_end_matches('/'),
            from_format,
            to_format
        )
    }

    /// Convert one file from `from_format` to `to_format`
    ///
    /// The token is assumed valid; the service rejects it with a non-success
    /// status otherwise, which surfaces as [`ConvertError::Api`].
    pub async fn convert(
        &self,
        from_format: &str,
        to_format: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<ConversionResponse, ConvertError> {
        if bytes.is_empty() {
            return Err(ConvertError::Read(format!("{file_name} is empty")));
        }

        let body = ConversionRequest::for_file(file_name, BASE64.encode(bytes));
        let url = self.conversion_url(from_format, to_format);
        debug!("Submitting {} ({} bytes) to {}", file_name, bytes.len(), url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            let message = if message.trim().is_empty() {
                status.to_string()
            } else {
                message
            };
            return Err(ConvertError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<ConversionResponse>().await?)
    }
}
