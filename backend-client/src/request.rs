use std::io;
use std::path::Path;

use reqwest::Method;
use reqwest::RequestBuilder;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

/// A replayable description of one backend call.
///
/// `reqwest` builders are consumed on send, so the client keeps this around
/// and rebuilds the request when it has to be retried with a fresh token.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    body: RequestBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    File(FileUpload),
}

/// A file sent as the `file` field of a multipart form.
#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: Option<String>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            mime: None,
        }
    }

    pub fn from_path(path: &Path) -> io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(file_name, bytes))
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>, body: RequestBody) -> Self {
        Self {
            method,
            path: path.into(),
            body,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path, RequestBody::Empty)
    }

    pub fn post_json<T: Serialize + ?Sized>(path: impl Into<String>, body: &T) -> Result<Self> {
        Ok(Self::new(
            Method::POST,
            path,
            RequestBody::Json(serde_json::to_value(body)?),
        ))
    }

    pub fn post_file(path: impl Into<String>, upload: FileUpload) -> Self {
        Self::new(Method::POST, path, RequestBody::File(upload))
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    pub(crate) fn build(
        &self,
        http: &reqwest::Client,
        base_url: &str,
        access_token: Option<&str>,
    ) -> Result<RequestBuilder> {
        let url = join_url(base_url, &self.path);
        let mut builder = http.request(self.method.clone(), url);
        if let Some(token) = access_token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let builder = match &self.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::File(upload) => {
                let mut part = multipart::Part::bytes(upload.bytes.clone())
                    .file_name(upload.file_name.clone());
                if let Some(mime) = &upload.mime {
                    part = part.mime_str(mime)?;
                }
                builder.multipart(multipart::Form::new().part("file", part))
            }
        };
        Ok(builder)
    }
}

pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}
