//! # HTTP Session Module / HTTP 会话模块
//!
//! A thin wrapper around a shared `reqwest::Client`: base URL, default
//! headers, cookie store and default timeout live here, and a
//! [`RequestSpec`] is turned into a sent request and a captured
//! [`ApiResponse`].
//!
//! 对共享 `reqwest::Client` 的轻量封装：基础 URL、默认请求头、cookie 存储与默认超时都在这里，
//! 并将 [`RequestSpec`] 转换为发送的请求和捕获的 [`ApiResponse`]。

use anyhow::{Context, Result, anyhow};
use indexmap::IndexMap;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Method};
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio_util::io::ReaderStream;

use crate::core::assertion::display_value;
use crate::core::models::{ApiResponse, FileUpload, RequestSpec};
use crate::infra::t;

/// The HTTP session shared by every case of a run. Cookies set by one case
/// are sent by the next.
/// 一次运行中所有用例共享的 HTTP 会话。一个用例设置的 cookie 会被后续用例发送。
#[derive(Debug, Clone)]
pub struct Session {
    client: reqwest::Client,
    base_url: String,
}

impl Session {
    /// Builds a session.
    ///
    /// # Arguments
    /// * `base_url` - Prefix of every request path
    /// * `default_headers` - Headers sent with every request
    /// * `timeout` - Default transport timeout, `None` waits indefinitely
    pub fn new(
        base_url: &str,
        default_headers: &IndexMap<String, String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in default_headers {
            let (name, value) = header_pair(name, value)?;
            headers.insert(name, value);
        }

        let mut builder = reqwest::Client::builder()
            .cookie_store(true)
            .default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .with_context(|| t!("http.client_build_failed").to_string())?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Concatenates the base URL and a request path.
    /// 拼接基础 URL 与请求路径。
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.is_empty() || path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Sends `spec` and captures the response.
    ///
    /// Any non-2xx status is still a response. Errors are request-building
    /// problems (unknown verb, bad header, unreadable upload) or transport
    /// failures; the upload file handle is owned by the request body and is
    /// released when this call returns, whatever the outcome.
    ///
    /// 发送 `spec` 并捕获响应。非 2xx 状态仍视为响应。错误仅来自请求构建问题或传输失败；
    /// 上传文件句柄归请求体所有，无论结果如何，都会在此调用返回时释放。
    pub async fn send(&self, spec: &RequestSpec) -> Result<ApiResponse> {
        let method = Method::from_bytes(spec.method.trim().to_ascii_uppercase().as_bytes())
            .map_err(|_| anyhow!(t!("http.invalid_method", method = spec.method).to_string()))?;
        let url = self.url_for(&spec.url);

        let mut request = self.client.request(method, &url);

        if let Some(headers) = &spec.headers {
            for (name, value) in headers {
                let (name, value) = header_pair(name, &display_value(value))?;
                request = request.header(name, value);
            }
        }
        if let Some(params) = &spec.params {
            let pairs: Vec<(&str, String)> = params
                .iter()
                .map(|(k, v)| (k.as_str(), display_value(v)))
                .collect();
            request = request.query(&pairs);
        }
        if let Some(timeout) = spec.timeout.filter(|t| *t > 0.0) {
            let timeout = Duration::try_from_secs_f64(timeout)
                .map_err(|_| anyhow!(t!("http.invalid_timeout", timeout = timeout).to_string()))?;
            request = request.timeout(timeout);
        }

        if let Some(upload) = &spec.files {
            request = request.multipart(multipart_form(upload, spec.data.as_ref()).await?);
        } else if let Some(data) = &spec.data {
            request = match data {
                Value::Object(fields) => {
                    let pairs: Vec<(&str, String)> = fields
                        .iter()
                        .map(|(k, v)| (k.as_str(), display_value(v)))
                        .collect();
                    request.form(&pairs)
                }
                other => request.body(display_value(other)),
            };
        }
        if let Some(json) = &spec.json {
            request = request.json(json);
        }

        let started = Instant::now();
        let response = request.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("<binary>").to_string()))
            .collect();
        let body = response.text().await?;

        Ok(ApiResponse {
            status,
            headers,
            body,
            elapsed: started.elapsed(),
        })
    }
}

/// Builds a multipart form that streams `upload` and carries mapping-valued
/// `data` as extra text fields.
async fn multipart_form(upload: &FileUpload, data: Option<&Value>) -> Result<Form> {
    let file = tokio::fs::File::open(&upload.path)
        .await
        .with_context(|| t!("http.upload_open_failed", path = upload.path.display()).to_string())?;
    let length = file.metadata().await.ok().map(|m| m.len());
    let file_name = upload
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    let body = Body::wrap_stream(ReaderStream::new(file));
    let part = match length {
        Some(length) => Part::stream_with_length(body, length),
        None => Part::stream(body),
    }
    .file_name(file_name)
    .mime_str(&upload.mime_type)
    .with_context(|| t!("http.invalid_mime", mime = upload.mime_type).to_string())?;

    let mut form = Form::new();
    if let Some(Value::Object(fields)) = data {
        for (name, value) in fields {
            form = form.text(name.clone(), display_value(value));
        }
    }
    Ok(form.part(upload.field_name.clone(), part))
}

fn header_pair(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::from_bytes(name.trim().as_bytes())
        .with_context(|| t!("http.invalid_header", name = name).to_string())?;
    let header_value = HeaderValue::from_str(value.trim())
        .with_context(|| t!("http.invalid_header", name = name).to_string())?;
    Ok((header_name, header_value))
}
