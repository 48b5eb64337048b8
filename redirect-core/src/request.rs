//! Request model shared by the interceptors and their hosts.

use serde::{Deserialize, Serialize};

/// Resource type reported by the host for an outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    MainFrame,
    SubFrame,
    Stylesheet,
    Script,
    Image,
    Font,
    Media,
    #[serde(rename = "xmlhttprequest")]
    XmlHttpRequest,
    Ping,
    #[default]
    #[serde(other)]
    Other,
}

impl ResourceType {
    pub fn parse(value: &str) -> Self {
        match value {
            "main_frame" => ResourceType::MainFrame,
            "sub_frame" => ResourceType::SubFrame,
            "stylesheet" => ResourceType::Stylesheet,
            "script" => ResourceType::Script,
            "image" => ResourceType::Image,
            "font" => ResourceType::Font,
            "media" => ResourceType::Media,
            "xmlhttprequest" => ResourceType::XmlHttpRequest,
            "ping" | "beacon" => ResourceType::Ping,
            _ => ResourceType::Other,
        }
    }
}

/// An outgoing request as seen by an interceptor.
#[derive(Debug, Clone, PartialEq)]
pub struct InterceptedRequest {
    pub request_id: String,
    pub url: String,
    pub method: String,
    pub resource_type: ResourceType,
    /// Originating tab, `-1` when the request is not tied to a tab
    pub tab_id: i32,
    pub body: Option<Vec<u8>>,
    pub origin_url: Option<String>,
}

impl InterceptedRequest {
    pub fn new(request_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            url: url.into(),
            method: "GET".to_string(),
            resource_type: ResourceType::Other,
            tab_id: -1,
            body: None,
            origin_url: None,
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_resource_type(mut self, resource_type: ResourceType) -> Self {
        self.resource_type = resource_type;
        self
    }

    pub fn with_tab_id(mut self, tab_id: i32) -> Self {
        self.tab_id = tab_id;
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_origin_url(mut self, origin_url: impl Into<String>) -> Self {
        self.origin_url = Some(origin_url.into());
        self
    }

    pub fn is_method(&self, method: &str) -> bool {
        self.method.eq_ignore_ascii_case(method)
    }

    pub fn is_main_frame(&self) -> bool {
        self.resource_type == ResourceType::MainFrame
    }
}

/// The `details` object of a `webRequest.onBeforeRequest` event.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetails {
    pub request_id: String,
    pub url: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(rename = "type", default)]
    pub resource_type: ResourceType,
    #[serde(default = "default_tab_id")]
    pub tab_id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RequestBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<Vec<UploadData>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UploadData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<Vec<u8>>,
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_tab_id() -> i32 {
    -1
}

impl RequestBody {
    /// Concatenates every raw upload chunk. `None` when no chunk carries bytes.
    pub fn raw_bytes(&self) -> Option<Vec<u8>> {
        let chunks = self.raw.as_ref()?;
        let mut bytes = Vec::new();
        let mut any = false;
        for chunk in chunks {
            if let Some(b) = &chunk.bytes {
                bytes.extend_from_slice(b);
                any = true;
            }
        }
        any.then_some(bytes)
    }
}

impl From<RequestDetails> for InterceptedRequest {
    fn from(details: RequestDetails) -> Self {
        let body = details.request_body.as_ref().and_then(RequestBody::raw_bytes);
        InterceptedRequest {
            request_id: details.request_id,
            url: details.url,
            method: details.method,
            resource_type: details.resource_type,
            tab_id: details.tab_id,
            body,
            origin_url: details.origin_url.or(details.document_url),
        }
    }
}
