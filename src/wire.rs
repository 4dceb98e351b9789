//! Request and response messages exchanged with the filter service.
//!
//! Every procedure is a `POST /rpc/<Method>` carrying one JSON request and
//! answering with one JSON response. Each response carries a [`Status`];
//! code `0` means the remote side accepted the request.
use serde::{Deserialize, Serialize};
use std::fmt;
#[cfg(feature = "server")]
use utoipa::ToSchema;

/// Liveness endpoint used for dialing and ping.
pub const HEALTH_PATH: &str = "/health";

/// Application level result codes carried in [`Status::code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    Ok,
    FilterNotFound,
    FilterExists,
    ElementNotFound,
    FilterFull,
    InvalidArgument,
    Internal,
    Unknown(i32),
}

impl Code {
    pub fn as_i32(self) -> i32 {
        match self {
            Code::Ok => 0,
            Code::FilterNotFound => 1,
            Code::FilterExists => 2,
            Code::ElementNotFound => 3,
            Code::FilterFull => 4,
            Code::InvalidArgument => 5,
            Code::Internal => 13,
            Code::Unknown(code) => code,
        }
    }
}

impl From<i32> for Code {
    fn from(code: i32) -> Self {
        match code {
            0 => Code::Ok,
            1 => Code::FilterNotFound,
            2 => Code::FilterExists,
            3 => Code::ElementNotFound,
            4 => Code::FilterFull,
            5 => Code::InvalidArgument,
            13 => Code::Internal,
            other => Code::Unknown(other),
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Code::Unknown(code) => write!(f, "Unknown({code})"),
            known => write!(f, "{known:?}({})", known.as_i32()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(ToSchema))]
pub struct Status {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

impl Status {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code: code.as_i32(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> Code {
        Code::from(self.code)
    }

    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

/// The remote procedures, in the order the service declares them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcMethod {
    CreateFilter,
    InsertElement,
    InsertElements,
    LookupElement,
    LookupElements,
    DeleteElement,
    DeleteFilter,
    ResetFilter,
    CountElements,
    ListFilters,
}

impl RpcMethod {
    pub fn name(self) -> &'static str {
        match self {
            RpcMethod::CreateFilter => "CreateFilter",
            RpcMethod::InsertElement => "InsertElement",
            RpcMethod::InsertElements => "InsertElements",
            RpcMethod::LookupElement => "LookupElement",
            RpcMethod::LookupElements => "LookupElements",
            RpcMethod::DeleteElement => "DeleteElement",
            RpcMethod::DeleteFilter => "DeleteFilter",
            RpcMethod::ResetFilter => "ResetFilter",
            RpcMethod::CountElements => "CountElements",
            RpcMethod::ListFilters => "ListFilters",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            RpcMethod::CreateFilter => "/rpc/CreateFilter",
            RpcMethod::InsertElement => "/rpc/InsertElement",
            RpcMethod::InsertElements => "/rpc/InsertElements",
            RpcMethod::LookupElement => "/rpc/LookupElement",
            RpcMethod::LookupElements => "/rpc/LookupElements",
            RpcMethod::DeleteElement => "/rpc/DeleteElement",
            RpcMethod::DeleteFilter => "/rpc/DeleteFilter",
            RpcMethod::ResetFilter => "/rpc/ResetFilter",
            RpcMethod::CountElements => "/rpc/CountElements",
            RpcMethod::ListFilters => "/rpc/ListFilters",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(ToSchema))]
pub struct CreateFilterRequest {
    pub filter_name: String,
    pub capacity: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(ToSchema))]
pub struct ElementRequest {
    pub filter_name: String,
    pub element: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(ToSchema))]
pub struct ElementsRequest {
    pub filter_name: String,
    #[serde(default)]
    pub elements: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(ToSchema))]
pub struct FilterRequest {
    pub filter_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(ToSchema))]
pub struct ListFiltersRequest {}

/// Reply for procedures whose only result is the status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(ToSchema))]
pub struct StatusResponse {
    #[serde(default)]
    pub status: Status,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(ToSchema))]
pub struct InsertElementsResponse {
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub failed_elements: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(ToSchema))]
pub struct LookupElementsResponse {
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub matched_elements: Vec<String>,
    #[serde(default)]
    pub unmatched_elements: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(ToSchema))]
pub struct CountElementsResponse {
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub len: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(ToSchema))]
pub struct ListFiltersResponse {
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub filters: Vec<String>,
}
