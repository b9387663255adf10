use serde::Serialize;

/// Request-scoped identity derived from a verified token. Built fresh for
/// every request and never persisted.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Principal {
    pub(crate) subject: String,
    pub(crate) identifier_id: i64,
    pub(crate) email: Option<String>,
    pub(crate) name: Option<String>,
    pub(crate) authorities: Vec<String>,
    pub(crate) authenticated: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum IdentifierType {
    Email,
    PhoneNumber,
}

impl IdentifierType {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            IdentifierType::Email => "EMAIL",
            IdentifierType::PhoneNumber => "PHONE_NUMBER",
        }
    }
}
