use serde::{Serialize, Serializer};
use std::fmt;

/// Error taxonomy shared by every rackscan component. Sentinel variants
/// cover the common failure classes, structured variants carry the
/// context needed to report a specific Redfish or config failure.
#[derive(Debug, Clone, PartialEq)]
pub enum InventoryError {
    AuthFailed,
    NotFound,
    Timeout,
    ConnectionFailed,
    InvalidResponse,
    Cancelled,
    Redfish {
        host: String,
        path: String,
        status: u16,
        status_text: String,
        body: String,
    },
    Collection {
        host: String,
        component: String,
        source: Box<InventoryError>,
    },
    Config {
        field: String,
        message: String,
    },
    DeviceNotFound {
        service_tag: String,
        serial: String,
    },
    Aggregate(Vec<InventoryError>),
}

impl InventoryError {
    pub fn redfish(host: &str, path: &str, status: u16, status_text: &str, body: &str) -> Self {
        InventoryError::Redfish {
            host: host.to_string(),
            path: path.to_string(),
            status,
            status_text: status_text.to_string(),
            body: body.to_string(),
        }
    }

    pub fn collection(host: &str, component: &str, source: InventoryError) -> Self {
        InventoryError::Collection {
            host: host.to_string(),
            component: component.to_string(),
            source: Box::new(source),
        }
    }

    pub fn config(field: &str, message: &str) -> Self {
        InventoryError::Config {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    /// Collapse a list of errors into a single `Aggregate`, or `None`
    /// when the list is empty.
    pub fn aggregate(errors: Vec<InventoryError>) -> Option<InventoryError> {
        if errors.is_empty() {
            return None;
        }
        Some(InventoryError::Aggregate(errors))
    }

    /// Structural membership test. An error `is` a target when it equals
    /// the target, wraps it as a collection cause, or contains it as an
    /// aggregate member (recursively).
    pub fn is(&self, target: &InventoryError) -> bool {
        if self == target {
            return true;
        }
        match self {
            InventoryError::Collection { source, .. } => source.is(target),
            InventoryError::Aggregate(members) => members.iter().any(|err| err.is(target)),
            _ => false,
        }
    }

    /// True for credential failures, including 401/403 Redfish responses.
    pub fn is_auth_error(&self) -> bool {
        match self {
            InventoryError::AuthFailed => true,
            InventoryError::Redfish { status, .. } => *status == 401 || *status == 403,
            InventoryError::Collection { source, .. } => source.is_auth_error(),
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            InventoryError::NotFound => true,
            InventoryError::Redfish { status, .. } => *status == 404,
            InventoryError::Collection { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}

impl fmt::Display for InventoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InventoryError::AuthFailed => write!(f, "authentication failed"),
            InventoryError::NotFound => write!(f, "resource not found"),
            InventoryError::Timeout => write!(f, "request timed out"),
            InventoryError::ConnectionFailed => write!(f, "connection failed"),
            InventoryError::InvalidResponse => write!(f, "invalid response from server"),
            InventoryError::Cancelled => write!(f, "scan cancelled"),
            InventoryError::Redfish {
                host,
                path,
                status,
                body,
                ..
            } => write!(f, "API error on {host}{path}: {body} (HTTP {status})"),
            InventoryError::Collection {
                host,
                component,
                source,
            } => write!(f, "failed to collect {component} from {host}: {source}"),
            InventoryError::Config { field, message } => {
                write!(f, "config error in {field}: {message}")
            }
            InventoryError::DeviceNotFound {
                service_tag,
                serial,
            } => write!(
                f,
                "device not found in asset system (service_tag={service_tag}, serial={serial})"
            ),
            InventoryError::Aggregate(members) => match members.len() {
                0 => write!(f, "no errors"),
                1 => write!(f, "{}", members[0]),
                n => write!(f, "{n} errors occurred; first: {}", members[0]),
            },
        }
    }
}

impl std::error::Error for InventoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InventoryError::Collection { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

// Records carry their error as a plain message when rendered to JSON.
impl Serialize for InventoryError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
