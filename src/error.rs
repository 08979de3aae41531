use thiserror::Error;

/// All possible errors when talking to the order system
#[derive(Error, Debug)]
pub enum WarehouseError {
    #[error("Order #{0} not found")]
    OrderNotFound(String),

    #[error("Order id {0} not found")]
    OrderIdNotFound(i64),

    #[error("Tag '{0}' not found. Create it in ShipStation first.")]
    TagNotFound(String),

    #[error("ShipStation API credentials not configured. Set SHIPSTATION_API_KEY and SHIPSTATION_API_SECRET.")]
    MissingCredentials,

    #[error("ShipStation rejected the credentials (HTTP {0})")]
    Unauthorized(u16),

    #[error("ShipStation returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Request to ShipStation failed: {0}")]
    Transport(String),

    #[error("Unexpected response from ShipStation: {0}")]
    MalformedResponse(String),

    #[error("ShipStation did not apply the change: {0}")]
    WriteRejected(String),

    #[error("Order #{number} has status '{status}' - can only {action} orders awaiting shipment")]
    NotAwaitingShipment {
        number: String,
        status: String,
        action: &'static str,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Could not render output: {0}")]
    Output(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification used for exit codes and MCP error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Auth,
    Upstream,
    Refused,
    Usage,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Auth => "auth_error",
            ErrorKind::Upstream => "upstream_error",
            ErrorKind::Refused => "refused",
            ErrorKind::Usage => "invalid_input",
            ErrorKind::Internal => "internal_error",
        }
    }

    /// Process exit code for this kind of failure
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorKind::Internal => 1,
            ErrorKind::Usage | ErrorKind::Refused => 2,
            ErrorKind::Auth => 3,
            ErrorKind::NotFound => 4,
            ErrorKind::Upstream => 5,
        }
    }
}

impl WarehouseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WarehouseError::OrderNotFound(_)
            | WarehouseError::OrderIdNotFound(_)
            | WarehouseError::TagNotFound(_) => ErrorKind::NotFound,
            WarehouseError::MissingCredentials | WarehouseError::Unauthorized(_) => {
                ErrorKind::Auth
            }
            WarehouseError::Api { .. }
            | WarehouseError::Transport(_)
            | WarehouseError::MalformedResponse(_)
            | WarehouseError::WriteRejected(_) => ErrorKind::Upstream,
            WarehouseError::NotAwaitingShipment { .. } => ErrorKind::Refused,
            WarehouseError::InvalidInput(_) | WarehouseError::Config(_) => ErrorKind::Usage,
            WarehouseError::Output(_) | WarehouseError::Io(_) => ErrorKind::Internal,
        }
    }
}

impl From<serde_json::Error> for WarehouseError {
    fn from(e: serde_json::Error) -> Self {
        WarehouseError::MalformedResponse(e.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, WarehouseError>;
