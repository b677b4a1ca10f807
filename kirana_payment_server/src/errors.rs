use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use esewa_tools::EsewaApiError;
use kirana_payment_engine::{OrderApiError, PaymentGatewayError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The order cannot be charged in its current state. {0}")]
    InvalidCheckoutState(String),
    #[error("The gateway response could not be understood. {0}")]
    MalformedGatewayResponse(String),
    #[error("The payment gateway is unreachable. {0}")]
    GatewayUnavailable(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCheckoutState(_) => StatusCode::BAD_REQUEST,
            Self::MalformedGatewayResponse(_) => StatusCode::BAD_REQUEST,
            Self::GatewayUnavailable(_) => StatusCode::BAD_GATEWAY,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<PaymentGatewayError> for ServerError {
    fn from(e: PaymentGatewayError) -> Self {
        match &e {
            PaymentGatewayError::OrderIdNotFound(_) | PaymentGatewayError::TransactionNotFound(_) => {
                Self::NoRecordFound(e.to_string())
            },
            PaymentGatewayError::QueryError(OrderApiError::OrderNotFound(_)) => Self::NoRecordFound(e.to_string()),
            PaymentGatewayError::OrderNotPayable { .. }
            | PaymentGatewayError::AmountMismatch { .. }
            | PaymentGatewayError::InvalidOrder(_)
            | PaymentGatewayError::InvalidStatusChange { .. }
            | PaymentGatewayError::OrderModificationNoOp
            | PaymentGatewayError::InvalidRefund { .. } => Self::InvalidCheckoutState(e.to_string()),
            PaymentGatewayError::OrderNumberAlreadyExists(_) | PaymentGatewayError::TransactionAlreadyExists(_) => {
                Self::BackendError(e.to_string())
            },
            PaymentGatewayError::DatabaseError(_) | PaymentGatewayError::QueryError(_) => {
                Self::BackendError(e.to_string())
            },
        }
    }
}

impl From<OrderApiError> for ServerError {
    fn from(e: OrderApiError) -> Self {
        match &e {
            OrderApiError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderApiError::DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<EsewaApiError> for ServerError {
    fn from(e: EsewaApiError) -> Self {
        match &e {
            EsewaApiError::Timeout | EsewaApiError::RestResponseError(_) | EsewaApiError::QueryError { .. } => {
                Self::GatewayUnavailable(e.to_string())
            },
            EsewaApiError::JsonError(_)
            | EsewaApiError::MalformedCallback(_)
            | EsewaApiError::InvalidCurrencyAmount(_) => Self::MalformedGatewayResponse(e.to_string()),
            EsewaApiError::Initialization(_) | EsewaApiError::MissingSecret | EsewaApiError::SigningError(_) => {
                Self::ConfigurationError(e.to_string())
            },
        }
    }
}
