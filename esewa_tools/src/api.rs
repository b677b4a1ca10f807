use std::{sync::Arc, time::Duration};

use kpg_common::Rupees;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};

use crate::{
    config::EsewaConfig,
    data_objects::{PaymentFormData, StatusResponse},
    helpers::esewa_amount,
    signing::{sign_payload, signature_message, SIGNED_FIELD_NAMES},
    EsewaApiError,
};

/// Read-only access to eSewa's transaction-status endpoint.
///
/// The verification path is generic over this trait so that tests can substitute a scripted gateway for the
/// real one.
#[allow(async_fn_in_trait)]
pub trait StatusClient: Clone {
    /// Performs one GET against the status endpoint. `total_amount` is the wire-form decimal string.
    async fn fetch_transaction_status(
        &self,
        transaction_uuid: &str,
        total_amount: &str,
    ) -> Result<StatusResponse, EsewaApiError>;
}

#[derive(Clone)]
pub struct EsewaApi {
    config: EsewaConfig,
    client: Arc<Client>,
}

impl EsewaApi {
    pub fn new(config: EsewaConfig) -> Result<Self, EsewaApiError> {
        if config.secret_key.reveal().is_empty() {
            return Err(EsewaApiError::MissingSecret);
        }
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| EsewaApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &EsewaConfig {
        &self.config
    }

    /// Builds the complete signed form payload for one payment attempt. Pure; performs no I/O.
    pub fn payment_form(
        &self,
        transaction_uuid: &str,
        amount: Rupees,
        tax_amount: Rupees,
        service_charge: Rupees,
        delivery_charge: Rupees,
    ) -> Result<PaymentFormData, EsewaApiError> {
        let total = amount + tax_amount + service_charge + delivery_charge;
        let total_amount = esewa_amount(total);
        let message = signature_message(&total_amount, transaction_uuid, &self.config.product_code);
        let signature = sign_payload(&message, &self.config.secret_key)?;
        trace!("🔏️ Signed payment request for transaction {transaction_uuid} ({total})");
        Ok(PaymentFormData {
            amount: esewa_amount(amount),
            tax_amount: esewa_amount(tax_amount),
            total_amount,
            transaction_uuid: transaction_uuid.to_string(),
            product_code: self.config.product_code.clone(),
            product_service_charge: esewa_amount(service_charge),
            product_delivery_charge: esewa_amount(delivery_charge),
            success_url: self.config.success_url.clone(),
            failure_url: self.config.failure_url.clone(),
            signed_field_names: SIGNED_FIELD_NAMES.to_string(),
            signature,
            payment_url: self.config.payment_url.clone(),
        })
    }
}

impl StatusClient for EsewaApi {
    async fn fetch_transaction_status(
        &self,
        transaction_uuid: &str,
        total_amount: &str,
    ) -> Result<StatusResponse, EsewaApiError> {
        let params = [
            ("product_code", self.config.product_code.as_str()),
            ("total_amount", total_amount),
            ("transaction_uuid", transaction_uuid),
        ];
        debug!("🔍️ Querying eSewa for the status of transaction {transaction_uuid}");
        let response = self.client.get(&self.config.status_url).query(&params).send().await.map_err(|e| {
            if e.is_timeout() {
                EsewaApiError::Timeout
            } else {
                EsewaApiError::RestResponseError(e.to_string())
            }
        })?;
        if response.status().is_success() {
            let status =
                response.json::<StatusResponse>().await.map_err(|e| EsewaApiError::JsonError(e.to_string()))?;
            debug!("🔍️ eSewa reports transaction {transaction_uuid} as {}", status.status);
            Ok(status)
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| EsewaApiError::RestResponseError(e.to_string()))?;
            Err(EsewaApiError::QueryError { status, message })
        }
    }
}
