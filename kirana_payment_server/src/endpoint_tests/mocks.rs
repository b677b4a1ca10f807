use esewa_tools::{EsewaApiError, StatusClient, StatusResponse};
use kirana_payment_engine::{
    db_types::{
        NewOrder,
        NewPaymentTransaction,
        Order,
        OrderNumber,
        OrderStatusType,
        PaymentTransaction,
        TransactionId,
    },
    order_objects::OrderChanged,
    payment_objects::{RefundKind, VerifiedStatus, VerifyOutcome},
    traits::{OrderApiError, OrderManagement, PaymentGatewayDatabase, PaymentGatewayError},
};
use kpg_common::Rupees;
use mockall::mock;

mock! {
    pub PaymentsDb {}

    impl Clone for PaymentsDb {
        fn clone(&self) -> Self;
    }

    impl OrderManagement for PaymentsDb {
        async fn fetch_order_by_id(&self, order_id: i64) -> Result<Option<Order>, OrderApiError>;
        async fn fetch_order_by_number(&self, order_number: &OrderNumber) -> Result<Option<Order>, OrderApiError>;
        async fn fetch_orders_for_customer(&self, customer_id: &str) -> Result<Vec<Order>, OrderApiError>;
        async fn fetch_payment_transaction(&self, transaction_id: &TransactionId) -> Result<Option<PaymentTransaction>, OrderApiError>;
        async fn fetch_latest_transaction_for_order(&self, order_id: i64) -> Result<Option<PaymentTransaction>, OrderApiError>;
    }

    impl PaymentGatewayDatabase for PaymentsDb {
        fn url(&self) -> &'static str;
        async fn insert_order(&self, order: NewOrder) -> Result<Order, PaymentGatewayError>;
        async fn insert_transaction(&self, transaction: NewPaymentTransaction) -> Result<PaymentTransaction, PaymentGatewayError>;
        async fn record_verified_status(&self, transaction_id: &TransactionId, claimed_total: Rupees, verified: VerifiedStatus) -> Result<VerifyOutcome, PaymentGatewayError>;
        async fn record_refund(&self, transaction_id: &TransactionId, kind: RefundKind) -> Result<PaymentTransaction, PaymentGatewayError>;
        async fn update_order_status(&self, order_id: i64, new_status: OrderStatusType) -> Result<OrderChanged, PaymentGatewayError>;
        async fn close(&mut self) -> Result<(), PaymentGatewayError>;
    }
}

mock! {
    pub GatewayStatus {}

    impl Clone for GatewayStatus {
        fn clone(&self) -> Self;
    }

    impl StatusClient for GatewayStatus {
        async fn fetch_transaction_status(&self, transaction_uuid: &str, total_amount: &str) -> Result<StatusResponse, EsewaApiError>;
    }
}
