use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use esewa_tools::EsewaApi;
use kirana_payment_engine::{create_database_if_missing, OrderFlowApi, SqliteDatabase, TrackingApi, MIGRATOR};
use log::*;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    esewa_routes::{InitiatePaymentRoute, RecordRefundRoute, VerifyPaymentRoute},
    integrations::create_notification_handlers,
    routes::{
        health,
        CreateOrderRoute,
        OrderByNumberRoute,
        OrderPaymentStatusRoute,
        OrdersForCustomerRoute,
        UpdateOrderStatusRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = init_database(&config.database_url).await?;
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Connects to the database named in the configuration, creating and migrating it as needed.
async fn init_database(url: &str) -> Result<SqliteDatabase, ServerError> {
    create_database_if_missing(url).await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let db = SqliteDatabase::new_with_url(url, 25).await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    MIGRATOR.run(db.pool()).await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("🚀️ Database schema for {url} is up to date");
    Ok(db)
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let esewa = EsewaApi::new(config.esewa.clone()).map_err(|e| ServerError::ConfigurationError(e.to_string()))?;
    let handlers = create_notification_handlers(&config);
    let producers = handlers.producers();
    handlers.start_handlers();
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone());
        let tracking_api = TrackingApi::new(db.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("kps::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(tracking_api))
            .app_data(web::Data::new(esewa.clone()))
            .service(health)
            .service(
                web::scope("/api")
                    .service(CreateOrderRoute::<SqliteDatabase>::new())
                    .service(OrderByNumberRoute::<SqliteDatabase>::new())
                    .service(OrdersForCustomerRoute::<SqliteDatabase>::new())
                    .service(OrderPaymentStatusRoute::<SqliteDatabase>::new())
                    .service(UpdateOrderStatusRoute::<SqliteDatabase>::new())
                    .service(InitiatePaymentRoute::<SqliteDatabase>::new())
                    .service(VerifyPaymentRoute::<SqliteDatabase, EsewaApi>::new())
                    .service(RecordRefundRoute::<SqliteDatabase>::new()),
            )
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
