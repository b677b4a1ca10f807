//! Request handler definitions
//!
//! Define each route and its handler here. Handlers that are more than a line or two MUST go into a
//! separate module. Keep this module neat and tidy 🙏
//!
//! Handlers run concurrently on a small pool of worker threads, so anything slow (I/O, database work,
//! the gateway status call) must be awaited and never blocked on.

use actix_web::{get, web, HttpResponse, Responder};
use kirana_payment_engine::{
    db_types::{NewOrder, OrderNumber},
    traits::{OrderManagement, PaymentGatewayDatabase},
    OrderFlowApi,
    TrackingApi,
};
use log::*;

use crate::{
    data_objects::{CreateOrderRequest, UpdateStatusRequest},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders" impl PaymentGatewayDatabase);
/// Accepts a checkout payload, validates it and stores the order.
///
/// The order lands as `pending`. Gateway orders then go through `/payments/esewa/initiate` to open a
/// payment attempt; cash orders go straight into fulfilment.
pub async fn create_order<B: PaymentGatewayDatabase>(
    body: web::Json<CreateOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    debug!("💻️ POST new order for customer {}", req.customer.customer_id);
    let order =
        NewOrder::build(req.customer, req.items, req.subtotal, req.shipping_fee, req.tax, req.total, req.payment_method)
            .map_err(|e| ServerError::InvalidRequestBody(e.to_string()))?;
    let order = api.process_new_order(order).await?;
    Ok(HttpResponse::Created().json(order))
}

route!(order_by_number => Get "/orders/number/{order_number}" impl OrderManagement);
pub async fn order_by_number<B: OrderManagement>(
    path: web::Path<String>,
    api: web::Data<TrackingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let number = OrderNumber::new(path.into_inner());
    debug!("💻️ GET order {number}");
    let order = api
        .order_by_number(&number)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {number} does not exist")))?;
    Ok(HttpResponse::Ok().json(order))
}

route!(orders_for_customer => Get "/orders/customer/{customer_id}" impl OrderManagement);
pub async fn orders_for_customer<B: OrderManagement>(
    path: web::Path<String>,
    api: web::Data<TrackingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let customer_id = path.into_inner();
    debug!("💻️ GET order history for customer {customer_id}");
    let orders = api.orders_for_customer(&customer_id).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_payment_status => Get "/orders/{order_id}/payment" impl OrderManagement);
pub async fn order_payment_status<B: OrderManagement>(
    path: web::Path<i64>,
    api: web::Data<TrackingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET payment standing for order {order_id}");
    let standing = api
        .payment_status_for_order(order_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_id} does not exist")))?;
    Ok(HttpResponse::Ok().json(standing))
}

route!(update_order_status => Post "/orders/{order_id}/status" impl PaymentGatewayDatabase);
/// Moves an order one step along its fulfilment lifecycle, or cancels it.
///
/// Illegal jumps and no-ops are refused with a 400 and the order is left untouched.
pub async fn update_order_status<B: PaymentGatewayDatabase>(
    path: web::Path<i64>,
    body: web::Json<UpdateStatusRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let new_status = body.into_inner().status;
    debug!("💻️ POST order {order_id} to {new_status}");
    let changed = api.update_order_status(order_id, new_status).await?;
    Ok(HttpResponse::Ok().json(changed))
}
