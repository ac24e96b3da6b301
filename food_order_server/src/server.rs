use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use food_order_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    OrderFlowApi,
    OrderQueryApi,
    PaymentFlowApi,
    ProfileApi,
    SqliteDatabase,
};
use futures::FutureExt;
use log::*;

use crate::{
    auth::decoding_key,
    config::ServerConfig,
    errors::ServerError,
    integrations::gateway::HttpPaymentGateway,
    middleware::JwtMiddlewareFactory,
    routes::{
        health,
        AcceptDeliveryRoute,
        AvailableDeliveriesRoute,
        CancelOrderRoute,
        CheckTokenRoute,
        ConfirmOrderRoute,
        CreatePaymentRoute,
        MarkDeliveredRoute,
        MarkReadyRoute,
        MyCartRoute,
        MyDeliveriesRoute,
        MyOrdersRoute,
        OrderByIdRoute,
        PaymentForOrderRoute,
        PlaceOrderRoute,
        RefundRoute,
        RestaurantOrdersRoute,
        VerifyPaymentRoute,
    },
};

pub const EVENT_BUFFER_SIZE: usize = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.run_migrations {
        db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    }
    let gateway = HttpPaymentGateway::new(config.gateway.clone())?;
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, logging_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, gateway, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Hooks that write every committed status change to the log.
pub fn logging_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks
        .on_order_status_changed(|ev| {
            async move {
                info!("📬️ Order #{} moved from {} to {}", ev.order.id, ev.old_status, ev.order.status);
            }
            .boxed()
        })
        .on_payment_status_changed(|ev| {
            async move {
                let old = ev.old_status.map(|s| s.to_string()).unwrap_or_else(|| "NEW".into());
                info!(
                    "📬️ Payment #{} for order #{} moved from {old} to {} ({})",
                    ev.payment.id, ev.payment.order_id, ev.payment.status, ev.payment.amount
                );
            }
            .boxed()
        });
    hooks
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: HttpPaymentGateway,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let gateway_timeout = config.gateway.timeout;
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone());
        let query_api = OrderQueryApi::new(db.clone());
        let payments_api = PaymentFlowApi::new(db.clone(), gateway.clone(), producers.clone())
            .with_gateway_timeout(gateway_timeout);
        let profiles_api = ProfileApi::new(db.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("fos::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(query_api))
            .app_data(web::Data::new(payments_api))
            .app_data(web::Data::new(profiles_api));
        // Routes that require authentication
        let auth_scope = web::scope("/api")
            .wrap(JwtMiddlewareFactory::new(decoding_key(&config.auth)))
            .service(CheckTokenRoute::new())
            .service(PlaceOrderRoute::<SqliteDatabase>::new())
            .service(CancelOrderRoute::<SqliteDatabase>::new())
            .service(ConfirmOrderRoute::<SqliteDatabase>::new())
            .service(MarkReadyRoute::<SqliteDatabase>::new())
            .service(AcceptDeliveryRoute::<SqliteDatabase>::new())
            .service(MarkDeliveredRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(RestaurantOrdersRoute::<SqliteDatabase>::new())
            .service(MyDeliveriesRoute::<SqliteDatabase>::new())
            .service(AvailableDeliveriesRoute::<SqliteDatabase>::new())
            .service(MyCartRoute::<SqliteDatabase>::new())
            .service(CreatePaymentRoute::<SqliteDatabase, HttpPaymentGateway>::new())
            .service(VerifyPaymentRoute::<SqliteDatabase, HttpPaymentGateway>::new())
            .service(RefundRoute::<SqliteDatabase, HttpPaymentGateway>::new())
            .service(PaymentForOrderRoute::<SqliteDatabase, HttpPaymentGateway>::new());
        app.service(health).service(auth_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
