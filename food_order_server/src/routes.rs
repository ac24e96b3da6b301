//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every database and gateway call is therefore awaited, never
//! blocked on.
//!
//! Every route under `/api` is authenticated by [`crate::middleware::JwtMiddlewareFactory`]. Role gating happens per
//! route through the `requires [...]` clause of the `route!` macro. Ownership (is this *my* order?) is checked by the
//! engine, using the actor that the token's user id resolves to.
use actix_web::{get, web, HttpResponse, Responder};
use food_order_engine::{
    db_types::{Actor, Role},
    order_objects::OrderQueryFilter,
    payment_objects::{CreatePaymentRequest, RefundRequest, VerifyPaymentRequest},
    CartSnapshots,
    ErrorKind,
    OrderFlowApi,
    OrderFlowError,
    OrderManagement,
    OrderQueryApi,
    PaymentFlowApi,
    PaymentGateway,
    PaymentManagement,
    ProfileApi,
    ProfileDirectory,
};
use log::*;

use crate::{
    auth::JwtClaims,
    data_objects::{JsonResponse, OrderListParams, PlaceOrderRequest},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal requires [$($roles:expr),*]) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
            impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name)
                        .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),*]));
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:path),+ ; $gateway:path where requires [$($roles:expr),*]) => {
        paste::paste! { pub struct [<$name:camel Route>]<A, G>(core::marker::PhantomData<fn() -> (A, G)>);}
        paste::paste! { impl<A, G> [<$name:camel Route>]<A, G> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> (A, G)>)
            }
        }}
        paste::paste! { impl<A, G> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A, G>
        where
            A: $($bounds +)+ 'static,
            G: $gateway + 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A, G>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),*]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:path),+ where requires [$($roles:expr),*]) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),*]));
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

//----------------------------------------------   Identity  ----------------------------------------------------

/// Maps the token's user id onto the profile it acts as in `role`.
async fn acting_as<B: ProfileDirectory>(
    claims: &JwtClaims,
    role: Role,
    profiles: &ProfileApi<B>,
) -> Result<Actor, ServerError> {
    let actor = profiles.resolve(role, &claims.sub).await?;
    trace!("💻️ {} is acting as {actor}", claims.sub);
    Ok(actor)
}

route!(check_token => Get "/check-token" requires []);
pub async fn check_token(claims: JwtClaims) -> Result<HttpResponse, ServerError> {
    let roles = claims.roles.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(", ");
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Token is valid for {} [{roles}]", claims.sub))))
}

//----------------------------------------------   Order flow  ----------------------------------------------------

route!(place_order => Post "/place-order" impl OrderManagement, ProfileDirectory where requires [Role::Customer]);
/// Checks out the customer's cart. The body names the delivery address: `{"address_id": 7}`.
pub async fn place_order<B: OrderManagement + ProfileDirectory>(
    claims: JwtClaims,
    body: web::Json<PlaceOrderRequest>,
    profiles: web::Data<ProfileApi<B>>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let customer = acting_as(&claims, Role::Customer, &profiles).await?;
    debug!("💻️ POST place_order for {customer} to address #{}", body.address_id);
    let order = api.place_order(customer.profile_id(), body.address_id).await?;
    Ok(HttpResponse::Created().json(order))
}

route!(cancel_order => Put "/cancel-order/{order_id}" impl OrderManagement, ProfileDirectory where requires [Role::Customer]);
pub async fn cancel_order<B: OrderManagement + ProfileDirectory>(
    claims: JwtClaims,
    path: web::Path<i64>,
    profiles: web::Data<ProfileApi<B>>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let customer = acting_as(&claims, Role::Customer, &profiles).await?;
    debug!("💻️ PUT cancel_order #{order_id} by {customer}");
    let order = api.cancel(order_id, customer.profile_id()).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(confirm_order => Put "/confirm-order/{order_id}" impl OrderManagement, ProfileDirectory where requires [Role::Restaurant]);
pub async fn confirm_order<B: OrderManagement + ProfileDirectory>(
    claims: JwtClaims,
    path: web::Path<i64>,
    profiles: web::Data<ProfileApi<B>>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let restaurant = acting_as(&claims, Role::Restaurant, &profiles).await?;
    debug!("💻️ PUT confirm_order #{order_id} by {restaurant}");
    let order = api.confirm(order_id, restaurant.profile_id()).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(mark_ready => Put "/mark-ready/{order_id}" impl OrderManagement, ProfileDirectory where requires [Role::Restaurant]);
pub async fn mark_ready<B: OrderManagement + ProfileDirectory>(
    claims: JwtClaims,
    path: web::Path<i64>,
    profiles: web::Data<ProfileApi<B>>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let restaurant = acting_as(&claims, Role::Restaurant, &profiles).await?;
    debug!("💻️ PUT mark_ready #{order_id} by {restaurant}");
    let order = api.mark_ready(order_id, restaurant.profile_id()).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(accept_delivery => Put "/accept-delivery/{order_id}" impl OrderManagement, ProfileDirectory where requires [Role::Courier]);
pub async fn accept_delivery<B: OrderManagement + ProfileDirectory>(
    claims: JwtClaims,
    path: web::Path<i64>,
    profiles: web::Data<ProfileApi<B>>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let courier = acting_as(&claims, Role::Courier, &profiles).await?;
    debug!("💻️ PUT accept_delivery #{order_id} by {courier}");
    let order = api.accept_delivery(order_id, courier.profile_id()).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(mark_delivered => Put "/mark-delivered/{order_id}" impl OrderManagement, ProfileDirectory where requires [Role::Courier]);
pub async fn mark_delivered<B: OrderManagement + ProfileDirectory>(
    claims: JwtClaims,
    path: web::Path<i64>,
    profiles: web::Data<ProfileApi<B>>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let courier = acting_as(&claims, Role::Courier, &profiles).await?;
    debug!("💻️ PUT mark_delivered #{order_id} by {courier}");
    let order = api.mark_delivered(order_id, courier.profile_id()).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Order queries  ----------------------------------------------------

route!(order_by_id => Get "/orders/{order_id}" impl OrderManagement, ProfileDirectory where requires []);
/// Fetches an order with its lines.
///
/// Users may hold several roles. The order is returned if it is visible to the user in any of them; otherwise the
/// error from the last role tried is returned.
pub async fn order_by_id<B: OrderManagement + ProfileDirectory>(
    claims: JwtClaims,
    path: web::Path<i64>,
    profiles: web::Data<ProfileApi<B>>,
    api: web::Data<OrderQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET order #{order_id} for {}", claims.sub);
    let mut last_error = None;
    for role in &claims.roles {
        let actor = match profiles.resolve(*role, &claims.sub).await {
            Ok(actor) => actor,
            Err(e @ OrderFlowError::ProfileNotFound { .. }) => {
                last_error = Some(e);
                continue;
            },
            Err(e) => return Err(e.into()),
        };
        match api.fetch_order(order_id, actor).await {
            Ok(order) => return Ok(HttpResponse::Ok().json(order)),
            Err(e) if e.kind() == ErrorKind::Forbidden => last_error = Some(e),
            Err(e) => return Err(e.into()),
        }
    }
    let e = last_error.unwrap_or_else(|| OrderFlowError::Forbidden(format!("Order #{order_id} is not visible to you")));
    Err(e.into())
}

route!(my_orders => Get "/my-orders" impl OrderManagement, ProfileDirectory where requires [Role::Customer]);
/// The customer's order history, most recent first. Accepts `status`, `page` and `page_size` query parameters.
pub async fn my_orders<B: OrderManagement + ProfileDirectory>(
    claims: JwtClaims,
    query: web::Query<OrderListParams>,
    profiles: web::Data<ProfileApi<B>>,
    api: web::Data<OrderQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let customer = acting_as(&claims, Role::Customer, &profiles).await?;
    list_orders(customer, query.into_inner(), &api).await
}

route!(restaurant_orders => Get "/restaurant-orders" impl OrderManagement, ProfileDirectory where requires [Role::Restaurant]);
pub async fn restaurant_orders<B: OrderManagement + ProfileDirectory>(
    claims: JwtClaims,
    query: web::Query<OrderListParams>,
    profiles: web::Data<ProfileApi<B>>,
    api: web::Data<OrderQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let restaurant = acting_as(&claims, Role::Restaurant, &profiles).await?;
    list_orders(restaurant, query.into_inner(), &api).await
}

route!(my_deliveries => Get "/my-deliveries" impl OrderManagement, ProfileDirectory where requires [Role::Courier]);
pub async fn my_deliveries<B: OrderManagement + ProfileDirectory>(
    claims: JwtClaims,
    query: web::Query<OrderListParams>,
    profiles: web::Data<ProfileApi<B>>,
    api: web::Data<OrderQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let courier = acting_as(&claims, Role::Courier, &profiles).await?;
    list_orders(courier, query.into_inner(), &api).await
}

async fn list_orders<B: OrderManagement>(
    actor: Actor,
    params: OrderListParams,
    api: &OrderQueryApi<B>,
) -> Result<HttpResponse, ServerError> {
    let filter = OrderQueryFilter::from(params);
    debug!("💻️ GET orders for {actor}: {filter}");
    let orders = api.orders_for(actor, filter).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(available_deliveries => Get "/available-deliveries" impl OrderManagement where requires [Role::Courier]);
/// Orders that are ready for pick-up and have no courier yet.
pub async fn available_deliveries<B: OrderManagement>(
    query: web::Query<OrderListParams>,
    api: web::Data<OrderQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let OrderListParams { page, page_size, .. } = query.into_inner();
    debug!("💻️ GET available_deliveries");
    let orders = api.available_for_delivery(page, page_size).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(my_cart => Get "/cart" impl CartSnapshots, ProfileDirectory where requires [Role::Customer]);
pub async fn my_cart<B: CartSnapshots + ProfileDirectory>(
    claims: JwtClaims,
    profiles: web::Data<ProfileApi<B>>,
    api: web::Data<OrderQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let customer = acting_as(&claims, Role::Customer, &profiles).await?;
    debug!("💻️ GET cart for {customer}");
    let cart = api.cart_snapshot(customer.profile_id()).await?;
    Ok(HttpResponse::Ok().json(cart))
}

//----------------------------------------------   Payments  ----------------------------------------------------

route!(create_payment => Post "/create-payment" impl OrderManagement, PaymentManagement, ProfileDirectory ; PaymentGateway where requires [Role::Customer]);
/// Opens a payment for the customer's order and a matching gateway transaction. The response carries everything the
/// client needs to start the gateway checkout.
pub async fn create_payment<B, G>(
    claims: JwtClaims,
    body: web::Json<CreatePaymentRequest>,
    profiles: web::Data<ProfileApi<B>>,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + PaymentManagement + ProfileDirectory,
    G: PaymentGateway,
{
    let customer = acting_as(&claims, Role::Customer, &profiles).await?;
    debug!("💻️ POST create_payment for order #{} by {customer}", body.order_id);
    let response = api.create_payment_order(customer.profile_id(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

route!(verify_payment => Post "/verify-payment" impl OrderManagement, PaymentManagement, ProfileDirectory ; PaymentGateway where requires [Role::Customer]);
pub async fn verify_payment<B, G>(
    claims: JwtClaims,
    body: web::Json<VerifyPaymentRequest>,
    profiles: web::Data<ProfileApi<B>>,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + PaymentManagement + ProfileDirectory,
    G: PaymentGateway,
{
    let customer = acting_as(&claims, Role::Customer, &profiles).await?;
    debug!("💻️ POST verify_payment for order #{} by {customer}", body.order_id);
    let payment = api.verify_payment(customer.profile_id(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(payment))
}

route!(refund => Post "/refund" impl OrderManagement, PaymentManagement, ProfileDirectory ; PaymentGateway where requires [Role::Customer]);
pub async fn refund<B, G>(
    claims: JwtClaims,
    body: web::Json<RefundRequest>,
    profiles: web::Data<ProfileApi<B>>,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + PaymentManagement + ProfileDirectory,
    G: PaymentGateway,
{
    let customer = acting_as(&claims, Role::Customer, &profiles).await?;
    info!("💻️ POST refund of {} for order #{} by {customer}", body.amount, body.order_id);
    let payment = api.process_refund(customer.profile_id(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(payment))
}

route!(payment_for_order => Get "/payment/{order_id}" impl OrderManagement, PaymentManagement, ProfileDirectory ; PaymentGateway where requires [Role::Customer]);
pub async fn payment_for_order<B, G>(
    claims: JwtClaims,
    path: web::Path<i64>,
    profiles: web::Data<ProfileApi<B>>,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + PaymentManagement + ProfileDirectory,
    G: PaymentGateway,
{
    let order_id = path.into_inner();
    let customer = acting_as(&claims, Role::Customer, &profiles).await?;
    debug!("💻️ GET payment for order #{order_id} by {customer}");
    let payment = api.payment_for_order(customer.profile_id(), order_id).await?;
    Ok(HttpResponse::Ok().json(payment))
}
