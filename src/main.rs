#[cfg(feature = "ssr")]
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    use actix_web::{web, App, HttpServer};
    use leptos::logging::{error, log};
    use showcase::rpc::RpcLedger;
    use showcase::{DirectorySynchronizer, LedgerConfig};
    use std::io;
    use std::sync::Arc;

    // Load configuration
    let config = LedgerConfig::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let ledger = RpcLedger::new(config.clone()).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    let sync = Arc::new(DirectorySynchronizer::from_config(Arc::new(ledger), &config));

    // A failed first load is not fatal; the directory shows as unavailable until refreshed
    match sync.refresh().await {
        Ok(listings) => log!("[SERVER] Initial load: {} projects", listings.len()),
        Err(err) => error!("[SERVER] Initial load failed: {}", err),
    }

    let addr = std::env::var("SHOWCASE_SITE_ADDR").unwrap_or_else(|_| "127.0.0.1:3004".to_string());
    log!("[SERVER] listening on http://{}", &addr);

    let data = web::Data::from(sync);
    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .configure(showcase::api::configure)
            .service(web::resource("/").route(web::get().to(index)))
    })
    .bind(&addr)?
    .run()
    .await
}

#[cfg(feature = "ssr")]
async fn index() -> actix_web::HttpResponse {
    actix_web::HttpResponse::Ok().body("BaseBuilder project directory")
}

#[cfg(not(feature = "ssr"))]
pub fn main() {
    // no native server without `ssr`; the library is used from the client instead
}
