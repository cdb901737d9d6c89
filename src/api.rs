use crate::models::listing::Listing;
use crate::models::EntityId;
use crate::query::{featured, DirectoryQuery, DirectoryStats, SortOrder};
use crate::sync::{DirectoryState, DirectorySynchronizer};
use actix_web::{web, HttpResponse};
use leptos::logging::{error, log};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize, Debug, Default)]
pub struct ProjectsParams {
    pub search: Option<String>,
    pub category: Option<String>,
    pub sort: Option<SortOrder>,
}

impl ProjectsParams {
    fn to_query(&self) -> DirectoryQuery {
        DirectoryQuery {
            search: self.search.clone().unwrap_or_default(),
            sort: self.sort.unwrap_or_default(),
            ..Default::default()
        }
        .with_category_name(self.category.as_deref().unwrap_or("All"))
    }
}

fn unavailable(field: &str) -> HttpResponse {
    HttpResponse::ServiceUnavailable().json(json!({ "status": "unavailable", field: [] }))
}

/// Latest installed directory, filtered and sorted on request.
pub async fn get_projects(
    sync: web::Data<DirectorySynchronizer>,
    params: web::Query<ProjectsParams>,
) -> HttpResponse {
    match sync.state().await {
        DirectoryState::Ready(listings) => {
            let query = params.to_query();
            let projects = query.apply(&listings);
            // Featured projects only head the unfiltered directory
            let featured: &[Listing] = if query.is_unfiltered() {
                featured(&listings)
            } else {
                &[]
            };
            log!("[SERVER] Returning {} of {} projects", projects.len(), listings.len());
            HttpResponse::Ok().json(json!({
                "status": "ready",
                "projects": projects,
                "featured": featured,
                "stats": DirectoryStats::of(&listings),
            }))
        }
        DirectoryState::Loading => {
            HttpResponse::Ok().json(json!({ "status": "loading", "projects": [] }))
        }
        DirectoryState::Unavailable => unavailable("projects"),
    }
}

pub async fn refresh_projects(sync: web::Data<DirectorySynchronizer>) -> HttpResponse {
    log!("[SERVER] Refresh requested");
    match sync.refresh().await {
        Ok(listings) => HttpResponse::Ok().json(json!({
            "status": "ready",
            "projects": listings.as_slice(),
        })),
        Err(err) => {
            error!("[SERVER] Refresh failed: {}", err);
            unavailable("projects")
        }
    }
}

pub async fn get_reviews(
    sync: web::Data<DirectorySynchronizer>,
    listing: web::Path<String>,
) -> HttpResponse {
    let listing = EntityId::new(listing.into_inner());
    match sync.refresh_reviews(&listing).await {
        Ok(reviews) => {
            log!("[SERVER] Returning {} reviews for project {}", reviews.len(), listing);
            HttpResponse::Ok().json(json!({ "status": "ready", "reviews": reviews.as_slice() }))
        }
        Err(err) => {
            error!("[SERVER] Reviews for project {} failed: {}", listing, err);
            unavailable("reviews")
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/projects", web::get().to(get_projects))
            .route("/projects/refresh", web::post().to(refresh_projects))
            .route("/projects/{id}/reviews", web::get().to(get_reviews)),
    );
}
