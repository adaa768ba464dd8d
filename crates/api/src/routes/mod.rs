pub mod actors;
pub mod cache;
pub mod comments;
pub mod countries;
pub mod customers;
pub mod health;
pub mod movies;
pub mod posts;
pub mod tenants;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /actors                                  list (?first_name&last_name&birthday), create
/// /actors/{id}                             get, delete
///
/// /movies                                  list (?limit&offset&name&producer_name&release_date), create
/// /movies/with-actors                      every movie with its cast
/// /movies/actor-counts                     cast size per movie
/// /movies/acting-producers                 movies whose producer is in the cast
/// /movies/{id}                             get, delete
/// /movies/{id}/actors                      movie with its cast
///
/// /tenants                                 configured tenants (GET)
/// /tenant/actors                           list, create (X-Tenant-Id)
/// /tenant/actors/{id}                      get, delete (X-Tenant-Id)
/// /tenant/movies                           list, create (X-Tenant-Id)
/// /tenant/movies/{id}                      movie with its cast (X-Tenant-Id)
///
/// /customers                               list, create (write-through cache)
/// /customers/{id}                          get, update, delete
///
/// /countries                               list (read-through near cache)
/// /countries/{code}                        get, upsert (PUT), delete
///
/// /posts                                   list, create
/// /posts/{id}                              get (with comments), update, delete
/// /posts/{id}/comments                     list, create (write-behind cache)
/// /comments/{id}                           get, delete
///
/// /cache/{name}                            evict a named cache (DELETE)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/actors", actors::router())
        .nest("/movies", movies::router())
        .route("/tenants", get(handlers::tenant::list_tenants))
        .nest("/tenant", tenants::router())
        .nest("/customers", customers::router())
        .nest("/countries", countries::router())
        .nest("/posts", posts::router())
        .nest("/comments", comments::router())
        .nest("/cache", cache::router())
}
