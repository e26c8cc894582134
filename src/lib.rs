use handlebars::Handlebars;
use sqlx::sqlite::SqlitePool;
use tide::Redirect;

use std::path::Path;
use std::sync::Arc;

pub mod api_models;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
/**
 * The routes module contains all the tide routes and the logic to fulfill the responses for each
 * route.
 *
 * Modules are nested for cleaner organization here
 */
pub mod routes;

pub use crate::config::Config;
pub use crate::error::Error;

/**
 * Struct for carrying application state into tide request handlers
 */
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub templates: Arc<Handlebars<'static>>,
}

/**
 * Register every `.hbs` file in `dir`, named after the file without its extension
 *
 * A missing directory is an error rather than an empty registry, pages would
 * otherwise only fail once requested
 */
pub fn load_templates<P: AsRef<Path>>(dir: P) -> Result<Handlebars<'static>, Error> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(Error::TemplateDir(dir.to_path_buf()));
    }

    let mut templates = Handlebars::new();
    templates.register_templates_directory(".hbs", dir)?;
    Ok(templates)
}

/**
 * Build the tide server with every route mounted
 */
pub fn app(state: AppState) -> tide::Server<AppState> {
    let mut app = tide::with_state(state);

    app.at("/").get(Redirect::new("/polls"));
    app.at("/polls").get(routes::polls::index);
    app.at("/polls/:question_id").get(routes::polls::detail);
    app.at("/polls/:question_id/results").get(routes::polls::results);
    app.at("/polls/:question_id/vote").post(routes::polls::vote);

    app.at("/admin/questions").put(routes::admin::create);
    app.at("/admin/questions/:question_id").delete(routes::admin::delete);
    app
}

#[cfg(test)]
pub(crate) async fn test_state() -> AppState {
    let templates = load_templates(Config::default().template_dir).expect("templates");
    AppState {
        db: db::memory_pool().await,
        templates: Arc::new(templates),
    }
}
