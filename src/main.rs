use log::*;

use std::sync::Arc;

use pollbox::{app, db, load_templates, AppState, Config};

#[async_std::main]
async fn main() -> Result<(), std::io::Error> {
    pretty_env_logger::init();

    let config = Config::from_env();
    debug!("Configuration: {:?}", config);

    let templates = match load_templates(&config.template_dir) {
        Ok(templates) => Arc::new(templates),
        Err(err) => {
            error!("Could not load templates from {:?}! {:?}", config.template_dir, err);
            return Err(std::io::Error::new(std::io::ErrorKind::Other, err));
        }
    };

    match db::create_pool(&config).await {
        Ok(db) => {
            let state = AppState { db, templates };
            info!("Listening on {}", config.listen_addr);
            app(state).listen(config.listen_addr).await?;
            Ok(())
        }
        Err(err) => {
            error!("Could not initialize pool! {:?}", err);
            Err(std::io::Error::new(std::io::ErrorKind::Other, err))
        }
    }
}
