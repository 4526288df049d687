use pingora_core::server::{configuration::Opt, Server};

use resource_api::{
    admin::AdminHttpApp, config::Config, core::status, logging::Logger,
    service::status::StatusHttpApp,
};

fn main() {
    // Read command-line arguments
    let opt = Opt::parse_args();

    let config = match Config::load_yaml_with_opt_override(&opt) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize logging
    let logger = if let Some(log_cfg) = &config.log {
        let logger = Logger::new(log_cfg.clone());
        logger.init_env_logger();
        Some(logger)
    } else {
        env_logger::init();
        None
    };

    log::info!("Loading resources...");
    let admin_app = match AdminHttpApp::from_config(&config) {
        Ok(app) => app,
        Err(e) => {
            log::error!("Failed to load resources: {e}");
            eprintln!("Failed to load resources: {e}");
            std::process::exit(1);
        }
    };
    status::mark_ready(admin_app.resource_count());

    let mut server = Server::new_with_opt_and_conf(Some(opt), config.pingora);

    if let Some(log_service) = logger {
        log::info!("Adding log sync service...");
        server.add_service(log_service);
    }

    log::info!("Adding Admin HTTP on {}...", config.admin.address);
    server.add_service(admin_app.admin_http_service());

    if let Some(status_cfg) = &config.status {
        log::info!("Adding Status HTTP on {}...", status_cfg.address);
        server.add_service(StatusHttpApp::status_http_service(status_cfg));
    }

    log::info!("Bootstrapping...");
    server.bootstrap();

    log::info!("Starting Server...");
    server.run_forever();
}
