use log::error;

use vivarium_core::GLOBAL_CONFIG;
use vivarium_server::server::SimulationServer;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match SimulationServer::new(GLOBAL_CONFIG.clone()) {
        Ok(mut server) => server.start_loop(),
        Err(err) => {
            error!("could not start the vivarium: {}", err);
            std::process::exit(1);
        }
    }
}
