mod app;
mod cli;
mod data;
mod state;
mod stats;

use std::io;
use std::process::ExitCode;

use app::BikeshareApp;
use cli::prompt::Prompter;
use data::registry::CityRegistry;

fn main() -> ExitCode {
    env_logger::init();

    let stdin = io::stdin();
    let stdout = io::stdout();
    let prompter = Prompter::new(stdin.lock(), stdout.lock());
    let mut app = BikeshareApp::new(CityRegistry::default(), prompter, stats::builtin::all());

    match app.run() {
        Ok(passes) => {
            log::info!("finished after {passes} analysis pass(es)");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
