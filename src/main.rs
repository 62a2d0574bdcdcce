use anyhow::Result;

mod cli;

use cli::CliApp;

fn main() -> Result<()> {
    CliApp::run()
}
