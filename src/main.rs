use anyhow::{Context, Result};
use log::info;
use rusty_chess_ui::{
    app::{App, TerminalFrontend},
    config::{self, Config},
    engine,
};
use tokio::io::{BufReader, stdin, stdout};

// one cooperative UI thread: handlers and timer callbacks never overlap
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = config::load_config()?;
    setup_logger(&config)?;

    info!(
        "starting (reply delay {}ms, board {:?})",
        config.reply_delay_ms, config.board
    );

    let frontend = TerminalFrontend::new(BufReader::new(stdin()), stdout());
    let mut app = App::new(frontend, &config, engine::init_engine())?;
    app.run().await?;

    info!("bye");
    Ok(())
}

// stdout belongs to the board, so the log goes to a file
fn setup_logger(config: &Config) -> Result<()> {
    let log_file = fern::log_file(&config.log_file)
        .with_context(|| format!("could not open log file {}", config.log_file.display()))?;

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {:<5} {}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(config.log_level()?)
        .chain(log_file)
        .apply()?;

    Ok(())
}
