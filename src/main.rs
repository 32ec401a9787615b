use std::sync::{mpsc, Arc};
use std::time::Duration;

use clap::Parser;
use color_eyre::Result;

use lenstui::api::HttpApi;
use lenstui::{App, AppEvent, Args, ConfigManager, APP_NAME};

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let config_manager = ConfigManager::new(APP_NAME)?;
    if args.generate_config {
        let path = config_manager.write_default_config(args.force)?;
        println!("Wrote default config to {}", path.display());
        return Ok(());
    }

    let config = config_manager.load()?.apply_args(&args)?;
    let api = Arc::new(HttpApi::new(
        &config.service.base_url,
        Duration::from_secs(config.service.timeout_secs),
        config.service.user_email.clone(),
    ));

    let mut terminal = ratatui::try_init().map_err(|e| {
        color_eyre::eyre::eyre!(
            "lenstui requires an interactive terminal (TTY). No terminal detected: {}.",
            e
        )
    })?;

    let (tx, rx) = mpsc::channel::<AppEvent>();
    let mut app = App::new(api, tx.clone(), &config);
    app.start();
    if let Some(path) = args.upload.clone() {
        app.start_upload(path);
    }

    terminal.draw(|frame| frame.render_widget(&mut app, frame.area()))?;

    loop {
        if crossterm::event::poll(Duration::from_millis(25))? {
            match crossterm::event::read()? {
                crossterm::event::Event::Key(key) => {
                    if key.is_press() {
                        tx.send(AppEvent::Key(key))?;
                    }
                }
                crossterm::event::Event::Resize(cols, rows) => {
                    tx.send(AppEvent::Resize(cols, rows))?;
                }
                _ => {}
            }
        }

        let updated = match rx.recv_timeout(Duration::from_millis(0)) {
            Ok(event) => {
                app.event(event);
                true
            }
            Err(mpsc::RecvTimeoutError::Timeout) => false,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        };

        if app.should_exit() {
            break;
        }
        if updated {
            terminal.draw(|frame| frame.render_widget(&mut app, frame.area()))?;
        }
    }

    ratatui::restore();
    Ok(())
}
