#![cfg_attr(target_os = "windows", windows_subsystem = "windows")]

use anyhow::Context;
use noctis::config::Config;
use noctis::gateway::{self, Dispatcher, Gateway, Google};
use noctis::{languages, logger, Overlay};
use std::sync::Arc;
use std::time::Duration;

mod ui;

const SAMPLE_PAGE: &str = "\
Sélectionnez un passage, puis cliquez sur le bouton qui apparaît au-dessus.

Bonjour ! La traduction s'affiche dans une fenêtre à droite. Vous pouvez en ouvrir plusieurs à la fois, \
changer la langue source ou cible de chacune, et les fermer quand vous voulez.

Guten Tag! Jede Übersetzung bleibt an den Text gebunden, den Sie ausgewählt haben, auch wenn Sie danach \
etwas anderes markieren.

¡Hola! Desplácese por la página: el botón sigue a la selección.

こんにちは。選択したテキストはそのまま保持されます。

Escape hides the button; it never closes an open translation.
";

fn build_gateway(cfg: &Config) -> anyhow::Result<Arc<dyn Gateway>> {
    match gateway::from_config(cfg) {
        Ok(g) => Ok(g),
        Err(e) => {
            logger::warn(&format!("{:?} provider unavailable ({e}); falling back to Google", cfg.provider));
            let timeout = Duration::from_secs(cfg.request_timeout_secs);
            let fallback: Arc<dyn Gateway> = Arc::new(Google::new(timeout)?);
            Ok(fallback)
        }
    }
}

fn main() -> anyhow::Result<()> {
    logger::init();
    logger::info("App starting");

    // config.json next to the exe; non-empty env vars override it
    let mut cfg = Config::load();
    cfg.apply_env(|k| std::env::var(k).ok());
    logger::info(&format!("Config loaded from {}", Config::path().display()));

    let gateway = build_gateway(&cfg)?;
    let (dispatcher, replies) = Dispatcher::new(gateway).context("failed to start the gateway runtime")?;
    logger::info(&format!("Translating with {}", dispatcher.provider_name()));

    let locale = cfg.locale(|k| std::env::var(k).ok());
    let target = languages::default_target(locale.as_deref(), &cfg.default_target);
    logger::info(&format!("Default target {target} (locale {})", locale.as_deref().unwrap_or("unset")));

    let text = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path).with_context(|| format!("cannot read {path}"))?,
        None => SAMPLE_PAGE.to_string(),
    };

    // Run UI on main thread (blocks)
    ui::run(text, Overlay::new(dispatcher, &target), replies)
}
