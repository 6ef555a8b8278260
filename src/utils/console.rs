use colored::*;
use figlet_rs::FIGfont;
use tracing::info;

use crate::config::Config;

pub fn print_config(config: &Config) {
    let json = serde_json::to_string_pretty(config).unwrap_or_default();

    info!("\n{}: \n{}", String::from("[CONFIG]").blue().underline(), json.magenta());
}

fn banner(text: &str) -> String {
    FIGfont::standard()
        .ok()
        .and_then(|font| font.convert(text).map(|figure| figure.to_string()))
        .unwrap_or_else(|| text.to_string())
}

pub fn print_app_starting() {
    info!("\n{}", banner("TRI-ARB starting..."));
}

pub fn print_app_stopped() {
    info!("\n{}", banner("TRI-ARB stopped"));
}
