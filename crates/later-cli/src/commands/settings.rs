//! Settings command handlers

use anyhow::{anyhow, Context, Result};

use later_core::models::Theme;
use later_core::Store;

use crate::output::Output;

/// Show, set or toggle the theme
pub fn theme(store: &mut Store, mode: Option<String>, output: &Output) -> Result<()> {
    let prefers_dark = system_prefers_dark();

    let theme = match mode.as_deref() {
        None => {
            let theme = store.theme(prefers_dark)?;
            if output.is_json() {
                println!("{}", serde_json::json!({ "theme": theme }));
            } else {
                println!("{}", theme);
            }
            return Ok(());
        }
        Some("toggle") => store
            .toggle_theme(prefers_dark)
            .context("Failed to toggle theme")?,
        Some(value) => {
            let theme: Theme = value.parse().map_err(|e: String| anyhow!(e))?;
            store.set_theme(theme).context("Failed to set theme")?;
            theme
        }
    };

    output.success(&format!("Theme set to {}", theme));
    Ok(())
}

/// Dark terminal background, judged from `COLORFGBG` ("fg;bg")
fn system_prefers_dark() -> bool {
    std::env::var("COLORFGBG")
        .ok()
        .map(|value| background_is_dark(&value))
        .unwrap_or(false)
}

fn background_is_dark(colorfgbg: &str) -> bool {
    colorfgbg
        .rsplit(';')
        .next()
        .and_then(|bg| bg.trim().parse::<u8>().ok())
        .map(|bg| bg < 7 || bg == 8)
        .unwrap_or(false)
}
