use std::path::PathBuf;

use pulse_core::view::{self, TokenView};
use pulse_core::{TokenStore, TokenTab, UiState, load_tokens_json};

fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/tokens.json"));
    if !path.exists() {
        eprintln!("fixture not found at {}", path.display());
        return Ok(());
    }

    let mut store = TokenStore::new();
    store.ingest(load_tokens_json(&path)?, true);
    let ui = UiState::default();
    let view = TokenView::new(&store, &ui);

    println!("# tabs");
    for tab in TokenTab::ALL {
        println!("{tab} = {}", view.tokens_by_tab(tab).len());
    }

    println!("\n# by market cap");
    for token in view::sorted_tokens(&store, &ui.filters, ui.sort_config) {
        println!("{:<10} {:>16.2} {}", token.ticker, token.market_cap, token.platform);
    }

    Ok(())
}
