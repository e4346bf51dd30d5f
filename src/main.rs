mod fetch;
mod groups;
mod payload;
mod ranking;
mod rows;
mod text;

use std::error::Error;
use std::time::Duration;

use chrono::Timelike;

use crate::ranking::{build_leaderboards, empty_boards, Leaderboard};
use crate::rows::RoleTable;

const DEFAULT_API_URL: &str = "http://localhost:3000/api/ranking";
// Poll every 30s while data is on screen, retry every 5s while empty.
const POLL_INTERVAL: Duration = Duration::from_secs(30);
const RETRY_INTERVAL_NO_DATA: Duration = Duration::from_secs(5);

fn has_data(boards: &[Leaderboard]) -> bool {
    boards.iter().any(|board| !board.rows.is_empty())
}

fn render(boards: &[Leaderboard]) {
    for board in boards {
        println!(
            "== [{}] {} ({}) ==",
            board.def.kicker, board.def.title, board.def.subtitle
        );
        if board.rows.is_empty() {
            if chrono::Local::now().hour() < 9 {
                println!("   aguardando as primeiras vendas do dia");
            } else {
                println!("   aguardando dados da API");
            }
            continue;
        }
        for (position, row) in board.rows.iter().enumerate() {
            let meta = if row.meta.is_empty() {
                String::new()
            } else {
                format!(" ({})", row.meta)
            };
            println!("   {:02}. {}{} - {:.2}", position + 1, row.name, meta, row.value);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let primary_url = fetch::build_api_url(
        &std::env::var("RANKING_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
    );
    let fallback_url =
        fetch::build_api_url(&std::env::var("RANKING_API_URL_FALLBACK").unwrap_or_default());

    let client = fetch::build_client()?;
    let table = RoleTable::default();

    // The previously rendered set survives failed cycles so a transient
    // fetch error never blanks the board.
    let mut current = empty_boards();

    println!("[FETCH] polling {primary_url}");
    loop {
        match fetch::fetch_payload(&client, &primary_url, &fallback_url).await {
            Ok(data) => {
                let updated = build_leaderboards(&data, &table);
                if has_data(&updated) {
                    current = updated;
                } else if !has_data(&current) {
                    println!("[FETCH] payload carried no recognizable ranking data");
                }
            }
            Err(e) => eprintln!("[FETCH] cycle failed: {e}"),
        }

        render(&current);

        let interval = if has_data(&current) {
            POLL_INTERVAL
        } else {
            RETRY_INTERVAL_NO_DATA
        };
        tokio::time::sleep(interval).await;
    }
}
