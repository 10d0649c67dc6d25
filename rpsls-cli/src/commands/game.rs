use comfy_table::{presets::UTF8_FULL, Table};
use dialoguer::Select;
use rpsls_core::{
    Action, Address, GameClient, GameError, GameId, GameSession, Ledger, Move, Result, Role,
    SessionStore, Wei,
};

pub async fn create_game<L: Ledger, S: SessionStore>(
    client: &GameClient<L, S>,
    opponent: Address,
    stake: &str,
    choice: Option<Move>,
) -> Result<()> {
    let stake = Wei::from_ether(stake)?;
    let mv = choose_move(choice)?;

    let session = client.create(mv, opponent, stake).await?;

    println!("Created game {}", session.game_id);
    println!("Opponent: {}", session.player2);
    println!("Stake: {}", session.stake);
    println!("Your move: {} (hidden until you reveal)", mv);
    println!();
    println!("Share this command with your opponent:");
    println!(
        "rpsls --account {} play {} {}",
        session.player2,
        session.game_id,
        session.stake.to_ether_string()
    );

    Ok(())
}

pub async fn play_game<L: Ledger, S: SessionStore>(
    client: &GameClient<L, S>,
    game: &GameId,
    stake: &str,
    choice: Option<Move>,
) -> Result<()> {
    let stake = Wei::from_ether(stake)?;
    let mv = choose_move(choice)?;

    let session = client.play(game, mv, stake).await?;

    println!("Played {} in game {}", session.player2_move, session.game_id);
    println!("Waiting for {} to reveal...", session.player1);

    Ok(())
}

pub async fn reveal_move<L: Ledger, S: SessionStore>(
    client: &GameClient<L, S>,
    game: Option<GameId>,
) -> Result<()> {
    let game = resolve_game(client, game)?;
    let session = client.reveal(&game).await?;

    println!("Revealed game {}", game);
    print_result(&session);

    Ok(())
}

pub async fn claim_timeout<L: Ledger, S: SessionStore>(
    client: &GameClient<L, S>,
    game: Option<GameId>,
) -> Result<()> {
    let game = resolve_game(client, game)?;
    let session = client.claim_available_timeout(&game).await?;

    println!("Timeout claimed on game {}", game);
    println!("Phase: {}", session.phase);

    Ok(())
}

pub async fn show_status<L: Ledger, S: SessionStore>(
    client: &GameClient<L, S>,
    game: Option<GameId>,
) -> Result<()> {
    let game = resolve_game(client, game)?;
    let status = client.status(&game).await?;
    let session = &status.session;

    println!("Game Status: {}", game);
    println!("═══════════════════════════════════");
    println!("Phase: {}", session.phase);
    println!("Your role: {}", status.role);
    println!("Stake: {}", session.stake);
    if !session.is_terminal() {
        let deadline = status.contract.last_action.saturating_add(status.contract.timeout);
        println!("Timeout: {}", status.time_remaining);
        println!("Deadline: {}", format_timestamp(deadline));
    }
    if status.role == Role::Player1 {
        if let Some((mv, _)) = session.secret() {
            println!("Your committed move: {}", mv);
        }
    }
    print_result(session);
    println!();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Player", "Address", "Move"]);
    let player1_move = match session.secret() {
        Some((mv, _)) if status.role == Role::Player1 => mv.to_string(),
        _ => "hidden".to_string(),
    };
    let player2_move = if session.player2_move.is_none() {
        "-".to_string()
    } else {
        session.player2_move.to_string()
    };
    table.add_row(vec![
        "Player 1".to_string(),
        session.player1.to_string(),
        player1_move,
    ]);
    table.add_row(vec![
        "Player 2".to_string(),
        session.player2.to_string(),
        player2_move,
    ]);
    println!("{}", table);

    if !status.actions.is_empty() {
        println!();
        println!("Available:");
        for action in &status.actions {
            match action {
                Action::Play => println!("  rpsls play {} <stake>", game),
                Action::Reveal => println!("  rpsls reveal {}", game),
                Action::ClaimTimeout(_) => println!("  rpsls timeout {}", game),
            }
        }
    }

    Ok(())
}

pub fn list_games<L: Ledger, S: SessionStore>(client: &GameClient<L, S>) -> Result<()> {
    let sessions = client.sessions()?;

    if sessions.is_empty() {
        println!("No local games.");
        return Ok(());
    }

    let current = client.current()?.map(|s| s.game_id);
    let account = client.account();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["", "Game", "Role", "Phase", "Stake"]);

    for session in &sessions {
        let marker = if Some(session.game_id) == current { "*" } else { "" };
        table.add_row(vec![
            marker.to_string(),
            session.game_id.to_string(),
            session.role_of(&account).to_string(),
            session.phase.to_string(),
            session.stake.to_string(),
        ]);
    }

    println!("Games:");
    println!("{}", table);

    Ok(())
}

pub fn show_current<L: Ledger, S: SessionStore>(client: &GameClient<L, S>) -> Result<()> {
    match client.current()? {
        Some(session) => {
            println!("Current game: {}", session.game_id);
            println!("Phase: {}", session.phase);
        }
        None => println!("No current game."),
    }
    Ok(())
}

fn resolve_game<L: Ledger, S: SessionStore>(
    client: &GameClient<L, S>,
    game: Option<GameId>,
) -> Result<GameId> {
    if let Some(game) = game {
        return Ok(game);
    }
    client
        .current()?
        .map(|s| s.game_id)
        .ok_or_else(|| GameError::config("No current game; pass a game address"))
}

fn choose_move(choice: Option<Move>) -> Result<Move> {
    if let Some(mv) = choice {
        return Ok(mv);
    }

    let names: Vec<&str> = Move::PLAYABLE.iter().map(|m| m.name()).collect();
    let selection = Select::new()
        .with_prompt("Choose your move")
        .items(&names)
        .default(0)
        .interact()
        .map_err(|e| GameError::internal(format!("Move selection failed: {}", e)))?;

    Ok(Move::PLAYABLE[selection])
}

fn print_result(session: &GameSession) {
    if let Some(resolution) = &session.resolution {
        println!("Winner: {}", resolution.winner);
        match resolution.payout {
            Some(payout) => println!("Payout: {}", payout),
            None => println!("Tie: both stakes refunded"),
        }
    }
}

fn format_timestamp(secs: u64) -> String {
    chrono::DateTime::from_timestamp(secs as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| secs.to_string())
}
