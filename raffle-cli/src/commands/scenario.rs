use super::simulate::last_winner;
use comfy_table::{presets::UTF8_FULL, Table};
use raffle_core::{
    Address, Clock, InMemoryBank, ManualClock, MockVrfCoordinator, Raffle, RaffleConfig,
    RaffleError, Result,
};
use std::sync::Arc;
use std::time::Duration;

struct Scenario {
    players: u64,
    random_word: u64,
}

fn lookup(name: &str) -> Result<Scenario> {
    match name.to_ascii_lowercase().as_str() {
        "a" => Ok(Scenario {
            players: 1,
            random_word: 7,
        }),
        "b" => Ok(Scenario {
            players: 4,
            random_word: 42,
        }),
        other => Err(RaffleError::config(format!(
            "Unknown scenario '{}', expected a or b",
            other
        ))),
    }
}

pub async fn run_scenario(name: &str) -> Result<()> {
    let scenario = lookup(name)?;
    let config = RaffleConfig::default();

    let coordinator = Arc::new(MockVrfCoordinator::new());
    let bank = Arc::new(InMemoryBank::new());
    let clock = Arc::new(ManualClock::default());
    let address = Address::from_low_u64(0x1000);
    coordinator.add_consumer(address);

    let ticket = config.ticket_price;
    let interval = config.interval;
    let raffle = Raffle::new(
        address,
        config,
        coordinator.clone(),
        bank.clone(),
        clock.clone(),
    )?;
    let mut events = raffle.subscribe();

    let players: Vec<Address> = (1..=scenario.players).map(Address::from_low_u64).collect();
    for player in &players {
        raffle.enter(*player, ticket).await?;
    }
    println!("{} player(s) entered, pot {}", players.len(), raffle.pot().await);

    clock.advance(interval + Duration::from_secs(1));
    println!("Upkeep needed: {}", raffle.check_upkeep(clock.now()).await);

    let request_id = raffle.perform_upkeep(clock.now()).await?;
    println!("State {} with request {}", raffle.state().await, request_id);

    coordinator
        .fulfill_random_words_with_override(request_id, &raffle, vec![scenario.random_word])
        .await?;

    let (round, winner, prize) = last_winner(&mut events)
        .ok_or_else(|| RaffleError::internal("No winner was picked"))?;
    let index = players.iter().position(|p| *p == winner).unwrap_or_default();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Round", "Random word", "Index", "Winner", "Prize", "State"]);
    table.add_row(vec![
        round.to_string(),
        scenario.random_word.to_string(),
        index.to_string(),
        winner.to_string(),
        prize.to_string(),
        raffle.state().await.to_string(),
    ]);
    println!("{}", table);
    println!(
        "Players left: {}, pot: {}, winner balance: {}",
        raffle.player_count().await,
        raffle.pot().await,
        bank.balance_of(winner)
    );

    Ok(())
}
