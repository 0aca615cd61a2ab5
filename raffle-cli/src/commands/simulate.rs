use super::config::resolve_config;
use chrono::Utc;
use clap::Args;
use comfy_table::{presets::UTF8_FULL, Table};
use raffle_core::{
    Address, Amount, InMemoryBank, Keeper, ManualClock, MockVrfCoordinator, Raffle, RaffleError,
    RaffleEvent, Result, TickOutcome,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::TryRecvError};

#[derive(Args)]
pub struct SimulateArgs {
    /// Players entering each round
    #[arg(short, long, default_value_t = 4)]
    pub players: u64,

    /// Number of rounds to run
    #[arg(short, long, default_value_t = 3)]
    pub rounds: u64,

    /// Seed for generated player addresses
    #[arg(long)]
    pub seed: Option<u64>,

    /// Network preset (hardhat, localhost, goerli)
    #[arg(short, long)]
    pub network: Option<String>,
}

pub async fn simulate(args: SimulateArgs, data_dir: &Path) -> Result<()> {
    if args.players == 0 {
        return Err(RaffleError::config("Need at least one player per round"));
    }

    let config = resolve_config(data_dir, args.network.as_deref())?;
    if !config.is_development() {
        tracing::warn!(
            "Network '{}' is not a development network, using a local mock oracle anyway",
            config.network
        );
    }

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let coordinator = Arc::new(MockVrfCoordinator::new());
    let bank = Arc::new(InMemoryBank::new());
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let address = Address::from_bytes(rng.gen());
    coordinator.add_consumer(address);

    let ticket = config.ticket_price;
    let interval = config.interval;
    let raffle = Arc::new(Raffle::new(
        address,
        config,
        coordinator.clone(),
        bank.clone(),
        clock.clone(),
    )?);
    let keeper = Keeper::new(raffle.clone(), Duration::from_secs(1));
    let mut events = raffle.subscribe();

    println!("Raffle {} (ticket {}, interval {}s)", address, ticket, interval.as_secs());

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Round", "Request", "Players", "Winner", "Prize", "Winner balance"]);

    for _ in 0..args.rounds {
        for _ in 0..args.players {
            raffle.enter(Address::from_bytes(rng.gen()), ticket).await?;
        }

        clock.advance(interval + Duration::from_secs(1));
        let request_id = match keeper.tick().await? {
            TickOutcome::Performed(id) => id,
            other => {
                return Err(RaffleError::internal(format!(
                    "Keeper did not close the round: {:?}",
                    other
                )))
            }
        };

        coordinator
            .fulfill_random_words(request_id, raffle.as_ref())
            .await?;

        if let Some((round, winner, prize)) = last_winner(&mut events) {
            table.add_row(vec![
                round.to_string(),
                request_id.to_string(),
                args.players.to_string(),
                winner.short(),
                prize.to_string(),
                bank.balance_of(winner).to_string(),
            ]);
        }
    }

    println!("{}", table);
    println!("Total paid out: {}", bank.total_paid());

    Ok(())
}

/// Drain queued events, returning the last winner seen
pub fn last_winner(
    events: &mut broadcast::Receiver<RaffleEvent>,
) -> Option<(u64, Address, Amount)> {
    let mut last = None;
    loop {
        match events.try_recv() {
            Ok(RaffleEvent::WinnerPicked {
                round,
                winner,
                prize,
                ..
            }) => last = Some((round, winner, prize)),
            Ok(_) => {}
            // entry events can crowd out older ones on big rounds
            Err(TryRecvError::Lagged(_)) => {}
            Err(_) => break,
        }
    }
    last
}
