//! Synthetic venue simulation.
//!
//! Seeds an in-memory venue, drives honest and noisy reviewers through the
//! full task -> comparison -> reputation -> grades loop and prints the
//! resulting ranking, so the whole engine can be exercised end to end from
//! the command line.

use clap::Parser;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use crowdrank::{
    ItemId, MemoryStore, RankerConfig, RankingEngine, ReputationParams, UserId, VenueSettings,
};

#[derive(Parser, Debug)]
#[command(name = "venue_sim", about = "Simulate a peer-ranked venue end to end")]
struct Args {
    /// Number of submissions (one author each).
    #[arg(long, default_value_t = 12)]
    items: usize,
    /// How many authors also review.
    #[arg(long, default_value_t = 8)]
    reviewers: usize,
    /// How many of the reviewers order items randomly instead of honestly.
    #[arg(long, default_value_t = 2)]
    noisy: usize,
    /// Items each reviewer sees.
    #[arg(long, default_value_t = 5)]
    reviews_per_reviewer: u32,
    /// Outer reputation iterations.
    #[arg(long, default_value_t = 4)]
    iterations: usize,
    /// Small-alpha inner passes; 0 selects chronological mode.
    #[arg(long, default_value_t = 10)]
    last_comparisons: usize,
    /// RNG seed for reviewers and the engine.
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Emit the final grade table as JSON instead of text.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let args = Args::parse();
    let venue = 1;

    let store = MemoryStore::new();
    store.set_venue_settings(
        venue,
        VenueSettings { submissions_per_reviewer: Some(args.reviews_per_reviewer) },
    );
    // Item id doubles as its true quality; author ids mirror item ids.
    for item in 1..=args.items as ItemId {
        store.add_item(venue, item, item as UserId);
    }

    let config = RankerConfig { seed: Some(args.seed), ..RankerConfig::default() };
    config.validate()?;
    let engine = RankingEngine::with_config(store, config);
    let mut rng = StdRng::seed_from_u64(args.seed);

    // The engine only updates beliefs; recording the task offer and the
    // comparison row is the host's job, played here by the simulation.
    let started = chrono::Utc::now();
    let mut clock = 0i64;
    let reviewers: Vec<UserId> = (1..=args.reviewers.min(args.items) as UserId).collect();
    for (position, &reviewer) in reviewers.iter().enumerate() {
        let honest = position >= args.noisy;
        let mut seen: Vec<ItemId> = Vec::new();
        for _ in 0..args.reviews_per_reviewer {
            let Some(item) = engine.next_task(venue, reviewer, &seen).await? else {
                break;
            };
            engine.store().add_task(venue, reviewer, item);
            seen.push(item);
            if seen.len() < 2 {
                continue;
            }
            let mut perceived = seen.clone();
            if honest {
                perceived.sort_unstable();
            } else {
                perceived.shuffle(&mut rng);
            }
            engine
                .record_comparison(venue, reviewer, &perceived, Some(item), None)
                .await?;
            clock += 1;
            perceived.reverse();
            engine.store().add_comparison(
                venue,
                crowdrank::ComparisonRecord {
                    reviewer,
                    ordering: perceived,
                    new_item: Some(item),
                    is_valid: None,
                    date: started + chrono::Duration::seconds(clock),
                },
            );
        }
    }

    engine.score_reviewers(venue).await?;
    let params = ReputationParams {
        iterations: args.iterations,
        last_comparisons: (args.last_comparisons > 0).then_some(args.last_comparisons),
        ..ReputationParams::default()
    };
    engine.run_reputation(venue, params).await?;

    let grades = engine.store().grades(venue);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&grades)?);
        return Ok(());
    }

    println!("submissions (item = true quality):");
    for item in 1..=args.items as ItemId {
        if let Some(record) = engine.store().item(venue, item) {
            println!(
                "  item {:>3}  mean {:>8.1}  stdev {:>7.1}  percentile {:>6.1}",
                item,
                record.mean.unwrap_or_default(),
                record.stdev.unwrap_or_default(),
                record.percentile.unwrap_or_default(),
            );
        }
    }
    println!("final grades:");
    for row in &grades {
        let noisy = (row.user as usize) <= args.noisy && reviewers.contains(&row.user);
        println!(
            "  user {:>3}  grade {:>6.3}  percentile {:>6.1}{}",
            row.user,
            row.grade,
            row.percentile,
            if noisy { "  (noisy reviewer)" } else { "" },
        );
    }
    Ok(())
}
