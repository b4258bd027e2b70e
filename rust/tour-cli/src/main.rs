mod cli;

use anyhow::{Context, Result};
use bson::doc;
use clap::Parser;
use dotenv::dotenv;
use serde::Serialize;
use tour_db::{config, NewTour, TourQuery, TourRepository};

use cli::{Root, TourCommands};

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let root = Root::parse();
    let config = config::load_config().context("Failed to load configuration")?;
    let client = config::connect(&config).await?;
    // collections are created and indexed on connect
    let tours = TourRepository::connect(&client, &config).await?;

    match root.command {
        TourCommands::Indexes => {
            for index in tours.collection().indices() {
                let name = index
                    .options
                    .as_ref()
                    .and_then(|o| o.name.clone())
                    .unwrap_or_default();
                println!("{}.{}: {}", config.tour_collection, name, index.keys);
            }
        }
        TourCommands::Import { path } => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let inputs: Vec<NewTour> = serde_json::from_str(&raw)?;

            let total = inputs.len();
            let mut created = 0;
            for input in inputs {
                let name = input.name.clone().unwrap_or_default();
                match tours.create(input).await {
                    Ok(_) => created += 1,
                    Err(e) => log::error!("Skipping tour '{}': {}", name, e),
                }
            }
            log::info!("Imported {} of {} tours", created, total);
        }
        TourCommands::List {
            include_secret,
            no_guides,
            limit,
        } => {
            let mut query = TourQuery::new()
                .sort(doc! { "price": 1, "ratingsAverage": -1 })
                .limit(limit);
            if include_secret {
                query = query.include_secret();
            }
            if no_guides {
                query = query.without_guides();
            }
            print_json(&tours.find(query).await?)?;
        }
        TourCommands::Show { slug } => {
            let tour = tours
                .find_one(TourQuery::by_slug(&slug).with_reviews().select_created_at())
                .await?
                .with_context(|| format!("No tour with slug '{}'", slug))?;
            print_json(&tour)?;
        }
        TourCommands::Within {
            center,
            distance,
            unit,
        } => {
            print_json(&tours.tours_within(center, distance, unit).await?)?;
        }
        TourCommands::Distances { center, unit } => {
            print_json(&tours.distances_from(center, unit).await?)?;
        }
    }

    Ok(())
}
