use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tour_db::{DistanceUnit, LatLng};

/// Clap definitions for the `tours` operator tool. Connection settings come
/// from `TOURS_*` environment variables (or a `.env` file).
#[derive(Parser)]
#[command(
    version,
    about,
    long_about = "Command line interface for inspecting and seeding the tours collection"
)]
pub struct Root {
    #[command(subcommand)]
    pub command: TourCommands,
}

fn positive_distance(raw: &str) -> Result<f64, String> {
    match raw.parse::<f64>() {
        Ok(distance) if distance > 0.0 && distance.is_finite() => Ok(distance),
        _ => Err(format!("'{}' is not a positive distance", raw)),
    }
}

#[derive(Subcommand, Clone)]
pub enum TourCommands {
    /// Create the collections and apply their indices.
    Indexes,
    /// Create tours from a JSON file holding an array of tours.
    Import {
        #[arg(help = "path to the JSON file")]
        path: PathBuf,
    },
    /// List tours, cheapest first.
    List {
        #[arg(long, help = "also list secret tours")]
        include_secret: bool,
        #[arg(long, help = "leave guides as ids")]
        no_guides: bool,
        #[arg(long, default_value = "20", value_parser = clap::value_parser!(i64).range(1..))]
        limit: i64,
    },
    /// Show one tour by its slug, with its reviews.
    Show { slug: String },
    /// Tours starting within a distance of a point.
    Within {
        #[arg(help = "center written as lat,lng")]
        center: LatLng,
        #[arg(value_parser = positive_distance)]
        distance: f64,
        #[arg(long, default_value = "km")]
        unit: DistanceUnit,
    },
    /// Distance of every tour from a point, nearest first.
    Distances {
        #[arg(help = "reference point written as lat,lng")]
        center: LatLng,
        #[arg(long, default_value = "km")]
        unit: DistanceUnit,
    },
}
