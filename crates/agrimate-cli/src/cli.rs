use agrimate_core::geocode::DEFAULT_GEOCODE_URL;
use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "agrimate")]
#[command(version, about = "Agrimate - farming assistant in the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Gateway base URL
    #[arg(
        long,
        global = true,
        env = "AGRIMATE_SERVER_URL",
        default_value = "http://localhost:5000"
    )]
    pub server: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive chat (default)
    Chat(LocationArgs),

    /// Ask a single question and stream the answer
    Ask(AskArgs),

    /// Current weather for a city
    Weather {
        /// City name
        city: String,
    },

    /// Mandi price for a crop
    Price {
        /// Crop name
        crop: String,
    },

    /// Resolve coordinates to a place name
    Locate(CoordinateArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct AskArgs {
    /// Question to ask
    #[arg(required = true, num_args = 1..)]
    pub prompt: Vec<String>,

    #[command(flatten)]
    pub location: LocationArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct LocationArgs {
    /// Location used for weather context
    #[arg(long, conflicts_with_all = ["lat", "lon"])]
    pub location: Option<String>,

    #[command(flatten)]
    pub coordinates: OptionalCoordinates,
}

#[derive(Args, Debug, Clone, Default)]
pub struct OptionalCoordinates {
    /// Latitude to detect the location from
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude to detect the location from
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Reverse geocoding service
    #[arg(long, env = "AGRIMATE_GEOCODE_URL", default_value = DEFAULT_GEOCODE_URL)]
    pub geocode_url: String,
}

#[derive(Args, Debug, Clone)]
pub struct CoordinateArgs {
    /// Latitude
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Longitude
    #[arg(long, allow_negative_numbers = true)]
    pub lon: f64,

    /// Reverse geocoding service
    #[arg(long, env = "AGRIMATE_GEOCODE_URL", default_value = DEFAULT_GEOCODE_URL)]
    pub geocode_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask_with_location() {
        let cli = Cli::try_parse_from([
            "agrimate",
            "ask",
            "Any",
            "tips?",
            "--location",
            "Pune",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Ask(args)) => {
                assert_eq!(args.prompt.join(" "), "Any tips?");
                assert_eq!(args.location.location.as_deref(), Some("Pune"));
            }
            _ => panic!("expected ask command"),
        }
    }

    #[test]
    fn test_coordinates_require_each_other() {
        assert!(Cli::try_parse_from(["agrimate", "chat", "--lat", "18.5"]).is_err());
        assert!(
            Cli::try_parse_from(["agrimate", "chat", "--lat", "18.5", "--lon", "73.8"]).is_ok()
        );
    }

    #[test]
    fn test_location_conflicts_with_coordinates() {
        assert!(
            Cli::try_parse_from([
                "agrimate",
                "chat",
                "--location",
                "Pune",
                "--lat",
                "1",
                "--lon",
                "2"
            ])
            .is_err()
        );
    }
}
