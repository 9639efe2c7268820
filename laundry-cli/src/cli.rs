use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use laundry_core::{
    Assistant, Config, ForecastDaySummary,
    config::{MODEL_API_KEY_ENV, WEATHER_API_KEY_ENV},
    model::DEFAULT_LOCATION,
};
use tracing::info;

pub const REMEDIATION_HINT: &str = "Hint: make sure both WEATHER_API (WeatherAPI.com key) and \
GROQ_API_KEY (language-model key) are set in the environment or a .env file, \
or run `laundry configure`.";

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "laundry", version, about = "Find the best day to do your laundry")]
pub struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the forecast and a laundry-day recommendation (default).
    Recommend(ForecastArgs),

    /// Print the forecast only.
    Forecast {
        #[command(flatten)]
        args: ForecastArgs,

        /// Print the forecast as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Store API keys and the default location in the config file.
    Configure,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ForecastArgs {
    /// Location to check; defaults to the configured one.
    #[arg(short, long)]
    pub location: Option<String>,

    /// Number of forecast days.
    #[arg(short, long)]
    pub days: Option<u8>,
}

impl ForecastArgs {
    fn apply(self, mut config: Config) -> Config {
        if let Some(location) = self.location {
            config.location = Some(location);
        }
        if let Some(days) = self.days {
            config.forecast_days = Some(days);
        }
        config
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command.unwrap_or_else(|| Command::Recommend(ForecastArgs::default())) {
            Command::Recommend(args) => {
                let assistant = Assistant::from_config(&load_config(args)?)?;

                let days = assistant.fetch_forecast().await?;
                println!("Forecast for {}:", assistant.location());
                print_forecast(&days);

                // The printed forecast doubles as the tool result, so one run makes a single weather call.
                let recommendation = assistant.get_recommendation_with_forecast(&days).await?;
                println!();
                println!("Recommendation:");
                println!("{recommendation}");
            }
            Command::Forecast { args, json } => {
                let assistant = Assistant::from_config(&load_config(args)?)?;
                let days = assistant.fetch_forecast().await?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&days)?);
                } else {
                    println!("Forecast for {}:", assistant.location());
                    print_forecast(&days);
                }
            }
            Command::Configure => configure()?,
        }

        Ok(())
    }
}

fn load_config(args: ForecastArgs) -> anyhow::Result<Config> {
    let config = Config::load()?.with_env();
    Ok(args.apply(config))
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let weather_key = Password::new(&format!("WeatherAPI.com key ({WEATHER_API_KEY_ENV}):"))
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read WeatherAPI.com key")?;
    let model_key = Password::new(&format!("Language-model key ({MODEL_API_KEY_ENV}):"))
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read language-model key")?;
    let current_location = config.location.clone().unwrap_or_else(|| DEFAULT_LOCATION.to_string());
    let location = Text::new("Default location:")
        .with_default(&current_location)
        .prompt()
        .context("Failed to read default location")?;

    // Blank answers keep whatever was stored before.
    if !weather_key.trim().is_empty() {
        config.weather_api_key = Some(weather_key.trim().to_string());
    }
    if !model_key.trim().is_empty() {
        config.model_api_key = Some(model_key.trim().to_string());
    }
    config.location = Some(location);

    config.validate()?;
    let path = config.save()?;
    info!(path = %path.display(), "saved configuration");
    println!("Configuration saved to {}", path.display());

    Ok(())
}

fn print_forecast(days: &[ForecastDaySummary]) {
    for day in days {
        println!("  {}", format_day(day));
    }
}

fn format_day(day: &ForecastDaySummary) -> String {
    format!(
        "{}  {:<24} avg {:.1}°C ({:.1}..{:.1})  humidity {:.0}%  rain {}  precip {:.1} mm  wind {:.1} kph",
        day.date.format("%a %Y-%m-%d"),
        day.condition,
        day.avg_temp_c,
        day.min_temp_c,
        day.max_temp_c,
        day.avg_humidity,
        day.daily_chance_of_rain,
        day.total_precip_mm,
        day.max_wind_kph,
    )
}
