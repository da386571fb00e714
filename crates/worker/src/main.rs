use anyhow::Context;
use clap::Parser;
use dinner_core::domain::config::WidgetConfig;
use dinner_core::pipeline::Generator;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "dinner_worker")]
struct Args {
    /// Latitude. Defaults to DINNER_LAT.
    #[arg(long, allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Longitude. Defaults to DINNER_LON.
    #[arg(long, allow_negative_numbers = true)]
    lon: Option<f64>,

    /// Number of forecast days to plan.
    #[arg(long)]
    days: Option<u32>,

    /// Locale used for weekday names (e.g. fr-FR).
    #[arg(long)]
    locale: Option<String>,

    /// Language the meals are written in.
    #[arg(long)]
    language: Option<String>,

    /// Fetch the forecast and print the prompt without calling the completion service.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = dinner_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    let config = apply_overrides(WidgetConfig::from_env(), &args);
    let generator = Generator::from_settings(&settings)?;

    if args.dry_run {
        let preview = generator.preview_prompt(&config).await?;
        tracing::info!(days = preview.days.len(), dry_run = true, "forecast fetched; completion skipped");
        println!("{}", preview.prompt);
        return Ok(());
    }

    match generator.run(&config).await {
        Ok(run) => {
            tracing::info!(run_id = %run.run_id, degraded = run.degraded, "plan generated");
            let out = serde_json::to_string_pretty(&run.plans).context("failed to encode plan")?;
            println!("{out}");
            Ok(())
        }
        Err(err) => {
            let err = anyhow::Error::new(err);
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %err, "forecast run failed");
            Err(err)
        }
    }
}

fn apply_overrides(config: WidgetConfig, args: &Args) -> WidgetConfig {
    WidgetConfig {
        lat: args.lat.or(config.lat),
        lon: args.lon.or(config.lon),
        forecast_days: args.days.or(config.forecast_days),
        locale: args.locale.clone().or(config.locale),
        language: args.language.clone().or(config.language),
        ..config
    }
}

fn init_sentry(settings: &dinner_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_environment() {
        let args = Args::parse_from(["dinner_worker", "--lat", "-33.87", "--lon", "151.2", "--days", "3"]);
        let base = WidgetConfig {
            lat: Some(1.0),
            lon: Some(2.0),
            locale: Some("en-GB".to_string()),
            ..WidgetConfig::default()
        };

        let out = apply_overrides(base, &args);
        assert_eq!(out.lat, Some(-33.87));
        assert_eq!(out.lon, Some(151.2));
        assert_eq!(out.forecast_days, Some(3));
        assert_eq!(out.locale.as_deref(), Some("en-GB"));
        assert!(!args.dry_run);
    }
}
