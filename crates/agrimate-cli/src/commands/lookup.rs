use agrimate_core::{GeocodeClient, WeatherContext};
use anyhow::Result;
use colored::Colorize;
use serde_json::Value;

use crate::cli::CoordinateArgs;
use crate::client::GatewayClient;
use crate::output::{OutputFormat, json::print_json};

fn error_message(body: &Value) -> Option<&str> {
    body.get("error")
        .or_else(|| body.get("message"))
        .and_then(Value::as_str)
}

/// Human-readable weather line, if the payload carries current conditions.
pub fn weather_summary(city: &str, body: &Value) -> Option<String> {
    WeatherContext::from_payload(body).map(|context| context.sentence(city))
}

/// Human-readable price line.
pub fn price_summary(crop: &str, body: &Value) -> String {
    match (
        body.get("mandi").and_then(Value::as_str),
        body.get("price").and_then(Value::as_str),
    ) {
        (Some(mandi), Some(price)) => format!("{crop}: {price} at {mandi} mandi"),
        _ => error_message(body)
            .unwrap_or("No data for this crop")
            .to_string(),
    }
}

pub async fn weather(client: &GatewayClient, city: &str, format: OutputFormat) -> Result<()> {
    let lookup = client.weather(city).await?;
    if format.is_json() {
        return print_json(&lookup.body);
    }

    match weather_summary(city, &lookup.body) {
        Some(line) => println!("{line}"),
        None => println!(
            "{} {} (status {})",
            "No weather:".yellow(),
            error_message(&lookup.body).unwrap_or("unexpected response"),
            lookup.status
        ),
    }
    Ok(())
}

pub async fn price(client: &GatewayClient, crop: &str, format: OutputFormat) -> Result<()> {
    let lookup = client.price(crop).await?;
    if format.is_json() {
        return print_json(&lookup.body);
    }

    println!("{}", price_summary(crop, &lookup.body));
    Ok(())
}

pub async fn locate(args: CoordinateArgs, format: OutputFormat) -> Result<()> {
    let geocoder = GeocodeClient::new()?.with_base_url(&args.geocode_url);
    let name = geocoder.locate(args.lat, args.lon).await?;

    if format.is_json() {
        return print_json(&serde_json::json!({ "location": name }));
    }
    match name {
        Some(name) => println!("{name}"),
        None => println!("{}", "No city, town, village or county found".yellow()),
    }
    Ok(())
}
