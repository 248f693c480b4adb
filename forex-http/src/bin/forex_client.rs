use std::env;

use forex_http::http::forex_v1::client::Client;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| "http://127.0.0.1:8000".to_string());
    let client = Client::new(path);

    let currencies = client.currencies().await?;
    println!("{} currencies", currencies.data.len());

    let rates = client.rates("USD").await?;
    for (code, rate) in &rates.data.rates {
        println!("USD/{code} {rate}");
    }

    let conversion = client.convert("USD", "EUR", 100.0).await?;
    println!(
        "100 USD = {} EUR at {}",
        conversion.data.converted_amount, conversion.data.rate
    );

    let history = client.history("USD", "EUR", 5).await?;
    for point in &history.data {
        println!("{} {} {}", history.pair, point.date, point.rate);
    }
    Ok(())
}
