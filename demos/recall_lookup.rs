use anyhow::Result;
use nhtsa_recalls::{Client, VehicleQuery};

fn main() -> Result<()> {
    // Example program that calls the library API.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    let mut client = Client::from_env()?;

    let years = client.all_model_years();
    println!("{} model years with recalls", years.len());

    let makes = client.all_makes(2018);
    println!("2018 makes: {}", makes.len());
    println!("2018 Honda models: {}", client.all_models(2018, "HONDA").join(", "));

    let query = VehicleQuery::new().make("honda").model("civic").model_year(2018);
    let found = client.fetch_by_vehicle(&query)?;
    println!("{found} recall(s) for 2018 Honda Civic");
    println!("{client}");

    client.fetch_by_campaign("20V682000")?;
    println!("{client}");
    Ok(())
}
