use metadata_gateway::{MetadataGateway, ProviderConfig, QueryParams};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "metadata_gateway=debug".into()),
        )
        .init();

    let mut builder = MetadataGateway::builder().provider(ProviderConfig::jikan());
    if let Ok(key) = std::env::var("TMDB_API_KEY") {
        builder = builder.provider(ProviderConfig::tmdb(key));
    } else {
        println!("Set TMDB_API_KEY to also query TMDB.");
    }
    let gateway = builder.build();

    let query = std::env::args().nth(1).unwrap_or_else(|| "cowboy bebop".to_string());

    let params = QueryParams::new().with("q", &query).with("limit", "5");
    let results = gateway.query("jikan", &params).await?;
    println!("jikan results for '{query}':");
    for media in &results {
        println!("  {} [{}] {:.1}/10", media.title, media.external_id, media.rating);
    }

    // A repeat of the same query is served from cache; no network call.
    let again = gateway.query("jikan", &params).await?;
    println!("cached repeat returned {} results", again.len());

    if gateway.providers().any(|p| p == "tmdb") {
        let params = QueryParams::new().with("query", &query);
        let results = gateway.query("tmdb", &params).await?;
        println!("tmdb results: {}", results.len());
    }

    Ok(())
}
