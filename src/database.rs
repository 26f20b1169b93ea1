use mongodb::{bson::doc, error::Error, Client, Database};
use tracing::{info, warn};

pub async fn connect(uri: &str, name: &str) -> Result<Database, Error> {
    let client = Client::with_uri_str(uri).await?;
    let db = client.database(name);

    // The driver connects lazily; an unreachable store is reported per request.
    match db.run_command(doc! { "ping": 1 }, None).await {
        Ok(_) => info!(database = name, "Connected to MongoDB"),
        Err(error) => warn!(database = name, %error, "MongoDB did not answer ping"),
    }

    Ok(db)
}
