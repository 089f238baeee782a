//! Subcommand handlers

use std::path::Path;

use anyhow::{Context, bail};
use grocery_client::{
    ClientConfig, GroceryClient, OrderLine, OrderOutcome, OrderRecord, PollOutcome, RestockBatch,
    RestockOutcome, TruckClient, TruckIdentity,
};
use tokio_util::sync::CancellationToken;

use crate::Command;

pub async fn run(
    command: Command,
    config: ClientConfig,
    shutdown: &CancellationToken,
) -> anyhow::Result<()> {
    match command {
        Command::Register {
            device_id,
            password,
            email,
            phone,
        } => {
            let client = GroceryClient::new(config)?;
            client.register(&device_id, &password, &email, &phone).await?;
            println!("Registered {device_id}. Log in with `grocery login {device_id}`.");
        }
        Command::Login {
            device_id,
            password,
        } => {
            let mut client = GroceryClient::new(config)?;
            client.login(&device_id, &password).await?;
            println!("Logged in as {device_id}");
        }
        Command::Logout => {
            let mut client = GroceryClient::new(config)?;
            client.logout()?;
            println!("Logged out");
        }
        Command::Whoami => {
            let client = restored(config).await?;
            if let Some(device_id) = client.session().device_id() {
                println!("{device_id}");
            }
        }
        Command::Order { items, cancel } => {
            let mut client = restored(config).await?;
            order(&mut client, &items, cancel, shutdown).await?;
        }
        Command::History => {
            let mut client = restored(config).await?;
            let orders = client.history().await?;
            if orders.is_empty() {
                println!("No orders yet");
            }
            for record in &orders {
                print_record(record);
            }
        }
        Command::Last => {
            let mut client = restored(config).await?;
            match client.last_order().await? {
                Some(record) => print_record(&record),
                None => println!("No orders yet"),
            }
        }
        Command::TruckRegister {
            truck_id,
            plate,
            driver,
        } => {
            let client = TruckClient::new(config)?;
            client
                .register_truck(&TruckIdentity::new(&truck_id, plate, driver))
                .await?;
            println!("Truck {truck_id} registered");
        }
        Command::Restock { manifest } => {
            let batch = load_batch(&manifest)?;
            let mut client = TruckClient::new(config)?;
            restock(&mut client, &batch, shutdown).await?;
        }
    }
    Ok(())
}

/// Client with the cached session restored; fails when there is none or the
/// service cannot be reached.
async fn restored(config: ClientConfig) -> anyhow::Result<GroceryClient> {
    let mut client = GroceryClient::new(config)?;
    if !client.restore().await? {
        bail!("Not logged in. Run `grocery login <device-id> --password <password>` first.");
    }
    Ok(client)
}

async fn order(
    client: &mut GroceryClient,
    items: &[OrderLine],
    cancel: bool,
    shutdown: &CancellationToken,
) -> anyhow::Result<()> {
    let order = client.preview(items).await?;
    let order_id = order.order_id().unwrap_or_default().to_string();
    println!("Reserved order {order_id}:");
    for (sku, qty) in order.items().into_iter().flatten() {
        println!("  {sku} x{qty}");
    }

    if cancel {
        client.cancel().await?;
        println!("Reservation {order_id} released");
        return Ok(());
    }

    client.confirm().await?;
    println!("Order {order_id} confirmed, waiting for robots...");

    match client.wait_for_completion(shutdown).await? {
        PollOutcome::Terminal(_) => {
            let outcome = client.acknowledge()?;
            if let OrderOutcome::Completed { total_price, .. } = &outcome {
                println!("Order {order_id} completed. Total: {total_price}");
            }
            if let OrderOutcome::Cancelled { .. } = &outcome {
                println!("Order {order_id} was cancelled by the service");
            }
            outcome.into_result()?;
        }
        PollOutcome::TimedOut { attempts } => {
            println!("Order {order_id} still in progress after {attempts} checks");
            println!("Check on it later with `grocery last`");
        }
        PollOutcome::Cancelled { .. } => {
            println!("Stopped waiting; order {order_id} continues on the service");
        }
    }
    Ok(())
}

async fn restock(
    client: &mut TruckClient,
    batch: &RestockBatch,
    shutdown: &CancellationToken,
) -> anyhow::Result<()> {
    let order_id = client.submit(batch).await?;
    let estimate = batch
        .estimated_cost()
        .map(|cost| format!(", est. {cost}"))
        .unwrap_or_default();
    println!(
        "Restock {order_id} accepted ({} lines{estimate}), robots are offloading...",
        batch.manifest.len(),
    );

    match client.wait_for_completion(shutdown).await? {
        PollOutcome::Terminal(RestockOutcome::Completed { total_cost, .. }) => {
            println!("Restock {order_id} completed. Total cost: {total_cost}");
        }
        PollOutcome::Terminal(RestockOutcome::Failed { status, .. }) => {
            bail!("Restock {order_id} failed: {status}");
        }
        PollOutcome::TimedOut { attempts } => {
            println!("Restock {order_id} still in progress after {attempts} checks");
        }
        PollOutcome::Cancelled { .. } => {
            println!("Stopped waiting; restock {order_id} continues on the service");
        }
    }
    Ok(())
}

fn load_batch(path: &Path) -> anyhow::Result<RestockBatch> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;
    let batch = serde_json::from_str(&json)
        .with_context(|| format!("Invalid manifest {}", path.display()))?;
    Ok(batch)
}

fn print_record(record: &OrderRecord) {
    let created = record
        .created_at
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    println!(
        "{:<38} {:<16} {:>10} {}",
        record.order_id, record.status, record.total_price, created
    );
}
