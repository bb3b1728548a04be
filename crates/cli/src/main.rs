//! Interactive demo: one shared event log, two independent projections.
//!
//! A write-authoritative **producer** (put/take) and a read-only
//! **consumer** each keep their own store in sync with the same in-memory
//! log, the way independently deployed services would against a log server.

use core::ops::ControlFlow;
use std::sync::Arc;
use std::thread;

use stockpile_log::{CancelToken, InMemoryEventLog};
use stockpile_projection::{AggregateError, StockAggregate};
use stockpile_store::MemoryStore;

mod repl;

use repl::Command;

type Service = StockAggregate<Arc<InMemoryEventLog>, MemoryStore>;

fn main() -> anyhow::Result<()> {
    stockpile_observability::init();

    // One shared log; each service owns its projection store, exactly as
    // independently deployed services would.
    let log = Arc::new(InMemoryEventLog::new());
    let producer = Arc::new(StockAggregate::new(log.clone(), MemoryStore::new()));
    let consumer = Arc::new(StockAggregate::new(log, MemoryStore::new()));

    let cancel = CancelToken::new();
    let listeners = [
        spawn_service("producer", producer.clone(), cancel.clone()),
        spawn_service("consumer", consumer.clone(), cancel.clone()),
    ];

    println!("commands:");
    println!("  put <quantity> <object>   put objects onto the pile");
    println!("  take <quantity> <object>  take objects from the pile");
    println!("  print                     print both projections");
    println!("  exit                      quit");
    println!("---------------------");

    repl::scan_lines(|line| {
        if line.is_empty() {
            return Ok(ControlFlow::Continue(()));
        }
        let command = match repl::parse_command(line) {
            Ok(command) => command,
            Err(error) => {
                println!("ERR: {error:#}");
                return Ok(ControlFlow::Continue(()));
            }
        };

        match command {
            Command::Exit => return Ok(ControlFlow::Break(())),
            Command::Print => {
                print_projection("producer", &producer)?;
                print_projection("consumer", &consumer)?;
            }
            Command::Put { object, quantity } => {
                if let Err(error) = producer.put(&object, quantity) {
                    report(error)?;
                }
            }
            Command::Take { object, quantity } => {
                if let Err(error) = producer.take(&object, quantity) {
                    report(error)?;
                }
            }
        }
        Ok(ControlFlow::Continue(()))
    })?;

    cancel.cancel();
    for listener in listeners {
        let _ = listener.join();
    }
    Ok(())
}

/// Keep each service's projection live in the background.
fn spawn_service(
    name: &'static str,
    service: Arc<Service>,
    cancel: CancelToken,
) -> thread::JoinHandle<()> {
    thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            // A service that cannot complete its startup sync refuses to run.
            if let Err(error) = service.run(&cancel) {
                tracing::error!(service = name, %error, "service stopped");
                std::process::exit(1);
            }
        })
        .expect("failed to spawn service thread")
}

/// Print a domain failure and keep the loop alive; anything else is fatal.
fn report(error: AggregateError) -> anyhow::Result<()> {
    match error {
        AggregateError::Domain(domain) => {
            println!("ERR: {domain}");
            Ok(())
        }
        other => Err(other.into()),
    }
}

fn print_projection(name: &str, service: &Service) -> anyhow::Result<()> {
    let (marker, objects) = service.snapshot()?;
    match marker {
        Some(version) => println!("{name} @ version {version}:"),
        None => println!("{name} (never synchronized):"),
    }
    if objects.is_empty() {
        println!("  (empty)");
    }
    for (object, quantity) in objects {
        println!("  {object}: {quantity}");
    }
    Ok(())
}
