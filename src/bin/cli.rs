use clap::{Parser, Subcommand};
use cuckoofilter_client::{Client, ClientConfig};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Service address (host:port), falls back to CUCKOO_ADDR
    #[arg(short, long, global = true)]
    addr: Option<String>,

    /// Per-call timeout in milliseconds, falls back to CUCKOO_TIMEOUT_MS
    #[arg(short, long, global = true)]
    timeout_ms: Option<u64>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the service is reachable
    Ping,

    /// Create a new filter
    Create {
        /// Filter name
        name: String,

        /// Expected number of elements
        #[arg(short, long, default_value = "1000000")]
        capacity: u64,
    },

    /// Insert one element
    Insert { name: String, element: String },

    /// Insert several elements, printing the ones that were rejected
    InsertMany {
        name: String,
        #[arg(required = true)]
        elements: Vec<String>,
    },

    /// Check whether an element is present
    Lookup { name: String, element: String },

    /// Check several elements at once
    LookupMany {
        name: String,
        #[arg(required = true)]
        elements: Vec<String>,
    },

    /// Delete one element
    Delete { name: String, element: String },

    /// Delete a whole filter
    Drop { name: String },

    /// Remove every element from a filter
    Reset { name: String },

    /// Number of elements in a filter
    Count { name: String },

    /// List all filters
    List,

    /// Ping, create a filter, insert an element and look it up
    Demo {
        #[arg(long, default_value = "fff")]
        name: String,
        #[arg(long, default_value = "1000000")]
        capacity: u64,
        #[arg(long, default_value = "guobin")]
        element: String,
    },
}

fn init_logger(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("cuckoofilter_client=debug,info"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("cuckoofilter_client=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact(),
        )
        .init();
}

fn build_config(cli: &Cli) -> cuckoofilter_client::Result<ClientConfig> {
    ClientConfig::from_env_with(
        cli.addr.clone(),
        cli.timeout_ms.map(Duration::from_millis),
    )
}

fn report(label: &str, ok: bool) {
    if ok {
        println!("{label}: ok");
    } else {
        println!("{label}: rejected");
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(&cli)?;
    let client = Client::connect(config).await?;

    let outcome = execute(&client, cli.command).await;
    client.close().await;
    outcome
}

async fn execute(
    client: &Client,
    command: Commands,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Ping => {
            client.ping().await?;
            println!("pong from {}", client.config().addr);
        }
        Commands::Create { name, capacity } => {
            report("create", client.create_filter(&name, capacity).await?);
        }
        Commands::Insert { name, element } => {
            report("insert", client.insert_element(&name, &element).await?);
        }
        Commands::InsertMany { name, elements } => {
            let failed = client.insert_elements(&name, elements.as_slice()).await?;
            println!(
                "inserted {} of {} elements",
                elements.len() - failed.len(),
                elements.len()
            );
            for element in failed {
                println!("  failed: {element}");
            }
        }
        Commands::Lookup { name, element } => {
            let found = client.lookup_element(&name, &element).await?;
            println!("{element}: {}", if found { "present" } else { "absent" });
        }
        Commands::LookupMany { name, elements } => {
            let outcome = client.lookup_elements(&name, elements.as_slice()).await?;
            for element in outcome.matched {
                println!("{element}: present");
            }
            for element in outcome.unmatched {
                println!("{element}: absent");
            }
        }
        Commands::Delete { name, element } => {
            report("delete", client.delete_element(&name, &element).await?);
        }
        Commands::Drop { name } => {
            report("drop", client.delete_filter(&name).await?);
        }
        Commands::Reset { name } => {
            report("reset", client.reset_filter(&name).await?);
        }
        Commands::Count { name } => {
            println!("{}", client.count_elements(&name).await?);
        }
        Commands::List => {
            for name in client.list_filters().await? {
                println!("{name}");
            }
        }
        Commands::Demo {
            name,
            capacity,
            element,
        } => {
            client.ping().await?;
            if !client.create_filter(&name, capacity).await? {
                println!("filter {name} was not created (it may already exist)");
            }
            if !client.insert_element(&name, &element).await? {
                println!("element {element} was not inserted");
            }
            if client.lookup_element(&name, &element).await? {
                println!("do something");
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
