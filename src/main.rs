use clap::Parser;
use std::process;
use std::sync::Arc;
use warehouse::cli::{Cli, Commands};
use warehouse::mcp::run_mcp_server;
use warehouse::{Config, ErrorKind, ShipStation, WarehouseError, cli_handlers, config, logging};

fn fail(e: &WarehouseError) -> ! {
    let label = match e.kind() {
        ErrorKind::NotFound => "Not found",
        ErrorKind::Auth => "Authentication error",
        ErrorKind::Upstream => "ShipStation error",
        ErrorKind::Refused => "Refused",
        ErrorKind::Usage => "Error",
        ErrorKind::Internal => "Internal error",
    };
    eprintln!("{label}: {e}");
    process::exit(e.kind().exit_code());
}

fn serve_mcp(shipstation: Arc<ShipStation>) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_mcp_server(shipstation))
}

fn main() {
    let cli = Cli::parse();

    if let Ok(dir) = std::env::current_dir() {
        config::load_dotenv(&dir);
    }
    logging::init(cli.verbose);

    let config = Config::from_env().unwrap_or_else(|e| fail(&e));
    // The blocking HTTP client is built, and later dropped, outside any
    // async runtime.
    let shipstation = Arc::new(ShipStation::from_config(&config).unwrap_or_else(|e| fail(&e)));
    let ss = shipstation.as_ref();
    let json = cli.json;

    let result = match cli.command {
        Commands::Order { number } => cli_handlers::handle_order(ss, &number, json),
        Commands::Orders { status } => cli_handlers::handle_orders(ss, status, json),
        Commands::Search { name } => cli_handlers::handle_search(ss, &name, json),
        Commands::Tags => cli_handlers::handle_tags(ss, json),
        Commands::Tag { query, tag, yes } => cli_handlers::handle_tag(ss, &query, &tag, yes, json),
        Commands::Rush { query, yes } => cli_handlers::handle_rush(ss, &query, yes, json),
        Commands::Note { query, note, yes } => cli_handlers::handle_note(ss, &query, &note, yes, json),
        Commands::Do { query, action, yes } => cli_handlers::handle_do(ss, &query, &action, yes, json),
        Commands::Emails { product } => cli_handlers::handle_emails(ss, &product, json),
        Commands::Mcp => {
            if let Err(e) = serve_mcp(Arc::clone(&shipstation)) {
                eprintln!("MCP server error: {e}");
                process::exit(1);
            }
            return;
        }
    };

    if let Err(e) = result {
        fail(&e);
    }
}
