use crate::models::OrderStatus;
use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "warehouse")]
#[command(about = "ShipStation order lookup and tagging for the warehouse")]
#[command(version)]
pub struct Cli {
    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show one order by order number
    Order {
        /// Order number
        number: String,
    },

    /// List orders by status
    Orders {
        /// awaiting_payment, awaiting_shipment, pending_fulfillment, shipped, on_hold, cancelled
        #[arg(long, default_value = "awaiting_shipment")]
        status: OrderStatus,
    },

    /// Search orders awaiting shipment by customer name
    Search {
        /// Customer name or part of it
        name: String,
    },

    /// List the tags defined in the account
    Tags,

    /// Add a tag to an order unless it already has it
    Tag {
        /// Order number or customer name
        query: String,
        /// Tag name, exactly as defined in ShipStation
        tag: String,
        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Mark an order awaiting shipment as RUSH
    Rush {
        /// Order number or customer name
        query: String,
        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Append an internal note to an order
    Note {
        /// Order number or customer name
        query: String,
        /// Note text
        note: String,
        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// RUSH the order if ACTION is "rush", otherwise add ACTION as a note
    Do {
        /// Order number or customer name
        query: String,
        /// "RUSH" or a note
        action: String,
        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Customer emails for awaiting orders containing a product
    Emails {
        /// SKU or product name fragment, e.g. DC2
        product: String,
    },

    /// Start MCP server on stdio
    Mcp,
}
