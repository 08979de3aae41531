use crate::client::ShipStation;
use crate::error::{Result, WarehouseError};
use crate::lookup::{Lookup, as_order_number};
use crate::models::{Order, OrderStatus, Tag};
use crate::tagging::{self, RUSH_TAG, TagOutcome};
use crate::transport::Transport;
use serde::Serialize;
use std::io::{self, BufRead, Write};

/// Items shown when confirming an action
const CONFIRM_ITEM_LIMIT: usize = 5;

fn print_json<S: Serialize>(value: &S) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| WarehouseError::Output(format!("JSON: {e}")))?;
    println!("{text}");
    Ok(())
}

/// Read one line from stdin; `None` on end of input
fn ask(question: &str) -> Result<Option<String>> {
    print!("{question}");
    io::stdout().flush()?;
    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
        println!();
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn confirm(order: &Order, question: &str) -> Result<bool> {
    print_summary(order);
    println!();
    let answer = ask(&format!("{question} (y/n): "))?;
    Ok(matches!(
        answer.as_deref().map(str::to_lowercase).as_deref(),
        Some("y") | Some("yes")
    ))
}

fn customer_label(order: &Order) -> String {
    let name = order.customer_name.as_deref().unwrap_or("Unknown");
    match order.customer_email.as_deref() {
        Some(email) if !email.is_empty() => format!("{name} ({email})"),
        _ => name.to_string(),
    }
}

fn print_summary(order: &Order) {
    println!();
    println!("Order #{}", order.order_number);
    println!("Customer: {}", customer_label(order));
    println!("Status:   {}", order.status);
    println!("Total:    ${:.2}", order.order_total);
    if !order.items.is_empty() {
        println!("Items:");
        for item in order.items.iter().take(CONFIRM_ITEM_LIMIT) {
            println!(
                "  - {} x{}",
                item.name.as_deref().unwrap_or("(unnamed)"),
                item.quantity
            );
        }
        if order.items.len() > CONFIRM_ITEM_LIMIT {
            println!("  ... and {} more items", order.items.len() - CONFIRM_ITEM_LIMIT);
        }
    }
}

/// Compact multi-line rendering used by listings and after a change
fn order_line(order: &Order, catalog: &[Tag]) -> String {
    let tags = order.tag_names(catalog);
    let tags_str = if tags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", tags.join(", "))
    };
    let mut out = format!("#{}{} ({})\n", order.order_number, tags_str, order.status);
    out.push_str(&format!("  Customer: {}\n", customer_label(order)));
    out.push_str(&format!("  Total: ${:.2}\n", order.order_total));
    out.push_str(&format!("  Items: {}", order.items.len()));
    if let Some(date) = order.order_date {
        out.push_str(&format!("\n  Date: {}", date.format("%Y-%m-%d %H:%M")));
    }
    if let Some(ref notes) = order.internal_notes {
        out.push_str(&format!("\n  Notes: {notes}"));
    }
    out
}

fn print_order_line(order: &Order, catalog: &[Tag]) {
    println!("{}", order_line(order, catalog));
}

/// Turn a query into a single order, asking the operator to pick when a
/// name matches several. `Ok(None)` means the operator cancelled.
fn select_order<T: Transport>(ss: &ShipStation<T>, query: &str, yes: bool) -> Result<Option<Order>> {
    let mut orders = match ss.find(query)? {
        Lookup::One { order } => return Ok(Some(order)),
        Lookup::Many { orders } => orders,
    };

    match orders.len() {
        0 => Err(WarehouseError::OrderNotFound(format!(
            "{query} (no awaiting-shipment order for that name)"
        ))),
        1 => Ok(orders.pop()),
        n if yes => Err(WarehouseError::InvalidInput(format!(
            "'{query}' matches {n} orders; use the order number"
        ))),
        n => {
            println!();
            println!("Found {n} matching orders:");
            println!();
            for (i, order) in orders.iter().enumerate() {
                println!(
                    "{}. #{} - {} - ${:.2}",
                    i + 1,
                    order.order_number,
                    customer_label(order),
                    order.order_total
                );
            }
            println!();
            let Some(answer) = ask("Select order number (or 'cancel'): ")? else {
                return Ok(None);
            };
            if answer.eq_ignore_ascii_case("cancel") {
                return Ok(None);
            }
            match answer.parse::<usize>() {
                Ok(i) if (1..=n).contains(&i) => Ok(Some(orders.swap_remove(i - 1))),
                _ => Err(WarehouseError::InvalidInput(format!("invalid selection '{answer}'"))),
            }
        }
    }
}

/// Handle the order command
pub fn handle_order<T: Transport>(ss: &ShipStation<T>, number: &str, json: bool) -> Result<()> {
    let order = ss.get_order(as_order_number(number).unwrap_or(number))?;
    if json {
        return print_json(&order);
    }
    let catalog = ss.list_tags()?;

    println!("Order #{}", order.order_number);
    println!("Status:   {}", order.status);
    println!("Customer: {}", customer_label(&order));
    if let Some(date) = order.order_date {
        println!("Ordered:  {}", date.format("%Y-%m-%d %H:%M"));
    }
    if let Some(date) = order.ship_date {
        println!("Shipped:  {}", date.format("%Y-%m-%d %H:%M"));
    }
    if let Some(ref tracking) = order.tracking_number {
        println!(
            "Tracking: {tracking} ({})",
            order.carrier.as_deref().unwrap_or("unknown carrier")
        );
    }
    let tags = order.tag_names(&catalog);
    if !tags.is_empty() {
        println!("Tags:     {}", tags.join(", "));
    }
    if let Some(ref notes) = order.internal_notes {
        println!("Notes:    {notes}");
    }
    println!();
    println!("Items:");
    for item in &order.items {
        println!(
            "  - {} (SKU: {}) x{}",
            item.name.as_deref().unwrap_or("(unnamed)"),
            item.sku.as_deref().unwrap_or("-"),
            item.quantity
        );
    }
    Ok(())
}

/// Handle the orders command
pub fn handle_orders<T: Transport>(ss: &ShipStation<T>, status: OrderStatus, json: bool) -> Result<()> {
    let orders = ss.list_orders(status)?;
    if json {
        return print_json(&orders);
    }
    println!("Orders with status: {status}");
    println!("Found {} orders", orders.len());
    println!();
    if orders.is_empty() {
        return Ok(());
    }
    let catalog = ss.list_tags()?;
    for order in &orders {
        print_order_line(order, &catalog);
        println!();
    }
    Ok(())
}

/// Handle the search command
pub fn handle_search<T: Transport>(ss: &ShipStation<T>, name: &str, json: bool) -> Result<()> {
    let orders = ss.search_orders(name)?;
    if json {
        return print_json(&orders);
    }
    if orders.is_empty() {
        println!("No orders found for '{name}' (awaiting shipment).");
        return Ok(());
    }
    let catalog = ss.list_tags()?;
    for order in &orders {
        print_order_line(order, &catalog);
    }
    Ok(())
}

/// Handle the tags command
pub fn handle_tags<T: Transport>(ss: &ShipStation<T>, json: bool) -> Result<()> {
    let tags = ss.list_tags()?;
    if json {
        return print_json(&tags);
    }
    println!("Available tags:");
    for tag in &tags {
        println!("  {} (ID: {})", tag.name, tag.tag_id);
    }
    Ok(())
}

fn report_tag<T: Transport>(ss: &ShipStation<T>, outcome: &TagOutcome, json: bool) -> Result<()> {
    if json {
        return print_json(outcome);
    }
    let number = &outcome.order().order_number;
    let tag = &outcome.tag().name;
    if outcome.changed() {
        println!("✓ Added {tag} tag to order #{number}");
    } else {
        println!("Order #{number} already has {tag} tag.");
    }
    println!();
    print_order_line(outcome.order(), &ss.list_tags()?);
    Ok(())
}

fn tag_selected<T: Transport>(
    ss: &ShipStation<T>,
    query: &str,
    tag_name: &str,
    rush: bool,
    yes: bool,
    json: bool,
) -> Result<()> {
    let tag = ss.resolve_tag(tag_name)?;
    let Some(order) = select_order(ss, query, yes)? else {
        println!("Cancelled.");
        return Ok(());
    };
    if rush {
        tagging::check_rushable(&order)?;
    }

    // Already tagged: report without asking
    if order.has_tag(tag.tag_id) || yes || confirm(&order, &format!("Add {} tag to this order?", tag.name))? {
        let outcome = ss.apply_tag(order, tag)?;
        report_tag(ss, &outcome, json)
    } else {
        println!("Cancelled.");
        Ok(())
    }
}

/// Handle the tag command
pub fn handle_tag<T: Transport>(ss: &ShipStation<T>, query: &str, tag: &str, yes: bool, json: bool) -> Result<()> {
    tag_selected(ss, query, tag, false, yes, json)
}

/// Handle the rush command
pub fn handle_rush<T: Transport>(ss: &ShipStation<T>, query: &str, yes: bool, json: bool) -> Result<()> {
    tag_selected(ss, query, RUSH_TAG, true, yes, json)
}

/// Handle the note command
pub fn handle_note<T: Transport>(ss: &ShipStation<T>, query: &str, note: &str, yes: bool, json: bool) -> Result<()> {
    if note.trim().is_empty() {
        return Err(WarehouseError::InvalidInput("note is empty".to_string()));
    }
    let Some(order) = select_order(ss, query, yes)? else {
        println!("Cancelled.");
        return Ok(());
    };

    if !yes {
        match order.internal_notes.as_deref() {
            Some(existing) => {
                println!();
                println!("Current notes: {existing}");
                println!("New notes will be: {existing}, {}", note.trim());
            }
            None => {
                println!();
                println!("New notes: {}", note.trim());
            }
        }
        if !confirm(&order, "Add this note to order?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let outcome = ss.add_note(order, note)?;
    if json {
        return print_json(&outcome);
    }
    println!("✓ Added note to order #{}", outcome.order.order_number);
    println!();
    print_order_line(&outcome.order, &ss.list_tags()?);
    Ok(())
}

/// Whether a free-form action means "rush"
pub fn is_rush_action(action: &str) -> bool {
    action.trim().eq_ignore_ascii_case(RUSH_TAG)
}

/// Handle the do command
pub fn handle_do<T: Transport>(ss: &ShipStation<T>, query: &str, action: &str, yes: bool, json: bool) -> Result<()> {
    if is_rush_action(action) {
        handle_rush(ss, query, yes, json)
    } else {
        handle_note(ss, query, action, yes, json)
    }
}

/// Handle the emails command
pub fn handle_emails<T: Transport>(ss: &ShipStation<T>, product: &str, json: bool) -> Result<()> {
    let emails = ss.customer_emails(product)?;
    if json {
        return print_json(&emails);
    }
    eprintln!("Found {} unique addresses for '{product}'", emails.len());
    println!("{}", emails.join(", "));
    Ok(())
}
