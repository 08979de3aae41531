use crate::client::ShipStation;
use crate::error::WarehouseError;
use crate::models::OrderStatus;
use crate::transport::{HttpTransport, Transport};
use rmcp::{
    ErrorData as McpError, ServerHandler, ServiceExt, handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters, model::*, schemars, tool, tool_handler, tool_router,
    transport::stdio,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Warehouse MCP server
pub struct WarehouseMcp<T: Transport + 'static = HttpTransport> {
    shipstation: Arc<ShipStation<T>>,
    tool_router: ToolRouter<Self>,
}

impl<T: Transport + 'static> Clone for WarehouseMcp<T> {
    fn clone(&self) -> Self {
        Self {
            shipstation: Arc::clone(&self.shipstation),
            tool_router: self.tool_router.clone(),
        }
    }
}

// Input types for tools
#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct OrderNumberInput {
    pub order_number: String,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SearchInput {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ListOrdersInput {
    /// Defaults to awaiting_shipment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AddTagInput {
    pub order_number: String,
    pub tag: String,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AddNoteInput {
    pub order_number: String,
    pub note: String,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ProductInput {
    pub product: String,
}

// Response type
#[derive(Debug, Serialize)]
pub struct McpResponse<T: Serialize> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> McpResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "ok",
            data: Some(data),
            error_code: None,
            message: None,
        }
    }

    pub fn error(error_code: &str, message: &str) -> Self {
        Self {
            status: "error",
            data: None,
            error_code: Some(error_code.to_string()),
            message: Some(message.to_string()),
        }
    }
}

fn to_json<T: Serialize>(response: McpResponse<T>) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string(&response)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn error_to_response(e: WarehouseError) -> McpResponse<serde_json::Value> {
    McpResponse::error(e.kind().as_str(), &e.to_string())
}

impl<T: Transport + 'static> WarehouseMcp<T> {
    /// Run a blocking client call off the async workers and wrap the result
    async fn call<F, R>(&self, f: F) -> Result<CallToolResult, McpError>
    where
        F: FnOnce(&ShipStation<T>) -> crate::Result<R> + Send + 'static,
        R: Serialize + Send + 'static,
    {
        let shipstation = Arc::clone(&self.shipstation);
        let result = tokio::task::spawn_blocking(move || f(&shipstation))
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        match result {
            Ok(data) => to_json(McpResponse::success(data)),
            Err(e) => {
                tracing::warn!(error = %e, "tool call failed");
                to_json(error_to_response(e))
            }
        }
    }
}

#[tool_router]
impl<T: Transport + 'static> WarehouseMcp<T> {
    pub fn new(shipstation: Arc<ShipStation<T>>) -> Self {
        Self {
            shipstation,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Get an order by its order number: status, customer, items, tag ids, tracking and internal notes."
    )]
    async fn get_order(
        &self,
        params: Parameters<OrderNumberInput>,
    ) -> Result<CallToolResult, McpError> {
        let number = params.0.order_number;
        self.call(move |ss| ss.get_order(&number)).await
    }

    #[tool(
        description = "Search orders awaiting shipment by customer name. Case-insensitive substring match, with a fuzzy fallback. Returns an empty list when nothing matches."
    )]
    async fn search_orders(
        &self,
        params: Parameters<SearchInput>,
    ) -> Result<CallToolResult, McpError> {
        let name = params.0.name;
        self.call(move |ss| ss.search_orders(&name)).await
    }

    #[tool(
        description = "List orders by status (awaiting_payment, awaiting_shipment, pending_fulfillment, shipped, on_hold, cancelled). Defaults to awaiting_shipment."
    )]
    async fn list_orders(
        &self,
        params: Parameters<ListOrdersInput>,
    ) -> Result<CallToolResult, McpError> {
        let status = params.0.status;
        self.call(move |ss| {
            let status = match status.as_deref() {
                Some(s) => s.parse::<OrderStatus>().map_err(WarehouseError::InvalidInput)?,
                None => OrderStatus::AwaitingShipment,
            };
            ss.list_orders(status)
        })
        .await
    }

    #[tool(description = "List the tags defined in the ShipStation account with their ids.")]
    async fn list_tags(&self) -> Result<CallToolResult, McpError> {
        self.call(|ss| ss.list_tags()).await
    }

    #[tool(
        description = "Ensure an order carries a tag. The tag name must match exactly (case-sensitive). Safe to repeat: if the tag is already present nothing is written and the outcome is already_present."
    )]
    async fn add_tag(&self, params: Parameters<AddTagInput>) -> Result<CallToolResult, McpError> {
        let p = params.0;
        self.call(move |ss| ss.ensure_tag(&p.order_number, &p.tag)).await
    }

    #[tool(
        description = "Mark an order as RUSH. Only orders awaiting shipment can be rushed. Safe to repeat."
    )]
    async fn mark_rush(
        &self,
        params: Parameters<OrderNumberInput>,
    ) -> Result<CallToolResult, McpError> {
        let number = params.0.order_number;
        self.call(move |ss| ss.mark_rush_by_number(&number)).await
    }

    #[tool(
        description = "Append an internal note to an order and tag it 'Special NOTE!'. Notes are comma-appended to any existing notes; repeating the call appends again."
    )]
    async fn add_note(&self, params: Parameters<AddNoteInput>) -> Result<CallToolResult, McpError> {
        let p = params.0;
        self.call(move |ss| ss.add_note_by_number(&p.order_number, &p.note)).await
    }

    #[tool(
        description = "Unique customer emails for orders awaiting shipment that contain a product whose SKU or name includes the given text."
    )]
    async fn customer_emails(
        &self,
        params: Parameters<ProductInput>,
    ) -> Result<CallToolResult, McpError> {
        let product = params.0.product;
        self.call(move |ss| ss.customer_emails(&product)).await
    }
}

#[tool_handler]
impl<T: Transport + 'static> ServerHandler for WarehouseMcp<T> {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Warehouse - ShipStation order lookup and tagging. Find an order with get_order (by number) or \
                 search_orders (by customer name), then use add_tag, mark_rush or add_note with its order number. \
                 Tagging is idempotent; notes are not."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_mcp_server(shipstation: Arc<ShipStation>) -> anyhow::Result<()> {
    let mcp = WarehouseMcp::new(shipstation);

    let service = mcp.serve(stdio()).await.inspect_err(|e| {
        tracing::error!(error = %e, "error starting MCP server");
    })?;

    service.waiting().await?;
    Ok(())
}
