use crate::config::{Config, Credentials};
use crate::error::{Result, WarehouseError};
use crate::models::{Order, OrderPage, OrderStatus, Tag, WriteAck};
use crate::transport::{ApiRequest, HttpTransport, Transport};
use serde::de::DeserializeOwned;
use serde_json::json;

/// Largest page ShipStation will serve
pub const MAX_PAGE_SIZE: u32 = 500;

/// Upper bound on pages followed by one listing
const MAX_PAGES: i64 = 100;

/// Longest upstream error body echoed back to the user
const ERROR_BODY_LIMIT: usize = 200;

/// ShipStation API client.
///
/// Every operation checks for credentials before touching the transport, so
/// a missing key fails fast with `MissingCredentials` and no request is made.
pub struct ShipStation<T: Transport = HttpTransport> {
    transport: T,
    credentials: Option<Credentials>,
}

impl ShipStation<HttpTransport> {
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = HttpTransport::from_config(config)?;
        Ok(ShipStation::new(transport, config.credentials.clone()))
    }
}

impl<T: Transport> ShipStation<T> {
    pub fn new(transport: T, credentials: Option<Credentials>) -> Self {
        ShipStation {
            transport,
            credentials,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub(crate) fn credentials(&self) -> Result<&Credentials> {
        self.credentials
            .as_ref()
            .ok_or(WarehouseError::MissingCredentials)
    }

    /// Send a request and return the body of a 2xx response
    fn execute(&self, request: ApiRequest) -> Result<String> {
        let credentials = self.credentials()?;
        let response = self.transport.send(&request, credentials)?;

        if response.is_success() {
            return Ok(response.body);
        }

        tracing::warn!(
            status = response.status,
            path = %request.path,
            "shipstation returned an error status"
        );
        match response.status {
            401 | 403 => Err(WarehouseError::Unauthorized(response.status)),
            status => Err(WarehouseError::Api {
                status,
                message: summarize_body(&response.body),
            }),
        }
    }

    fn execute_json<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R> {
        let path = request.path.clone();
        let body = self.execute(request)?;
        serde_json::from_str(&body)
            .map_err(|e| WarehouseError::MalformedResponse(format!("{path}: {e}")))
    }

    fn fetch_page(&self, request: ApiRequest) -> Result<(Vec<Order>, i64)> {
        let page: OrderPage = self.execute_json(request)?;
        let pages = page.pages.unwrap_or(1);
        let orders = page
            .orders
            .into_iter()
            .map(Order::from_value)
            .collect::<Result<Vec<_>>>()?;
        Ok((orders, pages))
    }

    /// Fetch `/orders` pages in turn until `visit` returns true, the last
    /// page is reached, or `MAX_PAGES` have been read
    fn walk_pages(
        &self,
        request: impl Fn(i64) -> ApiRequest,
        mut visit: impl FnMut(Vec<Order>) -> bool,
    ) -> Result<()> {
        let mut page = 1;
        loop {
            let (orders, pages) = self.fetch_page(request(page))?;
            let empty = orders.is_empty();
            if visit(orders) || empty || page >= pages {
                return Ok(());
            }
            if page >= MAX_PAGES {
                tracing::warn!(pages, read = MAX_PAGES, "stopped paging early, results are incomplete");
                return Ok(());
            }
            page += 1;
        }
    }

    /// Look up an order by the number the customer sees.
    ///
    /// The upstream filter is a prefix match, so only an exact number match
    /// counts.
    pub fn get_order(&self, order_number: &str) -> Result<Order> {
        let number = order_number.trim();
        if number.is_empty() {
            return Err(WarehouseError::InvalidInput("order number is empty".to_string()));
        }
        let _span = tracing::debug_span!("get_order", order_number = number).entered();

        let mut found = None;
        self.walk_pages(
            |page| {
                ApiRequest::get("/orders")
                    .query("orderNumber", number)
                    .query("page", page)
                    .query("pageSize", MAX_PAGE_SIZE)
            },
            |orders| {
                found = orders.into_iter().find(|o| o.order_number == number);
                found.is_some()
            },
        )?;
        found.ok_or_else(|| WarehouseError::OrderNotFound(number.to_string()))
    }

    /// Look up an order by ShipStation's internal id
    pub fn get_order_by_id(&self, order_id: i64) -> Result<Order> {
        let body = match self.execute(ApiRequest::get(format!("/orders/{order_id}"))) {
            Ok(body) => body,
            Err(WarehouseError::Api { status: 404, .. }) => {
                return Err(WarehouseError::OrderIdNotFound(order_id));
            }
            Err(e) => return Err(e),
        };
        let value: serde_json::Value = serde_json::from_str(&body)?;
        Order::from_value(value)
    }

    /// All orders in `status`, following pagination
    pub fn list_orders(&self, status: OrderStatus) -> Result<Vec<Order>> {
        let _span = tracing::debug_span!("list_orders", status = %status).entered();
        let mut all = Vec::new();
        self.walk_pages(
            |page| {
                ApiRequest::get("/orders")
                    .query("orderStatus", status)
                    .query("page", page)
                    .query("pageSize", MAX_PAGE_SIZE)
            },
            |orders| {
                all.extend(orders);
                false
            },
        )?;
        tracing::debug!(count = all.len(), "listed orders");
        Ok(all)
    }

    /// Tags defined in the account, sorted by name
    pub fn list_tags(&self) -> Result<Vec<Tag>> {
        let mut tags: Vec<Tag> = self.execute_json(ApiRequest::get("/accounts/listtags"))?;
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    /// Unconditionally attach a tag. Callers wanting idempotence go through
    /// `apply_tag`.
    pub fn add_tag(&self, order_id: i64, tag_id: i64) -> Result<()> {
        let request = ApiRequest::post(
            "/orders/addtag",
            json!({ "orderId": order_id, "tagId": tag_id }),
        );
        let ack: WriteAck = self.execute_json(request)?;
        if !ack.success {
            return Err(WarehouseError::WriteRejected(
                ack.message.unwrap_or_else(|| "addtag reported failure".to_string()),
            ));
        }
        tracing::info!(order_id, tag_id, "tag added");
        Ok(())
    }

    /// Resubmit an order (ShipStation updates in place when `orderKey`
    /// matches) and return the stored result
    pub fn update_order(&self, order: &Order) -> Result<Order> {
        let request = ApiRequest::post("/orders/createorder", order.payload().clone());
        let value: serde_json::Value = self.execute_json(request)?;
        let updated = Order::from_value(value)?;
        tracing::info!(order_id = updated.order_id, "order updated");
        Ok(updated)
    }
}

fn summarize_body(body: &str) -> String {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("Message")
                .or_else(|| v.get("message"))
                .or_else(|| v.get("error"))
                .and_then(|m| m.as_str().map(str::to_string))
        })
        .unwrap_or_else(|| body.trim().to_string());

    if message.chars().count() > ERROR_BODY_LIMIT {
        let cut: String = message.chars().take(ERROR_BODY_LIMIT).collect();
        format!("{cut}...")
    } else if message.is_empty() {
        "(empty body)".to_string()
    } else {
        message
    }
}
