//! Request/response messaging around the scraper.
//!
//! A caller sends a [`Request`] tagged by `action` and receives exactly one
//! [`Response`] through a oneshot channel. The channel stays open until the
//! scrape finishes, however long that takes.

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::models::{OrderRecord, ProductRecord};
use crate::scrapers::Scraper;

/// Incoming message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    /// Scrape one product page (URL or saved file).
    ScrapeProduct { url: String },
    /// Scrape one seller order page.
    ScrapeOrder { url: String },
    Ping,
}

impl Request {
    pub fn action(&self) -> &'static str {
        match self {
            Self::ScrapeProduct { .. } => "scrapeProduct",
            Self::ScrapeOrder { .. } => "scrapeOrder",
            Self::Ping => "ping",
        }
    }
}

/// Reply to a [`Request`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Response {
    Product { product: ProductRecord },
    Order { order: OrderRecord },
    Pong,
    Error { message: String },
}

impl Response {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Parse a request from JSON, answering malformed input with an error
/// response instead of failing.
pub fn parse_request(json: &str) -> Result<Request, Response> {
    serde_json::from_str(json).map_err(|e| Response::error(format!("invalid request: {}", e)))
}

/// Answers requests using a shared [`Scraper`].
#[derive(Clone)]
pub struct Dispatcher {
    scraper: Scraper,
}

impl Dispatcher {
    pub fn new(scraper: Scraper) -> Self {
        Self { scraper }
    }

    /// Handle one request to completion.
    pub async fn handle(&self, request: Request) -> Response {
        debug!("Handling {} request", request.action());
        let response = match request {
            Request::Ping => Response::Pong,
            Request::ScrapeProduct { url } => match self.scraper.scrape_product(&url, None).await {
                Ok(product) => Response::Product { product },
                Err(e) => Response::error(e.to_string()),
            },
            Request::ScrapeOrder { url } => match self.scraper.scrape_order(&url).await {
                Ok(order) => Response::Order { order },
                Err(e) => Response::error(e.to_string()),
            },
        };
        if let Response::Error { message } = &response {
            warn!("Request failed: {}", message);
        }
        response
    }

    /// Handle a request on a background task, replying through `reply`.
    pub fn dispatch(&self, request: Request, reply: oneshot::Sender<Response>) {
        let this = self.clone();
        tokio::spawn(async move {
            let response = this.handle(request).await;
            if reply.send(response).is_err() {
                debug!("Requester went away before the reply was ready");
            }
        });
    }

    /// Send a request and wait for its reply.
    pub async fn request(&self, request: Request) -> Response {
        let (tx, rx) = oneshot::channel();
        self.dispatch(request, tx);
        rx.await
            .unwrap_or_else(|_| Response::error("handler dropped the reply channel"))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::models::Site;
    use crate::scrapers::{FetchError, FetchedPage, OrderCatalog, PageFetcher, SiteRegistry};

    struct OnePage;

    #[async_trait]
    impl PageFetcher for OnePage {
        async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
            if url.contains("missing") {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                });
            }
            Ok(FetchedPage::local(
                url,
                r#"<html><body><span id="productTitle">Kettle</span>
                   <span class="a-price"><span class="a-offscreen">$24.99</span></span></body></html>"#
                    .to_string(),
            ))
        }
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Scraper::new(
            Arc::new(OnePage),
            Arc::new(SiteRegistry::builtin().unwrap()),
            Arc::new(OrderCatalog::builtin().compile().unwrap()),
        ))
    }

    #[test]
    fn test_request_wire_format() {
        let req = parse_request(r#"{"action":"scrapeProduct","url":"https://x"}"#).unwrap();
        assert_eq!(
            req,
            Request::ScrapeProduct {
                url: "https://x".to_string()
            }
        );
        assert_eq!(parse_request(r#"{"action":"ping"}"#).unwrap(), Request::Ping);
        assert!(parse_request(r#"{"action":"explode"}"#).unwrap_err().is_error());

        let json = serde_json::to_value(Response::error("boom")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "error", "message": "boom"}));
    }

    #[tokio::test]
    async fn test_ping() {
        assert_eq!(dispatcher().request(Request::Ping).await, Response::Pong);
    }

    #[tokio::test]
    async fn test_scrape_product_replies_with_record() {
        let response = dispatcher()
            .request(Request::ScrapeProduct {
                url: "https://www.amazon.com/dp/B000000001".to_string(),
            })
            .await;
        match response {
            Response::Product { product } => {
                assert_eq!(product.source, Site::Amazon);
                assert_eq!(product.id.as_deref(), Some("B000000001"));
                assert_eq!(product.price, Some(24.99));
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_failure_is_error_response() {
        let response = dispatcher()
            .request(Request::ScrapeOrder {
                url: "https://www.ebay.com/missing".to_string(),
            })
            .await;
        assert!(response.is_error());
    }
}
