//! [`CartGateway`] over the Appwrite databases REST API.
//!
//! Each cart line is one document in the cart collection, addressed by its
//! `cartItemId` (the document `$id`) and owned by a user through the
//! configured owner attribute.

use crate::config::AppwriteConfig;
use crate::gateway::{CartGateway, GatewayError};
use crate::types::{CartItem, CartItemId, ProductId, UserData};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::future::Future;
use std::num::NonZeroU32;
use std::sync::Arc;

/// Page size for the initial cart read.
const LOAD_LIMIT: u32 = 100;

/// Appwrite-backed cart gateway.
#[derive(Clone)]
pub struct AppwriteGateway {
    client: Client,
    config: Arc<AppwriteConfig>,
}

impl AppwriteGateway {
    /// Create a gateway with a client honouring the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: AppwriteConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.config.endpoint.trim_end_matches('/'),
            self.config.database_id,
            self.config.cart_collection_id,
        )
    }

    fn document_url(&self, id: &CartItemId) -> String {
        format!("{}/{}", self.documents_url(), id)
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header("X-Appwrite-Project", &self.config.project_id)
            .header("content-type", "application/json");

        match &self.config.jwt {
            Some(jwt) => builder.header("X-Appwrite-JWT", jwt),
            None => builder,
        }
    }

    async fn send(builder: RequestBuilder) -> Result<Response, GatewayError> {
        let response = builder
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify(status, &body))
    }

    async fn patch_document(&self, id: &CartItemId, data: Value) -> Result<(), GatewayError> {
        let builder = self
            .request(Method::PATCH, self.document_url(id))
            .json(&json!({ "data": data }));
        Self::send(builder).await.map(|_| ())
    }
}

/// Map a non-success status onto the gateway error taxonomy.
fn classify(status: StatusCode, body: &str) -> GatewayError {
    let message = serde_json::from_str::<AppwriteErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.to_string());
    let detail = format!("HTTP {}: {message}", status.as_u16());

    match status {
        StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => GatewayError::Conflict(detail),
        _ => GatewayError::Transport(detail),
    }
}

#[derive(Deserialize)]
struct AppwriteErrorBody {
    message: String,
}

#[derive(Deserialize)]
struct DocumentList {
    documents: Vec<CartItemDocument>,
}

/// Cart item as stored remotely.
///
/// Appwrite has no map attribute type, so `options` is a JSON-encoded string.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartItemDocument {
    #[serde(rename = "$id")]
    id: String,
    product_id: String,
    name: String,
    #[serde(default)]
    image: Option<String>,
    price: u64,
    stock: u32,
    #[serde(default)]
    options: Option<String>,
    #[serde(default)]
    returnable: bool,
    #[serde(default)]
    ordering: bool,
}

impl TryFrom<CartItemDocument> for CartItem {
    type Error = GatewayError;

    fn try_from(doc: CartItemDocument) -> Result<Self, Self::Error> {
        let stock = NonZeroU32::new(doc.stock).ok_or_else(|| {
            GatewayError::Decode(format!("cart item {} has zero stock", doc.id))
        })?;

        let options = match doc.options.as_deref().map(str::trim) {
            None | Some("") => BTreeMap::new(),
            Some(raw) => serde_json::from_str(raw).map_err(|e| {
                GatewayError::Decode(format!("cart item {} options: {e}", doc.id))
            })?,
        };

        Ok(Self {
            cart_item_id: CartItemId::new(doc.id),
            product_id: ProductId::new(doc.product_id),
            name: doc.name,
            image: doc.image.unwrap_or_default(),
            price: doc.price,
            stock,
            options,
            returnable: doc.returnable,
            ordering: doc.ordering,
        })
    }
}

impl CartGateway for AppwriteGateway {
    fn load_cart(
        &self,
        user: &UserData,
    ) -> impl Future<Output = Result<Vec<CartItem>, GatewayError>> + Send {
        let owner = json!({
            "method": "equal",
            "attribute": self.config.user_attribute,
            "values": [user.user_id],
        });
        let limit = json!({ "method": "limit", "values": [LOAD_LIMIT] });
        let builder = self
            .request(Method::GET, self.documents_url())
            .query(&[("queries[]", owner.to_string()), ("queries[]", limit.to_string())]);

        async move {
            let response = Self::send(builder).await?;
            let list: DocumentList = response
                .json()
                .await
                .map_err(|e| GatewayError::Decode(e.to_string()))?;

            list.documents.into_iter().map(CartItem::try_from).collect()
        }
    }

    fn persist_ordering_toggle(
        &self,
        _user: &UserData,
        id: &CartItemId,
        ordering: bool,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send {
        self.patch_document(id, json!({ "ordering": ordering }))
    }

    fn persist_stock_change(
        &self,
        _user: &UserData,
        id: &CartItemId,
        stock: NonZeroU32,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send {
        self.patch_document(id, json!({ "stock": stock.get() }))
    }

    fn delete_cart_item(
        &self,
        _user: &UserData,
        id: &CartItemId,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send {
        let builder = self.request(Method::DELETE, self.document_url(id));
        async move { Self::send(builder).await.map(|_| ()) }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_conflicts() {
        let err = classify(
            StatusCode::CONFLICT,
            r#"{"message":"Document was updated after the request timestamp","code":409}"#,
        );
        assert_eq!(
            err,
            GatewayError::Conflict(
                "HTTP 409: Document was updated after the request timestamp".to_string()
            )
        );
        assert!(matches!(
            classify(StatusCode::PRECONDITION_FAILED, ""),
            GatewayError::Conflict(_)
        ));
    }

    #[test]
    fn test_classify_everything_else_as_transport() {
        assert_eq!(
            classify(StatusCode::UNAUTHORIZED, "not json"),
            GatewayError::Transport("HTTP 401: not json".to_string())
        );
        assert!(matches!(
            classify(StatusCode::INTERNAL_SERVER_ERROR, "{}"),
            GatewayError::Transport(_)
        ));
    }

    #[test]
    fn test_document_conversion() {
        let doc: CartItemDocument = serde_json::from_value(json!({
            "$id": "ci-1",
            "productId": "p-9",
            "name": "Linen shirt",
            "image": null,
            "price": 12000,
            "stock": 2,
            "options": "{\"size\":\"L\",\"color\":\"sand\"}",
            "returnable": true,
            "ordering": false,
            "$collectionId": "cart_items"
        }))
        .unwrap();

        let item = CartItem::try_from(doc).unwrap();
        assert_eq!(item.cart_item_id.as_str(), "ci-1");
        assert_eq!(item.image, "");
        assert_eq!(item.stock.get(), 2);
        assert_eq!(item.options.get("size").map(String::as_str), Some("L"));
        assert!(item.returnable);
    }

    #[test]
    fn test_document_conversion_rejects_bad_data() {
        let base = json!({
            "$id": "ci-1", "productId": "p", "name": "n", "price": 1, "stock": 0
        });
        let doc: CartItemDocument = serde_json::from_value(base.clone()).unwrap();
        assert!(matches!(CartItem::try_from(doc), Err(GatewayError::Decode(_))));

        let mut bad_options = base;
        bad_options["stock"] = json!(1);
        bad_options["options"] = json!("{not json");
        let doc: CartItemDocument = serde_json::from_value(bad_options).unwrap();
        assert!(matches!(CartItem::try_from(doc), Err(GatewayError::Decode(_))));
    }
}
