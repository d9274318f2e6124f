//! Shared domain models mirrored from the marketplace backend.
//!
//! Field names follow the backend's JSON (Spanish, camelCase); the Rust side
//! uses English names and renames on the wire.

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

/// Role of an account on the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserType {
    /// Buys articles and places orders.
    #[serde(rename = "cliente", alias = "customer")]
    Customer,
    /// Publishes articles and receives orders.
    #[serde(rename = "vendedor", alias = "vendor")]
    Vendor,
}

impl UserType {
    /// Short user-facing label.
    pub fn label(self) -> &'static str {
        match self {
            UserType::Customer => "customer",
            UserType::Vendor => "vendor",
        }
    }
}

/// Authenticated account as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Backend identifier.
    pub id: u64,
    /// Login e-mail.
    pub email: String,
    /// Account role.
    #[serde(rename = "tipo")]
    pub user_type: UserType,
    /// Display name.
    #[serde(rename = "nombre")]
    pub name: String,
    /// Postal address, if the user provided one.
    #[serde(rename = "direccion", default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Phone number, if the user provided one.
    #[serde(rename = "telefono", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Creation timestamp.
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Vendor details embedded in article listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorSummary {
    /// Vendor's user identifier.
    pub id: u64,
    /// Display name.
    #[serde(rename = "nombre")]
    pub name: String,
    /// Contact e-mail.
    pub email: String,
}

/// Article offered by a vendor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Backend identifier.
    pub id: u64,
    /// Article title.
    #[serde(rename = "nombre")]
    pub name: String,
    /// Free-form description.
    #[serde(rename = "descripcion")]
    pub description: String,
    /// Units available for purchase.
    pub stock: u32,
    /// Unit price. The backend sends either a number or a decimal string.
    #[serde(rename = "precio", deserialize_with = "deserialize_amount")]
    pub price: f64,
    /// Owning vendor.
    #[serde(rename = "vendedorId")]
    pub vendor_id: u64,
    /// Embedded vendor summary, present on public listings.
    #[serde(rename = "vendedor", default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<VendorSummary>,
    /// Creation timestamp.
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Article {
    /// Whether at least one unit can be bought.
    pub fn is_available(&self) -> bool {
        self.stock > 0
    }
}

/// Lifecycle of an order on the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Placed, awaiting the vendor.
    #[serde(rename = "pendiente", alias = "pending")]
    Pending,
    /// Fulfilled by the vendor.
    #[serde(rename = "completado", alias = "completed")]
    Completed,
    /// Withdrawn before fulfilment.
    #[serde(rename = "cancelado", alias = "cancelled")]
    Cancelled,
}

impl OrderStatus {
    /// Short user-facing label.
    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

/// Order placed by a customer for a single article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Backend identifier.
    pub id: u64,
    /// Customer who placed the order.
    #[serde(rename = "clienteId")]
    pub customer_id: u64,
    /// Ordered article.
    #[serde(rename = "articuloId", alias = "articleId")]
    pub article_id: u64,
    /// Units ordered.
    #[serde(rename = "cantidad")]
    pub quantity: u32,
    /// Recipient name.
    #[serde(rename = "nombreEntrega")]
    pub delivery_name: String,
    /// Delivery address.
    #[serde(rename = "direccionEntrega")]
    pub delivery_address: String,
    /// Recipient phone.
    #[serde(rename = "telefonoEntrega")]
    pub delivery_phone: String,
    /// Amount charged, normalized like article prices.
    #[serde(deserialize_with = "deserialize_amount")]
    pub total: f64,
    /// Current lifecycle state.
    #[serde(rename = "estado", alias = "status")]
    pub status: OrderStatus,
    /// Creation timestamp.
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
    /// Embedded article, when the backend includes it.
    #[serde(
        rename = "articulo",
        alias = "article",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub article: Option<Article>,
    /// Embedded customer, when the backend includes it.
    #[serde(rename = "cliente", default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<User>,
}

/// Credentials for `POST /auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginCredentials {
    /// Login e-mail.
    pub email: String,
    /// Plain-text password, sent over the wire once.
    pub password: String,
}

/// Payload for `POST /auth/register`.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    /// Login e-mail.
    pub email: String,
    /// Chosen password.
    pub password: String,
    /// Requested account role.
    #[serde(rename = "tipo")]
    pub user_type: UserType,
    /// Display name.
    #[serde(rename = "nombre")]
    pub name: String,
    /// Optional postal address.
    #[serde(rename = "direccion", skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Optional phone number.
    #[serde(rename = "telefono", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Identity and bearer token returned by login and registration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthPayload {
    /// Signed-in account.
    pub user: User,
    /// Bearer token for protected endpoints.
    pub token: String,
}

/// Payload for `POST /articles`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateArticleRequest {
    /// Article title.
    #[serde(rename = "nombre")]
    pub name: String,
    /// Free-form description.
    #[serde(rename = "descripcion")]
    pub description: String,
    /// Initial units available.
    pub stock: u32,
    /// Unit price.
    #[serde(rename = "precio")]
    pub price: f64,
}

/// Payload for `POST /orders`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderRequest {
    /// Article to buy.
    #[serde(rename = "articuloId")]
    pub article_id: u64,
    /// Units to buy.
    #[serde(rename = "cantidad")]
    pub quantity: u32,
    /// Recipient name.
    #[serde(rename = "nombreEntrega")]
    pub delivery_name: String,
    /// Delivery address.
    #[serde(rename = "direccionEntrega")]
    pub delivery_address: String,
    /// Recipient phone.
    #[serde(rename = "telefonoEntrega")]
    pub delivery_phone: String,
}

/// Article snapshot held in the cart together with the desired quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// Article snapshot taken when the line was last added to.
    pub article: Article,
    /// Units held, within `1..=article.stock`.
    #[serde(rename = "cantidad")]
    pub quantity: u32,
}

impl CartItem {
    /// Price of this line: quantity times unit price.
    pub fn subtotal(&self) -> f64 {
        f64::from(self.quantity) * self.article.price
    }
}

/// Accepts a JSON number or a decimal string and yields a finite `f64`.
fn deserialize_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Number(f64),
        Text(String),
    }

    let value = match Amount::deserialize(deserializer)? {
        Amount::Number(value) => value,
        Amount::Text(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("invalid amount '{raw}'")))?,
    };
    if !value.is_finite() {
        return Err(de::Error::custom(format!("amount out of range: {value}")));
    }
    Ok(value)
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn article_json(price: serde_json::Value) -> serde_json::Value {
        json!({
            "id": 3,
            "nombre": "Mate",
            "descripcion": "Calabaza",
            "stock": 4,
            "precio": price,
            "vendedorId": 9,
            "createdAt": "2024-05-01T12:00:00.000Z",
            "updatedAt": "2024-05-01T12:00:00.000Z",
            "vendedor": { "id": 9, "nombre": "Luis", "email": "luis@example.com" }
        })
    }

    #[test]
    fn article_price_accepts_number_or_string() {
        let from_string: Article = serde_json::from_value(article_json(json!("10.50"))).unwrap();
        assert_eq!(from_string.price, 10.5);
        assert_eq!(from_string.vendor.as_ref().map(|v| v.id), Some(9));

        let from_number: Article = serde_json::from_value(article_json(json!(5))).unwrap();
        assert_eq!(from_number.price, 5.0);
    }

    #[test]
    fn article_price_rejects_garbage() {
        let result = serde_json::from_value::<Article>(article_json(json!("abc")));
        assert!(result.is_err());
    }

    #[test]
    fn article_price_serializes_as_number() {
        let article: Article = serde_json::from_value(article_json(json!("7.25"))).unwrap();
        let value = serde_json::to_value(&article).unwrap();
        assert_eq!(value["precio"], json!(7.25));
    }

    #[test]
    fn user_type_uses_backend_names() {
        let user: User = serde_json::from_value(json!({
            "id": 1,
            "email": "a@b.c",
            "tipo": "vendedor",
            "nombre": "A",
            "createdAt": "2024-05-01T12:00:00Z",
            "updatedAt": "2024-05-01T12:00:00Z"
        }))
        .unwrap();
        assert_eq!(user.user_type, UserType::Vendor);
        assert_eq!(user.address, None);
        assert_eq!(serde_json::to_value(UserType::Customer).unwrap(), json!("cliente"));
    }

    #[test]
    fn order_decodes_status_and_total() {
        let order: Order = serde_json::from_value(json!({
            "id": 11,
            "clienteId": 1,
            "articuloId": 3,
            "cantidad": 2,
            "nombreEntrega": "Ana",
            "direccionEntrega": "Calle Mayor 1",
            "telefonoEntrega": "600000000",
            "total": "21.00",
            "estado": "pendiente",
            "createdAt": "2024-05-01T12:00:00Z",
            "updatedAt": "2024-05-01T12:00:00Z"
        }))
        .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total, 21.0);
        assert!(order.article.is_none());
    }

    #[test]
    fn cart_item_subtotal() {
        let item = CartItem {
            article: fixtures::article(1, 5, 2.5),
            quantity: 3,
        };
        assert_eq!(item.subtotal(), 7.5);
    }
}
