use reqwest::Method;
use serde::Deserialize;

use super::{ApiClient, ApiError};
use crate::models::{CreateOrderRequest, Order};

#[derive(Debug, Deserialize)]
struct OrderList {
    orders: Vec<Order>,
}

#[derive(Debug, Deserialize)]
struct CreatedOrder {
    order: Order,
}

impl ApiClient {
    /// `POST /orders`: place an order for one article.
    pub async fn create_order(
        &self,
        order: &CreateOrderRequest,
        token: &str,
    ) -> Result<Order, ApiError> {
        let request = self.request(Method::POST, "/orders", Some(token)).json(order);
        let envelope = self
            .execute::<CreatedOrder>(request, "Error al crear la orden")
            .await?;
        Ok(envelope.into_data()?.order)
    }

    /// `GET /orders/vendor-orders`: orders received by the authenticated vendor.
    pub async fn vendor_orders(&self, token: &str) -> Result<Vec<Order>, ApiError> {
        let request = self.request(Method::GET, "/orders/vendor-orders", Some(token));
        let envelope = self
            .execute::<OrderList>(request, "Error al obtener las órdenes")
            .await?;
        Ok(envelope.into_data()?.orders)
    }
}
